//! 结果写入 - 业务能力层
//!
//! 把一行已定稿的结果追加到结果表；失败时给出可下载的 CSV

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::clients::TableStore;
use crate::error::{AppResult, StoreError};
use crate::models::ResponseRow;
use crate::services::csv_export::CsvExport;
use crate::utils::logging::truncate_text;

/// 表格为空 / 缺少表头时给研究者的提示
pub const MISSING_HEADERS_MESSAGE: &str = "The results sheet is empty or has no header row. \
Please ask the researcher to add a header row (User, Q01, Q02, ...) to the sheet.";

/// 其他写入失败的通用提示
pub const CONNECTION_MESSAGE: &str =
    "We could not save your answers to the results sheet because of a connection error.";

/// 写入失败的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    MissingHeaders,
    Connection,
}

impl FallbackReason {
    pub fn message(self) -> &'static str {
        match self {
            FallbackReason::MissingHeaders => MISSING_HEADERS_MESSAGE,
            FallbackReason::Connection => CONNECTION_MESSAGE,
        }
    }
}

/// 一次提交的写入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    /// 已追加到结果表，`rows_after` 为追加后的数据行数
    Recorded { rows_after: usize },
    /// 未写入，需要参与者手动下载并转交
    Fallback {
        reason: FallbackReason,
        export: CsvExport,
    },
}

/// 结果写入服务
///
/// 职责：
/// - 读取最新结果表 → 去掉空行 → 追加 → 整表写回
/// - 同一进程内的写入通过 `write_lock` 串行，避免并发提交互相覆盖
/// - 任何失败都退化为 CSV 导出，不丢数据
pub struct ResultSink {
    store: Option<Arc<dyn TableStore>>,
    table: String,
    write_lock: Mutex<()>,
}

impl ResultSink {
    pub fn new(store: Arc<dyn TableStore>, table: impl Into<String>) -> Self {
        Self {
            store: Some(store),
            table: table.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// 未配置存储：每次提交都会走 CSV 导出
    pub fn unconfigured(table: impl Into<String>) -> Self {
        Self {
            store: None,
            table: table.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store
            .as_ref()
            .map(|s| s.backend_name())
            .unwrap_or("unconfigured")
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// 提交一行结果
    ///
    /// 只有生成导出文件本身失败时才返回 `Err`
    pub async fn submit(&self, row: &ResponseRow) -> AppResult<SinkOutcome> {
        let who = truncate_text(row.participant(), 32);

        match self.append(row).await {
            Ok(rows_after) => {
                info!("✓ 已记录 {} 的答卷，结果表共 {} 行", who, rows_after);
                Ok(SinkOutcome::Recorded { rows_after })
            }
            Err(e) => {
                let reason = if e.is_missing_headers() {
                    warn!("⚠️ 结果表 {} 为空或缺少表头，请先补上表头行", self.table);
                    FallbackReason::MissingHeaders
                } else {
                    error!("❌ 写入结果表失败 ({}): {}", who, e);
                    FallbackReason::Connection
                };
                let export = CsvExport::from_row(row)?;
                info!("📄 已为 {} 生成备用下载 {}", who, export.file_name());
                Ok(SinkOutcome::Fallback { reason, export })
            }
        }
    }

    /// 追加协议：失效缓存 → 读整表 → 去空行 → 追加 → 写回
    async fn append(&self, row: &ResponseRow) -> Result<usize, StoreError> {
        let store = self.store.as_ref().ok_or_else(|| StoreError::Unconfigured {
            reason: format!("结果表 {} 没有可用的存储后端", self.table),
        })?;

        let _guard = self.write_lock.lock().await;

        store.invalidate(&self.table).await;
        let mut table = store.read(&self.table).await?;

        let dropped = table.drop_empty_rows();
        if dropped > 0 {
            tracing::debug!("移除了 {} 个空行", dropped);
        }

        table.append_row(&row.columns(), &row.values());
        store.update(&self.table, &table).await?;

        Ok(table.len())
    }
}
