use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::clients::{CachedStore, CsvFileStore, MemoryStore, SheetsClient, TableStore};
use crate::config::{Config, StoreBackend};
use crate::error::{AppError, AppResult, CatalogError};
use crate::models::{load_catalog, Catalog};
use crate::services::ResultSink;
use crate::utils::logging::log_startup;
use crate::web::{self, SurveyState};
use crate::workflow::SessionRegistry;

/// 应用主结构
pub struct App {
    config: Config,
    state: Arc<SurveyState>,
}

impl App {
    /// 初始化应用
    ///
    /// 图片目录或存储配置有问题时只记录错误并降级运行，不会中止启动
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let (catalog, catalog_error) = match load_questions(&config).await {
            Ok(catalog) => (catalog, None),
            Err(AppError::Catalog(e)) => {
                error!("❌ 题目加载失败: {}", e);
                (Catalog::empty(), Some(e.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let sink = build_sink(&config);

        let state = Arc::new(SurveyState {
            page_title: config.page_title.clone(),
            catalog,
            catalog_error,
            sessions: SessionRegistry::new(Duration::from_secs(config.session_ttl_secs)),
            sink,
        });

        Ok(Self { config, state })
    }

    pub fn state(&self) -> Arc<SurveyState> {
        self.state.clone()
    }

    /// 运行 HTTP 服务，直到进程退出
    pub async fn run(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr)
            .await
            .with_context(|| format!("无法监听地址: {}", self.config.bind_addr))?;

        info!("🌐 问卷页面: http://{}", listener.local_addr()?);

        axum::serve(listener, web::router(self.state))
            .await
            .context("HTTP 服务异常退出")?;
        Ok(())
    }
}

/// 加载题目；目录缺失、为空或命名有误时返回 `AppError::Catalog`
async fn load_questions(config: &Config) -> AppResult<Catalog> {
    let catalog = load_catalog(Path::new(&config.image_dir)).await?;
    if catalog.is_empty() {
        return Err(CatalogError::NoImages {
            path: config.image_dir.clone(),
        }
        .into());
    }
    Ok(catalog)
}

/// 按配置创建结果写入服务
pub fn build_sink(config: &Config) -> ResultSink {
    if let Some(problem) = config.store_problem() {
        error!("❌ {}，提交将改为提供 CSV 下载", problem);
        return ResultSink::unconfigured(config.table_name.clone());
    }

    let ttl = Duration::from_secs(config.cache_ttl_secs);
    let store: Arc<dyn TableStore> = match config.store_backend {
        StoreBackend::Sheets => Arc::new(CachedStore::new(SheetsClient::new(config), ttl)),
        StoreBackend::Csv => Arc::new(CachedStore::new(
            CsvFileStore::new(&config.csv_store_dir),
            ttl,
        )),
        StoreBackend::Memory => {
            warn!("⚠️ 使用内存存储，进程退出后结果会丢失");
            Arc::new(MemoryStore::new())
        }
    };

    ResultSink::new(store, config.table_name.clone())
}
