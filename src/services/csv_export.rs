//! 结果导出 - 业务能力层
//!
//! 写入失败时把单行结果转成可下载的 CSV

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use csv::Writer;
use regex::Regex;

use crate::error::AppResult;
use crate::models::ResponseRow;

/// 可下载的 CSV 文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    file_name: String,
    bytes: Vec<u8>,
}

impl CsvExport {
    /// 表头 `User,<Q1>,<Q2>,...` 加一行数据
    pub fn from_row(row: &ResponseRow) -> AppResult<Self> {
        let mut writer = Writer::from_writer(Vec::new());
        writer.write_record(row.columns())?;
        writer.write_record(row.values())?;
        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;

        Ok(Self {
            file_name: export_file_name(row.participant()),
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 供页面下载链接使用的 `data:` URI
    pub fn data_uri(&self) -> String {
        format!("data:text/csv;charset=utf-8;base64,{}", STANDARD.encode(&self.bytes))
    }
}

fn unsafe_chars() -> &'static Regex {
    static UNSAFE_CHARS: OnceLock<Regex> = OnceLock::new();
    UNSAFE_CHARS.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").expect("固定的正则表达式"))
}

/// `result_<participant>.csv`，文件名中不安全的字符替换为 `_`
fn export_file_name(participant: &str) -> String {
    format!("result_{}.csv", unsafe_chars().replace_all(participant, "_"))
}
