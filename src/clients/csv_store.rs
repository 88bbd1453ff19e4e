//! 本地 CSV 表格存储
//!
//! 每张表对应目录下的一个 `<table>.csv` 文件

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csv::{ReaderBuilder, WriterBuilder};
use tracing::debug;

use crate::clients::TableStore;
use crate::error::StoreError;
use crate::models::Table;

pub struct CsvFileStore {
    dir: PathBuf,
}

impl CsvFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", table))
    }

    fn read_values(path: &Path) -> Result<Vec<Vec<String>>, StoreError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut values = Vec::new();
        for record in reader.records() {
            let record = record?;
            values.push(record.iter().map(str::to_string).collect());
        }
        Ok(values)
    }
}

#[async_trait]
impl TableStore for CsvFileStore {
    async fn read(&self, table: &str) -> Result<Table, StoreError> {
        let path = self.table_path(table);
        let name = table.to_string();

        tokio::task::spawn_blocking(move || -> Result<Table, StoreError> {
            if !path.exists() {
                return Err(StoreError::MissingHeaders { table: name });
            }

            debug!("读取 CSV 表格: {}", path.display());
            Table::from_values(Self::read_values(&path)?)
                .ok_or(StoreError::MissingHeaders { table: name })
        })
        .await
        .map_err(|e| StoreError::request_failed(table, e))?
    }

    /// 先写临时文件再替换，避免写到一半留下残缺的表
    async fn update(&self, table: &str, data: &Table) -> Result<(), StoreError> {
        let dir = self.dir.clone();
        let path = self.table_path(table);
        let tmp_path = self.dir.join(format!(".{}.csv.tmp", table));
        let values = data.to_values();

        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            fs::create_dir_all(&dir)?;
            {
                let mut writer = WriterBuilder::new().flexible(true).from_path(&tmp_path)?;
                for row in &values {
                    writer.write_record(row)?;
                }
                writer.flush()?;
            }

            fs::rename(&tmp_path, &path)?;
            debug!("写入 CSV 表格 {}: {} 行", path.display(), values.len().saturating_sub(1));
            Ok(())
        })
        .await
        .map_err(|e| StoreError::request_failed(table, e))?
    }

    fn backend_name(&self) -> &'static str {
        "csv"
    }
}
