use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::clients::TableStore;
use crate::error::StoreError;
use crate::models::Table;

/// 进程内存表格存储
///
/// 重启即丢失，用于演示和测试
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一张表
    pub fn with_table(mut self, name: impl Into<String>, table: Table) -> Self {
        self.tables.get_mut().insert(name.into(), table);
        self
    }

    /// 当前表内容（不存在时为 `None`）
    pub async fn snapshot(&self, name: &str) -> Option<Table> {
        self.tables.read().await.get(name).cloned()
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn read(&self, table: &str) -> Result<Table, StoreError> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .ok_or_else(|| StoreError::MissingHeaders {
                table: table.to_string(),
            })
    }

    async fn update(&self, table: &str, data: &Table) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .insert(table.to_string(), data.clone());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
