//! 表格存储客户端
//!
//! 结果表的外部协作方，只暴露"读整表 / 写整表"两种能力

pub mod cached_store;
pub mod csv_store;
pub mod memory_store;
pub mod sheets_client;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::Table;

pub use cached_store::CachedStore;
pub use csv_store::CsvFileStore;
pub use memory_store::MemoryStore;
pub use sheets_client::SheetsClient;

/// 表格存储
#[async_trait]
pub trait TableStore: Send + Sync {
    /// 读取整张表（首行为表头）
    async fn read(&self, table: &str) -> Result<Table, StoreError>;

    /// 用 `data` 覆盖整张表
    async fn update(&self, table: &str, data: &Table) -> Result<(), StoreError>;

    /// 丢弃缓存的读结果；不带缓存的存储无需实现
    async fn invalidate(&self, _table: &str) {}

    /// 后端名称（日志 / 健康检查用）
    fn backend_name(&self) -> &'static str;
}
