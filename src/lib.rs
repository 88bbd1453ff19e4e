//! # Sharpness Survey
//!
//! 一个用于收集图片清晰度两两对比判断的问卷服务
//!
//! ## 架构设计
//!
//! ### ① 数据层（Models）
//! - `models/` - 题目目录、作答草稿、结果行、结果表格
//! - `load_catalog` - 读取图片目录，按文件名排序并推导题号
//!
//! ### ② 存储层（Clients）
//! - `clients/` - 结果表的外部协作方，只提供"读整表 / 写整表"
//! - `SheetsClient` / `CsvFileStore` / `MemoryStore`，以及带有效期的 `CachedStore`
//!
//! ### ③ 业务能力层（Services）
//! - `validator` - 提交校验（纯函数）
//! - `ResultSink` - 追加结果行，失败时退化为 CSV 下载
//!
//! ### ④ 流程层（Workflow）
//! - `FormSession` - 单个参与者的问卷状态机
//! - `SessionRegistry` - 以 token 管理会话，保证每个会话只提交一次
//!
//! ### ⑤ 接入层（Web）
//! - `web/` - 路由、处理函数、页面渲染
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod web;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::{Config, StoreBackend};
pub use error::{AppError, AppResult};
pub use models::{Catalog, Choice, QuestionImage, ResponseRow, Table};
pub use services::{ResultSink, SinkOutcome};
