//! HTTP 层
//!
//! 路由：
//! - `GET  /`              用户名输入；带 `?user=` 时开启会话并渲染问卷
//! - `POST /submit`        提交问卷
//! - `GET  /images/:file`  对比图（只允许目录中的文件）
//! - `GET  /healthz`       健康检查

pub mod handlers;
pub mod render;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::models::Catalog;
use crate::services::ResultSink;
use crate::workflow::SessionRegistry;

/// 所有请求共享的状态
pub struct SurveyState {
    pub page_title: String,
    pub catalog: Catalog,
    /// 题目目录加载失败的原因（展示在首页）
    pub catalog_error: Option<String>,
    pub sessions: SessionRegistry,
    pub sink: ResultSink,
}

pub fn router(state: Arc<SurveyState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/submit", post(handlers::submit))
        .route("/images/:file", get(handlers::image))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
