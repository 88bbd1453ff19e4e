use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::loaders::image_content_type;
use crate::models::{Catalog, ResponseDraft, ResponseRow};
use crate::services::{FallbackReason, SinkOutcome};
use crate::utils::logging::truncate_text;
use crate::web::render;
use crate::web::SurveyState;
use crate::workflow::FormSession;

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    user: Option<String>,
}

/// 首页：没有用户名时只显示输入框，有用户名时开启会话并渲染全部题目
pub async fn index(
    State(state): State<Arc<SurveyState>>,
    Query(query): Query<IndexQuery>,
) -> Html<String> {
    let participant = query.user.as_deref().map(str::trim).unwrap_or("");

    if participant.is_empty() || state.catalog.is_empty() {
        return Html(render::landing(
            &state.page_title,
            state.catalog_error.as_deref(),
            state.catalog_error.is_none(),
        ));
    }

    let (token, draft) = state.sessions.open(&state.catalog, participant);
    info!(
        "📝 {} 开始作答 ({} 道题)",
        truncate_text(participant, 32),
        state.catalog.len()
    );

    Html(render::survey_form(
        &state.page_title,
        &state.catalog,
        &token.to_string(),
        &draft,
        None,
    ))
}

/// 用表单内容更新会话并尝试提交
fn process_submission(
    catalog: &Catalog,
    fields: &HashMap<String, String>,
    session: &mut FormSession,
) -> (Result<ResponseRow, ValidationError>, ResponseDraft) {
    let participant = fields.get("user").map(String::as_str).unwrap_or("");
    let result = session
        .apply_form(catalog, participant, |id| {
            fields.get(&format!("q_{}", id)).map(String::as_str)
        })
        .and_then(|()| session.submit(catalog));
    (result, session.draft().clone())
}

/// 提交问卷
pub async fn submit(
    State(state): State<Arc<SurveyState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let title = state.page_title.as_str();

    if state.catalog.is_empty() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(render::landing(title, state.catalog_error.as_deref(), false)),
        )
            .into_response();
    }

    let token = fields.get("token").and_then(|t| Uuid::parse_str(t).ok());
    let (token, outcome) = state
        .sessions
        .with_session_or_open(token, &state.catalog, |session| {
            process_submission(&state.catalog, &fields, session)
        });
    let (result, draft) = match outcome {
        Ok(processed) => processed,
        Err(e) => (Err(e), ResponseDraft::new(&state.catalog)),
    };

    let row = match result {
        Ok(row) => row,
        Err(ValidationError::AlreadySubmitted) => {
            warn!("⚠️ 会话 {} 重复提交，已拒绝", token);
            return (StatusCode::CONFLICT, Html(render::already_submitted(title))).into_response();
        }
        Err(e) => {
            info!(
                "提交未通过校验 ({}): 已答 {}/{}",
                truncate_text(draft.participant(), 32),
                draft.answered_count(),
                state.catalog.len()
            );
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render::survey_form(
                    title,
                    &state.catalog,
                    &token.to_string(),
                    &draft,
                    Some(&e),
                )),
            )
                .into_response();
        }
    };

    info!("📤 正在写入 {} 的答卷...", truncate_text(row.participant(), 32));
    let page = match state.sink.submit(&row).await {
        Ok(SinkOutcome::Recorded { .. }) => render::thank_you(title, &row),
        Ok(SinkOutcome::Fallback { reason, export }) => {
            render::fallback(title, &row, reason, Some(&export))
        }
        Err(e) => {
            error!("❌ 生成备用下载失败: {}", e);
            render::fallback(title, &row, FallbackReason::Connection, None)
        }
    };
    Html(page).into_response()
}

/// 对比图片
///
/// 只返回目录中登记过的文件
pub async fn image(
    State(state): State<Arc<SurveyState>>,
    Path(file): Path<String>,
) -> Response {
    let Some(img) = state.catalog.find_by_file_name(&file) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(img.path()).await {
        Ok(bytes) => (
            [(
                header::CONTENT_TYPE,
                image_content_type(&img.file_name).unwrap_or("application/octet-stream"),
            )],
            bytes,
        )
            .into_response(),
        Err(e) => {
            warn!("⚠️ 读取图片失败 {}: {}", img.path().display(), e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub questions: usize,
    pub catalog_error: Option<String>,
    pub store_backend: &'static str,
    pub table: String,
}

/// 健康检查
pub async fn healthz(State(state): State<Arc<SurveyState>>) -> Json<HealthResponse> {
    let store_backend = state.sink.backend_name();
    let healthy = state.catalog_error.is_none() && store_backend != "unconfigured";
    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        questions: state.catalog.len(),
        catalog_error: state.catalog_error.clone(),
        store_backend,
        table: state.sink.table().to_string(),
    })
}
