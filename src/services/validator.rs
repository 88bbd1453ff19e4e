//! 提交校验 - 业务能力层
//!
//! 纯函数，不产生任何副作用；每次提交调用一次，且在写入结果之前

use crate::error::ValidationError;
use crate::models::{Catalog, ResponseDraft, ResponseRow};

/// 用户名非空且目录中每道题都已选择 Left / Right 时返回 true
pub fn is_complete(catalog: &Catalog, draft: &ResponseDraft) -> bool {
    !draft.participant().is_empty()
        && catalog
            .identifiers()
            .all(|id| draft.answer(id).is_answered())
}

/// 校验并定稿
///
/// 通过时按目录顺序生成 `ResponseRow`；否则列出缺少的内容
pub fn check(catalog: &Catalog, draft: &ResponseDraft) -> Result<ResponseRow, ValidationError> {
    let missing_participant = draft.participant().is_empty();
    let mut unanswered = Vec::new();
    let mut answers = Vec::with_capacity(catalog.len());

    for id in catalog.identifiers() {
        match draft.answer(id).choice() {
            Some(choice) => answers.push((id.to_string(), choice)),
            None => unanswered.push(id.to_string()),
        }
    }

    if missing_participant || !unanswered.is_empty() {
        return Err(ValidationError::Incomplete {
            missing_participant,
            unanswered,
        });
    }

    Ok(ResponseRow::new(draft.participant().to_string(), answers))
}
