//! 问卷会话 - 流程层
//!
//! 状态机：`Empty → Answering → (提交) → Submitted | Rejected`
//!
//! - `Empty`：还没有用户名，只显示用户名输入框
//! - `Answering`：已填写用户名且题目非空，所有题目初始为未作答
//! - `Rejected`：提交时有缺项，保留已作答内容，可继续修改后再次提交
//! - `Submitted`：终态，本会话不能再次提交

use crate::error::ValidationError;
use crate::models::{Answer, Catalog, Choice, ResponseDraft, ResponseRow};
use crate::services::validator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Empty,
    Answering,
    Rejected(ValidationError),
    Submitted,
}

/// 单个参与者的问卷会话
#[derive(Debug, Clone)]
pub struct FormSession {
    state: FormState,
    draft: ResponseDraft,
}

impl FormSession {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            state: FormState::Empty,
            draft: ResponseDraft::new(catalog),
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn draft(&self) -> &ResponseDraft {
        &self.draft
    }

    pub fn is_submitted(&self) -> bool {
        self.state == FormState::Submitted
    }

    /// 填写用户名；用户名非空且题目非空时进入 `Answering`
    pub fn enter_participant(&mut self, participant: &str, catalog: &Catalog) -> bool {
        if self.is_submitted() {
            return false;
        }
        self.draft.set_participant(participant);
        if !self.draft.participant().is_empty() && !catalog.is_empty() {
            if self.state == FormState::Empty {
                self.state = FormState::Answering;
            }
            true
        } else {
            false
        }
    }

    /// 记录一道题的原始表单值
    ///
    /// `None` 表示该题没有被选择；只接受 `Left` / `Right`
    pub fn record(&mut self, question: &str, raw: Option<&str>) -> Result<(), ValidationError> {
        if self.is_submitted() {
            return Err(ValidationError::AlreadySubmitted);
        }
        let answer = match raw {
            None => Answer::Unanswered,
            Some(value) => {
                let choice: Choice =
                    value
                        .parse()
                        .map_err(|value| ValidationError::InvalidChoice {
                            question: question.to_string(),
                            value,
                        })?;
                Answer::Chosen(choice)
            }
        };
        self.draft.set_answer(question, answer);
        Ok(())
    }

    /// 用一次完整的表单提交覆盖当前作答
    ///
    /// `lookup` 按题号返回表单中的值
    pub fn apply_form<'a>(
        &mut self,
        catalog: &Catalog,
        participant: &str,
        lookup: impl Fn(&str) -> Option<&'a str>,
    ) -> Result<(), ValidationError> {
        if self.is_submitted() {
            return Err(ValidationError::AlreadySubmitted);
        }
        self.enter_participant(participant, catalog);

        let mut first_error = None;
        for id in catalog.identifiers() {
            if let Err(e) = self.record(id, lookup(id)) {
                // 非法值按未作答处理，继续记录其余题目
                self.draft.set_answer(id, Answer::Unanswered);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => {
                self.state = FormState::Rejected(e.clone());
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// 显式提交
    ///
    /// 校验通过则进入 `Submitted` 并返回定稿的结果行；否则进入 `Rejected`，作答保留
    pub fn submit(&mut self, catalog: &Catalog) -> Result<ResponseRow, ValidationError> {
        if self.is_submitted() {
            return Err(ValidationError::AlreadySubmitted);
        }
        match validator::check(catalog, &self.draft) {
            Ok(row) => {
                self.state = FormState::Submitted;
                Ok(row)
            }
            Err(e) => {
                self.state = FormState::Rejected(e.clone());
                Err(e)
            }
        }
    }
}
