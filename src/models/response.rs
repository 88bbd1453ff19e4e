use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::models::question_image::Catalog;

/// 结果表中用户名所在列
pub const USER_COLUMN: &str = "User";

/// 对比选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Choice {
    Left,
    Right,
}

impl Choice {
    pub const ALL: [Choice; 2] = [Choice::Left, Choice::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Choice::Left => "Left",
            Choice::Right => "Right",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Choice {
    type Err = String;

    /// 只接受 `Left` / `Right`（精确匹配）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Left" => Ok(Choice::Left),
            "Right" => Ok(Choice::Right),
            other => Err(other.to_string()),
        }
    }
}

/// 单题作答状态
///
/// 默认未作答，页面上不预选任何选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Answer {
    #[default]
    Unanswered,
    Chosen(Choice),
}

impl Answer {
    pub fn choice(self) -> Option<Choice> {
        match self {
            Answer::Chosen(choice) => Some(choice),
            Answer::Unanswered => None,
        }
    }

    pub fn is_answered(self) -> bool {
        matches!(self, Answer::Chosen(_))
    }
}

/// 作答中的问卷
///
/// 题目顺序与 Catalog 一致
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDraft {
    participant: String,
    answers: Vec<(String, Answer)>,
}

impl ResponseDraft {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            participant: String::new(),
            answers: catalog
                .identifiers()
                .map(|id| (id.to_string(), Answer::Unanswered))
                .collect(),
        }
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn set_participant(&mut self, participant: &str) {
        self.participant = participant.trim().to_string();
    }

    pub fn answers(&self) -> &[(String, Answer)] {
        &self.answers
    }

    pub fn answer(&self, question: &str) -> Answer {
        self.answers
            .iter()
            .find(|(id, _)| id == question)
            .map(|(_, answer)| *answer)
            .unwrap_or_default()
    }

    /// 记录答案；题号不在目录中时返回 false
    pub fn set_answer(&mut self, question: &str, answer: Answer) -> bool {
        match self.answers.iter_mut().find(|(id, _)| id == question) {
            Some((_, slot)) => {
                *slot = answer;
                true
            }
            None => false,
        }
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|(_, a)| a.is_answered()).count()
    }
}

/// 已定稿的一行结果
///
/// 只能由校验通过的 `ResponseDraft` 生成（见 `services::validator`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseRow {
    participant: String,
    answers: Vec<(String, Choice)>,
}

impl ResponseRow {
    pub(crate) fn new(participant: String, answers: Vec<(String, Choice)>) -> Self {
        Self {
            participant,
            answers,
        }
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn answers(&self) -> &[(String, Choice)] {
        &self.answers
    }

    /// 列名：`User` 加上各题号
    pub fn columns(&self) -> Vec<String> {
        std::iter::once(USER_COLUMN.to_string())
            .chain(self.answers.iter().map(|(id, _)| id.clone()))
            .collect()
    }

    pub fn values(&self) -> Vec<String> {
        std::iter::once(self.participant.clone())
            .chain(self.answers.iter().map(|(_, c)| c.as_str().to_string()))
            .collect()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        if field == USER_COLUMN {
            return Some(self.participant.as_str());
        }
        self.answers
            .iter()
            .find(|(id, _)| id == field)
            .map(|(_, c)| c.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question_image::QuestionImage;

    fn catalog() -> Catalog {
        Catalog::from_sorted(vec![
            QuestionImage::new("Q01", "Q01_a.png", "images/Q01_a.png"),
            QuestionImage::new("Q02", "Q02_a.png", "images/Q02_a.png"),
        ])
    }

    #[test]
    fn test_choice_parse_is_strict() {
        assert_eq!("Left".parse::<Choice>().unwrap(), Choice::Left);
        assert_eq!("Right".parse::<Choice>().unwrap(), Choice::Right);
        assert!("left".parse::<Choice>().is_err());
        assert!("Both".parse::<Choice>().is_err());
        assert!("".parse::<Choice>().is_err());
    }

    #[test]
    fn test_new_draft_is_unanswered() {
        let draft = ResponseDraft::new(&catalog());
        assert_eq!(draft.participant(), "");
        assert_eq!(draft.answers().len(), 2);
        assert_eq!(draft.answered_count(), 0);
        assert_eq!(draft.answer("Q01"), Answer::Unanswered);
    }

    #[test]
    fn test_set_answer_ignores_unknown_question() {
        let mut draft = ResponseDraft::new(&catalog());
        assert!(draft.set_answer("Q02", Answer::Chosen(Choice::Right)));
        assert!(!draft.set_answer("Q77", Answer::Chosen(Choice::Left)));
        assert_eq!(draft.answer("Q02"), Answer::Chosen(Choice::Right));
        assert_eq!(draft.answered_count(), 1);
    }

    #[test]
    fn test_row_columns_follow_answer_order() {
        let row = ResponseRow::new(
            "Guest_01".to_string(),
            vec![
                ("Q01".to_string(), Choice::Left),
                ("Q02".to_string(), Choice::Right),
            ],
        );
        assert_eq!(row.columns(), vec!["User", "Q01", "Q02"]);
        assert_eq!(row.values(), vec!["Guest_01", "Left", "Right"]);
        assert_eq!(row.get("User"), Some("Guest_01"));
        assert_eq!(row.get("Q02"), Some("Right"));
        assert_eq!(row.get("Q03"), None);
    }
}
