//! 表单模型
//!
//! 页面上的一切编辑状态都落在这些值上，界面只负责绑定

use super::event_dates::{EventDates, ValidityWindow};
use super::metadata::MetadataContainer;
use crate::error::FormError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 标题最大长度
pub const MAX_TITLE_LEN: usize = 200;
/// 分类最大长度
pub const MAX_CATEGORY_LEN: usize = 100;
/// 题目引用名最大长度
pub const MAX_REFERENCE_LEN: usize = 50;
/// 列表题最少选项数
pub const MIN_LIST_OPTIONS: usize = 2;

/// 答案类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    #[default]
    Text,
    Num,
    Date,
    List,
}

impl AnswerType {
    pub const ALL: [AnswerType; 4] = [
        AnswerType::Text,
        AnswerType::Num,
        AnswerType::Date,
        AnswerType::List,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnswerType::Text => "text",
            AnswerType::Num => "num",
            AnswerType::Date => "date",
            AnswerType::List => "list",
        }
    }
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerType {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnswerType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| FormError::UnknownAnswerType {
                value: s.to_string(),
            })
    }
}

/// 题目卡片标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn from_seq(seq: u64) -> Self {
        Self(format!("question_{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 一张题目卡片
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub reference: String,
    pub content: String,
    pub answer_type: AnswerType,
    pub required: bool,
    pub options: Vec<String>,
    pub metadata: MetadataContainer,
    pub ai_enabled: bool,
    pub ai_instructions: String,
}

impl Question {
    /// 空白卡片（模板）
    pub fn blank(id: QuestionId) -> Self {
        Self {
            id,
            reference: String::new(),
            content: String::new(),
            answer_type: AnswerType::Text,
            required: false,
            options: Vec::new(),
            metadata: MetadataContainer::new(),
            ai_enabled: false,
            ai_instructions: String::new(),
        }
    }

    /// 列表题时选项输入为必填
    pub fn options_required(&self) -> bool {
        self.answer_type == AnswerType::List
    }

    /// 选项输入框显示的文本
    pub fn options_text(&self) -> String {
        self.options.join(", ")
    }
}

/// 整个表单
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Form {
    pub title: String,
    pub category: String,
    pub subcategory: String,
    pub category_metadata: MetadataContainer,
    pub subcategory_metadata: MetadataContainer,
    pub questions: Vec<Question>,
    pub event_dates: EventDates,
    pub validity: ValidityWindow,
}

impl Form {
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }

    pub fn question_mut(&mut self, id: &QuestionId) -> Option<&mut Question> {
        self.questions.iter_mut().find(|q| &q.id == id)
    }

    /// 题目在卡片列表中的位置（从 0 开始）
    pub fn position(&self, id: &QuestionId) -> Option<usize> {
        self.questions.iter().position(|q| &q.id == id)
    }
}

/// 元数据容器的位置
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContainerRef {
    Category,
    Subcategory,
    Question(QuestionId),
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerRef::Category => f.write_str("categoryMetadata"),
            ContainerRef::Subcategory => f.write_str("subcategoryMetadata"),
            ContainerRef::Question(id) => write!(f, "{id}.metadata"),
        }
    }
}

impl Form {
    pub fn container(&self, container: &ContainerRef) -> Option<&MetadataContainer> {
        match container {
            ContainerRef::Category => Some(&self.category_metadata),
            ContainerRef::Subcategory => Some(&self.subcategory_metadata),
            ContainerRef::Question(id) => self.question(id).map(|q| &q.metadata),
        }
    }

    pub fn container_mut(&mut self, container: &ContainerRef) -> Option<&mut MetadataContainer> {
        match container {
            ContainerRef::Category => Some(&mut self.category_metadata),
            ContainerRef::Subcategory => Some(&mut self.subcategory_metadata),
            ContainerRef::Question(id) => self.question_mut(id).map(|q| &mut q.metadata),
        }
    }
}

/// 按字符数计算长度
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 拆分选项输入：只按逗号分隔，去空白，丢弃空项
pub fn split_options(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_type_round_trips_through_str() {
        for t in AnswerType::ALL {
            assert_eq!(t.as_str().parse::<AnswerType>().unwrap(), t);
        }
        assert!("checkbox".parse::<AnswerType>().is_err());
    }

    #[test]
    fn test_answer_type_serde_lowercase() {
        assert_eq!(serde_json::to_string(&AnswerType::Num).unwrap(), "\"num\"");
        let t: AnswerType = serde_json::from_str("\"list\"").unwrap();
        assert_eq!(t, AnswerType::List);
        assert!(serde_json::from_str::<AnswerType>("\"radio\"").is_err());
    }

    #[test]
    fn test_options_required_only_for_list() {
        let mut q = Question::blank(QuestionId::from_seq(1));
        assert!(!q.options_required());
        q.answer_type = AnswerType::List;
        assert!(q.options_required());
    }

    #[test]
    fn test_split_options() {
        assert_eq!(split_options("A, B ,,C"), vec!["A", "B", "C"]);
        assert_eq!(split_options("Yes; No"), vec!["Yes; No"]);
        assert_eq!(split_options("red\nblue"), vec!["red\nblue"]);
        assert!(split_options("  ,  ").is_empty());
    }

    #[test]
    fn test_char_len_counts_scalars() {
        assert_eq!(char_len("héllo"), 5);
        assert_eq!(char_len("题目"), 2);
    }
}
