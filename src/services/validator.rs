//! 校验服务 - 业务能力层
//!
//! 只负责"这份表单哪里不对"，不修改表单，也不关心界面怎么提示
//!
//! 所有检查都会执行，不在第一个错误处停下；错误按检查顺序收集：
//! 标题 → 分类 → 分类/子分类元数据 → 每道题（引用名、内容、选项、题目元数据）

use crate::models::event_dates::{parse_event_datetime, MAX_EVENT_DATES};
use crate::models::form::{
    char_len, AnswerType, ContainerRef, Form, Question, QuestionId, MAX_CATEGORY_LEN,
    MAX_REFERENCE_LEN, MAX_TITLE_LEN, MIN_LIST_OPTIONS,
};
use crate::models::metadata::{MetadataContainer, MAX_METADATA_FIELDS};
use crate::models::record::FormRecord;
use crate::models::rows::RowId;
use std::collections::HashSet;
use std::fmt;

/// 元数据行中的哪一格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataPart {
    Key,
    Value,
}

/// 题目卡片上的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionField {
    Reference,
    Content,
    AnswerType,
    Options,
    AiInstructions,
}

/// 出错字段的位置
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Title,
    Category,
    Metadata {
        container: ContainerRef,
        row: RowId,
        part: MetadataPart,
    },
    Question {
        id: QuestionId,
        field: QuestionField,
    },
}

impl FieldPath {
    pub fn question(id: &QuestionId, field: QuestionField) -> Self {
        FieldPath::Question {
            id: id.clone(),
            field,
        }
    }

    /// 该字段是否属于某张题目卡片
    pub fn belongs_to(&self, question: &QuestionId) -> bool {
        match self {
            FieldPath::Question { id, .. } => id == question,
            FieldPath::Metadata {
                container: ContainerRef::Question(id),
                ..
            } => id == question,
            _ => false,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Title => f.write_str("title"),
            FieldPath::Category => f.write_str("category"),
            FieldPath::Metadata {
                container,
                row,
                part,
            } => write!(f, "{container}[{}].{part:?}", row.0),
            FieldPath::Question { id, field } => write!(f, "{id}.{field:?}"),
        }
    }
}

/// 一条校验错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: FieldPath,
    /// 汇总列表中的文字
    pub message: String,
    /// 字段旁边的提示
    pub inline: String,
}

/// 一次校验的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    /// 第一个出错的字段，界面滚动并高亮它
    pub fn first_invalid(&self) -> Option<&FieldPath> {
        self.errors.first().map(|e| &e.field)
    }

    /// 汇总提示块
    pub fn summary(&self) -> Option<ErrorSummary> {
        if self.errors.is_empty() {
            return None;
        }
        Some(ErrorSummary {
            heading: SUMMARY_HEADING.to_string(),
            items: self.errors.iter().map(|e| e.message.clone()).collect(),
        })
    }

    fn push(&mut self, field: FieldPath, message: impl Into<String>, inline: impl Into<String>) {
        self.errors.push(ValidationError {
            field,
            message: message.into(),
            inline: inline.into(),
        });
    }
}

const SUMMARY_HEADING: &str = "Please correct the following errors:";

/// 汇总错误块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSummary {
    pub heading: String,
    pub items: Vec<String>,
}

impl fmt::Display for ErrorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.heading)?;
        for item in &self.items {
            writeln!(f, "  - {item}")?;
        }
        Ok(())
    }
}

/// 表单校验器
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// 校验整张表单
    pub fn validate(&self, form: &Form) -> ValidationReport {
        let mut report = ValidationReport::default();

        self.check_title(&form.title, &mut report);
        self.check_category(&form.category, &mut report);

        self.check_metadata(
            &ContainerRef::Category,
            &form.category_metadata,
            "",
            &mut report,
        );
        self.check_metadata(
            &ContainerRef::Subcategory,
            &form.subcategory_metadata,
            "",
            &mut report,
        );

        for (index, question) in form.questions.iter().enumerate() {
            self.check_question(index + 1, question, &mut report);
        }

        report
    }

    fn check_title(&self, title: &str, report: &mut ValidationReport) {
        if title.trim().is_empty() {
            report.push(FieldPath::Title, "Title is required", "Title is required");
        } else if char_len(title) > MAX_TITLE_LEN {
            report.push(
                FieldPath::Title,
                "Title must be less than 200 characters",
                "Title must be less than 200 characters",
            );
        }
    }

    fn check_category(&self, category: &str, report: &mut ValidationReport) {
        if category.trim().is_empty() {
            report.push(
                FieldPath::Category,
                "Category is required",
                "Category is required",
            );
        } else if char_len(category) > MAX_CATEGORY_LEN {
            report.push(
                FieldPath::Category,
                "Category must be less than 100 characters",
                "Category must be less than 100 characters",
            );
        }
    }

    /// 有键无值、重复键
    fn check_metadata(
        &self,
        container_ref: &ContainerRef,
        container: &MetadataContainer,
        prefix: &str,
        report: &mut ValidationReport,
    ) {
        let mut seen = HashSet::new();
        for (row, entry) in container.entries() {
            let key = entry.key.trim();
            if key.is_empty() {
                continue;
            }
            if entry.value.trim().is_empty() {
                report.push(
                    FieldPath::Metadata {
                        container: container_ref.clone(),
                        row,
                        part: MetadataPart::Value,
                    },
                    format!("{prefix}Metadata value is required when key is provided"),
                    "Value is required when key is provided",
                );
            }
            if !seen.insert(key) {
                report.push(
                    FieldPath::Metadata {
                        container: container_ref.clone(),
                        row,
                        part: MetadataPart::Key,
                    },
                    format!("{prefix}Duplicate metadata key \"{key}\""),
                    "Duplicate key found",
                );
            }
        }
    }

    fn check_question(&self, number: usize, question: &Question, report: &mut ValidationReport) {
        let id = &question.id;

        if question.reference.trim().is_empty() {
            report.push(
                FieldPath::question(id, QuestionField::Reference),
                format!("Question {number}: Reference is required"),
                "Question reference is required",
            );
        } else if char_len(&question.reference) > MAX_REFERENCE_LEN {
            report.push(
                FieldPath::question(id, QuestionField::Reference),
                format!("Question {number}: Reference is too long"),
                "Reference must be less than 50 characters",
            );
        }

        if question.content.trim().is_empty() {
            report.push(
                FieldPath::question(id, QuestionField::Content),
                format!("Question {number}: Content is required"),
                "Question content is required",
            );
        }

        if question.answer_type == AnswerType::List
            && count_options(&question.options) < MIN_LIST_OPTIONS
        {
            report.push(
                FieldPath::question(id, QuestionField::Options),
                format!("Question {number}: List options must contain at least two items"),
                "At least two comma-separated options are required",
            );
        }

        self.check_metadata(
            &ContainerRef::Question(id.clone()),
            &question.metadata,
            &format!("Question {number}: "),
            report,
        );
    }

    /// 服务端同款规则，用于直接提交草稿前的检查
    pub fn validate_record(&self, record: &FormRecord) -> Vec<String> {
        let mut errors = Vec::new();

        if record.title.trim().is_empty() {
            errors.push("Form title is required".to_string());
        } else if char_len(&record.title) > MAX_TITLE_LEN {
            errors.push("Form title must be less than 200 characters".to_string());
        }

        if record.category.trim().is_empty() {
            errors.push("Category is required".to_string());
        } else if char_len(&record.category) > MAX_CATEGORY_LEN {
            errors.push("Category must be less than 100 characters".to_string());
        }

        if record.questions.is_empty() {
            errors.push("At least one question is required".to_string());
        }

        for (i, question) in record.questions.iter().enumerate() {
            let number = i + 1;
            if question.reference.trim().is_empty() {
                errors.push(format!("Question {number}: Reference is required"));
            } else if char_len(&question.reference) > MAX_REFERENCE_LEN {
                errors.push(format!(
                    "Question {number}: Reference must be less than 50 characters"
                ));
            }
            if question.content.trim().is_empty() {
                errors.push(format!("Question {number}: Content is required"));
            }
            if question.answer_type == AnswerType::List {
                let options = question.options.as_deref().unwrap_or_default();
                if count_options(options) < MIN_LIST_OPTIONS {
                    errors.push(format!(
                        "Question {number}: List options must contain at least two items"
                    ));
                }
            }
            if question.question_metadata.len() > MAX_METADATA_FIELDS {
                errors.push(format!(
                    "Question {number}: Metadata cannot have more than 20 items"
                ));
            }
        }

        for (label, metadata) in [
            ("Category Metadata", &record.category_metadata),
            ("Subcategory Metadata", &record.subcategory_metadata),
        ] {
            if metadata.len() > MAX_METADATA_FIELDS {
                errors.push(format!("{label} cannot have more than 20 items"));
            }
        }

        let dates: Vec<&String> = record
            .event_dates
            .iter()
            .filter(|d| !d.trim().is_empty())
            .collect();
        if dates.len() > MAX_EVENT_DATES {
            errors.push(format!(
                "Event dates cannot have more than {MAX_EVENT_DATES} items"
            ));
        }
        for (i, date) in dates.iter().enumerate() {
            if parse_event_datetime(date).is_err() {
                errors.push(format!("Event date {}: Invalid date \"{}\"", i + 1, date));
            }
        }

        if let (Some(start), Some(end)) = (record.validity_start_date, record.validity_end_date) {
            if start > end {
                errors.push("Validity start date must not be after the end date".to_string());
            }
        }

        errors
    }
}

fn count_options(options: &[String]) -> usize {
    options.iter().filter(|o| !o.trim().is_empty()).count()
}
