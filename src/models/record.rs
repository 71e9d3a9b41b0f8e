//! 线上数据结构：加载接口的响应、提交用的隐藏字段、加载记录

use super::event_dates::ValidityWindow;
use super::form::{AnswerType, QuestionId};
use super::metadata::Metadata;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// 一道题目的线上形态
///
/// 加载接口返回的题目没有 `id`；提交时 `id` 总是存在
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuestionId>,
    pub reference: String,
    pub content: String,
    #[serde(default)]
    pub answer_type: AnswerType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_instructions: Option<String>,
    /// 放在最后：TOML 中表必须排在普通值之后
    #[serde(default)]
    pub question_metadata: Metadata,
}

/// 完整表单的线上形态，也是 TOML 草稿的格式
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormRecord {
    pub title: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_dates: Vec<String>,
    #[serde(
        default,
        deserialize_with = "date_prefix",
        skip_serializing_if = "Option::is_none"
    )]
    pub validity_start_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "date_prefix",
        skip_serializing_if = "Option::is_none"
    )]
    pub validity_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub category_metadata: Metadata,
    #[serde(default)]
    pub subcategory_metadata: Metadata,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
}

/// 接受 `2026-03-01`，也接受服务端存成日期时间的 `2026-03-01T00:00:00`
fn date_prefix<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            NaiveDate::parse_from_str(v.get(..10).unwrap_or(v), "%Y-%m-%d")
                .map_err(serde::de::Error::custom)
        })
        .transpose()
}

impl FormRecord {
    /// 题目按 `order` 升序排列，缺少 `order` 的排在最后，其余保持原顺序
    pub fn questions_in_order(&self) -> Vec<&QuestionRecord> {
        let mut questions: Vec<&QuestionRecord> = self.questions.iter().collect();
        questions.sort_by_key(|q| q.order.unwrap_or(u32::MAX));
        questions
    }

    pub fn validity(&self) -> ValidityWindow {
        ValidityWindow::from_dates(self.validity_start_date, self.validity_end_date)
    }
}

/// `GET /api/forms/{id}` 的响应信封
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormEnvelope {
    pub success: bool,
    #[serde(default)]
    pub form: Option<FormRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `POST /api/form-load-history` 的请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadHistoryEntry {
    pub form_id: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub error_message: Option<String>,
}

/// 历史记录列表中的一条
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoadHistoryRecord {
    pub loaded_at: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// `GET /api/form/{id}/load-history` 的分页响应
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoadHistoryPage {
    pub history: Vec<LoadHistoryRecord>,
    pub current_page: u32,
    pub pages: u32,
    pub total: u64,
}

impl LoadHistoryPage {
    /// 翻页请求是否落在有效范围内
    pub fn page_in_range(&self, page: u32) -> bool {
        page >= 1 && page <= self.pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.pages
    }
}

/// 原生表单提交时写入的隐藏字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenFields {
    pub title: String,
    pub category: String,
    pub subcategory: String,
    pub category_metadata_input: String,
    pub subcategory_metadata_input: String,
    pub questions_input: String,
    pub event_dates_input: String,
    pub validity_start_date: Option<String>,
    pub validity_end_date: Option<String>,
}

impl HiddenFields {
    /// 表单字段名和值，按提交顺序
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("title", self.title.clone()),
            ("category", self.category.clone()),
            ("subcategory", self.subcategory.clone()),
            ("categoryMetadataInput", self.category_metadata_input.clone()),
            ("subcategoryMetadataInput", self.subcategory_metadata_input.clone()),
            ("questionsInput", self.questions_input.clone()),
            ("eventDatesInput", self.event_dates_input.clone()),
        ];
        if let Some(start) = &self.validity_start_date {
            pairs.push(("validity_start_date", start.clone()));
        }
        if let Some(end) = &self.validity_end_date {
            pairs.push(("validity_end_date", end.clone()));
        }
        pairs
    }

    /// `multipart/form-data` 请求体
    pub fn to_multipart(&self) -> reqwest::multipart::Form {
        self.pairs()
            .into_iter()
            .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                form.text(name, value)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_without_form() {
        let envelope: FormEnvelope =
            serde_json::from_str(r#"{"success": false, "error": "not found"}"#).unwrap();
        assert!(!envelope.success);
        assert!(envelope.form.is_none());
        assert_eq!(envelope.error.as_deref(), Some("not found"));
    }

    #[test]
    fn test_form_record_tolerates_nulls() {
        let json = r#"{
            "title": "Survey",
            "category": "Health",
            "subcategory": null,
            "category_metadata": null,
            "subcategory_metadata": {"k": "v"},
            "questions": [
                {"reference": "Q1", "content": "C1", "answer_type": "text", "required": true, "order": 1}
            ]
        }"#;
        let record: FormRecord = serde_json::from_str(json).unwrap();
        assert!(record.subcategory.is_none());
        assert!(record.category_metadata.is_empty());
        assert_eq!(record.subcategory_metadata.get("k"), Some("v"));
        assert_eq!(record.questions[0].order, Some(1));
        assert!(record.questions[0].options.is_none());
    }

    #[test]
    fn test_validity_dates_round_trip() {
        let json = r#"{"title": "T", "category": "C", "validity_start_date": "2026-03-01", "validity_end_date": "2026-03-31"}"#;
        let record: FormRecord = serde_json::from_str(json).unwrap();
        let window = record.validity();
        assert_eq!(window.start(), NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(window.end(), NaiveDate::from_ymd_opt(2026, 3, 31));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["validity_end_date"], "2026-03-31");
        let stored: FormRecord = serde_json::from_str(
            r#"{"title": "T", "category": "C", "validity_start_date": "2026-03-01T00:00:00", "validity_end_date": null}"#,
        )
        .unwrap();
        assert_eq!(stored.validity_start_date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert!(stored.validity_end_date.is_none());

        let bare = serde_json::to_value(FormRecord::default()).unwrap();
        assert!(bare.get("validity_start_date").is_none());
    }

    #[test]
    fn test_questions_in_order_sorts_missing_last() {
        let q = |r: &str, order: Option<u32>| QuestionRecord {
            reference: r.to_string(),
            order,
            ..Default::default()
        };
        let record = FormRecord {
            questions: vec![q("c", None), q("b", Some(2)), q("a", Some(1))],
            ..Default::default()
        };
        let refs: Vec<&str> = record
            .questions_in_order()
            .iter()
            .map(|q| q.reference.as_str())
            .collect();
        assert_eq!(refs, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_history_entry_uses_camel_case() {
        let entry = LoadHistoryEntry {
            form_id: "42".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            success: false,
            error_message: Some("not found".to_string()),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["formId"], "42");
        assert_eq!(value["errorMessage"], "not found");
        assert!(value["timestamp"].as_str().unwrap().starts_with("2024-05-01T10:00:00"));
    }

    #[test]
    fn test_history_page_bounds() {
        let page = LoadHistoryPage {
            history: Vec::new(),
            current_page: 1,
            pages: 3,
            total: 25,
        };
        assert!(!page.page_in_range(0));
        assert!(page.page_in_range(3));
        assert!(!page.page_in_range(4));
        assert!(!page.has_previous());
        assert!(page.has_next());
    }
}
