//! 序列化服务 - 业务能力层
//!
//! 把表单模型转换成线上结构：`FormRecord`（加载接口同形）和提交用的隐藏字段

use crate::error::AppResult;
use crate::models::event_dates::{EventDates, ValidityWindow};
use crate::models::form::{AnswerType, Form, Question};
use crate::models::record::{FormRecord, HiddenFields, QuestionRecord};
use tracing::debug;

/// 表单序列化器
#[derive(Debug, Clone, Copy, Default)]
pub struct Serializer;

impl Serializer {
    pub fn new() -> Self {
        Self
    }

    /// 表单 → 线上结构；题目按卡片顺序编号，从 1 开始
    pub fn to_record(&self, form: &Form) -> FormRecord {
        let questions = form
            .questions
            .iter()
            .enumerate()
            .map(|(index, q)| self.question_record(q, index as u32 + 1))
            .collect();

        FormRecord {
            title: form.title.clone(),
            category: form.category.clone(),
            subcategory: Some(form.subcategory.clone()).filter(|s| !s.is_empty()),
            event_dates: form.event_dates.to_payload().dates,
            validity_start_date: form.validity.start(),
            validity_end_date: form.validity.end(),
            category_metadata: form.category_metadata.to_metadata(),
            subcategory_metadata: form.subcategory_metadata.to_metadata(),
            questions,
        }
    }

    fn question_record(&self, question: &Question, order: u32) -> QuestionRecord {
        let options = (question.answer_type == AnswerType::List).then(|| {
            question
                .options
                .iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect()
        });
        let ai_instructions = question
            .ai_enabled
            .then(|| question.ai_instructions.clone());

        QuestionRecord {
            id: Some(question.id.clone()),
            reference: question.reference.clone(),
            content: question.content.clone(),
            answer_type: question.answer_type,
            required: question.required,
            question_metadata: question.metadata.to_metadata(),
            order: Some(order),
            options,
            ai_instructions,
        }
    }

    /// 表单 → 隐藏字段
    pub fn hidden_fields(&self, form: &Form) -> AppResult<HiddenFields> {
        let record = self.to_record(form);
        self.hidden_fields_from_record(&record, &form.event_dates, form.validity)
    }

    /// 线上结构 → 隐藏字段
    pub fn hidden_fields_from_record(
        &self,
        record: &FormRecord,
        event_dates: &EventDates,
        validity: ValidityWindow,
    ) -> AppResult<HiddenFields> {
        let questions_input = serde_json::to_string(&record.questions)?;
        debug!("questionsInput: {} 道题, {} 字节", record.questions.len(), questions_input.len());

        Ok(HiddenFields {
            title: record.title.clone(),
            category: record.category.clone(),
            subcategory: record.subcategory.clone().unwrap_or_default(),
            category_metadata_input: serde_json::to_string(&record.category_metadata)?,
            subcategory_metadata_input: serde_json::to_string(&record.subcategory_metadata)?,
            questions_input,
            event_dates_input: serde_json::to_string(&event_dates.to_payload())?,
            validity_start_date: validity.start().map(|d| d.format("%Y-%m-%d").to_string()),
            validity_end_date: validity.end().map(|d| d.format("%Y-%m-%d").to_string()),
        })
    }
}
