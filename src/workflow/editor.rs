//! 表单编辑器 - 流程层
//!
//! 核心职责：持有正在编辑的表单，以及围绕它的显示状态
//!
//! - 题目卡片：增删、排序、编号与导航（编号和导航总是从卡片顺序推出，不单独保存）
//! - 元数据：每个容器 0..=20 行，计数显示即行数
//! - 字段错误、汇总、焦点；提示条；提交按钮；加载失败面板
//!
//! 所有删除都按 id 进行，重复删除同一个 id 不会误删别的行

use crate::models::event_dates::{EventDates, ValidityWindow, MAX_EVENT_DATES};
use crate::models::form::{split_options, AnswerType, ContainerRef, Form, Question, QuestionId};
use crate::models::metadata::MAX_METADATA_FIELDS;
use crate::models::record::{FormRecord, QuestionRecord};
use crate::models::rows::RowId;
use crate::services::validator::{ErrorSummary, FieldPath, MetadataPart, QuestionField, Validator};
use crate::workflow::notices::{NoticeBoard, NoticeLevel};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use tracing::{debug, error, info, warn};

/// 删除最后一道题时的提示
pub const MIN_QUESTIONS_MESSAGE: &str = "At least one question is required";
/// 导航中没有引用名时显示的文字
pub const UNDEFINED_REFERENCE: &str = "Undefined reference";
/// 提交按钮空闲时的文字
pub const SUBMIT_IDLE_LABEL: &str = "Save Form";
/// 提交按钮忙碌时的文字
pub const SUBMIT_BUSY_LABEL: &str = "Saving...";

pub fn max_metadata_message() -> String {
    format!("Maximum {MAX_METADATA_FIELDS} metadata fields allowed")
}

pub fn max_event_dates_message() -> String {
    format!("Maximum {MAX_EVENT_DATES} event dates allowed")
}

/// 第 n 道题的标题
pub fn question_label(number: usize) -> String {
    format!("Question {number}")
}

/// 导航列表中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub id: QuestionId,
    pub number: usize,
    pub text: String,
}

/// 提交按钮状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitButton {
    busy: bool,
}

impl SubmitButton {
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_disabled(&self) -> bool {
        self.busy
    }

    pub fn label(&self) -> &'static str {
        if self.busy {
            SUBMIT_BUSY_LABEL
        } else {
            SUBMIT_IDLE_LABEL
        }
    }
}

/// 加载失败面板上的按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderAction {
    Retry,
    CreateNew,
}

/// 加载重试用尽后显示的面板，用户处理前一直保留
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    pub message: String,
    pub actions: Vec<LoaderAction>,
}

impl ErrorPanel {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            actions: vec![LoaderAction::Retry, LoaderAction::CreateNew],
        }
    }
}

/// 载入结果：题目数，以及没能原样放进编辑器的内容
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateReport {
    pub questions: usize,
    pub problems: Vec<String>,
}

impl PopulateReport {
    /// 载入的内容与给出的数据一致
    pub fn is_complete(&self) -> bool {
        self.problems.is_empty()
    }
}

/// 表单编辑器
#[derive(Debug, Clone)]
pub struct FormEditor {
    form: Form,
    next_seq: u64,
    field_errors: HashMap<FieldPath, String>,
    summary: Option<ErrorSummary>,
    focused: Option<FieldPath>,
    notices: NoticeBoard,
    submit_button: SubmitButton,
    error_panel: Option<ErrorPanel>,
}

impl Default for FormEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl FormEditor {
    /// 新编辑器带一张空白卡片
    pub fn new() -> Self {
        let mut editor = Self {
            form: Form::default(),
            next_seq: 0,
            field_errors: HashMap::new(),
            summary: None,
            focused: None,
            notices: NoticeBoard::new(),
            submit_button: SubmitButton::default(),
            error_panel: None,
        };
        editor.push_blank_question();
        editor
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    // ========== 基本字段 ==========

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.form.title = title.into();
        self.clear_field_error(&FieldPath::Title);
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.form.category = category.into();
        self.clear_field_error(&FieldPath::Category);
    }

    pub fn set_subcategory(&mut self, subcategory: impl Into<String>) {
        self.form.subcategory = subcategory.into();
    }

    // ========== 题目卡片 ==========

    fn allocate_id(&mut self) -> QuestionId {
        self.next_seq += 1;
        QuestionId::from_seq(self.next_seq)
    }

    fn push_blank_question(&mut self) -> QuestionId {
        let id = self.allocate_id();
        self.form.questions.push(Question::blank(id.clone()));
        id
    }

    /// 追加一张卡片，可选地用已有数据预填
    ///
    /// 数据中的题目元数据超过容器上限时不添加，返回 None
    pub fn add_question(&mut self, data: Option<&QuestionRecord>) -> Option<QuestionId> {
        let id = self.allocate_id();
        let mut question = Question::blank(id.clone());

        if let Some(data) = data {
            question.reference = data.reference.clone();
            question.content = data.content.clone();
            question.answer_type = data.answer_type;
            question.required = data.required;
            question.options = data.options.clone().unwrap_or_default();
            if let Some(instructions) = &data.ai_instructions {
                question.ai_enabled = true;
                question.ai_instructions = instructions.clone();
            }
            if !question.metadata.replace_with(&data.question_metadata) {
                error!(
                    "❌ 无法创建题目卡片 {}：题目元数据 {} 条超过上限 {}",
                    id,
                    data.question_metadata.len(),
                    MAX_METADATA_FIELDS
                );
                self.notices.push(
                    NoticeLevel::Danger,
                    format!(
                        "Could not add question \"{}\": {}",
                        data.reference,
                        max_metadata_message()
                    ),
                );
                return None;
            }
        }

        debug!("➕ 新增题目卡片 {}", id);
        self.form.questions.push(question);
        Some(id)
    }

    /// 删除一张卡片；最后一张不能删，未知 id 什么也不做
    pub fn remove_question(&mut self, id: &QuestionId) -> bool {
        let Some(position) = self.form.position(id) else {
            debug!("题目 {} 已不存在，忽略删除", id);
            return false;
        };

        if self.form.questions.len() <= 1 {
            warn!("⚠️ 拒绝删除最后一道题");
            self.notices.push(NoticeLevel::Warning, MIN_QUESTIONS_MESSAGE);
            return false;
        }

        self.form.questions.remove(position);
        self.field_errors.retain(|path, _| !path.belongs_to(id));
        if self.focused.as_ref().is_some_and(|f| f.belongs_to(id)) {
            self.focused = None;
        }
        debug!("🗑️ 删除题目 {}，剩余 {} 道", id, self.form.questions.len());
        true
    }

    /// 移动卡片到指定位置（超出范围时放到末尾）
    pub fn move_question(&mut self, id: &QuestionId, to_index: usize) -> bool {
        let Some(from) = self.form.position(id) else {
            return false;
        };
        let question = self.form.questions.remove(from);
        let to = to_index.min(self.form.questions.len());
        self.form.questions.insert(to, question);
        from != to
    }

    pub fn set_answer_type(&mut self, id: &QuestionId, answer_type: AnswerType) -> bool {
        let Some(question) = self.form.question_mut(id) else {
            return false;
        };
        question.answer_type = answer_type;
        if answer_type != AnswerType::List {
            self.clear_field_error(&FieldPath::question(id, QuestionField::Options));
        }
        true
    }

    pub fn edit_reference(&mut self, id: &QuestionId, text: impl Into<String>) -> bool {
        let Some(question) = self.form.question_mut(id) else {
            return false;
        };
        question.reference = text.into();
        self.clear_field_error(&FieldPath::question(id, QuestionField::Reference));
        true
    }

    pub fn edit_content(&mut self, id: &QuestionId, text: impl Into<String>) -> bool {
        let Some(question) = self.form.question_mut(id) else {
            return false;
        };
        question.content = text.into();
        self.clear_field_error(&FieldPath::question(id, QuestionField::Content));
        true
    }

    pub fn set_required(&mut self, id: &QuestionId, required: bool) -> bool {
        match self.form.question_mut(id) {
            Some(question) => {
                question.required = required;
                true
            }
            None => false,
        }
    }

    /// 选项输入框：只按逗号分隔
    pub fn set_options_text(&mut self, id: &QuestionId, text: &str) -> bool {
        let Some(question) = self.form.question_mut(id) else {
            return false;
        };
        question.options = split_options(text);
        self.clear_field_error(&FieldPath::question(id, QuestionField::Options));
        true
    }

    /// 标签式选项输入：添加一个选项，空白或重复的忽略
    pub fn add_option_tag(&mut self, id: &QuestionId, tag: &str) -> bool {
        let tag = tag.trim();
        let Some(question) = self.form.question_mut(id) else {
            return false;
        };
        if tag.is_empty() || question.options.iter().any(|o| o == tag) {
            return false;
        }
        question.options.push(tag.to_string());
        self.clear_field_error(&FieldPath::question(id, QuestionField::Options));
        true
    }

    pub fn remove_option_tag(&mut self, id: &QuestionId, tag: &str) -> bool {
        let Some(question) = self.form.question_mut(id) else {
            return false;
        };
        let before = question.options.len();
        question.options.retain(|o| o != tag);
        question.options.len() != before
    }

    pub fn set_ai_enabled(&mut self, id: &QuestionId, enabled: bool) -> bool {
        let Some(question) = self.form.question_mut(id) else {
            return false;
        };
        question.ai_enabled = enabled;
        if !enabled {
            self.clear_field_error(&FieldPath::question(id, QuestionField::AiInstructions));
        }
        true
    }

    pub fn set_ai_instructions(&mut self, id: &QuestionId, text: impl Into<String>) -> bool {
        let Some(question) = self.form.question_mut(id) else {
            return false;
        };
        question.ai_instructions = text.into();
        self.clear_field_error(&FieldPath::question(id, QuestionField::AiInstructions));
        true
    }

    /// 题号（从 1 开始）
    pub fn question_number(&self, id: &QuestionId) -> Option<usize> {
        self.form.position(id).map(|p| p + 1)
    }

    pub fn question_count(&self) -> usize {
        self.form.questions.len()
    }

    /// 导航列表，按卡片顺序
    pub fn navigation(&self) -> Vec<NavEntry> {
        self.form
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let reference = question.reference.trim();
                let reference = if reference.is_empty() {
                    UNDEFINED_REFERENCE
                } else {
                    reference
                };
                NavEntry {
                    id: question.id.clone(),
                    number: index + 1,
                    text: format!("{}: {}", question_label(index + 1), reference),
                }
            })
            .collect()
    }

    // ========== 元数据 ==========

    /// 追加一行；已满时给出警告且不添加
    pub fn add_metadata_field(&mut self, container: &ContainerRef) -> Option<RowId> {
        let Some(target) = self.form.container_mut(container) else {
            debug!("元数据容器 {} 不存在", container);
            return None;
        };
        if target.is_full() {
            warn!("⚠️ {} 已达到 {} 行上限", container, MAX_METADATA_FIELDS);
            self.notices
                .push(NoticeLevel::Warning, max_metadata_message());
            return None;
        }
        target.add_field()
    }

    pub fn remove_metadata_field(&mut self, container: &ContainerRef, row: RowId) -> bool {
        let removed = self
            .form
            .container_mut(container)
            .is_some_and(|c| c.remove_field(row));
        if removed {
            self.clear_row_errors(container, row);
        }
        removed
    }

    /// 删除最后一行；没有行时什么也不做
    pub fn remove_last_field(&mut self, container: &ContainerRef) -> bool {
        let Some(target) = self.form.container_mut(container) else {
            return false;
        };
        let Some(last) = target.ids().last() else {
            return false;
        };
        self.remove_metadata_field(container, last)
    }

    /// 计数器 "+" 按钮
    pub fn increase_metadata(&mut self, container: &ContainerRef) -> Option<RowId> {
        self.add_metadata_field(container)
    }

    /// 计数器 "-" 按钮
    pub fn decrease_metadata(&mut self, container: &ContainerRef) -> bool {
        self.remove_last_field(container)
    }

    /// 直接把行数改成 n；超过上限时警告且不做改动
    pub fn set_metadata_count(&mut self, container: &ContainerRef, count: usize) -> bool {
        if count > MAX_METADATA_FIELDS {
            warn!("⚠️ 元数据行数 {} 超过上限 {}", count, MAX_METADATA_FIELDS);
            self.notices
                .push(NoticeLevel::Warning, max_metadata_message());
            return false;
        }
        let Some(target) = self.form.container_mut(container) else {
            return false;
        };
        let removed: Vec<RowId> = target.ids().skip(count).collect();
        let changed = target.set_count(count);
        for row in removed {
            self.clear_row_errors(container, row);
        }
        changed
    }

    /// 计数显示
    pub fn metadata_counter(&self, container: &ContainerRef) -> usize {
        self.form
            .container(container)
            .map(|c| c.counter())
            .unwrap_or(0)
    }

    pub fn set_metadata_key(
        &mut self,
        container: &ContainerRef,
        row: RowId,
        key: impl Into<String>,
    ) -> bool {
        let updated = self
            .form
            .container_mut(container)
            .is_some_and(|c| c.set_key(row, key));
        if updated {
            self.clear_field_error(&FieldPath::Metadata {
                container: container.clone(),
                row,
                part: MetadataPart::Key,
            });
        }
        updated
    }

    pub fn set_metadata_value(
        &mut self,
        container: &ContainerRef,
        row: RowId,
        value: impl Into<String>,
    ) -> bool {
        let updated = self
            .form
            .container_mut(container)
            .is_some_and(|c| c.set_value(row, value));
        if updated {
            self.clear_field_error(&FieldPath::Metadata {
                container: container.clone(),
                row,
                part: MetadataPart::Value,
            });
        }
        updated
    }

    fn clear_row_errors(&mut self, container: &ContainerRef, row: RowId) {
        self.field_errors.retain(|path, _| {
            !matches!(path, FieldPath::Metadata { container: c, row: r, .. } if c == container && *r == row)
        });
    }

    // ========== 活动日期与有效期 ==========

    /// 追加活动日期；未给出时取当前时间
    pub fn add_event_date(&mut self, value: Option<NaiveDateTime>) -> Option<RowId> {
        let row = self.form.event_dates.add(value);
        if row.is_none() {
            warn!("⚠️ 活动日期已达到 {} 个上限", MAX_EVENT_DATES);
            self.notices
                .push(NoticeLevel::Warning, max_event_dates_message());
        }
        row
    }

    pub fn remove_event_date(&mut self, row: RowId) -> bool {
        self.form.event_dates.remove(row)
    }

    pub fn set_event_date(&mut self, row: RowId, value: NaiveDateTime) -> bool {
        self.form.event_dates.set(row, value)
    }

    pub fn event_dates(&self) -> &EventDates {
        &self.form.event_dates
    }

    pub fn set_validity_start(&mut self, start: Option<NaiveDate>) {
        self.form.validity.set_start(start);
    }

    pub fn set_validity_end(&mut self, end: Option<NaiveDate>) {
        self.form.validity.set_end(end);
    }

    pub fn validity(&self) -> ValidityWindow {
        self.form.validity
    }

    // ========== 校验状态 ==========

    /// 清除旧错误后重新校验；记录字段错误、汇总和焦点
    pub fn validate_form(&mut self) -> bool {
        self.clear_all_errors();

        let report = Validator::new().validate(&self.form);
        if report.is_valid() {
            debug!("✓ 表单校验通过");
            return true;
        }

        for err in report.errors() {
            self.field_errors
                .entry(err.field.clone())
                .or_insert_with(|| err.inline.clone());
        }
        self.summary = report.summary();
        self.focused = report.first_invalid().cloned();

        warn!("⚠️ 表单校验未通过，共 {} 处错误", report.errors().len());
        for message in report.messages() {
            debug!("  - {}", message);
        }
        false
    }

    pub fn clear_all_errors(&mut self) {
        self.field_errors.clear();
        self.summary = None;
        self.focused = None;
    }

    fn clear_field_error(&mut self, path: &FieldPath) {
        self.field_errors.remove(path);
    }

    /// 某个字段旁边的提示
    pub fn field_error(&self, path: &FieldPath) -> Option<&str> {
        self.field_errors.get(path).map(String::as_str)
    }

    pub fn field_error_count(&self) -> usize {
        self.field_errors.len()
    }

    pub fn error_summary(&self) -> Option<&ErrorSummary> {
        self.summary.as_ref()
    }

    pub fn focused_field(&self) -> Option<&FieldPath> {
        self.focused.as_ref()
    }

    // ========== 提示条 ==========

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) -> u64 {
        self.notices.push(level, message)
    }

    pub fn dismiss_notice(&mut self, id: u64) -> bool {
        self.notices.dismiss(id)
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    // ========== 提交按钮 ==========

    pub fn submit_button(&self) -> SubmitButton {
        self.submit_button
    }

    /// 进入忙碌状态；守卫释放时按钮恢复
    pub fn begin_submit(&mut self) -> SubmitGuard<'_> {
        if self.submit_button.busy {
            warn!("⚠️ 上一次提交尚未结束，仍然继续");
        }
        self.submit_button.busy = true;
        SubmitGuard { editor: self }
    }

    // ========== 加载失败面板 ==========

    pub fn error_panel(&self) -> Option<&ErrorPanel> {
        self.error_panel.as_ref()
    }

    pub fn show_error_panel(&mut self, message: impl Into<String>) {
        self.error_panel = Some(ErrorPanel::new(message));
    }

    pub fn clear_error_panel(&mut self) {
        self.error_panel = None;
    }

    // ========== 整体重建 ==========

    /// 用加载到的表单重建全部内容，题目按 `order` 排序
    ///
    /// 放不下或无法解析的部分会被丢弃，并写进返回的报告
    pub fn populate(&mut self, record: &FormRecord) -> PopulateReport {
        self.clear_all_errors();
        self.error_panel = None;
        let mut problems = Vec::new();

        self.form.title = record.title.clone();
        self.form.category = record.category.clone();
        self.form.subcategory = record.subcategory.clone().unwrap_or_default();
        self.form.validity = record.validity();

        for (label, target, source) in [
            (
                "Category Metadata",
                &mut self.form.category_metadata,
                &record.category_metadata,
            ),
            (
                "Subcategory Metadata",
                &mut self.form.subcategory_metadata,
                &record.subcategory_metadata,
            ),
        ] {
            if !target.replace_with(source) {
                warn!("⚠️ {} 超过 {} 条，多余部分已丢弃", label, MAX_METADATA_FIELDS);
                problems.push(format!(
                    "{label}: only the first {MAX_METADATA_FIELDS} of {} items were loaded",
                    source.len()
                ));
            }
        }

        for date in self.form.event_dates.load_valid(&record.event_dates) {
            warn!("⚠️ 活动日期无法载入，已跳过: {}", date);
            problems.push(format!("Event date \"{date}\" was dropped"));
        }

        self.form.questions.clear();
        for question in record.questions_in_order() {
            if self.add_question(Some(question)).is_none() {
                problems.push(format!(
                    "Question \"{}\" was skipped: {}",
                    question.reference,
                    max_metadata_message()
                ));
            }
        }
        if self.form.questions.is_empty() {
            self.push_blank_question();
        }

        info!(
            "✓ 表单已载入: {} ({} 道题)",
            self.form.title,
            self.form.questions.len()
        );
        PopulateReport {
            questions: self.form.questions.len(),
            problems,
        }
    }

    /// 丢弃当前内容，换成空白表单
    pub fn reset(&mut self) {
        self.form = Form::default();
        self.clear_all_errors();
        self.error_panel = None;
        self.push_blank_question();
        info!("🆕 已新建空白表单");
    }
}

/// 提交期间的忙碌守卫
///
/// 离开作用域时（包括出错提前返回）按钮恢复可用
#[derive(Debug)]
pub struct SubmitGuard<'a> {
    editor: &'a mut FormEditor,
}

impl Deref for SubmitGuard<'_> {
    type Target = FormEditor;

    fn deref(&self) -> &Self::Target {
        self.editor
    }
}

impl DerefMut for SubmitGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.editor
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.editor.submit_button.busy = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::metadata::Metadata;

    fn first_id(editor: &FormEditor) -> QuestionId {
        editor.form().questions[0].id.clone()
    }

    #[test]
    fn test_new_editor_has_one_blank_card() {
        let editor = FormEditor::new();
        assert_eq!(editor.question_count(), 1);
        assert_eq!(first_id(&editor).as_str(), "question_1");
        assert_eq!(editor.submit_button().label(), SUBMIT_IDLE_LABEL);
    }

    #[test]
    fn test_remove_last_question_is_refused() {
        let mut editor = FormEditor::new();
        let id = first_id(&editor);
        assert!(!editor.remove_question(&id));
        assert_eq!(editor.question_count(), 1);
        assert!(editor
            .notices()
            .contains(NoticeLevel::Warning, MIN_QUESTIONS_MESSAGE));
    }

    #[test]
    fn test_remove_middle_renumbers() {
        let mut editor = FormEditor::new();
        let first = first_id(&editor);
        let second = editor.add_question(None).unwrap();
        let third = editor.add_question(None).unwrap();

        assert!(editor.remove_question(&second));
        assert_eq!(editor.question_number(&first), Some(1));
        assert_eq!(editor.question_number(&third), Some(2));
        assert_eq!(editor.question_number(&second), None);

        // 重复删除同一个 id 不影响其他卡片
        assert!(!editor.remove_question(&second));
        assert_eq!(editor.question_count(), 2);
    }

    #[test]
    fn test_navigation_uses_reference_or_placeholder() {
        let mut editor = FormEditor::new();
        let first = first_id(&editor);
        editor.add_question(None);
        editor.edit_reference(&first, "age");

        let nav: Vec<String> = editor.navigation().into_iter().map(|e| e.text).collect();
        assert_eq!(nav, vec!["Question 1: age", "Question 2: Undefined reference"]);
    }

    #[test]
    fn test_move_question_updates_numbers() {
        let mut editor = FormEditor::new();
        let first = first_id(&editor);
        let second = editor.add_question(None).unwrap();

        assert!(editor.move_question(&second, 0));
        assert_eq!(editor.question_number(&second), Some(1));
        assert_eq!(editor.question_number(&first), Some(2));
        assert!(!editor.move_question(&first, 99));
    }

    #[test]
    fn test_add_question_prefills_from_record() {
        let mut editor = FormEditor::new();
        let record = QuestionRecord {
            reference: "colour".to_string(),
            content: "Favourite colour?".to_string(),
            answer_type: AnswerType::List,
            options: Some(vec!["red".to_string(), "blue".to_string()]),
            ai_instructions: Some("be brief".to_string()),
            question_metadata: [("scale", "1")].into_iter().collect(),
            ..Default::default()
        };
        let id = editor.add_question(Some(&record)).unwrap();
        let question = editor.form().question(&id).unwrap();

        assert_eq!(question.options, vec!["red", "blue"]);
        assert!(question.ai_enabled);
        assert_eq!(question.metadata.counter(), 1);
    }

    #[test]
    fn test_add_question_with_too_much_metadata_fails() {
        let mut editor = FormEditor::new();
        let metadata: Metadata = (0..21).map(|i| (format!("k{i}"), "v")).collect();
        let record = QuestionRecord {
            question_metadata: metadata,
            ..Default::default()
        };
        assert!(editor.add_question(Some(&record)).is_none());
        assert_eq!(editor.question_count(), 1);
        assert_eq!(
            editor.notices().last().map(|n| n.level),
            Some(NoticeLevel::Danger)
        );
    }

    #[test]
    fn test_metadata_counter_tracks_rows() {
        let mut editor = FormEditor::new();
        let container = ContainerRef::Category;

        for _ in 0..MAX_METADATA_FIELDS {
            assert!(editor.increase_metadata(&container).is_some());
        }
        assert_eq!(editor.metadata_counter(&container), 20);

        assert!(editor.increase_metadata(&container).is_none());
        assert_eq!(editor.metadata_counter(&container), 20);
        assert!(editor
            .notices()
            .contains(NoticeLevel::Warning, "Maximum 20 metadata fields allowed"));

        for _ in 0..25 {
            editor.decrease_metadata(&container);
        }
        assert_eq!(editor.metadata_counter(&container), 0);
    }

    #[test]
    fn test_set_metadata_count() {
        let mut editor = FormEditor::new();
        let container = ContainerRef::Subcategory;
        assert!(editor.set_metadata_count(&container, 5));
        assert_eq!(editor.metadata_counter(&container), 5);
        assert!(editor.set_metadata_count(&container, 2));
        assert_eq!(editor.metadata_counter(&container), 2);
        assert!(!editor.set_metadata_count(&container, 21));
        assert_eq!(editor.metadata_counter(&container), 2);
    }

    #[test]
    fn test_remove_metadata_row_is_idempotent() {
        let mut editor = FormEditor::new();
        let container = ContainerRef::Question(first_id(&editor));
        let a = editor.add_metadata_field(&container).unwrap();
        let b = editor.add_metadata_field(&container).unwrap();

        assert!(editor.remove_metadata_field(&container, a));
        assert!(!editor.remove_metadata_field(&container, a));
        assert_eq!(editor.metadata_counter(&container), 1);
        assert!(editor.form().container(&container).unwrap().get(b).is_some());
    }

    #[test]
    fn test_validate_form_records_and_clears_errors() {
        let mut editor = FormEditor::new();
        let id = first_id(&editor);

        assert!(!editor.validate_form());
        assert_eq!(editor.focused_field(), Some(&FieldPath::Title));
        assert!(editor.field_error(&FieldPath::Title).is_some());
        let reference = FieldPath::question(&id, QuestionField::Reference);
        assert!(editor.field_error(&reference).is_some());

        editor.edit_reference(&id, "q1");
        assert!(editor.field_error(&reference).is_none());
        editor.set_title("Survey");
        assert!(editor.field_error(&FieldPath::Title).is_none());

        editor.set_category("General");
        editor.edit_content(&id, "How old are you?");
        assert!(editor.validate_form());
        assert_eq!(editor.field_error_count(), 0);
        assert!(editor.error_summary().is_none());
    }

    #[test]
    fn test_switching_away_from_list_clears_options_error() {
        let mut editor = FormEditor::new();
        let id = first_id(&editor);
        editor.set_answer_type(&id, AnswerType::List);
        editor.validate_form();
        let options = FieldPath::question(&id, QuestionField::Options);
        assert!(editor.field_error(&options).is_some());

        editor.set_answer_type(&id, AnswerType::Text);
        assert!(editor.field_error(&options).is_none());
    }

    #[test]
    fn test_semicolons_do_not_split_options() {
        let mut editor = FormEditor::new();
        let id = first_id(&editor);
        editor.set_title("T");
        editor.set_category("C");
        editor.edit_reference(&id, "q");
        editor.edit_content(&id, "c");
        editor.set_answer_type(&id, AnswerType::List);

        editor.set_options_text(&id, "Yes; No");
        assert_eq!(editor.form().question(&id).unwrap().options, vec!["Yes; No"]);
        assert!(!editor.validate_form());

        editor.set_options_text(&id, "Yes, No");
        assert!(editor.validate_form());
    }

    #[test]
    fn test_option_tags() {
        let mut editor = FormEditor::new();
        let id = first_id(&editor);
        assert!(editor.add_option_tag(&id, " yes "));
        assert!(!editor.add_option_tag(&id, "yes"));
        assert!(!editor.add_option_tag(&id, "  "));
        assert!(editor.add_option_tag(&id, "no"));
        assert!(editor.remove_option_tag(&id, "yes"));
        assert_eq!(editor.form().question(&id).unwrap().options, vec!["no"]);
    }

    #[test]
    fn test_submit_guard_restores_button() {
        let mut editor = FormEditor::new();
        {
            let guard = editor.begin_submit();
            assert!(guard.submit_button().is_busy());
            assert_eq!(guard.submit_button().label(), SUBMIT_BUSY_LABEL);
        }
        assert!(!editor.submit_button().is_disabled());
    }

    #[test]
    fn test_populate_sorts_by_order_and_keeps_one_card() {
        let mut editor = FormEditor::new();
        let record = FormRecord {
            title: "T".to_string(),
            category: "C".to_string(),
            questions: vec![
                QuestionRecord {
                    reference: "second".to_string(),
                    order: Some(2),
                    ..Default::default()
                },
                QuestionRecord {
                    reference: "last".to_string(),
                    ..Default::default()
                },
                QuestionRecord {
                    reference: "first".to_string(),
                    order: Some(1),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(editor.populate(&record).questions, 3);
        let refs: Vec<&str> = editor
            .form()
            .questions
            .iter()
            .map(|q| q.reference.as_str())
            .collect();
        assert_eq!(refs, vec!["first", "second", "last"]);

        let empty = FormRecord::default();
        assert_eq!(editor.populate(&empty).questions, 1);
    }

    #[test]
    fn test_populate_reports_what_it_dropped() {
        let crowded: Metadata = (0..21).map(|i| (format!("k{i}"), "v".to_string())).collect();
        let record = FormRecord {
            title: "T".to_string(),
            category: "C".to_string(),
            event_dates: vec!["2026-05-01T09:30".to_string(), "garbage".to_string()],
            category_metadata: (0..25).map(|i| (format!("k{i}"), "v".to_string())).collect(),
            questions: vec![
                QuestionRecord {
                    reference: "kept".to_string(),
                    content: "c".to_string(),
                    ..Default::default()
                },
                QuestionRecord {
                    reference: "crowded".to_string(),
                    content: "c".to_string(),
                    question_metadata: crowded,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let mut editor = FormEditor::new();
        let report = editor.populate(&record);
        assert!(!report.is_complete());
        assert_eq!(report.questions, 1);
        assert_eq!(
            report.problems,
            vec![
                "Category Metadata: only the first 20 of 25 items were loaded".to_string(),
                "Event date \"garbage\" was dropped".to_string(),
                format!("Question \"crowded\" was skipped: {}", max_metadata_message()),
            ]
        );
        assert_eq!(editor.event_dates().to_payload().dates, vec!["2026-05-01T09:30"]);
        assert_eq!(editor.metadata_counter(&ContainerRef::Category), MAX_METADATA_FIELDS);
    }

    #[test]
    fn test_populate_keeps_validity_window() {
        let record = FormRecord {
            title: "T".to_string(),
            category: "C".to_string(),
            validity_start_date: NaiveDate::from_ymd_opt(2026, 4, 1),
            validity_end_date: NaiveDate::from_ymd_opt(2026, 4, 30),
            ..Default::default()
        };
        let mut editor = FormEditor::new();
        assert!(editor.populate(&record).is_complete());
        assert_eq!(editor.validity().start(), NaiveDate::from_ymd_opt(2026, 4, 1));
        assert_eq!(editor.validity().end(), NaiveDate::from_ymd_opt(2026, 4, 30));
    }

    #[test]
    fn test_reset_clears_panel() {
        let mut editor = FormEditor::new();
        editor.set_title("Old");
        editor.show_error_panel("boom");
        editor.reset();
        assert!(editor.error_panel().is_none());
        assert!(editor.form().title.is_empty());
        assert_eq!(editor.question_count(), 1);
    }

    #[test]
    fn test_event_date_capacity() {
        let mut editor = FormEditor::new();
        for _ in 0..MAX_EVENT_DATES {
            assert!(editor.add_event_date(None).is_some());
        }
        assert!(editor.add_event_date(None).is_none());
        assert!(editor
            .notices()
            .contains(NoticeLevel::Warning, &max_event_dates_message()));
    }
}
