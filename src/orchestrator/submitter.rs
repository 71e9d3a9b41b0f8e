//! 表单提交 - 编排层
//!
//! 校验 → 按钮进入忙碌 → 序列化 → 提交。
//! 忙碌状态由守卫持有，任何路径退出都会恢复按钮；出错时挂出可关闭的错误提示

use crate::clients::{CreatedForm, FormApi, SubmitReceipt};
use crate::error::{AppResult, FormError};
use crate::models::event_dates::EventDates;
use crate::models::record::FormRecord;
use crate::services::serializer::Serializer;
use crate::services::validator::Validator;
use crate::workflow::editor::FormEditor;
use crate::workflow::notices::NoticeLevel;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 表单提交器
pub struct FormSubmitter<A: FormApi> {
    api: Arc<A>,
    serializer: Serializer,
    validator: Validator,
}

impl<A: FormApi> FormSubmitter<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            serializer: Serializer::new(),
            validator: Validator::new(),
        }
    }

    /// 提交编辑器中的表单
    ///
    /// 校验不通过时不发请求，错误已记录在编辑器上
    pub async fn submit(&self, editor: &mut FormEditor) -> AppResult<SubmitReceipt> {
        if !editor.validate_form() {
            let count = editor
                .error_summary()
                .map(|s| s.items.len())
                .unwrap_or_default();
            return Err(FormError::ValidationFailed { count }.into());
        }

        let mut guard = editor.begin_submit();

        let result = match self.serializer.hidden_fields(guard.form()) {
            Ok(fields) => self.api.submit_form(&fields).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(receipt) => {
                info!("✅ 表单已提交 (HTTP {})", receipt.status);
                Ok(receipt)
            }
            Err(e) => {
                error!("❌ 表单提交失败: {}", e);
                guard.notify(NoticeLevel::Danger, format!("Error submitting form: {e}"));
                Err(e)
            }
        }
    }

    /// 把草稿载入编辑器后提交
    ///
    /// 先按服务端规则检查草稿；载入时有任何内容被丢弃也不提交
    pub async fn submit_draft(
        &self,
        record: &FormRecord,
        editor: &mut FormEditor,
    ) -> AppResult<SubmitReceipt> {
        self.check_record(record)?;

        let report = editor.populate(record);
        if !report.is_complete() {
            for problem in &report.problems {
                warn!("  - {}", problem);
            }
            return Err(FormError::ValidationFailed {
                count: report.problems.len(),
            }
            .into());
        }

        self.submit(editor).await
    }

    /// 直接提交一份草稿（不经过编辑器）
    pub async fn submit_record(&self, record: &FormRecord) -> AppResult<SubmitReceipt> {
        self.check_record(record)?;

        let mut event_dates = EventDates::new();
        event_dates.load(&record.event_dates)?;

        let fields =
            self.serializer
                .hidden_fields_from_record(record, &event_dates, record.validity())?;
        let receipt = self.api.submit_form(&fields).await?;
        info!("✅ 草稿已提交: {} (HTTP {})", record.title, receipt.status);
        Ok(receipt)
    }

    /// 通过 JSON 接口创建表单
    pub async fn create_record(&self, record: &FormRecord) -> AppResult<CreatedForm> {
        self.check_record(record)?;
        let created = self.api.create_form(record).await?;
        info!("✅ 表单已创建: id={:?}", created.id);
        if created.sheets_sync == Some(false) {
            warn!("⚠️ 表单已保存，但表格同步未完成");
        }
        Ok(created)
    }

    fn check_record(&self, record: &FormRecord) -> AppResult<()> {
        let errors = self.validator.validate_record(record);
        if errors.is_empty() {
            return Ok(());
        }
        for message in &errors {
            warn!("  - {}", message);
        }
        Err(FormError::ValidationFailed {
            count: errors.len(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, AppError};
    use crate::models::record::{HiddenFields, LoadHistoryEntry, LoadHistoryPage, QuestionRecord};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingApi {
        fail: bool,
        submitted: Mutex<Vec<HiddenFields>>,
    }

    #[async_trait]
    impl FormApi for RecordingApi {
        async fn fetch_form(&self, _: &str) -> AppResult<FormRecord> {
            unimplemented!()
        }

        async fn record_load_history(&self, _: &LoadHistoryEntry) -> AppResult<()> {
            Ok(())
        }

        async fn fetch_load_history(&self, _: &str, _: u32, _: u32) -> AppResult<LoadHistoryPage> {
            unimplemented!()
        }

        async fn submit_form(&self, fields: &HiddenFields) -> AppResult<SubmitReceipt> {
            if self.fail {
                return Err(ApiError::BadStatus {
                    endpoint: "/submit".to_string(),
                    status: 500,
                }
                .into());
            }
            self.submitted.lock().unwrap().push(fields.clone());
            Ok(SubmitReceipt {
                status: 302,
                body: String::new(),
            })
        }

        async fn create_form(&self, _: &FormRecord) -> AppResult<CreatedForm> {
            Ok(CreatedForm {
                success: true,
                id: Some(7),
                sheets_sync: Some(true),
                error: None,
            })
        }
    }

    fn valid_editor() -> FormEditor {
        let mut editor = FormEditor::new();
        let id = editor.form().questions[0].id.clone();
        editor.set_title("Survey");
        editor.set_category("General");
        editor.edit_reference(&id, "q1");
        editor.edit_content(&id, "How are you?");
        editor
    }

    #[tokio::test]
    async fn test_invalid_form_is_not_sent() {
        let api = Arc::new(RecordingApi::default());
        let submitter = FormSubmitter::new(Arc::clone(&api));
        let mut editor = FormEditor::new();

        let err = submitter.submit(&mut editor).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Form(FormError::ValidationFailed { .. })
        ));
        assert!(api.submitted.lock().unwrap().is_empty());
        assert!(!editor.submit_button().is_busy());
    }

    #[tokio::test]
    async fn test_submit_sends_hidden_fields() {
        let api = Arc::new(RecordingApi::default());
        let submitter = FormSubmitter::new(Arc::clone(&api));
        let mut editor = valid_editor();

        let receipt = submitter.submit(&mut editor).await.unwrap();
        assert_eq!(receipt.status, 302);

        let submitted = api.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].title, "Survey");
        assert!(submitted[0].questions_input.contains("\"order\":1"));
        assert!(!editor.submit_button().is_busy());
    }

    #[tokio::test]
    async fn test_failed_submit_restores_button_and_notifies() {
        let api = Arc::new(RecordingApi {
            fail: true,
            ..Default::default()
        });
        let submitter = FormSubmitter::new(api);
        let mut editor = valid_editor();

        assert!(submitter.submit(&mut editor).await.is_err());
        assert!(!editor.submit_button().is_busy());
        let notice = editor.notices().last().unwrap();
        assert_eq!(notice.level, NoticeLevel::Danger);
        assert!(notice.message.starts_with("Error submitting form: "));
    }

    fn crowded_draft() -> FormRecord {
        let rows = |n: usize| -> crate::models::metadata::Metadata {
            (0..n).map(|i| (format!("k{i}"), "v".to_string())).collect()
        };
        let question = |reference: &str| QuestionRecord {
            reference: reference.to_string(),
            content: "c".to_string(),
            ..Default::default()
        };
        FormRecord {
            title: "T".to_string(),
            category: "C".to_string(),
            event_dates: vec!["2026-05-01T09:30".to_string(), "garbage".to_string()],
            category_metadata: rows(25),
            questions: vec![
                question("a"),
                QuestionRecord {
                    question_metadata: rows(21),
                    ..question("b")
                },
                question("c"),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_draft_refuses_lossy_drafts() {
        let api = Arc::new(RecordingApi::default());
        let submitter = FormSubmitter::new(Arc::clone(&api));
        let mut editor = FormEditor::new();

        let err = submitter
            .submit_draft(&crowded_draft(), &mut editor)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Form(FormError::ValidationFailed { count: 3 })
        ));
        assert!(api.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_draft_sends_complete_drafts() {
        let api = Arc::new(RecordingApi::default());
        let submitter = FormSubmitter::new(Arc::clone(&api));
        let mut editor = FormEditor::new();

        let record = FormRecord {
            event_dates: vec!["2026-05-01T09:30".to_string()],
            category_metadata: [("region", "north")].into_iter().collect(),
            questions: vec![QuestionRecord {
                reference: "a".to_string(),
                content: "c".to_string(),
                ..Default::default()
            }],
            ..crowded_draft()
        };
        submitter.submit_draft(&record, &mut editor).await.unwrap();

        let submitted = api.submitted.lock().unwrap();
        assert_eq!(submitted[0].event_dates_input, r#"{"dates":["2026-05-01T09:30"]}"#);
        assert_eq!(submitted[0].category_metadata_input, r#"{"region":"north"}"#);
    }

    #[tokio::test]
    async fn test_submit_record_checks_server_rules() {
        let api = Arc::new(RecordingApi::default());
        let submitter = FormSubmitter::new(Arc::clone(&api));

        let empty = FormRecord {
            title: "T".to_string(),
            category: "C".to_string(),
            ..Default::default()
        };
        assert!(submitter.submit_record(&empty).await.is_err());

        let record = FormRecord {
            questions: vec![QuestionRecord {
                reference: "q".to_string(),
                content: "c".to_string(),
                ..Default::default()
            }],
            event_dates: vec!["2026-05-01T09:30".to_string()],
            ..empty
        };
        submitter.submit_record(&record).await.unwrap();
        let submitted = api.submitted.lock().unwrap();
        assert_eq!(submitted[0].event_dates_input, r#"{"dates":["2026-05-01T09:30"]}"#);

        let created = submitter.create_record(&record).await.unwrap();
        assert_eq!(created.id, Some(7));
    }
}
