//! 表单加载器 - 编排层
//!
//! ## 职责
//!
//! 按 id 拉取已保存的表单并重建编辑器内容。
//!
//! ## 重试
//!
//! - 最多 `max_load_attempts` 次（默认 3），每次失败后固定等待 `retry_delay`（默认 1 秒）
//! - 每次重试前给出警告提示 `Failed to load form, retrying (n/3)...`
//! - 全部失败后在编辑器上挂出错误面板（重试 / 新建）
//! - `CancelToken` 可以随时打断等待和进行中的请求
//!
//! 每次尝试写入 `LoadAttemptStore`；结束后向服务端补报一条加载记录，
//! 补报在后台任务里进行，失败只记日志。进程退出前用 `flush_history` 等它们发完

use crate::clients::FormApi;
use crate::config::Config;
use crate::error::{ApiError, AppError};
use crate::models::record::LoadHistoryEntry;
use crate::services::attempt_store::{LoadAttempt, LoadAttemptStore};
use crate::workflow::editor::{FormEditor, LoaderAction};
use crate::workflow::notices::NoticeLevel;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// 取消信号，可克隆后交给别的任务
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// 等到被取消为止
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// 加载器状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading { attempt: usize },
    Retrying { attempt: usize },
    Succeeded,
    Failed { message: String },
}

/// 一次加载的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// 载入成功，附带题目数
    Loaded { questions: usize },
    /// 重试用尽
    Failed { message: String },
    /// 被取消
    Cancelled,
    /// 用户选择新建空白表单
    StartedBlank,
}

/// 表单加载器
pub struct FormLoader<A: FormApi + 'static> {
    api: Arc<A>,
    store: Arc<LoadAttemptStore>,
    max_attempts: usize,
    retry_delay: Duration,
    state: LoadState,
    pending_reports: Vec<JoinHandle<()>>,
}

impl<A: FormApi + 'static> FormLoader<A> {
    pub fn new(api: Arc<A>, store: Arc<LoadAttemptStore>, config: &Config) -> Self {
        Self {
            api,
            store,
            max_attempts: config.max_load_attempts.max(1),
            retry_delay: config.retry_delay(),
            state: LoadState::Idle,
            pending_reports: Vec::new(),
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn store(&self) -> &LoadAttemptStore {
        &self.store
    }

    /// 加载表单并重建编辑器
    pub async fn load(
        &mut self,
        form_id: &str,
        editor: &mut FormEditor,
        cancel: &CancelToken,
    ) -> LoadOutcome {
        editor.clear_error_panel();
        let mut reason = String::new();

        for attempt in 1..=self.max_attempts {
            self.state = LoadState::Loading { attempt };
            info!(
                "📥 加载表单 {} (第 {}/{} 次)",
                form_id, attempt, self.max_attempts
            );

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.api.fetch_form(form_id) => Some(result),
            };
            let Some(result) = result else {
                return self.cancelled(form_id);
            };

            match result {
                Ok(record) => {
                    self.record_attempt(form_id, attempt, None);
                    let report = editor.populate(&record);
                    for problem in &report.problems {
                        editor.notify(NoticeLevel::Warning, problem.clone());
                    }
                    let questions = report.questions;
                    editor.notify(NoticeLevel::Success, "Form loaded successfully");
                    self.state = LoadState::Succeeded;
                    self.report_history(form_id, None);
                    info!("✅ 表单 {} 加载成功，共 {} 道题", form_id, questions);
                    return LoadOutcome::Loaded { questions };
                }
                Err(e) => {
                    reason = failure_reason(&e);
                    self.record_attempt(form_id, attempt, Some(reason.clone()));
                    warn!("⚠️ 表单 {} 第 {} 次加载失败: {}", form_id, attempt, e);
                }
            }

            if attempt < self.max_attempts {
                self.state = LoadState::Retrying { attempt };
                editor.notify(
                    NoticeLevel::Warning,
                    format!(
                        "Failed to load form, retrying ({}/{})...",
                        attempt, self.max_attempts
                    ),
                );
                debug!("⏳ {:?} 后重试", self.retry_delay);

                let waited = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => false,
                    _ = tokio::time::sleep(self.retry_delay) => true,
                };
                if !waited {
                    return self.cancelled(form_id);
                }
            }
        }

        let message = format!("Failed to load form: {reason}");
        error!(
            "❌ 表单 {} 在 {} 次尝试后仍无法加载: {}",
            form_id, self.max_attempts, reason
        );
        editor.show_error_panel(message.clone());
        self.state = LoadState::Failed {
            message: message.clone(),
        };
        self.report_history(form_id, Some(reason));
        LoadOutcome::Failed { message }
    }

    /// 处理错误面板上的按钮
    pub async fn handle_action(
        &mut self,
        action: LoaderAction,
        form_id: &str,
        editor: &mut FormEditor,
        cancel: &CancelToken,
    ) -> LoadOutcome {
        match action {
            LoaderAction::Retry => {
                info!("🔁 用户选择重新加载表单 {}", form_id);
                self.load(form_id, editor, cancel).await
            }
            LoaderAction::CreateNew => {
                editor.reset();
                self.state = LoadState::Idle;
                LoadOutcome::StartedBlank
            }
        }
    }

    fn cancelled(&mut self, form_id: &str) -> LoadOutcome {
        info!("🛑 表单 {} 的加载已取消", form_id);
        self.state = LoadState::Idle;
        LoadOutcome::Cancelled
    }

    fn record_attempt(&self, form_id: &str, attempt: usize, error: Option<String>) {
        self.store.record(
            form_id,
            LoadAttempt {
                attempt,
                at: Utc::now(),
                success: error.is_none(),
                error,
            },
        );
    }

    /// 还没发完的加载记录上报数
    pub fn pending_reports(&self) -> usize {
        self.pending_reports.iter().filter(|h| !h.is_finished()).count()
    }

    /// 等待后台的加载记录上报结束，最多等 `limit`；返回等到的条数
    pub async fn flush_history(&mut self, limit: Duration) -> usize {
        let pending = std::mem::take(&mut self.pending_reports);
        let count = pending.len();
        if count == 0 {
            return 0;
        }
        match tokio::time::timeout(limit, join_all(pending)).await {
            Ok(_) => {
                debug!("📮 {} 条加载记录已上报", count);
                count
            }
            Err(_) => {
                warn!("⚠️ {} 条加载记录未能在 {:?} 内上报完成", count, limit);
                0
            }
        }
    }

    /// 后台补报加载记录，失败只记日志
    fn report_history(&mut self, form_id: &str, error_message: Option<String>) {
        let entry = LoadHistoryEntry {
            form_id: form_id.to_string(),
            timestamp: Utc::now(),
            success: error_message.is_none(),
            error_message,
        };
        let api = Arc::clone(&self.api);
        self.pending_reports.retain(|h| !h.is_finished());
        self.pending_reports.push(tokio::spawn(async move {
            if let Err(e) = api.record_load_history(&entry).await {
                warn!("⚠️ 加载记录上报失败 ({}): {}", entry.form_id, e);
            }
        }));
    }
}

/// 面板上展示的失败原因：服务端给出的文字优先
fn failure_reason(error: &AppError) -> String {
    match error {
        AppError::Api(ApiError::Unsuccessful { message, .. }) => message.clone(),
        other => other.to_string(),
    }
}
