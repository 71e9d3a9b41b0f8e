//! 命令行应用
//!
//! 把配置、客户端、加载记录组装起来，供各个子命令使用

use crate::clients::{FormApi, FormClient};
use crate::config::Config;
use crate::models::loaders::{load_all_drafts, load_form_draft, save_form_draft};
use crate::models::record::FormRecord;
use crate::orchestrator::{CancelToken, FormLoader, FormSubmitter, LoadOutcome};
use crate::services::{LoadAttemptStore, Serializer, Validator};
use crate::utils::logging::{
    log_error_summary, log_form_summary, log_history_page, log_startup, print_final_stats,
};
use crate::workflow::FormEditor;
use anyhow::{bail, Context, Result};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    api: Arc<FormClient>,
    store: Arc<LoadAttemptStore>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config, command: &str) -> Result<Self> {
        config.validate().context("配置无效")?;
        log_startup(&config, command);

        let api = Arc::new(FormClient::new(&config).context("无法创建 HTTP 客户端")?);
        let store = Arc::new(LoadAttemptStore::with_capacity(
            config.attempt_history_capacity,
        ));

        Ok(Self { config, api, store })
    }

    /// 校验草稿文件，或文件夹中的全部草稿
    pub async fn validate(&self, path: &Path) -> Result<()> {
        let drafts = read_drafts(path).await?;
        if drafts.is_empty() {
            warn!("⚠️ 没有找到待校验的 TOML 文件");
            return Ok(());
        }

        let mut invalid = 0;
        for (file, record) in &drafts {
            info!("🔍 校验 {}", file.display());
            if !check_draft(record) {
                invalid += 1;
            }
        }

        info!("📊 校验完成: {} 个通过, {} 个未通过", drafts.len() - invalid, invalid);
        if invalid > 0 {
            bail!("{} 个草稿未通过校验", invalid);
        }
        Ok(())
    }

    /// 提交一份草稿
    pub async fn submit(&self, path: &Path, json: bool) -> Result<()> {
        let record = load_form_draft(path).await?;
        let submitter = FormSubmitter::new(Arc::clone(&self.api));

        if json {
            let created = submitter.create_record(&record).await?;
            info!("✅ 已创建表单 id={:?}", created.id);
            return Ok(());
        }

        let mut editor = FormEditor::new();
        match submitter.submit_draft(&record, &mut editor).await {
            Ok(receipt) => {
                log_form_summary(editor.form());
                info!("✅ 提交完成 (HTTP {})", receipt.status);
                Ok(())
            }
            Err(e) => {
                if let Some(summary) = editor.error_summary() {
                    log_error_summary(summary);
                }
                Err(e).with_context(|| format!("提交失败: {}", path.display()))
            }
        }
    }

    /// 并发加载多个表单；指定 `out` 时另存为 TOML 草稿
    pub async fn load(&self, form_ids: &[String], out: Option<&Path>) -> Result<()> {
        let cancel = CancelToken::new();
        let watcher = cancel.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("🛑 收到中断信号，取消加载");
                watcher.cancel();
            }
        });

        let results = join_all(
            form_ids
                .iter()
                .map(|form_id| self.load_one(form_id, out, &cancel)),
        )
        .await;
        ctrl_c.abort();

        let mut success = 0;
        for (form_id, result) in form_ids.iter().zip(&results) {
            match result {
                Ok(true) => success += 1,
                Ok(false) => {}
                Err(e) => error!("❌ 表单 {} 处理出错: {:#}", form_id, e),
            }
        }
        let failed = form_ids.len() - success;
        print_final_stats(success, failed, form_ids.len());

        if failed > 0 {
            bail!("{} 个表单加载失败", failed);
        }
        Ok(())
    }

    async fn load_one(&self, form_id: &str, out: Option<&Path>, cancel: &CancelToken) -> Result<bool> {
        let mut loader = FormLoader::new(Arc::clone(&self.api), Arc::clone(&self.store), &self.config);
        let mut editor = FormEditor::new();

        let outcome = loader.load(form_id, &mut editor, cancel).await;
        loader.flush_history(self.config.request_timeout()).await;

        match outcome {
            LoadOutcome::Loaded { .. } => {
                log_form_summary(editor.form());
                if let Some(dir) = out {
                    let file = dir.join(format!("form_{form_id}.toml"));
                    let record = Serializer::new().to_record(editor.form());
                    save_form_draft(&file, &record).await?;
                    info!("💾 已保存草稿: {}", file.display());
                }
                Ok(true)
            }
            LoadOutcome::Failed { message } => {
                let attempts = self.store.attempts(form_id);
                error!("❌ {} (共尝试 {} 次)", message, attempts.len());
                if let Some(last) = self.store.last(form_id) {
                    info!("   最后一次尝试: {}", last.at.format("%Y-%m-%d %H:%M:%S"));
                }
                Ok(false)
            }
            LoadOutcome::Cancelled | LoadOutcome::StartedBlank => Ok(false),
        }
    }

    /// 查看服务端的加载记录
    pub async fn history(&self, form_id: &str, page: u32, per_page: u32) -> Result<()> {
        let history = self
            .api
            .fetch_load_history(form_id, page, per_page)
            .await
            .with_context(|| format!("无法获取表单 {form_id} 的加载记录"))?;

        if history.pages > 0 && !history.page_in_range(page) {
            warn!("⚠️ 第 {} 页超出范围 (共 {} 页)", page, history.pages);
        }
        log_history_page(form_id, &history);
        Ok(())
    }
}

/// 读取单个草稿，或文件夹中的全部草稿
async fn read_drafts(path: &Path) -> Result<Vec<(PathBuf, FormRecord)>> {
    if path.is_dir() {
        let folder = path
            .to_str()
            .with_context(|| format!("路径不是有效的 UTF-8: {}", path.display()))?;
        return load_all_drafts(folder).await;
    }
    let record = load_form_draft(path).await?;
    Ok(vec![(path.to_path_buf(), record)])
}

/// 同时按服务端规则和页面规则检查一份草稿
///
/// 载入编辑器时丢弃了内容的草稿同样视为未通过
fn check_draft(record: &FormRecord) -> bool {
    let server_errors = Validator::new().validate_record(record);
    for message in &server_errors {
        warn!("   - {}", message);
    }

    let mut editor = FormEditor::new();
    let report = editor.populate(record);
    for problem in &report.problems {
        warn!("   - {}", problem);
    }
    log_form_summary(editor.form());

    let page_ok = editor.validate_form();
    if let Some(summary) = editor.error_summary() {
        log_error_summary(summary);
    }

    server_errors.is_empty() && report.is_complete() && page_ok
}
