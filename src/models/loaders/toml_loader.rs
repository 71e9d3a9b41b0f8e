use crate::models::record::FormRecord;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 草稿文件加载表单
pub async fn load_form_draft(toml_file_path: &Path) -> Result<FormRecord> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let record: FormRecord = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    Ok(record)
}

/// 把表单写成 TOML 草稿
pub async fn save_form_draft(toml_file_path: &Path, record: &FormRecord) -> Result<()> {
    let content = toml::to_string_pretty(record).context("无法序列化表单为TOML")?;

    if let Some(parent) = toml_file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("无法创建文件夹: {}", parent.display()))?;
        }
    }

    fs::write(toml_file_path, content)
        .await
        .with_context(|| format!("无法写入TOML文件: {}", toml_file_path.display()))?;

    Ok(())
}

/// 从文件夹中加载所有 TOML 草稿，解析失败的文件记录警告后跳过
pub async fn load_all_drafts(folder_path: &str) -> Result<Vec<(PathBuf, FormRecord)>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut drafts = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            tracing::info!(
                "正在加载: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );

            match load_form_draft(&path).await {
                Ok(record) => {
                    tracing::info!("成功加载 {} 个题目", record.questions.len());
                    drafts.push((path, record));
                }
                Err(e) => {
                    tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
                }
            }
        }
    }

    drafts.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(drafts)
}
