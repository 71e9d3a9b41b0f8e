/// 日志工具模块
///
/// 命令行各命令的启动横幅、汇总输出
use crate::config::Config;
use crate::models::form::Form;
use crate::models::record::LoadHistoryPage;
use crate::services::validator::ErrorSummary;
use tracing::info;

/// 记录程序启动信息
pub fn log_startup(config: &Config, command: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 form-builder {}", command);
    info!("🌐 服务端: {}", config.base_url);
    info!(
        "🔁 加载重试: 最多 {} 次，间隔 {} ms",
        config.max_load_attempts, config.retry_delay_ms
    );
    info!("{}", "=".repeat(60));
}

/// 打印一张表单的概要
pub fn log_form_summary(form: &Form) {
    info!("\n{}", "─".repeat(60));
    info!("📋 {} [{}]", truncate_text(&form.title, 50), form.category);
    if !form.subcategory.is_empty() {
        info!("   子分类: {}", form.subcategory);
    }
    info!(
        "   元数据: 分类 {} 条 / 子分类 {} 条",
        form.category_metadata.counter(),
        form.subcategory_metadata.counter()
    );
    for (index, question) in form.questions.iter().enumerate() {
        info!(
            "   {}. [{}] {} - {}",
            index + 1,
            question.answer_type,
            question.reference,
            truncate_text(&question.content, 40)
        );
    }
    if !form.event_dates.is_empty() {
        info!("   活动日期: {} 个", form.event_dates.len());
    }
    info!("{}", "─".repeat(60));
}

/// 打印校验错误汇总
pub fn log_error_summary(summary: &ErrorSummary) {
    info!("❌ {}", summary.heading);
    for item in &summary.items {
        info!("   - {}", item);
    }
}

/// 打印批量加载的统计
pub fn print_final_stats(success: usize, failed: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 加载完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
}

/// 打印一页加载记录
pub fn log_history_page(form_id: &str, page: &LoadHistoryPage) {
    info!(
        "🕘 表单 {} 的加载记录: 第 {}/{} 页，共 {} 条",
        form_id, page.current_page, page.pages, page.total
    );
    for record in &page.history {
        let status = if record.success { "✓" } else { "✗" };
        info!(
            "   {} {} {} {}",
            status,
            record.loaded_at,
            record.ip_address.as_deref().unwrap_or("-"),
            record
                .error_message
                .as_deref()
                .map(|m| truncate_text(m, 60))
                .unwrap_or_default()
        );
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
