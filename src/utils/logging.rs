//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::models::{BatchRun, BatchStatus};

/// 初始化 tracing
///
/// `RUST_LOG` 优先于配置中的过滤规则。重复调用时忽略。
pub fn init(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 流畅版经文");
    info!("🌐 主语言: {}", config.primary_language);
    info!("💾 持久存储: {:?}", config.store_backend);
    info!("🤖 模型: {}", config.llm_model_name);
    info!("{}", "=".repeat(60));
}

/// 记录批量任务开始
pub fn log_batch_start(run: &BatchRun) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始批量生成: {} ({})", run.book_name, run.language);
    info!("📄 章节: 1-{}", run.total);
    info!("{}", "=".repeat(60));
}

/// 打印批量任务统计信息
pub fn print_batch_summary(run: &BatchRun) {
    let status = match run.status() {
        BatchStatus::Running => "进行中",
        BatchStatus::Completed => "已完成",
        BatchStatus::Cancelled => "已取消",
    };

    info!("\n{}", "=".repeat(60));
    info!("📊 批量生成统计 - {}", status);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📖 {} / 最后章节 {}/{}", run.book_name, run.current, run.total);
    info!("✅ 生成: {}", run.generated);
    info!("⏭️ 已存在: {}", run.skipped);
    info!("❌ 失败: {}", run.errors);
    info!("{}", "=".repeat(60));
}

/// 把批量任务日志追加写入文件
///
/// 每次写入一个带时间戳的标题，随后是任务日志的全部行。
pub async fn append_run_log(path: &Path, run: &BatchRun) -> Result<()> {
    let mut text = format!(
        "{}\n批量生成日志 - {} - {} ({})\n{}\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        run.book_name,
        run.language,
        "=".repeat(60)
    );
    for line in &run.log {
        text.push_str(line);
        text.push('\n');
    }
    text.push('\n');

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("无法打开日志文件: {}", path.display()))?;
    file.write_all(text.as_bytes())
        .await
        .with_context(|| format!("写入日志文件失败: {}", path.display()))?;
    file.flush().await?;

    info!("\n日志已保存至: {}", path.display());
    Ok(())
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
