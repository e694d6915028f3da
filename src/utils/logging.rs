use anyhow::Result;
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs;
use tracing::info;

use crate::config::Config;
use crate::workflow::ExportBundle;

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n题目导出日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题目导出模式");
    info!("📂 快照: {}", config.snapshot_path);
    info!("📁 导出目录: {}", config.output_dir);
    if !config.disabled_heuristics.is_empty() {
        info!("🔧 已关闭的修复规则: {}", config.disabled_heuristics.join(", "));
    }
    info!("{}", "=".repeat(60));
}

/// 记录快照加载信息
///
/// # 参数
/// - `total`: 快照数量
/// - `questions`: 题目总数
pub fn log_snapshots_loaded(total: usize, questions: usize) {
    info!("✓ 找到 {} 个快照，共 {} 道题目", total, questions);
}

/// 打印单次导出的统计
pub fn log_export_complete(bundle: &ExportBundle) {
    info!("\n{}", "─".repeat(60));
    info!("✓ {} 导出完成", bundle.exam.exam_code);
    info!("📄 题目: {}", bundle.question_count());
    info!("🖼 图片: {} (跳过 {})", bundle.image_count, bundle.skipped_images);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(success: usize, failed: usize, total: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部导出完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示和预览
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
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
