/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use crate::error::{AppError, AppResult};
use crate::models::{BatchPolicy, BatchReport};
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\n批量任务处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header).map_err(|e| AppError::file_write_failed(log_file_path, e))?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `job_folder`: 任务文件目录
/// - `api_base_url`: 远程 API 地址
pub fn log_startup(job_folder: &str, api_base_url: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量任务处理模式");
    info!("📁 任务目录: {}", job_folder);
    info!("🌐 API 地址: {}", api_base_url);
    info!("{}", "=".repeat(60));
}

/// 记录任务文件加载信息
pub fn log_jobs_loaded(total_jobs: usize, total_items: usize) {
    info!("✓ 找到 {} 个批量任务，共 {} 个条目", total_jobs, total_items);
    info!("💡 任务逐个执行，每个任务内部分批处理\n");
}

/// 记录批量操作开始
///
/// # 参数
/// - `label`: 动作名称
/// - `total`: 条目总数
/// - `policy`: 批处理策略
/// - `total_batches`: 批次总数
pub fn log_bulk_start(label: &str, total: usize, policy: &BatchPolicy, total_batches: usize) {
    info!(
        "📋 批量{}: {} 个条目, 每批 {} 个, 并发 {}, 重试 {} 次, 出错{}",
        label,
        total,
        policy.batch_size(),
        policy.concurrency(),
        policy.retry_count(),
        if policy.continue_on_error() { "继续" } else { "中止" }
    );
    info!("📦 共 {} 批，每批完成后再开始下一批", total_batches);
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_num`: 批次编号
/// - `total_batches`: 批次总数
/// - `start`: 起始条目编号
/// - `end`: 结束条目编号
/// - `total`: 条目总数
pub fn log_batch_start(
    batch_num: usize,
    total_batches: usize,
    start: usize,
    end: usize,
    total: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批条目: {}-{} / 共 {} 个", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
///
/// # 参数
/// - `batch_num`: 批次编号
/// - `success`: 成功数量
/// - `total`: 本批已执行数量
pub fn log_batch_complete(batch_num: usize, success: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: 成功 {}/{}", batch_num, success, total);
    info!("{}", "─".repeat(60));
}

/// 记录批量操作结束
pub fn log_bulk_complete(label: &str, report: &BatchReport) {
    if report.aborted {
        info!("⚠️ 批量{}已中止 - {}", label, report.summary());
    } else {
        info!("✅ 批量{}完成 - {}", label, report.summary());
    }
}

/// 打印最终统计信息
///
/// # 参数
/// - `jobs_ok`: 全部成功的任务数
/// - `jobs_total`: 任务总数
/// - `items_ok`: 成功条目数
/// - `items_failed`: 失败条目数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(
    jobs_ok: usize,
    jobs_total: usize,
    items_ok: usize,
    items_failed: usize,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 任务全部成功: {}/{}", jobs_ok, jobs_total);
    info!("✅ 条目成功: {}", items_ok);
    info!("❌ 条目失败: {}", items_failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
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
