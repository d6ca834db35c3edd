//! 批量任务运行器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责任务文件的加载和逐个执行。
//!
//! 1. **应用初始化**：写日志文件头、输出启动信息、创建任务服务
//! 2. **批量加载**：扫描并加载所有任务文件（`Vec<BulkJob>`）
//! 3. **逐个执行**：任务之间严格串行，任务内部由执行器分批并发
//! 4. **失败记录**：最终失败的条目写入失败记录文件
//! 5. **全局统计**：汇总所有任务的处理结果

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{load_all_job_files, BatchReport, BulkJob};
use crate::services::{BulkTaskService, FailureWriter};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    service: BulkTaskService,
    failure_writer: FailureWriter,
}

/// 处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    /// 任务总数
    pub jobs_total: usize,
    /// 全部条目成功的任务数
    pub jobs_ok: usize,
    /// 因参数不合法而没有执行的任务数
    pub jobs_rejected: usize,
    pub items_ok: usize,
    pub items_failed: usize,
}

impl ProcessingStats {
    fn record(&mut self, report: &BatchReport) {
        if report.is_complete_success() {
            self.jobs_ok += 1;
        }
        self.items_ok += report.succeeded;
        self.items_failed += report.failed;
    }
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;

        logging::log_startup(&config.job_folder, &config.api_base_url);

        if config.api_token.is_empty() {
            warn!("⚠️ 未配置 TASK_API_TOKEN，远程调用可能被拒绝");
        }

        let service = BulkTaskService::new(&config)?;
        let failure_writer = FailureWriter::with_path(&config.failure_file);

        Ok(Self {
            config,
            service,
            failure_writer,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<ProcessingStats> {
        info!("\n📁 正在扫描待处理的任务文件...");
        let jobs = load_all_job_files(&self.config.job_folder).await?;

        if jobs.is_empty() {
            warn!("⚠️ 没有找到待处理的TOML文件，程序结束");
            return Ok(ProcessingStats::default());
        }

        let total_items = jobs.iter().map(|job| job.items.len()).sum();
        logging::log_jobs_loaded(jobs.len(), total_items);

        let stats = self.process_all_jobs(&jobs).await;

        logging::print_final_stats(
            stats.jobs_ok,
            stats.jobs_total,
            stats.items_ok,
            stats.items_failed,
            &self.config.output_log_file,
        );

        Ok(stats)
    }

    /// 逐个执行任务
    async fn process_all_jobs(&self, jobs: &[BulkJob]) -> ProcessingStats {
        let mut stats = ProcessingStats {
            jobs_total: jobs.len(),
            ..Default::default()
        };

        for (idx, job) in jobs.iter().enumerate() {
            let job_name = job.display_name();
            info!(
                "\n[任务 {}/{}] ▶ {} ({}, {} 个条目)",
                idx + 1,
                jobs.len(),
                job_name,
                job.verb,
                job.items.len()
            );

            match self.service.run(job).await {
                Ok(report) => {
                    self.write_failures(&job_name, job, &report);
                    stats.record(&report);
                }
                Err(e) if e.is_validation() => {
                    error!("[任务 {}] ❌ 参数不合法，未执行: {}", idx + 1, e);
                    stats.jobs_rejected += 1;
                }
                Err(e) => {
                    error!("[任务 {}] ❌ 处理过程中发生错误: {}", idx + 1, e);
                    stats.jobs_rejected += 1;
                }
            }
        }

        stats
    }

    /// 把失败的条目写入失败记录文件
    fn write_failures(&self, job_name: &str, job: &BulkJob, report: &BatchReport) {
        for outcome in report.failures() {
            let Some(item) = job.items.get(outcome.index) else {
                continue;
            };
            if let Err(e) = self.failure_writer.write(job_name, item, outcome) {
                warn!("⚠️ 写入失败记录失败 ({}): {}", self.failure_writer.path(), e);
            }
        }
    }
}
