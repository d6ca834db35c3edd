/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    // --- 任务 API 配置 ---
    pub api_base_url: String,
    pub api_token: String,
    /// 使用自定义任务 ID 时需要的工作区 ID
    pub team_id: Option<String>,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 重试退避 ---
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// 批量任务文件存放目录
    pub job_folder: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 失败条目记录文件
    pub failure_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.clickup.com/api/v2".to_string(),
            api_token: String::new(),
            team_id: None,
            request_timeout_secs: 30,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 30_000,
            job_folder: "jobs".to_string(),
            verbose_logging: false,
            output_log_file: "bulk_output.txt".to_string(),
            failure_file: "failed_items.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("TASK_API_BASE_URL").unwrap_or(default.api_base_url),
            api_token: std::env::var("TASK_API_TOKEN").unwrap_or(default.api_token),
            team_id: std::env::var("TASK_TEAM_ID").ok().filter(|v| !v.is_empty()).or(default.team_id),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            retry_base_delay_ms: std::env::var("RETRY_BASE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_base_delay_ms),
            retry_max_delay_ms: std::env::var("RETRY_MAX_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_max_delay_ms),
            job_folder: std::env::var("JOB_FOLDER").unwrap_or(default.job_folder),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            failure_file: std::env::var("FAILURE_FILE").unwrap_or(default.failure_file),
        }
    }
}
