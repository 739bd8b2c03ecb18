use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::error::{Result, ServerError};

/// POLL_FETCH_BUFFER_HOURS 上限 (一周)
pub const MAX_POLL_FETCH_BUFFER_HOURS: i64 = 168;

/// 服务配置 - 门店监控服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志、报告) |
/// | DATABASE_PATH | {WORK_DIR}/store_monitor.db | SQLite 数据库文件 |
/// | REPORTS_DIR | {WORK_DIR}/reports | CSV 报告输出目录 |
/// | DATA_DIR | ./store-monitoring-data | 导入 CSV 所在目录 |
/// | STATUS_CSV | {DATA_DIR}/store_status.csv | 门店状态轮询数据 |
/// | BUSINESS_HOURS_CSV | {DATA_DIR}/menu_hours.csv | 营业时间数据 |
/// | TIMEZONE_CSV | {DATA_DIR}/timezones.csv | 门店时区数据 |
/// | DEFAULT_TIMEZONE | America/Chicago | 缺省时区 (启动时校验) |
/// | POLL_FETCH_BUFFER_HOURS | 1 | 查询轮询数据时额外回看的小时数 (0-168) |
/// | HTTP_PORT | 8000 | HTTP 服务端口 |
/// | MAX_REPORT_WORKERS | 4 | 并发报告任务数 |
/// | REPORT_TIMEOUT_SECS | 60 | 单个报告任务超时(秒) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (未设置) | 日志文件目录 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/monitor HTTP_PORT=8080 cargo run --bin store-monitor
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// SQLite 数据库文件路径
    pub database_path: String,
    /// 报告输出目录
    pub reports_dir: String,
    /// 门店状态 CSV
    pub status_csv: String,
    /// 营业时间 CSV
    pub business_hours_csv: String,
    /// 时区 CSV
    pub timezone_csv: String,
    /// 缺省时区 (IANA)
    pub default_timezone: String,
    /// 轮询数据额外回看小时数
    pub poll_fetch_buffer_hours: i64,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 最大并发报告任务数
    pub max_report_workers: usize,
    /// 单个报告任务超时 (秒)
    pub report_timeout_secs: u64,
    /// 日志级别
    pub log_level: String,
    /// 日志目录 (None 时只输出到终端)
    pub log_dir: Option<String>,
    /// 运行环境: development | staging | production
    pub environment: String,
}

fn env_or(key: &str, default: impl Into<String>) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.into())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn join(dir: &str, file: &str) -> String {
    Path::new(dir).join(file).to_string_lossy().into_owned()
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let work_dir = env_or("WORK_DIR", "./data");
        let data_dir = env_or("DATA_DIR", "./store-monitoring-data");

        Self {
            database_path: env_or("DATABASE_PATH", join(&work_dir, "store_monitor.db")),
            reports_dir: env_or("REPORTS_DIR", join(&work_dir, "reports")),
            status_csv: env_or("STATUS_CSV", join(&data_dir, "store_status.csv")),
            business_hours_csv: env_or("BUSINESS_HOURS_CSV", join(&data_dir, "menu_hours.csv")),
            timezone_csv: env_or("TIMEZONE_CSV", join(&data_dir, "timezones.csv")),
            default_timezone: env_or("DEFAULT_TIMEZONE", "America/Chicago"),
            poll_fetch_buffer_hours: env_parse("POLL_FETCH_BUFFER_HOURS", 1),
            http_port: env_parse("HTTP_PORT", 8000),
            max_report_workers: env_parse("MAX_REPORT_WORKERS", 4),
            report_timeout_secs: env_parse("REPORT_TIMEOUT_SECS", 60),
            log_level: env_or("LOG_LEVEL", "info"),
            log_dir: std::env::var("LOG_DIR").ok().filter(|v| !v.trim().is_empty()),
            environment: env_or("ENVIRONMENT", "development"),
            work_dir,
        }
    }

    /// 以指定工作目录构造配置，数据库和报告目录都放在其下
    ///
    /// 常用于测试场景
    pub fn with_work_dir(work_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        let work_dir = work_dir.into();
        config.database_path = join(&work_dir, "store_monitor.db");
        config.reports_dir = join(&work_dir, "reports");
        config.work_dir = work_dir;
        config
    }

    /// 启动前校验
    ///
    /// 缺省时区必须是合法的 IANA 标识，否则报告计算无从兜底
    pub fn validate(&self) -> Result<()> {
        uptime_engine::parse_zone(&self.default_timezone)
            .map_err(|e| ServerError::Config(format!("DEFAULT_TIMEZONE: {e}")))?;
        if self.max_report_workers == 0 {
            return Err(ServerError::Config(
                "MAX_REPORT_WORKERS must be at least 1".into(),
            ));
        }
        if self.report_timeout_secs == 0 {
            return Err(ServerError::Config(
                "REPORT_TIMEOUT_SECS must be at least 1".into(),
            ));
        }
        if !(0..=MAX_POLL_FETCH_BUFFER_HOURS).contains(&self.poll_fetch_buffer_hours) {
            return Err(ServerError::Config(format!(
                "POLL_FETCH_BUFFER_HOURS must be within 0..={MAX_POLL_FETCH_BUFFER_HOURS}, got {}",
                self.poll_fetch_buffer_hours
            )));
        }
        Ok(())
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        std::fs::create_dir_all(&self.reports_dir)?;
        if let Some(parent) = Path::new(&self.database_path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        if let Some(log_dir) = &self.log_dir {
            std::fs::create_dir_all(log_dir)?;
        }
        Ok(())
    }

    /// 报告文件路径: {REPORTS_DIR}/report_{id}.csv
    pub fn report_file_path(&self, report_id: &str) -> PathBuf {
        Path::new(&self.reports_dir).join(format!("report_{report_id}.csv"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
