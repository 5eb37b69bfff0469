use crate::errors::{PriceHubError, Result};
use crate::models::price::UploadTarget;
use chrono::NaiveDate;
use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 读取不到股票列表文件时使用的默认股票
pub const DEFAULT_TICKERS: [&str; 3] = ["1655.T", "2413.T", "3283.T"];

pub const DEFAULT_ENVIRONMENT: &str = "dev";

pub const TICKERS_FILE_NAME: &str = "tickers.csv";

/// 往基准日之前多取的天数，日终数据不一定及时可用
pub const FETCH_WINDOW_DAYS: i64 = 3;

/// 环境标签 -> 上传目标，新增环境只需要加一行
pub const UPLOAD_TARGETS: [(&str, UploadTarget); 2] = [
    (
        "dev",
        UploadTarget {
            project_id: "daily-price-hub-dev",
            bucket: "daily-price-hub-dev-raw",
        },
    ),
    (
        "prod",
        UploadTarget {
            project_id: "daily-price-hub-prod",
            bucket: "daily-price-hub-prod-raw",
        },
    ),
];

/// 根据环境标签查找上传目标，未知标签直接报错
pub fn resolve_upload_target(environment: &str) -> Result<UploadTarget> {
    UPLOAD_TARGETS
        .iter()
        .find(|(tag, _)| *tag == environment)
        .map(|(_, target)| *target)
        .ok_or_else(|| {
            PriceHubError::ConfigError(format!(
                "Unknown environment: {} (expected one of: {})",
                environment,
                UPLOAD_TARGETS.iter().map(|(tag, _)| *tag).collect::<Vec<_>>().join(", ")
            ))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Console,
    Storage,
}

impl FromStr for OutputMode {
    type Err = PriceHubError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "console" => Ok(OutputMode::Console),
            "storage" => Ok(OutputMode::Storage),
            other => Err(PriceHubError::ConfigError(format!("Unknown output mode: {}", other))),
        }
    }
}

pub struct Config {
    pub base_date: NaiveDate,
    pub tickers: Option<Vec<String>>,
    pub tickers_file: PathBuf,
    pub output: OutputMode,
}

impl Config {
    pub fn new(base_date: NaiveDate) -> Self {
        Self {
            base_date,
            tickers: None,
            tickers_file: default_tickers_file(),
            output: OutputMode::Console,
        }
    }

    pub fn with_tickers(mut self, tickers: Option<Vec<String>>) -> Self {
        self.tickers = tickers.filter(|t| !t.is_empty());
        self
    }

    pub fn with_tickers_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.tickers_file = path.as_ref().to_path_buf();
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }
}

/// 股票列表文件的默认位置，见 [`locate_tickers_file`]
pub fn default_tickers_file() -> PathBuf {
    let exe = std::env::current_exe().ok();
    locate_tickers_file(exe.as_deref().and_then(Path::parent))
}

/// 优先使用程序所在目录下的 tickers.csv，不存在时使用当前目录下的
///
/// `cargo run` 时可执行文件在 target/ 下，随仓库提供的 tickers.csv 在当前目录。
pub fn locate_tickers_file(exe_dir: Option<&Path>) -> PathBuf {
    exe_dir
        .map(|dir| dir.join(TICKERS_FILE_NAME))
        .filter(|path| path.is_file())
        .unwrap_or_else(|| PathBuf::from(TICKERS_FILE_NAME))
}

#[derive(Debug, Deserialize)]
struct TickerRow {
    ticker: String,
}

/// 从单列 CSV（表头 `ticker`）读取股票列表
pub fn read_tickers_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut tickers = Vec::new();
    for row in reader.deserialize() {
        let row: TickerRow = row?;
        let ticker = row.ticker.trim();
        if !ticker.is_empty() {
            tickers.push(ticker.to_string());
        }
    }

    if tickers.is_empty() {
        return Err(PriceHubError::DataError(format!(
            "No tickers found in {}",
            path.as_ref().display()
        )));
    }
    Ok(tickers)
}

/// 确定本次要抓取的股票列表
///
/// 调用方给了列表就直接使用；否则读取股票列表文件，
/// 文件缺失或格式错误都只记录警告并使用 [`DEFAULT_TICKERS`]。
pub fn resolve_tickers(explicit: Option<&[String]>, tickers_file: &Path) -> Vec<String> {
    if let Some(tickers) = explicit.filter(|t| !t.is_empty()) {
        return tickers.to_vec();
    }

    match read_tickers_file(tickers_file) {
        Ok(tickers) => {
            info!("Loaded {} tickers from {}", tickers.len(), tickers_file.display());
            tickers
        }
        Err(e) => {
            warn!(
                "Error reading tickers file {}: {}. Using default tickers.",
                tickers_file.display(),
                e
            );
            DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect()
        }
    }
}
