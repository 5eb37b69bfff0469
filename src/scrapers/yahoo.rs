use crate::models::price::WideTable;
use crate::errors::{Result, PriceHubError};
use crate::scrapers::base::PriceSource;
use crate::util::FetchWindow;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use log::{debug, info, warn};

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Yahoo Finance 日线数据抓取器
///
/// 每个股票请求一次 v8 chart 接口，结果合并成一张宽表，
/// 字段名沿用 `Open`/`High`/`Low`/`Close`/`Volume`。
pub struct YahooScraper {
    client: Client,
}

impl YahooScraper {
    /// 不设置超时，也不重试
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(PriceHubError::RequestError)?;

        Ok(Self { client })
    }

    async fn fetch_chart(&self, ticker: &str, window: &FetchWindow) -> Result<ChartData> {
        let period1 = window.start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();
        let period2 = window.end
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();

        let response = self.client
            .get(format!("{}/{}", CHART_URL, ticker))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!("成功获取 {} 的响应, HTTP {}", ticker, status);

        let parsed: ChartResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(PriceHubError::SourceError(format!(
                    "{}: HTTP status {}", ticker, status
                )));
            }
            Err(e) => return Err(PriceHubError::JsonError(e)),
        };

        if let Some(err) = parsed.chart.error {
            return Err(PriceHubError::SourceError(format!(
                "{}: {}: {}", ticker, err.code, err.description
            )));
        }

        parsed.chart.result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| PriceHubError::SourceError(format!("{}: empty chart result", ticker)))
    }
}

/// 把单个股票的 chart 数据并入宽表，只保留 [start, end) 内的日期
fn merge_chart(table: &mut WideTable, ticker: &str, chart: ChartData, window: &FetchWindow) -> Result<()> {
    let timestamps = chart.timestamp.unwrap_or_default();
    let quote = chart.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = chart.meta.gmtoffset;

    let fields: [(&str, &Vec<Option<f64>>); 5] = [
        ("Open", &quote.open),
        ("High", &quote.high),
        ("Low", &quote.low),
        ("Close", &quote.close),
        ("Volume", &quote.volume),
    ];

    for (i, &ts) in timestamps.iter().enumerate() {
        // 按交易所当地时间确定交易日
        let date = DateTime::from_timestamp(ts + offset, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| PriceHubError::DataError(format!("Invalid timestamp: {}", ts)))?;

        if !window.contains(&date) {
            debug!("跳过区间外的 {} 数据: {}", ticker, date);
            continue;
        }

        for (field, values) in &fields {
            table.insert(date, field, ticker, values.get(i).copied().flatten());
        }
    }

    Ok(())
}

#[async_trait]
impl PriceSource for YahooScraper {
    fn source_name(&self) -> &'static str {
        "Yahoo Finance"
    }

    async fn fetch_wide_table(
        &self,
        tickers: &[String],
        start: &NaiveDate,
        end: &NaiveDate,
    ) -> Result<WideTable> {
        let window = FetchWindow { start: *start, end: *end };
        info!("Fetching {} tickers from {} for {}", tickers.len(), self.source_name(), window);

        let mut table = WideTable::new();
        for ticker in tickers {
            let chart = self.fetch_chart(ticker, &window).await?;
            merge_chart(&mut table, ticker, chart, &window)?;
        }

        if table.is_empty() {
            warn!("No price data returned for {}", window);
        }
        Ok(table)
    }
}
