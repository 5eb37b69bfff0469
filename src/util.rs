use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Asia::Tokyo;
use std::fmt;
use crate::config::FETCH_WINDOW_DAYS;
use crate::errors::Result;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const FETCH_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const OBJECT_PREFIX: &str = "price_data";

// 日期转换工具
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT)?)
}

/// 东京时间（UTC+9）的今天
pub fn today_in_tokyo() -> NaiveDate {
    Utc::now().with_timezone(&Tokyo).date_naive()
}

/// 抓取时间字符串，格式 `YYYY-MM-DD HH:MM:SS`，东京时间
pub fn fetch_time_string(now: DateTime<Utc>) -> String {
    now.with_timezone(&Tokyo).format(FETCH_TIME_FORMAT).to_string()
}

/// 抓取区间 [start, end)，end 不包含
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    /// 从基准日往前推 [`FETCH_WINDOW_DAYS`] 天，基准日本身不包含
    pub fn ending_at(base_date: NaiveDate) -> Self {
        Self {
            start: base_date - Duration::days(FETCH_WINDOW_DAYS),
            end: base_date,
        }
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        *date >= self.start && *date < self.end
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// 去掉 `-` 和 `:`，空格换成 `_`
pub fn sanitize_timestamp(timestamp: &str) -> String {
    timestamp
        .chars()
        .filter(|c| *c != '-' && *c != ':')
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

/// 云存储对象名：`price_data/fetch_at_<YYYYMMDD_HHMMSS>.csv`
pub fn object_name(fetch_time_str: &str) -> String {
    format!("{}/fetch_at_{}.csv", OBJECT_PREFIX, sanitize_timestamp(fetch_time_str))
}

// CSV数据转换工具
pub mod csv_utils {
    use super::*;
    use crate::errors::PriceHubError;
    use crate::models::price::{LongRecord, LongTable, OhlcType};
    use serde::Deserialize;

    /// 长表序列化为 CSV 文本，含表头
    pub fn long_table_to_csv(table: &LongTable) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(table.columns())?;

        for record in &table.records {
            let date = record.date.format(DATE_FORMAT).to_string();
            let price = record.price.to_string();
            let mut row = vec![
                date.as_str(),
                record.ticker.as_str(),
                record.ohlc_type.as_str(),
                price.as_str(),
            ];
            if table.fetch_time_str.is_some() {
                row.push(record.fetch_time_str.as_deref().unwrap_or_default());
            }
            wtr.write_record(&row)?;
        }

        let data = wtr
            .into_inner()
            .map_err(|e| PriceHubError::IoError(e.into_error()))?;
        String::from_utf8(data).map_err(|e| PriceHubError::DataError(e.to_string()))
    }

    #[derive(Debug, Deserialize)]
    struct CsvRow {
        date: String,
        ticker: String,
        ohlc_type: OhlcType,
        price: f64,
        fetch_time_str: Option<String>,
    }

    /// 读取 [`long_table_to_csv`] 写出的 CSV
    pub fn read_long_csv(text: &str) -> Result<LongTable> {
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let has_fetch_time = reader.headers()?.iter().any(|h| h == "fetch_time_str");

        let mut records = Vec::new();
        for row in reader.deserialize() {
            let row: CsvRow = row?;
            records.push(LongRecord {
                date: parse_date(&row.date)?,
                ticker: row.ticker,
                ohlc_type: row.ohlc_type,
                price: row.price,
                fetch_time_str: row.fetch_time_str,
            });
        }

        let fetch_time_str = if has_fetch_time {
            records.first().and_then(|r| r.fetch_time_str.clone())
        } else {
            None
        };
        Ok(LongTable { records, fetch_time_str })
    }
}
