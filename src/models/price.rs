use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 宽表的列：(字段, 股票代码)，字段保留数据源原始大小写，如 `Open`、`Volume`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey {
    pub field: String,
    pub ticker: String,
}

impl ColumnKey {
    pub fn new(field: &str, ticker: &str) -> Self {
        Self {
            field: field.to_string(),
            ticker: ticker.to_string(),
        }
    }
}

/// 宽格式时间序列：一行一个日期，一列一个 (field, ticker)
///
/// 单元格可以缺失（`None`），转换为长表时缺失单元格不会输出。
#[derive(Debug, Clone, Default)]
pub struct WideTable {
    dates: Vec<NaiveDate>,
    columns: Vec<ColumnKey>,
    // 行优先存储，cells[row][col]
    cells: Vec<Vec<Option<f64>>>,
}

impl WideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个单元格，日期行和列按需创建，日期保持升序
    pub fn insert(&mut self, date: NaiveDate, field: &str, ticker: &str, value: Option<f64>) {
        let col = self.column_index_or_insert(ColumnKey::new(field, ticker));
        let row = match self.dates.binary_search(&date) {
            Ok(row) => row,
            Err(pos) => {
                self.dates.insert(pos, date);
                self.cells.insert(pos, vec![None; self.columns.len()]);
                pos
            }
        };
        self.cells[row][col] = value;
    }

    fn column_index_or_insert(&mut self, key: ColumnKey) -> usize {
        if let Some(idx) = self.columns.iter().position(|c| *c == key) {
            return idx;
        }
        self.columns.push(key);
        for row in &mut self.cells {
            row.push(None);
        }
        self.columns.len() - 1
    }

    pub fn get(&self, date: &NaiveDate, field: &str, ticker: &str) -> Option<f64> {
        let row = self.dates.binary_search(date).ok()?;
        let col = self
            .columns
            .iter()
            .position(|c| c.field == field && c.ticker == ticker)?;
        self.cells[row][col]
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    /// 指定行的所有 (列, 值)，包括缺失值
    pub fn row(&self, row: usize) -> impl Iterator<Item = (&ColumnKey, Option<f64>)> + '_ {
        self.columns
            .iter()
            .zip(self.cells[row].iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.columns.is_empty()
    }
}

/// 长表中的价格类型，输出时总是小写
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OhlcType {
    Open,
    High,
    Low,
    Close,
}

impl OhlcType {
    pub const ALL: [OhlcType; 4] = [OhlcType::Open, OhlcType::High, OhlcType::Low, OhlcType::Close];

    pub fn as_str(&self) -> &'static str {
        match self {
            OhlcType::Open => "open",
            OhlcType::High => "high",
            OhlcType::Low => "low",
            OhlcType::Close => "close",
        }
    }

    /// 忽略大小写解析字段名，非 OHLC 字段返回 None
    pub fn from_field(field: &str) -> Option<Self> {
        match field.to_lowercase().as_str() {
            "open" => Some(OhlcType::Open),
            "high" => Some(OhlcType::High),
            "low" => Some(OhlcType::Low),
            "close" => Some(OhlcType::Close),
            _ => None,
        }
    }
}

impl fmt::Display for OhlcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// 长表记录
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    pub date: NaiveDate,
    pub ticker: String,
    pub ohlc_type: OhlcType,
    pub price: f64,
    pub fetch_time_str: Option<String>,
}

/// 长格式价格表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LongTable {
    pub records: Vec<LongRecord>,
    /// 整次运行统一的抓取时间，有值时才输出 fetch_time_str 列
    pub fetch_time_str: Option<String>,
}

impl LongTable {
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = vec!["date", "ticker", "ohlc_type", "price"];
        if self.fetch_time_str.is_some() {
            columns.push("fetch_time_str");
        }
        columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 云存储上传目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTarget {
    pub project_id: &'static str,
    pub bucket: &'static str,
}
