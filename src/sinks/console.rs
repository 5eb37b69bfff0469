use crate::models::price::LongTable;
use crate::errors::Result;
use crate::sinks::base::{FetchSummary, PriceSink};
use crate::util::DATE_FORMAT;
use async_trait::async_trait;
use std::io::Write;

/// 把结果打印到标准输出
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

/// 输出股票列表、日期区间和整张长表
pub fn render_table<W: Write>(out: &mut W, summary: &FetchSummary, table: &LongTable) -> Result<()> {
    writeln!(out, "Downloaded data for tickers: {:?}", summary.tickers)?;
    writeln!(out, "Date range: {}", summary.window)?;

    let ticker_width = table
        .records
        .iter()
        .map(|r| r.ticker.len())
        .chain(std::iter::once("ticker".len()))
        .max()
        .unwrap_or_default();

    let columns = table.columns();
    write!(
        out,
        "{:>6} {:<10} {:<tw$} {:<9} {:>12}",
        "", columns[0], columns[1], columns[2], columns[3],
        tw = ticker_width
    )?;
    if let Some(column) = columns.get(4) {
        write!(out, "  {}", column)?;
    }
    writeln!(out)?;

    for (i, record) in table.records.iter().enumerate() {
        write!(
            out,
            "{:>6} {:<10} {:<tw$} {:<9} {:>12}",
            i,
            record.date.format(DATE_FORMAT).to_string(),
            record.ticker,
            record.ohlc_type,
            record.price,
            tw = ticker_width
        )?;
        if let Some(stamp) = &record.fetch_time_str {
            write!(out, "  {}", stamp)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "\n[{} rows x {} columns]", table.len(), columns.len())?;
    Ok(())
}

#[async_trait]
impl PriceSink for ConsoleSink {
    fn sink_name(&self) -> &'static str {
        "console"
    }

    fn stamps_fetch_time(&self) -> bool {
        false
    }

    async fn write(&self, summary: &FetchSummary, table: &LongTable) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        render_table(&mut out, summary, table)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::price::{LongRecord, OhlcType};
    use crate::util::{parse_date, FetchWindow};

    #[test]
    fn renders_summary_and_rows() {
        let summary = FetchSummary {
            tickers: vec!["1655.T".to_string(), "2413.T".to_string()],
            window: FetchWindow::ending_at(parse_date("2024-01-12").unwrap()),
            fetch_time_str: "2024-01-12 06:00:00".to_string(),
        };
        let table = LongTable {
            records: vec![LongRecord {
                date: parse_date("2024-01-10").unwrap(),
                ticker: "1655.T".to_string(),
                ohlc_type: OhlcType::Close,
                price: 102.123456789,
                fetch_time_str: None,
            }],
            fetch_time_str: None,
        };

        let mut buf = Vec::new();
        render_table(&mut buf, &summary, &table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], r#"Downloaded data for tickers: ["1655.T", "2413.T"]"#);
        assert_eq!(lines[1], "Date range: 2024-01-09 to 2024-01-12");
        assert!(lines[2].contains("ohlc_type"));
        assert!(!lines[2].contains("fetch_time_str"));
        assert!(lines[3].contains("2024-01-10"));
        assert!(lines[3].contains("close"));
        assert!(lines[3].contains("102.123456789"));
        assert!(text.ends_with("[1 rows x 4 columns]\n"));
    }
}
