use crate::errors::{PriceHubError, Result};
use crate::models::price::{LongRecord, LongTable, OhlcType, WideTable};
use log::debug;

const VOLUME_FIELD: &str = "volume";

/// 宽表转长表
///
/// 对每个 (date, ticker, field) 单元格：
/// - `volume` 字段（不区分大小写）整列丢弃
/// - 缺失值不输出
/// - 其余输出一条记录，`ohlc_type` 为小写字段名
///
/// 输出顺序为日期升序，再按股票代码、字段名排序；调用方不应依赖更具体的顺序。
/// 给定 `fetch_time_str` 时所有记录使用同一个时间字符串。
pub fn reshape_price_data(wide: &WideTable, fetch_time_str: Option<&str>) -> Result<LongTable> {
    // 列的遍历顺序: ticker, field
    let mut column_order: Vec<usize> = (0..wide.columns().len()).collect();
    column_order.sort_by(|&a, &b| {
        let (ca, cb) = (&wide.columns()[a], &wide.columns()[b]);
        (&ca.ticker, &ca.field).cmp(&(&cb.ticker, &cb.field))
    });

    let mut ohlc_columns = Vec::with_capacity(column_order.len());
    for idx in column_order {
        let column = &wide.columns()[idx];
        if column.field.eq_ignore_ascii_case(VOLUME_FIELD) {
            continue;
        }
        let ohlc_type = OhlcType::from_field(&column.field).ok_or_else(|| {
            PriceHubError::DataError(format!(
                "Unexpected field {} for ticker {}",
                column.field, column.ticker
            ))
        })?;
        ohlc_columns.push((idx, ohlc_type));
    }

    let fetch_time_str = fetch_time_str.map(str::to_string);
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (row, date) in wide.dates().iter().enumerate() {
        let cells: Vec<_> = wide.row(row).collect();
        for &(idx, ohlc_type) in &ohlc_columns {
            let (column, value) = cells[idx];
            let Some(price) = value else {
                skipped += 1;
                continue;
            };
            records.push(LongRecord {
                date: *date,
                ticker: column.ticker.clone(),
                ohlc_type,
                price,
                fetch_time_str: fetch_time_str.clone(),
            });
        }
    }

    if skipped > 0 {
        debug!("Dropped {} missing price cells", skipped);
    }

    Ok(LongTable { records, fetch_time_str })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::parse_date;
    use std::collections::BTreeSet;

    fn scenario_table() -> WideTable {
        let mut table = WideTable::new();
        for date in ["2024-01-10", "2024-01-11"] {
            let date = parse_date(date).unwrap();
            for (field, value) in [
                ("Open", 100.0),
                ("High", 105.0),
                ("Low", 99.0),
                ("Close", 102.0),
                ("Volume", 1000.0),
            ] {
                table.insert(date, field, "AAA", Some(value));
            }
        }
        table
    }

    #[test]
    fn two_days_one_ticker_gives_eight_rows() {
        let long = reshape_price_data(&scenario_table(), None).unwrap();

        assert_eq!(long.len(), 8);
        assert!(long.records.iter().all(|r| r.ticker == "AAA"));
        for record in &long.records {
            let expected = match record.ohlc_type {
                OhlcType::Open => 100.0,
                OhlcType::High => 105.0,
                OhlcType::Low => 99.0,
                OhlcType::Close => 102.0,
            };
            assert_eq!(record.price, expected);
        }

        let keys: BTreeSet<_> = long
            .records
            .iter()
            .map(|r| (r.date, r.ohlc_type))
            .collect();
        assert_eq!(keys.len(), 8);
    }

    #[test]
    fn volume_never_appears_in_any_casing() {
        let mut table = scenario_table();
        let date = parse_date("2024-01-10").unwrap();
        table.insert(date, "VOLUME", "BBB", Some(5.0));
        table.insert(date, "volume", "CCC", Some(6.0));

        let long = reshape_price_data(&table, None).unwrap();
        assert_eq!(long.len(), 8);
        assert!(long.records.iter().all(|r| OhlcType::ALL.contains(&r.ohlc_type)));
    }

    #[test]
    fn field_casing_is_normalized() {
        let mut table = WideTable::new();
        let date = parse_date("2024-01-10").unwrap();
        table.insert(date, "OPEN", "AAA", Some(1.0));
        table.insert(date, "high", "AAA", Some(2.0));
        table.insert(date, "LoW", "AAA", Some(3.0));
        table.insert(date, "Close", "AAA", Some(4.0));

        let long = reshape_price_data(&table, None).unwrap();
        let mut types: Vec<&str> = long.records.iter().map(|r| r.ohlc_type.as_str()).collect();
        types.sort();
        assert_eq!(types, vec!["close", "high", "low", "open"]);
    }

    #[test]
    fn missing_cells_are_dropped() {
        let mut table = scenario_table();
        let jan11 = parse_date("2024-01-11").unwrap();
        table.insert(jan11, "High", "AAA", None);
        table.insert(jan11, "Volume", "AAA", None);
        // BBB 只有一个有效值，其余单元格都是缺失
        table.insert(jan11, "Close", "BBB", Some(50.0));

        let long = reshape_price_data(&table, None).unwrap();
        assert_eq!(long.len(), 8);
        assert!(!long
            .records
            .iter()
            .any(|r| r.date == jan11 && r.ticker == "AAA" && r.ohlc_type == OhlcType::High));
        assert_eq!(long.records.iter().filter(|r| r.ticker == "BBB").count(), 1);
    }

    #[test]
    fn fetch_time_is_stamped_uniformly() {
        let stamp = "2024-01-12 06:00:00";
        let long = reshape_price_data(&scenario_table(), Some(stamp)).unwrap();

        assert_eq!(long.fetch_time_str.as_deref(), Some(stamp));
        assert!(long.columns().contains(&"fetch_time_str"));
        assert!(long
            .records
            .iter()
            .all(|r| r.fetch_time_str.as_deref() == Some(stamp)));

        let unstamped = reshape_price_data(&scenario_table(), None).unwrap();
        assert!(!unstamped.columns().contains(&"fetch_time_str"));
        assert!(unstamped.records.iter().all(|r| r.fetch_time_str.is_none()));
    }

    #[test]
    fn groups_by_date_then_ticker() {
        let mut table = WideTable::new();
        let jan10 = parse_date("2024-01-10").unwrap();
        let jan11 = parse_date("2024-01-11").unwrap();
        for date in [jan11, jan10] {
            for ticker in ["BBB", "AAA"] {
                table.insert(date, "Close", ticker, Some(1.0));
                table.insert(date, "Open", ticker, Some(1.0));
            }
        }

        let long = reshape_price_data(&table, None).unwrap();
        let keys: Vec<_> = long.records.iter().map(|r| (r.date, r.ticker.clone())).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut table = WideTable::new();
        table.insert(parse_date("2024-01-10").unwrap(), "Adj Close", "AAA", Some(1.0));
        assert!(matches!(
            reshape_price_data(&table, None),
            Err(PriceHubError::DataError(_))
        ));
    }
}
