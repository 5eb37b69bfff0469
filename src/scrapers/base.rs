use crate::models::price::WideTable;
use crate::errors::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// 行情数据源
#[async_trait]
pub trait PriceSource {
    /// 数据源名称，用于日志
    fn source_name(&self) -> &'static str;

    /// 抓取 [start, end) 区间内指定股票的日线数据，返回宽表
    async fn fetch_wide_table(
        &self,
        tickers: &[String],
        start: &NaiveDate,
        end: &NaiveDate,
    ) -> Result<WideTable>;
}
