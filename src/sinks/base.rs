use crate::models::price::LongTable;
use crate::errors::Result;
use crate::util::FetchWindow;
use async_trait::async_trait;

/// 一次运行的基本信息，供输出端展示或命名
#[derive(Debug, Clone)]
pub struct FetchSummary {
    pub tickers: Vec<String>,
    pub window: FetchWindow,
    pub fetch_time_str: String,
}

/// 长表输出端
#[async_trait]
pub trait PriceSink {
    fn sink_name(&self) -> &'static str;

    /// 是否需要在长表中带上抓取时间列
    fn stamps_fetch_time(&self) -> bool;

    /// 抓取之前调用，配置错误在这里报出，避免无谓的网络请求
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    async fn write(&self, summary: &FetchSummary, table: &LongTable) -> Result<()>;
}
