use crate::config::{resolve_tickers, Config};
use crate::errors::Result;
use crate::scrapers::base::PriceSource;
use crate::services::reshape::reshape_price_data;
use crate::sinks::base::{FetchSummary, PriceSink};
use crate::util::{self, FetchWindow};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::sync::Arc;

/// 数据服务，按顺序执行 抓取 -> 转换 -> 输出
pub struct DataService {
    config: Config,
    source: Arc<dyn PriceSource + Send + Sync>,
    sink: Arc<dyn PriceSink + Send + Sync>,
}

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: FetchSummary,
    pub rows: usize,
}

impl DataService {
    pub fn new(
        config: Config,
        source: Arc<dyn PriceSource + Send + Sync>,
        sink: Arc<dyn PriceSink + Send + Sync>,
    ) -> Self {
        Self { config, source, sink }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 执行一次完整流程
    ///
    /// `fetched_at` 是本次运行唯一的抓取时间，所有记录和对象名都用它。
    /// 输出端配置在抓取之前检查；任何阶段出错都直接返回，不重试。
    pub async fn run(&self, fetched_at: DateTime<Utc>) -> Result<RunReport> {
        self.sink.prepare()?;

        let tickers = resolve_tickers(self.config.tickers.as_deref(), &self.config.tickers_file);
        let window = FetchWindow::ending_at(self.config.base_date);
        let summary = FetchSummary {
            tickers,
            window,
            fetch_time_str: util::fetch_time_string(fetched_at),
        };

        // 抓取
        info!(
            "Fetching {} tickers from {}: {}",
            summary.tickers.len(),
            self.source.source_name(),
            window
        );
        let wide = self
            .source
            .fetch_wide_table(&summary.tickers, &window.start, &window.end)
            .await?;
        if wide.is_empty() {
            warn!("Source returned no rows for {}", window);
        }

        // 转换
        let stamp = self
            .sink
            .stamps_fetch_time()
            .then_some(summary.fetch_time_str.as_str());
        let table = reshape_price_data(&wide, stamp)?;
        info!("Reshaped {} dates into {} rows", wide.dates().len(), table.len());

        // 输出
        info!("Writing {} rows to {}", table.len(), self.sink.sink_name());
        self.sink.write(&summary, &table).await?;

        Ok(RunReport {
            rows: table.len(),
            summary,
        })
    }
}
