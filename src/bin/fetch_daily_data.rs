use daily_price_hub::config::{Config, OutputMode, DEFAULT_ENVIRONMENT, UPLOAD_TARGETS};
use daily_price_hub::errors::PriceHubError;
use daily_price_hub::scrapers::yahoo::YahooScraper;
use daily_price_hub::services::data_service::DataService;
use daily_price_hub::sinks::base::PriceSink;
use daily_price_hub::sinks::console::ConsoleSink;
use daily_price_hub::sinks::gcs::GcsBlobWriter;
use daily_price_hub::sinks::storage::ObjectStorageSink;
use daily_price_hub::util;

use anyhow::Context;
use chrono::Utc;
use clap::{App, Arg};
use log::{error, info};
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    // 默认基准日为东京时间的今天
    let today = util::today_in_tokyo().format(util::DATE_FORMAT).to_string();

    let app = App::new("fetch_daily_data")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Fetch daily OHLC prices and write them in long format")
        .arg(
            Arg::with_name("base-date")
                .short('d')
                .long("base-date")
                .value_name("DATE")
                .help("Base date in YYYY-MM-DD format; prices are fetched for the 3 days before it")
                .takes_value(true)
                .default_value(&today),
        )
        .arg(
            Arg::with_name("ticker")
                .short('t')
                .long("ticker")
                .value_name("TICKER")
                .help("Ticker symbols; when omitted they are read from tickers.csv next to the executable, else in the working directory")
                .takes_value(true)
                .multiple_values(true)
                .multiple_occurrences(true),
        )
        .arg(
            Arg::with_name("tickers-file")
                .long("tickers-file")
                .value_name("PATH")
                .help("Override the location of the fallback tickers file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("environment")
                .short('e')
                .long("environment")
                .value_name("ENV")
                .help("Deployment environment that selects the storage bucket")
                .takes_value(true)
                .possible_values(UPLOAD_TARGETS.iter().map(|(tag, _)| *tag))
                .default_value(DEFAULT_ENVIRONMENT),
        )
        .arg(
            Arg::with_name("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT")
                .help("Where to write the result")
                .takes_value(true)
                .possible_values(["console", "storage"])
                .default_value("console"),
        );

    let matches = app.get_matches();

    let date_str = matches.value_of("base-date").unwrap_or(&today);
    let base_date = util::parse_date(date_str)
        .with_context(|| format!("Invalid base date: {}", date_str))?;
    let tickers = matches
        .values_of("ticker")
        .map(|values| values.map(|t| t.to_string()).collect::<Vec<_>>());
    let environment = matches.value_of("environment").unwrap_or(DEFAULT_ENVIRONMENT);
    let output: OutputMode = matches.value_of("output").unwrap_or("console").parse()?;

    let mut config = Config::new(base_date)
        .with_tickers(tickers)
        .with_output(output);
    if let Some(path) = matches.value_of("tickers-file") {
        config = config.with_tickers_file(path);
    }

    info!("Base date: {}, environment: {}, output: {:?}", config.base_date, environment, config.output);

    let sink: Arc<dyn PriceSink + Send + Sync> = match config.output {
        OutputMode::Console => Arc::new(ConsoleSink::new()),
        OutputMode::Storage => Arc::new(ObjectStorageSink::new(GcsBlobWriter::new(), environment)),
    };
    let source = Arc::new(YahooScraper::new()?);

    let service = DataService::new(config, source, sink);

    match service.run(Utc::now()).await {
        Ok(report) => {
            info!(
                "Wrote {} rows for {} tickers ({})",
                report.rows,
                report.summary.tickers.len(),
                report.summary.window
            );
            Ok(())
        }
        Err(PriceHubError::StorageError(msg)) => {
            error!("{}", msg);
            eprintln!("Error: {}", msg);
            std::process::exit(1);
        }
        Err(e) => Err(e).context("Failed to fetch daily price data"),
    }
}
