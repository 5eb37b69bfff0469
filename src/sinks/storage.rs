use crate::models::price::{LongTable, UploadTarget};
use crate::errors::{Result, PriceHubError};
use crate::config::resolve_upload_target;
use crate::sinks::base::{FetchSummary, PriceSink};
use crate::util::{self, csv_utils};
use async_trait::async_trait;
use log::{error, info};

pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// 对象存储写入接口
#[async_trait]
pub trait BlobWriter {
    async fn put_object(
        &self,
        target: &UploadTarget,
        object_name: &str,
        body: String,
        content_type: &str,
    ) -> Result<()>;
}

/// 把长表以 CSV 对象写入云存储
pub struct ObjectStorageSink<W> {
    writer: W,
    environment: String,
}

impl<W: BlobWriter + Send + Sync> ObjectStorageSink<W> {
    pub fn new(writer: W, environment: &str) -> Self {
        Self {
            writer,
            environment: environment.to_string(),
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// 上传一次抓取结果，成功返回 true
    ///
    /// 环境标签未知时在序列化之前就返回 false；
    /// 写入失败只记录日志，由调用方决定如何退出。
    pub async fn upload_price_data(&self, table: &LongTable, fetch_time_str: &str) -> bool {
        let target = match resolve_upload_target(&self.environment) {
            Ok(target) => target,
            Err(e) => {
                error!("{}", e);
                return false;
            }
        };

        match self.try_upload(table, &target, fetch_time_str).await {
            Ok(object_name) => {
                info!(
                    "Uploaded {} rows to gs://{}/{} (project {})",
                    table.len(), target.bucket, object_name, target.project_id
                );
                true
            }
            Err(e) => {
                error!("Failed to upload price data to bucket {}: {}", target.bucket, e);
                false
            }
        }
    }

    async fn try_upload(
        &self,
        table: &LongTable,
        target: &UploadTarget,
        fetch_time_str: &str,
    ) -> Result<String> {
        let body = csv_utils::long_table_to_csv(table)?;
        let object_name = util::object_name(fetch_time_str);
        self.writer
            .put_object(target, &object_name, body, CSV_CONTENT_TYPE)
            .await?;
        Ok(object_name)
    }
}

#[async_trait]
impl<W: BlobWriter + Send + Sync> PriceSink for ObjectStorageSink<W> {
    fn sink_name(&self) -> &'static str {
        "object storage"
    }

    fn stamps_fetch_time(&self) -> bool {
        true
    }

    fn prepare(&self) -> Result<()> {
        let target = resolve_upload_target(&self.environment)?;
        info!("Writing to bucket {} (project {})", target.bucket, target.project_id);
        Ok(())
    }

    async fn write(&self, summary: &FetchSummary, table: &LongTable) -> Result<()> {
        if self.upload_price_data(table, &summary.fetch_time_str).await {
            Ok(())
        } else {
            Err(PriceHubError::StorageError(format!(
                "Failed to upload price data for environment {}",
                self.environment
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::price::{LongRecord, OhlcType};
    use crate::util::parse_date;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingWriter {
        calls: Mutex<Vec<(UploadTarget, String, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl BlobWriter for RecordingWriter {
        async fn put_object(
            &self,
            target: &UploadTarget,
            object_name: &str,
            body: String,
            content_type: &str,
        ) -> Result<()> {
            self.calls.lock().unwrap().push((
                *target,
                object_name.to_string(),
                body,
                content_type.to_string(),
            ));
            if self.fail {
                return Err(PriceHubError::StorageError("403 Forbidden".to_string()));
            }
            Ok(())
        }
    }

    fn table() -> LongTable {
        let stamp = "2024-01-12 06:00:00".to_string();
        LongTable {
            records: vec![LongRecord {
                date: parse_date("2024-01-10").unwrap(),
                ticker: "AAA".to_string(),
                ohlc_type: OhlcType::Open,
                price: 100.0,
                fetch_time_str: Some(stamp.clone()),
            }],
            fetch_time_str: Some(stamp),
        }
    }

    #[tokio::test]
    async fn uploads_csv_under_timestamped_name() {
        let sink = ObjectStorageSink::new(RecordingWriter::default(), "prod");
        assert!(sink.upload_price_data(&table(), "2024-01-12 06:00:00").await);

        let calls = sink.writer().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (target, name, body, content_type) = &calls[0];
        assert_eq!(target.bucket, "daily-price-hub-prod-raw");
        assert_eq!(name, "price_data/fetch_at_20240112_060000.csv");
        assert_eq!(content_type, "text/csv");
        assert_eq!(
            body,
            "date,ticker,ohlc_type,price,fetch_time_str\n2024-01-10,AAA,open,100,2024-01-12 06:00:00\n"
        );
    }

    #[tokio::test]
    async fn unknown_environment_fails_before_writing() {
        let sink = ObjectStorageSink::new(RecordingWriter::default(), "staging");
        assert!(!sink.upload_price_data(&table(), "2024-01-12 06:00:00").await);
        assert!(sink.writer().calls.lock().unwrap().is_empty());
    }

    #[test]
    fn prepare_rejects_unknown_environment() {
        let sink = ObjectStorageSink::new(RecordingWriter::default(), "staging");
        assert!(matches!(sink.prepare(), Err(PriceHubError::ConfigError(_))));

        let sink = ObjectStorageSink::new(RecordingWriter::default(), "prod");
        assert!(sink.prepare().is_ok());
        assert_eq!(sink.environment(), "prod");
    }

    #[tokio::test]
    async fn writer_failure_is_reported() {
        let writer = RecordingWriter {
            fail: true,
            ..Default::default()
        };
        let sink = ObjectStorageSink::new(writer, "dev");
        assert!(!sink.upload_price_data(&table(), "2024-01-12 06:00:00").await);

        let summary = FetchSummary {
            tickers: vec!["AAA".to_string()],
            window: util::FetchWindow::ending_at(parse_date("2024-01-12").unwrap()),
            fetch_time_str: "2024-01-12 06:00:00".to_string(),
        };
        assert!(matches!(
            sink.write(&summary, &table()).await,
            Err(PriceHubError::StorageError(_))
        ));
    }
}
