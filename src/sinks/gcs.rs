use crate::models::price::UploadTarget;
use crate::errors::{Result, PriceHubError};
use crate::sinks::storage::BlobWriter;
use async_trait::async_trait;
use reqwest::{Client, Request, StatusCode};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use log::debug;

pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

const USER_PROJECT_HEADER: &str = "x-goog-user-project";
const UPLOAD_URL: &str = "https://storage.googleapis.com/upload/storage/v1/b";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Google Cloud Storage 写入器
///
/// 访问令牌优先读取 `GOOGLE_OAUTH_ACCESS_TOKEN`，否则向 GCE 元数据服务器申请。
/// HTTP 客户端和令牌都在写入时才创建，失败会作为写入错误返回。
pub struct GcsBlobWriter {
    access_token: Option<String>,
}

impl GcsBlobWriter {
    pub fn new() -> Self {
        Self {
            access_token: std::env::var(ACCESS_TOKEN_ENV).ok().filter(|t| !t.is_empty()),
        }
    }

    pub fn with_access_token(token: &str) -> Self {
        Self {
            access_token: Some(token.to_string()),
        }
    }

    async fn access_token(&self, client: &Client) -> Result<String> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }

        debug!("Requesting access token from metadata server");
        let response = client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PriceHubError::StorageError(format!(
                "Metadata token request failed: HTTP status {}",
                response.status()
            )));
        }

        let token: MetadataToken = response.json().await?;
        Ok(token.access_token)
    }
}

impl Default for GcsBlobWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// 构造 media 方式的上传请求
fn build_upload_request(
    client: &Client,
    token: &str,
    target: &UploadTarget,
    object_name: &str,
    body: String,
    content_type: &str,
) -> Result<Request> {
    client
        .post(format!("{}/{}/o", UPLOAD_URL, target.bucket))
        .query(&[("uploadType", "media"), ("name", object_name)])
        .bearer_auth(token)
        .header(CONTENT_TYPE, content_type)
        .header(USER_PROJECT_HEADER, target.project_id)
        .body(body)
        .build()
        .map_err(PriceHubError::RequestError)
}

/// 非 2xx 状态转换为存储错误
fn check_upload_status(status: StatusCode, detail: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(PriceHubError::StorageError(format!(
        "HTTP status {}: {}",
        status, detail
    )))
}

#[async_trait]
impl BlobWriter for GcsBlobWriter {
    async fn put_object(
        &self,
        target: &UploadTarget,
        object_name: &str,
        body: String,
        content_type: &str,
    ) -> Result<()> {
        let client = Client::builder()
            .build()
            .map_err(PriceHubError::RequestError)?;
        let token = self.access_token(&client).await?;

        let request = build_upload_request(&client, &token, target, object_name, body, content_type)?;
        let response = client.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return check_upload_status(status, &detail);
        }

        debug!("Stored gs://{}/{}", target.bucket, object_name);
        Ok(())
    }
}
