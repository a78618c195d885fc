//! HTTP client for the AxeOS device REST API.

use crate::ota;
use axe_types::{
    ApiVersion, OtaEvent, OtaTarget, OtaUpload, SystemApi, SystemApiError, SystemInfo,
    SystemUpdate,
};
use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client that talks to a device (or anything serving its API) over HTTP.
#[derive(Clone)]
pub struct HttpSystemClient {
    client: reqwest::Client,
    base_url: String,
    version: ApiVersion,
    timeout: Duration,
}

impl HttpSystemClient {
    /// `base_url` is the device origin, e.g. `http://192.168.4.1`.
    pub fn new(base_url: impl Into<String>, version: ApiVersion) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            version,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Timeout for info/restart/update. OTA uploads are never time-limited.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read the body as text and map non-2xx statuses to `SystemApiError::Status`.
    async fn text_or_status(res: reqwest::Response) -> Result<(u16, String), SystemApiError> {
        let status = res.status();
        let body = res.text().await.map_err(transport)?;
        if !status.is_success() {
            return Err(SystemApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok((status.as_u16(), body))
    }

    async fn upload(
        &self,
        target: OtaTarget,
        path: PathBuf,
        events: &axe_types::OtaEventSender,
    ) -> Result<OtaEvent, SystemApiError> {
        let image = Bytes::from(tokio::fs::read(&path).await?);
        let total = image.len() as u64;
        let url = self.url(self.version.ota_path(target));
        tracing::info!(%target, path = %path.display(), bytes = total, url = %url, "starting OTA upload");
        let _ = events.send(Ok(OtaEvent::Sent { total }));

        let body = reqwest::Body::wrap_stream(ota::progress_stream(image, events.clone()));
        let res = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, total.to_string())
            .body(body)
            .send()
            .await
            .map_err(transport)?;
        let (status, body) = Self::text_or_status(res).await?;
        tracing::info!(%target, status, "OTA upload accepted");
        Ok(OtaEvent::Response { status, body })
    }
}

fn transport(e: reqwest::Error) -> SystemApiError {
    SystemApiError::Transport(e.to_string())
}

#[async_trait::async_trait]
impl SystemApi for HttpSystemClient {
    async fn get_info(&self) -> Result<SystemInfo, SystemApiError> {
        let res = self
            .client
            .get(self.url(self.version.info_path()))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport)?;
        let (_, body) = Self::text_or_status(res).await?;
        serde_json::from_str(&body).map_err(|e| SystemApiError::Decode(e.to_string()))
    }

    async fn restart(&self) -> Result<String, SystemApiError> {
        let res = self
            .client
            .post(self.url(self.version.restart_path()))
            .timeout(self.timeout)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(transport)?;
        let (_, body) = Self::text_or_status(res).await?;
        tracing::info!(base_url = %self.base_url, "restart requested");
        Ok(body)
    }

    async fn update_system(&self, update: &SystemUpdate) -> Result<(), SystemApiError> {
        let res = self
            .client
            .patch(self.url(self.version.system_path()))
            .timeout(self.timeout)
            .json(update)
            .send()
            .await
            .map_err(transport)?;
        Self::text_or_status(res).await?;
        Ok(())
    }

    fn ota_update(&self, target: OtaTarget, path: PathBuf) -> OtaUpload {
        let (tx, upload) = OtaUpload::from_channel();
        let client = self.clone();
        tokio::spawn(async move {
            let outcome = client.upload(target, path, &tx).await;
            if let Err(ref e) = outcome {
                tracing::warn!(%target, error = %e, "OTA upload failed");
            }
            let _ = tx.send(outcome);
        });
        upload
    }
}
