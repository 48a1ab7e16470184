//! Pass-through adapter to the blob store: raw bytes in, public URL out.

#[cfg(feature = "server")]
pub mod relay;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    config::BlobStoreConfig,
    error::{PipelineError, Result},
    journal::{CallJournal, CallKind},
};

/// Blob-store reply; the store may attach more fields, only `url` matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedBlob {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathname: Option<String>,
    #[serde(
        default,
        rename = "contentType",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<String>,
}

#[derive(Clone, Debug)]
pub struct BlobClient {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl BlobClient {
    pub fn new(config: BlobStoreConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .ok_or_else(|| PipelineError::Config("blob store endpoint is required".into()))?;

        Ok(Self {
            client: Client::new(),
            endpoint,
            token: config.token,
        })
    }

    /// Forward raw bytes to the blob store with public visibility. One
    /// attempt, no retry; an upstream failure is surfaced with its status.
    pub async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
        journal: &CallJournal,
    ) -> Result<UploadedBlob> {
        let summary = json!({
            "filename": filename,
            "content_type": content_type,
            "bytes": bytes.len()
        });

        let mut request = self
            .client
            .post(&self.endpoint)
            .query(&[("filename", filename), ("access", "public")])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                journal.record(
                    CallKind::BlobUpload,
                    summary,
                    json!({ "error": e.to_string() }),
                );
                return Err(PipelineError::Request(format!(
                    "upload request failed: {}",
                    e
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            journal.record(
                CallKind::BlobUpload,
                summary,
                json!({ "status": status.as_u16(), "error": body }),
            );
            return Err(PipelineError::UpstreamHttp {
                status: status.as_u16(),
                body,
            });
        }

        match response.json::<UploadedBlob>().await {
            Ok(blob) => {
                journal.record(CallKind::BlobUpload, summary, json!({ "url": blob.url }));
                Ok(blob)
            }
            Err(e) => {
                journal.record(
                    CallKind::BlobUpload,
                    summary,
                    json!({ "error": e.to_string() }),
                );
                Err(PipelineError::MalformedResponse(format!(
                    "upload response missing url: {}",
                    e
                )))
            }
        }
    }
}
