//! Generation & polling engine: submits a long-running video task and polls
//! its status to a terminal outcome. The provider offers no push channel,
//! so bounded fixed-interval polling is the only completion signal.

pub mod extract;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::sleep;

use crate::{
    config::{PollConfig, VideoTaskConfig, DEFAULT_VIDEO_BASE_URL},
    error::{PipelineError, Result},
    journal::{CallJournal, CallKind},
    models::{
        GenerationOutcome, GenerationRequest, TaskCreated, TaskSnapshot, TaskStatus,
        DEFAULT_VIDEO_MODEL,
    },
};

pub use extract::{extract_artifact_url, UrlStrategy, DEFAULT_STRATEGIES};

const TASKS_PATH: &str = "/api/v3/contents/generations/tasks";

/// Read side of the polling loop. `VideoTaskClient` implements it over HTTP;
/// tests drive the loop with scripted sources.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn read_status(&self, task_id: &str, journal: &CallJournal) -> Result<Value>;
}

#[derive(Clone)]
pub struct VideoTaskClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model_id: String,
    poll: PollConfig,
}

impl VideoTaskClient {
    pub fn new(config: VideoTaskConfig, poll: PollConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| PipelineError::Config("video task API key is required".into()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_VIDEO_BASE_URL.to_string()),
            api_key,
            model_id: config
                .model_id
                .unwrap_or_else(|| DEFAULT_VIDEO_MODEL.to_string()),
            poll,
        })
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(auth) = format!("Bearer {}", self.api_key).parse() {
            headers.insert(reqwest::header::AUTHORIZATION, auth);
        }
        if let Ok(content_type) = "application/json".parse() {
            headers.insert(reqwest::header::CONTENT_TYPE, content_type);
        }
        headers
    }

    /// Submit a generation task; returns the externally assigned task id.
    pub async fn submit(&self, request: &GenerationRequest, journal: &CallJournal) -> Result<String> {
        let model = request.model_id.as_deref().unwrap_or(&self.model_id);
        let text = format!("{}{}", request.prompt, request.settings.prompt_suffix());
        let payload = json!({
            "model": model,
            "content": [
                { "type": "text", "text": text },
                { "type": "image_url", "image_url": { "url": request.image_url } }
            ]
        });
        let summary = json!({ "model": model, "image_url": request.image_url });

        log::info!("submitting generation task (model: {})", model);

        let response = self
            .client
            .post(format!("{}{}", self.base_url, TASKS_PATH))
            .headers(self.build_headers())
            .json(&payload)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                journal.record(
                    CallKind::VideoSubmission,
                    summary,
                    json!({ "error": e.to_string() }),
                );
                return Err(PipelineError::Request(format!(
                    "submission request failed: {}",
                    e
                )));
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            journal.record(
                CallKind::VideoSubmission,
                summary,
                json!({ "status": status.as_u16(), "error": body }),
            );
            return Err(PipelineError::UpstreamHttp {
                status: status.as_u16(),
                body,
            });
        }

        let created: TaskCreated = match serde_json::from_str(&body) {
            Ok(created) => created,
            Err(e) => {
                journal.record(
                    CallKind::VideoSubmission,
                    summary,
                    json!({ "error": e.to_string(), "body": body }),
                );
                return Err(PipelineError::MalformedResponse(format!(
                    "submission response missing task id: {}",
                    e
                )));
            }
        };

        journal.record(
            CallKind::VideoSubmission,
            summary,
            json!({ "task_id": created.id }),
        );
        log::info!("video task created: {}", created.id);
        Ok(created.id)
    }

    /// Submit, then poll to a terminal outcome with this client's policy.
    pub async fn generate<F>(
        &self,
        request: &GenerationRequest,
        journal: &CallJournal,
        on_progress: F,
    ) -> Result<GenerationOutcome>
    where
        F: FnMut(&TaskSnapshot),
    {
        let task_id = self.submit(request, journal).await?;
        poll_until_terminal(self, &task_id, &self.poll, journal, on_progress).await
    }
}

#[async_trait]
impl StatusSource for VideoTaskClient {
    async fn read_status(&self, task_id: &str, journal: &CallJournal) -> Result<Value> {
        let summary = json!({ "task_id": task_id });
        let response = self
            .client
            .get(format!("{}{}/{}", self.base_url, TASKS_PATH, task_id))
            .headers(self.build_headers())
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                journal.record(
                    CallKind::VideoStatus,
                    summary,
                    json!({ "error": e.to_string() }),
                );
                return Err(PipelineError::Request(format!(
                    "status request failed: {}",
                    e
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            journal.record(
                CallKind::VideoStatus,
                summary,
                json!({ "status": status.as_u16(), "error": body }),
            );
            return Err(PipelineError::UpstreamHttp {
                status: status.as_u16(),
                body,
            });
        }

        match response.json::<Value>().await {
            Ok(body) => {
                journal.record(CallKind::VideoStatus, summary, body.clone());
                Ok(body)
            }
            Err(e) => {
                journal.record(
                    CallKind::VideoStatus,
                    summary,
                    json!({ "error": e.to_string() }),
                );
                Err(PipelineError::MalformedResponse(format!(
                    "status response was not JSON: {}",
                    e
                )))
            }
        }
    }
}

/// Poll a task until it reaches a terminal state.
///
/// Reads are strictly sequential and capped at `poll.max_attempts`; every
/// read is journaled and reported to `on_progress` before any transition. A
/// `succeeded` status with no recognizable artifact URL still resolves to an
/// outcome, with `video_url` absent.
pub async fn poll_until_terminal<S, F>(
    source: &S,
    task_id: &str,
    poll: &PollConfig,
    journal: &CallJournal,
    mut on_progress: F,
) -> Result<GenerationOutcome>
where
    S: StatusSource + ?Sized,
    F: FnMut(&TaskSnapshot),
{
    for attempt in 1..=poll.max_attempts {
        let body = source.read_status(task_id, journal).await?;

        let raw_status = body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let status = TaskStatus::parse(&raw_status);
        log::debug!(
            "task {} attempt {}: status '{}' normalized to {:?}",
            task_id,
            attempt,
            raw_status,
            status
        );

        let snapshot = TaskSnapshot {
            task_id: task_id.to_string(),
            attempt,
            raw_status,
            status: status.clone(),
            body: body.clone(),
        };
        on_progress(&snapshot);

        match status {
            TaskStatus::Succeeded => {
                let video_url = extract_artifact_url(&body);
                if video_url.is_none() {
                    log::warn!(
                        "task {} succeeded but no artifact URL was found in the response",
                        task_id
                    );
                }
                let result = body.get("result").cloned().unwrap_or(Value::Null);
                return Ok(GenerationOutcome {
                    task_id: task_id.to_string(),
                    video_url,
                    result,
                    attempts: attempt,
                });
            }
            TaskStatus::Failed => {
                let message = match body.get("error") {
                    Some(Value::String(s)) if !s.is_empty() => s.clone(),
                    Some(Value::Null) | None => "Unknown error".to_string(),
                    Some(other) => other.to_string(),
                };
                return Err(PipelineError::TaskFailed(message));
            }
            TaskStatus::Pending(_) => {
                if attempt < poll.max_attempts {
                    sleep(poll.interval).await;
                }
            }
        }
    }

    Err(PipelineError::Timeout {
        attempts: poll.max_attempts,
    })
}
