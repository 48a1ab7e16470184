pub mod composer;
pub mod synthesis;
pub mod vision;

use reqwest::Client;
use serde_json::{json, Value};

use crate::{
    config::{CompletionConfig, DEFAULT_COMPLETION_BASE_URL},
    error::{PipelineError, Result},
    journal::{CallJournal, CallKind},
    models::ChatCompletionResponse,
};

pub use composer::PromptComposer;
pub use synthesis::SynthesisClient;
pub use vision::VisionClient;

pub(crate) const COMPLETION_MODEL: &str = "gpt-4o";

/// Shared HTTP transport for the chat-completion endpoint. Each stage client
/// holds a clone; the journal is passed per call rather than stored, so one
/// run keeps a single trail across every stage.
#[derive(Clone, Debug)]
pub struct ChatTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ChatTransport {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| PipelineError::Config("completion API key is required".into()))?;
        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_COMPLETION_BASE_URL.to_string());

        Ok(Self {
            client: Client::new(),
            base_url,
            api_key,
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

    /// Issue one completion call and return the first choice's text content.
    /// Every attempt is journaled under `kind`; `request_summary` is the
    /// snapshot stored in the journal (full payloads can embed whole images).
    pub async fn complete(
        &self,
        kind: CallKind,
        payload: Value,
        request_summary: Value,
        journal: &CallJournal,
    ) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .headers(self.build_headers())
            .json(&payload)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                journal.record(kind, request_summary, json!({ "error": e.to_string() }));
                return Err(PipelineError::Request(format!(
                    "completion request failed: {}",
                    e
                )));
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            journal.record(
                kind,
                request_summary,
                json!({ "status": status.as_u16(), "error": body }),
            );
            return Err(PipelineError::UpstreamHttp {
                status: status.as_u16(),
                body,
            });
        }

        match extract_first_choice(&body) {
            Ok(content) => {
                journal.record(kind, request_summary, json!({ "content": content }));
                Ok(content)
            }
            Err(e) => {
                journal.record(kind, request_summary, json!({ "error": e.to_string() }));
                Err(e)
            }
        }
    }
}

fn extract_first_choice(body: &str) -> Result<String> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| PipelineError::MalformedResponse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| PipelineError::MalformedResponse("completion returned no choices".into()))
}

/// Facade over the three completion-backed stages, sharing one transport.
#[derive(Clone)]
pub struct CompletionClient {
    vision: VisionClient,
    synthesis: SynthesisClient,
    composer: PromptComposer,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let transport = ChatTransport::new(config)?;

        Ok(Self {
            vision: VisionClient::new(transport.clone()),
            synthesis: SynthesisClient::new(transport.clone()),
            composer: PromptComposer::new(transport),
        })
    }

    pub fn vision(&self) -> &VisionClient {
        &self.vision
    }

    pub fn synthesis(&self) -> &SynthesisClient {
        &self.synthesis
    }

    pub fn composer(&self) -> &PromptComposer {
        &self.composer
    }
}
