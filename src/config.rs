use std::env;
use std::time::Duration;

pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_VIDEO_BASE_URL: &str = "https://ark.ap-southeast.bytepluses.com";

/// Credentials and endpoint for the chat-completion provider used by the
/// vision, synthesis, and prompt-composition stages.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        CompletionConfig {
            api_key: None,
            base_url: None,
        }
    }
}

impl CompletionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("OPENAI_API_KEY").ok();
        let base_url = env::var("OPENAI_BASE_URL").ok();

        CompletionConfig { api_key, base_url }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Credentials, endpoint, and model for the video-generation task provider.
#[derive(Debug, Clone)]
pub struct VideoTaskConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model_id: Option<String>,
}

impl Default for VideoTaskConfig {
    fn default() -> Self {
        VideoTaskConfig {
            api_key: None,
            base_url: None,
            model_id: None,
        }
    }
}

impl VideoTaskConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("ARK_API_KEY").ok();
        let base_url = env::var("ARK_BASE_URL").ok();
        let model_id = env::var("ARK_VIDEO_MODEL").ok();

        VideoTaskConfig {
            api_key,
            base_url,
            model_id,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }
}

/// Endpoint for the blob store the upload relay forwards to.
#[derive(Debug, Clone)]
pub struct BlobStoreConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        BlobStoreConfig {
            endpoint: None,
            token: None,
        }
    }
}

impl BlobStoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let endpoint = env::var("BLOB_UPLOAD_URL").ok();
        let token = env::var("BLOB_TOKEN").ok();

        BlobStoreConfig { endpoint, token }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Fan-out policy for the mood-image analysis stage: at most `max_in_flight`
/// requests run concurrently, and consecutive dispatches are spaced by
/// `dispatch_interval` to stay under provider rate limits.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub max_in_flight: usize,
    pub dispatch_interval: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            max_in_flight: 3,
            dispatch_interval: Duration::from_millis(1000),
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn with_dispatch_interval(mut self, dispatch_interval: Duration) -> Self {
        self.dispatch_interval = dispatch_interval;
        self
    }
}

/// Status-polling policy for a submitted generation task. The defaults
/// (5 seconds between reads, 60 reads) bound a run to roughly five minutes.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub completion: Option<CompletionConfig>,
    pub video: Option<VideoTaskConfig>,
    pub blob: Option<BlobStoreConfig>,
    pub analysis: AnalysisConfig,
    pub poll: PollConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            completion: None,
            video: None,
            blob: None,
            analysis: AnalysisConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            completion: Some(CompletionConfig::from_env()),
            video: Some(VideoTaskConfig::from_env()),
            blob: Some(BlobStoreConfig::from_env()),
            analysis: AnalysisConfig::default(),
            poll: PollConfig::default(),
        }
    }

    pub fn with_completion(mut self, config: CompletionConfig) -> Self {
        self.completion = Some(config);
        self
    }

    pub fn with_video(mut self, config: VideoTaskConfig) -> Self {
        self.video = Some(config);
        self
    }

    pub fn with_blob(mut self, config: BlobStoreConfig) -> Self {
        self.blob = Some(config);
        self
    }

    pub fn with_analysis(mut self, config: AnalysisConfig) -> Self {
        self.analysis = config;
        self
    }

    pub fn with_poll(mut self, config: PollConfig) -> Self {
        self.poll = config;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_defaults() {
        let poll = PollConfig::default();
        assert_eq!(poll.interval, Duration::from_secs(5));
        assert_eq!(poll.max_attempts, 60);
    }

    #[test]
    fn test_analysis_defaults() {
        let analysis = AnalysisConfig::default();
        assert_eq!(analysis.max_in_flight, 3);
        assert_eq!(analysis.dispatch_interval, Duration::from_millis(1000));
    }

    #[test]
    fn test_config_builders() {
        let config = Config::new()
            .with_completion(CompletionConfig::new().with_api_key("ck"))
            .with_video(
                VideoTaskConfig::new()
                    .with_api_key("vk")
                    .with_model("custom-model"),
            )
            .with_blob(BlobStoreConfig::new().with_endpoint("https://blob.example/upload"))
            .with_poll(PollConfig::new().with_max_attempts(10));

        assert_eq!(
            config.completion.as_ref().and_then(|c| c.api_key.as_deref()),
            Some("ck")
        );
        assert_eq!(
            config.video.as_ref().and_then(|c| c.model_id.as_deref()),
            Some("custom-model")
        );
        assert_eq!(
            config.blob.as_ref().and_then(|c| c.endpoint.as_deref()),
            Some("https://blob.example/upload")
        );
        assert_eq!(config.poll.max_attempts, 10);
    }
}
