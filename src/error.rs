use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Request error: {0}")]
    Request(String),
    #[error("Upstream HTTP error {status}: {body}")]
    UpstreamHttp { status: u16, body: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Task failed: {0}")]
    TaskFailed(String),
    #[error("Task timed out after {attempts} attempts")]
    Timeout { attempts: u32 },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Fixed user-facing message shown when one mood image fails analysis.
    pub fn analysis_message(&self) -> &'static str {
        match self {
            PipelineError::UpstreamHttp { status: 401, .. } => "Invalid API key. Check settings.",
            PipelineError::UpstreamHttp { status: 429, .. } => {
                "Rate limit exceeded. Try again later."
            }
            PipelineError::UpstreamHttp { status: 400, .. } => "Invalid image format or size.",
            _ => "Error analyzing this image.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_message_classification() {
        let unauthorized = PipelineError::UpstreamHttp {
            status: 401,
            body: String::new(),
        };
        assert_eq!(
            unauthorized.analysis_message(),
            "Invalid API key. Check settings."
        );

        let throttled = PipelineError::UpstreamHttp {
            status: 429,
            body: String::new(),
        };
        assert_eq!(
            throttled.analysis_message(),
            "Rate limit exceeded. Try again later."
        );

        let bad_input = PipelineError::UpstreamHttp {
            status: 400,
            body: String::new(),
        };
        assert_eq!(bad_input.analysis_message(), "Invalid image format or size.");

        let other = PipelineError::MalformedResponse("no choices".into());
        assert_eq!(other.analysis_message(), "Error analyzing this image.");
    }

    #[test]
    fn test_task_failed_display_carries_provider_message() {
        let err = PipelineError::TaskFailed("oom".into());
        assert!(err.to_string().contains("oom"));
    }

    #[test]
    fn test_timeout_display() {
        let err = PipelineError::Timeout { attempts: 60 };
        assert!(err.to_string().contains("timed out"));
        assert!(err.to_string().contains("60"));
    }
}
