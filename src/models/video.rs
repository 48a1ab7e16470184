use serde_json::Value;

pub const DEFAULT_VIDEO_MODEL: &str = "seedance-1-0-lite-i2v-250428";

/// Fixed encoding parameters appended to every generation prompt.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub resolution: String,
    pub duration_secs: u32,
    pub camera_fixed: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            resolution: "720p".to_string(),
            duration_secs: 5,
            camera_fixed: false,
        }
    }
}

impl GenerationSettings {
    pub fn prompt_suffix(&self) -> String {
        format!(
            " --resolution {} --duration {} --camerafixed {}",
            self.resolution, self.duration_secs, self.camera_fixed
        )
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image_url: String,
    pub model_id: Option<String>,
    pub settings: GenerationSettings,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image_url: image_url.into(),
            model_id: None,
            settings: GenerationSettings::default(),
        }
    }
}

/// Provider-reported task status. The terminal vocabulary is fixed; every
/// other value (including provider-specific intermediate states) counts as
/// still running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    Failed,
    Pending(String),
}

impl TaskStatus {
    /// Case- and whitespace-insensitive parse of the provider's raw string.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "succeeded" => TaskStatus::Succeeded,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Pending(normalized),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

/// One observed poll read, handed to the caller's progress callback.
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    pub task_id: String,
    pub attempt: u32,
    pub raw_status: String,
    pub status: TaskStatus,
    pub body: Value,
}

/// Terminal outcome of a generation attempt. `video_url` may be absent even
/// on success when the provider's response carried no recognizable artifact
/// location.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub task_id: String,
    pub video_url: Option<String>,
    pub result: Value,
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_and_whitespace_insensitive() {
        assert_eq!(TaskStatus::parse("Succeeded"), TaskStatus::Succeeded);
        assert_eq!(TaskStatus::parse(" succeeded "), TaskStatus::Succeeded);
        assert_eq!(TaskStatus::parse("SUCCEEDED"), TaskStatus::Succeeded);
        assert_eq!(TaskStatus::parse("FAILED"), TaskStatus::Failed);
        assert_eq!(TaskStatus::parse("\tfailed\n"), TaskStatus::Failed);
    }

    #[test]
    fn test_unknown_status_is_pending() {
        assert_eq!(
            TaskStatus::parse("Running"),
            TaskStatus::Pending("running".to_string())
        );
        assert_eq!(
            TaskStatus::parse("queued"),
            TaskStatus::Pending("queued".to_string())
        );
        assert_eq!(TaskStatus::parse(""), TaskStatus::Pending(String::new()));
        assert!(!TaskStatus::parse("running").is_terminal());
        assert!(TaskStatus::parse("failed").is_terminal());
    }

    #[test]
    fn test_prompt_suffix() {
        let settings = GenerationSettings::default();
        assert_eq!(
            settings.prompt_suffix(),
            " --resolution 720p --duration 5 --camerafixed false"
        );
    }
}
