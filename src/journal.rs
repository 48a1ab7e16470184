//! Append-only audit trail of every external call made during a run.
//!
//! One [`CallRecord`] is appended per call attempt, success or failure, in
//! call order. The journal is a cheap-to-clone handle injected into each
//! stage rather than ambient global state, and the whole trail can be
//! exported as a plain-text project log.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    ImageAnalysis,
    MoodBoardCompilation,
    FinalPromptGeneration,
    VideoSubmission,
    VideoStatus,
    BlobUpload,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::ImageAnalysis => "image_analysis",
            CallKind::MoodBoardCompilation => "mood_board_compilation",
            CallKind::FinalPromptGeneration => "final_prompt_generation",
            CallKind::VideoSubmission => "video_submission",
            CallKind::VideoStatus => "video_status",
            CallKind::BlobUpload => "blob_upload",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: CallKind,
    pub request: Value,
    pub response: Value,
}

#[derive(Clone)]
pub struct CallJournal {
    project_id: String,
    records: Arc<Mutex<Vec<CallRecord>>>,
}

impl CallJournal {
    pub fn new() -> Self {
        Self::with_project_id(generate_project_id())
    }

    pub fn with_project_id(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Append one record. Request and response are snapshots, not the full
    /// wire payloads; callers summarize large bodies (e.g. image data URIs).
    pub fn record(&self, kind: CallKind, request: Value, response: Value) {
        let record = CallRecord {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
            request,
            response,
        };
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count_of(&self, kind: CallKind) -> usize {
        self.records
            .lock()
            .map(|r| r.iter().filter(|record| record.kind == kind).count())
            .unwrap_or(0)
    }

    /// Snapshot of all records in call order.
    pub fn records(&self) -> Vec<CallRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Render the trail as a plain-text project log.
    pub fn export_text(&self) -> String {
        let separator = "=".repeat(50);
        let mut content = format!("PROJECT: {}\n", self.project_id);
        content.push_str(&format!(
            "GENERATED: {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        content.push_str(&format!("{}\n\n", separator));

        for (index, record) in self.records().iter().enumerate() {
            content.push_str(&format!(
                "[{}] {}\n",
                index + 1,
                record.kind.as_str().to_uppercase()
            ));
            content.push_str(&format!(
                "Time: {}\n",
                record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
            ));
            content.push_str(&format!(
                "Request: {}\n",
                serde_json::to_string_pretty(&record.request).unwrap_or_default()
            ));
            content.push_str(&format!(
                "Response: {}\n",
                serde_json::to_string_pretty(&record.response).unwrap_or_default()
            ));
            content.push_str(&format!("{}\n\n", separator));
        }

        content
    }

    /// Write the text log to `<dir>/<project_id>_api_log.txt`.
    pub fn write_to_file(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{}_api_log.txt", self.project_id));
        fs::write(&path, self.export_text()).map_err(|e| PipelineError::Io(e.to_string()))?;
        Ok(path)
    }
}

impl Default for CallJournal {
    fn default() -> Self {
        Self::new()
    }
}

pub fn generate_project_id() -> String {
    format!("project_{}", Utc::now().format("%Y%m%d_%H%M%S"))
}

/// Save the final generation prompt to `<dir>/prompt_<timestamp>.txt`.
pub fn save_prompt_file(dir: &Path, prompt: &str) -> Result<PathBuf> {
    let timestamp = Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    let path = dir.join(format!("prompt_{}.txt", timestamp));
    fs::write(&path, prompt).map_err(|e| PipelineError::Io(e.to_string()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_preserve_call_order() {
        let journal = CallJournal::with_project_id("project_test");
        journal.record(CallKind::ImageAnalysis, json!({"image": "a.png"}), json!({}));
        journal.record(CallKind::ImageAnalysis, json!({"image": "b.png"}), json!({}));
        journal.record(CallKind::VideoSubmission, json!({}), json!({"task_id": "t1"}));

        let records = journal.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].request["image"], "a.png");
        assert_eq!(records[1].request["image"], "b.png");
        assert_eq!(records[2].kind, CallKind::VideoSubmission);
        assert_eq!(journal.count_of(CallKind::ImageAnalysis), 2);
    }

    #[test]
    fn test_clones_share_the_same_trail() {
        let journal = CallJournal::with_project_id("project_test");
        let clone = journal.clone();
        clone.record(CallKind::BlobUpload, json!({}), json!({}));
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn test_export_text_format() {
        let journal = CallJournal::with_project_id("project_20240101_120000");
        journal.record(
            CallKind::ImageAnalysis,
            json!({"image": "a.png"}),
            json!({"content": "warm tones"}),
        );

        let text = journal.export_text();
        assert!(text.starts_with("PROJECT: project_20240101_120000\n"));
        assert!(text.contains("GENERATED: "));
        assert!(text.contains("[1] IMAGE_ANALYSIS"));
        assert!(text.contains("warm tones"));
        assert!(text.contains(&"=".repeat(50)));
    }

    #[test]
    fn test_project_id_format() {
        let id = generate_project_id();
        assert!(id.starts_with("project_"));
        assert_eq!(id.len(), "project_".len() + 15);
    }

    #[test]
    fn test_write_to_file() {
        let dir = std::env::temp_dir();
        let journal = CallJournal::new();
        journal.record(CallKind::VideoStatus, json!({"task_id": "t"}), json!({}));

        let path = journal.write_to_file(&dir).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[1] VIDEO_STATUS"));
        let _ = fs::remove_file(path);
    }
}
