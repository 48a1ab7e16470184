//! Builds the final cinematic generation prompt from script, mood board,
//! and base-image description.

use serde_json::json;

use super::{ChatTransport, COMPLETION_MODEL};
use crate::{
    error::{PipelineError, Result},
    journal::{CallJournal, CallKind},
};

const COMPOSER_MAX_TOKENS: u32 = 1000;

const COMPOSER_INSTRUCTION: &str = "You are an expert AI video generation prompt engineer. Create extremely detailed, cinematic prompts for 5-second image-to-video generation. Focus on: 1) Specific camera movements and angles 2) Detailed lighting and visual effects 3) Precise subject movements and actions 4) Environmental elements and atmosphere 5) Technical specifications for video generation. Always incorporate the base image as the starting frame.";

#[derive(Clone)]
pub struct PromptComposer {
    transport: ChatTransport,
}

impl PromptComposer {
    pub(crate) fn new(transport: ChatTransport) -> Self {
        Self { transport }
    }

    /// Compose the generation prompt. All three inputs are required; a
    /// missing one aborts before any network call.
    pub async fn compose(
        &self,
        script: &str,
        mood_board: &str,
        base_image_description: &str,
        journal: &CallJournal,
    ) -> Result<String> {
        let script = script.trim();
        let mood_board = mood_board.trim();
        let base_image_description = base_image_description.trim();

        if script.is_empty() {
            return Err(PipelineError::Validation("script is required".into()));
        }
        if mood_board.is_empty() {
            return Err(PipelineError::Validation("mood board is required".into()));
        }
        if base_image_description.is_empty() {
            return Err(PipelineError::Validation(
                "base image description is required".into(),
            ));
        }

        let user_message = format!(
            "Create a detailed video generation prompt for ByteDance Seedance model based on these inputs:\n\nSCRIPT/NARRATIVE:\n{}\n\nVISUAL STYLE/MOOD:\n{}\n\nBASE IMAGE (starting frame):\n{}\n\nGenerate a comprehensive prompt that includes:\n- Second-by-second action description (5 seconds)\n- Camera movements (pans, zooms, tracking shots)\n- Lighting changes and visual effects\n- Subject movements and expressions\n- Environmental details and atmosphere\n- Technical specifications for smooth motion\n\nThe base image is the starting frame - describe how it transitions and evolves over 5 seconds while maintaining visual coherence with the mood board style.",
            script, mood_board, base_image_description
        );

        let payload = json!({
            "model": COMPLETION_MODEL,
            "messages": [
                { "role": "system", "content": COMPOSER_INSTRUCTION },
                { "role": "user", "content": user_message }
            ],
            "max_tokens": COMPOSER_MAX_TOKENS
        });
        let summary = json!({
            "model": COMPLETION_MODEL,
            "script": preview(script),
            "base_image_desc": preview(base_image_description)
        });

        self.transport
            .complete(CallKind::FinalPromptGeneration, payload, summary, journal)
            .await
    }
}

/// First 100 characters, for journal snapshots.
fn preview(text: &str) -> String {
    let head: String = text.chars().take(100).collect();
    if head.len() < text.len() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompletionConfig;

    fn composer() -> PromptComposer {
        let transport = ChatTransport::new(
            CompletionConfig::new()
                .with_api_key("test")
                .with_base_url("http://127.0.0.1:1"),
        )
        .unwrap();
        PromptComposer::new(transport)
    }

    #[tokio::test]
    async fn test_missing_inputs_abort_before_any_call() {
        let composer = composer();
        let journal = CallJournal::with_project_id("project_test");

        let err = composer
            .compose("", "mood", "desc", &journal)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(ref m) if m.contains("script")));

        let err = composer
            .compose("script", "  ", "desc", &journal)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(ref m) if m.contains("mood board")));

        let err = composer
            .compose("script", "mood", "\n", &journal)
            .await
            .unwrap_err();
        assert!(
            matches!(err, PipelineError::Validation(ref m) if m.contains("base image description"))
        );

        assert!(journal.is_empty());
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "x".repeat(150);
        let short = preview(&long);
        assert_eq!(short.chars().count(), 103);
        assert!(short.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }
}
