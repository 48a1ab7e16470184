//! Merges per-image analyses into one unified style description.

use serde_json::json;

use super::{ChatTransport, COMPLETION_MODEL};
use crate::{
    error::{PipelineError, Result},
    journal::{CallJournal, CallKind},
    models::AnalysisResult,
};

const SYNTHESIS_MAX_TOKENS: u32 = 800;

const SYNTHESIS_INSTRUCTION: &str = "You are an expert visual style analyst for video generation. Synthesize multiple image analyses into a unified style guide that captures: color palettes, lighting techniques, compositional patterns, mood/atmosphere, artistic style, and visual aesthetic. Focus on elements that directly influence video generation quality and consistency.";

#[derive(Clone)]
pub struct SynthesisClient {
    transport: ChatTransport,
}

impl SynthesisClient {
    pub(crate) fn new(transport: ChatTransport) -> Self {
        Self { transport }
    }

    /// Compile the analyses (input order preserved) into one mood board.
    /// Fails fast on an empty set without touching the network.
    pub async fn compile(
        &self,
        analyses: &[AnalysisResult],
        journal: &CallJournal,
    ) -> Result<String> {
        if analyses.is_empty() {
            return Err(PipelineError::Validation(
                "cannot compile a mood board from an empty analysis set".into(),
            ));
        }

        let joined = analyses
            .iter()
            .map(|result| result.analysis.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let user_message = format!(
            "Analyze these image descriptions and create a unified mood board for video generation:\n\n{}\n\nCreate a comprehensive style description focusing on:\n1. Dominant color palette and lighting patterns\n2. Consistent compositional elements \n3. Overall mood and emotional tone\n4. Artistic style and visual aesthetic\n5. Key visual themes across all images\n6. Specific details for video generation guidance\n\nOutput should be detailed enough to guide consistent video styling and visual coherence.",
            joined
        );

        let payload = json!({
            "model": COMPLETION_MODEL,
            "messages": [
                { "role": "system", "content": SYNTHESIS_INSTRUCTION },
                { "role": "user", "content": user_message }
            ],
            "max_tokens": SYNTHESIS_MAX_TOKENS
        });
        let summary = json!({
            "model": COMPLETION_MODEL,
            "input_analyses": analyses.len()
        });

        self.transport
            .complete(CallKind::MoodBoardCompilation, payload, summary, journal)
            .await
    }
}
