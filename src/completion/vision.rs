//! Per-image mood analysis with a bounded, rate-limit-aware fan-out.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;
use tokio::sync::Semaphore;
use tokio::time::sleep;

use super::{ChatTransport, COMPLETION_MODEL};
use crate::{
    config::AnalysisConfig,
    error::Result,
    journal::{CallJournal, CallKind},
    models::{AnalysisResult, ImageAsset},
};

const VISION_MAX_TOKENS: u32 = 500;

const ANALYST_INSTRUCTION: &str = "You are an expert visual analyst specializing in mood and style analysis for video generation. Analyze images with extreme detail focusing on visual elements that guide video creation: lighting, color palettes, composition, mood, atmosphere, artistic style, and emotional tone.";

const ANALYSIS_QUESTION: &str = "Analyze this image for video generation mood board. Describe in detail: 1) Color palette and lighting style 2) Composition and visual elements 3) Mood and atmosphere 4) Artistic style 5) Emotional tone 6) Visual textures and details. Be extremely specific about visual characteristics that would guide video generation.";

#[derive(Clone)]
pub struct VisionClient {
    transport: ChatTransport,
}

impl VisionClient {
    pub(crate) fn new(transport: ChatTransport) -> Self {
        Self { transport }
    }

    /// Analyze one image, returning the free-text analysis.
    pub async fn analyze(&self, asset: &ImageAsset, journal: &CallJournal) -> Result<String> {
        let payload = json!({
            "model": COMPLETION_MODEL,
            "messages": [
                { "role": "system", "content": ANALYST_INSTRUCTION },
                { "role": "user", "content": [
                    { "type": "text", "text": ANALYSIS_QUESTION },
                    { "type": "image_url", "image_url": { "url": asset.data_uri() } }
                ]}
            ],
            "max_tokens": VISION_MAX_TOKENS
        });
        let summary = json!({
            "model": COMPLETION_MODEL,
            "image": asset.filename,
            "prompt": "Analyze image for mood board"
        });

        self.transport
            .complete(CallKind::ImageAnalysis, payload, summary, journal)
            .await
    }

    /// Analyze a batch of images. Dispatches are spaced by the configured
    /// interval and at most `max_in_flight` requests run at once; a failed
    /// image is logged and dropped without aborting the rest. The returned
    /// list holds only successes, ordered by source index.
    pub async fn analyze_all(
        &self,
        assets: &[ImageAsset],
        config: &AnalysisConfig,
        journal: &CallJournal,
    ) -> Vec<AnalysisResult> {
        let semaphore = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
        let mut handles = Vec::with_capacity(assets.len());

        for (index, asset) in assets.iter().enumerate() {
            if index > 0 {
                sleep(config.dispatch_interval).await;
            }

            let client = self.clone();
            let journal = journal.clone();
            let asset = asset.clone();
            let semaphore = Arc::clone(&semaphore);

            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, None),
                };
                match client.analyze(&asset, &journal).await {
                    Ok(analysis) => (index, Some(analysis)),
                    Err(e) => {
                        log::warn!(
                            "image {} ({}) analysis failed: {} ({})",
                            index + 1,
                            asset.filename,
                            e.analysis_message(),
                            e
                        );
                        (index, None)
                    }
                }
            }));
        }

        let outcomes = join_all(handles)
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    log::error!("image analysis task aborted: {}", e);
                    None
                }
            })
            .collect();

        collect_successes(assets, outcomes)
    }
}

/// Keep only successful analyses, each tied back to its source index.
fn collect_successes(
    assets: &[ImageAsset],
    mut outcomes: Vec<(usize, Option<String>)>,
) -> Vec<AnalysisResult> {
    outcomes.sort_by_key(|(index, _)| *index);
    outcomes
        .into_iter()
        .filter_map(|(index, analysis)| {
            analysis.map(|analysis| AnalysisResult {
                index,
                filename: assets[index].filename.clone(),
                analysis,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompletionConfig;
    use std::time::Duration;

    fn asset(name: &str) -> ImageAsset {
        ImageAsset::new(name, "image/png", vec![0u8; 4])
    }

    #[test]
    fn test_collect_successes_filters_and_keeps_index_association() {
        let assets = vec![asset("a.png"), asset("b.png"), asset("c.png")];
        // Completion order is scrambled and the middle image failed.
        let outcomes = vec![
            (2, Some("calm blues".to_string())),
            (0, Some("warm haze".to_string())),
            (1, None),
        ];

        let results = collect_successes(&assets, outcomes);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].index, 0);
        assert_eq!(results[0].filename, "a.png");
        assert_eq!(results[0].analysis, "warm haze");
        assert_eq!(results[1].index, 2);
        assert_eq!(results[1].filename, "c.png");
    }

    #[test]
    fn test_collect_successes_empty() {
        let assets = vec![asset("a.png")];
        assert!(collect_successes(&assets, vec![(0, None)]).is_empty());
    }

    #[tokio::test]
    async fn test_analyze_all_drops_failures_without_aborting() {
        // Unroutable endpoint: every analysis fails, none abort the batch.
        let transport = ChatTransport::new(
            CompletionConfig::new()
                .with_api_key("test")
                .with_base_url("http://127.0.0.1:1"),
        )
        .unwrap();
        let client = VisionClient::new(transport);
        let journal = CallJournal::with_project_id("project_test");
        let config = AnalysisConfig::new()
            .with_max_in_flight(2)
            .with_dispatch_interval(Duration::from_millis(1));

        let assets = vec![asset("a.png"), asset("b.png")];
        let results = client.analyze_all(&assets, &config, &journal).await;

        assert!(results.is_empty());
        assert_eq!(journal.count_of(CallKind::ImageAnalysis), 2);
    }
}
