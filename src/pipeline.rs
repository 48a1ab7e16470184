//! End-to-end orchestration: upload → analysis fan-out → synthesis →
//! prompt composition → generation with bounded polling.
//!
//! One `Pipeline` run is a single logical thread of control that suspends at
//! every external call. Configuration and the call journal are explicit,
//! injected state; nothing is process-global.

use crate::{
    completion::CompletionClient,
    config::{AnalysisConfig, Config},
    error::{PipelineError, Result},
    journal::CallJournal,
    models::{AnalysisResult, GenerationRequest, ImageAsset, TaskSnapshot},
    upload::BlobClient,
    video::VideoTaskClient,
};

/// Inputs for one full generation run.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub script: String,
    pub mood_images: Vec<ImageAsset>,
    pub base_image: ImageAsset,
    pub base_image_description: String,
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub analyses: Vec<AnalysisResult>,
    pub mood_board: String,
    pub prompt: String,
    pub base_image_url: String,
    pub task_id: String,
    pub video_url: Option<String>,
    pub attempts: u32,
}

pub struct Pipeline {
    completion: CompletionClient,
    video: VideoTaskClient,
    blob: BlobClient,
    analysis: AnalysisConfig,
    journal: CallJournal,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let completion = CompletionClient::new(config.completion.ok_or_else(|| {
            PipelineError::Config("completion configuration is required".into())
        })?)?;
        let video = VideoTaskClient::new(
            config
                .video
                .ok_or_else(|| PipelineError::Config("video task configuration is required".into()))?,
            config.poll,
        )?;
        let blob = BlobClient::new(
            config
                .blob
                .ok_or_else(|| PipelineError::Config("blob store configuration is required".into()))?,
        )?;

        Ok(Self {
            completion,
            video,
            blob,
            analysis: config.analysis,
            journal: CallJournal::new(),
        })
    }

    /// The run's audit trail; export it after a run (even a failed one).
    pub fn journal(&self) -> &CallJournal {
        &self.journal
    }

    /// Run the whole pipeline to a terminal artifact URL. `on_progress`
    /// observes every poll read and never affects control flow.
    pub async fn run<F>(&self, inputs: PipelineInputs, on_progress: F) -> Result<PipelineOutcome>
    where
        F: FnMut(&TaskSnapshot),
    {
        log::info!("uploading base image '{}'", inputs.base_image.filename);
        let blob = self
            .blob
            .upload(
                &inputs.base_image.filename,
                &inputs.base_image.content_type,
                inputs.base_image.bytes.clone(),
                &self.journal,
            )
            .await?;
        log::info!("base image available at {}", blob.url);

        log::info!("analyzing {} mood images", inputs.mood_images.len());
        let analyses = self
            .completion
            .vision()
            .analyze_all(&inputs.mood_images, &self.analysis, &self.journal)
            .await;
        log::info!(
            "{} of {} images analyzed",
            analyses.len(),
            inputs.mood_images.len()
        );

        let mood_board = self
            .completion
            .synthesis()
            .compile(&analyses, &self.journal)
            .await?;
        log::info!("mood board compiled ({} chars)", mood_board.len());

        let prompt = self
            .completion
            .composer()
            .compose(
                &inputs.script,
                &mood_board,
                &inputs.base_image_description,
                &self.journal,
            )
            .await?;
        log::info!("generation prompt composed ({} chars)", prompt.len());

        let request = GenerationRequest::new(prompt.clone(), blob.url.clone());
        let outcome = self
            .video
            .generate(&request, &self.journal, on_progress)
            .await?;

        Ok(PipelineOutcome {
            analyses,
            mood_board,
            prompt,
            base_image_url: blob.url,
            task_id: outcome.task_id,
            video_url: outcome.video_url,
            attempts: outcome.attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AnalysisConfig, BlobStoreConfig, CompletionConfig, PollConfig, VideoTaskConfig,
    };
    use crate::journal::CallKind;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png(name: &str) -> ImageAsset {
        ImageAsset::new(name, "image/png", vec![0u8; 8])
    }

    fn test_config(server: &MockServer) -> Config {
        Config::new()
            .with_completion(
                CompletionConfig::new()
                    .with_api_key("openai-test")
                    .with_base_url(server.uri()),
            )
            .with_video(
                VideoTaskConfig::new()
                    .with_api_key("ark-test")
                    .with_base_url(server.uri()),
            )
            .with_blob(BlobStoreConfig::new().with_endpoint(format!("{}/upload", server.uri())))
            .with_analysis(
                AnalysisConfig::new()
                    .with_max_in_flight(3)
                    .with_dispatch_interval(Duration::from_millis(1)),
            )
            .with_poll(
                PollConfig::new()
                    .with_interval(Duration::from_millis(5))
                    .with_max_attempts(60),
            )
    }

    #[tokio::test]
    async fn test_full_run_three_images_three_polls() {
        let server = MockServer::start().await;

        // Blob store: public URL for the base image.
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": "https://blob.example/base.png"
            })))
            .mount(&server)
            .await;

        // One completion stub serves vision ×3, synthesis, and composition.
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [ { "message": { "role": "assistant", "content": "stub completion" } } ]
            })))
            .mount(&server)
            .await;

        // Task submission, then running ×2 before the terminal read.
        Mock::given(method("POST"))
            .and(path("/api/v3/contents/generations/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "abc" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/contents/generations/tasks/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "running" })))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/contents/generations/tasks/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "succeeded",
                "result": { "files": [ { "url": "https://x/video.mp4" } ] }
            })))
            .mount(&server)
            .await;

        let pipeline = Pipeline::new(test_config(&server)).unwrap();
        let inputs = PipelineInputs {
            script: "A slow dawn over the harbor.".to_string(),
            mood_images: vec![png("m1.png"), png("m2.png"), png("m3.png")],
            base_image: png("base.png"),
            base_image_description: "A fishing boat at first light.".to_string(),
        };

        let mut polls_observed = 0u32;
        let outcome = pipeline
            .run(inputs, |_| polls_observed += 1)
            .await
            .unwrap();

        assert_eq!(outcome.task_id, "abc");
        assert_eq!(outcome.video_url, Some("https://x/video.mp4".to_string()));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(polls_observed, 3);
        assert_eq!(outcome.base_image_url, "https://blob.example/base.png");

        assert_eq!(outcome.analyses.len(), 3);
        let indices: Vec<usize> = outcome.analyses.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(outcome.analyses[1].filename, "m2.png");

        let journal = pipeline.journal();
        assert_eq!(journal.count_of(CallKind::BlobUpload), 1);
        assert_eq!(journal.count_of(CallKind::ImageAnalysis), 3);
        assert_eq!(journal.count_of(CallKind::MoodBoardCompilation), 1);
        assert_eq!(journal.count_of(CallKind::FinalPromptGeneration), 1);
        assert_eq!(journal.count_of(CallKind::VideoSubmission), 1);
        assert_eq!(journal.count_of(CallKind::VideoStatus), 3);
    }

    #[tokio::test]
    async fn test_run_aborts_when_no_image_analysis_succeeds() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": "https://blob.example/base.png"
            })))
            .mount(&server)
            .await;

        // Every vision call is rejected; the batch survives but is empty,
        // so synthesis must fail fast without reaching the provider.
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let pipeline = Pipeline::new(test_config(&server)).unwrap();
        let inputs = PipelineInputs {
            script: "script".to_string(),
            mood_images: vec![png("m1.png"), png("m2.png")],
            base_image: png("base.png"),
            base_image_description: "desc".to_string(),
        };

        let err = pipeline.run(inputs, |_| {}).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));

        let journal = pipeline.journal();
        assert_eq!(journal.count_of(CallKind::ImageAnalysis), 2);
        assert_eq!(journal.count_of(CallKind::MoodBoardCompilation), 0);
    }

    #[tokio::test]
    async fn test_failed_submission_aborts_with_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": "https://blob.example/base.png"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [ { "message": { "role": "assistant", "content": "ok" } } ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v3/contents/generations/tasks"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad model"))
            .mount(&server)
            .await;

        let pipeline = Pipeline::new(test_config(&server)).unwrap();
        let inputs = PipelineInputs {
            script: "script".to_string(),
            mood_images: vec![png("m1.png")],
            base_image: png("base.png"),
            base_image_description: "desc".to_string(),
        };

        let err = pipeline.run(inputs, |_| {}).await.unwrap_err();
        match err {
            PipelineError::UpstreamHttp { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad model");
            }
            other => panic!("expected UpstreamHttp, got {:?}", other),
        }
        assert_eq!(pipeline.journal().count_of(CallKind::VideoStatus), 0);
    }
}
