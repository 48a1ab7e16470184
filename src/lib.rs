//! MoodReel orchestrates a multi-stage AI video-generation pipeline: mood
//! images are analyzed by a vision completion model, synthesized into one
//! style description, composed with a narrative script into a cinematic
//! prompt, and handed to a long-running video task that is polled to a
//! terminal artifact URL. Every external call is journaled for export.

pub mod completion;
pub mod config;
pub mod error;
pub mod journal;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod upload;
pub mod video;

pub use completion::{CompletionClient, PromptComposer, SynthesisClient, VisionClient};
pub use config::{
    AnalysisConfig, BlobStoreConfig, CompletionConfig, Config, PollConfig, VideoTaskConfig,
};
pub use error::{PipelineError, Result};
pub use journal::{save_prompt_file, CallJournal, CallKind, CallRecord};
pub use models::*;
pub use pipeline::{Pipeline, PipelineInputs, PipelineOutcome};
pub use upload::{BlobClient, UploadedBlob};
pub use video::{extract_artifact_url, poll_until_terminal, StatusSource, VideoTaskClient};
