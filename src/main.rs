use std::env;
use std::path::{Path, PathBuf};

use moodreel::{save_prompt_file, Config, ImageAsset, Pipeline, PipelineInputs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    moodreel::logger::init_with_config(
        moodreel::logger::LoggerConfig::development()
            .with_level(moodreel::logger::LogLevel::Debug),
    )?;

    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded successfully"),
        Err(_) => log::warn!("⚠️  No .env file found, using system environment variables"),
    }

    log::info!("🔍 Checking credentials...");
    for (var, purpose) in [
        ("OPENAI_API_KEY", "image analysis and prompt composition"),
        ("ARK_API_KEY", "video generation"),
        ("BLOB_UPLOAD_URL", "base image upload"),
    ] {
        match env::var(var) {
            Ok(_) => log::info!("✅ {} set ({})", var, purpose),
            Err(_) => log::warn!("⚠️  {} not set, {} will fail", var, purpose),
        }
    }

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 4 {
        log::error!(
            "Usage: moodreel <script.txt> <base_image> <base_description.txt> <mood_image>..."
        );
        return Err("missing arguments".into());
    }

    let script = std::fs::read_to_string(&args[0])?;
    let base_image = ImageAsset::from_path(Path::new(&args[1]))?;
    let base_image_description = std::fs::read_to_string(&args[2])?;
    let mood_images = args[3..]
        .iter()
        .map(|path| ImageAsset::from_path(Path::new(path)))
        .collect::<moodreel::Result<Vec<_>>>()?;

    log::info!(
        "🎬 Starting run: {} mood images, base image '{}'",
        mood_images.len(),
        base_image.filename
    );

    let pipeline = Pipeline::new(Config::from_env())?;
    log::info!("📁 Project: {}", pipeline.journal().project_id());

    let inputs = PipelineInputs {
        script,
        mood_images,
        base_image,
        base_image_description,
    };

    let result = pipeline
        .run(inputs, |snapshot| {
            log::info!(
                "📊 Poll attempt {}: status '{}'",
                snapshot.attempt,
                snapshot.raw_status
            );
        })
        .await;

    // The journal is forensic: write it out whether the run succeeded or not.
    let log_path = pipeline.journal().write_to_file(&PathBuf::from("."))?;
    log::info!("📝 Call log saved to {}", log_path.display());

    match result {
        Ok(outcome) => {
            let prompt_path = save_prompt_file(&PathBuf::from("."), &outcome.prompt)?;
            log::info!("💾 Prompt saved to {}", prompt_path.display());
            log::info!(
                "🎉 Task {} finished after {} polls",
                outcome.task_id,
                outcome.attempts
            );
            match outcome.video_url {
                Some(url) => log::info!("🎥 Video ready: {}", url),
                None => log::warn!(
                    "⚠️  Task succeeded but no video URL was reported; see the call log"
                ),
            }
            Ok(())
        }
        Err(e) => {
            log::error!("❌ Pipeline run failed: {}", e);
            Err(e.into())
        }
    }
}
