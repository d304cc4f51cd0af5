use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};

use event_reel::{
    config::{Config, PipelineConfig, RenderMode},
    error::ConfigError,
    pipeline::PipelineEngine,
    services::{EditClient, VideoGenClient, VisionClient},
    stages::{
        ai_video::AiVideoOpts, slideshow::SlideshowOpts, AiVideoStage, CurationStage,
        SlideshowStage, Stage, StylingStage,
    },
    sync::RemoteSync,
};

#[derive(Parser)]
#[command(
    name = "event-reel",
    version,
    about = "Turn a folder of raw event photos into a finished highlight video",
    long_about = "Event-Reel curates raw event photos with an AI classifier, applies a rotation of artistic styles, and renders the result as either a slideshow or an AI-generated video."
)]
struct Cli {
    /// Directory containing raw event photos
    #[arg(short, long)]
    source: PathBuf,

    /// Output video path (e.g. final.mp4)
    #[arg(short, long)]
    output: PathBuf,

    /// Working directory for intermediate files
    #[arg(long, default_value = "./pipeline_work")]
    work_dir: PathBuf,

    /// Audio file for slideshow mode (e.g. music.mp3)
    #[arg(short, long)]
    audio: Option<PathBuf>,

    /// Keep intermediate files after completion
    #[arg(long)]
    no_cleanup: bool,

    /// Settings file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mirror the source tree against the configured rclone remote
    #[arg(long)]
    sync: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    mode: ModeCommand,
}

#[derive(Subcommand)]
enum ModeCommand {
    /// Render a slideshow video with external ffmpeg
    Slideshow {
        /// Frames per second
        #[arg(long, default_value_t = 30)]
        fps: u32,

        /// Seconds each photo is shown
        #[arg(long, default_value_t = 3.0)]
        seconds_per_image: f64,

        /// Crossfade duration between photos in seconds
        #[arg(long, default_value_t = 0.4)]
        crossfade: f64,
    },
    /// Generate an AI video using styled photos as references
    AiVideo {
        /// Text prompt for the video
        #[arg(long)]
        prompt: String,

        /// Video generation model name
        #[arg(long, default_value = "veo-3.1-generate-preview")]
        model: String,

        /// Video duration in seconds
        #[arg(long, default_value_t = 8)]
        duration: u32,

        /// Frames per second
        #[arg(long, default_value_t = 24)]
        fps: u32,
    },
}

fn require_env(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| {
        ConfigError::MissingApiKey {
            env_var: var.to_string(),
        }
        .into()
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    info!("Starting Event-Reel v{}", env!("CARGO_PKG_VERSION"));

    // Load settings
    let settings = match &cli.config {
        Some(path) => {
            info!("Loading settings from {:?}", path);
            Config::from_file(path)?
        }
        None => Config::default(),
    };
    settings.validate()?;

    let mode = match &cli.mode {
        ModeCommand::Slideshow {
            fps,
            seconds_per_image,
            crossfade,
        } => RenderMode::Slideshow {
            fps: *fps,
            seconds_per_image: *seconds_per_image,
            crossfade_seconds: *crossfade,
        },
        ModeCommand::AiVideo {
            prompt,
            model,
            duration,
            fps,
        } => RenderMode::AiVideo {
            prompt: prompt.clone(),
            model: model.clone(),
            duration_seconds: *duration,
            fps: *fps,
        },
    };

    let config = PipelineConfig {
        source_dir: cli.source.clone(),
        output_video: cli.output.clone(),
        work_dir: cli.work_dir.clone(),
        audio: cli.audio.clone(),
        cleanup: !cli.no_cleanup,
        mode,
    };

    // Reject bad configuration before touching the network or filesystem
    config.validate()?;

    let openai_key = require_env("OPENAI_API_KEY")?;

    let curation = CurationStage::new(Box::new(VisionClient::new(
        settings.services.vision_endpoint.clone(),
        settings.services.vision_model.clone(),
        openai_key.clone(),
    )));

    let styling = StylingStage::new(Box::new(EditClient::new(
        settings.services.edit_endpoint.clone(),
        settings.services.edit_model.clone(),
        openai_key,
    )));

    let render: Box<dyn Stage> = match &config.mode {
        RenderMode::Slideshow {
            fps,
            seconds_per_image,
            crossfade_seconds,
        } => Box::new(SlideshowStage::new(
            SlideshowOpts {
                fps: *fps,
                seconds_per_image: *seconds_per_image,
                crossfade_seconds: *crossfade_seconds,
                resolution: settings.render.resolution,
            },
            config.audio.clone(),
            config.output_video.clone(),
        )),
        RenderMode::AiVideo {
            prompt,
            model,
            duration_seconds,
            fps,
        } => {
            let google_key = require_env("GOOGLE_API_KEY")?;
            Box::new(AiVideoStage::new(
                Box::new(VideoGenClient::new(
                    settings.services.video_endpoint.clone(),
                    google_key,
                    Duration::from_secs(settings.render.poll_interval_secs),
                    settings.render.max_poll_attempts,
                )),
                AiVideoOpts {
                    prompt: prompt.clone(),
                    model: model.clone(),
                    duration_seconds: *duration_seconds,
                    fps: *fps,
                    max_reference_images: settings.render.max_reference_images,
                },
                config.output_video.clone(),
            ))
        }
    };

    let remote_sync = if cli.sync {
        let sync = RemoteSync::from_config(&settings.sync, &cli.source);
        if sync.is_none() {
            warn!("--sync requested but no rclone remote is configured");
        }
        sync
    } else {
        None
    };

    if let Some(sync) = &remote_sync {
        sync.pull().await?;
    }

    let engine = PipelineEngine::new(config, Box::new(curation), Box::new(styling), render);
    engine.run().await?;

    if let Some(sync) = &remote_sync {
        sync.push().await?;
    }

    info!("Done. Output saved to: {:?}", cli.output);
    Ok(())
}
