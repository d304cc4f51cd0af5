//! # Event-Reel
//!
//! Turn a folder of raw event photos into a finished highlight video.
//!
//! The pipeline runs three strictly ordered stages: AI curation filters the
//! raw photos, AI styling applies a fixed rotation of looks, and a render
//! stage produces the final video either as a slideshow (external ffmpeg)
//! or via an AI video generation service.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! use event_reel::{
//!     config::{Config, PipelineConfig, RenderMode},
//!     pipeline::PipelineEngine,
//!     services::{EditClient, VisionClient},
//!     stages::{slideshow::SlideshowOpts, CurationStage, SlideshowStage, StylingStage},
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let settings = Config::default();
//! let api_key = std::env::var("OPENAI_API_KEY")?;
//!
//! let config = PipelineConfig {
//!     source_dir: PathBuf::from("raw_photos"),
//!     output_video: PathBuf::from("final.mp4"),
//!     work_dir: PathBuf::from("pipeline_work"),
//!     audio: None,
//!     cleanup: true,
//!     mode: RenderMode::Slideshow {
//!         fps: 30,
//!         seconds_per_image: 3.0,
//!         crossfade_seconds: 0.4,
//!     },
//! };
//!
//! let curation = CurationStage::new(Box::new(VisionClient::new(
//!     settings.services.vision_endpoint.clone(),
//!     settings.services.vision_model.clone(),
//!     api_key.clone(),
//! )));
//! let styling = StylingStage::new(Box::new(EditClient::new(
//!     settings.services.edit_endpoint.clone(),
//!     settings.services.edit_model.clone(),
//!     api_key,
//! )));
//! let render = SlideshowStage::new(
//!     SlideshowOpts {
//!         fps: 30,
//!         seconds_per_image: 3.0,
//!         crossfade_seconds: 0.4,
//!         resolution: settings.render.resolution,
//!     },
//!     None,
//!     config.output_video.clone(),
//! );
//!
//! let engine = PipelineEngine::new(
//!     config,
//!     Box::new(curation),
//!     Box::new(styling),
//!     Box::new(render),
//! );
//! let report = engine.run().await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`pipeline`] - Orchestration engine, run state, and reporting
//! - [`stages`] - Stage adapters wrapping the external collaborators
//! - [`services`] - HTTP clients for the AI services
//! - [`workspace`] - Working directory lifecycle
//! - [`manifest`] - The persisted styling manifest
//! - [`config`] - Run and settings configuration
//!
//! ## Custom Collaborators
//!
//! Every external collaborator sits behind a trait, so alternative services
//! (or test doubles) drop in without touching the orchestration core:
//!
//! ```rust
//! use std::path::Path;
//!
//! use async_trait::async_trait;
//! use event_reel::services::ImageClassifier;
//!
//! struct KeepEverything;
//!
//! #[async_trait]
//! impl ImageClassifier for KeepEverything {
//!     async fn keep(&self, _image: &Path) -> anyhow::Result<bool> {
//!         Ok(true)
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod services;
pub mod stages;
pub mod sync;
pub mod workspace;

// Re-export commonly used types for convenience
pub use crate::{
    config::{Config, PipelineConfig, RenderMode},
    error::{PipelineError, Result},
    pipeline::{PipelineEngine, RunReport},
    stages::{Stage, StageName, StageResult},
};
