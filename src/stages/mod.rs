//! Stage adapters wrapping the external collaborators
//!
//! Every stage exposes the same contract: consume an input directory,
//! populate an output directory (or final artifact), and report a
//! [`StageResult`] the orchestrator uses to decide whether to advance.

pub mod ai_video;
pub mod curate;
pub mod slideshow;
pub mod style;

pub use ai_video::AiVideoStage;
pub use curate::CurationStage;
pub use slideshow::SlideshowStage;
pub use style::StylingStage;

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::StageError;

/// Image extensions accepted anywhere in the pipeline (case-insensitive)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Identifies the stage an error or result originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageName {
    Curation,
    Styling,
    Slideshow,
    AiVideo,
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Curation => "curation",
            Self::Styling => "styling",
            Self::Slideshow => "slideshow",
            Self::AiVideo => "ai-video",
        };
        write!(f, "{name}")
    }
}

/// Per-stage outcome consumed by the orchestrator
#[derive(Debug, Clone, Default)]
pub struct StageResult {
    /// Items the stage received
    pub items_in: usize,

    /// Items the stage produced; zero blocks the pipeline from advancing
    pub items_out: usize,

    /// Paths to the artifacts this stage produced
    pub artifacts: Vec<PathBuf>,
}

/// Uniform contract every stage adapter implements
#[async_trait]
pub trait Stage: Send + Sync {
    /// Unique stage name, surfaced in errors and logs
    fn name(&self) -> StageName;

    /// Execute the stage's work
    ///
    /// Adapters propagate collaborator failures as [`StageError`]; they never
    /// suppress errors silently, with the one documented exception of
    /// styling's per-item isolation.
    async fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<StageResult, StageError>;
}

/// List supported images in a directory, sorted by file name
///
/// The stable sort order is what makes the styling rotation deterministic
/// across runs of the same input set.
pub fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();
    images.sort();
    Ok(images)
}

/// Move a finished artifact from its temp path to the final destination
///
/// Rename keeps the write atomic from the caller's perspective; the copy
/// fallback covers temp and destination living on different filesystems.
pub(crate) fn promote(temp: &Path, dest: &Path) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    match std::fs::rename(temp, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(temp, dest)?;
            std::fs::remove_file(temp)
        }
    }
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
