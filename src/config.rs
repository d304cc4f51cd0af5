use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Per-run pipeline configuration
///
/// Constructed once per invocation and never mutated. Mode-specific options
/// live in the [`RenderMode`] tagged union so each mode carries only its own
/// strongly-typed settings, validated at construction rather than
/// at point-of-use.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory containing raw event photos (read-only input)
    pub source_dir: PathBuf,

    /// Final output video path (write-once on success)
    pub output_video: PathBuf,

    /// Working directory for intermediate artifacts
    pub work_dir: PathBuf,

    /// Optional audio track for slideshow mode
    pub audio: Option<PathBuf>,

    /// Remove the working directory after the run (success or failure)
    pub cleanup: bool,

    /// Which render stage to dispatch
    pub mode: RenderMode,
}

impl PipelineConfig {
    /// Validate the configuration before any stage runs
    pub fn validate(&self) -> Result<()> {
        self.mode.validate()
    }
}

/// Render stage selection with mode-specific options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RenderMode {
    Slideshow {
        fps: u32,
        seconds_per_image: f64,
        crossfade_seconds: f64,
    },
    AiVideo {
        prompt: String,
        model: String,
        duration_seconds: u32,
        fps: u32,
    },
}

impl RenderMode {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Slideshow {
                fps,
                seconds_per_image,
                crossfade_seconds,
            } => {
                if *fps == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "slideshow.fps".to_string(),
                        value: fps.to_string(),
                    }
                    .into());
                }
                if *seconds_per_image <= 0.0 {
                    return Err(ConfigError::InvalidValue {
                        key: "slideshow.seconds_per_image".to_string(),
                        value: seconds_per_image.to_string(),
                    }
                    .into());
                }
                if *crossfade_seconds < 0.0 || *crossfade_seconds >= *seconds_per_image {
                    return Err(ConfigError::InvalidValue {
                        key: "slideshow.crossfade_seconds".to_string(),
                        value: crossfade_seconds.to_string(),
                    }
                    .into());
                }
            }
            Self::AiVideo {
                prompt,
                duration_seconds,
                fps,
                ..
            } => {
                if prompt.trim().is_empty() {
                    return Err(ConfigError::MissingPrompt.into());
                }
                if *duration_seconds == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "ai_video.duration_seconds".to_string(),
                        value: duration_seconds.to_string(),
                    }
                    .into());
                }
                if *fps == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "ai_video.fps".to_string(),
                        value: fps.to_string(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Human-readable mode name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Slideshow { .. } => "slideshow",
            Self::AiVideo { .. } => "ai-video",
        }
    }
}

/// Crate-wide settings loaded from a TOML file or defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// External AI service settings
    pub services: ServicesConfig,

    /// Render tuning
    pub render: RenderConfig,

    /// Optional rclone mirror settings
    pub sync: SyncConfig,
}

impl Config {
    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|_| ConfigError::ParseFailed {
            path: path.display().to_string(),
        })?;
        Ok(config)
    }

    /// Save settings to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content).map_err(crate::error::PipelineError::Io)?;
        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        self.render.validate()?;
        Ok(())
    }
}

/// Endpoints and model identifiers for the external AI collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Vision classification endpoint (OpenAI-compatible)
    pub vision_endpoint: String,

    /// Model used for keep/drop photo decisions
    pub vision_model: String,

    /// Image edit endpoint (OpenAI-compatible)
    pub edit_endpoint: String,

    /// Model used for style transforms
    pub edit_model: String,

    /// Video generation endpoint
    pub video_endpoint: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            vision_endpoint: "https://api.openai.com/v1".to_string(),
            vision_model: "gpt-4o".to_string(),
            edit_endpoint: "https://api.openai.com/v1".to_string(),
            edit_model: "gpt-image-1".to_string(),
            video_endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

/// Render tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Slideshow output resolution (width, height)
    pub resolution: (u32, u32),

    /// Seconds between polls of the video generation operation
    pub poll_interval_secs: u64,

    /// Maximum number of polls before giving up on generation
    pub max_poll_attempts: u32,

    /// Maximum reference images sent to the video generation service
    pub max_reference_images: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            resolution: (1280, 720),
            poll_interval_secs: 5,
            max_poll_attempts: 120,
            max_reference_images: 3,
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.resolution".to_string(),
                value: format!("{}x{}", self.resolution.0, self.resolution.1),
            }
            .into());
        }

        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.poll_interval_secs".to_string(),
                value: self.poll_interval_secs.to_string(),
            }
            .into());
        }

        if self.max_poll_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.max_poll_attempts".to_string(),
                value: self.max_poll_attempts.to_string(),
            }
            .into());
        }

        if self.max_reference_images == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.max_reference_images".to_string(),
                value: self.max_reference_images.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Optional rclone mirror of the source tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// rclone binary name or path
    pub rclone_bin: String,

    /// Remote in rclone's `remote:path` form; empty disables sync
    pub remote: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            rclone_bin: "rclone".to_string(),
            remote: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn slideshow_config(mode: RenderMode) -> PipelineConfig {
        PipelineConfig {
            source_dir: PathBuf::from("raw"),
            output_video: PathBuf::from("out.mp4"),
            work_dir: PathBuf::from("work"),
            audio: None,
            cleanup: true,
            mode,
        }
    }

    #[test]
    fn test_default_settings_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_settings_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("settings.toml");

        let original = Config::default();
        original.save_to_file(&file_path).unwrap();
        let loaded = Config::from_file(&file_path).unwrap();

        assert_eq!(original.services.vision_model, loaded.services.vision_model);
        assert_eq!(original.render.max_poll_attempts, loaded.render.max_poll_attempts);
    }

    #[test]
    fn test_ai_video_requires_prompt() {
        let config = slideshow_config(RenderMode::AiVideo {
            prompt: "   ".to_string(),
            model: "veo-3.1-generate-preview".to_string(),
            duration_seconds: 8,
            fps: 24,
        });

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            crate::error::PipelineError::Config(ConfigError::MissingPrompt)
        ));
    }

    #[test]
    fn test_crossfade_must_fit_in_image_duration() {
        let config = slideshow_config(RenderMode::Slideshow {
            fps: 30,
            seconds_per_image: 2.0,
            crossfade_seconds: 2.5,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_slideshow_mode() {
        let config = slideshow_config(RenderMode::Slideshow {
            fps: 30,
            seconds_per_image: 3.0,
            crossfade_seconds: 0.4,
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_poll_settings() {
        let mut config = Config::default();
        config.render.max_poll_attempts = 0;
        assert!(config.validate().is_err());
    }
}
