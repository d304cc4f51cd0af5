use thiserror::Error;

use crate::stages::StageName;

/// Main error type for the Event-Reel pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors, all rejected before any stage runs
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("AI video mode requires a non-empty prompt")]
    MissingPrompt,

    #[error("Missing required API key: {env_var}")]
    MissingApiKey { env_var: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Failed to parse settings file: {path}")]
    ParseFailed { path: String },

    #[error("Settings file not found: {path}")]
    FileNotFound { path: String },
}

/// Stage-level errors carrying the originating stage name
///
/// Any of these halts the pipeline immediately; the orchestrator still
/// dispatches workspace teardown before surfacing the error.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("{stage}: precondition failed: {reason}")]
    Precondition { stage: StageName, reason: String },

    #[error("{stage}: produced no usable output: {reason}")]
    EmptyResult { stage: StageName, reason: String },

    #[error("{stage}: external collaborator failed: {source}")]
    External {
        stage: StageName,
        #[source]
        source: anyhow::Error,
    },
}

impl StageError {
    pub fn external(stage: StageName, source: impl Into<anyhow::Error>) -> Self {
        Self::External {
            stage,
            source: source.into(),
        }
    }

    /// The stage that produced this error
    pub fn stage(&self) -> StageName {
        match self {
            Self::Precondition { stage, .. }
            | Self::EmptyResult { stage, .. }
            | Self::External { stage, .. } => *stage,
        }
    }
}

/// AI-video generation errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("remote operation reported an error: {message}")]
    Remote { message: String },

    #[error("generation did not complete within {attempts} polls")]
    TimedOut { attempts: u32 },

    #[error("response contained no retrievable video payload")]
    MissingPayload,

    #[error("video is stored at a non-HTTP location: {uri} (download manually)")]
    UnfetchableUri { uri: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Remote sync errors (rclone mirror, off the critical path)
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("rclone binary not found: {bin}")]
    BinaryMissing { bin: String },

    #[error("rclone {direction} failed: {detail}")]
    CommandFailed { direction: String, detail: String },
}

/// Convenience type alias for Results using PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;
