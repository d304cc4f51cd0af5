//! Pipeline orchestration: stage sequencing, run state, and reporting

pub mod engine;
pub mod report;

pub use engine::{PipelineEngine, PipelineState};
pub use report::{RunReport, RunStats};
