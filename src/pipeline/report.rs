use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Mutable counters owned by the orchestrator for the lifetime of one run
///
/// Never shared across concurrent runs; converted into a [`RunReport`]
/// when the run ends.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub raw_count: usize,
    pub curated_count: usize,
    pub styled_count: usize,
    pub video_generated: bool,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finalize the stats into the terminal, read-only report
    pub fn finish(self, output_video: Option<PathBuf>) -> RunReport {
        RunReport {
            raw_count: self.raw_count,
            curated_count: self.curated_count,
            styled_count: self.styled_count,
            video_generated: self.video_generated,
            output_video,
            finished_at: Utc::now(),
        }
    }
}

/// Read-only snapshot returned to the caller once the run ends
#[derive(Debug, Clone)]
pub struct RunReport {
    pub raw_count: usize,
    pub curated_count: usize,
    pub styled_count: usize,
    pub video_generated: bool,
    pub output_video: Option<PathBuf>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Multi-line summary block for the end of a run
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "PIPELINE SUMMARY".to_string(),
            format!("Raw photos processed:  {}", self.raw_count),
            format!("Photos after curation: {}", self.curated_count),
            format!("Photos after styling:  {}", self.styled_count),
            format!(
                "Video generated:       {}",
                if self.video_generated { "yes" } else { "no" }
            ),
        ];
        if let Some(output) = &self.output_video {
            lines.push(format!("Output location:       {}", output.display()));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_snapshots_counts() {
        let stats = RunStats {
            raw_count: 12,
            curated_count: 8,
            styled_count: 8,
            video_generated: true,
        };

        let report = stats.finish(Some(PathBuf::from("final.mp4")));
        assert_eq!(report.raw_count, 12);
        assert_eq!(report.curated_count, 8);
        assert_eq!(report.styled_count, 8);
        assert!(report.video_generated);
        assert_eq!(report.output_video, Some(PathBuf::from("final.mp4")));
    }

    #[test]
    fn test_summary_mentions_output_only_when_present() {
        let with_output = RunStats::new().finish(Some(PathBuf::from("final.mp4")));
        assert!(with_output.summary().contains("final.mp4"));

        let without_output = RunStats::new().finish(None);
        assert!(!without_output.summary().contains("Output location"));
    }
}
