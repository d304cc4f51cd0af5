use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::Result;

/// Working directory tree used to hand artifacts between stages
///
/// All three subdirectories are nested under the work dir so a single
/// recursive delete reclaims everything.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    pub work_dir: PathBuf,
    pub curated_dir: PathBuf,
    pub styled_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl WorkspaceLayout {
    /// Derive the layout from the working directory
    pub fn new<P: AsRef<Path>>(work_dir: P) -> Self {
        let work_dir = work_dir.as_ref().to_path_buf();
        Self {
            curated_dir: work_dir.join("curated"),
            styled_dir: work_dir.join("styled"),
            output_dir: work_dir.join("output"),
            work_dir,
        }
    }

    /// Create the working directory tree; safe to call if it already exists
    pub fn setup(&self) -> Result<()> {
        debug!("Setting up workspace at {:?}", self.work_dir);
        std::fs::create_dir_all(&self.curated_dir)?;
        std::fs::create_dir_all(&self.styled_dir)?;
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Remove the working directory tree, or preserve it per policy
    ///
    /// Deletion failures are reported as warnings and never escalated; a
    /// cleanup failure must not mask the pipeline's true outcome.
    pub fn teardown(&self, cleanup: bool) {
        if !cleanup {
            info!("Workspace preserved at: {:?}", self.work_dir);
            return;
        }

        match std::fs::remove_dir_all(&self.work_dir) {
            Ok(()) => debug!("Workspace cleaned: {:?}", self.work_dir),
            Err(e) => warn!("Could not clean workspace {:?}: {}", self.work_dir, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout_nested_under_work_dir() {
        let layout = WorkspaceLayout::new("work");
        assert!(layout.curated_dir.starts_with(&layout.work_dir));
        assert!(layout.styled_dir.starts_with(&layout.work_dir));
        assert!(layout.output_dir.starts_with(&layout.work_dir));
        assert_ne!(layout.curated_dir, layout.styled_dir);
        assert_ne!(layout.styled_dir, layout.output_dir);
    }

    #[test]
    fn test_setup_is_idempotent() {
        let dir = tempdir().unwrap();
        let layout = WorkspaceLayout::new(dir.path().join("work"));

        layout.setup().unwrap();
        layout.setup().unwrap();

        assert!(layout.curated_dir.is_dir());
        assert!(layout.styled_dir.is_dir());
        assert!(layout.output_dir.is_dir());
    }

    #[test]
    fn test_teardown_removes_everything() {
        let dir = tempdir().unwrap();
        let layout = WorkspaceLayout::new(dir.path().join("work"));
        layout.setup().unwrap();
        std::fs::write(layout.styled_dir.join("a.png"), b"x").unwrap();

        layout.teardown(true);
        assert!(!layout.work_dir.exists());
    }

    #[test]
    fn test_teardown_preserves_when_disabled() {
        let dir = tempdir().unwrap();
        let layout = WorkspaceLayout::new(dir.path().join("work"));
        layout.setup().unwrap();
        std::fs::write(layout.curated_dir.join("a.jpg"), b"x").unwrap();

        layout.teardown(false);
        assert!(layout.curated_dir.join("a.jpg").exists());
    }

    #[test]
    fn test_teardown_on_missing_dir_is_harmless() {
        let layout = WorkspaceLayout::new("/nonexistent/event-reel-test");
        layout.teardown(true);
    }
}
