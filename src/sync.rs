use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tokio::task;
use tracing::info;

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};

/// Mirrors the source photo tree against a remote store via rclone
///
/// Both directions run off the critical path: the pipeline neither reads
/// nor writes the remote while stages are executing.
pub struct RemoteSync {
    rclone_bin: String,
    remote: String,
    local_root: PathBuf,
}

impl RemoteSync {
    /// Build a sync handle if the settings name a remote
    pub fn from_config(config: &SyncConfig, local_root: &Path) -> Option<Self> {
        if config.remote.is_empty() {
            return None;
        }
        Some(Self {
            rclone_bin: config.rclone_bin.clone(),
            remote: config.remote.clone(),
            local_root: local_root.to_path_buf(),
        })
    }

    fn check_available(&self) -> bool {
        Command::new(&self.rclone_bin)
            .arg("version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Remote to local, before the pipeline starts
    pub async fn pull(&self) -> Result<()> {
        info!("Syncing {} -> {:?}", self.remote, self.local_root);
        std::fs::create_dir_all(&self.local_root)?;
        self.run_sync(self.remote.clone(), self.local_root.display().to_string(), "pull")
            .await
    }

    /// Local to remote, after the pipeline finishes
    pub async fn push(&self) -> Result<()> {
        info!("Syncing {:?} -> {}", self.local_root, self.remote);
        self.run_sync(self.local_root.display().to_string(), self.remote.clone(), "push")
            .await
    }

    async fn run_sync(&self, from: String, to: String, direction: &str) -> Result<()> {
        if !self.check_available() {
            return Err(SyncError::BinaryMissing {
                bin: self.rclone_bin.clone(),
            }
            .into());
        }

        let mut cmd = Command::new(&self.rclone_bin);
        cmd.arg("sync").arg(from).arg(to);

        let output = task::spawn_blocking(move || cmd.output())
            .await
            .map_err(|e| SyncError::CommandFailed {
                direction: direction.to_string(),
                detail: e.to_string(),
            })?
            .map_err(|e| SyncError::CommandFailed {
                direction: direction.to_string(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SyncError::CommandFailed {
                direction: direction.to_string(),
                detail: stderr.trim().to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_remote_disables_sync() {
        let config = SyncConfig::default();
        assert!(RemoteSync::from_config(&config, Path::new("photos")).is_none());
    }

    #[test]
    fn test_configured_remote_enables_sync() {
        let config = SyncConfig {
            rclone_bin: "rclone".to_string(),
            remote: "grive:EventShots".to_string(),
        };
        let sync = RemoteSync::from_config(&config, Path::new("photos")).unwrap();
        assert_eq!(sync.remote, "grive:EventShots");
    }
}
