use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name of the styling manifest inside the styled directory
///
/// The manifest is a stable external interface: downstream stages and
/// outside tools read this exact shape to inspect styling decisions.
pub const MANIFEST_FILE: &str = "instructions.json";

/// One styling decision: which input produced which output, and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub input: String,
    pub output: String,
    pub style: String,
}

/// The persisted record of all styling decisions for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of entries per style tag, for the run summary
    pub fn style_breakdown(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for entry in &self.entries {
            *counts.entry(entry.style.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Persist the manifest as a JSON array in the given directory
    pub fn save(&self, dir: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.entries).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(dir.join(MANIFEST_FILE), content)?;
        Ok(())
    }

    /// Load a manifest previously written by the styling stage
    pub fn load(dir: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(dir.join(MANIFEST_FILE))?;
        let entries: Vec<ManifestEntry> = serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(input: &str, output: &str, style: &str) -> ManifestEntry {
        ManifestEntry {
            input: input.to_string(),
            output: output.to_string(),
            style: style.to_string(),
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();

        let mut manifest = Manifest::new();
        manifest.push(entry("a.jpg", "a__styled.png", "ghibli"));
        manifest.push(entry("b.jpg", "b.jpg", "none"));

        manifest.save(dir.path()).unwrap();
        let loaded = Manifest::load(dir.path()).unwrap();
        assert_eq!(manifest, loaded);
    }

    #[test]
    fn test_saved_shape_is_a_plain_array() {
        let dir = tempdir().unwrap();

        let mut manifest = Manifest::new();
        manifest.push(entry("a.jpg", "a__styled.png", "1980s"));
        manifest.save(dir.path()).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let array = value.as_array().expect("top-level JSON array");
        assert_eq!(array[0]["input"], "a.jpg");
        assert_eq!(array[0]["output"], "a__styled.png");
        assert_eq!(array[0]["style"], "1980s");
    }

    #[test]
    fn test_style_breakdown() {
        let mut manifest = Manifest::new();
        manifest.push(entry("a.jpg", "a.png", "ghibli"));
        manifest.push(entry("b.jpg", "b.png", "ghibli"));
        manifest.push(entry("c.jpg", "c.jpg", "none"));

        let counts = manifest.style_breakdown();
        assert_eq!(counts.get("ghibli"), Some(&2));
        assert_eq!(counts.get("none"), Some(&1));
    }
}
