use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::StageError;
use crate::manifest::{Manifest, ManifestEntry};
use crate::services::ImageEditor;
use crate::stages::{list_images, Stage, StageName, StageResult};

/// One slot in the fixed style rotation
#[derive(Debug, Clone, Copy)]
pub struct StyleSlot {
    /// Tag recorded in the manifest
    pub tag: &'static str,

    /// Edit prompt; `None` passes the image through untouched
    pub prompt: Option<&'static str>,
}

/// The fixed rotation: every third image stays unstyled for variety
pub const ROTATION: &[StyleSlot] = &[
    StyleSlot {
        tag: "ghibli",
        prompt: Some("Ghibli-inspired anime style, soft watercolor, warm colors, cinematic lighting"),
    },
    StyleSlot {
        tag: "1980s",
        prompt: Some("1980s film photography, warm tones, subtle grain, vintage look"),
    },
    StyleSlot { tag: "none", prompt: None },
];

/// Style assigned to an image by its position in the stable sort order
///
/// The same input set always produces the same assignment.
pub fn slot_for(index: usize) -> &'static StyleSlot {
    &ROTATION[index % ROTATION.len()]
}

/// Per-item result; failures are data, not control flow
enum ItemOutcome {
    Done(ManifestEntry),
    Failed { input: String, reason: String },
}

/// Applies the style rotation to curated photos and writes the manifest
///
/// A single image's transform failure is isolated, logged, and excluded
/// from the manifest; the stage only fails when nothing at all survives.
pub struct StylingStage {
    editor: Box<dyn ImageEditor>,
}

impl StylingStage {
    pub fn new(editor: Box<dyn ImageEditor>) -> Self {
        Self { editor }
    }

    async fn style_one(&self, index: usize, image: &Path, output_dir: &Path) -> ItemOutcome {
        let input_name = image
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let slot = slot_for(index);
        debug!("{} -> {}", input_name, slot.tag);

        let Some(style_prompt) = slot.prompt else {
            // Pass-through slot: the original image is the output
            let dest = output_dir.join(&input_name);
            return match std::fs::copy(image, &dest) {
                Ok(_) => ItemOutcome::Done(ManifestEntry {
                    input: input_name.clone(),
                    output: input_name,
                    style: slot.tag.to_string(),
                }),
                Err(e) => ItemOutcome::Failed {
                    input: input_name,
                    reason: e.to_string(),
                },
            };
        };

        let prompt = format!(
            "Transform this photo into: {style_prompt}. Keep same subject and framing. No text."
        );

        let stem = image
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let output_name = format!("{stem}__styled.png");

        match self.editor.edit(image, &prompt).await {
            Ok(bytes) => match std::fs::write(output_dir.join(&output_name), bytes) {
                Ok(()) => ItemOutcome::Done(ManifestEntry {
                    input: input_name,
                    output: output_name,
                    style: slot.tag.to_string(),
                }),
                Err(e) => ItemOutcome::Failed {
                    input: input_name,
                    reason: e.to_string(),
                },
            },
            Err(e) => ItemOutcome::Failed {
                input: input_name,
                reason: e.to_string(),
            },
        }
    }
}

#[async_trait]
impl Stage for StylingStage {
    fn name(&self) -> StageName {
        StageName::Styling
    }

    async fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<StageResult, StageError> {
        let images = list_images(input_dir).map_err(|e| StageError::external(self.name(), e))?;
        if images.is_empty() {
            return Err(StageError::Precondition {
                stage: self.name(),
                reason: format!("no curated images in {}", input_dir.display()),
            });
        }

        let mut manifest = Manifest::new();
        let mut failures = 0usize;

        for (index, image) in images.iter().enumerate() {
            match self.style_one(index, image, output_dir).await {
                ItemOutcome::Done(entry) => manifest.push(entry),
                ItemOutcome::Failed { input, reason } => {
                    warn!("Skipping {input}: {reason}");
                    failures += 1;
                }
            }
        }

        if manifest.is_empty() {
            return Err(StageError::EmptyResult {
                stage: self.name(),
                reason: format!("all {} style transforms failed", images.len()),
            });
        }

        manifest
            .save(output_dir)
            .map_err(|e| StageError::external(self.name(), e))?;

        info!(
            "Styling complete: {} photos ready, {} skipped",
            manifest.len(),
            failures
        );
        info!("Style breakdown: {:?}", manifest.style_breakdown());

        let artifacts = manifest
            .entries()
            .iter()
            .map(|entry| output_dir.join(&entry.output))
            .collect();

        Ok(StageResult {
            items_in: images.len(),
            items_out: manifest.len(),
            artifacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use tempfile::tempdir;

    /// Returns fixed bytes, failing for inputs whose name contains "bad"
    struct FakeEditor;

    #[async_trait]
    impl ImageEditor for FakeEditor {
        async fn edit(&self, image: &Path, _prompt: &str) -> Result<Vec<u8>> {
            let name = image.file_name().unwrap().to_string_lossy();
            if name.contains("bad") {
                return Err(anyhow!("edit rejected"));
            }
            Ok(b"styled-bytes".to_vec())
        }
    }

    fn populate(input: &Path, names: &[&str]) {
        std::fs::create_dir_all(input).unwrap();
        for name in names {
            std::fs::write(input.join(name), b"x").unwrap();
        }
    }

    #[test]
    fn test_rotation_is_deterministic() {
        let first: Vec<_> = (0..8).map(|i| slot_for(i).tag).collect();
        let second: Vec<_> = (0..8).map(|i| slot_for(i).tag).collect();
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec!["ghibli", "1980s", "none", "ghibli", "1980s", "none", "ghibli", "1980s"]
        );
    }

    #[tokio::test]
    async fn test_manifest_matches_outputs() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("curated");
        let output = dir.path().join("styled");
        populate(&input, &["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);
        std::fs::create_dir_all(&output).unwrap();

        let stage = StylingStage::new(Box::new(FakeEditor));
        let result = stage.run(&input, &output).await.unwrap();
        assert_eq!(result.items_out, 4);

        let manifest = Manifest::load(&output).unwrap();
        assert_eq!(manifest.len(), result.items_out);
        for entry in manifest.entries() {
            assert!(output.join(&entry.output).exists(), "{} missing", entry.output);
        }

        // a -> ghibli (renamed), b -> 1980s (renamed), c -> none (copied)
        assert_eq!(manifest.entries()[0].output, "a__styled.png");
        assert_eq!(manifest.entries()[2].output, "c.jpg");
        assert_eq!(manifest.entries()[2].style, "none");
    }

    #[tokio::test]
    async fn test_single_failure_does_not_abort_batch() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("curated");
        let output = dir.path().join("styled");
        populate(&input, &["a_bad.jpg", "b.jpg", "c.jpg"]);
        std::fs::create_dir_all(&output).unwrap();

        let stage = StylingStage::new(Box::new(FakeEditor));
        let result = stage.run(&input, &output).await.unwrap();

        // a_bad fails its edit; b gets the 1980s slot; c is pass-through
        assert_eq!(result.items_in, 3);
        assert_eq!(result.items_out, 2);
        let manifest = Manifest::load(&output).unwrap();
        assert_eq!(manifest.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_manifest_is_fatal() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("curated");
        let output = dir.path().join("styled");
        // Both slots hit the failing editor (indices 0 and 1)
        populate(&input, &["a_bad.jpg", "b_bad.jpg"]);
        std::fs::create_dir_all(&output).unwrap();

        let stage = StylingStage::new(Box::new(FakeEditor));
        let err = stage.run(&input, &output).await.unwrap_err();
        assert!(matches!(err, StageError::EmptyResult { .. }));
    }

    #[tokio::test]
    async fn test_empty_input_is_a_precondition_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("curated");
        let output = dir.path().join("styled");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::create_dir_all(&output).unwrap();

        let stage = StylingStage::new(Box::new(FakeEditor));
        let err = stage.run(&input, &output).await.unwrap_err();
        assert!(matches!(err, StageError::Precondition { .. }));
    }
}
