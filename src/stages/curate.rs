use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::StageError;
use crate::services::ImageClassifier;
use crate::stages::{list_images, Stage, StageName, StageResult};

/// Filters raw photos down to the ones worth keeping
///
/// Every kept photo is copied unchanged into the curated directory; the
/// keep/drop decision itself belongs to the external classifier.
pub struct CurationStage {
    classifier: Box<dyn ImageClassifier>,
}

impl CurationStage {
    pub fn new(classifier: Box<dyn ImageClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Stage for CurationStage {
    fn name(&self) -> StageName {
        StageName::Curation
    }

    async fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<StageResult, StageError> {
        if !input_dir.is_dir() {
            return Err(StageError::Precondition {
                stage: self.name(),
                reason: format!("raw photos directory not found: {}", input_dir.display()),
            });
        }

        let images = list_images(input_dir).map_err(|e| StageError::external(self.name(), e))?;
        if images.is_empty() {
            return Err(StageError::Precondition {
                stage: self.name(),
                reason: format!("no images found in {}", input_dir.display()),
            });
        }

        info!("Found {} raw photos", images.len());

        let mut kept = Vec::new();
        for image in &images {
            debug!("Checking {:?}", image.file_name().unwrap_or_default());
            let keep = self
                .classifier
                .keep(image)
                .await
                .map_err(|e| StageError::external(self.name(), e))?;

            if keep {
                let dest = output_dir.join(image.file_name().unwrap_or_default());
                std::fs::copy(image, &dest)
                    .map_err(|e| StageError::external(self.name(), e))?;
                kept.push(dest);
            }
        }

        if kept.is_empty() {
            return Err(StageError::EmptyResult {
                stage: self.name(),
                reason: "no photos passed curation; try different or better quality photos"
                    .to_string(),
            });
        }

        info!("Curation complete: {}/{} photos kept", kept.len(), images.len());

        Ok(StageResult {
            items_in: images.len(),
            items_out: kept.len(),
            artifacts: kept,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use tempfile::tempdir;

    /// Keeps files whose name contains "keep", errors on "bad"
    struct NameClassifier;

    #[async_trait]
    impl ImageClassifier for NameClassifier {
        async fn keep(&self, image: &Path) -> Result<bool> {
            let name = image.file_name().unwrap().to_string_lossy();
            if name.contains("bad") {
                return Err(anyhow!("service unavailable"));
            }
            Ok(name.contains("keep"))
        }
    }

    fn stage() -> CurationStage {
        CurationStage::new(Box::new(NameClassifier))
    }

    #[tokio::test]
    async fn test_keeps_subset_of_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("raw");
        let output = dir.path().join("curated");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::create_dir_all(&output).unwrap();
        for name in ["keep_1.jpg", "drop_1.jpg", "keep_2.png", "drop_2.png"] {
            std::fs::write(input.join(name), b"x").unwrap();
        }

        let result = stage().run(&input, &output).await.unwrap();
        assert_eq!(result.items_in, 4);
        assert_eq!(result.items_out, 2);
        assert!(result.items_out <= result.items_in);
        assert!(output.join("keep_1.jpg").exists());
        assert!(!output.join("drop_1.jpg").exists());
    }

    #[tokio::test]
    async fn test_missing_input_dir_is_a_precondition_error() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("curated");
        std::fs::create_dir_all(&output).unwrap();

        let err = stage()
            .run(&dir.path().join("missing"), &output)
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Precondition { .. }));
        assert_eq!(err.stage(), StageName::Curation);
    }

    #[tokio::test]
    async fn test_empty_input_dir_is_a_precondition_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("raw");
        let output = dir.path().join("curated");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::create_dir_all(&output).unwrap();

        let err = stage().run(&input, &output).await.unwrap_err();
        assert!(matches!(err, StageError::Precondition { .. }));
    }

    #[tokio::test]
    async fn test_zero_survivors_is_fatal() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("raw");
        let output = dir.path().join("curated");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(input.join("drop_1.jpg"), b"x").unwrap();

        let err = stage().run(&input, &output).await.unwrap_err();
        assert!(matches!(err, StageError::EmptyResult { .. }));
    }

    #[tokio::test]
    async fn test_classifier_failure_propagates() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("raw");
        let output = dir.path().join("curated");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(input.join("bad.jpg"), b"x").unwrap();

        let err = stage().run(&input, &output).await.unwrap_err();
        assert!(matches!(err, StageError::External { .. }));
    }
}
