use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::StageError;
use crate::services::{media_type, GenerateRequest, ReferenceImage, VideoGenerator};
use crate::stages::{list_images, promote, Stage, StageName, StageResult};

/// Mode-specific options for AI video generation
#[derive(Debug, Clone)]
pub struct AiVideoOpts {
    pub prompt: String,
    pub model: String,
    pub duration_seconds: u32,
    pub fps: u32,
    pub max_reference_images: usize,
}

/// Generates the output video from a prompt plus styled reference images
pub struct AiVideoStage {
    generator: Box<dyn VideoGenerator>,
    opts: AiVideoOpts,
    dest: PathBuf,
}

impl AiVideoStage {
    pub fn new(generator: Box<dyn VideoGenerator>, opts: AiVideoOpts, dest: PathBuf) -> Self {
        Self { generator, opts, dest }
    }

    async fn load_references(&self, images: &[PathBuf]) -> Result<Vec<ReferenceImage>, StageError> {
        let selected = if images.len() > self.opts.max_reference_images {
            warn!(
                "Service supports up to {} reference images; using the first {} of {}",
                self.opts.max_reference_images,
                self.opts.max_reference_images,
                images.len()
            );
            &images[..self.opts.max_reference_images]
        } else {
            images
        };

        let mut references = Vec::with_capacity(selected.len());
        for image in selected {
            let bytes = tokio::fs::read(image)
                .await
                .map_err(|e| StageError::external(self.name(), e))?;
            references.push(ReferenceImage {
                bytes,
                mime: media_type(image),
            });
        }
        Ok(references)
    }
}

#[async_trait]
impl Stage for AiVideoStage {
    fn name(&self) -> StageName {
        StageName::AiVideo
    }

    async fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<StageResult, StageError> {
        let images = list_images(input_dir).map_err(|e| StageError::external(self.name(), e))?;
        if images.is_empty() {
            return Err(StageError::Precondition {
                stage: self.name(),
                reason: format!("no styled images available in {}", input_dir.display()),
            });
        }

        info!("Using {} styled photos as references", images.len().min(self.opts.max_reference_images));
        info!("Prompt: {}", self.opts.prompt);

        let reference_images = self.load_references(&images).await?;

        let request = GenerateRequest {
            prompt: self.opts.prompt.clone(),
            model: self.opts.model.clone(),
            duration_seconds: self.opts.duration_seconds,
            fps: self.opts.fps,
            reference_images,
        };

        let bytes = self
            .generator
            .generate(&request)
            .await
            .map_err(|e| StageError::external(self.name(), e))?;

        let temp = output_dir.join("generated.part.mp4");
        std::fs::write(&temp, &bytes).map_err(|e| StageError::external(self.name(), e))?;
        promote(&temp, &self.dest).map_err(|e| StageError::external(self.name(), e))?;

        info!("AI video generated: {:?}", self.dest);

        Ok(StageResult {
            items_in: images.len(),
            items_out: 1,
            artifacts: vec![self.dest.clone()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    /// Records the request it saw and returns fixed bytes
    struct FakeGenerator {
        seen: Arc<Mutex<Option<GenerateRequest>>>,
        fail: bool,
    }

    impl FakeGenerator {
        fn ok() -> (Self, Arc<Mutex<Option<GenerateRequest>>>) {
            let seen = Arc::new(Mutex::new(None));
            let generator = Self {
                seen: Arc::clone(&seen),
                fail: false,
            };
            (generator, seen)
        }

        fn failing() -> Self {
            Self {
                seen: Arc::new(Mutex::new(None)),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl VideoGenerator for FakeGenerator {
        async fn generate(&self, request: &GenerateRequest) -> Result<Vec<u8>, RenderError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            if self.fail {
                return Err(RenderError::Remote {
                    message: "quota exceeded".to_string(),
                });
            }
            Ok(b"video-bytes".to_vec())
        }
    }

    fn opts() -> AiVideoOpts {
        AiVideoOpts {
            prompt: "A heartwarming journey".to_string(),
            model: "veo-3.1-generate-preview".to_string(),
            duration_seconds: 8,
            fps: 24,
            max_reference_images: 3,
        }
    }

    fn populate(input: &Path, n: usize) {
        std::fs::create_dir_all(input).unwrap();
        for i in 0..n {
            std::fs::write(input.join(format!("img_{i}.png")), b"x").unwrap();
        }
    }

    #[tokio::test]
    async fn test_extra_references_are_dropped_not_rejected() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("styled");
        let scratch = dir.path().join("output");
        let dest = dir.path().join("final.mp4");
        populate(&input, 5);
        std::fs::create_dir_all(&scratch).unwrap();

        let (generator, seen) = FakeGenerator::ok();
        let stage = AiVideoStage::new(Box::new(generator), opts(), dest.clone());

        let result = stage.run(&input, &scratch).await.unwrap();
        assert_eq!(result.items_out, 1);
        assert!(dest.exists());

        let request = seen.lock().unwrap();
        assert_eq!(request.as_ref().unwrap().reference_images.len(), 3);
    }

    #[tokio::test]
    async fn test_remote_failure_becomes_stage_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("styled");
        let scratch = dir.path().join("output");
        populate(&input, 1);
        std::fs::create_dir_all(&scratch).unwrap();

        let stage = AiVideoStage::new(
            Box::new(FakeGenerator::failing()),
            opts(),
            dir.path().join("final.mp4"),
        );
        let err = stage.run(&input, &scratch).await.unwrap_err();
        assert!(matches!(err, StageError::External { .. }));
        assert_eq!(err.stage(), StageName::AiVideo);
    }

    #[tokio::test]
    async fn test_empty_styled_dir_is_a_precondition_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("styled");
        let scratch = dir.path().join("output");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::create_dir_all(&scratch).unwrap();

        let (generator, _) = FakeGenerator::ok();
        let stage = AiVideoStage::new(Box::new(generator), opts(), dir.path().join("final.mp4"));
        let err = stage.run(&input, &scratch).await.unwrap_err();
        assert!(matches!(err, StageError::Precondition { .. }));
    }
}
