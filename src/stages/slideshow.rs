use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use async_trait::async_trait;
use tokio::task;
use tracing::{debug, info};

use crate::error::StageError;
use crate::stages::{list_images, promote, Stage, StageName, StageResult};

/// Options for the slideshow render
#[derive(Debug, Clone)]
pub struct SlideshowOpts {
    pub fps: u32,
    pub seconds_per_image: f64,
    pub crossfade_seconds: f64,
    pub resolution: (u32, u32),
}

/// Renders styled photos into a fixed-duration-per-image video
///
/// Encoding is delegated to external ffmpeg. The output lands at the final
/// destination only after a successful encode; a failed encode leaves no
/// file claiming success.
pub struct SlideshowStage {
    opts: SlideshowOpts,
    audio: Option<PathBuf>,
    dest: PathBuf,
}

impl SlideshowStage {
    pub fn new(opts: SlideshowOpts, audio: Option<PathBuf>, dest: PathBuf) -> Self {
        Self { opts, audio, dest }
    }

    pub fn check_ffmpeg_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

/// Visual timeline length: each image holds for its full duration, and
/// every transition overlaps two images by the crossfade length
pub fn timeline_duration(image_count: usize, seconds_per_image: f64, crossfade: f64) -> f64 {
    if image_count == 0 {
        return 0.0;
    }
    seconds_per_image * image_count as f64 - crossfade * (image_count as f64 - 1.0)
}

/// Build the complete ffmpeg argument list for one slideshow encode
///
/// Every image becomes a looped still input, scaled and padded to the target
/// resolution. With a crossfade the stills are chained through xfade; without
/// one they are concatenated. Audio, when present, loops to fill the exact
/// visual timeline and is trimmed to it by the output `-t`.
pub fn build_ffmpeg_args(
    images: &[PathBuf],
    opts: &SlideshowOpts,
    audio: Option<&Path>,
    out_path: &Path,
) -> Vec<String> {
    let n = images.len();
    let (width, height) = opts.resolution;
    let total = timeline_duration(n, opts.seconds_per_image, opts.crossfade_seconds);

    let mut args: Vec<String> = vec!["-y".into()];

    for image in images {
        args.push("-loop".into());
        args.push("1".into());
        args.push("-t".into());
        args.push(format!("{:.3}", opts.seconds_per_image));
        args.push("-i".into());
        args.push(image.display().to_string());
    }

    if let Some(audio) = audio {
        args.push("-stream_loop".into());
        args.push("-1".into());
        args.push("-i".into());
        args.push(audio.display().to_string());
    }

    let mut filter = String::new();
    for i in 0..n {
        filter.push_str(&format!(
            "[{i}:v]scale={width}:{height}:force_original_aspect_ratio=decrease,\
             pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,setsar=1[v{i}];"
        ));
    }

    let out_label = if n == 1 {
        "v0".to_string()
    } else if opts.crossfade_seconds > 0.0 {
        let step = opts.seconds_per_image - opts.crossfade_seconds;
        let mut prev = "v0".to_string();
        for i in 1..n {
            let label = format!("x{i}");
            let offset = step * i as f64;
            filter.push_str(&format!(
                "[{prev}][v{i}]xfade=transition=fade:duration={:.3}:offset={:.3}[{label}];",
                opts.crossfade_seconds, offset
            ));
            prev = label;
        }
        prev
    } else {
        let inputs: String = (0..n).map(|i| format!("[v{i}]")).collect();
        filter.push_str(&format!("{inputs}concat=n={n}:v=1:a=0[vc];"));
        "vc".to_string()
    };

    // Trailing semicolon is not valid filter graph syntax
    filter.pop();

    args.push("-filter_complex".into());
    args.push(filter);
    args.push("-map".into());
    args.push(format!("[{out_label}]"));

    if audio.is_some() {
        args.push("-map".into());
        args.push(format!("{n}:a"));
        args.push("-c:a".into());
        args.push("aac".into());
    }

    args.push("-t".into());
    args.push(format!("{total:.3}"));
    args.push("-r".into());
    args.push(opts.fps.to_string());
    args.push("-c:v".into());
    args.push("libx264".into());
    args.push("-pix_fmt".into());
    args.push("yuv420p".into());
    args.push(out_path.display().to_string());

    args
}

#[async_trait]
impl Stage for SlideshowStage {
    fn name(&self) -> StageName {
        StageName::Slideshow
    }

    async fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<StageResult, StageError> {
        let images = list_images(input_dir).map_err(|e| StageError::external(self.name(), e))?;
        if images.is_empty() {
            return Err(StageError::Precondition {
                stage: self.name(),
                reason: format!("no styled images in {}", input_dir.display()),
            });
        }

        if !Self::check_ffmpeg_available() {
            return Err(StageError::external(
                self.name(),
                anyhow::anyhow!("ffmpeg not found; please install ffmpeg"),
            ));
        }

        let total = timeline_duration(
            images.len(),
            self.opts.seconds_per_image,
            self.opts.crossfade_seconds,
        );
        info!(
            "Rendering slideshow: {} images, {:.1}s total",
            images.len(),
            total
        );

        let temp = output_dir.join("slideshow.part.mp4");
        let args = build_ffmpeg_args(&images, &self.opts, self.audio.as_deref(), &temp);
        debug!("ffmpeg args: {:?}", args);

        let mut cmd = Command::new("ffmpeg");
        cmd.args(&args);

        let output = task::spawn_blocking(move || cmd.output())
            .await
            .map_err(|e| StageError::external(self.name(), anyhow::anyhow!("encode task: {e}")))?
            .map_err(|e| StageError::external(self.name(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StageError::external(
                self.name(),
                anyhow::anyhow!("ffmpeg failed: {}", stderr.trim()),
            ));
        }

        promote(&temp, &self.dest).map_err(|e| StageError::external(self.name(), e))?;

        info!("Slideshow generated: {:?}", self.dest);

        Ok(StageResult {
            items_in: images.len(),
            items_out: 1,
            artifacts: vec![self.dest.clone()],
        })
    }
}
