//! HTTP clients for the external AI collaborators
//!
//! Each client is explicitly constructed with its endpoint, model and API
//! key, and handed to the one stage adapter that needs it. Lifetimes are
//! scoped to a single pipeline run; there is no process-wide client.

pub mod image_edit;
pub mod video_gen;
pub mod vision;

pub use image_edit::{EditClient, ImageEditor};
pub use video_gen::{GenerateRequest, ReferenceImage, VideoGenClient, VideoGenerator};
pub use vision::{ImageClassifier, VisionClient};

use std::path::Path;

/// MIME type for a supported image file, keyed off its extension
pub(crate) fn media_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(media_type(&PathBuf::from("a.PNG")), "image/png");
        assert_eq!(media_type(&PathBuf::from("a.webp")), "image/webp");
        assert_eq!(media_type(&PathBuf::from("a.jpg")), "image/jpeg");
        assert_eq!(media_type(&PathBuf::from("a.jpeg")), "image/jpeg");
    }
}
