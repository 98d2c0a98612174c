//! Media probing for stored files.

use std::path::Path;

use tracing::warn;

use assethub_core::error::{AppError, ErrorKind};
use assethub_core::result::AppResult;
use assethub_entity::Asset;

/// Size and, for images, pixel dimensions of a local file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaInfo {
    pub size: i64,
    pub dimensions: Option<(u32, u32)>,
}

impl MediaInfo {
    /// Copy the probed values onto an asset row.
    pub fn apply_to(&self, asset: &mut Asset) {
        asset.size = self.size;
        match self.dimensions {
            Some((width, height)) => {
                asset.width = i32::try_from(width).ok();
                asset.height = i32::try_from(height).ok();
            }
            None => {
                asset.width = None;
                asset.height = None;
            }
        }
    }
}

/// Probe a local file. Dimensions are read only when `is_image` is set;
/// an undecodable image is stored without them.
pub async fn probe(path: &Path, is_image: bool) -> AppResult<MediaInfo> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to read metadata: {}", path.display()),
            e,
        )
    })?;
    let size = i64::try_from(metadata.len()).unwrap_or(i64::MAX);

    if !is_image {
        return Ok(MediaInfo {
            size,
            dimensions: None,
        });
    }

    let owned = path.to_path_buf();
    let dimensions = tokio::task::spawn_blocking(move || image::image_dimensions(&owned))
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Image probe task panicked", e))?;

    let dimensions = match dimensions {
        Ok(dims) => Some(dims),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read image dimensions");
            None
        }
    };

    Ok(MediaInfo { size, dimensions })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_png_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        image::RgbImage::new(3, 2).save(&path).unwrap();

        let info = probe(&path, true).await.unwrap();
        assert_eq!(info.dimensions, Some((3, 2)));
        assert!(info.size > 0);
    }

    #[tokio::test]
    async fn test_undecodable_image_has_no_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        tokio::fs::write(&path, b"not an image").await.unwrap();

        let info = probe(&path, true).await.unwrap();
        assert_eq!(info, MediaInfo { size: 12, dimensions: None });
    }
}
