//! The resize directive.
//!
//! A prompt such as `resize to 100x200` sent together with images is not
//! forwarded to the model.  Each image is resized on the blocking pool and the
//! batch succeeds or fails as a whole.

use std::io::Cursor;
use std::sync::LazyLock;
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::future::try_join_all;
use image::imageops::FilterType;
use image::{ImageFormat, ImageReader, Limits};
use regex::Regex;

use crate::error::{Error, Result};
use crate::observability::{RESIZE_BATCHES, RESIZE_DURATION, RESIZE_IMAGES};
use crate::types::attachment::strip_data_uri;

/// Largest accepted target, in pixels (width × height).
pub const MAX_TARGET_PIXELS: u64 = 40_000_000;

/// Largest accepted source dimension, in pixels.
const MAX_SOURCE_DIMENSION: u32 = 16_384;

/// Largest allocation the decoder may make for one source image.
const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

static RESIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)resize\s+to\s+(\d+)\s*[x×]\s*(\d+)").expect("resize pattern is valid")
});

/// Target dimensions parsed from a prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizeDirective {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
}

impl ResizeDirective {
    /// Find a resize directive anywhere in `prompt`.
    ///
    /// Zero or out-of-range dimensions do not count as a directive.
    pub fn parse(prompt: &str) -> Option<Self> {
        let captures = RESIZE_PATTERN.captures(prompt)?;
        let width = captures.get(1)?.as_str().parse::<u32>().ok()?;
        let height = captures.get(2)?.as_str().parse::<u32>().ok()?;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }

    /// The confirmation shown after a successful resize.
    pub fn confirmation(&self) -> String {
        format!("✅ Image(s) resized to {}×{}.", self.width, self.height)
    }

    /// Number of pixels in the target.
    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    fn check_budget(&self) -> Result<()> {
        if self.pixels() > MAX_TARGET_PIXELS {
            return Err(Error::image(
                format!(
                    "target {}×{} exceeds the {MAX_TARGET_PIXELS} pixel limit",
                    self.width, self.height
                ),
                None,
            ));
        }
        Ok(())
    }

    /// Resize every image in `images` (bare base64 or `data:` URIs), returning
    /// base64 JPEGs in the same order.
    pub async fn apply(&self, images: &[String]) -> Result<Vec<String>> {
        self.check_budget()?;
        RESIZE_BATCHES.click();
        let start = Instant::now();
        let directive = *self;
        let tasks = images.iter().cloned().map(|encoded| async move {
            tokio::task::spawn_blocking(move || directive.resize_one(&encoded))
                .await
                .map_err(|e| Error::image(format!("resize task failed: {e}"), Some(Box::new(e))))?
        });
        let resized = try_join_all(tasks).await;
        RESIZE_DURATION.add(start.elapsed().as_secs_f64());
        let resized = resized?;
        RESIZE_IMAGES.count(resized.len() as u64);
        Ok(resized)
    }

    /// Decode, cover-fit to the target size, and re-encode one image as JPEG.
    pub fn resize_one(&self, encoded: &str) -> Result<String> {
        self.check_budget()?;
        let bytes = BASE64.decode(strip_data_uri(encoded))?;
        let mut limits = Limits::default();
        limits.max_image_width = Some(MAX_SOURCE_DIMENSION);
        limits.max_image_height = Some(MAX_SOURCE_DIMENSION);
        limits.max_alloc = Some(MAX_DECODE_ALLOC);
        let mut reader = ImageReader::new(Cursor::new(&bytes)).with_guessed_format()?;
        reader.limits(limits);
        let img = reader.decode()?;
        let resized = img.resize_to_fill(self.width, self.height, FilterType::Lanczos3);
        let mut out = Vec::new();
        resized
            .to_rgb8()
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)?;
        Ok(BASE64.encode(&out))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A small PNG encoded as base64, for tests across the crate.
    pub(crate) fn png_base64(width: u32, height: u32) -> String {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 30, 255]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        BASE64.encode(&out)
    }

    fn dimensions(encoded: &str) -> (u32, u32) {
        let bytes = BASE64.decode(encoded).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let img = image::load_from_memory(&bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn parse_directive() {
        assert_eq!(
            ResizeDirective::parse("resize to 100x200"),
            Some(ResizeDirective {
                width: 100,
                height: 200
            })
        );
        assert_eq!(
            ResizeDirective::parse("Please RESIZE TO 640 × 480 thanks"),
            Some(ResizeDirective {
                width: 640,
                height: 480
            })
        );
        assert_eq!(
            ResizeDirective::parse("resize  to 3X4"),
            Some(ResizeDirective {
                width: 3,
                height: 4
            })
        );
    }

    #[test]
    fn not_a_directive() {
        assert_eq!(ResizeDirective::parse("resize this image"), None);
        assert_eq!(ResizeDirective::parse("resize to 0x10"), None);
        assert_eq!(ResizeDirective::parse("resize to 99999999999x10"), None);
        assert_eq!(ResizeDirective::parse("what is 100x200?"), None);
    }

    #[test]
    fn oversized_target_is_rejected() {
        let directive = ResizeDirective::parse("resize to 60000x60000").unwrap();
        assert_eq!(directive.pixels(), 3_600_000_000);
        let err = directive.resize_one(&png_base64(2, 2)).unwrap_err();
        assert!(err.to_string().contains("pixel limit"));
    }

    #[tokio::test]
    async fn oversized_batch_fails_before_work() {
        let directive = ResizeDirective::parse("resize to 60000x60000").unwrap();
        assert!(directive.apply(&[png_base64(2, 2)]).await.is_err());
    }

    #[test]
    fn target_at_budget_is_accepted() {
        let directive = ResizeDirective {
            width: 8_000,
            height: 5_000,
        };
        assert_eq!(directive.pixels(), MAX_TARGET_PIXELS);
        assert!(directive.check_budget().is_ok());
    }

    #[test]
    fn data_uri_input() {
        let directive = ResizeDirective::parse("resize to 3x2").unwrap();
        let uri = format!("data:image/png;base64,{}", png_base64(6, 6));
        assert_eq!(dimensions(&directive.resize_one(&uri).unwrap()), (3, 2));
    }

    #[test]
    fn confirmation_text() {
        let directive = ResizeDirective::parse("resize to 100x200").unwrap();
        assert_eq!(directive.confirmation(), "✅ Image(s) resized to 100×200.");
    }

    #[tokio::test]
    async fn apply_resizes_every_image() {
        let directive = ResizeDirective {
            width: 10,
            height: 20,
        };
        let images = vec![png_base64(40, 40), png_base64(7, 3)];
        let resized = directive.apply(&images).await.unwrap();
        assert_eq!(resized.len(), 2);
        for image in &resized {
            assert_eq!(dimensions(image), (10, 20));
        }
    }

    #[tokio::test]
    async fn one_bad_image_fails_batch() {
        let directive = ResizeDirective {
            width: 10,
            height: 10,
        };
        let images = vec![png_base64(4, 4), BASE64.encode(b"not an image")];
        let err = directive.apply(&images).await.unwrap_err();
        assert!(matches!(err, Error::Image { .. }));
    }

    #[test]
    fn bad_base64() {
        let directive = ResizeDirective {
            width: 1,
            height: 1,
        };
        let err = directive.resize_one("!!!").unwrap_err();
        assert!(matches!(err, Error::Encoding { .. }));
    }
}
