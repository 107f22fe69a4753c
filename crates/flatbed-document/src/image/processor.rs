// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decoding, working-resolution resizing, and saving. Operates
// on in-memory images using the `image` crate.

use std::borrow::Cow;
use std::path::Path;

use flatbed_core::error::FlatbedError;
use image::DynamicImage;
use image::imageops::FilterType;
use tracing::{debug, info, instrument};

/// A single decoded photo.
///
/// ```ignore
/// let photo = ImageProcessor::open("photo.jpg")?;
/// let working = working_copy(photo.as_dynamic(), Some(500));
/// println!("detecting at 1/{:.2} scale", working.scale);
/// ```
pub struct ImageProcessor {
    /// The decoded image at its original resolution.
    image: DynamicImage,
}

/// The copy of a photo used for detection.
///
/// `scale` maps working coordinates back to the original image: multiply a
/// working-image coordinate by `scale` to get the original coordinate. When
/// no resize is needed the original is borrowed, not copied.
#[derive(Debug, Clone)]
pub struct WorkingImage<'a> {
    pub image: Cow<'a, DynamicImage>,
    pub scale: f64,
}

impl ImageProcessor {
    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FlatbedError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            FlatbedError::Decode(format!("{}: {}", path.as_ref().display(), err))
        })?;
        info!(
            width = img.width(),
            height = img.height(),
            "Image loaded"
        );
        Ok(Self { image: img })
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }
}

/// Produce the copy used for detection, resized to `height` pixels tall with
/// the aspect ratio preserved. Small photos are enlarged to the same height.
/// `None` (or a photo already at that height) borrows the original with a
/// scale of 1.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn working_copy(image: &DynamicImage, height: Option<u32>) -> WorkingImage<'_> {
    let (w, h) = (image.width(), image.height());
    let target = match height {
        Some(target) if target > 0 && h > 0 && target != h => target,
        _ => {
            return WorkingImage {
                image: Cow::Borrowed(image),
                scale: 1.0,
            };
        }
    };

    let ratio = target as f64 / h as f64;
    let target_w = ((w as f64 * ratio) as u32).max(1);
    info!(
        from_w = w,
        from_h = h,
        to_w = target_w,
        to_h = target,
        "Resizing to working height"
    );
    let resized = image.resize_exact(target_w, target, FilterType::Triangle);
    let scale = h as f64 / target as f64;
    debug!(scale, "Working image ready");
    WorkingImage {
        image: Cow::Owned(resized),
        scale,
    }
}

/// Write any `DynamicImage` to `path`, mapping failures to `FlatbedError::Encode`.
/// The format is inferred from the file extension.
pub fn save_image(image: &DynamicImage, path: impl AsRef<Path>) -> Result<(), FlatbedError> {
    image.save(path.as_ref()).map_err(|err| {
        FlatbedError::Encode(format!(
            "failed to save image to {}: {}",
            path.as_ref().display(),
            err
        ))
    })
}

/// Gaussian sigma matching an odd kernel size, using the same rule OpenCV
/// applies when a blur is requested with sigma 0.
pub fn sigma_for_kernel(kernel: u32) -> f32 {
    let k = kernel.max(1) as f32;
    0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
}
