// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan finishing — adaptive mean binarization and light smoothing of the
// flattened page.

use flatbed_core::config::FinishConfig;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, info, instrument};

use crate::image::processor::sigma_for_kernel;

/// Turn a flattened page into a scan-like single-channel image.
///
/// 1. Convert to grayscale
/// 2. Adaptive mean threshold: a pixel becomes white when it is brighter than
///    the mean of its `block_size` neighbourhood minus `offset`, black otherwise
/// 3. Gaussian blur with a small kernel to soften thresholding artifacts
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn finish(image: &DynamicImage, config: &FinishConfig) -> GrayImage {
    info!(
        block_size = config.block_size,
        offset = config.offset,
        "Finishing flattened page"
    );
    let gray = image.to_luma8();
    let binary = adaptive_mean_threshold(&gray, config.block_size / 2, config.offset);

    let sigma = sigma_for_kernel(config.blur_kernel);
    debug!(kernel = config.blur_kernel, sigma, "Smoothing thresholded page");
    gaussian_blur_f32(&binary, sigma)
}

/// Binarize `gray` against the local mean of a `(2 * block_radius + 1)²`
/// window minus `offset`. Windows are clipped at the image border.
pub fn adaptive_mean_threshold(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let sums = SummedArea::new(gray);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let threshold = sums.window_mean(x, y, block_radius) - f64::from(offset);
        let value = f64::from(gray.get_pixel(x, y).0[0]);
        Luma([if value > threshold { 255 } else { 0 }])
    })
}

// -- Window means -------------------------------------------------------------

/// Summed-area table with a zero row and column in front, so entry
/// `(x, y)` holds the sum of every pixel strictly above and left of it.
struct SummedArea {
    width: u32,
    height: u32,
    stride: usize,
    sums: Vec<u64>,
}

impl SummedArea {
    fn new(gray: &GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let stride = width as usize + 1;
        let mut sums = vec![0u64; stride * (height as usize + 1)];
        for (y, row) in gray.rows().enumerate() {
            let mut running = 0u64;
            for (x, pixel) in row.enumerate() {
                running += u64::from(pixel.0[0]);
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + running;
            }
        }
        Self {
            width,
            height,
            stride,
            sums,
        }
    }

    fn at(&self, x: usize, y: usize) -> u64 {
        self.sums[y * self.stride + x]
    }

    /// Mean of the square window of `radius` around `(cx, cy)`, clipped to
    /// the image.
    fn window_mean(&self, cx: u32, cy: u32, radius: u32) -> f64 {
        let left = cx.saturating_sub(radius) as usize;
        let top = cy.saturating_sub(radius) as usize;
        let right = cx.saturating_add(radius).saturating_add(1).min(self.width) as usize;
        let bottom = cy.saturating_add(radius).saturating_add(1).min(self.height) as usize;

        let total = self.at(right, bottom) + self.at(left, top)
            - self.at(right, top)
            - self.at(left, bottom);
        total as f64 / ((right - left) * (bottom - top)) as f64
    }
}

// -- Tests --------------------------------------------------------------------
