// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline — runs preprocessing, detection, ordering, rectification, and
// finishing on one photo, optionally capturing intermediate images.

use flatbed_core::config::ScanConfig;
use flatbed_core::error::Result;
use flatbed_core::geometry::{Contour, Detection, OrderedQuad};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use tracing::{debug, info, instrument};

use crate::image::processor::working_copy;
use crate::scan::detect::{QuadSearch, search_quad};
use crate::scan::finish::finish;
use crate::scan::order::order_corners;
use crate::scan::preprocess::preprocess;
use crate::scan::rectify::rectify;

const CANDIDATE_COLOUR: Rgb<u8> = Rgb([0, 255, 255]);
const SELECTED_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
const OUTLINE_WIDTH: u32 = 2;

/// Intermediate images captured when debugging is enabled.
#[derive(Debug, Clone)]
pub struct DebugArtifacts {
    /// Binary edge map of the working image.
    pub edged: GrayImage,
    /// Working image with scanned candidates in cyan and the chosen outline in
    /// green.
    pub outline: RgbImage,
    /// Flattened colour page before thresholding.
    pub flat: RgbImage,
}

/// Result of scanning one photo.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Binarized, scan-like page.
    pub scan: GrayImage,
    /// Document corners in original-image coordinates.
    pub corners: OrderedQuad,
    pub artifacts: Option<DebugArtifacts>,
}

/// Rectifies photographed documents.
///
/// Holds only configuration, so a single scanner can be shared by reference
/// across threads.
#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    /// Create a scanner after validating `config`.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run the full pipeline on a decoded photo.
    ///
    /// ## Pipeline
    ///
    /// 1. Resize to the working height, remembering the scale
    /// 2. Build the edge map
    /// 3. Pick the largest four-vertex contour
    /// 4. Scale the corners back to the original resolution (exactly once)
    /// 5. Label the corners
    /// 6. Warp the original photo to a flat page
    /// 7. Binarize and smooth
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn scan(&self, image: &DynamicImage) -> Result<ScanOutcome> {
        info!("Starting document scan");
        let working = working_copy(image, self.config.working_height);

        let edged = preprocess(&working.image, &self.config.preprocess);
        let search = search_quad(&edged, &self.config.detect);

        let outline = self
            .config
            .debug
            .then(|| draw_outline(working.image.to_rgb8(), &search));

        let detection = Detection::new(search.quadrilateral()?, working.scale);
        let corners = order_corners(&detection.to_original());
        debug!(
            top_left = %corners.top_left,
            top_right = %corners.top_right,
            bottom_right = %corners.bottom_right,
            bottom_left = %corners.bottom_left,
            "Document corners ordered"
        );

        let flat = rectify(&image.to_rgb8(), &corners, &self.config.rectify)?;
        let scan = finish(&DynamicImage::ImageRgb8(flat.clone()), &self.config.finish);

        info!(
            out_w = scan.width(),
            out_h = scan.height(),
            "Document scan complete"
        );

        let artifacts = outline.map(|outline| DebugArtifacts {
            edged,
            outline,
            flat,
        });
        Ok(ScanOutcome {
            scan,
            corners,
            artifacts,
        })
    }
}

/// Draw every candidate scanned before the selection (and the selection
/// itself) onto the working image.
fn draw_outline(mut canvas: RgbImage, search: &QuadSearch) -> RgbImage {
    let scanned = search
        .selected
        .map_or(search.ranked.len(), |index| index + 1);
    for contour in &search.ranked[..scanned] {
        draw_closed(&mut canvas, contour, CANDIDATE_COLOUR);
    }
    if let Some(index) = search.selected {
        draw_closed(&mut canvas, &search.ranked[index], SELECTED_COLOUR);
    }
    canvas
}

/// Outline a contour with a line `OUTLINE_WIDTH` pixels thick.
fn draw_closed(canvas: &mut RgbImage, contour: &Contour, colour: Rgb<u8>) {
    let points = contour.polygon.points();
    for (i, &start) in points.iter().enumerate() {
        let (x0, y0) = start.to_f32_pair();
        let (x1, y1) = points[(i + 1) % points.len()].to_f32_pair();
        for offset in 0..OUTLINE_WIDTH {
            let d = offset as f32;
            draw_line_segment_mut(canvas, (x0 + d, y0), (x1 + d, y1), colour);
            draw_line_segment_mut(canvas, (x0, y0 + d), (x1, y1 + d), colour);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatbed_core::error::FlatbedError;
    use flatbed_core::geometry::Point2D;
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;

    /// White 500x500 photo with a black-bordered page whose corners are
    /// (50,50), (450,60), (440,440), (60,430).
    fn reference_photo() -> DynamicImage {
        let mut img = RgbImage::from_pixel(500, 500, Rgb([255, 255, 255]));
        let outer = [
            Point::new(50, 50),
            Point::new(450, 60),
            Point::new(440, 440),
            Point::new(60, 430),
        ];
        let inner = [
            Point::new(62, 62),
            Point::new(438, 71),
            Point::new(429, 428),
            Point::new(71, 419),
        ];
        draw_polygon_mut(&mut img, &outer, Rgb([0, 0, 0]));
        draw_polygon_mut(&mut img, &inner, Rgb([250, 250, 250]));
        DynamicImage::ImageRgb8(img)
    }

    fn near(p: Point2D, x: f64, y: f64) -> bool {
        (p.x - x).abs() <= 4.0 && (p.y - y).abs() <= 4.0
    }

    #[test]
    fn reference_scenario() {
        let scanner = Scanner::new(ScanConfig::default()).unwrap();
        let outcome = scanner.scan(&reference_photo()).unwrap();

        let c = outcome.corners;
        assert!(near(c.top_left, 50.0, 50.0), "top_left {}", c.top_left);
        assert!(near(c.top_right, 450.0, 60.0), "top_right {}", c.top_right);
        assert!(near(c.bottom_right, 440.0, 440.0), "bottom_right {}", c.bottom_right);
        assert!(near(c.bottom_left, 60.0, 430.0), "bottom_left {}", c.bottom_left);

        // Ideal corners give 400x380. Canny places the outer edge up to a
        // pixel inside the border and the simplified outline keeps traced
        // pixels, so each side may come out a couple of pixels short.
        let (w, h) = outcome.scan.dimensions();
        assert!((392..=404).contains(&w), "width {w}");
        assert!((375..=390).contains(&h), "height {h}");
        assert!(outcome.artifacts.is_none());
    }

    #[test]
    fn corners_are_scaled_back_to_original_resolution() {
        // Same page at twice the size; detection runs at 500 px tall.
        let small = reference_photo();
        let big = small.resize_exact(1000, 1000, image::imageops::FilterType::Nearest);

        let scanner = Scanner::new(ScanConfig::default()).unwrap();
        let outcome = scanner.scan(&big).unwrap();
        let c = outcome.corners;
        assert!((c.top_left.x - 100.0).abs() <= 8.0 && (c.top_left.y - 100.0).abs() <= 8.0);
        assert!((c.bottom_right.x - 880.0).abs() <= 8.0 && (c.bottom_right.y - 880.0).abs() <= 8.0);

        let (w, h) = outcome.scan.dimensions();
        assert!((776..=820).contains(&w), "width {w}");
        assert!((744..=790).contains(&h), "height {h}");
    }

    #[test]
    fn debug_mode_captures_artifacts() {
        let config = ScanConfig {
            debug: true,
            ..ScanConfig::default()
        };
        let outcome = Scanner::new(config).unwrap().scan(&reference_photo()).unwrap();
        let artifacts = outcome.artifacts.expect("debug artifacts");
        assert_eq!(artifacts.edged.dimensions(), (500, 500));
        assert_eq!(artifacts.outline.dimensions(), (500, 500));
        assert_eq!(artifacts.flat.dimensions(), outcome.scan.dimensions());
        assert!(artifacts.outline.pixels().any(|p| *p == SELECTED_COLOUR));
    }

    #[test]
    fn selected_outline_is_drawn_two_pixels_wide() {
        let config = ScanConfig {
            debug: true,
            ..ScanConfig::default()
        };
        let outcome = Scanner::new(config).unwrap().scan(&reference_photo()).unwrap();
        let outline = outcome.artifacts.expect("debug artifacts").outline;

        // A one-pixel outline of this page covers about 1550 pixels.
        let green = outline.pixels().filter(|p| **p == SELECTED_COLOUR).count();
        assert!(green > 2500, "only {green} outline pixels");
    }

    #[test]
    fn blank_photo_reports_no_quadrilateral() {
        let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(400, 300, Rgb([255, 255, 255])));
        let err = Scanner::new(ScanConfig::default())
            .unwrap()
            .scan(&blank)
            .unwrap_err();
        assert!(matches!(err, FlatbedError::NoQuadrilateralFound { .. }));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = ScanConfig::default();
        config.finish.block_size = 8;
        assert!(matches!(
            Scanner::new(config),
            Err(FlatbedError::InvalidConfig(_))
        ));
    }
}
