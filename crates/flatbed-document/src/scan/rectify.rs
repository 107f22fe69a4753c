// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — sizes the flattened page from the ordered
// corners and warps the full-resolution photo through a projective transform.

use flatbed_core::config::RectifyConfig;
use flatbed_core::error::{FlatbedError, Result};
use flatbed_core::geometry::{OrderedQuad, distance};
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, info, instrument};

/// Size of the flattened page in whole pixels.
///
/// Width is the longer of the top and bottom edges, height the longer of the
/// left and right edges, so perspective foreshortening never undersizes the
/// output. Fractions are truncated.
pub fn target_size(quad: &OrderedQuad) -> (u32, u32) {
    let width_bottom = distance(quad.bottom_left, quad.bottom_right);
    let width_top = distance(quad.top_left, quad.top_right);
    let height_left = distance(quad.top_left, quad.bottom_left);
    let height_right = distance(quad.top_right, quad.bottom_right);

    let width = width_bottom.max(width_top);
    let height = height_left.max(height_right);
    (to_pixels(width), to_pixels(height))
}

fn to_pixels(length: f64) -> u32 {
    if length.is_finite() && length > 0.0 {
        length.min(u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Destination rectangle in top-left, top-right, bottom-right, bottom-left
/// order, matching [`OrderedQuad::corners`].
pub fn destination_corners(width: u32, height: u32) -> [(f32, f32); 4] {
    let right = width as f32 - 1.0;
    let bottom = height as f32 - 1.0;
    [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)]
}

/// Warp the document region of `image` into a top-down rectangle.
///
/// Fails with `DegenerateGeometry` when three corners are (nearly) collinear
/// or coincident (see [`OrderedQuad::is_degenerate`]), when the page would be
/// less than a pixel wide or tall, or when no projective transform maps the
/// corners onto the rectangle. Pixels that map outside the photo are filled
/// with white.
#[instrument(skip(image, config), fields(width = image.width(), height = image.height()))]
pub fn rectify(image: &RgbImage, quad: &OrderedQuad, config: &RectifyConfig) -> Result<RgbImage> {
    if quad.is_degenerate(config.min_corner_ratio) {
        return Err(FlatbedError::DegenerateGeometry(format!(
            "corners {}, {}, {}, {} do not span a quadrilateral",
            quad.top_left, quad.top_right, quad.bottom_right, quad.bottom_left
        )));
    }

    let (out_w, out_h) = target_size(quad);
    if out_w < 1 || out_h < 1 {
        return Err(FlatbedError::DegenerateGeometry(format!(
            "flattened page would be {out_w}x{out_h} pixels"
        )));
    }
    debug!(out_w, out_h, area = quad.area(), "Target size computed");

    let src = quad.corners().map(|p| p.to_f32_pair());
    let dest = destination_corners(out_w, out_h);

    // from_control_points computes the mapping from `src` to `dest`.
    let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
        FlatbedError::DegenerateGeometry("projective transform is singular".into())
    })?;

    let mut output = RgbImage::new(out_w, out_h);
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        Rgb([255u8, 255, 255]),
        &mut output,
    );

    info!(out_w, out_h, "Perspective correction applied");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatbed_core::geometry::Point2D;

    fn quad(tl: (f64, f64), tr: (f64, f64), br: (f64, f64), bl: (f64, f64)) -> OrderedQuad {
        OrderedQuad {
            top_left: tl.into(),
            top_right: tr.into(),
            bottom_right: br.into(),
            bottom_left: bl.into(),
        }
    }

    #[test]
    fn target_size_uses_longer_opposite_edges() {
        let q = quad((50.0, 50.0), (450.0, 60.0), (440.0, 440.0), (60.0, 430.0));
        let (w, h) = target_size(&q);
        assert_eq!(w, 400); // top edge: sqrt(400^2 + 10^2) = 400.12
        assert_eq!(h, 380); // both sides: sqrt(10^2 + 380^2) = 380.13
    }

    #[test]
    fn destination_matches_corner_roles() {
        assert_eq!(
            destination_corners(200, 100),
            [(0.0, 0.0), (199.0, 0.0), (199.0, 99.0), (0.0, 99.0)]
        );
    }

    #[test]
    fn front_on_rectangle_keeps_aspect_ratio() {
        // A 240x120 red rectangle on a white 400x300 background.
        let mut img = RgbImage::from_pixel(400, 300, Rgb([255, 255, 255]));
        for y in 90..210 {
            for x in 80..320 {
                img.put_pixel(x, y, Rgb([200, 0, 0]));
            }
        }
        let q = quad((80.0, 90.0), (320.0, 90.0), (320.0, 210.0), (80.0, 210.0));
        let flat = rectify(&img, &q, &RectifyConfig::default()).unwrap();

        assert_eq!(flat.dimensions(), (240, 120));
        let ratio = flat.width() as f64 / flat.height() as f64;
        assert!((ratio - 2.0).abs() < 0.02);
        // Interior of the warp comes from the red rectangle.
        let Rgb([r, g, b]) = *flat.get_pixel(120, 60);
        assert!(r > 190 && g < 10 && b < 10);
    }

    #[test]
    fn orientation_is_preserved() {
        // Mark the top-left quadrant so a mirrored or rotated warp is caught.
        let mut img = RgbImage::from_pixel(200, 200, Rgb([255, 255, 255]));
        for y in 20..60 {
            for x in 20..60 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let q = quad((20.0, 20.0), (180.0, 20.0), (180.0, 180.0), (20.0, 180.0));
        let flat = rectify(&img, &q, &RectifyConfig::default()).unwrap();
        assert!(flat.get_pixel(10, 10).0.iter().all(|&c| c < 10));
        assert!(flat.get_pixel(150, 150).0.iter().all(|&c| c > 245));
    }

    #[test]
    fn collinear_corners_are_degenerate() {
        let img = RgbImage::new(100, 100);
        let q = quad((0.0, 0.0), (50.0, 0.0), (100.0, 0.0), (10.0, 60.0));
        let err = rectify(&img, &q, &RectifyConfig::default()).unwrap_err();
        assert!(matches!(err, FlatbedError::DegenerateGeometry(_)));
    }

    #[test]
    fn nearly_collinear_corners_are_degenerate() {
        // Three corners a pixel off a straight line: really a triangle.
        let img = RgbImage::from_pixel(1000, 1000, Rgb([255, 255, 255]));
        let q = quad((0.0, 0.0), (500.0, 1.0), (999.0, 0.0), (0.0, 800.0));
        assert!(matches!(
            rectify(&img, &q, &RectifyConfig::default()),
            Err(FlatbedError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn coincident_corners_are_degenerate() {
        let img = RgbImage::new(100, 100);
        let p = Point2D::new(40.0, 40.0);
        let q = OrderedQuad {
            top_left: p,
            top_right: p,
            bottom_right: p,
            bottom_left: p,
        };
        assert!(matches!(
            rectify(&img, &q, &RectifyConfig::default()),
            Err(FlatbedError::DegenerateGeometry(_))
        ));
    }
}
