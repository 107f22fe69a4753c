// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry types for document detection: points, polygons, ranked contours,
// unordered and role-labelled quadrilaterals.

use serde::{Deserialize, Serialize};

use crate::error::{FlatbedError, Result};

/// A point in image coordinates (x to the right, y downwards).
///
/// Coordinates are real-valued so that sub-pixel precision survives scaling a
/// detection from the working image back to the original resolution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Return a new point with both components multiplied by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Convert to the `(f32, f32)` pair used by `imageproc` transforms.
    pub fn to_f32_pair(self) -> (f32, f32) {
        (self.x as f32, self.y as f32)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Euclidean distance between two points.
pub fn distance(p1: Point2D, p2: Point2D) -> f64 {
    (p1.x - p2.x).hypot(p1.y - p2.y)
}

/// Length of the segment `p1`–`p2`. Same as [`distance`]; reads better when
/// measuring the edges of a candidate rectangle.
pub fn segment_length(p1: Point2D, p2: Point2D) -> f64 {
    distance(p1, p2)
}

/// Absolute enclosed area of a closed polygon (shoelace formula).
///
/// Returns 0 for fewer than three vertices.
pub fn polygon_area(points: &[Point2D]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    twice_area.abs() / 2.0
}

/// Absolute area of the triangle `a`, `b`, `c`.
pub fn triangle_area(a: Point2D, b: Point2D, c: Point2D) -> f64 {
    ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs() / 2.0
}

/// Ordered sequence of points forming a closed boundary.
///
/// The order is whatever contour tracing produced; it carries no geometric
/// meaning until the points are explicitly ordered.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon(pub Vec<Point2D>);

impl Polygon {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[Point2D] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn area(&self) -> f64 {
        polygon_area(&self.0)
    }
}

/// A simplified contour together with its enclosed area.
///
/// The area is only used to rank candidates and is always non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub polygon: Polygon,
    pub area: f64,
}

impl Contour {
    pub fn new(polygon: Polygon) -> Self {
        let area = polygon.area();
        Self { polygon, area }
    }

    pub fn vertex_count(&self) -> usize {
        self.polygon.len()
    }
}

/// Exactly four corner points, in no particular order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub points: [Point2D; 4],
}

impl Quadrilateral {
    pub fn new(points: [Point2D; 4]) -> Self {
        Self { points }
    }

    /// Build a quadrilateral from a slice, failing unless it holds exactly
    /// four points.
    pub fn try_from_points(points: &[Point2D]) -> Result<Self> {
        let points: [Point2D; 4] =
            points
                .try_into()
                .map_err(|_| FlatbedError::PreconditionViolation {
                    expected: 4,
                    actual: points.len(),
                })?;
        Ok(Self { points })
    }

    /// Multiply every coordinate by the same `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            points: self.points.map(|p| p.scaled(factor)),
        }
    }
}

/// A quadrilateral whose corners carry fixed roles.
///
/// Downstream consumers read corners by name, so mixing up the order of the
/// source and destination rectangles is impossible by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderedQuad {
    pub top_left: Point2D,
    pub top_right: Point2D,
    pub bottom_right: Point2D,
    pub bottom_left: Point2D,
}

impl OrderedQuad {
    /// Corners in clockwise order starting at the top-left.
    pub fn corners(&self) -> [Point2D; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Enclosed area of the quadrilateral traversed in corner order.
    pub fn area(&self) -> f64 {
        polygon_area(&self.corners())
    }

    /// True when the corners cannot describe a proper quadrilateral: a
    /// non-finite coordinate, no enclosed area, or any three corners spanning
    /// less than `min_ratio` of the enclosed area.
    ///
    /// The test compares areas, so scaling every corner by the same factor
    /// never changes the verdict.
    pub fn is_degenerate(&self, min_ratio: f64) -> bool {
        let c = self.corners();
        if c.iter().any(|p| !p.is_finite()) {
            return true;
        }
        let area = self.area();
        if !(area > 0.0) {
            return true;
        }
        (0..4).any(|skip| {
            let [a, b, d] = [(skip + 1) % 4, (skip + 2) % 4, (skip + 3) % 4].map(|i| c[i]);
            triangle_area(a, b, d) < min_ratio * area
        })
    }
}

/// A quadrilateral detected on a downscaled working image, together with the
/// factor mapping working coordinates back to the original image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub quad: Quadrilateral,
    pub scale: f64,
}

impl Detection {
    pub fn new(quad: Quadrilateral, scale: f64) -> Self {
        Self { quad, scale }
    }

    /// Map the detection into original-image coordinates.
    ///
    /// Consumes the detection so the scale can only be applied once.
    pub fn to_original(self) -> Quadrilateral {
        self.quad.scaled(self.scale)
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    #[test]
    fn distance_is_euclidean() {
        assert!((distance(p(0.0, 0.0), p(3.0, 4.0)) - 5.0).abs() < 1e-12);
        assert_eq!(segment_length(p(2.0, 2.0), p(2.0, 2.0)), 0.0);
    }

    #[test]
    fn polygon_area_ignores_winding() {
        let cw = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 5.0), p(0.0, 5.0)];
        let mut ccw = cw;
        ccw.reverse();
        assert!((polygon_area(&cw) - 50.0).abs() < 1e-9);
        assert!((polygon_area(&ccw) - 50.0).abs() < 1e-9);
        assert_eq!(polygon_area(&cw[..2]), 0.0);
    }

    #[test]
    fn contour_area_is_computed_from_polygon() {
        let contour = Contour::new(Polygon::new(vec![p(0.0, 0.0), p(4.0, 0.0), p(0.0, 3.0)]));
        assert!((contour.area - 6.0).abs() < 1e-9);
        assert_eq!(contour.vertex_count(), 3);
    }

    #[test]
    fn quadrilateral_requires_four_points() {
        let err = Quadrilateral::try_from_points(&[p(0.0, 0.0), p(1.0, 1.0), p(2.0, 0.0)])
            .unwrap_err();
        assert!(matches!(
            err,
            FlatbedError::PreconditionViolation {
                expected: 4,
                actual: 3
            }
        ));

        let five = [p(0.0, 0.0); 5];
        assert!(Quadrilateral::try_from_points(&five).is_err());

        let quad =
            Quadrilateral::try_from_points(&[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)])
                .unwrap();
        assert_eq!(quad.points[2], p(1.0, 1.0));
    }

    #[test]
    fn detection_scales_every_coordinate_once() {
        let quad = Quadrilateral::new([p(10.0, 20.0), p(30.0, 20.0), p(30.0, 40.0), p(10.0, 40.0)]);
        let original = Detection::new(quad, 2.5).to_original();
        assert_eq!(
            original.points,
            [p(25.0, 50.0), p(75.0, 50.0), p(75.0, 100.0), p(25.0, 100.0)]
        );
    }

    fn ordered(tl: (f64, f64), tr: (f64, f64), br: (f64, f64), bl: (f64, f64)) -> OrderedQuad {
        OrderedQuad {
            top_left: tl.into(),
            top_right: tr.into(),
            bottom_right: br.into(),
            bottom_left: bl.into(),
        }
    }

    fn scale_quad(quad: OrderedQuad, factor: f64) -> OrderedQuad {
        ordered(
            (quad.top_left.x * factor, quad.top_left.y * factor),
            (quad.top_right.x * factor, quad.top_right.y * factor),
            (quad.bottom_right.x * factor, quad.bottom_right.y * factor),
            (quad.bottom_left.x * factor, quad.bottom_left.y * factor),
        )
    }

    #[test]
    fn collinear_corners_are_degenerate() {
        let quad = ordered((0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (0.0, 10.0));
        assert!(quad.is_degenerate(0.02));

        let square = ordered((0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0));
        assert!(!square.is_degenerate(0.02));
        assert!((square.area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn nearly_collinear_corners_are_degenerate_at_any_scale() {
        // A triangle whose top edge bends by a single pixel.
        let sliver = ordered((0.0, 0.0), (500.0, 1.0), (999.0, 0.0), (0.0, 800.0));
        for factor in [0.5, 1.0, 8.0, 40.0] {
            assert!(scale_quad(sliver, factor).is_degenerate(0.02), "factor {factor}");
        }
    }

    #[test]
    fn skewed_pages_are_not_degenerate_at_any_scale() {
        // Strong perspective: the far edge is a third of the near edge.
        let trapezoid = ordered((300.0, 100.0), (500.0, 100.0), (700.0, 500.0), (100.0, 500.0));
        for factor in [0.1, 1.0, 8.0] {
            assert!(!scale_quad(trapezoid, factor).is_degenerate(0.02), "factor {factor}");
        }
    }

    #[test]
    fn zero_area_outline_is_degenerate_even_without_ratio() {
        let p0 = p(5.0, 5.0);
        let dot = OrderedQuad {
            top_left: p0,
            top_right: p0,
            bottom_right: p0,
            bottom_left: p0,
        };
        assert!(dot.is_degenerate(0.0));
    }

    #[test]
    fn non_finite_corners_are_degenerate() {
        let quad = OrderedQuad {
            top_left: p(f64::NAN, 0.0),
            top_right: p(10.0, 0.0),
            bottom_right: p(10.0, 10.0),
            bottom_left: p(0.0, 10.0),
        };
        assert!(quad.is_degenerate(0.02));
    }
}
