// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quadrilateral detection — contour tracing, closed-curve simplification, and
// area-ranked selection of the document outline.

use flatbed_core::config::DetectConfig;
use flatbed_core::error::{FlatbedError, Result};
use flatbed_core::geometry::{Contour, Point2D, Polygon, Quadrilateral};
use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use tracing::{debug, instrument, warn};

/// Outcome of scanning an edge map for the document outline.
#[derive(Debug, Clone)]
pub struct QuadSearch {
    /// Every simplified contour, largest area first.
    pub ranked: Vec<Contour>,
    /// Index into `ranked` of the first four-vertex candidate.
    pub selected: Option<usize>,
}

impl QuadSearch {
    /// The selected candidate as a quadrilateral, or `NoQuadrilateralFound`.
    pub fn quadrilateral(&self) -> Result<Quadrilateral> {
        match self.selected {
            Some(index) => Quadrilateral::try_from_points(self.ranked[index].polygon.points()),
            None => Err(FlatbedError::NoQuadrilateralFound {
                candidates: self.ranked.len(),
            }),
        }
    }
}

/// Find the document outline in a binary edge map.
///
/// The document is assumed to be the largest closed region in the frame, so
/// the largest simplified contour with exactly four vertices wins. Candidates
/// with more vertices are skipped rather than forced down to four.
pub fn detect_quad(edges: &GrayImage, config: &DetectConfig) -> Result<Quadrilateral> {
    search_quad(edges, config).quadrilateral()
}

/// Rank all simplified contours and record which one `detect_quad` would pick.
#[instrument(skip_all, fields(width = edges.width(), height = edges.height()))]
pub fn search_quad(edges: &GrayImage, config: &DetectConfig) -> QuadSearch {
    let ranked = rank_by_area(simplify_contours(edges, config));
    let selected = select_first(&ranked, is_quadrilateral).map(|(index, _)| index);

    match selected {
        Some(index) => debug!(
            index,
            candidates = ranked.len(),
            area = ranked[index].area,
            "Document quadrilateral selected"
        ),
        None => warn!(
            candidates = ranked.len(),
            "No four-vertex contour among candidates"
        ),
    }

    QuadSearch { ranked, selected }
}

/// Trace every contour in the edge map and simplify each one with a
/// tolerance of `epsilon_ratio` times its perimeter.
///
/// The containment hierarchy reported by the tracer is ignored.
pub fn simplify_contours(edges: &GrayImage, config: &DetectConfig) -> Vec<Contour> {
    let traced = find_contours::<i32>(edges);
    debug!(count = traced.len(), "Contours traced");

    traced
        .into_iter()
        .filter(|c| !c.points.is_empty())
        .map(|c| {
            let perimeter = arc_length(&c.points, true);
            let simplified = simplify_closed(&c.points, config.epsilon_ratio * perimeter);
            let points = simplified
                .into_iter()
                .map(|p| Point2D::new(p.x as f64, p.y as f64))
                .collect();
            Contour::new(Polygon::new(points))
        })
        .collect()
}

/// Stable sort by enclosed area, largest first. Equal areas keep their
/// enumeration order.
pub fn rank_by_area(mut contours: Vec<Contour>) -> Vec<Contour> {
    contours.sort_by(|a, b| b.area.total_cmp(&a.area));
    contours
}

/// Linear scan for the first candidate satisfying `predicate`.
pub fn select_first<P>(ranked: &[Contour], predicate: P) -> Option<(usize, &Contour)>
where
    P: Fn(&Contour) -> bool,
{
    ranked.iter().enumerate().find(|(_, c)| predicate(c))
}

/// Selection predicate: exactly four vertices.
pub fn is_quadrilateral(contour: &Contour) -> bool {
    contour.vertex_count() == 4
}

// -- Closed-curve simplification ----------------------------------------------

/// Douglas–Peucker simplification of a closed curve.
///
/// The curve is cut at two mutually distant vertices, each half is simplified
/// as an open chain, and the two cut vertices are then dropped again if they
/// lie within `epsilon` of the line through their neighbours.
fn simplify_closed(curve: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if curve.len() < 3 || epsilon <= 0.0 {
        return curve.to_vec();
    }

    let first = farthest_from(curve, curve[0]);
    let second = farthest_from(curve, curve[first]);
    if curve[first] == curve[second] {
        return vec![curve[first]];
    }
    let (lo, hi) = (first.min(second), first.max(second));

    let forward = &curve[lo..=hi];
    let backward: Vec<Point<i32>> = curve[hi..].iter().chain(&curve[..=lo]).copied().collect();

    // forward runs lo → hi, backward runs hi → lo; skip the shared endpoints.
    let mut polygon = approximate_polygon_dp(forward, epsilon, false);
    let back = approximate_polygon_dp(&backward, epsilon, false);
    let seam = polygon.len() - 1;
    polygon.extend_from_slice(&back[1..back.len() - 1]);

    // Remove the later seam first so the earlier index stays valid.
    drop_if_collinear(&mut polygon, seam, epsilon);
    drop_if_collinear(&mut polygon, 0, epsilon);
    polygon
}

fn farthest_from(curve: &[Point<i32>], origin: Point<i32>) -> usize {
    let mut best = 0;
    let mut best_dist = -1i64;
    for (i, p) in curve.iter().enumerate() {
        let dx = (p.x - origin.x) as i64;
        let dy = (p.y - origin.y) as i64;
        let d = dx * dx + dy * dy;
        if d > best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

/// Remove vertex `index` of a closed polygon when it sits within `epsilon` of
/// the segment joining its neighbours.
fn drop_if_collinear(polygon: &mut Vec<Point<i32>>, index: usize, epsilon: f64) {
    let n = polygon.len();
    if n <= 3 || index >= n {
        return;
    }
    let prev = polygon[(index + n - 1) % n];
    let next = polygon[(index + 1) % n];
    if perpendicular_distance(polygon[index], prev, next) <= epsilon {
        polygon.remove(index);
    }
}

fn perpendicular_distance(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let (px, py) = (p.x as f64, p.y as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let len = (bx - ax).hypot(by - ay);
    if len == 0.0 {
        return (px - ax).hypot(py - ay);
    }
    ((bx - ax) * (ay - py) - (ax - px) * (by - ay)).abs() / len
}

// -- Tests --------------------------------------------------------------------
