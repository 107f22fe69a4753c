// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner ordering — assigns top-left / top-right / bottom-right / bottom-left
// roles to four unordered corner points.

use std::cmp::Ordering;

use flatbed_core::error::Result;
use flatbed_core::geometry::{OrderedQuad, Point2D, Quadrilateral, distance};

/// Label the corners of a quadrilateral.
///
/// 1. Sort by x: the first two points are the left pair, the last two the
///    right pair.
/// 2. The left point with the smaller y is the top-left, the other the
///    bottom-left.
/// 3. Of the right pair, the point nearer the top-left is the top-right and
///    the farther one the bottom-right.
///
/// Distance to the top-left, rather than a y-sort of the right pair, keeps the
/// labelling stable when the page is tilted. The result is always a
/// permutation of the input; degenerate input is not rejected here.
pub fn order_corners(quad: &Quadrilateral) -> OrderedQuad {
    let mut pts = quad.points;
    pts.sort_by(compare_x_then_y);

    let (top_left, bottom_left) = if compare_y_then_x(&pts[0], &pts[1]) != Ordering::Greater {
        (pts[0], pts[1])
    } else {
        (pts[1], pts[0])
    };

    let (top_right, bottom_right) = match distance(top_left, pts[2])
        .total_cmp(&distance(top_left, pts[3]))
        .then_with(|| compare_y_then_x(&pts[2], &pts[3]))
    {
        Ordering::Greater => (pts[3], pts[2]),
        _ => (pts[2], pts[3]),
    };

    OrderedQuad {
        top_left,
        top_right,
        bottom_right,
        bottom_left,
    }
}

/// Slice entry point: fails with `PreconditionViolation` unless given exactly
/// four points.
pub fn order_points(points: &[Point2D]) -> Result<OrderedQuad> {
    Ok(order_corners(&Quadrilateral::try_from_points(points)?))
}

// Ties are broken on the other axis so every permutation of the same four
// points sorts identically.
fn compare_x_then_y(a: &Point2D, b: &Point2D) -> Ordering {
    a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y))
}

fn compare_y_then_x(a: &Point2D, b: &Point2D) -> Ordering {
    a.y.total_cmp(&b.y).then_with(|| a.x.total_cmp(&b.x))
}
