//! Sutherland-Hodgman clipping of triangle outlines against axis-aligned planes.
//!
//! Polygons are closed: the first vertex is repeated at the end, so a
//! triangle has four entries.

use kdray_math::{Axis, Bound, Vector};
use thiserror::Error;

/// Closed outlines never legitimately exceed this many entries.
pub const MAX_POLYGON: usize = 10;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipError {
    #[error("clipped polygon is too complex")]
    TooComplex,

    #[error("clipped polygon degenerated")]
    Degenerate,
}

/// Bound of every vertex in `poly`.
pub fn poly_bound(poly: &[Vector]) -> Bound {
    let first = poly.first().copied().unwrap_or_default();
    poly.iter().fold(Bound::new(first, first), |b, &p| b.include(p))
}

/// Point on segment `p1..p2` where `axis == pos`.
fn plane_point(axis: Axis, pos: f64, p1: Vector, p2: Vector) -> Vector {
    let i = axis.index();
    let t = (pos - p1[i]) / (p2[i] - p1[i]);
    let mut p = p1 + (p2 - p1) * t;
    p[i] = pos;
    p
}

/// Clip a closed outline against one plane. `keep(a, pos)` decides which
/// side survives; points on the plane are always kept.
fn tri_clip(axis: Axis, pos: f64, poly: &[Vector], keep: fn(f64, f64) -> bool) -> Vec<Vector> {
    let i = axis.index();
    let inside = |p: &Vector| p[i] == pos || keep(p[i], pos);
    let mut out = Vec::with_capacity(MAX_POLYGON + 1);
    let Some(first) = poly.first() else {
        return out;
    };

    let mut p1_inside = inside(first);
    for pair in poly.windows(2) {
        let (p1, p2) = (pair[0], pair[1]);
        let p2_inside = inside(&p2);
        match (p1_inside, p2_inside) {
            (true, true) => out.push(p2),
            (true, false) => out.push(plane_point(axis, pos, p1, p2)),
            (false, true) => {
                if p2[i] != pos {
                    out.push(plane_point(axis, pos, p1, p2));
                }
                out.push(p2);
            }
            (false, false) => {}
        }
        p1_inside = p2_inside;
    }

    if let Some(&start) = out.first() {
        out.push(start);
    }
    out
}

fn keep_above(a: f64, b: f64) -> bool {
    a > b
}

fn keep_below(a: f64, b: f64) -> bool {
    a < b
}

/// Clip a closed outline to a box.
///
/// `Ok(None)` means nothing of the outline lies in the box.
pub fn tri_box_clip(bound: &Bound, poly: &[Vector]) -> Result<Option<(Vec<Vector>, Bound)>, ClipError> {
    let mut poly = poly.to_vec();
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        poly = tri_clip(axis, bound.lo(axis), &poly, keep_above);
        if poly.len() > MAX_POLYGON - 1 {
            return Err(ClipError::TooComplex);
        }
        if poly.is_empty() {
            return Ok(None);
        }
        poly = tri_clip(axis, bound.hi(axis), &poly, keep_below);
        if poly.len() > MAX_POLYGON {
            return Err(ClipError::TooComplex);
        }
        if poly.is_empty() {
            return Ok(None);
        }
    }
    if poly.len() < 3 {
        return Err(ClipError::Degenerate);
    }
    let bound = poly_bound(&poly);
    Ok(Some((poly, bound)))
}

/// Clip a closed outline against a single plane, keeping the side above
/// `pos` when `lower` is set and the side below otherwise.
pub fn tri_plane_clip(axis: Axis, pos: f64, lower: bool, poly: &[Vector]) -> Result<Option<(Vec<Vector>, Bound)>, ClipError> {
    let keep = if lower { keep_above } else { keep_below };
    let poly = tri_clip(axis, pos, poly, keep);
    match poly.len() {
        0 => Ok(None),
        n if n < 3 => Err(ClipError::Degenerate),
        n if n > MAX_POLYGON => Err(ClipError::TooComplex),
        _ => {
            let bound = poly_bound(&poly);
            Ok(Some((poly, bound)))
        }
    }
}
