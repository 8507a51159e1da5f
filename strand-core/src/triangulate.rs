//! Planar Delaunay triangulation and boundary extraction.
//!
//! Triangulation is incremental Bowyer-Watson over `f64` copies of the
//! input, with exact `orient2d` / `incircle` predicates from [`robust`].
//! The outside of the hull is covered by ghost triangles sharing a single
//! vertex at infinity, so the result always fills the convex hull.
//! All emitted triangles are counter-clockwise.

use std::collections::{BTreeMap, HashSet};

use glam::Vec2;
use log::debug;
use robust::{Coord, incircle, orient2d};

use crate::error::GeometryError;

/// Vertex at infinity.
const GHOST: usize = usize::MAX;

#[inline]
fn coord(p: Vec2) -> Coord<f64> {
    Coord {
        x: p.x as f64,
        y: p.y as f64,
    }
}

#[inline]
fn dot(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> f64 {
    (p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)
}

/// `true` if inserting `p` destroys `tri`.
///
/// A ghost triangle `[u, v, GHOST]` stands for the half-plane left of the
/// hull edge `u → v`. It conflicts with points strictly inside that
/// half-plane and with points on the open edge itself.
fn in_conflict(verts: &[Coord<f64>], tri: [usize; 3], p: Coord<f64>) -> bool {
    match tri {
        [u, v, GHOST] | [GHOST, u, v] | [v, GHOST, u] => {
            let (a, b) = (verts[u], verts[v]);
            let side = orient2d(a, b, p);
            side > 0.0 || (side == 0.0 && dot(a, b, p) > 0.0 && dot(b, a, p) > 0.0)
        }
        [a, b, c] => incircle(verts[a], verts[b], verts[c], p) > 0.0,
    }
}

/// Counter-clockwise seed triangle `[i0, i1, i2]`: the first point, the
/// first point distinct from it, and the first point off their line.
fn seed_triangle(verts: &[Coord<f64>]) -> Option<[usize; 3]> {
    let i0 = 0;
    let i1 = verts
        .iter()
        .position(|v| v.x != verts[i0].x || v.y != verts[i0].y)?;
    let i2 = verts
        .iter()
        .position(|&v| orient2d(verts[i0], verts[i1], v) != 0.0)?;
    if orient2d(verts[i0], verts[i1], verts[i2]) > 0.0 {
        Some([i0, i1, i2])
    } else {
        Some([i0, i2, i1])
    }
}

/// Delaunay triangulation of `points`.
///
/// Returned triangles index into `points`, are counter-clockwise and cover
/// the convex hull: with `h` points on the hull boundary and no
/// duplicates there are exactly `2n - 2 - h` of them. Exact duplicate
/// points are skipped and stay unreferenced. Cocircular points are not
/// considered to violate each other's circumcircle.
///
/// ### Errors
/// - [`GeometryError::TooFewPoints`] for fewer than 3 points.
/// - [`GeometryError::DegenerateTriangulation`] if all points are
///   collinear or coincident.
pub fn delaunay(points: &[Vec2]) -> Result<Vec<[u32; 3]>, GeometryError> {
    let n = points.len();
    if n < 3 {
        return Err(GeometryError::TooFewPoints { needed: 3, got: n });
    }

    let verts: Vec<Coord<f64>> = points.iter().map(|p| coord(*p)).collect();
    let Some(seed) = seed_triangle(&verts) else {
        return Err(GeometryError::DegenerateTriangulation { points: n });
    };
    let [a, b, c] = seed;

    let mut triangles: Vec<[usize; 3]> =
        vec![seed, [b, a, GHOST], [c, b, GHOST], [a, c, GHOST]];
    // `+ 0.0` folds -0.0 into 0.0.
    let key = |p: Vec2| ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits());
    let mut seen: HashSet<(u32, u32)> = seed.iter().map(|&i| key(points[i])).collect();
    let mut bad_edges: HashSet<(usize, usize)> = HashSet::new();
    let mut cavity: Vec<(usize, usize)> = Vec::new();

    for (i, p) in points.iter().enumerate() {
        if seed.contains(&i) {
            continue;
        }
        if !seen.insert(key(*p)) {
            debug!("skipping duplicate point {i} at {p}");
            continue;
        }
        let pi = verts[i];

        bad_edges.clear();
        triangles.retain(|&tri| {
            if in_conflict(&verts, tri, pi) {
                let [a, b, c] = tri;
                bad_edges.insert((a, b));
                bad_edges.insert((b, c));
                bad_edges.insert((c, a));
                false
            } else {
                true
            }
        });

        // Cavity boundary: directed edges whose twin was not removed.
        cavity.clear();
        cavity.extend(
            bad_edges
                .iter()
                .filter(|&&(a, b)| !bad_edges.contains(&(b, a)))
                .copied(),
        );
        cavity.sort_unstable();

        triangles.extend(cavity.iter().map(|&(a, b)| [a, b, i]));
    }

    Ok(triangles
        .into_iter()
        .filter(|t| !t.contains(&GHOST))
        .map(|[a, b, c]| [a as u32, b as u32, c as u32])
        .collect())
}

/// Signed area of the polygon `points[loop_[0]], points[loop_[1]], …`.
/// Positive for counter-clockwise order.
pub fn signed_area(points: &[Vec2], loop_: &[u32]) -> f32 {
    let mut twice = 0.0;
    for (k, &i) in loop_.iter().enumerate() {
        let a = points[i as usize];
        let b = points[loop_[(k + 1) % loop_.len()] as usize];
        twice += a.perp_dot(b);
    }
    0.5 * twice
}

/// Outer boundary of a triangulated region as a cyclic vertex list.
///
/// Boundary edges are those used by exactly one triangle. They are chained
/// starting from the smallest vertex index and the loop is oriented
/// counter-clockwise with respect to `points`, whatever the winding of
/// `triangles`. Returns an empty list if there are no triangles.
pub fn boundary_loop(points: &[Vec2], triangles: &[[u32; 3]]) -> Vec<u32> {
    let mut use_count: BTreeMap<(u32, u32), u32> = BTreeMap::new();
    for &[a, b, c] in triangles {
        for (u, v) in [(a, b), (b, c), (c, a)] {
            *use_count.entry((u.min(v), u.max(v))).or_default() += 1;
        }
    }

    let mut neighbours: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for (&(u, v), _) in use_count.iter().filter(|&(_, &c)| c == 1) {
        neighbours.entry(u).or_default().push(v);
        neighbours.entry(v).or_default().push(u);
    }

    let Some((&start, _)) = neighbours.iter().next() else {
        return Vec::new();
    };

    let mut loop_ = vec![start];
    let mut prev = start;
    let mut current = start;
    while loop_.len() <= neighbours.len() {
        let Some(&next) = neighbours[&current]
            .iter()
            .find(|&&v| v != prev || neighbours[&current].len() == 1)
        else {
            break;
        };
        if next == start {
            break;
        }
        loop_.push(next);
        prev = current;
        current = next;
    }

    if signed_area(points, &loop_) < 0.0 {
        loop_[1..].reverse();
    }
    loop_
}
