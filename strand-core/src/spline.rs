//! Centripetal Catmull-Rom resampling of strand polylines.

use glam::Vec3;

/// Knot exponent: 0.5 is the centripetal parametrisation (no cusps or
/// self-intersections on unevenly spaced points).
pub const SPLINE_ALPHA: f32 = 0.5;
/// Tangent scale: `0` is plain Catmull-Rom, `1` collapses tangents.
pub const SPLINE_TENSION: f32 = 0.4;

/// Knot interval between two control points; coincident points fall back to
/// a unit interval so the tangent terms stay finite.
#[inline]
fn knot_interval(a: Vec3, b: Vec3) -> f32 {
    let d = a.distance(b).powf(SPLINE_ALPHA);
    if d > f32::EPSILON { d } else { 1.0 }
}

/// Evaluates the segment between `p1` and `p2` at `t ∈ [0, 1]`.
///
/// `t = 0` returns `p1` exactly and `t = 1` returns `p2`.
pub fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t01 = knot_interval(p0, p1);
    let t12 = knot_interval(p1, p2);
    let t23 = knot_interval(p2, p3);

    let m1 = (1.0 - SPLINE_TENSION)
        * (p2 - p1 + t12 * ((p1 - p0) / t01 - (p2 - p0) / (t01 + t12)));
    let m2 = (1.0 - SPLINE_TENSION)
        * (p2 - p1 + t12 * ((p3 - p2) / t23 - (p3 - p1) / (t12 + t23)));

    let a = 2.0 * (p1 - p2) + m1 + m2;
    let b = -3.0 * (p1 - p2) - 2.0 * m1 - m2;

    a * (t * t * t) + b * (t * t) + m1 * t + p1
}

/// Resamples a polyline with `steps` samples per segment.
///
/// Endpoints are mirrored (`2·p0 − p1`, `2·pn − pn−1`) to provide the
/// missing outer control points. The result has `(n − 1)·steps + 1` points
/// and contains every input point at index `k·steps`.
///
/// Inputs with fewer than two points are returned unchanged.
pub fn resample(points: &[Vec3], steps: usize) -> Vec<Vec3> {
    let n = points.len();
    if n < 2 || steps == 0 {
        return points.to_vec();
    }

    let start = 2.0 * points[0] - points[1];
    let end = 2.0 * points[n - 1] - points[n - 2];
    let inv = 1.0 / steps as f32;

    let mut out = Vec::with_capacity((n - 1) * steps + 1);
    for i in 0..n - 1 {
        let p0 = if i >= 1 { points[i - 1] } else { start };
        let p3 = if i + 2 < n { points[i + 2] } else { end };

        // Interval [points[i], points[i + 1]).
        out.push(points[i]);
        for j in 1..steps {
            out.push(catmull_rom(p0, points[i], points[i + 1], p3, j as f32 * inv));
        }
    }
    out.push(points[n - 1]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn segment_interpolates_its_endpoints() {
        let p0 = Vec3::new(-1.0, 0.0, 0.0);
        let p1 = Vec3::new(0.0, 0.0, 0.0);
        let p2 = Vec3::new(1.0, 1.0, 0.0);
        let p3 = Vec3::new(3.0, 1.0, 0.5);

        assert_eq!(catmull_rom(p0, p1, p2, p3, 0.0), p1);
        assert_abs_diff_eq!(catmull_rom(p0, p1, p2, p3, 1.0).distance(p2), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn resample_has_expected_length_and_keeps_inputs() {
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.2),
            Vec3::new(0.5, 2.0, 0.0),
            Vec3::new(0.4, 3.5, -0.3),
        ];
        let out = resample(&pts, 6);

        assert_eq!(out.len(), 3 * 6 + 1);
        for (k, p) in pts.iter().enumerate() {
            assert_eq!(out[k * 6], *p);
        }
    }

    #[test]
    fn collinear_input_stays_on_the_line_without_overshoot() {
        let pts: Vec<Vec3> = (0..4).map(|i| Vec3::new(0.0, i as f32, 0.0)).collect();
        let out = resample(&pts, 10);

        for w in out.windows(2) {
            assert_abs_diff_eq!(w[0].x, 0.0, epsilon = 1e-6);
            assert_abs_diff_eq!(w[0].z, 0.0, epsilon = 1e-6);
            // Monotonic along the line.
            assert!(w[1].y >= w[0].y - 1e-6);
        }
    }

    #[test]
    fn coincident_points_do_not_produce_nan() {
        let pts = vec![Vec3::ZERO, Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0)];
        let out = resample(&pts, 4);
        assert!(out.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn short_input_is_returned_unchanged() {
        let pts = vec![Vec3::ONE];
        assert_eq!(resample(&pts, 5), pts);
    }
}
