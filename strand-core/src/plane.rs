//! Least-squares plane fitting and planar projection.

use crate::error::GeometryError;
use glam::{Vec2, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub origin: Vec3,
    /// Unit normal.
    pub normal: Vec3,
}

/// Orthonormal 2D coordinate system lying in a [`Plane`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneBasis {
    pub origin: Vec3,
    pub u: Vec3,
    pub v: Vec3,
}

impl Plane {
    /// Fits the plane minimising the squared orthogonal distances to
    /// `points`.
    ///
    /// The origin is the centroid. The normal is the eigenvector of the
    /// covariance matrix with the smallest eigenvalue, found by solving the
    /// 2x2 system of the best-conditioned axis (largest minor determinant).
    ///
    /// ### Errors
    /// - [`GeometryError::TooFewPoints`] for fewer than 3 points.
    /// - [`GeometryError::Collinear`] if the points do not span a plane.
    pub fn fit(points: &[Vec3]) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::TooFewPoints {
                needed: 3,
                got: points.len(),
            });
        }

        let n = points.len() as f32;
        let centroid = points.iter().copied().sum::<Vec3>() / n;

        let (mut xx, mut xy, mut xz, mut yy, mut yz, mut zz) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        for p in points {
            let r = *p - centroid;
            xx += r.x * r.x;
            xy += r.x * r.y;
            xz += r.x * r.z;
            yy += r.y * r.y;
            yz += r.y * r.z;
            zz += r.z * r.z;
        }
        xx /= n;
        xy /= n;
        xz /= n;
        yy /= n;
        yz /= n;
        zz /= n;

        let det_x = yy * zz - yz * yz;
        let det_y = xx * zz - xz * xz;
        let det_z = xx * yy - xy * xy;
        let det_max = det_x.max(det_y).max(det_z);

        // Minors scale with the fourth power of the point spread.
        let spread = xx + yy + zz;
        if !(det_max > f32::EPSILON * spread * spread) {
            return Err(GeometryError::Collinear);
        }

        let dir = if det_max == det_x {
            Vec3::new(det_x, xz * yz - xy * zz, xy * yz - xz * yy)
        } else if det_max == det_y {
            Vec3::new(xz * yz - xy * zz, det_y, xy * xz - yz * xx)
        } else {
            Vec3::new(xy * yz - xz * yy, xy * xz - yz * xx, det_z)
        };

        let normal = dir.try_normalize().ok_or(GeometryError::Collinear)?;
        Ok(Self {
            origin: centroid,
            normal,
        })
    }

    /// Same plane with the normal flipped to point along `direction`.
    pub fn oriented_towards(self, direction: Vec3) -> Self {
        if self.normal.dot(direction) < 0.0 {
            Self {
                normal: -self.normal,
                ..self
            }
        } else {
            self
        }
    }

    /// In-plane basis whose `u` axis follows `hint` projected onto the
    /// plane. Falls back to an arbitrary orthonormal pair if `hint` is
    /// parallel to the normal. `(u, v, normal)` is right-handed.
    pub fn basis(&self, hint: Vec3) -> PlaneBasis {
        let projected = hint - self.normal * hint.dot(self.normal);
        let (u, v) = match projected.try_normalize() {
            Some(u) => (u, self.normal.cross(u)),
            None => self.normal.any_orthonormal_pair(),
        };
        PlaneBasis {
            origin: self.origin,
            u,
            v,
        }
    }
}

impl PlaneBasis {
    #[inline]
    pub fn project(&self, p: Vec3) -> Vec2 {
        let r = p - self.origin;
        Vec2::new(r.dot(self.u), r.dot(self.v))
    }
}
