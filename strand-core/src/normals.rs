use glam::Vec3;

/// Accumulates face normals per mesh vertex.
///
/// Face normals are added unnormalized, so large faces weigh more than
/// small ones. [`NormalAccumulator::into_normals`] returns the normalized
/// sums.
#[derive(Debug)]
pub struct NormalAccumulator {
    sum: Vec<Vec3>,
}

impl NormalAccumulator {
    /// Creates a zeroed accumulator for `len` vertices.
    pub fn with_len(len: usize) -> Self {
        Self {
            sum: vec![Vec3::ZERO; len],
        }
    }

    /// Adds the area-weighted normal of triangle `tri` to its three corners.
    ///
    /// ### Parameters
    /// - `positions` - Vertex positions indexed by `tri`.
    /// - `tri` - Counter-clockwise triangle; the normal follows the
    ///   right-hand rule.
    ///
    /// ### Panics
    /// Panics if an index of `tri` is out of bounds.
    pub fn add_triangle(&mut self, positions: &[Vec3], tri: [u32; 3]) {
        let [a, b, c] = tri.map(|i| i as usize);
        let n = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        for v in [a, b, c] {
            self.sum[v] += n;
        }
    }

    /// Unit normals of all vertices, in vertex order. Vertices without
    /// faces, or whose contributions cancel out, get `Vec3::ZERO`.
    pub fn into_normals(self) -> Vec<Vec3> {
        self.sum.iter().map(|n| n.normalize_or_zero()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn with_len_starts_zeroed() {
        let normals = NormalAccumulator::with_len(4).into_normals();
        assert_eq!(normals, vec![Vec3::ZERO; 4]);
    }

    #[test]
    fn triangle_normal_follows_winding() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let mut acc = NormalAccumulator::with_len(3);
        acc.add_triangle(&positions, [0, 1, 2]);
        assert_eq!(acc.into_normals(), vec![Vec3::Z; 3]);

        let mut flipped = NormalAccumulator::with_len(3);
        flipped.add_triangle(&positions, [0, 2, 1]);
        assert_eq!(flipped.into_normals()[0], -Vec3::Z);
    }

    #[test]
    fn larger_faces_dominate_shared_vertex() {
        // Vertex 0 is shared by a large face in the XY plane and a small
        // face in the XZ plane.
        let positions = [
            Vec3::ZERO,
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(0.0, 4.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let mut acc = NormalAccumulator::with_len(4);
        acc.add_triangle(&positions, [0, 1, 2]);
        acc.add_triangle(&positions, [0, 3, 1]);

        let n = acc.into_normals()[0];
        assert_abs_diff_eq!(n.length(), 1.0, epsilon = 1e-6);
        assert!(n.z > n.y.abs());
        assert!(n.y > 0.0);
    }

    #[test]
    fn into_normals_keeps_untouched_vertices_zero() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE];
        let mut acc = NormalAccumulator::with_len(4);
        acc.add_triangle(&positions, [0, 1, 2]);

        let normals = acc.into_normals();
        assert_eq!(normals.len(), 4);
        assert_eq!(normals[3], Vec3::ZERO);
        assert_eq!(normals[0], Vec3::Z);
    }
}
