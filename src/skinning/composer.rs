use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Affine part of a skin matrix, column-major.
///
/// Layout is four tightly packed `vec3` columns (48 bytes) and can be
/// uploaded as-is.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SkinMatrix {
    pub columns: [[f32; 3]; 4],
}

impl Default for SkinMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl SkinMatrix {
    pub const IDENTITY: Self = Self {
        columns: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0, 0.0]],
    };

    /// Drops the homogeneous row of `m`.
    #[must_use]
    pub fn from_mat4(m: Mat4) -> Self {
        Self {
            columns: [
                m.x_axis.truncate().to_array(),
                m.y_axis.truncate().to_array(),
                m.z_axis.truncate().to_array(),
                m.w_axis.truncate().to_array(),
            ],
        }
    }

    /// Rebuilds the full matrix with `(0, 0, 0, 1)` as bottom row.
    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        let [x, y, z, w] = self.columns;
        Mat4::from_cols(
            Vec3::from_array(x).extend(0.0),
            Vec3::from_array(y).extend(0.0),
            Vec3::from_array(z).extend(0.0),
            Vec3::from_array(w).extend(1.0),
        )
    }

    #[must_use]
    pub fn transform_point3(&self, p: Vec3) -> Vec3 {
        let [x, y, z, w] = self.columns.map(Vec3::from_array);
        x * p.x + y * p.y + z * p.z + w
    }

    #[must_use]
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.columns
            .iter()
            .flatten()
            .zip(other.columns.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= max_abs_diff)
    }
}

/// Inverse of a root world transform, or `None` if it cannot be inverted.
#[must_use]
pub fn invert_root(root_world: Mat4) -> Option<Mat4> {
    if root_world.determinant() == 0.0 {
        return None;
    }
    let inverse = root_world.inverse();
    inverse.is_finite().then_some(inverse)
}

/// `inverse(root) * bone * inverse_bind_pose`, truncated to 3x4.
///
/// Returns `None` when the root transform is singular.
#[must_use]
pub fn compose(bone_world: Mat4, root_world: Mat4, inverse_bind_pose: Mat4) -> Option<SkinMatrix> {
    let root_inverse = invert_root(root_world)?;
    Some(compose_with_root_inverse(bone_world, root_inverse, inverse_bind_pose))
}

/// Same as [`compose`] with the root inverse already computed.
#[inline]
#[must_use]
pub fn compose_with_root_inverse(bone_world: Mat4, root_inverse: Mat4, inverse_bind_pose: Mat4) -> SkinMatrix {
    SkinMatrix::from_mat4(root_inverse * bone_world * inverse_bind_pose)
}

#[cfg(test)]
mod tests {
    use glam::Quat;

    use super::*;

    #[test]
    fn layout_is_48_bytes() {
        assert_eq!(std::mem::size_of::<SkinMatrix>(), 48);
        let bytes = bytemuck::bytes_of(&SkinMatrix::IDENTITY);
        assert_eq!(bytes.len(), 48);
    }

    #[test]
    fn truncation_keeps_affine_part() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_y(0.4),
            Vec3::new(1.0, -2.0, 3.0),
        );
        let skin = SkinMatrix::from_mat4(m);
        assert!(skin.to_mat4().abs_diff_eq(m, 1e-6));
        let p = Vec3::new(0.3, 0.2, -0.5);
        assert!(skin.transform_point3(p).abs_diff_eq(m.transform_point3(p), 1e-5));
    }

    #[test]
    fn singular_root_is_rejected() {
        assert!(compose(Mat4::IDENTITY, Mat4::ZERO, Mat4::IDENTITY).is_none());
        assert!(invert_root(Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0))).is_none());
    }
}
