use glam::{Mat3, Mat4};

/// The matrices shared by every frame.
///
/// The model matrix is fixed at creation and never updated, so the mesh cannot
/// move. Animating it would also require re-deriving `normal`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformSet {
    pub model: Mat4,
    pub view: Mat4,
    pub normal: Mat3,
}

impl TransformSet {
    pub fn new(model: Mat4, view: Mat4) -> Self {
        Self {
            model,
            view,
            normal: normal_matrix(model),
        }
    }
}

/// Inverse-transpose of the upper 3x3 of `model`.
/// Keeps normals perpendicular to surfaces under non-uniform scale.
pub fn normal_matrix(model: Mat4) -> Mat3 {
    Mat3::from_mat4(model).inverse().transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn identity_model_gives_identity_normal_matrix() {
        assert_eq!(normal_matrix(Mat4::IDENTITY), Mat3::IDENTITY);
    }

    #[test]
    fn non_uniform_scale_keeps_normals_perpendicular() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let normal = normal_matrix(model);

        // A surface along the diagonal of the xy-plane, and its normal.
        let tangent = Vec3::new(1.0, -1.0, 0.0);
        let n = Vec3::new(1.0, 1.0, 0.0);

        let tangent_world = model.transform_vector3(tangent);
        let n_world = normal * n;
        assert!(tangent_world.dot(n_world).abs() < 1e-6);
    }

    #[test]
    fn translation_does_not_leak_into_normal_matrix() {
        let model = Mat4::from_translation(Vec3::new(3.0, -2.0, 7.0));
        assert!(normal_matrix(model).abs_diff_eq(Mat3::IDENTITY, 1e-6));
    }
}
