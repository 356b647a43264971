use glam::{Mat4, Vec3};

/// Static perspective camera.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// Vertical field of view, in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov: 30.0f32.to_radians(),
            near: 0.1,
            far: 100.0,
            eye: Vec3::new(4.0, 3.0, 4.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

impl Camera {
    /// Computes the "Projection Matrix" (View -> Clip).
    /// Depth lands in 0..1, which is what the wgpu backend expects.
    pub fn compute_projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect_ratio, self.near, self.far)
    }

    /// Computes the "View Matrix" (World -> View).
    pub fn compute_view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn ndc_depth(projection: Mat4, z: f32) -> f32 {
        let clip = projection * Vec4::new(0.0, 0.0, z, 1.0);
        clip.z / clip.w
    }

    #[test]
    fn near_and_far_planes_map_to_depth_range() {
        let camera = Camera::default();
        let projection = camera.compute_projection_matrix(800.0 / 600.0);

        assert!((ndc_depth(projection, -0.1) - 0.0).abs() < 1e-5);
        assert!((ndc_depth(projection, -100.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn projection_scales_by_field_of_view_and_aspect() {
        let camera = Camera::default();
        let aspect = 16.0 / 9.0;
        let projection = camera.compute_projection_matrix(aspect);

        let focal = 1.0 / (camera.fov / 2.0).tan();
        assert!((projection.y_axis.y - focal).abs() < 1e-5);
        assert!((projection.x_axis.x - focal / aspect).abs() < 1e-5);
        // Perspective divide by -z.
        assert_eq!(projection.z_axis.w, -1.0);
        assert_eq!(projection.w_axis.w, 0.0);
    }

    #[test]
    fn view_forward_axis_points_from_target_to_eye() {
        let camera = Camera::default();
        let view = camera.compute_view_matrix();

        let forward = (camera.eye - camera.target).normalize();
        assert!(view.row(2).truncate().abs_diff_eq(forward, 1e-6));
    }

    #[test]
    fn view_moves_eye_to_origin() {
        let camera = Camera::default();
        let view = camera.compute_view_matrix();

        assert!(view.transform_point3(camera.eye).abs_diff_eq(Vec3::ZERO, 1e-5));
    }
}
