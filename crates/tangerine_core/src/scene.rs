use glam::{Mat4, Vec4};

use crate::{
    camera::Camera, light::Light, settings::SceneSettings, transform::TransformSet,
    viewport::Viewport,
};

/// Everything about the scene that is computed once at startup.
///
/// Only the projection depends on the viewport, so it is the one matrix
/// rebuilt every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneSetup {
    pub camera: Camera,
    pub transforms: TransformSet,
    pub light: Light,
    /// Flat color applied to the whole mesh.
    pub base_color: Vec4,
}

impl Default for SceneSetup {
    fn default() -> Self {
        Self::new(&SceneSettings::default())
    }
}

impl SceneSetup {
    pub fn new(settings: &SceneSettings) -> Self {
        let camera = settings.camera();
        let view = camera.compute_view_matrix();

        Self {
            transforms: TransformSet::new(Mat4::IDENTITY, view),
            light: settings.light(),
            base_color: settings.base_color,
            camera,
        }
    }

    pub fn projection(&self, viewport: Viewport) -> Mat4 {
        self.camera
            .compute_projection_matrix(viewport.aspect_ratio())
    }
}
