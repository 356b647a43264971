use glam::Vec3;

/// The single point light of the scene. Constant for the process lifetime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 15.0, 20.0),
            ambient: Vec3::new(0.27, 0.4, 0.1),
            diffuse: Vec3::new(0.54, 0.9, 0.0),
            specular: Vec3::new(0.25, 0.3, 1.0),
        }
    }
}
