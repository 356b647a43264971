/// Size of the drawable surface in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height. A collapsed surface (minimised window) reports 1.0
    /// so the projection stays finite.
    pub fn aspect_ratio(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_is_width_over_height() {
        assert_eq!(Viewport::new(800, 600).aspect_ratio(), 800.0 / 600.0);
    }

    #[test]
    fn collapsed_viewport_falls_back_to_square() {
        assert_eq!(Viewport::new(0, 600).aspect_ratio(), 1.0);
        assert_eq!(Viewport::new(800, 0).aspect_ratio(), 1.0);
    }
}
