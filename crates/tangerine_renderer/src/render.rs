use tangerine_core::{Light, SceneSetup};

use crate::{
    device::{ClearValues, DepthCompare, GraphicsDevice, PrimitiveTopology, UniformValue},
    programs::{LitTextureProgram, UniformLocation, UniformLocations},
    resources::FrameResources,
};

pub const CLEAR_VALUES: ClearValues = ClearValues {
    color: [0.0, 0.0, 0.0, 1.0],
    depth: 1.0,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Rendering,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn { index_count: u32 },
    /// The texture has not arrived yet. Nothing was sent to the device.
    TextureNotReady,
}

/// Draws the scene. Holds no device state, so every frame re-issues the full
/// call sequence and two frames with the same viewport are identical.
#[derive(Debug)]
pub struct FrameRenderer {
    scene: SceneSetup,
    state: RenderState,
    frames: u64,
}

impl FrameRenderer {
    pub fn new(scene: SceneSetup) -> Self {
        Self {
            scene,
            state: RenderState::Idle,
            frames: 0,
        }
    }

    pub fn scene(&self) -> &SceneSetup {
        &self.scene
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    pub fn render<D: GraphicsDevice>(
        &mut self,
        device: &mut D,
        resources: &FrameResources<D>,
    ) -> FrameOutcome {
        let Some(texture) = resources.texture() else {
            log::debug!("skipping frame, texture not ready");
            return FrameOutcome::TextureNotReady;
        };
        self.state = RenderState::Rendering;

        let uniforms = resources.uniforms();
        let transforms = &self.scene.transforms;

        // 1. Fresh color and depth, nearer-or-equal fragments win.
        device.clear(CLEAR_VALUES);
        device.set_depth_test(DepthCompare::LessEqual);

        // 2. Program
        device.use_program(resources.program().handle());

        // 3. Light
        setup_lights(device, uniforms, &self.scene.light);

        // 4. Projection follows the current viewport.
        let projection = self.scene.projection(device.viewport());
        upload(device, &uniforms.projection_matrix, UniformValue::Mat4(projection));

        // 5. Texture on unit 0, sampler reads unit 0.
        device.bind_texture(LitTextureProgram::TEXTURE_UNIT, texture);
        upload(
            device,
            &uniforms.texture_data,
            UniformValue::Int(LitTextureProgram::TEXTURE_UNIT as i32),
        );

        // 6. Transforms and color
        upload(device, &uniforms.model_matrix, UniformValue::Mat4(transforms.model));
        upload(device, &uniforms.view_matrix, UniformValue::Mat4(transforms.view));
        upload(device, &uniforms.normal_matrix, UniformValue::Mat3(transforms.normal));
        upload(device, &uniforms.color, UniformValue::Vec4(self.scene.base_color));

        // 7. Geometry
        let mesh = resources.mesh();
        mesh.bind(device);

        // 8. Draw
        device.draw_indexed(PrimitiveTopology::TriangleList, mesh.index_count);

        self.frames += 1;
        self.state = RenderState::Idle;
        log::trace!("frame {} drawn", self.frames);

        FrameOutcome::Drawn {
            index_count: mesh.index_count,
        }
    }
}

fn setup_lights<D: GraphicsDevice>(device: &mut D, uniforms: &UniformLocations, light: &Light) {
    upload(device, &uniforms.light_position, UniformValue::Vec3(light.position));
    upload(device, &uniforms.light_ambient, UniformValue::Vec3(light.ambient));
    upload(device, &uniforms.light_diffuse, UniformValue::Vec3(light.diffuse));
    upload(device, &uniforms.light_specular, UniformValue::Vec3(light.specular));
}

fn upload<D: GraphicsDevice>(
    device: &mut D,
    location: &Option<UniformLocation>,
    value: UniformValue,
) {
    if let Some(location) = location {
        device.set_uniform(location, value);
    }
}
