use super::{ShaderProgram, ShaderSources, UniformLocation};
use crate::device::{GraphicsDevice, VertexFormat};

/// The textured, lit program drawn every frame.
pub struct LitTextureProgram;

impl LitTextureProgram {
    pub const VERTEX_SOURCE: &'static str = include_str!("lit_texture.vert.wgsl");
    pub const FRAGMENT_SOURCE: &'static str = include_str!("lit_texture.frag.wgsl");

    pub const POSITION_SLOT: u32 = 0;
    pub const NORMAL_SLOT: u32 = 1;
    pub const TEXCOORD_SLOT: u32 = 2;
    pub const TANGENT_SLOT: u32 = 3;
    pub const BITANGENT_SLOT: u32 = 4;

    /// Fixed per-slot formats of the mesh buffers.
    pub const SLOT_FORMATS: [(u32, VertexFormat); 5] = [
        (Self::POSITION_SLOT, VertexFormat::Float32x3),
        (Self::NORMAL_SLOT, VertexFormat::Float32x3),
        (Self::TEXCOORD_SLOT, VertexFormat::Float32x2),
        (Self::TANGENT_SLOT, VertexFormat::Float32x3),
        (Self::BITANGENT_SLOT, VertexFormat::Float32x3),
    ];

    pub const TEXTURE_UNIT: u32 = 0;

    pub fn sources() -> ShaderSources<'static> {
        ShaderSources {
            vertex: Self::VERTEX_SOURCE,
            fragment: Self::FRAGMENT_SOURCE,
        }
    }
}

/// Attribute locations the program reported at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeLocations {
    pub vertex_position: Option<u32>,
    pub normal_position: Option<u32>,
    pub texture_coords: Option<u32>,
}

impl AttributeLocations {
    pub fn resolve<D: GraphicsDevice>(program: &ShaderProgram<D>) -> Self {
        let locations = Self {
            vertex_position: program.attribute_location("avertexPosition"),
            normal_position: program.attribute_location("anormalPosition"),
            texture_coords: program.attribute_location("textureCoords"),
        };
        for (name, location) in [
            ("avertexPosition", locations.vertex_position),
            ("anormalPosition", locations.normal_position),
            ("textureCoords", locations.texture_coords),
        ] {
            if location.is_none() {
                log::warn!("attribute `{name}` is not active in the program");
            }
        }
        locations
    }
}

/// Uniform locations resolved once at startup. A missing entry means the
/// program does not use that uniform; uploads to it are skipped.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformLocations {
    pub color: Option<UniformLocation>,
    pub model_matrix: Option<UniformLocation>,
    pub view_matrix: Option<UniformLocation>,
    pub projection_matrix: Option<UniformLocation>,
    pub normal_matrix: Option<UniformLocation>,
    pub light_position: Option<UniformLocation>,
    pub light_ambient: Option<UniformLocation>,
    pub light_diffuse: Option<UniformLocation>,
    pub light_specular: Option<UniformLocation>,
    pub texture_data: Option<UniformLocation>,
}

impl UniformLocations {
    pub fn resolve<D: GraphicsDevice>(program: &ShaderProgram<D>) -> Self {
        let locations = Self {
            color: program.uniform_location("uColor"),
            model_matrix: program.uniform_location("uModelMatrix"),
            view_matrix: program.uniform_location("uViewMatrix"),
            projection_matrix: program.uniform_location("uProjectionMatrix"),
            normal_matrix: program.uniform_location("uNormalMatrix"),
            light_position: program.uniform_location("light.position"),
            light_ambient: program.uniform_location("light.ambient"),
            light_diffuse: program.uniform_location("light.diffuse"),
            light_specular: program.uniform_location("light.specular"),
            texture_data: program.uniform_location("textureData"),
        };
        for name in locations.missing() {
            log::warn!("uniform `{name}` is not active in the program, uploads will be skipped");
        }
        locations
    }

    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("uColor", &self.color),
            ("uModelMatrix", &self.model_matrix),
            ("uViewMatrix", &self.view_matrix),
            ("uProjectionMatrix", &self.projection_matrix),
            ("uNormalMatrix", &self.normal_matrix),
            ("light.position", &self.light_position),
            ("light.ambient", &self.light_ambient),
            ("light.diffuse", &self.light_diffuse),
            ("light.specular", &self.light_specular),
            ("textureData", &self.texture_data),
        ]
        .into_iter()
        .filter(|(_, location)| location.is_none())
        .map(|(name, _)| name)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::{CompiledStage, LinkedShaders, ShaderStage, UniformType};

    fn linked() -> LinkedShaders {
        LinkedShaders::link(
            CompiledStage::compile(ShaderStage::Vertex, LitTextureProgram::VERTEX_SOURCE).unwrap(),
            CompiledStage::compile(ShaderStage::Fragment, LitTextureProgram::FRAGMENT_SOURCE)
                .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn builtin_shaders_link() {
        let linked = linked();
        let interface = &linked.interface;

        for (slot, format) in LitTextureProgram::SLOT_FORMATS {
            let input = interface
                .attributes()
                .find(|input| input.location == slot)
                .unwrap();
            assert_eq!(input.format, Some(format), "{}", input.name);
        }
        assert_eq!(interface.attribute("avertexPosition").unwrap().location, 0);
        assert_eq!(interface.attribute("textureCoords").unwrap().location, 2);
    }

    #[test]
    fn builtin_uniforms_resolve() {
        let linked = linked();
        let interface = &linked.interface;

        assert_eq!(interface.uniform("uNormalMatrix").unwrap().ty(), UniformType::Mat3);
        assert_eq!(interface.uniform("uColor").unwrap().ty(), UniformType::Vec4);
        assert_eq!(interface.uniform("light.specular").unwrap().offset(), 48);
        assert_eq!(interface.uniform("textureData").unwrap().ty(), UniformType::Texture2d);
        assert_eq!(interface.textures()[0].sampler, Some(1));
        // uViewMatrix is declared by both stages and merged.
        assert_eq!(
            interface.blocks().iter().filter(|b| b.name == "uViewMatrix").count(),
            1
        );
    }
}
