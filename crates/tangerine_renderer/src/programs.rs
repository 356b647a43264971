pub mod interface;
pub mod lit_texture_program;

use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use thiserror::Error;

use crate::device::GraphicsDevice;

pub use interface::{
    ProgramInterface, SamplerBinding, TextureBinding, UniformBlock, UniformLocation, UniformType,
    VertexInput,
};
pub use lit_texture_program::{AttributeLocations, LitTextureProgram, UniformLocations};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("{0}")]
    Link(String),
}

/// One WGSL source per stage.
#[derive(Clone, Copy, Debug)]
pub struct ShaderSources<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

/// A single stage that parsed and validated on its own.
#[derive(Debug)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub source: String,
    pub module: naga::Module,
}

impl CompiledStage {
    pub fn compile(stage: ShaderStage, source: &str) -> Result<Self, ProgramError> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| ProgramError::Compile {
            stage,
            log: e.emit_to_string(source),
        })?;

        Validator::new(ValidationFlags::all(), Capabilities::default())
            .validate(&module)
            .map_err(|e| ProgramError::Compile {
                stage,
                log: e.emit_to_string(source),
            })?;

        Ok(Self {
            stage,
            source: source.to_owned(),
            module,
        })
    }

    /// The single entry point for this stage.
    fn entry_point(&self) -> Result<&naga::EntryPoint, ProgramError> {
        let mut entries = self
            .module
            .entry_points
            .iter()
            .filter(|ep| ep.stage == self.stage.naga());

        match (entries.next(), entries.next()) {
            (Some(ep), None) => Ok(ep),
            (None, _) => Err(ProgramError::Link(format!(
                "no @{} entry point",
                self.stage
            ))),
            (Some(_), Some(_)) => Err(ProgramError::Link(format!(
                "more than one @{} entry point",
                self.stage
            ))),
        }
    }
}

/// A vertex/fragment pair whose interfaces agree.
#[derive(Debug)]
pub struct LinkedShaders {
    pub vertex: CompiledStage,
    pub fragment: CompiledStage,
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub interface: ProgramInterface,
}

impl LinkedShaders {
    pub fn link(vertex: CompiledStage, fragment: CompiledStage) -> Result<Self, ProgramError> {
        let vertex_ep = vertex.entry_point()?;
        let fragment_ep = fragment.entry_point()?;

        // 1. Varyings: every fragment input must be written by the vertex stage.
        let outputs = interface::stage_outputs(&vertex.module, vertex_ep);
        for (location, input) in interface::stage_inputs(&fragment.module, fragment_ep) {
            match outputs.get(&location) {
                None => {
                    return Err(ProgramError::Link(format!(
                        "fragment input `{}` at @location({location}) is not written by the vertex stage",
                        input.name
                    )));
                }
                Some(output) if output.ty != input.ty => {
                    return Err(ProgramError::Link(format!(
                        "fragment input `{}` at @location({location}) does not match vertex output `{}`",
                        input.name, output.name
                    )));
                }
                Some(_) => {}
            }
        }

        // 2. Resources of both stages merge into one binding table.
        let interface = ProgramInterface::link(
            interface::vertex_inputs(&vertex.module, vertex_ep),
            interface::StageResources::reflect(&vertex.module),
            interface::StageResources::reflect(&fragment.module),
        )
        .map_err(ProgramError::Link)?;

        let vertex_entry = vertex_ep.name.clone();
        let fragment_entry = fragment_ep.name.clone();

        Ok(Self {
            vertex,
            fragment,
            vertex_entry,
            fragment_entry,
            interface,
        })
    }
}

/// A linked program living on a device, plus the names it can resolve.
#[derive(Debug)]
pub struct ShaderProgram<D: GraphicsDevice> {
    handle: D::Program,
    interface: ProgramInterface,
}

impl<D: GraphicsDevice> ShaderProgram<D> {
    /// Compiles both stages, links them and creates the program on `device`.
    /// Fails before touching the device when either stage is rejected.
    pub fn build(device: &mut D, sources: ShaderSources<'_>) -> Result<Self, ProgramError> {
        let vertex = CompiledStage::compile(ShaderStage::Vertex, sources.vertex)?;
        let fragment = CompiledStage::compile(ShaderStage::Fragment, sources.fragment)?;
        let linked = LinkedShaders::link(vertex, fragment)?;

        let handle = device
            .create_program(&linked)
            .map_err(|e| ProgramError::Link(e.to_string()))?;

        log::info!(
            "shader program linked: {} attributes, {} uniforms",
            linked.interface.attributes().count(),
            linked.interface.uniforms().count()
        );

        Ok(Self {
            handle,
            interface: linked.interface,
        })
    }

    pub fn handle(&self) -> D::Program {
        self.handle
    }

    pub fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    /// `None` when the program has no active attribute with this name.
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.interface.attribute(name).map(|input| input.location)
    }

    /// `None` when the program has no active uniform with this name.
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.interface.uniform(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "
@group(0) @binding(0) var<uniform> uMatrix: mat4x4<f32>;

struct Out {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) aPosition: vec3<f32>, @location(1) aUv: vec2<f32>) -> Out {
    var out: Out;
    out.position = uMatrix * vec4<f32>(aPosition, 1.0);
    out.uv = aUv;
    return out;
}
";

    const FRAGMENT: &str = "
@group(0) @binding(1) var<uniform> uTint: vec4<f32>;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return uTint * vec4<f32>(uv, 0.0, 1.0);
}
";

    fn link(vertex: &str, fragment: &str) -> Result<LinkedShaders, ProgramError> {
        LinkedShaders::link(
            CompiledStage::compile(ShaderStage::Vertex, vertex)?,
            CompiledStage::compile(ShaderStage::Fragment, fragment)?,
        )
    }

    #[test]
    fn compatible_stages_link() {
        let linked = link(VERTEX, FRAGMENT).unwrap();
        assert_eq!(linked.vertex_entry, "vs_main");
        assert_eq!(linked.fragment_entry, "fs_main");
        assert_eq!(linked.interface.attribute("aUv").unwrap().location, 1);
        assert!(linked.interface.uniform("uTint").is_some());
        assert!(linked.interface.uniform("uMissing").is_none());
    }

    #[test]
    fn syntax_error_reports_the_stage() {
        let err = CompiledStage::compile(ShaderStage::Fragment, "fn broken( {").unwrap_err();
        match err {
            ProgramError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unwritten_varying_fails_to_link() {
        let fragment = "
@fragment
fn fs_main(@location(3) normal: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(normal, 1.0);
}
";
        assert!(matches!(link(VERTEX, fragment), Err(ProgramError::Link(_))));
    }

    #[test]
    fn mismatched_varying_type_fails_to_link() {
        let fragment = "
@fragment
fn fs_main(@location(0) uv: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(uv, 1.0);
}
";
        assert!(matches!(link(VERTEX, fragment), Err(ProgramError::Link(_))));
    }

    #[test]
    fn missing_entry_point_fails_to_link() {
        let fragment = "fn helper() -> f32 { return 1.0; }";
        assert!(matches!(link(VERTEX, fragment), Err(ProgramError::Link(_))));
    }

    #[test]
    fn conflicting_bindings_fail_to_link() {
        let fragment = "
@group(0) @binding(0) var<uniform> uOther: vec4<f32>;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return uOther * uv.x;
}
";
        assert!(matches!(link(VERTEX, fragment), Err(ProgramError::Link(_))));
    }
}
