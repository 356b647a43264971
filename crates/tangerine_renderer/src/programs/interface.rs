use std::collections::{BTreeMap, btree_map::Entry};

use naga::{
    AddressSpace, Binding, EntryPoint, Handle, ImageDimension, Module, Scalar, Type, TypeInner,
    VectorSize,
};

use crate::device::VertexFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformType {
    Int,
    UInt,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
    Texture2d,
    Other,
}

impl UniformType {
    fn of(inner: &TypeInner) -> Self {
        match *inner {
            TypeInner::Scalar(s) if s == Scalar::I32 => Self::Int,
            TypeInner::Scalar(s) if s == Scalar::U32 => Self::UInt,
            TypeInner::Scalar(s) if s == Scalar::F32 => Self::Float,
            TypeInner::Vector { size, scalar } if scalar == Scalar::F32 => match size {
                VectorSize::Bi => Self::Vec2,
                VectorSize::Tri => Self::Vec3,
                VectorSize::Quad => Self::Vec4,
            },
            TypeInner::Matrix {
                columns: VectorSize::Tri,
                rows: VectorSize::Tri,
                scalar,
            } if scalar == Scalar::F32 => Self::Mat3,
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar,
            } if scalar == Scalar::F32 => Self::Mat4,
            _ => Self::Other,
        }
    }
}

/// Where a named uniform lives: a byte offset inside a uniform block,
/// or a texture binding.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformLocation {
    name: String,
    group: u32,
    binding: u32,
    offset: u32,
    ty: UniformType,
}

impl UniformLocation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> u32 {
        self.group
    }

    pub fn binding(&self) -> u32 {
        self.binding
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn ty(&self) -> UniformType {
        self.ty
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VertexInput {
    pub name: String,
    pub location: u32,
    /// `None` for inputs that are not plain float vectors.
    pub format: Option<VertexFormat>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UniformBlock {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub size: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextureBinding {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    /// Binding of the sampler declared right after the texture, if any.
    pub sampler: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SamplerBinding {
    pub name: String,
    pub group: u32,
    pub binding: u32,
}

/// A location-bound value flowing between stages.
#[derive(Clone, Debug)]
pub(crate) struct Varying {
    pub name: String,
    pub ty: TypeInner,
}

fn collect_locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    name: Option<&str>,
    out: &mut BTreeMap<u32, Varying>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.insert(
                *location,
                Varying {
                    name: name.unwrap_or_default().to_owned(),
                    ty: module.types[ty].inner.clone(),
                },
            );
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(
                        module,
                        member.ty,
                        member.binding.as_ref(),
                        member.name.as_deref(),
                        out,
                    );
                }
            }
        }
    }
}

pub(crate) fn stage_inputs(module: &Module, entry: &EntryPoint) -> BTreeMap<u32, Varying> {
    let mut inputs = BTreeMap::new();
    for argument in &entry.function.arguments {
        collect_locations(
            module,
            argument.ty,
            argument.binding.as_ref(),
            argument.name.as_deref(),
            &mut inputs,
        );
    }
    inputs
}

pub(crate) fn stage_outputs(module: &Module, entry: &EntryPoint) -> BTreeMap<u32, Varying> {
    let mut outputs = BTreeMap::new();
    if let Some(result) = &entry.function.result {
        collect_locations(module, result.ty, result.binding.as_ref(), None, &mut outputs);
    }
    outputs
}

pub(crate) fn vertex_inputs(module: &Module, entry: &EntryPoint) -> Vec<VertexInput> {
    stage_inputs(module, entry)
        .into_iter()
        .map(|(location, varying)| VertexInput {
            format: vertex_format(&varying.ty),
            name: varying.name,
            location,
        })
        .collect()
}

fn vertex_format(inner: &TypeInner) -> Option<VertexFormat> {
    match *inner {
        TypeInner::Scalar(s) if s == Scalar::F32 => Some(VertexFormat::Float32),
        TypeInner::Vector { size, scalar } if scalar == Scalar::F32 => Some(match size {
            VectorSize::Bi => VertexFormat::Float32x2,
            VectorSize::Tri => VertexFormat::Float32x3,
            VectorSize::Quad => VertexFormat::Float32x4,
        }),
        _ => None,
    }
}

/// Resource globals declared by one module.
#[derive(Debug, Default)]
pub(crate) struct StageResources {
    blocks: Vec<UniformBlock>,
    uniforms: Vec<UniformLocation>,
    textures: Vec<UniformLocation>,
    samplers: Vec<SamplerBinding>,
}

impl StageResources {
    pub fn reflect(module: &Module) -> Self {
        let mut resources = Self::default();

        for (_, global) in module.global_variables.iter() {
            let (Some(name), Some(rb)) = (global.name.as_deref(), global.binding.as_ref()) else {
                continue;
            };
            let inner = &module.types[global.ty].inner;

            match global.space {
                AddressSpace::Uniform => {
                    resources.blocks.push(UniformBlock {
                        name: name.to_owned(),
                        group: rb.group,
                        binding: rb.binding,
                        size: inner.size(module.to_ctx()),
                    });
                    flatten(
                        module,
                        name.to_owned(),
                        (rb.group, rb.binding),
                        0,
                        global.ty,
                        &mut resources.uniforms,
                    );
                }
                AddressSpace::Handle => match inner {
                    TypeInner::Image {
                        dim: ImageDimension::D2,
                        arrayed: false,
                        ..
                    } => resources.textures.push(UniformLocation {
                        name: name.to_owned(),
                        group: rb.group,
                        binding: rb.binding,
                        offset: 0,
                        ty: UniformType::Texture2d,
                    }),
                    TypeInner::Sampler { .. } => resources.samplers.push(SamplerBinding {
                        name: name.to_owned(),
                        group: rb.group,
                        binding: rb.binding,
                    }),
                    _ => log::warn!("ignoring unsupported resource `{name}`"),
                },
                _ => {}
            }
        }

        resources
    }
}

fn flatten(
    module: &Module,
    name: String,
    (group, binding): (u32, u32),
    offset: u32,
    ty: Handle<Type>,
    out: &mut Vec<UniformLocation>,
) {
    match &module.types[ty].inner {
        TypeInner::Struct { members, .. } => {
            for member in members {
                let Some(member_name) = &member.name else {
                    continue;
                };
                flatten(
                    module,
                    format!("{name}.{member_name}"),
                    (group, binding),
                    offset + member.offset,
                    member.ty,
                    out,
                );
            }
        }
        inner => out.push(UniformLocation {
            name,
            group,
            binding,
            offset,
            ty: UniformType::of(inner),
        }),
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Slot {
    Block { name: String, size: u32 },
    Texture(String),
    Sampler(String),
}

impl Slot {
    fn name(&self) -> &str {
        match self {
            Self::Block { name, .. } | Self::Texture(name) | Self::Sampler(name) => name,
        }
    }
}

/// Everything a linked program exposes by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgramInterface {
    attributes: BTreeMap<String, VertexInput>,
    uniforms: BTreeMap<String, UniformLocation>,
    blocks: Vec<UniformBlock>,
    textures: Vec<TextureBinding>,
    samplers: Vec<SamplerBinding>,
}

impl ProgramInterface {
    /// Merges the resources of both stages. A binding slot may be declared
    /// by both stages only when the declarations agree.
    pub(crate) fn link(
        vertex_inputs: Vec<VertexInput>,
        vertex: StageResources,
        fragment: StageResources,
    ) -> Result<Self, String> {
        let mut slots: BTreeMap<(u32, u32), Slot> = BTreeMap::new();
        let mut interface = Self {
            attributes: vertex_inputs
                .into_iter()
                .map(|input| (input.name.clone(), input))
                .collect(),
            ..Default::default()
        };

        for stage in [vertex, fragment] {
            for block in stage.blocks {
                let slot = Slot::Block {
                    name: block.name.clone(),
                    size: block.size,
                };
                if claim(&mut slots, (block.group, block.binding), slot)? {
                    interface.blocks.push(block);
                }
            }

            for texture in stage.textures {
                let key = (texture.group, texture.binding);
                if claim(&mut slots, key, Slot::Texture(texture.name.clone()))? {
                    interface.textures.push(TextureBinding {
                        name: texture.name.clone(),
                        group: texture.group,
                        binding: texture.binding,
                        sampler: None,
                    });
                }
                interface.insert_uniform(texture)?;
            }

            for sampler in stage.samplers {
                let key = (sampler.group, sampler.binding);
                if claim(&mut slots, key, Slot::Sampler(sampler.name.clone()))? {
                    interface.samplers.push(sampler);
                }
            }

            for uniform in stage.uniforms {
                interface.insert_uniform(uniform)?;
            }
        }

        for texture in &mut interface.textures {
            let next = (texture.group, texture.binding + 1);
            if matches!(slots.get(&next), Some(Slot::Sampler(_))) {
                texture.sampler = Some(texture.binding + 1);
            }
        }

        Ok(interface)
    }

    fn insert_uniform(&mut self, uniform: UniformLocation) -> Result<(), String> {
        match self.uniforms.entry(uniform.name.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(uniform);
                Ok(())
            }
            Entry::Occupied(entry) if *entry.get() == uniform => Ok(()),
            Entry::Occupied(entry) => Err(format!(
                "uniform `{}` is declared differently by the two stages",
                entry.key()
            )),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&VertexInput> {
        self.attributes.get(name)
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformLocation> {
        self.uniforms.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &VertexInput> {
        self.attributes.values()
    }

    pub fn uniforms(&self) -> impl Iterator<Item = &UniformLocation> {
        self.uniforms.values()
    }

    pub fn blocks(&self) -> &[UniformBlock] {
        &self.blocks
    }

    pub fn textures(&self) -> &[TextureBinding] {
        &self.textures
    }

    pub fn samplers(&self) -> &[SamplerBinding] {
        &self.samplers
    }

    /// Number of bind groups, counting empty groups below the highest used one.
    pub fn group_count(&self) -> u32 {
        let blocks = self.blocks.iter().map(|b| b.group);
        let textures = self.textures.iter().map(|t| t.group);
        let samplers = self.samplers.iter().map(|s| s.group);
        blocks
            .chain(textures)
            .chain(samplers)
            .max()
            .map_or(0, |group| group + 1)
    }
}

/// Returns `true` when the slot was free, `false` when the other stage
/// already declared the same resource there.
fn claim(
    slots: &mut BTreeMap<(u32, u32), Slot>,
    key: (u32, u32),
    slot: Slot,
) -> Result<bool, String> {
    match slots.entry(key) {
        Entry::Vacant(entry) => {
            entry.insert(slot);
            Ok(true)
        }
        Entry::Occupied(entry) if *entry.get() == slot => Ok(false),
        Entry::Occupied(entry) => Err(format!(
            "`{}` and `{}` both use @group({}) @binding({})",
            entry.get().name(),
            slot.name(),
            key.0,
            key.1
        )),
    }
}
