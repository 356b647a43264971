use std::io::Cursor;

use glam::Vec3;
use thiserror::Error;

use crate::tangents::compute_tangents;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("malformed OBJ data: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("mesh contains no triangles")]
    Empty,
    #[error("face {face} has {arity} vertices, at least 3 are required")]
    DegenerateFace { face: usize, arity: usize },
    #[error("triangle {triangle} has zero area")]
    ZeroAreaTriangle { triangle: usize },
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("{vertex_count} vertices do not fit 16-bit indices")]
    TooManyVertices { vertex_count: usize },
}

#[derive(Clone, Copy, Debug)]
pub struct MeshLoadOptions {
    /// Derive per-vertex tangents and bitangents from the UV layout.
    /// When off, every vertex gets the +X / +Y fallback frame.
    pub compute_tangents: bool,
}

impl Default for MeshLoadOptions {
    fn default() -> Self {
        Self {
            compute_tangents: true,
        }
    }
}

/// Immutable, fully unpacked triangle mesh.
///
/// All per-vertex arrays have the same length and every index is below it.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    tangents: Vec<[f32; 3]>,
    bitangents: Vec<[f32; 3]>,
    indices: Vec<u16>,
}

impl Mesh {
    /// Parses OBJ text (`v`/`vt`/`vn`/`f` records) into a single mesh.
    /// Every object and group in the file is merged; polygons are fanned into triangles.
    pub fn from_obj(source: &str, options: MeshLoadOptions) -> Result<Self, MeshError> {
        let mut reader = Cursor::new(source.as_bytes());
        let (models, _materials) = tobj::load_obj_buf(
            &mut reader,
            &tobj::LoadOptions {
                single_index: true,
                // Keep the arities so malformed faces are visible to us.
                triangulate: false,
                ..Default::default()
            },
            // Materials are not used, the texture is supplied separately.
            |_| Err(tobj::LoadError::OpenFileFailed),
        )?;

        let mut builder = MeshBuilder::default();
        for model in &models {
            builder.append(&model.mesh)?;
        }

        builder.build(options)
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn texcoords(&self) -> &[[f32; 2]] {
        &self.texcoords
    }

    pub fn tangents(&self) -> &[[f32; 3]] {
        &self.tangents
    }

    pub fn bitangents(&self) -> &[[f32; 3]] {
        &self.bitangents
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

#[derive(Default)]
struct MeshBuilder {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    indices: Vec<u32>,
    faces_seen: usize,
}

impl MeshBuilder {
    fn append(&mut self, mesh: &tobj::Mesh) -> Result<(), MeshError> {
        let base = self.positions.len() as u32;
        let vertex_count = mesh.positions.len() / 3;

        self.positions
            .extend(mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]));

        if mesh.normals.len() == mesh.positions.len() {
            self.normals
                .extend(mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]));
        } else {
            log::warn!("mesh has no normals, filling {vertex_count} zero normals");
            self.normals.extend(std::iter::repeat_n([0.0; 3], vertex_count));
        }

        if mesh.texcoords.len() / 2 == vertex_count {
            self.texcoords
                .extend(mesh.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]));
        } else {
            log::warn!("mesh has no texture coordinates, filling {vertex_count} zero UVs");
            self.texcoords.extend(std::iter::repeat_n([0.0; 2], vertex_count));
        }

        for &index in &mesh.indices {
            if index as usize >= vertex_count {
                return Err(MeshError::IndexOutOfRange {
                    index,
                    vertex_count,
                });
            }
        }

        // tobj leaves the arity list empty when every face is a triangle.
        if mesh.face_arities.is_empty() {
            if mesh.indices.len() % 3 != 0 {
                return Err(MeshError::DegenerateFace {
                    face: self.faces_seen + mesh.indices.len() / 3,
                    arity: mesh.indices.len() % 3,
                });
            }
            self.indices.extend(mesh.indices.iter().map(|i| i + base));
            self.faces_seen += mesh.indices.len() / 3;
            return Ok(());
        }

        let mut cursor = 0;
        for &arity in &mesh.face_arities {
            let arity = arity as usize;
            if arity < 3 {
                return Err(MeshError::DegenerateFace {
                    face: self.faces_seen,
                    arity,
                });
            }

            let Some(face) = mesh.indices.get(cursor..cursor + arity) else {
                return Err(MeshError::DegenerateFace {
                    face: self.faces_seen,
                    arity: mesh.indices.len() - cursor,
                });
            };
            for i in 1..arity - 1 {
                self.indices
                    .extend([face[0] + base, face[i] + base, face[i + 1] + base]);
            }

            cursor += arity;
            self.faces_seen += 1;
        }

        // Indices not covered by any arity belong to a face with fewer than 3 vertices.
        if cursor != mesh.indices.len() {
            return Err(MeshError::DegenerateFace {
                face: self.faces_seen,
                arity: mesh.indices.len() - cursor,
            });
        }

        Ok(())
    }

    fn build(self, options: MeshLoadOptions) -> Result<Mesh, MeshError> {
        if self.indices.is_empty() {
            return Err(MeshError::Empty);
        }

        let vertex_count = self.positions.len();
        if vertex_count > u16::MAX as usize + 1 {
            return Err(MeshError::TooManyVertices { vertex_count });
        }

        for (triangle, tri) in self.indices.chunks_exact(3).enumerate() {
            let [a, b, c] =
                [tri[0], tri[1], tri[2]].map(|i| Vec3::from(self.positions[i as usize]));
            let (e1, e2) = (b - a, c - a);
            // |e1 x e2|^2 = |e1|^2 |e2|^2 sin^2, so the bound tracks the triangle's own scale.
            let bound = f32::EPSILON * f32::EPSILON * e1.length_squared() * e2.length_squared();
            if e1.cross(e2).length_squared() <= bound {
                return Err(MeshError::ZeroAreaTriangle { triangle });
            }
        }

        let (tangents, bitangents) = if options.compute_tangents {
            compute_tangents(&self.positions, &self.texcoords, &self.indices)
        } else {
            (vec![[1.0, 0.0, 0.0]; vertex_count], vec![[0.0, 1.0, 0.0]; vertex_count])
        };

        let indices = self.indices.iter().map(|&i| i as u16).collect();

        log::debug!(
            "mesh loaded: {vertex_count} vertices, {} triangles",
            self.indices.len() / 3
        );

        Ok(Mesh {
            positions: self.positions,
            normals: self.normals,
            texcoords: self.texcoords,
            tangents,
            bitangents,
            indices,
        })
    }
}
