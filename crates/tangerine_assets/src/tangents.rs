//! Per-vertex tangent frames for tangent-space lighting.
//!
//! Each triangle contributes the tangent and bitangent implied by its position
//! and UV deltas to its three vertices; the sums are normalised at the end.

use glam::{Vec2, Vec3};

const FALLBACK_TANGENT: [f32; 3] = [1.0, 0.0, 0.0];
const FALLBACK_BITANGENT: [f32; 3] = [0.0, 1.0, 0.0];

/// Returns `(tangents, bitangents)`, one entry per vertex.
///
/// Triangles whose UVs are collinear carry no orientation and are skipped.
/// Vertices touched only by such triangles get the +X / +Y fallback frame.
pub fn compute_tangents(
    positions: &[[f32; 3]],
    texcoords: &[[f32; 2]],
    indices: &[u32],
) -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
    let mut tangents = vec![Vec3::ZERO; positions.len()];
    let mut bitangents = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];

        let p0 = Vec3::from(positions[i0]);
        let edge1 = Vec3::from(positions[i1]) - p0;
        let edge2 = Vec3::from(positions[i2]) - p0;

        let uv0 = Vec2::from(texcoords[i0]);
        let duv1 = Vec2::from(texcoords[i1]) - uv0;
        let duv2 = Vec2::from(texcoords[i2]) - uv0;

        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        let r = det.recip();
        if det == 0.0 || !r.is_finite() {
            continue;
        }

        let tangent = (edge1 * duv2.y - edge2 * duv1.y) * r;
        let bitangent = (edge2 * duv1.x - edge1 * duv2.x) * r;

        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
        }
    }

    let finish = |sums: Vec<Vec3>, fallback: [f32; 3]| -> Vec<[f32; 3]> {
        sums.into_iter()
            .map(|v| v.try_normalize().map_or(fallback, Into::into))
            .collect()
    };

    (
        finish(tangents, FALLBACK_TANGENT),
        finish(bitangents, FALLBACK_BITANGENT),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_aligned_uvs_give_axis_aligned_frame() {
        let positions = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        let texcoords = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];

        let (tangents, bitangents) = compute_tangents(&positions, &texcoords, &[0, 1, 2]);

        for t in &tangents {
            assert!(Vec3::from(*t).abs_diff_eq(Vec3::X, 1e-6));
        }
        for b in &bitangents {
            assert!(Vec3::from(*b).abs_diff_eq(Vec3::Y, 1e-6));
        }
    }

    #[test]
    fn flipped_v_flips_bitangent() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let texcoords = [[0.0, 1.0], [1.0, 1.0], [0.0, 0.0]];

        let (_, bitangents) = compute_tangents(&positions, &texcoords, &[0, 1, 2]);
        assert!(Vec3::from(bitangents[0]).abs_diff_eq(-Vec3::Y, 1e-6));
    }

    #[test]
    fn small_uv_island_keeps_its_orientation() {
        // U runs along +Y and V along -X, over a UV patch 1e-4 wide.
        let positions = [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]];
        let texcoords = [[0.0, 0.0], [1e-4, 0.0], [0.0, 1e-4]];

        let (tangents, bitangents) = compute_tangents(&positions, &texcoords, &[0, 1, 2]);
        for t in &tangents {
            assert!(Vec3::from(*t).abs_diff_eq(Vec3::Y, 1e-5), "{t:?}");
        }
        for b in &bitangents {
            assert!(Vec3::from(*b).abs_diff_eq(-Vec3::X, 1e-5), "{b:?}");
        }
    }

    #[test]
    fn collapsed_uvs_fall_back() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let texcoords = [[0.5, 0.5]; 3];

        let (tangents, bitangents) = compute_tangents(&positions, &texcoords, &[0, 1, 2]);
        assert_eq!(tangents, vec![FALLBACK_TANGENT; 3]);
        assert_eq!(bitangents, vec![FALLBACK_BITANGENT; 3]);
    }

    #[test]
    fn shared_vertices_average_their_triangles() {
        // Two triangles of a unit quad share the diagonal vertices.
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let texcoords = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        let (tangents, _) = compute_tangents(&positions, &texcoords, &[0, 1, 2, 0, 2, 3]);
        assert_eq!(tangents.len(), 4);
        for t in &tangents {
            assert!(Vec3::from(*t).abs_diff_eq(Vec3::X, 1e-6));
        }
    }
}
