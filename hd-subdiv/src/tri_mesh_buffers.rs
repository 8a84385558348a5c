//! # Triangle Buffer Conversion
//!
//! Helper for turning refined (and morphed) quad meshes into triangle mesh
//! buffers for use with realtime rendering.
use itertools::Itertools;
use slice_of_array::prelude::*;

use crate::far::{Quad, QuadTopology};
use crate::{Error, Result};

static EPSILON: f32 = 0.00000001;

type Vector = ultraviolet::vec::Vec3;
type Normal = Vector;
type Point = Vector;

/// Returns a flat [`u32`] triangle index buffer and two, flat matching point
/// and normal buffers.
///
/// `vertices` holds three `f32` per vertex of `topology`.
///
/// All the faces are disconnected. I.e. points & normals are duplicated for
/// each shared vertex. Each quad is split along its shorter diagonal.
pub fn to_triangle_mesh_buffers(
    vertices: &[f32],
    topology: &QuadTopology,
) -> Result<(Vec<u32>, Vec<[f32; 3]>, Vec<[f32; 3]>)> {
    if vertices.len() != 3 * topology.vertex_count() {
        return Err(Error::InvalidBufferSize {
            expected: 3 * topology.vertex_count(),
            actual: vertices.len(),
        });
    }

    let points_nested = vertices.nest::<[_; 3]>();

    let (points, normals): (Vec<[f32; 3]>, Vec<[f32; 3]>) = topology
        .faces()
        .iter()
        .flat_map(|quad| {
            let corners = quad_points(quad, points_nested);
            (0..Quad::SIDE_COUNT)
                // Grab each corner with its two neighbors.
                .map(|corner| {
                    let point = &corners[corner];
                    let normal = orthogonal(
                        &corners[(corner + 3) % Quad::SIDE_COUNT],
                        point,
                        &corners[(corner + 1) % Quad::SIDE_COUNT],
                    );
                    let mag_sq = normal.mag_sq();

                    // Check for collinearity:
                    let normal = if mag_sq < EPSILON {
                        face_normal(&corners)
                    } else {
                        normal / mag_sq.sqrt()
                    };

                    ([point.x, point.y, point.z], [normal.x, normal.y, normal.z])
                })
                .collect_vec()
        })
        .unzip();

    let triangle_index = topology
        .faces()
        .iter()
        .enumerate()
        .flat_map(|(face, quad)| {
            let p = quad_points(quad, points_nested);
            let base = (Quad::SIDE_COUNT * face) as u32;
            let [i0, i1, i2, i3] = [base, base + 1, base + 2, base + 3];

            // Use the shortest diagonal so triangles are most nearly
            // equilateral.
            if (p[0] - p[2]).mag_sq() < (p[1] - p[3]).mag_sq() {
                [i0, i1, i2, i0, i2, i3]
            } else {
                [i1, i2, i3, i1, i3, i0]
            }
        })
        .collect();

    Ok((triangle_index, points, normals))
}

/// Like [`to_triangle_mesh_buffers()`] but takes the positions returned by
/// refinement or [`refine_with_hd_morphs()`](crate::hd::refine_with_hd_morphs)
/// directly.
pub fn positions_to_triangle_mesh_buffers(
    positions: &[Vector],
    topology: &QuadTopology,
) -> Result<(Vec<u32>, Vec<[f32; 3]>, Vec<[f32; 3]>)> {
    to_triangle_mesh_buffers(bytemuck::cast_slice(positions), topology)
}

#[inline]
fn orthogonal(v0: &Point, v1: &Point, v2: &Point) -> Vector {
    (*v1 - *v0).cross(*v2 - *v1)
}

#[inline]
fn quad_points(quad: &Quad, points: &[[f32; 3]]) -> [Point; 4] {
    quad.0.map(|index| Point::from(points[index as usize]))
}

/// Computes the normal of a face.
/// Tries to do the right thing if the face
/// is non-planar or degenerate.
#[inline]
fn face_normal(points: &[Point]) -> Normal {
    let (normal, considered_corners) = points
        .iter()
        .circular_tuple_windows::<(_, _, _)>()
        .fold((Vector::zero(), 0), |(normal, count), corner| {
            let ortho_normal = orthogonal(corner.0, corner.1, corner.2);
            let mag_sq = ortho_normal.mag_sq();
            // Filter out collinear edge pairs.
            if mag_sq < EPSILON {
                (normal, count)
            } else {
                (normal + ortho_normal / mag_sq.sqrt(), count + 1)
            }
        });

    if 0 == considered_corners {
        // Degenerate/zero size face.
        Vector::zero()
    } else {
        (normal / considered_corners as f32).normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_becomes_two_triangles() {
        let topology = QuadTopology::new(4, vec![Quad([0, 1, 2, 3])]).unwrap();
        // Diagonal 1-3 is shorter.
        let vertices = [
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            3.0, 1.0, 0.0, //
            0.0, 1.0, 0.0,
        ];

        let (index, points, normals) = to_triangle_mesh_buffers(&vertices, &topology).unwrap();

        assert_eq!(index, [1, 2, 3, 1, 3, 0]);
        assert_eq!(points.len(), 4);
        assert_eq!(points[2], [3.0, 1.0, 0.0]);
        for normal in normals {
            assert!((Vector::from(normal) - Vector::unit_z()).mag() < 1e-6);
        }
    }

    #[test]
    fn positions_match_flat_vertices() {
        let topology = QuadTopology::new(4, vec![Quad([0, 1, 2, 3])]).unwrap();
        let positions = [
            Vector::new(0.0, 0.0, 0.0),
            Vector::new(1.0, 0.0, 0.0),
            Vector::new(3.0, 1.0, 0.0),
            Vector::new(0.0, 1.0, 0.0),
        ];
        let vertices = positions
            .iter()
            .flat_map(|position| [position.x, position.y, position.z])
            .collect::<Vec<_>>();

        assert_eq!(
            positions_to_triangle_mesh_buffers(&positions, &topology).unwrap(),
            to_triangle_mesh_buffers(&vertices, &topology).unwrap()
        );
        assert!(matches!(
            positions_to_triangle_mesh_buffers(&positions[..3], &topology),
            Err(Error::InvalidBufferSize {
                expected: 12,
                actual: 9
            })
        ));
    }

    #[test]
    fn vertex_buffer_must_match_topology() {
        let topology = QuadTopology::new(4, vec![Quad([0, 1, 2, 3])]).unwrap();
        assert!(matches!(
            to_triangle_mesh_buffers(&[0.0; 9], &topology),
            Err(Error::InvalidBufferSize {
                expected: 12,
                actual: 9
            })
        ));
    }
}
