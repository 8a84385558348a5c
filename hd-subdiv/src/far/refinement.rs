//! Uniform Catmull-Clark refinement of quad meshes.
//!
//! [`Refinement`] refines a control [`QuadTopology`] uniformly up to a maximum
//! level and keeps the topology and a [`StencilTable`] for every level. Values
//! are then pushed through the hierarchy one level at a time with
//! [`refine()`](Refinement::refine()), which leaves room to edit them in
//! between (this is what HD morphs need).
//!
//! ## Numbering
//!
//! Level `L + 1` is numbered as follows:
//! * Vertices – children of level `L` vertices keep their index, followed by
//!   the children of edges (in order of discovery when walking faces and their
//!   sides), followed by the children of faces.
//! * Faces – the four children of face `p` are `4p..4p + 4` and child `4p + k`
//!   has the child of corner `k` of `p` at its own corner `k`.
//!
//! The face numbering is the contract checked by
//! [`assert_topology_assumptions()`].
use std::collections::HashMap;

use tracing::debug;
use ultraviolet::Vec3;

use super::{Primvar, Quad, QuadTopology, StencilTable};
use crate::{Error, Index, Result};

/// Boundary interpolation rules for vertices on the mesh boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoundaryInterpolation {
    /// Boundary edges are sharp. Corners (vertices with a single incident
    /// face) are smoothed along the boundary.
    #[default]
    EdgeOnly,
    /// Boundary edges and corners are sharp.
    EdgeAndCorner,
}

/// Uniform refinement options.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RefinementOptions {
    pub boundary_interpolation: BoundaryInterpolation,
    pub max_level: usize,
}

impl Default for RefinementOptions {
    /// Create refinement options with the following defaults:
    ///
    /// | Property                 | Value                                        |
    /// |--------------------------|----------------------------------------------|
    /// | `boundary_interpolation` | [`EdgeOnly`](BoundaryInterpolation::EdgeOnly) |
    /// | `max_level`              | `4`                                          |
    fn default() -> Self {
        Self {
            boundary_interpolation: BoundaryInterpolation::EdgeOnly,
            max_level: 4,
        }
    }
}

/// A refinement engine as seen by the HD morph level loop.
///
/// Implementations must number child faces as described in the
/// [module documentation](self). Use [`check_refiner_conformance()`] once to
/// verify this for a concrete engine before trusting any HD morph result.
pub trait Refiner {
    /// Returns the deepest level that can be requested.
    fn max_level(&self) -> usize;

    /// Returns the topology of `level`. Level `0` is the control topology.
    fn topology(&self, level: usize) -> Option<&QuadTopology>;

    /// Refines positions of level `level - 1` to `level`.
    fn refine_positions(&self, level: usize, previous: &[Vec3]) -> Result<Vec<Vec3>>;
}

/// Stores topology and stencils of a uniformly refined quad mesh.
#[derive(Clone, Debug)]
pub struct Refinement {
    options: RefinementOptions,
    levels: Vec<QuadTopology>,
    stencil_tables: Vec<StencilTable>,
}

impl Refinement {
    /// Refines `control` uniformly up to `options.max_level`.
    ///
    /// With the `topology_validation` feature the child face ordering is
    /// verified for every level.
    pub fn new(control: &QuadTopology, options: RefinementOptions) -> Result<Self> {
        let mut levels = Vec::with_capacity(options.max_level + 1);
        let mut stencil_tables = Vec::with_capacity(options.max_level);
        levels.push(control.clone());

        for level in 1..=options.max_level {
            let (topology, stencils) =
                refine_level(&levels[level - 1], options.boundary_interpolation)?;
            debug!(
                level,
                vertices = topology.vertex_count(),
                faces = topology.face_count(),
                "refined level"
            );
            levels.push(topology);
            stencil_tables.push(stencils);
        }

        let refinement = Self {
            options,
            levels,
            stencil_tables,
        };

        #[cfg(feature = "topology_validation")]
        check_refiner_conformance(&refinement)?;

        Ok(refinement)
    }

    /// Returns the refinement options.
    #[inline]
    pub fn options(&self) -> RefinementOptions {
        self.options
    }

    /// Returns the highest level of refinement.
    #[inline]
    pub fn max_level(&self) -> usize {
        self.options.max_level
    }

    /// Returns the topology of a level. Level `0` is the control topology.
    #[inline]
    pub fn topology(&self, level: usize) -> Option<&QuadTopology> {
        self.levels.get(level)
    }

    /// Returns the stencils computing `level` from `level - 1`.
    #[inline]
    pub fn stencil_table(&self, level: usize) -> Option<&StencilTable> {
        level
            .checked_sub(1)
            .and_then(|index| self.stencil_tables.get(index))
    }

    /// Refines values from `level - 1` to `level`.
    pub fn refine<T: Primvar>(&self, level: usize, previous: &[T]) -> Result<Vec<T>> {
        let table = self.stencil_table(level).ok_or(Error::LevelOutOfRange {
            level,
            max: self.max_level(),
        })?;
        let mut values = vec![T::zero(); table.len()];
        table.update_values(previous, &mut values)?;
        Ok(values)
    }

    /// Refines control values all the way to the maximum level.
    pub fn refine_fully<T: Primvar>(&self, control: &[T]) -> Result<Vec<T>> {
        (1..=self.max_level()).try_fold(control.to_vec(), |values, level| {
            self.refine(level, &values)
        })
    }

    /// Returns the control face each face of the maximum level descends from.
    pub fn face_map(&self) -> Vec<Index> {
        let shift = 2 * self.max_level();
        let face_count = self.levels.last().map_or(0, QuadTopology::face_count);
        (0..face_count).map(|face| Index::from(face >> shift)).collect()
    }
}

impl Refiner for Refinement {
    fn max_level(&self) -> usize {
        Refinement::max_level(self)
    }

    fn topology(&self, level: usize) -> Option<&QuadTopology> {
        Refinement::topology(self, level)
    }

    fn refine_positions(&self, level: usize, previous: &[Vec3]) -> Result<Vec<Vec3>> {
        self.refine(level, previous)
    }
}

/// Checks that `next` numbers the children of `topology`'s faces the way HD
/// morph paths address them.
///
/// For every face `f` and corner `c` of `topology`, face `4f + c` of `next`
/// must have the same vertex at corner `c`. `level` is the level of
/// `topology` and only used for error reporting.
pub fn assert_topology_assumptions(
    level: usize,
    topology: &QuadTopology,
    next: &QuadTopology,
) -> Result<()> {
    if next.face_count() != Quad::SIDE_COUNT * topology.face_count() {
        return Err(Error::InvalidTopology(format!(
            "Level {} has {} faces, expected {} children of {} faces.",
            level + 1,
            next.face_count(),
            Quad::SIDE_COUNT * topology.face_count(),
            topology.face_count()
        )));
    }

    for (face, quad) in topology.faces().iter().enumerate() {
        for corner in 0..Quad::SIDE_COUNT {
            let child_face = face * Quad::SIDE_COUNT + corner;
            let expected = quad.corner(corner);
            let actual = next.faces()[child_face].corner(corner);
            if expected != actual {
                return Err(Error::TopologyOrdering {
                    level,
                    face,
                    child_face,
                    corner,
                    expected,
                    actual,
                });
            }
        }
    }

    Ok(())
}

/// Runs [`assert_topology_assumptions()`] for every pair of adjacent levels
/// of `refiner`.
pub fn check_refiner_conformance<R: Refiner + ?Sized>(refiner: &R) -> Result<()> {
    let max = refiner.max_level();
    for level in 0..max {
        let topology = refiner
            .topology(level)
            .ok_or(Error::LevelOutOfRange { level, max })?;
        let next = refiner.topology(level + 1).ok_or(Error::LevelOutOfRange {
            level: level + 1,
            max,
        })?;
        assert_topology_assumptions(level, topology, next)?;
    }
    Ok(())
}

/// Edge and incidence relations of one level.
struct Adjacency {
    edge_vertices: Vec<[u32; 2]>,
    edge_faces: Vec<Vec<u32>>,
    face_edges: Vec<[u32; 4]>,
    vertex_edges: Vec<Vec<u32>>,
    vertex_faces: Vec<Vec<u32>>,
}

impl Adjacency {
    fn new(topology: &QuadTopology) -> Self {
        let mut lookup = HashMap::with_capacity(2 * topology.face_count());
        let mut edge_vertices = Vec::new();
        let mut edge_faces: Vec<Vec<u32>> = Vec::new();
        let mut face_edges = Vec::with_capacity(topology.face_count());
        let mut vertex_faces = vec![Vec::new(); topology.vertex_count()];

        for (face, quad) in topology.faces().iter().enumerate() {
            let mut edges = [0u32; 4];
            for (corner, edge_slot) in edges.iter_mut().enumerate() {
                let a = quad.corner(corner);
                let b = quad.corner(corner + 1);
                let edge = *lookup.entry((a.min(b), a.max(b))).or_insert_with(|| {
                    edge_vertices.push([a, b]);
                    edge_faces.push(Vec::with_capacity(2));
                    (edge_vertices.len() - 1) as u32
                });
                edge_faces[edge as usize].push(face as u32);
                *edge_slot = edge;
                vertex_faces[a as usize].push(face as u32);
            }
            face_edges.push(edges);
        }

        let mut vertex_edges = vec![Vec::new(); topology.vertex_count()];
        for (edge, &[a, b]) in edge_vertices.iter().enumerate() {
            vertex_edges[a as usize].push(edge as u32);
            vertex_edges[b as usize].push(edge as u32);
        }

        Self {
            edge_vertices,
            edge_faces,
            face_edges,
            vertex_edges,
            vertex_faces,
        }
    }

    #[inline]
    fn other_vertex(&self, edge: u32, vertex: u32) -> u32 {
        let [a, b] = self.edge_vertices[edge as usize];
        if a == vertex {
            b
        } else {
            a
        }
    }
}

/// Appends the corners of `quad`, each weighted by `weight / 4`, i.e. the
/// face point scaled by `weight`.
#[inline]
fn push_face_point(entries: &mut Vec<(u32, f32)>, quad: &Quad, weight: f32) {
    entries.extend(quad.0.iter().map(|&vertex| (vertex, 0.25 * weight)));
}

fn refine_level(
    topology: &QuadTopology,
    boundary_interpolation: BoundaryInterpolation,
) -> Result<(QuadTopology, StencilTable)> {
    let adjacency = Adjacency::new(topology);
    let vertex_count = topology.vertex_count();
    let edge_count = adjacency.edge_vertices.len();
    let face_count = topology.face_count();

    let edge_child = |edge: u32| (vertex_count as u32) + edge;
    let face_child = |face: usize| (vertex_count + edge_count + face) as u32;

    let mut faces = Vec::with_capacity(Quad::SIDE_COUNT * face_count);
    for (face, quad) in topology.faces().iter().enumerate() {
        let edges = &adjacency.face_edges[face];
        for corner in 0..Quad::SIDE_COUNT {
            let ring = [
                quad.corner(corner),
                edge_child(edges[corner]),
                face_child(face),
                edge_child(edges[(corner + 3) % Quad::SIDE_COUNT]),
            ];
            // Rotate so the corner vertex ends up at position `corner`.
            let mut child = [0u32; 4];
            for (offset, &vertex) in ring.iter().enumerate() {
                child[(corner + offset) % Quad::SIDE_COUNT] = vertex;
            }
            faces.push(Quad(child));
        }
    }

    let mut stencils = StencilTable::new(vertex_count);
    let mut entries = Vec::with_capacity(32);

    for vertex in 0..vertex_count as u32 {
        entries.clear();
        vertex_point(
            &mut entries,
            topology,
            &adjacency,
            vertex,
            boundary_interpolation,
        );
        stencils.push(&entries);
    }

    for (edge, &[a, b]) in adjacency.edge_vertices.iter().enumerate() {
        entries.clear();
        let incident = &adjacency.edge_faces[edge];
        if 2 == incident.len() {
            entries.push((a, 0.25));
            entries.push((b, 0.25));
            for &face in incident {
                push_face_point(&mut entries, &topology.faces()[face as usize], 0.25);
            }
        } else {
            // Boundary and non-manifold edges are sharp.
            entries.push((a, 0.5));
            entries.push((b, 0.5));
        }
        stencils.push(&entries);
    }

    for quad in topology.faces() {
        entries.clear();
        push_face_point(&mut entries, quad, 1.0);
        stencils.push(&entries);
    }

    let refined = QuadTopology::new(vertex_count + edge_count + face_count, faces)?;
    Ok((refined, stencils))
}

fn vertex_point(
    entries: &mut Vec<(u32, f32)>,
    topology: &QuadTopology,
    adjacency: &Adjacency,
    vertex: u32,
    boundary_interpolation: BoundaryInterpolation,
) {
    let edges = &adjacency.vertex_edges[vertex as usize];
    let faces = &adjacency.vertex_faces[vertex as usize];

    let non_manifold = edges
        .iter()
        .any(|&edge| 2 < adjacency.edge_faces[edge as usize].len());
    let boundary_neighbors = edges
        .iter()
        .filter(|&&edge| 1 == adjacency.edge_faces[edge as usize].len())
        .map(|&edge| adjacency.other_vertex(edge, vertex))
        .collect::<Vec<_>>();

    match boundary_neighbors.len() {
        0 if !non_manifold && !edges.is_empty() && edges.len() == faces.len() => {
            // Smooth interior vertex.
            let valence = edges.len() as f32;
            let ring_weight = 1.0 / (valence * valence);
            entries.push((vertex, (valence - 2.0) / valence));
            for &edge in edges {
                entries.push((adjacency.other_vertex(edge, vertex), ring_weight));
            }
            for &face in faces {
                push_face_point(entries, &topology.faces()[face as usize], ring_weight);
            }
        }
        2 if !non_manifold
            && !(1 == faces.len()
                && BoundaryInterpolation::EdgeAndCorner == boundary_interpolation) =>
        {
            // Crease rule along the boundary.
            entries.push((vertex, 0.75));
            entries.push((boundary_neighbors[0], 0.125));
            entries.push((boundary_neighbors[1], 0.125));
        }
        // Corners, isolated and non-manifold vertices stay put.
        _ => entries.push((vertex, 1.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> (QuadTopology, Vec<Vec3>) {
        let topology = QuadTopology::from_flat_indices(
            8,
            &[
                0, 1, 3, 2, //
                2, 3, 5, 4, //
                4, 5, 7, 6, //
                6, 7, 1, 0, //
                1, 7, 5, 3, //
                6, 0, 2, 4,
            ],
        )
        .unwrap();
        let positions = vec![
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
        ];
        (topology, positions)
    }

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).mag() < 1e-5, "{:?} != {:?}", a, b);
    }

    #[test]
    fn cube_counts() {
        let (topology, _) = cube();
        let refinement = Refinement::new(
            &topology,
            RefinementOptions {
                max_level: 2,
                ..Default::default()
            },
        )
        .unwrap();

        let level_1 = refinement.topology(1).unwrap();
        assert_eq!(level_1.vertex_count(), 8 + 12 + 6);
        assert_eq!(level_1.face_count(), 24);

        let level_2 = refinement.topology(2).unwrap();
        assert_eq!(level_2.vertex_count(), 26 + 48 + 24);
        assert_eq!(level_2.face_count(), 96);
        assert!(refinement.topology(3).is_none());
    }

    #[test]
    fn cube_level_one_positions() {
        let (topology, positions) = cube();
        let refinement = Refinement::new(
            &topology,
            RefinementOptions {
                max_level: 1,
                ..Default::default()
            },
        )
        .unwrap();
        let refined = refinement.refine(1, &positions).unwrap();
        assert_eq!(refined.len(), 26);

        // Valence 3 corner: P/3 + (sum of neighbors + sum of face points)/9.
        assert_close(refined[3], Vec3::broadcast(5.0 / 9.0));

        // Edge 0 runs from vertex 0 to vertex 1 and borders faces 0 and 3.
        assert_close(refined[8], Vec3::new(0.0, -0.75, 0.75));

        // Face point of face 4 (the +x side).
        assert_close(refined[8 + 12 + 4], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn child_faces_share_parent_corners() {
        let (topology, _) = cube();
        let refinement = Refinement::new(&topology, RefinementOptions::default()).unwrap();
        check_refiner_conformance(&refinement).unwrap();

        let level_1 = refinement.topology(1).unwrap();
        // All four children of a face meet at its face point.
        let face_point = (8 + 12 + 5) as u32;
        for child in 20..24 {
            assert!(level_1.faces()[child].contains(face_point));
        }
    }

    #[test]
    fn reordered_children_are_detected() {
        let (topology, _) = cube();
        let refinement = Refinement::new(
            &topology,
            RefinementOptions {
                max_level: 1,
                ..Default::default()
            },
        )
        .unwrap();

        let mut faces = refinement.topology(1).unwrap().faces().to_vec();
        faces.swap(4, 5);
        let broken = QuadTopology::new(26, faces).unwrap();

        assert!(matches!(
            assert_topology_assumptions(0, &topology, &broken),
            Err(Error::TopologyOrdering {
                face: 1,
                child_face: 4,
                corner: 0,
                ..
            })
        ));
    }

    #[test]
    fn corners_follow_boundary_interpolation() {
        let topology = QuadTopology::new(4, vec![Quad([0, 1, 2, 3])]).unwrap();
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];

        let sharp = Refinement::new(
            &topology,
            RefinementOptions {
                boundary_interpolation: BoundaryInterpolation::EdgeAndCorner,
                max_level: 1,
            },
        )
        .unwrap();
        assert_close(sharp.refine(1, &positions).unwrap()[0], positions[0]);

        let smooth = Refinement::new(
            &topology,
            RefinementOptions {
                max_level: 1,
                ..Default::default()
            },
        )
        .unwrap();
        assert_close(
            smooth.refine(1, &positions).unwrap()[0],
            Vec3::new(0.125, 0.0, 0.125),
        );
    }

    #[test]
    fn face_map_points_at_control_faces() {
        let (topology, _) = cube();
        let refinement = Refinement::new(
            &topology,
            RefinementOptions {
                max_level: 2,
                ..Default::default()
            },
        )
        .unwrap();
        let face_map = refinement.face_map();
        assert_eq!(face_map.len(), 96);
        assert_eq!(face_map[0], Index(0));
        assert_eq!(face_map[16 * 3 + 7], Index(3));
        assert_eq!(face_map[95], Index(5));
    }

    #[test]
    fn out_of_range_level_is_rejected() {
        let (topology, positions) = cube();
        let refinement = Refinement::new(
            &topology,
            RefinementOptions {
                max_level: 1,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(matches!(
            refinement.refine(0, &positions),
            Err(Error::LevelOutOfRange { level: 0, max: 1 })
        ));
        assert!(matches!(
            refinement.refine(2, &positions),
            Err(Error::LevelOutOfRange { level: 2, max: 1 })
        ));
    }
}
