//! Tests for the far module.

use hd_subdiv::far::*;
use hd_subdiv::{Error, Index};
use ultraviolet::Vec3;

use test_utils::*;

fn refine(topology: &QuadTopology, options: RefinementOptions) -> Refinement {
    Refinement::new(topology, options).expect("Failed to refine")
}

fn to_level(max_level: usize) -> RefinementOptions {
    RefinementOptions {
        max_level,
        ..Default::default()
    }
}

#[test]
fn test_refinement_options_default() {
    let options = RefinementOptions::default();
    assert_eq!(options.boundary_interpolation, BoundaryInterpolation::EdgeOnly);
    assert_eq!(options.max_level, 4);
}

#[test]
fn test_grid_counts() {
    let (topology, _) = grid(2);
    let refinement = refine(&topology, to_level(2));

    assert_eq!(refinement.max_level(), 2);
    assert_eq!(refinement.topology(0).unwrap(), &topology);

    let level_1 = refinement.topology(1).unwrap();
    assert_eq!(level_1.vertex_count(), 25);
    assert_eq!(level_1.face_count(), 16);

    let level_2 = refinement.topology(2).unwrap();
    assert_eq!(level_2.vertex_count(), 81);
    assert_eq!(level_2.face_count(), 64);
}

#[test]
fn test_conformance_two_levels_deep() {
    for (topology, _) in [cube(), grid(3)] {
        let refinement = refine(&topology, to_level(2));
        check_refiner_conformance(&refinement).unwrap();

        for level in 0..2 {
            assert_topology_assumptions(
                level,
                refinement.topology(level).unwrap(),
                refinement.topology(level + 1).unwrap(),
            )
            .unwrap();
        }
    }
}

#[test]
fn test_planar_grid_stays_planar() {
    let (topology, positions) = grid(3);
    for boundary_interpolation in [
        BoundaryInterpolation::EdgeOnly,
        BoundaryInterpolation::EdgeAndCorner,
    ] {
        let refinement = refine(
            &topology,
            RefinementOptions {
                boundary_interpolation,
                max_level: 3,
            },
        );
        let refined = refinement.refine_fully(&positions).unwrap();

        assert_eq!(refined.len(), refinement.topology(3).unwrap().vertex_count());
        assert!(refined.iter().all(|position| 0.0 == position.y));
    }
}

#[test]
fn test_grid_boundary_rules() {
    let (topology, positions) = grid(2);
    let refinement = refine(
        &topology,
        RefinementOptions {
            boundary_interpolation: BoundaryInterpolation::EdgeAndCorner,
            max_level: 1,
        },
    );
    let refined = refinement.refine(1, &positions).unwrap();
    let level_1 = refinement.topology(1).unwrap();

    // Corner and center vertex keep their position.
    assert_close(refined[0], Vec3::zero());
    assert_close(refined[4], Vec3::new(1.0, 0.0, 1.0));

    // Child face 0 of face 0: corner 1 is the boundary edge midpoint, corner
    // 2 the face point.
    let child = level_1.faces()[0];
    assert_eq!(child.corner(0), 0);
    assert_close(refined[child.corner(1) as usize], Vec3::new(0.5, 0.0, 0.0));
    assert_close(refined[child.corner(2) as usize], Vec3::new(0.5, 0.0, 0.5));
    assert_close(refined[child.corner(3) as usize], Vec3::new(0.0, 0.0, 0.5));
}

#[test]
fn test_stencils_are_affine() {
    let (topology, _) = cube();
    let refinement = refine(&topology, to_level(2));

    for level in 1..=2 {
        let table = refinement.stencil_table(level).unwrap();
        assert_eq!(
            table.control_vertex_count(),
            refinement.topology(level - 1).unwrap().vertex_count()
        );
        assert_eq!(table.len(), refinement.topology(level).unwrap().vertex_count());

        for i in 0..table.len() {
            let stencil = table.stencil(Index::from(i)).unwrap();
            let sum: f32 = stencil.weights().iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "stencil {} sums to {}", i, sum);
        }
    }
    assert!(refinement.stencil_table(0).is_none());
    assert!(refinement.stencil_table(3).is_none());
}

#[test]
fn test_face_map() {
    let (topology, _) = grid(2);
    let refinement = refine(&topology, to_level(2));
    let face_map = refinement.face_map();

    assert_eq!(face_map.len(), 64);
    assert_eq!(face_map[0], Index(0));
    assert_eq!(face_map[15], Index(0));
    assert_eq!(face_map[16], Index(1));
    assert_eq!(face_map[63], Index(3));
}

#[test]
fn test_refine_rejects_wrong_buffer_size() {
    let (topology, positions) = cube();
    let refinement = refine(&topology, to_level(1));
    assert!(matches!(
        refinement.refine(1, &positions[..7]),
        Err(Error::InvalidBufferSize { .. })
    ));
}

/// A refiner that numbers the children of every face backwards.
struct ReversedChildren {
    levels: Vec<QuadTopology>,
}

impl ReversedChildren {
    fn new(refinement: &Refinement) -> Self {
        let levels = (0..=refinement.max_level())
            .map(|level| {
                let topology = refinement.topology(level).unwrap();
                if 0 == level {
                    return topology.clone();
                }
                let faces = topology
                    .faces()
                    .chunks(4)
                    .flat_map(|children| children.iter().rev().copied())
                    .collect();
                QuadTopology::new(topology.vertex_count(), faces).unwrap()
            })
            .collect();
        Self { levels }
    }
}

impl Refiner for ReversedChildren {
    fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    fn topology(&self, level: usize) -> Option<&QuadTopology> {
        self.levels.get(level)
    }

    fn refine_positions(&self, _level: usize, previous: &[Vec3]) -> hd_subdiv::Result<Vec<Vec3>> {
        Ok(previous.to_vec())
    }
}

#[test]
fn test_nonconforming_refiner_is_detected() {
    let (topology, _) = cube();
    let refiner = ReversedChildren::new(&refine(&topology, to_level(1)));

    assert!(matches!(
        check_refiner_conformance(&refiner),
        Err(Error::TopologyOrdering {
            level: 0,
            face: 0,
            child_face: 0,
            corner: 0,
            ..
        })
    ));
}

#[test]
fn test_level_without_all_children_is_rejected() {
    let (topology, _) = cube();
    let refinement = refine(&topology, to_level(1));
    let level_1 = refinement.topology(1).unwrap();
    let truncated =
        QuadTopology::new(level_1.vertex_count(), level_1.faces()[..20].to_vec()).unwrap();

    assert!(matches!(
        assert_topology_assumptions(0, &topology, &truncated),
        Err(Error::InvalidTopology(_))
    ));
}

#[test]
fn test_refine_other_primvars() {
    use ultraviolet::Vec2;

    let (topology, positions) = grid(2);
    let refinement = refine(&topology, to_level(1));

    // Texture coordinates follow the same affine map as the XZ positions.
    let uvs = positions
        .iter()
        .map(|position| Vec2::new(position.x, position.z) * 0.5)
        .collect::<Vec<_>>();
    let refined_uvs = refinement.refine(1, &uvs).unwrap();
    let refined_positions = refinement.refine(1, &positions).unwrap();
    for (uv, position) in refined_uvs.iter().zip(&refined_positions) {
        assert!((*uv - Vec2::new(position.x, position.z) * 0.5).mag() < 1e-5);
    }

    let heights = vec![1.0f32; positions.len()];
    assert!(refinement
        .refine(1, &heights)
        .unwrap()
        .iter()
        .all(|height| (height - 1.0).abs() < 1e-6));
}
