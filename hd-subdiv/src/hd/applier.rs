//! Applying HD morph edits to refined positions.
use tracing::{debug, trace};
use ultraviolet::Vec3;

use super::{HdMorph, TangentFrameTable};
use crate::far::{QuadTopology, Refinement, RefinementOptions, Refiner};
use crate::{Error, Result};

/// An HD morph together with the blend weight it is evaluated at.
#[derive(Clone, Copy, Debug)]
pub struct WeightedHdMorph<'a> {
    pub morph: &'a HdMorph,
    pub weight: f32,
}

impl<'a> WeightedHdMorph<'a> {
    pub fn new(morph: &'a HdMorph, weight: f32) -> Self {
        Self { morph, weight }
    }

    /// Collects the morphs with a non-zero weight.
    pub fn active(morphs: impl IntoIterator<Item = (&'a HdMorph, f32)>) -> Vec<Self> {
        morphs
            .into_iter()
            .filter(|&(_, weight)| 0.0 != weight)
            .map(|(morph, weight)| Self::new(morph, weight))
            .collect()
    }
}

/// Applies HD morph edits using the tangent frames of a control mesh.
///
/// The applier is read-only and can be shared between threads and between
/// any number of morphs evaluated against the same control positions.
#[derive(Clone, Debug)]
pub struct HdMorphApplier {
    frames: TangentFrameTable,
}

impl HdMorphApplier {
    /// Builds the tangent frames of `control_topology` at
    /// `control_positions`.
    pub fn new(control_topology: &QuadTopology, control_positions: &[Vec3]) -> Result<Self> {
        Ok(Self::from_frames(TangentFrameTable::new(
            control_topology,
            control_positions,
        )?))
    }

    pub fn from_frames(frames: TangentFrameTable) -> Self {
        Self { frames }
    }

    #[inline]
    pub fn frames(&self) -> &TangentFrameTable {
        &self.frames
    }

    /// Adds `weight` times the `level` edits of `morph` to `positions`.
    ///
    /// `topology` and `positions` must be those of refinement level `level`
    /// of the control mesh this applier was built for, and that refinement
    /// must number child faces as checked by
    /// [`assert_topology_assumptions()`](crate::far::assert_topology_assumptions).
    /// None of this is checked here; a mismatch panics on an out of range
    /// index or silently moves the wrong vertices.
    ///
    /// Does nothing if the morph has no edits at `level`.
    pub fn apply(
        &self,
        morph: &HdMorph,
        weight: f32,
        level: usize,
        topology: &QuadTopology,
        positions: &mut [Vec3],
    ) {
        let Some(edits) = morph.level(level) else {
            return;
        };

        trace!(
            level,
            weight,
            face_edits = edits.face_edits().len(),
            "applying HD morph level"
        );

        for face_edit in edits.face_edits() {
            let control_face = face_edit.control_face() as usize;

            for vertex_edit in face_edit.vertex_edits() {
                let path = vertex_edit.packed_path();
                // An empty path selects no vertex.
                let Some(last) = path.len().checked_sub(1) else {
                    continue;
                };

                let refined_face = (0..last).fold(control_face, |face, index| {
                    4 * face + path.element(index) as usize
                });
                let refined_vertex =
                    topology.faces()[refined_face].corner(path.element(last) as usize) as usize;

                // Always the frame of the control face corner the path starts
                // at, however deep it goes.
                let frame = self.frames.frame(control_face, path.element(0) as usize);

                positions[refined_vertex] += frame.to_object_space(vertex_edit.delta()) * weight;
            }
        }
    }

    /// Applies the `level` edits of all `morphs`.
    pub fn apply_all(
        &self,
        morphs: &[WeightedHdMorph<'_>],
        level: usize,
        topology: &QuadTopology,
        positions: &mut [Vec3],
    ) {
        for morph in morphs {
            self.apply(morph.morph, morph.weight, level, topology, positions);
        }
    }
}

/// Refines `control_positions` level by level, applying the edits of all
/// `morphs` after each refinement step.
///
/// Refines to the deepest level of any morph plus `extra_levels`. Returns
/// the topology and positions of that level.
///
/// An empty morph set counts as level 0, so with `extra_levels` of 0 the
/// control topology and positions come back unchanged.
pub fn refine_with_hd_morphs<'r, R: Refiner + ?Sized>(
    refiner: &'r R,
    applier: &HdMorphApplier,
    morphs: &[WeightedHdMorph<'_>],
    control_positions: &[Vec3],
    extra_levels: usize,
) -> Result<(&'r QuadTopology, Vec<Vec3>)> {
    let max_level = morphs
        .iter()
        .map(|morph| morph.morph.max_level())
        .max()
        .unwrap_or(0)
        + extra_levels;

    let out_of_range = |level| Error::LevelOutOfRange {
        level,
        max: refiner.max_level(),
    };
    if refiner.max_level() < max_level {
        return Err(out_of_range(max_level));
    }

    debug!(morphs = morphs.len(), max_level, "refining with HD morphs");

    let mut topology = refiner.topology(0).ok_or_else(|| out_of_range(0))?;
    let mut positions = control_positions.to_vec();

    for level in 1..=max_level {
        topology = refiner.topology(level).ok_or_else(|| out_of_range(level))?;
        positions = refiner.refine_positions(level, &positions)?;
        applier.apply_all(morphs, level, topology, &mut positions);
    }

    Ok((topology, positions))
}

/// Refines `control_positions` to the deepest level of `morph` with all its
/// edits applied at full weight.
pub fn apply_hd_morph(
    morph: &HdMorph,
    control_topology: &QuadTopology,
    control_positions: &[Vec3],
) -> Result<(QuadTopology, Vec<Vec3>)> {
    let refinement = Refinement::new(
        control_topology,
        RefinementOptions {
            max_level: morph.max_level(),
            ..Default::default()
        },
    )?;
    let applier = HdMorphApplier::new(control_topology, control_positions)?;

    let (topology, positions) = refine_with_hd_morphs(
        &refinement,
        &applier,
        &[WeightedHdMorph::new(morph, 1.0)],
        control_positions,
        0,
    )?;
    Ok((topology.clone(), positions))
}
