//! Optional plausibility checks on HD morph content.
//!
//! None of this is needed for [`apply()`](super::HdMorphApplier::apply()) to
//! work. It exists to spot assets that decoded wrongly or do not belong to
//! the content family at hand.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{HdMorph, VertexEdit};
use crate::{Error, Result};

/// Flags vertex edits whose delta magnitude is outside a range.
///
/// The default range is tuned for human figure morphs modeled in
/// centimeters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeltaSanityCheck {
    pub min_magnitude: f32,
    pub max_magnitude: f32,
}

impl Default for DeltaSanityCheck {
    /// Create a check with the following defaults:
    ///
    /// | Property        | Value  |
    /// |-----------------|--------|
    /// | `min_magnitude` | `1e-5` |
    /// | `max_magnitude` | `1.0`  |
    fn default() -> Self {
        Self {
            min_magnitude: 1e-5,
            max_magnitude: 1.0,
        }
    }
}

impl DeltaSanityCheck {
    /// Returns `true` if `magnitude` lies in the accepted range.
    #[inline]
    pub fn accepts(&self, magnitude: f32) -> bool {
        (self.min_magnitude..=self.max_magnitude).contains(&magnitude)
    }

    /// Iterates over `(level, control face, edit)` of every edit with an
    /// unusual delta.
    pub fn unusual_deltas<'a>(
        &'a self,
        morph: &'a HdMorph,
    ) -> impl Iterator<Item = (usize, u32, &'a VertexEdit)> + 'a {
        morph.levels().iter().flat_map(move |level| {
            level.face_edits().iter().flat_map(move |face_edit| {
                face_edit
                    .vertex_edits()
                    .iter()
                    .filter(move |vertex_edit| !self.accepts(vertex_edit.delta().mag()))
                    .map(move |vertex_edit| (level.level(), face_edit.control_face(), vertex_edit))
            })
        })
    }

    /// Fails on the first edit with an unusual delta.
    pub fn check(&self, morph: &HdMorph) -> Result<()> {
        match self.unusual_deltas(morph).next() {
            Some((level, control_face, vertex_edit)) => {
                let magnitude = vertex_edit.delta().mag();
                warn!(level, control_face, magnitude, "found unusual delta");
                Err(Error::UnusualDelta {
                    level,
                    control_face,
                    magnitude,
                })
            }
            None => Ok(()),
        }
    }
}
