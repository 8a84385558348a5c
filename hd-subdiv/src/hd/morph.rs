//! The HD morph data model.
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use ultraviolet::Vec3;

use super::PackedPath;
use crate::{Error, Result};

/// Moves one refined vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VertexEdit {
    packed_path: PackedPath,
    delta: Vec3,
}

impl VertexEdit {
    /// Creates an edit of the vertex reached by `path`.
    ///
    /// `delta` is expressed in the tangent frame of the control face corner
    /// `path[0]`, no matter how deep the path goes.
    pub fn new(path: &[u8], delta: Vec3) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::EmptyPath);
        }
        Ok(Self {
            packed_path: PackedPath::new(path)?,
            delta,
        })
    }

    /// Creates an edit from an already packed path. The path is not checked.
    #[inline]
    pub fn from_packed(packed_path: PackedPath, delta: Vec3) -> Self {
        Self { packed_path, delta }
    }

    #[inline]
    pub fn packed_path(&self) -> PackedPath {
        self.packed_path
    }

    #[inline]
    pub fn delta(&self) -> Vec3 {
        self.delta
    }

    #[inline]
    pub fn path_len(&self) -> usize {
        self.packed_path.len()
    }

    #[inline]
    pub fn path_element(&self, index: usize) -> u8 {
        self.packed_path.element(index)
    }

    /// Iterates over the path elements.
    #[inline]
    pub fn path(&self) -> impl ExactSizeIterator<Item = u8> {
        self.packed_path.iter()
    }
}

/// The edits of one control face at one level.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FaceEdit {
    control_face: u32,
    vertex_edits: Vec<VertexEdit>,
}

impl FaceEdit {
    /// `control_face` indexes the faces of the control (level 0) topology.
    pub fn new(control_face: u32, vertex_edits: Vec<VertexEdit>) -> Self {
        Self {
            control_face,
            vertex_edits,
        }
    }

    #[inline]
    pub fn control_face(&self) -> u32 {
        self.control_face
    }

    /// Edits in no particular order. Edits of the same vertex add up.
    #[inline]
    pub fn vertex_edits(&self) -> &[VertexEdit] {
        &self.vertex_edits
    }
}

/// All edits introduced at one subdivision level.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Level {
    level: usize,
    control_face_count: usize,
    face_edits: Vec<FaceEdit>,
}

impl Level {
    /// Creates a level.
    ///
    /// * `level` - The 1-based subdivision level.
    /// * `control_face_count` - The face count of the whole control mesh the
    ///   morph was authored for. Not the number of `face_edits`.
    /// * `face_edits` - Edits of the control faces that have any at this
    ///   level.
    pub fn new(level: usize, control_face_count: usize, face_edits: Vec<FaceEdit>) -> Self {
        Self {
            level,
            control_face_count,
            face_edits,
        }
    }

    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    #[inline]
    pub fn control_face_count(&self) -> usize {
        self.control_face_count
    }

    #[inline]
    pub fn face_edits(&self) -> &[FaceEdit] {
        &self.face_edits
    }

    /// Returns the number of vertex edits over all face edits.
    pub fn vertex_edit_count(&self) -> usize {
        self.face_edits
            .iter()
            .map(|face_edit| face_edit.vertex_edits.len())
            .sum()
    }
}

/// A sculpted morph stored as sparse per-level vertex edits.
///
/// Levels are numbered `1, 2, 3, ...` without gaps; this is checked on
/// construction. An `HdMorph` is immutable once built.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "Vec<Level>", into = "Vec<Level>")
)]
pub struct HdMorph {
    levels: Vec<Level>,
}

impl HdMorph {
    /// Creates a morph.
    ///
    /// Fails with [`Error::UnexpectedLevelIndex`] unless `levels[i].level() ==
    /// i + 1` for all `i`.
    pub fn new(levels: Vec<Level>) -> Result<Self> {
        if let Some((position, level)) = levels
            .iter()
            .enumerate()
            .find(|(position, level)| level.level != position + 1)
        {
            return Err(Error::UnexpectedLevelIndex {
                position,
                expected: position + 1,
                actual: level.level,
            });
        }
        Ok(Self { levels })
    }

    #[inline]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Returns the edits of `level`, if the morph has any at that depth.
    #[inline]
    pub fn level(&self, level: usize) -> Option<&Level> {
        level
            .checked_sub(1)
            .and_then(|index| self.levels.get(index))
    }

    /// Returns the deepest level, `0` for a morph without levels.
    #[inline]
    pub fn max_level(&self) -> usize {
        self.levels.last().map_or(0, |level| level.level)
    }

    /// Returns the number of vertex edits over all levels.
    pub fn vertex_edit_count(&self) -> usize {
        self.levels.iter().map(Level::vertex_edit_count).sum()
    }

    /// Checks that every level was authored for a control mesh with
    /// `figure_control_face_count` faces.
    pub fn validate(&self, figure_control_face_count: usize) -> Result<()> {
        match self
            .levels
            .iter()
            .find(|level| level.control_face_count != figure_control_face_count)
        {
            Some(level) => Err(Error::ControlFaceCountMismatch {
                level: level.level,
                expected: level.control_face_count,
                actual: figure_control_face_count,
            }),
            None => Ok(()),
        }
    }

    /// Checks that every vertex edit has a path of `1..=`[`PackedPath::MAX_LEN`]
    /// elements.
    pub fn validate_paths(&self) -> Result<()> {
        for level in &self.levels {
            for face_edit in &level.face_edits {
                for vertex_edit in &face_edit.vertex_edits {
                    let len = vertex_edit.path_len();
                    if 0 == len || PackedPath::MAX_LEN < len {
                        return Err(Error::MalformedPath {
                            level: level.level,
                            control_face: face_edit.control_face,
                            len,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns a printable overview listing at most `max_face_edits` face
    /// edits per level.
    pub fn summary(&self, max_face_edits: usize) -> HdMorphSummary<'_> {
        HdMorphSummary {
            morph: self,
            max_face_edits,
        }
    }
}

impl TryFrom<Vec<Level>> for HdMorph {
    type Error = Error;

    fn try_from(levels: Vec<Level>) -> Result<Self> {
        Self::new(levels)
    }
}

impl From<HdMorph> for Vec<Level> {
    fn from(morph: HdMorph) -> Self {
        morph.levels
    }
}

/// See [`HdMorph::summary()`].
pub struct HdMorphSummary<'a> {
    morph: &'a HdMorph,
    max_face_edits: usize,
}

impl fmt::Display for HdMorphSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in &self.morph.levels {
            writeln!(f, "level {}:", level.level)?;
            for (index, face_edit) in level
                .face_edits
                .iter()
                .enumerate()
                .take(self.max_face_edits)
            {
                writeln!(
                    f,
                    "  face edit {} of {}:",
                    index,
                    level.face_edits.len()
                )?;
                writeln!(f, "    control face = {}", face_edit.control_face)?;
                for vertex_edit in &face_edit.vertex_edits {
                    let delta = vertex_edit.delta;
                    writeln!(
                        f,
                        "    {}: {} ({}, {}, {})",
                        vertex_edit.packed_path,
                        delta.mag(),
                        delta.x,
                        delta.y,
                        delta.z
                    )?;
                }
            }
        }
        Ok(())
    }
}
