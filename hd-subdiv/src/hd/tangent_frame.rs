//! Per-corner tangent frames of a control mesh.
//!
//! HD morph deltas are authored in a local frame attached to each corner of
//! each control face. The frame is built from the two edges meeting at the
//! corner:
//!
//! ```text
//! edge1     = prev - cur
//! edge2     = cur - next
//! tangent   = normalize(edge1)
//! normal    = normalize(edge1 × edge2)
//! bitangent = tangent × normal
//! ```
//!
//! The frame is only orthonormal for planar corners. Content is authored
//! against exactly this construction, so edge choice and cross product order
//! must not change. Degenerate corners (zero length edges) yield NaN frames.
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use ultraviolet::{Mat3, Vec3};

use crate::far::{Quad, QuadTopology};
use crate::{Error, Result};

/// The basis of one control face corner.
///
/// Seen as a matrix the three vectors are the *rows*, transforming row
/// vectors from tangent to object space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TangentFrame {
    pub tangent: Vec3,
    pub normal: Vec3,
    pub bitangent: Vec3,
}

impl TangentFrame {
    /// Builds the frame of corner `cur` from its neighbors in winding order.
    pub fn from_corner(prev: Vec3, cur: Vec3, next: Vec3) -> Self {
        let edge1 = prev - cur;
        let edge2 = cur - next;

        let tangent = edge1.normalized();
        let normal = edge1.cross(edge2).normalized();
        let bitangent = tangent.cross(normal);

        Self {
            tangent,
            normal,
            bitangent,
        }
    }

    /// Transforms a tangent space vector to object space.
    #[inline]
    pub fn to_object_space(&self, v: Vec3) -> Vec3 {
        self.tangent * v.x + self.normal * v.y + self.bitangent * v.z
    }

    /// Returns the basis as a column-major matrix, i.e. with `tangent`,
    /// `normal` and `bitangent` as columns, so `mat * v` equals
    /// [`to_object_space(v)`](Self::to_object_space()).
    #[inline]
    pub fn as_mat3(&self) -> Mat3 {
        Mat3::new(self.tangent, self.normal, self.bitangent)
    }
}

/// Tangent frames of all corners of all faces of a control mesh.
///
/// Built once from a snapshot of control positions (usually the posed and
/// morphed base positions, not the bind pose) and read-only afterwards. Build
/// a new table when the control positions change.
#[derive(Clone, Debug, Default)]
pub struct TangentFrameTable {
    frames: Vec<[TangentFrame; 4]>,
}

impl TangentFrameTable {
    /// Builds the frames of every face corner of `topology` at `positions`.
    pub fn new(topology: &QuadTopology, positions: &[Vec3]) -> Result<Self> {
        if positions.len() != topology.vertex_count() {
            return Err(Error::InvalidBufferSize {
                expected: topology.vertex_count(),
                actual: positions.len(),
            });
        }

        let face_frames = |quad: &Quad| -> [TangentFrame; 4] {
            std::array::from_fn(|corner| {
                TangentFrame::from_corner(
                    positions[quad.corner(corner + 3) as usize],
                    positions[quad.corner(corner) as usize],
                    positions[quad.corner(corner + 1) as usize],
                )
            })
        };

        #[cfg(feature = "rayon")]
        let frames = topology.faces().par_iter().map(face_frames).collect();
        #[cfg(not(feature = "rayon"))]
        let frames = topology.faces().iter().map(face_frames).collect();

        Ok(Self { frames })
    }

    /// Returns the number of control faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.frames.len()
    }

    /// Returns the number of frames, four per face.
    #[inline]
    pub fn len(&self) -> usize {
        Quad::SIDE_COUNT * self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the frame of `corner` of control face `face`.
    ///
    /// # Panics
    ///
    /// If `face` or `corner` is out of range.
    #[inline]
    pub fn frame(&self, face: usize, corner: usize) -> &TangentFrame {
        &self.frames[face][corner]
    }

    /// Returns the frame of `corner` of control face `face`, if it exists.
    #[inline]
    pub fn get(&self, face: usize, corner: usize) -> Option<&TangentFrame> {
        self.frames.get(face).and_then(|frames| frames.get(corner))
    }
}
