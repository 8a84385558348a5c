//! All-quad mesh topology.
//!
//! ## Example
//! ```
//! # use hd_subdiv::far::QuadTopology;
//! // A unit cube.
//! let cube = QuadTopology::from_flat_indices(
//!     8,
//!     &[
//!         0, 1, 3, 2, //
//!         2, 3, 5, 4, //
//!         4, 5, 7, 6, //
//!         6, 7, 1, 0, //
//!         1, 7, 5, 3, //
//!         6, 0, 2, 4,
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(cube.face_count(), 6);
//! assert_eq!(cube.face(4).unwrap().corner(5), 7);
//! ```
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A quadrilateral face as four vertex indices in winding order.
#[repr(C)]
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    bytemuck::Pod,
    bytemuck::Zeroable,
    derive_more::From,
    derive_more::Into,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quad(pub [u32; 4]);

impl Quad {
    /// The number of corners (and sides) of a quad.
    pub const SIDE_COUNT: usize = 4;

    /// Returns the vertex at corner `index`.
    ///
    /// The index wraps around, so `corner(c + 3)` is the corner preceding `c`
    /// and `corner(c + 1)` the one following it.
    #[inline]
    pub fn corner(&self, index: usize) -> u32 {
        self.0[index % Self::SIDE_COUNT]
    }

    /// Returns `true` if `vertex` is one of the corners.
    #[inline]
    pub fn contains(&self, vertex: u32) -> bool {
        self.0.contains(&vertex)
    }
}

/// A quad mesh: a vertex count and the faces indexing into it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuadTopology {
    vertex_count: usize,
    faces: Vec<Quad>,
}

impl QuadTopology {
    /// Creates a topology from faces.
    ///
    /// With the `topology_validation` feature every face index is checked to
    /// be less than `vertex_count`.
    pub fn new(vertex_count: usize, faces: Vec<Quad>) -> Result<Self> {
        #[cfg(feature = "topology_validation")]
        for (face_index, face) in faces.iter().enumerate() {
            if let Some(vertex) = face.0.iter().find(|&&v| vertex_count <= v as usize) {
                return Err(Error::InvalidTopology(format!(
                    "Face[{}] vertex index {} is out of range (should be < {}).",
                    face_index, vertex, vertex_count
                )));
            }
        }

        Ok(Self {
            vertex_count,
            faces,
        })
    }

    /// Creates a topology from a flat index buffer with four indices per
    /// face.
    pub fn from_flat_indices(vertex_count: usize, indices: &[u32]) -> Result<Self> {
        let faces: &[Quad] = bytemuck::try_cast_slice(indices).map_err(|_| {
            Error::InvalidTopology(format!(
                "Index buffer length {} is not a multiple of 4.",
                indices.len()
            ))
        })?;
        Self::new(vertex_count, faces.to_vec())
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Returns the number of faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns all faces.
    #[inline]
    pub fn faces(&self) -> &[Quad] {
        &self.faces
    }

    /// Returns the face at `index`.
    #[inline]
    pub fn face(&self, index: usize) -> Option<&Quad> {
        self.faces.get(index)
    }

    /// Returns the faces as a flat index buffer.
    #[inline]
    pub fn flat_indices(&self) -> &[u32] {
        bytemuck::cast_slice(&self.faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_wraps_around() {
        let quad = Quad([10, 11, 12, 13]);
        assert_eq!(quad.corner(0), 10);
        assert_eq!(quad.corner(3), 13);
        assert_eq!(quad.corner(4), 10);
        assert_eq!(quad.corner(6), 12);
    }

    #[test]
    fn flat_indices_round_trip() {
        let indices = [0, 1, 2, 3, 1, 4, 5, 2];
        let topology = QuadTopology::from_flat_indices(6, &indices).unwrap();
        assert_eq!(topology.face_count(), 2);
        assert_eq!(topology.face(1), Some(&Quad([1, 4, 5, 2])));
        assert_eq!(topology.flat_indices(), &indices);
    }

    #[test]
    fn ragged_index_buffer_is_rejected() {
        assert!(matches!(
            QuadTopology::from_flat_indices(4, &[0, 1, 2]),
            Err(Error::InvalidTopology(_))
        ));
    }

    #[cfg(feature = "topology_validation")]
    #[test]
    fn out_of_range_vertex_is_rejected() {
        assert!(matches!(
            QuadTopology::new(3, vec![Quad([0, 1, 2, 3])]),
            Err(Error::InvalidTopology(_))
        ));
    }
}
