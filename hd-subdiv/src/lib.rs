//#![warn(missing_docs)]
//! # HD Morphs on Subdivision Surfaces
//!
//! Applies sparse, per-level sculpted vertex edits ("HD morphs") to a quad
//! mesh while it is uniformly refined with Catmull-Clark subdivision.
//!
//! An HD morph stores a handful of edits per subdivision level instead of a
//! dense delta per refined vertex. Each edit addresses one refined vertex by a
//! [packed path](hd::PackedPath) of quad corners rooted at a control face and
//! carries a delta expressed in the [tangent frame](hd::TangentFrameTable) of
//! that control face's corner.
//!
//! The crate is split into two modules:
//! * [`far`] – Quad topology and a uniform refinement engine that numbers
//!   child faces the way HD morph paths expect. Any other engine can be
//!   plugged in through the [`Refiner`](far::Refiner) trait.
//! * [`hd`] – The HD morph model, tangent frames, the
//!   [`HdMorphApplier`](hd::HdMorphApplier), the level loop, diagnostics and
//!   `.dhdm` (de)serialization.
//!
//! ## Example
//!
//! ```
//! use hd_subdiv::far::{QuadTopology, Refinement, RefinementOptions};
//! use hd_subdiv::hd::{
//!     refine_with_hd_morphs, FaceEdit, HdMorph, HdMorphApplier, Level, VertexEdit,
//!     WeightedHdMorph,
//! };
//! use ultraviolet::Vec3;
//!
//! # fn main() -> hd_subdiv::Result<()> {
//! // A single quad in the XZ plane.
//! let topology = QuadTopology::new(4, vec![[0, 1, 2, 3].into()])?;
//! let positions = vec![
//!     Vec3::new(0.0, 0.0, 0.0),
//!     Vec3::new(1.0, 0.0, 0.0),
//!     Vec3::new(1.0, 0.0, 1.0),
//!     Vec3::new(0.0, 0.0, 1.0),
//! ];
//!
//! // Push the center of the quad along the normal of corner 0.
//! let edit = VertexEdit::new(&[0, 2], Vec3::new(0.0, 0.5, 0.0))?;
//! let morph = HdMorph::new(vec![Level::new(1, 1, vec![FaceEdit::new(0, vec![edit])])])?;
//! morph.validate(topology.face_count())?;
//!
//! let refinement = Refinement::new(
//!     &topology,
//!     RefinementOptions {
//!         max_level: morph.max_level(),
//!         ..Default::default()
//!     },
//! )?;
//! let applier = HdMorphApplier::new(&topology, &positions)?;
//!
//! let (refined_topology, refined) = refine_with_hd_morphs(
//!     &refinement,
//!     &applier,
//!     &[WeightedHdMorph::new(&morph, 1.0)],
//!     &positions,
//!     0,
//! )?;
//! assert_eq!(refined_topology.face_count(), 4);
//! assert_eq!(refined.len(), 9);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
#![doc = document_features::document_features!()]

pub mod far;
pub mod hd;

#[cfg(feature = "tri_mesh_buffers")]
pub mod tri_mesh_buffers;

mod error;
pub use error::{Error, Result};

/// A vertex or face index in a [`QuadTopology`](far::QuadTopology).
///
/// # Examples
///
/// ```
/// use hd_subdiv::Index;
///
/// let idx = Index::from(42u32);
/// assert_eq!(idx.0, 42);
///
/// let value: u32 = idx.into();
/// assert_eq!(value, 42);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
)]
#[repr(transparent)]
pub struct Index(pub u32);

impl From<usize> for Index {
    fn from(value: usize) -> Self {
        Index(value as u32)
    }
}

impl From<Index> for usize {
    fn from(index: Index) -> Self {
        index.0 as usize
    }
}
