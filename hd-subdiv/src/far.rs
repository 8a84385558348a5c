//! Quad topology and uniform refinement.
//!
//! HD morph edits address refined vertices relative to control faces, so the
//! refinement engine has to number child faces in a very specific way. See
//! [`assert_topology_assumptions()`] for the exact contract.
pub mod quad_topology;
pub mod refinement;
pub mod stencil_table;

pub use quad_topology::{Quad, QuadTopology};
pub use refinement::{
    assert_topology_assumptions, check_refiner_conformance, BoundaryInterpolation, Refinement,
    RefinementOptions, Refiner,
};
pub use stencil_table::{Primvar, Stencil, StencilTable};
