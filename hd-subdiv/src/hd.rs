//! HD morphs: sparse, per-level sculpted vertex edits.
//!
//! An [`HdMorph`] holds one [`Level`] per subdivision depth. Each level lists
//! [`FaceEdit`]s keyed by control face, which in turn list [`VertexEdit`]s. A
//! vertex edit addresses one refined vertex through a [`PackedPath`] of quad
//! corners and moves it by a delta given in the [`TangentFrame`] of the control
//! face corner its path starts at.
//!
//! Edits have to be applied level by level, *after* smoothing each level and
//! *before* refining the next one:
//!
//! 1. Refine level `L - 1` positions (which already carry the edits of level
//!    `L - 1`) to level `L`.
//! 2. [`apply()`](HdMorphApplier::apply()) the level `L` edits of every
//!    active morph. Morphs commute at this step.
//! 3. Continue with level `L + 1`.
//!
//! [`refine_with_hd_morphs()`] runs exactly this loop.
pub mod applier;
pub mod dhdm;
pub mod morph;
pub mod packed_path;
pub mod tangent_frame;
pub mod validation;

pub use applier::{apply_hd_morph, refine_with_hd_morphs, HdMorphApplier, WeightedHdMorph};
pub use morph::{FaceEdit, HdMorph, HdMorphSummary, Level, VertexEdit};
pub use packed_path::PackedPath;
pub use tangent_frame::{TangentFrame, TangentFrameTable};
pub use validation::DeltaSanityCheck;
