//! Error types for the hd-subdiv crate.

use thiserror::Error;

/// Main error type for hd-subdiv operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A path element is not a quad corner selector.
    #[error("Path element {element} at position {position} is out of range (should be < 4)")]
    InvalidPathElement { position: usize, element: u8 },

    /// A path does not fit into the 2-bit-per-level budget of a packed path.
    #[error("Path of length {len} exceeds the maximum packed path length {max}")]
    PathTooLong { len: usize, max: usize },

    /// A vertex edit addresses no vertex.
    #[error("Vertex edit path is empty")]
    EmptyPath,

    /// A stored path is empty or longer than a packed path can hold.
    #[error("Vertex edit on control face {control_face} at level {level} has a path of length {len}")]
    MalformedPath {
        level: usize,
        control_face: u32,
        len: usize,
    },

    /// Levels of an HD morph are not numbered `1, 2, 3, ...`.
    #[error("Unexpected level index at position {position}: expected {expected}, got {actual}")]
    UnexpectedLevelIndex {
        position: usize,
        expected: usize,
        actual: usize,
    },

    /// An HD morph was authored against a figure with a different face count.
    #[error("Level {level} expects {expected} control faces but the figure has {actual}")]
    ControlFaceCountMismatch {
        level: usize,
        expected: usize,
        actual: usize,
    },

    /// A delta magnitude is outside the configured sanity range.
    #[error(
        "Unusual delta magnitude {magnitude} on control face {control_face} at level {level}"
    )]
    UnusualDelta {
        level: usize,
        control_face: u32,
        magnitude: f32,
    },

    /// Invalid topology input.
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// Refined faces are not numbered the way HD morph paths address them.
    #[error(
        "Child face {child_face} does not share corner {corner} (vertex {expected}) with parent \
         face {face} at level {level}, found vertex {actual}"
    )]
    TopologyOrdering {
        level: usize,
        face: usize,
        child_face: usize,
        corner: usize,
        expected: u32,
        actual: u32,
    },

    /// A refinement level was requested that was never refined.
    #[error("Refinement level {level} out of range (max: {max})")]
    LevelOutOfRange { level: usize, max: usize },

    /// Invalid buffer size.
    #[error("Invalid buffer size: expected {expected}, got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },

    /// Malformed `.dhdm` data.
    #[error("Invalid HD morph file: {0}")]
    InvalidFormat(String),

    /// IO error for file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
