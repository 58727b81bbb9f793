//! Error types for the FDMD library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for FDMD decoding.
///
/// Every error is raised while decoding. Sampling a decoded model never fails.
#[derive(Error, Debug)]
pub enum Error {
    /// Byte source could not be opened
    #[error("Cannot open {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stream ended before a record was complete
    #[error("Unexpected end of stream at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: u64, needed: usize },

    /// Unknown top-level record tag
    #[error("Unknown record tag {tag} at offset {offset}")]
    UnknownRecordTag { tag: u8, offset: u64 },

    /// Unknown vertex attribute tag inside a mesh record
    #[error("Unknown vertex attribute tag {tag} at offset {offset}")]
    UnknownVertexAttribute { tag: u8, offset: u64 },

    /// Unknown skeleton node kind
    #[error("Unknown skeleton node kind {0}")]
    UnknownNodeKind(u8),

    /// Unknown pre/post animation behaviour tag
    #[error("Unknown animation behaviour {0}")]
    UnknownBehaviour(u8),

    /// Animation kind other than skeletal
    #[error("Unsupported animation kind {0}")]
    UnsupportedAnimationKind(u8),

    /// Animation duration is negative or not finite
    #[error("Invalid animation duration: {0}")]
    InvalidDuration(f32),

    /// Node id outside `0..node_count`
    #[error("Bone id {id} out of range (node count: {count})")]
    BoneIdOutOfRange { id: u32, count: u32 },

    /// Two nodes share the same id
    #[error("Duplicate bone id {0}")]
    DuplicateBone(u32),

    /// Skeleton tree did not cover every declared node
    #[error("Skeleton declares {expected} nodes but only {found} were decoded")]
    MissingBones { expected: u32, found: u32 },

    /// Channel references a bone the skeleton does not have
    #[error("Animation {anim_id} references unknown bone {bone_id}")]
    UnknownBone { anim_id: u8, bone_id: u32 },

    /// Channel references a pivot node instead of a bone
    #[error("Animation {anim_id} references node {bone_id}, which is not a bone")]
    NotABone { anim_id: u8, bone_id: u32 },

    /// Animation id does not fit the declared animation count
    #[error("Animation id {id} out of bounds (count: {count})")]
    AnimationIdOutOfRange { id: u8, count: u8 },

    /// Animation record found before any skeleton record
    #[error("Animation {0} appears before the skeleton record")]
    AnimationWithoutSkeleton(u8),

    /// Second skeleton record in one file
    #[error("Model contains more than one skeleton record")]
    DuplicateSkeleton,

    /// More mesh records than the header announced
    #[error("Mesh record exceeds declared mesh count {0}")]
    TooManyMeshes(u8),

    /// Invalid data structure
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// Playback configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Whether this error came from running out of bytes.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::UnexpectedEof { .. })
    }
}

/// Result type alias for FDMD operations.
pub type Result<T> = std::result::Result<T, Error>;
