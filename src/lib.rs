//! # FDMD
//!
//! Reader for the FDMD binary model format and skeletal animation playback.
//!
//! An FDMD file is a big-endian stream of tagged records: meshes, one
//! skeleton and any number of skeletal animations. Decoding produces a
//! [`Model`]; advancing it by a frame delta samples the active animation into
//! the bone transforms and refreshes the skinning matrices.
//!
//! ## Modules
//!
//! - [`util`] - Errors and math helpers
//! - [`format`] - Low-level byte streams and tag tables
//! - [`mesh`] - Mesh records and the upload seam
//! - [`skeleton`] - Bone hierarchy and joint propagation
//! - [`anim`] - Animations, channels and keyframe sampling
//! - [`model`] - Whole-file decode and per-frame playback
//!
//! ## Example
//!
//! ```ignore
//! use fdmd::Model;
//!
//! let mut model = Model::open("walk.fdmd")?;
//! loop {
//!     model.update(dt);
//!     renderer.upload_joints(model.joints());
//! }
//! ```

pub mod util;
pub mod format;
pub mod mesh;
pub mod skeleton;
pub mod anim;
pub mod model;

// Re-export commonly used types
pub use util::{Error, Result};
pub use model::{Model, PlaybackConfig, PoseOrder};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result, Mat4, Quat, Vec3};
    pub use crate::format::{ByteReader, ByteWriter};
    pub use crate::mesh::{MeshData, MeshSink, VertexAttribute};
    pub use crate::skeleton::{Bone, Skeleton};
    pub use crate::anim::{Animation, KeyFrameChannel, SampleMode};
    pub use crate::model::{Model, PlaybackConfig, PoseOrder, Record};
}
