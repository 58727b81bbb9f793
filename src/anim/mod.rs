//! Skeletal animation: decoding and keyframe sampling.
//!
//! An [`Animation`] owns its [`KeyFrameChannel`]s. Channels refer to bones by
//! id only, and the skeleton is passed in whenever a pose is written.

mod animation;
mod channel;

pub use animation::*;
pub use channel::*;
