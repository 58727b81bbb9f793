//! Model aggregate: whole-file decode and per-frame playback.
//!
//! ```ignore
//! use fdmd::Model;
//!
//! let mut model = Model::open("character.fdmd")?;
//! model.update(1.0 / 60.0);
//! upload_joints(model.joints());
//! ```

mod config;
mod record;

pub use config::*;
pub use record::*;

use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, debug_span, warn};

use crate::anim::{Animation, SampleMode};
use crate::format::{ByteReader, ByteWriter};
use crate::mesh::{MeshData, MeshSink};
use crate::skeleton::Skeleton;
use crate::util::{Chrono, Error, Mat4, Result};

/// A decoded FDMD model.
#[derive(Clone, Debug, Default)]
pub struct Model {
    meshes: Vec<MeshData>,
    /// Mesh count from the header, kept even when meshes went to a sink.
    mesh_count: u8,
    skeleton: Option<Skeleton>,
    /// Slot per declared animation, indexed by animation id.
    animations: Vec<Option<Animation>>,
    config: PlaybackConfig,
}

impl Model {
    /// Decode a model file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening model");
        let mut reader = ByteReader::open(path)?;
        Self::decode(&mut reader)
    }

    /// Decode a model held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::decode(&mut ByteReader::from_bytes(bytes))
    }

    /// Decode a model, keeping its meshes in [`meshes`](Self::meshes).
    pub fn decode<R: Read>(reader: &mut ByteReader<R>) -> Result<Self> {
        let mut meshes = Vec::new();
        let mut model = Self::decode_with_sink(reader, &mut meshes)?;
        model.meshes = meshes;
        Ok(model)
    }

    /// Decode a model, forwarding each mesh to `sink` instead of keeping it.
    ///
    /// Either the whole file decodes or an error is returned; no partial
    /// model escapes.
    pub fn decode_with_sink<R: Read, S: MeshSink + ?Sized>(
        reader: &mut ByteReader<R>,
        sink: &mut S,
    ) -> Result<Self> {
        let _span = debug_span!("decode_model").entered();

        let mesh_count = reader.read_u8()?;
        let anim_count = reader.read_u8()?;
        debug!(mesh_count, anim_count, "model header");

        let mut skeleton: Option<Skeleton> = None;
        let mut animations: Vec<Option<Animation>> = vec![None; anim_count as usize];
        let mut meshes_seen = 0u8;

        loop {
            match Record::read(reader, skeleton.as_ref())? {
                Record::End => break,
                Record::Mesh(mesh) => {
                    if meshes_seen == mesh_count {
                        return Err(Error::TooManyMeshes(mesh_count));
                    }
                    meshes_seen += 1;
                    debug!(mesh_id = mesh.mesh_id, vertices = mesh.vertex_count, "decoded mesh");
                    sink.upload(mesh);
                }
                Record::Skeleton(decoded) => {
                    if skeleton.is_some() {
                        return Err(Error::DuplicateSkeleton);
                    }
                    debug!(
                        bones = decoded.bone_count(),
                        nodes = decoded.node_count(),
                        "decoded skeleton"
                    );
                    skeleton = Some(decoded);
                }
                Record::Animation(anim) => {
                    let id = anim.id();
                    let slot = animations
                        .get_mut(id as usize)
                        .ok_or(Error::AnimationIdOutOfRange { id, count: anim_count })?;
                    if slot.is_some() {
                        return Err(Error::invalid(format!("duplicate animation id {id}")));
                    }
                    *slot = Some(anim);
                }
            }
        }

        if meshes_seen < mesh_count {
            warn!(declared = mesh_count, found = meshes_seen, "fewer meshes than declared");
        }

        Ok(Self {
            meshes: Vec::new(),
            mesh_count,
            skeleton,
            animations,
            config: PlaybackConfig::default(),
        })
    }

    /// Serialize the model back to FDMD.
    pub fn encode<W: Write>(&self, writer: W) -> Result<()> {
        let anim_count = u8::try_from(self.animations.len())
            .map_err(|_| Error::invalid("more than 255 animations"))?;

        let mut w = ByteWriter::new(writer);
        w.write_header(self.mesh_count, anim_count)?;
        for mesh in &self.meshes {
            w.write_mesh(mesh)?;
        }
        if let Some(skeleton) = &self.skeleton {
            w.write_skeleton(skeleton)?;
        }
        for anim in self.animations() {
            w.write_animation(anim)?;
        }
        w.write_end()?;
        w.flush()
    }

    /// Replace the playback configuration.
    pub fn with_config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    #[inline]
    pub fn set_config(&mut self, config: PlaybackConfig) {
        self.config = config;
    }

    /// Mesh count declared by the header.
    #[inline]
    pub fn declared_mesh_count(&self) -> u8 {
        self.mesh_count
    }

    /// Meshes kept by [`decode`](Self::decode).
    #[inline]
    pub fn meshes(&self) -> &[MeshData] {
        &self.meshes
    }

    #[inline]
    pub fn skeleton(&self) -> Option<&Skeleton> {
        self.skeleton.as_ref()
    }

    #[inline]
    pub fn skeleton_mut(&mut self) -> Option<&mut Skeleton> {
        self.skeleton.as_mut()
    }

    /// Number of animation slots declared by the header.
    #[inline]
    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    /// Decoded animations in id order.
    pub fn animations(&self) -> impl Iterator<Item = &Animation> {
        self.animations.iter().flatten()
    }

    pub fn animation(&self, id: u8) -> Option<&Animation> {
        self.animations.get(id as usize)?.as_ref()
    }

    pub fn animation_mut(&mut self, id: u8) -> Option<&mut Animation> {
        self.animations.get_mut(id as usize)?.as_mut()
    }

    /// Make `id` the animation advanced by [`update`](Self::update) and
    /// restart it from time zero.
    pub fn set_active_animation(&mut self, id: u8) -> Result<()> {
        let count = u8::try_from(self.animations.len()).unwrap_or(u8::MAX);
        let anim = self
            .animation_mut(id)
            .ok_or(Error::AnimationIdOutOfRange { id, count })?;
        anim.rewind();
        self.config.active_animation = id;
        Ok(())
    }

    /// Advance the active animation by `dt` seconds and refresh the joints.
    ///
    /// A model without a skeleton or without the active animation is left
    /// untouched apart from the pose reset.
    pub fn update(&mut self, dt: Chrono) {
        self.drive(|anim, skeleton, mode| anim.update(dt, skeleton, mode));
    }

    /// Pose the model at absolute time `t` and refresh the joints.
    pub fn seek(&mut self, t: Chrono) {
        self.drive(|anim, skeleton, mode| anim.sample_at(t, skeleton, mode));
    }

    fn drive(
        &mut self,
        step: impl FnOnce(&mut Animation, &mut Skeleton, SampleMode),
    ) {
        let Some(skeleton) = self.skeleton.as_mut() else {
            return;
        };
        let mode = self.config.sample_mode;
        let anim = self
            .animations
            .get_mut(self.config.active_animation as usize)
            .and_then(Option::as_mut);

        match self.config.pose_order {
            PoseOrder::ResetThenSample => {
                skeleton.reset_all_joints();
                if let Some(anim) = anim {
                    step(anim, skeleton, mode);
                }
            }
            PoseOrder::SampleThenReset => {
                if let Some(anim) = anim {
                    step(anim, skeleton, mode);
                }
                skeleton.reset_all_joints();
            }
        }
        skeleton.update_joints();
    }

    /// Skinning matrices for upload, empty without a skeleton.
    pub fn joints(&self) -> &[Mat4] {
        self.skeleton.as_ref().map(Skeleton::joints).unwrap_or_default()
    }
}
