//! Animation records and per-tick playback.

use std::io::Read;

use tracing::{debug, trace};

use super::channel::{Behaviour, KeyFrameChannel, QuatKey, SampleMode, VectorKey};
use crate::format::{ByteReader, ANIMATION_KIND_SKELETAL};
use crate::skeleton::Skeleton;
use crate::util::{Chrono, Error, Result};

/// A skeletal animation: a clock plus one channel per animated bone.
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    id: u8,
    duration: f32,
    elapsed: Chrono,
    channels: Vec<KeyFrameChannel>,
}

impl Animation {
    pub fn new(id: u8, duration: f32, channels: Vec<KeyFrameChannel>) -> Self {
        Self { id, duration, elapsed: 0.0, channels }
    }

    /// Decode an animation record payload (the record tag is already consumed).
    ///
    /// Every channel must drive a bone of `skeleton`. Keys are taken in file
    /// order and are expected to be sorted by time already.
    pub fn decode<R: Read>(r: &mut ByteReader<R>, skeleton: &Skeleton) -> Result<Self> {
        let id = r.read_u8()?;
        let duration = r.read_f32()?;
        if !duration.is_finite() || duration < 0.0 {
            return Err(Error::InvalidDuration(duration));
        }
        let channel_count = r.read_u32()?;
        let kind = r.read_u8()?;
        if kind != ANIMATION_KIND_SKELETAL {
            return Err(Error::UnsupportedAnimationKind(kind));
        }

        let mut channels = Vec::with_capacity(channel_count.min(256) as usize);
        for _ in 0..channel_count {
            channels.push(decode_channel(r, id, skeleton)?);
        }
        debug!(id, duration, channels = channels.len(), "decoded animation");

        Ok(Self::new(id, duration, channels))
    }

    #[inline]
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Length of one loop in seconds.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Running clock in seconds. Never wrapped; wrapping happens at sample time.
    #[inline]
    pub fn elapsed(&self) -> Chrono {
        self.elapsed
    }

    #[inline]
    pub fn channels(&self) -> &[KeyFrameChannel] {
        &self.channels
    }

    /// Advance the clock by `dt` seconds and pose the skeleton.
    pub fn update(&mut self, dt: Chrono, skeleton: &mut Skeleton, mode: SampleMode) {
        self.elapsed += dt;
        self.apply(skeleton, mode);
    }

    /// Jump the clock to `t` and pose the skeleton.
    pub fn sample_at(&mut self, t: Chrono, skeleton: &mut Skeleton, mode: SampleMode) {
        self.elapsed = t;
        self.apply(skeleton, mode);
    }

    /// Reset the clock and every channel cursor.
    pub fn rewind(&mut self) {
        self.elapsed = 0.0;
        for channel in &mut self.channels {
            channel.reset_cursor();
        }
    }

    /// Write each channel's sample straight into its bone, in channel order.
    fn apply(&mut self, skeleton: &mut Skeleton, mode: SampleMode) {
        for channel in &mut self.channels {
            let local = channel.sample(self.elapsed, self.duration, mode);
            if let Some(bone) = skeleton.bone_mut(channel.bone_id()) {
                bone.set_local(local);
            }
        }
    }
}

fn decode_channel<R: Read>(
    r: &mut ByteReader<R>,
    anim_id: u8,
    skeleton: &Skeleton,
) -> Result<KeyFrameChannel> {
    let bone_id = u32::from(r.read_u8()?);
    match skeleton.bone(bone_id) {
        None => return Err(Error::UnknownBone { anim_id, bone_id }),
        Some(bone) if !bone.is_bone() => return Err(Error::NotABone { anim_id, bone_id }),
        Some(_) => {}
    }

    let pre = r.read_u8()?;
    let pre_state = Behaviour::from_u8(pre).ok_or(Error::UnknownBehaviour(pre))?;
    let post = r.read_u8()?;
    let post_state = Behaviour::from_u8(post).ok_or(Error::UnknownBehaviour(post))?;

    let position_keys = read_vector_keys(r)?;
    let count = r.read_u8()?;
    let mut rotation_keys = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let time = r.read_f32()?;
        rotation_keys.push(QuatKey { time, value: r.read_quat()? });
    }
    let scale_keys = read_vector_keys(r)?;

    trace!(
        anim_id,
        bone_id,
        positions = position_keys.len(),
        rotations = rotation_keys.len(),
        scales = scale_keys.len(),
        "animation channel"
    );

    Ok(KeyFrameChannel::new(bone_id, position_keys, rotation_keys, scale_keys)
        .with_states(pre_state, post_state))
}

fn read_vector_keys<R: Read>(r: &mut ByteReader<R>) -> Result<Vec<VectorKey>> {
    let count = r.read_u8()?;
    let mut keys = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let time = r.read_f32()?;
        keys.push(VectorKey { time, value: r.read_vec3()? });
    }
    Ok(keys)
}
