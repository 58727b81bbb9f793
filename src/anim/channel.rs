//! Keyframe channels and the per-channel sampler.
//!
//! A channel holds three independent, time-sorted key tracks (position,
//! rotation, scale) and a cursor remembering, per track, the key selected by
//! the previous sample. Forward playback therefore costs O(1) amortized per
//! frame instead of a search from the start of the track.

use serde::{Deserialize, Serialize};

use crate::util::{compose_trs, wrap_time, Chrono, Mat4, Quat, Vec3};

/// How a channel behaves outside its key range.
///
/// Decoded and preserved, but not consulted by the sampler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Behaviour {
    /// Snap back to the bind pose.
    #[default]
    ToBindPose = 0,
    /// Hold the nearest key.
    Constant = 1,
    /// Extrapolate linearly from the two nearest keys.
    Linear = 2,
    /// Repeat the track.
    Repeat = 3,
}

impl Behaviour {
    /// Convert a raw behaviour byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::ToBindPose),
            1 => Some(Self::Constant),
            2 => Some(Self::Linear),
            3 => Some(Self::Repeat),
            _ => None,
        }
    }
}

/// How key values are turned into a pose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleMode {
    /// Use the first key at or after the sample time as is.
    #[default]
    Stepped,
    /// Blend between the previous key and the selected key: lerp for
    /// position and scale, slerp for rotation.
    Linear,
}

/// Position or scale key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VectorKey {
    pub time: f32,
    pub value: Vec3,
}

/// Rotation key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuatKey {
    pub time: f32,
    pub value: Quat,
}

/// Anything placed on a track timeline.
pub trait Keyed {
    fn time(&self) -> f32;
}

impl Keyed for VectorKey {
    #[inline]
    fn time(&self) -> f32 {
        self.time
    }
}

impl Keyed for QuatKey {
    #[inline]
    fn time(&self) -> f32 {
        self.time
    }
}

/// Cursor: index of the selected ("next") key on each track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyFrame {
    pub next_position: usize,
    pub next_rotation: usize,
    pub next_scale: usize,
}

/// One bone's animated tracks.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyFrameChannel {
    bone_id: u32,
    pub pre_state: Behaviour,
    pub post_state: Behaviour,
    position_keys: Vec<VectorKey>,
    rotation_keys: Vec<QuatKey>,
    scale_keys: Vec<VectorKey>,
    cursor: KeyFrame,
}

impl KeyFrameChannel {
    /// Create a channel driving `bone_id`. Each track must be sorted by time;
    /// an empty track means the component is not animated.
    pub fn new(
        bone_id: u32,
        position_keys: Vec<VectorKey>,
        rotation_keys: Vec<QuatKey>,
        scale_keys: Vec<VectorKey>,
    ) -> Self {
        Self {
            bone_id,
            pre_state: Behaviour::default(),
            post_state: Behaviour::default(),
            position_keys,
            rotation_keys,
            scale_keys,
            cursor: KeyFrame::default(),
        }
    }

    /// Set the out-of-range behaviour tags.
    pub fn with_states(mut self, pre_state: Behaviour, post_state: Behaviour) -> Self {
        self.pre_state = pre_state;
        self.post_state = post_state;
        self
    }

    /// Id of the bone this channel drives.
    #[inline]
    pub fn bone_id(&self) -> u32 {
        self.bone_id
    }

    #[inline]
    pub fn position_keys(&self) -> &[VectorKey] {
        &self.position_keys
    }

    #[inline]
    pub fn rotation_keys(&self) -> &[QuatKey] {
        &self.rotation_keys
    }

    #[inline]
    pub fn scale_keys(&self) -> &[VectorKey] {
        &self.scale_keys
    }

    /// Current cursor.
    #[inline]
    pub fn cursor(&self) -> KeyFrame {
        self.cursor
    }

    /// Move the cursor back to the first key of every track.
    #[inline]
    pub fn reset_cursor(&mut self) {
        self.cursor = KeyFrame::default();
    }

    /// Advance the cursor to time `t`, already wrapped into the animation.
    fn refresh(&mut self, t: Chrono) {
        self.cursor.next_position = advance(&self.position_keys, self.cursor.next_position, t);
        self.cursor.next_rotation = advance(&self.rotation_keys, self.cursor.next_rotation, t);
        self.cursor.next_scale = advance(&self.scale_keys, self.cursor.next_scale, t);
    }

    /// Sample the channel at time `t` into a local transform.
    ///
    /// `t` is wrapped into `[0, duration)` first, so any whole number of loops
    /// added to `t` selects the same keys.
    pub fn sample(&mut self, t: Chrono, duration: f32, mode: SampleMode) -> Mat4 {
        let period = Chrono::from(duration);
        let t = wrap_time(t, period);
        self.refresh(t);

        let (position, rotation, scale) = match mode {
            SampleMode::Stepped => (
                self.position_keys.get(self.cursor.next_position).map(|k| k.value),
                self.rotation_keys.get(self.cursor.next_rotation).map(|k| k.value),
                self.scale_keys.get(self.cursor.next_scale).map(|k| k.value),
            ),
            SampleMode::Linear => (
                blend(&self.position_keys, self.cursor.next_position, t, period)
                    .map(|(a, b, f)| a.value.lerp(b.value, f)),
                blend(&self.rotation_keys, self.cursor.next_rotation, t, period)
                    .map(|(a, b, f)| a.value.slerp(b.value, f)),
                blend(&self.scale_keys, self.cursor.next_scale, t, period)
                    .map(|(a, b, f)| a.value.lerp(b.value, f)),
            ),
        };

        compose_trs(
            position.unwrap_or(Vec3::ZERO),
            rotation.unwrap_or(Quat::IDENTITY),
            scale.unwrap_or(Vec3::ONE),
        )
    }
}

/// Index of the first key whose time is at or after `t`, or 0 when every key
/// is earlier (the first key of the next loop).
///
/// Scans forward from `cursor`. If `t` moved back past the key before the
/// cursor (a loop wrap or a seek) the scan restarts at 0. The scan visits each
/// key at most once, so unsorted data yields a wrong key but never hangs.
fn advance<K: Keyed>(keys: &[K], cursor: usize, t: Chrono) -> usize {
    if keys.is_empty() {
        return 0;
    }

    let mut i = cursor.min(keys.len() - 1);
    if i > 0 && Chrono::from(keys[i - 1].time()) >= t {
        i = 0;
    }
    while i < keys.len() && Chrono::from(keys[i].time()) < t {
        i += 1;
    }
    if i == keys.len() { 0 } else { i }
}

/// Previous key, selected key and blend factor for linear sampling.
fn blend<K: Keyed>(keys: &[K], next: usize, t: Chrono, period: Chrono) -> Option<(&K, &K, f32)> {
    let to = keys.get(next)?;
    if keys.len() == 1 {
        return Some((to, to, 1.0));
    }

    let prev = if next > 0 { next - 1 } else { keys.len() - 1 };
    let from = &keys[prev];
    let mut t0 = Chrono::from(from.time());
    let mut t1 = Chrono::from(to.time());
    if next == 0 {
        // Blending across the loop seam.
        if t > Chrono::from(keys[keys.len() - 1].time()) {
            t1 += period;
        } else {
            t0 -= period;
        }
    }

    let factor = if t1 > t0 { ((t - t0) / (t1 - t0)).clamp(0.0, 1.0) } else { 1.0 };
    Some((from, to, factor as f32))
}
