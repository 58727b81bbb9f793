//! Playback configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::anim::SampleMode;
use crate::util::{Error, Result};

/// Order of bind-pose reset and sampling within one update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseOrder {
    /// Reset every bone to its bind pose, then write sampled poses.
    /// Bones without a channel rest in bind pose.
    #[default]
    ResetThenSample,
    /// Write sampled poses, then reset every bone. The reset discards the
    /// sampled pose, so joints always show the bind pose.
    SampleThenReset,
}

/// Knobs for [`Model::update`](super::Model::update).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub pose_order: PoseOrder,
    pub sample_mode: SampleMode,
    /// Animation id advanced by each update.
    pub active_animation: u8,
}

impl PlaybackConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn with_pose_order(mut self, pose_order: PoseOrder) -> Self {
        self.pose_order = pose_order;
        self
    }

    pub fn with_sample_mode(mut self, sample_mode: SampleMode) -> Self {
        self.sample_mode = sample_mode;
        self
    }

    pub fn with_active_animation(mut self, id: u8) -> Self {
        self.active_animation = id;
        self
    }
}
