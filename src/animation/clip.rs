use glam::{Quat, Vec3};

use crate::animation::binding::TargetPath;
use crate::animation::tracks::Interpolation;
use crate::animation::values::{PropertyValue, Weights};
use crate::scene::NodeIndex;

/// One keyframe.
///
/// Only the field matching the owning channel's [`TargetPath`] is meaningful;
/// the others keep their neutral values.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub time: f32,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub weights: Weights,
}

impl Frame {
    /// Neutral keyframe at `time`.
    #[must_use]
    pub fn at(time: f32) -> Self {
        Self {
            time,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            weights: Weights::new(),
        }
    }

    #[must_use]
    pub fn translation(time: f32, translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::at(time)
        }
    }

    #[must_use]
    pub fn rotation(time: f32, rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::at(time)
        }
    }

    #[must_use]
    pub fn scale(time: f32, scale: Vec3) -> Self {
        Self {
            scale,
            ..Self::at(time)
        }
    }

    #[must_use]
    pub fn weights(time: f32, weights: Weights) -> Self {
        Self {
            weights,
            ..Self::at(time)
        }
    }

    /// The field selected by `path`.
    #[must_use]
    pub fn value(&self, path: TargetPath) -> PropertyValue {
        match path {
            TargetPath::Translation => PropertyValue::Translation(self.translation),
            TargetPath::Rotation => PropertyValue::Rotation(self.rotation),
            TargetPath::Scale => PropertyValue::Scale(self.scale),
            TargetPath::Weights => PropertyValue::Weights(self.weights.clone()),
        }
    }
}

/// Binding of a keyframe sequence to one node property.
#[derive(Debug, Clone)]
pub struct AnimationChannel {
    pub target_node: NodeIndex,
    pub target_path: TargetPath,
    pub interpolation: Interpolation,
    frames: Vec<Frame>,
}

impl AnimationChannel {
    /// Frames must be ordered by non-decreasing time; the decoder rejects
    /// documents that violate this.
    #[must_use]
    pub fn new(
        target_node: NodeIndex,
        target_path: TargetPath,
        interpolation: Interpolation,
        frames: Vec<Frame>,
    ) -> Self {
        debug_assert!(
            frames.windows(2).all(|w| w[0].time <= w[1].time),
            "keyframes must be ordered by time"
        );
        Self {
            target_node,
            target_path,
            interpolation,
            frames,
        }
    }

    #[inline]
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Time of the first keyframe.
    #[must_use]
    pub fn start_time(&self) -> f32 {
        self.frames.first().map_or(0.0, |f| f.time)
    }

    /// Time of the last keyframe.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.frames.last().map_or(0.0, |f| f.time)
    }
}

/// A named set of channels played together.
#[derive(Debug, Clone)]
pub struct Animation {
    pub name: String,
    pub channels: Vec<AnimationChannel>,
    duration: f32,
}

impl Animation {
    /// Builds an animation; its duration is the latest channel end time.
    #[must_use]
    pub fn new(name: impl Into<String>, channels: Vec<AnimationChannel>) -> Self {
        let duration = channels
            .iter()
            .map(AnimationChannel::end_time)
            .fold(0.0_f32, f32::max);

        Self {
            name: name.into(),
            channels,
            duration,
        }
    }

    /// Total animation duration in seconds.
    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }
}
