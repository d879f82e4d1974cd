use log::{trace, warn};

use crate::animation::clip::Animation;
use crate::animation::tracks::{KeyframeCursor, evaluate_with_cursor};
use crate::animation::values::PropertyValue;
use crate::assets::SceneAsset;
use crate::scene::SceneGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Playing,
    Paused,
}

/// Looping playback of one animation of a loaded asset.
///
/// The player stores only the index of its animation, so it never borrows
/// the asset between frames.
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    animation: usize,
    state: PlaybackState,
    current_time: f32,
    track_cursors: Vec<KeyframeCursor>,
}

impl AnimationPlayer {
    /// Binds animation `index`, or `None` if it does not exist.
    #[must_use]
    pub fn bind(animations: &[Animation], index: usize) -> Option<Self> {
        let animation = animations.get(index)?;
        Some(Self {
            animation: index,
            state: PlaybackState::Playing,
            current_time: 0.0,
            track_cursors: vec![KeyframeCursor::default(); animation.channels.len()],
        })
    }

    #[inline]
    #[must_use]
    pub fn animation_index(&self) -> usize {
        self.animation
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    /// Stops time from advancing. Calling it again has no effect.
    pub fn pause(&mut self) {
        self.state = PlaybackState::Paused;
    }

    /// Advances playback by `dt` seconds and poses the asset's graph.
    pub fn advance(&mut self, dt: f32, asset: &mut SceneAsset) {
        let (animations, graph) = asset.animation_targets_mut();
        self.advance_graph(dt, animations, graph);
    }

    /// [`advance`](Self::advance) over explicit parts of an asset.
    pub fn advance_graph(&mut self, dt: f32, animations: &[Animation], graph: &mut SceneGraph) {
        if self.state == PlaybackState::Paused {
            return;
        }
        if !dt.is_finite() {
            warn!("Ignoring non-finite animation delta {dt}");
            return;
        }
        let Some(animation) = animations.get(self.animation) else {
            warn!("Bound animation {} no longer exists", self.animation);
            return;
        };

        self.current_time = wrap_time(self.current_time + dt, animation.duration());
        self.apply(animation, graph);
    }

    /// Evaluates every channel at the current time and writes the results
    /// into the graph's pose slots, replacing last frame's overrides.
    fn apply(&mut self, animation: &Animation, graph: &mut SceneGraph) {
        graph.clear_animated_poses();

        if self.track_cursors.len() != animation.channels.len() {
            self.track_cursors
                .resize(animation.channels.len(), KeyframeCursor::default());
        }

        for (channel, cursor) in animation.channels.iter().zip(&mut self.track_cursors) {
            let Some(node) = graph.node_mut(channel.target_node) else {
                trace!("Channel targets missing node {}", channel.target_node);
                continue;
            };

            match evaluate_with_cursor(channel, self.current_time, cursor) {
                PropertyValue::Translation(t) => node.pose.set_animated_translation(t),
                PropertyValue::Rotation(r) => node.pose.set_animated_rotation(r),
                PropertyValue::Scale(s) => node.pose.set_animated_scale(s),
                // Morph weights are decoded but not applied
                PropertyValue::Weights(_) => {}
            }
        }
    }
}

/// Loops `time` into `[0, duration]`.
///
/// Time past the end wraps by the overshoot, so advancing `duration + e`
/// from zero lands on `e`.
#[must_use]
pub fn wrap_time(time: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    if time > duration {
        time % duration
    } else if time < 0.0 {
        time.rem_euclid(duration)
    } else {
        time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_overshoot() {
        assert!((wrap_time(2.25, 2.0) - 0.25).abs() < 1e-6);
        assert_eq!(wrap_time(2.0, 2.0), 2.0);
        assert!((wrap_time(-0.5, 2.0) - 1.5).abs() < 1e-6);
        assert_eq!(wrap_time(3.0, 0.0), 0.0);
    }

    #[test]
    fn bind_rejects_missing_animation() {
        assert!(AnimationPlayer::bind(&[], 0).is_none());
    }
}
