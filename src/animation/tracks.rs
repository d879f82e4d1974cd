//! Keyframe search and interpolation.

use crate::animation::binding::TargetPath;
use crate::animation::clip::{AnimationChannel, Frame};
use crate::animation::values::{Interpolatable, PropertyValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
}

const MAX_SCAN_OFFSET: usize = 3;

/// Remembers the last bracketing keyframe of a channel so that steadily
/// advancing playback finds the next bracket in O(1).
#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

/// Evaluates `channel` at `time`.
///
/// Times before the first keyframe clamp to the first value, times at or
/// after the last keyframe clamp to the last value. A single-keyframe channel
/// always yields its only value.
#[must_use]
pub fn evaluate(channel: &AnimationChannel, time: f32) -> PropertyValue {
    let frames = channel.frames();
    match frames.len() {
        0 => Frame::at(time).value(channel.target_path),
        1 => frames[0].value(channel.target_path),
        _ => {
            // partition_point finds the first frame with t > time, i.e. the upper bracket
            let next = frames.partition_point(|f| f.time <= time);
            sample_at_frame(channel, next.saturating_sub(1), time)
        }
    }
}

/// Same result as [`evaluate`], starting the bracket search at `cursor`.
///
/// A short linear scan around the cached index covers normal playback and
/// loop resets; larger jumps fall back to binary search.
pub fn evaluate_with_cursor(
    channel: &AnimationChannel,
    time: f32,
    cursor: &mut KeyframeCursor,
) -> PropertyValue {
    let frames = channel.frames();
    let len = frames.len();
    if len <= 1 {
        return evaluate(channel, time);
    }

    let i = cursor.last_index.min(len - 1);

    let found_index = if time >= frames[i].time {
        // Forward: check [idx, idx+1) for idx = i..=i+MAX_SCAN_OFFSET
        let mut res = None;
        for offset in 0..=MAX_SCAN_OFFSET {
            let idx = i + offset;
            if idx >= len - 1 {
                // time >= frames[idx].time is already known here
                res = Some(len - 1);
                break;
            }
            if time < frames[idx + 1].time {
                res = Some(idx);
                break;
            }
        }
        res
    } else {
        // Backward: time < frames[i].time, so [idx, idx+1) only needs its left edge checked
        let mut res = None;
        for offset in 1..=MAX_SCAN_OFFSET {
            if i < offset {
                break;
            }
            let idx = i - offset;
            if time >= frames[idx].time {
                res = Some(idx);
                break;
            }
        }
        res
    };

    let index = found_index
        .unwrap_or_else(|| frames.partition_point(|f| f.time <= time).saturating_sub(1));
    cursor.last_index = index;

    sample_at_frame(channel, index, time)
}

fn sample_at_frame(channel: &AnimationChannel, index: usize, time: f32) -> PropertyValue {
    let frames = channel.frames();
    let len = frames.len();
    let path = channel.target_path;

    // No upper bracket: clamp to the last keyframe
    if index >= len - 1 {
        return frames[len - 1].value(path);
    }

    let lower = &frames[index];
    let upper = &frames[index + 1];
    let dt = upper.time - lower.time;

    let f = if dt > 0.0 {
        ((time - lower.time) / dt).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let f = if f.is_nan() { 0.0 } else { f };

    match channel.interpolation {
        Interpolation::Step => lower.value(path),
        Interpolation::Linear => interpolate(path, lower, upper, f),
    }
}

fn interpolate(path: TargetPath, lower: &Frame, upper: &Frame, f: f32) -> PropertyValue {
    match path {
        TargetPath::Translation => PropertyValue::Translation(Interpolatable::interpolate_linear(
            &lower.translation,
            &upper.translation,
            f,
        )),
        TargetPath::Rotation => PropertyValue::Rotation(Interpolatable::interpolate_linear(
            &lower.rotation,
            &upper.rotation,
            f,
        )),
        TargetPath::Scale => PropertyValue::Scale(Interpolatable::interpolate_linear(
            &lower.scale,
            &upper.scale,
            f,
        )),
        TargetPath::Weights => PropertyValue::Weights(Interpolatable::interpolate_linear(
            &lower.weights,
            &upper.weights,
            f,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn channel(times: &[f32]) -> AnimationChannel {
        let frames = times
            .iter()
            .enumerate()
            .map(|(i, &t)| Frame::translation(t, Vec3::splat(i as f32)))
            .collect();
        AnimationChannel::new(0, TargetPath::Translation, Interpolation::Linear, frames)
    }

    #[test]
    fn cursor_agrees_with_stateless_search() {
        let channel = channel(&[0.0, 0.5, 1.0, 1.0, 2.0, 3.0, 8.0, 9.0]);
        let mut cursor = KeyframeCursor::default();

        // Forward playback, a loop reset, a large jump and a backwards scrub
        let times = [0.0, 0.2, 0.7, 1.0, 1.5, 2.9, 0.1, 8.5, 9.5, 2.5, -1.0, 7.0];
        for t in times {
            assert_eq!(
                evaluate_with_cursor(&channel, t, &mut cursor),
                evaluate(&channel, t),
                "mismatch at t={t}"
            );
        }
    }

    #[test]
    fn coincident_keyframes_do_not_divide_by_zero() {
        let channel = channel(&[0.0, 1.0, 1.0, 2.0]);
        assert_eq!(
            evaluate(&channel, 1.0),
            PropertyValue::Translation(Vec3::splat(2.0))
        );
    }
}
