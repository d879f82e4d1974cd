//! Animation System Tests
//!
//! Tests for:
//! - Keyframe evaluation: clamping, continuity, single frames, step mode
//! - Shortest-arc rotation interpolation
//! - AnimationPlayer looping, pausing and pose overrides
//! - Animation duration computation

use std::f32::consts::PI;

use glam::{Quat, Vec3};

use marionette::animation::{
    Animation, AnimationChannel, AnimationPlayer, Frame, Interpolation, KeyframeCursor,
    PlaybackState, PropertyValue, TargetPath, evaluate, evaluate_with_cursor, wrap_time,
};
use marionette::scene::{LocalPose, Node, PoseSlots, Scene, SceneGraph};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
}

fn translation_channel(keys: &[(f32, Vec3)]) -> AnimationChannel {
    let frames = keys
        .iter()
        .map(|&(t, v)| Frame::translation(t, v))
        .collect();
    AnimationChannel::new(0, TargetPath::Translation, Interpolation::Linear, frames)
}

fn translation_of(value: PropertyValue) -> Vec3 {
    match value {
        PropertyValue::Translation(v) => v,
        other => panic!("expected translation, got {other:?}"),
    }
}

fn rotation_of(value: PropertyValue) -> Quat {
    match value {
        PropertyValue::Rotation(q) => q,
        other => panic!("expected rotation, got {other:?}"),
    }
}

// ============================================================================
// Track evaluation
// ============================================================================

#[test]
fn linear_midpoint() {
    let channel = translation_channel(&[(0.0, Vec3::ZERO), (2.0, Vec3::new(0.0, 5.0, 0.0))]);
    let v = translation_of(evaluate(&channel, 1.0));
    assert!(vec3_approx(v, Vec3::new(0.0, 2.5, 0.0)), "got {v}");
}

#[test]
fn clamps_before_first_and_after_last() {
    let channel = translation_channel(&[(1.0, Vec3::X), (2.0, Vec3::Y)]);

    assert_eq!(translation_of(evaluate(&channel, -3.0)), Vec3::X);
    assert_eq!(translation_of(evaluate(&channel, 0.5)), Vec3::X);
    assert_eq!(translation_of(evaluate(&channel, 2.0)), Vec3::Y);
    assert_eq!(translation_of(evaluate(&channel, 50.0)), Vec3::Y);
}

#[test]
fn converges_to_upper_keyframe() {
    let upper = Vec3::new(3.0, -1.0, 7.0);
    let channel = translation_channel(&[(0.0, Vec3::ZERO), (1.0, upper), (4.0, Vec3::ONE)]);

    let mut previous_error = f32::INFINITY;
    for step in [1e-1_f32, 1e-2, 1e-3, 1e-4] {
        let v = translation_of(evaluate(&channel, 1.0 - step));
        let error = (v - upper).length();
        assert!(error < previous_error, "error grew at step {step}");
        previous_error = error;
    }
    assert_eq!(translation_of(evaluate(&channel, 1.0)), upper);
}

#[test]
fn single_frame_ignores_time() {
    let value = Vec3::new(4.0, 5.0, 6.0);
    let channel = translation_channel(&[(0.75, value)]);

    for t in [-10.0, 0.0, 0.75, 1.0, 1e6] {
        assert_eq!(translation_of(evaluate(&channel, t)), value, "t={t}");
    }
}

#[test]
fn step_holds_lower_value() {
    let frames = vec![
        Frame::translation(0.0, Vec3::ZERO),
        Frame::translation(1.0, Vec3::ONE),
    ];
    let channel = AnimationChannel::new(0, TargetPath::Translation, Interpolation::Step, frames);

    assert_eq!(translation_of(evaluate(&channel, 0.99)), Vec3::ZERO);
    assert_eq!(translation_of(evaluate(&channel, 1.0)), Vec3::ONE);
}

#[test]
fn rotation_takes_shortest_arc() {
    let start = Quat::from_axis_angle(Vec3::Z, 10.0_f32.to_radians());
    let end = Quat::from_axis_angle(Vec3::Z, 350.0_f32.to_radians());
    let frames = vec![Frame::rotation(0.0, start), Frame::rotation(1.0, end)];
    let channel = AnimationChannel::new(0, TargetPath::Rotation, Interpolation::Linear, frames);

    let mid = rotation_of(evaluate(&channel, 0.5));
    let angle = mid.angle_between(Quat::IDENTITY);
    assert!(angle < 1e-3, "expected ~0 degrees, got {}", angle.to_degrees());
    assert!((angle - PI).abs() > 1.0);
}

#[test]
fn cursor_matches_stateless_evaluation_when_scrubbing() {
    let keys: Vec<(f32, Vec3)> = (0..20)
        .map(|i| (i as f32 * 0.25, Vec3::splat(i as f32)))
        .collect();
    let channel = translation_channel(&keys);
    let mut cursor = KeyframeCursor::default();

    let times = [0.0, 0.1, 0.3, 0.6, 4.9, 4.0, 0.2, 2.2, 2.3, 5.0, -1.0, 3.3];
    for t in times {
        assert_eq!(
            evaluate_with_cursor(&channel, t, &mut cursor),
            evaluate(&channel, t),
            "t={t}"
        );
    }
}

#[test]
fn duration_is_latest_channel_end() {
    let a = translation_channel(&[(0.0, Vec3::ZERO), (1.5, Vec3::ONE)]);
    let b = translation_channel(&[(0.5, Vec3::ZERO), (3.0, Vec3::ONE)]);
    let animation = Animation::new("walk", vec![a, b]);
    assert!(approx(animation.duration(), 3.0));
    assert_eq!(Animation::new("empty", Vec::new()).duration(), 0.0);
}

// ============================================================================
// Player
// ============================================================================

/// A root at `(2,0,0)` with a child translated by `channel`.
fn posed_graph() -> SceneGraph {
    let mut graph = SceneGraph::new();
    let root = graph.add_node(
        Node::new("root").with_pose(LocalPose::from_trs(
            Vec3::new(2.0, 0.0, 0.0),
            Quat::IDENTITY,
            Vec3::ONE,
        )),
    );
    let child = graph.add_node(Node::new("child"));
    graph.attach(root, child).unwrap();
    graph.add_scene(Scene::new("main", vec![root]));
    graph
}

fn rise_animation() -> Vec<Animation> {
    let frames = vec![
        Frame::translation(0.0, Vec3::ZERO),
        Frame::translation(2.0, Vec3::new(0.0, 5.0, 0.0)),
    ];
    let channel = AnimationChannel::new(1, TargetPath::Translation, Interpolation::Linear, frames);
    vec![Animation::new("rise", vec![channel])]
}

#[test]
fn advance_wraps_by_overshoot() {
    let animations = rise_animation();
    let mut graph = posed_graph();
    let mut player = AnimationPlayer::bind(&animations, 0).unwrap();

    player.advance_graph(2.0 + 0.25, &animations, &mut graph);
    assert!(approx(player.current_time(), 0.25), "got {}", player.current_time());
}

#[test]
fn advance_writes_animated_slot() {
    let animations = rise_animation();
    let mut graph = posed_graph();
    let mut player = AnimationPlayer::bind(&animations, 0).unwrap();

    player.advance_graph(1.0, &animations, &mut graph);

    let child = graph.node(1).unwrap();
    assert!(child.pose.animated().contains(PoseSlots::TRANSLATION));
    assert!(!child.pose.animated().contains(PoseSlots::ROTATION));
    let t = child.pose.matrix().w_axis.truncate();
    assert!(vec3_approx(t, Vec3::new(0.0, 2.5, 0.0)), "got {t}");

    // The root is untouched
    assert!(graph.node(0).unwrap().pose.animated().is_empty());
}

#[test]
fn paused_player_ignores_advance() {
    let animations = rise_animation();
    let mut graph = posed_graph();
    let mut player = AnimationPlayer::bind(&animations, 0).unwrap();

    player.advance_graph(0.5, &animations, &mut graph);
    player.pause();
    player.pause();
    assert_eq!(player.state(), PlaybackState::Paused);

    player.advance_graph(1.0, &animations, &mut graph);
    assert!(approx(player.current_time(), 0.5));
}

#[test]
fn non_finite_delta_is_ignored() {
    let animations = rise_animation();
    let mut graph = posed_graph();
    let mut player = AnimationPlayer::bind(&animations, 0).unwrap();

    player.advance_graph(0.5, &animations, &mut graph);
    player.advance_graph(f32::NAN, &animations, &mut graph);
    player.advance_graph(f32::INFINITY, &animations, &mut graph);
    assert!(approx(player.current_time(), 0.5));
}

#[test]
fn channel_for_missing_node_is_skipped() {
    let frames = vec![Frame::translation(0.0, Vec3::ONE)];
    let stray = AnimationChannel::new(42, TargetPath::Translation, Interpolation::Linear, frames);
    let animations = vec![Animation::new("stray", vec![stray])];
    let mut graph = posed_graph();

    let mut player = AnimationPlayer::bind(&animations, 0).unwrap();
    player.advance_graph(0.1, &animations, &mut graph);
    assert!(graph.nodes().iter().all(|n| n.pose.animated().is_empty()));
}

#[test]
fn wrap_time_handles_zero_duration() {
    assert_eq!(wrap_time(5.0, 0.0), 0.0);
    assert!(approx(wrap_time(2.0 + 0.125, 2.0), 0.125));
}
