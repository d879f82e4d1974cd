//! Scene Graph & Transform Tests
//!
//! Tests for:
//! - LocalPose TRS composition and matrix decomposition
//! - World transform composition through the hierarchy
//! - Nodes shared between scenes
//! - Cycle and range detection during traversal
//! - Scene selection

use glam::{Mat4, Quat, Vec3};

use marionette::errors::GraphError;
use marionette::scene::{
    LocalPose, Node, Scene, SceneGraph, SceneSelection, TransformSystem,
    compute_world_transforms,
};

// ============================================================================
// Helpers
// ============================================================================

const EPSILON: f32 = 1e-5;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn translated(name: &str, t: Vec3) -> Node {
    Node::new(name).with_pose(LocalPose::from_trs(t, Quat::IDENTITY, Vec3::ONE))
}

fn origin(world: Mat4) -> Vec3 {
    world.w_axis.truncate()
}

// ============================================================================
// LocalPose
// ============================================================================

#[test]
fn pose_default_is_identity() {
    assert_eq!(LocalPose::default().matrix(), Mat4::IDENTITY);
}

#[test]
fn pose_composes_translation_rotation_scale() {
    let rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
    let pose = LocalPose::from_trs(Vec3::new(1.0, 2.0, 3.0), rotation, Vec3::splat(2.0));

    let expected =
        Mat4::from_scale_rotation_translation(Vec3::splat(2.0), rotation, Vec3::new(1.0, 2.0, 3.0));
    assert!(pose.matrix().abs_diff_eq(expected, EPSILON));
}

#[test]
fn pose_from_matrix_decomposes() {
    let rotation = Quat::from_rotation_x(0.3);
    let matrix = Mat4::from_scale_rotation_translation(
        Vec3::new(1.0, 2.0, 0.5),
        rotation,
        Vec3::new(-4.0, 0.0, 9.0),
    );
    let pose = LocalPose::from_matrix(matrix);

    assert!(vec3_approx(pose.authored_translation(), Vec3::new(-4.0, 0.0, 9.0)));
    assert!(vec3_approx(pose.authored_scale(), Vec3::new(1.0, 2.0, 0.5)));
    assert!(pose.authored_rotation().abs_diff_eq(rotation, EPSILON));
    assert!(pose.matrix().abs_diff_eq(matrix, 1e-4));
}

#[test]
fn animated_translation_is_not_applied_twice() {
    let mut pose = LocalPose::from_trs(Vec3::new(5.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE);
    pose.set_animated_translation(Vec3::new(1.0, 0.0, 0.0));
    assert!(vec3_approx(origin(pose.matrix()), Vec3::new(1.0, 0.0, 0.0)));

    pose.clear_animation();
    assert!(vec3_approx(origin(pose.matrix()), Vec3::new(5.0, 0.0, 0.0)));
}

// ============================================================================
// World transforms
// ============================================================================

#[test]
fn static_child_of_identity_parent() {
    let mut graph = SceneGraph::new();
    let parent = graph.add_node(Node::new("parent"));
    let child = graph.add_node(translated("child", Vec3::X));
    graph.attach(parent, child).unwrap();
    graph.add_scene(Scene::new("main", vec![parent]));

    let world = compute_world_transforms(&graph).unwrap();
    assert_eq!(world.world(parent), Some(Mat4::IDENTITY));
    assert!(world.world(child).unwrap().abs_diff_eq(Mat4::from_translation(Vec3::X), EPSILON));
}

#[test]
fn deep_chain_accumulates() {
    let mut graph = SceneGraph::new();
    let mut previous = graph.add_node(translated("n0", Vec3::X));
    let root = previous;
    for i in 1..10 {
        let node = graph.add_node(translated(&format!("n{i}"), Vec3::X));
        graph.attach(previous, node).unwrap();
        previous = node;
    }
    graph.add_scene(Scene::new("chain", vec![root]));

    let world = compute_world_transforms(&graph).unwrap();
    assert_eq!(world.len(), 10);
    assert!(vec3_approx(origin(world.world(previous).unwrap()), Vec3::new(10.0, 0.0, 0.0)));

    let leaf = world.occurrences(previous).next().unwrap();
    assert_eq!(leaf.depth, 9);
}

#[test]
fn parents_precede_children_in_authored_order() {
    let mut graph = SceneGraph::new();
    let root = graph.add_node(Node::new("root"));
    let a = graph.add_node(Node::new("a"));
    let b = graph.add_node(Node::new("b"));
    let a1 = graph.add_node(Node::new("a1"));
    graph.attach(root, a).unwrap();
    graph.attach(root, b).unwrap();
    graph.attach(a, a1).unwrap();
    graph.add_scene(Scene::new("main", vec![root]));

    let world = compute_world_transforms(&graph).unwrap();
    let order: Vec<usize> = world.iter().map(|p| p.node).collect();
    assert_eq!(order, vec![root, a, a1, b]);

    for (index, posed) in world.iter().enumerate() {
        if let Some(parent) = posed.parent {
            assert!(parent < index);
        }
    }
}

#[test]
fn shared_node_is_posed_per_ancestor_chain() {
    let mut graph = SceneGraph::new();
    let left = graph.add_node(translated("left", Vec3::new(-1.0, 0.0, 0.0)));
    let right = graph.add_node(translated("right", Vec3::new(1.0, 0.0, 0.0)));
    let shared = graph.add_node(translated("shared", Vec3::Y));
    graph.attach(left, shared).unwrap();
    graph.attach(right, shared).unwrap();
    graph.add_scene(Scene::new("a", vec![left]));
    graph.add_scene(Scene::new("b", vec![right]));

    let world = compute_world_transforms(&graph).unwrap();
    let positions: Vec<Vec3> = world.occurrences(shared).map(|p| origin(p.world)).collect();
    assert_eq!(positions.len(), 2);
    assert!(vec3_approx(positions[0], Vec3::new(-1.0, 1.0, 0.0)));
    assert!(vec3_approx(positions[1], Vec3::new(1.0, 1.0, 0.0)));
}

#[test]
fn animated_child_under_translated_root() {
    let mut graph = SceneGraph::new();
    let root = graph.add_node(translated("root", Vec3::new(2.0, 0.0, 0.0)));
    let child = graph.add_node(Node::new("child"));
    graph.attach(root, child).unwrap();
    graph.add_scene(Scene::new("main", vec![root]));

    graph
        .node_mut(child)
        .unwrap()
        .pose
        .set_animated_translation(Vec3::new(0.0, 2.5, 0.0));

    let world = compute_world_transforms(&graph).unwrap();
    assert!(vec3_approx(origin(world.world(child).unwrap()), Vec3::new(2.0, 2.5, 0.0)));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn two_node_cycle_is_reported() {
    let mut graph = SceneGraph::new();
    let a = graph.add_node(Node::new("A"));
    let b = graph.add_node(Node::new("B"));
    graph.attach(a, b).unwrap();
    graph.attach(b, a).unwrap();
    graph.add_scene(Scene::new("loop", vec![a]));

    let err = compute_world_transforms(&graph).unwrap_err();
    assert_eq!(
        err,
        GraphError::Cycle {
            node: a,
            path: vec![a, b, a]
        }
    );
}

#[test]
fn self_parent_is_a_cycle() {
    let mut graph = SceneGraph::new();
    let a = graph.add_node(Node::new("A"));
    graph.attach(a, a).unwrap();
    graph.add_scene(Scene::new("loop", vec![a]));

    assert!(matches!(
        compute_world_transforms(&graph),
        Err(GraphError::Cycle { node, .. }) if node == a
    ));
}

#[test]
fn diamond_is_not_a_cycle() {
    let mut graph = SceneGraph::new();
    let root = graph.add_node(Node::new("root"));
    let a = graph.add_node(Node::new("a"));
    let b = graph.add_node(Node::new("b"));
    let leaf = graph.add_node(Node::new("leaf"));
    graph.attach(root, a).unwrap();
    graph.attach(root, b).unwrap();
    graph.attach(a, leaf).unwrap();
    graph.attach(b, leaf).unwrap();
    graph.add_scene(Scene::new("main", vec![root]));

    let world = compute_world_transforms(&graph).unwrap();
    assert_eq!(world.occurrences(leaf).count(), 2);
}

#[test]
fn attach_rejects_unknown_nodes() {
    let mut graph = SceneGraph::new();
    let a = graph.add_node(Node::new("A"));
    assert_eq!(
        graph.attach(a, 7),
        Err(GraphError::NodeOutOfRange { node: 7, len: 1 })
    );
    assert_eq!(
        graph.attach(3, a),
        Err(GraphError::NodeOutOfRange { node: 3, len: 1 })
    );
}

// ============================================================================
// Scene selection
// ============================================================================

fn two_scene_graph() -> SceneGraph {
    let mut graph = SceneGraph::new();
    let a = graph.add_node(Node::new("a"));
    let b = graph.add_node(Node::new("b"));
    graph.add_scene(Scene::new("first", vec![a]));
    graph.add_scene(Scene::new("second", vec![b]));
    graph
}

#[test]
fn selection_picks_scenes() {
    let mut graph = two_scene_graph();
    let mut system = TransformSystem::new();

    assert_eq!(system.compute(&graph, SceneSelection::All).unwrap().len(), 2);

    // No declared default falls back to the first scene
    let default = system.compute(&graph, SceneSelection::Default).unwrap();
    assert_eq!(default.entries()[0].node, 0);

    graph.set_default_scene(Some(1));
    let default = system.compute(&graph, SceneSelection::Default).unwrap();
    assert_eq!(default.len(), 1);
    assert_eq!(default.entries()[0].node, 1);
    assert_eq!(default.entries()[0].scene, 1);

    assert_eq!(
        system.compute(&graph, SceneSelection::Index(5)).unwrap_err(),
        GraphError::SceneOutOfRange { scene: 5, len: 2 }
    );
}
