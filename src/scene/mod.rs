//! Scene graph module
//!
//! Index-based scene hierarchy:
//! - [`Node`]: named node with an optional mesh, child indices and a local pose
//! - [`LocalPose`]: authored translation/rotation/scale with per-slot animation overrides
//! - [`Scene`]: named list of root nodes
//! - [`SceneGraph`]: arena owning all nodes and scenes of one asset
//! - [`transform_system`]: world transform composition

pub mod graph;
pub mod node;
pub mod pose;
pub mod scene;
pub mod transform_system;

pub use graph::SceneGraph;
pub use node::Node;
pub use pose::{LocalPose, PoseSlots};
pub use scene::Scene;
pub use transform_system::{
    PosedNode, SceneSelection, TransformSystem, WorldTransforms, compute_world_transforms,
};

/// Index of a node in [`SceneGraph::nodes`].
pub type NodeIndex = usize;
/// Index of a scene in [`SceneGraph::scenes`].
pub type SceneIndex = usize;
/// Index of a mesh in [`SceneAsset::meshes`](crate::assets::SceneAsset::meshes).
pub type MeshIndex = usize;
