use smallvec::SmallVec;

use crate::scene::pose::LocalPose;
use crate::scene::{MeshIndex, NodeIndex};

/// A scene node.
///
/// # Hierarchy
///
/// Children are stored as indices into the owning [`SceneGraph`](crate::scene::SceneGraph).
/// The same node may be reachable from several scenes; it must never be its own
/// ancestor. That contract is checked during traversal, not at construction.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: String,
    /// Mesh drawn at this node, if any
    pub mesh: Option<MeshIndex>,
    pub(crate) children: Vec<NodeIndex>,

    /// Local pose (hot data read every frame)
    pub pose: LocalPose,

    /// Authored morph target weights. Decoded but not applied.
    pub weights: SmallVec<[f32; 4]>,
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_pose(mut self, pose: LocalPose) -> Self {
        self.pose = pose;
        self
    }

    #[must_use]
    pub fn with_mesh(mut self, mesh: MeshIndex) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Returns a read-only slice of child node indices.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    /// Appends a child index. Prefer [`SceneGraph::attach`](crate::scene::SceneGraph::attach),
    /// which validates the index.
    #[inline]
    pub fn push_child(&mut self, child: NodeIndex) {
        self.children.push(child);
    }
}
