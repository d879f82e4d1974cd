use crate::errors::GraphError;
use crate::scene::node::Node;
use crate::scene::scene::Scene;
use crate::scene::{NodeIndex, SceneIndex};

/// Arena of nodes and scenes belonging to one loaded asset.
///
/// Nodes and scenes refer to each other by index. Topology is fixed once the
/// asset is loaded; only pose slots change at runtime.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    scenes: Vec<Scene>,
    default_scene: Option<SceneIndex>,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_scene(&mut self, scene: Scene) -> SceneIndex {
        self.scenes.push(scene);
        self.scenes.len() - 1
    }

    /// Appends `child` to `parent`'s children.
    ///
    /// Only index ranges are validated here; cycles surface as
    /// [`GraphError::Cycle`] during traversal.
    pub fn attach(&mut self, parent: NodeIndex, child: NodeIndex) -> Result<(), GraphError> {
        let len = self.nodes.len();
        if child >= len {
            return Err(GraphError::NodeOutOfRange { node: child, len });
        }
        let parent_node = self
            .nodes
            .get_mut(parent)
            .ok_or(GraphError::NodeOutOfRange { node: parent, len })?;
        parent_node.push_child(child);
        Ok(())
    }

    pub fn set_default_scene(&mut self, scene: Option<SceneIndex>) {
        self.default_scene = scene;
    }

    #[inline]
    #[must_use]
    pub fn default_scene(&self) -> Option<SceneIndex> {
        self.default_scene
    }

    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    #[must_use]
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    #[inline]
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    #[inline]
    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    #[inline]
    #[must_use]
    pub fn scene(&self, index: SceneIndex) -> Option<&Scene> {
        self.scenes.get(index)
    }

    /// First node with the given name, in index order.
    #[must_use]
    pub fn find_node_by_name(&self, name: &str) -> Option<NodeIndex> {
        self.nodes.iter().position(|node| node.name == name)
    }

    /// Restores every animated pose slot to its authored value.
    pub fn clear_animated_poses(&mut self) {
        for node in &mut self.nodes {
            node.pose.clear_animation();
        }
    }
}
