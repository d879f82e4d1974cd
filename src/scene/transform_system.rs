//! Transform System
//!
//! Computes world matrices for every node reachable from the selected scene
//! roots. Decoupled from [`SceneGraph`] storage so it only needs a shared
//! borrow of the graph.
//!
//! # Traversal
//!
//! Depth-first, parent before children, children in authored order. An
//! explicit work stack replaces recursion, and the current ancestor path is
//! tracked so that a node reached again below itself is reported as
//! [`GraphError::Cycle`] instead of looping forever.
//!
//! A node reachable from several roots (or several scenes) is evaluated once
//! per occurrence; every occurrence gets its own [`PosedNode`] entry because
//! its ancestor chain differs.

use glam::Mat4;
use serde::Deserialize;

use crate::errors::GraphError;
use crate::scene::graph::SceneGraph;
use crate::scene::{NodeIndex, SceneIndex};

/// Which scenes a traversal starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneSelection {
    /// Every scene in the document, in index order
    #[default]
    All,
    /// The document's default scene, or the first scene if none is declared
    Default,
    /// One scene by index
    Index(SceneIndex),
}

/// One evaluated occurrence of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosedNode {
    pub scene: SceneIndex,
    pub node: NodeIndex,
    /// Entry index of the parent occurrence, `None` for scene roots
    pub parent: Option<usize>,
    pub depth: usize,
    pub world: Mat4,
}

/// World transforms for one frame, in traversal order.
#[derive(Debug, Clone, Default)]
pub struct WorldTransforms {
    entries: Vec<PosedNode>,
}

impl WorldTransforms {
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[PosedNode] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PosedNode> {
        self.entries.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// World matrix of the first occurrence of `node`.
    #[must_use]
    pub fn world(&self, node: NodeIndex) -> Option<Mat4> {
        self.entries.iter().find(|e| e.node == node).map(|e| e.world)
    }

    /// Every occurrence of `node`, in traversal order.
    pub fn occurrences(&self, node: NodeIndex) -> impl Iterator<Item = &PosedNode> + '_ {
        self.entries.iter().filter(move |e| e.node == node)
    }
}

impl<'a> IntoIterator for &'a WorldTransforms {
    type Item = &'a PosedNode;
    type IntoIter = std::slice::Iter<'a, PosedNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, Copy)]
enum Visit {
    Enter {
        node: NodeIndex,
        parent: Option<usize>,
        depth: usize,
    },
    Exit(NodeIndex),
}

/// Reusable traversal state.
///
/// Keeping one `TransformSystem` around across frames reuses its stack and
/// path buffers.
#[derive(Debug, Default)]
pub struct TransformSystem {
    stack: Vec<Visit>,
    path: Vec<NodeIndex>,
    on_path: Vec<bool>,
}

impl TransformSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes world transforms for the selected scenes.
    pub fn compute(
        &mut self,
        graph: &SceneGraph,
        selection: SceneSelection,
    ) -> Result<WorldTransforms, GraphError> {
        let scene_count = graph.scenes().len();
        let scenes: Vec<SceneIndex> = match selection {
            SceneSelection::All => (0..scene_count).collect(),
            SceneSelection::Default => graph
                .default_scene()
                .or((scene_count > 0).then_some(0))
                .into_iter()
                .collect(),
            SceneSelection::Index(index) => vec![index],
        };

        self.on_path.clear();
        self.on_path.resize(graph.nodes().len(), false);

        let mut output = WorldTransforms {
            entries: Vec::with_capacity(graph.nodes().len()),
        };

        for scene_index in scenes {
            let scene = graph.scene(scene_index).ok_or(GraphError::SceneOutOfRange {
                scene: scene_index,
                len: scene_count,
            })?;
            for &root in &scene.roots {
                self.traverse(graph, scene_index, root, &mut output)?;
            }
        }

        Ok(output)
    }

    fn traverse(
        &mut self,
        graph: &SceneGraph,
        scene: SceneIndex,
        root: NodeIndex,
        output: &mut WorldTransforms,
    ) -> Result<(), GraphError> {
        self.stack.clear();
        self.path.clear();
        self.stack.push(Visit::Enter {
            node: root,
            parent: None,
            depth: 0,
        });

        while let Some(visit) = self.stack.pop() {
            match visit {
                Visit::Exit(node) => {
                    self.on_path[node] = false;
                    self.path.pop();
                }
                Visit::Enter {
                    node,
                    parent,
                    depth,
                } => {
                    let Some(current) = graph.node(node) else {
                        return Err(GraphError::NodeOutOfRange {
                            node,
                            len: graph.nodes().len(),
                        });
                    };

                    if self.on_path[node] {
                        let mut path = self.path.clone();
                        path.push(node);
                        return Err(GraphError::Cycle { node, path });
                    }

                    let parent_world = parent.map_or(Mat4::IDENTITY, |p| output.entries[p].world);
                    output.entries.push(PosedNode {
                        scene,
                        node,
                        parent,
                        depth,
                        world: parent_world * current.pose.matrix(),
                    });
                    let entry = output.entries.len() - 1;

                    self.on_path[node] = true;
                    self.path.push(node);
                    self.stack.push(Visit::Exit(node));

                    // Reverse push keeps authored child order on pop
                    for &child in current.children().iter().rev() {
                        self.stack.push(Visit::Enter {
                            node: child,
                            parent: Some(entry),
                            depth: depth + 1,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// World transforms for every scene of `graph`.
pub fn compute_world_transforms(graph: &SceneGraph) -> Result<WorldTransforms, GraphError> {
    TransformSystem::new().compute(graph, SceneSelection::All)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{LocalPose, Node, Scene};
    use glam::{Quat, Vec3};

    #[test]
    fn test_hierarchy_update() {
        let mut graph = SceneGraph::new();
        let parent = graph.add_node(
            Node::new("parent").with_pose(LocalPose::from_trs(Vec3::X, Quat::IDENTITY, Vec3::ONE)),
        );
        let child = graph.add_node(
            Node::new("child").with_pose(LocalPose::from_trs(Vec3::Y, Quat::IDENTITY, Vec3::ONE)),
        );
        graph.attach(parent, child).unwrap();
        graph.add_scene(Scene::new("main", vec![parent]));

        let world = compute_world_transforms(&graph).unwrap();

        let child_pos = world.world(child).unwrap().w_axis.truncate();
        assert!((child_pos - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
        assert_eq!(world.entries()[1].parent, Some(0));
        assert_eq!(world.entries()[1].depth, 1);
    }

    #[test]
    fn missing_scene_is_reported() {
        let graph = SceneGraph::new();
        let err = TransformSystem::new()
            .compute(&graph, SceneSelection::Index(2))
            .unwrap_err();
        assert_eq!(err, GraphError::SceneOutOfRange { scene: 2, len: 0 });
    }
}
