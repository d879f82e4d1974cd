//! Draw-List Producer
//!
//! Walks the posed nodes of a frame and emits one [`DrawCommand`] per
//! submesh. The list is rebuilt every frame and never mutated afterwards.

use glam::{Mat4, Vec4};
use log::warn;

use crate::assets::SceneAsset;
use crate::render::backend::{TextureId, VertexArrayId};
use crate::resources::material::DefaultMaterial;
use crate::resources::mesh::{IndexType, PrimitiveMode, VertexArray};
use crate::scene::{MeshIndex, NodeIndex, SceneIndex, WorldTransforms};

/// How a command is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    Indexed {
        mode: PrimitiveMode,
        index_type: IndexType,
        count: u32,
        byte_offset: u32,
    },
    Arrays {
        mode: PrimitiveMode,
        first: u32,
        count: u32,
    },
}

impl DrawCall {
    #[must_use]
    pub fn for_vertex_array(vertex_array: &VertexArray) -> Self {
        match vertex_array.indices {
            Some(indices) => Self::Indexed {
                mode: vertex_array.mode,
                index_type: indices.index_type,
                count: indices.count,
                byte_offset: indices.byte_offset,
            },
            None => Self::Arrays {
                mode: vertex_array.mode,
                first: 0,
                count: vertex_array.vertex_count,
            },
        }
    }
}

/// Everything needed to issue one draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub vertex_array: VertexArrayId,
    pub draw: DrawCall,
    pub world: Mat4,
    pub base_color: Vec4,
    pub texture: TextureId,
    /// Asset material index, `None` when the default material was used
    pub material: Option<usize>,
    pub scene: SceneIndex,
    pub node: NodeIndex,
    pub mesh: MeshIndex,
    pub submesh: usize,
}

/// Draw commands of one frame, in emission order.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    #[inline]
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawCommand> {
        self.commands.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<'a> IntoIterator for &'a DrawList {
    type Item = &'a DrawCommand;
    type IntoIter = std::slice::Iter<'a, DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

/// Emits draw commands for every posed node with a mesh.
///
/// Submeshes without a material use `defaults.material`; materials without a
/// base texture use the default white texture.
#[must_use]
pub fn produce(
    asset: &SceneAsset,
    world_transforms: &WorldTransforms,
    defaults: &DefaultMaterial,
) -> DrawList {
    let mut commands = Vec::new();

    for posed in world_transforms {
        let Some(node) = asset.graph().node(posed.node) else {
            warn!("Posed node {} is not part of the asset", posed.node);
            continue;
        };
        let Some(mesh_index) = node.mesh else {
            continue;
        };
        let Some(mesh) = asset.mesh(mesh_index) else {
            warn!("Node {} references missing mesh {mesh_index}", posed.node);
            continue;
        };

        for (submesh_index, submesh) in mesh.submeshes.iter().enumerate() {
            let material_index = submesh
                .material
                .filter(|&m| m < asset.materials().len());
            let material = material_index.map_or(&defaults.material, |m| &asset.materials()[m]);

            let texture = material
                .base_texture
                .and_then(|t| asset.textures().get(t))
                .map_or(defaults.texture_id(), |t| t.id);

            commands.push(DrawCommand {
                vertex_array: submesh.vertex_array.id,
                draw: DrawCall::for_vertex_array(&submesh.vertex_array),
                world: posed.world,
                base_color: material.base_color,
                texture,
                material: material_index,
                scene: posed.scene,
                node: posed.node,
                mesh: mesh_index,
                submesh: submesh_index,
            });
        }
    }

    DrawList { commands }
}
