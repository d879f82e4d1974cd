//! Asset loading
//!
//! - [`accessor`]: the binary accessor table (typed views into buffers)
//! - [`document`]: serde model of the glTF JSON
//! - [`source`]: `.gltf` / `.glb` / data URI / external file resolution
//! - [`decoder`]: builds a [`SceneAsset`] and uploads its GPU resources
//! - [`storage`]: generational storage of loaded assets

pub mod accessor;
pub mod decoder;
pub mod document;
pub mod source;
pub mod storage;

use std::path::{Path, PathBuf};

use crate::animation::Animation;
use crate::render::backend::GpuBackend;
use crate::resources::{BufferCache, Material, Mesh, Texture2D};
use crate::scene::{MeshIndex, SceneGraph};

pub use accessor::{Accessor, AccessorTable, BufferView, ComponentType, ElementType};
pub use decoder::{LoadOptions, load, load_from_slice, load_with_options};
pub use source::AssetSource;
pub use storage::{AssetHandle, AssetStorage};

/// Everything decoded from one asset source.
///
/// The asset exclusively owns its GPU resources; call
/// [`release`](Self::release) before dropping it.
#[derive(Debug, Default)]
pub struct SceneAsset {
    pub(crate) source_path: Option<PathBuf>,
    pub(crate) buffer_views: Vec<BufferView>,
    pub(crate) accessors: Vec<Accessor>,
    pub(crate) buffers: BufferCache,
    pub(crate) meshes: Vec<Mesh>,
    pub(crate) materials: Vec<Material>,
    pub(crate) textures: Vec<Texture2D>,
    pub(crate) graph: SceneGraph,
    pub(crate) animations: Vec<Animation>,
}

impl SceneAsset {
    /// File the asset was loaded from, if it came from disk.
    #[must_use]
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    #[must_use]
    pub fn buffer_views(&self) -> &[BufferView] {
        &self.buffer_views
    }

    #[must_use]
    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }

    /// GPU buffers uploaded for this asset, keyed by buffer view.
    #[must_use]
    pub fn buffers(&self) -> &BufferCache {
        &self.buffers
    }

    #[must_use]
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    #[must_use]
    pub fn mesh(&self, index: MeshIndex) -> Option<&Mesh> {
        self.meshes.get(index)
    }

    #[must_use]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    #[must_use]
    pub fn textures(&self) -> &[Texture2D] {
        &self.textures
    }

    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    #[must_use]
    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    /// Index of the first animation named `name`.
    #[must_use]
    pub fn find_animation(&self, name: &str) -> Option<usize> {
        self.animations.iter().position(|a| a.name == name)
    }

    /// Animations and the graph they drive, borrowed together.
    pub fn animation_targets_mut(&mut self) -> (&[Animation], &mut SceneGraph) {
        (&self.animations, &mut self.graph)
    }

    /// Number of live GPU objects owned by this asset.
    #[must_use]
    pub fn gpu_resource_count(&self) -> usize {
        let vertex_arrays: usize = self.meshes.iter().map(|m| m.submeshes.len()).sum();
        self.buffers.len() + vertex_arrays + self.textures.len()
    }

    /// Deletes every GPU resource owned by this asset.
    pub fn release<G: GpuBackend + ?Sized>(&mut self, gpu: &mut G) {
        for mesh in &mut self.meshes {
            mesh.release(gpu);
        }
        self.buffers.release(gpu);
        for texture in self.textures.drain(..) {
            gpu.delete_texture(texture.id);
        }
    }
}
