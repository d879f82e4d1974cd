//! GPU-facing resources
//!
//! - [`GpuBuffer`] / [`BufferCache`]: buffer views uploaded once per asset
//! - [`Mesh`] / [`SubMesh`] / [`VertexArray`]: draw call configuration
//! - [`Material`] / [`DefaultMaterial`]: base color and base texture
//! - [`Texture2D`]: uploaded image with sampler state

pub mod buffer;
pub mod material;
pub mod mesh;
pub mod texture;

pub use buffer::{BufferCache, BufferTarget, GpuBuffer};
pub use material::{DefaultMaterial, Material};
pub use mesh::{
    AttributeLayout, AttributeSlot, IndexBinding, IndexType, Mesh, PrimitiveMode, SubMesh,
    VertexArray,
};
pub use texture::{FilterMode, MinFilter, Sampler, Texture2D, TextureImage, WrapMode};
