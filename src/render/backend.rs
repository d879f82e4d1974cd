//! Backend seams.
//!
//! [`GpuBackend`] creates and fills GPU resources; only the asset decoder
//! and [`DefaultMaterial`](crate::resources::material::DefaultMaterial) call
//! it. [`ShaderBackend`] consumes draw commands through
//! [`submit`](crate::render::submit::submit).

use std::num::NonZeroU32;

use glam::{Mat4, Vec4};

use crate::errors::BackendError;
use crate::resources::buffer::BufferTarget;
use crate::resources::mesh::{AttributeLayout, IndexType, PrimitiveMode};
use crate::resources::texture::{Sampler, TextureImage};

macro_rules! gpu_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            #[inline]
            #[must_use]
            pub fn get(self) -> u32 {
                self.0.get()
            }
        }
    };
}

gpu_id!(
    /// Renderer id of a GPU buffer.
    BufferId
);
gpu_id!(
    /// Renderer id of a vertex array configuration.
    VertexArrayId
);
gpu_id!(
    /// Renderer id of a 2D texture.
    TextureId
);
gpu_id!(
    /// Renderer id of a linked shader program.
    ProgramId
);

/// GPU resource creation.
pub trait GpuBackend {
    fn create_buffer(&mut self) -> Result<BufferId, BackendError>;

    /// Replaces the whole contents of `buffer`.
    fn upload_buffer_data(
        &mut self,
        buffer: BufferId,
        target: BufferTarget,
        data: &[u8],
    ) -> Result<(), BackendError>;

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, BackendError>;

    /// Binds `buffer` to an attribute slot of `vertex_array`.
    fn configure_attribute(
        &mut self,
        vertex_array: VertexArrayId,
        buffer: BufferId,
        layout: &AttributeLayout,
    ) -> Result<(), BackendError>;

    /// Records `buffer` as the element array of `vertex_array`.
    fn bind_index_buffer(
        &mut self,
        vertex_array: VertexArrayId,
        buffer: BufferId,
    ) -> Result<(), BackendError>;

    fn create_texture(&mut self) -> Result<TextureId, BackendError>;

    fn upload_texture_data(
        &mut self,
        texture: TextureId,
        image: &TextureImage,
        sampler: &Sampler,
        generate_mipmaps: bool,
    ) -> Result<(), BackendError>;

    fn delete_buffer(&mut self, buffer: BufferId);
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);
    fn delete_texture(&mut self, texture: TextureId);
}

/// Program binding, uniform upload and draw submission.
///
/// Uniforms are addressed by name on the currently bound program.
pub trait ShaderBackend {
    fn bind_program(&mut self, program: ProgramId) -> Result<(), BackendError>;
    fn set_uniform_mat4(&mut self, name: &str, value: &Mat4) -> Result<(), BackendError>;
    fn set_uniform_vec4(&mut self, name: &str, value: Vec4) -> Result<(), BackendError>;
    fn set_uniform_int(&mut self, name: &str, value: i32) -> Result<(), BackendError>;
    fn bind_texture_slot(&mut self, slot: u32, texture: TextureId) -> Result<(), BackendError>;

    fn draw_indexed(
        &mut self,
        vertex_array: VertexArrayId,
        mode: PrimitiveMode,
        index_type: IndexType,
        count: u32,
        byte_offset: u32,
    ) -> Result<(), BackendError>;

    fn draw_arrays(
        &mut self,
        vertex_array: VertexArrayId,
        mode: PrimitiveMode,
        first: u32,
        count: u32,
    ) -> Result<(), BackendError>;
}
