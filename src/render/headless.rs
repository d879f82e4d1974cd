//! In-memory backend.
//!
//! Records every call, tracks which resources are alive and can be told to
//! fail a given operation. Used by tests and offline tooling.

use std::num::NonZeroU32;

use glam::{Mat4, Vec4};
use log::trace;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::BackendError;
use crate::render::backend::{
    BufferId, GpuBackend, ProgramId, ShaderBackend, TextureId, VertexArrayId,
};
use crate::resources::buffer::BufferTarget;
use crate::resources::mesh::{AttributeLayout, IndexType, PrimitiveMode};
use crate::resources::texture::{Sampler, TextureImage};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateBuffer(BufferId),
    UploadBufferData {
        buffer: BufferId,
        target: BufferTarget,
        len: usize,
    },
    CreateVertexArray(VertexArrayId),
    ConfigureAttribute {
        vertex_array: VertexArrayId,
        buffer: BufferId,
        layout: AttributeLayout,
    },
    BindIndexBuffer {
        vertex_array: VertexArrayId,
        buffer: BufferId,
    },
    CreateTexture(TextureId),
    UploadTextureData {
        texture: TextureId,
        width: u32,
        height: u32,
        sampler: Sampler,
        generate_mipmaps: bool,
    },
    DeleteBuffer(BufferId),
    DeleteVertexArray(VertexArrayId),
    DeleteTexture(TextureId),
    BindProgram(ProgramId),
    SetUniformMat4 {
        name: String,
        value: Mat4,
    },
    SetUniformVec4 {
        name: String,
        value: Vec4,
    },
    SetUniformInt {
        name: String,
        value: i32,
    },
    BindTextureSlot {
        slot: u32,
        texture: TextureId,
    },
    DrawIndexed {
        vertex_array: VertexArrayId,
        mode: PrimitiveMode,
        index_type: IndexType,
        count: u32,
        byte_offset: u32,
    },
    DrawArrays {
        vertex_array: VertexArrayId,
        mode: PrimitiveMode,
        first: u32,
        count: u32,
    },
}

impl BackendCall {
    #[must_use]
    pub fn is_draw(&self) -> bool {
        matches!(self, Self::DrawIndexed { .. } | Self::DrawArrays { .. })
    }
}

/// A planned failure of one operation.
#[derive(Debug, Clone, Copy)]
struct Fault {
    operation: &'static str,
    /// Successful calls of `operation` to allow before failing
    remaining: usize,
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u32,
    calls: Vec<BackendCall>,
    buffers: FxHashMap<BufferId, Vec<u8>>,
    vertex_arrays: FxHashSet<VertexArrayId>,
    textures: FxHashSet<TextureId>,
    program: Option<ProgramId>,
    fault: Option<Fault>,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `operation` fail once, after `after` successful calls of it.
    ///
    /// Operation names match the trait method names, e.g. `"create_texture"`.
    pub fn fail_on(&mut self, operation: &'static str, after: usize) {
        self.fault = Some(Fault {
            operation,
            remaining: after,
        });
    }

    #[must_use]
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Recorded draw calls, in submission order.
    pub fn draws(&self) -> impl Iterator<Item = &BackendCall> + '_ {
        self.calls.iter().filter(|c| c.is_draw())
    }

    /// Number of calls to creation functions so far.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    BackendCall::CreateBuffer(_)
                        | BackendCall::CreateVertexArray(_)
                        | BackendCall::CreateTexture(_)
                )
            })
            .count()
    }

    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    #[must_use]
    pub fn live_vertex_arrays(&self) -> usize {
        self.vertex_arrays.len()
    }

    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Buffers, vertex arrays and textures not yet deleted.
    #[must_use]
    pub fn live_resources(&self) -> usize {
        self.live_buffers() + self.live_vertex_arrays() + self.live_textures()
    }

    /// Contents last uploaded to `buffer`.
    #[must_use]
    pub fn buffer_data(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    fn check_fault(&mut self, operation: &'static str) -> Result<(), BackendError> {
        if let Some(fault) = &mut self.fault
            && fault.operation == operation
        {
            if fault.remaining == 0 {
                self.fault = None;
                return Err(BackendError::new(operation, "injected failure"));
            }
            fault.remaining -= 1;
        }
        Ok(())
    }

    fn allocate(&mut self, operation: &'static str) -> Result<NonZeroU32, BackendError> {
        self.check_fault(operation)?;
        self.next_id += 1;
        NonZeroU32::new(self.next_id).ok_or_else(|| BackendError::new(operation, "id overflow"))
    }

    fn require_vertex_array(
        &self,
        operation: &'static str,
        vertex_array: VertexArrayId,
    ) -> Result<(), BackendError> {
        if self.vertex_arrays.contains(&vertex_array) {
            Ok(())
        } else {
            Err(BackendError::new(
                operation,
                format!("unknown vertex array {}", vertex_array.get()),
            ))
        }
    }

    fn require_buffer(&self, operation: &'static str, buffer: BufferId) -> Result<(), BackendError> {
        if self.buffers.contains_key(&buffer) {
            Ok(())
        } else {
            Err(BackendError::new(
                operation,
                format!("unknown buffer {}", buffer.get()),
            ))
        }
    }

    fn require_texture(
        &self,
        operation: &'static str,
        texture: TextureId,
    ) -> Result<(), BackendError> {
        if self.textures.contains(&texture) {
            Ok(())
        } else {
            Err(BackendError::new(
                operation,
                format!("unknown texture {}", texture.get()),
            ))
        }
    }

    fn require_program(&self, operation: &'static str) -> Result<(), BackendError> {
        self.program
            .map(|_| ())
            .ok_or_else(|| BackendError::new(operation, "no program bound"))
    }
}

impl GpuBackend for HeadlessBackend {
    fn create_buffer(&mut self) -> Result<BufferId, BackendError> {
        let id = BufferId(self.allocate("create_buffer")?);
        self.buffers.insert(id, Vec::new());
        self.calls.push(BackendCall::CreateBuffer(id));
        Ok(id)
    }

    fn upload_buffer_data(
        &mut self,
        buffer: BufferId,
        target: BufferTarget,
        data: &[u8],
    ) -> Result<(), BackendError> {
        self.check_fault("upload_buffer_data")?;
        let slot = self.buffers.get_mut(&buffer).ok_or_else(|| {
            BackendError::new("upload_buffer_data", format!("unknown buffer {}", buffer.get()))
        })?;
        slot.clear();
        slot.extend_from_slice(data);
        self.calls.push(BackendCall::UploadBufferData {
            buffer,
            target,
            len: data.len(),
        });
        Ok(())
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, BackendError> {
        let id = VertexArrayId(self.allocate("create_vertex_array")?);
        self.vertex_arrays.insert(id);
        self.calls.push(BackendCall::CreateVertexArray(id));
        Ok(id)
    }

    fn configure_attribute(
        &mut self,
        vertex_array: VertexArrayId,
        buffer: BufferId,
        layout: &AttributeLayout,
    ) -> Result<(), BackendError> {
        self.check_fault("configure_attribute")?;
        self.require_vertex_array("configure_attribute", vertex_array)?;
        self.require_buffer("configure_attribute", buffer)?;
        self.calls.push(BackendCall::ConfigureAttribute {
            vertex_array,
            buffer,
            layout: *layout,
        });
        Ok(())
    }

    fn bind_index_buffer(
        &mut self,
        vertex_array: VertexArrayId,
        buffer: BufferId,
    ) -> Result<(), BackendError> {
        self.check_fault("bind_index_buffer")?;
        self.require_vertex_array("bind_index_buffer", vertex_array)?;
        self.require_buffer("bind_index_buffer", buffer)?;
        self.calls.push(BackendCall::BindIndexBuffer {
            vertex_array,
            buffer,
        });
        Ok(())
    }

    fn create_texture(&mut self) -> Result<TextureId, BackendError> {
        let id = TextureId(self.allocate("create_texture")?);
        self.textures.insert(id);
        self.calls.push(BackendCall::CreateTexture(id));
        Ok(id)
    }

    fn upload_texture_data(
        &mut self,
        texture: TextureId,
        image: &TextureImage,
        sampler: &Sampler,
        generate_mipmaps: bool,
    ) -> Result<(), BackendError> {
        self.check_fault("upload_texture_data")?;
        self.require_texture("upload_texture_data", texture)?;
        self.calls.push(BackendCall::UploadTextureData {
            texture,
            width: image.width,
            height: image.height,
            sampler: *sampler,
            generate_mipmaps,
        });
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_none() {
            trace!("Deleting unknown buffer {}", buffer.get());
        }
        self.calls.push(BackendCall::DeleteBuffer(buffer));
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if !self.vertex_arrays.remove(&vertex_array) {
            trace!("Deleting unknown vertex array {}", vertex_array.get());
        }
        self.calls.push(BackendCall::DeleteVertexArray(vertex_array));
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if !self.textures.remove(&texture) {
            trace!("Deleting unknown texture {}", texture.get());
        }
        self.calls.push(BackendCall::DeleteTexture(texture));
    }
}

impl ShaderBackend for HeadlessBackend {
    fn bind_program(&mut self, program: ProgramId) -> Result<(), BackendError> {
        self.check_fault("bind_program")?;
        self.program = Some(program);
        self.calls.push(BackendCall::BindProgram(program));
        Ok(())
    }

    fn set_uniform_mat4(&mut self, name: &str, value: &Mat4) -> Result<(), BackendError> {
        self.require_program("set_uniform_mat4")?;
        self.calls.push(BackendCall::SetUniformMat4 {
            name: name.to_string(),
            value: *value,
        });
        Ok(())
    }

    fn set_uniform_vec4(&mut self, name: &str, value: Vec4) -> Result<(), BackendError> {
        self.require_program("set_uniform_vec4")?;
        self.calls.push(BackendCall::SetUniformVec4 {
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn set_uniform_int(&mut self, name: &str, value: i32) -> Result<(), BackendError> {
        self.require_program("set_uniform_int")?;
        self.calls.push(BackendCall::SetUniformInt {
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn bind_texture_slot(&mut self, slot: u32, texture: TextureId) -> Result<(), BackendError> {
        self.require_texture("bind_texture_slot", texture)?;
        self.calls.push(BackendCall::BindTextureSlot { slot, texture });
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        vertex_array: VertexArrayId,
        mode: PrimitiveMode,
        index_type: IndexType,
        count: u32,
        byte_offset: u32,
    ) -> Result<(), BackendError> {
        self.check_fault("draw_indexed")?;
        self.require_program("draw_indexed")?;
        self.require_vertex_array("draw_indexed", vertex_array)?;
        self.calls.push(BackendCall::DrawIndexed {
            vertex_array,
            mode,
            index_type,
            count,
            byte_offset,
        });
        Ok(())
    }

    fn draw_arrays(
        &mut self,
        vertex_array: VertexArrayId,
        mode: PrimitiveMode,
        first: u32,
        count: u32,
    ) -> Result<(), BackendError> {
        self.check_fault("draw_arrays")?;
        self.require_program("draw_arrays")?;
        self.require_vertex_array("draw_arrays", vertex_array)?;
        self.calls.push(BackendCall::DrawArrays {
            vertex_array,
            mode,
            first,
            count,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_fault_fires_once() {
        let mut gpu = HeadlessBackend::new();
        gpu.fail_on("create_buffer", 1);

        assert!(gpu.create_buffer().is_ok());
        assert!(gpu.create_buffer().is_err());
        assert!(gpu.create_buffer().is_ok());
        assert_eq!(gpu.live_buffers(), 2);
    }

    #[test]
    fn deleted_resources_are_no_longer_live() {
        let mut gpu = HeadlessBackend::new();
        let buffer = gpu.create_buffer().unwrap();
        let texture = gpu.create_texture().unwrap();
        assert_eq!(gpu.live_resources(), 2);

        gpu.delete_buffer(buffer);
        gpu.delete_texture(texture);
        assert_eq!(gpu.live_resources(), 0);
    }
}
