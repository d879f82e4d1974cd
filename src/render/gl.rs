//! OpenGL backend on top of `glow`.
//!
//! The caller owns context creation and shader compilation; programs are
//! handed in as [`ProgramId`]s wrapping native program names.

use glam::{Mat4, Vec4};
use glow::HasContext;
use log::trace;
use rustc_hash::FxHashMap;

use crate::assets::accessor::ComponentType;
use crate::errors::BackendError;
use crate::render::backend::{
    BufferId, GpuBackend, ProgramId, ShaderBackend, TextureId, VertexArrayId,
};
use crate::resources::buffer::BufferTarget;
use crate::resources::mesh::{AttributeLayout, AttributeSlot, IndexType, PrimitiveMode};
use crate::resources::texture::{FilterMode, MinFilter, Sampler, TextureImage, WrapMode};

pub struct GlBackend {
    gl: glow::Context,
    program: Option<ProgramId>,
    uniforms: FxHashMap<(ProgramId, String), Option<glow::UniformLocation>>,
}

impl GlBackend {
    #[must_use]
    pub fn new(gl: glow::Context) -> Self {
        Self {
            gl,
            program: None,
            uniforms: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    /// Wraps a linked native program.
    #[must_use]
    pub fn program_id(program: glow::Program) -> ProgramId {
        ProgramId(program.0)
    }

    fn uniform_location(&mut self, name: &str) -> Option<glow::UniformLocation> {
        let program = self.program?;
        let gl = &self.gl;
        self.uniforms
            .entry((program, name.to_string()))
            .or_insert_with(|| {
                let location =
                    unsafe { gl.get_uniform_location(glow::NativeProgram(program.0), name) };
                if location.is_none() {
                    trace!("Uniform {name} not found in program {}", program.get());
                }
                location
            })
            .clone()
    }
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn component_type(component_type: ComponentType) -> u32 {
    match component_type {
        ComponentType::I8 => glow::BYTE,
        ComponentType::U8 => glow::UNSIGNED_BYTE,
        ComponentType::I16 => glow::SHORT,
        ComponentType::U16 => glow::UNSIGNED_SHORT,
        ComponentType::I32 => glow::INT,
        ComponentType::U32 => glow::UNSIGNED_INT,
        ComponentType::F32 => glow::FLOAT,
        ComponentType::F64 => glow::DOUBLE,
    }
}

fn index_type(index_type: IndexType) -> u32 {
    match index_type {
        IndexType::U8 => glow::UNSIGNED_BYTE,
        IndexType::U16 => glow::UNSIGNED_SHORT,
        IndexType::U32 => glow::UNSIGNED_INT,
    }
}

fn primitive_mode(mode: PrimitiveMode) -> u32 {
    match mode {
        PrimitiveMode::Points => glow::POINTS,
        PrimitiveMode::Lines => glow::LINES,
        PrimitiveMode::LineLoop => glow::LINE_LOOP,
        PrimitiveMode::LineStrip => glow::LINE_STRIP,
        PrimitiveMode::Triangles => glow::TRIANGLES,
        PrimitiveMode::TriangleStrip => glow::TRIANGLE_STRIP,
        PrimitiveMode::TriangleFan => glow::TRIANGLE_FAN,
    }
}

fn wrap_mode(mode: WrapMode) -> i32 {
    (match mode {
        WrapMode::Repeat => glow::REPEAT,
        WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
        WrapMode::MirroredRepeat => glow::MIRRORED_REPEAT,
    }) as i32
}

fn mag_filter(filter: FilterMode) -> i32 {
    (match filter {
        FilterMode::Nearest => glow::NEAREST,
        FilterMode::Linear => glow::LINEAR,
    }) as i32
}

fn min_filter(filter: MinFilter, has_mipmaps: bool) -> i32 {
    let mipmap = if has_mipmaps { filter.mipmap } else { None };
    (match (filter.texel, mipmap) {
        (FilterMode::Nearest, None) => glow::NEAREST,
        (FilterMode::Linear, None) => glow::LINEAR,
        (FilterMode::Nearest, Some(FilterMode::Nearest)) => glow::NEAREST_MIPMAP_NEAREST,
        (FilterMode::Linear, Some(FilterMode::Nearest)) => glow::LINEAR_MIPMAP_NEAREST,
        (FilterMode::Nearest, Some(FilterMode::Linear)) => glow::NEAREST_MIPMAP_LINEAR,
        (FilterMode::Linear, Some(FilterMode::Linear)) => glow::LINEAR_MIPMAP_LINEAR,
    }) as i32
}

impl GpuBackend for GlBackend {
    fn create_buffer(&mut self) -> Result<BufferId, BackendError> {
        let buffer = unsafe { self.gl.create_buffer() }
            .map_err(|e| BackendError::new("create_buffer", e))?;
        Ok(BufferId(buffer.0))
    }

    fn upload_buffer_data(
        &mut self,
        buffer: BufferId,
        target: BufferTarget,
        data: &[u8],
    ) -> Result<(), BackendError> {
        let target = buffer_target(target);
        unsafe {
            // Element array bindings are vertex array state
            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(target, Some(glow::NativeBuffer(buffer.0)));
            self.gl.buffer_data_u8_slice(target, data, glow::STATIC_DRAW);
            self.gl.bind_buffer(target, None);
        }
        Ok(())
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, BackendError> {
        let vao = unsafe { self.gl.create_vertex_array() }
            .map_err(|e| BackendError::new("create_vertex_array", e))?;
        Ok(VertexArrayId(vao.0))
    }

    fn configure_attribute(
        &mut self,
        vertex_array: VertexArrayId,
        buffer: BufferId,
        layout: &AttributeLayout,
    ) -> Result<(), BackendError> {
        let location = layout.slot.location();
        let size = i32::from(layout.components);
        let data_type = component_type(layout.component_type);
        let stride = layout.stride as i32;
        let offset = layout.offset as i32;
        let integer = layout.slot == AttributeSlot::Joints0 && !layout.component_type.is_float();

        unsafe {
            self.gl
                .bind_vertex_array(Some(glow::NativeVertexArray(vertex_array.0)));
            self.gl
                .bind_buffer(glow::ARRAY_BUFFER, Some(glow::NativeBuffer(buffer.0)));
            self.gl.enable_vertex_attrib_array(location);
            if integer {
                self.gl
                    .vertex_attrib_pointer_i32(location, size, data_type, stride, offset);
            } else {
                self.gl.vertex_attrib_pointer_f32(
                    location,
                    size,
                    data_type,
                    layout.normalized,
                    stride,
                    offset,
                );
            }
            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
        Ok(())
    }

    fn bind_index_buffer(
        &mut self,
        vertex_array: VertexArrayId,
        buffer: BufferId,
    ) -> Result<(), BackendError> {
        unsafe {
            self.gl
                .bind_vertex_array(Some(glow::NativeVertexArray(vertex_array.0)));
            self.gl.bind_buffer(
                glow::ELEMENT_ARRAY_BUFFER,
                Some(glow::NativeBuffer(buffer.0)),
            );
            self.gl.bind_vertex_array(None);
        }
        Ok(())
    }

    fn create_texture(&mut self) -> Result<TextureId, BackendError> {
        let texture = unsafe { self.gl.create_texture() }
            .map_err(|e| BackendError::new("create_texture", e))?;
        Ok(TextureId(texture.0))
    }

    fn upload_texture_data(
        &mut self,
        texture: TextureId,
        image: &TextureImage,
        sampler: &Sampler,
        generate_mipmaps: bool,
    ) -> Result<(), BackendError> {
        let expected = image.width as usize * image.height as usize * 4;
        if image.pixels.len() != expected {
            return Err(BackendError::new(
                "upload_texture_data",
                format!("expected {expected} RGBA8 bytes, got {}", image.pixels.len()),
            ));
        }

        unsafe {
            let gl = &self.gl;
            gl.bind_texture(glow::TEXTURE_2D, Some(glow::NativeTexture(texture.0)));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap_mode(sampler.wrap_s));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap_mode(sampler.wrap_t));
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                mag_filter(sampler.mag_filter),
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                min_filter(sampler.min_filter, generate_mipmaps),
            );
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                image.width as i32,
                image.height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(&image.pixels)),
            );
            if generate_mipmaps {
                gl.generate_mipmap(glow::TEXTURE_2D);
            }
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.0)) };
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        unsafe {
            self.gl
                .delete_vertex_array(glow::NativeVertexArray(vertex_array.0));
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) };
    }
}

impl ShaderBackend for GlBackend {
    fn bind_program(&mut self, program: ProgramId) -> Result<(), BackendError> {
        unsafe { self.gl.use_program(Some(glow::NativeProgram(program.0))) };
        self.program = Some(program);
        Ok(())
    }

    fn set_uniform_mat4(&mut self, name: &str, value: &Mat4) -> Result<(), BackendError> {
        if let Some(location) = self.uniform_location(name) {
            unsafe {
                self.gl
                    .uniform_matrix_4_f32_slice(Some(&location), false, &value.to_cols_array());
            }
        }
        Ok(())
    }

    fn set_uniform_vec4(&mut self, name: &str, value: Vec4) -> Result<(), BackendError> {
        if let Some(location) = self.uniform_location(name) {
            unsafe {
                self.gl
                    .uniform_4_f32(Some(&location), value.x, value.y, value.z, value.w);
            }
        }
        Ok(())
    }

    fn set_uniform_int(&mut self, name: &str, value: i32) -> Result<(), BackendError> {
        if let Some(location) = self.uniform_location(name) {
            unsafe { self.gl.uniform_1_i32(Some(&location), value) };
        }
        Ok(())
    }

    fn bind_texture_slot(&mut self, slot: u32, texture: TextureId) -> Result<(), BackendError> {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + slot);
            self.gl
                .bind_texture(glow::TEXTURE_2D, Some(glow::NativeTexture(texture.0)));
        }
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        vertex_array: VertexArrayId,
        mode: PrimitiveMode,
        index: IndexType,
        count: u32,
        byte_offset: u32,
    ) -> Result<(), BackendError> {
        unsafe {
            self.gl
                .bind_vertex_array(Some(glow::NativeVertexArray(vertex_array.0)));
            self.gl.draw_elements(
                primitive_mode(mode),
                count as i32,
                index_type(index),
                byte_offset as i32,
            );
            self.gl.bind_vertex_array(None);
        }
        Ok(())
    }

    fn draw_arrays(
        &mut self,
        vertex_array: VertexArrayId,
        mode: PrimitiveMode,
        first: u32,
        count: u32,
    ) -> Result<(), BackendError> {
        unsafe {
            self.gl
                .bind_vertex_array(Some(glow::NativeVertexArray(vertex_array.0)));
            self.gl
                .draw_arrays(primitive_mode(mode), first as i32, count as i32);
            self.gl.bind_vertex_array(None);
        }
        Ok(())
    }
}
