use serde::Deserialize;

use crate::errors::BackendError;
use crate::render::backend::{ProgramId, ShaderBackend};
use crate::render::draw_list::{DrawCall, DrawList};

/// Texture unit the base texture is bound to.
pub const BASE_TEXTURE_SLOT: u32 = 0;

/// Uniform names the draw commands are uploaded to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UniformNames {
    pub model: String,
    pub base_color: String,
    pub texture_slot: String,
}

impl Default for UniformNames {
    fn default() -> Self {
        Self {
            model: "u_model".to_string(),
            base_color: "u_base_color".to_string(),
            texture_slot: "tex_slot".to_string(),
        }
    }
}

/// Replays `draw_list` on `shader` in emission order.
///
/// Binds `program` once, then for each command uploads the model matrix and
/// base color, binds the base texture and issues the draw. Returns the number
/// of draws issued.
pub fn submit<S: ShaderBackend + ?Sized>(
    shader: &mut S,
    program: ProgramId,
    draw_list: &DrawList,
    uniforms: &UniformNames,
) -> Result<usize, BackendError> {
    shader.bind_program(program)?;

    for command in draw_list {
        shader.set_uniform_mat4(&uniforms.model, &command.world)?;
        shader.set_uniform_vec4(&uniforms.base_color, command.base_color)?;
        shader.bind_texture_slot(BASE_TEXTURE_SLOT, command.texture)?;
        shader.set_uniform_int(&uniforms.texture_slot, BASE_TEXTURE_SLOT as i32)?;

        match command.draw {
            DrawCall::Indexed {
                mode,
                index_type,
                count,
                byte_offset,
            } => shader.draw_indexed(command.vertex_array, mode, index_type, count, byte_offset)?,
            DrawCall::Arrays { mode, first, count } => {
                shader.draw_arrays(command.vertex_array, mode, first, count)?;
            }
        }
    }

    Ok(draw_list.len())
}
