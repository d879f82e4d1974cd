//! Rendering seams
//!
//! - [`backend`]: the [`GpuBackend`] and [`ShaderBackend`] traits and their id types
//! - [`headless`]: in-memory backend that records calls
//! - [`gl`]: OpenGL backend (`gl` feature)
//! - [`draw_list`]: per-frame draw command production
//! - [`submit`]: replays a draw list on a shader backend

pub mod backend;
pub mod draw_list;
#[cfg(all(feature = "gl", not(target_arch = "wasm32")))]
pub mod gl;
pub mod headless;
pub mod submit;

pub use backend::{BufferId, GpuBackend, ProgramId, ShaderBackend, TextureId, VertexArrayId};
pub use draw_list::{DrawCall, DrawCommand, DrawList, produce};
#[cfg(all(feature = "gl", not(target_arch = "wasm32")))]
pub use gl::GlBackend;
pub use headless::{BackendCall, HeadlessBackend};
pub use submit::{BASE_TEXTURE_SLOT, UniformNames, submit};
