#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Marionette
//!
//! Loads glTF 2.0 assets (`.gltf`, `.glb`, embedded data URIs), uploads their
//! geometry and textures through a [`GpuBackend`], plays keyframe animation on
//! the decoded scene graph and produces a per-frame [`DrawList`].
//!
//! - [`assets`]: document parsing, accessor decoding and GPU upload
//! - [`scene`]: node arena, local poses and world transform composition
//! - [`animation`]: keyframe channels, evaluation and playback
//! - [`render`]: backend traits, draw list production and submission
//! - [`resources`]: GPU-side buffers, meshes, textures and materials
//! - [`engine`]: the frame loop tying these together

pub mod animation;
pub mod assets;
pub mod engine;
pub mod errors;
pub mod render;
pub mod resources;
pub mod scene;
pub mod settings;
pub mod utils;

pub use animation::{Animation, AnimationChannel, AnimationPlayer, Interpolation, TargetPath};
pub use assets::{AssetHandle, AssetStorage, LoadOptions, SceneAsset, load, load_from_slice};
pub use engine::Engine;
pub use errors::{
    BackendError, DecodeError, GraphError, LoadError, MarionetteError, Result, SettingsError,
};
#[cfg(all(feature = "gl", not(target_arch = "wasm32")))]
pub use render::GlBackend;
pub use render::{
    DrawCommand, DrawList, GpuBackend, HeadlessBackend, ShaderBackend, produce, submit,
};
pub use scene::{Node, SceneGraph, SceneSelection, TransformSystem, WorldTransforms};
pub use settings::EngineSettings;
pub use utils::FrameClock;
