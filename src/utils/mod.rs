//! Utility Module
//!
//! - [`time`]: [`FrameClock`], the per-tick delta source for [`Engine::frame`](crate::Engine::frame)

pub mod time;

pub use time::FrameClock;
