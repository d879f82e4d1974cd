//! Engine Settings
//!
//! [`EngineSettings`] controls playback and draw-list production. Every field
//! has a default, so a settings file only needs the values it changes.
//!
//! # Example
//!
//! ```rust,ignore
//! use marionette::EngineSettings;
//!
//! let settings = EngineSettings::from_json_str(r#"{
//!     "animation": 1,
//!     "time_scale": 0.5,
//!     "scenes": "default"
//! }"#)?;
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::assets::LoadOptions;
use crate::errors::SettingsError;
use crate::render::submit::UniformNames;
use crate::scene::SceneSelection;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Animation bound when an asset becomes active. `None` disables playback.
    pub animation: Option<usize>,
    /// Start playing immediately; otherwise the player starts paused.
    pub autoplay: bool,
    /// Multiplier applied to every frame delta before it reaches the player.
    pub time_scale: f32,
    /// Scenes traversed for drawing.
    pub scenes: SceneSelection,
    /// Uniform names used when submitting draw lists.
    pub uniforms: UniformNames,
    /// Generate mip chains for uploaded textures.
    pub generate_mipmaps: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            animation: Some(0),
            autoplay: true,
            time_scale: 1.0,
            scenes: SceneSelection::All,
            uniforms: UniformNames::default(),
            generate_mipmaps: false,
        }
    }
}

impl EngineSettings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            generate_mipmaps: self.generate_mipmaps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = EngineSettings::from_json_str(r#"{ "time_scale": 2.0 }"#).unwrap();
        assert_eq!(settings.time_scale, 2.0);
        assert_eq!(settings.animation, Some(0));
        assert_eq!(settings.uniforms.model, "u_model");
    }

    #[test]
    fn scene_selection_parses_index() {
        let settings = EngineSettings::from_json_str(r#"{ "scenes": { "index": 1 } }"#).unwrap();
        assert_eq!(settings.scenes, SceneSelection::Index(1));

        let settings = EngineSettings::from_json_str(r#"{ "scenes": "default" }"#).unwrap();
        assert_eq!(settings.scenes, SceneSelection::Default);
    }
}
