//! Engine Core Module
//!
//! [`Engine`] owns the GPU backend, the loaded assets, the default material
//! and the animation player, and runs the per-frame pipeline in its required
//! order:
//!
//! 1. the [`AnimationPlayer`] advances and writes pose overrides,
//! 2. the [`TransformSystem`] composes world transforms,
//! 3. [`produce`] emits the frame's [`DrawList`].
//!
//! It has no window or event loop; the caller supplies frame deltas (see
//! [`FrameClock`](crate::utils::FrameClock)).
//!
//! # Example
//!
//! ```rust,ignore
//! use marionette::{Engine, EngineSettings, HeadlessBackend};
//!
//! let mut engine = Engine::new(HeadlessBackend::new(), EngineSettings::default())?;
//! engine.load("assets/Fox.glb")?;
//!
//! loop {
//!     if let Some(draw_list) = engine.frame(clock.tick()) {
//!         // ... hand draw_list to a renderer ...
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::animation::AnimationPlayer;
use crate::assets::decoder;
use crate::assets::{AssetHandle, AssetSource, AssetStorage, SceneAsset};
use crate::errors::{MarionetteError, Result};
use crate::render::backend::{GpuBackend, ProgramId, ShaderBackend};
use crate::render::draw_list::{DrawList, produce};
use crate::render::submit::submit;
use crate::resources::DefaultMaterial;
use crate::scene::TransformSystem;
use crate::settings::EngineSettings;

/// Loads assets, plays their animation and produces draw lists.
///
/// # Lifecycle
///
/// 1. Create with [`Engine::new`] (creates the default material)
/// 2. [`load`](Self::load) an asset; it becomes the active asset
/// 3. Call [`frame`](Self::frame) (or [`render`](Self::render)) once per tick
/// 4. [`shutdown`](Self::shutdown) releases every GPU resource and returns the backend
pub struct Engine<G: GpuBackend> {
    gpu: G,
    settings: EngineSettings,
    defaults: DefaultMaterial,
    assets: AssetStorage,
    active: Option<AssetHandle>,
    player: Option<AnimationPlayer>,
    transforms: TransformSystem,

    time: f32,
    frame_count: u64,
    skipped_frames: u64,
}

impl<G: GpuBackend> Engine<G> {
    pub fn new(mut gpu: G, settings: EngineSettings) -> Result<Self> {
        let defaults = DefaultMaterial::create(&mut gpu)?;
        Ok(Self {
            gpu,
            settings,
            defaults,
            assets: AssetStorage::new(),
            active: None,
            player: None,
            transforms: TransformSystem::new(),
            time: 0.0,
            frame_count: 0,
            skipped_frames: 0,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    #[inline]
    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    #[inline]
    #[must_use]
    pub fn assets(&self) -> &AssetStorage {
        &self.assets
    }

    #[inline]
    #[must_use]
    pub fn default_material(&self) -> &DefaultMaterial {
        &self.defaults
    }

    #[inline]
    #[must_use]
    pub fn active_handle(&self) -> Option<AssetHandle> {
        self.active
    }

    #[must_use]
    pub fn active_asset(&self) -> Option<&SceneAsset> {
        self.assets.get(self.active?)
    }

    pub fn active_asset_mut(&mut self) -> Option<&mut SceneAsset> {
        self.assets.get_mut(self.active?)
    }

    #[inline]
    #[must_use]
    pub fn player(&self) -> Option<&AnimationPlayer> {
        self.player.as_ref()
    }

    /// Total scaled time fed to the player, in seconds.
    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames dropped because the scene graph could not be traversed.
    #[inline]
    #[must_use]
    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    // ========================================================================
    // Asset lifecycle
    // ========================================================================

    /// Loads the asset at `path` and makes it the active asset.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<AssetHandle> {
        let asset = decoder::load_with_options(path, &mut self.gpu, self.settings.load_options())?;
        Ok(self.insert_and_activate(asset))
    }

    /// Loads an asset held in memory and makes it the active asset.
    pub fn load_from_slice(&mut self, bytes: &[u8], base_dir: Option<&Path>) -> Result<AssetHandle> {
        let source = AssetSource::from_slice(bytes, base_dir)?;
        let asset = decoder::decode(&source, &mut self.gpu, self.settings.load_options())?;
        Ok(self.insert_and_activate(asset))
    }

    fn insert_and_activate(&mut self, asset: SceneAsset) -> AssetHandle {
        let handle = self.assets.insert(asset);
        self.bind_active(handle);
        handle
    }

    /// Makes `handle` the active asset and rebinds the player.
    pub fn activate(&mut self, handle: AssetHandle) -> Result<()> {
        if !self.assets.contains(handle) {
            return Err(MarionetteError::StaleHandle);
        }
        self.bind_active(handle);
        Ok(())
    }

    fn bind_active(&mut self, handle: AssetHandle) {
        self.active = Some(handle);
        self.player = None;

        let Some(asset) = self.assets.get(handle) else {
            return;
        };
        let Some(index) = self.settings.animation else {
            return;
        };

        match AnimationPlayer::bind(asset.animations(), index) {
            Some(mut player) => {
                if !self.settings.autoplay {
                    player.pause();
                }
                debug!(
                    "Bound animation {index} ({:?}, {:.3}s)",
                    asset.animations()[index].name,
                    asset.animations()[index].duration()
                );
                self.player = Some(player);
            }
            None if !asset.animations().is_empty() => {
                warn!(
                    "Animation {index} does not exist ({} available); playback disabled",
                    asset.animations().len()
                );
            }
            None => {}
        }
    }

    /// Re-reads the file `handle` was loaded from.
    ///
    /// See [`replace`](Self::replace) for the atomicity guarantees.
    pub fn reload(&mut self, handle: AssetHandle) -> Result<AssetHandle> {
        let path: PathBuf = self
            .assets
            .get(handle)
            .ok_or(MarionetteError::StaleHandle)?
            .source_path()
            .ok_or(MarionetteError::NotReloadable)?
            .to_path_buf();
        self.replace(handle, path)
    }

    /// Replaces the asset behind `handle` with the one at `path`.
    ///
    /// The new asset is fully built before the old one is touched. If loading
    /// fails the old asset stays in place and `handle` stays valid. On success
    /// the old asset's GPU resources are released and `handle` becomes stale;
    /// use the returned handle instead.
    pub fn replace(&mut self, handle: AssetHandle, path: impl AsRef<Path>) -> Result<AssetHandle> {
        if !self.assets.contains(handle) {
            return Err(MarionetteError::StaleHandle);
        }

        let asset = decoder::load_with_options(path, &mut self.gpu, self.settings.load_options())?;
        let (new_handle, mut old) = self
            .assets
            .replace(handle, asset)
            .ok_or(MarionetteError::StaleHandle)?;
        old.release(&mut self.gpu);

        if self.active == Some(handle) {
            self.bind_active(new_handle);
        }
        info!("Replaced asset {handle:?} with {new_handle:?}");
        Ok(new_handle)
    }

    /// Releases and removes an asset.
    pub fn unload(&mut self, handle: AssetHandle) -> Result<()> {
        let mut asset = self.assets.remove(handle).ok_or(MarionetteError::StaleHandle)?;
        asset.release(&mut self.gpu);
        if self.active == Some(handle) {
            self.active = None;
            self.player = None;
        }
        Ok(())
    }

    // ========================================================================
    // Frame pipeline
    // ========================================================================

    /// Pauses playback of the active animation.
    pub fn pause(&mut self) {
        if let Some(player) = &mut self.player {
            player.pause();
        }
    }

    /// Runs one frame and returns its draw list.
    ///
    /// Returns `None` when there is no active asset, or when the scene graph
    /// cannot be traversed; the latter is logged and counted in
    /// [`skipped_frames`](Self::skipped_frames).
    pub fn frame(&mut self, dt: f32) -> Option<DrawList> {
        self.frame_count += 1;
        let asset = self.assets.get_mut(self.active?)?;

        let scaled = dt * self.settings.time_scale;
        if let Some(player) = &mut self.player {
            player.advance(scaled, asset);
        }
        if scaled.is_finite() {
            self.time += scaled;
        }

        match self.transforms.compute(asset.graph(), self.settings.scenes) {
            Ok(world) => Some(produce(asset, &world, &self.defaults)),
            Err(err) => {
                self.skipped_frames += 1;
                log::error!("Skipping frame {}: {err}", self.frame_count);
                None
            }
        }
    }

    /// Runs one frame and submits it with `program`. Returns the number of
    /// draws issued (zero for a skipped frame).
    pub fn render(&mut self, dt: f32, program: ProgramId) -> Result<usize>
    where
        G: ShaderBackend,
    {
        let Some(draw_list) = self.frame(dt) else {
            return Ok(0);
        };
        Ok(submit(&mut self.gpu, program, &draw_list, &self.settings.uniforms)?)
    }

    /// Releases every asset and the default material, and hands back the backend.
    #[must_use]
    pub fn shutdown(mut self) -> G {
        self.assets.release_all(&mut self.gpu);
        self.defaults.destroy(&mut self.gpu);
        self.gpu
    }
}
