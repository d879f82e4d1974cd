use glam::Vec4;
use log::debug;

use crate::errors::BackendError;
use crate::render::backend::{GpuBackend, TextureId};
use crate::resources::texture::{Sampler, Texture2D, TextureImage};

/// Unlit base color and an optional base texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: Vec4,
    /// Index into [`SceneAsset::textures`](crate::assets::SceneAsset::textures)
    pub base_texture: Option<usize>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_color: Vec4::ONE,
            base_texture: None,
        }
    }
}

/// The material used by submeshes without one, and the white texture used by
/// materials without a base texture.
///
/// Created once at engine init and destroyed at shutdown.
#[derive(Debug)]
pub struct DefaultMaterial {
    pub material: Material,
    pub texture: Texture2D,
}

impl DefaultMaterial {
    pub fn create<G: GpuBackend + ?Sized>(gpu: &mut G) -> Result<Self, BackendError> {
        let texture = Texture2D::upload(gpu, None, TextureImage::white(), Sampler::default(), false)?;
        debug!("Created default material (white texture {:?})", texture.id);
        Ok(Self {
            material: Material {
                name: "default".to_string(),
                ..Material::default()
            },
            texture,
        })
    }

    #[inline]
    #[must_use]
    pub fn texture_id(&self) -> TextureId {
        self.texture.id
    }

    pub fn destroy<G: GpuBackend + ?Sized>(self, gpu: &mut G) {
        gpu.delete_texture(self.texture.id);
    }
}
