use crate::errors::BackendError;
use crate::render::backend::{GpuBackend, TextureId};

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    /// A single opaque white pixel.
    #[must_use]
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        }
    }

    /// Decodes a PNG or JPEG image into RGBA8.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

impl WrapMode {
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            10497 => Some(Self::Repeat),
            33071 => Some(Self::ClampToEdge),
            33648 => Some(Self::MirroredRepeat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// Minification filter, optionally sampling between mip levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MinFilter {
    pub texel: FilterMode,
    pub mipmap: Option<FilterMode>,
}

impl MinFilter {
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        use FilterMode::{Linear, Nearest};
        let (texel, mipmap) = match code {
            9728 => (Nearest, None),
            9729 => (Linear, None),
            9984 => (Nearest, Some(Nearest)),
            9985 => (Linear, Some(Nearest)),
            9986 => (Nearest, Some(Linear)),
            9987 => (Linear, Some(Linear)),
            _ => return None,
        };
        Some(Self { texel, mipmap })
    }
}

/// Texture sampling state. Defaults to repeat wrapping with linear filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sampler {
    pub mag_filter: FilterMode,
    pub min_filter: MinFilter,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
}

/// A GPU texture and the image it was created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture2D {
    pub id: TextureId,
    /// Document image index, `None` for engine-created textures
    pub source: Option<usize>,
    pub image: TextureImage,
    pub sampler: Sampler,
}

impl Texture2D {
    /// Creates a texture and uploads `image` into it.
    pub fn upload<G: GpuBackend + ?Sized>(
        gpu: &mut G,
        source: Option<usize>,
        image: TextureImage,
        sampler: Sampler,
        generate_mipmaps: bool,
    ) -> Result<Self, BackendError> {
        let id = gpu.create_texture()?;
        if let Err(err) = gpu.upload_texture_data(id, &image, &sampler, generate_mipmaps) {
            gpu.delete_texture(id);
            return Err(err);
        }
        Ok(Self {
            id,
            source,
            image,
            sampler,
        })
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.image.width, self.image.height)
    }
}
