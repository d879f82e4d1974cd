use log::trace;
use rustc_hash::FxHashMap;

use crate::errors::BackendError;
use crate::render::backend::{BufferId, GpuBackend};

/// Binding point a buffer is uploaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attributes (`ARRAY_BUFFER`)
    Array,
    /// Indices (`ELEMENT_ARRAY_BUFFER`)
    ElementArray,
}

impl BufferTarget {
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            34962 => Some(Self::Array),
            34963 => Some(Self::ElementArray),
            _ => None,
        }
    }
}

/// One buffer view uploaded to the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuBuffer {
    pub id: BufferId,
    pub view: usize,
    pub target: BufferTarget,
    pub byte_length: usize,
}

/// GPU buffers keyed by buffer view index.
///
/// A view is uploaded the first time a primitive needs it and reused by every
/// later primitive; it is never uploaded twice.
#[derive(Debug, Default)]
pub struct BufferCache {
    buffers: FxHashMap<usize, GpuBuffer>,
}

impl BufferCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached buffer for `view`, uploading `data` on first use.
    pub fn get_or_upload<G: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut G,
        view: usize,
        target: BufferTarget,
        data: &[u8],
    ) -> Result<GpuBuffer, BackendError> {
        if let Some(buffer) = self.buffers.get(&view) {
            return Ok(*buffer);
        }

        let id = gpu.create_buffer()?;
        if let Err(err) = gpu.upload_buffer_data(id, target, data) {
            gpu.delete_buffer(id);
            return Err(err);
        }
        trace!("Uploaded buffer view {view} ({} bytes) as {target:?}", data.len());

        let buffer = GpuBuffer {
            id,
            view,
            target,
            byte_length: data.len(),
        };
        self.buffers.insert(view, buffer);
        Ok(buffer)
    }

    #[must_use]
    pub fn get(&self, view: usize) -> Option<&GpuBuffer> {
        self.buffers.get(&view)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GpuBuffer> + '_ {
        self.buffers.values()
    }

    /// Deletes every cached buffer.
    pub fn release<G: GpuBackend + ?Sized>(&mut self, gpu: &mut G) {
        for (_, buffer) in self.buffers.drain() {
            gpu.delete_buffer(buffer.id);
        }
    }
}
