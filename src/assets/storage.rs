use slotmap::{SlotMap, new_key_type};

use crate::assets::SceneAsset;
use crate::render::backend::GpuBackend;

new_key_type! {
    /// Generational handle to a loaded [`SceneAsset`].
    ///
    /// Replacing or removing an asset invalidates every handle to it.
    pub struct AssetHandle;
}

/// Loaded assets, addressed by generational handles.
#[derive(Debug, Default)]
pub struct AssetStorage {
    map: SlotMap<AssetHandle, SceneAsset>,
}

impl AssetStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: SceneAsset) -> AssetHandle {
        self.map.insert(asset)
    }

    #[must_use]
    pub fn get(&self, handle: AssetHandle) -> Option<&SceneAsset> {
        self.map.get(handle)
    }

    pub fn get_mut(&mut self, handle: AssetHandle) -> Option<&mut SceneAsset> {
        self.map.get_mut(handle)
    }

    #[must_use]
    pub fn contains(&self, handle: AssetHandle) -> bool {
        self.map.contains_key(handle)
    }

    /// Removes an asset without releasing its GPU resources.
    pub fn remove(&mut self, handle: AssetHandle) -> Option<SceneAsset> {
        self.map.remove(handle)
    }

    /// Swaps in `asset` for `handle`.
    ///
    /// Returns the new handle and the previous asset, whose GPU resources the
    /// caller still has to release. `None` (and `asset` is dropped unused) if
    /// `handle` is stale.
    pub fn replace(
        &mut self,
        handle: AssetHandle,
        asset: SceneAsset,
    ) -> Option<(AssetHandle, SceneAsset)> {
        let old = self.map.remove(handle)?;
        Some((self.map.insert(asset), old))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetHandle, &SceneAsset)> + '_ {
        self.map.iter()
    }

    /// Releases and removes every asset.
    pub fn release_all<G: GpuBackend + ?Sized>(&mut self, gpu: &mut G) {
        for (_, mut asset) in self.map.drain() {
            asset.release(gpu);
        }
    }
}
