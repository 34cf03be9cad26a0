// In-Memory Bundle
// Asset store over byte buffers held in memory

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{
    list_in, marker_key_in, marker_keys_in, probe_in, read_marker, AssetRef, AssetStore, Fetch,
    Manifest, NameIndex, RedirectSpec,
};
use crate::resource::error::FetchError;
use crate::resource::path::normalize_path;
use crate::resource::resource_type::ResourceKind;
use crate::resource::type_registry::{KindTable, REDIRECT_EXTENSION};

#[derive(Default)]
struct Contents {
    index: NameIndex,
    data: HashMap<String, Arc<[u8]>>,
}

/// Asset store backed by in-memory buffers.
///
/// Files can be added and removed while the store is shared; a registry
/// only notices additions for names and kinds it has not explored yet.
pub struct MemoryStore {
    kinds: KindTable,
    contents: RwLock<Contents>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_kinds(KindTable::default())
    }

    pub fn with_kinds(kinds: KindTable) -> Self {
        MemoryStore {
            kinds,
            contents: RwLock::new(Contents::default()),
        }
    }

    /// Add a file; `path` includes its extension (`Core/ui/door01.png`)
    pub fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        let mut contents = self.contents.write();
        let normalized = contents.index.insert(path);
        contents
            .data
            .insert(normalized.to_lowercase(), Arc::from(bytes.into()));
    }

    /// Builder form of [`MemoryStore::insert`]
    pub fn with_file(self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Add a redirect marker for the logical `path` (no extension)
    pub fn insert_redirect(&self, path: &str, target: &str) {
        self.insert(
            &format!("{}.{}", path, REDIRECT_EXTENSION),
            format!("target = {}\n", target),
        );
    }

    pub fn remove(&self, path: &str) -> bool {
        let mut contents = self.contents.write();
        contents.index.remove(path);
        contents
            .data
            .remove(&normalize_path(path).to_lowercase())
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.contents.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn files_in(&self, dir: &str) -> Vec<String> {
        self.contents.read().index.files_in(dir)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetch for MemoryStore {
    fn fetch(&self, key: &str) -> Result<Vec<u8>, FetchError> {
        self.contents
            .read()
            .data
            .get(&normalize_path(key).to_lowercase())
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| FetchError::Missing(key.to_string()))
    }
}

impl AssetStore for MemoryStore {
    fn kinds(&self) -> &KindTable {
        &self.kinds
    }

    fn probe(&self, path: &str, kind: ResourceKind) -> Option<AssetRef> {
        probe_in(&self.kinds, path, kind, |dir| self.files_in(dir))
    }

    fn probe_redirect_marker(&self, path: &str) -> Option<RedirectSpec> {
        let key = marker_key_in(path, |dir| self.files_in(dir))?;
        read_marker(&key, self.fetch(&key))
    }

    fn list_all(&self, dir: &str, kind: ResourceKind) -> Vec<(String, AssetRef)> {
        list_in(&self.kinds, dir, kind, |dir| self.files_in(dir))
    }

    fn list_redirect_markers(&self, dir: &str) -> Vec<(String, RedirectSpec)> {
        marker_keys_in(dir, |dir| self.files_in(dir))
            .into_iter()
            .filter_map(|(name, key)| Some((name, read_marker(&key, self.fetch(&key))?)))
            .collect()
    }
}

impl Manifest for MemoryStore {
    fn folders_in(&self, prefix: &str) -> Vec<String> {
        self.contents.read().index.folders_in(prefix)
    }

    fn folders_recursive(&self, prefix: &str) -> Vec<String> {
        self.contents.read().index.folders_recursive(prefix)
    }
}
