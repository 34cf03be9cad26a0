// Archive Store
// Read-only asset store over a zip archive

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use zip::ZipArchive;

use super::{
    list_in, marker_key_in, marker_keys_in, probe_in, read_marker, AssetRef, AssetStore, Fetch,
    Manifest, NameIndex, RedirectSpec,
};
use crate::resource::error::FetchError;
use crate::resource::path::normalize_path;
use crate::resource::resource_type::ResourceKind;
use crate::resource::type_registry::KindTable;

trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

/// Asset store over a zip archive.
///
/// The member index is read once at open time. Member reads go through a
/// mutex because the archive reader is stateful.
pub struct ArchiveStore {
    kinds: KindTable,
    index: NameIndex,
    /// Lowercased member path -> name inside the archive
    members: HashMap<String, String>,
    archive: Mutex<ZipArchive<Box<dyn ReadSeek>>>,
}

impl ArchiveStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FetchError> {
        let file = File::open(path)?;
        Self::from_reader(file, KindTable::default())
    }

    /// Open an archive from any seekable reader (e.g. an in-memory buffer)
    pub fn from_reader<R>(reader: R, kinds: KindTable) -> Result<Self, FetchError>
    where
        R: Read + Seek + Send + 'static,
    {
        let boxed: Box<dyn ReadSeek> = Box::new(reader);
        let archive = ZipArchive::new(boxed).map_err(|e| FetchError::Archive(e.to_string()))?;

        let mut index = NameIndex::new();
        let mut members = HashMap::new();
        for name in archive.file_names() {
            if name.ends_with('/') {
                continue;
            }
            let normalized = index.insert(name);
            members.insert(normalized.to_lowercase(), name.to_string());
        }
        log::debug!("Opened archive with {} members", members.len());

        Ok(ArchiveStore {
            kinds,
            index,
            members,
            archive: Mutex::new(archive),
        })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn files_in(&self, dir: &str) -> Vec<String> {
        self.index.files_in(dir)
    }
}

#[async_trait]
impl Fetch for ArchiveStore {
    fn fetch(&self, key: &str) -> Result<Vec<u8>, FetchError> {
        let member = self
            .members
            .get(&normalize_path(key).to_lowercase())
            .ok_or_else(|| FetchError::Missing(key.to_string()))?;

        let mut archive = self.archive.lock();
        let mut file = archive
            .by_name(member)
            .map_err(|e| FetchError::Archive(format!("{}: {}", member, e)))?;
        // The header size is untrusted; let the buffer grow with the data.
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl AssetStore for ArchiveStore {
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

impl Manifest for ArchiveStore {
    fn folders_in(&self, prefix: &str) -> Vec<String> {
        self.index.folders_in(prefix)
    }

    fn folders_recursive(&self, prefix: &str) -> Vec<String> {
        self.index.folders_recursive(prefix)
    }
}
