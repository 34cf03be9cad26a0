// Directory Store
// Asset store over loose files under a root directory

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{
    list_in, marker_key_in, marker_keys_in, probe_in, read_marker, AssetRef, AssetStore, Fetch,
    Manifest, RedirectSpec,
};
use crate::resource::error::FetchError;
use crate::resource::path::normalize_path;
use crate::resource::resource_type::ResourceKind;
use crate::resource::type_registry::KindTable;

/// Asset store reading loose files below `root`.
///
/// Logical path segments are matched against directory entries
/// case-insensitively, so `Core/UI/door01` finds `core/ui/Door01.png` on a
/// case-sensitive filesystem. The tree is read live on every call.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    kinds: KindTable,
}

impl DirectoryStore {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, FetchError> {
        Self::open_with_kinds(root, KindTable::default())
    }

    pub fn open_with_kinds<P: AsRef<Path>>(root: P, kinds: KindTable) -> Result<Self, FetchError> {
        let root = root.as_ref().to_path_buf();
        let metadata = fs::metadata(&root)?;
        if !metadata.is_dir() {
            return Err(FetchError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            )));
        }
        Ok(DirectoryStore { root, kinds })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a logical path, matching each segment
    /// case-insensitively
    fn locate(&self, logical: &str) -> Option<PathBuf> {
        let mut current = self.root.clone();
        for segment in normalize_path(logical).split('/').filter(|s| !s.is_empty()) {
            let exact = current.join(segment);
            if exact.exists() {
                current = exact;
                continue;
            }
            let found = read_dir_logged(&current)?.into_iter().find(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.eq_ignore_ascii_case(segment))
            })?;
            current = found.path();
        }
        Some(current)
    }

    fn files_in(&self, dir: &str) -> Vec<String> {
        self.entries_in(dir, |ft| ft.is_file())
    }

    fn subdirs_in(&self, dir: &str) -> Vec<String> {
        self.entries_in(dir, |ft| ft.is_dir())
    }

    fn entries_in(&self, dir: &str, keep: impl Fn(&fs::FileType) -> bool) -> Vec<String> {
        let Some(path) = self.locate(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = read_dir_logged(&path)
            .unwrap_or_default()
            .into_iter()
            .filter(|entry| entry.file_type().map(|ft| keep(&ft)).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();
        names.sort_by_key(|n| n.to_lowercase());
        names
    }

    fn walk_folders(&self, dir: &str, relative: &str, out: &mut Vec<String>) {
        for name in self.subdirs_in(dir) {
            let child_relative = if relative.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", relative, name)
            };
            let child_dir = format!("{}/{}", dir, name);
            out.push(child_relative.clone());
            self.walk_folders(&child_dir, &child_relative, out);
        }
    }
}

fn read_dir_logged(path: &Path) -> Option<Vec<fs::DirEntry>> {
    match fs::read_dir(path) {
        Ok(entries) => Some(entries.filter_map(|e| e.ok()).collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            log::warn!("Failed to read directory {}: {}", path.display(), e);
            None
        }
    }
}

#[async_trait]
impl Fetch for DirectoryStore {
    fn fetch(&self, key: &str) -> Result<Vec<u8>, FetchError> {
        let path = self
            .locate(key)
            .filter(|p| p.is_file())
            .ok_or_else(|| FetchError::Missing(key.to_string()))?;
        Ok(fs::read(path)?)
    }
}

impl AssetStore for DirectoryStore {
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

impl Manifest for DirectoryStore {
    fn folders_in(&self, prefix: &str) -> Vec<String> {
        self.subdirs_in(prefix)
    }

    fn folders_recursive(&self, prefix: &str) -> Vec<String> {
        let mut folders = Vec::new();
        self.walk_folders(&normalize_path(prefix), "", &mut folders);
        folders.sort_by_key(|f| f.to_lowercase());
        folders
    }
}
