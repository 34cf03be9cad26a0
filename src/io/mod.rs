//! Asset storage backends
//!
//! The resolution engine talks to storage through three small traits:
//! [`Fetch`] turns a store key into bytes, [`AssetStore`] answers probe and
//! listing questions about physical paths, and [`Manifest`] enumerates
//! folders for browsing. Three backends implement all of them: an in-memory
//! bundle, loose files under a directory, and a read-only zip archive.
//!
//! Physical layout shared by every backend: a logical name `door01` is
//! stored as `door01.<ext>`, its kind picked by extension, and a redirect
//! marker is a `door01.redirect` property file holding `target = <path>`.

pub mod archive;
pub mod dirs;
pub mod files;
pub mod listing;
pub mod memory;

pub use archive::ArchiveStore;
pub use dirs::DirectoryStore;
pub use files::FileSource;
pub use listing::NameIndex;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::resource::error::FetchError;
use crate::resource::path::{join, normalize_path, split_path};
use crate::resource::propfile::PropertyFile;
use crate::resource::resource_type::ResourceKind;
use crate::resource::type_registry::{KindTable, REDIRECT_EXTENSION};

/// A concrete stored asset found by a probe
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRef {
    /// Store key passed back to [`Fetch::fetch`]
    pub key: String,
    /// Kind decided by the file extension
    pub kind: ResourceKind,
    /// Lowercased extension, used as the decoder hint
    pub extension: String,
}

/// Contents of a redirect marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectSpec {
    /// Target path as written; a leading `/` means absolute
    pub target: String,
}

impl RedirectSpec {
    /// Parse marker bytes; `None` if the marker has no `target`
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(bytes);
        let props = PropertyFile::parse(&text);
        props
            .get("target")
            .filter(|t| !t.is_empty())
            .map(|t| RedirectSpec {
                target: t.to_string(),
            })
    }
}

/// Byte source for lazily loaded assets
#[async_trait]
pub trait Fetch: Send + Sync {
    fn fetch(&self, key: &str) -> Result<Vec<u8>, FetchError>;

    /// Non-blocking fetch; defaults to the blocking path
    async fn fetch_async(&self, key: &str) -> Result<Vec<u8>, FetchError> {
        self.fetch(key)
    }
}

/// Probe and listing interface over physical paths.
///
/// Paths are `/`-separated and matched case-insensitively. A miss is `None`
/// or an empty list, never an error.
pub trait AssetStore: Fetch {
    /// Extension table the store classifies its files with
    fn kinds(&self) -> &KindTable;

    /// The asset stored for the full physical `path` (no extension) whose
    /// kind is `kind` or a descendant of it
    fn probe(&self, path: &str, kind: ResourceKind) -> Option<AssetRef>;

    /// The redirect marker stored for `path`, if any
    fn probe_redirect_marker(&self, path: &str) -> Option<RedirectSpec>;

    /// Every asset directly inside `dir` whose kind fits `kind`, as
    /// `(name, asset)` pairs sorted by name
    fn list_all(&self, dir: &str, kind: ResourceKind) -> Vec<(String, AssetRef)>;

    /// Every redirect marker directly inside `dir`, sorted by name
    fn list_redirect_markers(&self, dir: &str) -> Vec<(String, RedirectSpec)>;
}

/// Folder enumeration for browsing
pub trait Manifest: Send + Sync {
    /// Names of the folders directly under `prefix`
    fn folders_in(&self, prefix: &str) -> Vec<String>;

    /// Paths, relative to `prefix`, of every folder below it
    fn folders_recursive(&self, prefix: &str) -> Vec<String>;
}

/// One file picked to stand for a logical name
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub stem: String,
    pub file: String,
    pub kind: ResourceKind,
    pub extension: String,
}

/// Pick one file per stem among the `files` of a single folder.
///
/// A file whose kind is exactly `kind` beats one of a descendant kind, so an
/// exact asset is never hidden by a subtype sibling. Otherwise files are
/// considered in lexicographic order of their lowercased names: with
/// `door01.png` and `door01.jpg` both present `door01.jpg` wins. Files
/// without an extension, with an unknown extension, or whose kind does not
/// fit `kind` are ignored. The result is sorted by lowercased stem.
pub(crate) fn select_assets<S: AsRef<str>>(
    kinds: &KindTable,
    files: &[S],
    kind: ResourceKind,
) -> Vec<Candidate> {
    let mut eligible: Vec<Candidate> = files
        .iter()
        .map(AsRef::as_ref)
        .filter_map(|file| {
            let (stem, ext) = split_extension(file)?;
            let file_kind = kinds.lookup(ext)?;
            kind.is_assignable_from(file_kind).then(|| Candidate {
                stem: stem.to_string(),
                file: file.to_string(),
                kind: file_kind,
                extension: ext.to_lowercase(),
            })
        })
        .collect();
    eligible.sort_by_cached_key(|c| (c.stem.to_lowercase(), c.kind != kind, c.file.to_lowercase()));

    let mut picked: Vec<Candidate> = Vec::new();
    for candidate in eligible {
        if picked.last().is_some_and(|c| c.stem.to_lowercase() == candidate.stem.to_lowercase()) {
            continue;
        }
        picked.push(candidate);
    }
    picked
}

/// Redirect marker files among `files`, as `(stem, file)` sorted by stem
pub(crate) fn select_markers<S: AsRef<str>>(files: &[S]) -> Vec<(String, String)> {
    let mut markers: Vec<(String, String)> = files
        .iter()
        .map(AsRef::as_ref)
        .filter_map(|file| {
            let (stem, ext) = split_extension(file)?;
            ext.eq_ignore_ascii_case(REDIRECT_EXTENSION)
                .then(|| (stem.to_string(), file.to_string()))
        })
        .collect();
    markers.sort_by_key(|(stem, _)| stem.to_lowercase());
    markers
}

/// `("door01", "png")` for `door01.png`; `None` without an extension
pub(crate) fn split_extension(file: &str) -> Option<(&str, &str)> {
    let idx = file.rfind('.')?;
    if idx == 0 || idx + 1 == file.len() {
        return None;
    }
    Some((&file[..idx], &file[idx + 1..]))
}

/// Probe helper shared by the backends; `files_in` lists one folder
pub(crate) fn probe_in<F>(
    kinds: &KindTable,
    path: &str,
    kind: ResourceKind,
    files_in: F,
) -> Option<AssetRef>
where
    F: FnOnce(&str) -> Vec<String>,
{
    let path = normalize_path(path);
    let (dir, name) = split_path(&path);
    if name.is_empty() {
        return None;
    }
    let files = files_in(dir);
    select_assets(kinds, &files, kind)
        .into_iter()
        .find(|c| c.stem.eq_ignore_ascii_case(name))
        .map(|c| AssetRef {
            key: join(dir, &c.file),
            kind: c.kind,
            extension: c.extension,
        })
}

/// Listing helper shared by the backends
pub(crate) fn list_in<F>(
    kinds: &KindTable,
    dir: &str,
    kind: ResourceKind,
    files_in: F,
) -> Vec<(String, AssetRef)>
where
    F: FnOnce(&str) -> Vec<String>,
{
    let dir = normalize_path(dir);
    let files = files_in(&dir);
    select_assets(kinds, &files, kind)
        .into_iter()
        .map(|c| {
            let asset = AssetRef {
                key: join(&dir, &c.file),
                kind: c.kind,
                extension: c.extension,
            };
            (c.stem, asset)
        })
        .collect()
}

/// Store key of the marker for `path`, if one exists
pub(crate) fn marker_key_in<F>(path: &str, files_in: F) -> Option<String>
where
    F: FnOnce(&str) -> Vec<String>,
{
    let path = normalize_path(path);
    let (dir, name) = split_path(&path);
    if name.is_empty() {
        return None;
    }
    let files = files_in(dir);
    select_markers(&files)
        .into_iter()
        .find(|(stem, _)| stem.eq_ignore_ascii_case(name))
        .map(|(_, file)| join(dir, &file))
}

/// `(name, store key)` of every marker in `dir`
pub(crate) fn marker_keys_in<F>(dir: &str, files_in: F) -> Vec<(String, String)>
where
    F: FnOnce(&str) -> Vec<String>,
{
    let dir = normalize_path(dir);
    let files = files_in(&dir);
    select_markers(&files)
        .into_iter()
        .map(|(stem, file)| (stem, join(&dir, &file)))
        .collect()
}

/// Parse a marker read from `key`, warning when it is unusable
pub(crate) fn read_marker(key: &str, bytes: Result<Vec<u8>, FetchError>) -> Option<RedirectSpec> {
    match bytes {
        Ok(bytes) => {
            let spec = RedirectSpec::parse(&bytes);
            if spec.is_none() {
                log::warn!("Redirect marker '{}' has no target", key);
            }
            spec
        }
        Err(e) => {
            log::warn!("Failed to read redirect marker '{}': {}", key, e);
            None
        }
    }
}
