//! Registry
//!
//! Top-level entry point of the resolution engine. Owns the directory and
//! path caches, the handle id counter, and the store that discovery probes.
//! Entries and directories receive the registry as an argument on every
//! call instead of holding a reference to it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use portable_atomic::AtomicU64;

use super::directory::ResourceDirectory;
use super::entry::ResourceEntry;
use super::error::{DecodeError, ResourceError, Result};
use super::handle::{AssetCell, HandleId, ResourceHandle};
use super::path::{
    cache_key, forced_tier, join, normalize_dir, normalize_path, resolve_redirect_target,
    split_path,
};
use super::resource_type::{Resource, ResourceKind, ResourceValue};
use super::tier::{PriorityTier, DISCOVERY_PREFIXES};
use super::type_registry::DecoderRegistry;
use crate::config::RegistryConfig;
use crate::io::{AssetRef, AssetStore, Fetch, FileSource, Manifest};

pub struct Registry {
    store: Arc<dyn AssetStore>,
    fetch: Arc<dyn Fetch>,
    manifest: Option<Arc<dyn Manifest>>,
    decoders: DecoderRegistry,
    config: RegistryConfig,
    directories: Mutex<HashMap<String, Arc<ResourceDirectory>>>,
    path_cache: Mutex<HashMap<String, Arc<ResourceEntry>>>,
    /// Cells of discovered assets by store key, so every handle onto one
    /// stored asset yields the same object
    cells: Mutex<HashMap<String, Arc<AssetCell>>>,
    next_handle_id: AtomicU64,
}

impl Registry {
    /// A registry over `store`; the decoders use the store's extension table
    pub fn new<S: AssetStore + 'static>(store: Arc<S>) -> Self {
        let fetch: Arc<dyn Fetch> = store.clone();
        let decoders = DecoderRegistry::with_kinds(store.kinds().clone());
        Registry {
            store,
            fetch,
            manifest: None,
            decoders,
            config: RegistryConfig::default(),
            directories: Mutex::new(HashMap::new()),
            path_cache: Mutex::new(HashMap::new()),
            cells: Mutex::new(HashMap::new()),
            next_handle_id: AtomicU64::new(1),
        }
    }

    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the decoders.
    ///
    /// Discovery maps extensions with the store's table, so `decoders` should
    /// carry the same one; a differing table is logged.
    pub fn with_decoders(mut self, decoders: DecoderRegistry) -> Self {
        if decoders.kinds() != self.store.kinds() {
            log::warn!(
                "Decoder extension table differs from the store's; discovery keeps using the store's"
            );
        }
        self.decoders = decoders;
        self
    }

    pub fn with_manifest(mut self, manifest: Arc<dyn Manifest>) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn decoders(&self) -> &DecoderRegistry {
        &self.decoders
    }

    pub fn store(&self) -> &dyn AssetStore {
        self.store.as_ref()
    }

    /// Draw the next handle id; ids are never reused
    pub fn next_handle_id(&self) -> HandleId {
        HandleId(self.next_handle_id.fetch_add(1, Ordering::Relaxed))
    }

    // Paths and caches

    /// The entry for a full logical path, created on first use
    pub fn retrieve_entry(&self, path: &str) -> Arc<ResourceEntry> {
        let normalized = normalize_path(path);
        let key = cache_key(&normalized);
        if let Some(entry) = self.path_cache.lock().get(&key) {
            return entry.clone();
        }

        let (dir, name) = split_path(&normalized);
        let entry = self.directory(dir).get_or_create(name);
        self.path_cache.lock().entry(key).or_insert(entry).clone()
    }

    /// The entry for a full logical path, if it has been created
    pub fn find_entry(&self, path: &str) -> Option<Arc<ResourceEntry>> {
        let normalized = normalize_path(path);
        if let Some(entry) = self.path_cache.lock().get(&cache_key(&normalized)) {
            return Some(entry.clone());
        }
        let (dir, name) = split_path(&normalized);
        self.find_directory(dir)?.get(name)
    }

    /// The directory object for a logical directory, created on first use
    pub fn directory(&self, dir: &str) -> Arc<ResourceDirectory> {
        let normalized = normalize_dir(dir);
        self.directories
            .lock()
            .entry(cache_key(&normalized))
            .or_insert_with(|| Arc::new(ResourceDirectory::new(normalized.clone())))
            .clone()
    }

    pub fn find_directory(&self, dir: &str) -> Option<Arc<ResourceDirectory>> {
        self.directories
            .lock()
            .get(&cache_key(&normalize_dir(dir)))
            .cloned()
    }

    fn check_forced_tier(&self, path: &str) {
        if !self.config.warn_on_forced_tier {
            return;
        }
        if let Some(tier) = forced_tier(path) {
            log::warn!(
                "Path '{}' already names the {} tier; tier search will probe below it",
                path,
                tier
            );
        }
    }

    // Handle construction, used by discovery

    pub(crate) fn discovered_handle(&self, tier: PriorityTier, asset: &AssetRef) -> Arc<ResourceHandle> {
        let cell = self
            .cells
            .lock()
            .entry(cache_key(&asset.key))
            .or_insert_with(|| {
                Arc::new(AssetCell::lazy(
                    asset.kind,
                    asset.key.clone(),
                    self.fetch.clone(),
                    asset.key.clone(),
                    asset.extension.clone(),
                ))
            })
            .clone();
        Arc::new(ResourceHandle::direct(tier, self.next_handle_id(), cell))
    }

    pub(crate) fn redirect_handle(&self, tier: PriorityTier, target: String) -> Arc<ResourceHandle> {
        Arc::new(ResourceHandle::redirect(tier, self.next_handle_id(), target))
    }

    /// One redirect hop: resolve `target` on behalf of `root`
    pub(crate) fn follow(
        &self,
        target: &str,
        kind: ResourceKind,
        exact: bool,
        depth: usize,
        root: &ResourceEntry,
    ) -> Result<Option<Arc<ResourceHandle>>> {
        log::trace!("Redirect hop {} to '{}' for {}", depth, target, kind);
        let entry = self.retrieve_entry(target);
        entry.resolve_safe(self, kind, exact, depth, root)
    }

    pub(crate) fn follow_exists(
        &self,
        target: &str,
        kind: ResourceKind,
        exact: bool,
        depth: usize,
        root: &ResourceEntry,
    ) -> Result<bool> {
        log::trace!("Redirect existence hop {} to '{}' for {}", depth, target, kind);
        let entry = self.retrieve_entry(target);
        entry.exists_safe(self, kind, exact, depth, root)
    }

    // Resolution

    /// The direct handle that wins for `path`, following redirects
    pub fn resolve_handle(
        &self,
        path: &str,
        kind: ResourceKind,
        exact: bool,
    ) -> Result<Option<Arc<ResourceHandle>>> {
        self.check_forced_tier(path);
        let entry = self.retrieve_entry(path);
        entry.resolve_safe(self, kind, exact, 0, &entry)
    }

    /// Resolve and load, fetching with the blocking path.
    ///
    /// `exact` asks for a value whose kind is exactly `kind`; otherwise any
    /// descendant kind is accepted.
    pub fn resolve(&self, path: &str, kind: ResourceKind, exact: bool) -> Result<Option<ResourceValue>> {
        self.resolve_handle(path, kind, exact)?
            .and_then(|handle| handle.cell().cloned())
            .map(|cell| cell.materialize(&self.decoders))
            .transpose()
    }

    /// Resolve and load, fetching with the non-blocking path.
    ///
    /// Selection is identical to [`Registry::resolve`].
    pub async fn resolve_async(
        &self,
        path: &str,
        kind: ResourceKind,
        exact: bool,
    ) -> Result<Option<ResourceValue>> {
        let cell = self
            .resolve_handle(path, kind, exact)?
            .and_then(|handle| handle.cell().cloned());
        match cell {
            Some(cell) => cell.materialize_async(&self.decoders).await.map(Some),
            None => Ok(None),
        }
    }

    /// Typed loose lookup
    pub fn load<T: Resource + ?Sized>(&self, path: &str) -> Result<Option<Arc<T>>> {
        self.typed(self.resolve(path, T::KIND, false)?)
    }

    /// Typed exact lookup
    pub fn load_exact<T: Resource + ?Sized>(&self, path: &str) -> Result<Option<Arc<T>>> {
        self.typed(self.resolve(path, T::KIND, true)?)
    }

    fn typed<T: Resource + ?Sized>(&self, value: Option<ResourceValue>) -> Result<Option<Arc<T>>> {
        let Some(value) = value else {
            return Ok(None);
        };
        let actual = value.kind();
        T::from_value(value)
            .map(Some)
            .ok_or(ResourceError::KindMismatch {
                expected: T::KIND,
                actual,
            })
    }

    /// Every variant of `path`, lowest rank first.
    ///
    /// A loose query lists each underlying object once.
    pub fn resolve_all(&self, path: &str, kind: ResourceKind, exact: bool) -> Result<Vec<ResourceValue>> {
        self.check_forced_tier(path);
        let entry = self.retrieve_entry(path);
        let handles = entry.resolve_all(self, kind, exact, 0, &entry)?;
        self.materialize_all(handles, !exact)
    }

    /// True iff [`Registry::resolve`] would find something, without loading it
    pub fn exists(&self, path: &str, kind: ResourceKind, exact: bool) -> Result<bool> {
        self.check_forced_tier(path);
        let entry = self.retrieve_entry(path);
        entry.exists_safe(self, kind, exact, 0, &entry)
    }

    fn materialize_all(&self, handles: Vec<Arc<ResourceHandle>>, dedup: bool) -> Result<Vec<ResourceValue>> {
        let mut values: Vec<ResourceValue> = Vec::with_capacity(handles.len());
        for cell in handles.iter().filter_map(|h| h.cell()) {
            let value = cell.materialize(&self.decoders)?;
            if dedup && values.iter().any(|v| v.same_object(&value)) {
                continue;
            }
            values.push(value);
        }
        Ok(values)
    }

    // Directory queries

    /// Best value of every name in `dir`, sorted by name
    pub fn list(&self, dir: &str, kind: ResourceKind, exact: bool) -> Result<Vec<ResourceValue>> {
        Ok(self.list_as_map(dir, kind, exact)?.into_values().collect())
    }

    /// Best value of every name in `dir`, keyed by name
    pub fn list_as_map(
        &self,
        dir: &str,
        kind: ResourceKind,
        exact: bool,
    ) -> Result<BTreeMap<String, ResourceValue>> {
        self.check_forced_tier(dir);
        let mut map = BTreeMap::new();
        for (name, handle) in self.directory(dir).list(self, kind, exact)? {
            if let Some(cell) = handle.cell() {
                map.insert(name, cell.materialize(&self.decoders)?);
            }
        }
        Ok(map)
    }

    /// Every variant of every name in `dir`, grouped by name in name order
    pub fn list_all_variants(&self, dir: &str, kind: ResourceKind, exact: bool) -> Result<Vec<ResourceValue>> {
        self.check_forced_tier(dir);
        let mut values = Vec::new();
        for (_, handles) in self.directory(dir).list_all_variants(self, kind, exact)? {
            values.extend(self.materialize_all(handles, !exact)?);
        }
        Ok(values)
    }

    // Registration

    fn register(
        &self,
        path: &str,
        kind: ResourceKind,
        make: impl FnOnce(HandleId) -> ResourceHandle,
    ) -> HandleId {
        let entry = self.retrieve_entry(path);
        // Discovery first, so the new handle outranks same-tier discoveries.
        entry.explore(self, kind);
        let id = self.next_handle_id();
        entry.insert(self, kind, Arc::new(make(id)));
        id
    }

    /// Register an already loaded value under its own kind
    pub fn add_resource(&self, path: &str, value: ResourceValue, tier: PriorityTier) -> HandleId {
        let normalized = normalize_path(path);
        let kind = value.kind();
        let cell = Arc::new(AssetCell::preloaded(normalized.clone(), value));
        let id = self.register(&normalized, kind, |id| ResourceHandle::direct(tier, id, cell));
        log::debug!("Added {} resource '{}' at {} ({})", kind, normalized, tier, id);
        id
    }

    /// Register a redirect from `path` to `target` for requests of `kind`.
    ///
    /// A relative `target` is taken from the directory of `path`.
    pub fn add_redirect(&self, path: &str, kind: ResourceKind, target: &str, tier: PriorityTier) -> HandleId {
        let normalized = normalize_path(path);
        let target = resolve_redirect_target(split_path(&normalized).0, target);
        log::debug!("Added redirect '{}' -> '{}' at {}", normalized, target, tier);
        self.register(&normalized, kind, |id| ResourceHandle::redirect(tier, id, target))
    }

    /// Register a file on disk, loaded lazily; the kind comes from its
    /// extension
    pub fn add_file<P: AsRef<Path>>(&self, path: &str, file: P, tier: PriorityTier) -> Result<HandleId> {
        let normalized = normalize_path(path);
        let source = FileSource::new(file);
        let extension = source.extension().unwrap_or_default();
        let kind = self
            .decoders
            .kind_for(&extension)
            .ok_or_else(|| ResourceError::Decode {
                path: normalized.clone(),
                source: DecodeError::UnknownExtension(extension.clone()),
            })?;
        let label = source.path().display().to_string();
        let cell = Arc::new(AssetCell::lazy(kind, label.clone(), Arc::new(source), label, extension));
        Ok(self.register(&normalized, kind, |id| ResourceHandle::direct(tier, id, cell)))
    }

    /// Register every asset of a bundle at `tier`, lazily loaded from it.
    ///
    /// Bundle paths map onto logical paths unchanged. Returns the number of
    /// handles added.
    pub fn add_bundle<B>(&self, bundle: Arc<B>, tier: PriorityTier) -> usize
    where
        B: AssetStore + Manifest + 'static,
    {
        let fetch: Arc<dyn Fetch> = bundle.clone();
        let mut folders = vec![String::new()];
        folders.extend(bundle.folders_recursive(""));

        let mut added = 0;
        for folder in folders {
            for (name, asset) in bundle.list_all(&folder, ResourceKind::Asset) {
                let cell = Arc::new(AssetCell::lazy(
                    asset.kind,
                    asset.key.clone(),
                    fetch.clone(),
                    asset.key,
                    asset.extension,
                ));
                self.register(&join(&folder, &name), asset.kind, |id| {
                    ResourceHandle::direct(tier, id, cell)
                });
                added += 1;
            }
        }
        log::debug!("Added bundle with {} asset(s) at {}", added, tier);
        added
    }

    /// [`Registry::add_resource`] at the configured runtime tier
    pub fn add_runtime_resource(&self, path: &str, value: ResourceValue) -> HandleId {
        self.add_resource(path, value, self.config.runtime_tier)
    }

    /// [`Registry::add_file`] at the configured runtime tier
    pub fn add_runtime_file<P: AsRef<Path>>(&self, path: &str, file: P) -> Result<HandleId> {
        self.add_file(path, file, self.config.runtime_tier)
    }

    /// [`Registry::add_bundle`] at the configured runtime tier
    pub fn add_runtime_bundle<B>(&self, bundle: Arc<B>) -> usize
    where
        B: AssetStore + Manifest + 'static,
    {
        self.add_bundle(bundle, self.config.runtime_tier)
    }

    /// Remove one handle from the list for `kind` under `path`
    pub fn remove_handle(&self, path: &str, kind: ResourceKind, id: HandleId) -> bool {
        self.find_entry(path)
            .map(|entry| entry.remove(kind, id))
            .unwrap_or(false)
    }

    // Folder browsing

    /// Folders directly under `prefix` across every discovery prefix
    pub fn folders_in(&self, prefix: &str) -> Vec<String> {
        self.collect_folders(prefix, |manifest, dir| manifest.folders_in(dir))
    }

    /// Folders anywhere below `prefix` across every discovery prefix
    pub fn folders_recursive(&self, prefix: &str) -> Vec<String> {
        self.collect_folders(prefix, |manifest, dir| manifest.folders_recursive(dir))
    }

    fn collect_folders<F>(&self, prefix: &str, list: F) -> Vec<String>
    where
        F: Fn(&dyn Manifest, &str) -> Vec<String>,
    {
        let Some(manifest) = &self.manifest else {
            return Vec::new();
        };
        let dir = normalize_dir(prefix);
        let mut seen = HashSet::new();
        let mut folders = Vec::new();
        for (probe, _) in DISCOVERY_PREFIXES {
            for folder in list(manifest.as_ref(), &format!("{}{}", probe, dir)) {
                // The tier folders themselves are not logical folders.
                if probe.is_empty() && dir.is_empty() && forced_tier(&format!("{}/_", folder)).is_some() {
                    continue;
                }
                if seen.insert(cache_key(&folder)) {
                    folders.push(folder);
                }
            }
        }
        folders.sort_by_key(|f| cache_key(f));
        folders
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("directories", &self.directories.lock().len())
            .field("entries", &self.path_cache.lock().len())
            .field("next_handle_id", &self.next_handle_id.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryStore;
    use crate::resource::type_registry::KindTable;

    fn registry() -> Registry {
        let store = MemoryStore::new()
            .with_file("ui/hello.txt", "hello")
            .with_file("Core/ui/hello.txt", "core hello");
        Registry::new(Arc::new(store))
    }

    #[test]
    fn test_handle_ids_start_at_one_and_increase() {
        let registry = registry();
        let a = registry.next_handle_id();
        let b = registry.next_handle_id();
        assert_eq!(a, HandleId(1));
        assert!(b > a);
    }

    #[test]
    fn test_registries_have_independent_counters() {
        let first = registry();
        let second = registry();
        first.next_handle_id();
        first.next_handle_id();
        assert_eq!(second.next_handle_id(), HandleId(1));
    }

    #[test]
    fn test_retrieve_entry_normalizes_and_memoizes() {
        let registry = registry();
        let a = registry.retrieve_entry("UI\\Hello");
        let b = registry.retrieve_entry("/ui//hello/");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.path(), "UI/Hello");
        assert!(registry.find_entry("ui/hello").is_some());
        assert!(registry.find_entry("ui/other").is_none());
    }

    #[test]
    fn test_directory_is_shared_by_its_entries() {
        let registry = registry();
        let entry = registry.retrieve_entry("ui/hello");
        let dir = registry.find_directory("UI").unwrap();
        assert!(Arc::ptr_eq(&dir.get("HELLO").unwrap(), &entry));
        assert!(registry.find_directory("missing").is_none());
    }

    #[test]
    fn test_resolve_prefers_normal_over_core() {
        let registry = registry();
        let value = registry.resolve("ui/hello", ResourceKind::Text, false).unwrap().unwrap();
        assert_eq!(value.as_text(), Some("hello"));
    }

    #[test]
    fn test_load_typed() {
        let registry = registry();
        let text = registry.load::<str>("ui/hello").unwrap().unwrap();
        assert_eq!(&*text, "hello");
        let bytes = registry.load::<[u8]>("ui/hello").unwrap().unwrap();
        assert_eq!(&*bytes, b"hello");
        assert!(registry.load_exact::<[u8]>("ui/hello").unwrap().is_none());
    }

    #[test]
    fn test_add_file_rejects_unknown_extension() {
        let registry = registry();
        let err = registry
            .add_file("ui/model", "/tmp/model.fbx", PriorityTier::Explicit)
            .unwrap_err();
        assert!(matches!(
            err,
            ResourceError::Decode {
                source: DecodeError::UnknownExtension(_),
                ..
            }
        ));
    }

    #[test]
    fn test_runtime_tier_comes_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.cfg");
        std::fs::write(&path, "runtime_tier = core\n").unwrap();

        // Default runtime tier is Explicit, above the discovered file.
        let defaults = registry();
        let id = defaults.add_runtime_resource("ui/hello", ResourceValue::text("injected"));
        let handle = defaults.resolve_handle("ui/hello", ResourceKind::Text, false).unwrap().unwrap();
        assert_eq!((handle.priority(), handle.id()), (PriorityTier::Explicit, id));

        // Core from the config file ranks below the discovered Normal file.
        let configured = registry().with_config(RegistryConfig::load(&path).unwrap());
        configured.add_runtime_resource("ui/hello", ResourceValue::text("injected"));
        let value = configured.resolve("ui/hello", ResourceKind::Text, false).unwrap().unwrap();
        assert_eq!(value.as_text(), Some("hello"));
        let handles = configured.find_entry("ui/hello").unwrap().handles(ResourceKind::Text);
        assert_eq!(
            handles.iter().filter(|h| h.priority() == PriorityTier::Core).count(),
            2
        );
    }

    #[test]
    fn test_runtime_bundle_and_file_use_runtime_tier() {
        let config = RegistryConfig {
            runtime_tier: PriorityTier::Addon,
            ..RegistryConfig::default()
        };
        let registry = registry().with_config(config);
        let bundle = Arc::new(MemoryStore::new().with_file("ui/bundled.txt", "b"));
        assert_eq!(registry.add_runtime_bundle(bundle), 1);

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("extra.txt");
        std::fs::write(&file, "extra").unwrap();
        registry.add_runtime_file("ui/extra", &file).unwrap();

        for path in ["ui/bundled", "ui/extra"] {
            let handle = registry
                .resolve_handle(path, ResourceKind::Text, false)
                .unwrap()
                .unwrap();
            assert_eq!(handle.priority(), PriorityTier::Addon);
        }
    }

    #[test]
    fn test_decoders_follow_store_extension_table() {
        let mut kinds = KindTable::default();
        kinds.install("cfg", ResourceKind::Text);
        let store = MemoryStore::with_kinds(kinds).with_file("ui/door.cfg", "open");
        let registry = Registry::new(Arc::new(store));
        assert_eq!(registry.decoders().kind_for("cfg"), Some(ResourceKind::Text));

        let discovered = registry.resolve("ui/door", ResourceKind::Text, false).unwrap().unwrap();
        assert_eq!(discovered.as_text(), Some("open"));

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lock.cfg");
        std::fs::write(&file, "locked").unwrap();
        registry.add_file("ui/lock", &file, PriorityTier::Explicit).unwrap();
        let added = registry.resolve("ui/lock", ResourceKind::Text, true).unwrap().unwrap();
        assert_eq!(added.as_text(), Some("locked"));
    }

    #[test]
    fn test_folders_without_manifest_are_empty() {
        let registry = registry();
        assert!(registry.folders_in("").is_empty());
    }

    #[test]
    fn test_folders_merge_tier_prefixes() {
        let store = Arc::new(
            MemoryStore::new()
                .with_file("Core/ui/a.txt", "a")
                .with_file("Game/props/b.txt", "b")
                .with_file("ui/icons/c.txt", "c"),
        );
        let registry = Registry::new(store.clone()).with_manifest(store);
        assert_eq!(registry.folders_in(""), vec!["props", "ui"]);
        assert_eq!(registry.folders_recursive(""), vec!["props", "ui", "ui/icons"]);
        assert_eq!(registry.folders_in("ui"), vec!["icons"]);
    }
}
