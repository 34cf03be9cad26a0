// Resource Directory
// Name -> entry map for one logical directory, with directory-wide discovery

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::entry::ResourceEntry;
use super::error::Result;
use super::handle::ResourceHandle;
use super::path::{cache_key, resolve_redirect_target};
use super::registry::Registry;
use super::resource_type::ResourceKind;
use super::tier::DISCOVERY_PREFIXES;

/// Entries of one logical directory
pub struct ResourceDirectory {
    /// Normalized, with trailing slash; the root is `""`
    path: String,
    entries: Mutex<HashMap<String, Arc<ResourceEntry>>>,
    explored: Mutex<HashSet<ResourceKind>>,
}

impl ResourceDirectory {
    pub fn new(path: impl Into<String>) -> Self {
        ResourceDirectory {
            path: path.into(),
            entries: Mutex::new(HashMap::new()),
            explored: Mutex::new(HashSet::new()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The entry for `name`, created empty on first use
    pub fn get_or_create(&self, name: &str) -> Arc<ResourceEntry> {
        self.entries
            .lock()
            .entry(cache_key(name))
            .or_insert_with(|| Arc::new(ResourceEntry::new(format!("{}{}", self.path, name))))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<ResourceEntry>> {
        self.entries.lock().get(&cache_key(name)).cloned()
    }

    /// Every entry created so far, sorted by name
    pub fn entries(&self) -> Vec<Arc<ResourceEntry>> {
        let mut entries: Vec<_> = self.entries.lock().values().cloned().collect();
        entries.sort_by_key(|e| cache_key(e.name()));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn is_explored(&self, kind: ResourceKind) -> bool {
        self.explored.lock().contains(&kind)
    }

    /// List every asset and redirect marker of `kind` under each discovery
    /// prefix and route the hits into their entries.
    ///
    /// An entry that already holds a handle of the same kind and tier keeps
    /// it and the listed one is dropped.
    pub fn explore(&self, registry: &Registry, kind: ResourceKind) {
        if self.is_explored(kind) {
            return;
        }

        let store = registry.store();
        let mut found: BTreeMap<String, (String, Vec<Arc<ResourceHandle>>)> = BTreeMap::new();
        let mut route = |name: String, handle: Arc<ResourceHandle>| {
            found
                .entry(cache_key(&name))
                .or_insert_with(|| (name, Vec::new()))
                .1
                .push(handle);
        };

        for (prefix, tier) in DISCOVERY_PREFIXES {
            let physical = format!("{}{}", prefix, self.path);
            for (name, asset) in store.list_all(&physical, kind) {
                route(name, registry.discovered_handle(tier, &asset));
            }
            for (name, spec) in store.list_redirect_markers(&physical) {
                let target = resolve_redirect_target(&self.path, &spec.target);
                route(name, registry.redirect_handle(tier, target));
            }
        }

        log::debug!(
            "Explored directory '{}' for {}: {} name(s)",
            self.path,
            kind,
            found.len()
        );
        for (name, handles) in found.into_values() {
            self.get_or_create(&name).adopt_discovered(kind, handles);
        }
        self.explored.lock().insert(kind);
    }

    /// Best handle per entry, sorted by name; entries without a match are
    /// left out
    pub fn list(
        &self,
        registry: &Registry,
        kind: ResourceKind,
        exact: bool,
    ) -> Result<Vec<(String, Arc<ResourceHandle>)>> {
        self.explore(registry, kind);
        let mut listed = Vec::new();
        for entry in self.entries() {
            if let Some(handle) = entry.resolve_safe(registry, kind, exact, 0, &entry)? {
                listed.push((entry.name().to_string(), handle));
            }
        }
        Ok(listed)
    }

    /// Every variant per entry, sorted by name; entries without a match are
    /// left out
    pub fn list_all_variants(
        &self,
        registry: &Registry,
        kind: ResourceKind,
        exact: bool,
    ) -> Result<Vec<(String, Vec<Arc<ResourceHandle>>)>> {
        self.explore(registry, kind);
        let mut listed = Vec::new();
        for entry in self.entries() {
            let variants = entry.resolve_all(registry, kind, exact, 0, &entry)?;
            if !variants.is_empty() {
                listed.push((entry.name().to_string(), variants));
            }
        }
        Ok(listed)
    }
}

impl fmt::Debug for ResourceDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDirectory")
            .field("path", &self.path)
            .field("entries", &self.len())
            .finish()
    }
}
