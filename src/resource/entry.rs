//! Per-name resource entries
//!
//! An entry holds, for one logical name, a handle list per explored kind.
//! Lists are sorted ascending by `(priority, id)` so the best handle is the
//! tail. Discovery runs lazily once per kind.
//!
//! Locking: the entry mutex is held only while reading or mutating the
//! lists, never across a store probe, a redirect hop or a fetch. A redirect
//! chain that comes back to this entry therefore cannot deadlock; it is
//! reported as a loop instead.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::error::{ResourceError, Result};
use super::handle::{HandleId, HandleKind, ResourceHandle};
use super::path::{resolve_redirect_target, split_path};
use super::registry::Registry;
use super::resource_type::ResourceKind;
use super::tier::DISCOVERY_PREFIXES;

#[derive(Default)]
struct EntryState {
    /// A kind is explored iff it has a list here, possibly empty
    handles: HashMap<ResourceKind, Vec<Arc<ResourceHandle>>>,
    /// Winning direct handle per kind for loose resolution
    best_cache: HashMap<ResourceKind, Arc<ResourceHandle>>,
    /// Bumped on every change to `handles`
    generation: u64,
}

impl EntryState {
    fn invalidate(&mut self) {
        self.best_cache.clear();
        self.generation += 1;
    }

    /// Tails of every list whose kind can stand in for `kind`, best first
    fn loose_candidates(&self, kind: ResourceKind) -> Vec<Arc<ResourceHandle>> {
        let mut candidates: Vec<_> = self
            .handles
            .iter()
            .filter(|(list_kind, _)| kind.is_assignable_from(**list_kind))
            .filter_map(|(_, list)| list.last().cloned())
            .collect();
        candidates.sort_by(|a, b| b.rank().cmp(&a.rank()));
        candidates
    }

    /// Every handle of every list whose kind can stand in for `kind`, ascending
    fn loose_merged(&self, kind: ResourceKind) -> Vec<Arc<ResourceHandle>> {
        let mut merged: Vec<_> = self
            .handles
            .iter()
            .filter(|(list_kind, _)| kind.is_assignable_from(**list_kind))
            .flat_map(|(_, list)| list.iter().cloned())
            .collect();
        merged.sort_by_key(|h| h.rank());
        merged
    }
}

fn insert_sorted(list: &mut Vec<Arc<ResourceHandle>>, handle: Arc<ResourceHandle>) {
    let pos = list.partition_point(|h| h.rank() < handle.rank());
    list.insert(pos, handle);
}

/// All handles registered under one logical name
pub struct ResourceEntry {
    path: String,
    state: Mutex<EntryState>,
}

impl ResourceEntry {
    /// `path` is the normalized full logical path
    pub fn new(path: impl Into<String>) -> Self {
        ResourceEntry {
            path: path.into(),
            state: Mutex::new(EntryState::default()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        split_path(&self.path).1
    }

    /// Logical directory, with trailing slash
    pub fn directory(&self) -> &str {
        split_path(&self.path).0
    }

    pub fn is_explored(&self, kind: ResourceKind) -> bool {
        self.state.lock().handles.contains_key(&kind)
    }

    pub fn explored_kinds(&self) -> Vec<ResourceKind> {
        let mut kinds: Vec<_> = self.state.lock().handles.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Snapshot of the handle list for exactly `kind`, ascending
    pub fn handles(&self, kind: ResourceKind) -> Vec<Arc<ResourceHandle>> {
        self.state
            .lock()
            .handles
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Handle currently memoized for loose resolution of `kind`
    pub fn cached_best(&self, kind: ResourceKind) -> Option<Arc<ResourceHandle>> {
        self.state.lock().best_cache.get(&kind).cloned()
    }

    /// Probe the store for `kind` under every discovery prefix.
    ///
    /// Idempotent; a kind with no hits is still marked explored.
    pub fn explore(&self, registry: &Registry, kind: ResourceKind) {
        if self.is_explored(kind) {
            return;
        }

        let store = registry.store();
        let mut found = Vec::new();
        for (prefix, tier) in DISCOVERY_PREFIXES {
            let physical = format!("{}{}", prefix, self.path);
            if let Some(asset) = store.probe(&physical, kind) {
                found.push(registry.discovered_handle(tier, &asset));
            }
            if let Some(spec) = store.probe_redirect_marker(&physical) {
                let target = resolve_redirect_target(self.directory(), &spec.target);
                found.push(registry.redirect_handle(tier, target));
            }
        }

        let mut state = self.state.lock();
        if state.handles.contains_key(&kind) {
            // Explored concurrently; the ids drawn above are simply unused.
            return;
        }
        log::debug!(
            "Explored '{}' for {}: {} handle(s)",
            self.path,
            kind,
            found.len()
        );
        if !found.is_empty() {
            state.invalidate();
        }
        state.handles.insert(kind, found);
    }

    /// Add a handle to the list for `kind`, exploring it first so discovered
    /// handles are not lost.
    pub fn insert(&self, registry: &Registry, kind: ResourceKind, handle: Arc<ResourceHandle>) {
        self.explore(registry, kind);
        let mut guard = self.state.lock();
        let state = &mut *guard;
        insert_sorted(state.handles.entry(kind).or_default(), handle);
        state.invalidate();
    }

    /// Remove the handle `id` from the list for `kind`
    pub fn remove(&self, kind: ResourceKind, id: HandleId) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(list) = state.handles.get_mut(&kind) else {
            return false;
        };
        let Some(pos) = list.iter().position(|h| h.id() == id) else {
            return false;
        };
        list.remove(pos);
        state.invalidate();
        true
    }

    /// Install `handles` as the whole list for `kind`, marking it explored.
    ///
    /// Returns true if a non-empty list was overwritten, which is logged as
    /// a duplicate registration.
    pub fn replace_handles(&self, kind: ResourceKind, mut handles: Vec<Arc<ResourceHandle>>) -> bool {
        handles.sort_by_key(|h| h.rank());
        let mut state = self.state.lock();
        let overwritten = state.handles.get(&kind).is_some_and(|l| !l.is_empty());
        if overwritten {
            log::warn!(
                "Duplicate registration for '{}' ({}): replacing existing handles",
                self.path,
                kind
            );
        }
        state.handles.insert(kind, handles);
        state.invalidate();
        overwritten
    }

    /// Take handles found by a directory-wide listing.
    ///
    /// An unexplored kind adopts them as its list. An explored kind only
    /// gains handles whose tier it does not have yet.
    pub(crate) fn adopt_discovered(&self, kind: ResourceKind, handles: Vec<Arc<ResourceHandle>>) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let changed = match state.handles.get_mut(&kind) {
            None => {
                let changed = !handles.is_empty();
                let mut handles = handles;
                handles.sort_by_key(|h| h.rank());
                state.handles.insert(kind, handles);
                changed
            }
            Some(list) => {
                let mut changed = false;
                for handle in handles {
                    if list.iter().any(|h| h.priority() == handle.priority()) {
                        continue;
                    }
                    insert_sorted(list, handle);
                    changed = true;
                }
                changed
            }
        };
        if changed {
            state.invalidate();
        }
    }

    fn check_guards(&self, registry: &Registry, depth: usize, root: &ResourceEntry) -> Result<()> {
        let limit = registry.config().max_redirect_depth;
        if depth > limit {
            return Err(ResourceError::RecursionLimitExceeded {
                path: self.path.clone(),
                depth,
            });
        }
        if depth > 0 && std::ptr::eq(self, root) {
            return Err(ResourceError::RecursionLoopDetected {
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    /// Pick the winning direct handle for `kind`, following redirects.
    ///
    /// `depth` counts redirect hops from the outermost call, whose entry is
    /// `root`. `Ok(None)` means nothing matches.
    pub fn resolve_safe(
        &self,
        registry: &Registry,
        kind: ResourceKind,
        exact: bool,
        depth: usize,
        root: &ResourceEntry,
    ) -> Result<Option<Arc<ResourceHandle>>> {
        self.check_guards(registry, depth, root)?;
        if exact {
            self.resolve_exact(registry, kind, depth, root)
        } else {
            self.resolve_loose(registry, kind, depth, root)
        }
    }

    fn resolve_loose(
        &self,
        registry: &Registry,
        kind: ResourceKind,
        depth: usize,
        root: &ResourceEntry,
    ) -> Result<Option<Arc<ResourceHandle>>> {
        if let Some(cached) = self.cached_best(kind) {
            return Ok(Some(cached));
        }
        self.explore(registry, kind);

        let (generation, candidates) = {
            let state = self.state.lock();
            (state.generation, state.loose_candidates(kind))
        };

        // Rank alone decides the order; a redirect is only followed when
        // everything ranked above it has been ruled out.
        let mut skipped_redirect = false;
        for candidate in candidates {
            match candidate.kind() {
                HandleKind::Direct(_) => {
                    // A skipped redirect may start resolving later, so a
                    // result that ranks below one is not memoized.
                    if !skipped_redirect {
                        let mut state = self.state.lock();
                        if state.generation == generation {
                            state.best_cache.insert(kind, candidate.clone());
                        }
                    }
                    return Ok(Some(candidate));
                }
                HandleKind::Redirect { target } => {
                    if let Some(resolved) = registry.follow(target, kind, false, depth + 1, root)? {
                        return Ok(Some(resolved));
                    }
                    skipped_redirect = true;
                }
            }
        }
        Ok(None)
    }

    fn resolve_exact(
        &self,
        registry: &Registry,
        kind: ResourceKind,
        depth: usize,
        root: &ResourceEntry,
    ) -> Result<Option<Arc<ResourceHandle>>> {
        self.explore(registry, kind);
        for candidate in self.handles(kind).into_iter().rev() {
            match candidate.kind() {
                HandleKind::Direct(cell) => {
                    if cell.kind() == kind {
                        return Ok(Some(candidate));
                    }
                }
                HandleKind::Redirect { target } => {
                    if let Some(resolved) = registry.follow(target, kind, true, depth + 1, root)? {
                        return Ok(Some(resolved));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Every resolvable handle for `kind` in ascending rank, redirects
    /// replaced by what they resolve to
    pub fn resolve_all(
        &self,
        registry: &Registry,
        kind: ResourceKind,
        exact: bool,
        depth: usize,
        root: &ResourceEntry,
    ) -> Result<Vec<Arc<ResourceHandle>>> {
        self.check_guards(registry, depth, root)?;
        self.explore(registry, kind);

        let handles = if exact {
            self.handles(kind)
        } else {
            self.state.lock().loose_merged(kind)
        };

        let mut resolved = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.kind() {
                HandleKind::Direct(cell) => {
                    if !exact || cell.kind() == kind {
                        resolved.push(handle.clone());
                    }
                }
                HandleKind::Redirect { target } => {
                    if let Some(hit) = registry.follow(target, kind, exact, depth + 1, root)? {
                        resolved.push(hit);
                    }
                }
            }
        }
        Ok(resolved)
    }

    /// True iff [`ResourceEntry::resolve_safe`] would find a handle, without
    /// resolving more of a redirect chain than needed
    pub fn exists_safe(
        &self,
        registry: &Registry,
        kind: ResourceKind,
        exact: bool,
        depth: usize,
        root: &ResourceEntry,
    ) -> Result<bool> {
        self.check_guards(registry, depth, root)?;
        if !exact && self.cached_best(kind).is_some() {
            return Ok(true);
        }
        self.explore(registry, kind);

        let candidates: Vec<_> = if exact {
            self.handles(kind).into_iter().rev().collect()
        } else {
            self.state.lock().loose_candidates(kind)
        };

        for candidate in candidates {
            match candidate.kind() {
                HandleKind::Direct(cell) => {
                    if !exact || cell.kind() == kind {
                        return Ok(true);
                    }
                }
                HandleKind::Redirect { target } => {
                    if registry.follow_exists(target, kind, exact, depth + 1, root)? {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }
}

impl fmt::Debug for ResourceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        let mut kinds: Vec<_> = state.handles.iter().map(|(k, l)| (*k, l.len())).collect();
        kinds.sort();
        f.debug_struct("ResourceEntry")
            .field("path", &self.path)
            .field("handles", &kinds)
            .field("cached", &state.best_cache.len())
            .finish()
    }
}
