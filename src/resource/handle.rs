//! Resource handles
//!
//! A handle is one candidate source for a `(name, kind)` pair. Direct handles
//! own an [`AssetCell`] that either holds a value or knows how to load one;
//! redirect handles name another logical path and are followed through the
//! registry at resolution time.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::error::{FetchError, ResourceError, Result};
use super::resource_type::{ResourceKind, ResourceValue};
use super::tier::PriorityTier;
use super::type_registry::DecoderRegistry;
use crate::io::Fetch;

/// Registry-unique, strictly increasing handle identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Loader {
    source: Arc<dyn Fetch>,
    key: String,
    hint: String,
}

/// Lazily materialized asset.
///
/// The kind is known up front, from the extension table, so resolution can
/// filter by kind without loading anything. The value is stored only once
/// fetch and decode have both succeeded; the first stored value wins and is
/// shared by every handle onto this cell.
pub struct AssetCell {
    kind: ResourceKind,
    label: String,
    loader: Option<Loader>,
    value: Mutex<Option<ResourceValue>>,
}

impl AssetCell {
    /// A cell holding an already loaded value
    pub fn preloaded(label: impl Into<String>, value: ResourceValue) -> Self {
        AssetCell {
            kind: value.kind(),
            label: label.into(),
            loader: None,
            value: Mutex::new(Some(value)),
        }
    }

    /// A cell that fetches `key` from `source` and decodes it with `hint`
    pub fn lazy(
        kind: ResourceKind,
        label: impl Into<String>,
        source: Arc<dyn Fetch>,
        key: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        AssetCell {
            kind,
            label: label.into(),
            loader: Some(Loader {
                source,
                key: key.into(),
                hint: hint.into(),
            }),
            value: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Store key or logical path this cell was created for
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_loaded(&self) -> bool {
        self.value.lock().is_some()
    }

    /// Load with a blocking fetch
    pub fn materialize(&self, decoders: &DecoderRegistry) -> Result<ResourceValue> {
        let loaded = self.value.lock().clone();
        if let Some(value) = loaded {
            return Ok(value);
        }
        let loader = self.loader()?;
        let bytes = loader
            .source
            .fetch(&loader.key)
            .map_err(|source| ResourceError::Fetch {
                path: self.label.clone(),
                source,
            })?;
        self.store(decoders, &bytes, &loader.hint)
    }

    /// Load with a non-blocking fetch.
    ///
    /// Dropping the future before it completes leaves the cell unloaded.
    pub async fn materialize_async(&self, decoders: &DecoderRegistry) -> Result<ResourceValue> {
        let loaded = self.value.lock().clone();
        if let Some(value) = loaded {
            return Ok(value);
        }
        let loader = self.loader()?;
        let bytes = loader
            .source
            .fetch_async(&loader.key)
            .await
            .map_err(|source| ResourceError::Fetch {
                path: self.label.clone(),
                source,
            })?;
        self.store(decoders, &bytes, &loader.hint)
    }

    fn loader(&self) -> Result<&Loader> {
        // A cell without a loader is built preloaded and never emptied.
        self.loader.as_ref().ok_or_else(|| ResourceError::Fetch {
            path: self.label.clone(),
            source: FetchError::Missing(self.label.clone()),
        })
    }

    fn store(&self, decoders: &DecoderRegistry, bytes: &[u8], hint: &str) -> Result<ResourceValue> {
        let value = decoders
            .decode_as(self.kind, bytes, hint)
            .map_err(|source| ResourceError::Decode {
                path: self.label.clone(),
                source,
            })?;
        if value.kind() != self.kind {
            return Err(ResourceError::KindMismatch {
                expected: self.kind,
                actual: value.kind(),
            });
        }

        let mut slot = self.value.lock();
        match slot.as_ref() {
            Some(existing) => Ok(existing.clone()),
            None => {
                log::debug!("Materialized '{}' as {}", self.label, value.describe());
                *slot = Some(value.clone());
                Ok(value)
            }
        }
    }
}

impl fmt::Debug for AssetCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetCell")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// How a handle produces its value
#[derive(Debug, Clone)]
pub enum HandleKind {
    Direct(Arc<AssetCell>),
    /// Normalized logical path to resolve instead
    Redirect { target: String },
}

/// One candidate source for a name, ranked by `(priority, id)`
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    priority: PriorityTier,
    id: HandleId,
    kind: HandleKind,
}

impl ResourceHandle {
    pub fn direct(priority: PriorityTier, id: HandleId, cell: Arc<AssetCell>) -> Self {
        ResourceHandle {
            priority,
            id,
            kind: HandleKind::Direct(cell),
        }
    }

    pub fn redirect(priority: PriorityTier, id: HandleId, target: impl Into<String>) -> Self {
        ResourceHandle {
            priority,
            id,
            kind: HandleKind::Redirect {
                target: target.into(),
            },
        }
    }

    pub fn priority(&self) -> PriorityTier {
        self.priority
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn kind(&self) -> &HandleKind {
        &self.kind
    }

    /// Sort key; higher ranks win
    pub fn rank(&self) -> (PriorityTier, HandleId) {
        (self.priority, self.id)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.kind, HandleKind::Redirect { .. })
    }

    pub fn cell(&self) -> Option<&Arc<AssetCell>> {
        match &self.kind {
            HandleKind::Direct(cell) => Some(cell),
            HandleKind::Redirect { .. } => None,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            HandleKind::Direct(_) => None,
            HandleKind::Redirect { target } => Some(target),
        }
    }

    /// Kind of the value a direct handle yields
    pub fn value_kind(&self) -> Option<ResourceKind> {
        self.cell().map(|cell| cell.kind())
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            HandleKind::Direct(cell) => {
                write!(f, "{} {} {} '{}'", self.id, self.priority, cell.kind(), cell.label())
            }
            HandleKind::Redirect { target } => {
                write!(f, "{} {} -> '{}'", self.id, self.priority, target)
            }
        }
    }
}
