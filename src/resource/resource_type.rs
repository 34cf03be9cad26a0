// Resource Type Definitions
// Closed set of resource kinds, their subtype tree, and loaded values

use std::fmt;
use std::sync::Arc;

use crate::graphics::Texture;
use crate::sound::AudioClip;

/// Kinds of resource a handle can produce.
///
/// The kinds form a fixed single-inheritance tree rooted at `Asset`:
///
/// ```text
/// Asset
/// ├── Blob
/// │   └── Text
/// ├── Texture
/// └── Audio
/// ```
///
/// `Asset` is abstract; no loaded value reports it as its runtime kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Asset,
    Blob,
    Text,
    Texture,
    Audio,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Asset,
        ResourceKind::Blob,
        ResourceKind::Text,
        ResourceKind::Texture,
        ResourceKind::Audio,
    ];

    /// Direct parent in the kind tree
    pub fn parent(self) -> Option<ResourceKind> {
        match self {
            ResourceKind::Asset => None,
            ResourceKind::Blob | ResourceKind::Texture | ResourceKind::Audio => {
                Some(ResourceKind::Asset)
            }
            ResourceKind::Text => Some(ResourceKind::Blob),
        }
    }

    /// True if a value of kind `other` can stand in for `self`
    /// (`other` is `self` or one of its descendants).
    pub fn is_assignable_from(self, other: ResourceKind) -> bool {
        let mut current = Some(other);
        while let Some(kind) = current {
            if kind == self {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Parse a kind name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asset" | "any" => Some(ResourceKind::Asset),
            "blob" | "binary" | "bytes" => Some(ResourceKind::Blob),
            "text" | "string" => Some(ResourceKind::Text),
            "texture" | "image" => Some(ResourceKind::Texture),
            "audio" | "sound" => Some(ResourceKind::Audio),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Asset => "ASSET",
            ResourceKind::Blob => "BLOB",
            ResourceKind::Text => "TEXT",
            ResourceKind::Texture => "TEXTURE",
            ResourceKind::Audio => "AUDIO",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A loaded resource.
///
/// Cloning is cheap; every variant shares its payload through an `Arc`, and
/// that shared allocation is the value's identity.
#[derive(Debug, Clone)]
pub enum ResourceValue {
    Blob(Arc<[u8]>),
    Text(Arc<str>),
    Texture(Arc<Texture>),
    Audio(Arc<AudioClip>),
}

impl ResourceValue {
    pub fn blob(bytes: impl Into<Vec<u8>>) -> Self {
        ResourceValue::Blob(Arc::from(bytes.into()))
    }

    pub fn text(text: impl Into<String>) -> Self {
        ResourceValue::Text(Arc::from(text.into()))
    }

    pub fn texture(texture: Texture) -> Self {
        ResourceValue::Texture(Arc::new(texture))
    }

    pub fn audio(clip: AudioClip) -> Self {
        ResourceValue::Audio(Arc::new(clip))
    }

    /// Exact runtime kind of this value
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceValue::Blob(_) => ResourceKind::Blob,
            ResourceValue::Text(_) => ResourceKind::Text,
            ResourceValue::Texture(_) => ResourceKind::Texture,
            ResourceValue::Audio(_) => ResourceKind::Audio,
        }
    }

    /// True if both values share the same underlying allocation
    pub fn same_object(&self, other: &ResourceValue) -> bool {
        match (self, other) {
            (ResourceValue::Blob(a), ResourceValue::Blob(b)) => Arc::ptr_eq(a, b),
            (ResourceValue::Text(a), ResourceValue::Text(b)) => Arc::ptr_eq(a, b),
            (ResourceValue::Texture(a), ResourceValue::Texture(b)) => Arc::ptr_eq(a, b),
            (ResourceValue::Audio(a), ResourceValue::Audio(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResourceValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Raw bytes for blob-like values (a `Text` is also a blob)
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ResourceValue::Blob(b) => Some(b),
            ResourceValue::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&Texture> {
        match self {
            ResourceValue::Texture(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioClip> {
        match self {
            ResourceValue::Audio(a) => Some(a),
            _ => None,
        }
    }

    /// One-line human readable description
    pub fn describe(&self) -> String {
        match self {
            ResourceValue::Blob(b) => format!("BLOB {} bytes", b.len()),
            ResourceValue::Text(s) => format!("TEXT {} chars", s.chars().count()),
            ResourceValue::Texture(t) => format!("TEXTURE {}x{}", t.width(), t.height()),
            ResourceValue::Audio(a) => format!(
                "AUDIO {} {}ch {}Hz",
                a.container(),
                a.channels(),
                a.sample_rate()
            ),
        }
    }
}

/// Statically typed view onto a `ResourceValue` variant.
pub trait Resource {
    /// Kind requested from the registry when loading `Self`
    const KIND: ResourceKind;

    /// Extract `Self` from a value; `None` if the variant does not fit
    fn from_value(value: ResourceValue) -> Option<Arc<Self>>;
}

impl Resource for str {
    const KIND: ResourceKind = ResourceKind::Text;

    fn from_value(value: ResourceValue) -> Option<Arc<Self>> {
        match value {
            ResourceValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Resource for [u8] {
    const KIND: ResourceKind = ResourceKind::Blob;

    fn from_value(value: ResourceValue) -> Option<Arc<Self>> {
        match value {
            ResourceValue::Blob(b) => Some(b),
            ResourceValue::Text(s) => Some(Arc::from(s.as_bytes())),
            _ => None,
        }
    }
}

impl Resource for Texture {
    const KIND: ResourceKind = ResourceKind::Texture;

    fn from_value(value: ResourceValue) -> Option<Arc<Self>> {
        match value {
            ResourceValue::Texture(t) => Some(t),
            _ => None,
        }
    }
}

impl Resource for AudioClip {
    const KIND: ResourceKind = ResourceKind::Audio;

    fn from_value(value: ResourceValue) -> Option<Arc<Self>> {
        match value {
            ResourceValue::Audio(a) => Some(a),
            _ => None,
        }
    }
}
