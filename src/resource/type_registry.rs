// Decoder registry for the resource system
//
// Maps file extensions to resource kinds and resource kinds to decoders.
// Both tables are overridable at runtime; the defaults cover the text,
// image, audio and raw-byte groupings.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::DecodeError;
use super::resource_type::{ResourceKind, ResourceValue};
use crate::graphics::decode_texture;
use crate::sound::decode_audio;

/// Extension reserved for redirect marker files
pub const REDIRECT_EXTENSION: &str = "redirect";

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "json", "xml", "csv", "yaml", "yml", "toml", "lua", "md",
];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tga", "gif"];
const AUDIO_EXTENSIONS: &[&str] = &["wav", "ogg"];
const BLOB_EXTENSIONS: &[&str] = &["bin", "bytes", "dat"];

/// Extension to kind mapping (case-insensitive)
#[derive(Debug, Clone, PartialEq)]
pub struct KindTable {
    extensions: HashMap<String, ResourceKind>,
}

impl KindTable {
    /// A table with no mappings
    pub fn empty() -> Self {
        KindTable {
            extensions: HashMap::new(),
        }
    }

    /// Map `extension` to `kind`, replacing any previous mapping.
    ///
    /// The redirect marker extension cannot be claimed.
    pub fn install(&mut self, extension: &str, kind: ResourceKind) -> bool {
        let ext = extension.trim_start_matches('.').to_lowercase();
        if ext == REDIRECT_EXTENSION {
            log::warn!("Extension '{}' is reserved for redirect markers", ext);
            return false;
        }
        self.extensions.insert(ext, kind);
        true
    }

    pub fn remove(&mut self, extension: &str) -> Option<ResourceKind> {
        self.extensions
            .remove(&extension.trim_start_matches('.').to_lowercase())
    }

    pub fn lookup(&self, extension: &str) -> Option<ResourceKind> {
        self.extensions
            .get(&extension.trim_start_matches('.').to_lowercase())
            .copied()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for KindTable {
    fn default() -> Self {
        let mut table = KindTable::empty();
        let groups: [(&[&str], ResourceKind); 4] = [
            (TEXT_EXTENSIONS, ResourceKind::Text),
            (IMAGE_EXTENSIONS, ResourceKind::Texture),
            (AUDIO_EXTENSIONS, ResourceKind::Audio),
            (BLOB_EXTENSIONS, ResourceKind::Blob),
        ];
        for (extensions, kind) in groups {
            for ext in extensions {
                table.install(ext, kind);
            }
        }
        table
    }
}

/// Turns fetched bytes into a value of one kind
pub trait Decode: Send + Sync {
    fn decode(&self, bytes: &[u8], hint: &str) -> Result<ResourceValue, DecodeError>;
}

impl<F> Decode for F
where
    F: Fn(&[u8], &str) -> Result<ResourceValue, DecodeError> + Send + Sync,
{
    fn decode(&self, bytes: &[u8], hint: &str) -> Result<ResourceValue, DecodeError> {
        self(bytes, hint)
    }
}

fn decode_blob(bytes: &[u8], _hint: &str) -> Result<ResourceValue, DecodeError> {
    Ok(ResourceValue::blob(bytes.to_vec()))
}

fn decode_text(bytes: &[u8], _hint: &str) -> Result<ResourceValue, DecodeError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DecodeError::InvalidData(format!("Text is not UTF-8: {}", e)))?;
    // A leading byte-order mark is not part of the text.
    Ok(ResourceValue::text(text.strip_prefix('\u{feff}').unwrap_or(text)))
}

fn decode_image(bytes: &[u8], hint: &str) -> Result<ResourceValue, DecodeError> {
    decode_texture(bytes, hint).map(ResourceValue::texture)
}

fn decode_sound(bytes: &[u8], hint: &str) -> Result<ResourceValue, DecodeError> {
    decode_audio(bytes, hint).map(ResourceValue::audio)
}

/// Registry of decoders keyed by kind, plus the extension table that
/// routes a hint to a kind.
#[derive(Clone)]
pub struct DecoderRegistry {
    kinds: KindTable,
    decoders: HashMap<ResourceKind, Arc<dyn Decode>>,
}

impl DecoderRegistry {
    /// Registry with the default extension table and built-in decoders
    pub fn new() -> Self {
        Self::with_kinds(KindTable::default())
    }

    /// Built-in decoders over a custom extension table
    pub fn with_kinds(kinds: KindTable) -> Self {
        let mut registry = DecoderRegistry {
            kinds,
            decoders: HashMap::new(),
        };
        registry.install_decoder(ResourceKind::Blob, decode_blob);
        registry.install_decoder(ResourceKind::Text, decode_text);
        registry.install_decoder(ResourceKind::Texture, decode_image);
        registry.install_decoder(ResourceKind::Audio, decode_sound);
        registry
    }

    /// Install the decoder for `kind`, replacing any previous one
    pub fn install_decoder<D: Decode + 'static>(&mut self, kind: ResourceKind, decoder: D) {
        self.decoders.insert(kind, Arc::new(decoder));
    }

    pub fn kinds(&self) -> &KindTable {
        &self.kinds
    }

    pub fn kinds_mut(&mut self) -> &mut KindTable {
        &mut self.kinds
    }

    /// Kind an extension hint decodes to
    pub fn kind_for(&self, hint: &str) -> Option<ResourceKind> {
        self.kinds.lookup(hint)
    }

    /// Decode `bytes` according to the extension `hint`
    pub fn decode(&self, bytes: &[u8], hint: &str) -> Result<ResourceValue, DecodeError> {
        let kind = self
            .kind_for(hint)
            .ok_or_else(|| DecodeError::UnknownExtension(hint.to_string()))?;
        self.decode_as(kind, bytes, hint)
    }

    /// Decode `bytes` with the decoder installed for `kind`
    pub fn decode_as(
        &self,
        kind: ResourceKind,
        bytes: &[u8],
        hint: &str,
    ) -> Result<ResourceValue, DecodeError> {
        let decoder = self.decoders.get(&kind).ok_or(DecodeError::NoDecoder(kind))?;
        decoder.decode(bytes, hint)
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut installed: Vec<_> = self.decoders.keys().copied().collect();
        installed.sort();
        f.debug_struct("DecoderRegistry")
            .field("kinds", &self.kinds)
            .field("decoders", &installed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::{wav::encode_pcm_wav, AudioFormat};

    #[test]
    fn test_default_groupings() {
        let table = KindTable::default();
        assert_eq!(table.lookup("PNG"), Some(ResourceKind::Texture));
        assert_eq!(table.lookup(".json"), Some(ResourceKind::Text));
        assert_eq!(table.lookup("ogg"), Some(ResourceKind::Audio));
        assert_eq!(table.lookup("bin"), Some(ResourceKind::Blob));
        assert_eq!(table.lookup("fbx"), None);
    }

    #[test]
    fn test_redirect_extension_is_reserved() {
        let mut table = KindTable::default();
        assert!(!table.install("redirect", ResourceKind::Text));
        assert_eq!(table.lookup("redirect"), None);
    }

    #[test]
    fn test_override_mapping() {
        let mut table = KindTable::default();
        table.install("lua", ResourceKind::Blob);
        assert_eq!(table.lookup("lua"), Some(ResourceKind::Blob));
        assert_eq!(table.remove("lua"), Some(ResourceKind::Blob));
        assert_eq!(table.lookup("lua"), None);
    }

    #[test]
    fn test_decode_text_strips_bom() {
        let registry = DecoderRegistry::new();
        let value = registry.decode("\u{feff}hello".as_bytes(), "txt").unwrap();
        assert_eq!(value.as_text(), Some("hello"));
    }

    #[test]
    fn test_decode_invalid_utf8_fails() {
        let registry = DecoderRegistry::new();
        let err = registry.decode(&[0xff, 0xfe, 0x00], "txt").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidData(_)));
    }

    #[test]
    fn test_decode_unknown_extension() {
        let registry = DecoderRegistry::new();
        let err = registry.decode(b"x", "fbx").unwrap_err();
        assert_eq!(err, DecodeError::UnknownExtension("fbx".to_string()));
    }

    #[test]
    fn test_decode_audio_dispatch() {
        let registry = DecoderRegistry::new();
        let wav = encode_pcm_wav(AudioFormat::Mono16, 11025, &[0u8; 64]);
        let value = registry.decode(&wav, "wav").unwrap();
        assert_eq!(value.kind(), ResourceKind::Audio);
    }

    #[test]
    fn test_custom_decoder_overrides_builtin() {
        let mut registry = DecoderRegistry::new();
        registry.install_decoder(
            ResourceKind::Text,
            |bytes: &[u8], _hint: &str| -> Result<ResourceValue, DecodeError> {
                Ok(ResourceValue::text(String::from_utf8_lossy(bytes).to_uppercase()))
            },
        );
        let value = registry.decode(b"shout", "txt").unwrap();
        assert_eq!(value.as_text(), Some("SHOUT"));
    }
}
