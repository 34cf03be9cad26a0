// Property File Parser
// Parses simple key=value property files (redirect markers, registry config)

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

/// Parse property text, invoking `handler` for each key-value pair.
///
/// Keys keep their case, whitespace around keys and values is trimmed, and
/// `#` starts a comment that runs to the end of the line (also after a value).
/// An optional `prefix` is prepended to every key.
pub fn parse_propfile(data: &str, handler: &mut dyn FnMut(&str, &str), prefix: Option<&str>) {
    const NL: u8 = b'\x0A';
    const HASH: u8 = b'#';
    const EQ: u8 = b'=';

    let bytes = data.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            break;
        }

        if bytes[i] == HASH {
            while i < len && bytes[i] != NL {
                i += 1;
            }
            continue;
        }

        let key_start = i;
        while i < len && bytes[i] != EQ && bytes[i] != NL && bytes[i] != HASH {
            i += 1;
        }

        if i >= len || bytes[i] != EQ {
            log::warn!("Property key without value: '{}'", data[key_start..i].trim());
            while i < len && bytes[i] != NL {
                i += 1;
            }
            continue;
        }

        let mut key_end = i;
        while key_end > key_start && bytes[key_end - 1].is_ascii_whitespace() {
            key_end -= 1;
        }
        let key = &data[key_start..key_end];

        i += 1;
        while i < len && bytes[i] != HASH && bytes[i] != NL && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let value_start = i;
        while i < len && bytes[i] != HASH && bytes[i] != NL {
            i += 1;
        }
        let mut value_end = i;
        while value_end > value_start && bytes[value_end - 1].is_ascii_whitespace() {
            value_end -= 1;
        }
        let value = &data[value_start..value_end];

        while i < len && bytes[i] != NL {
            i += 1;
        }

        if key.is_empty() {
            log::warn!("Property with empty key ignored");
            continue;
        }

        match prefix {
            Some(pfx) => handler(&format!("{}{}", pfx, key), value),
            None => handler(key, value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyError {
    FileNotFound,
    IoError,
}

impl std::fmt::Display for PropertyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyError::FileNotFound => write!(f, "Property file not found"),
            PropertyError::IoError => write!(f, "I/O error reading property file"),
        }
    }
}

impl std::error::Error for PropertyError {}

impl From<io::Error> for PropertyError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => PropertyError::FileNotFound,
            _ => PropertyError::IoError,
        }
    }
}

/// Key-value pairs with case-insensitive keys.
///
/// Later duplicates overwrite earlier ones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyFile {
    properties: HashMap<String, String>,
}

impl PropertyFile {
    /// Parse property text
    pub fn parse(content: &str) -> Self {
        let mut properties = HashMap::new();
        parse_propfile(
            content,
            &mut |key, value| {
                properties.insert(key.to_lowercase(), value.to_string());
            },
            None,
        );
        PropertyFile { properties }
    }

    /// Load a property file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PropertyError> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Get a property value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Get an unsigned integer property
    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key)?.parse().ok()
    }

    /// Get a boolean property (`true/false`, `yes/no`, `1/0`)
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)?.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }

    /// Set a property value
    pub fn set(&mut self, key: &str, value: &str) {
        self.properties.insert(key.to_lowercase(), value.to_string());
    }

    /// Check if a property exists
    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(&key.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate over (lowercased key, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
