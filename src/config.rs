use std::path::Path;

use anyhow::{Context, Result};

use crate::resource::propfile::PropertyFile;
use crate::resource::resource_type::ResourceKind;
use crate::resource::tier::PriorityTier;

/// Default bound on redirect hops from the outermost lookup
pub const DEFAULT_MAX_REDIRECT_DEPTH: usize = 16;

/// Registry options that can be set via config file or CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Redirect hops allowed before `RecursionLimitExceeded`; a chain of
    /// exactly this many hops still resolves
    pub max_redirect_depth: usize,
    /// Log a warning when a tier-searching lookup is given a path that
    /// already starts with `Core/` or `Game/`
    pub warn_on_forced_tier: bool,
    /// Tier used when a caller does not name one (runtime injection, files)
    pub runtime_tier: PriorityTier,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            max_redirect_depth: DEFAULT_MAX_REDIRECT_DEPTH,
            warn_on_forced_tier: true,
            runtime_tier: PriorityTier::Explicit,
        }
    }
}

impl RegistryConfig {
    /// Load from a property file; missing keys keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let props = PropertyFile::load(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_properties(&props)
    }

    pub fn from_properties(props: &PropertyFile) -> Result<Self> {
        let mut config = RegistryConfig::default();
        for (key, value) in props.iter() {
            match key {
                "max_redirect_depth" => {
                    config.max_redirect_depth = value
                        .parse()
                        .with_context(|| format!("Invalid max_redirect_depth: {}", value))?;
                }
                "warn_on_forced_tier" => {
                    config.warn_on_forced_tier = props
                        .get_bool(key)
                        .with_context(|| format!("Invalid warn_on_forced_tier: {}", value))?;
                }
                "runtime_tier" => {
                    config.runtime_tier = parse_tier(value)?;
                }
                _ => log::warn!("Ignoring unknown config key '{}'", key),
            }
        }
        Ok(config)
    }
}

/// Parse a tier name (core, game, module, normal, streaming, addon, explicit)
pub fn parse_tier(s: &str) -> Result<PriorityTier> {
    PriorityTier::parse(s).with_context(|| {
        format!(
            "Invalid tier: {}. Valid options: core, game, module, normal, streaming, addon, explicit",
            s
        )
    })
}

/// Parse a kind name (asset, blob, text, texture, audio)
pub fn parse_kind(s: &str) -> Result<ResourceKind> {
    ResourceKind::parse(s).with_context(|| {
        format!(
            "Invalid kind: {}. Valid options: asset, blob, text, texture, audio",
            s
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.max_redirect_depth, 16);
        assert!(config.warn_on_forced_tier);
        assert_eq!(config.runtime_tier, PriorityTier::Explicit);
    }

    #[test]
    fn test_from_properties() {
        let props = PropertyFile::parse(
            "max_redirect_depth = 4\nRuntime_Tier = addon\nwarn_on_forced_tier = no\nextra = 1\n",
        );
        let config = RegistryConfig::from_properties(&props).unwrap();
        assert_eq!(config.max_redirect_depth, 4);
        assert_eq!(config.runtime_tier, PriorityTier::Addon);
        assert!(!config.warn_on_forced_tier);
    }

    #[test]
    fn test_invalid_values() {
        let props = PropertyFile::parse("max_redirect_depth = deep");
        assert!(RegistryConfig::from_properties(&props).is_err());

        let props = PropertyFile::parse("runtime_tier = highest");
        assert!(RegistryConfig::from_properties(&props).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reslayer.cfg");
        std::fs::write(&path, "# registry\nmax_redirect_depth = 2\n").unwrap();
        assert_eq!(RegistryConfig::load(&path).unwrap().max_redirect_depth, 2);
        assert!(RegistryConfig::load(dir.path().join("missing.cfg")).is_err());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_tier("GAME").unwrap(), PriorityTier::Game);
        assert_eq!(parse_kind("image").unwrap(), ResourceKind::Texture);
        assert!(parse_kind("mesh").is_err());
    }
}
