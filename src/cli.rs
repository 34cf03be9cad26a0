use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{parse_kind, RegistryConfig};
use crate::logging::LogLevel;
use crate::resource::Registry;

/// Inspect how logical resource paths resolve across priority tiers
#[derive(Parser, Debug)]
#[command(name = "reslayer")]
#[command(version)]
#[command(about = "Priority-overlay resource resolution", long_about = None)]
pub struct Cli {
    /// Content directory holding Core/, Game/ and normal assets (default: .)
    #[arg(short, long, value_name = "DIR", conflicts_with = "archive")]
    pub content: Option<PathBuf>,

    /// Zip archive to read content from instead of a directory
    #[arg(short, long, value_name = "ZIP")]
    pub archive: Option<PathBuf>,

    /// Zip bundle layered on top at the runtime tier (repeatable)
    #[arg(short, long, value_name = "ZIP")]
    pub bundle: Vec<PathBuf>,

    /// Registry config file (key = value)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum redirect hops
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Log level (nothing, error, warning, info, debug, all)
    #[arg(short, long, value_name = "LEVEL", default_value = "warning")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve one logical path to its winning value
    Resolve {
        path: String,
        /// Requested kind (asset, blob, text, texture, audio)
        #[arg(short, long, default_value = "asset")]
        kind: String,
        /// Only accept values of exactly this kind
        #[arg(long)]
        exact: bool,
    },
    /// Show every variant of one logical path, lowest priority first
    Variants {
        path: String,
        #[arg(short, long, default_value = "asset")]
        kind: String,
        #[arg(long)]
        exact: bool,
    },
    /// List the winning value of every name in a directory
    List {
        #[arg(default_value = "")]
        dir: String,
        #[arg(short, long, default_value = "asset")]
        kind: String,
        #[arg(long)]
        exact: bool,
    },
    /// List folders under a prefix
    Folders {
        #[arg(default_value = "")]
        prefix: String,
        #[arg(short, long)]
        recursive: bool,
    },
}

impl Cli {
    /// Merge CLI arguments into the config
    pub fn merge_into_config(&self, mut config: RegistryConfig) -> Result<RegistryConfig> {
        if let Some(depth) = self.max_depth {
            config.max_redirect_depth = depth;
        }
        Ok(config)
    }

    /// Config file (if given) with CLI overrides on top
    pub fn load_config(&self) -> Result<RegistryConfig> {
        let config = match &self.config {
            Some(path) => RegistryConfig::load(path)?,
            None => RegistryConfig::default(),
        };
        self.merge_into_config(config)
    }

    pub fn log_level(&self) -> Result<LogLevel> {
        LogLevel::parse(&self.log_level)
            .with_context(|| format!("Invalid log level: {}", self.log_level))
    }
}

/// Run one command against a registry, writing one line per result
pub fn run<W: Write>(registry: &Registry, command: &Command, out: &mut W) -> Result<()> {
    match command {
        Command::Resolve { path, kind, exact } => {
            let kind = parse_kind(kind)?;
            match registry.resolve_handle(path, kind, *exact)? {
                Some(handle) => {
                    let value = handle
                        .cell()
                        .with_context(|| format!("'{}' resolved to a redirect", path))?
                        .materialize(registry.decoders())?;
                    writeln!(out, "{}: {} [{} {}]", path, value.describe(), handle.priority(), handle.id())?;
                }
                None => writeln!(out, "{}: not found", path)?,
            }
        }
        Command::Variants { path, kind, exact } => {
            let kind = parse_kind(kind)?;
            for value in registry.resolve_all(path, kind, *exact)? {
                writeln!(out, "{}", value.describe())?;
            }
        }
        Command::List { dir, kind, exact } => {
            let kind = parse_kind(kind)?;
            for (name, value) in registry.list_as_map(dir, kind, *exact)? {
                writeln!(out, "{}: {}", name, value.describe())?;
            }
        }
        Command::Folders { prefix, recursive } => {
            let folders = if *recursive {
                registry.folders_recursive(prefix)
            } else {
                registry.folders_in(prefix)
            };
            for folder in folders {
                writeln!(out, "{}", folder)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryStore;
    use crate::resource::PriorityTier;
    use std::sync::Arc;

    fn registry() -> Registry {
        let store = Arc::new(
            MemoryStore::new()
                .with_file("Core/ui/title.txt", "core title")
                .with_file("ui/title.txt", "title")
                .with_file("ui/data.bin", vec![0u8; 4]),
        );
        Registry::new(store.clone()).with_manifest(store)
    }

    fn output(registry: &Registry, args: &[&str]) -> String {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        run(registry, &cli.command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_merge_overrides_depth() {
        let cli = Cli::try_parse_from(["reslayer", "--max-depth", "3", "folders"]).unwrap();
        let config = cli.merge_into_config(RegistryConfig::default()).unwrap();
        assert_eq!(config.max_redirect_depth, 3);
        assert_eq!(config.runtime_tier, PriorityTier::Explicit);
    }

    #[test]
    fn test_resolve_loads_the_selected_handle_once() {
        let registry = registry();
        let text = output(&registry, &["reslayer", "resolve", "ui/title", "-k", "text"]);
        let handle = registry
            .resolve_handle("ui/title", crate::resource::ResourceKind::Text, false)
            .unwrap()
            .unwrap();
        assert!(handle.cell().unwrap().is_loaded());
        assert_eq!(text, format!("ui/title: TEXT 5 chars [Normal {}]\n", handle.id()));
    }

    #[test]
    fn test_bundles_are_repeatable() {
        let cli = Cli::try_parse_from(["reslayer", "-b", "a.zip", "--bundle", "b.zip", "folders"]).unwrap();
        assert_eq!(cli.bundle, vec![PathBuf::from("a.zip"), PathBuf::from("b.zip")]);
    }

    #[test]
    fn test_content_and_archive_conflict() {
        let result = Cli::try_parse_from(["reslayer", "-c", "dir", "-a", "x.zip", "folders"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_level() {
        let cli = Cli::try_parse_from(["reslayer", "--log-level", "debug", "folders"]).unwrap();
        assert_eq!(cli.log_level().unwrap(), LogLevel::Debug);
        let cli = Cli::try_parse_from(["reslayer", "--log-level", "chatty", "folders"]).unwrap();
        assert!(cli.log_level().is_err());
    }

    #[test]
    fn test_resolve_command() {
        let registry = registry();
        let text = output(&registry, &["reslayer", "resolve", "ui/title", "--kind", "text"]);
        assert!(text.starts_with("ui/title: TEXT 5 chars [Normal #"));
        let missing = output(&registry, &["reslayer", "resolve", "ui/none"]);
        assert_eq!(missing, "ui/none: not found\n");
    }

    #[test]
    fn test_variants_and_list_commands() {
        let registry = registry();
        let variants = output(&registry, &["reslayer", "variants", "ui/title", "-k", "text"]);
        assert_eq!(variants, "TEXT 10 chars\nTEXT 5 chars\n");

        let listed = output(&registry, &["reslayer", "list", "ui", "-k", "blob"]);
        assert_eq!(listed, "data: BLOB 4 bytes\ntitle: TEXT 5 chars\n");
    }

    #[test]
    fn test_folders_command() {
        let registry = registry();
        assert_eq!(output(&registry, &["reslayer", "folders"]), "ui\n");
    }

    #[test]
    fn test_bad_kind_is_an_error() {
        let registry = registry();
        let cli = Cli::try_parse_from(["reslayer", "resolve", "ui/title", "-k", "mesh"]).unwrap();
        let mut out = Vec::new();
        assert!(run(&registry, &cli.command, &mut out).is_err());
    }
}
