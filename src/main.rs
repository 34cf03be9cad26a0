use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use reslayer::cli::{self, Cli};
use reslayer::config::RegistryConfig;
use reslayer::io::{ArchiveStore, AssetStore, DirectoryStore, Manifest};
use reslayer::logging;
use reslayer::resource::Registry;

fn build<S: AssetStore + Manifest + 'static>(store: Arc<S>, config: RegistryConfig) -> Registry {
    Registry::new(store.clone())
        .with_manifest(store)
        .with_config(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.log_level()?);
    let config = cli.load_config()?;
    log::debug!("Registry config: {:?}", config);

    let registry = match &cli.archive {
        Some(path) => {
            let store = ArchiveStore::open(path)
                .with_context(|| format!("Failed to open archive {}", path.display()))?;
            build(Arc::new(store), config)
        }
        None => {
            let root = cli.content.clone().unwrap_or_else(|| PathBuf::from("."));
            let store = DirectoryStore::open(&root)
                .with_context(|| format!("Failed to open content directory {}", root.display()))?;
            build(Arc::new(store), config)
        }
    };

    for path in &cli.bundle {
        let bundle = ArchiveStore::open(path)
            .with_context(|| format!("Failed to open bundle {}", path.display()))?;
        let added = registry.add_runtime_bundle(Arc::new(bundle));
        log::info!(
            "Layered {} asset(s) from {} at {}",
            added,
            path.display(),
            registry.config().runtime_tier
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    cli::run(&registry, &cli.command, &mut out)
}
