//! Opening the configured store and engine.

use anyhow::{Context, Result};
use tally_core::{BlobStore, EngineOptions, StatsEngine, SystemClock};
use tally_db::{JsonFileStore, SqliteStore};

use crate::config::{Backend, Config};
use crate::mirror;

/// The engine as the CLI runs it.
pub type Engine = StatsEngine<Box<dyn BlobStore>, SystemClock>;

/// Opens the configured backend.
pub fn open_store(config: &Config) -> Result<Box<dyn BlobStore>> {
    let store: Box<dyn BlobStore> = match config.backend {
        Backend::Json => Box::new(JsonFileStore::single(&config.store_path)),
        Backend::Sqlite => Box::new(
            SqliteStore::open(&config.store_path)
                .with_context(|| format!("failed to open {}", config.store_path.display()))?,
        ),
    };
    Ok(store)
}

/// Opens the engine over the configured store, with mirroring if configured.
pub fn open_engine(config: &Config) -> Result<Engine> {
    let store = open_store(config)?;
    let options = EngineOptions {
        document_key: config.document_key.clone(),
        retention: config.retention.clone(),
    };
    let mut engine = StatsEngine::open_with(store, SystemClock, options)
        .context("failed to load statistics")?;
    if let Some(path) = &config.mirror_path {
        mirror::install(&mut engine, path.clone());
    }
    Ok(engine)
}
