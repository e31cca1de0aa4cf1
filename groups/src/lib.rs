pub mod api;
pub mod auth;
pub mod config;
pub mod fallback;
pub mod metrics_defs;
pub mod normalize;
pub mod resolver;
pub mod store;
pub mod types;

#[cfg(test)]
mod testutils;

use api::{GroupsState, ServeError};
use auth::StaticTokenAuthorizer;
use config::{Config, FallbackStoreType};
use fallback::{FallbackError, FallbackProvider, FilesystemFallbackProvider, NoopFallbackProvider};
use std::path::Path;
use std::sync::Arc;
use store::{GroupStore, SqliteGroupStore, StoreError};

pub fn fallback_provider(config: &FallbackStoreType) -> Arc<dyn FallbackProvider> {
    match config {
        FallbackStoreType::Filesystem { path } => Arc::new(FilesystemFallbackProvider::new(path)),
        FallbackStoreType::None => Arc::new(NoopFallbackProvider {}),
    }
}

pub async fn run(config: Config) -> Result<(), ServeError> {
    if !config.enabled {
        tracing::warn!("groups API is disabled, requests will be answered with 503");
    }

    let state = GroupsState::new(
        config.enabled,
        Arc::new(SqliteGroupStore::new(&config.store.path)),
        fallback_provider(&config.fallback),
        Arc::new(StaticTokenAuthorizer::new(config.auth.bearer_tokens.clone())),
    );

    api::serve(&config.listener, state).await
}

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("could not read groups from the store: {0}")]
    Store(#[from] StoreError),
    #[error("no groups store found at {0}")]
    StoreNotFound(String),
    #[error("could not write fallback document: {0}")]
    Fallback(#[from] FallbackError),
}

/// Snapshots the store into a fallback document, written to `output` if
/// given and to the configured fallback otherwise. Returns the group count.
pub fn export_fallback(config: &Config, output: Option<&Path>) -> Result<usize, ExportError> {
    let store = SqliteGroupStore::new(&config.store.path);
    let groups = store
        .fetch()?
        .ok_or_else(|| ExportError::StoreNotFound(config.store.path.clone()))?;

    let provider: Arc<dyn FallbackProvider> = match output {
        Some(path) => Arc::new(FilesystemFallbackProvider::new(path)),
        None => fallback_provider(&config.fallback),
    };
    provider.store(&groups)?;

    Ok(groups.len())
}
