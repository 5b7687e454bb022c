// SPDX-License-Identifier: AGPL-3.0
// Home Cinema Core - Application state
//
// Owns every store a frontend needs. Frontends hold one AppState and pass
// references down instead of reaching for globals.

use crate::browse::{resolve_favorites, HomeFeed};
use crate::catalog::{Catalog, TmdbClient};
use crate::favorites::FavoritesStore;
use crate::kv::{FileKeyValueStore, KeyValueStore};
use crate::settings::SettingsStore;
use crate::types::{AppError, Movie};
use std::sync::Arc;

pub struct AppState<C: Catalog = TmdbClient> {
    pub settings: SettingsStore,
    pub favorites: Arc<FavoritesStore>,
    pub catalog: C,
}

impl AppState<TmdbClient> {
    /// Wire up the default stores in the platform config directory.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_defaults() -> Result<Self, AppError> {
        let settings = SettingsStore::new()?;
        let catalog = TmdbClient::new(settings.effective())?;
        let kv: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new()?);
        Self::new(settings, kv, catalog)
    }
}

impl<C: Catalog> AppState<C> {
    pub fn new(
        settings: SettingsStore,
        kv: Arc<dyn KeyValueStore>,
        catalog: C,
    ) -> Result<Self, AppError> {
        let favorites = Arc::new(FavoritesStore::new(kv)?);

        Ok(Self {
            settings,
            favorites,
            catalog,
        })
    }

    /// One-time startup load of persisted favorites
    pub async fn initialize(&self) -> Result<(), AppError> {
        let loaded = self.favorites.load_or_reset().await?;
        tracing::info!("Home Cinema ready with {} favorites", loaded.len());
        Ok(())
    }

    /// Home screen data for the configured default category
    pub async fn home_feed(&self) -> HomeFeed {
        HomeFeed::fetch(&self.catalog, self.settings.get().default_category).await
    }

    /// Catalog records for the current favorites
    pub async fn favorite_movies(&self) -> Vec<Movie> {
        let ids = self.favorites.list();
        resolve_favorites(&self.catalog, &ids).await
    }
}
