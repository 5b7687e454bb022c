// SPDX-License-Identifier: AGPL-3.0
// Home Cinema Core - Shared logic for all frontends
//
// This crate provides:
// - Movie, MovieId, Category and AppError types
// - FavoritesStore for persistent favorites
// - SettingsStore for persistent settings
// - TmdbClient for the remote movie catalog
// - AppState tying them together
//
// Frontend-specific code lives in separate crates.

pub mod browse;
pub mod catalog;
pub mod favorites;
pub mod kv;
pub mod logging;
pub mod settings;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use browse::{filter_by_title, format_rating, resolve_favorites, HomeFeed};
pub use catalog::{poster_url, Catalog, CatalogOutcome, TmdbClient};
pub use favorites::{FavoritesEvent, FavoritesStore, LoadState, FAVORITES_KEY};
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use settings::{AppSettings, SettingsStore};
pub use state::AppState;
pub use types::{AppError, Category, Movie, MovieId, RatingTier};
