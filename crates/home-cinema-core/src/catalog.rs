// SPDX-License-Identifier: AGPL-3.0
// Home Cinema Core - Remote movie catalog
//
// Catalog failures never reach the caller as errors: they are logged and
// reported as a degraded outcome carrying no data.

use crate::settings::AppSettings;
use crate::types::{AppError, Category, Movie, MovieId};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// Result of a catalog call
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogOutcome<T> {
    /// The catalog answered
    Fresh(T),
    /// The call failed and no data is available
    Degraded { reason: String },
}

impl<T> CatalogOutcome<T> {
    pub fn degraded(err: impl std::fmt::Display) -> Self {
        Self::Degraded {
            reason: err.to_string(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Data from a successful call
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Fresh(value) => Some(value),
            Self::Degraded { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CatalogOutcome<U> {
        match self {
            Self::Fresh(value) => CatalogOutcome::Fresh(f(value)),
            Self::Degraded { reason } => CatalogOutcome::Degraded { reason },
        }
    }
}

impl<T: Default> CatalogOutcome<T> {
    /// The data, or the empty value when degraded
    pub fn into_value(self) -> T {
        match self {
            Self::Fresh(value) => value,
            Self::Degraded { .. } => T::default(),
        }
    }
}

/// Read access to a movie catalog
pub trait Catalog: Send + Sync {
    /// Movies in a category listing
    fn list_movies(
        &self,
        category: Category,
    ) -> impl Future<Output = CatalogOutcome<Vec<Movie>>> + Send;

    /// Full record for a single movie
    fn movie_details(
        &self,
        id: MovieId,
    ) -> impl Future<Output = CatalogOutcome<Option<Movie>>> + Send;
}

/// Build an absolute poster URL from a catalog-relative path
pub fn poster_url(settings: &AppSettings, path: Option<&str>) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;

    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_string());
    }

    Some(format!(
        "{}/{}/{}",
        settings.image_base_url.trim_end_matches('/'),
        settings.image_size.trim_matches('/'),
        path.trim_start_matches('/')
    ))
}

#[derive(Deserialize)]
struct MoviePage {
    results: Vec<Movie>,
}

/// HTTP client for the TMDB v3 API
pub struct TmdbClient {
    http_client: Client,
    settings: AppSettings,
}

impl TmdbClient {
    pub fn new(settings: AppSettings) -> Result<Self, AppError> {
        settings.validate()?;

        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            settings,
        })
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    async fn get_json<T: DeserializeOwned>(&self, segment: &str) -> Result<T, AppError> {
        let url = format!(
            "{}/movie/{}",
            self.settings.api_base_url.trim_end_matches('/'),
            segment
        );

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.settings.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Network(format!("Request for movie/{} timed out", segment))
                } else {
                    AppError::Network(format!("Request for movie/{} failed: {}", segment, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Catalog(format!(
                "Catalog returned status {} for movie/{}",
                status, segment
            )));
        }

        response
            .json()
            .await
            .map_err(|e| {
                AppError::Serialization(format!("Failed to parse movie/{}: {}", segment, e))
            })
    }

    fn with_poster_url(&self, mut movie: Movie) -> Movie {
        movie.poster_path = poster_url(&self.settings, movie.poster_path.as_deref());
        movie
    }

    async fn fetch_movies(&self, category: Category) -> Result<Vec<Movie>, AppError> {
        let page: MoviePage = self.get_json(category.as_path()).await?;
        Ok(page
            .results
            .into_iter()
            .map(|m| self.with_poster_url(m))
            .collect())
    }

    async fn fetch_movie_details(&self, id: MovieId) -> Result<Movie, AppError> {
        let movie: Movie = self.get_json(&id.to_string()).await?;
        Ok(self.with_poster_url(movie))
    }
}

impl Catalog for TmdbClient {
    async fn list_movies(&self, category: Category) -> CatalogOutcome<Vec<Movie>> {
        match self.fetch_movies(category).await {
            Ok(movies) => {
                tracing::debug!("Fetched {} movies for {}", movies.len(), category);
                CatalogOutcome::Fresh(movies)
            }
            Err(e) => {
                tracing::error!("Error fetching movies: {}", e);
                CatalogOutcome::degraded(e)
            }
        }
    }

    async fn movie_details(&self, id: MovieId) -> CatalogOutcome<Option<Movie>> {
        match self.fetch_movie_details(id).await {
            Ok(movie) => CatalogOutcome::Fresh(Some(movie)),
            Err(e) => {
                tracing::error!("Error fetching movie details: {}", e);
                CatalogOutcome::degraded(e)
            }
        }
    }
}
