// SPDX-License-Identifier: AGPL-3.0
// Home Cinema Core - Browsing helpers shared by frontends

use crate::catalog::{Catalog, CatalogOutcome};
use crate::types::{Category, Movie, MovieId};
use futures::future::join_all;

/// Keep movies whose title contains `query`, ignoring case
pub fn filter_by_title<'a>(movies: &'a [Movie], query: &str) -> Vec<&'a Movie> {
    if query.trim().is_empty() {
        return movies.iter().collect();
    }
    let needle = query.to_lowercase();
    movies
        .iter()
        .filter(|m| m.title.to_lowercase().contains(&needle))
        .collect()
}

/// Vote average with one decimal, as shown on rating badges
pub fn format_rating(vote_average: f64) -> String {
    format!("{:.1}", vote_average)
}

/// Fetch details for every favorite, in favorites order.
///
/// Ids the catalog cannot resolve are left out.
pub async fn resolve_favorites<C: Catalog>(catalog: &C, ids: &[MovieId]) -> Vec<Movie> {
    let outcomes = join_all(ids.iter().map(|id| catalog.movie_details(*id))).await;

    let movies: Vec<Movie> = outcomes
        .into_iter()
        .filter_map(|outcome| outcome.into_value())
        .collect();

    if movies.len() < ids.len() {
        tracing::warn!("Resolved {} of {} favorites", movies.len(), ids.len());
    }
    movies
}

/// Data behind the home screen
#[derive(Debug, Clone)]
pub struct HomeFeed {
    pub category: Category,
    pub listing: CatalogOutcome<Vec<Movie>>,
    /// "Now showing" strip
    pub featured: CatalogOutcome<Vec<Movie>>,
}

impl HomeFeed {
    /// Load the selected listing and the featured strip together
    pub async fn fetch<C: Catalog>(catalog: &C, category: Category) -> Self {
        let (listing, featured) = futures::join!(
            catalog.list_movies(category),
            catalog.list_movies(Category::NowPlaying)
        );

        Self {
            category,
            listing,
            featured,
        }
    }

    /// Listing entries matching a search query
    pub fn search(&self, query: &str) -> Vec<&Movie> {
        match self.listing.value() {
            Some(movies) => filter_by_title(movies, query),
            None => Vec::new(),
        }
    }

    /// Featured index after `index`, wrapping around
    pub fn next_featured(&self, index: usize) -> Option<usize> {
        match self.featured.value() {
            Some(movies) if !movies.is_empty() => Some((index + 1) % movies.len()),
            _ => None,
        }
    }
}
