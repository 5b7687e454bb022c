// SPDX-License-Identifier: AGPL-3.0
// Home Cinema Core - Type definitions

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a movie in the remote catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl MovieId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for MovieId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A movie as returned by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    /// Date-like string, usually `YYYY-MM-DD`, empty for unannounced titles
    #[serde(default)]
    pub release_date: String,
    /// Average vote in the range 0..=10
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub overview: String,
    /// Absolute poster URL once it has passed through the catalog client
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub original_language: String,
}

impl Movie {
    /// Year component of the release date, if it parses
    pub fn release_year(&self) -> Option<i32> {
        NaiveDate::parse_from_str(self.release_date.trim(), "%Y-%m-%d")
            .ok()
            .map(|d| d.year())
    }

    /// Rating bucket used for badge colouring
    pub fn rating_tier(&self) -> RatingTier {
        RatingTier::from_vote(self.vote_average)
    }
}

/// Rating bucket for a vote average
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingTier {
    High,
    Medium,
    Low,
}

impl RatingTier {
    pub fn from_vote(vote_average: f64) -> Self {
        if vote_average >= 7.5 {
            Self::High
        } else if vote_average >= 5.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Badge colour name for this tier
    pub fn color_name(&self) -> &'static str {
        match self {
            Self::High => "green",
            Self::Medium => "yellow",
            Self::Low => "red",
        }
    }

    /// Text colour that stays readable on the badge
    pub fn text_color_name(&self) -> &'static str {
        match self {
            Self::Medium => "black",
            _ => "white",
        }
    }
}

/// Catalog listing a user can browse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Popular,
    TopRated,
    Upcoming,
    NowPlaying,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Self::Popular,
        Self::TopRated,
        Self::Upcoming,
        Self::NowPlaying,
    ];

    /// Path segment used by the catalog endpoint
    pub fn as_path(&self) -> &'static str {
        match self {
            Self::Popular => "popular",
            Self::TopRated => "top_rated",
            Self::Upcoming => "upcoming",
            Self::NowPlaying => "now_playing",
        }
    }

    /// Get display label for this category
    pub fn label(&self) -> &'static str {
        match self {
            Self::Popular => "Popular",
            Self::TopRated => "Top Movies",
            Self::Upcoming => "Upcoming Movies",
            Self::NowPlaying => "Now Playing Movies",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_path() == s)
            .ok_or_else(|| AppError::InvalidConfig(format!("Unknown category: {}", s)))
    }
}

/// Error types for the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Failed to read persisted state: {0}")]
    PersistenceRead(String),

    #[error("Failed to write persisted state: {0}")]
    PersistenceWrite(String),

    #[error("Persisted state is corrupt: {0}")]
    PersistenceCorrupt(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileIo(err.to_string())
    }
}
