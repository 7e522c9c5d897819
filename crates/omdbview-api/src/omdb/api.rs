//! `OmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::types::{DetailRecord, PlotLength, SearchPage, SearchParams};

/// OMDB API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(OmdbApi: Send)]
pub trait LocalOmdbApi {
    /// Fetches one page of search results.
    ///
    /// A "not found" answer is returned as an empty page.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails, or OMDB
    /// reports a failure other than "not found".
    async fn search(&self, params: &SearchParams) -> Result<SearchPage>;

    /// Fetches full metadata for one IMDb identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails, or OMDB
    /// reports a failure (unknown or malformed identifier).
    async fn details(&self, imdb_id: &str, plot: PlotLength) -> Result<DetailRecord>;
}
