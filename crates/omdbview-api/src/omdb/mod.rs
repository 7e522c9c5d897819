//! OMDB API client module.
//!
//! Handles HTTP requests to the OMDB search (`?s=`) and detail (`?i=`)
//! endpoints, and accumulates paged search results up to a target count.

mod accumulate;
mod api;
mod client;
mod types;

pub use accumulate::{AccumulateError, Accumulated, accumulate_search};
#[allow(clippy::module_name_repetitions)]
pub use api::{LocalOmdbApi, OmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{DEFAULT_BASE_URL, OmdbClient, OmdbClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use types::{
    DetailRecord, MediaType, NOT_AVAILABLE, OmdbSearchResponse, OmdbStatus, PlotLength, Rating,
    SearchPage, SearchParams, SearchResultItem,
};
