//! OMDB API response types and request parameters.

use std::fmt;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Placeholder OMDB uses for missing values (e.g. `"Poster": "N/A"`).
pub const NOT_AVAILABLE: &str = "N/A";

// --- Media type ---

/// OMDB media type (`type` request parameter / `Type` response field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Feature film.
    Movie,
    /// TV series.
    Series,
    /// Single episode of a series.
    Episode,
    /// Video game.
    Game,
    /// Any type this client does not know about.
    #[serde(other)]
    Other,
}

impl MediaType {
    /// Returns the wire value used in the `type` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
            Self::Episode => "episode",
            Self::Game => "game",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plot length for the detail endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotLength {
    /// One or two sentences.
    Short,
    /// Full synopsis.
    #[default]
    Full,
}

impl PlotLength {
    /// Returns the wire value used in the `plot` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Full => "full",
        }
    }
}

// --- Search ---

/// Raw response from the search endpoint (`?s=`).
///
/// OMDB always answers HTTP 200; failure is signalled by
/// `"Response": "False"` plus an `Error` text.
#[derive(Debug, Clone, Deserialize)]
pub struct OmdbSearchResponse {
    /// Result items (absent when nothing matched).
    #[serde(rename = "Search", default)]
    pub search: Vec<SearchResultItem>,
    /// Total number of matches across all pages, as a decimal string.
    #[serde(rename = "totalResults", default)]
    pub total_results: Option<String>,
    /// `"True"` or `"False"`.
    #[serde(rename = "Response")]
    pub response: String,
    /// Error text when `response` is `"False"`.
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

/// A single search result card.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResultItem {
    /// IMDb identifier (e.g. `tt0903747`).
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    /// Title.
    #[serde(rename = "Title")]
    pub title: String,
    /// Year or year range (e.g. `2008–2013`).
    #[serde(rename = "Year")]
    pub year: String,
    /// Poster URL or `"N/A"`.
    #[serde(rename = "Poster", default)]
    pub poster: String,
    /// Media type.
    #[serde(rename = "Type")]
    pub media_type: MediaType,
}

impl SearchResultItem {
    /// Returns the poster URL, or `None` when OMDB has no poster.
    #[must_use]
    pub fn poster_url(&self) -> Option<&str> {
        non_empty(&self.poster)
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Items on this page (empty when nothing matched).
    pub items: Vec<SearchResultItem>,
    /// Total matches reported by OMDB, when present and numeric.
    pub total_results: Option<usize>,
}

impl OmdbSearchResponse {
    /// Converts the raw response into a [`SearchPage`].
    ///
    /// A "not found" answer becomes an empty page.
    ///
    /// # Errors
    ///
    /// Returns an error if OMDB reports any other failure
    /// (invalid key, too many results, request limit reached).
    pub fn into_page(self) -> Result<SearchPage> {
        if !is_true(&self.response) {
            let message = self.error.unwrap_or_default();
            if is_not_found(&message) {
                return Ok(SearchPage::default());
            }
            bail!("OMDB API error: {message}");
        }

        let total_results = self
            .total_results
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok());

        Ok(SearchPage {
            items: self.search,
            total_results,
        })
    }
}

// --- Detail ---

/// A third-party rating entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rating {
    /// Rating source (e.g. "Internet Movie Database").
    #[serde(rename = "Source")]
    pub source: String,
    /// Rating value (e.g. "9.5/10").
    #[serde(rename = "Value")]
    pub value: String,
}

/// Response from the detail endpoint (`?i=`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetailRecord {
    /// Title.
    pub title: String,
    /// Year or year range.
    pub year: String,
    /// Content rating.
    #[serde(default)]
    pub rated: String,
    /// Release date.
    #[serde(default)]
    pub released: String,
    /// Runtime (e.g. "49 min").
    #[serde(default)]
    pub runtime: String,
    /// Comma-separated genres.
    #[serde(default)]
    pub genre: String,
    /// Director(s).
    #[serde(default)]
    pub director: String,
    /// Writer(s).
    #[serde(default)]
    pub writer: String,
    /// Main cast.
    #[serde(default)]
    pub actors: String,
    /// Plot text.
    #[serde(default)]
    pub plot: String,
    /// Languages.
    #[serde(default)]
    pub language: String,
    /// Countries.
    #[serde(default)]
    pub country: String,
    /// Awards summary.
    #[serde(default)]
    pub awards: String,
    /// Poster URL or `"N/A"`.
    #[serde(default)]
    pub poster: String,
    /// Ratings from several sources.
    #[serde(default)]
    pub ratings: Vec<Rating>,
    /// Metascore.
    #[serde(default)]
    pub metascore: String,
    /// IMDb rating.
    #[serde(rename = "imdbRating", default)]
    pub imdb_rating: String,
    /// IMDb vote count.
    #[serde(rename = "imdbVotes", default)]
    pub imdb_votes: String,
    /// IMDb identifier.
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    /// Media type.
    #[serde(rename = "Type")]
    pub media_type: MediaType,
    /// Number of seasons (series only).
    #[serde(rename = "totalSeasons", default)]
    pub total_seasons: Option<String>,
    /// DVD release date (movies only).
    #[serde(rename = "DVD", default)]
    pub dvd: Option<String>,
    /// Box office gross (movies only).
    #[serde(default)]
    pub box_office: Option<String>,
    /// Production company (movies only).
    #[serde(default)]
    pub production: Option<String>,
    /// Official website (movies only).
    #[serde(default)]
    pub website: Option<String>,
}

impl DetailRecord {
    /// Returns the poster URL, or `None` when OMDB has no poster.
    #[must_use]
    pub fn poster_url(&self) -> Option<&str> {
        non_empty(&self.poster)
    }
}

/// Envelope used to detect `"Response": "False"` before decoding a
/// [`DetailRecord`].
#[derive(Debug, Clone, Deserialize)]
pub struct OmdbStatus {
    /// `"True"` or `"False"`.
    #[serde(rename = "Response")]
    pub response: String,
    /// Error text when `response` is `"False"`.
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

impl OmdbStatus {
    /// Returns the error text if this envelope signals a failure.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        if is_true(&self.response) {
            None
        } else {
            Some(self.error.as_deref().unwrap_or("unknown error"))
        }
    }
}

// --- Request parameters ---

/// Parameters for the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Search query (required).
    pub query: String,
    /// Restrict to one media type.
    pub media_type: Option<MediaType>,
    /// Restrict to one release year.
    pub year: Option<u32>,
    /// Result page (1-based, 10 items per page).
    pub page: u32,
}

impl SearchParams {
    /// Creates new search params with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            media_type: None,
            year: None,
            page: 1,
        }
    }

    /// Sets the media type filter.
    #[must_use]
    pub const fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    /// Sets the year filter.
    #[must_use]
    pub const fn year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    /// Sets the page number.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}

/// Returns `true` if OMDB's `Response` field means success.
fn is_true(response: &str) -> bool {
    response.eq_ignore_ascii_case("true")
}

/// Returns `true` if the error text is OMDB's "nothing matched" answer
/// ("Movie not found!", "Series not found!", ...).
fn is_not_found(message: &str) -> bool {
    message.to_ascii_lowercase().contains("not found")
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
        None
    } else {
        Some(trimmed)
    }
}
