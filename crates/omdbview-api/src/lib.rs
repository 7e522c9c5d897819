//! API client library for omdbview.
//!
//! Provides a typed client for the OMDB search and detail endpoints.

/// OMDB API client.
pub mod omdb;
