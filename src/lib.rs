//! Jellyfin Helper Library
//!
//! Matches on-disk movie/show folders to TMDB records, renames files to a
//! localized naming convention, and fetches artwork, NFO metadata and trailers.

pub mod cli;
pub mod core;
pub mod error;
pub mod generators;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{Error, Result};
