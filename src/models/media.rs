//! Media-related data models.

use serde::{Deserialize, Serialize};

/// Media kind enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Show,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Show => write!(f, "show"),
        }
    }
}

/// Identity key parsed from an on-disk folder name.
///
/// Derived purely from text; immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub kind: MediaKind,
    /// Folder name as found on disk.
    pub raw_name: String,
    /// Title with release tags, codec tokens and punctuation noise stripped.
    pub normalized_title: String,
    /// Release year, when the folder name carries one.
    pub year: Option<u16>,
}

/// One ranked hit from the catalog search endpoint.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub canonical_id: String,
    pub title: String,
    pub year: Option<u16>,
    /// Rank supplied by the collaborator; 0 is the best match.
    pub rank: u32,
}

/// Single-locale metadata snapshot as returned by the catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub title: String,
    pub overview: String,
    pub genres: Vec<String>,
    pub release_year: u16,
    pub premiere_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub episodes: Vec<EpisodeRecord>,
}

/// Reference-language and target-locale snapshots for one catalog entry.
#[derive(Debug, Clone)]
pub struct CatalogSnapshots {
    pub reference: CatalogSnapshot,
    pub target: CatalogSnapshot,
}

/// Canonical catalog record after locale resolution.
#[derive(Debug, Clone, Default)]
pub struct CatalogRecord {
    /// Globally unique, stable across runs.
    pub canonical_id: String,
    /// Target-locale title, or the reference title after script fallback.
    pub primary_title: String,
    /// Reference-language title.
    pub fallback_title: String,
    pub overview: String,
    pub genres: Vec<String>,
    pub release_year: u16,
    pub premiere_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    /// Set when the target-locale strings failed the Latin-script check.
    pub locale_fallback_used: bool,
    /// Ordered by (season, episode_number); empty for movies.
    pub episodes: Vec<EpisodeRecord>,
}

impl CatalogRecord {
    /// Look up an episode by its ordering key.
    pub fn episode(&self, season: u16, episode_number: u16) -> Option<&EpisodeRecord> {
        self.episodes
            .iter()
            .find(|e| e.season == season && e.episode_number == episode_number)
    }
}

/// One episode within a catalog record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub season: u16,
    pub episode_number: u16,
    pub title: String,
    pub overview: String,
    pub air_date: Option<String>,
}

/// A raw candidate from the video platform search. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct TrailerCandidate {
    pub video_id: String,
    pub title: String,
    pub duration_seconds: u32,
    pub channel_name: String,
    /// Platform-supplied official/verified marker.
    pub is_official_tag: bool,
    /// Best available height in pixels (0 when unknown).
    pub max_available_resolution: u32,
}
