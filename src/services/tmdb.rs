//! TMDB catalog collaborator.

use crate::models::config::TmdbConfig;
use crate::models::media::{
    CatalogSnapshot, CatalogSnapshots, EpisodeRecord, MediaKind, SearchHit,
};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_URL: &str = "https://image.tmdb.org/t/p";

/// Metadata catalog interface consumed by the core.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    /// Ranked search; rank 0 is the collaborator's best match.
    async fn search(
        &self,
        kind: MediaKind,
        title: &str,
        year: Option<u16>,
    ) -> Result<Vec<SearchHit>>;

    /// Fetch the reference-language and target-locale snapshots for an ID.
    async fn fetch(&self, kind: MediaKind, canonical_id: &str) -> Result<CatalogSnapshots>;

    /// Download an artwork asset to a local file.
    async fn download_image(&self, image_path: &str, size: &str, dest: &Path) -> Result<()>;
}

/// TMDB API client.
pub struct TmdbClient {
    config: TmdbConfig,
    client: reqwest::Client,
}

/// Search result page.
#[derive(Debug, Deserialize)]
struct SearchPage {
    results: Vec<SearchItem>,
}

/// One search result; movie and TV payloads differ in field names.
#[derive(Debug, Deserialize)]
struct SearchItem {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
}

/// Movie or TV detail payload, reduced to the fields the core consumes.
#[derive(Debug, Deserialize)]
struct DetailPayload {
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    number_of_seasons: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

/// Season detail payload.
#[derive(Debug, Deserialize)]
struct SeasonPayload {
    #[serde(default)]
    episodes: Vec<EpisodePayload>,
}

#[derive(Debug, Deserialize)]
struct EpisodePayload {
    season_number: u16,
    episode_number: u16,
    name: Option<String>,
    overview: Option<String>,
    air_date: Option<String>,
}

fn year_of(date: Option<&str>) -> Option<u16> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

impl TmdbClient {
    /// Create a new client; fails when no API key is configured.
    pub fn new(config: TmdbConfig) -> Result<Self> {
        if config.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(Error::TmdbApiKeyMissing);
        }
        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }

    fn build_url(&self, path: &str, language: &str, extra_params: &str) -> String {
        format!(
            "{}/{}?api_key={}&language={}{}",
            TMDB_BASE_URL,
            path,
            self.config.api_key.as_deref().unwrap_or(""),
            language,
            extra_params
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::unavailable("tmdb", e))?
            .error_for_status()
            .map_err(|e| Error::unavailable("tmdb", e))?;
        resp.json().await.map_err(|e| Error::unavailable("tmdb", e))
    }

    async fn fetch_detail(
        &self,
        kind: MediaKind,
        canonical_id: &str,
        language: &str,
    ) -> Result<DetailPayload> {
        let path = match kind {
            MediaKind::Movie => format!("movie/{canonical_id}"),
            MediaKind::Show => format!("tv/{canonical_id}"),
        };
        self.get_json(&self.build_url(&path, language, "")).await
    }

    async fn fetch_season(
        &self,
        canonical_id: &str,
        season: u16,
        language: &str,
    ) -> Result<Vec<EpisodeRecord>> {
        let url = self.build_url(&format!("tv/{canonical_id}/season/{season}"), language, "");
        let payload: SeasonPayload = self.get_json(&url).await?;
        Ok(payload
            .episodes
            .into_iter()
            .map(|e| EpisodeRecord {
                season: e.season_number,
                episode_number: e.episode_number,
                title: e.name.unwrap_or_default(),
                overview: e.overview.unwrap_or_default(),
                air_date: e.air_date,
            })
            .collect())
    }

    fn snapshot_from(&self, detail: DetailPayload, episodes: Vec<EpisodeRecord>) -> CatalogSnapshot {
        let date = detail
            .release_date
            .clone()
            .or_else(|| detail.first_air_date.clone());
        CatalogSnapshot {
            title: detail.title.or(detail.name).unwrap_or_default(),
            overview: detail.overview.unwrap_or_default(),
            genres: detail.genres.into_iter().map(|g| g.name).collect(),
            release_year: year_of(date.as_deref()).unwrap_or(0),
            premiere_date: date,
            poster_path: detail.poster_path,
            backdrop_path: detail.backdrop_path,
            episodes,
        }
    }
}

impl Catalog for TmdbClient {
    async fn search(
        &self,
        kind: MediaKind,
        title: &str,
        year: Option<u16>,
    ) -> Result<Vec<SearchHit>> {
        let (path, year_param) = match kind {
            MediaKind::Movie => ("search/movie", "year"),
            MediaKind::Show => ("search/tv", "first_air_date_year"),
        };
        let mut params = format!("&query={}", urlencoding::encode(title));
        if let Some(y) = year {
            params.push_str(&format!("&{year_param}={y}"));
        }

        // Search in the reference language: match robustness, not display.
        let url = self.build_url(path, &self.config.fallback_language, &params);
        let page: SearchPage = self.get_json(&url).await?;

        Ok(page
            .results
            .into_iter()
            .enumerate()
            .map(|(rank, item)| SearchHit {
                canonical_id: item.id.to_string(),
                year: year_of(
                    item.release_date
                        .as_deref()
                        .or(item.first_air_date.as_deref()),
                ),
                title: item.title.or(item.name).unwrap_or_default(),
                rank: rank as u32,
            })
            .collect())
    }

    async fn fetch(&self, kind: MediaKind, canonical_id: &str) -> Result<CatalogSnapshots> {
        let reference_detail = self
            .fetch_detail(kind, canonical_id, &self.config.fallback_language)
            .await?;
        let target_detail = self
            .fetch_detail(kind, canonical_id, &self.config.language)
            .await?;

        let (mut reference_eps, mut target_eps) = (Vec::new(), Vec::new());
        if kind == MediaKind::Show {
            let seasons = reference_detail.number_of_seasons.unwrap_or(0);
            for season in 1..=seasons {
                reference_eps.extend(
                    self.fetch_season(canonical_id, season, &self.config.fallback_language)
                        .await?,
                );
                target_eps.extend(
                    self.fetch_season(canonical_id, season, &self.config.language)
                        .await?,
                );
            }
        }

        Ok(CatalogSnapshots {
            reference: self.snapshot_from(reference_detail, reference_eps),
            target: self.snapshot_from(target_detail, target_eps),
        })
    }

    async fn download_image(&self, image_path: &str, size: &str, dest: &Path) -> Result<()> {
        let url = format!("{TMDB_IMAGE_URL}/{size}{image_path}");
        let bytes = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::unavailable("tmdb", e))?
            .error_for_status()
            .map_err(|e| Error::unavailable("tmdb", e))?
            .bytes()
            .await
            .map_err(|e| Error::unavailable("tmdb", e))?;

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, &bytes)?;
        Ok(())
    }
}
