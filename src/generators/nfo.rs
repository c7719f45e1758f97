//! NFO descriptor generator (Jellyfin compatible).

use crate::models::media::{CatalogRecord, EpisodeRecord};
use crate::Result;
use regex::Regex;
use std::path::Path;

/// Generate movie NFO content.
pub fn generate_movie_nfo(record: &CatalogRecord) -> String {
    let mut nfo = String::new();

    nfo.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
    nfo.push_str("<movie>\n");
    push_common_fields(&mut nfo, record);
    nfo.push_str("</movie>\n");
    nfo
}

/// Generate tvshow.nfo content.
pub fn generate_tvshow_nfo(record: &CatalogRecord) -> String {
    let mut nfo = String::new();

    nfo.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
    nfo.push_str("<tvshow>\n");
    push_common_fields(&mut nfo, record);
    nfo.push_str("</tvshow>\n");
    nfo
}

/// Generate episode NFO content.
pub fn generate_episode_nfo(show_title: &str, episode: &EpisodeRecord) -> String {
    let mut nfo = String::new();

    nfo.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
    nfo.push_str("<episodedetails>\n");
    nfo.push_str(&format!("  <title>{}</title>\n", escape_xml(&episode.title)));
    nfo.push_str(&format!(
        "  <showtitle>{}</showtitle>\n",
        escape_xml(show_title)
    ));
    nfo.push_str(&format!("  <season>{}</season>\n", episode.season));
    nfo.push_str(&format!("  <episode>{}</episode>\n", episode.episode_number));
    if !episode.overview.is_empty() {
        nfo.push_str(&format!("  <plot>{}</plot>\n", escape_xml(&episode.overview)));
    }
    if let Some(ref aired) = episode.air_date {
        nfo.push_str(&format!("  <aired>{}</aired>\n", escape_xml(aired)));
    }
    nfo.push_str("</episodedetails>\n");
    nfo
}

fn push_common_fields(nfo: &mut String, record: &CatalogRecord) {
    nfo.push_str(&format!(
        "  <title>{}</title>\n",
        escape_xml(&record.primary_title)
    ));
    nfo.push_str(&format!(
        "  <originaltitle>{}</originaltitle>\n",
        escape_xml(&record.fallback_title)
    ));
    if !record.overview.is_empty() {
        nfo.push_str(&format!("  <plot>{}</plot>\n", escape_xml(&record.overview)));
    }
    if let Some(ref premiered) = record.premiere_date {
        nfo.push_str(&format!(
            "  <premiered>{}</premiered>\n",
            escape_xml(premiered)
        ));
    }
    if record.release_year > 0 {
        nfo.push_str(&format!("  <year>{}</year>\n", record.release_year));
    }
    nfo.push_str(&format!(
        "  <tmdbid>{}</tmdbid>\n",
        escape_xml(&record.canonical_id)
    ));
    for genre in &record.genres {
        nfo.push_str(&format!("  <genre>{}</genre>\n", escape_xml(genre)));
    }
}

/// Read the catalog ID embedded in an NFO written by this generator.
pub fn read_nfo_catalog_id(nfo_path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(nfo_path).ok()?;
    let re = Regex::new(r"<tmdbid>(\d+)</tmdbid>").ok()?;
    re.captures(&content).map(|c| c[1].to_string())
}

/// Whether a descriptor needs (re)writing: missing, or its embedded ID no
/// longer matches the folder's tag (the folder was re-matched).
pub fn needs_refresh(nfo_path: &Path, canonical_id: &str) -> bool {
    if !nfo_path.exists() {
        return true;
    }
    match read_nfo_catalog_id(nfo_path) {
        Some(id) => id != canonical_id,
        None => true,
    }
}

/// Write descriptor content to disk.
pub fn write_nfo(nfo_path: &Path, content: &str) -> Result<()> {
    std::fs::write(nfo_path, content)?;
    Ok(())
}

/// Escape XML special characters.
fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
