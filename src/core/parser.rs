//! Identity parser.
//!
//! Extracts a normalized (title, year) key from a folder name and a
//! (season, episode) key from an episode file name. Pure text processing,
//! no I/O.

use crate::models::media::{Identity, MediaKind};
use crate::{Error, Result};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Release/codec tokens stripped during normalization.
const NOISE_TOKENS: &str = r"(?i)\b(1080p|720p|2160p|480p|4K|UHD|BluRay|BDRip|BRRip|WEB-DL|WEBRip|HDTV|DVDRip|x264|x265|h264|h265|HEVC|AV1|10bit|HDR|DTS|AC3|AAC|TrueHD|Atmos|REMUX|PROPER|REPACK|EXTENDED|UNRATED)\b";

/// Extract the `[tmdb-NNN]` catalog tag from a folder name, if present.
pub fn extract_catalog_tag(name: &str) -> Option<String> {
    let re = Regex::new(r"\[tmdb-(\d+)\]").ok()?;
    re.captures(name).map(|c| c[1].to_string())
}

/// Strip the catalog tag from a folder name.
fn strip_catalog_tag(name: &str) -> String {
    match Regex::new(r"\s*\[tmdb-\d+\]") {
        Ok(re) => re.replace_all(name, "").trim().to_string(),
        Err(_) => name.to_string(),
    }
}

/// Normalize a raw title for catalog comparison.
///
/// Strips release-group tags, resolution/codec tokens and punctuation
/// noise; collapses whitespace. Deterministic and pure.
pub fn normalize_title(raw: &str) -> String {
    let mut title = raw.replace('.', " ").replace('_', " ");

    // Bracketed release-group tags
    if let Ok(re) = Regex::new(r"\[[^\]]*\]|\{[^}]*\}") {
        title = re.replace_all(&title, " ").to_string();
    }
    if let Ok(re) = Regex::new(NOISE_TOKENS) {
        title = re.replace_all(&title, " ").to_string();
    }

    title.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip diacritics and lowercase, for loose text comparison.
pub fn fold_for_compare(text: &str) -> String {
    text.nfkd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Extract normalized alphanumeric words from text.
pub fn extract_words(text: &str) -> Vec<String> {
    let folded = fold_for_compare(text);
    match Regex::new(r"[a-z0-9]+") {
        Ok(re) => re.find_iter(&folded).map(|m| m.as_str().to_string()).collect(),
        Err(_) => Vec::new(),
    }
}

/// Parse a folder name into an [`Identity`].
///
/// Folder names matching `Title (Year)`, optionally suffixed with a
/// `[tmdb-ID]` tag, yield the title and year. Names without a parseable
/// year yield `year = None`; catalog matching then proceeds title-only.
pub fn parse_folder(name: &str, kind: MediaKind) -> Result<Identity> {
    let clean = strip_catalog_tag(name);

    if let Ok(re) = Regex::new(r"^(.+?)\s*\((\d{4})\)\s*$") {
        if let Some(caps) = re.captures(&clean) {
            let title = normalize_title(caps[1].trim());
            let year = caps[2].parse::<u16>().ok();
            if !title.is_empty() {
                return Ok(Identity {
                    kind,
                    raw_name: name.to_string(),
                    normalized_title: title,
                    year,
                });
            }
        }
    }

    let title = normalize_title(&clean);
    if title.is_empty() {
        return Err(Error::UnparsableIdentity(name.to_string()));
    }

    Ok(Identity {
        kind,
        raw_name: name.to_string(),
        normalized_title: title,
        year: None,
    })
}

/// Parse a (season, episode) key from an episode file name.
///
/// Scans for a season/episode token in common forms: `sNNeMM`, `NxMM`,
/// and a delimited `NN MM` pair. First match wins.
pub fn parse_episode_file(name: &str) -> Result<(u16, u16)> {
    let cleaned = name.replace('.', " ").replace('_', " ");

    let patterns = [
        r"[Ss](\d{1,2})[Ee](\d{1,3})",
        r"\b(\d{1,2})x(\d{2,3})\b",
        r"\b(\d{1,2})[ \-](\d{2})\b",
    ];

    for pattern in patterns {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        if let Some(caps) = re.captures(&cleaned) {
            let season = caps[1].parse::<u16>().ok();
            let episode = caps[2].parse::<u16>().ok();
            if let (Some(s), Some(e)) = (season, episode) {
                if e > 0 {
                    return Ok((s, e));
                }
            }
        }
    }

    Err(Error::UnparsableIdentity(name.to_string()))
}
