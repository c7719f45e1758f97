//! Episode title healer.
//!
//! Compares persisted episode titles against freshly fetched canonical
//! titles and rewrites generic placeholders. Never overwrites a real
//! (human-supplied) title.

use crate::models::media::EpisodeRecord;
use regex::Regex;

/// Generic placeholder patterns, localized ordinal-episode phrasing included.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    r"(?i)^Episodul \d+$",
    r"(?i)^Episode \d+$",
    r"(?i)^Ep\. \d+$",
    r"(?i)^TBA$",
    r"(?i)^To Be Announced$",
];

/// Check whether a title is a generic placeholder.
///
/// Empty titles count as placeholders.
pub fn is_placeholder_title(title: &str) -> bool {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return true;
    }
    PLACEHOLDER_PATTERNS.iter().any(|pattern| {
        Regex::new(pattern)
            .map(|re| re.is_match(trimmed))
            .unwrap_or(false)
    })
}

/// Heal a placeholder episode title from the canonical episode list.
///
/// Non-placeholder input is returned untouched. A placeholder is replaced
/// by the canonical `(season, episode)` title unless that title is itself
/// empty or a placeholder. Idempotent: a healed title no longer matches
/// the placeholder pattern, so re-healing is a no-op.
pub fn heal(
    existing_title: &str,
    canonical_episodes: &[EpisodeRecord],
    season: u16,
    episode_number: u16,
) -> String {
    if !is_placeholder_title(existing_title) {
        return existing_title.to_string();
    }

    let canonical = canonical_episodes
        .iter()
        .find(|e| e.season == season && e.episode_number == episode_number);

    match canonical {
        Some(ep) if !is_placeholder_title(&ep.title) => ep.title.clone(),
        _ => existing_title.to_string(),
    }
}
