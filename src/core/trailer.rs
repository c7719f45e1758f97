//! Trailer candidate selector.
//!
//! Given a search query and raw candidates from the video platform, picks
//! at most one acceptable candidate or declares "no trailer". Pure logic;
//! the selection outcome is persisted via the state store, never the
//! candidates themselves.

use crate::core::parser::{extract_words, fold_for_compare};
use crate::models::media::TrailerCandidate;

/// Highest resolution worth requesting, in pixels of height.
pub const MAX_RESOLUTION: u32 = 2160;

/// Height requested when the platform reports none, or a lower one.
/// The download format string is a ceiling, so asking for more than a
/// candidate offers still fetches its best stream.
pub const MIN_RESOLUTION: u32 = 1080;

/// Plausible trailer length bound in seconds.
const DURATION_MIN: u32 = 30;
const DURATION_MAX: u32 = 360;

/// Reject keywords, language-agnostic umbrella with localized terms.
/// Season-reference markers avoid confusing a season promo with the
/// work's own trailer.
const REJECT_KEYWORDS: &[&str] = &[
    "interview",
    "interviu",
    "recap",
    "rezumat",
    "review",
    "reaction",
    "explained",
    "breakdown",
    "behind the scenes",
    "making of",
    "full movie",
    "film complet",
    "full episode",
    "episod complet",
    "season",
    "sezonul",
    "sezon",
];

/// Selection outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Accepted {
        video_id: String,
        /// Height to request from the platform, clamped to
        /// [`MIN_RESOLUTION`]..=[`MAX_RESOLUTION`].
        resolution: u32,
    },
    Rejected(RejectReason),
}

/// Why no candidate was accepted. A normal terminal state, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The reject filter emptied the candidate set.
    NoCandidates,
    /// Survivors exist but none meets the minimum confidence bar.
    NoAcceptable,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::NoCandidates => write!(f, "no candidates"),
            RejectReason::NoAcceptable => write!(f, "no acceptable candidate"),
        }
    }
}

/// Pick at most one acceptable candidate.
///
/// Keyword rejection first, then a title-match confidence floor, then
/// preference ordering: official marker, highest capped resolution,
/// shortest duration within the plausible trailer-length bound.
pub fn select(
    query: &str,
    candidates: &[TrailerCandidate],
    _title_year: Option<u16>,
    _is_show: bool,
) -> Selection {
    let survivors: Vec<&TrailerCandidate> = candidates
        .iter()
        .filter(|c| !is_rejected_title(&c.title))
        .collect();

    if survivors.is_empty() {
        return Selection::Rejected(RejectReason::NoCandidates);
    }

    let title_words = extract_words(query);
    let acceptable: Vec<&TrailerCandidate> = survivors
        .into_iter()
        .filter(|c| matches_title(&c.title, &title_words))
        .collect();

    let Some(best) = acceptable.into_iter().max_by_key(|c| rank_key(c)) else {
        return Selection::Rejected(RejectReason::NoAcceptable);
    };

    Selection::Accepted {
        video_id: best.video_id.clone(),
        resolution: best
            .max_available_resolution
            .clamp(MIN_RESOLUTION, MAX_RESOLUTION),
    }
}

/// Case-insensitive, diacritic-folded keyword check on a candidate title.
fn is_rejected_title(title: &str) -> bool {
    let folded = fold_for_compare(title);
    REJECT_KEYWORDS.iter().any(|kw| folded.contains(kw))
}

/// Minimum confidence bar: every significant word of the query title must
/// appear in the candidate title.
fn matches_title(candidate_title: &str, title_words: &[String]) -> bool {
    if title_words.is_empty() {
        return false;
    }
    let candidate_words = extract_words(candidate_title);
    title_words.iter().all(|w| candidate_words.contains(w))
}

/// Explicit "official" marker in title or channel.
fn has_official_marker(candidate: &TrailerCandidate) -> bool {
    let folded = fold_for_compare(&candidate.title);
    let channel = fold_for_compare(&candidate.channel_name);
    candidate.is_official_tag
        || folded.contains("official")
        || folded.contains("oficial")
        || channel.contains("official")
        || channel.contains("oficial")
}

/// Ordering key: official first, then capped resolution, then plausible
/// durations (shortest wins among them) to avoid full episodes that
/// slipped the keyword filter.
fn rank_key(candidate: &TrailerCandidate) -> (bool, u32, bool, i64) {
    let in_bound = (DURATION_MIN..=DURATION_MAX).contains(&candidate.duration_seconds);
    (
        has_official_marker(candidate),
        candidate.max_available_resolution.min(MAX_RESOLUTION),
        in_bound,
        -(candidate.duration_seconds as i64),
    )
}

/// Build the ordered platform search queries for one item.
///
/// Combines title, year and an "official trailer" suffix; original-title
/// variants follow for non-reference-language productions. Colons are
/// stripped because the download tool treats them as URL scheme
/// separators.
pub fn build_queries(
    primary_title: &str,
    fallback_title: &str,
    year: Option<u16>,
    is_show: bool,
) -> Vec<String> {
    let primary = primary_title.replace(':', "");
    let fallback = fallback_title.replace(':', "");
    let category = if is_show { "tv series" } else { "movie" };

    let mut queries = Vec::new();
    if let Some(y) = year {
        queries.push(format!("{fallback} {y} official trailer"));
        queries.push(format!("{fallback} {y} {category} trailer"));
    }
    queries.push(format!("{fallback} official trailer"));

    if !primary.is_empty() && primary != fallback {
        if let Some(y) = year {
            queries.push(format!("{primary} {y} official trailer"));
        }
        queries.push(format!("{primary} trailer"));
    }

    queries
}
