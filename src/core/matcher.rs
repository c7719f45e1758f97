//! Catalog matcher.
//!
//! Resolves an identity to a canonical catalog record, merging the
//! target-locale and reference-language snapshots with the script-validity
//! fallback rule.

use crate::core::healer::is_placeholder_title;
use crate::models::media::{CatalogRecord, CatalogSnapshots, EpisodeRecord, Identity};
use crate::services::tmdb::Catalog;
use crate::{Error, Result};

/// Check that a string's letters are drawn from the Latin script.
///
/// A single letter in the Cyrillic, Hebrew, Arabic or CJK ranges is treated
/// as evidence the catalog returned the wrong-locale string. Empty text
/// fails the check.
pub fn is_latin_text(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    for c in text.chars() {
        let code = c as u32;
        let non_latin = (0x0590..=0x05FF).contains(&code)   // Hebrew
            || (0x0600..=0x06FF).contains(&code)            // Arabic
            || (0x0400..=0x04FF).contains(&code)            // Cyrillic
            || (0x4E00..=0x9FFF).contains(&code); // CJK
        if non_latin {
            return false;
        }
    }
    true
}

/// Resolve an identity to a canonical catalog record.
///
/// The collaborator's rank-0 hit is authoritative; `AmbiguousMatch` is
/// surfaced only when the collaborator itself reports a tie at rank 0.
pub async fn resolve<C: Catalog>(catalog: &C, identity: &Identity) -> Result<CatalogRecord> {
    let hits = catalog
        .search(identity.kind, &identity.normalized_title, identity.year)
        .await?;

    let Some(best) = hits.first() else {
        return Err(Error::NotFound(identity.raw_name.clone()));
    };

    if hits.iter().skip(1).any(|h| h.rank == best.rank) {
        return Err(Error::AmbiguousMatch(identity.raw_name.clone()));
    }

    tracing::debug!(
        "Matched '{}' to {} '{}' ({})",
        identity.raw_name,
        identity.kind,
        best.title,
        best.canonical_id
    );

    fetch_record(catalog, identity, &best.canonical_id).await
}

/// Fetch both locale snapshots for a known canonical ID and merge them.
pub async fn fetch_record<C: Catalog>(
    catalog: &C,
    identity: &Identity,
    canonical_id: &str,
) -> Result<CatalogRecord> {
    let snapshots = catalog.fetch(identity.kind, canonical_id).await?;
    Ok(merge_snapshots(canonical_id, snapshots))
}

/// Merge the target-locale and reference snapshots, applying the
/// script-validity fallback.
pub fn merge_snapshots(canonical_id: &str, snapshots: CatalogSnapshots) -> CatalogRecord {
    let CatalogSnapshots { reference, target } = snapshots;

    let title_ok = is_latin_text(&target.title);
    let primary_title = if title_ok {
        target.title.clone()
    } else {
        tracing::info!(
            "Target-locale title failed script check for {}, using fallback",
            canonical_id
        );
        reference.title.clone()
    };

    let overview_ok = is_latin_text(&target.overview);
    let overview = if title_ok && overview_ok {
        target.overview.clone()
    } else {
        reference.overview.clone()
    };

    // Flag any substitution of reference-locale text, not just the title.
    let locale_fallback_used = !title_ok || !overview_ok;

    let genres = if target.genres.is_empty() {
        reference.genres.clone()
    } else {
        target.genres.clone()
    };

    let mut episodes: Vec<EpisodeRecord> = reference
        .episodes
        .iter()
        .map(|ref_ep| {
            let target_ep = target
                .episodes
                .iter()
                .find(|e| e.season == ref_ep.season && e.episode_number == ref_ep.episode_number);
            merge_episode(ref_ep, target_ep)
        })
        .collect();
    episodes.sort_by_key(|e| (e.season, e.episode_number));

    CatalogRecord {
        canonical_id: canonical_id.to_string(),
        primary_title,
        fallback_title: reference.title,
        overview,
        genres,
        release_year: reference.release_year,
        premiere_date: reference.premiere_date.or(target.premiere_date),
        poster_path: target.poster_path.or(reference.poster_path),
        backdrop_path: target.backdrop_path.or(reference.backdrop_path),
        locale_fallback_used,
        episodes,
    }
}

/// Pick the episode title/overview: target locale when it is Latin-script
/// and not a generic placeholder, else the reference values.
fn merge_episode(reference: &EpisodeRecord, target: Option<&EpisodeRecord>) -> EpisodeRecord {
    let mut merged = reference.clone();

    if let Some(t) = target {
        if is_latin_text(&t.title) && !is_placeholder_title(&t.title) {
            merged.title = t.title.clone();
        }
        if !t.overview.is_empty() {
            merged.overview = t.overview.clone();
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::CatalogSnapshot;

    #[test]
    fn test_latin_text_passes() {
        assert!(is_latin_text("Începutul"));
        assert!(is_latin_text("The Matrix"));
    }

    #[test]
    fn test_single_cyrillic_letter_fails() {
        assert!(!is_latin_text("Началo"));
        assert!(!is_latin_text("Trailer оfficial"));
    }

    #[test]
    fn test_cjk_and_empty_fail() {
        assert!(!is_latin_text("盗梦空间"));
        assert!(!is_latin_text(""));
    }

    #[test]
    fn test_merge_uses_target_when_latin() {
        let record = merge_snapshots(
            "27205",
            CatalogSnapshots {
                reference: CatalogSnapshot {
                    title: "Inception".to_string(),
                    overview: "A thief who steals secrets.".to_string(),
                    release_year: 2010,
                    ..Default::default()
                },
                target: CatalogSnapshot {
                    title: "Începutul".to_string(),
                    overview: "Un hoț care fură secrete.".to_string(),
                    ..Default::default()
                },
            },
        );
        assert_eq!(record.primary_title, "Începutul");
        assert_eq!(record.fallback_title, "Inception");
        assert!(!record.locale_fallback_used);
    }

    #[test]
    fn test_merge_falls_back_on_cyrillic() {
        let record = merge_snapshots(
            "27205",
            CatalogSnapshots {
                reference: CatalogSnapshot {
                    title: "Inception".to_string(),
                    overview: "A thief who steals secrets.".to_string(),
                    release_year: 2010,
                    ..Default::default()
                },
                target: CatalogSnapshot {
                    title: "Начало".to_string(),
                    overview: "Вор, крадущий секреты.".to_string(),
                    ..Default::default()
                },
            },
        );
        assert_eq!(record.primary_title, "Inception");
        assert_eq!(record.overview, "A thief who steals secrets.");
        assert!(record.locale_fallback_used);
    }

    #[test]
    fn test_merge_flags_overview_only_fallback() {
        let record = merge_snapshots(
            "27205",
            CatalogSnapshots {
                reference: CatalogSnapshot {
                    title: "Inception".to_string(),
                    overview: "A thief who steals secrets.".to_string(),
                    release_year: 2010,
                    ..Default::default()
                },
                target: CatalogSnapshot {
                    title: "Începutul".to_string(),
                    overview: "Вор, крадущий секреты.".to_string(),
                    ..Default::default()
                },
            },
        );
        assert_eq!(record.primary_title, "Începutul");
        assert_eq!(record.overview, "A thief who steals secrets.");
        assert!(record.locale_fallback_used);
    }

    #[test]
    fn test_merge_episode_placeholder_uses_reference() {
        let reference = EpisodeRecord {
            season: 1,
            episode_number: 3,
            title: "Cat's in the Bag...".to_string(),
            ..Default::default()
        };
        let target = EpisodeRecord {
            season: 1,
            episode_number: 3,
            title: "Episodul 3".to_string(),
            ..Default::default()
        };
        let merged = merge_episode(&reference, Some(&target));
        assert_eq!(merged.title, "Cat's in the Bag...");
    }
}
