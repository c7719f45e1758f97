//! Canonical name generator.

use regex::Regex;

/// Remove/replace characters that are invalid in filenames.
pub fn sanitize_filename(name: &str) -> String {
    // Colons become a dash, everything else invalid is dropped
    let name = name.replace(':', " -");
    let name = match Regex::new(r#"[<>:"/\\|?*]"#) {
        Ok(re) => re.replace_all(&name, "").to_string(),
        Err(_) => name,
    };
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical media folder name: `Title (Year) [tmdb-ID]`.
pub fn canonical_folder_name(title: &str, year: u16, canonical_id: &str) -> String {
    sanitize_filename(&format!("{title} ({year}) [tmdb-{canonical_id}]"))
}

/// Tagged folder name for a non-reference-language production:
/// `Title (OriginalTitle) (Year) [tmdb-ID]`.
pub fn canonical_folder_name_with_original(
    title: &str,
    original_title: &str,
    year: u16,
    canonical_id: &str,
) -> String {
    sanitize_filename(&format!(
        "{title} ({original_title}) ({year}) [tmdb-{canonical_id}]"
    ))
}

/// Canonical episode file stem: `Show - SxxEyy - Title`.
pub fn canonical_episode_name(
    show_title: &str,
    season: u16,
    episode: u16,
    episode_title: &str,
) -> String {
    let episode_title = sanitize_filename(episode_title);
    sanitize_filename(&format!(
        "{show_title} - S{season:02}E{episode:02} - {episode_title}"
    ))
}

/// Season folder name: `Season NN`.
pub fn season_folder_name(season: u16) -> String {
    format!("Season {season:02}")
}

/// Extract the season title part after the `SxxEyy` token, if the stem
/// follows the canonical episode shape.
pub fn episode_title_from_stem(stem: &str) -> Option<String> {
    let re = Regex::new(r"[Ss]\d{1,2}[Ee]\d{1,3}\s*-\s*(.+)$").ok()?;
    re.captures(stem).map(|c| c[1].trim().to_string())
}
