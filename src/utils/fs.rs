//! File system utilities.

use crate::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "m4v", "ts", "m2ts"];
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "sub", "ass", "ssa", "vtt"];

/// Ensure a directory exists, creating it when missing.
pub fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(crate::Error::NotADirectory(path.display().to_string()));
        }
        return Ok(());
    }
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Move a file from one location to another.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    // Try rename first (fast, same filesystem)
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }

    // Fall back to copy + delete (cross filesystem)
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)?;
    Ok(())
}

/// Get file extension in lowercase.
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Check if a file is a video file based on extension.
pub fn is_video_file(path: &Path) -> bool {
    get_extension(path)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Check if a file is a subtitle file based on extension.
pub fn is_subtitle_file(path: &Path) -> bool {
    get_extension(path)
        .map(|ext| SUBTITLE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Check if a filename marks a trailer asset.
pub fn is_trailer_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase().contains("trailer"))
        .unwrap_or(false)
}

/// Library folders starting with these markers are skipped.
pub fn is_hidden_dir(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('#') || name.starts_with('@')
}

/// Video files directly inside a directory, trailers excluded, sorted.
pub fn video_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut videos: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_video_file(p) && !is_trailer_file(p))
        .collect();
    videos.sort();
    Ok(videos)
}

/// The largest video file in a directory: the main feature for a movie
/// folder that also contains samples or extras.
pub fn largest_video_in(dir: &Path) -> Result<Option<PathBuf>> {
    let videos = video_files_in(dir)?;
    let mut best: Option<(u64, PathBuf)> = None;
    for video in videos {
        let size = std::fs::metadata(&video)?.len();
        if best.as_ref().map(|(s, _)| size > *s).unwrap_or(true) {
            best = Some((size, video));
        }
    }
    Ok(best.map(|(_, p)| p))
}

/// Immediate subdirectories, hidden/system folders excluded, sorted.
pub fn library_folders(root: &Path) -> Result<Vec<PathBuf>> {
    let mut folders = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if is_hidden_dir(&entry.file_name().to_string_lossy()) {
            continue;
        }
        folders.push(entry.into_path());
    }
    folders.sort();
    Ok(folders)
}
