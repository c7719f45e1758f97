//! Pipeline orchestrator.
//!
//! Sequences tag -> organize -> rename -> metadata -> trailer -> heal for
//! every library folder. Errors in one folder never prevent processing of
//! the next; only a state-store failure aborts the run.

use crate::core::state::{self, StateStore};
use crate::core::{healer, matcher, parser, trailer};
use crate::generators::{filename as gen_filename, nfo};
use crate::models::media::{CatalogRecord, Identity, MediaKind, TrailerCandidate};
use crate::models::state::ProcessingStatus;
use crate::services::jellyfin::LibraryServer;
use crate::services::tmdb::Catalog;
use crate::services::ytdlp::VideoPlatform;
use crate::utils::fs as fsutil;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Per-folder pipeline stage, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Discovered,
    Identified,
    Organized,
    Renamed,
    MetadataFetched,
    TrailerResolved,
    EpisodeTitlesHealed,
    Scanned,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Discovered => "discovered",
            Stage::Identified => "identified",
            Stage::Organized => "organized",
            Stage::Renamed => "renamed",
            Stage::MetadataFetched => "metadata fetched",
            Stage::TrailerResolved => "trailer resolved",
            Stage::EpisodeTitlesHealed => "episode titles healed",
            Stage::Scanned => "scanned",
        };
        write!(f, "{name}")
    }
}

/// What happened to one folder during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderStatus {
    Processed,
    Skipped,
    Failed,
}

/// Per-folder detail for the run summary.
#[derive(Debug, Clone)]
pub struct FolderOutcome {
    pub folder: String,
    pub status: FolderStatus,
    pub detail: String,
}

/// Result of a full run over both library roots.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub per_folder: Vec<FolderOutcome>,
}

enum FolderResult {
    Done { changed: bool },
    Skipped(String),
}

/// Orchestrates the per-folder pipeline over the collaborators.
pub struct Pipeline<C, V, L> {
    catalog: C,
    platform: V,
    library: L,
    state: StateStore,
    force: bool,
    skip_trailers: bool,
}

impl<C: Catalog, V: VideoPlatform, L: LibraryServer> Pipeline<C, V, L> {
    pub fn new(catalog: C, platform: V, library: L, state: StateStore, force: bool) -> Self {
        Self {
            catalog,
            platform,
            library,
            state,
            force,
            skip_trailers: false,
        }
    }

    /// Disable trailer search and download for this run.
    pub fn skip_trailers(mut self) -> Self {
        self.skip_trailers = true;
        self
    }

    /// Process every media folder under both roots, then report.
    ///
    /// The only error this returns is a state-store failure; everything
    /// else is contained per folder and recorded in the summary.
    pub async fn process_library_root(
        &mut self,
        movies_path: &Path,
        shows_path: &Path,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut changes = false;

        let excluded = self.state.excluded_count();
        if excluded > 0 {
            tracing::info!("Trailer exclusions: {excluded} item(s)");
        }

        for (kind, root) in [
            (MediaKind::Movie, movies_path),
            (MediaKind::Show, shows_path),
        ] {
            if !root.exists() {
                tracing::debug!("Library root missing, skipping: {}", root.display());
                continue;
            }
            let folders = match fsutil::library_folders(root) {
                Ok(folders) => folders,
                Err(e) => {
                    tracing::error!("Cannot list {}: {e}", root.display());
                    continue;
                }
            };

            tracing::info!("Processing {} {kind} folder(s)...", folders.len());
            let bar = ProgressBar::new(folders.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );

            for folder in folders {
                let name = folder
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                bar.set_message(name.clone());

                match self.process_folder(kind, &folder).await {
                    Ok(FolderResult::Done { changed }) => {
                        changes |= changed;
                        summary.processed += 1;
                        summary.per_folder.push(FolderOutcome {
                            folder: name,
                            status: FolderStatus::Processed,
                            detail: String::new(),
                        });
                    }
                    Ok(FolderResult::Skipped(reason)) => {
                        summary.skipped += 1;
                        summary.per_folder.push(FolderOutcome {
                            folder: name,
                            status: FolderStatus::Skipped,
                            detail: reason,
                        });
                    }
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        tracing::error!("[{kind}] '{name}': {e}");
                        summary.failed += 1;
                        summary.per_folder.push(FolderOutcome {
                            folder: name,
                            status: FolderStatus::Failed,
                            detail: e.to_string(),
                        });
                    }
                }
                bar.inc(1);
            }
            bar.finish_and_clear();
        }

        if changes {
            if let Err(e) = self.library.trigger_rescan().await {
                tracing::error!("Library rescan failed: {e}");
            }
        }

        self.state.update_last_scan()?;
        Ok(summary)
    }

    /// Current state key for a folder: canonical ID once tagged, else path.
    fn folder_key(&self, folder: &Path) -> String {
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match parser::extract_catalog_tag(&name) {
            Some(id) => state::key_for_id(&id),
            None => state::key_for_path(folder),
        }
    }

    async fn process_folder(&mut self, kind: MediaKind, folder: &Path) -> Result<FolderResult> {
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let key = self.folder_key(folder);
        if !self.state.should_process(&key, self.force) {
            tracing::debug!("Already complete, skipping: {name}");
            return Ok(FolderResult::Skipped("already complete".to_string()));
        }
        tracing::trace!("'{name}' stage: {}", Stage::Discovered);

        // Failures before the folder is tagged belong to the original
        // key; once identified, the migrated key owns the record.
        let (folder, record, key) = match self.identify(kind, folder, &name, &key).await {
            Ok(identified) => identified,
            Err(e) => return self.record_failure(&key, &name, e),
        };
        tracing::trace!("'{name}' stage: {}", Stage::Identified);

        let final_name = folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| name.clone());

        match self.apply(kind, &folder, &record, &key).await {
            Ok((changed, trailer_resolved)) => {
                // A missing trailer is not a folder failure, but the item
                // only becomes Complete once its trailer is settled; an
                // open attempt leaves it Tagged so the next run retries.
                let status = if trailer_resolved {
                    ProcessingStatus::Complete
                } else {
                    ProcessingStatus::Tagged
                };
                self.state.set_status(&key, status, &final_name)?;
                tracing::trace!("'{final_name}' stage: {}", Stage::Scanned);
                Ok(FolderResult::Done { changed })
            }
            Err(e) => self.record_failure(&key, &final_name, e),
        }
    }

    /// Resolve a folder to its catalog record: fetch by existing tag, or
    /// search, rename and migrate the state key. Returns the possibly
    /// renamed folder path together with the key now owning its record.
    async fn identify(
        &mut self,
        kind: MediaKind,
        folder: &Path,
        name: &str,
        key: &str,
    ) -> Result<(PathBuf, CatalogRecord, String)> {
        let identity = parser::parse_folder(name, kind)?;

        match parser::extract_catalog_tag(name) {
            Some(id) => {
                let record = matcher::fetch_record(&self.catalog, &identity, &id).await?;
                Ok((folder.to_path_buf(), record, key.to_string()))
            }
            None => {
                tracing::info!(
                    "New {kind} detected: '{}' ({:?})",
                    identity.normalized_title,
                    identity.year
                );
                let record = matcher::resolve(&self.catalog, &identity).await?;
                let tagged = self.tag_folder(folder, &identity, &record)?;
                let new_key = state::key_for_id(&record.canonical_id);
                self.state.migrate_key(key, &new_key)?;
                self.state
                    .set_status(&new_key, ProcessingStatus::Tagged, name)?;
                Ok((tagged, record, new_key))
            }
        }
    }

    /// Run the post-identification stages on a tagged folder. Returns
    /// whether filesystem changes were made and whether the trailer is
    /// settled for this item.
    async fn apply(
        &mut self,
        kind: MediaKind,
        folder: &Path,
        record: &CatalogRecord,
        key: &str,
    ) -> Result<(bool, bool)> {
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut changed = false;
        if kind == MediaKind::Show {
            changed |= self.organize_episodes(folder);
        }
        tracing::trace!("'{name}' stage: {}", Stage::Organized);

        let trailer_resolved;
        match kind {
            MediaKind::Movie => {
                changed |= self.rename_movie_files(folder, record)?;
                tracing::trace!("'{name}' stage: {}", Stage::Renamed);

                self.write_movie_metadata(folder, record).await?;
                tracing::trace!("'{name}' stage: {}", Stage::MetadataFetched);

                trailer_resolved = self.handle_trailer(folder, record, key, false).await?;
                tracing::trace!("'{name}' stage: {}", Stage::TrailerResolved);
            }
            MediaKind::Show => {
                changed |= self.rename_episodes(folder, record)?;
                tracing::trace!("'{name}' stage: {}", Stage::Renamed);

                self.write_show_metadata(folder, record).await?;
                tracing::trace!("'{name}' stage: {}", Stage::MetadataFetched);

                trailer_resolved = self.handle_trailer(folder, record, key, true).await?;
                tracing::trace!("'{name}' stage: {}", Stage::TrailerResolved);

                changed |= self.heal_episode_titles(folder, record)?;
                tracing::trace!("'{name}' stage: {}", Stage::EpisodeTitlesHealed);
            }
        }

        Ok((changed, trailer_resolved))
    }

    /// Record a contained per-folder failure under the key currently
    /// owning the item, then hand the error back for the run summary.
    fn record_failure(&mut self, key: &str, display: &str, err: Error) -> Result<FolderResult> {
        if err.is_fatal() {
            return Err(err);
        }
        self.state
            .set_status(key, ProcessingStatus::Failed, display)?;
        Err(err)
    }

    /// Append the catalog tag to a folder name, keeping the recognizable
    /// title and adding the reference title when it differs.
    fn tag_folder(
        &self,
        folder: &Path,
        identity: &Identity,
        record: &CatalogRecord,
    ) -> Result<PathBuf> {
        let year = if record.release_year > 0 {
            record.release_year
        } else {
            identity.year.unwrap_or(0)
        };

        let same_title = parser::fold_for_compare(&identity.normalized_title)
            == parser::fold_for_compare(&record.fallback_title);
        let new_name = if same_title {
            gen_filename::canonical_folder_name(
                &identity.normalized_title,
                year,
                &record.canonical_id,
            )
        } else {
            gen_filename::canonical_folder_name_with_original(
                &identity.normalized_title,
                &record.fallback_title,
                year,
                &record.canonical_id,
            )
        };

        let new_path = folder.with_file_name(&new_name);
        if new_path.exists() {
            return Err(Error::TargetExists(new_name));
        }
        std::fs::rename(folder, &new_path)?;
        tracing::info!("Tagged: {new_name} ({})", record.fallback_title);
        Ok(new_path)
    }

    /// Rename the main video (and its subtitles) to the primary title.
    fn rename_movie_files(&self, folder: &Path, record: &CatalogRecord) -> Result<bool> {
        let Some(video) = fsutil::largest_video_in(folder)? else {
            return Ok(false);
        };

        let stem = gen_filename::sanitize_filename(&record.primary_title);
        let ext = fsutil::get_extension(&video).unwrap_or_else(|| "mkv".to_string());
        let target = folder.join(format!("{stem}.{ext}"));

        let mut changed = false;
        if video != target {
            fsutil::move_file(&video, &target)?;
            tracing::info!("Renamed movie: {stem}.{ext}");
            changed = true;
        }

        for entry in std::fs::read_dir(folder)?.filter_map(|e| e.ok()) {
            let sub = entry.path();
            if !sub.is_file() || !fsutil::is_subtitle_file(&sub) {
                continue;
            }
            let sub_ext = fsutil::get_extension(&sub).unwrap_or_default();
            let sub_name = sub.file_name().map(|n| n.to_string_lossy().to_lowercase());
            let new_name = if sub_name.map(|n| n.contains(".en.")).unwrap_or(false) {
                format!("{stem}.en.{sub_ext}")
            } else {
                format!("{stem}.{sub_ext}")
            };
            let sub_target = folder.join(&new_name);
            if sub != sub_target {
                fsutil::move_file(&sub, &sub_target)?;
                tracing::info!("Renamed subtitle: {new_name}");
                changed = true;
            }
        }

        Ok(changed)
    }

    /// Move loose episode videos in the show root into Season folders.
    /// Files without a parseable episode token are logged and skipped.
    fn organize_episodes(&self, folder: &Path) -> bool {
        let loose = match fsutil::video_files_in(folder) {
            Ok(videos) => videos,
            Err(e) => {
                tracing::error!("Cannot list {}: {e}", folder.display());
                return false;
            }
        };
        if loose.is_empty() {
            return false;
        }

        tracing::info!("  {} loose episode(s) to organize", loose.len());
        let mut changed = false;
        for video in loose {
            let stem = video
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let (season, _) = match parser::parse_episode_file(&stem) {
                Ok(key) => key,
                Err(e) => {
                    tracing::warn!("  Skipping unparsable file: {e}");
                    continue;
                }
            };

            let season_folder = folder.join(gen_filename::season_folder_name(season));
            if !season_folder.exists() {
                if let Err(e) = std::fs::create_dir(&season_folder) {
                    tracing::error!("  Cannot create {}: {e}", season_folder.display());
                    continue;
                }
            }
            let target = season_folder.join(video.file_name().unwrap_or_default());
            if !target.exists() {
                match fsutil::move_file(&video, &target) {
                    Ok(()) => {
                        tracing::info!("  Moved to Season {season:02}: {stem}");
                        changed = true;
                    }
                    Err(e) => tracing::error!("  Error moving {stem}: {e}"),
                }
            }
        }
        changed
    }

    fn season_folders(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        let mut seasons: Vec<PathBuf> = std::fs::read_dir(folder)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_dir()
                    && p.file_name()
                        .map(|n| n.to_string_lossy().starts_with("Season"))
                        .unwrap_or(false)
            })
            .collect();
        seasons.sort();
        Ok(seasons)
    }

    /// Rename every episode file to `Show - SxxEyy - Title`.
    fn rename_episodes(&self, folder: &Path, record: &CatalogRecord) -> Result<bool> {
        let mut changed = false;

        for season_folder in self.season_folders(folder)? {
            for video in fsutil::video_files_in(&season_folder)? {
                let stem = video
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let (season, episode) = match parser::parse_episode_file(&stem) {
                    Ok(key) => key,
                    Err(e) => {
                        tracing::warn!("  Skipping unparsable file: {e}");
                        continue;
                    }
                };

                let title = record
                    .episode(season, episode)
                    .map(|e| e.title.clone())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| format!("Episodul {episode}"));

                let new_stem = gen_filename::canonical_episode_name(
                    &record.primary_title,
                    season,
                    episode,
                    &title,
                );
                let ext = fsutil::get_extension(&video).unwrap_or_else(|| "mkv".to_string());
                let target = season_folder.join(format!("{new_stem}.{ext}"));
                if video != target {
                    fsutil::move_file(&video, &target)?;
                    tracing::info!("Renamed episode: {new_stem}.{ext}");
                    changed = true;
                }
            }
        }

        changed |= self.move_show_subtitles(folder)?;
        Ok(changed)
    }

    /// Move subtitle files from the show root next to their episode video.
    fn move_show_subtitles(&self, folder: &Path) -> Result<bool> {
        let mut changed = false;
        for entry in std::fs::read_dir(folder)?.filter_map(|e| e.ok()) {
            let sub = entry.path();
            if !sub.is_file() || !fsutil::is_subtitle_file(&sub) {
                continue;
            }
            let stem = sub
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let Ok((season, episode)) = parser::parse_episode_file(&stem) else {
                continue;
            };

            let season_folder = folder.join(gen_filename::season_folder_name(season));
            if !season_folder.exists() {
                tracing::warn!("Season folder not found for {stem}");
                continue;
            }

            let token = format!("S{season:02}E{episode:02}");
            let video = fsutil::video_files_in(&season_folder)?
                .into_iter()
                .find(|v| v.file_name().map(|n| n.to_string_lossy().contains(&token)).unwrap_or(false));
            let Some(video) = video else {
                tracing::warn!("No matching video for {stem}");
                continue;
            };

            let sub_ext = fsutil::get_extension(&sub).unwrap_or_default();
            let video_stem = video
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let target = season_folder.join(format!("{video_stem}.{sub_ext}"));
            if sub != target {
                fsutil::move_file(&sub, &target)?;
                tracing::info!("Moved subtitle next to {video_stem}");
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Write the movie NFO and artwork, skipping when up to date.
    async fn write_movie_metadata(&self, folder: &Path, record: &CatalogRecord) -> Result<()> {
        let nfo_path = match fsutil::largest_video_in(folder)? {
            Some(video) => video.with_extension("nfo"),
            None => folder.join(format!(
                "{}.nfo",
                folder
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default()
            )),
        };

        if nfo::needs_refresh(&nfo_path, &record.canonical_id) {
            nfo::write_nfo(&nfo_path, &nfo::generate_movie_nfo(record))?;
            tracing::info!("Created movie NFO: {}", nfo_path.display());

            // Drop stale NFOs left over from earlier names
            for entry in std::fs::read_dir(folder)?.filter_map(|e| e.ok()) {
                let path = entry.path();
                if path.is_file()
                    && fsutil::get_extension(&path).as_deref() == Some("nfo")
                    && path != nfo_path
                {
                    std::fs::remove_file(&path)?;
                }
            }
        }

        self.download_artwork(folder, record).await
    }

    /// Write tvshow.nfo, artwork and per-episode NFOs.
    async fn write_show_metadata(&self, folder: &Path, record: &CatalogRecord) -> Result<()> {
        let nfo_path = folder.join("tvshow.nfo");
        let refresh = nfo::needs_refresh(&nfo_path, &record.canonical_id);
        if refresh {
            nfo::write_nfo(&nfo_path, &nfo::generate_tvshow_nfo(record))?;
            tracing::info!("Created tvshow NFO: {}", folder.display());
        }
        self.download_artwork(folder, record).await?;

        for season_folder in self.season_folders(folder)? {
            for video in fsutil::video_files_in(&season_folder)? {
                let stem = video
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let Ok((season, episode)) = parser::parse_episode_file(&stem) else {
                    continue;
                };
                let episode_nfo = video.with_extension("nfo");
                if episode_nfo.exists() && !refresh {
                    continue;
                }
                let Some(ep) = record.episode(season, episode) else {
                    continue;
                };
                nfo::write_nfo(
                    &episode_nfo,
                    &nfo::generate_episode_nfo(&record.primary_title, ep),
                )?;
                tracing::info!("Created NFO: S{season:02}E{episode:02} - {}", ep.title);
            }
        }
        Ok(())
    }

    async fn download_artwork(&self, folder: &Path, record: &CatalogRecord) -> Result<()> {
        let poster = folder.join("poster.jpg");
        if !poster.exists() {
            if let Some(ref path) = record.poster_path {
                self.catalog.download_image(path, "w500", &poster).await?;
                tracing::info!("Downloaded poster for {}", folder.display());
            }
        }
        let backdrop = folder.join("backdrop.jpg");
        if !backdrop.exists() {
            if let Some(ref path) = record.backdrop_path {
                self.catalog
                    .download_image(path, "original", &backdrop)
                    .await?;
            }
        }
        Ok(())
    }

    /// Search, select and download a trailer, respecting the exclusion
    /// policy. Returns whether the trailer is settled for this item:
    /// present on disk, newly downloaded, permanently excluded, or
    /// disabled for this run. A failed attempt is recorded via the
    /// attempt counter and leaves the item unsettled so the next run
    /// retries it.
    async fn handle_trailer(
        &mut self,
        folder: &Path,
        record: &CatalogRecord,
        key: &str,
        is_show: bool,
    ) -> Result<bool> {
        if self.skip_trailers {
            return Ok(true);
        }
        let trailer_path = folder.join("trailer.mkv");
        if trailer_path.exists() {
            return Ok(true);
        }
        if !self.state.should_attempt_trailer(key) {
            tracing::debug!("Skipping excluded trailer: {}", folder.display());
            return Ok(true);
        }

        let item_name = folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let year = (record.release_year > 0).then_some(record.release_year);
        let queries = trailer::build_queries(
            &record.primary_title,
            &record.fallback_title,
            year,
            is_show,
        );

        let mut candidates: Vec<TrailerCandidate> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut last_reason = trailer::RejectReason::NoCandidates;

        for query in &queries {
            match self.platform.search(query).await {
                Ok(results) => {
                    for candidate in results {
                        if seen.insert(candidate.video_id.clone()) {
                            candidates.push(candidate);
                        }
                    }
                }
                Err(e) => tracing::warn!("Trailer search failed for '{query}': {e}"),
            }

            // Some queries carry the localized title, so a candidate may
            // match either title. Try the reference title first, then the
            // localized one.
            let selection = match trailer::select(&record.fallback_title, &candidates, year, is_show)
            {
                trailer::Selection::Rejected(trailer::RejectReason::NoAcceptable)
                    if record.primary_title != record.fallback_title =>
                {
                    trailer::select(&record.primary_title, &candidates, year, is_show)
                }
                selection => selection,
            };

            match selection {
                trailer::Selection::Accepted {
                    video_id,
                    resolution,
                } => {
                    tracing::info!("Downloading trailer {video_id} for: {item_name}");
                    match self
                        .platform
                        .download(&video_id, resolution, &trailer_path)
                        .await
                    {
                        Ok(()) => {
                            tracing::info!("Downloaded trailer: {item_name}");
                            self.state.record_trailer_success(key)?;
                            return Ok(true);
                        }
                        Err(e) => {
                            tracing::error!("Trailer download failed: {e}");
                            self.state.record_trailer_failure(
                                key,
                                &item_name,
                                record.release_year,
                            )?;
                            return Ok(self.state.get(key).trailer_permanently_excluded);
                        }
                    }
                }
                trailer::Selection::Rejected(reason) => last_reason = reason,
            }
        }

        tracing::warn!("No trailer found for '{item_name}': {last_reason}");
        self.state
            .record_trailer_failure(key, &item_name, record.release_year)?;
        Ok(self.state.get(key).trailer_permanently_excluded)
    }

    /// Replace generic placeholder episode titles once canonical titles
    /// become available, renaming the video and its descriptor.
    fn heal_episode_titles(&self, folder: &Path, record: &CatalogRecord) -> Result<bool> {
        let mut updated = 0u32;

        for season_folder in self.season_folders(folder)? {
            for video in fsutil::video_files_in(&season_folder)? {
                let stem = video
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let Some(existing) = gen_filename::episode_title_from_stem(&stem) else {
                    continue;
                };
                let Ok((season, episode)) = parser::parse_episode_file(&stem) else {
                    continue;
                };

                let healed = healer::heal(&existing, &record.episodes, season, episode);
                if healed == existing {
                    continue;
                }

                let new_stem = gen_filename::canonical_episode_name(
                    &record.primary_title,
                    season,
                    episode,
                    &healed,
                );
                let ext = fsutil::get_extension(&video).unwrap_or_else(|| "mkv".to_string());
                let target = season_folder.join(format!("{new_stem}.{ext}"));
                fsutil::move_file(&video, &target)?;

                // Keep the descriptor aligned with the new stem
                let old_nfo = video.with_extension("nfo");
                if old_nfo.exists() {
                    fsutil::move_file(&old_nfo, &season_folder.join(format!("{new_stem}.nfo")))?;
                }

                tracing::info!("Updated episode: {new_stem}.{ext}");
                updated += 1;
            }
        }

        if updated > 0 {
            tracing::info!("  Updated {updated} episode title(s)");
        }
        Ok(updated > 0)
    }
}
