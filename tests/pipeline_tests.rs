//! Integration tests for the pipeline orchestrator.
//!
//! Tests cover:
//! - Movie folder tagging, renaming, metadata and trailer download
//! - Idempotence: completed folders trigger no collaborator calls
//! - Ambiguous and missing catalog matches fail only their own folder
//! - Trailer exclusion policy for pre-2000 releases
//! - Show episode organizing, renaming and title healing

use jellyfin_helper::core::pipeline::{FolderStatus, Pipeline};
use jellyfin_helper::core::state::StateStore;
use jellyfin_helper::models::media::{
    CatalogSnapshot, CatalogSnapshots, EpisodeRecord, MediaKind, SearchHit, TrailerCandidate,
};
use jellyfin_helper::models::state::ProcessingStatus;
use jellyfin_helper::services::jellyfin::LibraryServer;
use jellyfin_helper::services::tmdb::Catalog;
use jellyfin_helper::services::ytdlp::VideoPlatform;
use jellyfin_helper::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Clone, Default)]
struct MockCatalog {
    /// Search hits keyed by normalized title.
    hits: HashMap<String, Vec<SearchHit>>,
    /// Snapshots keyed by canonical ID.
    snapshots: HashMap<String, CatalogSnapshots>,
    fail_images: bool,
    searches: Arc<AtomicUsize>,
    fetches: Arc<AtomicUsize>,
}

impl Catalog for MockCatalog {
    async fn search(
        &self,
        _kind: MediaKind,
        title: &str,
        _year: Option<u16>,
    ) -> Result<Vec<SearchHit>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self.hits.get(title).cloned().unwrap_or_default())
    }

    async fn fetch(&self, _kind: MediaKind, canonical_id: &str) -> Result<CatalogSnapshots> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.snapshots
            .get(canonical_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(canonical_id.to_string()))
    }

    async fn download_image(&self, _image_path: &str, _size: &str, dest: &Path) -> Result<()> {
        if self.fail_images {
            return Err(Error::unavailable("tmdb", "image fetch failed"));
        }
        fs::write(dest, b"artwork")?;
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MockPlatform {
    candidates: Vec<TrailerCandidate>,
    fail_search: bool,
    searches: Arc<AtomicUsize>,
    downloads: Arc<AtomicUsize>,
}

impl VideoPlatform for MockPlatform {
    async fn search(&self, _query: &str) -> Result<Vec<TrailerCandidate>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail_search {
            return Err(Error::unavailable("yt-dlp", "connection refused"));
        }
        Ok(self.candidates.clone())
    }

    async fn download(&self, _video_id: &str, _max_height: u32, dest: &Path) -> Result<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        fs::write(dest, b"trailer")?;
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MockLibrary {
    rescans: Arc<AtomicUsize>,
}

impl LibraryServer for MockLibrary {
    async fn trigger_rescan(&self) -> Result<()> {
        self.rescans.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn movie_snapshots(title: &str, year: u16) -> CatalogSnapshots {
    let snapshot = CatalogSnapshot {
        title: title.to_string(),
        overview: "An overview.".to_string(),
        genres: vec!["Drama".to_string()],
        release_year: year,
        premiere_date: Some(format!("{year}-06-01")),
        poster_path: Some("/poster.jpg".to_string()),
        backdrop_path: Some("/backdrop.jpg".to_string()),
        episodes: vec![],
    };
    CatalogSnapshots {
        reference: snapshot.clone(),
        target: snapshot,
    }
}

fn hit(id: &str, title: &str, year: u16, rank: u32) -> SearchHit {
    SearchHit {
        canonical_id: id.to_string(),
        title: title.to_string(),
        year: Some(year),
        rank,
    }
}

fn good_trailer(id: &str, title: &str) -> TrailerCandidate {
    TrailerCandidate {
        video_id: id.to_string(),
        title: title.to_string(),
        duration_seconds: 120,
        channel_name: "Studio".to_string(),
        is_official_tag: true,
        max_available_resolution: 1080,
    }
}

struct Roots {
    _movies: TempDir,
    _shows: TempDir,
    _data: TempDir,
    movies: PathBuf,
    shows: PathBuf,
    state_file: PathBuf,
}

fn roots() -> Roots {
    let movies = TempDir::new().unwrap();
    let shows = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    Roots {
        movies: movies.path().to_path_buf(),
        shows: shows.path().to_path_buf(),
        state_file: data.path().join("state.json"),
        _movies: movies,
        _shows: shows,
        _data: data,
    }
}

#[tokio::test]
async fn test_movie_full_pipeline() {
    let roots = roots();
    let folder = roots.movies.join("Inception (2010)");
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join("Inception.2010.1080p.BluRay.mkv"), "video").unwrap();

    let mut catalog = MockCatalog::default();
    catalog
        .hits
        .insert("Inception".to_string(), vec![hit("27205", "Inception", 2010, 0)]);
    let mut snapshots = movie_snapshots("Inception", 2010);
    snapshots.target.title = "Începutul".to_string();
    catalog.snapshots.insert("27205".to_string(), snapshots);

    let platform = MockPlatform {
        candidates: vec![good_trailer("abc123", "Inception Official Trailer")],
        ..Default::default()
    };
    let library = MockLibrary::default();
    let rescans = library.rescans.clone();
    let downloads = platform.downloads.clone();

    let state = StateStore::load(roots.state_file.clone()).unwrap();
    let mut pipeline = Pipeline::new(catalog, platform, library, state, false);
    let summary = pipeline
        .process_library_root(&roots.movies, &roots.shows)
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 0);

    let tagged = roots.movies.join("Inception (2010) [tmdb-27205]");
    assert!(tagged.is_dir(), "folder should carry the catalog tag");
    // The Latin-script localized title drives the file name.
    assert!(tagged.join("Începutul.mkv").is_file());
    assert!(tagged.join("Începutul.nfo").is_file());
    assert!(tagged.join("poster.jpg").is_file());
    assert!(tagged.join("backdrop.jpg").is_file());
    assert!(tagged.join("trailer.mkv").is_file());
    assert_eq!(downloads.load(Ordering::SeqCst), 1);
    assert_eq!(rescans.load(Ordering::SeqCst), 1);

    let nfo = fs::read_to_string(tagged.join("Începutul.nfo")).unwrap();
    assert!(nfo.contains("<tmdbid>27205</tmdbid>"));
    assert!(nfo.contains("<title>Începutul</title>"));
    assert!(nfo.contains("<originaltitle>Inception</originaltitle>"));
}

#[tokio::test]
async fn test_completed_folder_skipped_without_collaborator_calls() {
    let roots = roots();
    let folder = roots.movies.join("Inception (2010)");
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join("inception.mkv"), "video").unwrap();

    let mut catalog = MockCatalog::default();
    catalog
        .hits
        .insert("Inception".to_string(), vec![hit("27205", "Inception", 2010, 0)]);
    catalog
        .snapshots
        .insert("27205".to_string(), movie_snapshots("Inception", 2010));
    let platform = MockPlatform {
        candidates: vec![good_trailer("abc123", "Inception Official Trailer")],
        ..Default::default()
    };

    let state = StateStore::load(roots.state_file.clone()).unwrap();
    let mut pipeline = Pipeline::new(catalog, platform, MockLibrary::default(), state, false);
    pipeline
        .process_library_root(&roots.movies, &roots.shows)
        .await
        .unwrap();

    // Second run with fresh collaborators and the persisted state.
    let catalog = MockCatalog::default();
    let platform = MockPlatform::default();
    let library = MockLibrary::default();
    let searches = catalog.searches.clone();
    let fetches = catalog.fetches.clone();
    let trailer_searches = platform.searches.clone();
    let rescans = library.rescans.clone();

    let state = StateStore::load(roots.state_file.clone()).unwrap();
    let mut pipeline = Pipeline::new(catalog, platform, library, state, false);
    let summary = pipeline
        .process_library_root(&roots.movies, &roots.shows)
        .await
        .unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.processed, 0);
    assert_eq!(searches.load(Ordering::SeqCst), 0);
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
    assert_eq!(trailer_searches.load(Ordering::SeqCst), 0);
    assert_eq!(rescans.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ambiguous_match_fails_folder_only() {
    let roots = roots();
    fs::create_dir(roots.movies.join("Gladiator (2000)")).unwrap();
    fs::create_dir(roots.movies.join("Inception (2010)")).unwrap();
    fs::write(
        roots.movies.join("Inception (2010)").join("inception.mkv"),
        "video",
    )
    .unwrap();

    let mut catalog = MockCatalog::default();
    // Collaborator reports a tie at rank 0.
    catalog.hits.insert(
        "Gladiator".to_string(),
        vec![hit("98", "Gladiator", 2000, 0), hit("578", "Gladiator", 1992, 0)],
    );
    catalog
        .hits
        .insert("Inception".to_string(), vec![hit("27205", "Inception", 2010, 0)]);
    catalog
        .snapshots
        .insert("27205".to_string(), movie_snapshots("Inception", 2010));

    let state = StateStore::load(roots.state_file.clone()).unwrap();
    let mut pipeline = Pipeline::new(
        catalog,
        MockPlatform::default(),
        MockLibrary::default(),
        state,
        false,
    );
    let summary = pipeline
        .process_library_root(&roots.movies, &roots.shows)
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 1);
    // The ambiguous folder is left untouched for the next run.
    assert!(roots.movies.join("Gladiator (2000)").is_dir());
    assert!(roots.movies.join("Inception (2010) [tmdb-27205]").is_dir());

    let failure = summary
        .per_folder
        .iter()
        .find(|o| o.status == FolderStatus::Failed)
        .unwrap();
    assert_eq!(failure.folder, "Gladiator (2000)");
    assert!(failure.detail.contains("Ambiguous"));
}

#[tokio::test]
async fn test_unmatched_folder_fails_folder_only() {
    let roots = roots();
    fs::create_dir(roots.movies.join("Totally Unknown (1999)")).unwrap();

    let state = StateStore::load(roots.state_file.clone()).unwrap();
    let mut pipeline = Pipeline::new(
        MockCatalog::default(),
        MockPlatform::default(),
        MockLibrary::default(),
        state,
        false,
    );
    let summary = pipeline
        .process_library_root(&roots.movies, &roots.shows)
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert!(roots.movies.join("Totally Unknown (1999)").is_dir());
}

#[tokio::test]
async fn test_trailer_exclusion_after_repeated_failures_pre_2000() {
    let roots = roots();
    let folder = roots.movies.join("Old Classic (1995)");
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join("old.classic.mkv"), "video").unwrap();

    let mut catalog = MockCatalog::default();
    catalog.hits.insert(
        "Old Classic".to_string(),
        vec![hit("42", "Old Classic", 1995, 0)],
    );
    catalog
        .snapshots
        .insert("42".to_string(), movie_snapshots("Old Classic", 1995));

    // Two ordinary, unforced runs with a failing platform burn both
    // trailer attempts: the item stays Tagged after the first failure so
    // the second run picks it up again.
    for expected_attempts in [1u32, 2u32] {
        let platform = MockPlatform {
            fail_search: true,
            ..Default::default()
        };
        let trailer_searches = platform.searches.clone();
        let state = StateStore::load(roots.state_file.clone()).unwrap();
        let mut pipeline = Pipeline::new(
            catalog.clone(),
            platform,
            MockLibrary::default(),
            state,
            false,
        );
        let summary = pipeline
            .process_library_root(&roots.movies, &roots.shows)
            .await
            .unwrap();
        assert_eq!(summary.processed, 1, "trailer failure is not a folder failure");
        assert!(
            trailer_searches.load(Ordering::SeqCst) > 0,
            "run {expected_attempts} should reach the platform"
        );

        let store = StateStore::load(roots.state_file.clone()).unwrap();
        assert_eq!(store.get("tmdb-42").trailer_attempts, expected_attempts);
    }

    let store = StateStore::load(roots.state_file.clone()).unwrap();
    let record = store.get("tmdb-42");
    assert!(record.trailer_permanently_excluded);
    assert_eq!(record.status, ProcessingStatus::Complete);

    // Third run skips the item entirely and never reaches the platform.
    let platform = MockPlatform {
        fail_search: true,
        ..Default::default()
    };
    let trailer_searches = platform.searches.clone();
    let state = StateStore::load(roots.state_file.clone()).unwrap();
    let mut pipeline = Pipeline::new(catalog, platform, MockLibrary::default(), state, false);
    let summary = pipeline
        .process_library_root(&roots.movies, &roots.shows)
        .await
        .unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(trailer_searches.load(Ordering::SeqCst), 0);

    let store = StateStore::load(roots.state_file).unwrap();
    assert_eq!(store.get("tmdb-42").trailer_attempts, 2);
}

#[tokio::test]
async fn test_trailer_failure_for_modern_release_retried_each_run() {
    let roots = roots();
    let folder = roots.movies.join("Dune (2021)");
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join("dune.mkv"), "video").unwrap();

    let mut catalog = MockCatalog::default();
    catalog
        .hits
        .insert("Dune".to_string(), vec![hit("438631", "Dune", 2021, 0)]);
    catalog
        .snapshots
        .insert("438631".to_string(), movie_snapshots("Dune", 2021));

    for run in 1..=3u32 {
        let platform = MockPlatform {
            fail_search: true,
            ..Default::default()
        };
        let trailer_searches = platform.searches.clone();
        let state = StateStore::load(roots.state_file.clone()).unwrap();
        let mut pipeline = Pipeline::new(
            catalog.clone(),
            platform,
            MockLibrary::default(),
            state,
            false,
        );
        pipeline
            .process_library_root(&roots.movies, &roots.shows)
            .await
            .unwrap();
        assert!(
            trailer_searches.load(Ordering::SeqCst) > 0,
            "run {run} should retry the trailer"
        );
    }

    // Post-2000 releases are never excluded and never marked Complete
    // while the trailer is outstanding.
    let store = StateStore::load(roots.state_file).unwrap();
    let record = store.get("tmdb-438631");
    assert_eq!(record.trailer_attempts, 3);
    assert!(!record.trailer_permanently_excluded);
    assert_eq!(record.status, ProcessingStatus::Tagged);
}

#[tokio::test]
async fn test_failure_after_tagging_recorded_under_catalog_key() {
    let roots = roots();
    let folder = roots.movies.join("Inception (2010)");
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join("inception.mkv"), "video").unwrap();

    let mut catalog = MockCatalog {
        fail_images: true,
        ..Default::default()
    };
    catalog
        .hits
        .insert("Inception".to_string(), vec![hit("27205", "Inception", 2010, 0)]);
    catalog
        .snapshots
        .insert("27205".to_string(), movie_snapshots("Inception", 2010));

    let state = StateStore::load(roots.state_file.clone()).unwrap();
    let mut pipeline = Pipeline::new(
        catalog,
        MockPlatform::default(),
        MockLibrary::default(),
        state,
        false,
    );
    let summary = pipeline
        .process_library_root(&roots.movies, &roots.shows)
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    // The folder was tagged and renamed before the artwork fetch failed.
    assert!(roots.movies.join("Inception (2010) [tmdb-27205]").is_dir());

    // The failure lands on the migrated catalog key; no stale path key
    // survives the rename.
    let raw = fs::read_to_string(&roots.state_file).unwrap();
    assert!(raw.contains("tmdb-27205"));
    assert!(raw.contains("\"failed\""));
    assert!(!raw.contains("path:"), "stale path record left behind: {raw}");
}

#[tokio::test]
async fn test_trailer_matched_on_localized_title() {
    let roots = roots();
    let folder = roots.movies.join("Inception (2010)");
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join("inception.mkv"), "video").unwrap();

    let mut catalog = MockCatalog::default();
    catalog
        .hits
        .insert("Inception".to_string(), vec![hit("27205", "Inception", 2010, 0)]);
    let mut snapshots = movie_snapshots("Inception", 2010);
    snapshots.target.title = "Începutul".to_string();
    catalog.snapshots.insert("27205".to_string(), snapshots);

    // Only a candidate matching the localized title is on offer.
    let platform = MockPlatform {
        candidates: vec![good_trailer("loc1", "Începutul Trailer Oficial")],
        ..Default::default()
    };
    let downloads = platform.downloads.clone();

    let state = StateStore::load(roots.state_file.clone()).unwrap();
    let mut pipeline = Pipeline::new(catalog, platform, MockLibrary::default(), state, false);
    let summary = pipeline
        .process_library_root(&roots.movies, &roots.shows)
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(downloads.load(Ordering::SeqCst), 1);
    assert!(roots
        .movies
        .join("Inception (2010) [tmdb-27205]")
        .join("trailer.mkv")
        .is_file());
}

#[tokio::test]
async fn test_show_episodes_organized_renamed_and_healed() {
    let roots = roots();
    let folder = roots.shows.join("Friends (1994) [tmdb-1668]");
    fs::create_dir(&folder).unwrap();
    // A loose episode in the show root plus an already-organized one with
    // a generic title from an earlier pass.
    fs::write(folder.join("Friends.S01E01.720p.mkv"), "video").unwrap();
    let season = folder.join("Season 01");
    fs::create_dir(&season).unwrap();
    fs::write(season.join("Friends - S01E02 - Episodul 2.mkv"), "video").unwrap();

    let episode = |number: u16, title: &str| EpisodeRecord {
        season: 1,
        episode_number: number,
        title: title.to_string(),
        overview: "Episode overview.".to_string(),
        air_date: Some("1994-09-22".to_string()),
    };
    let mut snapshots = movie_snapshots("Friends", 1994);
    snapshots.reference.episodes = vec![episode(1, "The Pilot"), episode(2, "The One with the Sonogram at the End")];
    snapshots.target.episodes = vec![episode(1, "Episodul 1"), episode(2, "Episodul 2")];

    let mut catalog = MockCatalog::default();
    catalog.snapshots.insert("1668".to_string(), snapshots);

    let searches = catalog.searches.clone();
    let state = StateStore::load(roots.state_file.clone()).unwrap();
    let mut pipeline = Pipeline::new(
        catalog,
        MockPlatform {
            candidates: vec![good_trailer("xyz", "Friends Official Trailer")],
            ..Default::default()
        },
        MockLibrary::default(),
        state,
        false,
    );
    let summary = pipeline
        .process_library_root(&roots.movies, &roots.shows)
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);
    // Tagged folders resolve by ID, never by search.
    assert_eq!(searches.load(Ordering::SeqCst), 0);

    assert!(season.join("Friends - S01E01 - The Pilot.mkv").is_file());
    assert!(season
        .join("Friends - S01E02 - The One with the Sonogram at the End.mkv")
        .is_file());
    assert!(!folder.join("Friends.S01E01.720p.mkv").exists());

    assert!(folder.join("tvshow.nfo").is_file());
    assert!(season.join("Friends - S01E01 - The Pilot.nfo").is_file());
    let nfo = fs::read_to_string(season.join("Friends - S01E01 - The Pilot.nfo")).unwrap();
    assert!(nfo.contains("<title>The Pilot</title>"));

    let store = StateStore::load(roots.state_file).unwrap();
    use jellyfin_helper::models::state::ProcessingStatus;
    assert_eq!(store.get("tmdb-1668").status, ProcessingStatus::Complete);
}
