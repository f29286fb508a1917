//! Local JSON cache of the catalog and schedule.
//!
//! Two named documents live under the data directory: `songs.json` and
//! `schedulers.json`. Writes go through a temporary file in the same
//! directory followed by an atomic rename, so readers never observe a
//! half-written document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::models::schedule::{ScheduleRecord, ScheduleWindow};
use crate::models::track::{resolve_tracks, SongRecord, Track};
use crate::{AppError, Result};

/// Document name of the cached catalog.
pub const SONGS_DOCUMENT: &str = "songs";
/// Document name of the cached schedule array.
pub const SCHEDULERS_DOCUMENT: &str = "schedulers";

/// File-backed cache rooted at a data directory.
#[derive(Debug, Clone)]
pub struct JsonCache {
    dir: PathBuf,
}

impl JsonCache {
    /// Construct a cache; the directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the documents.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of a named document.
    #[must_use]
    pub fn document_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Persist catalog records verbatim.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Cache` if the document cannot be written.
    pub fn write_songs(&self, songs: &[SongRecord]) -> Result<()> {
        self.write_document(SONGS_DOCUMENT, &songs)
    }

    /// Persist schedule records verbatim.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Cache` if the document cannot be written.
    pub fn write_schedules(&self, schedules: &[ScheduleRecord]) -> Result<()> {
        self.write_document(SCHEDULERS_DOCUMENT, &schedules)
    }

    /// Read the cached catalog records.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Cache` if the document is missing or unparsable.
    pub fn read_songs(&self) -> Result<Vec<SongRecord>> {
        self.read_document(SONGS_DOCUMENT)
    }

    /// Read the cached schedule records.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Cache` if the document is missing or unparsable.
    pub fn read_schedules(&self) -> Result<Vec<ScheduleRecord>> {
        self.read_document(SCHEDULERS_DOCUMENT)
    }

    /// Load the authoritative (first) schedule window.
    ///
    /// Returns `Ok(None)` when the cached array is empty.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Cache` if the document cannot be read, or
    /// `AppError::Schedule` if the first record is malformed.
    pub fn load_schedule(&self) -> Result<Option<ScheduleWindow>> {
        let records = self.read_schedules()?;
        records.first().map(ScheduleWindow::try_from).transpose()
    }

    /// Load the playable track list from the cached catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Cache` if the document is missing or unparsable.
    pub fn load_tracks(&self) -> Result<Vec<Track>> {
        let records = self.read_songs()?;
        let tracks = resolve_tracks(&records);
        debug!(
            records = records.len(),
            playable = tracks.len(),
            "resolved tracks from cached catalog"
        );
        Ok(tracks)
    }

    fn write_document<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|err| {
            AppError::Cache(format!(
                "failed to create cache directory {}: {err}",
                self.dir.display()
            ))
        })?;

        let path = self.document_path(name);
        let json = serde_json::to_string_pretty(value)?;

        let mut staged = NamedTempFile::new_in(&self.dir)
            .map_err(|err| AppError::Cache(format!("failed to stage {name}: {err}")))?;
        staged
            .write_all(json.as_bytes())
            .and_then(|()| staged.flush())
            .map_err(|err| AppError::Cache(format!("failed to write {name}: {err}")))?;
        staged.persist(&path).map_err(|err| {
            AppError::Cache(format!("failed to replace {}: {}", path.display(), err.error))
        })?;

        debug!(path = %path.display(), "cache document saved");
        Ok(())
    }

    fn read_document<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.document_path(name);
        let raw = fs::read_to_string(&path).map_err(|err| {
            AppError::Cache(format!("failed to read {}: {err}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|err| {
            AppError::Cache(format!("failed to parse {}: {err}", path.display()))
        })
    }
}
