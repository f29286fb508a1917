//! Catalog/schedule refresh: remote client plus local cache.

pub mod cache;
pub mod client;

use tracing::info;

use self::cache::JsonCache;
use self::client::CatalogSource;
use crate::Result;

/// Counts recorded by a successful refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    /// Catalog records persisted.
    pub songs: usize,
    /// Schedule records persisted.
    pub schedules: usize,
}

/// Fetch the catalog and schedule and persist both verbatim.
///
/// Both documents are fetched before either is written, so a failed fetch
/// leaves the previous cache untouched.
///
/// # Errors
///
/// Returns `AppError::Sync` if either fetch fails, or `AppError::Cache`
/// if a document cannot be written.
pub async fn sync_once(source: &dyn CatalogSource, cache: &JsonCache) -> Result<SyncSummary> {
    let songs = source.fetch_catalog().await?;
    let schedules = source.fetch_schedule().await?;

    cache.write_songs(&songs)?;
    cache.write_schedules(&schedules)?;

    let summary = SyncSummary {
        songs: songs.len(),
        schedules: schedules.len(),
    };
    info!(
        songs = summary.songs,
        schedules = summary.schedules,
        "catalog and schedule cached"
    );
    Ok(summary)
}
