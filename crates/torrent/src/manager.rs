//! Capabilities the HTTP layer needs from a torrent backend

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::link::TorrentSpec;
use crate::model::{TorrentFileStat, TorrentRecord, TorrentStat, TorrentStatus};

/// Errors reported by a torrent backend
#[derive(Debug, Error)]
pub enum TorrentError {
    /// The underlying torrent client rejected or failed a request
    #[error("torrent client error: {0}")]
    Client(String),
    /// The torrent was submitted but the client does not report it
    #[error("torrent {0} was not registered")]
    NotRegistered(String),
}

/// Snapshot of a single torrent
///
/// All methods are synchronous and answer from the snapshot; they never
/// wait for the backend.
pub trait TorrentHandle: Send + Sync {
    /// Info hash in lowercase hex
    fn hash(&self) -> &str;

    fn stat(&self) -> TorrentStat;

    /// Stored title/poster/data/category
    fn record(&self) -> &TorrentRecord;

    /// Whether the torrent's metadata (file list and sizes) is available
    fn got_info(&self) -> bool;

    /// Files in torrent order
    fn files(&self) -> &[TorrentFileStat];

    fn status(&self) -> TorrentStatus;

    /// Location on disk of the file with the given id
    fn file_path(&self, id: usize) -> Option<PathBuf>;
}

/// Lookup and registration of torrents
#[async_trait]
pub trait TorrentManager: Send + Sync {
    /// Find a torrent by info hash
    async fn get_torrent(&self, hash: &str) -> Option<Arc<dyn TorrentHandle>>;

    /// Register a torrent as an active session
    async fn add_torrent(
        &self,
        spec: &TorrentSpec,
        title: &str,
        poster: &str,
        data: &str,
        category: &str,
    ) -> Result<Arc<dyn TorrentHandle>, TorrentError>;
}
