//! Torrent data shared between the manager and its consumers

/// One file inside a torrent's metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentFileStat {
    /// 1-based position of the file within the torrent
    pub id: usize,
    /// Path relative to the torrent root
    pub path: String,
    /// Size in bytes
    pub length: u64,
}

/// Lifecycle state of a torrent as seen by the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorrentStat {
    /// Known to the client but without an active session
    InDb,
    /// Active, still fetching metadata
    GettingInfo,
    /// Active with metadata available
    Working,
}

/// Descriptive payload stored alongside a torrent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TorrentRecord {
    pub title: String,
    pub poster: String,
    pub data: String,
    pub category: String,
}

/// Point-in-time status of a torrent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentStatus {
    pub hash: String,
    pub name: String,
    pub stat: TorrentStat,
    pub file_stats: Vec<TorrentFileStat>,
}
