//! In-memory torrent backend for tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use torrent::{
    TorrentError, TorrentFileStat, TorrentHandle, TorrentManager, TorrentRecord, TorrentSpec,
    TorrentStat, TorrentStatus,
};

#[derive(Debug, Clone)]
pub struct FakeTorrent {
    pub hash: String,
    pub stat: TorrentStat,
    pub got_info: bool,
    pub record: TorrentRecord,
    pub files: Vec<TorrentFileStat>,
    pub root: PathBuf,
}

impl FakeTorrent {
    /// A working torrent with metadata and 1-based file ids
    pub fn new(hash: &str, entries: &[(&str, u64)]) -> Self {
        Self {
            hash: hash.to_string(),
            stat: TorrentStat::Working,
            got_info: true,
            record: TorrentRecord::default(),
            files: entries
                .iter()
                .enumerate()
                .map(|(i, (path, length))| TorrentFileStat {
                    id: i + 1,
                    path: path.to_string(),
                    length: *length,
                })
                .collect(),
            root: PathBuf::from("/downloads"),
        }
    }
}

impl TorrentHandle for FakeTorrent {
    fn hash(&self) -> &str {
        &self.hash
    }

    fn stat(&self) -> TorrentStat {
        self.stat
    }

    fn record(&self) -> &TorrentRecord {
        &self.record
    }

    fn got_info(&self) -> bool {
        self.got_info
    }

    fn files(&self) -> &[TorrentFileStat] {
        &self.files
    }

    fn status(&self) -> TorrentStatus {
        TorrentStatus {
            hash: self.hash.clone(),
            name: self.record.title.clone(),
            stat: self.stat,
            file_stats: self.files.clone(),
        }
    }

    fn file_path(&self, id: usize) -> Option<PathBuf> {
        self.files
            .iter()
            .find(|f| f.id == id)
            .map(|f| self.root.join(&f.path))
    }
}

/// Registration call captured by [`FakeManager`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub hash: String,
    pub title: String,
    pub poster: String,
    pub data: String,
    pub category: String,
}

#[derive(Default)]
pub struct FakeManager {
    torrents: RwLock<HashMap<String, FakeTorrent>>,
    registrations: RwLock<Vec<Registration>>,
    fail_registration: bool,
}

impl FakeManager {
    pub fn with(torrents: Vec<FakeTorrent>) -> Self {
        Self {
            torrents: RwLock::new(torrents.into_iter().map(|t| (t.hash.clone(), t)).collect()),
            ..Default::default()
        }
    }

    pub fn failing_registration(mut self) -> Self {
        self.fail_registration = true;
        self
    }

    pub fn registrations(&self) -> Vec<Registration> {
        self.registrations.read().unwrap().clone()
    }
}

#[async_trait]
impl TorrentManager for FakeManager {
    async fn get_torrent(&self, hash: &str) -> Option<Arc<dyn TorrentHandle>> {
        let torrents = self.torrents.read().unwrap();
        torrents
            .get(hash)
            .cloned()
            .map(|t| Arc::new(t) as Arc<dyn TorrentHandle>)
    }

    async fn add_torrent(
        &self,
        spec: &TorrentSpec,
        title: &str,
        poster: &str,
        data: &str,
        category: &str,
    ) -> Result<Arc<dyn TorrentHandle>, TorrentError> {
        if self.fail_registration {
            return Err(TorrentError::Client("session closed".to_string()));
        }

        self.registrations.write().unwrap().push(Registration {
            hash: spec.info_hash.clone(),
            title: title.to_string(),
            poster: poster.to_string(),
            data: data.to_string(),
            category: category.to_string(),
        });

        let mut torrents = self.torrents.write().unwrap();
        let torrent = torrents
            .get_mut(&spec.info_hash)
            .ok_or_else(|| TorrentError::NotRegistered(spec.info_hash.clone()))?;
        torrent.stat = TorrentStat::Working;
        Ok(Arc::new(torrent.clone()))
    }
}
