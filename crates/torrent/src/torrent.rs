use async_trait::async_trait;
use qbit_rs::{
    model::{AddTorrentArg, Credential, GetTorrentListArg, State, Torrent, TorrentContent, TorrentSource},
    Error, Qbit,
};
use std::{path::PathBuf, sync::Arc};

use crate::link::TorrentSpec;
use crate::manager::{TorrentError, TorrentHandle, TorrentManager};
use crate::model::{TorrentFileStat, TorrentRecord, TorrentStat, TorrentStatus};

/// Wrapper around qBittorrent API client
#[derive(Clone)]
pub struct TorrentApi {
    pub client: Arc<Qbit>,
}

impl TorrentApi {
    /// Create a new TorrentApi instance
    ///
    /// # Arguments
    /// * `endpoint` - qBittorrent Web UI address, e.g. http://localhost:8080
    /// * `username` - Web UI user
    /// * `password` - Web UI password
    pub fn new(endpoint: &str, username: &str, password: &str) -> Self {
        let credential = Credential::new(username, password);
        let client = Arc::new(Qbit::new(endpoint, credential));
        TorrentApi { client }
    }

    /// Authenticate with the qBittorrent server
    ///
    /// # Errors
    /// Returns an error if authentication fails
    pub async fn login(&self) -> Result<(), Error> {
        self.client.login(false).await.map_err(|e| {
            tracing::error!("Failed to login to qBittorrent: {}", e);
            e
        })
    }

    async fn find(&self, hash: &str) -> Result<Option<Torrent>, Error> {
        let arg = GetTorrentListArg {
            filter: None,
            category: None,
            tag: None,
            sort: None,
            reverse: None,
            limit: None,
            offset: None,
            hashes: Some(hash.to_string()),
        };

        let torrents = self.client.get_torrent_list(arg).await?;
        Ok(torrents
            .into_iter()
            .find(|t| t.hash.as_deref().is_some_and(|h| h.eq_ignore_ascii_case(hash))))
    }

    async fn snapshot(&self, hash: &str, torrent: Torrent) -> QbitTorrent {
        let stat = stat_from_state(torrent.state.as_ref());

        let files = if stat == TorrentStat::GettingInfo {
            Vec::new()
        } else {
            match self.client.get_torrent_contents(hash, None).await {
                Ok(contents) => file_stats(&contents),
                Err(err) => {
                    tracing::error!("Error getting files of torrent {}: {}", hash, err);
                    Vec::new()
                }
            }
        };

        QbitTorrent {
            hash: hash.to_lowercase(),
            stat,
            record: TorrentRecord {
                title: torrent.name.unwrap_or_default(),
                category: torrent.category.unwrap_or_default(),
                ..Default::default()
            },
            files,
            save_path: PathBuf::from(torrent.save_path.unwrap_or_else(|| ".".to_string())),
        }
    }
}

#[async_trait]
impl TorrentManager for TorrentApi {
    async fn get_torrent(&self, hash: &str) -> Option<Arc<dyn TorrentHandle>> {
        match self.find(hash).await {
            Ok(Some(torrent)) => Some(Arc::new(self.snapshot(hash, torrent).await)),
            Ok(None) => None,
            Err(err) => {
                tracing::error!("Error querying torrent {}: {}", hash, err);
                None
            }
        }
    }

    async fn add_torrent(
        &self,
        spec: &TorrentSpec,
        title: &str,
        _poster: &str,
        _data: &str,
        category: &str,
    ) -> Result<Arc<dyn TorrentHandle>, TorrentError> {
        let hash = spec.info_hash.as_str();
        let known = self.find(hash).await.map_err(client_error)?;

        if known.is_some() {
            tracing::info!("Resuming torrent {}", hash);
            self.client
                .start_torrents(vec![hash.to_string()])
                .await
                .map_err(client_error)?;
        } else {
            let magnet = spec.magnet();
            tracing::info!("Adding torrent with URL: {}", magnet);
            let url: url::Url = magnet
                .parse()
                .map_err(|e: url::ParseError| TorrentError::Client(e.to_string()))?;
            let arg = AddTorrentArg {
                source: TorrentSource::Urls { urls: vec![url].into() },
                rename: non_empty(title),
                category: non_empty(category),
                ..Default::default()
            };
            self.client.add_torrent(arg).await.map_err(client_error)?;
        }

        self.get_torrent(hash)
            .await
            .ok_or_else(|| TorrentError::NotRegistered(hash.to_string()))
    }
}

fn client_error(err: Error) -> TorrentError {
    tracing::error!("qBittorrent request failed: {}", err);
    TorrentError::Client(err.to_string())
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Map qBittorrent's torrent state onto the manager lifecycle
fn stat_from_state(state: Option<&State>) -> TorrentStat {
    match state {
        Some(State::PausedDL) | Some(State::PausedUP) => TorrentStat::InDb,
        Some(State::MetaDL) => TorrentStat::GettingInfo,
        _ => TorrentStat::Working,
    }
}

/// Convert qBittorrent contents (0-based) into 1-based file stats
fn file_stats(contents: &[TorrentContent]) -> Vec<TorrentFileStat> {
    contents
        .iter()
        .enumerate()
        .map(|(position, content)| TorrentFileStat {
            id: position + 1,
            path: content.name.clone(),
            length: content.size,
        })
        .collect()
}

/// Snapshot of a torrent known to qBittorrent
#[derive(Debug, Clone)]
struct QbitTorrent {
    hash: String,
    stat: TorrentStat,
    record: TorrentRecord,
    files: Vec<TorrentFileStat>,
    save_path: PathBuf,
}

impl TorrentHandle for QbitTorrent {
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
        self.stat != TorrentStat::GettingInfo && !self.files.is_empty()
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
            .map(|f| self.save_path.join(&f.path))
    }
}
