//! Server state shared by all request handlers

use std::collections::HashMap;
use std::sync::Arc;
use torrent::TorrentManager;

/// Server state holding the torrent backend and the configured accounts
///
/// Nothing in here is mutated by request handlers.
#[derive(Clone)]
pub struct ServerState {
    /// Torrent lookup and registration
    manager: Arc<dyn TorrentManager>,
    /// Basic auth accounts, user name to password
    accounts: Arc<HashMap<String, String>>,
}

impl ServerState {
    /// Create new server state
    ///
    /// # Arguments
    /// * `manager` - Torrent backend used to look up and register torrents
    /// * `accounts` - Basic auth accounts; empty disables authorization
    pub fn new(manager: Arc<dyn TorrentManager>, accounts: HashMap<String, String>) -> Self {
        Self {
            manager,
            accounts: Arc::new(accounts),
        }
    }

    /// Get the torrent backend
    pub fn manager(&self) -> &dyn TorrentManager {
        self.manager.as_ref()
    }

    /// Get the configured accounts
    pub fn accounts(&self) -> &HashMap<String, String> {
        &self.accounts
    }

    /// Whether requests must be authorized
    pub fn auth_required(&self) -> bool {
        !self.accounts.is_empty()
    }
}
