//! Torrent backend for the play server
//!
//! This crate defines what the HTTP layer needs from a torrent backend
//! (lookup, registration, metadata and file locations) and implements it
//! on top of the qBittorrent Web API using the qbit-rs library.

pub mod link;
pub mod manager;
pub mod model;
pub mod torrent;

pub use link::{parse_link, LinkError, TorrentSpec};
pub use manager::{TorrentError, TorrentHandle, TorrentManager};
pub use model::{TorrentFileStat, TorrentRecord, TorrentStat, TorrentStatus};
pub use torrent::TorrentApi;
