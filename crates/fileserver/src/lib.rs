//! HTTP server for playing files out of torrents
//!
//! This crate resolves which file inside a torrent a `/play` request refers
//! to (by explicit index, or by automatic selection from filename and
//! season/episode hints) and streams it with range request support.

mod auth;
mod play;
pub mod selection;
mod server;
mod state;
mod stream;

#[cfg(test)]
mod test_utils;

pub use auth::AuthContext;
pub use play::{resolve_play, PlayError, PlayQuery, PlayRequest, AUTO_SELECT_INDEX};
pub use server::FileServerApi;
pub use state::ServerState;
pub use stream::{stream_file, StreamError};

/// Result type alias for file server operations
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
