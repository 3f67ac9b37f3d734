//! `GET /play/:hash/:id` - resolve a file inside a torrent and stream it

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use std::sync::Arc;
use thiserror::Error;
use torrent::{parse_link, LinkError, TorrentError, TorrentHandle, TorrentManager, TorrentStat};

use crate::auth::{AuthContext, AUTH_REALM};
use crate::selection;
use crate::state::ServerState;
use crate::stream;

/// Index value asking the server to pick the file itself
pub const AUTO_SELECT_INDEX: i64 = -10;

/// Why a play request could not be served
#[derive(Debug, Error)]
pub enum PlayError {
    #[error("link should not be empty")]
    EmptyLink,
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error("error get torrent")]
    TorrentUnavailable,
    #[error("authorization required")]
    Unauthorized,
    #[error(transparent)]
    Register(#[from] TorrentError),
    #[error("timeout connection torrent")]
    MetadataTimeout,
    #[error("no suitable file found for auto-selection")]
    NoSuitableFile,
    #[error("\"index\" is wrong")]
    BadIndex,
}

impl IntoResponse for PlayError {
    fn into_response(self) -> Response {
        let status = match self {
            PlayError::EmptyLink | PlayError::NoSuitableFile => StatusCode::NOT_FOUND,
            PlayError::BadIndex => StatusCode::BAD_REQUEST,
            PlayError::Unauthorized => {
                return (
                    StatusCode::UNAUTHORIZED,
                    [(header::WWW_AUTHENTICATE, AUTH_REALM)],
                    self.to_string(),
                )
                    .into_response();
            }
            PlayError::Link(_)
            | PlayError::TorrentUnavailable
            | PlayError::Register(_)
            | PlayError::MetadataTimeout => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

/// Optional auto-selection hints
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlayQuery {
    pub season: Option<String>,
    pub episode: Option<String>,
    pub filename: Option<String>,
}

impl PlayQuery {
    /// Collect hints from raw query pairs
    ///
    /// The first occurrence of a key wins and unknown keys are ignored, so
    /// the query string alone can never fail a request.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        Self {
            season: first("season"),
            episode: first("episode"),
            filename: first("filename"),
        }
    }
}

/// Everything the resolver needs from one request
#[derive(Debug, Clone, Copy)]
pub struct PlayRequest<'a> {
    pub hash: &'a str,
    pub index: &'a str,
    pub filename: &'a str,
    pub season: &'a str,
    pub episode: &'a str,
    pub auth: &'a AuthContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexToken {
    Auto,
    Index(usize),
    Invalid,
}

fn parse_index_token(token: &str) -> IndexToken {
    match token.parse::<i64>() {
        Ok(AUTO_SELECT_INDEX) => IndexToken::Auto,
        Ok(index) => usize::try_from(index)
            .map(IndexToken::Index)
            .unwrap_or(IndexToken::Invalid),
        Err(_) => IndexToken::Invalid,
    }
}

/// Pick the file id to stream from a torrent whose metadata is available
///
/// A single-file torrent always plays its only file, whatever was asked.
fn resolve_index(torrent: &dyn TorrentHandle, request: &PlayRequest<'_>) -> Result<usize, PlayError> {
    if let [only] = torrent.files() {
        return Ok(only.id);
    }

    match parse_index_token(request.index) {
        IndexToken::Index(index) => Ok(index),
        IndexToken::Auto => {
            let status = torrent.status();
            let selected = selection::auto_select(
                &status.file_stats,
                request.filename,
                request.season,
                request.episode,
            );
            tracing::debug!("Auto-selected file {:?} in torrent {}", selected, torrent.hash());
            selected.ok_or(PlayError::NoSuitableFile)
        }
        IndexToken::Invalid => Err(PlayError::BadIndex),
    }
}

/// Find, authorize and prepare the torrent, then resolve the file id
///
/// Every step either advances or ends the request; nothing is retried.
pub async fn resolve_play(
    manager: &dyn TorrentManager,
    request: &PlayRequest<'_>,
) -> Result<(Arc<dyn TorrentHandle>, usize), PlayError> {
    if request.hash.is_empty() || request.index.is_empty() {
        return Err(PlayError::EmptyLink);
    }

    let spec = parse_link(request.hash)?;

    let mut torrent = match manager.get_torrent(&spec.info_hash).await {
        Some(torrent) => torrent,
        None if request.auth.is_anonymous() => return Err(PlayError::Unauthorized),
        None => return Err(PlayError::TorrentUnavailable),
    };

    if torrent.stat() == TorrentStat::InDb {
        let record = torrent.record().clone();
        tracing::info!("Registering stored torrent {}", spec.info_hash);
        torrent = manager
            .add_torrent(
                &spec,
                &record.title,
                &record.poster,
                &record.data,
                &record.category,
            )
            .await?;
    }

    if !torrent.got_info() {
        return Err(PlayError::MetadataTimeout);
    }

    let index = resolve_index(torrent.as_ref(), request)?;
    Ok((torrent, index))
}

/// Play handler
pub async fn play(
    State(state): State<ServerState>,
    Path((hash, index)): Path<(String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
    Extension(auth): Extension<AuthContext>,
    headers: HeaderMap,
) -> Response {
    let query = PlayQuery::from_pairs(&pairs);
    let request = PlayRequest {
        hash: &hash,
        index: &index,
        filename: query.filename.as_deref().unwrap_or_default(),
        season: query.season.as_deref().unwrap_or_default(),
        episode: query.episode.as_deref().unwrap_or_default(),
        auth: &auth,
    };

    match resolve_play(state.manager(), &request).await {
        Ok((torrent, file_id)) => {
            tracing::info!("Streaming file {} of torrent {}", file_id, torrent.hash());
            stream::stream_file(torrent.as_ref(), file_id, &headers)
                .await
                .into_response()
        }
        Err(err) => {
            tracing::warn!("Play {}/{} failed: {}", hash, index, err);
            err.into_response()
        }
    }
}
