//! Streaming transport: serves one torrent file with range request support

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use torrent::TorrentHandle;

/// Errors owned by the transport
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("file {0} not found in torrent")]
    FileNotFound(usize),
    #[error("{0}")]
    BadRange(&'static str),
    #[error("Range not satisfiable. File size: {0}")]
    RangeNotSatisfiable(u64),
    #[error("Failed to {0}: {1}")]
    Io(&'static str, std::io::Error),
    #[error("Failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

impl IntoResponse for StreamError {
    fn into_response(self) -> Response {
        let status = match &self {
            StreamError::FileNotFound(_) => StatusCode::NOT_FOUND,
            StreamError::BadRange(_) => StatusCode::BAD_REQUEST,
            StreamError::RangeNotSatisfiable(_) => StatusCode::RANGE_NOT_SATISFIABLE,
            StreamError::Io(..) | StreamError::Response(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

/// Stream the file with the given id out of a torrent
///
/// The request headers are only consulted for `Range`.
pub async fn stream_file(
    torrent: &dyn TorrentHandle,
    id: usize,
    headers: &HeaderMap,
) -> Result<Response, StreamError> {
    let file_path = torrent.file_path(id).ok_or(StreamError::FileNotFound(id))?;

    let file = File::open(&file_path).await.map_err(|e| {
        tracing::warn!("Failed to open {}: {}", file_path.display(), e);
        if e.kind() == std::io::ErrorKind::NotFound {
            StreamError::FileNotFound(id)
        } else {
            StreamError::Io("open file", e)
        }
    })?;

    let file_size = file
        .metadata()
        .await
        .map_err(|e| StreamError::Io("get file metadata", e))?
        .len();

    let mime_type = mime_guess::from_path(&file_path)
        .first_or_octet_stream()
        .to_string();

    if let Some(range_header) = headers.get(header::RANGE) {
        return handle_range_request(file, file_size, range_header, &mime_type).await;
    }

    let body = Body::from_stream(ReaderStream::new(file));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type)
        .header(header::CONTENT_LENGTH, file_size)
        .header(header::ACCEPT_RANGES, "bytes")
        .body(body)?;

    Ok(response)
}

/// Parse `bytes=start-end` or `bytes=start-` against the file size
fn parse_range(range_header: &HeaderValue, file_size: u64) -> Result<(u64, u64), StreamError> {
    let range_str = range_header
        .to_str()
        .map_err(|_| StreamError::BadRange("Invalid range header"))?;

    let range_str = range_str
        .strip_prefix("bytes=")
        .ok_or(StreamError::BadRange("Invalid range format"))?;

    let (start, end) = range_str
        .split_once('-')
        .ok_or(StreamError::BadRange("Invalid range format"))?;

    let start: u64 = start
        .trim()
        .parse()
        .map_err(|_| StreamError::BadRange("Invalid range start"))?;

    if file_size == 0 || start >= file_size {
        return Err(StreamError::RangeNotSatisfiable(file_size));
    }

    let end: u64 = if end.trim().is_empty() {
        file_size - 1
    } else {
        end.trim()
            .parse::<u64>()
            .map_err(|_| StreamError::BadRange("Invalid range end"))?
            .min(file_size - 1)
    };

    if start > end {
        return Err(StreamError::RangeNotSatisfiable(file_size));
    }

    Ok((start, end))
}

/// Handle HTTP range requests for video seeking
async fn handle_range_request(
    mut file: File,
    file_size: u64,
    range_header: &HeaderValue,
    mime_type: &str,
) -> Result<Response, StreamError> {
    let (start, end) = parse_range(range_header, file_size)?;
    let content_length = end - start + 1;

    file.seek(std::io::SeekFrom::Start(start))
        .await
        .map_err(|e| StreamError::Io("seek file", e))?;

    let body = Body::from_stream(ReaderStream::new(file.take(content_length)));

    let response = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_TYPE, mime_type)
        .header(header::CONTENT_LENGTH, content_length)
        .header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", start, end, file_size),
        )
        .header(header::ACCEPT_RANGES, "bytes")
        .body(body)?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeTorrent;
    use axum::body::to_bytes;
    use std::io::Write;

    fn torrent_in(dir: &tempfile::TempDir) -> FakeTorrent {
        let show = dir.path().join("Show");
        std::fs::create_dir_all(&show).unwrap();
        let mut file = std::fs::File::create(show.join("e01.mkv")).unwrap();
        file.write_all(b"0123456789").unwrap();

        let mut torrent = FakeTorrent::new("abc", &[("Show/e01.mkv", 10), ("Show/missing.mkv", 5)]);
        torrent.root = dir.path().to_path_buf();
        torrent
    }

    fn range(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::RANGE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_parse_range() {
        let value = |s: &'static str| HeaderValue::from_static(s);
        assert_eq!(parse_range(&value("bytes=0-4"), 10).unwrap(), (0, 4));
        assert_eq!(parse_range(&value("bytes=5-"), 10).unwrap(), (5, 9));
        assert_eq!(parse_range(&value("bytes=5-100"), 10).unwrap(), (5, 9));
        assert!(matches!(
            parse_range(&value("bytes=10-"), 10),
            Err(StreamError::RangeNotSatisfiable(10))
        ));
        assert!(matches!(
            parse_range(&value("bytes=6-2"), 10),
            Err(StreamError::RangeNotSatisfiable(10))
        ));
        assert!(matches!(
            parse_range(&value("items=0-1"), 10),
            Err(StreamError::BadRange(_))
        ));
        assert!(matches!(
            parse_range(&value("bytes=a-1"), 10),
            Err(StreamError::BadRange(_))
        ));
        assert!(matches!(
            parse_range(&value("bytes=0-"), 0),
            Err(StreamError::RangeNotSatisfiable(0))
        ));
    }

    #[tokio::test]
    async fn test_stream_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let torrent = torrent_in(&dir);

        let response = stream_file(&torrent, 1, &HeaderMap::new()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "10");
        assert_eq!(response.headers()[header::ACCEPT_RANGES], "bytes");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "video/x-matroska");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"0123456789");
    }

    #[tokio::test]
    async fn test_stream_range() {
        let dir = tempfile::tempdir().unwrap();
        let torrent = torrent_in(&dir);

        let response = stream_file(&torrent, 1, &range("bytes=2-5")).await.unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 2-5/10");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "4");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"2345");
    }

    #[tokio::test]
    async fn test_stream_unknown_or_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let torrent = torrent_in(&dir);

        let err = stream_file(&torrent, 7, &HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, StreamError::FileNotFound(7)));

        let err = stream_file(&torrent, 2, &HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stream_unsatisfiable_range() {
        let dir = tempfile::tempdir().unwrap();
        let torrent = torrent_in(&dir);

        let err = stream_file(&torrent, 1, &range("bytes=20-")).await.unwrap_err();
        assert_eq!(
            err.into_response().status(),
            StatusCode::RANGE_NOT_SATISFIABLE
        );
    }
}
