//! Parsing of torrent links into a normalized torrent spec

use thiserror::Error;

const MAGNET_PREFIX: &str = "magnet:?";
const BTIH_PREFIX: &str = "xt=urn:btih:";
const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Errors produced while parsing a link
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("link is empty")]
    Empty,
    #[error("magnet link has no btih info hash")]
    MissingInfoHash,
    #[error("invalid info hash: {0}")]
    InvalidInfoHash(String),
    #[error("unsupported link: {0}")]
    Unsupported(String),
}

/// Content identifier extracted from a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentSpec {
    /// Info hash as 40 lowercase hex characters
    pub info_hash: String,
    /// Display name (`dn`) if the link carried one
    pub name: Option<String>,
    /// Announce URLs (`tr`) carried by the link
    pub trackers: Vec<String>,
}

impl TorrentSpec {
    /// Render a canonical magnet URI for this torrent
    pub fn magnet(&self) -> String {
        let mut magnet = format!("{}{}{}", MAGNET_PREFIX, BTIH_PREFIX, self.info_hash);
        if let Some(name) = &self.name {
            magnet.push_str("&dn=");
            magnet.push_str(&urlencoding::encode(name));
        }
        for tracker in &self.trackers {
            magnet.push_str("&tr=");
            magnet.push_str(&urlencoding::encode(tracker));
        }
        magnet
    }
}

/// Parse a magnet link or a bare info hash
///
/// Magnet links have the format: magnet:?xt=urn:btih:HASH&dn=NAME&tr=URL...
/// The hash may be 40 hex characters or 32 base32 characters; either way the
/// resulting spec carries the lowercase hex form.
pub fn parse_link(link: &str) -> Result<TorrentSpec, LinkError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(LinkError::Empty);
    }

    if let Some(query) = link.strip_prefix(MAGNET_PREFIX) {
        return parse_magnet(query);
    }

    if link.contains("://") {
        return Err(LinkError::Unsupported(link.to_string()));
    }

    Ok(TorrentSpec {
        info_hash: normalize_info_hash(link)?,
        name: None,
        trackers: Vec::new(),
    })
}

fn parse_magnet(query: &str) -> Result<TorrentSpec, LinkError> {
    let mut info_hash = None;
    let mut name = None;
    let mut trackers = Vec::new();

    for param in query.split('&') {
        if let Some(hash) = param.strip_prefix(BTIH_PREFIX) {
            if info_hash.is_none() && !hash.is_empty() {
                info_hash = Some(normalize_info_hash(hash)?);
            }
        } else if let Some(value) = param.strip_prefix("dn=") {
            name = Some(decode_param(value));
        } else if let Some(value) = param.strip_prefix("tr=") {
            trackers.push(decode_param(value));
        }
    }

    Ok(TorrentSpec {
        info_hash: info_hash.ok_or(LinkError::MissingInfoHash)?,
        name,
        trackers,
    })
}

fn decode_param(value: &str) -> String {
    let value = value.replace('+', " ");
    urlencoding::decode(&value)
        .map(|s| s.into_owned())
        .unwrap_or(value)
}

fn normalize_info_hash(hash: &str) -> Result<String, LinkError> {
    match hash.len() {
        40 if hash.chars().all(|c| c.is_ascii_hexdigit()) => Ok(hash.to_lowercase()),
        32 => decode_base32(hash).ok_or_else(|| LinkError::InvalidInfoHash(hash.to_string())),
        _ => Err(LinkError::InvalidInfoHash(hash.to_string())),
    }
}

/// Decode a 32 character base32 info hash into lowercase hex
fn decode_base32(hash: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(20);
    let mut buffer: u64 = 0;
    let mut bits = 0;

    for c in hash.bytes() {
        let value = BASE32_ALPHABET
            .iter()
            .position(|&a| a == c.to_ascii_uppercase())? as u64;
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            bytes.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }

    Some(hex::encode(bytes))
}
