//! Automatic selection of the file to play from a torrent's file list
//!
//! Every function here is pure: the same candidates and hints always yield
//! the same file id, and `None` means nothing suitable was found.

use regex::Regex;
use torrent::TorrentFileStat;

/// Extensions recognized as video containers
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp", "ogv", "ts",
    "m2ts",
];

/// Final segment of a torrent-relative path
fn base_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

/// Check if a path is a video file based on its extension
pub fn is_video(path: &str) -> bool {
    match base_name(path).rsplit_once('.') {
        Some((_, ext)) => VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

/// Pick a file using the first hint channel that is present
///
/// Priority is `filename`, then `season` together with `episode`, then the
/// largest video file. Empty strings count as absent.
pub fn auto_select(
    files: &[TorrentFileStat],
    filename: &str,
    season: &str,
    episode: &str,
) -> Option<usize> {
    if files.is_empty() {
        return None;
    }

    if !filename.is_empty() {
        return select_by_filename(files, filename);
    }

    if !season.is_empty() && !episode.is_empty() {
        return select_by_season_episode(files, season, episode);
    }

    select_largest(files)
}

/// Search for a file by name (case-insensitive)
///
/// An exact base name match wins regardless of file type; otherwise the
/// first video file whose path contains the hint is used.
pub fn select_by_filename(files: &[TorrentFileStat], filename: &str) -> Option<usize> {
    let filename = filename.to_lowercase();

    if let Some(file) = files
        .iter()
        .find(|f| base_name(&f.path).to_lowercase() == filename)
    {
        return Some(file.id);
    }

    files
        .iter()
        .find(|f| f.path.to_lowercase().contains(&filename) && is_video(&f.path))
        .map(|f| f.id)
}

/// Left-pad single character season/episode numbers with a zero
///
/// Longer values are kept as they are, so "10" stays "10" and "01" stays "01".
fn pad_number(value: &str) -> String {
    if value.chars().count() == 1 {
        format!("0{}", value)
    } else {
        value.to_string()
    }
}

/// Season/episode patterns, most specific first
fn season_episode_patterns(season: &str, episode: &str) -> [String; 5] {
    let padded_season = regex::escape(&pad_number(season));
    let padded_episode = regex::escape(&pad_number(episode));
    let season = regex::escape(season);
    let episode = regex::escape(episode);

    [
        // S01E05
        format!(r"[Ss]{}[Ee]{}", padded_season, padded_episode),
        // S01.E05
        format!(r"[Ss]{}\.?[Ee]{}", padded_season, padded_episode),
        // 1x05
        format!(r"{}x{}", season, padded_episode),
        // 01x05
        format!(r"{}x{}", padded_season, padded_episode),
        // Season 1 Episode 5
        format!(r"(?i)season[.\s]?{}.*episode[.\s]?{}", season, episode),
    ]
}

/// Search for a video file by season and episode number
///
/// Patterns are tried in order and the first one matching any video file
/// wins; among its matches the largest file is chosen.
pub fn select_by_season_episode(
    files: &[TorrentFileStat],
    season: &str,
    episode: &str,
) -> Option<usize> {
    for pattern in season_episode_patterns(season, episode) {
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(err) => {
                tracing::debug!("Skipping season/episode pattern {}: {}", pattern, err);
                continue;
            }
        };

        let matches = files
            .iter()
            .filter(|f| is_video(&f.path) && re.is_match(&f.path));

        if let Some(file) = largest(matches) {
            tracing::debug!("Pattern {} selected {}", pattern, file.path);
            return Some(file.id);
        }
    }

    None
}

/// Select the largest video file
pub fn select_largest(files: &[TorrentFileStat]) -> Option<usize> {
    largest(files.iter().filter(|f| is_video(&f.path))).map(|f| f.id)
}

/// Largest file; the earliest one wins a tie
fn largest<'a>(files: impl Iterator<Item = &'a TorrentFileStat>) -> Option<&'a TorrentFileStat> {
    files.fold(None, |best: Option<&TorrentFileStat>, file| match best {
        Some(best) if best.length >= file.length => Some(best),
        _ => Some(file),
    })
}
