//! Mood → playlist mapping.

use crate::types::AnalysisRecord;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Playlist used when the dominant emotion has no usable mapping entry.
pub const DEFAULT_PLAYLIST_URL: &str = "https://soundcloud.com/search?q=default playlist";

/// Emotion assumed when a record carries no dominant emotion.
pub const DEFAULT_EMOTION: &str = "neutral";

/// Mapping file looked up when none is configured.
pub const DEFAULT_MAPPING_FILE: &str = "mood_playlist_mapping_soundcloud.json";

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("playlist mapping {} not found, check the path", .0.display())]
    NotFound(PathBuf),
    #[error("playlist mapping {} is not valid JSON: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot read playlist mapping {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Emotion label → playlist URL, with a fallback for everything unmapped.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistMapping {
    playlists: HashMap<String, String>,
    fallback: String,
}

impl Default for PlaylistMapping {
    fn default() -> Self {
        Self {
            playlists: HashMap::new(),
            fallback: DEFAULT_PLAYLIST_URL.to_string(),
        }
    }
}

impl PlaylistMapping {
    pub fn new(playlists: HashMap<String, String>) -> Self {
        Self { playlists, ..Default::default() }
    }

    /// Read a flat JSON object of emotion labels to URLs.
    ///
    /// Entries whose value is not a non-empty string are skipped; the rest of
    /// the file still loads.
    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                MappingError::NotFound(path.to_path_buf())
            } else {
                MappingError::Io { path: path.to_path_buf(), source }
            }
        })?;
        let entries: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&text)
            .map_err(|source| MappingError::Malformed { path: path.to_path_buf(), source })?;

        let mut playlists = HashMap::with_capacity(entries.len());
        for (emotion, value) in entries {
            match value {
                serde_json::Value::String(url) if !url.is_empty() => {
                    playlists.insert(emotion, url);
                }
                other => {
                    tracing::warn!(
                        path = %path.display(),
                        %emotion,
                        value = %other,
                        "skipping unusable playlist entry"
                    );
                }
            }
        }

        tracing::debug!(path = %path.display(), entries = playlists.len(), "playlist mapping loaded");
        Ok(Self::new(playlists))
    }

    /// Replace the fallback URL. An empty URL is ignored so lookups always
    /// produce a link.
    pub fn with_fallback(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if url.is_empty() {
            tracing::warn!("ignoring empty fallback playlist URL");
        } else {
            self.fallback = url;
        }
        self
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// The mapped URL for `emotion`, if present and non-empty.
    pub fn get(&self, emotion: &str) -> Option<&str> {
        self.playlists
            .get(emotion)
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }
}

/// Load a mapping, falling back to an empty one if the file is missing or
/// broken. The reason is written to `out`.
///
/// Only a failure to write to `out` is returned.
pub fn load_mapping<W: Write>(path: &Path, out: &mut W) -> io::Result<PlaylistMapping> {
    match PlaylistMapping::load(path) {
        Ok(mapping) => Ok(mapping),
        Err(err) => {
            tracing::warn!(error = %err, "using empty playlist mapping");
            writeln!(out, "[!] {err}")?;
            Ok(PlaylistMapping::default())
        }
    }
}

/// Dominant emotion of `record`, or [`DEFAULT_EMOTION`].
pub fn extract_dominant_emotion(record: &AnalysisRecord) -> &str {
    record.dominant_emotion.as_deref().unwrap_or(DEFAULT_EMOTION)
}

/// Playlist for `emotion`. Exact, case-sensitive match; never empty.
pub fn find_playlist<'a>(emotion: &str, mapping: &'a PlaylistMapping) -> &'a str {
    match mapping.get(emotion) {
        Some(url) => url,
        None => {
            tracing::debug!(emotion, "no playlist mapped, using fallback");
            mapping.fallback()
        }
    }
}

/// Playlist for the dominant emotion of `record`.
pub fn playlist_for<'a>(record: &AnalysisRecord, mapping: &'a PlaylistMapping) -> &'a str {
    find_playlist(extract_dominant_emotion(record), mapping)
}
