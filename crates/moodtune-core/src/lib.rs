//! moodtune-core — Face attribute analysis and mood-to-playlist mapping.
//!
//! Analyzes a face image (SCRFD detection plus emotion, age, gender and race
//! heads via ONNX Runtime, or an external analysis command), then resolves the
//! dominant emotion to a playlist link.

pub mod analyzer;
pub mod attributes;
pub mod command;
pub mod detector;
pub mod mood;
pub mod onnx;
pub mod pipeline;
pub mod report;
pub mod types;

use std::path::PathBuf;

pub use analyzer::{analyze, normalize, AnalyzerError, FaceAnalyzer};
pub use command::CommandAnalyzer;
pub use mood::{
    extract_dominant_emotion, find_playlist, load_mapping, playlist_for, MappingError,
    PlaylistMapping, DEFAULT_PLAYLIST_URL,
};
pub use onnx::OnnxAnalyzer;
pub use pipeline::{run, RunOutcome, RunSettings};
pub use report::{persist, report, PersistError};
pub use types::{Action, AnalysisOutput, AnalysisRecord, FaceRegion, Gender, Scores};

/// Default ONNX model directory: `$XDG_DATA_HOME/moodtune/models`, falling
/// back to `$HOME/.local/share/moodtune/models`.
pub fn default_model_dir() -> PathBuf {
    let data_dir = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        });
    data_dir.join("moodtune").join("models")
}
