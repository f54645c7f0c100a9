//! One analysis run: analyze → persist → report → playlist lookup.
//!
//! Every step failure is written to the user-facing output and handled
//! locally; nothing is returned as an error except failures to write the
//! user-facing output itself.

use crate::analyzer::{analyze, AnalyzerError, FaceAnalyzer};
use crate::mood::{
    extract_dominant_emotion, find_playlist, load_mapping, DEFAULT_MAPPING_FILE,
    DEFAULT_PLAYLIST_URL,
};
use crate::report::{self, DEFAULT_OUTPUT_FILE};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File locations and fallbacks for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub mapping_path: PathBuf,
    pub output_path: PathBuf,
    pub default_playlist: String,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            mapping_path: PathBuf::from(DEFAULT_MAPPING_FILE),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            default_playlist: DEFAULT_PLAYLIST_URL.to_string(),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Analysis failed; nothing was written or looked up.
    AnalysisFailed,
    Completed {
        /// Whether the record reached the output file.
        persisted: bool,
        emotion: String,
        playlist: String,
    },
}

fn describe_analysis_error(err: &AnalyzerError) -> String {
    match err {
        AnalyzerError::ImageNotFound(path) => format!("[!] Error: file not found - {}", path.display()),
        other => format!("[!] An error occurred: {other}"),
    }
}

/// Run the whole analysis for `image_path`, writing user-facing text to `out`.
pub fn run<A, W>(
    analyzer: &mut A,
    image_path: &Path,
    settings: &RunSettings,
    out: &mut W,
) -> io::Result<RunOutcome>
where
    A: FaceAnalyzer + ?Sized,
    W: Write,
{
    let record = match analyze(analyzer, image_path) {
        Ok(record) => record,
        Err(err) => {
            tracing::error!(error = %err, path = %image_path.display(), "analysis failed");
            writeln!(out, "{}", describe_analysis_error(&err))?;
            return Ok(RunOutcome::AnalysisFailed);
        }
    };

    let persisted = match report::persist(&record, &settings.output_path) {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(error = %err, "failed to save analysis record");
            writeln!(out, "[!] Error saving file: {err}")?;
            false
        }
    };

    report::report(&record, out)?;

    let mapping = load_mapping(&settings.mapping_path, out)?
        .with_fallback(settings.default_playlist.as_str());

    let emotion = extract_dominant_emotion(&record);
    let playlist = find_playlist(emotion, &mapping);
    writeln!(out, "Playlist link for the current emotion ({emotion}): {playlist}")?;

    Ok(RunOutcome::Completed {
        persisted,
        emotion: emotion.to_string(),
        playlist: playlist.to_string(),
    })
}
