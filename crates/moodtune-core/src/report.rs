//! Persisting and printing analysis records.

use crate::types::{AnalysisRecord, Scores};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File the analysis record is written to when none is configured.
pub const DEFAULT_OUTPUT_FILE: &str = "face_analyse.json";

const INDENT: &[u8] = b"    ";

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot serialize analysis record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Write `record` to `path` as 4-space indented UTF-8 JSON, replacing any
/// existing file. Non-ASCII text is written as-is.
pub fn persist(record: &AnalysisRecord, path: &Path) -> Result<(), PersistError> {
    let io_err = |source| PersistError::Io { path: path.to_path_buf(), source };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    record
        .serialize(&mut serializer)
        .map_err(|err| serialize_error(path, err))?;
    writer.flush().map_err(io_err)?;

    tracing::debug!(path = %path.display(), "analysis record saved");
    Ok(())
}

/// Write failures surface from the serializer as `serde_json::Error`; keep
/// them classified as I/O.
fn serialize_error(path: &Path, err: serde_json::Error) -> PersistError {
    if err.is_io() {
        PersistError::Io { path: path.to_path_buf(), source: err.into() }
    } else {
        PersistError::Serialize(err)
    }
}

/// Percentage rounded to two decimals, printed in its shortest form but
/// always with a fractional digit (`71.23`, `0.5`, `10.0`).
///
/// Exact ties round to even, so `0.125` becomes `0.12`.
fn format_percentage(value: f64) -> String {
    let rounded: f64 = format!("{value:.2}").parse().unwrap_or(value);
    if rounded.is_finite() && rounded.fract() == 0.0 {
        format!("{rounded:.1}")
    } else {
        rounded.to_string()
    }
}

fn write_scores<W: Write>(out: &mut W, heading: &str, scores: Option<&Scores>) -> io::Result<()> {
    writeln!(out, "[+] {heading}:")?;
    for (label, pct) in scores.into_iter().flat_map(Scores::iter) {
        writeln!(out, "{label} - {}%", format_percentage(pct))?;
    }
    Ok(())
}

/// Print the human-readable summary: age, gender, race and emotion
/// percentages, in record order.
pub fn report<W: Write>(record: &AnalysisRecord, out: &mut W) -> io::Result<()> {
    match &record.age {
        Some(age) => writeln!(out, "[+] Age: {age}")?,
        None => writeln!(out, "[+] Age: unknown")?,
    }
    writeln!(out, "[+] Gender: {}", record.gender_label().unwrap_or("unknown"))?;
    write_scores(out, "Race", record.race.as_ref())?;
    write_scores(out, "Emotions", record.emotion.as_ref())?;
    Ok(())
}
