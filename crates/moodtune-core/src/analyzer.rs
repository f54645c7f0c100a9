//! Face analysis boundary.
//!
//! A [`FaceAnalyzer`] turns an image path into one record per detected face.
//! Everything downstream works on a single normalized [`AnalysisRecord`].

use crate::attributes::AttributeError;
use crate::detector::DetectorError;
use crate::types::{Action, AnalysisOutput, AnalysisRecord};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("image not found: {}", .0.display())]
    ImageNotFound(PathBuf),
    #[error("cannot decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("no face detected in the image")]
    NoFaceDetected,
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("attribute model error: {0}")]
    Attribute(#[from] AttributeError),
    #[error("analysis command failed ({status}): {stderr}")]
    CommandFailed { status: String, stderr: String },
    #[error("analysis output is not a valid record: {0}")]
    InvalidOutput(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Estimates face attributes for an image.
pub trait FaceAnalyzer {
    /// Analyze `image_path`, computing only the requested `actions`.
    ///
    /// Blocks until the analysis is complete.
    fn analyze(&mut self, image_path: &Path, actions: &[Action])
        -> Result<AnalysisOutput, AnalyzerError>;
}

/// Collapse an analyzer result into a single record.
///
/// A sequence yields its first element, a single record is returned unchanged.
/// An empty sequence means no face was found.
pub fn normalize(output: AnalysisOutput) -> Result<AnalysisRecord, AnalyzerError> {
    match output {
        AnalysisOutput::Single(record) => Ok(record),
        AnalysisOutput::Many(records) => {
            records.into_iter().next().ok_or(AnalyzerError::NoFaceDetected)
        }
    }
}

/// Run `analyzer` on `image_path` for every attribute and normalize the result.
pub fn analyze<A: FaceAnalyzer + ?Sized>(
    analyzer: &mut A,
    image_path: &Path,
) -> Result<AnalysisRecord, AnalyzerError> {
    let started = Instant::now();
    let output = analyzer.analyze(image_path, &Action::ALL)?;
    let faces = match &output {
        AnalysisOutput::Single(_) => 1,
        AnalysisOutput::Many(records) => records.len(),
    };
    let record = normalize(output)?;
    tracing::info!(
        path = %image_path.display(),
        faces,
        elapsed_ms = started.elapsed().as_millis() as u64,
        dominant_emotion = record.dominant_emotion.as_deref().unwrap_or("-"),
        "analysis complete"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> AnalysisRecord {
        serde_json::from_value(value).unwrap()
    }

    struct FixedAnalyzer {
        output: Option<AnalysisOutput>,
        requested: Vec<Action>,
    }

    impl FaceAnalyzer for FixedAnalyzer {
        fn analyze(
            &mut self,
            _image_path: &Path,
            actions: &[Action],
        ) -> Result<AnalysisOutput, AnalyzerError> {
            self.requested = actions.to_vec();
            self.output.take().ok_or(AnalyzerError::NoFaceDetected)
        }
    }

    #[test]
    fn test_normalize_takes_first_of_sequence() {
        let output = AnalysisOutput::Many(vec![
            record(json!({"age": 25, "gender": "Man"})),
            record(json!({"age": 60, "gender": "Woman"})),
        ]);
        let normalized = normalize(output).unwrap();
        assert_eq!(normalized, record(json!({"age": 25, "gender": "Man"})));
    }

    #[test]
    fn test_normalize_single_is_identity() {
        let single = record(json!({"age": 30, "gender": "Woman"}));
        let normalized = normalize(AnalysisOutput::Single(single.clone())).unwrap();
        assert_eq!(normalized, single);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize(AnalysisOutput::Many(vec![record(json!({"age": 25}))])).unwrap();
        let twice = normalize(AnalysisOutput::Single(once.clone())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_empty_sequence() {
        let err = normalize(AnalysisOutput::Many(Vec::new())).unwrap_err();
        assert!(matches!(err, AnalyzerError::NoFaceDetected));
    }

    #[test]
    fn test_analyze_requests_all_actions() {
        let mut analyzer = FixedAnalyzer {
            output: Some(AnalysisOutput::Single(record(json!({"dominant_emotion": "happy"})))),
            requested: Vec::new(),
        };
        let result = analyze(&mut analyzer, Path::new("face.jpg")).unwrap();
        assert_eq!(result.dominant_emotion.as_deref(), Some("happy"));
        assert_eq!(analyzer.requested, Action::ALL);
    }

    #[test]
    fn test_analyze_propagates_failure() {
        let mut analyzer = FixedAnalyzer { output: None, requested: Vec::new() };
        assert!(analyze(&mut analyzer, Path::new("face.jpg")).is_err());
    }
}
