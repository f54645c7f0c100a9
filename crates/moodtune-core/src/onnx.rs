//! In-process analyzer: SCRFD detection followed by the attribute heads.

use crate::analyzer::{AnalyzerError, FaceAnalyzer};
use crate::attributes::{
    apparent_age, to_percentages, AttributeError, AttributeHead, HeadSpec, EMOTION_LABELS,
    GENDER_LABELS, RACE_LABELS,
};
use crate::detector::FaceDetector;
use crate::types::{Action, AnalysisOutput, AnalysisRecord, Gender, Scores};
use image::imageops;
use image::RgbImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DETECTOR_MODEL_FILE: &str = "det_10g.onnx";

fn head_spec(action: Action) -> HeadSpec {
    match action {
        Action::Emotion => HeadSpec::EMOTION,
        Action::Age => HeadSpec::AGE,
        Action::Gender => HeadSpec::GENDER,
        Action::Race => HeadSpec::RACE,
    }
}

fn label_scores(labels: &[&str], percentages: &[f64]) -> Scores {
    labels.iter().copied().zip(percentages.iter().copied()).collect()
}

/// ONNX Runtime face analyzer.
///
/// Models are loaded from `model_dir` the first time they are needed, so only
/// the heads for requested actions have to be present.
pub struct OnnxAnalyzer {
    model_dir: PathBuf,
    detector: Option<FaceDetector>,
    heads: HashMap<Action, AttributeHead>,
}

impl OnnxAnalyzer {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            detector: None,
            heads: HashMap::new(),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    fn detector(&mut self) -> Result<&mut FaceDetector, AnalyzerError> {
        let detector = match self.detector.take() {
            Some(detector) => detector,
            None => FaceDetector::load(&self.model_dir.join(DETECTOR_MODEL_FILE))?,
        };
        Ok(self.detector.insert(detector))
    }

    fn head(&mut self, action: Action) -> Result<&mut AttributeHead, AttributeError> {
        let head = match self.heads.remove(&action) {
            Some(head) => head,
            None => AttributeHead::load(head_spec(action), &self.model_dir)?,
        };
        Ok(self.heads.entry(action).or_insert(head))
    }

    fn estimate(
        &mut self,
        action: Action,
        face: &RgbImage,
        record: &mut AnalysisRecord,
    ) -> Result<(), AnalyzerError> {
        let probs = self.head(action)?.predict(face)?;
        match action {
            Action::Emotion => {
                let scores = label_scores(&EMOTION_LABELS, &to_percentages("emotion", &probs)?);
                record.dominant_emotion = scores.dominant().map(str::to_owned);
                record.emotion = Some(scores);
            }
            Action::Age => {
                record.age = Some(apparent_age(&probs)?.into());
            }
            Action::Gender => {
                let scores = label_scores(&GENDER_LABELS, &to_percentages("gender", &probs)?);
                record.gender = scores.dominant().map(|label| Gender::Label(label.to_owned()));
            }
            Action::Race => {
                let scores = label_scores(&RACE_LABELS, &to_percentages("race", &probs)?);
                record.dominant_race = scores.dominant().map(str::to_owned);
                record.race = Some(scores);
            }
        }
        Ok(())
    }
}

impl FaceAnalyzer for OnnxAnalyzer {
    fn analyze(
        &mut self,
        image_path: &Path,
        actions: &[Action],
    ) -> Result<AnalysisOutput, AnalyzerError> {
        if !image_path.exists() {
            return Err(AnalyzerError::ImageNotFound(image_path.to_path_buf()));
        }
        let image = image::open(image_path)?.into_rgb8();
        let (width, height) = image.dimensions();

        let faces = self.detector()?.detect(&image)?;
        tracing::debug!(path = %image_path.display(), width, height, faces = faces.len(), "faces detected");

        let mut records = Vec::with_capacity(faces.len());
        for face in &faces {
            let region = face.to_region(width, height);
            if region.w == 0 || region.h == 0 {
                tracing::debug!(?region, "skipping face outside the image");
                continue;
            }
            let crop = imageops::crop_imm(&image, region.x, region.y, region.w, region.h).to_image();

            let mut record = AnalysisRecord {
                region: Some(region),
                face_confidence: Some(face.confidence),
                ..Default::default()
            };
            for &action in actions {
                self.estimate(action, &crop, &mut record)?;
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(AnalyzerError::NoFaceDetected);
        }
        Ok(AnalysisOutput::Many(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_image_is_reported_before_models() {
        let dir = tempfile::tempdir().unwrap();
        let mut analyzer = OnnxAnalyzer::new(dir.path());
        let missing = dir.path().join("nope.jpg");
        let err = analyzer.analyze(&missing, &Action::ALL).unwrap_err();
        assert!(matches!(err, AnalyzerError::ImageNotFound(ref p) if *p == missing));
    }

    #[test]
    fn test_undecodable_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        std::fs::write(&path, b"not an image").unwrap();
        let err = OnnxAnalyzer::new(dir.path()).analyze(&path, &Action::ALL).unwrap_err();
        assert!(matches!(err, AnalyzerError::ImageDecode(_)));
    }

    #[test]
    fn test_missing_detector_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        RgbImage::from_pixel(32, 32, image::Rgb([90, 80, 70])).save(&path).unwrap();
        let err = OnnxAnalyzer::new(dir.path()).analyze(&path, &Action::ALL).unwrap_err();
        assert!(matches!(err, AnalyzerError::Detector(_)), "got {err}");
    }

    #[test]
    fn test_label_scores_pairs_in_order() {
        let scores = label_scores(&GENDER_LABELS, &[30.0, 70.0]);
        let pairs: Vec<(&str, f64)> = scores.iter().collect();
        assert_eq!(pairs, [("Woman", 30.0), ("Man", 70.0)]);
        assert_eq!(scores.dominant(), Some("Man"));
    }

    #[test]
    fn test_head_specs_per_action() {
        assert_eq!(head_spec(Action::Emotion).file_name, "facial_expression.onnx");
        assert_eq!(head_spec(Action::Age).file_name, "age.onnx");
        assert_eq!(head_spec(Action::Gender).file_name, "gender.onnx");
        assert_eq!(head_spec(Action::Race).file_name, "race.onnx");
    }
}
