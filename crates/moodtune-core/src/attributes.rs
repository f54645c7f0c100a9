//! Attribute classifier heads via ONNX Runtime.
//!
//! Each head maps a face crop to a probability vector: facial expression,
//! apparent age (101 bins), gender and race. Inputs are NHWC float tensors
//! scaled to [0, 1].

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

pub const EMOTION_LABELS: [&str; 7] = ["angry", "disgust", "fear", "happy", "sad", "surprise", "neutral"];
pub const GENDER_LABELS: [&str; 2] = ["Woman", "Man"];
pub const RACE_LABELS: [&str; 6] = ["asian", "indian", "black", "white", "middle eastern", "latino hispanic"];
const AGE_BINS: usize = 101;

#[derive(Error, Debug)]
pub enum AttributeError {
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("{head}: expected {expected} outputs, got {actual}")]
    OutputSize { head: &'static str, expected: usize, actual: usize },
    #[error("{0}: model produced no usable probabilities")]
    Degenerate(&'static str),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Gray,
    Rgb,
}

/// Input geometry and output arity of one head.
#[derive(Debug, Clone, Copy)]
pub struct HeadSpec {
    pub name: &'static str,
    pub file_name: &'static str,
    pub input_size: u32,
    pub color: ColorMode,
    pub outputs: usize,
}

impl HeadSpec {
    pub const EMOTION: HeadSpec = HeadSpec {
        name: "emotion",
        file_name: "facial_expression.onnx",
        input_size: 48,
        color: ColorMode::Gray,
        outputs: EMOTION_LABELS.len(),
    };
    pub const AGE: HeadSpec = HeadSpec {
        name: "age",
        file_name: "age.onnx",
        input_size: 224,
        color: ColorMode::Rgb,
        outputs: AGE_BINS,
    };
    pub const GENDER: HeadSpec = HeadSpec {
        name: "gender",
        file_name: "gender.onnx",
        input_size: 224,
        color: ColorMode::Rgb,
        outputs: GENDER_LABELS.len(),
    };
    pub const RACE: HeadSpec = HeadSpec {
        name: "race",
        file_name: "race.onnx",
        input_size: 224,
        color: ColorMode::Rgb,
        outputs: RACE_LABELS.len(),
    };

    /// Resize a face crop and pack it into a 1×H×W×C tensor in [0, 1].
    pub fn preprocess(&self, face: &RgbImage) -> Array4<f32> {
        let size = self.input_size;
        let resized = imageops::resize(face, size, size, FilterType::Triangle);
        let size = size as usize;

        match self.color {
            ColorMode::Gray => {
                let gray = DynamicImage::ImageRgb8(resized).into_luma8();
                let mut tensor = Array4::<f32>::zeros((1, size, size, 1));
                for (x, y, pixel) in gray.enumerate_pixels() {
                    tensor[[0, y as usize, x as usize, 0]] = pixel[0] as f32 / 255.0;
                }
                tensor
            }
            ColorMode::Rgb => {
                let mut tensor = Array4::<f32>::zeros((1, size, size, 3));
                for (x, y, pixel) in resized.enumerate_pixels() {
                    for c in 0..3 {
                        tensor[[0, y as usize, x as usize, c]] = pixel[c] as f32 / 255.0;
                    }
                }
                tensor
            }
        }
    }
}

/// A loaded attribute classifier.
pub struct AttributeHead {
    spec: HeadSpec,
    session: Session,
}

impl AttributeHead {
    pub fn load(spec: HeadSpec, model_dir: &Path) -> Result<Self, AttributeError> {
        let model_path = model_dir.join(spec.file_name);
        if !model_path.exists() {
            return Err(AttributeError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(&model_path)?;

        tracing::info!(
            head = spec.name,
            path = %model_path.display(),
            inputs = ?session.inputs().iter().map(|i| i.name()).collect::<Vec<_>>(),
            "loaded attribute model"
        );

        Ok(Self { spec, session })
    }

    pub fn spec(&self) -> &HeadSpec {
        &self.spec
    }

    /// Run the head on a face crop and return its raw probabilities.
    pub fn predict(&mut self, face: &RgbImage) -> Result<Vec<f32>, AttributeError> {
        let input = self.spec.preprocess(face);
        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| AttributeError::InferenceFailed(format!("{}: {e}", self.spec.name)))?;

        if data.len() != self.spec.outputs {
            return Err(AttributeError::OutputSize {
                head: self.spec.name,
                expected: self.spec.outputs,
                actual: data.len(),
            });
        }
        Ok(data.to_vec())
    }
}

/// Rescale probabilities so they sum to 100.
pub fn to_percentages(head: &'static str, probs: &[f32]) -> Result<Vec<f64>, AttributeError> {
    let total: f64 = probs.iter().map(|&p| f64::from(p.max(0.0))).sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(AttributeError::Degenerate(head));
    }
    Ok(probs.iter().map(|&p| 100.0 * f64::from(p.max(0.0)) / total).collect())
}

/// Expected value over the age bins, truncated to whole years.
pub fn apparent_age(probs: &[f32]) -> Result<u32, AttributeError> {
    let weights = to_percentages("age", probs)?;
    let age: f64 = weights.iter().enumerate().map(|(bin, w)| bin as f64 * w / 100.0).sum();
    Ok(age as u32)
}
