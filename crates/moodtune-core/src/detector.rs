//! SCRFD face detector via ONNX Runtime.
//!
//! Finds faces in an RGB image so the attribute heads can work on tight crops.
//! Anchor-free decoding over three strides followed by greedy NMS.

use crate::types::FaceRegion;
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const SCRFD_INPUT_SIZE: u32 = 640;
const SCRFD_MEAN: f32 = 127.5;
const SCRFD_STD: f32 = 128.0;
const SCRFD_CONFIDENCE_THRESHOLD: f32 = 0.5;
const SCRFD_NMS_THRESHOLD: f32 = 0.4;
const SCRFD_STRIDES: [usize; 3] = [8, 16, 32];
const SCRFD_ANCHORS_PER_CELL: usize = 2;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} — download det_10g.onnx from insightface into the model directory")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("image has no pixels ({0}x{1})")]
    EmptyImage(u32, u32),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// A detected face in source image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five points in image order: eye, eye, nose, mouth corner, mouth corner.
    /// The first eye is the one nearer the left edge of the image.
    pub landmarks: Option<[(f32, f32); 5]>,
}

impl FaceBox {
    fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection-over-Union with another box.
    pub fn iou(&self, other: &FaceBox) -> f32 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        let inter = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.area() + other.area() - inter;
        if union > 0.0 { inter / union } else { 0.0 }
    }

    /// Integer region clamped to an image of `width` × `height` pixels.
    ///
    /// Eyes are named from the subject's point of view, so `left_eye` is the
    /// landmark nearer the right edge of the image.
    pub fn to_region(&self, width: u32, height: u32) -> FaceRegion {
        let clamp_x = |v: f32| v.round().clamp(0.0, width as f32) as u32;
        let clamp_y = |v: f32| v.round().clamp(0.0, height as f32) as u32;

        let x = clamp_x(self.x);
        let y = clamp_y(self.y);
        let w = clamp_x(self.x + self.width).saturating_sub(x);
        let h = clamp_y(self.y + self.height).saturating_sub(y);

        let point = |(px, py): (f32, f32)| (clamp_x(px), clamp_y(py));
        FaceRegion {
            x,
            y,
            w,
            h,
            left_eye: self.landmarks.map(|lms| point(lms[1])),
            right_eye: self.landmarks.map(|lms| point(lms[0])),
        }
    }
}

/// Scale and padding applied when fitting the image into the square input.
#[derive(Debug, Clone, Copy)]
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

impl Letterbox {
    fn fit(width: u32, height: u32) -> (Self, u32, u32) {
        let size = SCRFD_INPUT_SIZE as f32;
        let scale = (size / width as f32).min(size / height as f32);
        let new_w = ((width as f32 * scale).round() as u32).clamp(1, SCRFD_INPUT_SIZE);
        let new_h = ((height as f32 * scale).round() as u32).clamp(1, SCRFD_INPUT_SIZE);
        let letterbox = Letterbox {
            scale,
            pad_x: ((SCRFD_INPUT_SIZE - new_w) / 2) as f32,
            pad_y: ((SCRFD_INPUT_SIZE - new_h) / 2) as f32,
        };
        (letterbox, new_w, new_h)
    }

    /// Map a point from network input space back to the source image.
    fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Output tensor indices for one stride: (score, bbox, kps).
type StrideOutputIndices = (usize, usize, usize);

/// SCRFD-based face detector.
pub struct FaceDetector {
    session: Session,
    stride_indices: [StrideOutputIndices; 3],
}

impl FaceDetector {
    /// Load the SCRFD ONNX model from the given path.
    pub fn load(model_path: &Path) -> Result<Self, DetectorError> {
        if !model_path.exists() {
            return Err(DetectorError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> =
            session.outputs().iter().map(|o| o.name().to_string()).collect();
        if output_names.len() < 9 {
            return Err(DetectorError::InferenceFailed(format!(
                "SCRFD model requires 9 outputs (3 strides × score/bbox/kps), got {}",
                output_names.len()
            )));
        }

        let stride_indices = discover_output_indices(&output_names);
        tracing::info!(
            path = %model_path.display(),
            outputs = ?output_names,
            ?stride_indices,
            "loaded SCRFD model"
        );

        Ok(Self { session, stride_indices })
    }

    /// Detect faces, most confident first.
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<FaceBox>, DetectorError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectorError::EmptyImage(width, height));
        }

        let (input, letterbox) = preprocess(image);
        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut candidates = Vec::new();
        for (&stride, &(score_idx, bbox_idx, kps_idx)) in
            SCRFD_STRIDES.iter().zip(self.stride_indices.iter())
        {
            let extract = |idx: usize, what: &str| {
                outputs[idx]
                    .try_extract_tensor::<f32>()
                    .map(|(_, data)| data)
                    .map_err(|e| DetectorError::InferenceFailed(format!("{what} stride {stride}: {e}")))
            };
            let head = StrideOutputs {
                stride,
                scores: extract(score_idx, "scores")?,
                boxes: extract(bbox_idx, "bboxes")?,
                landmarks: extract(kps_idx, "kps")?,
            };
            candidates.extend(head.decode(&letterbox, SCRFD_CONFIDENCE_THRESHOLD));
        }

        let faces = nms(candidates, SCRFD_NMS_THRESHOLD);
        tracing::debug!(faces = faces.len(), "SCRFD detection done");
        Ok(faces)
    }
}

/// Letterbox an RGB image into a 1×3×640×640 tensor.
///
/// Padding stays at zero, which is where the mean pixel lands after
/// normalization.
fn preprocess(image: &RgbImage) -> (Array4<f32>, Letterbox) {
    let (letterbox, new_w, new_h) = Letterbox::fit(image.width(), image.height());
    let resized = imageops::resize(image, new_w, new_h, FilterType::Triangle);

    let size = SCRFD_INPUT_SIZE as usize;
    let off_x = letterbox.pad_x as usize;
    let off_y = letterbox.pad_y as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize + off_y, x as usize + off_x]] =
                (pixel[c] as f32 - SCRFD_MEAN) / SCRFD_STD;
        }
    }

    (tensor, letterbox)
}

/// Raw head outputs for one stride level.
struct StrideOutputs<'a> {
    stride: usize,
    scores: &'a [f32],
    boxes: &'a [f32],
    landmarks: &'a [f32],
}

impl StrideOutputs<'_> {
    fn decode(&self, letterbox: &Letterbox, threshold: f32) -> Vec<FaceBox> {
        let grid_w = SCRFD_INPUT_SIZE as usize / self.stride;
        let grid_h = SCRFD_INPUT_SIZE as usize / self.stride;
        let stride = self.stride as f32;

        let mut faces = Vec::new();
        for idx in 0..grid_w * grid_h * SCRFD_ANCHORS_PER_CELL {
            let score = self.scores.get(idx).copied().unwrap_or(0.0);
            if score <= threshold {
                continue;
            }
            let Some(offsets) = self.boxes.get(idx * 4..idx * 4 + 4) else {
                continue;
            };

            let cell = idx / SCRFD_ANCHORS_PER_CELL;
            let anchor_x = (cell % grid_w) as f32 * stride;
            let anchor_y = (cell / grid_w) as f32 * stride;

            let (x1, y1) = letterbox.unmap(anchor_x - offsets[0] * stride, anchor_y - offsets[1] * stride);
            let (x2, y2) = letterbox.unmap(anchor_x + offsets[2] * stride, anchor_y + offsets[3] * stride);

            let landmarks = self.landmarks.get(idx * 10..idx * 10 + 10).map(|kps| {
                std::array::from_fn(|i| {
                    letterbox.unmap(anchor_x + kps[i * 2] * stride, anchor_y + kps[i * 2 + 1] * stride)
                })
            });

            faces.push(FaceBox {
                x: x1,
                y: y1,
                width: x2 - x1,
                height: y2 - y1,
                confidence: score,
                landmarks,
            });
        }
        faces
    }
}

/// Find the score/bbox/kps tensors for each stride.
///
/// Exports either name them `score_8`, `bbox_16`, `kps_32`, ... or use
/// opaque numeric names, in which case the standard positional layout
/// `[scores 8/16/32, bboxes 8/16/32, kps 8/16/32]` applies.
fn discover_output_indices(names: &[String]) -> [StrideOutputIndices; 3] {
    let find = |kind: &str, stride: usize| {
        let target = format!("{kind}_{stride}");
        names.iter().position(|n| *n == target)
    };
    let [s8, s16, s32] = SCRFD_STRIDES
        .map(|stride| Some((find("score", stride)?, find("bbox", stride)?, find("kps", stride)?)));

    if let (Some(s8), Some(s16), Some(s32)) = (s8, s16, s32) {
        [s8, s16, s32]
    } else {
        tracing::debug!(?names, "SCRFD output names not recognized, using positional mapping");
        [(0, 3, 6), (1, 4, 7), (2, 5, 8)]
    }
}

/// Greedy Non-Maximum Suppression, most confident boxes win.
fn nms(mut faces: Vec<FaceBox>, iou_threshold: f32) -> Vec<FaceBox> {
    faces.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<FaceBox> = Vec::with_capacity(faces.len());
    for face in faces {
        if kept.iter().all(|k| k.iou(&face) <= iou_threshold) {
            kept.push(face);
        }
    }
    kept
}
