//! Cat detection for camera frames
//!
//! The decision engine only sees the [`CatClassifier`] trait. The bundled
//! [`HeuristicCatClassifier`] scores simple byte statistics of the frame and
//! stands in for a real vision model.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Image contains no data")]
    EmptyImage,
    #[error("Confidence threshold must be within 0..=100, got {0}")]
    InvalidThreshold(f32),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single camera frame
#[derive(Debug, Clone, Default)]
pub struct CameraImage {
    data: Vec<u8>,
    source: Option<String>,
}

impl CameraImage {
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            source: None,
        }
    }

    /// Load a frame from disk, up to 4MB
    pub fn from_file(path: &Path) -> Result<Self, ClassifierError> {
        use std::fs::File;
        use std::io::Read;

        let file = File::open(path)?;
        let mut data = Vec::new();
        file.take(MAX_IMAGE_BYTES).read_to_end(&mut data)?;

        Ok(Self {
            data,
            source: Some(path.to_string_lossy().to_string()),
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

const MAX_IMAGE_BYTES: u64 = 4 * 1024 * 1024;

/// Image-classification oracle consumed by the decision engine
pub trait CatClassifier: Send + Sync {
    /// Whether the image shows a cat with at least `confidence_threshold`
    /// percent confidence
    fn contains_cat(&self, image: &CameraImage, confidence_threshold: f32) -> Result<bool, ClassifierError>;
}

/// Normalized statistics of a frame, each in 0..=1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageFeatures {
    pub entropy: f32,
    pub unique_bytes: f32,
    pub printable_ratio: f32,
    pub mean: f32,
    pub std_dev: f32,
}

/// Feature extractor for raw frame bytes
#[derive(Debug, Clone)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn extract(data: &[u8]) -> ImageFeatures {
        let len = data.len().max(1) as f32;
        let counts = calculate_byte_frequencies(data);

        let unique_bytes = counts.iter().filter(|&&c| c > 0).count() as f32 / 256.0;
        let printable_ratio = counts[32..127].iter().sum::<u32>() as f32 / len;

        let mean = data.iter().map(|&b| b as f32).sum::<f32>() / len;
        let variance = data
            .iter()
            .map(|&b| (b as f32 - mean).powi(2))
            .sum::<f32>()
            / len;

        ImageFeatures {
            entropy: calculate_entropy(&counts, data.len()),
            unique_bytes,
            printable_ratio,
            mean: mean / 255.0,
            std_dev: (variance.sqrt() / 128.0).clamp(0.0, 1.0),
        }
    }
}

/// Shannon entropy normalized to 0..=1
fn calculate_entropy(counts: &[u32; 256], total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }

    let len = total as f32;
    let mut entropy = 0.0f32;

    for &count in counts {
        if count > 0 {
            let p = count as f32 / len;
            entropy -= p * p.log2();
        }
    }

    entropy / 8.0
}

fn calculate_byte_frequencies(data: &[u8]) -> [u32; 256] {
    let mut counts = [0u32; 256];
    for &byte in data {
        counts[byte as usize] += 1;
    }
    counts
}

/// Classification outcome with the score that produced it
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CatAnalysis {
    /// Confidence in percent, 0..=100
    pub confidence: f32,
    pub features: ImageFeatures,
}

impl CatAnalysis {
    pub fn is_cat(&self, confidence_threshold: f32) -> bool {
        self.confidence >= confidence_threshold
    }
}

/// Deterministic byte-statistics classifier
#[derive(Debug, Clone, Default)]
pub struct HeuristicCatClassifier;

impl HeuristicCatClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Score a frame without applying a threshold
    pub fn analyze(&self, image: &CameraImage) -> Result<CatAnalysis, ClassifierError> {
        if image.is_empty() {
            return Err(ClassifierError::EmptyImage);
        }

        let features = FeatureExtractor::extract(image.data());
        Ok(CatAnalysis {
            confidence: score(&features),
            features,
        })
    }
}

fn score(features: &ImageFeatures) -> f32 {
    let mut confidence = 0.0f32;

    // Photographs sit between flat fills and compressed noise
    if features.entropy > 0.4 && features.entropy < 0.85 {
        confidence += 35.0;
    }

    if features.unique_bytes > 0.25 {
        confidence += 20.0;
    }

    // Mid-tone exposure
    if features.mean > 0.25 && features.mean < 0.75 {
        confidence += 25.0;
    }

    // Fur texture
    if features.std_dev > 0.15 {
        confidence += 20.0;
    }

    confidence.min(100.0)
}

impl CatClassifier for HeuristicCatClassifier {
    fn contains_cat(&self, image: &CameraImage, confidence_threshold: f32) -> Result<bool, ClassifierError> {
        if !(0.0..=100.0).contains(&confidence_threshold) {
            return Err(ClassifierError::InvalidThreshold(confidence_threshold));
        }

        let analysis = self.analyze(image)?;
        tracing::debug!(
            source = image.source().unwrap_or("memory"),
            confidence = analysis.confidence,
            threshold = confidence_threshold,
            "Classified camera frame"
        );
        Ok(analysis.is_cat(confidence_threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ramp_image() -> CameraImage {
        let data: Vec<u8> = (0..1024).map(|i| (i % 256) as u8).collect();
        CameraImage::from_bytes(data)
    }

    #[test]
    fn test_entropy() {
        let flat = FeatureExtractor::extract(&[0u8; 1000]);
        assert!(flat.entropy < 0.1);

        let ramp = FeatureExtractor::extract(ramp_image().data());
        assert!(ramp.entropy > 0.99);
        assert_eq!(ramp.unique_bytes, 1.0);
    }

    #[test]
    fn test_flat_frame_is_not_a_cat() {
        let classifier = HeuristicCatClassifier::new();
        let image = CameraImage::from_bytes(vec![0u8; 512]);
        assert!(!classifier.contains_cat(&image, 50.0).unwrap());
    }

    #[test]
    fn test_textured_frame_is_a_cat() {
        let classifier = HeuristicCatClassifier::new();
        let analysis = classifier.analyze(&ramp_image()).unwrap();
        assert_eq!(analysis.confidence, 65.0);
        assert!(classifier.contains_cat(&ramp_image(), 50.0).unwrap());
        assert!(!classifier.contains_cat(&ramp_image(), 70.0).unwrap());
    }

    #[test]
    fn test_empty_image() {
        let classifier = HeuristicCatClassifier::new();
        assert!(matches!(
            classifier.contains_cat(&CameraImage::default(), 50.0),
            Err(ClassifierError::EmptyImage)
        ));
    }

    #[test]
    fn test_invalid_threshold() {
        let classifier = HeuristicCatClassifier::new();
        assert!(matches!(
            classifier.contains_cat(&ramp_image(), 150.0),
            Err(ClassifierError::InvalidThreshold(_))
        ));
        assert!(classifier.contains_cat(&ramp_image(), f32::NAN).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[7u8; 64]).unwrap();

        let image = CameraImage::from_file(file.path()).unwrap();
        assert_eq!(image.data().len(), 64);
        assert!(image.source().is_some());

        let missing = CameraImage::from_file(Path::new("/nonexistent/frame.raw"));
        assert!(matches!(missing, Err(ClassifierError::Io(_))));
    }
}
