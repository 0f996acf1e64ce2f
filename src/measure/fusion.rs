//! Confidence-weighted fusion of independent circumference estimates.
//!
//! Each estimation method carries a fixed trust reflecting how well it
//! tends to agree with tape measurements. The fused value is a weighted
//! mean with weight = confidence x trust; the fused confidence is the
//! plain mean of the input confidences so that a low-confidence method
//! still drags the reported confidence down.

/// Trust for landmark-derived ellipse estimates.
pub const LANDMARK_TRUST: f32 = 0.6;
/// Trust for silhouette-contour estimates.
pub const CONTOUR_TRUST: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub value: f32,
    pub confidence: f32,
    pub trust: f32,
}

impl Estimate {
    pub fn new(value: f32, confidence: f32, trust: f32) -> Self {
        Self {
            value,
            confidence,
            trust,
        }
    }
}

/// Fuse estimates into (value, confidence).
///
/// Empty input yields None. If every weight is zero the values are
/// averaged unweighted rather than dropped.
pub fn fuse(estimates: &[Estimate]) -> Option<(f32, f32)> {
    if estimates.is_empty() {
        return None;
    }

    let n = estimates.len() as f32;
    let confidence = estimates.iter().map(|e| e.confidence).sum::<f32>() / n;

    let total_weight: f32 = estimates.iter().map(|e| e.confidence * e.trust).sum();
    let value = if total_weight > 0.0 {
        estimates
            .iter()
            .map(|e| e.value * e.confidence * e.trust)
            .sum::<f32>()
            / total_weight
    } else {
        estimates.iter().map(|e| e.value).sum::<f32>() / n
    };

    Some((value, confidence))
}
