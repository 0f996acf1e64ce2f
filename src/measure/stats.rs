//! Outlier rejection and temporal smoothing over repeated measurements.

use std::collections::{BTreeMap, VecDeque};

use super::record::MeasurementSet;

/// Z-score outlier removal with population standard deviation.
///
/// Fewer than 3 samples, zero spread, or a filter that would reject
/// everything all return the input unchanged.
pub fn remove_outliers(values: &[f32], threshold: f32) -> Vec<f32> {
    if values.len() < 3 {
        return values.to_vec();
    }

    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
    let std = variance.sqrt();

    if std == 0.0 {
        return values.to_vec();
    }

    let kept: Vec<f32> = values
        .iter()
        .copied()
        .filter(|v| ((v - mean) / std).abs() < threshold)
        .collect();

    if kept.is_empty() {
        values.to_vec()
    } else {
        kept
    }
}

/// Aggregate repeated sessions into per-measurement (mean, std).
///
/// With 3+ sessions each measurement's samples go through outlier
/// removal first. Measurements absent from some sessions aggregate
/// over the sessions that have them.
pub fn average_sessions(sessions: &[MeasurementSet]) -> BTreeMap<String, (f32, f32)> {
    let mut samples: BTreeMap<&str, Vec<f32>> = BTreeMap::new();
    for session in sessions {
        for (name, m) in session {
            samples.entry(name).or_default().push(m.value_cm);
        }
    }

    let mut out = BTreeMap::new();
    for (name, values) in samples {
        let values = if sessions.len() >= 3 {
            remove_outliers(&values, 2.0)
        } else {
            values
        };
        let n = values.len() as f32;
        let mean = values.iter().sum::<f32>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
        out.insert(name.to_string(), (mean, variance.sqrt()));
    }
    out
}

/// EMA against the mean of recent history (last 5 at most).
pub fn smooth(current: f32, history: &[f32], alpha: f32) -> f32 {
    if history.is_empty() {
        return current;
    }
    let recent = &history[history.len().saturating_sub(5)..];
    let mean = recent.iter().sum::<f32>() / recent.len() as f32;
    alpha * current + (1.0 - alpha) * mean
}

/// Per-measurement temporal smoother for live streams.
///
/// Keeps a sliding window per measurement name and blends each new
/// value against the window mean.
pub struct TemporalSmoother {
    alpha: f32,
    window: usize,
    history: BTreeMap<String, VecDeque<f32>>,
}

impl TemporalSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            window: 5,
            history: BTreeMap::new(),
        }
    }

    pub fn apply(&mut self, name: &str, value: f32) -> f32 {
        let window = self.window;
        let entry = self.history.entry(name.to_string()).or_default();

        let smoothed = if entry.is_empty() {
            value
        } else {
            let mean = entry.iter().sum::<f32>() / entry.len() as f32;
            self.alpha * value + (1.0 - self.alpha) * mean
        };

        entry.push_back(smoothed);
        while entry.len() > window {
            entry.pop_front();
        }
        smoothed
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
