use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::capture::{AlignmentConfig, CaptureConfig};
use crate::measure::{BodyPreset, DepthRatioSet, MeasurementEngine};

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub alignment: AlignmentConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// 肩幅 → 胸幅の比例係数
    #[serde(default = "default_alpha_shoulder")]
    pub alpha_shoulder: f32,
    /// 基準奥行きに対する腕長の寄与
    #[serde(default = "default_alpha_arm")]
    pub alpha_arm: f32,
    /// 基準奥行きに対する胴長の寄与
    #[serde(default = "default_alpha_torso")]
    pub alpha_torso: f32,
    /// 輪郭由来の推定に与える固定信頼度
    #[serde(default = "default_contour_confidence")]
    pub contour_confidence: f32,
    /// 体型プリセット名 (e.g. "average", "athletic")
    #[serde(default = "default_body_preset")]
    pub body_preset: String,
    /// キャリブレーションプロファイルの保存先パス
    #[serde(default = "default_calibration_path")]
    pub calibration_path: String,
}

fn default_alpha_shoulder() -> f32 { 0.5 }
fn default_alpha_arm() -> f32 { 0.15 }
fn default_alpha_torso() -> f32 { 0.25 }
fn default_contour_confidence() -> f32 { 0.8 }
fn default_body_preset() -> String { "average".to_string() }
fn default_calibration_path() -> String { "user_calibration.json".to_string() }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alpha_shoulder: default_alpha_shoulder(),
            alpha_arm: default_alpha_arm(),
            alpha_torso: default_alpha_torso(),
            contour_confidence: default_contour_confidence(),
            body_preset: default_body_preset(),
            calibration_path: default_calibration_path(),
        }
    }
}

impl EngineConfig {
    pub fn build_engine(&self) -> MeasurementEngine {
        MeasurementEngine::new(
            self.alpha_shoulder,
            self.alpha_arm,
            self.alpha_torso,
            self.contour_confidence,
        )
    }

    /// プリセット名から奥行き比を引く（不明な名前は average）
    pub fn depth_ratios(&self) -> DepthRatioSet {
        match BodyPreset::from_name(&self.body_preset) {
            Some(preset) => preset.ratios(),
            None => {
                warn!("unknown body preset '{}', using average", self.body_preset);
                DepthRatioSet::default()
            }
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("config not loaded, using defaults: {e}");
                Self::default()
            }
        }
    }
}
