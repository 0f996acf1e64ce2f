use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EngineError;
use crate::measure::{DepthRatioSet, MeasurementSet, Source};

/// フィードバック係数の EMA 学習率
pub const FEEDBACK_ALPHA: f32 = 0.3;
/// 履歴の保持上限（古いものから追い出す）
pub const HISTORY_LIMIT: usize = 20;

/// キャリブレーション対象の部位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyRegion {
    Chest,
    Waist,
    Hip,
}

impl BodyRegion {
    pub fn circumference_key(&self) -> &'static str {
        match self {
            Self::Chest => "chest_circumference",
            Self::Waist => "waist_circumference",
            Self::Hip => "hip_circumference",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chest => "chest",
            Self::Waist => "waist",
            Self::Hip => "hip",
        }
    }
}

/// 実測フィードバック1件の記録
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub region: BodyRegion,
    pub system_cm: f32,
    pub actual_cm: f32,
    pub error_cm: f32,
    pub error_percent: f32,
    /// 適用後の係数
    pub factor: f32,
    pub recorded_at: DateTime<Utc>,
}

fn default_factor() -> f32 {
    1.0
}

fn default_chest_ratio() -> f32 {
    0.55
}

fn default_waist_ratio() -> f32 {
    0.45
}

fn default_hip_ratio() -> f32 {
    0.50
}

/// 永続化される個人プロファイル
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationProfile {
    #[serde(default = "default_factor")]
    pub chest_factor: f32,
    #[serde(default = "default_factor")]
    pub waist_factor: f32,
    #[serde(default = "default_factor")]
    pub hip_factor: f32,
    #[serde(default = "default_chest_ratio")]
    pub chest_depth_ratio: f32,
    #[serde(default = "default_waist_ratio")]
    pub waist_depth_ratio: f32,
    #[serde(default = "default_hip_ratio")]
    pub hip_depth_ratio: f32,
    #[serde(default)]
    pub measurements_count: u32,
    #[serde(default)]
    pub history: Vec<FeedbackEntry>,
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        Self {
            chest_factor: 1.0,
            waist_factor: 1.0,
            hip_factor: 1.0,
            chest_depth_ratio: default_chest_ratio(),
            waist_depth_ratio: default_waist_ratio(),
            hip_depth_ratio: default_hip_ratio(),
            measurements_count: 0,
            history: Vec::new(),
        }
    }
}

impl CalibrationProfile {
    fn factor(&self, region: BodyRegion) -> f32 {
        match region {
            BodyRegion::Chest => self.chest_factor,
            BodyRegion::Waist => self.waist_factor,
            BodyRegion::Hip => self.hip_factor,
        }
    }

    fn factor_mut(&mut self, region: BodyRegion) -> &mut f32 {
        match region {
            BodyRegion::Chest => &mut self.chest_factor,
            BodyRegion::Waist => &mut self.waist_factor,
            BodyRegion::Hip => &mut self.hip_factor,
        }
    }
}

/// 部位ごとの誤差統計（表示用）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionStats {
    pub samples: usize,
    pub mean_error_cm: f32,
    pub std_error_cm: f32,
    pub factor: f32,
}

/// プロファイルの読み書きとフィードバック学習
///
/// 実測値を受け取るたびに EMA で補正係数を更新し、即座に保存する。
pub struct CalibrationStore {
    path: PathBuf,
    profile: CalibrationProfile,
}

impl CalibrationStore {
    /// 読み込み（欠損・破損はデフォルトで回復する）
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let profile = match Self::try_load(&path) {
            Ok(Some(profile)) => profile,
            Ok(None) => CalibrationProfile::default(),
            Err(e) => {
                warn!("calibration profile unusable, resetting to defaults: {e}");
                CalibrationProfile::default()
            }
        };
        Self { path, profile }
    }

    /// 厳密な読み込み（存在しない場合 None、破損は ProfileCorrupt）
    pub fn try_load(path: &Path) -> Result<Option<CalibrationProfile>, EngineError> {
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path).map_err(|e| EngineError::ProfileCorrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let profile = serde_json::from_str(&json).map_err(|e| EngineError::ProfileCorrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(profile))
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.profile)
            .context("Failed to serialize calibration profile")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write calibration profile: {}", self.path.display()))?;
        Ok(())
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    pub fn depth_ratios(&self) -> DepthRatioSet {
        DepthRatioSet::new(
            self.profile.chest_depth_ratio,
            self.profile.waist_depth_ratio,
            self.profile.hip_depth_ratio,
        )
    }

    pub fn update_depth_ratios(&mut self, ratios: DepthRatioSet) -> Result<()> {
        self.profile.chest_depth_ratio = ratios.chest;
        self.profile.waist_depth_ratio = ratios.waist;
        self.profile.hip_depth_ratio = ratios.hip;
        self.save()
    }

    /// 実測フィードバックを1件取り込む
    ///
    /// 係数は誤差比 actual/system への EMA で更新し、履歴に追記して保存する。
    pub fn ingest_feedback(&mut self, region: BodyRegion, system_cm: f32, actual_cm: f32) -> Result<()> {
        if system_cm <= 0.0 {
            bail!("system measurement must be positive: {system_cm}");
        }
        if actual_cm <= 0.0 {
            bail!("actual measurement must be positive: {actual_cm}");
        }

        let error_ratio = actual_cm / system_cm;
        let factor = self.profile.factor_mut(region);
        *factor = FEEDBACK_ALPHA * error_ratio + (1.0 - FEEDBACK_ALPHA) * *factor;
        let factor = *factor;

        self.profile.history.push(FeedbackEntry {
            region,
            system_cm,
            actual_cm,
            error_cm: actual_cm - system_cm,
            error_percent: (actual_cm - system_cm) / actual_cm * 100.0,
            factor,
            recorded_at: Utc::now(),
        });
        let overflow = self.profile.history.len().saturating_sub(HISTORY_LIMIT);
        if overflow > 0 {
            self.profile.history.drain(..overflow);
        }
        self.profile.measurements_count += 1;

        self.save()
    }

    /// 補正係数を周囲長3測定に適用する
    ///
    /// 値に係数を掛け、由来を Calibrated に付け替える。
    pub fn apply(&self, measurements: &mut MeasurementSet) {
        for region in [BodyRegion::Chest, BodyRegion::Waist, BodyRegion::Hip] {
            if let Some(m) = measurements.get_mut(region.circumference_key()) {
                m.value_cm *= self.profile.factor(region);
                m.source = Source::Calibrated;
            }
        }
    }

    /// 部位ごとの履歴誤差統計（情報表示のみ、学習には使わない）
    pub fn stats(&self, region: BodyRegion) -> RegionStats {
        let errors: Vec<f32> = self
            .profile
            .history
            .iter()
            .filter(|e| e.region == region)
            .map(|e| e.error_cm)
            .collect();

        let (mean, std) = if errors.is_empty() {
            (0.0, 0.0)
        } else {
            let n = errors.len() as f32;
            let mean = errors.iter().sum::<f32>() / n;
            let variance = errors.iter().map(|e| (e - mean) * (e - mean)).sum::<f32>() / n;
            (mean, variance.sqrt())
        };

        RegionStats {
            samples: errors.len(),
            mean_error_cm: mean,
            std_error_cm: std,
            factor: self.profile.factor(region),
        }
    }

    /// プロファイルを初期状態に戻して保存する
    pub fn reset(&mut self) -> Result<()> {
        self.profile = CalibrationProfile::default();
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::Measurement;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    fn temp_store(name: &str) -> CalibrationStore {
        let path = std::env::temp_dir().join(format!("fitlens_test_{}_{}.json", name, std::process::id()));
        let _ = fs::remove_file(&path);
        CalibrationStore::load(path)
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let store = temp_store("missing");
        assert_eq!(store.profile().chest_factor, 1.0);
        assert_eq!(store.profile().measurements_count, 0);
        assert!(store.profile().history.is_empty());
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let path = std::env::temp_dir().join(format!("fitlens_test_corrupt_{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();
        let store = CalibrationStore::load(&path);
        assert_eq!(store.profile().waist_factor, 1.0);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_try_load_corrupt_is_error() {
        let path = std::env::temp_dir().join(format!("fitlens_test_strict_{}.json", std::process::id()));
        fs::write(&path, "[]").unwrap();
        let err = CalibrationStore::try_load(&path).unwrap_err();
        match err {
            EngineError::ProfileCorrupt { .. } => {}
            other => panic!("unexpected error: {other}"),
        }
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_feedback_moves_factor_towards_error_ratio() {
        let mut store = temp_store("ema");
        // actual/system = 1.1、係数は 1.0 から 0.3 だけ近づく
        store.ingest_feedback(BodyRegion::Waist, 80.0, 88.0).unwrap();
        assert!(approx_eq(store.profile().waist_factor, 1.03, 1e-4));
        assert_eq!(store.profile().measurements_count, 1);
        assert_eq!(store.profile().history.len(), 1);

        // 他部位は動かない
        assert_eq!(store.profile().chest_factor, 1.0);
    }

    #[test]
    fn test_feedback_then_apply_known_example() {
        let mut store = temp_store("worked");
        store.ingest_feedback(BodyRegion::Chest, 90.0, 95.0).unwrap();
        assert!(approx_eq(store.profile().chest_factor, 1.0317, 1e-3));

        let mut set = MeasurementSet::new();
        set.insert(
            "chest_circumference".to_string(),
            Measurement::new(90.0, 0.8, Source::Fused),
        );
        store.apply(&mut set);
        assert!(approx_eq(set["chest_circumference"].value_cm, 92.85, 0.01));
        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn test_feedback_rejects_nonpositive() {
        let mut store = temp_store("reject");
        assert!(store.ingest_feedback(BodyRegion::Chest, 0.0, 90.0).is_err());
        assert!(store.ingest_feedback(BodyRegion::Chest, 90.0, -1.0).is_err());
        assert_eq!(store.profile().measurements_count, 0);
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut store = temp_store("evict");
        for i in 0..25 {
            store
                .ingest_feedback(BodyRegion::Hip, 100.0, 100.0 + i as f32)
                .unwrap();
        }
        let history = &store.profile().history;
        assert_eq!(history.len(), HISTORY_LIMIT);
        // 最初の5件が追い出されている
        assert!(approx_eq(history[0].actual_cm, 105.0, 1e-4));
        assert!(approx_eq(history.last().unwrap().actual_cm, 124.0, 1e-4));
        assert_eq!(store.profile().measurements_count, 25);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let mut store = temp_store("roundtrip");
        store.ingest_feedback(BodyRegion::Chest, 90.0, 99.0).unwrap();
        let expected = store.profile().chest_factor;

        let reloaded = CalibrationStore::load(&store.path);
        assert!(approx_eq(reloaded.profile().chest_factor, expected, 1e-6));
        assert_eq!(reloaded.profile().history.len(), 1);
        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn test_apply_retags_circumferences() {
        let mut store = temp_store("apply");
        store.ingest_feedback(BodyRegion::Waist, 80.0, 88.0).unwrap();

        let mut set = MeasurementSet::new();
        set.insert(
            "waist_circumference".to_string(),
            Measurement::new(80.0, 0.7, Source::Fused),
        );
        set.insert(
            "shoulder_width".to_string(),
            Measurement::new(40.0, 0.9, Source::Direct),
        );

        store.apply(&mut set);
        let waist = &set["waist_circumference"];
        assert!(approx_eq(waist.value_cm, 80.0 * 1.03, 1e-3));
        assert_eq!(waist.source, Source::Calibrated);
        // 周囲長以外は触らない
        assert_eq!(set["shoulder_width"].source, Source::Direct);
        assert_eq!(set["shoulder_width"].value_cm, 40.0);
        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn test_stats_per_region() {
        let mut store = temp_store("stats");
        store.ingest_feedback(BodyRegion::Chest, 90.0, 92.0).unwrap();
        store.ingest_feedback(BodyRegion::Chest, 90.0, 94.0).unwrap();
        store.ingest_feedback(BodyRegion::Waist, 80.0, 80.0).unwrap();

        let chest = store.stats(BodyRegion::Chest);
        assert_eq!(chest.samples, 2);
        assert!(approx_eq(chest.mean_error_cm, 3.0, 1e-4));
        assert!(approx_eq(chest.std_error_cm, 1.0, 1e-4));

        let hip = store.stats(BodyRegion::Hip);
        assert_eq!(hip.samples, 0);
        assert_eq!(hip.factor, 1.0);
        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn test_reset() {
        let mut store = temp_store("reset");
        store.ingest_feedback(BodyRegion::Hip, 100.0, 110.0).unwrap();
        store.reset().unwrap();
        assert_eq!(store.profile().hip_factor, 1.0);
        assert!(store.profile().history.is_empty());
        assert_eq!(store.profile().measurements_count, 0);
        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn test_depth_ratio_update() {
        let mut store = temp_store("ratios");
        store
            .update_depth_ratios(DepthRatioSet::new(0.60, 0.48, 0.52))
            .unwrap();
        let ratios = store.depth_ratios();
        assert!(approx_eq(ratios.chest, 0.60, 1e-6));
        assert!(approx_eq(ratios.waist, 0.48, 1e-6));
        assert!(approx_eq(ratios.hip, 0.52, 1e-6));
        let _ = fs::remove_file(&store.path);
    }
}
