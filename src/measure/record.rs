use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 測定値の由来
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// キーポイント間距離の直接換算
    Direct,
    /// 幅と推定奥行きからの楕円周推定
    EllipseEstimate,
    /// ランドマーク推定と輪郭推定の融合
    Fused,
    /// 個人キャリブレーション係数適用後
    Calibrated,
}

/// 1件の測定結果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value_cm: f32,
    pub confidence: f32,
    pub source: Source,
}

impl Measurement {
    pub fn new(value_cm: f32, confidence: f32, source: Source) -> Self {
        Self {
            value_cm,
            confidence,
            source,
        }
    }
}

/// 測定名 → 測定結果（名前順で安定に列挙できる）
pub type MeasurementSet = BTreeMap<String, Measurement>;
