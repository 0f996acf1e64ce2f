use tracing::debug;

use crate::pose::{KeypointIndex, Pose, SilhouetteMask};

use super::depth::{reconcile_depths, DepthRatioSet};
use super::fusion::{self, Estimate};
use super::geometry;
use super::record::{Measurement, MeasurementSet, Source};
use super::scale::ScaleFactor;
use super::segments::{FRONT_SEGMENTS, SIDE_SEGMENTS};

/// 測定対象のビュー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Front,
    Side,
}

/// 幾何測定エンジン
///
/// 1枚の姿勢（と任意のシルエットマスク）から体節長と
/// 胸・腰・尻の周囲長を推定する。ステートレスで、
/// 奥行き比はキャリブレーション側から呼び出しごとに渡す。
pub struct MeasurementEngine {
    /// 肩幅 → 胸幅の比例係数
    alpha_shoulder: f32,
    /// 基準奥行きに対する腕長の寄与
    alpha_arm: f32,
    /// 基準奥行きに対する胴長の寄与
    alpha_torso: f32,
    /// 輪郭由来の推定に与える固定信頼度
    contour_confidence: f32,
}

impl MeasurementEngine {
    pub fn new(alpha_shoulder: f32, alpha_arm: f32, alpha_torso: f32, contour_confidence: f32) -> Self {
        Self {
            alpha_shoulder,
            alpha_arm,
            alpha_torso,
            contour_confidence,
        }
    }

    /// 1ビュー分の全測定
    ///
    /// 欠落ランドマークに依存する測定は黙って省く。
    /// 周囲長は正面ビューでのみ推定する。
    pub fn measure(
        &self,
        pose: &Pose,
        mask: Option<&SilhouetteMask>,
        scale: ScaleFactor,
        view: View,
        ratios: &DepthRatioSet,
    ) -> MeasurementSet {
        let mut out = MeasurementSet::new();

        let table = match view {
            View::Front => FRONT_SEGMENTS,
            View::Side => SIDE_SEGMENTS,
        };

        for (name, chain) in table {
            if let Some((length_px, confidence)) = chain_length(pose, chain) {
                let mut value_cm = scale.to_cm(length_px);
                if *name == "chest_width" {
                    value_cm *= self.alpha_shoulder;
                }
                out.insert(
                    name.to_string(),
                    Measurement::new(value_cm, confidence, Source::Direct),
                );
            }
        }

        if view == View::Front {
            self.estimate_circumferences(pose, mask, scale, ratios, &mut out);
        }

        debug!(view = ?view, count = out.len(), "measurements computed");
        out
    }

    /// 胸・腰・尻の周囲長推定（ランドマーク楕円 + 任意の輪郭、融合）
    fn estimate_circumferences(
        &self,
        pose: &Pose,
        mask: Option<&SilhouetteMask>,
        scale: ScaleFactor,
        ratios: &DepthRatioSet,
        out: &mut MeasurementSet,
    ) {
        let chest_width = out.get("chest_width").map(|m| m.value_cm);
        let waist_width = out.get("waist_width").map(|m| m.value_cm);
        let hip_width = out.get("hip_width").map(|m| m.value_cm);

        let base_depth = self.base_depth_cm(pose, scale);
        let (chest_depth, waist_depth, hip_depth) =
            reconcile_depths(base_depth, chest_width, waist_width, hip_width, ratios);

        let shoulder_conf = pair_confidence(pose, KeypointIndex::LeftShoulder, KeypointIndex::RightShoulder);
        let hip_conf = pair_confidence(pose, KeypointIndex::LeftHip, KeypointIndex::RightHip);

        let landmark = |width: Option<f32>, depth: f32, conf: Option<f32>| -> Option<Estimate> {
            let width = width?;
            let conf = conf?;
            let value = geometry::ellipse_circumference(width / 2.0, depth / 2.0);
            Some(Estimate::new(value, conf, fusion::LANDMARK_TRUST))
        };

        let contour = self.contour_estimates(pose, mask, scale, ratios);

        let regions = [
            ("chest_circumference", landmark(chest_width, chest_depth, shoulder_conf), contour.map(|c| c.0)),
            ("waist_circumference", landmark(waist_width, waist_depth, hip_conf), contour.map(|c| c.1)),
            ("hip_circumference", landmark(hip_width, hip_depth, hip_conf), contour.map(|c| c.2)),
        ];

        for (name, landmark_est, contour_est) in regions {
            let mut estimates = Vec::with_capacity(2);
            if let Some(e) = landmark_est {
                estimates.push(e);
            }
            if let Some(e) = contour_est.flatten() {
                estimates.push(e);
            }
            let fused_source = if estimates.len() > 1 {
                Source::Fused
            } else {
                Source::EllipseEstimate
            };
            if let Some((value, confidence)) = fusion::fuse(&estimates) {
                out.insert(name.to_string(), Measurement::new(value, confidence, fused_source));
            }
        }
    }

    /// 比例モデルの基準奥行き（cm）: 腕長と胴長の線形結合
    fn base_depth_cm(&self, pose: &Pose, scale: ScaleFactor) -> f32 {
        let arm = |shoulder, wrist| -> Option<f32> {
            let s = pose.try_get(shoulder)?;
            let w = pose.try_get(wrist)?;
            Some(geometry::distance(s, w))
        };
        let arms: Vec<f32> = [
            arm(KeypointIndex::LeftShoulder, KeypointIndex::LeftWrist),
            arm(KeypointIndex::RightShoulder, KeypointIndex::RightWrist),
        ]
        .into_iter()
        .flatten()
        .collect();
        let arm_px = if arms.is_empty() {
            0.0
        } else {
            arms.iter().sum::<f32>() / arms.len() as f32
        };

        let torso_px = match (
            pose.try_get(KeypointIndex::LeftShoulder),
            pose.try_get(KeypointIndex::LeftHip),
        ) {
            (Some(s), Some(h)) => geometry::distance(s, h),
            _ => 0.0,
        };

        scale.to_cm(self.alpha_arm * arm_px + self.alpha_torso * torso_px)
    }

    /// 輪郭ベースの胸・腰・尻の周囲長推定
    ///
    /// 行位置は肩→尻スパンの 30% / 70% / 100%。
    /// 肩か尻の中点が欠けている場合は None。
    fn contour_estimates(
        &self,
        pose: &Pose,
        mask: Option<&SilhouetteMask>,
        scale: ScaleFactor,
        ratios: &DepthRatioSet,
    ) -> Option<(Option<Estimate>, Option<Estimate>, Option<Estimate>)> {
        let mask = mask?;
        let (_, shoulder_y) = pose.midpoint(KeypointIndex::LeftShoulder, KeypointIndex::RightShoulder)?;
        let (_, hip_y) = pose.midpoint(KeypointIndex::LeftHip, KeypointIndex::RightHip)?;
        let span = hip_y - shoulder_y;
        if span <= 0.0 {
            return None;
        }

        let at = |frac: f32, ratio: f32| -> Option<Estimate> {
            let y = (shoulder_y + frac * span).round();
            if y < 0.0 {
                return None;
            }
            let width_cm = scale.to_cm(mask.row_width(y as usize)?);
            let depth_cm = width_cm * ratio;
            let value = geometry::ellipse_circumference(width_cm / 2.0, depth_cm / 2.0);
            Some(Estimate::new(value, self.contour_confidence, fusion::CONTOUR_TRUST))
        };

        Some((
            at(0.3, ratios.chest),
            at(0.7, ratios.waist),
            at(1.0, ratios.hip),
        ))
    }

    /// 指定ピクセル行の輪郭幅（cm）
    pub fn contour_width_cm(
        &self,
        mask: &SilhouetteMask,
        row: usize,
        scale: ScaleFactor,
    ) -> Option<f32> {
        mask.row_width(row).map(|w| scale.to_cm(w))
    }
}

impl Default for MeasurementEngine {
    fn default() -> Self {
        Self::new(0.5, 0.15, 0.25, 0.8)
    }
}

/// 折れ線長と平均信頼度（いずれかの点が欠けていれば None）
fn chain_length(pose: &Pose, chain: &[KeypointIndex]) -> Option<(f32, f32)> {
    let mut points = Vec::with_capacity(chain.len());
    for &index in chain {
        points.push(pose.try_get(index)?);
    }

    let length: f32 = points
        .windows(2)
        .map(|pair| geometry::distance(pair[0], pair[1]))
        .sum();
    let confidence = points.iter().map(|k| k.confidence).sum::<f32>() / points.len() as f32;
    Some((length, confidence))
}

fn pair_confidence(pose: &Pose, left: KeypointIndex, right: KeypointIndex) -> Option<f32> {
    let l = pose.try_get(left)?;
    let r = pose.try_get(right)?;
    Some((l.confidence + r.confidence) / 2.0)
}
