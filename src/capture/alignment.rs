use serde::Deserialize;

use crate::pose::{KeypointIndex, Pose};

/// フレーム寸法（ピクセル）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDims {
    pub width: u32,
    pub height: u32,
}

/// 整列判定の3状態
///
/// Green のみが安定タイマーを進める。Amber は「惜しい」ことを
/// 伝えるだけで、タイマー上は Red と同じ扱い。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentState {
    Red,
    Amber,
    Green,
}

/// 1フレーム分の判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateReport {
    pub state: AlignmentState,
    pub instruction: &'static str,
}

fn default_min_confidence() -> f32 {
    0.5
}

fn default_center_tolerance() -> f32 {
    0.08
}

fn default_occupancy_min() -> f32 {
    0.60
}

fn default_occupancy_max() -> f32 {
    0.80
}

fn default_bottom_margin() -> f32 {
    0.95
}

fn default_top_margin() -> f32 {
    0.05
}

fn default_near_center_scale() -> f32 {
    1.5
}

fn default_near_occupancy_band() -> f32 {
    0.05
}

/// 整列ゲートの閾値
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// 必須ランドマークの最低信頼度
    pub min_confidence: f32,
    /// 肩中点の許容ずれ（フレーム幅比）
    pub center_tolerance: f32,
    /// 鼻〜足首のフレーム占有率の下限・上限
    pub occupancy_min: f32,
    pub occupancy_max: f32,
    /// 足首がこれより下 (フレーム高比) なら見切れ扱い
    pub bottom_margin: f32,
    /// 鼻がこれより上なら頭が近すぎる扱い
    pub top_margin: f32,
    /// Amber 判定: 許容ずれの何倍までを「惜しい」とするか
    pub near_center_scale: f32,
    /// Amber 判定: 占有率バンド外のどこまでを「惜しい」とするか
    pub near_occupancy_band: f32,
    /// 手持ちの参照物チェックを要求するか
    pub require_object: bool,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            center_tolerance: default_center_tolerance(),
            occupancy_min: default_occupancy_min(),
            occupancy_max: default_occupancy_max(),
            bottom_margin: default_bottom_margin(),
            top_margin: default_top_margin(),
            near_center_scale: default_near_center_scale(),
            near_occupancy_band: default_near_occupancy_band(),
            require_object: false,
        }
    }
}

const CRITICAL: [KeypointIndex; 7] = [
    KeypointIndex::Nose,
    KeypointIndex::LeftShoulder,
    KeypointIndex::RightShoulder,
    KeypointIndex::LeftHip,
    KeypointIndex::RightHip,
    KeypointIndex::LeftAnkle,
    KeypointIndex::RightAnkle,
];

/// 整列ゲート本体
///
/// チェックは厳密に順序付けられ、最初に失敗した項目の指示だけを返す。
pub fn evaluate(pose: Option<&Pose>, dims: FrameDims, cfg: &AlignmentConfig) -> GateReport {
    let red = |instruction| GateReport {
        state: AlignmentState::Red,
        instruction,
    };
    let amber = |instruction| GateReport {
        state: AlignmentState::Amber,
        instruction,
    };

    let pose = match pose {
        Some(p) => p,
        None => return red("No person detected. Please stand in front of camera."),
    };

    for index in CRITICAL {
        if !pose.get(index).is_valid(cfg.min_confidence) {
            return red("Full body not visible. Adjust position.");
        }
    }

    let h = dims.height as f32;
    let w = dims.width as f32;
    let nose = pose.get(KeypointIndex::Nose);
    let ankle_y = pose
        .get(KeypointIndex::LeftAnkle)
        .y
        .max(pose.get(KeypointIndex::RightAnkle).y);

    if ankle_y > h * cfg.bottom_margin {
        return red("Step back. Feet not fully visible.");
    }
    if nose.y < h * cfg.top_margin {
        return red("Move back. Head too close to edge.");
    }

    // 肩中点のセンタリング
    let left = pose.get(KeypointIndex::LeftShoulder);
    let right = pose.get(KeypointIndex::RightShoulder);
    let center_x = (left.x + right.x) / 2.0;
    let offset = center_x - w / 2.0;
    let tolerance = w * cfg.center_tolerance;
    if offset.abs() > tolerance {
        let instruction = if offset > 0.0 {
            "Move left to center yourself."
        } else {
            "Move right to center yourself."
        };
        if offset.abs() <= tolerance * cfg.near_center_scale {
            return amber(instruction);
        }
        return red(instruction);
    }

    // 鼻〜低い方の足首のフレーム占有率で距離を見る
    let occupancy = (ankle_y - nose.y) / h;
    if occupancy < cfg.occupancy_min {
        if occupancy >= cfg.occupancy_min - cfg.near_occupancy_band {
            return amber("Move closer. Stand at 1 meter distance.");
        }
        return red("Move closer. Stand at 1 meter distance.");
    }
    if occupancy > cfg.occupancy_max {
        if occupancy <= cfg.occupancy_max + cfg.near_occupancy_band {
            return amber("Move back. Stand at 1 meter distance.");
        }
        return red("Move back. Stand at 1 meter distance.");
    }

    if cfg.require_object && !object_in_hand(pose, cfg.min_confidence) {
        return red("Hold the reference object in your hand.");
    }

    GateReport {
        state: AlignmentState::Green,
        instruction: "Perfect! Hold still...",
    }
}

/// 手持ち参照物のヒューリスティック
///
/// どちらかの手首が腰中点より上にあれば持っているとみなす。
fn object_in_hand(pose: &Pose, min_confidence: f32) -> bool {
    let hip_y = match pose.midpoint(KeypointIndex::LeftHip, KeypointIndex::RightHip) {
        Some((_, y)) => y,
        None => return false,
    };
    [KeypointIndex::LeftWrist, KeypointIndex::RightWrist]
        .iter()
        .any(|&w| {
            let kp = pose.get(w);
            kp.is_valid(min_confidence) && kp.y < hip_y
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Keypoint;

    const DIMS: FrameDims = FrameDims {
        width: 640,
        height: 1000,
    };

    /// センタリング・占有率とも合格する姿勢 (鼻 y=150, 足首 y=850 → 占有 0.70)
    fn aligned_pose() -> Pose {
        let mut k = [Keypoint::default(); KeypointIndex::COUNT];
        let set = |k: &mut [Keypoint; 17], i: KeypointIndex, x: f32, y: f32| {
            k[i as usize] = Keypoint::new(x, y, 0.9);
        };
        set(&mut k, KeypointIndex::Nose, 320.0, 150.0);
        set(&mut k, KeypointIndex::LeftShoulder, 250.0, 280.0);
        set(&mut k, KeypointIndex::RightShoulder, 390.0, 280.0);
        set(&mut k, KeypointIndex::LeftWrist, 240.0, 560.0);
        set(&mut k, KeypointIndex::RightWrist, 400.0, 560.0);
        set(&mut k, KeypointIndex::LeftHip, 280.0, 520.0);
        set(&mut k, KeypointIndex::RightHip, 360.0, 520.0);
        set(&mut k, KeypointIndex::LeftAnkle, 270.0, 845.0);
        set(&mut k, KeypointIndex::RightAnkle, 370.0, 850.0);
        Pose::new(k)
    }

    #[test]
    fn test_no_person() {
        let report = evaluate(None, DIMS, &AlignmentConfig::default());
        assert_eq!(report.state, AlignmentState::Red);
        assert_eq!(report.instruction, "No person detected. Please stand in front of camera.");
    }

    #[test]
    fn test_missing_critical_landmark() {
        let mut pose = aligned_pose();
        pose.keypoints[KeypointIndex::LeftAnkle as usize].confidence = 0.2;
        let report = evaluate(Some(&pose), DIMS, &AlignmentConfig::default());
        assert_eq!(report.state, AlignmentState::Red);
        assert_eq!(report.instruction, "Full body not visible. Adjust position.");
    }

    #[test]
    fn test_feet_cut_off() {
        let mut pose = aligned_pose();
        pose.keypoints[KeypointIndex::RightAnkle as usize].y = 980.0;
        let report = evaluate(Some(&pose), DIMS, &AlignmentConfig::default());
        assert_eq!(report.instruction, "Step back. Feet not fully visible.");
    }

    #[test]
    fn test_head_too_close_to_edge() {
        let mut pose = aligned_pose();
        pose.keypoints[KeypointIndex::Nose as usize].y = 20.0;
        let report = evaluate(Some(&pose), DIMS, &AlignmentConfig::default());
        assert_eq!(report.instruction, "Move back. Head too close to edge.");
    }

    #[test]
    fn test_centering_directions() {
        // 肩中点をフレーム右側に大きくずらす → 左へ動けと言う
        let mut pose = aligned_pose();
        for kp in pose.keypoints.iter_mut() {
            kp.x += 200.0;
        }
        let report = evaluate(Some(&pose), DIMS, &AlignmentConfig::default());
        assert_eq!(report.state, AlignmentState::Red);
        assert_eq!(report.instruction, "Move left to center yourself.");

        let mut pose = aligned_pose();
        for kp in pose.keypoints.iter_mut() {
            kp.x -= 200.0;
        }
        let report = evaluate(Some(&pose), DIMS, &AlignmentConfig::default());
        assert_eq!(report.instruction, "Move right to center yourself.");
    }

    #[test]
    fn test_centering_near_miss_is_amber() {
        // 許容 51.2px、ずれ 60px は 1.5 倍以内 → Amber
        let mut pose = aligned_pose();
        for kp in pose.keypoints.iter_mut() {
            kp.x += 60.0;
        }
        let report = evaluate(Some(&pose), DIMS, &AlignmentConfig::default());
        assert_eq!(report.state, AlignmentState::Amber);
        assert_eq!(report.instruction, "Move left to center yourself.");
    }

    #[test]
    fn test_occupancy_too_small() {
        // 鼻 150 → 足首 650: 占有 0.50
        let mut pose = aligned_pose();
        pose.keypoints[KeypointIndex::LeftAnkle as usize].y = 645.0;
        pose.keypoints[KeypointIndex::RightAnkle as usize].y = 650.0;
        let report = evaluate(Some(&pose), DIMS, &AlignmentConfig::default());
        assert_eq!(report.state, AlignmentState::Red);
        assert_eq!(report.instruction, "Move closer. Stand at 1 meter distance.");
    }

    #[test]
    fn test_occupancy_near_miss_is_amber() {
        // 占有 0.57 は下限 0.60 から 0.05 以内 → Amber
        let mut pose = aligned_pose();
        pose.keypoints[KeypointIndex::LeftAnkle as usize].y = 715.0;
        pose.keypoints[KeypointIndex::RightAnkle as usize].y = 720.0;
        let report = evaluate(Some(&pose), DIMS, &AlignmentConfig::default());
        assert_eq!(report.state, AlignmentState::Amber);
    }

    #[test]
    fn test_occupancy_too_large() {
        // 鼻 60 → 足首 930: 占有 0.87 (頭・足のマージンは満たす)
        let mut pose = aligned_pose();
        pose.keypoints[KeypointIndex::Nose as usize].y = 60.0;
        pose.keypoints[KeypointIndex::LeftAnkle as usize].y = 925.0;
        pose.keypoints[KeypointIndex::RightAnkle as usize].y = 930.0;
        let report = evaluate(Some(&pose), DIMS, &AlignmentConfig::default());
        assert_eq!(report.state, AlignmentState::Red);
        assert_eq!(report.instruction, "Move back. Stand at 1 meter distance.");
    }

    #[test]
    fn test_pass() {
        let report = evaluate(Some(&aligned_pose()), DIMS, &AlignmentConfig::default());
        assert_eq!(report.state, AlignmentState::Green);
        assert_eq!(report.instruction, "Perfect! Hold still...");
    }

    #[test]
    fn test_object_check_only_when_required() {
        // 手首は腰より下にある姿勢
        let mut pose = aligned_pose();
        pose.keypoints[KeypointIndex::LeftWrist as usize].y = 600.0;
        pose.keypoints[KeypointIndex::RightWrist as usize].y = 600.0;

        let report = evaluate(Some(&pose), DIMS, &AlignmentConfig::default());
        assert_eq!(report.state, AlignmentState::Green);

        let cfg = AlignmentConfig {
            require_object: true,
            ..AlignmentConfig::default()
        };
        let report = evaluate(Some(&pose), DIMS, &cfg);
        assert_eq!(report.state, AlignmentState::Red);
        assert_eq!(report.instruction, "Hold the reference object in your hand.");
    }

    #[test]
    fn test_object_in_hand_passes() {
        // 片手を腰より上へ
        let mut pose = aligned_pose();
        pose.keypoints[KeypointIndex::RightWrist as usize].y = 400.0;
        let cfg = AlignmentConfig {
            require_object: true,
            ..AlignmentConfig::default()
        };
        let report = evaluate(Some(&pose), DIMS, &cfg);
        assert_eq!(report.state, AlignmentState::Green);
    }
}
