use serde::{Deserialize, Serialize};

/// 部位ごとの奥行き/幅比
///
/// 楕円の短半径 = 幅 × 比。体型プリセットまたは
/// キャリブレーションプロファイルから供給され、呼び出しごとに渡す。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthRatioSet {
    pub chest: f32,
    pub waist: f32,
    pub hip: f32,
}

impl Default for DepthRatioSet {
    fn default() -> Self {
        BodyPreset::Average.ratios()
    }
}

impl DepthRatioSet {
    pub fn new(chest: f32, waist: f32, hip: f32) -> Self {
        Self { chest, waist, hip }
    }

    /// 肩幅/腰幅比からの適応調整
    ///
    /// 逆三角形体型 (比 > 1.1): 胸を厚く、腰を細く。
    /// 洋梨体型 (比 < 0.9): 尻を厚く、腰を細く。
    pub fn adjusted_for_shape(&self, shoulder_width: f32, hip_width: f32) -> Self {
        if hip_width <= 0.0 {
            return *self;
        }
        let ratio = shoulder_width / hip_width;
        let mut out = *self;
        if ratio > 1.1 {
            out.chest += 0.03;
            out.waist -= 0.02;
        } else if ratio < 0.9 {
            out.hip += 0.03;
            out.waist -= 0.02;
        }
        out
    }
}

/// 体型プリセット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyPreset {
    Average,
    Athletic,
    Slim,
    PlusSize,
    PearShape,
    AppleShape,
}

impl BodyPreset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "average" => Some(Self::Average),
            "athletic" => Some(Self::Athletic),
            "slim" => Some(Self::Slim),
            "plus_size" => Some(Self::PlusSize),
            "pear_shape" => Some(Self::PearShape),
            "apple_shape" => Some(Self::AppleShape),
            _ => None,
        }
    }

    pub fn ratios(&self) -> DepthRatioSet {
        match self {
            Self::Average => DepthRatioSet::new(0.55, 0.45, 0.50),
            Self::Athletic => DepthRatioSet::new(0.60, 0.48, 0.52),
            Self::Slim => DepthRatioSet::new(0.50, 0.42, 0.48),
            Self::PlusSize => DepthRatioSet::new(0.58, 0.52, 0.55),
            Self::PearShape => DepthRatioSet::new(0.52, 0.44, 0.56),
            Self::AppleShape => DepthRatioSet::new(0.58, 0.50, 0.48),
        }
    }
}

/// 胸・腰・尻の奥行き（cm）を決定する
///
/// 比例モデルの基準奥行きと各部位の幅から出発し、幅が欠けた部位は
/// 基準奥行きの定数倍で補う。最後に解剖学的制約で整合させる:
/// 胸 ≥ 腰 × 1.15、尻は [腰 × 0.95, 胸 × 1.05] に収める。
pub fn reconcile_depths(
    base_depth: f32,
    chest_width: Option<f32>,
    waist_width: Option<f32>,
    hip_width: Option<f32>,
    ratios: &DepthRatioSet,
) -> (f32, f32, f32) {
    let chest = match chest_width {
        Some(w) => w * ratios.chest,
        None => base_depth * 1.1,
    };
    let waist = match waist_width {
        Some(w) => w * ratios.waist,
        None => base_depth * 0.9,
    };
    let hip = match hip_width {
        Some(w) => w * ratios.hip,
        None => base_depth,
    };

    let chest = chest.max(waist * 1.15);
    // 下限 0.95w ≤ 上限 1.05c は胸の下限補正により常に成立する
    let hip = hip.clamp(waist * 0.95, chest * 1.05);

    (chest, waist, hip)
}
