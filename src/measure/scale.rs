use crate::error::EngineError;
use crate::pose::{KeypointIndex, Pose};

/// ピクセル → cm の換算係数
///
/// セッション開始時に一度だけ解決し、以後の全測定で共有する。
/// 常に正であることを構築時に保証する。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(f32);

impl ScaleFactor {
    /// 既知の物理長とそのピクセル長から換算係数を求める
    pub fn from_reference(physical_cm: f32, pixel_extent: f32) -> Result<Self, EngineError> {
        if physical_cm <= 0.0 || pixel_extent <= 0.0 {
            return Err(EngineError::InvalidReference {
                physical_cm,
                pixel_extent,
            });
        }
        Ok(Self(physical_cm / pixel_extent))
    }

    /// 身長基準: 鼻から低い方の足首までのピクセル高を身長とみなす
    pub fn from_height(pose: &Pose, user_height_cm: f32) -> Result<Self, EngineError> {
        let nose = pose.try_get(KeypointIndex::Nose);
        let left_ankle = pose.try_get(KeypointIndex::LeftAnkle);
        let right_ankle = pose.try_get(KeypointIndex::RightAnkle);

        let (nose, ankle_y) = match (nose, left_ankle, right_ankle) {
            (Some(n), Some(l), Some(r)) => (n, l.y.max(r.y)),
            (Some(n), Some(l), None) => (n, l.y),
            (Some(n), None, Some(r)) => (n, r.y),
            _ => {
                return Err(EngineError::InvalidReference {
                    physical_cm: user_height_cm,
                    pixel_extent: 0.0,
                })
            }
        };

        Self::from_reference(user_height_cm, ankle_y - nose.y)
    }

    pub fn cm_per_px(&self) -> f32 {
        self.0
    }

    pub fn to_cm(&self, pixels: f32) -> f32 {
        pixels * self.0
    }
}
