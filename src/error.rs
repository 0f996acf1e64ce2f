use thiserror::Error;

/// エンジンの回復不能エラー
///
/// ランドマーク欠落・検出なし・統計の縮退はエラーではなく、
/// Option や結果マップからの省略で表現する。
#[derive(Debug, Error)]
pub enum EngineError {
    /// スケール基準が縮退している（物理サイズまたはピクセル長が非正）
    #[error("invalid reference: {physical_cm} cm against {pixel_extent} px")]
    InvalidReference { physical_cm: f32, pixel_extent: f32 },

    /// キャリブレーションプロファイルが読み取れない
    /// （呼び出し側はデフォルトへのリセットで回復する）
    #[error("calibration profile corrupt at {path}: {reason}")]
    ProfileCorrupt { path: String, reason: String },
}
