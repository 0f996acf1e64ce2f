use std::collections::BTreeMap;
use std::time::Instant;

use serde::Deserialize;
use tracing::debug;

use crate::error::EngineError;
use crate::measure::{DepthRatioSet, MeasurementEngine, MeasurementSet, ScaleFactor, View};
use crate::pose::{Pose, SilhouetteMask};

use super::alignment::{self, AlignmentConfig, AlignmentState, FrameDims};

/// 撮影ビューの巡回順
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ViewAngle {
    Front,
    Right,
    Back,
    Left,
    Complete,
}

impl ViewAngle {
    pub fn next(&self) -> Self {
        match self {
            Self::Front => Self::Right,
            Self::Right => Self::Back,
            Self::Back => Self::Left,
            Self::Left => Self::Complete,
            Self::Complete => Self::Complete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Right => "right",
            Self::Back => "back",
            Self::Left => "left",
            Self::Complete => "complete",
        }
    }

    /// 測定エンジンのビューへの写像
    ///
    /// 背面は正面と同じ体節が見えるとみなし、左右は側面として扱う。
    pub fn engine_view(&self) -> Option<View> {
        match self {
            Self::Front | Self::Back => Some(View::Front),
            Self::Right | Self::Left => Some(View::Side),
            Self::Complete => None,
        }
    }

    fn captured_message(&self) -> &'static str {
        match self {
            Self::Front => "Front view captured.",
            Self::Right => "Right view captured.",
            Self::Back => "Back view captured.",
            Self::Left => "Left view captured.",
            Self::Complete => "All views captured.",
        }
    }

    fn turn_message(&self) -> &'static str {
        match self {
            Self::Complete => "All views captured. Processing measurements.",
            _ => "Turn towards your left.",
        }
    }
}

fn default_hold_seconds() -> f32 {
    5.0
}

fn default_cooldown_seconds() -> f32 {
    3.0
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Green を維持すべき秒数
    pub hold_seconds: f32,
    /// 同一指示を再発話するまでの最短間隔
    pub instruction_cooldown_seconds: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            hold_seconds: default_hold_seconds(),
            instruction_cooldown_seconds: default_cooldown_seconds(),
        }
    }
}

/// 1フレーム処理の結果
#[derive(Debug, Clone, PartialEq)]
pub struct FrameVerdict {
    pub state: AlignmentState,
    pub instruction: &'static str,
    /// Green 中の残り秒数（切り上げ）
    pub countdown: Option<u32>,
    /// このフレームで確定したビュー
    pub captured_view: Option<ViewAngle>,
    /// 今発話すべきか（デバウンス済み）
    pub speak: bool,
    pub voice_message: Option<String>,
}

/// 全ビュー分の測定結果
pub struct SessionMeasurements {
    pub scale: ScaleFactor,
    pub per_view: BTreeMap<ViewAngle, MeasurementSet>,
}

/// マルチビュー撮影セッション
///
/// 呼び出し側がフレームごとに姿勢と現在時刻を渡す。
/// 時刻を引数に取るのはテストでタイマーを進めるため。
pub struct CaptureSession {
    alignment: AlignmentConfig,
    config: CaptureConfig,
    current_view: ViewAngle,
    captured: BTreeMap<ViewAngle, Pose>,
    green_since: Option<Instant>,
    last_instruction: Option<&'static str>,
    last_instruction_at: Option<Instant>,
    user_height_cm: Option<f32>,
}

impl CaptureSession {
    pub fn new(alignment: AlignmentConfig, config: CaptureConfig) -> Self {
        Self {
            alignment,
            config,
            current_view: ViewAngle::Front,
            captured: BTreeMap::new(),
            green_since: None,
            last_instruction: None,
            last_instruction_at: None,
            user_height_cm: None,
        }
    }

    pub fn current_view(&self) -> ViewAngle {
        self.current_view
    }

    pub fn is_complete(&self) -> bool {
        self.current_view == ViewAngle::Complete
    }

    pub fn set_user_height(&mut self, height_cm: f32) {
        self.user_height_cm = Some(height_cm);
    }

    /// 1フレーム進める
    pub fn process_frame(&mut self, pose: Option<&Pose>, dims: FrameDims, now: Instant) -> FrameVerdict {
        if self.is_complete() {
            return FrameVerdict {
                state: AlignmentState::Green,
                instruction: ViewAngle::Complete.captured_message(),
                countdown: None,
                captured_view: None,
                speak: false,
                voice_message: None,
            };
        }

        let report = alignment::evaluate(pose, dims, &self.alignment);

        if report.state != AlignmentState::Green {
            self.green_since = None;
            let speak = self.debounce(report.instruction, now);
            return FrameVerdict {
                state: report.state,
                instruction: report.instruction,
                countdown: None,
                captured_view: None,
                speak,
                voice_message: speak.then(|| report.instruction.to_string()),
            };
        }

        let since = *self.green_since.get_or_insert(now);
        let elapsed = now.duration_since(since).as_secs_f32();
        let remaining = (self.config.hold_seconds - elapsed).ceil().max(0.0) as u32;

        if remaining == 0 {
            // pose は Green 判定を通っているので必ず存在する
            let pose = pose.cloned().unwrap_or_default();
            let view = self.current_view;
            self.captured.insert(view, pose);
            self.current_view = view.next();
            self.green_since = None;
            self.last_instruction = None;
            self.last_instruction_at = None;
            debug!(view = view.as_str(), next = self.current_view.as_str(), "view captured");

            let message = format!(
                "{} {}",
                view.captured_message(),
                self.current_view.turn_message()
            );
            return FrameVerdict {
                state: AlignmentState::Green,
                instruction: report.instruction,
                countdown: Some(0),
                captured_view: Some(view),
                speak: true,
                voice_message: Some(message),
            };
        }

        let speak = self.debounce(report.instruction, now);
        FrameVerdict {
            state: AlignmentState::Green,
            instruction: report.instruction,
            countdown: Some(remaining),
            captured_view: None,
            speak,
            voice_message: speak.then(|| report.instruction.to_string()),
        }
    }

    /// 指示が変わり、かつクールダウンが明けたときだけ発話する
    fn debounce(&mut self, instruction: &'static str, now: Instant) -> bool {
        let changed = self.last_instruction != Some(instruction);
        let cooled = match self.last_instruction_at {
            Some(at) => now.duration_since(at).as_secs_f32() >= self.config.instruction_cooldown_seconds,
            None => true,
        };
        if changed && cooled {
            self.last_instruction = Some(instruction);
            self.last_instruction_at = Some(now);
            true
        } else {
            false
        }
    }

    /// 現在のビューを撮影せずに飛ばす
    pub fn advance_view(&mut self) {
        self.current_view = self.current_view.next();
        self.green_since = None;
    }

    pub fn reset(&mut self) {
        self.current_view = ViewAngle::Front;
        self.captured.clear();
        self.green_since = None;
        self.last_instruction = None;
        self.last_instruction_at = None;
    }

    /// 撮影済みの全ビューを測定する
    ///
    /// スケールは正面ビューの姿勢と身長から一度だけ解く。
    /// 正面撮影か身長が無ければ InvalidReference。
    pub fn finalize(
        &self,
        engine: &MeasurementEngine,
        ratios: &DepthRatioSet,
        masks: &BTreeMap<ViewAngle, SilhouetteMask>,
    ) -> Result<SessionMeasurements, EngineError> {
        let height = self.user_height_cm.ok_or(EngineError::InvalidReference {
            physical_cm: 0.0,
            pixel_extent: 0.0,
        })?;
        let front = self
            .captured
            .get(&ViewAngle::Front)
            .ok_or(EngineError::InvalidReference {
                physical_cm: height,
                pixel_extent: 0.0,
            })?;
        let scale = ScaleFactor::from_height(front, height)?;

        let mut per_view = BTreeMap::new();
        for (view, pose) in &self.captured {
            if let Some(engine_view) = view.engine_view() {
                let set = engine.measure(pose, masks.get(view), scale, engine_view, ratios);
                per_view.insert(*view, set);
            }
        }

        Ok(SessionMeasurements { scale, per_view })
    }
}
