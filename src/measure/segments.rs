use crate::pose::KeypointIndex;

use KeypointIndex::*;

/// 正面ビューの体節テーブル
///
/// 2点はその距離、3点は折れ線長（複合長）として測る。
pub const FRONT_SEGMENTS: &[(&str, &[KeypointIndex])] = &[
    ("shoulder_width", &[LeftShoulder, RightShoulder]),
    ("chest_width", &[LeftShoulder, RightShoulder]),
    ("hip_width", &[LeftHip, RightHip]),
    ("waist_width", &[LeftHip, RightHip]),
    ("arm_span", &[LeftWrist, RightWrist]),
    ("knee_width", &[LeftKnee, RightKnee]),
    ("ankle_width", &[LeftAnkle, RightAnkle]),
    ("left_upper_arm", &[LeftShoulder, LeftElbow]),
    ("right_upper_arm", &[RightShoulder, RightElbow]),
    ("left_forearm", &[LeftElbow, LeftWrist]),
    ("right_forearm", &[RightElbow, RightWrist]),
    ("left_arm_length", &[LeftShoulder, LeftElbow, LeftWrist]),
    ("right_arm_length", &[RightShoulder, RightElbow, RightWrist]),
    ("left_thigh", &[LeftHip, LeftKnee]),
    ("right_thigh", &[RightHip, RightKnee]),
    ("left_calf", &[LeftKnee, LeftAnkle]),
    ("right_calf", &[RightKnee, RightAnkle]),
    ("left_leg_length", &[LeftHip, LeftKnee, LeftAnkle]),
    ("right_leg_length", &[RightHip, RightKnee, RightAnkle]),
    ("torso_length", &[LeftShoulder, LeftHip]),
    ("shoulder_to_knee", &[LeftShoulder, LeftKnee]),
    ("neck_to_waist", &[Nose, LeftHip]),
];

/// 側面ビューの体節テーブル
pub const SIDE_SEGMENTS: &[(&str, &[KeypointIndex])] = &[
    ("torso_length", &[LeftShoulder, LeftHip]),
    ("shoulder_to_hip", &[LeftShoulder, LeftHip]),
    ("hip_to_ankle", &[LeftHip, LeftAnkle]),
    ("full_height", &[Nose, LeftAnkle]),
];
