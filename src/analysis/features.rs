//! Pixel-space geometry for one frame.

use super::angle::calculate_angle;
use super::view::{ActiveSide, TorsoPixels, View, ViewState};
use crate::pose::{FrameSize, LandmarkFrame, LandmarkIndex, PixelPoint};

/// 片側の下半身＋肩のピクセル座標
#[derive(Debug, Clone, Copy, Default)]
pub struct SidePixels {
    pub shoulder: PixelPoint,
    pub hip: PixelPoint,
    pub knee: PixelPoint,
    pub ankle: PixelPoint,
    pub heel: PixelPoint,
    pub toe: PixelPoint,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BodyPixels {
    pub left: SidePixels,
    pub right: SidePixels,
    pub left_shoulder_z: f32,
    pub right_shoulder_z: f32,
}

impl BodyPixels {
    pub fn from_frame(frame: &LandmarkFrame, size: FrameSize) -> Self {
        use LandmarkIndex::*;
        let px = |idx| frame.pixel(idx, size);
        Self {
            left: SidePixels {
                shoulder: px(LeftShoulder),
                hip: px(LeftHip),
                knee: px(LeftKnee),
                ankle: px(LeftAnkle),
                heel: px(LeftHeel),
                toe: px(LeftFootIndex),
            },
            right: SidePixels {
                shoulder: px(RightShoulder),
                hip: px(RightHip),
                knee: px(RightKnee),
                ankle: px(RightAnkle),
                heel: px(RightHeel),
                toe: px(RightFootIndex),
            },
            left_shoulder_z: frame.get(LeftShoulder).z,
            right_shoulder_z: frame.get(RightShoulder).z,
        }
    }

    pub fn torso(&self) -> TorsoPixels {
        TorsoPixels {
            left_shoulder: self.left.shoulder,
            right_shoulder: self.right.shoulder,
            left_hip: self.left.hip,
            right_hip: self.right.hip,
            left_shoulder_z: self.left_shoulder_z,
            right_shoulder_z: self.right_shoulder_z,
        }
    }

    /// SIDE view: the side facing the camera. FRONT falls back to left.
    pub fn active(&self, side: ActiveSide) -> &SidePixels {
        match side {
            ActiveSide::Right => &self.right,
            ActiveSide::Left | ActiveSide::Both => &self.left,
        }
    }
}

/// Joint angles derived from one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Features {
    pub left_knee_angle: f32,
    pub right_knee_angle: f32,
    pub left_torso_angle: f32,
    pub right_torso_angle: f32,
    /// 状態機械に渡す膝角度
    pub knee_angle: f32,
    /// Torso lean from vertical, 0° when upright
    pub torso_angle: f32,
    /// |left - right| knee angle, FRONT only
    pub symmetry_diff: f32,
}

fn knee_angle(side: &SidePixels) -> f32 {
    calculate_angle(side.hip, side.knee, side.ankle)
}

fn torso_angle(side: &SidePixels, reference_px: i32) -> f32 {
    let vertical = PixelPoint::new(side.hip.x, side.hip.y - reference_px);
    calculate_angle(vertical, side.hip, side.shoulder)
}

pub fn extract_features(body: &BodyPixels, view: ViewState, reference_px: i32) -> Features {
    let left_knee_angle = knee_angle(&body.left);
    let right_knee_angle = knee_angle(&body.right);
    let left_torso_angle = torso_angle(&body.left, reference_px);
    let right_torso_angle = torso_angle(&body.right, reference_px);

    let (knee_angle, torso_angle, symmetry_diff) = match (view.view, view.active_side) {
        (View::Side, ActiveSide::Left) => (left_knee_angle, left_torso_angle, 0.0),
        (View::Side, ActiveSide::Right) => (right_knee_angle, right_torso_angle, 0.0),
        _ => (
            (left_knee_angle + right_knee_angle) / 2.0,
            (left_torso_angle + right_torso_angle) / 2.0,
            (left_knee_angle - right_knee_angle).abs(),
        ),
    };

    Features {
        left_knee_angle,
        right_knee_angle,
        left_torso_angle,
        right_torso_angle,
        knee_angle,
        torso_angle,
        symmetry_diff,
    }
}
