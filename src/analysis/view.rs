//! FRONT / SIDE framing and active side selection.

use serde::Serialize;

use super::visibility::SideVisibility;
use crate::pose::PixelPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum View {
    Front,
    Side,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActiveSide {
    Left,
    Right,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub view: View,
    pub active_side: ActiveSide,
}

impl ViewState {
    pub fn unknown() -> Self {
        Self {
            view: View::Unknown,
            active_side: ActiveSide::Both,
        }
    }

    pub fn front() -> Self {
        Self {
            view: View::Front,
            active_side: ActiveSide::Both,
        }
    }

    pub fn side(active_side: ActiveSide) -> Self {
        Self {
            view: View::Side,
            active_side,
        }
    }
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Front => "FRONT",
            View::Side => "SIDE",
            View::Unknown => "UNKNOWN",
        }
    }
}

/// Torso geometry used to tell framing apart.
#[derive(Debug, Clone, Copy)]
pub struct TorsoPixels {
    pub left_shoulder: PixelPoint,
    pub right_shoulder: PixelPoint,
    pub left_hip: PixelPoint,
    pub right_hip: PixelPoint,
    /// カメラ基準の肩の奥行き（小さいほど手前）
    pub left_shoulder_z: f32,
    pub right_shoulder_z: f32,
}

/// Classify camera framing for one frame.
///
/// A narrow shoulder line relative to torso height means the body is in
/// profile. A zero-height torso falls back to FRONT.
pub fn classify_view(torso: &TorsoPixels, visibility: SideVisibility, side_ratio: f32) -> ViewState {
    let shoulder_width = (torso.left_shoulder.x - torso.right_shoulder.x).abs() as f32;
    let shoulder_y = (torso.left_shoulder.y + torso.right_shoulder.y) as f32 / 2.0;
    let hip_y = (torso.left_hip.y + torso.right_hip.y) as f32 / 2.0;
    let torso_height = (shoulder_y - hip_y).abs();

    if torso_height <= 0.0 || shoulder_width / torso_height >= side_ratio {
        return ViewState::front();
    }

    let mut side = if torso.left_shoulder_z < torso.right_shoulder_z {
        ActiveSide::Left
    } else {
        ActiveSide::Right
    };

    // 片側しか見えていなければ奥行きより可視性を優先
    if visibility.left && !visibility.right {
        side = ActiveSide::Left;
    } else if visibility.right && !visibility.left {
        side = ActiveSide::Right;
    }

    ViewState::side(side)
}
