//! Per-frame biomechanical fault rules.
//!
//! Each rule is independent and evaluated on every analysed frame. A single
//! positive frame only feeds a counter; scoring decides what is sustained.

use serde::Serialize;

use super::features::{BodyPixels, SidePixels};
use super::view::{View, ViewState};
use crate::config::AnalyzerConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FaultFlags {
    pub valgus: bool,
    pub knee_over_toe: bool,
    pub heel_lift: bool,
    pub forward_lean: bool,
}

impl FaultFlags {
    pub fn any(&self) -> bool {
        self.valgus || self.knee_over_toe || self.heel_lift || self.forward_lean
    }
}

/// Knees closer together than `ratio` × ankle width (strict).
pub fn knee_valgus(body: &BodyPixels, ratio: f32) -> bool {
    let knee_width = (body.left.knee.x - body.right.knee.x).abs() as f32;
    let ankle_width = (body.left.ankle.x - body.right.ankle.x).abs() as f32;
    if ankle_width <= 0.0 {
        return false;
    }
    knee_width / ankle_width < ratio
}

/// Knee travels past the toe by more than `tolerance` in the facing direction.
pub fn knee_over_toe(side: &SidePixels, tolerance: i32) -> bool {
    let facing_left = side.toe.x < side.ankle.x;
    if facing_left {
        side.knee.x < side.toe.x - tolerance
    } else {
        side.knee.x > side.toe.x + tolerance
    }
}

/// Heel sits higher on screen (smaller y) than the toe by more than `tolerance`.
pub fn heel_lift(side: &SidePixels, tolerance: i32) -> bool {
    side.heel.y < side.toe.y - tolerance
}

/// Torso incline above horizontal below `min_incline`.
pub fn forward_lean(torso_angle: f32, min_incline: f32) -> bool {
    90.0 - torso_angle < min_incline
}

/// 左右膝角度差が閾値を超えるか（レップ完了時のみ評価）
pub fn asymmetric(symmetry_diff: f32, threshold: f32) -> bool {
    symmetry_diff > threshold
}

pub fn detect_faults(
    body: &BodyPixels,
    view: ViewState,
    torso_angle: f32,
    config: &AnalyzerConfig,
) -> FaultFlags {
    let mut flags = FaultFlags {
        forward_lean: forward_lean(torso_angle, config.min_torso_incline),
        ..FaultFlags::default()
    };

    match view.view {
        View::Front => {
            flags.valgus = knee_valgus(body, config.valgus_ratio);
            flags.heel_lift = heel_lift(&body.left, config.heel_lift_tolerance_px)
                || heel_lift(&body.right, config.heel_lift_tolerance_px);
        }
        View::Side => {
            let side = body.active(view.active_side);
            flags.knee_over_toe = knee_over_toe(side, config.knee_over_toe_tolerance_px);
            flags.heel_lift = heel_lift(side, config.heel_lift_tolerance_px);
        }
        View::Unknown => {}
    }

    flags
}
