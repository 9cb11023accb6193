//! Visibility gate: decides whether a frame carries a usable body.

use crate::pose::{LandmarkFrame, LandmarkIndex};

/// Which body sides have all six tracked points visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SideVisibility {
    pub left: bool,
    pub right: bool,
}

impl SideVisibility {
    pub fn any(&self) -> bool {
        self.left || self.right
    }

    pub fn both(&self) -> bool {
        self.left && self.right
    }
}

/// Why a frame was rejected before analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    NoPerson,
    BodyNotVisible,
}

impl GateRejection {
    pub fn message(&self) -> &'static str {
        match self {
            GateRejection::NoPerson => "No person detected",
            GateRejection::BodyNotVisible => "Show full body!",
        }
    }
}

fn side_visible(frame: &LandmarkFrame, side: &[LandmarkIndex], threshold: f32) -> bool {
    side.iter().all(|&idx| frame.get(idx).is_visible(threshold))
}

/// Pass a usable frame through together with its side visibility.
pub fn check_visibility(
    frame: Option<&LandmarkFrame>,
    threshold: f32,
) -> Result<(&LandmarkFrame, SideVisibility), GateRejection> {
    let frame = frame.ok_or(GateRejection::NoPerson)?;
    let visibility = SideVisibility {
        left: side_visible(frame, &LandmarkIndex::LEFT_SIDE, threshold),
        right: side_visible(frame, &LandmarkIndex::RIGHT_SIDE, threshold),
    };
    if visibility.any() {
        Ok((frame, visibility))
    } else {
        Err(GateRejection::BodyNotVisible)
    }
}
