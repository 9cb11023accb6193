use serde::Serialize;
use std::time::Duration;
use tracing::trace;

use super::faults::{detect_faults, FaultFlags};
use super::features::{extract_features, BodyPixels};
use super::phase::{AnalyzerState, Phase, PhaseEvent};
use super::scoring::RepResult;
use super::view::{classify_view, ViewState};
use super::visibility::check_visibility;
use crate::config::{AnalyzerConfig, Config, ScoringConfig};
use crate::pose::{FrameSize, LandmarkFrame};

/// Per-frame output record for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameAnalysis {
    pub phase: Phase,
    pub rep_count: u32,
    pub correct_reps: u32,
    pub incorrect_reps: u32,
    pub left_knee_angle: f32,
    pub right_knee_angle: f32,
    pub knee_angle: f32,
    pub torso_angle: f32,
    pub symmetry_diff: f32,
    pub view: ViewState,
    pub faults: FaultFlags,
    pub feedback: String,
    /// Advice of the last completed rep, empty before the first
    pub advice: String,
    pub last_rep: Option<RepResult>,
    pub event: Option<PhaseEvent>,
}

impl FrameAnalysis {
    fn degraded(state: &AnalyzerState, message: &str) -> Self {
        Self {
            phase: state.phase(),
            rep_count: state.rep_count(),
            correct_reps: state.correct_reps(),
            incorrect_reps: state.incorrect_reps(),
            left_knee_angle: 0.0,
            right_knee_angle: 0.0,
            knee_angle: 0.0,
            torso_angle: 0.0,
            symmetry_diff: 0.0,
            view: ViewState::unknown(),
            faults: FaultFlags::default(),
            feedback: message.to_string(),
            advice: last_advice(state),
            last_rep: state.last_rep().cloned(),
            event: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.view == ViewState::unknown()
    }
}

fn last_advice(state: &AnalyzerState) -> String {
    state
        .last_rep()
        .map(|r| r.advice.clone())
        .unwrap_or_default()
}

/// Immediate warning shown while the subject is loaded, in priority order.
fn instant_warning(faults: &FaultFlags) -> Option<&'static str> {
    if !faults.any() {
        return None;
    }
    let warning = if faults.valgus {
        "Push knees out!"
    } else if faults.knee_over_toe {
        "Knees over toes!"
    } else if faults.heel_lift {
        "Keep heels down!"
    } else {
        "Keep chest up!"
    };
    Some(warning)
}

/// スクワット解析器（設定のみ保持、状態は呼び出し側が所有）
#[derive(Debug, Clone, Default)]
pub struct SquatAnalyzer {
    analyzer: AnalyzerConfig,
    scoring: ScoringConfig,
}

impl SquatAnalyzer {
    pub fn new(analyzer: AnalyzerConfig, scoring: ScoringConfig) -> Self {
        Self { analyzer, scoring }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.analyzer.clone(), config.scoring.clone())
    }

    /// Fresh per-person state matching this analyzer's debounce setting.
    pub fn new_state(&self) -> AnalyzerState {
        AnalyzerState::new(&self.analyzer)
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.analyzer
    }

    /// Analyse one frame. `frame == None` means no body was detected.
    ///
    /// `now` is the frame timestamp relative to stream start. Frames must be
    /// delivered in order for a given `state`.
    pub fn analyze(
        &self,
        state: &mut AnalyzerState,
        frame: Option<&LandmarkFrame>,
        size: FrameSize,
        now: Duration,
    ) -> FrameAnalysis {
        let (frame, visibility) = match check_visibility(frame, self.analyzer.visibility_threshold) {
            Ok(passed) => passed,
            Err(rejection) => {
                trace!(?rejection, "frame skipped");
                return FrameAnalysis::degraded(state, rejection.message());
            }
        };

        let body = BodyPixels::from_frame(frame, size);
        let view = classify_view(&body.torso(), visibility, self.analyzer.side_view_ratio);
        let features = extract_features(&body, view, self.analyzer.vertical_reference_px);
        let faults = detect_faults(&body, view, features.torso_angle, &self.analyzer);

        let event = state.advance(
            features.knee_angle,
            features.symmetry_diff,
            now,
            &self.analyzer,
            &self.scoring,
        );
        state.rep.record(features.knee_angle, &faults);

        let feedback = match instant_warning(&faults) {
            Some(warning) if state.phase().is_loaded() => warning.to_string(),
            _ => state.feedback().to_string(),
        };

        FrameAnalysis {
            phase: state.phase(),
            rep_count: state.rep_count(),
            correct_reps: state.correct_reps(),
            incorrect_reps: state.incorrect_reps(),
            left_knee_angle: features.left_knee_angle,
            right_knee_angle: features.right_knee_angle,
            knee_angle: features.knee_angle,
            torso_angle: features.torso_angle,
            symmetry_diff: features.symmetry_diff,
            view,
            faults,
            feedback,
            advice: last_advice(state),
            last_rep: state.last_rep().cloned(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::view::{ActiveSide, View};
    use crate::pose::{Landmark, LandmarkIndex};

    const SIZE: FrameSize = FrameSize { width: 1000, height: 1000 };

    /// Front-facing body with a given knee angle (degrees) on both legs.
    ///
    /// Thigh is vertical and the shin swings inward in the image plane, so the
    /// hip-knee-ankle angle equals `knee_deg` without narrowing the knees
    /// relative to the ankles.
    fn front_frame(knee_deg: f32) -> LandmarkFrame {
        let mut frame = LandmarkFrame::default();
        let shin = 0.15;
        let bend = (180.0 - knee_deg).to_radians();
        let (sin_b, cos_b) = bend.sin_cos();
        for (sign, side) in [(1.0f32, &LandmarkIndex::LEFT_SIDE), (-1.0, &LandmarkIndex::RIGHT_SIDE)] {
            let x = 0.5 + sign * 0.1;
            let knee = (x, 0.6);
            let ankle = (x - sign * shin * sin_b, 0.6 + shin * cos_b);
            let points = [
                (x, 0.2),            // shoulder
                (x, 0.45),           // hip
                knee,                // knee
                ankle,               // ankle
                (ankle.0, ankle.1 + 0.02), // heel
                (ankle.0, ankle.1 + 0.02), // toe
            ];
            for (idx, (px, py)) in side.iter().zip(points) {
                frame.set(*idx, Landmark::new(px, py, 0.0, 0.9));
            }
        }
        frame
    }

    fn run(
        analyzer: &SquatAnalyzer,
        state: &mut AnalyzerState,
        now: &mut Duration,
        knee_deg: f32,
        frames: usize,
    ) -> Vec<FrameAnalysis> {
        (0..frames)
            .map(|_| {
                *now += Duration::from_millis(100);
                let frame = front_frame(knee_deg);
                let out = analyzer.analyze(state, Some(&frame), SIZE, *now);
                assert_eq!(out.rep_count, out.correct_reps + out.incorrect_reps);
                out
            })
            .collect()
    }

    #[test]
    fn test_front_frame_geometry() {
        let analyzer = SquatAnalyzer::default();
        let mut state = analyzer.new_state();
        let out = analyzer.analyze(&mut state, Some(&front_frame(100.0)), SIZE, Duration::ZERO);
        assert_eq!(out.view.view, View::Front);
        assert_eq!(out.view.active_side, ActiveSide::Both);
        assert!((out.knee_angle - 100.0).abs() < 1.5, "knee {}", out.knee_angle);
        assert!(out.torso_angle.abs() < 0.5);
        assert!(!out.faults.valgus);
    }

    #[test]
    fn test_no_person_is_degraded() {
        let analyzer = SquatAnalyzer::default();
        let mut state = analyzer.new_state();
        let out = analyzer.analyze(&mut state, None, SIZE, Duration::ZERO);
        assert_eq!(out.view.view, View::Unknown);
        assert_eq!(out.feedback, "No person detected");
        assert_eq!(out.rep_count, 0);
        assert!(out.event.is_none());
        assert!(out.is_degraded());
    }

    #[test]
    fn test_hidden_body_is_degraded() {
        let analyzer = SquatAnalyzer::default();
        let mut state = analyzer.new_state();
        let frame = LandmarkFrame::default();
        let out = analyzer.analyze(&mut state, Some(&frame), SIZE, Duration::ZERO);
        assert_eq!(out.view.view, View::Unknown);
        assert_eq!(out.feedback, "Show full body!");
    }

    #[test]
    fn test_degraded_frames_do_not_touch_state() {
        let analyzer = SquatAnalyzer::default();
        let mut state = analyzer.new_state();
        let mut now = Duration::ZERO;
        run(&analyzer, &mut state, &mut now, 170.0, 3);
        run(&analyzer, &mut state, &mut now, 120.0, 2);
        let pending = state.phase_confirm_counter();

        for _ in 0..20 {
            now += Duration::from_millis(100);
            let out = analyzer.analyze(&mut state, None, SIZE, now);
            assert_eq!(out.rep_count, 0);
            assert_eq!(out.phase, Phase::Standing);
        }
        assert_eq!(state.phase(), Phase::Standing);
        assert_eq!(state.phase_confirm_counter(), pending);
    }

    #[test]
    fn test_full_rep_through_pipeline() {
        let analyzer = SquatAnalyzer::default();
        let mut state = analyzer.new_state();
        let mut now = Duration::ZERO;
        let mut outputs = Vec::new();
        for (angle, frames) in [(170.0, 5), (130.0, 6), (70.0, 12), (130.0, 6), (170.0, 6)] {
            outputs.extend(run(&analyzer, &mut state, &mut now, angle, frames));
        }

        let completed: Vec<_> = outputs
            .iter()
            .filter(|o| o.event == Some(PhaseEvent::RepCompleted))
            .collect();
        assert_eq!(completed.len(), 1);

        let last = outputs.last().unwrap();
        assert_eq!(last.rep_count, 1);
        assert_eq!(last.phase, Phase::Standing);
        let rep = last.last_rep.as_ref().unwrap();
        assert!(rep.min_knee_angle < 75.0);
        assert_eq!(last.advice, rep.advice);
        assert!(last.feedback.starts_with("Rep 1: "));
    }

    #[test]
    fn test_degraded_keeps_last_rep() {
        let analyzer = SquatAnalyzer::default();
        let mut state = analyzer.new_state();
        let mut now = Duration::ZERO;
        for (angle, frames) in [(170.0, 5), (130.0, 6), (70.0, 12), (130.0, 6), (170.0, 6)] {
            run(&analyzer, &mut state, &mut now, angle, frames);
        }
        let out = analyzer.analyze(&mut state, None, SIZE, now);
        assert_eq!(out.rep_count, 1);
        assert!(out.last_rep.is_some());
        assert_eq!(out.view, ViewState::unknown());
    }

    #[test]
    fn test_instant_warning_only_while_loaded() {
        let analyzer = SquatAnalyzer::default();
        let mut state = analyzer.new_state();
        let mut now = Duration::ZERO;

        let mut frame = front_frame(170.0);
        let lifted = |f: &mut LandmarkFrame| {
            let toe = *f.get(LandmarkIndex::LeftFootIndex);
            f.set(LandmarkIndex::LeftHeel, Landmark::new(toe.x, toe.y - 0.05, 0.0, 0.9));
        };
        lifted(&mut frame);
        let out = analyzer.analyze(&mut state, Some(&frame), SIZE, now);
        assert!(out.faults.heel_lift);
        assert_ne!(out.feedback, "Keep heels down!");

        run(&analyzer, &mut state, &mut now, 130.0, 4);
        assert_eq!(state.phase(), Phase::Descending);

        let mut frame = front_frame(130.0);
        lifted(&mut frame);
        now += Duration::from_millis(100);
        let out = analyzer.analyze(&mut state, Some(&frame), SIZE, now);
        assert_eq!(out.feedback, "Keep heels down!");
        // persisted phase feedback is untouched
        assert_eq!(state.feedback(), "Descending...");
    }

    #[test]
    fn test_instant_warning_priority() {
        assert_eq!(instant_warning(&FaultFlags::default()), None);
        let lean = FaultFlags { forward_lean: true, ..FaultFlags::default() };
        assert_eq!(instant_warning(&lean), Some("Keep chest up!"));
        let heel_and_lean = FaultFlags { heel_lift: true, ..lean };
        assert_eq!(instant_warning(&heel_and_lean), Some("Keep heels down!"));
        let all = FaultFlags { valgus: true, knee_over_toe: true, heel_lift: true, forward_lean: true };
        assert_eq!(instant_warning(&all), Some("Push knees out!"));
    }
}
