//! Rep phase state machine.
//!
//! STANDING → DESCENDING → BOTTOM → ASCENDING → STANDING, each step debounced
//! through a [`HysteresisGate`]. The only shortcut is DESCENDING → STANDING,
//! which aborts a rep that never reached depth as soon as the knee opens up.

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use super::faults::FaultFlags;
use super::gate::HysteresisGate;
use super::scoring::{score_rep, RepResult};
use crate::config::{AnalyzerConfig, ScoringConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Standing,
    Descending,
    Bottom,
    Ascending,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Standing => "STANDING",
            Phase::Descending => "DESCENDING",
            Phase::Bottom => "BOTTOM",
            Phase::Ascending => "ASCENDING",
        }
    }

    /// DESCENDING / BOTTOM: instant warnings are shown in these phases
    pub fn is_loaded(&self) -> bool {
        matches!(self, Phase::Descending | Phase::Bottom)
    }
}

/// What the phase machine did on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseEvent {
    Descending,
    Bottom,
    Ascending,
    Aborted,
    RepCompleted,
    RepIgnoredTooFast,
}

/// Per-rep statistics, reset when DESCENDING commits.
#[derive(Debug, Clone, PartialEq)]
pub struct RepAccumulator {
    pub min_knee_angle: f32,
    pub rep_start: Duration,
    pub bottom_start: Duration,
    pub ascent_start: Duration,
    pub descent_duration: Duration,
    pub bottom_duration: Duration,
    pub valgus_frames: u32,
    pub knee_over_toe_frames: u32,
    pub heel_lift_frames: u32,
    pub back_lean_frames: u32,
}

impl Default for RepAccumulator {
    fn default() -> Self {
        Self {
            min_knee_angle: 180.0,
            rep_start: Duration::ZERO,
            bottom_start: Duration::ZERO,
            ascent_start: Duration::ZERO,
            descent_duration: Duration::ZERO,
            bottom_duration: Duration::ZERO,
            valgus_frames: 0,
            knee_over_toe_frames: 0,
            heel_lift_frames: 0,
            back_lean_frames: 0,
        }
    }
}

impl RepAccumulator {
    pub fn start(now: Duration) -> Self {
        Self {
            rep_start: now,
            ..Self::default()
        }
    }

    pub fn record(&mut self, knee_angle: f32, faults: &FaultFlags) {
        self.min_knee_angle = self.min_knee_angle.min(knee_angle);
        self.valgus_frames += faults.valgus as u32;
        self.knee_over_toe_frames += faults.knee_over_toe as u32;
        self.heel_lift_frames += faults.heel_lift as u32;
        self.back_lean_frames += faults.forward_lean as u32;
    }

    /// 下降 + ボトム + 上昇 の合計時間
    pub fn total_duration(&self, now: Duration) -> Duration {
        let ascent = now.saturating_sub(self.ascent_start);
        self.descent_duration + self.bottom_duration + ascent
    }
}

/// Long-lived per-person analysis state. Owned by the caller and threaded
/// through every [`SquatAnalyzer::analyze`](super::SquatAnalyzer::analyze) call.
#[derive(Debug, Clone)]
pub struct AnalyzerState {
    pub(crate) phase: Phase,
    pub(crate) gate: HysteresisGate<Phase>,
    pub(crate) rep_count: u32,
    pub(crate) correct_reps: u32,
    pub(crate) incorrect_reps: u32,
    pub(crate) rep: RepAccumulator,
    pub(crate) last_rep: Option<RepResult>,
    /// Feedback set by the last transition; persists until the next one
    pub(crate) feedback: String,
}

impl AnalyzerState {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            phase: Phase::Standing,
            gate: HysteresisGate::new(config.debounce_frames),
            rep_count: 0,
            correct_reps: 0,
            incorrect_reps: 0,
            rep: RepAccumulator::default(),
            last_rep: None,
            feedback: String::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending_phase(&self) -> Option<Phase> {
        self.gate.pending()
    }

    pub fn phase_confirm_counter(&self) -> u32 {
        self.gate.count()
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn correct_reps(&self) -> u32 {
        self.correct_reps
    }

    pub fn incorrect_reps(&self) -> u32 {
        self.incorrect_reps
    }

    pub fn rep_accumulator(&self) -> &RepAccumulator {
        &self.rep
    }

    pub fn last_rep(&self) -> Option<&RepResult> {
        self.last_rep.as_ref()
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    /// The transition whose condition holds for `knee_angle` in the current phase.
    fn candidate(&self, knee_angle: f32, config: &AnalyzerConfig) -> Option<Phase> {
        match self.phase {
            Phase::Standing if knee_angle < config.descend_threshold => Some(Phase::Descending),
            Phase::Descending if knee_angle < config.deep_threshold => Some(Phase::Bottom),
            Phase::Bottom if knee_angle > config.deep_threshold + config.bottom_exit_margin => {
                Some(Phase::Ascending)
            }
            Phase::Ascending if knee_angle > config.stand_threshold => Some(Phase::Standing),
            _ => None,
        }
    }

    /// Feed one frame's knee angle through the machine.
    pub fn advance(
        &mut self,
        knee_angle: f32,
        symmetry_diff: f32,
        now: Duration,
        config: &AnalyzerConfig,
        scoring: &ScoringConfig,
    ) -> Option<PhaseEvent> {
        if self.phase == Phase::Descending && knee_angle > config.descend_threshold {
            self.gate.reset();
            self.phase = Phase::Standing;
            self.feedback = "Aborted: go deeper!".to_string();
            info!(knee_angle, "rep aborted before reaching depth");
            return Some(PhaseEvent::Aborted);
        }

        // debounce length comes from the caller's config
        self.gate.set_required(config.debounce_frames);
        let candidate = self.candidate(knee_angle, config);
        let next = self.gate.step(candidate)?;
        debug!(from = self.phase.name(), to = next.name(), knee_angle, "phase commit");
        self.phase = next;

        let event = match next {
            Phase::Descending => {
                self.rep = RepAccumulator::start(now);
                self.feedback = "Descending...".to_string();
                PhaseEvent::Descending
            }
            Phase::Bottom => {
                self.rep.bottom_start = now;
                self.rep.descent_duration = now.saturating_sub(self.rep.rep_start);
                self.feedback = "Hold bottom...".to_string();
                PhaseEvent::Bottom
            }
            Phase::Ascending => {
                self.rep.bottom_duration = now.saturating_sub(self.rep.bottom_start);
                self.rep.ascent_start = now;
                self.feedback = "Push up!".to_string();
                PhaseEvent::Ascending
            }
            Phase::Standing => self.finish_rep(symmetry_diff, now, config, scoring),
        };
        Some(event)
    }

    fn finish_rep(
        &mut self,
        symmetry_diff: f32,
        now: Duration,
        config: &AnalyzerConfig,
        scoring: &ScoringConfig,
    ) -> PhaseEvent {
        let total = self.rep.total_duration(now).as_secs_f32();
        if total < config.min_rep_duration {
            self.feedback = "Rep ignored: too fast".to_string();
            info!(total_secs = total, "rep ignored: too fast");
            return PhaseEvent::RepIgnoredTooFast;
        }

        self.rep_count += 1;
        let result = score_rep(&self.rep, symmetry_diff, scoring);
        if result.critical {
            self.incorrect_reps += 1;
        } else {
            self.correct_reps += 1;
        }
        info!(
            rep = self.rep_count,
            score = result.score,
            depth = result.min_knee_angle,
            critical = result.critical,
            "rep completed: {}",
            result.comments
        );
        self.feedback = format!("Rep {}: {}", self.rep_count, result.comments);
        self.last_rep = Some(result);
        PhaseEvent::RepCompleted
    }
}

impl Default for AnalyzerState {
    fn default() -> Self {
        Self::new(&AnalyzerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Driver {
        state: AnalyzerState,
        config: AnalyzerConfig,
        scoring: ScoringConfig,
        now: Duration,
        events: Vec<PhaseEvent>,
    }

    impl Driver {
        fn new() -> Self {
            let config = AnalyzerConfig::default();
            Self {
                state: AnalyzerState::new(&config),
                config,
                scoring: ScoringConfig::default(),
                now: Duration::ZERO,
                events: Vec::new(),
            }
        }

        /// 1フレーム = 100ms
        fn feed(&mut self, angle: f32, frames: usize) {
            for _ in 0..frames {
                self.now += Duration::from_millis(100);
                self.state.rep.record(angle, &FaultFlags::default());
                if let Some(e) = self.state.advance(angle, 0.0, self.now, &self.config, &self.scoring) {
                    self.events.push(e);
                }
            }
        }
    }

    #[test]
    fn test_noise_dip_does_not_leave_standing() {
        let mut d = Driver::new();
        d.feed(170.0, 5);
        d.feed(120.0, 3); // exactly the debounce count, not more
        d.feed(170.0, 5);
        assert_eq!(d.state.phase(), Phase::Standing);
        assert!(d.events.is_empty());
        assert_eq!(d.state.phase_confirm_counter(), 0);
    }

    #[test]
    fn test_debounce_follows_config_passed_to_advance() {
        let mut d = Driver::new();
        d.state = AnalyzerState::default();
        d.config.debounce_frames = 1;
        d.feed(120.0, 2);
        assert_eq!(d.state.phase(), Phase::Descending);
        assert_eq!(d.events, vec![PhaseEvent::Descending]);

        let mut slow = Driver::new();
        slow.config.debounce_frames = 6;
        slow.feed(120.0, 6);
        assert_eq!(slow.state.phase(), Phase::Standing);
        slow.feed(120.0, 1);
        assert_eq!(slow.state.phase(), Phase::Descending);
    }

    #[test]
    fn test_counter_resets_when_condition_breaks() {
        let mut d = Driver::new();
        d.feed(120.0, 2);
        assert_eq!(d.state.pending_phase(), Some(Phase::Descending));
        assert_eq!(d.state.phase_confirm_counter(), 2);
        d.feed(150.0, 1);
        assert_eq!(d.state.pending_phase(), None);
        assert_eq!(d.state.phase_confirm_counter(), 0);
    }

    #[test]
    fn test_full_rep_sequence() {
        let mut d = Driver::new();
        d.feed(170.0, 5);
        d.feed(130.0, 6);
        d.feed(70.0, 6);
        d.feed(130.0, 6);
        d.feed(170.0, 6);

        assert_eq!(
            d.events,
            vec![
                PhaseEvent::Descending,
                PhaseEvent::Bottom,
                PhaseEvent::Ascending,
                PhaseEvent::RepCompleted,
            ]
        );
        assert_eq!(d.state.rep_count(), 1);
        assert_eq!(d.state.correct_reps() + d.state.incorrect_reps(), 1);
        let result = d.state.last_rep().unwrap();
        assert_eq!(result.min_knee_angle, 70.0);
        assert!(d.state.feedback().starts_with("Rep 1: "));
    }

    #[test]
    fn test_descent_duration_stamped_at_bottom() {
        let mut d = Driver::new();
        d.feed(130.0, 4); // commits DESCENDING on frame 4 (t=0.4s)
        d.feed(70.0, 4); // commits BOTTOM on frame 8 (t=0.8s)
        assert_eq!(d.state.phase(), Phase::Bottom);
        assert_eq!(d.state.rep_accumulator().descent_duration, Duration::from_millis(400));
    }

    #[test]
    fn test_abort_is_immediate() {
        let mut d = Driver::new();
        d.feed(130.0, 4);
        assert_eq!(d.state.phase(), Phase::Descending);
        d.feed(150.0, 1);
        assert_eq!(d.state.phase(), Phase::Standing);
        assert_eq!(d.events.last(), Some(&PhaseEvent::Aborted));
        assert_eq!(d.state.rep_count(), 0);
        assert_eq!(d.state.feedback(), "Aborted: go deeper!");
    }

    #[test]
    fn test_too_fast_rep_is_ignored() {
        let mut d = Driver::new();
        d.config.debounce_frames = 0;
        d.state = AnalyzerState::new(&d.config);
        d.feed(130.0, 1);
        d.feed(70.0, 1);
        d.feed(130.0, 1);
        d.feed(170.0, 1);
        assert_eq!(d.events.last(), Some(&PhaseEvent::RepIgnoredTooFast));
        assert_eq!(d.state.phase(), Phase::Standing);
        assert_eq!(d.state.rep_count(), 0);
        assert_eq!(d.state.correct_reps(), 0);
        assert_eq!(d.state.incorrect_reps(), 0);
        assert!(d.state.last_rep().is_none());
    }

    #[test]
    fn test_shallow_rep_counts_incorrect() {
        let mut d = Driver::new();
        d.config.deep_threshold = 100.0;
        d.state = AnalyzerState::new(&d.config);
        d.feed(130.0, 6);
        d.feed(95.0, 6);
        d.feed(120.0, 6);
        d.feed(170.0, 6);
        assert_eq!(d.state.rep_count(), 1);
        assert_eq!(d.state.incorrect_reps(), 1);
        assert_eq!(d.state.correct_reps(), 0);
        assert!(d.state.last_rep().unwrap().critical);
    }

    #[test]
    fn test_accumulator_reset_on_descent() {
        let mut acc = RepAccumulator::start(Duration::from_secs(3));
        acc.record(90.0, &FaultFlags { valgus: true, ..FaultFlags::default() });
        assert_eq!(acc.valgus_frames, 1);
        assert_eq!(acc.min_knee_angle, 90.0);

        let mut d = Driver::new();
        d.state.rep = acc;
        d.feed(130.0, 4);
        assert_eq!(d.state.rep_accumulator().valgus_frames, 0);
        assert_eq!(d.state.rep_accumulator().rep_start, Duration::from_millis(400));
    }
}
