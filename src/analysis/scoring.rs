//! Rep scoring and advice selection.

use serde::Serialize;

use super::faults::asymmetric;
use super::phase::RepAccumulator;
use crate::config::ScoringConfig;

/// Faults a completed rep can be marked with.
///
/// Declaration order is the advice priority: when several faults are
/// recorded, the earliest variant supplies the advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fault {
    ShallowDepth,
    BorderlineDepth,
    Valgus,
    KneeOverToe,
    HeelLift,
    BackLean,
    FastDescent,
    Asymmetry,
}

impl Fault {
    pub const ALL: [Fault; 8] = [
        Fault::ShallowDepth,
        Fault::BorderlineDepth,
        Fault::Valgus,
        Fault::KneeOverToe,
        Fault::HeelLift,
        Fault::BackLean,
        Fault::FastDescent,
        Fault::Asymmetry,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Fault::ShallowDepth => "Too shallow",
            Fault::BorderlineDepth => "Depth could be better",
            Fault::Valgus => "Knee valgus (caving in)",
            Fault::KneeOverToe => "Knees crossed toes",
            Fault::HeelLift => "Heels lifted",
            Fault::BackLean => "Leaning forward",
            Fault::FastDescent => "Dive bomb (too fast)",
            Fault::Asymmetry => "Asymmetrical",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Fault::ShallowDepth => "Squat deeper! Hips below knees.",
            Fault::BorderlineDepth => "Try to go a bit lower.",
            Fault::Valgus => "Push your knees OUT!",
            Fault::KneeOverToe => "Sit hips BACK. Keep weight on heels.",
            Fault::HeelLift => "Keep heels FLAT on floor.",
            Fault::BackLean => "Keep CHEST UP! Look forward.",
            Fault::FastDescent => "Slow down your descent.",
            Fault::Asymmetry => "Distribute weight evenly.",
        }
    }
}

pub const PERFECT_ADVICE: &str = "Perfect form! Keep it up.";
pub const GOOD_REP_COMMENT: &str = "Good rep!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deduction {
    pub fault: Fault,
    pub points: u32,
}

/// 完了したレップの評価結果（生成後は不変）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepResult {
    /// 0〜100
    pub score: u32,
    pub min_knee_angle: f32,
    /// 秒
    pub descent_secs: f32,
    pub deductions: Vec<Deduction>,
    pub critical_faults: Vec<Fault>,
    /// True when any fault crossed its critical threshold
    pub critical: bool,
    pub comments: String,
    pub advice: String,
}

impl RepResult {
    pub fn has_fault(&self, fault: Fault) -> bool {
        self.deductions.iter().any(|d| d.fault == fault)
    }
}

/// First fault in priority order, or the encouraging message when there are none.
pub fn select_advice(faults: &[Fault]) -> &'static str {
    faults
        .iter()
        .min()
        .map_or(PERFECT_ADVICE, |fault| fault.advice())
}

pub fn score_rep(acc: &RepAccumulator, symmetry_diff: f32, config: &ScoringConfig) -> RepResult {
    let mut deductions = Vec::new();
    let mut deduct = |fault, points| deductions.push(Deduction { fault, points });

    if acc.min_knee_angle > config.shallow_depth {
        deduct(Fault::ShallowDepth, config.shallow_points);
    } else if acc.min_knee_angle > config.borderline_depth {
        deduct(Fault::BorderlineDepth, config.borderline_points);
    }

    let descent_secs = acc.descent_duration.as_secs_f32();
    if descent_secs < config.fast_descent {
        deduct(Fault::FastDescent, config.tempo_points);
    }

    if asymmetric(symmetry_diff, config.asymmetry_threshold) {
        deduct(Fault::Asymmetry, config.asymmetry_points);
    }
    if acc.back_lean_frames > config.back_lean_frames {
        deduct(Fault::BackLean, config.back_lean_points);
    }
    if acc.valgus_frames > config.valgus_frames {
        deduct(Fault::Valgus, config.valgus_points);
    }
    if acc.knee_over_toe_frames > config.knee_over_toe_frames {
        deduct(Fault::KneeOverToe, config.knee_over_toe_points);
    }
    if acc.heel_lift_frames > config.heel_lift_frames {
        deduct(Fault::HeelLift, config.heel_lift_points);
    }

    let total = deductions
        .iter()
        .fold(0u32, |sum, d| sum.saturating_add(d.points));
    let score = 100u32.saturating_sub(total);

    let mut critical_faults = Vec::new();
    if acc.min_knee_angle > config.shallow_depth {
        critical_faults.push(Fault::ShallowDepth);
    }
    if acc.valgus_frames > config.critical_valgus_frames {
        critical_faults.push(Fault::Valgus);
    }
    if acc.knee_over_toe_frames > config.critical_knee_over_toe_frames {
        critical_faults.push(Fault::KneeOverToe);
    }
    if acc.heel_lift_frames > config.critical_heel_lift_frames {
        critical_faults.push(Fault::HeelLift);
    }
    if acc.back_lean_frames > config.critical_back_lean_frames {
        critical_faults.push(Fault::BackLean);
    }

    let recorded: Vec<Fault> = deductions
        .iter()
        .map(|d| d.fault)
        .chain(critical_faults.iter().copied())
        .collect();
    let advice = select_advice(&recorded).to_string();

    let comments = if deductions.is_empty() {
        GOOD_REP_COMMENT.to_string()
    } else {
        deductions
            .iter()
            .map(|d| d.fault.label())
            .collect::<Vec<_>>()
            .join(", ")
    };

    RepResult {
        score,
        min_knee_angle: acc.min_knee_angle,
        descent_secs,
        deductions,
        critical: !critical_faults.is_empty(),
        critical_faults,
        comments,
        advice,
    }
}
