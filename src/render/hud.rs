use crate::analysis::{FrameAnalysis, Phase};

/// Score at or above this is shown as a good rep
pub const GOOD_SCORE: u32 = 80;

/// Dashboard text for one analysed frame, top to bottom.
pub fn hud_lines(analysis: &FrameAnalysis) -> Vec<String> {
    let mut lines = Vec::with_capacity(8);

    let marker = if analysis.phase == Phase::Bottom { " *" } else { "" };
    lines.push(format!("State: {}{}", analysis.phase.name(), marker));
    lines.push(format!("Reps: {}", analysis.rep_count));
    lines.push(format!(
        "Correct: {}  Incorrect: {}",
        analysis.correct_reps, analysis.incorrect_reps
    ));

    if !analysis.feedback.is_empty() {
        lines.push(analysis.feedback.clone());
    }
    if !analysis.advice.is_empty() {
        lines.push(format!("Advice: {}", analysis.advice));
    }

    let score = analysis.last_rep.as_ref().map_or(0, |r| r.score);
    let verdict = if score >= GOOD_SCORE { "good" } else { "needs work" };
    lines.push(format!("Last Score: {} ({})", score, verdict));

    if analysis.faults.valgus {
        lines.push("KNEE VALGUS!".to_string());
    }
    lines.push(format!("View: {}", analysis.view.view.name()));

    lines
}
