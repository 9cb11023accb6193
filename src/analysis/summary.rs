//! Session-level aggregation over completed reps.

use serde::Serialize;
use std::collections::BTreeMap;

use super::scoring::{Fault, RepResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub total_reps: u32,
    pub correct_reps: u32,
    pub incorrect_reps: u32,
    pub average_score: f32,
    pub best_score: Option<u32>,
    pub worst_score: Option<u32>,
    /// Most frequent deduction; ties go to the higher-priority fault
    pub most_common_fault: Option<Fault>,
}

impl SessionSummary {
    pub fn from_results(results: &[RepResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }

        let total_reps = results.len() as u32;
        let incorrect_reps = results.iter().filter(|r| r.critical).count() as u32;
        let score_sum: u32 = results.iter().map(|r| r.score).sum();

        let mut counts: BTreeMap<Fault, u32> = BTreeMap::new();
        for deduction in results.iter().flat_map(|r| r.deductions.iter()) {
            *counts.entry(deduction.fault).or_default() += 1;
        }
        // priority order; only a strictly higher count takes the lead
        let most_common_fault = counts
            .iter()
            .fold(None::<(Fault, u32)>, |best, (&fault, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((fault, count)),
            })
            .map(|(fault, _)| fault);

        Self {
            total_reps,
            correct_reps: total_reps - incorrect_reps,
            incorrect_reps,
            average_score: score_sum as f32 / total_reps as f32,
            best_score: results.iter().map(|r| r.score).max(),
            worst_score: results.iter().map(|r| r.score).min(),
            most_common_fault,
        }
    }
}
