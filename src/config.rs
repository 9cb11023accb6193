use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("phase thresholds must satisfy deep < descend < stand (got {deep} / {descend} / {stand})")]
    PhaseThresholds { deep: f32, descend: f32, stand: f32 },

    #[error("{name} must be within (0, 1], got {value}")]
    Ratio { name: &'static str, value: f32 },

    #[error("critical frame count for {name} ({critical}) is below its score frame count ({score})")]
    CriticalBelowScore {
        name: &'static str,
        critical: u32,
        score: u32,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// フレーム単位の解析パラメータ
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Per-point visibility must exceed this for a side to count as visible
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f32,
    /// shoulder_width / torso_height below this means SIDE view
    #[serde(default = "default_side_view_ratio")]
    pub side_view_ratio: f32,
    /// 胴体角度の鉛直基準点（腰の何ピクセル上か）
    #[serde(default = "default_vertical_reference_px")]
    pub vertical_reference_px: i32,
    #[serde(default = "default_stand_threshold")]
    pub stand_threshold: f32,
    #[serde(default = "default_descend_threshold")]
    pub descend_threshold: f32,
    #[serde(default = "default_deep_threshold")]
    pub deep_threshold: f32,
    /// BOTTOM → ASCENDING fires above deep_threshold + this
    #[serde(default = "default_bottom_exit_margin")]
    pub bottom_exit_margin: f32,
    /// A transition commits once its condition held for more than this many frames
    #[serde(default = "default_debounce_frames")]
    pub debounce_frames: u32,
    /// 秒
    #[serde(default = "default_min_rep_duration")]
    pub min_rep_duration: f32,
    #[serde(default = "default_valgus_ratio")]
    pub valgus_ratio: f32,
    #[serde(default = "default_knee_over_toe_tolerance_px")]
    pub knee_over_toe_tolerance_px: i32,
    #[serde(default = "default_heel_lift_tolerance_px")]
    pub heel_lift_tolerance_px: i32,
    /// Torso incline above horizontal (90° - lean) below this is a forward lean
    #[serde(default = "default_min_torso_incline")]
    pub min_torso_incline: f32,
}

fn default_visibility_threshold() -> f32 { 0.5 }
fn default_side_view_ratio() -> f32 { 0.4 }
fn default_vertical_reference_px() -> i32 { 100 }
fn default_stand_threshold() -> f32 { 160.0 }
fn default_descend_threshold() -> f32 { 140.0 }
fn default_deep_threshold() -> f32 { 80.0 }
fn default_bottom_exit_margin() -> f32 { 10.0 }
fn default_debounce_frames() -> u32 { 3 }
fn default_min_rep_duration() -> f32 { 1.0 }
fn default_valgus_ratio() -> f32 { 0.63 }
fn default_knee_over_toe_tolerance_px() -> i32 { 30 }
fn default_heel_lift_tolerance_px() -> i32 { 15 }
fn default_min_torso_incline() -> f32 { 50.0 }

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: default_visibility_threshold(),
            side_view_ratio: default_side_view_ratio(),
            vertical_reference_px: default_vertical_reference_px(),
            stand_threshold: default_stand_threshold(),
            descend_threshold: default_descend_threshold(),
            deep_threshold: default_deep_threshold(),
            bottom_exit_margin: default_bottom_exit_margin(),
            debounce_frames: default_debounce_frames(),
            min_rep_duration: default_min_rep_duration(),
            valgus_ratio: default_valgus_ratio(),
            knee_over_toe_tolerance_px: default_knee_over_toe_tolerance_px(),
            heel_lift_tolerance_px: default_heel_lift_tolerance_px(),
            min_torso_incline: default_min_torso_incline(),
        }
    }
}

/// レップ採点パラメータ
///
/// `*_frames` は減点用、`critical_*_frames` は正誤判定用（より厳しい閾値）。
/// どちらも「フレーム数がこの値を超えたら」成立する。
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// min knee angle above this: too shallow (always critical)
    #[serde(default = "default_shallow_depth")]
    pub shallow_depth: f32,
    /// min knee angle above this: borderline depth
    #[serde(default = "default_borderline_depth")]
    pub borderline_depth: f32,
    /// descent faster than this (seconds) is a dive bomb
    #[serde(default = "default_fast_descent")]
    pub fast_descent: f32,
    #[serde(default = "default_asymmetry_threshold")]
    pub asymmetry_threshold: f32,

    #[serde(default = "default_shallow_points")]
    pub shallow_points: u32,
    #[serde(default = "default_borderline_points")]
    pub borderline_points: u32,
    #[serde(default = "default_tempo_points")]
    pub tempo_points: u32,
    #[serde(default = "default_asymmetry_points")]
    pub asymmetry_points: u32,
    #[serde(default = "default_back_lean_points")]
    pub back_lean_points: u32,
    #[serde(default = "default_valgus_points")]
    pub valgus_points: u32,
    #[serde(default = "default_knee_over_toe_points")]
    pub knee_over_toe_points: u32,
    #[serde(default = "default_heel_lift_points")]
    pub heel_lift_points: u32,

    #[serde(default = "default_fault_frames")]
    pub valgus_frames: u32,
    #[serde(default = "default_fault_frames")]
    pub knee_over_toe_frames: u32,
    #[serde(default = "default_fault_frames")]
    pub heel_lift_frames: u32,
    #[serde(default = "default_fault_frames")]
    pub back_lean_frames: u32,

    #[serde(default = "default_critical_frames")]
    pub critical_valgus_frames: u32,
    #[serde(default = "default_critical_frames")]
    pub critical_knee_over_toe_frames: u32,
    #[serde(default = "default_critical_frames")]
    pub critical_heel_lift_frames: u32,
    #[serde(default = "default_critical_frames")]
    pub critical_back_lean_frames: u32,
}

fn default_shallow_depth() -> f32 { 90.0 }
fn default_borderline_depth() -> f32 { 80.0 }
fn default_fast_descent() -> f32 { 1.0 }
fn default_asymmetry_threshold() -> f32 { 10.0 }
fn default_shallow_points() -> u32 { 20 }
fn default_borderline_points() -> u32 { 10 }
fn default_tempo_points() -> u32 { 10 }
fn default_asymmetry_points() -> u32 { 10 }
fn default_back_lean_points() -> u32 { 10 }
fn default_valgus_points() -> u32 { 15 }
fn default_knee_over_toe_points() -> u32 { 15 }
fn default_heel_lift_points() -> u32 { 15 }
fn default_fault_frames() -> u32 { 5 }
fn default_critical_frames() -> u32 { 10 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            shallow_depth: default_shallow_depth(),
            borderline_depth: default_borderline_depth(),
            fast_descent: default_fast_descent(),
            asymmetry_threshold: default_asymmetry_threshold(),
            shallow_points: default_shallow_points(),
            borderline_points: default_borderline_points(),
            tempo_points: default_tempo_points(),
            asymmetry_points: default_asymmetry_points(),
            back_lean_points: default_back_lean_points(),
            valgus_points: default_valgus_points(),
            knee_over_toe_points: default_knee_over_toe_points(),
            heel_lift_points: default_heel_lift_points(),
            valgus_frames: default_fault_frames(),
            knee_over_toe_frames: default_fault_frames(),
            heel_lift_frames: default_fault_frames(),
            back_lean_frames: default_fault_frames(),
            critical_valgus_frames: default_critical_frames(),
            critical_knee_over_toe_frames: default_critical_frames(),
            critical_heel_lift_frames: default_critical_frames(),
            critical_back_lean_frames: default_critical_frames(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::parse(&content)?;
        Ok(config)
    }

    /// 読み込みに失敗したらデフォルト値で続行
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                warn!("using default config ({}): {:#}", path.as_ref().display(), e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analyzer;
        if !(a.deep_threshold < a.descend_threshold && a.descend_threshold < a.stand_threshold) {
            return Err(ConfigError::PhaseThresholds {
                deep: a.deep_threshold,
                descend: a.descend_threshold,
                stand: a.stand_threshold,
            });
        }
        for (name, value) in [
            ("visibility_threshold", a.visibility_threshold),
            ("side_view_ratio", a.side_view_ratio),
            ("valgus_ratio", a.valgus_ratio),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Ratio { name, value });
            }
        }

        let s = &self.scoring;
        for (name, critical, score) in [
            ("valgus", s.critical_valgus_frames, s.valgus_frames),
            ("knee_over_toe", s.critical_knee_over_toe_frames, s.knee_over_toe_frames),
            ("heel_lift", s.critical_heel_lift_frames, s.heel_lift_frames),
            ("back_lean", s.critical_back_lean_frames, s.back_lean_frames),
        ] {
            if critical < score {
                return Err(ConfigError::CriticalBelowScore { name, critical, score });
            }
        }
        Ok(())
    }
}
