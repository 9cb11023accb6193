use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use squat_coach::analysis::{PhaseEvent, RepResult, SessionSummary, SquatAnalyzer};
use squat_coach::config::Config;
use squat_coach::render::hud_lines;
use squat_coach::replay::{read_replay, ReplayError};

const CONFIG_PATH: &str = "config.toml";

fn usage() -> String {
    "usage: squat_replay <recording.jsonl> [analysis.jsonl]".to_string()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(input_path) = args.get(1) else {
        bail!(usage());
    };
    let output_path = args.get(2);

    info!("Squat replay {}", env!("GIT_VERSION"));
    let config = Config::load_or_default(CONFIG_PATH);
    info!(
        "thresholds: stand={} descend={} deep={} debounce={} min_rep={}s",
        config.analyzer.stand_threshold,
        config.analyzer.descend_threshold,
        config.analyzer.deep_threshold,
        config.analyzer.debounce_frames,
        config.analyzer.min_rep_duration,
    );

    let input = File::open(input_path).with_context(|| format!("Failed to open {}", input_path))?;
    let mut output = match output_path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
            Some(BufWriter::new(file))
        }
        None => None,
    };

    let analyzer = SquatAnalyzer::from_config(&config);
    let mut state = analyzer.new_state();
    let mut results: Vec<RepResult> = Vec::new();
    let mut frames = 0usize;
    let mut degraded = 0usize;

    for entry in read_replay(BufReader::new(input)) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e @ ReplayError::Io { .. }) => {
                return Err(e).with_context(|| format!("Failed to read {}", input_path));
            }
            Err(e) => {
                // 壊れた行はスキップして続行
                warn!("{}", e);
                continue;
            }
        };

        let analysis = analyzer.analyze(&mut state, entry.frame.as_ref(), entry.size, entry.timestamp);
        frames += 1;
        if analysis.is_degraded() {
            degraded += 1;
        }

        if analysis.event == Some(PhaseEvent::RepCompleted) {
            if let Some(rep) = &analysis.last_rep {
                results.push(rep.clone());
            }
            for line in hud_lines(&analysis) {
                info!("  {}", line);
            }
        }

        if let Some(out) = output.as_mut() {
            serde_json::to_writer(&mut *out, &analysis)?;
            out.write_all(b"\n")?;
        }
    }

    if let Some(mut out) = output {
        out.flush()?;
    }

    let summary = SessionSummary::from_results(&results);
    info!("frames: {} ({} without a usable body)", frames, degraded);
    info!(
        "reps: {} (correct {}, incorrect {})",
        summary.total_reps, summary.correct_reps, summary.incorrect_reps
    );
    if let (Some(best), Some(worst)) = (summary.best_score, summary.worst_score) {
        info!(
            "score: avg {:.1}, best {}, worst {}",
            summary.average_score, best, worst
        );
    }
    if let Some(fault) = summary.most_common_fault {
        info!("most common fault: {} -> {}", fault.label(), fault.advice());
    }

    Ok(())
}
