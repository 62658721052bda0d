//! `simulate` command: replay a transcript through the engine.
//!
//! Each non-empty transcript line is one user message. Simulated time
//! advances by a fixed interval per message; a `+<hours>h ` prefix adds
//! an extra gap, which is how delayed-response triggers are exercised
//! from a flat text file.

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::info;

use crate::aggregate::ProgressionState;
use crate::cli::args::{OutputFormat, SimulateArgs};
use crate::config::loader::{LoaderOptions, load_or_builtin};
use crate::engine::{PhaseTransition, ProgressionEngine, TriggerStats};
use crate::error::{ConfigError, ProgressionError};
use crate::observability::init_metrics;
use crate::profile::{BehaviorType, CharacterId};
use crate::safety::SafetyTier;

/// Final per-profile summary line.
#[derive(Debug, Serialize)]
struct ProfileSummary {
    behavior_type: BehaviorType,
    phase: u32,
    intensity: f64,
    safety: SafetyTier,
    displayed: bool,
}

/// Full simulation report, also the JSON output shape.
#[derive(Debug, Serialize)]
struct SimulationReport {
    character: String,
    messages: usize,
    events_applied: usize,
    events_dropped: usize,
    transitions: Vec<PhaseTransition>,
    profiles: Vec<ProfileSummary>,
    state: ProgressionState,
    top_triggers: Vec<TriggerStats>,
}

/// Runs the `simulate` command.
///
/// # Errors
///
/// Fails on unknown behavior names, config problems, unreadable
/// transcripts, and any engine error during replay.
pub fn run(args: &SimulateArgs) -> Result<(), ProgressionError> {
    let behaviors = parse_behaviors(&args.behaviors)?;
    let loaded = load_or_builtin(args.config.as_deref(), LoaderOptions::default())?;
    if args.metrics_port.is_some() {
        init_metrics(args.metrics_port)?;
    }
    let engine = ProgressionEngine::new(loaded.config)?;

    let character = CharacterId::new(args.character.clone());
    let mut timestamp = Utc::now();
    for &behavior_type in &behaviors {
        engine.activate(&character, behavior_type, timestamp)?;
    }

    let transcript = std::fs::read_to_string(&args.transcript)?;
    let mut report = SimulationReport {
        character: args.character.clone(),
        messages: 0,
        events_applied: 0,
        events_dropped: 0,
        transitions: Vec::new(),
        profiles: Vec::new(),
        state: ProgressionState::from_profiles(&[], crate::aggregate::SentimentCounts::default()),
        top_triggers: Vec::new(),
    };

    for line in transcript.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (extra_gap_hours, text) = parse_line(line);
        timestamp += Duration::minutes(i64::from(args.interval_minutes));
        if let Some(hours) = extra_gap_hours {
            timestamp += Duration::seconds((hours * 3600.0) as i64);
        }
        report.messages += 1;
        let message_id = format!("msg-{}", report.messages);
        let outcome = engine.process_interaction(&character, &message_id, text, timestamp)?;
        report.events_applied += outcome.events.len();
        report.events_dropped += outcome.dropped_events;
        report.transitions.extend(outcome.transitions);
    }

    for &behavior_type in &behaviors {
        let profile = engine.get_profile(&character, behavior_type)?;
        report.profiles.push(ProfileSummary {
            behavior_type,
            phase: profile.current_phase,
            intensity: profile.current_intensity,
            safety: engine.get_safety_level(&character, behavior_type)?,
            displayed: profile.is_displayed(),
        });
    }
    report.state = engine.get_progression_state(&character);
    report.top_triggers = engine.top_triggers(10);

    info!(
        messages = report.messages,
        transitions = report.transitions.len(),
        "simulation complete"
    );
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Human => print_human(&report),
    }
    Ok(())
}

fn parse_behaviors(names: &[String]) -> Result<Vec<BehaviorType>, ProgressionError> {
    names
        .iter()
        .map(|name| {
            BehaviorType::parse(name).ok_or_else(|| {
                ConfigError::InvalidValue {
                    field: "--behaviors".to_string(),
                    value: name.clone(),
                    expected: "a known behavior type (e.g. YANDERE_OBSESSIVE)".to_string(),
                }
                .into()
            })
        })
        .collect()
}

/// Splits an optional `+<hours>h ` prefix off a transcript line.
fn parse_line(line: &str) -> (Option<f64>, &str) {
    let Some(rest) = line.strip_prefix('+') else {
        return (None, line);
    };
    let Some((hours, text)) = rest.split_once("h ") else {
        return (None, line);
    };
    match hours.parse::<f64>() {
        Ok(hours) if hours.is_finite() && hours >= 0.0 => (Some(hours), text.trim_start()),
        _ => (None, line),
    }
}

fn print_human(report: &SimulationReport) {
    println!(
        "processed {} message(s) for {}",
        report.messages, report.character
    );
    println!(
        "trigger events: {} applied, {} dropped",
        report.events_applied, report.events_dropped
    );
    if !report.transitions.is_empty() {
        println!("phase transitions:");
        for t in &report.transitions {
            println!(
                "  {} {} -> {} ({:?})",
                t.behavior_type, t.from_phase, t.to_phase, t.reason
            );
        }
    }
    println!("final profiles:");
    for p in &report.profiles {
        println!(
            "  {:<26} phase {:<2} intensity {:.3} safety {:<14} displayed: {}",
            p.behavior_type.to_string(),
            p.phase,
            p.intensity,
            p.safety.to_string(),
            p.displayed
        );
    }
    if !report.top_triggers.is_empty() {
        println!("top triggers:");
        for s in &report.top_triggers {
            println!(
                "  {:<22} count {:<4} avg weight {:.3}",
                s.kind.to_string(),
                s.count,
                s.avg_weight
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_parse_line_without_prefix() {
        assert_eq!(parse_line("hello there"), (None, "hello there"));
    }

    #[test]
    fn test_parse_line_with_gap_prefix() {
        let (gap, text) = parse_line("+26h hello again");
        assert_eq!(gap, Some(26.0));
        assert_eq!(text, "hello again");
    }

    #[test]
    fn test_parse_line_fractional_gap() {
        let (gap, text) = parse_line("+3.5h hey");
        assert_eq!(gap, Some(3.5));
        assert_eq!(text, "hey");
    }

    #[test]
    fn test_parse_line_malformed_prefix_is_text() {
        assert_eq!(parse_line("+notahour hello"), (None, "+notahour hello"));
        assert_eq!(parse_line("+h hello"), (None, "+h hello"));
        assert_eq!(parse_line("+-3h hello"), (None, "+-3h hello"));
    }

    #[test]
    fn test_parse_behaviors() {
        let parsed = parse_behaviors(&["YANDERE_OBSESSIVE".to_string()]).unwrap();
        assert_eq!(parsed, vec![BehaviorType::YandereObsessive]);
        assert!(parse_behaviors(&["NOT_A_TYPE".to_string()]).is_err());
    }

    #[test]
    fn test_run_end_to_end() {
        let mut transcript = tempfile::NamedTempFile::new().unwrap();
        writeln!(transcript, "I'm leaving you").unwrap();
        writeln!(transcript).unwrap();
        writeln!(transcript, "+26h hello?").unwrap();
        writeln!(transcript, "we're done, it's over").unwrap();
        transcript.flush().unwrap();

        let args = SimulateArgs {
            config: None,
            transcript: transcript.path().to_path_buf(),
            character: "test-char".to_string(),
            behaviors: vec!["ANXIOUS_ATTACHMENT".to_string()],
            interval_minutes: 5,
            metrics_port: None,
            format: OutputFormat::Json,
        };
        run(&args).unwrap();
    }

    #[test]
    fn test_run_rejects_unknown_behavior() {
        let transcript = tempfile::NamedTempFile::new().unwrap();
        let args = SimulateArgs {
            config: None,
            transcript: transcript.path().to_path_buf(),
            character: "c".to_string(),
            behaviors: vec!["WHAT".to_string()],
            interval_minutes: 5,
            metrics_port: None,
            format: OutputFormat::Human,
        };
        assert!(run(&args).is_err());
    }
}
