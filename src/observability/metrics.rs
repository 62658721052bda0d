//! Metrics collection.
//!
//! Prometheus-compatible metrics with label cardinality protection and
//! typed convenience functions for recording measurements. Character
//! ids never become labels; trigger kinds come from configuration and
//! are sanitized before use.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::engine::PhaseTransition;
use crate::error::ProgressionError;
use crate::profile::{BehaviorType, TriggerKind};

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Maximum length for trigger kind labels.
///
/// Kind names come from user config and are used directly as Prometheus
/// labels. This caps the label length to prevent cardinality issues.
const MAX_KIND_LABEL_LEN: usize = 64;

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without
/// an HTTP endpoint.
///
/// # Errors
///
/// Returns `ProgressionError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), ProgressionError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| ProgressionError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "progression_interactions_total",
        "Total number of interactions processed"
    );
    describe_counter!(
        "progression_triggers_detected_total",
        "Trigger events produced by detection"
    );
    describe_counter!(
        "progression_triggers_dropped_total",
        "Detected trigger events dropped for lack of an active profile"
    );
    describe_counter!(
        "progression_phase_transitions_total",
        "Total number of phase transitions"
    );
    describe_counter!(
        "progression_param_clamps_total",
        "Out-of-range parameters clamped into [0, 1]"
    );
}

/// Records one processed interaction.
pub fn record_interaction() {
    counter!("progression_interactions_total").increment(1);
}

/// Records a detected trigger event.
pub fn record_trigger_detected(kind: &TriggerKind, behavior_type: BehaviorType) {
    counter!(
        "progression_triggers_detected_total",
        "kind" => sanitize_kind_label(kind.as_str()),
        "behavior_type" => behavior_type.as_str(),
    )
    .increment(1);
}

/// Records a detected event dropped because no profile was active.
pub fn record_dropped_event(kind: &TriggerKind) {
    counter!(
        "progression_triggers_dropped_total",
        "kind" => sanitize_kind_label(kind.as_str()),
    )
    .increment(1);
}

/// Records a phase transition.
pub fn record_phase_transition(transition: &PhaseTransition) {
    let reason = match transition.reason {
        crate::profile::PhaseExitReason::NaturalProgression => "advance",
        crate::profile::PhaseExitReason::Regression => "regression",
        crate::profile::PhaseExitReason::Reset => "reset",
    };
    counter!(
        "progression_phase_transitions_total",
        "behavior_type" => transition.behavior_type.as_str(),
        "reason" => reason,
    )
    .increment(1);
}

/// Records a clamped parameter by field name.
///
/// Field names are compile-time constants, never user input.
pub fn record_param_clamp(field: &str) {
    counter!("progression_param_clamps_total", "field" => field.to_owned()).increment(1);
}

/// Sanitizes a trigger kind for use as a metrics label.
///
/// Truncates to [`MAX_KIND_LABEL_LEN`] characters and replaces any
/// characters invalid in Prometheus labels with underscores.
fn sanitize_kind_label(kind: &str) -> String {
    kind.chars()
        .take(MAX_KIND_LABEL_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::profile::PhaseExitReason;

    #[test]
    fn test_sanitize_passthrough() {
        assert_eq!(sanitize_kind_label("abandonment_signal"), "abandonment_signal");
    }

    #[test]
    fn test_sanitize_replaces_invalid_chars() {
        assert_eq!(sanitize_kind_label("weird kind!"), "weird_kind_");
    }

    #[test]
    fn test_sanitize_truncates_long_kinds() {
        let long = "x".repeat(10_000);
        assert_eq!(sanitize_kind_label(&long).len(), MAX_KIND_LABEL_LEN);
    }

    #[test]
    fn test_record_functions_do_not_panic_without_recorder() {
        // metrics macros silently no-op when no global recorder is installed
        record_interaction();
        record_trigger_detected(
            &TriggerKind::new("criticism"),
            BehaviorType::NarcissisticPd,
        );
        record_dropped_event(&TriggerKind::new("criticism"));
        record_phase_transition(&PhaseTransition {
            behavior_type: BehaviorType::YandereObsessive,
            from_phase: 1,
            to_phase: 2,
            reason: PhaseExitReason::NaturalProgression,
            at: Utc::now(),
        });
        record_param_clamp("volatility");
    }
}
