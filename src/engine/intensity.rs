//! Intensity arithmetic.
//!
//! Pure functions over profile parameters. Escalation moves intensity
//! toward 1.0 with a shrinking step as it approaches (the `1 - intensity`
//! factor), decay and soothing move it back toward the baseline, and
//! every delta is scaled by the profile's volatility. All results stay
//! inside the documented bounds by construction.

use tracing::warn;

use crate::observability::metrics;
use crate::profile::ProfileParams;

/// Clamps a parameter or weight into [0, 1], logging when it was out of
/// range. Non-finite input clamps to 0.
#[must_use]
pub fn clamp_unit(field: &str, value: f64) -> f64 {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        return value;
    }
    let clamped = if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    };
    warn!(field, value, clamped, "parameter out of range, clamping");
    metrics::record_param_clamp(field);
    clamped
}

/// Clamps every field of a parameter set into [0, 1].
#[must_use]
pub fn clamp_params(params: ProfileParams) -> ProfileParams {
    ProfileParams {
        base_intensity: clamp_unit("base_intensity", params.base_intensity),
        escalation_rate: clamp_unit("escalation_rate", params.escalation_rate),
        de_escalation_rate: clamp_unit("de_escalation_rate", params.de_escalation_rate),
        volatility: clamp_unit("volatility", params.volatility),
        threshold_for_display: clamp_unit("threshold_for_display", params.threshold_for_display),
    }
}

/// Applies one escalating trigger.
///
/// `delta = escalation_rate * volatility * weight * (1 - intensity)`,
/// result clamped to [0, 1]. The `1 - intensity` factor makes escalation
/// asymptotic: intensity approaches 1.0 but a single in-range trigger
/// never lands exactly on it from below.
#[must_use]
pub fn escalate(intensity: f64, params: &ProfileParams, weight: f64) -> f64 {
    let delta = params.escalation_rate * params.volatility * weight * (1.0 - intensity);
    (intensity + delta).clamp(0.0, 1.0)
}

/// Applies one soothing trigger.
///
/// The decay formula scaled by the event weight:
/// `delta = de_escalation_rate * volatility * weight * (intensity - base)`,
/// result clamped to [base, 1]. Never undershoots the baseline.
#[must_use]
pub fn soothe(intensity: f64, params: &ProfileParams, weight: f64) -> f64 {
    let delta = params.de_escalation_rate * params.volatility * weight
        * (intensity - params.base_intensity);
    (intensity - delta).clamp(params.base_intensity, 1.0)
}

/// Applies idle decay for one interaction with no triggers.
///
/// `delta = de_escalation_rate * volatility * (intensity - base)`,
/// result clamped to [base, 1].
#[must_use]
pub fn decay(intensity: f64, params: &ProfileParams) -> f64 {
    let delta = params.de_escalation_rate * params.volatility
        * (intensity - params.base_intensity);
    (intensity - delta).clamp(params.base_intensity, 1.0)
}

// ============================================================================
// Tests
// ============================================================================
