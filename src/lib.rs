//! `progression` — behavior progression engine for character simulation
//!
//! This library models per-character psychological behavior patterns as a
//! deterministic state machine: conversation text is scanned for weighted
//! trigger signals, each behavior's bounded intensity evolves through
//! escalation and idle decay, and discrete narrative phases advance or
//! regress through intensity thresholds with hysteresis. The resulting
//! phase classifies into a safety tier consumed by moderation and
//! analytics.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod observability;
pub mod profile;
pub mod safety;
