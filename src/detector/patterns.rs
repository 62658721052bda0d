//! Built-in trigger catalog.
//!
//! Seven stock trigger kinds with regex patterns and routing to the
//! behavior types they provoke. Everything here is a default; a
//! configuration file replaces the catalog wholesale.

use indexmap::IndexMap;

use crate::config::schema::TriggerKindConfig;
use crate::profile::{BehaviorType, TriggerDirection, TriggerKind};

/// Kind name for the time-based trigger. It has no patterns; the engine
/// fires it from the gap since the previous message.
pub const DELAYED_RESPONSE: &str = "delayed_response";

const ABANDONMENT_PATTERNS: &[&str] = &[
    r"\b(leave|leaving|left)\s+(me|you|us)\b",
    r"\bgoodbye\b",
    r"\bbreak\s+up\b",
    r"\bwalk(ing)?\s+away\b",
    r"\bdon'?t\s+want\s+to\s+talk\s+to\s+you\b",
];

const CRITICISM_PATTERNS: &[&str] = &[
    r"\byou('re|\s+are)\s+(so\s+)?(wrong|bad|terrible|awful|useless|pathetic)\b",
    r"\bi\s+hate\s+(it\s+)?when\s+you\b",
    r"\bthat\s+was\s+(stupid|dumb|embarrassing)\b",
    r"\byou\s+never\s+listen\b",
    r"\byou\s+always\s+(ruin|mess\s+up)\b",
];

const MENTION_OTHER_PATTERNS: &[&str] = &[
    r"\bmy\s+(friend|coworker|colleague|ex|boyfriend|girlfriend|partner)\b",
    r"\bsomeone\s+(else|new)\b",
    r"\bi\s+met\s+(someone|a\s+guy|a\s+girl)\b",
    r"\bhanging\s+out\s+with\b",
];

const BOUNDARY_PATTERNS: &[&str] = &[
    r"\bi\s+need\s+(some\s+)?(space|time|distance)\b",
    r"\bstop\s+(texting|calling|asking|checking)\b",
    r"\bdon'?t\s+(do|say)\s+that\b",
    r"\bback\s+off\b",
    r"\bthat('s|\s+is)\s+too\s+much\b",
];

const REASSURANCE_PATTERNS: &[&str] = &[
    r"\bi\s+(love|care\s+about|adore)\s+you\b",
    r"\bi('m|\s+am)\s+not\s+(going\s+anywhere|leaving)\b",
    r"\byou('re|\s+are)\s+(safe|enough|amazing|wonderful)\b",
    r"\bi('ll|\s+will)\s+(always\s+)?be\s+(here|there)\b",
];

const REJECTION_PATTERNS: &[&str] = &[
    r"\bi\s+don'?t\s+love\s+you\b",
    r"\bwe('re|\s+are)\s+(done|over|through)\b",
    r"\bit'?s\s+over\b",
    r"\bi\s+never\s+want\s+to\s+(see|talk\s+to)\s+you\b",
    r"\bget\s+out\s+of\s+my\s+life\b",
];

fn kind(
    patterns: &[&str],
    weight: f64,
    direction: TriggerDirection,
    behaviors: &[BehaviorType],
) -> TriggerKindConfig {
    TriggerKindConfig {
        patterns: patterns.iter().map(ToString::to_string).collect(),
        weight,
        direction,
        behaviors: behaviors.to_vec(),
    }
}

/// The built-in trigger catalog, in a stable declaration order.
#[must_use]
pub fn builtin_triggers() -> IndexMap<TriggerKind, TriggerKindConfig> {
    use BehaviorType::{
        AnxiousAttachment, AvoidantAttachment, BorderlinePd, Codependency,
        DisorganizedAttachment, NarcissisticPd, YandereObsessive,
    };
    use TriggerDirection::{Escalate, Soothe};

    let mut triggers = IndexMap::new();
    triggers.insert(
        TriggerKind::new("abandonment_signal"),
        kind(
            ABANDONMENT_PATTERNS,
            0.7,
            Escalate,
            &[
                AnxiousAttachment,
                DisorganizedAttachment,
                YandereObsessive,
                BorderlinePd,
                Codependency,
            ],
        ),
    );
    triggers.insert(
        TriggerKind::new(DELAYED_RESPONSE),
        // Weight here is a fallback; the gap ladder supplies the real one.
        kind(
            &[],
            0.5,
            Escalate,
            &[
                AnxiousAttachment,
                DisorganizedAttachment,
                YandereObsessive,
                BorderlinePd,
            ],
        ),
    );
    triggers.insert(
        TriggerKind::new("criticism"),
        kind(
            CRITICISM_PATTERNS,
            0.8,
            Escalate,
            &[NarcissisticPd, BorderlinePd, AvoidantAttachment],
        ),
    );
    triggers.insert(
        TriggerKind::new("mention_other_person"),
        kind(
            MENTION_OTHER_PATTERNS,
            0.65,
            Escalate,
            &[YandereObsessive, NarcissisticPd, BorderlinePd],
        ),
    );
    triggers.insert(
        TriggerKind::new("boundary_assertion"),
        kind(
            BOUNDARY_PATTERNS,
            0.75,
            Escalate,
            &[YandereObsessive, Codependency, NarcissisticPd],
        ),
    );
    triggers.insert(
        TriggerKind::new("reassurance"),
        kind(
            REASSURANCE_PATTERNS,
            0.3,
            Soothe,
            &[
                AnxiousAttachment,
                DisorganizedAttachment,
                YandereObsessive,
                BorderlinePd,
            ],
        ),
    );
    triggers.insert(
        TriggerKind::new("explicit_rejection"),
        kind(
            REJECTION_PATTERNS,
            1.0,
            Escalate,
            &[
                AnxiousAttachment,
                AvoidantAttachment,
                DisorganizedAttachment,
                YandereObsessive,
                BorderlinePd,
                NarcissisticPd,
                Codependency,
            ],
        ),
    );
    triggers
}

// ============================================================================
// Tests
// ============================================================================
