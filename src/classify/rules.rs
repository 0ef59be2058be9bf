//! Classification rules, the single source of truth for error matching.

use crate::error::FailureKind;

/// A single classification rule.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    /// Needles matched case-insensitively against the error code and message.
    pub needles: &'static [&'static str],
    /// Kind produced when one of the needles matches.
    pub kind: FailureKind,
}

/// Build the complete rule table.
///
/// Order matters only for ties: when two rules match with needles of equal
/// length, the earlier one wins.
pub fn classification_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule {
            needles: &["ETIMEDOUT", "timed out", "timeout"],
            kind: FailureKind::Timeout,
        },
        ClassificationRule {
            needles: &["ECONNREFUSED", "connection refused"],
            kind: FailureKind::ConnectionRefused,
        },
        ClassificationRule {
            needles: &["authentication", "auth"],
            kind: FailureKind::AuthenticationFailed,
        },
        ClassificationRule {
            needles: &[
                "ENETUNREACH",
                "EHOSTUNREACH",
                "network is unreachable",
                "no route to host",
            ],
            kind: FailureKind::NetworkUnreachable,
        },
        ClassificationRule {
            needles: &["handshake", "decode", "protocol"],
            kind: FailureKind::ProtocolError,
        },
    ]
}
