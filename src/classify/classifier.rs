//! Classifier: raw transport signal → [`FailureKind`].

use crate::classify::rules::{classification_rules, ClassificationRule};
use crate::error::FailureKind;
use crate::transport::{ErrorLayer, RawSignal};

/// Classify a raw signal against the built-in rule table.
///
/// Pure and deterministic.
pub fn classify(signal: &RawSignal) -> FailureKind {
    classify_with(signal, &classification_rules())
}

/// Classify a raw signal against the given rules.
///
/// The longest matching needle wins; the code and the message are both
/// searched. Errors that match nothing fall back to
/// [`FailureKind::ProtocolError`] when they came from the protocol layer and
/// to [`FailureKind::Unknown`] otherwise.
pub fn classify_with(signal: &RawSignal, rules: &[ClassificationRule]) -> FailureKind {
    let err = match signal {
        RawSignal::Timeout => return FailureKind::Timeout,
        RawSignal::Error(err) => err,
    };

    let haystacks: Vec<String> = err
        .code
        .iter()
        .map(|code| code.to_lowercase())
        .chain(std::iter::once(err.message.to_lowercase()))
        .collect();

    let mut best: Option<(usize, FailureKind)> = None;
    for rule in rules {
        for needle in rule.needles {
            let needle_lower = needle.to_lowercase();
            if !haystacks.iter().any(|h| h.contains(&needle_lower)) {
                continue;
            }
            // Strictly longer only, so earlier rules win ties
            if best.map_or(true, |(len, _)| needle.len() > len) {
                best = Some((needle.len(), rule.kind));
            }
        }
    }

    match best {
        Some((_, kind)) => kind,
        None if err.layer == ErrorLayer::Protocol => FailureKind::ProtocolError,
        None => FailureKind::Unknown,
    }
}
