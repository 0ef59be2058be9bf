//! Transport error classification.
//!
//! ```text
//! RawSignal → match against rule table → FailureKind
//! ```
//!
//! The rule table is data, so it can be tested and extended without touching
//! control flow. Message text for each kind lives on
//! [`FailureKind::user_message`](crate::error::FailureKind::user_message).

mod classifier;
mod rules;

pub use classifier::{classify, classify_with};
pub use rules::{classification_rules, ClassificationRule};
