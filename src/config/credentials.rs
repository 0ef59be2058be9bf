//! Secret handling for connection credentials.
//!
//! Credentials are wrapped so they never show up in `Debug`/`Display`
//! output and are wiped from memory when dropped.

use zeroize::Zeroizing;

/// Wrapper for sensitive strings that prevents accidental logging.
///
/// The inner value is never exposed via Debug or Display traits and is
/// zeroed on drop. Use `expose()` to access the actual value when handing
/// it to the transport.
#[derive(Clone)]
pub struct SecureString(Zeroizing<String>);

impl SecureString {
    /// Create a new secure string.
    pub fn new(value: String) -> Self {
        Self(Zeroizing::new(value))
    }

    /// Expose the inner value.
    ///
    /// Use sparingly and only when actually authenticating.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(••••••••)")
    }
}

impl std::fmt::Display for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "••••••••")
    }
}
