//! In-memory holder for API keys and passwords.
//!
//! Three kinds of value pass through this type: the password typed at
//! unlock time, the decrypted provider API key, and the session copy the
//! coordinator hands to surfaces. None of them may reach logs, and all of
//! them are wiped when dropped.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Placeholder printed instead of the value.
const REDACTED: &str = "[REDACTED]";

/// Characters shown at each end by [`SecretString::masked`].
const HINT_HEAD: usize = 4;
const HINT_TAIL: usize = 3;

/// A credential or password, zeroized on drop and never formatted.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    inner: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Wrap user input, dropping the whitespace a paste or a terminal
    /// newline leaves around an API key.
    pub fn from_input(mut raw: String) -> Self {
        let trimmed = Self::new(raw.trim());
        raw.zeroize();
        trimmed
    }

    /// The plaintext, for the encrypt call, the auth header, or the wire
    /// message that needs it.
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Length in characters, as password rules count it.
    pub fn char_count(&self) -> usize {
        self.inner.chars().count()
    }

    /// Hint for status lines, e.g. `sk-t…123` for `sk-test-123`.
    ///
    /// Keys too short to leave anything hidden are masked completely.
    pub fn masked(&self) -> String {
        let count = self.char_count();
        if count <= 2 * HINT_HEAD {
            return "*".repeat(count);
        }
        let head: String = self.inner.chars().take(HINT_HEAD).collect();
        let tail: String = self.inner.chars().skip(count - HINT_TAIL).collect();
        format!("{head}…{tail}")
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// Compared without early exit so the health check's "key unchanged" test
/// does not leak a prefix length through timing.
impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.inner.as_bytes(), other.inner.as_bytes());
        a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl Eq for SecretString {}

// The plaintext goes over the wire: `storeApiKeyInBackground` and
// `getApiKeyForSession` carry the real key between contexts.
impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
