//! Credential wrappers for API tokens and connection strings
//!
//! OAuth tokens, the client secret and the database connection string are held in
//! `secrecy::Secret` so they are zeroed on drop and never show up in `Debug` output
//! or logs. Call `expose_secret()` at the exact point a value is sent on the wire.
//!
//! ```rust
//! use playlist_export::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let token = secret_string("BQD...".to_string());
//! assert_eq!(token.expose_secret().as_ref(), "BQD...");
//! assert!(!format!("{token:?}").contains("BQD"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String payload stored inside a [`SecretString`]
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Check if the secret value is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if the secret value starts with a prefix
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// A string that is redacted in `Debug` and zeroed on drop
pub type SecretString = Secret<SecretValue>;

/// Wrap a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("refresh-token".to_string());
        assert_eq!(secret.expose_secret().as_ref(), "refresh-token");
        assert!(!secret.expose_secret().is_empty());
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("sensitive-data".to_string());
        let debug_output = format!("{secret:?}");

        assert!(!debug_output.contains("sensitive-data"));
        assert!(debug_output.contains("REDACTED") || debug_output.contains("Secret"));
    }

    #[test]
    fn test_secret_deserializes_from_plain_string() {
        #[derive(Deserialize)]
        struct Tokens {
            access_token: SecretString,
        }

        let tokens: Tokens = toml::from_str("access_token = \"abc\"").unwrap();
        assert_eq!(tokens.access_token.expose_secret().as_ref(), "abc");
    }
}
