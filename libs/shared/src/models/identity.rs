//! Authenticated user identity
//!
//! An `Identity` is produced by an OAuth identity provider after a successful
//! sign-in. The application never mutates it; it is stored alongside browser
//! sessions and copied into contribution records.

use serde::{Deserialize, Serialize};

/// Profile of a signed-in user as reported by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Stable, provider-scoped user id (Google's `sub`)
    pub id: String,
    /// Human-readable name
    pub display_name: String,
    /// Primary email, empty when the provider did not share one
    pub email: String,
    /// Avatar URL, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl Identity {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            email: email.into(),
            photo_url: None,
        }
    }

    pub fn with_photo_url(mut self, photo_url: impl Into<String>) -> Self {
        self.photo_url = Some(photo_url.into());
        self
    }

    /// First name-like token for greetings, falling back to the full display name
    pub fn short_name(&self) -> &str {
        self.display_name
            .split_whitespace()
            .next()
            .unwrap_or(self.display_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_serde_skips_missing_photo() {
        let identity = Identity::new("123", "Ada Lovelace", "ada@example.com");
        let json = serde_json::to_value(&identity).unwrap_or_default();

        assert_eq!(json["id"], "123");
        assert_eq!(json["display_name"], "Ada Lovelace");
        assert!(json.get("photo_url").is_none());
    }

    #[test]
    fn test_identity_deserialize_without_photo() {
        let identity: Identity = match serde_json::from_str(
            r#"{"id":"1","display_name":"Grace","email":"grace@example.com"}"#,
        ) {
            Ok(identity) => identity,
            Err(error) => panic!("identity should deserialize: {error}"),
        };

        assert_eq!(identity.photo_url, None);
    }

    #[test]
    fn test_short_name() {
        let identity = Identity::new("1", "Ada Lovelace", "");
        assert_eq!(identity.short_name(), "Ada");

        let blank = Identity::new("1", "", "");
        assert_eq!(blank.short_name(), "");
    }
}
