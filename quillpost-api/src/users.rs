//! User authentication endpoints.
//!
//! # Wire Format
//!
//! The backend returns token expiry as a fixed-format UTC timestamp:
//!
//! ```json
//! {"token": "abc", "expires_at": "2025-01-01 00:00:00"}
//! ```
//!
//! The fixed format exists only on the wire; persistence is RFC 3339
//! (see `quillpost-auth`).

use chrono::{DateTime, Utc};
use quillpost_core::Endpoint;
use serde::{Deserialize, Serialize};

// ============================================================================
// Wire Datetime
// ============================================================================

/// Serde adapter for the backend's `yyyy-MM-dd HH:mm:ss` UTC format.
pub mod wire_datetime {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// The backend's timestamp format.
    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Serializes a UTC instant in the backend's format.
    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    /// Deserializes the backend's format as a UTC instant.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Wire Types
// ============================================================================

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Desired display name.
    pub username: String,
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Response to login and registration: a bearer token and its expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for subsequent authenticated calls.
    pub token: String,
    /// Expiration instant, in the backend's wire format.
    #[serde(with = "wire_datetime")]
    pub expires_at: DateTime<Utc>,
}

/// The authenticated user's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// Display name.
    pub username: String,
    /// Account email.
    pub email: String,
    /// Profile bio.
    #[serde(default)]
    pub bio: Option<String>,
}

// ============================================================================
// Endpoints
// ============================================================================

/// `POST /users/login` - exchanges credentials for a bearer token.
pub fn login() -> Endpoint<LoginRequest, AuthResponse> {
    Endpoint::post("/users/login")
}

/// `POST /users` - registers an account and returns its first token.
pub fn register() -> Endpoint<RegisterRequest, AuthResponse> {
    Endpoint::post("/users")
}

/// `GET /user` - the authenticated user's profile.
pub fn current_user() -> Endpoint<(), UserResponse> {
    Endpoint::get("/user").with_auth()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_decodes_wire_format() {
        let json = r#"{"token":"abc","expires_at":"2025-01-01 00:00:00"}"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.token, "abc");
        assert_eq!(
            response.expires_at,
            "2025-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_auth_response_rejects_rfc3339_on_the_wire() {
        let json = r#"{"token":"abc","expires_at":"2025-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<AuthResponse>(json).is_err());
    }

    #[test]
    fn test_wire_datetime_round_trip() {
        let response = AuthResponse {
            token: "abc".into(),
            expires_at: "2025-06-15T08:30:00Z".parse().unwrap(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("2025-06-15 08:30:00"));

        let back: AuthResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.expires_at, response.expires_at);
    }

    #[test]
    fn test_endpoint_shapes() {
        assert_eq!(login().path(), "/users/login");
        assert!(!login().requires_auth());
        assert_eq!(register().path(), "/users");
        assert!(current_user().requires_auth());
    }

    #[test]
    fn test_decoded_auth_response_authenticates_a_store() {
        let json = r#"{"token":"abc","expires_at":"2099-01-01 00:00:00"}"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();

        let store = quillpost_auth::TokenStore::in_memory();
        store
            .save(response.token.clone(), response.expires_at)
            .unwrap();

        assert!(store.is_authenticated());
        assert_eq!(store.get_token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_login_request_encodes() {
        let body = LoginRequest {
            email: "a@b.com".into(),
            password: "x".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["email"], "a@b.com");
        assert_eq!(json["password"], "x");
    }
}
