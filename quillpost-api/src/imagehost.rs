//! Image host endpoints: multipart uploads and OAuth token refresh.
//!
//! The image host is a separate service with its own base URL and
//! credential scheme, so every endpoint here carries a base URL
//! override. Authenticated uploads use the bearer token from the
//! shared refresh machinery; anonymous uploads send a `Client-ID`
//! header instead.

use async_trait::async_trait;
use quillpost_auth::{RefreshedToken, TokenRefresher};
use quillpost_core::{BodyEncoding, Endpoint, RefreshError, RequestEnvelope};
use quillpost_net::{ApiClient, IntoMultipart, MultipartField};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

// ============================================================================
// Configuration
// ============================================================================

/// Credentials and location of the image host.
#[derive(Debug, Clone)]
pub struct ImageHostConfig {
    /// Root URL of the image host API.
    pub base_url: Url,
    /// OAuth client identifier; also used for anonymous uploads.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Long-lived refresh credential.
    pub refresh_token: String,
}

// ============================================================================
// Wire Types
// ============================================================================

/// An image to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// File name reported to the host.
    pub file_name: String,
    /// MIME type of the image.
    pub mime: String,
    /// Optional title stored alongside the image.
    pub title: Option<String>,
}

impl IntoMultipart for ImageUpload {
    fn into_fields(self) -> Vec<MultipartField> {
        let mut fields = vec![MultipartField::bytes(
            "image",
            self.file_name,
            self.mime,
            self.data,
        )];
        if let Some(title) = self.title {
            fields.push(MultipartField::text("title", title));
        }
        fields
    }
}

/// Upload result as returned by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUploadData {
    /// Host-assigned identifier.
    pub id: String,
    /// Public link to the uploaded image.
    pub link: String,
    /// Delete hash, needed to remove the image later.
    #[serde(default)]
    pub deletehash: Option<String>,
}

/// Envelope the host wraps every response in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    /// The uploaded image.
    pub data: ImageUploadData,
    /// Whether the host considers the call successful.
    pub success: bool,
}

/// OAuth refresh grant body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthTokenRequest {
    /// The long-lived refresh credential.
    pub refresh_token: String,
    /// OAuth client identifier.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Always `refresh_token` for this flow.
    pub grant_type: String,
}

/// OAuth refresh grant response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthTokenResponse {
    /// The new access token.
    pub access_token: String,
    /// Replacement refresh credential, when the host rotates it.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token, seconds.
    pub expires_in: i64,
}

// ============================================================================
// Endpoints
// ============================================================================

/// `POST /3/image` - uploads an image with the account's bearer token.
pub fn upload(config: &ImageHostConfig) -> Endpoint<ImageUpload, ImageUploadResponse> {
    Endpoint::post("/3/image")
        .with_auth()
        .with_base_url(config.base_url.clone())
        .with_encoding(BodyEncoding::Multipart)
}

/// `POST /3/image` - uploads an image anonymously, attributed to the
/// application rather than an account.
pub fn upload_anonymous(config: &ImageHostConfig) -> Endpoint<ImageUpload, ImageUploadResponse> {
    Endpoint::post("/3/image")
        .with_header("Authorization", format!("Client-ID {}", config.client_id))
        .with_base_url(config.base_url.clone())
        .with_encoding(BodyEncoding::Multipart)
}

/// `POST /oauth2/token` - exchanges the refresh credential for a new
/// access token.
pub fn refresh_access_token(
    config: &ImageHostConfig,
) -> Endpoint<OauthTokenRequest, OauthTokenResponse> {
    Endpoint::post("/oauth2/token").with_base_url(config.base_url.clone())
}

// ============================================================================
// Refresher
// ============================================================================

/// [`TokenRefresher`] backed by the image host's OAuth endpoint.
///
/// Holds its own [`ApiClient`] so refresh traffic never recurses into
/// an authenticated pipeline.
pub struct ImageHostRefresher {
    client: ApiClient,
    config: ImageHostConfig,
}

impl ImageHostRefresher {
    /// Creates a refresher issuing grants through `client`.
    pub fn new(client: ApiClient, config: ImageHostConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl TokenRefresher for ImageHostRefresher {
    async fn refresh(&self) -> Result<RefreshedToken, RefreshError> {
        let grant = OauthTokenRequest {
            refresh_token: self.config.refresh_token.clone(),
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
            grant_type: "refresh_token".to_string(),
        };

        let envelope = RequestEnvelope::new(refresh_access_token(&self.config)).with_body(grant);

        let response = self.client.send(envelope).await.map_err(|e| {
            warn!(error = %e, "Image host token refresh failed");
            RefreshError::RefreshFailed(e.to_string())
        })?;

        debug!(expires_in = response.expires_in, "Image host token renewed");
        Ok(RefreshedToken {
            value: response.access_token,
            expires_in: response.expires_in,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
