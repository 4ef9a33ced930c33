//! Request envelopes.
//!
//! A [`RequestEnvelope`] pairs an endpoint descriptor with an optional
//! typed body and an optional explicit bearer token. Envelopes are
//! constructed per call and consumed when the call resolves.

use crate::endpoint::Endpoint;

/// One in-flight request: an endpoint, an optional body, and an
/// optional explicit bearer token.
///
/// When `explicit_token` is present it overrides the pipeline's token
/// store lookup entirely; no refresh is attempted on its behalf.
#[derive(Debug, Clone)]
pub struct RequestEnvelope<Req, Res> {
    /// The endpoint being invoked.
    pub endpoint: Endpoint<Req, Res>,
    /// Typed request body, if the operation carries one.
    pub body: Option<Req>,
    /// Explicit bearer token overriding the token store.
    pub explicit_token: Option<String>,
}

impl<Req, Res> RequestEnvelope<Req, Res> {
    /// Creates an envelope with no body and no explicit token.
    pub fn new(endpoint: Endpoint<Req, Res>) -> Self {
        Self {
            endpoint,
            body: None,
            explicit_token: None,
        }
    }

    /// Attaches a typed request body.
    pub fn with_body(mut self, body: Req) -> Self {
        self.body = Some(body);
        self
    }

    /// Attaches an explicit bearer token, bypassing the token store.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.explicit_token = Some(token.into());
        self
    }
}
