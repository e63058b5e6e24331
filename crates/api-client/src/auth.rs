//! Credential providers.
//!
//! The identity service that issues sessions is external. A provider only hands out
//! the bearer token and vendor identity of an existing session, fresh for every
//! fetch cycle.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use configuration::AuthConfig;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No active session: an access token is required")]
    MissingToken,

    #[error("Access token is malformed: {0}")]
    MalformedToken(String),

    #[error("Access token does not identify a vendor (missing 'sub' claim)")]
    MissingSubject,
}

/// A bearer token plus the vendor it belongs to.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    pub subject: String,
}

impl Credential {
    pub fn new(token: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            subject: subject.into(),
        }
    }

    /// The raw bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("subject", &self.subject)
            .finish()
    }
}

/// Supplies a credential on demand.
///
/// Implement this trait to plug in a new session source.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns the credential of the current session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` when no session exists or it cannot produce a token.
    async fn credential(&self) -> Result<Credential, AuthError>;

    /// Provider name for logging/debugging
    fn name(&self) -> &'static str;
}

/// A provider holding a fixed token and subject.
pub struct StaticCredentialProvider {
    token: Option<String>,
    subject: String,
}

impl StaticCredentialProvider {
    pub fn new(token: Option<String>, subject: impl Into<String>) -> Self {
        Self {
            token,
            subject: subject.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn credential(&self) -> Result<Credential, AuthError> {
        let token = non_empty_token(self.token.as_deref())?;
        if self.subject.trim().is_empty() {
            return Err(AuthError::MissingSubject);
        }
        Ok(Credential::new(token, self.subject.clone()))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// A provider that reads the vendor identity out of the access token's `sub` claim.
///
/// The claims are decoded, not verified: the remote API verifies the signature, and the
/// subject is only used to label the session.
pub struct JwtCredentialProvider {
    token: Option<String>,
}

impl JwtCredentialProvider {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl CredentialProvider for JwtCredentialProvider {
    async fn credential(&self) -> Result<Credential, AuthError> {
        let token = non_empty_token(self.token.as_deref())?;
        let subject = decode_subject(token)?;
        Ok(Credential::new(token, subject))
    }

    fn name(&self) -> &'static str {
        "jwt"
    }
}

/// Builds the provider that matches the configured session material.
///
/// An explicit subject wins; otherwise it is read from the token.
pub fn provider_from_config(config: &AuthConfig) -> Arc<dyn CredentialProvider> {
    match &config.subject {
        Some(subject) => Arc::new(StaticCredentialProvider::new(
            config.access_token.clone(),
            subject.clone(),
        )),
        None => Arc::new(JwtCredentialProvider::new(config.access_token.clone())),
    }
}

fn non_empty_token(token: Option<&str>) -> Result<&str, AuthError> {
    match token.map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MissingToken),
    }
}

#[derive(Deserialize)]
struct SubjectClaims {
    sub: Option<String>,
}

fn decode_subject(token: &str) -> Result<String, AuthError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            return Err(AuthError::MalformedToken(
                "expected three dot-separated segments".to_string(),
            ));
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::MalformedToken(e.to_string()))?;
    let claims: SubjectClaims =
        serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedToken(e.to_string()))?;

    claims
        .sub
        .filter(|sub| !sub.is_empty())
        .ok_or(AuthError::MissingSubject)
}
