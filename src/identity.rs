// src/identity.rs
// Authenticated caller identity and the bearer-token boundary.
//
// Credential storage and login live in a separate service; this module only
// verifies the signed token that service issues and hands handlers an
// `AuthUser`. Roles are a closed enum so role gating stays exhaustive.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Admin,
    Hr,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Admin => "admin",
            Role::Hr => "hr",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "employee" => Some(Role::Employee),
            "admin" => Some(Role::Admin),
            "hr" => Some(Role::Hr),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity injected by the auth boundary before any chat handler runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Verifies a bearer credential and resolves the caller identity.
/// Swappable so deployments can plug in their identity provider.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Option<AuthUser>;
}

/// Default verifier: `hex(payload_json).hex(hmac_sha256(payload_json))`
/// signed with a secret shared with the token-issuing service.
pub struct HmacTokenVerifier {
    secret: Vec<u8>,
}

impl HmacTokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }

    /// Produce a token for the given identity. The production issuer lives in
    /// the auth service; this is used by dev tooling and tests.
    pub fn issue(&self, user: &AuthUser) -> String {
        let payload = serde_json::to_vec(user).expect("identity serializes");
        let sig = self.mac(&payload);
        format!("{}.{}", hex::encode(&payload), hex::encode(sig))
    }
}

impl TokenVerifier for HmacTokenVerifier {
    fn verify(&self, token: &str) -> Option<AuthUser> {
        let (payload_hex, sig_hex) = token.split_once('.')?;
        let payload = hex::decode(payload_hex).ok()?;
        let sig = hex::decode(sig_hex).ok()?;
        // Constant-time comparison via the Mac API.
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(&payload);
        mac.verify_slice(&sig).ok()?;
        serde_json::from_slice(&payload).ok()
    }
}

/// Middleware: validate the bearer token and stash the identity in request
/// extensions for the `AuthUser` extractor.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

    let user = state
        .verifier
        .verify(token)
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))
    }
}

/// Best-effort client IP: proxy header first, then the socket address.
/// Never rejects, so handlers work identically under tests without a
/// real connection.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(forwarded) = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
        {
            if let Some(first) = forwarded.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return Ok(ClientIp(first.to_string()));
                }
            }
        }
        if let Some(info) = parts
            .extensions
            .get::<axum::extract::ConnectInfo<SocketAddr>>()
        {
            return Ok(ClientIp(info.0.ip().to_string()));
        }
        Ok(ClientIp("unknown".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee() -> AuthUser {
        AuthUser {
            id: "u-1".into(),
            email: "sam@example.com".into(),
            name: "Sam".into(),
            role: Role::Employee,
        }
    }

    #[test]
    fn round_trips_a_signed_token() {
        let verifier = HmacTokenVerifier::new("test-secret");
        let token = verifier.issue(&employee());
        let user = verifier.verify(&token).expect("valid token");
        assert_eq!(user.id, "u-1");
        assert_eq!(user.role, Role::Employee);
    }

    #[test]
    fn rejects_a_tampered_token() {
        let verifier = HmacTokenVerifier::new("test-secret");
        let mut token = verifier.issue(&employee());
        token.replace_range(0..2, "ff");
        assert!(verifier.verify(&token).is_none());
    }

    #[test]
    fn rejects_a_token_from_another_secret() {
        let token = HmacTokenVerifier::new("other").issue(&employee());
        assert!(HmacTokenVerifier::new("test-secret").verify(&token).is_none());
    }

    #[test]
    fn role_parse_is_closed() {
        assert_eq!(Role::parse("hr"), Some(Role::Hr));
        assert_eq!(Role::parse("superuser"), None);
    }
}
