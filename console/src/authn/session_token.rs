//! Session token management

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::errors::ConsoleError;
use crate::models::entity::deserialize_id;

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    #[serde(deserialize_with = "deserialize_id")]
    pub sub: String,

    /// Account role: admin, reseller or consumer
    #[serde(default)]
    pub role: Option<String>,

    /// Explicit grants in `resource:verb` form
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Issued at timestamp
    #[serde(default)]
    pub iat: Option<i64>,

    /// Expiration timestamp
    #[serde(default)]
    pub exp: Option<i64>,

    /// Admin user behind an impersonated session
    #[serde(default)]
    pub impersonator: Option<String>,
}

/// A session token wrapper
#[derive(Debug, Clone)]
pub struct SessionToken {
    raw: SecretString,

    /// Decoded claims
    pub claims: SessionClaims,
}

impl SessionToken {
    /// Create a session token from a raw JWT.
    /// Only decodes the claims; the backend verifies the signature.
    pub fn from_raw(raw: impl Into<String>) -> Result<Self, ConsoleError> {
        let raw = raw.into();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<SessionClaims>(&raw, &DecodingKey::from_secret(b""), &validation)
            .map_err(|e| ConsoleError::TokenError(format!("Failed to decode token: {}", e)))?;

        Ok(Self {
            raw: SecretString::from(raw),
            claims: token_data.claims,
        })
    }

    /// Raw bearer value
    pub fn expose(&self) -> &str {
        self.raw.expose_secret()
    }

    /// User the session acts as
    pub fn user_id(&self) -> &str {
        &self.claims.sub
    }

    pub fn role(&self) -> Option<&str> {
        self.claims.role.as_deref()
    }

    pub fn is_impersonating(&self) -> bool {
        self.claims.impersonator.is_some()
    }

    /// Check if the token is expired. Tokens without `exp` never expire.
    pub fn is_expired(&self) -> bool {
        match self.claims.exp {
            Some(exp) => exp < Utc::now().timestamp(),
            None => false,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}
