//! Short-lived HS256 tokens authorizing publication on the realtime broadcast API.

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, error};

use crate::config::{AppConfig, ConfigError, JWT_SECRET_ENV, SERVICE_ROLE_KEY_ENV};

/// Audience expected by the realtime service.
pub const REALTIME_AUDIENCE: &str = "realtime";
/// Role granted to every broadcast token.
pub const SERVICE_ROLE: &str = "service_role";
/// Lifetime of a broadcast token.
pub const TOKEN_TTL: Duration = Duration::from_secs(60);

/// Claims carried by a broadcast token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeClaims {
    /// Audience, always `realtime`.
    pub aud: String,
    /// Database role the token acts as.
    pub role: String,
    /// Project auth issuer.
    pub iss: String,
    /// Expiry (seconds since epoch).
    pub exp: i64,
}

/// Subset of the service-role key claims needed to derive the issuer.
#[derive(Debug, Deserialize)]
struct ServiceKeyClaims {
    #[serde(rename = "ref", default)]
    project_ref: Option<String>,
}

/// Failure to mint a token at publish time.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signing the claims failed.
    #[error("failed to sign realtime token")]
    Encode {
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}

/// A signed token together with the claims it was minted from.
#[derive(Debug, Clone)]
pub struct BroadcastToken {
    value: String,
    claims: RealtimeClaims,
}

impl BroadcastToken {
    /// Encoded JWT suitable for a bearer header.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Claims embedded in the token.
    pub fn claims(&self) -> &RealtimeClaims {
        &self.claims
    }
}

/// Mints broadcast tokens signed with the project's JWT secret.
pub struct TokenIssuer {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    /// Build an issuer from the loaded application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Self::new(&config.service_role_key, &config.jwt_secret)
    }

    /// Derive the issuer identity from `service_role_key` and prepare signing keys.
    pub fn new(service_role_key: &str, jwt_secret: &str) -> Result<Self, ConfigError> {
        if service_role_key.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar {
                var: SERVICE_ROLE_KEY_ENV,
            });
        }
        if jwt_secret.is_empty() {
            return Err(ConfigError::MissingEnvVar {
                var: JWT_SECRET_ENV,
            });
        }

        let project_ref = project_ref(service_role_key)?;
        let issuer = format!("https://{project_ref}.supabase.co");
        debug!(%issuer, "derived realtime token issuer");

        Ok(Self {
            issuer,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
        })
    }

    /// Issuer claim embedded in every token.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Mint a fresh token valid for [`TOKEN_TTL`].
    pub fn issue(&self) -> Result<BroadcastToken, TokenError> {
        self.issue_at(OffsetDateTime::now_utc())
    }

    fn issue_at(&self, now: OffsetDateTime) -> Result<BroadcastToken, TokenError> {
        let claims = RealtimeClaims {
            aud: REALTIME_AUDIENCE.to_string(),
            role: SERVICE_ROLE.to_string(),
            iss: self.issuer.clone(),
            exp: now.unix_timestamp() + TOKEN_TTL.as_secs() as i64,
        };

        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|source| TokenError::Encode { source })?;

        // A token we cannot verify ourselves will be rejected by the receiver too.
        if let Err(err) = self.verify(&value) {
            error!(
                error = %err,
                issuer = %self.issuer,
                "realtime token failed local verification; broadcasts will be rejected"
            );
        }

        Ok(BroadcastToken { value, claims })
    }

    /// Check signature, audience and issuer of a token minted by this issuer.
    pub fn verify(&self, token: &str) -> Result<RealtimeClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[REALTIME_AUDIENCE]);
        validation.set_issuer(&[self.issuer.as_str()]);

        decode::<RealtimeClaims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}

/// Read the `ref` claim of the service-role key without checking its signature.
fn project_ref(service_role_key: &str) -> Result<String, ConfigError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<ServiceKeyClaims>(
        service_role_key,
        &DecodingKey::from_secret(&[]),
        &validation,
    )
    .map_err(|source| ConfigError::InvalidServiceKey { source })?;

    data.claims
        .project_ref
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingProjectRef)
}
