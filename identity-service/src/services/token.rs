use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::PrincipalKind;

/// Fixed validity window for access tokens.
pub const TOKEN_VALIDITY_DAYS: i64 = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Token expired")]
    Expired,
}

/// Principal reference carried inside the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalClaims {
    pub id: String,
    pub kind: PrincipalKind,
}

/// Signed claim set of an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub user: PrincipalClaims,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Token returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// Stateless HS256 signer/verifier. Cloning shares the same keys.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Result<Self, anyhow::Error> {
        if secret.trim().is_empty() {
            return Err(anyhow::anyhow!("JWT signing secret must not be empty"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Issue a token valid for [`TOKEN_VALIDITY_DAYS`] from now.
    pub fn issue(&self, principal_id: &str, kind: PrincipalKind) -> Result<IssuedToken, anyhow::Error> {
        self.issue_at(principal_id, kind, Utc::now())
    }

    fn issue_at(
        &self,
        principal_id: &str,
        kind: PrincipalKind,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, anyhow::Error> {
        let exp = issued_at + Duration::days(TOKEN_VALIDITY_DAYS);

        let claims = AccessTokenClaims {
            user: PrincipalClaims {
                id: principal_id.to_string(),
                kind,
            },
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Check signature and expiry. Nothing else is validated.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}
