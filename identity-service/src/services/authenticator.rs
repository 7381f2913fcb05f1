//! Password login and registration.

use crate::models::NewPrincipal;
use crate::services::{IdentityResolver, IssuedToken, ServiceError, TokenService};
use crate::utils::{hash_password, verify_against_dummy, verify_password, Password};

/// Outcome of a successful credential operation.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub principal_id: String,
    pub kind: crate::models::PrincipalKind,
    pub token: IssuedToken,
}

#[derive(Clone)]
pub struct CredentialAuthenticator {
    resolver: IdentityResolver,
    tokens: TokenService,
}

impl CredentialAuthenticator {
    pub fn new(resolver: IdentityResolver, tokens: TokenService) -> Self {
        Self { resolver, tokens }
    }

    /// Every rejection is `InvalidCredentials`, whatever the cause.
    #[tracing::instrument(skip_all)]
    pub async fn authenticate(
        &self,
        email: &str,
        password: Password,
    ) -> Result<Authenticated, ServiceError> {
        let principal = self.resolver.resolve(email).await?;

        let stored_hash = principal
            .as_ref()
            .and_then(|p| p.password_hash())
            .map(str::to_owned);

        let matched = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => verify_password(&password, &hash),
            None => verify_against_dummy(&password),
        })
        .await
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password check failed: {}", e)))?;

        let principal = match principal {
            Some(p) if matched => p,
            _ => {
                tracing::info!("Credential login rejected");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let token = self.tokens.issue(principal.id(), principal.kind())?;
        tracing::info!(principal_id = %principal.id(), kind = %principal.kind(), "Credential login succeeded");

        Ok(Authenticated {
            principal_id: principal.id().to_string(),
            kind: principal.kind(),
            token,
        })
    }

    /// Create a principal with a password credential and sign it in.
    #[tracing::instrument(skip_all, fields(kind = %new.kind()))]
    pub async fn register(
        &self,
        new: NewPrincipal,
        password: Password,
    ) -> Result<Authenticated, ServiceError> {
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))??;

        let principal = self.resolver.create(new, Some(password_hash)).await?;
        let token = self.tokens.issue(principal.id(), principal.kind())?;

        Ok(Authenticated {
            principal_id: principal.id().to_string(),
            kind: principal.kind(),
            token,
        })
    }
}
