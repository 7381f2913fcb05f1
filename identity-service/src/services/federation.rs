//! Federated sign-in: turns a verified external identity into an access token,
//! creating an account holder on first sign-in.

use crate::models::{ExternalIdentity, NewAccountHolder, NewPrincipal, Principal};
use crate::services::{IdentityResolver, IssuedToken, ServiceError, TokenService};

#[derive(Debug, Clone)]
pub struct FederatedOutcome {
    pub principal: Principal,
    pub token: IssuedToken,
    /// True when this sign-in created the record.
    pub created: bool,
}

#[derive(Clone)]
pub struct FederatedSignIn {
    resolver: IdentityResolver,
    tokens: TokenService,
}

impl FederatedSignIn {
    pub fn new(resolver: IdentityResolver, tokens: TokenService) -> Self {
        Self { resolver, tokens }
    }

    #[tracing::instrument(skip_all, fields(subject = %identity.subject))]
    pub async fn handle_callback(
        &self,
        identity: ExternalIdentity,
    ) -> Result<FederatedOutcome, ServiceError> {
        let email = identity
            .primary_email()
            .ok_or(ServiceError::MissingEmail)?
            .to_string();

        if let Some(principal) = self.resolver.resolve(&email).await? {
            return self.issue(principal, false);
        }

        // Federation only ever creates account holders, without a password.
        let new = NewPrincipal::AccountHolder(NewAccountHolder {
            name: identity
                .display_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| default_name(&email)),
            email: email.clone(),
            ..Default::default()
        });

        match self.resolver.create(new, None).await {
            Ok(principal) => self.issue(principal, true),
            Err(ServiceError::EmailAlreadyRegistered) => {
                // A concurrent sign-in won the insert; use its record.
                tracing::info!("Federated create lost race, resolving winner");
                match self.resolver.resolve(&email).await? {
                    Some(principal) => self.issue(principal, false),
                    None => Err(ServiceError::Internal(anyhow::anyhow!(
                        "Principal vanished after duplicate-email rejection"
                    ))),
                }
            }
            Err(e) => Err(e),
        }
    }

    fn issue(&self, principal: Principal, created: bool) -> Result<FederatedOutcome, ServiceError> {
        let token = self.tokens.issue(principal.id(), principal.kind())?;
        tracing::info!(
            principal_id = %principal.id(),
            kind = %principal.kind(),
            created,
            "Federated sign-in succeeded"
        );
        Ok(FederatedOutcome {
            principal,
            token,
            created,
        })
    }
}

fn default_name(email: &str) -> String {
    email.split('@').next().unwrap_or("User").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewOrganization, PrincipalKind};
    use crate::services::InMemoryStore;
    use std::sync::Arc;

    fn setup() -> (Arc<InMemoryStore>, IdentityResolver, FederatedSignIn, TokenService) {
        let store = Arc::new(InMemoryStore::new());
        let resolver = IdentityResolver::new(store.clone());
        let tokens = TokenService::new("federation-test-secret").unwrap();
        (
            store,
            resolver.clone(),
            FederatedSignIn::new(resolver, tokens.clone()),
            tokens,
        )
    }

    fn identity(emails: &[&str]) -> ExternalIdentity {
        ExternalIdentity {
            subject: "google-sub-1".to_string(),
            display_name: Some("New Person".to_string()),
            emails: emails.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn first_sign_in_creates_account_holder_then_reuses_it() -> anyhow::Result<()> {
        let (store, _, federation, tokens) = setup();

        let first = federation.handle_callback(identity(&["new@x.com"])).await?;
        assert!(first.created);
        assert_eq!(first.principal.kind(), PrincipalKind::AccountHolder);
        assert_eq!(first.principal.name(), "New Person");
        assert!(first.principal.password_hash().is_none());
        assert_eq!(tokens.verify(&first.token.token)?.user.id, first.principal.id());

        let second = federation.handle_callback(identity(&["new@x.com"])).await?;
        assert!(!second.created);
        assert_eq!(second.principal.id(), first.principal.id());
        assert_eq!(store.count(PrincipalKind::AccountHolder), 1);
        Ok(())
    }

    #[tokio::test]
    async fn existing_organization_signs_in_without_mutation() -> anyhow::Result<()> {
        let (store, resolver, federation, tokens) = setup();
        let org = resolver
            .create(
                NewPrincipal::Organization(NewOrganization {
                    email: "desk@general.org".to_string(),
                    name: "General".to_string(),
                    address: "1 Main St".to_string(),
                    ..Default::default()
                }),
                Some("hash".to_string()),
            )
            .await?;

        let outcome = federation.handle_callback(identity(&["Desk@General.org"])).await?;
        assert!(!outcome.created);
        assert_eq!(outcome.principal, org);
        assert_eq!(tokens.verify(&outcome.token.token)?.user.kind, PrincipalKind::Organization);
        assert_eq!(store.count(PrincipalKind::AccountHolder), 0);
        Ok(())
    }

    #[tokio::test]
    async fn uses_first_verified_email() -> anyhow::Result<()> {
        let (_, _, federation, _) = setup();
        let outcome = federation
            .handle_callback(identity(&["first@x.com", "second@x.com"]))
            .await?;
        assert_eq!(outcome.principal.email(), "first@x.com");
        Ok(())
    }

    #[tokio::test]
    async fn missing_email_is_rejected() {
        let (store, _, federation, _) = setup();
        let err = federation.handle_callback(identity(&[])).await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingEmail));
        assert_eq!(store.count(PrincipalKind::AccountHolder), 0);
    }

    #[tokio::test]
    async fn blank_display_name_falls_back_to_local_part() -> anyhow::Result<()> {
        let (_, _, federation, _) = setup();
        let mut id = identity(&["jane@x.com"]);
        id.display_name = Some("  ".to_string());

        let outcome = federation.handle_callback(id).await?;
        assert_eq!(outcome.principal.name(), "jane");
        Ok(())
    }
}
