//! Identity resolver: maps an email to at most one principal across both collections.

use std::sync::Arc;

use crate::models::{normalize_email, NewPrincipal, Principal, PrincipalKind};
use crate::services::{
    store::{PrincipalStore, StoreError},
    ServiceError,
};

#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn PrincipalStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn PrincipalStore>) -> Self {
        Self { store }
    }

    /// Look the email up in every collection. A hit in more than one is a
    /// consistency violation and never resolves to either record.
    pub async fn resolve(&self, email: &str) -> Result<Option<Principal>, ServiceError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(None);
        }

        let mut found: Option<Principal> = None;
        for kind in PrincipalKind::ALL {
            let Some(principal) = self.store.find_by_email(kind, &email).await? else {
                continue;
            };
            if let Some(existing) = &found {
                tracing::error!(
                    first_id = %existing.id(),
                    first_kind = %existing.kind(),
                    second_id = %principal.id(),
                    second_kind = %principal.kind(),
                    "Email present in more than one principal collection"
                );
                return Err(ServiceError::ConsistencyViolation { email });
            }
            found = Some(principal);
        }

        Ok(found)
    }

    /// Insert a new principal after re-confirming the email is free everywhere.
    /// The store's shared email claim closes what this check only narrows.
    pub async fn create(
        &self,
        new: NewPrincipal,
        password_hash: Option<String>,
    ) -> Result<Principal, ServiceError> {
        let email = normalize_email(new.email());
        if email.is_empty() {
            return Err(ServiceError::MissingEmail);
        }

        if self.resolve(&email).await?.is_some() {
            return Err(ServiceError::EmailAlreadyRegistered);
        }

        let principal = new.into_principal(email, password_hash);
        match self.store.insert(&principal).await {
            Ok(()) => {
                tracing::info!(
                    principal_id = %principal.id(),
                    kind = %principal.kind(),
                    "Principal created"
                );
                Ok(principal)
            }
            Err(StoreError::DuplicateEmail(kind)) => {
                tracing::warn!(kind = %kind, "Concurrent create lost the unique-email race");
                Err(ServiceError::EmailAlreadyRegistered)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        self.store.health_check().await.map_err(ServiceError::from)
    }
}
