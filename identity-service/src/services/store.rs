//! Credential store seam: one uniformly-queried interface over the two
//! principal collections.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use crate::models::{Principal, PrincipalKind};

#[derive(Error, Debug)]
pub enum StoreError {
    /// The email is already claimed by some principal, of either kind.
    /// Carries the kind whose insert was rejected.
    #[error("Duplicate email on {0} insert")]
    DuplicateEmail(PrincipalKind),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Exact match on an already-normalized email within one collection.
    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<Principal>, StoreError>;

    /// Insert into the collection matching the principal's kind. Must fail
    /// with `DuplicateEmail` when the email exists in *any* collection, atomically
    /// with the write.
    async fn insert(&self, principal: &Principal) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Process-local store; one lock covers every collection, so the email check
/// and the insert are a single step. Used for tests and local runs.
#[derive(Default)]
pub struct InMemoryStore {
    collections: Mutex<HashMap<PrincipalKind, HashMap<String, Principal>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in one collection.
    pub fn count(&self, kind: PrincipalKind) -> usize {
        self.collections
            .lock()
            .map(|c| c.get(&kind).map_or(0, |m| m.len()))
            .unwrap_or(0)
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<PrincipalKind, HashMap<String, Principal>>>, StoreError>
    {
        self.collections
            .lock()
            .map_err(|_| StoreError::Backend(anyhow::anyhow!("In-memory store lock poisoned")))
    }
}

#[async_trait]
impl PrincipalStore for InMemoryStore {
    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<Principal>, StoreError> {
        let collections = self.lock()?;
        Ok(collections
            .get(&kind)
            .and_then(|c| c.get(email))
            .cloned())
    }

    async fn insert(&self, principal: &Principal) -> Result<(), StoreError> {
        let mut collections = self.lock()?;
        if collections
            .values()
            .any(|c| c.contains_key(principal.email()))
        {
            return Err(StoreError::DuplicateEmail(principal.kind()));
        }
        collections
            .entry(principal.kind())
            .or_default()
            .insert(principal.email().to_string(), principal.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}
