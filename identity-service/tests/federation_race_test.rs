mod common;

use async_trait::async_trait;
use common::identity;
use identity_service::models::{NewOrganization, NewPrincipal, Principal, PrincipalKind};
use identity_service::services::{
    CredentialAuthenticator, FederatedSignIn, IdentityResolver, InMemoryStore, PrincipalStore,
    ServiceError, StoreError, TokenService,
};
use identity_service::utils::Password;
use std::sync::Arc;
use tokio::sync::Barrier;

/// Holds every insert until both racers have passed their existence checks.
struct GatedStore {
    inner: InMemoryStore,
    gate: Barrier,
}

#[async_trait]
impl PrincipalStore for GatedStore {
    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<Principal>, StoreError> {
        self.inner.find_by_email(kind, email).await
    }

    async fn insert(&self, principal: &Principal) -> Result<(), StoreError> {
        self.gate.wait().await;
        self.inner.insert(principal).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
}

fn gated_store() -> Arc<GatedStore> {
    Arc::new(GatedStore {
        inner: InMemoryStore::new(),
        gate: Barrier::new(2),
    })
}

#[tokio::test]
async fn concurrent_first_sign_ins_converge_on_one_record() {
    let store = gated_store();
    let tokens = TokenService::new("race-test-secret").unwrap();
    let federation = FederatedSignIn::new(IdentityResolver::new(store.clone()), tokens.clone());

    let (a, b) = tokio::join!(
        federation.handle_callback(identity("g-1", Some("Racer"), &["racer@example.com"])),
        federation.handle_callback(identity("g-1", Some("Racer"), &["racer@example.com"])),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(store.inner.count(PrincipalKind::AccountHolder), 1);
    assert_eq!(a.principal.id(), b.principal.id());
    assert_ne!(a.created, b.created);

    let claims_a = tokens.verify(&a.token.token).unwrap();
    let claims_b = tokens.verify(&b.token.token).unwrap();
    assert_eq!(claims_a.user, claims_b.user);
}

#[tokio::test]
async fn organization_registration_racing_first_sign_in_leaves_one_owner() {
    let store = gated_store();
    let tokens = TokenService::new("race-test-secret").unwrap();
    let resolver = IdentityResolver::new(store.clone());
    let authenticator = CredentialAuthenticator::new(resolver.clone(), tokens.clone());
    let federation = FederatedSignIn::new(resolver.clone(), tokens.clone());

    let organization = NewPrincipal::Organization(NewOrganization {
        email: "desk@hospital.example".to_string(),
        name: "General Hospital".to_string(),
        address: "1 Main St".to_string(),
        ..Default::default()
    });

    let (registered, signed_in) = tokio::join!(
        authenticator.register(organization, Password::new("frontdesk")),
        federation.handle_callback(identity("g-9", Some("Desk"), &["desk@hospital.example"])),
    );

    let holders = store.inner.count(PrincipalKind::AccountHolder);
    let orgs = store.inner.count(PrincipalKind::Organization);
    assert_eq!(holders + orgs, 1);

    let signed_in = signed_in.unwrap();
    match registered {
        Ok(registered) => {
            assert_eq!(orgs, 1);
            assert!(!signed_in.created);
            assert_eq!(signed_in.principal.id(), registered.principal_id);
        }
        Err(ServiceError::EmailAlreadyRegistered) => {
            assert_eq!(holders, 1);
            assert!(signed_in.created);
        }
        Err(e) => panic!("unexpected registration error: {e}"),
    }

    // The email still resolves to exactly one principal afterwards.
    let owner = resolver.resolve("desk@hospital.example").await.unwrap().unwrap();
    assert_eq!(owner.id(), signed_in.principal.id());
}
