//! Services layer for identity-service.
//!
//! Credential store, identity resolution, token issuance and the two
//! authentication paths built on top of them.

pub mod authenticator;
mod database;
pub mod error;
pub mod federation;
pub mod google;
pub mod resolver;
pub mod store;
pub mod token;

pub use authenticator::{Authenticated, CredentialAuthenticator};
pub use database::MongoStore;
pub use error::ServiceError;
pub use federation::{FederatedOutcome, FederatedSignIn};
pub use google::{GoogleProvider, IdentityProvider};
pub use resolver::IdentityResolver;
pub use store::{InMemoryStore, PrincipalStore, StoreError};
pub use token::{AccessTokenClaims, IssuedToken, PrincipalClaims, TokenError, TokenService};
