pub mod auth;

pub use auth::{LoginRequest, RegisterAccountHolderRequest, RegisterOrganizationRequest, TokenResponse};
