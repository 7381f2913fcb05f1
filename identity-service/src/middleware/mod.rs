pub mod auth;

pub use auth::{
    auth_middleware, AuthPrincipal, AuthenticatedPrincipal, ErrorResponse, AUTH_TOKEN_HEADER,
};
