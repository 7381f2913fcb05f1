pub mod auth;
pub mod oauth;
pub mod profile;
