pub mod identity;
pub mod principal;

pub use identity::ExternalIdentity;
pub use principal::{
    normalize_email, AccountHolder, NewAccountHolder, NewOrganization, NewPrincipal,
    Organization, Principal, PrincipalKind,
};
