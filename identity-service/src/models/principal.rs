//! Principal model - account holders (patients) and organizations (hospitals)
//! sharing one email namespace across two collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of the two disjoint collections a principal lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    AccountHolder,
    Organization,
}

impl PrincipalKind {
    /// Lookup order used by the resolver.
    pub const ALL: [PrincipalKind; 2] = [PrincipalKind::AccountHolder, PrincipalKind::Organization];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::AccountHolder => "account_holder",
            PrincipalKind::Organization => "organization",
        }
    }

    pub fn collection(&self) -> &'static str {
        match self {
            PrincipalKind::AccountHolder => "users",
            PrincipalKind::Organization => "hospitals",
        }
    }
}

impl std::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A patient account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountHolder {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub name: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub history: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A hospital listed in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default)]
    pub available_services: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub long: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    AccountHolder(AccountHolder),
    Organization(Organization),
}

impl Principal {
    pub fn id(&self) -> &str {
        match self {
            Principal::AccountHolder(a) => &a.id,
            Principal::Organization(o) => &o.id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Principal::AccountHolder(a) => &a.email,
            Principal::Organization(o) => &o.email,
        }
    }

    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::AccountHolder(_) => PrincipalKind::AccountHolder,
            Principal::Organization(_) => PrincipalKind::Organization,
        }
    }

    /// Stored credential; `None` for federation-only accounts.
    pub fn password_hash(&self) -> Option<&str> {
        let hash = match self {
            Principal::AccountHolder(a) => a.password_hash.as_deref(),
            Principal::Organization(o) => o.password_hash.as_deref(),
        };
        hash.filter(|h| !h.is_empty())
    }

    pub fn name(&self) -> &str {
        match self {
            Principal::AccountHolder(a) => &a.name,
            Principal::Organization(o) => &o.name,
        }
    }
}

/// Attributes for a new account holder.
#[derive(Debug, Clone, Default)]
pub struct NewAccountHolder {
    pub email: String,
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Attributes for a new organization.
#[derive(Debug, Clone, Default)]
pub struct NewOrganization {
    pub email: String,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub departments: Vec<String>,
    pub available_services: Vec<String>,
    pub rating: f64,
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

#[derive(Debug, Clone)]
pub enum NewPrincipal {
    AccountHolder(NewAccountHolder),
    Organization(NewOrganization),
}

impl NewPrincipal {
    pub fn email(&self) -> &str {
        match self {
            NewPrincipal::AccountHolder(a) => &a.email,
            NewPrincipal::Organization(o) => &o.email,
        }
    }

    pub fn kind(&self) -> PrincipalKind {
        match self {
            NewPrincipal::AccountHolder(_) => PrincipalKind::AccountHolder,
            NewPrincipal::Organization(_) => PrincipalKind::Organization,
        }
    }

    /// Build the stored record with a fresh id. `email` must already be normalized.
    pub fn into_principal(self, email: String, password_hash: Option<String>) -> Principal {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        match self {
            NewPrincipal::AccountHolder(a) => Principal::AccountHolder(AccountHolder {
                id,
                email,
                password_hash,
                name: a.name,
                gender: a.gender,
                age: a.age,
                phone: a.phone,
                address: a.address,
                history: Vec::new(),
                created_at,
            }),
            NewPrincipal::Organization(o) => Principal::Organization(Organization {
                id,
                email,
                password_hash,
                name: o.name,
                address: o.address,
                phone: o.phone,
                departments: o.departments,
                available_services: o.available_services,
                rating: o.rating,
                lat: o.lat,
                long: o.long,
                created_at,
            }),
        }
    }
}

/// Canonical form used for every lookup and insert.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
