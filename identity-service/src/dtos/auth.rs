use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{NewAccountHolder, NewOrganization, NewPrincipal, PrincipalKind};
use crate::services::Authenticated;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterAccountHolderRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub gender: Option<String>,
    #[validate(range(max = 150))]
    pub age: Option<u32>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl From<&RegisterAccountHolderRequest> for NewPrincipal {
    fn from(req: &RegisterAccountHolderRequest) -> Self {
        NewPrincipal::AccountHolder(NewAccountHolder {
            email: req.email.clone(),
            name: req.name.trim().to_string(),
            gender: req.gender.clone(),
            age: req.age,
            phone: req.phone.clone(),
            address: req.address.clone(),
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOrganizationRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1))]
    pub address: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default)]
    pub available_services: Vec<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    #[serde(default)]
    pub ratings: f64,
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

impl From<&RegisterOrganizationRequest> for NewPrincipal {
    fn from(req: &RegisterOrganizationRequest) -> Self {
        NewPrincipal::Organization(NewOrganization {
            email: req.email.clone(),
            name: req.name.trim().to_string(),
            address: req.address.clone(),
            phone: req.phone.clone(),
            departments: req.departments.clone(),
            available_services: req.available_services.clone(),
            rating: req.ratings,
            lat: req.lat,
            long: req.long,
        })
    }
}

/// Successful authentication response.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: i64,
    pub principal_id: String,
    pub kind: PrincipalKind,
}

impl From<Authenticated> for TokenResponse {
    fn from(auth: Authenticated) -> Self {
        Self {
            token: auth.token.token,
            expires_at: auth.token.expires_at,
            principal_id: auth.principal_id,
            kind: auth.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_password_fails_validation() {
        let req = RegisterAccountHolderRequest {
            email: "pat@x.com".to_string(),
            password: "123".to_string(),
            name: "Pat".to_string(),
            gender: None,
            age: None,
            phone: None,
            address: None,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn organization_request_uses_seeder_field_names() {
        let req: RegisterOrganizationRequest = serde_json::from_str(
            r#"{"email":"info@apollo.com","password":"secure1","name":"Apollo",
                "address":"Greams Road","availableServices":["Emergency"],"ratings":4.8}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        match NewPrincipal::from(&req) {
            NewPrincipal::Organization(o) => {
                assert_eq!(o.available_services, vec!["Emergency".to_string()]);
                assert_eq!(o.rating, 4.8);
            }
            NewPrincipal::AccountHolder(_) => panic!("expected organization"),
        }
    }
}
