//! Seeds a handful of sample hospitals. Safe to re-run: emails already
//! registered under either principal kind are skipped.

use identity_service::{
    config::IdentityConfig,
    models::{NewOrganization, NewPrincipal},
    services::{IdentityResolver, MongoStore, ServiceError},
    utils::{hash_password, Password},
};
use service_core::config::env_var;
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use std::sync::Arc;

fn sample_organizations() -> Vec<NewOrganization> {
    let org = |name: &str,
               address: &str,
               phone: &str,
               email: &str,
               departments: [&str; 3],
               services: [&str; 3],
               rating: f64,
               lat: f64,
               long: f64| NewOrganization {
        email: email.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        phone: Some(phone.to_string()),
        departments: departments.iter().map(|s| s.to_string()).collect(),
        available_services: services.iter().map(|s| s.to_string()).collect(),
        rating,
        lat: Some(lat),
        long: Some(long),
    };

    vec![
        org(
            "Apollo Hospitals",
            "Greams Road, Chennai",
            "+91-44-2829-0200",
            "info@apollohospitals.com",
            ["Cardiology", "Oncology", "Neurology"],
            ["Emergency", "Inpatient", "Surgery"],
            4.8,
            13.0724,
            80.2518,
        ),
        org(
            "Fortis Hospital",
            "Shalimar Bagh, New Delhi",
            "+91-11-4530-2222",
            "contactus@fortishealthcare.com",
            ["Orthopedics", "Pediatrics", "Cardiology"],
            ["Outpatient", "Emergency", "Diagnostic"],
            4.7,
            28.7167,
            77.1667,
        ),
        org(
            "Manipal Hospitals",
            "HAL Airport Road, Bengaluru",
            "+91-80-2502-4444",
            "support@manipalhospitals.com",
            ["Gastroenterology", "Pulmonology", "Oncology"],
            ["ICU", "Radiology", "Consultations"],
            4.5,
            12.9592,
            77.6974,
        ),
    ]
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = IdentityConfig::from_env()?;
    init_tracing("seed-organizations", &config.log_level, None)?;

    let password = env_var("SEED_PASSWORD").ok_or_else(|| {
        AppError::ConfigError(anyhow::anyhow!("SEED_PASSWORD is required but not set"))
    })?;

    tracing::info!(database = %config.mongodb.database, "Seeding organizations");

    let store = MongoStore::connect(&config.mongodb.uri, &config.mongodb.database).await?;
    store.initialize_indexes().await?;
    let resolver = IdentityResolver::new(Arc::new(store));

    let mut created = 0usize;
    for org in sample_organizations() {
        let name = org.name.clone();
        let password = Password::new(password.clone());
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Hashing task failed: {}", e)))??;

        match resolver
            .create(NewPrincipal::Organization(org), Some(password_hash))
            .await
        {
            Ok(principal) => {
                created += 1;
                tracing::info!(name = %name, id = %principal.id(), "Organization created");
            }
            Err(ServiceError::EmailAlreadyRegistered) => {
                tracing::info!(name = %name, "Already registered, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(created, "Seeding complete");
    Ok(())
}
