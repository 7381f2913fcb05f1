//! MongoDB-backed principal store (`users` and `hospitals` collections).
//!
//! Every email is first claimed in the shared `emails` collection, keyed by
//! `_id`, so one write decides ownership across both principal collections.

use async_trait::async_trait;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use crate::models::{AccountHolder, Organization, Principal, PrincipalKind};
use crate::services::store::{PrincipalStore, StoreError};

const DUPLICATE_KEY: i32 = 11000;
const EMAIL_CLAIMS: &str = "emails";

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    /// Unique email index per principal collection, then claims for any
    /// records written before the `emails` collection existed.
    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for identity-service");

        for kind in PrincipalKind::ALL {
            let email_index = IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(
                    IndexOptions::builder()
                        .name("email_unique".to_string())
                        .unique(true)
                        .build(),
                )
                .build();

            self.db
                .collection::<Document>(kind.collection())
                .create_index(email_index, None)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to create email index on {} collection: {}",
                        kind.collection(),
                        e
                    );
                    AppError::from(e)
                })?;
            tracing::info!("Created unique index on {}.email", kind.collection());
        }

        self.backfill_email_claims().await
    }

    async fn backfill_email_claims(&self) -> Result<(), AppError> {
        let projection = FindOptions::builder()
            .projection(doc! { "_id": 1, "email": 1 })
            .build();

        for kind in PrincipalKind::ALL {
            let mut cursor = self
                .db
                .collection::<Document>(kind.collection())
                .find(None, projection.clone())
                .await?;

            let mut claimed = 0usize;
            while cursor.advance().await? {
                let record = cursor.deserialize_current()?;
                let (Ok(email), Some(id)) = (record.get_str("email"), record.get("_id")) else {
                    continue;
                };
                let principal_id = id.as_str().map_or_else(|| id.to_string(), str::to_string);
                let claim = claim_document(email, kind, &principal_id);
                match self.claims().insert_one(claim, None).await {
                    Ok(_) => claimed += 1,
                    Err(e) if is_duplicate_key(&e) => {}
                    Err(e) => return Err(e.into()),
                }
            }

            if claimed > 0 {
                tracing::info!(kind = %kind, claimed, "Backfilled email claims");
            }
        }

        Ok(())
    }

    fn users(&self) -> Collection<AccountHolder> {
        self.db.collection(PrincipalKind::AccountHolder.collection())
    }

    fn hospitals(&self) -> Collection<Organization> {
        self.db.collection(PrincipalKind::Organization.collection())
    }

    fn claims(&self) -> Collection<Document> {
        self.db.collection(EMAIL_CLAIMS)
    }

    async fn release_claim(&self, email: &str) {
        if let Err(e) = self.claims().delete_one(doc! { "_id": email }, None).await {
            tracing::error!(error = %e, "Failed to release email claim after insert failure");
        }
    }
}

fn claim_document(email: &str, kind: PrincipalKind, principal_id: &str) -> Document {
    doc! {
        "_id": email,
        "kind": kind.as_str(),
        "principal_id": principal_id,
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write_error))
            if write_error.code == DUPLICATE_KEY
    )
}

fn map_insert_error(kind: PrincipalKind, err: mongodb::error::Error) -> StoreError {
    if is_duplicate_key(&err) {
        StoreError::DuplicateEmail(kind)
    } else {
        StoreError::Backend(anyhow::Error::new(err))
    }
}

#[async_trait]
impl PrincipalStore for MongoStore {
    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<Principal>, StoreError> {
        let filter = doc! { "email": email };
        let found = match kind {
            PrincipalKind::AccountHolder => self
                .users()
                .find_one(filter, None)
                .await
                .map(|r| r.map(Principal::AccountHolder)),
            PrincipalKind::Organization => self
                .hospitals()
                .find_one(filter, None)
                .await
                .map(|r| r.map(Principal::Organization)),
        };
        found.map_err(|e| StoreError::Backend(anyhow::Error::new(e)))
    }

    async fn insert(&self, principal: &Principal) -> Result<(), StoreError> {
        let kind = principal.kind();
        let claim = claim_document(principal.email(), kind, principal.id());
        self.claims()
            .insert_one(claim, None)
            .await
            .map_err(|e| map_insert_error(kind, e))?;

        let result = match principal {
            Principal::AccountHolder(a) => self.users().insert_one(a, None).await,
            Principal::Organization(o) => self.hospitals().insert_one(o, None).await,
        };
        if let Err(e) = result {
            self.release_claim(principal.email()).await;
            return Err(map_insert_error(kind, e));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map(|_| ())
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                StoreError::Backend(anyhow::Error::new(e))
            })
    }
}
