use chrono::{DateTime, Utc};
use mongodb::{
    bson::doc,
    options::{IndexOptions, UpdateOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use crate::models::{OtpChallenge, Role, User};
use crate::utils::{hash_password, Password};

/// MongoDB wrapper owning the `users` and `otp_challenges` collections.
///
/// Both collections carry a unique index on `email`; that index is what
/// turns concurrent writes into the single-winner semantics the service
/// relies on (one identity per email, one live challenge per email).
#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::StoreUnavailable(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for auth-service");

        let email_unique = |name: &str| {
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(
                    IndexOptions::builder()
                        .name(name.to_string())
                        .unique(true)
                        .build(),
                )
                .build()
        };

        self.users()
            .create_index(email_unique("email_unique_idx"), None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create users email index: {}", e);
                AppError::StoreUnavailable(anyhow::anyhow!(e.to_string()))
            })?;

        self.otp_challenges()
            .create_index(email_unique("otp_email_unique_idx"), None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create otp_challenges email index: {}", e);
                AppError::StoreUnavailable(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::StoreUnavailable(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn otp_challenges(&self) -> Collection<OtpChallenge> {
        self.db.collection("otp_challenges")
    }

    // ==================== User Operations ====================

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.users()
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(AppError::from)
    }

    /// Create an identity record.
    ///
    /// The password is hashed here, before anything is persisted; callers
    /// never hand a hash in. A duplicate-key write on the unique email
    /// index surfaces as the typed `AlreadyExists` failure.
    pub async fn create_user(
        &self,
        email: &str,
        password: &Password,
        role: Role,
    ) -> Result<User, AppError> {
        let password_hash = hash_password(password)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Password hashing error: {}", e)))?;

        let user = User::new(email.to_string(), password_hash.into_string(), role);

        self.users()
            .insert_one(&user, None)
            .await
            .map_err(|e| {
                if is_duplicate_key_error(&e) {
                    AppError::AlreadyExists(anyhow::anyhow!("Account already exists"))
                } else {
                    AppError::from(e)
                }
            })?;

        Ok(user)
    }

    // ==================== OTP Challenge Operations ====================

    /// Replace-or-insert the single challenge row for `email`.
    ///
    /// The unique index plus `upsert` makes this atomic with respect to
    /// concurrent issues for the same address: exactly one code is live
    /// afterwards, and a resend invalidates the prior code immediately.
    pub async fn upsert_challenge(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let options = UpdateOptions::builder().upsert(true).build();
        self.otp_challenges()
            .update_one(
                doc! { "email": email },
                doc! {
                    "$set": {
                        "code": code,
                        "expires_at": mongodb::bson::DateTime::from_chrono(expires_at),
                    },
                    "$setOnInsert": {
                        "created_at": mongodb::bson::DateTime::from_chrono(Utc::now()),
                    },
                },
                options,
            )
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    pub async fn find_challenge(&self, email: &str) -> Result<Option<OtpChallenge>, AppError> {
        self.otp_challenges()
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(AppError::from)
    }

    /// Delete the challenge row for `email`. Deleting an absent row is a
    /// no-op, not an error.
    pub async fn delete_challenge(&self, email: &str) -> Result<(), AppError> {
        self.otp_challenges()
            .delete_one(doc! { "email": email }, None)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}

fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    match &*err.kind {
        mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(we)) => {
            we.code == 11000
        }
        _ => false,
    }
}
