use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{Result, ServiceError};
use crate::core::storage::SecretsRepository;
use crate::models::{BucketKeyRecord, SecretRecord};

// Small floor keeps connections warm; the bounded ceiling makes a slow
// database back pressure up to the callers instead of piling on.
const POOL_MIN_CONNECTIONS: u32 = 2;
const POOL_MAX_CONNECTIONS: u32 = 8;

// Postgres SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// Repository backed by a pooled Postgres connection
pub struct PostgresRepository {
    pool: Pool<Postgres>,
}

impl PostgresRepository {
    /// Create a new PostgresRepository over an existing pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create the schema if it is missing
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS bucket_keys (
                app_name TEXT NOT NULL,
                bucket_name TEXT NOT NULL,
                key_blob BYTEA NOT NULL,
                client_id UUID NOT NULL,
                PRIMARY KEY (app_name, bucket_name)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS secrets (
                app_name TEXT NOT NULL,
                bucket_name TEXT NOT NULL,
                secret_name TEXT NOT NULL,
                ciphertext BYTEA NOT NULL,
                PRIMARY KEY (app_name, bucket_name, secret_name)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }
}

fn store_error(e: sqlx::Error) -> ServiceError {
    ServiceError::StoreUnavailable(format!("Database error: {}", e))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

#[async_trait]
impl SecretsRepository for PostgresRepository {
    async fn insert_bucket_key(&self, record: &BucketKeyRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO bucket_keys (app_name, bucket_name, key_blob, client_id)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&record.app_name)
        .bind(&record.bucket_name)
        .bind(&record.key_blob)
        .bind(record.client_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::BucketExists(format!(
                    "{}/{}",
                    record.app_name, record.bucket_name
                ))
            } else {
                store_error(e)
            }
        })?;

        Ok(())
    }

    async fn fetch_bucket_keys(&self) -> Result<Vec<BucketKeyRecord>> {
        let rows: Vec<(String, String, Vec<u8>, Uuid)> = sqlx::query_as(
            "SELECT app_name, bucket_name, key_blob, client_id FROM bucket_keys",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows
            .into_iter()
            .map(|(app_name, bucket_name, key_blob, client_id)| BucketKeyRecord {
                app_name,
                bucket_name,
                key_blob,
                client_id,
            })
            .collect())
    }

    async fn upsert_secret(&self, record: &SecretRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO secrets (app_name, bucket_name, secret_name, ciphertext)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (app_name, bucket_name, secret_name)
             DO UPDATE SET ciphertext = EXCLUDED.ciphertext",
        )
        .bind(&record.app_name)
        .bind(&record.bucket_name)
        .bind(&record.secret_name)
        .bind(&record.ciphertext)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn update_secret(
        &self,
        app_name: &str,
        bucket_name: &str,
        secret_name: &str,
        ciphertext: &[u8],
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE secrets SET ciphertext = $1
             WHERE app_name = $2 AND bucket_name = $3 AND secret_name = $4",
        )
        .bind(ciphertext)
        .bind(app_name)
        .bind(bucket_name)
        .bind(secret_name)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::SecretNotFound(format!(
                "{}/{}/{}",
                app_name, bucket_name, secret_name
            )));
        }

        Ok(())
    }

    async fn delete_secret(
        &self,
        app_name: &str,
        bucket_name: &str,
        secret_name: &str,
    ) -> Result<()> {
        sqlx::query(
            "DELETE FROM secrets
             WHERE app_name = $1 AND bucket_name = $2 AND secret_name = $3",
        )
        .bind(app_name)
        .bind(bucket_name)
        .bind(secret_name)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn fetch_secrets(&self) -> Result<Vec<SecretRecord>> {
        let rows: Vec<(String, String, String, Vec<u8>)> = sqlx::query_as(
            "SELECT app_name, bucket_name, secret_name, ciphertext FROM secrets",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows
            .into_iter()
            .map(|(app_name, bucket_name, secret_name, ciphertext)| SecretRecord {
                app_name,
                bucket_name,
                secret_name,
                ciphertext,
            })
            .collect())
    }
}

/// Connect to the database and initialize the schema
pub async fn create_postgres_repository(database_url: &str) -> Result<Arc<PostgresRepository>> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .min_connections(POOL_MIN_CONNECTIONS)
        .max_connections(POOL_MAX_CONNECTIONS)
        .connect(database_url)
        .await
        .map_err(|e| {
            ServiceError::StoreUnavailable(format!("Failed to connect to database: {}", e))
        })?;

    let repository = PostgresRepository::new(pool);
    repository.init_schema().await?;

    tracing::info!("Created Postgres repository (pool {}..{})", POOL_MIN_CONNECTIONS, POOL_MAX_CONNECTIONS);
    Ok(Arc::new(repository))
}
