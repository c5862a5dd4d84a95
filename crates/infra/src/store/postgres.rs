//! Postgres-backed record store.
//!
//! ## Error mapping
//!
//! SQLx errors map to [`StoreError`] by SQLSTATE class: integrity violations
//! (class 23) become `Constraint`, transaction rollbacks (class 40, i.e.
//! serialization failures and deadlocks) become the retryable `Conflict`, and
//! everything else is treated as `Connection`.
//!
//! ## Timestamps
//!
//! `created_at`/`updated_at` use `NOW()` inside the write transaction, so the
//! clock is the store's and is constant per transaction regardless of how
//! many statements it runs.
//!
//! ## Thread safety
//!
//! Uses the SQLx connection pool, which is thread-safe (Arc + Send + Sync).

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use packrat_core::{ItemId, ItemView, UserId, UserRecord};

use super::{RecordStore, StoreError, WritePolicy};

/// Postgres store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: Arc<PgPool>,
    policy: WritePolicy,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool, policy: WritePolicy) -> Self {
        Self {
            pool: Arc::new(pool),
            policy,
        }
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    #[instrument(skip(self, user), fields(user_id = %user.user_id), err)]
    async fn insert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_insert_user", e))?;

        sqlx::query(
            r#"
            INSERT INTO users (user_id, name, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(&user.user_name)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_insert_user", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id, item_id = %item_id), err)]
    async fn insert_user_item(
        &self,
        user_id: UserId,
        item_id: &ItemId,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_insert_user_item", e))?;

        if self.policy.check_references {
            let user_row = sqlx::query("SELECT 1 FROM users WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("check_user_reference", e))?;
            if user_row.is_none() {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback_insert_user_item", e))?;
                return Err(StoreError::NotFound(format!("user {}", user_id)));
            }
        }

        if !self.policy.allow_duplicates {
            let existing = sqlx::query(
                "SELECT 1 FROM user_items WHERE user_id = $1 AND item_id = $2",
            )
            .bind(user_id.as_uuid())
            .bind(item_id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("check_duplicate_user_item", e))?;
            if existing.is_some() {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback_insert_user_item", e))?;
                return Err(StoreError::Constraint(format!(
                    "user {} already owns item {}",
                    user_id, item_id
                )));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO user_items (user_id, item_id, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(item_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user_item", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_insert_user_item", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn list_user_items(&self, user_id: UserId) -> Result<Vec<ItemView>, StoreError> {
        // Single statement: snapshot-consistent under Postgres MVCC without
        // an explicit transaction.
        let rows = sqlx::query(
            r#"
            SELECT users.name AS user_name, items.item_name, user_items.item_id
            FROM user_items
            JOIN items ON items.item_id = user_items.item_id
            JOIN users ON users.user_id = user_items.user_id
            WHERE user_items.user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_user_items", e))?;

        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            views.push(ItemView {
                user_name: row
                    .try_get("user_name")
                    .map_err(|e| StoreError::Connection(format!("bad row: {}", e)))?,
                item_name: row
                    .try_get("item_name")
                    .map_err(|e| StoreError::Connection(format!("bad row: {}", e)))?,
                item_id: row
                    .try_get("item_id")
                    .map_err(|e| StoreError::Connection(format!("bad row: {}", e)))?,
            });
        }
        Ok(views)
    }
}

/// Map SQLx errors to [`StoreError`].
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Class 23: integrity constraint violation.
                Some(code) if code.starts_with("23") => StoreError::Constraint(msg),
                // Class 40: transaction rollback (serialization, deadlock).
                Some(code) if code.starts_with("40") => StoreError::Conflict(msg),
                _ => StoreError::Connection(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Connection(format!("connection pool unavailable in {}", operation))
        }
        other => StoreError::Connection(format!("sqlx error in {}: {}", operation, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_closed_maps_to_connection() {
        let err = map_sqlx_error("op", sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Connection(_)));
    }
}
