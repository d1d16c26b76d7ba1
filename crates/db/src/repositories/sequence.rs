//! Sequence repository backing generated references.
//!
//! Each organization carries named counters; allocation locks the counter
//! row so two writers never render the same value.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use fundline_core::reference;

use crate::entities::sequences;

/// Sequence code backing budget application references.
pub const BUDGET_APPLICATION_SEQUENCE: &str = "budget.application";

/// Prefix seeded on the budget application sequence.
pub const DEFAULT_REFERENCE_PREFIX: &str = "BA/";

/// Zero-padding width seeded on the budget application sequence.
pub const DEFAULT_REFERENCE_PADDING: i32 = 5;

/// Error types for sequence operations.
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    /// No sequence registered under this code for the organization.
    #[error("No sequence registered for code {code}")]
    NotFound {
        /// Owning organization.
        organization_id: Uuid,
        /// Sequence code that was requested.
        code: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Sequence repository for reference allocation.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    db: DatabaseConnection,
}

impl SequenceRepository {
    /// Creates a new sequence repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Allocates the next reference from a named sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the sequence does not exist or the database
    /// operation fails.
    pub async fn next_by_code(
        &self,
        organization_id: Uuid,
        code: &str,
    ) -> Result<String, SequenceError> {
        let txn = self.db.begin().await.map_err(SequenceError::Database)?;
        let generated = allocate_reference(&txn, organization_id, code).await?;
        txn.commit().await.map_err(SequenceError::Database)?;

        Ok(generated)
    }
}

/// Allocates the next reference inside the caller's transaction.
///
/// The counter row is loaded with `SELECT ... FOR UPDATE`, so concurrent
/// allocations serialize and every caller sees a distinct value.
pub(crate) async fn allocate_reference(
    txn: &DatabaseTransaction,
    organization_id: Uuid,
    code: &str,
) -> Result<String, SequenceError> {
    let sequence = sequences::Entity::find()
        .filter(sequences::Column::OrganizationId.eq(organization_id))
        .filter(sequences::Column::Code.eq(code))
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| SequenceError::NotFound {
            organization_id,
            code: code.to_string(),
        })?;

    let value = sequence.next_value;
    let prefix = sequence.prefix.clone();
    let padding = u32::try_from(sequence.padding).unwrap_or(0);

    let mut active: sequences::ActiveModel = sequence.into();
    active.next_value = Set(value + 1);
    active.updated_at = Set(Utc::now().into());
    active.update(txn).await?;

    Ok(reference::format(&prefix, padding, value))
}
