//! Organization repository for database operations.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set, TransactionTrait};
use uuid::Uuid;

use crate::entities::{currencies, organizations, sequences};

use super::sequence::{
    BUDGET_APPLICATION_SEQUENCE, DEFAULT_REFERENCE_PADDING, DEFAULT_REFERENCE_PREFIX,
};

/// Organization repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: DatabaseConnection,
}

impl OrganizationRepository {
    /// Creates a new organization repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an organization by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<organizations::Model>, DbErr> {
        organizations::Entity::find_by_id(id).one(&self.db).await
    }

    /// Checks whether a currency code exists in the seeded reference table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn currency_exists(&self, code: &str) -> Result<bool, DbErr> {
        Ok(currencies::Entity::find_by_id(code.to_string())
            .one(&self.db)
            .await?
            .is_some())
    }

    /// Creates a new organization with its reference sequence.
    ///
    /// Every organization gets a `budget.application` sequence in the same
    /// transaction, so reference generation never finds a missing counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        name: &str,
        base_currency: &str,
    ) -> Result<organizations::Model, DbErr> {
        let txn = self.db.begin().await?;

        let now = Utc::now().into();
        let org_id = Uuid::new_v4();

        let org = organizations::ActiveModel {
            id: Set(org_id),
            name: Set(name.to_string()),
            base_currency: Set(base_currency.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let org = org.insert(&txn).await?;

        let sequence = sequences::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(org_id),
            code: Set(BUDGET_APPLICATION_SEQUENCE.to_string()),
            prefix: Set(DEFAULT_REFERENCE_PREFIX.to_string()),
            padding: Set(DEFAULT_REFERENCE_PADDING),
            next_value: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        };

        sequence.insert(&txn).await?;

        txn.commit().await?;

        Ok(org)
    }
}
