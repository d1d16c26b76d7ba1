//! Directory repository for the expense-category and donor-fund registries.
//!
//! Budget lines reference these registries; application logic never
//! validates the references beyond the foreign keys.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::entities::{donor_funds, expense_categories};

/// Directory repository for registry CRUD operations.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    db: DatabaseConnection,
}

impl DirectoryRepository {
    /// Creates a new directory repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an expense category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create_expense_category(
        &self,
        organization_id: Uuid,
        code: &str,
        name: &str,
    ) -> Result<expense_categories::Model, DbErr> {
        let now = Utc::now().into();
        let category = expense_categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        category.insert(&self.db).await
    }

    /// Lists expense categories for an organization, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_expense_categories(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<expense_categories::Model>, DbErr> {
        expense_categories::Entity::find()
            .filter(expense_categories::Column::OrganizationId.eq(organization_id))
            .order_by_asc(expense_categories::Column::Code)
            .all(&self.db)
            .await
    }

    /// Creates a donor fund.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create_donor_fund(
        &self,
        organization_id: Uuid,
        code: &str,
        name: &str,
    ) -> Result<donor_funds::Model, DbErr> {
        let now = Utc::now().into();
        let fund = donor_funds::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        fund.insert(&self.db).await
    }

    /// Lists donor funds for an organization, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_donor_funds(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<donor_funds::Model>, DbErr> {
        donor_funds::Entity::find()
            .filter(donor_funds::Column::OrganizationId.eq(organization_id))
            .order_by_asc(donor_funds::Column::Code)
            .all(&self.db)
            .await
    }
}
