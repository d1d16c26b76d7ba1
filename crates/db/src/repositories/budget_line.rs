//! Budget line repository.
//!
//! Lines store their variance and mirror the parent currency; both are
//! rewritten from the live formula at every write, never read stale.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use fundline_core::budget::variance_of;

use crate::entities::{budget_applications, budget_lines};

/// Error types for budget line operations.
#[derive(Debug, thiserror::Error)]
pub enum BudgetLineError {
    /// Budget application not found.
    #[error("Budget application not found: {0}")]
    ApplicationNotFound(Uuid),

    /// Budget line not found.
    #[error("Budget line not found: {0}")]
    LineNotFound(Uuid),

    /// Line name must not be empty.
    #[error("Budget line name cannot be empty")]
    EmptyName,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a budget line.
#[derive(Debug, Clone)]
pub struct CreateBudgetLineInput {
    /// Line name.
    pub name: String,
    /// Expense category reference.
    pub expense_category_id: Uuid,
    /// Donor fund reference, if the expense is donor-funded.
    pub donor_fund_id: Option<Uuid>,
    /// Allocated amount.
    pub allocated_amount: Decimal,
    /// Actual spend recorded so far; defaults to zero.
    pub actual_spend: Option<Decimal>,
}

/// Input for updating a budget line.
#[derive(Debug, Clone, Default)]
pub struct UpdateBudgetLineInput {
    /// New name.
    pub name: Option<String>,
    /// New expense category reference.
    pub expense_category_id: Option<Uuid>,
    /// New donor fund reference.
    pub donor_fund_id: Option<Option<Uuid>>,
    /// New allocated amount.
    pub allocated_amount: Option<Decimal>,
    /// New actual spend.
    pub actual_spend: Option<Decimal>,
}

/// Budget line repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct BudgetLineRepository {
    db: DatabaseConnection,
}

impl BudgetLineRepository {
    /// Creates a new budget line repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a budget line under an application.
    ///
    /// The stored variance is computed from the inputs and the currency is
    /// mirrored from the parent.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The application does not exist
    /// - The name is empty
    /// - The database operation fails
    pub async fn create_line(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
        input: CreateBudgetLineInput,
    ) -> Result<budget_lines::Model, BudgetLineError> {
        let application = self.get_parent(organization_id, application_id).await?;

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(BudgetLineError::EmptyName);
        }

        let allocated = input.allocated_amount;
        let actual = input.actual_spend.unwrap_or(Decimal::ZERO);

        let now = Utc::now().into();
        let line = budget_lines::ActiveModel {
            id: Set(Uuid::new_v4()),
            budget_application_id: Set(application_id),
            name: Set(name),
            expense_category_id: Set(input.expense_category_id),
            donor_fund_id: Set(input.donor_fund_id),
            allocated_amount: Set(allocated),
            actual_spend: Set(actual),
            variance: Set(variance_of(allocated, actual)),
            currency: Set(application.currency),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(line.insert(&self.db).await?)
    }

    /// Lists budget lines of an application in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is not found or the database
    /// query fails.
    pub async fn list_lines(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
    ) -> Result<Vec<budget_lines::Model>, BudgetLineError> {
        self.get_parent(organization_id, application_id).await?;

        Ok(budget_lines::Entity::find()
            .filter(budget_lines::Column::BudgetApplicationId.eq(application_id))
            .order_by_asc(budget_lines::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Updates a budget line.
    ///
    /// The variance is recomputed from the final allocated amount and
    /// actual spend, and the currency is rewritten from the parent.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The application or line does not exist
    /// - The new name is empty
    /// - The database operation fails
    pub async fn update_line(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
        line_id: Uuid,
        input: UpdateBudgetLineInput,
    ) -> Result<budget_lines::Model, BudgetLineError> {
        let application = self.get_parent(organization_id, application_id).await?;

        let line = budget_lines::Entity::find_by_id(line_id)
            .filter(budget_lines::Column::BudgetApplicationId.eq(application_id))
            .one(&self.db)
            .await?
            .ok_or(BudgetLineError::LineNotFound(line_id))?;

        let allocated = input.allocated_amount.unwrap_or(line.allocated_amount);
        let actual = input.actual_spend.unwrap_or(line.actual_spend);

        let mut active: budget_lines::ActiveModel = line.into();

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(BudgetLineError::EmptyName);
            }
            active.name = Set(name);
        }
        if let Some(expense_category_id) = input.expense_category_id {
            active.expense_category_id = Set(expense_category_id);
        }
        if let Some(donor_fund_id) = input.donor_fund_id {
            active.donor_fund_id = Set(donor_fund_id);
        }

        active.allocated_amount = Set(allocated);
        active.actual_spend = Set(actual);
        active.variance = Set(variance_of(allocated, actual));
        active.currency = Set(application.currency);
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a budget line.
    ///
    /// # Errors
    ///
    /// Returns an error if the application or line is not found, or the
    /// database operation fails.
    pub async fn delete_line(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
        line_id: Uuid,
    ) -> Result<(), BudgetLineError> {
        self.get_parent(organization_id, application_id).await?;

        let result = budget_lines::Entity::delete_by_id(line_id)
            .filter(budget_lines::Column::BudgetApplicationId.eq(application_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(BudgetLineError::LineNotFound(line_id));
        }

        Ok(())
    }

    /// Fetches the owning application, scoped to the organization.
    async fn get_parent(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
    ) -> Result<budget_applications::Model, BudgetLineError> {
        budget_applications::Entity::find_by_id(application_id)
            .filter(budget_applications::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await?
            .ok_or(BudgetLineError::ApplicationNotFound(application_id))
    }
}
