//! Budget application repository.
//!
//! Owns the application record lifecycle: creation with sequence-backed
//! references and organization currency defaults, list and detail reads,
//! field updates with the line-currency mirror rewrite, deletion, and the
//! follower and stage-event collections.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use fundline_core::budget::LineTotals;
use fundline_shared::types::{PageRequest, PageResponse};

use crate::entities::{
    approval_lines, budget_applications, budget_lines, followers, organizations,
    sea_orm_active_enums::{ApplicationStatus, ApprovalStage},
    stage_events, users,
};

use super::sequence::{self, BUDGET_APPLICATION_SEQUENCE, SequenceError};

/// Error types for budget application operations.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    /// Budget application not found.
    #[error("Budget application not found: {0}")]
    NotFound(Uuid),

    /// Organization not found.
    #[error("Organization not found: {0}")]
    OrganizationNotFound(Uuid),

    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// User does not follow this application.
    #[error("User {0} does not follow this application")]
    FollowerNotFound(Uuid),

    /// Reference must not be empty.
    #[error("Reference cannot be empty")]
    EmptyReference,

    /// No sequence registered to generate references.
    #[error("No sequence registered for code {0}")]
    SequenceNotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<SequenceError> for ApplicationError {
    fn from(e: SequenceError) -> Self {
        match e {
            SequenceError::NotFound { code, .. } => Self::SequenceNotFound(code),
            SequenceError::Database(e) => Self::Database(e),
        }
    }
}

/// Input for creating a budget application.
#[derive(Debug, Clone)]
pub struct CreateApplicationInput {
    /// Owning organization.
    pub organization_id: Uuid,
    /// Reference; generated from the organization's sequence when absent.
    pub reference: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// First day of the validity window.
    pub start_date: NaiveDate,
    /// Last day of the validity window.
    pub end_date: NaiveDate,
    /// Requested total; defaults to zero.
    pub total_budget: Option<Decimal>,
    /// Currency code; defaults from the organization.
    pub currency: Option<String>,
    /// User creating the application.
    pub created_by: Uuid,
}

/// Input for updating a budget application.
#[derive(Debug, Clone, Default)]
pub struct UpdateApplicationInput {
    /// New description.
    pub description: Option<Option<String>>,
    /// New start date.
    pub start_date: Option<NaiveDate>,
    /// New end date.
    pub end_date: Option<NaiveDate>,
    /// New requested total.
    pub total_budget: Option<Decimal>,
    /// New currency code; lines are rewritten to mirror it.
    pub currency: Option<String>,
}

/// Budget application with children and computed totals.
#[derive(Debug, Clone)]
pub struct ApplicationDetails {
    /// Application record.
    pub application: budget_applications::Model,
    /// Budget lines in creation order.
    pub budget_lines: Vec<budget_lines::Model>,
    /// Approval lines in creation order.
    pub approval_lines: Vec<approval_lines::Model>,
    /// Aggregated allocation, spend, and variance over the lines.
    pub totals: LineTotals,
}

/// Budget application repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    db: DatabaseConnection,
}

impl ApplicationRepository {
    /// Creates a new budget application repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a budget application in stage draft.
    ///
    /// When no reference is supplied one is allocated from the
    /// organization's `budget.application` sequence, inside the same
    /// transaction as the insert.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The organization does not exist
    /// - A supplied reference is empty
    /// - No sequence is registered when one is needed
    /// - The database operation fails
    pub async fn create_application(
        &self,
        input: CreateApplicationInput,
    ) -> Result<budget_applications::Model, ApplicationError> {
        let organization = organizations::Entity::find_by_id(input.organization_id)
            .one(&self.db)
            .await?
            .ok_or(ApplicationError::OrganizationNotFound(
                input.organization_id,
            ))?;

        let supplied_reference = match input.reference {
            Some(reference) => {
                let reference = reference.trim().to_string();
                if reference.is_empty() {
                    return Err(ApplicationError::EmptyReference);
                }
                Some(reference)
            }
            None => None,
        };

        let txn = self.db.begin().await?;

        let reference = match supplied_reference {
            Some(reference) => reference,
            None => {
                sequence::allocate_reference(
                    &txn,
                    input.organization_id,
                    BUDGET_APPLICATION_SEQUENCE,
                )
                .await?
            }
        };

        let now = Utc::now().into();
        let application = budget_applications::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(input.organization_id),
            reference: Set(reference),
            description: Set(input.description),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            total_budget: Set(input.total_budget.unwrap_or(Decimal::ZERO)),
            currency: Set(input.currency.unwrap_or(organization.base_currency)),
            status: Set(ApplicationStatus::Draft),
            approval_stage: Set(ApprovalStage::Draft),
            current_approver_id: Set(None),
            created_by: Set(input.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = application.insert(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            application_id = %inserted.id,
            reference = %inserted.reference,
            "budget application created"
        );

        Ok(inserted)
    }

    /// Gets a budget application by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is not found or the database
    /// query fails.
    pub async fn get_application(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
    ) -> Result<budget_applications::Model, ApplicationError> {
        budget_applications::Entity::find_by_id(application_id)
            .filter(budget_applications::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await?
            .ok_or(ApplicationError::NotFound(application_id))
    }

    /// Gets a budget application with its children and computed totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is not found or the database
    /// query fails.
    pub async fn get_application_details(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
    ) -> Result<ApplicationDetails, ApplicationError> {
        let application = self
            .get_application(organization_id, application_id)
            .await?;

        let budget_lines = budget_lines::Entity::find()
            .filter(budget_lines::Column::BudgetApplicationId.eq(application_id))
            .order_by_asc(budget_lines::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let approval_lines = approval_lines::Entity::find()
            .filter(approval_lines::Column::BudgetApplicationId.eq(application_id))
            .order_by_asc(approval_lines::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let totals = LineTotals::accumulate(
            budget_lines
                .iter()
                .map(|line| (line.allocated_amount, line.actual_spend)),
        );

        Ok(ApplicationDetails {
            application,
            budget_lines,
            approval_lines,
            totals,
        })
    }

    /// Lists budget applications for an organization, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_applications(
        &self,
        organization_id: Uuid,
        stage: Option<ApprovalStage>,
        page: &PageRequest,
    ) -> Result<PageResponse<budget_applications::Model>, ApplicationError> {
        let mut query = budget_applications::Entity::find()
            .filter(budget_applications::Column::OrganizationId.eq(organization_id));

        if let Some(stage) = stage {
            query = query.filter(budget_applications::Column::ApprovalStage.eq(stage));
        }

        let total = query.clone().count(&self.db).await?;

        let data = query
            .order_by_desc(budget_applications::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Updates a budget application.
    ///
    /// A currency change rewrites the currency mirrored on every budget
    /// line in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is not found or the database
    /// operation fails.
    pub async fn update_application(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
        input: UpdateApplicationInput,
    ) -> Result<budget_applications::Model, ApplicationError> {
        let txn = self.db.begin().await?;

        let application = budget_applications::Entity::find_by_id(application_id)
            .filter(budget_applications::Column::OrganizationId.eq(organization_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ApplicationError::NotFound(application_id))?;

        let currency_changed = input
            .currency
            .as_ref()
            .is_some_and(|currency| *currency != application.currency);

        let now = Utc::now().into();
        let mut active: budget_applications::ActiveModel = application.into();

        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(start_date) = input.start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = input.end_date {
            active.end_date = Set(end_date);
        }
        if let Some(total_budget) = input.total_budget {
            active.total_budget = Set(total_budget);
        }
        if let Some(currency) = input.currency {
            active.currency = Set(currency);
        }
        active.updated_at = Set(now);

        let updated = active.update(&txn).await?;

        // Lines mirror the parent currency.
        if currency_changed {
            let lines = budget_lines::Entity::find()
                .filter(budget_lines::Column::BudgetApplicationId.eq(application_id))
                .all(&txn)
                .await?;

            for line in lines {
                let mut active: budget_lines::ActiveModel = line.into();
                active.currency = Set(updated.currency.clone());
                active.updated_at = Set(now);
                active.update(&txn).await?;
            }
        }

        txn.commit().await?;
        Ok(updated)
    }

    /// Deletes a budget application; children cascade at the schema level.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is not found or the database
    /// operation fails.
    pub async fn delete_application(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
    ) -> Result<(), ApplicationError> {
        let result = budget_applications::Entity::delete_by_id(application_id)
            .filter(budget_applications::Column::OrganizationId.eq(organization_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ApplicationError::NotFound(application_id));
        }

        tracing::info!(application_id = %application_id, "budget application deleted");
        Ok(())
    }

    /// Subscribes a user to an application; already-following is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the application or user is not found, or the
    /// database operation fails.
    pub async fn add_follower(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
        user_id: Uuid,
    ) -> Result<followers::Model, ApplicationError> {
        self.get_application(organization_id, application_id)
            .await?;

        users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(ApplicationError::UserNotFound(user_id))?;

        let existing = followers::Entity::find()
            .filter(followers::Column::BudgetApplicationId.eq(application_id))
            .filter(followers::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        if let Some(follower) = existing {
            return Ok(follower);
        }

        let follower = followers::ActiveModel {
            id: Set(Uuid::new_v4()),
            budget_application_id: Set(application_id),
            user_id: Set(user_id),
            created_at: Set(Utc::now().into()),
        };

        Ok(follower.insert(&self.db).await?)
    }

    /// Lists followers of an application with their user records.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is not found or the database
    /// query fails.
    pub async fn list_followers(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
    ) -> Result<Vec<(followers::Model, users::Model)>, ApplicationError> {
        self.get_application(organization_id, application_id)
            .await?;

        let rows = followers::Entity::find()
            .filter(followers::Column::BudgetApplicationId.eq(application_id))
            .find_also_related(users::Entity)
            .order_by_asc(followers::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(follower, user)| user.map(|user| (follower, user)))
            .collect())
    }

    /// Unsubscribes a user from an application.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is not found, the user is not a
    /// follower, or the database operation fails.
    pub async fn remove_follower(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ApplicationError> {
        self.get_application(organization_id, application_id)
            .await?;

        let result = followers::Entity::delete_many()
            .filter(followers::Column::BudgetApplicationId.eq(application_id))
            .filter(followers::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ApplicationError::FollowerNotFound(user_id));
        }

        Ok(())
    }

    /// Lists the stage-event audit trail of an application, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is not found or the database
    /// query fails.
    pub async fn list_stage_events(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
    ) -> Result<Vec<stage_events::Model>, ApplicationError> {
        self.get_application(organization_id, application_id)
            .await?;

        Ok(stage_events::Entity::find()
            .filter(stage_events::Column::BudgetApplicationId.eq(application_id))
            .order_by_asc(stage_events::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}
