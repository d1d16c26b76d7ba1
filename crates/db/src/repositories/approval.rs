//! Approval repository applying chain actions to stored applications.
//!
//! The decisions live in the pure core service; this repository loads the
//! application under a row lock, applies the returned action to the
//! application and its approval lines, rewrites the stored projections
//! (coarse status, current approver), and appends the stage event, all
//! inside one transaction.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use fundline_core::approval::{ApprovalAction, ApprovalError, ApprovalService, LineSnapshot};

use crate::entities::{
    approval_lines, budget_applications,
    sea_orm_active_enums::{ApplicationStatus, ApprovalLineStatus, ApprovalStage},
    stage_events, users,
};

/// Input for updating a pending approval line.
#[derive(Debug, Clone, Default)]
pub struct UpdateApprovalLineInput {
    /// New approver assignment (`Some(None)` clears it).
    pub approver_id: Option<Option<Uuid>>,
    /// New comments.
    pub comments: Option<Option<String>>,
}

/// Approval repository for chain actions and approval line access.
#[derive(Debug, Clone)]
pub struct ApprovalRepository {
    db: DatabaseConnection,
}

impl ApprovalRepository {
    /// Creates a new approval repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Submits a draft application into the approval chain.
    ///
    /// Moves the stage to the first level and opens the pending level-1
    /// line. Submitting an application already past draft is a no-op that
    /// writes nothing, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is not found or the database
    /// operation fails.
    pub async fn submit(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
    ) -> Result<budget_applications::Model, ApprovalError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?;

        let application = load_for_update(&txn, organization_id, application_id).await?;
        let from_stage = stage_to_core(application.approval_stage);

        let Some(action) = ApprovalService::submit(from_stage) else {
            txn.commit()
                .await
                .map_err(|e| ApprovalError::Database(e.to_string()))?;
            tracing::debug!(
                application_id = %application_id,
                stage = %from_stage,
                "submit ignored: application already past draft"
            );
            return Ok(application);
        };

        let updated = self.apply_action(&txn, application, None, &action, None).await?;

        txn.commit()
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?;

        tracing::info!(
            application_id = %application_id,
            from_stage = %from_stage,
            to_stage = %action.stage(),
            "budget application submitted"
        );

        Ok(updated)
    }

    /// Approves the application at its current stage.
    ///
    /// Resolves the pending line (if one exists) and advances the stage
    /// through the fixed table, opening the next level's line when the
    /// chain continues. With no pending line the stage is forced straight
    /// to approved.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is not found or the database
    /// operation fails.
    pub async fn approve(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
        comments: Option<String>,
    ) -> Result<budget_applications::Model, ApprovalError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?;

        let application = load_for_update(&txn, organization_id, application_id).await?;
        let from_stage = stage_to_core(application.approval_stage);

        let pending = find_pending_line(&txn, application_id).await?;
        let action = ApprovalService::approve(from_stage, pending.is_some());

        let updated = self
            .apply_action(&txn, application, pending, &action, comments)
            .await?;

        txn.commit()
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?;

        tracing::info!(
            application_id = %application_id,
            from_stage = %from_stage,
            to_stage = %action.stage(),
            "budget application approved"
        );

        Ok(updated)
    }

    /// Rejects the application.
    ///
    /// Resolves the pending line (if one exists) and sets the stage to
    /// rejected unconditionally.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is not found or the database
    /// operation fails.
    pub async fn reject(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
        comments: Option<String>,
    ) -> Result<budget_applications::Model, ApprovalError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?;

        let application = load_for_update(&txn, organization_id, application_id).await?;
        let from_stage = stage_to_core(application.approval_stage);

        let pending = find_pending_line(&txn, application_id).await?;
        let action = ApprovalService::reject(pending.is_some());

        let updated = self
            .apply_action(&txn, application, pending, &action, comments)
            .await?;

        txn.commit()
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?;

        tracing::info!(
            application_id = %application_id,
            from_stage = %from_stage,
            to_stage = %action.stage(),
            "budget application rejected"
        );

        Ok(updated)
    }

    /// Lists approval lines of an application in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the application is not found or the database
    /// query fails.
    pub async fn list_approval_lines(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
    ) -> Result<Vec<approval_lines::Model>, ApprovalError> {
        self.get_application(organization_id, application_id)
            .await?;

        approval_lines::Entity::find()
            .filter(approval_lines::Column::BudgetApplicationId.eq(application_id))
            .order_by_asc(approval_lines::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))
    }

    /// Updates a pending approval line (approver assignment, comments).
    ///
    /// No chain action assigns approvers; this is the manual path. A
    /// changed approver rewrites `current_approver_id` on the parent in
    /// the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The application or line is not found
    /// - The line is already resolved
    /// - The assigned approver does not exist
    /// - The database operation fails
    pub async fn update_approval_line(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
        line_id: Uuid,
        input: UpdateApprovalLineInput,
    ) -> Result<approval_lines::Model, ApprovalError> {
        if let Some(Some(approver_id)) = input.approver_id {
            users::Entity::find_by_id(approver_id)
                .one(&self.db)
                .await
                .map_err(|e| ApprovalError::Database(e.to_string()))?
                .ok_or(ApprovalError::ApproverNotFound(approver_id))?;
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?;

        let application = load_for_update(&txn, organization_id, application_id).await?;

        let line = approval_lines::Entity::find_by_id(line_id)
            .filter(approval_lines::Column::BudgetApplicationId.eq(application_id))
            .one(&txn)
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?
            .ok_or(ApprovalError::LineNotFound(line_id))?;

        if line.status != ApprovalLineStatus::Pending {
            return Err(ApprovalError::LineAlreadyResolved {
                line_id,
                status: line_status_to_core(line.status),
            });
        }

        let approver_changed = input.approver_id.is_some();
        let now = Utc::now().into();

        let mut active: approval_lines::ActiveModel = line.into();
        if let Some(approver_id) = input.approver_id {
            active.approver_id = Set(approver_id);
        }
        if let Some(comments) = input.comments {
            active.comments = Set(comments);
        }
        active.updated_at = Set(now);

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?;

        if approver_changed {
            let snapshots = load_snapshots(&txn, application_id).await?;
            let mut app_active: budget_applications::ActiveModel = application.into();
            app_active.current_approver_id = Set(ApprovalService::current_approver(&snapshots));
            app_active.updated_at = Set(now);
            app_active
                .update(&txn)
                .await
                .map_err(|e| ApprovalError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Applies a chain action to the application and its lines.
    ///
    /// Order matters: resolve the pending line, open the next one, then
    /// rewrite the projections from the fresh line set, then append the
    /// stage event.
    async fn apply_action(
        &self,
        txn: &DatabaseTransaction,
        application: budget_applications::Model,
        pending_line: Option<approval_lines::Model>,
        action: &ApprovalAction,
        comments: Option<String>,
    ) -> Result<budget_applications::Model, ApprovalError> {
        let now = Utc::now().into();
        let application_id = application.id;
        let from_stage = application.approval_stage;

        if let (Some(resolution), Some(line)) = (action.resolution(), pending_line) {
            let mut active: approval_lines::ActiveModel = line.into();
            active.status = Set(line_status_to_db(resolution.status));
            active.approval_date = Set(Some(resolution.approval_date));
            if comments.is_some() {
                active.comments = Set(comments.clone());
            }
            active.updated_at = Set(now);
            active
                .update(txn)
                .await
                .map_err(|e| ApprovalError::Database(e.to_string()))?;
        }

        if let Some(level) = action.opens_level() {
            open_line(txn, application_id, &level.label(), now).await?;
        }

        let snapshots = load_snapshots(txn, application_id).await?;
        let to_stage = action.stage();

        let mut active: budget_applications::ActiveModel = application.into();
        active.approval_stage = Set(stage_to_db(to_stage));
        active.status = Set(status_to_db(to_stage.status()));
        active.current_approver_id = Set(ApprovalService::current_approver(&snapshots));
        active.updated_at = Set(now);

        let updated = active
            .update(txn)
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?;

        let event = stage_events::ActiveModel {
            id: Set(Uuid::new_v4()),
            budget_application_id: Set(application_id),
            from_stage: Set(from_stage),
            to_stage: Set(stage_to_db(to_stage)),
            note: Set(comments),
            created_at: Set(now),
        };
        event
            .insert(txn)
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Fetches the application without locking, scoped to the organization.
    async fn get_application(
        &self,
        organization_id: Uuid,
        application_id: Uuid,
    ) -> Result<budget_applications::Model, ApprovalError> {
        budget_applications::Entity::find_by_id(application_id)
            .filter(budget_applications::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?
            .ok_or(ApprovalError::ApplicationNotFound(application_id))
    }
}

/// Loads the application row under `SELECT ... FOR UPDATE`.
///
/// Concurrent actions on the same record serialize here; the second
/// writer observes the first writer's committed stage.
async fn load_for_update(
    txn: &DatabaseTransaction,
    organization_id: Uuid,
    application_id: Uuid,
) -> Result<budget_applications::Model, ApprovalError> {
    budget_applications::Entity::find_by_id(application_id)
        .filter(budget_applications::Column::OrganizationId.eq(organization_id))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(|e| ApprovalError::Database(e.to_string()))?
        .ok_or(ApprovalError::ApplicationNotFound(application_id))
}

/// Finds the single pending line of an application, if one exists.
async fn find_pending_line(
    txn: &DatabaseTransaction,
    application_id: Uuid,
) -> Result<Option<approval_lines::Model>, ApprovalError> {
    approval_lines::Entity::find()
        .filter(approval_lines::Column::BudgetApplicationId.eq(application_id))
        .filter(approval_lines::Column::Status.eq(ApprovalLineStatus::Pending))
        .order_by_asc(approval_lines::Column::CreatedAt)
        .one(txn)
        .await
        .map_err(|e| ApprovalError::Database(e.to_string()))
}

/// Creates a pending line at `level` unless one already exists.
///
/// The (application, level) unique key backstops the guard: a concurrent
/// writer that got there first turns the insert into a no-op instead of
/// an error.
async fn open_line(
    txn: &DatabaseTransaction,
    application_id: Uuid,
    level: &str,
    now: chrono::DateTime<chrono::FixedOffset>,
) -> Result<(), ApprovalError> {
    let existing = approval_lines::Entity::find()
        .filter(approval_lines::Column::BudgetApplicationId.eq(application_id))
        .filter(approval_lines::Column::Level.eq(level))
        .one(txn)
        .await
        .map_err(|e| ApprovalError::Database(e.to_string()))?;

    if existing.is_some() {
        return Ok(());
    }

    let line = approval_lines::ActiveModel {
        id: Set(Uuid::new_v4()),
        budget_application_id: Set(application_id),
        level: Set(level.to_string()),
        status: Set(ApprovalLineStatus::Pending),
        approver_id: Set(None),
        approval_date: Set(None),
        comments: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    approval_lines::Entity::insert(line)
        .on_conflict(
            OnConflict::columns([
                approval_lines::Column::BudgetApplicationId,
                approval_lines::Column::Level,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(txn)
        .await
        .map_err(|e| ApprovalError::Database(e.to_string()))?;

    Ok(())
}

/// Loads all lines of an application projected into pure snapshots.
async fn load_snapshots(
    txn: &DatabaseTransaction,
    application_id: Uuid,
) -> Result<Vec<LineSnapshot>, ApprovalError> {
    let lines = approval_lines::Entity::find()
        .filter(approval_lines::Column::BudgetApplicationId.eq(application_id))
        .order_by_asc(approval_lines::Column::CreatedAt)
        .all(txn)
        .await
        .map_err(|e| ApprovalError::Database(e.to_string()))?;

    Ok(snapshots(&lines))
}

/// Projects stored lines into the pure snapshot view.
pub(crate) fn snapshots(lines: &[approval_lines::Model]) -> Vec<LineSnapshot> {
    lines
        .iter()
        .map(|line| LineSnapshot {
            status: line_status_to_core(line.status),
            approver_id: line.approver_id,
        })
        .collect()
}

// ============================================================================
// Conversion helpers
// ============================================================================

/// Converts the stored stage to the core stage.
pub(crate) fn stage_to_core(stage: ApprovalStage) -> fundline_core::approval::ApprovalStage {
    match stage {
        ApprovalStage::Draft => fundline_core::approval::ApprovalStage::Draft,
        ApprovalStage::Level1 => fundline_core::approval::ApprovalStage::Level1,
        ApprovalStage::Level2 => fundline_core::approval::ApprovalStage::Level2,
        ApprovalStage::Level3 => fundline_core::approval::ApprovalStage::Level3,
        ApprovalStage::Approved => fundline_core::approval::ApprovalStage::Approved,
        ApprovalStage::Rejected => fundline_core::approval::ApprovalStage::Rejected,
    }
}

/// Converts the core stage to the stored stage.
pub(crate) fn stage_to_db(stage: fundline_core::approval::ApprovalStage) -> ApprovalStage {
    match stage {
        fundline_core::approval::ApprovalStage::Draft => ApprovalStage::Draft,
        fundline_core::approval::ApprovalStage::Level1 => ApprovalStage::Level1,
        fundline_core::approval::ApprovalStage::Level2 => ApprovalStage::Level2,
        fundline_core::approval::ApprovalStage::Level3 => ApprovalStage::Level3,
        fundline_core::approval::ApprovalStage::Approved => ApprovalStage::Approved,
        fundline_core::approval::ApprovalStage::Rejected => ApprovalStage::Rejected,
    }
}

/// Converts the core status projection to the stored status.
pub(crate) fn status_to_db(status: fundline_core::approval::ApplicationStatus) -> ApplicationStatus {
    match status {
        fundline_core::approval::ApplicationStatus::Draft => ApplicationStatus::Draft,
        fundline_core::approval::ApplicationStatus::Approved => ApplicationStatus::Approved,
        fundline_core::approval::ApplicationStatus::Rejected => ApplicationStatus::Rejected,
    }
}

/// Converts the stored line status to the core line status.
pub(crate) fn line_status_to_core(status: ApprovalLineStatus) -> fundline_core::approval::LineStatus {
    match status {
        ApprovalLineStatus::Pending => fundline_core::approval::LineStatus::Pending,
        ApprovalLineStatus::Approved => fundline_core::approval::LineStatus::Approved,
        ApprovalLineStatus::Rejected => fundline_core::approval::LineStatus::Rejected,
    }
}

/// Converts the core line status to the stored line status.
fn line_status_to_db(status: fundline_core::approval::LineStatus) -> ApprovalLineStatus {
    match status {
        fundline_core::approval::LineStatus::Pending => ApprovalLineStatus::Pending,
        fundline_core::approval::LineStatus::Approved => ApprovalLineStatus::Approved,
        fundline_core::approval::LineStatus::Rejected => ApprovalLineStatus::Rejected,
    }
}

#[cfg(test)]
#[path = "approval_tests.rs"]
mod tests;
