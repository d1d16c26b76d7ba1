//! `SeaORM` Entity for approval lines table.
//!
//! One row per approval level reached; at most one row per
//! (`budget_application_id`, `level`), enforced by a unique constraint.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ApprovalLineStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub budget_application_id: Uuid,
    pub level: String,
    pub status: ApprovalLineStatus,
    pub approver_id: Option<Uuid>,
    pub approval_date: Option<Date>,
    #[sea_orm(column_type = "Text", nullable)]
    pub comments: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budget_applications::Entity",
        from = "Column::BudgetApplicationId",
        to = "super::budget_applications::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    BudgetApplications,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ApproverId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::budget_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetApplications.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
