//! `SeaORM` Entity for stage events table.
//!
//! Append-only audit trail: one row per applied stage transition.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ApprovalStage;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stage_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub budget_application_id: Uuid,
    pub from_stage: ApprovalStage,
    pub to_stage: ApprovalStage,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub created_at: DateTimeWithTimeZone,
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
}

impl Related<super::budget_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetApplications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
