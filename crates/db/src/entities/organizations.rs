//! `SeaORM` Entity for organizations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub base_currency: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::budget_applications::Entity")]
    BudgetApplications,
    #[sea_orm(has_many = "super::donor_funds::Entity")]
    DonorFunds,
    #[sea_orm(has_many = "super::expense_categories::Entity")]
    ExpenseCategories,
    #[sea_orm(has_many = "super::sequences::Entity")]
    Sequences,
    #[sea_orm(has_many = "super::users::Entity")]
    Users,
}

impl Related<super::budget_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetApplications.def()
    }
}

impl Related<super::donor_funds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DonorFunds.def()
    }
}

impl Related<super::expense_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseCategories.def()
    }
}

impl Related<super::sequences::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sequences.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
