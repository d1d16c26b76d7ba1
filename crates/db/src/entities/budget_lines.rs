//! `SeaORM` Entity for budget lines table.
//!
//! `variance` is stored, not computed on read: the repository rewrites it
//! from `allocated_amount - actual_spend` at every write.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub budget_application_id: Uuid,
    pub name: String,
    pub expense_category_id: Uuid,
    pub donor_fund_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub allocated_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub actual_spend: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub variance: Decimal,
    pub currency: String,
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
        belongs_to = "super::expense_categories::Entity",
        from = "Column::ExpenseCategoryId",
        to = "super::expense_categories::Column::Id"
    )]
    ExpenseCategories,
    #[sea_orm(
        belongs_to = "super::donor_funds::Entity",
        from = "Column::DonorFundId",
        to = "super::donor_funds::Column::Id"
    )]
    DonorFunds,
}

impl Related<super::budget_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetApplications.def()
    }
}

impl Related<super::expense_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseCategories.def()
    }
}

impl Related<super::donor_funds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DonorFunds.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
