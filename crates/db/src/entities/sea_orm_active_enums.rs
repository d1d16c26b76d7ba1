//! `SeaORM` active enums mirroring the Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Coarse status of a budget application (`application_status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "application_status")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Approval chain progress pointer (`approval_stage`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "approval_stage")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStage {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "level_1")]
    #[serde(rename = "level_1")]
    Level1,
    #[sea_orm(string_value = "level_2")]
    #[serde(rename = "level_2")]
    Level2,
    #[sea_orm(string_value = "level_3")]
    #[serde(rename = "level_3")]
    Level3,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Resolution status of an approval line (`approval_line_status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "approval_line_status"
)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalLineStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}
