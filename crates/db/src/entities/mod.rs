//! `SeaORM` entity definitions.
//!
//! Entities mirror the tables created by the initial migration; enum
//! columns map to the active enums in [`sea_orm_active_enums`].

pub mod approval_lines;
pub mod budget_applications;
pub mod budget_lines;
pub mod currencies;
pub mod donor_funds;
pub mod expense_categories;
pub mod followers;
pub mod organizations;
pub mod sea_orm_active_enums;
pub mod sequences;
pub mod stage_events;
pub mod users;
