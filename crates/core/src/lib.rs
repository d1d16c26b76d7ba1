//! Core business logic for Fundline.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, state-machine rules, and calculations live here.
//!
//! # Modules
//!
//! - `approval` - Budget application approval chain state machine
//! - `budget` - Budget line variance calculations
//! - `reference` - Sequence-backed reference formatting

pub mod approval;
pub mod budget;
pub mod reference;
