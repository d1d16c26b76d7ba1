//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod application;
pub mod approval;
pub mod budget_line;
pub mod directory;
pub mod organization;
pub mod sequence;
pub mod user;

pub use application::{
    ApplicationDetails, ApplicationError, ApplicationRepository, CreateApplicationInput,
    UpdateApplicationInput,
};
pub use approval::{ApprovalRepository, UpdateApprovalLineInput};
pub use budget_line::{
    BudgetLineError, BudgetLineRepository, CreateBudgetLineInput, UpdateBudgetLineInput,
};
pub use directory::DirectoryRepository;
pub use organization::OrganizationRepository;
pub use sequence::{BUDGET_APPLICATION_SEQUENCE, SequenceError, SequenceRepository};
pub use user::UserRepository;
