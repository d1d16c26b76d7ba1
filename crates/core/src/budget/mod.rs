//! Budget line variance tracking.
//!
//! Budget lines store their variance; these helpers are the single
//! formula the storage layer calls at every write, plus the aggregate
//! view the API reports.

pub mod variance;

pub use variance::{LineTotals, VarianceStatus, variance_of};
