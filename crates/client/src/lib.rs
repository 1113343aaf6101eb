pub use api::{Api, ApiError};
pub use assignment::{AssignedExpense, AssignmentSession, SaveReport};
pub use error::{ClientError, Result};
pub use import::{ImportBackend, ImportPipeline, ImportStage, ImportSummary};
pub use list::ExpenseList;
pub use recurring::{generate_next_child, recurring_children, set_recurring_status};
pub use search::{Debouncer, SEARCH_DEBOUNCE};

mod api;
mod assignment;
mod error;
mod import;
mod list;
mod recurring;
mod search;
