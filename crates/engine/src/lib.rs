pub use allocation::{
    AllocationCache, AllocationEditor, AllocationStatus, allocated_amount, clamp_percentage,
    parse_percentage, reconcile, reconcile_remove, remaining_capacity, total_percentage,
};
pub use capacity::{
    AllocatedShare, CAPACITY_EPSILON, CapacityCheck, CapacityReport, ConvertCurrency,
    ensure_can_save,
};
pub use entity::{EntityMeta, EntityRef, entity_meta};
pub use error::EngineError;
pub use filter::{
    ExpenseFilter, ExpenseSort, SortDir, SortField, matches_search, sort_expenses,
};
pub use import::{
    CsvRow, ImportContext, ImportOptions, InvalidRow, PREVIEW_LIMIT, RECOGNIZED_COLUMNS,
    REQUIRED_COLUMNS, RowIssue, ValidRow, ValidationOutcome, error_report_csv, parse_csv,
    validate_rows,
};
pub use money::{format_amount, parse_amount};
pub use recurring::{
    Cadence, INFINITE_OCCURRENCES, can_transition, ensure_transition, next_billing_date,
    validate_recurring_number,
};
pub use summary::{PageSummary, summarize};
pub use util::{normalize_name, parse_date};

mod allocation;
mod capacity;
mod entity;
mod error;
mod filter;
mod import;
mod money;
mod recurring;
mod summary;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
