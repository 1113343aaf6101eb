use serde::{Deserialize, Serialize};

/// Generic paginated listing envelope returned by the backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of matching records across all pages.
    pub total: u64,
}

/// Currency as embedded in backend payloads.
///
/// The backend owns the currency table; clients only ever echo ids back and
/// use `code`/`symbol` for requests and display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRef {
    pub id: i64,
    pub code: String,
    pub symbol: String,
}

pub mod allocation {
    use super::*;

    /// Kind of record an expense can be allocated against.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntityType {
        Invoice,
        Project,
        Payment,
        Contact,
    }

    impl EntityType {
        /// Canonical string used on the wire and in endpoint paths.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Invoice => "invoice",
                Self::Project => "project",
                Self::Payment => "payment",
                Self::Contact => "contact",
            }
        }
    }

    impl TryFrom<&str> for EntityType {
        type Error = String;

        fn try_from(value: &str) -> Result<Self, Self::Error> {
            match value.trim().to_ascii_lowercase().as_str() {
                "invoice" => Ok(Self::Invoice),
                "project" => Ok(Self::Project),
                "payment" => Ok(Self::Payment),
                "contact" => Ok(Self::Contact),
                other => Err(format!("unknown entity type: {other}")),
            }
        }
    }

    /// One allocation entry of an expense.
    ///
    /// The backend keeps at most one entry per `(entity_type, entity_id)`
    /// pair within an expense's set. Allocation updates are full-replace:
    /// clients always submit the complete list for an expense.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Allocation {
        pub entity_type: EntityType,
        pub entity_id: i64,
        pub percentage: f64,
    }

    /// Response body of the per-expense allocations endpoint.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AllocationsResponse {
        pub allocations: Vec<Allocation>,
    }

    /// Full-replace payload for an expense's allocations.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AllocationsUpdate {
        pub allocations: Vec<Allocation>,
    }
}

pub mod expense {
    use chrono::NaiveDate;

    use super::*;
    use crate::allocation::Allocation;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ExpenseStatus {
        #[default]
        Pending,
        Paid,
        Completed,
        Cancelled,
    }

    impl ExpenseStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Pending => "pending",
                Self::Paid => "paid",
                Self::Completed => "completed",
                Self::Cancelled => "cancelled",
            }
        }
    }

    impl TryFrom<&str> for ExpenseStatus {
        type Error = String;

        fn try_from(value: &str) -> Result<Self, Self::Error> {
            match value.trim().to_ascii_lowercase().as_str() {
                "pending" => Ok(Self::Pending),
                "paid" => Ok(Self::Paid),
                "completed" => Ok(Self::Completed),
                "cancelled" => Ok(Self::Cancelled),
                other => Err(format!("unknown expense status: {other}")),
            }
        }
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PricingType {
        #[default]
        OneTime,
        Recurring,
    }

    /// Billing cadence of a recurring template.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RecurringType {
        Weekly,
        Monthly,
        Yearly,
        Custom,
    }

    /// Unit for `custom_every` on custom-cadence templates.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CustomPeriod {
        Days,
        Weeks,
        Months,
        Years,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RecurringStatus {
        Active,
        Paused,
        Cancelled,
    }

    impl RecurringStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Active => "active",
                Self::Paused => "paused",
                Self::Cancelled => "cancelled",
            }
        }
    }

    /// An expense as returned by the backend.
    ///
    /// The record is server-owned; clients hold a working copy while
    /// editing and submit changes through the update endpoints.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Expense {
        pub id: i64,
        /// Human-facing sequential number, e.g. `EXP-0042`.
        pub expense_number: Option<String>,
        /// Amount in major units of `currency`.
        pub amount: f64,
        pub currency: CurrencyRef,
        pub expense_date: NaiveDate,
        pub status: ExpenseStatus,
        pub description: Option<String>,
        pub vendor_id: Option<i64>,
        pub contact_id: Option<i64>,
        pub project_id: Option<i64>,
        pub category_id: Option<i64>,
        pub payment_method: Option<String>,
        pub reference_number: Option<String>,
        pub notes: Option<String>,
        pub tax_rate: Option<f64>,
        pub tax_amount: Option<f64>,
        pub tax_included: Option<bool>,
        pub pricing_type: PricingType,
        pub recurring_type: Option<RecurringType>,
        pub custom_every: Option<u32>,
        pub custom_period: Option<CustomPeriod>,
        /// Remaining occurrences for a template; `-1` means infinite. The
        /// backend decrements this when it generates a child expense.
        pub recurring_number: Option<i32>,
        pub recurring_status: Option<RecurringStatus>,
        /// Position of a generated child within its template's series.
        pub recurrence_sequence_number: Option<u32>,
        #[serde(default)]
        pub allocations: Vec<Allocation>,
    }

    /// Create payload; server assigns id, number and currency record.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub amount: f64,
        /// ISO currency code; server resolves it to a currency record.
        pub currency_code: String,
        pub expense_date: NaiveDate,
        pub status: Option<ExpenseStatus>,
        pub description: Option<String>,
        pub vendor_id: Option<i64>,
        pub contact_id: Option<i64>,
        pub project_id: Option<i64>,
        pub category_id: Option<i64>,
        pub payment_method: Option<String>,
        pub reference_number: Option<String>,
        pub notes: Option<String>,
        pub tax_rate: Option<f64>,
        pub tax_included: Option<bool>,
        pub pricing_type: Option<PricingType>,
        pub recurring_type: Option<RecurringType>,
        pub custom_every: Option<u32>,
        pub custom_period: Option<CustomPeriod>,
        pub recurring_number: Option<i32>,
    }

    /// Partial update payload; absent fields are left unchanged.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub amount: Option<f64>,
        pub currency_code: Option<String>,
        pub expense_date: Option<NaiveDate>,
        pub status: Option<ExpenseStatus>,
        pub description: Option<String>,
        pub vendor_id: Option<i64>,
        pub contact_id: Option<i64>,
        pub project_id: Option<i64>,
        pub category_id: Option<i64>,
        pub payment_method: Option<String>,
        pub reference_number: Option<String>,
        pub notes: Option<String>,
        pub tax_rate: Option<f64>,
        pub tax_included: Option<bool>,
        pub recurring_number: Option<i32>,
        pub recurring_status: Option<RecurringStatus>,
    }

    /// Query parameters understood by the listing endpoint.
    ///
    /// Sorting by joined vendor name is not supported server-side; clients
    /// order the fetched page locally for that case.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseListParams {
        pub page: Option<u32>,
        pub per_page: Option<u32>,
        pub search: Option<String>,
        pub status: Option<ExpenseStatus>,
        pub category_id: Option<i64>,
        pub vendor_id: Option<i64>,
        pub project_id: Option<i64>,
        pub contact_id: Option<i64>,
        pub date_from: Option<NaiveDate>,
        pub date_to: Option<NaiveDate>,
        /// One of `date`, `amount`, `number`, `status`.
        pub sort_by: Option<String>,
        /// `asc` or `desc`.
        pub sort_dir: Option<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct NextNumber {
        pub next_number: String,
    }

    /// Unpaginated expense collection, e.g. the expenses allocated to one
    /// entity or the children generated from a recurring template.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpenseItems {
        pub items: Vec<Expense>,
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpenseCategory {
        pub id: i64,
        pub name: String,
        pub description: Option<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub description: Option<String>,
    }
}

pub mod directory {
    use super::*;

    /// Vendor directory entry, consumed for dropdowns and import matching.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Vendor {
        pub id: i64,
        pub name: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct VendorNew {
        pub name: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Project {
        pub id: i64,
        pub name: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Contact {
        pub id: i64,
        pub name: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Payment {
        pub id: i64,
        pub reference: String,
    }
}

pub mod invoice {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Invoice {
        pub id: i64,
        pub invoice_number: String,
        /// Invoice total in major units of `currency`.
        pub total: f64,
        pub currency: CurrencyRef,
    }

    /// Capacity summary for expense allocation against one invoice.
    ///
    /// `allocated_expenses_total` is the amount already allocated by flows
    /// not visible in the caller's current working set, in the invoice's
    /// currency.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AllocationCapacity {
        pub allocated_expenses_total: f64,
    }
}

pub mod currency {
    use super::*;

    /// Result of the conversion service.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ConvertedAmount {
        pub amount: f64,
    }
}

