//! Listing filters and ordering for the expense table.
//!
//! Pagination and most filtering happen server-side through the listing
//! params. Vendor name is the exception: the backend cannot search or
//! order by the joined vendor, so those operate on the fetched page with
//! a caller-supplied id-to-name map.

use std::collections::HashMap;

use api_types::expense::{Expense, ExpenseListParams, ExpenseStatus};
use chrono::NaiveDate;

use crate::{EngineError, ResultEngine};

/// Filter state of the expense list.
///
/// The date range is half-open: `date_from` inclusive, `date_to`
/// exclusive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpenseFilter {
    pub status: Option<ExpenseStatus>,
    pub category_id: Option<i64>,
    pub vendor_id: Option<i64>,
    pub project_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
}

impl ExpenseFilter {
    /// # Errors
    ///
    /// [`EngineError::InvalidFilter`] when the date range is inverted.
    pub fn validate(&self) -> ResultEngine<()> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to)
            && from > to
        {
            return Err(EngineError::InvalidFilter(format!(
                "date range starts at {from} but ends at {to}"
            )));
        }
        Ok(())
    }

    /// Whether one fetched expense passes the filter, including the
    /// vendor-name search the backend cannot do.
    #[must_use]
    pub fn matches(&self, expense: &Expense, vendor_name: Option<&str>) -> bool {
        if let Some(status) = self.status
            && expense.status != status
        {
            return false;
        }
        if self.category_id.is_some() && expense.category_id != self.category_id {
            return false;
        }
        if self.vendor_id.is_some() && expense.vendor_id != self.vendor_id {
            return false;
        }
        if self.project_id.is_some() && expense.project_id != self.project_id {
            return false;
        }
        if self.contact_id.is_some() && expense.contact_id != self.contact_id {
            return false;
        }
        if let Some(from) = self.date_from
            && expense.expense_date < from
        {
            return false;
        }
        if let Some(to) = self.date_to
            && expense.expense_date >= to
        {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => matches_search(expense, vendor_name, query),
        }
    }

    /// Builds the server-side listing params for one page.
    ///
    /// A vendor-name sort is left off the wire; the caller orders the
    /// fetched page locally instead.
    #[must_use]
    pub fn to_params(&self, page: u32, per_page: u32, sort: ExpenseSort) -> ExpenseListParams {
        ExpenseListParams {
            page: Some(page),
            per_page: Some(per_page),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            status: self.status,
            category_id: self.category_id,
            vendor_id: self.vendor_id,
            project_id: self.project_id,
            contact_id: self.contact_id,
            date_from: self.date_from,
            date_to: self.date_to,
            sort_by: sort
                .field
                .server_side()
                .then(|| sort.field.as_str().to_string()),
            sort_dir: sort
                .field
                .server_side()
                .then(|| sort.dir.as_str().to_string()),
        }
    }
}

/// Case-insensitive substring search over number, description, reference
/// and the resolved vendor name.
#[must_use]
pub fn matches_search(expense: &Expense, vendor_name: Option<&str>, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    let hit = |field: Option<&str>| {
        field.is_some_and(|value| value.to_lowercase().contains(&query))
    };
    hit(expense.expense_number.as_deref())
        || hit(expense.description.as_deref())
        || hit(expense.reference_number.as_deref())
        || hit(vendor_name)
}

/// Column the list is ordered by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Date,
    Amount,
    Number,
    Status,
    /// Joined column, ordered locally on the fetched page.
    VendorName,
}

impl SortField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Amount => "amount",
            Self::Number => "number",
            Self::Status => "status",
            Self::VendorName => "vendor_name",
        }
    }

    /// Whether the backend can order by this field.
    #[must_use]
    pub const fn server_side(self) -> bool {
        !matches!(self, Self::VendorName)
    }
}

impl TryFrom<&str> for SortField {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "amount" => Ok(Self::Amount),
            "number" => Ok(Self::Number),
            "status" => Ok(Self::Status),
            "vendor_name" | "vendor" => Ok(Self::VendorName),
            other => Err(format!("unknown sort field: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl TryFrom<&str> for SortDir {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

/// Active ordering; defaults to newest first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExpenseSort {
    pub field: SortField,
    pub dir: SortDir,
}

impl ExpenseSort {
    #[must_use]
    pub const fn new(field: SortField, dir: SortDir) -> Self {
        Self { field, dir }
    }

    /// Clicking the active column flips direction; a new column starts
    /// ascending.
    #[must_use]
    pub fn toggled(self, field: SortField) -> Self {
        if self.field == field {
            Self::new(field, self.dir.flipped())
        } else {
            Self::new(field, SortDir::Asc)
        }
    }
}

/// Orders one fetched page in place. Stable, so equal keys keep their
/// server-given order.
pub fn sort_expenses(
    items: &mut [Expense],
    vendor_names: &HashMap<i64, String>,
    sort: ExpenseSort,
) {
    let vendor_key = |expense: &Expense| -> String {
        expense
            .vendor_id
            .and_then(|id| vendor_names.get(&id))
            .map(|name| name.to_lowercase())
            .unwrap_or_default()
    };

    items.sort_by(|a, b| {
        let ordering = match sort.field {
            SortField::Date => a.expense_date.cmp(&b.expense_date),
            SortField::Amount => a.amount.total_cmp(&b.amount),
            SortField::Number => a.expense_number.cmp(&b.expense_number),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
            SortField::VendorName => vendor_key(a).cmp(&vendor_key(b)),
        };
        match sort.dir {
            SortDir::Asc => ordering,
            SortDir::Desc => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use api_types::CurrencyRef;
    use api_types::expense::PricingType;

    use super::*;

    fn expense(id: i64, amount: f64, date: NaiveDate, status: ExpenseStatus) -> Expense {
        Expense {
            id,
            expense_number: Some(format!("EXP-{id:04}")),
            amount,
            currency: CurrencyRef {
                id: 1,
                code: "EUR".to_string(),
                symbol: "€".to_string(),
            },
            expense_date: date,
            status,
            description: None,
            vendor_id: None,
            contact_id: None,
            project_id: None,
            category_id: None,
            payment_method: None,
            reference_number: None,
            notes: None,
            tax_rate: None,
            tax_amount: None,
            tax_included: None,
            pricing_type: PricingType::OneTime,
            recurring_type: None,
            custom_every: None,
            custom_period: None,
            recurring_number: None,
            recurring_status: None,
            recurrence_sequence_number: None,
            allocations: Vec::new(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn validate_rejects_inverted_date_range() {
        let filter = ExpenseFilter {
            date_from: Some(date(2024, 5, 1)),
            date_to: Some(date(2024, 4, 1)),
            ..ExpenseFilter::default()
        };
        assert!(matches!(
            filter.validate(),
            Err(EngineError::InvalidFilter(_))
        ));
        assert!(ExpenseFilter::default().validate().is_ok());
    }

    #[test]
    fn date_range_is_half_open() {
        let filter = ExpenseFilter {
            date_from: Some(date(2024, 4, 1)),
            date_to: Some(date(2024, 5, 1)),
            ..ExpenseFilter::default()
        };
        let inside = expense(1, 10.0, date(2024, 4, 1), ExpenseStatus::Pending);
        let at_end = expense(2, 10.0, date(2024, 5, 1), ExpenseStatus::Pending);
        let before = expense(3, 10.0, date(2024, 3, 31), ExpenseStatus::Pending);
        assert!(filter.matches(&inside, None));
        assert!(!filter.matches(&at_end, None));
        assert!(!filter.matches(&before, None));
    }

    #[test]
    fn search_covers_vendor_name() {
        let mut subject = expense(1, 10.0, date(2024, 4, 1), ExpenseStatus::Pending);
        subject.description = Some("Quarterly hosting".to_string());
        subject.reference_number = Some("INV-778".to_string());

        assert!(matches_search(&subject, Some("Acme GmbH"), "acme"));
        assert!(matches_search(&subject, None, "HOSTING"));
        assert!(matches_search(&subject, None, "exp-0001"));
        assert!(matches_search(&subject, None, "inv-778"));
        assert!(!matches_search(&subject, Some("Acme GmbH"), "globex"));
        assert!(matches_search(&subject, None, "  "));
    }

    #[test]
    fn params_keep_vendor_sort_off_the_wire() {
        let filter = ExpenseFilter {
            status: Some(ExpenseStatus::Paid),
            search: Some("  taxi  ".to_string()),
            ..ExpenseFilter::default()
        };

        let server = filter.to_params(2, 25, ExpenseSort::new(SortField::Amount, SortDir::Asc));
        assert_eq!(server.page, Some(2));
        assert_eq!(server.per_page, Some(25));
        assert_eq!(server.search.as_deref(), Some("taxi"));
        assert_eq!(server.sort_by.as_deref(), Some("amount"));
        assert_eq!(server.sort_dir.as_deref(), Some("asc"));

        let local = filter.to_params(1, 25, ExpenseSort::new(SortField::VendorName, SortDir::Asc));
        assert_eq!(local.sort_by, None);
        assert_eq!(local.sort_dir, None);
    }

    #[test]
    fn sort_and_status_strings_round_trip() {
        for field in [
            SortField::Date,
            SortField::Amount,
            SortField::Number,
            SortField::Status,
            SortField::VendorName,
        ] {
            assert_eq!(SortField::try_from(field.as_str()), Ok(field));
        }
        // Accepted alias for the client-side field.
        assert_eq!(SortField::try_from("vendor"), Ok(SortField::VendorName));

        for dir in [SortDir::Asc, SortDir::Desc] {
            assert_eq!(SortDir::try_from(dir.as_str()), Ok(dir));
        }

        for status in [
            ExpenseStatus::Pending,
            ExpenseStatus::Paid,
            ExpenseStatus::Completed,
            ExpenseStatus::Cancelled,
        ] {
            assert_eq!(ExpenseStatus::try_from(status.as_str()), Ok(status));
        }
        assert!(ExpenseStatus::try_from("archived").is_err());
    }

    #[test]
    fn toggling_flips_or_resets_direction() {
        let sort = ExpenseSort::default();
        assert_eq!(sort.field, SortField::Date);
        assert_eq!(sort.dir, SortDir::Desc);

        let again = sort.toggled(SortField::Date);
        assert_eq!(again.dir, SortDir::Asc);

        let other = sort.toggled(SortField::Amount);
        assert_eq!(other.field, SortField::Amount);
        assert_eq!(other.dir, SortDir::Asc);
    }

    #[test]
    fn sorting_by_amount_is_stable() {
        let mut items = vec![
            expense(1, 20.0, date(2024, 1, 1), ExpenseStatus::Pending),
            expense(2, 10.0, date(2024, 1, 2), ExpenseStatus::Pending),
            expense(3, 20.0, date(2024, 1, 3), ExpenseStatus::Pending),
        ];
        sort_expenses(
            &mut items,
            &HashMap::new(),
            ExpenseSort::new(SortField::Amount, SortDir::Asc),
        );
        let ids: Vec<i64> = items.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn vendor_sort_is_case_insensitive_with_unset_first() {
        let mut vendors = HashMap::new();
        vendors.insert(10, "zeta Supplies".to_string());
        vendors.insert(11, "Acme".to_string());

        let mut items = vec![
            expense(1, 10.0, date(2024, 1, 1), ExpenseStatus::Pending),
            expense(2, 10.0, date(2024, 1, 2), ExpenseStatus::Pending),
            expense(3, 10.0, date(2024, 1, 3), ExpenseStatus::Pending),
        ];
        items[0].vendor_id = Some(10);
        items[2].vendor_id = Some(11);

        sort_expenses(
            &mut items,
            &vendors,
            ExpenseSort::new(SortField::VendorName, SortDir::Asc),
        );
        let ids: Vec<i64> = items.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
