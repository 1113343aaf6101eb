//! Server-backed expense list with the pieces the backend cannot do:
//! vendor-name ordering and vendor-aware search narrowing on the
//! fetched page.

use std::collections::HashMap;

use api_types::expense::Expense;
use engine::{ExpenseFilter, ExpenseSort, PageSummary, SortField, sort_expenses, summarize};

use crate::api::Api;
use crate::error::Result;

pub struct ExpenseList {
    pub filter: ExpenseFilter,
    sort: ExpenseSort,
    page: u32,
    per_page: u32,
    items: Vec<Expense>,
    total: u64,
    vendor_names: HashMap<i64, String>,
}

impl ExpenseList {
    pub fn new(per_page: u32) -> Self {
        Self {
            filter: ExpenseFilter::default(),
            sort: ExpenseSort::default(),
            page: 1,
            per_page: per_page.max(1),
            items: Vec::new(),
            total: 0,
            vendor_names: HashMap::new(),
        }
    }

    pub fn items(&self) -> &[Expense] {
        &self.items
    }

    pub fn sort(&self) -> ExpenseSort {
        self.sort
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of pages at the current total, 0 when the list is empty.
    pub fn pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.per_page))
    }

    /// Loads the vendor directory used for name sorting and search.
    pub async fn load_vendors(&mut self, api: &Api) -> Result<()> {
        let vendors = api.vendors_list().await?;
        self.vendor_names = vendors.into_iter().map(|v| (v.id, v.name)).collect();
        Ok(())
    }

    /// Fetches the current page. Vendor-name ordering is applied locally
    /// after the fetch; every other filter and sort rides the params.
    pub async fn refresh(&mut self, api: &Api) -> Result<()> {
        self.filter.validate()?;
        let params = self.filter.to_params(self.page, self.per_page, self.sort);
        let page = api.expenses_list(&params).await?;
        self.items = page.items;
        self.total = page.total;
        if !self.sort.field.server_side() {
            sort_expenses(&mut self.items, &self.vendor_names, self.sort);
        }
        Ok(())
    }

    pub fn vendor_name(&self, expense: &Expense) -> Option<&str> {
        expense
            .vendor_id
            .and_then(|id| self.vendor_names.get(&id))
            .map(String::as_str)
    }

    /// The fetched page narrowed by the filter once more. The server has
    /// already applied everything it supports; this pass only drops rows
    /// a vendor-name search excludes.
    pub fn visible(&self) -> Vec<&Expense> {
        self.items
            .iter()
            .filter(|expense| self.filter.matches(expense, self.vendor_name(expense)))
            .collect()
    }

    /// Reorders by `field`, flipping direction when it is already active.
    /// The view jumps back to the first page.
    pub fn set_sort(&mut self, field: SortField) {
        self.sort = self.sort.toggled(field);
        self.page = 1;
    }

    /// Sets an explicit ordering without the toggle behavior.
    pub fn order_by(&mut self, sort: ExpenseSort) {
        self.sort = sort;
    }

    /// Jumps to `page`. No upper clamp: the page range is only known
    /// after a fetch, and the server answers an out-of-range page with an
    /// empty item list.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Advances one page, stopping at the last known page.
    pub fn next_page(&mut self) {
        let last = u32::try_from(self.pages()).unwrap_or(u32::MAX);
        if self.page < last {
            self.page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// Totals of the fetched page.
    pub fn summary(&self) -> PageSummary {
        summarize(&self.items)
    }
}

#[cfg(test)]
mod tests {
    use api_types::CurrencyRef;
    use api_types::expense::{ExpenseStatus, PricingType};
    use chrono::NaiveDate;
    use engine::SortDir;

    use super::*;

    fn expense(id: i64, vendor_id: Option<i64>) -> Expense {
        Expense {
            id,
            expense_number: Some(format!("EXP-{id:04}")),
            amount: 10.0,
            currency: CurrencyRef {
                id: 1,
                code: "EUR".to_string(),
                symbol: "€".to_string(),
            },
            expense_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            status: ExpenseStatus::Pending,
            description: None,
            vendor_id,
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

    fn list_with(items: Vec<Expense>, total: u64) -> ExpenseList {
        let mut list = ExpenseList::new(25);
        list.items = items;
        list.total = total;
        list
    }

    #[test]
    fn visible_narrows_by_vendor_search() {
        let mut list = list_with(vec![expense(1, Some(10)), expense(2, Some(11))], 2);
        list.vendor_names.insert(10, "Acme GmbH".to_string());
        list.vendor_names.insert(11, "Globex".to_string());
        list.filter.search = Some("acme".to_string());

        let ids: Vec<i64> = list.visible().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn paging_stops_at_the_known_edges() {
        let mut list = list_with(Vec::new(), 60);
        assert_eq!(list.pages(), 3);

        list.set_page(3);
        list.next_page();
        assert_eq!(list.page(), 3);
        list.set_page(0);
        assert_eq!(list.page(), 1);
        list.prev_page();
        assert_eq!(list.page(), 1);
    }

    #[test]
    fn empty_lists_stay_on_page_one() {
        let mut list = list_with(Vec::new(), 0);
        assert_eq!(list.pages(), 0);
        list.next_page();
        assert_eq!(list.page(), 1);
    }

    #[test]
    fn sorting_resets_to_the_first_page() {
        let mut list = list_with(Vec::new(), 100);
        list.set_page(3);
        list.set_sort(SortField::Amount);
        assert_eq!(list.page(), 1);
        assert_eq!(list.sort().field, SortField::Amount);
        assert_eq!(list.sort().dir, SortDir::Asc);

        list.set_sort(SortField::Amount);
        assert_eq!(list.sort().dir, SortDir::Desc);
    }
}
