//! Aggregates over a fetched page of expenses.

use std::collections::BTreeMap;

use api_types::expense::Expense;

use crate::allocation::total_percentage;

/// Totals shown under the expense table.
///
/// Amounts are grouped by currency code; cross-currency totals are a
/// conversion concern and deliberately not computed here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageSummary {
    pub count: usize,
    pub totals_by_currency: BTreeMap<String, f64>,
    pub count_by_status: BTreeMap<&'static str, usize>,
    /// Expenses whose allocations already add up to 100%.
    pub fully_allocated: usize,
}

#[must_use]
pub fn summarize(items: &[Expense]) -> PageSummary {
    let mut summary = PageSummary {
        count: items.len(),
        ..PageSummary::default()
    };
    for expense in items {
        *summary
            .totals_by_currency
            .entry(expense.currency.code.clone())
            .or_insert(0.0) += expense.amount;
        *summary
            .count_by_status
            .entry(expense.status.as_str())
            .or_insert(0) += 1;
        if total_percentage(&expense.allocations) == 100.0 {
            summary.fully_allocated += 1;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use api_types::CurrencyRef;
    use api_types::allocation::{Allocation, EntityType};
    use api_types::expense::{ExpenseStatus, PricingType};
    use chrono::NaiveDate;

    use super::*;

    fn expense(amount: f64, code: &str, status: ExpenseStatus) -> Expense {
        Expense {
            id: 1,
            expense_number: None,
            amount,
            currency: CurrencyRef {
                id: 1,
                code: code.to_string(),
                symbol: "?".to_string(),
            },
            expense_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
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

    #[test]
    fn totals_stay_split_by_currency() {
        let mut paid = expense(25.0, "USD", ExpenseStatus::Paid);
        paid.allocations = vec![Allocation {
            entity_type: EntityType::Invoice,
            entity_id: 1,
            percentage: 100.0,
        }];
        let items = vec![
            expense(10.0, "EUR", ExpenseStatus::Pending),
            expense(5.5, "EUR", ExpenseStatus::Pending),
            paid,
        ];

        let summary = summarize(&items);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.totals_by_currency["EUR"], 15.5);
        assert_eq!(summary.totals_by_currency["USD"], 25.0);
        assert_eq!(summary.count_by_status["pending"], 2);
        assert_eq!(summary.count_by_status["paid"], 1);
        assert_eq!(summary.fully_allocated, 1);
    }
}
