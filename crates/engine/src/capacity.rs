//! Cross-currency capacity check for invoice-scoped allocation.
//!
//! Allocating expenses against an invoice is capped by the invoice total:
//! every assigned share is brought into the invoice's currency and the
//! running total compared against what the invoice can still absorb.
//! Conversion is asynchronous and best-effort; a failed conversion falls
//! back to the unconverted amount rather than blocking the flow.

use std::collections::HashMap;
use std::future::Future;

use api_types::expense::Expense;

use crate::allocation::allocated_amount;
use crate::{EngineError, ResultEngine};

/// Tolerance absorbed by the capacity comparison so floating-point
/// rounding across conversions does not flag a legitimate save.
pub const CAPACITY_EPSILON: f64 = 0.01;

/// Conversion service seam.
///
/// The returned future must be `Send` so callers can drive checks from
/// multi-threaded runtimes.
pub trait ConvertCurrency {
    /// Converts `amount` from one ISO currency code to another.
    fn convert(
        &self,
        amount: f64,
        from: &str,
        to: &str,
    ) -> impl Future<Output = ResultEngine<f64>> + Send;
}

/// One assigned expense's contribution to an invoice's allocation.
#[derive(Clone, Debug, PartialEq)]
pub struct AllocatedShare {
    pub expense_id: i64,
    /// Full expense amount in `currency_code` major units.
    pub amount: f64,
    pub currency_code: String,
    pub percentage: f64,
}

impl AllocatedShare {
    #[must_use]
    pub fn new(
        expense_id: i64,
        amount: f64,
        currency_code: impl Into<String>,
        percentage: f64,
    ) -> Self {
        Self {
            expense_id,
            amount,
            currency_code: currency_code.into(),
            percentage,
        }
    }

    #[must_use]
    pub fn from_expense(expense: &Expense, percentage: f64) -> Self {
        Self {
            expense_id: expense.id,
            amount: expense.amount,
            currency_code: expense.currency.code.clone(),
            percentage,
        }
    }

    /// Share of the expense amount this allocation claims, in the
    /// expense's own currency.
    #[must_use]
    pub fn allocated(&self) -> f64 {
        allocated_amount(self.amount, self.percentage)
    }
}

/// Outcome of one capacity evaluation, all amounts in invoice currency.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapacityReport {
    /// Total claimed by the shares under edit.
    pub assigned_total: f64,
    /// Amount already allocated by flows outside the current session.
    pub baseline_total: f64,
    pub invoice_total: f64,
    pub is_over_allocated: bool,
}

impl CapacityReport {
    #[must_use]
    pub fn combined_total(&self) -> f64 {
        self.baseline_total + self.assigned_total
    }

    /// Capacity left on the invoice; negative when over-allocated.
    #[must_use]
    pub fn remaining(&self) -> f64 {
        self.invoice_total - self.combined_total()
    }
}

/// Capacity evaluator for one invoice, alive for one editing session.
///
/// Successful conversions are memoized by `"{expense_id}-{percentage}"`
/// so re-evaluations after unrelated edits do not hit the conversion
/// service again for unchanged shares. Failures are not memoized; the
/// next evaluation retries them.
#[derive(Clone, Debug)]
pub struct CapacityCheck {
    invoice_total: f64,
    invoice_currency: String,
    baseline_allocated: f64,
    converted: HashMap<String, f64>,
}

impl CapacityCheck {
    #[must_use]
    pub fn new(
        invoice_total: f64,
        invoice_currency: impl Into<String>,
        baseline_allocated: f64,
    ) -> Self {
        Self {
            invoice_total,
            invoice_currency: invoice_currency.into(),
            baseline_allocated,
            converted: HashMap::new(),
        }
    }

    /// Number of memoized conversion results.
    #[must_use]
    pub fn conversions_cached(&self) -> usize {
        self.converted.len()
    }

    /// Drops all memoized conversions, e.g. when the session reloads.
    pub fn reset(&mut self) {
        self.converted.clear();
    }

    /// Evaluates the shares currently assigned in the session.
    ///
    /// Shares in the invoice currency count at face value. Other shares
    /// are converted, one service call per distinct (expense, percentage)
    /// pair; on conversion failure the unconverted share counts instead
    /// and no error surfaces.
    pub async fn evaluate<C>(&mut self, shares: &[AllocatedShare], converter: &C) -> CapacityReport
    where
        C: ConvertCurrency,
    {
        let mut assigned_total = 0.0;
        for share in shares {
            assigned_total += self.share_in_invoice_currency(share, converter).await;
        }

        let combined = self.baseline_allocated + assigned_total;
        CapacityReport {
            assigned_total,
            baseline_total: self.baseline_allocated,
            invoice_total: self.invoice_total,
            is_over_allocated: combined > self.invoice_total + CAPACITY_EPSILON,
        }
    }

    async fn share_in_invoice_currency<C>(&mut self, share: &AllocatedShare, converter: &C) -> f64
    where
        C: ConvertCurrency,
    {
        let allocated = share.allocated();
        if share.currency_code == self.invoice_currency {
            return allocated;
        }

        let key = memo_key(share.expense_id, share.percentage);
        if let Some(cached) = self.converted.get(&key) {
            return *cached;
        }

        match converter
            .convert(allocated, &share.currency_code, &self.invoice_currency)
            .await
        {
            Ok(converted) => {
                self.converted.insert(key, converted);
                converted
            }
            Err(_) => allocated,
        }
    }
}

fn memo_key(expense_id: i64, percentage: f64) -> String {
    format!("{expense_id}-{percentage}")
}

/// Save gate for the invoice flow.
///
/// # Errors
///
/// [`EngineError::OverAllocated`] when the report exceeds the invoice
/// total beyond [`CAPACITY_EPSILON`].
pub fn ensure_can_save(report: &CapacityReport) -> ResultEngine<()> {
    if report.is_over_allocated {
        return Err(EngineError::OverAllocated(format!(
            "assigned {:.2} against an invoice total of {:.2}",
            report.combined_total(),
            report.invoice_total
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Fixed-rate converter that counts service calls.
    struct RateTable {
        rates: HashMap<(String, String), f64>,
        calls: AtomicUsize,
    }

    impl RateTable {
        fn new(rates: &[(&str, &str, f64)]) -> Self {
            Self {
                rates: rates
                    .iter()
                    .map(|(from, to, rate)| ((from.to_string(), to.to_string()), *rate))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ConvertCurrency for RateTable {
        async fn convert(&self, amount: f64, from: &str, to: &str) -> ResultEngine<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rate = self
                .rates
                .get(&(from.to_string(), to.to_string()))
                .ok_or_else(|| EngineError::Conversion(format!("no rate {from}->{to}")))?;
            Ok(amount * rate)
        }
    }

    struct AlwaysFails {
        calls: AtomicUsize,
    }

    impl AlwaysFails {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ConvertCurrency for AlwaysFails {
        async fn convert(&self, _amount: f64, from: &str, to: &str) -> ResultEngine<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::Conversion(format!("no rate {from}->{to}")))
        }
    }

    #[tokio::test]
    async fn same_currency_shares_skip_the_service() {
        let mut check = CapacityCheck::new(500.0, "EUR", 0.0);
        let converter = RateTable::new(&[]);
        let shares = vec![
            AllocatedShare::new(1, 100.0, "EUR", 60.0),
            AllocatedShare::new(2, 50.0, "EUR", 100.0),
        ];

        let report = check.evaluate(&shares, &converter).await;
        assert_eq!(report.assigned_total, 110.0);
        assert_eq!(converter.calls(), 0);
        assert!(!report.is_over_allocated);
    }

    #[tokio::test]
    async fn cross_currency_share_is_converted_once() {
        let mut check = CapacityCheck::new(500.0, "EUR", 0.0);
        let converter = RateTable::new(&[("USD", "EUR", 0.5)]);
        let shares = vec![AllocatedShare::new(1, 200.0, "USD", 50.0)];

        let first = check.evaluate(&shares, &converter).await;
        let second = check.evaluate(&shares, &converter).await;
        assert_eq!(first.assigned_total, 50.0);
        assert_eq!(second.assigned_total, 50.0);
        assert_eq!(converter.calls(), 1);
        assert_eq!(check.conversions_cached(), 1);
    }

    #[tokio::test]
    async fn changed_percentage_is_a_new_memo_entry() {
        let mut check = CapacityCheck::new(500.0, "EUR", 0.0);
        let converter = RateTable::new(&[("USD", "EUR", 0.5)]);

        check
            .evaluate(&[AllocatedShare::new(1, 200.0, "USD", 50.0)], &converter)
            .await;
        check
            .evaluate(&[AllocatedShare::new(1, 200.0, "USD", 25.0)], &converter)
            .await;
        assert_eq!(converter.calls(), 2);
        assert_eq!(check.conversions_cached(), 2);
    }

    #[tokio::test]
    async fn conversion_failure_falls_back_and_is_retried() {
        let mut check = CapacityCheck::new(500.0, "EUR", 0.0);
        let converter = AlwaysFails::new();
        let shares = vec![AllocatedShare::new(1, 200.0, "USD", 50.0)];

        let report = check.evaluate(&shares, &converter).await;
        assert_eq!(report.assigned_total, 100.0);
        assert_eq!(check.conversions_cached(), 0);

        check.evaluate(&shares, &converter).await;
        assert_eq!(converter.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn over_allocation_uses_the_fixed_epsilon() {
        let converter = RateTable::new(&[]);

        let mut check = CapacityCheck::new(100.0, "EUR", 0.0);
        let just_inside = check
            .evaluate(&[AllocatedShare::new(1, 100.005, "EUR", 100.0)], &converter)
            .await;
        assert!(!just_inside.is_over_allocated);
        assert!(ensure_can_save(&just_inside).is_ok());

        let mut check = CapacityCheck::new(100.0, "EUR", 0.0);
        let just_outside = check
            .evaluate(&[AllocatedShare::new(1, 100.02, "EUR", 100.0)], &converter)
            .await;
        assert!(just_outside.is_over_allocated);
        assert!(matches!(
            ensure_can_save(&just_outside),
            Err(EngineError::OverAllocated(_))
        ));
    }

    #[tokio::test]
    async fn baseline_counts_against_capacity() {
        let converter = RateTable::new(&[]);
        let mut check = CapacityCheck::new(100.0, "EUR", 50.0);
        let report = check
            .evaluate(&[AllocatedShare::new(1, 60.0, "EUR", 100.0)], &converter)
            .await;

        assert_eq!(report.combined_total(), 110.0);
        assert!(report.is_over_allocated);
        assert_eq!(report.remaining(), -10.0);
    }
}
