//! Assign expenses to one invoice, project, payment or contact.
//!
//! A session loads the expenses already allocated to the target, lets the
//! caller add, remove and re-weight assignments, and saves by submitting a
//! reconciled full-replace payload per touched expense. Sibling allocations
//! held by other entities survive every save because payloads are rebuilt
//! from the per-expense cache.

use api_types::{
    allocation::{Allocation, AllocationsUpdate, EntityType},
    expense::Expense,
};
use engine::{
    AllocatedShare, AllocationCache, CapacityCheck, CapacityReport, ConvertCurrency, EngineError,
    EntityRef, ensure_can_save, parse_percentage,
};
use futures::future::join_all;

use crate::api::{Api, ApiError};
use crate::error::Result;

/// One expense currently assigned to the session's target.
#[derive(Clone, Debug)]
pub struct AssignedExpense {
    pub expense: Expense,
    /// Share of the expense assigned to the target, in `[0, 100]`.
    pub percentage: f64,
    /// Added in this session; not yet known to the backend.
    pub is_new: bool,
}

/// Outcome of one save pass. Successes are never rolled back when a
/// sibling call fails; failed expenses stay dirty and can be retried.
#[derive(Debug, Default)]
pub struct SaveReport {
    pub saved: Vec<i64>,
    pub failed: Vec<(i64, ApiError)>,
}

impl SaveReport {
    pub fn all_saved(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Editing session for the expense assignments of one entity.
pub struct AssignmentSession {
    target: EntityRef,
    /// Present only when the target is an invoice.
    capacity: Option<CapacityCheck>,
    cache: AllocationCache,
    rows: Vec<AssignedExpense>,
    /// Previously assigned expenses the user removed. Saving submits their
    /// cached list without the target's entry.
    removed: Vec<i64>,
}

impl AssignmentSession {
    /// Loads the target's assigned expenses and primes the allocation
    /// cache from the embedded allocation lists. Invoice targets also
    /// fetch the invoice record and its capacity baseline.
    pub async fn load(api: &Api, target: EntityRef) -> Result<Self> {
        let assigned = api.expenses_by_entity(target.kind, target.id).await?;

        let mut cache = AllocationCache::new();
        let mut rows = Vec::new();
        for expense in assigned.items {
            cache.prime(expense.id, expense.allocations.clone());
            let percentage = expense
                .allocations
                .iter()
                .find(|entry| entry.entity_type == target.kind && entry.entity_id == target.id)
                .map_or(0.0, |entry| entry.percentage);
            rows.push(AssignedExpense {
                expense,
                percentage,
                is_new: false,
            });
        }

        let capacity = if target.kind == EntityType::Invoice {
            let invoice = api.invoice_get(target.id).await?;
            let baseline = api.invoice_allocation_capacity(target.id).await?;
            Some(CapacityCheck::new(
                invoice.total,
                invoice.currency.code,
                baseline.allocated_expenses_total,
            ))
        } else {
            None
        };

        Ok(Self {
            target,
            capacity,
            cache,
            rows,
            removed: Vec::new(),
        })
    }

    pub fn target(&self) -> EntityRef {
        self.target
    }

    pub fn rows(&self) -> &[AssignedExpense] {
        &self.rows
    }

    /// Assigns an expense at the default 100% share.
    ///
    /// Fetches and caches the expense's current allocations first, so the
    /// eventual save cannot clobber entries held by other entities.
    pub async fn add(&mut self, api: &Api, expense: Expense) -> Result<()> {
        if self.rows.iter().any(|row| row.expense.id == expense.id) {
            let label = expense
                .expense_number
                .clone()
                .unwrap_or_else(|| expense.id.to_string());
            return Err(EngineError::ExistingKey(label).into());
        }

        if !self.cache.contains(expense.id) {
            let current = api.allocations_get(expense.id).await?;
            self.cache.prime(expense.id, current.allocations);
        }

        self.removed.retain(|id| *id != expense.id);
        self.rows.push(AssignedExpense {
            expense,
            percentage: 100.0,
            is_new: true,
        });
        Ok(())
    }

    /// Drops an expense from the assigned set. Rows added in this session
    /// vanish without a trace; previously assigned expenses are submitted
    /// on save with the target's entry omitted, which unassigns them.
    pub fn remove(&mut self, expense_id: i64) -> Result<()> {
        let index = self
            .rows
            .iter()
            .position(|row| row.expense.id == expense_id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("expense {expense_id}")))?;

        let row = self.rows.remove(index);
        if !row.is_new && !self.removed.contains(&expense_id) {
            self.removed.push(expense_id);
        }
        Ok(())
    }

    /// Re-weights one assignment. Free-form input is parsed and clamped
    /// to `[0, 100]`; non-numeric input lands at 0.
    pub fn set_percentage(&mut self, expense_id: i64, input: &str) -> Result<()> {
        let row = self
            .rows
            .iter_mut()
            .find(|row| row.expense.id == expense_id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("expense {expense_id}")))?;
        row.percentage = parse_percentage(input);
        Ok(())
    }

    /// Evaluates the invoice capacity of the current assignments, or
    /// `None` when the target is not an invoice.
    pub async fn capacity_report<C>(&mut self, converter: &C) -> Option<CapacityReport>
    where
        C: ConvertCurrency,
    {
        let check = self.capacity.as_mut()?;
        let shares = shares_of(&self.rows);
        Some(check.evaluate(&shares, converter).await)
    }

    fn payloads(&self) -> Vec<(i64, Vec<Allocation>)> {
        let mut payloads = Vec::with_capacity(self.rows.len() + self.removed.len());
        for row in &self.rows {
            payloads.push((
                row.expense.id,
                self.cache
                    .reconcile_for(row.expense.id, self.target, row.percentage),
            ));
        }
        for &expense_id in &self.removed {
            payloads.push((expense_id, self.cache.remove_for(expense_id, self.target)));
        }
        payloads
    }

    /// Saves every touched expense, dispatching the full-replace calls in
    /// parallel.
    ///
    /// Invoice targets are gated on the capacity check first; an
    /// over-allocated session returns an error before any call is made.
    /// Past the gate, per-expense failures do not roll back sibling saves:
    /// the report lists both outcomes and failed expenses stay pending.
    pub async fn save(&mut self, api: &Api) -> Result<SaveReport> {
        if let Some(check) = self.capacity.as_mut() {
            let shares = shares_of(&self.rows);
            let report = check.evaluate(&shares, api).await;
            ensure_can_save(&report)?;
        }

        let payloads = self.payloads();
        let calls = payloads.iter().map(|(expense_id, allocations)| async move {
            let update = AllocationsUpdate {
                allocations: allocations.clone(),
            };
            match api.allocations_update(*expense_id, &update).await {
                Ok(()) => Ok(*expense_id),
                Err(err) => Err((*expense_id, err)),
            }
        });

        let mut report = SaveReport::default();
        for outcome in join_all(calls).await {
            match outcome {
                Ok(expense_id) => report.saved.push(expense_id),
                Err((expense_id, err)) => {
                    tracing::warn!(expense_id, error = %err, "allocation save failed");
                    report.failed.push((expense_id, err));
                }
            }
        }

        for &expense_id in &report.saved {
            if let Some((_, allocations)) = payloads.iter().find(|(id, _)| *id == expense_id) {
                self.cache.prime(expense_id, allocations.clone());
            }
            if let Some(row) = self.rows.iter_mut().find(|row| row.expense.id == expense_id) {
                row.is_new = false;
            }
        }
        self.removed.retain(|id| !report.saved.contains(id));

        Ok(report)
    }
}

fn shares_of(rows: &[AssignedExpense]) -> Vec<AllocatedShare> {
    rows.iter()
        .map(|row| AllocatedShare::from_expense(&row.expense, row.percentage))
        .collect()
}

#[cfg(test)]
mod tests {
    use api_types::CurrencyRef;
    use api_types::expense::{ExpenseStatus, PricingType};
    use chrono::NaiveDate;

    use super::*;

    fn expense(id: i64, amount: f64) -> Expense {
        Expense {
            id,
            expense_number: Some(format!("EXP-{id:04}")),
            amount,
            currency: CurrencyRef {
                id: 1,
                code: "USD".to_string(),
                symbol: "$".to_string(),
            },
            expense_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            status: ExpenseStatus::Pending,
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

    fn alloc(entity_type: EntityType, entity_id: i64, percentage: f64) -> Allocation {
        Allocation {
            entity_type,
            entity_id,
            percentage,
        }
    }

    fn session(target: EntityRef) -> AssignmentSession {
        AssignmentSession {
            target,
            capacity: None,
            cache: AllocationCache::new(),
            rows: Vec::new(),
            removed: Vec::new(),
        }
    }

    #[test]
    fn payloads_preserve_sibling_allocations() {
        let target = EntityRef::new(EntityType::Invoice, 1);
        let mut session = session(target);
        session
            .cache
            .prime(10, vec![alloc(EntityType::Project, 2, 40.0)]);
        session.rows.push(AssignedExpense {
            expense: expense(10, 100.0),
            percentage: 60.0,
            is_new: true,
        });

        let payloads = session.payloads();
        assert_eq!(payloads.len(), 1);
        assert_eq!(
            payloads[0].1,
            vec![
                alloc(EntityType::Project, 2, 40.0),
                alloc(EntityType::Invoice, 1, 60.0),
            ]
        );
    }

    #[test]
    fn removing_a_new_row_leaves_no_trace() {
        let target = EntityRef::new(EntityType::Project, 5);
        let mut session = session(target);
        session.rows.push(AssignedExpense {
            expense: expense(7, 50.0),
            percentage: 100.0,
            is_new: true,
        });

        session.remove(7).unwrap();
        assert!(session.rows.is_empty());
        assert!(session.removed.is_empty());
        assert!(session.payloads().is_empty());
    }

    #[test]
    fn removing_an_assigned_row_unassigns_on_save() {
        let target = EntityRef::new(EntityType::Contact, 3);
        let mut session = session(target);
        session.cache.prime(
            4,
            vec![
                alloc(EntityType::Contact, 3, 25.0),
                alloc(EntityType::Payment, 9, 75.0),
            ],
        );
        session.rows.push(AssignedExpense {
            expense: expense(4, 200.0),
            percentage: 25.0,
            is_new: false,
        });

        session.remove(4).unwrap();
        let payloads = session.payloads();
        assert_eq!(payloads, vec![(4, vec![alloc(EntityType::Payment, 9, 75.0)])]);
    }

    #[test]
    fn percentage_edits_parse_and_clamp() {
        let target = EntityRef::new(EntityType::Payment, 8);
        let mut session = session(target);
        session.rows.push(AssignedExpense {
            expense: expense(2, 10.0),
            percentage: 100.0,
            is_new: true,
        });

        session.set_percentage(2, "150").unwrap();
        assert_eq!(session.rows[0].percentage, 100.0);
        session.set_percentage(2, "37,5").unwrap();
        assert_eq!(session.rows[0].percentage, 37.5);
        session.set_percentage(2, "garbage").unwrap();
        assert_eq!(session.rows[0].percentage, 0.0);

        assert!(session.set_percentage(99, "10").is_err());
    }

    #[test]
    fn unknown_rows_cannot_be_removed() {
        let target = EntityRef::new(EntityType::Invoice, 1);
        let mut session = session(target);
        assert!(session.remove(123).is_err());
    }
}
