//! Allocation accounting for a single expense.
//!
//! An expense's cost can be split across invoices, projects, payments and
//! contacts as percentage shares. The backend endpoint that stores the
//! split is full-replace: every save submits the complete list for the
//! expense. [`reconcile`] rebuilds that list from the last known server
//! state so that editing one entity's share never drops the shares other
//! entities already hold on the same expense.

use std::collections::HashMap;

use api_types::allocation::{Allocation, AllocationsUpdate};

use crate::{EngineError, EntityRef, ResultEngine};

/// Clamps a percentage to `[0, 100]`. `NaN` collapses to `0`.
#[must_use]
pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Parses a user-entered percentage, treating anything unparseable as `0`
/// and clamping the result to `[0, 100]`.
///
/// Accepts `.` or `,` as decimal separator and a trailing `%`.
#[must_use]
pub fn parse_percentage(input: &str) -> f64 {
    let cleaned = input.trim().trim_end_matches('%').trim().replace(',', ".");
    let value = cleaned.parse::<f64>().unwrap_or(0.0);
    clamp_percentage(value)
}

/// Sum of the percentages in an allocation list.
#[must_use]
pub fn total_percentage(allocations: &[Allocation]) -> f64 {
    allocations.iter().map(|a| a.percentage).sum()
}

/// Monetary share a percentage represents of an expense amount.
#[must_use]
pub fn allocated_amount(expense_amount: f64, percentage: f64) -> f64 {
    expense_amount * percentage / 100.0
}

/// Percentage still unassigned given a current total, never negative.
#[must_use]
pub fn remaining_capacity(total: f64) -> f64 {
    (100.0 - total).max(0.0)
}

/// Aggregate state of one expense's allocation list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocationStatus {
    Unallocated,
    Partial,
    Full,
    Over,
}

impl AllocationStatus {
    /// Classifies a total percentage.
    ///
    /// `Full` requires the total to land exactly on 100; `Over` is a hard
    /// `> 100` with no epsilon. The cross-currency invoice cap applies its
    /// own tolerance separately.
    #[must_use]
    pub fn from_total(total: f64) -> Self {
        if total > 100.0 {
            Self::Over
        } else if total == 100.0 {
            Self::Full
        } else if total > 0.0 {
            Self::Partial
        } else {
            Self::Unallocated
        }
    }

    /// Accent color used by badge rendering.
    #[must_use]
    pub const fn accent(self) -> &'static str {
        match self {
            Self::Unallocated => "gray",
            Self::Partial => "amber",
            Self::Full => "green",
            Self::Over => "red",
        }
    }
}

/// Rebuilds the full allocation list for an expense after one entity's
/// share changed.
///
/// Starts from `cached` (the last known server state), replaces the entry
/// matching `target` or appends one if absent, and leaves every other
/// entry untouched. The percentage is clamped to `[0, 100]`.
///
/// The returned list is what gets submitted to the replace-all endpoint.
#[must_use]
pub fn reconcile(cached: &[Allocation], target: EntityRef, percentage: f64) -> Vec<Allocation> {
    let percentage = clamp_percentage(percentage);
    let mut next = cached.to_vec();
    match next
        .iter_mut()
        .find(|a| a.entity_type == target.kind && a.entity_id == target.id)
    {
        Some(entry) => entry.percentage = percentage,
        None => next.push(Allocation {
            entity_type: target.kind,
            entity_id: target.id,
            percentage,
        }),
    }
    next
}

/// Rebuilds the full allocation list with `target`'s entry removed.
///
/// Omitting the entry from the submitted list is how an assignment is
/// undone under full-replace semantics.
#[must_use]
pub fn reconcile_remove(cached: &[Allocation], target: EntityRef) -> Vec<Allocation> {
    cached
        .iter()
        .filter(|a| !(a.entity_type == target.kind && a.entity_id == target.id))
        .cloned()
        .collect()
}

/// Snapshot of last-known-server allocation lists, keyed by expense id.
///
/// Primed when an editing session loads its data, consulted when building
/// full-replace payloads, and discarded when the session closes. It is
/// never shared across sessions. An expense missing from the cache
/// reconciles against an empty base list.
#[derive(Clone, Debug, Default)]
pub struct AllocationCache {
    entries: HashMap<i64, Vec<Allocation>>,
}

impl AllocationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the server state for one expense, replacing any prior
    /// snapshot. Also called after a successful save so later edits in
    /// the same session reconcile against what the server now holds.
    pub fn prime(&mut self, expense_id: i64, allocations: Vec<Allocation>) {
        self.entries.insert(expense_id, allocations);
    }

    #[must_use]
    pub fn get(&self, expense_id: i64) -> Option<&[Allocation]> {
        self.entries.get(&expense_id).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, expense_id: i64) -> bool {
        self.entries.contains_key(&expense_id)
    }

    /// [`reconcile`] against the cached state for `expense_id`.
    #[must_use]
    pub fn reconcile_for(
        &self,
        expense_id: i64,
        target: EntityRef,
        percentage: f64,
    ) -> Vec<Allocation> {
        let base = self.get(expense_id).unwrap_or(&[]);
        reconcile(base, target, percentage)
    }

    /// [`reconcile_remove`] against the cached state for `expense_id`.
    #[must_use]
    pub fn remove_for(&self, expense_id: i64, target: EntityRef) -> Vec<Allocation> {
        let base = self.get(expense_id).unwrap_or(&[]);
        reconcile_remove(base, target)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// In-place editor for one expense's complete allocation list.
///
/// Backs the flow where the user manages a single expense's split
/// directly rather than assigning expenses from an entity's side. Rows
/// are added with the remaining capacity pre-filled, edited, removed,
/// and finally turned into a full-replace payload.
#[derive(Clone, Debug)]
pub struct AllocationEditor {
    expense_amount: f64,
    rows: Vec<Allocation>,
}

impl AllocationEditor {
    #[must_use]
    pub fn new(expense_amount: f64, rows: Vec<Allocation>) -> Self {
        Self {
            expense_amount,
            rows,
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[Allocation] {
        &self.rows
    }

    /// Appends a row for `target` with the remaining capacity as its
    /// starting percentage.
    ///
    /// # Errors
    ///
    /// [`EngineError::ExistingKey`] if a row for `target` already exists;
    /// the list holds at most one entry per (kind, id) pair.
    pub fn add_row(&mut self, target: EntityRef) -> ResultEngine<()> {
        if self
            .rows
            .iter()
            .any(|a| a.entity_type == target.kind && a.entity_id == target.id)
        {
            return Err(EngineError::ExistingKey(target.to_string()));
        }
        self.rows.push(Allocation {
            entity_type: target.kind,
            entity_id: target.id,
            percentage: remaining_capacity(self.total_percentage()),
        });
        Ok(())
    }

    /// Sets a row's percentage from raw user input.
    ///
    /// # Errors
    ///
    /// [`EngineError::KeyNotFound`] if `index` is out of range.
    pub fn set_percentage(&mut self, index: usize, input: &str) -> ResultEngine<()> {
        let row = self
            .rows
            .get_mut(index)
            .ok_or_else(|| EngineError::KeyNotFound(format!("allocation row {index}")))?;
        row.percentage = parse_percentage(input);
        Ok(())
    }

    /// Removes and returns a row.
    ///
    /// # Errors
    ///
    /// [`EngineError::KeyNotFound`] if `index` is out of range.
    pub fn remove_row(&mut self, index: usize) -> ResultEngine<Allocation> {
        if index >= self.rows.len() {
            return Err(EngineError::KeyNotFound(format!("allocation row {index}")));
        }
        Ok(self.rows.remove(index))
    }

    #[must_use]
    pub fn total_percentage(&self) -> f64 {
        total_percentage(&self.rows)
    }

    #[must_use]
    pub fn remaining_capacity(&self) -> f64 {
        remaining_capacity(self.total_percentage())
    }

    #[must_use]
    pub fn status(&self) -> AllocationStatus {
        AllocationStatus::from_total(self.total_percentage())
    }

    /// Monetary share of one row, if it exists.
    #[must_use]
    pub fn row_amount(&self, index: usize) -> Option<f64> {
        self.rows
            .get(index)
            .map(|a| allocated_amount(self.expense_amount, a.percentage))
    }

    /// Checks the save precondition.
    ///
    /// # Errors
    ///
    /// [`EngineError::OverAllocated`] when the total exceeds 100%. A total
    /// of exactly 100 is the fully-allocated success state.
    pub fn validate(&self) -> ResultEngine<()> {
        let total = self.total_percentage();
        if total > 100.0 {
            return Err(EngineError::OverAllocated(format!(
                "allocations total {total:.2}% of the expense"
            )));
        }
        Ok(())
    }

    /// Validates and produces the full-replace payload.
    ///
    /// # Errors
    ///
    /// Same as [`AllocationEditor::validate`].
    pub fn into_payload(self) -> ResultEngine<AllocationsUpdate> {
        self.validate()?;
        Ok(AllocationsUpdate {
            allocations: self.rows,
        })
    }
}
