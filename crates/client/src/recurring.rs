//! Lifecycle operations on recurring expense templates.
//!
//! The backend owns child generation and the occurrence countdown; this
//! module validates transitions client-side and submits the status
//! change. Cancelling is irreversible, so drivers should confirm it
//! before calling in here.

use api_types::expense::{
    Expense, ExpenseItems, ExpenseUpdate, PricingType, RecurringStatus,
};
use engine::{EngineError, ensure_transition};

use crate::api::Api;
use crate::error::Result;

fn ensure_template(expense: &Expense) -> Result<RecurringStatus> {
    if expense.pricing_type != PricingType::Recurring {
        return Err(EngineError::InvalidRecurrence(
            "expense is not a recurring template".to_string(),
        )
        .into());
    }
    // Templates without a persisted status count as active.
    Ok(expense.recurring_status.unwrap_or(RecurringStatus::Active))
}

/// Moves a template to `to` after checking the transition is legal from
/// its current status. Returns the updated expense.
pub async fn set_recurring_status(
    api: &Api,
    template: &Expense,
    to: RecurringStatus,
) -> Result<Expense> {
    let current = ensure_template(template)?;
    ensure_transition(current, to)?;

    tracing::info!(
        template = template.id,
        from = current.as_str(),
        to = to.as_str(),
        "recurring status change"
    );
    let update = ExpenseUpdate {
        recurring_status: Some(to),
        ..ExpenseUpdate::default()
    };
    Ok(api.expense_update(template.id, &update).await?)
}

/// Asks the backend for the template's next child expense.
pub async fn generate_next_child(api: &Api, template: &Expense) -> Result<Expense> {
    ensure_template(template)?;
    Ok(api.generate_next(template.id).await?)
}

/// Children generated from the template so far.
pub async fn recurring_children(api: &Api, template: &Expense) -> Result<ExpenseItems> {
    ensure_template(template)?;
    Ok(api.recurring_children(template.id).await?)
}
