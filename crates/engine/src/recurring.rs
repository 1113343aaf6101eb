//! Scheduling rules for recurring expense templates.
//!
//! A template is an expense with `pricing_type = recurring`; the backend
//! generates its child expenses. The engine owns the date math for "when
//! is the next occurrence" and the template lifecycle. The remaining
//! occurrence counter is decremented by the backend on generation, never
//! here.

use api_types::expense::{CustomPeriod, Expense, RecurringStatus, RecurringType};
use chrono::{Days, Months, NaiveDate};

use crate::{EngineError, ResultEngine};

/// Sentinel for a template that never runs out of occurrences.
pub const INFINITE_OCCURRENCES: i32 = -1;

/// Billing cadence, normalized from the expense's recurring fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    Weekly,
    Monthly,
    Yearly,
    Custom { every: u32, period: CustomPeriod },
}

impl Cadence {
    /// Builds a cadence from the raw template fields.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidRecurrence`] when the type is missing, a
    /// custom cadence lacks its interval or period, or the interval is
    /// zero.
    pub fn from_fields(
        recurring_type: Option<RecurringType>,
        custom_every: Option<u32>,
        custom_period: Option<CustomPeriod>,
    ) -> ResultEngine<Self> {
        let invalid = |msg: &str| EngineError::InvalidRecurrence(msg.to_string());
        match recurring_type {
            None => Err(invalid("missing recurring type")),
            Some(RecurringType::Weekly) => Ok(Self::Weekly),
            Some(RecurringType::Monthly) => Ok(Self::Monthly),
            Some(RecurringType::Yearly) => Ok(Self::Yearly),
            Some(RecurringType::Custom) => {
                let every = custom_every.ok_or_else(|| invalid("missing custom interval"))?;
                let period = custom_period.ok_or_else(|| invalid("missing custom period"))?;
                if every == 0 {
                    return Err(invalid("custom interval must be at least 1"));
                }
                Ok(Self::Custom { every, period })
            }
        }
    }

    /// Advances a date by one cadence step.
    ///
    /// Month-based steps clamp to the last day of the target month, so a
    /// Jan 31 monthly template next bills on Feb 29 (leap year) or
    /// Feb 28.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidDate`] when the step leaves the supported
    /// date range, [`EngineError::InvalidRecurrence`] when a custom
    /// interval overflows.
    pub fn next_date(&self, from: NaiveDate) -> ResultEngine<NaiveDate> {
        let out_of_range = || EngineError::InvalidDate(format!("no next date after {from}"));
        match *self {
            Self::Weekly => from.checked_add_days(Days::new(7)).ok_or_else(out_of_range),
            Self::Monthly => from
                .checked_add_months(Months::new(1))
                .ok_or_else(out_of_range),
            Self::Yearly => from
                .checked_add_months(Months::new(12))
                .ok_or_else(out_of_range),
            Self::Custom { every, period } => {
                let overflow =
                    || EngineError::InvalidRecurrence(format!("custom interval {every} too large"));
                match period {
                    CustomPeriod::Days => from
                        .checked_add_days(Days::new(u64::from(every)))
                        .ok_or_else(out_of_range),
                    CustomPeriod::Weeks => from
                        .checked_add_days(Days::new(u64::from(every) * 7))
                        .ok_or_else(out_of_range),
                    CustomPeriod::Months => from
                        .checked_add_months(Months::new(every))
                        .ok_or_else(out_of_range),
                    CustomPeriod::Years => {
                        let months = every.checked_mul(12).ok_or_else(overflow)?;
                        from.checked_add_months(Months::new(months))
                            .ok_or_else(out_of_range)
                    }
                }
            }
        }
    }
}

/// Next billing date of a template, one cadence step after its date.
///
/// # Errors
///
/// Same as [`Cadence::from_fields`] and [`Cadence::next_date`].
pub fn next_billing_date(template: &Expense) -> ResultEngine<NaiveDate> {
    let cadence = Cadence::from_fields(
        template.recurring_type,
        template.custom_every,
        template.custom_period,
    )?;
    cadence.next_date(template.expense_date)
}

/// Whether `from -> to` is a legal template lifecycle move.
///
/// Active and paused flip freely; both can be cancelled; cancelled is
/// terminal. A no-op transition to the current status is not legal.
#[must_use]
pub fn can_transition(from: RecurringStatus, to: RecurringStatus) -> bool {
    use RecurringStatus::{Active, Cancelled, Paused};
    matches!(
        (from, to),
        (Active, Paused) | (Paused, Active) | (Active, Cancelled) | (Paused, Cancelled)
    )
}

/// Guard form of [`can_transition`].
///
/// # Errors
///
/// [`EngineError::InvalidTransition`] naming both statuses.
pub fn ensure_transition(from: RecurringStatus, to: RecurringStatus) -> ResultEngine<()> {
    if !can_transition(from, to) {
        return Err(EngineError::InvalidTransition(format!(
            "{} -> {}",
            from.as_str(),
            to.as_str()
        )));
    }
    Ok(())
}

/// Validates a configured occurrence count: `-1` (infinite) or >= 1.
///
/// # Errors
///
/// [`EngineError::InvalidRecurrence`] otherwise.
pub fn validate_recurring_number(value: i32) -> ResultEngine<()> {
    if value == INFINITE_OCCURRENCES || value >= 1 {
        return Ok(());
    }
    Err(EngineError::InvalidRecurrence(format!(
        "occurrences must be -1 or at least 1, got {value}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_clamps_to_month_end() {
        assert_eq!(
            Cadence::Monthly.next_date(date(2024, 1, 31)).unwrap(),
            date(2024, 2, 29)
        );
        assert_eq!(
            Cadence::Monthly.next_date(date(2023, 1, 31)).unwrap(),
            date(2023, 2, 28)
        );
        assert_eq!(
            Cadence::Monthly.next_date(date(2024, 4, 15)).unwrap(),
            date(2024, 5, 15)
        );
    }

    #[test]
    fn weekly_advances_seven_days() {
        assert_eq!(
            Cadence::Weekly.next_date(date(2024, 2, 26)).unwrap(),
            date(2024, 3, 4)
        );
    }

    #[test]
    fn yearly_clamps_leap_day() {
        assert_eq!(
            Cadence::Yearly.next_date(date(2024, 2, 29)).unwrap(),
            date(2025, 2, 28)
        );
        assert_eq!(
            Cadence::Yearly.next_date(date(2023, 6, 1)).unwrap(),
            date(2024, 6, 1)
        );
    }

    #[test]
    fn custom_periods_scale_by_interval() {
        let days = Cadence::Custom {
            every: 10,
            period: CustomPeriod::Days,
        };
        assert_eq!(days.next_date(date(2024, 1, 1)).unwrap(), date(2024, 1, 11));

        let weeks = Cadence::Custom {
            every: 2,
            period: CustomPeriod::Weeks,
        };
        assert_eq!(weeks.next_date(date(2024, 1, 1)).unwrap(), date(2024, 1, 15));

        let months = Cadence::Custom {
            every: 3,
            period: CustomPeriod::Months,
        };
        assert_eq!(
            months.next_date(date(2023, 11, 30)).unwrap(),
            date(2024, 2, 29)
        );

        let years = Cadence::Custom {
            every: 2,
            period: CustomPeriod::Years,
        };
        assert_eq!(years.next_date(date(2024, 1, 1)).unwrap(), date(2026, 1, 1));
    }

    #[test]
    fn cadence_from_fields_validates_custom() {
        assert_eq!(
            Cadence::from_fields(Some(RecurringType::Weekly), None, None).unwrap(),
            Cadence::Weekly
        );
        assert!(Cadence::from_fields(None, None, None).is_err());
        assert!(
            Cadence::from_fields(Some(RecurringType::Custom), Some(2), None).is_err()
        );
        assert!(
            Cadence::from_fields(Some(RecurringType::Custom), None, Some(CustomPeriod::Days))
                .is_err()
        );
        assert!(
            Cadence::from_fields(Some(RecurringType::Custom), Some(0), Some(CustomPeriod::Days))
                .is_err()
        );
        assert_eq!(
            Cadence::from_fields(Some(RecurringType::Custom), Some(6), Some(CustomPeriod::Weeks))
                .unwrap(),
            Cadence::Custom {
                every: 6,
                period: CustomPeriod::Weeks
            }
        );
    }

    #[test]
    fn lifecycle_pauses_are_reversible_and_cancel_is_terminal() {
        use RecurringStatus::{Active, Cancelled, Paused};

        assert!(can_transition(Active, Paused));
        assert!(can_transition(Paused, Active));
        assert!(can_transition(Active, Cancelled));
        assert!(can_transition(Paused, Cancelled));

        assert!(!can_transition(Cancelled, Active));
        assert!(!can_transition(Cancelled, Paused));
        assert!(!can_transition(Active, Active));
        assert!(!can_transition(Cancelled, Cancelled));

        let err = ensure_transition(Cancelled, Active).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTransition("cancelled -> active".to_string())
        );
    }

    #[test]
    fn occurrence_count_allows_infinite_sentinel() {
        assert!(validate_recurring_number(INFINITE_OCCURRENCES).is_ok());
        assert!(validate_recurring_number(1).is_ok());
        assert!(validate_recurring_number(12).is_ok());
        assert!(validate_recurring_number(0).is_err());
        assert!(validate_recurring_number(-2).is_err());
    }
}
