//! Period resolution — which period a control should have reported on
//! as of a given date, and when that report is due.
//!
//! All dates are calendar days, inclusive, in the caller's reference
//! timezone. The grace-period policy is fixed:
//!
//!   monthly     period end = last day of the previous month
//!               due        = 14th of the month after the period end
//!   quarterly   period end = last day of the previous quarter
//!               due        = period end + 2 months
//!   semiannual  period end = Dec 31 (as-of in H1) or Jun 30 (as-of in H2)
//!               due        = period end + 2 months
//!   annual      period end = Dec 31 of the previous year
//!               due        = Nov 30 of the following year
//!
//! `ExpectedPeriod::for_period_end` owns the due-date policy, so a
//! caller-supplied override period gets the same grace as a resolved one.

use crate::{
    clock::AsOf,
    error::{EngineError, EngineResult},
    frequency::{Cadence, CadenceClass},
};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Day of the month on which a monthly report falls due.
pub const MONTHLY_DUE_DAY: u32 = 14;

/// Grace after a quarterly or semiannual period end, in months.
pub const PERIOD_GRACE_MONTHS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpectedPeriod {
    pub cadence:      CadenceClass,
    pub period_start: NaiveDate,
    pub period_end:   NaiveDate,
    pub due_date:     NaiveDate,
}

impl ExpectedPeriod {
    /// Build the period that ends on `period_end`, with its due date.
    /// The caller is responsible for `period_end` being a period boundary
    /// (see `is_period_end`).
    pub fn for_period_end(cadence: CadenceClass, period_end: NaiveDate) -> EngineResult<Self> {
        let span = cadence.period_months();
        let period_start = period_end
            .with_day(1)
            .and_then(|first| first.checked_sub_months(Months::new(span - 1)))
            .ok_or(EngineError::DateArithmeticOverflow { from: period_end, op: "period_start" })?;

        let due_date = match cadence {
            CadenceClass::Monthly => period_end
                .checked_add_days(Days::new(1))
                .and_then(|next| next.with_day(MONTHLY_DUE_DAY)),
            CadenceClass::Quarterly | CadenceClass::Semiannual => {
                period_end.checked_add_months(Months::new(PERIOD_GRACE_MONTHS))
            }
            CadenceClass::Annual => NaiveDate::from_ymd_opt(period_end.year() + 1, 11, 30),
        }
        .ok_or(EngineError::DateArithmeticOverflow { from: period_end, op: "due_date" })?;

        Ok(Self { cadence, period_start, period_end, due_date })
    }

    /// The period a control with `cadence` should have completed as of `as_of`.
    pub fn resolve(cadence: CadenceClass, as_of: AsOf) -> EngineResult<Self> {
        let span = cadence.period_months();
        // First month of the period that contains the as-of date.
        let current_start_month = ((as_of.month() - 1) / span) * span + 1;
        let current_start = NaiveDate::from_ymd_opt(as_of.year(), current_start_month, 1)
            .ok_or(EngineError::DateArithmeticOverflow { from: as_of.date(), op: "period_boundary" })?;
        let period_end = current_start
            .pred_opt()
            .ok_or(EngineError::DateArithmeticOverflow { from: current_start, op: "period_end" })?;
        Self::for_period_end(cadence, period_end)
    }

    /// True once `as_of` is strictly past the due date.
    pub fn is_past_due(&self, as_of: AsOf) -> bool {
        as_of.date() > self.due_date
    }
}

/// Resolve the expected period for any cadence. On-demand controls have none.
pub fn resolve(cadence: Cadence, as_of: AsOf) -> EngineResult<Option<ExpectedPeriod>> {
    match cadence {
        Cadence::Periodic(class) => ExpectedPeriod::resolve(class, as_of).map(Some),
        Cadence::OnDemand        => Ok(None),
    }
}

/// Whether `date` is the last day of a `cadence` period.
pub fn is_period_end(cadence: CadenceClass, date: NaiveDate) -> bool {
    let last_of_month = date.succ_opt().map_or(true, |next| next.day() == 1);
    last_of_month && date.month() % cadence.period_months() == 0
}

/// Whether reports for `cadence` are collected in `month` (1..=12).
///
/// A month is an anchor month when the month before it closes a period,
/// which is exactly when `ExpectedPeriod::resolve` moves to a new period.
pub fn is_anchor_month(cadence: CadenceClass, month: u32) -> bool {
    let previous = if month == 1 { 12 } else { month - 1 };
    previous % cadence.period_months() == 0
}
