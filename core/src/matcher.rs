//! Execution matching — picks the authoritative execution for a period.
//!
//! RULE: Only an exact `period_end` match counts. Among resubmissions
//! for the same period the latest `created_at` wins; equal timestamps
//! fall back to the larger execution id so the pick is total.
//!
//! RULE: A resubmission is another row for the same report. For a
//! control, rows logged against the control itself are one report and
//! each KPI's rows are another. One KPI never supersedes a different KPI.

use crate::model::{EntityKind, Execution, Status};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

fn newer(a: &Execution, b: &Execution) -> Ordering {
    a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
}

pub fn select_authoritative(executions: &[Execution], period_end: NaiveDate) -> Option<&Execution> {
    executions
        .iter()
        .filter(|e| e.period_end == period_end)
        .max_by(|a, b| newer(a, b))
}

/// The execution that decides a control's status for `period_end`.
///
/// Rows logged against the control itself win (latest first). Without
/// any, each KPI's authoritative row is taken and the most urgent one
/// decides, so an out-of-target KPI is never hidden by a later
/// in-target one.
pub fn select_for_control(executions: &[Execution], period_end: NaiveDate) -> Option<&Execution> {
    let mut own: Option<&Execution> = None;
    let mut per_kpi: BTreeMap<&str, Option<&Execution>> = BTreeMap::new();

    for e in executions.iter().filter(|e| e.period_end == period_end) {
        let slot = match e.kpi_id.as_deref() {
            None         => &mut own,
            Some(kpi_id) => per_kpi.entry(kpi_id).or_default(),
        };
        if slot.map_or(true, |current| newer(e, current).is_gt()) {
            *slot = Some(e);
        }
    }

    own.or_else(|| {
        per_kpi.into_values().flatten().max_by(|a, b| {
            let urgency = |e: &Execution| Status::from_auto_status(e.auto_status).urgency_rank();
            urgency(a).cmp(&urgency(b)).then_with(|| newer(a, b))
        })
    })
}

/// Dispatch on the entity kind.
pub fn select_for(kind: EntityKind, executions: &[Execution], period_end: NaiveDate) -> Option<&Execution> {
    match kind {
        EntityKind::Control => select_for_control(executions, period_end),
        EntityKind::Kpi     => select_authoritative(executions, period_end),
    }
}
