//! Status classification — period expectation plus matched execution
//! into one terminal status.
//!
//! Decision order:
//!   1. Applicability says the period is not collected this month → not_applicable
//!   2. No expected period (on-demand)                           → not_applicable
//!   3. No execution: past due → overdue, otherwise pending
//!   4. Execution found: mapped from its pre-computed auto status;
//!      a missing or unrecognized auto status reads as pending.
//!
//! Classification never fails. Every outcome is a normal status.

use crate::{
    clock::AsOf,
    model::{EntityKind, EntityStatus, Execution, Status},
    period::{self, ExpectedPeriod},
    types::EntityId,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// When a period-based entity is expected to report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Applicability {
    /// Only in the cadence's anchor months (the month right after a
    /// period closes). Monthly cadences are always applicable.
    #[default]
    AnchorMonths,
    /// Every month; overdue tracking runs through the whole grace window.
    Always,
}

impl Applicability {
    /// Whether `period` is collected in `evaluated_month` (1..=12).
    pub fn applies(self, period: &ExpectedPeriod, evaluated_month: u32) -> bool {
        match self {
            Applicability::Always => period::is_period_end(period.cadence, period.period_end),
            Applicability::AnchorMonths => period::is_anchor_month(period.cadence, evaluated_month),
        }
    }
}

/// The month a period is looked at from: the as-of month for a resolved
/// period, the month right after the period end for an override.
pub fn evaluated_month(as_of: AsOf, override_period_end: Option<NaiveDate>) -> u32 {
    match override_period_end {
        Some(end) => end.month() % 12 + 1,
        None      => as_of.month(),
    }
}

pub struct ClassifierInput<'a> {
    pub entity_id:       &'a EntityId,
    pub kind:            EntityKind,
    pub period:          Option<ExpectedPeriod>,
    pub execution:       Option<&'a Execution>,
    pub as_of:           AsOf,
    pub evaluated_month: u32,
    pub applicability:   Applicability,
}

pub fn classify(input: ClassifierInput<'_>) -> EntityStatus {
    let applies = |p: &ExpectedPeriod| input.applicability.applies(p, input.evaluated_month);
    let status = match (&input.period, input.execution) {
        (Some(p), _) if !applies(p)                   => Status::NotApplicable,
        (None, _)                                     => Status::NotApplicable,
        (Some(p), None) if p.is_past_due(input.as_of) => Status::Overdue,
        (Some(_), None)                               => Status::Pending,
        (Some(_), Some(exec))                         => Status::from_auto_status(exec.auto_status),
    };

    // A not-applicable period does not surface the execution it may have.
    let execution = input
        .execution
        .filter(|_| input.period.as_ref().is_some_and(applies));

    EntityStatus {
        entity_id:            input.entity_id.clone(),
        kind:                 input.kind,
        period:               input.period,
        status,
        matched_execution_id: execution.map(|e| e.id.clone()),
        result_numeric:       execution.and_then(|e| e.result_numeric),
        workflow_status:      execution.map(|e| e.workflow_status.clone()),
        executed_at:          execution.map(|e| e.created_at),
    }
}
