//! Aggregation — per-entity statuses into dashboard view models.
//!
//! RULE: Summary cards, the trend and the critical list are all folded
//! from the same `EntityStatus` values. Nothing here re-derives a status.
//!
//! Inputs may arrive in any order (they come off a worker pool);
//! everything emitted is sorted first, so output is deterministic.

use crate::{
    clock::{self, AsOf},
    config::EngineConfig,
    model::{EntityKind, EntityStatus, RiskClassification, Status, TrackedEntity},
    types::{EntityId, ExecutionId},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

// ── Counts ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub effective:       u64,
    pub warning:         u64,
    pub out_of_standard: u64,
    pub pending:         u64,
    pub overdue:         u64,
    pub not_applicable:  u64,
}

impl StatusCounts {
    pub fn from_statuses<'a, I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = &'a EntityStatus>,
    {
        let mut counts = Self::default();
        for s in statuses {
            counts.record(s.status);
        }
        counts
    }

    pub fn record(&mut self, status: Status) {
        match status {
            Status::Effective     => self.effective += 1,
            Status::Warning       => self.warning += 1,
            Status::OutOfStandard => self.out_of_standard += 1,
            Status::Pending       => self.pending += 1,
            Status::Overdue       => self.overdue += 1,
            Status::NotApplicable => self.not_applicable += 1,
        }
    }

    pub fn get(&self, status: Status) -> u64 {
        match status {
            Status::Effective     => self.effective,
            Status::Warning       => self.warning,
            Status::OutOfStandard => self.out_of_standard,
            Status::Pending       => self.pending,
            Status::Overdue       => self.overdue,
            Status::NotApplicable => self.not_applicable,
        }
    }

    pub fn total(&self) -> u64 {
        Status::ALL.iter().map(|s| self.get(*s)).sum()
    }

    /// Entities that were expected to report (everything but not_applicable).
    pub fn tracked(&self) -> u64 {
        Status::ALL
            .iter()
            .filter(|s| s.is_tracked())
            .map(|s| self.get(*s))
            .sum()
    }

    /// Share of tracked entities that are effective, 0..=100, two decimals.
    /// Zero when nothing is tracked.
    pub fn in_target_pct(&self) -> f64 {
        percentage(self.effective, self.tracked())
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let pct = part as f64 * 100.0 / whole as f64;
    (pct * 100.0).round() / 100.0
}

// ── Trend ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// `YYYY-MM` of the evaluated month.
    pub month:         String,
    pub as_of:         NaiveDate,
    pub counts:        StatusCounts,
    pub in_target_pct: f64,
}

impl TrendPoint {
    pub fn from_statuses(as_of: AsOf, statuses: &[EntityStatus]) -> Self {
        let counts = StatusCounts::from_statuses(statuses);
        Self {
            month: as_of.month_label(),
            as_of: as_of.date(),
            counts,
            in_target_pct: counts.in_target_pct(),
        }
    }

    /// A month with no data at all, e.g. before the supported calendar
    /// window. Not an error.
    pub fn empty(as_of: NaiveDate) -> Self {
        Self {
            month:         clock::month_label(as_of),
            as_of,
            counts:        StatusCounts::default(),
            in_target_pct: 0.0,
        }
    }
}

// ── Critical list ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalEntry {
    pub entity_id:            EntityId,
    pub kind:                 EntityKind,
    pub control_id:           EntityId,
    pub code:                 String,
    pub name:                 String,
    pub risk:                 RiskClassification,
    pub owner_id:             Option<String>,
    pub period_end:           Option<NaiveDate>,
    pub due_date:             Option<NaiveDate>,
    pub matched_execution_id: Option<ExecutionId>,
    pub result_numeric:       Option<f64>,
    pub executed_at:          Option<DateTime<Utc>>,
}

/// Most urgent due date first, then higher risk, then the most recent
/// execution, then entity id.
fn critical_order(a: &CriticalEntry, b: &CriticalEntry) -> Ordering {
    let due = match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None)    => Ordering::Less,
        (None, Some(_))    => Ordering::Greater,
        (None, None)       => Ordering::Equal,
    };
    due.then_with(|| b.risk.rank().cmp(&a.risk.rank()))
        .then_with(|| b.executed_at.cmp(&a.executed_at))
        .then_with(|| a.entity_id.cmp(&b.entity_id))
}

pub fn critical_entities(
    entities: &[TrackedEntity],
    current:  &[EntityStatus],
    config:   &EngineConfig,
) -> Vec<CriticalEntry> {
    let by_id: HashMap<&str, &TrackedEntity> =
        entities.iter().map(|e| (e.id.as_str(), e)).collect();

    let mut entries: Vec<CriticalEntry> = current
        .iter()
        .filter(|s| s.status == Status::OutOfStandard)
        .filter_map(|s| {
            let entity = by_id.get(s.entity_id.as_str()).copied();
            if entity.is_none() {
                log::warn!("status for unknown entity {}; left off the critical list", s.entity_id);
            }
            entity.map(|e| (e, s))
        })
        .filter(|(e, _)| config.critical_risk_levels.contains(&e.risk))
        .map(|(e, s)| CriticalEntry {
            entity_id:            e.id.clone(),
            kind:                 e.kind,
            control_id:           e.control_id.clone(),
            code:                 e.code.clone(),
            name:                 e.name.clone(),
            risk:                 e.risk,
            owner_id:             e.owner_id.clone(),
            period_end:           s.period_end(),
            due_date:             s.due_date(),
            matched_execution_id: s.matched_execution_id.clone(),
            result_numeric:       s.result_numeric,
            executed_at:          s.executed_at,
        })
        .collect();

    entries.sort_by(critical_order);
    entries.truncate(config.critical_page_size);
    entries
}

// ── Summary ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub as_of:           AsOf,
    pub total_entities:  u64,
    pub counts:          StatusCounts,
    pub in_target_pct:   f64,
    pub pending_count:   u64,
    pub overdue_count:   u64,
    /// Matched executions still sitting in the GRC review queue.
    pub awaiting_review: u64,
    /// Oldest month first; the last point is the as-of month.
    pub trend:           Vec<TrendPoint>,
    pub critical:        Vec<CriticalEntry>,
}

/// Fold the current statuses and the trend into one summary.
pub fn summarize(
    as_of:    AsOf,
    entities: &[TrackedEntity],
    current:  &[EntityStatus],
    trend:    Vec<TrendPoint>,
    config:   &EngineConfig,
) -> DashboardSummary {
    let counts = StatusCounts::from_statuses(current);
    let awaiting_review = current
        .iter()
        .filter_map(|s| s.workflow_status.as_deref())
        .filter(|w| config.review_queue_states.iter().any(|q| q == w))
        .count() as u64;

    DashboardSummary {
        as_of,
        total_entities: counts.total(),
        counts,
        in_target_pct: counts.in_target_pct(),
        pending_count: counts.pending,
        overdue_count: counts.overdue,
        awaiting_review,
        trend,
        critical: critical_entities(entities, current, config),
    }
}
