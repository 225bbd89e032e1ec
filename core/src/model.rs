//! Catalog and execution facts, and the per-entity status value.
//!
//! Controls, KPIs and executions arrive from the read contract in
//! `source.rs`. `TrackedEntity` is the engine's own view of a control or
//! KPI: frequency already resolved to a `Cadence`, risk already parsed.

use crate::{
    frequency::{self, Cadence},
    period::ExpectedPeriod,
    types::{EntityId, ExecutionId},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskClassification {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskClassification {
    /// Higher is more severe. Used as the "priority" in ranked lists.
    pub fn rank(self) -> u8 {
        match self {
            RiskClassification::Low      => 1,
            RiskClassification::Medium   => 2,
            RiskClassification::High     => 3,
            RiskClassification::Critical => 4,
        }
    }

    /// Parse catalog text. Unknown values read as medium.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "low" | "baixo" | "baixa"          => RiskClassification::Low,
            "medium" | "moderate" | "medio"
            | "média" | "media" | "médio"      => RiskClassification::Medium,
            "high" | "alto" | "alta"           => RiskClassification::High,
            "critical" | "critico" | "crítico" => RiskClassification::Critical,
            other => {
                log::warn!("Unknown risk classification '{other}'; treating as medium");
                RiskClassification::Medium
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskClassification::Low      => "low",
            RiskClassification::Medium   => "medium",
            RiskClassification::High     => "high",
            RiskClassification::Critical => "critical",
        }
    }
}

/// A catalog control, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub id:                  EntityId,
    pub code:                String,
    pub name:                String,
    /// Raw catalog text; resolved once by `TrackedEntity::from_control`.
    pub frequency:           String,
    pub risk_classification: RiskClassification,
    pub owner_id:            Option<String>,
}

/// A KPI. Belongs to exactly one control and reports at its cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub id:         EntityId,
    pub control_id: EntityId,
    pub code:       String,
    pub name:       String,
}

// ── Executions ───────────────────────────────────────────────────────────────

/// Outcome pre-computed by the submission flow. Not derived here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoStatus {
    InTarget,
    Warning,
    OutOfTarget,
    NotApplicable,
}

impl AutoStatus {
    /// Parse stored text. `None` for anything outside the four states.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "in_target"      => Some(AutoStatus::InTarget),
            "warning"        => Some(AutoStatus::Warning),
            "out_of_target"  => Some(AutoStatus::OutOfTarget),
            "not_applicable" => Some(AutoStatus::NotApplicable),
            _                => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AutoStatus::InTarget      => "in_target",
            AutoStatus::Warning       => "warning",
            AutoStatus::OutOfTarget   => "out_of_target",
            AutoStatus::NotApplicable => "not_applicable",
        }
    }
}

/// One logged execution. Immutable; resubmission creates a new row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id:              ExecutionId,
    pub kpi_id:          Option<EntityId>,
    pub control_id:      EntityId,
    pub period_start:    NaiveDate,
    pub period_end:      NaiveDate,
    pub result_numeric:  Option<f64>,
    pub auto_status:     Option<AutoStatus>,
    pub workflow_status: String,
    pub created_at:      DateTime<Utc>,
}

// ── Engine view ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Control,
    Kpi,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Control => f.write_str("control"),
            EntityKind::Kpi     => f.write_str("kpi"),
        }
    }
}

/// A control or KPI ready for evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub id:         EntityId,
    pub kind:       EntityKind,
    pub control_id: EntityId,
    pub code:       String,
    pub name:       String,
    pub cadence:    Cadence,
    pub risk:       RiskClassification,
    pub owner_id:   Option<String>,
}

impl TrackedEntity {
    pub fn from_control(control: &Control) -> Self {
        Self {
            id:         control.id.clone(),
            kind:       EntityKind::Control,
            control_id: control.id.clone(),
            code:       control.code.clone(),
            name:       control.name.clone(),
            cadence:    frequency::normalize(&control.frequency),
            risk:       control.risk_classification,
            owner_id:   control.owner_id.clone(),
        }
    }

    /// A KPI inherits cadence, risk and owner from its control.
    pub fn from_kpi(kpi: &Kpi, control: &TrackedEntity) -> Self {
        Self {
            id:         kpi.id.clone(),
            kind:       EntityKind::Kpi,
            control_id: control.control_id.clone(),
            code:       kpi.code.clone(),
            name:       kpi.name.clone(),
            cadence:    control.cadence,
            risk:       control.risk,
            owner_id:   control.owner_id.clone(),
        }
    }
}

// ── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Effective,
    Warning,
    OutOfStandard,
    Pending,
    Overdue,
    NotApplicable,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Effective,
        Status::Warning,
        Status::OutOfStandard,
        Status::Pending,
        Status::Overdue,
        Status::NotApplicable,
    ];

    /// Status an execution's pre-computed outcome maps to. A missing or
    /// unrecognized outcome reads as not yet assessed.
    pub fn from_auto_status(auto: Option<AutoStatus>) -> Self {
        match auto {
            Some(AutoStatus::InTarget)      => Status::Effective,
            Some(AutoStatus::Warning)       => Status::Warning,
            Some(AutoStatus::OutOfTarget)   => Status::OutOfStandard,
            Some(AutoStatus::NotApplicable) => Status::NotApplicable,
            None                            => Status::Pending,
        }
    }

    /// Whether the entity counts toward "in target" percentages.
    pub fn is_tracked(self) -> bool {
        self != Status::NotApplicable
    }

    /// Higher needs attention sooner.
    pub fn urgency_rank(self) -> u8 {
        match self {
            Status::OutOfStandard => 5,
            Status::Overdue       => 4,
            Status::Warning       => 3,
            Status::Pending       => 2,
            Status::Effective     => 1,
            Status::NotApplicable => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Effective     => "effective",
            Status::Warning       => "warning",
            Status::OutOfStandard => "out_of_standard",
            Status::Pending       => "pending",
            Status::Overdue       => "overdue",
            Status::NotApplicable => "not_applicable",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The evaluated status of one entity for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStatus {
    pub entity_id:            EntityId,
    pub kind:                 EntityKind,
    pub period:               Option<ExpectedPeriod>,
    pub status:               Status,
    pub matched_execution_id: Option<ExecutionId>,
    pub result_numeric:       Option<f64>,
    pub workflow_status:      Option<String>,
    pub executed_at:          Option<DateTime<Utc>>,
}

impl EntityStatus {
    pub fn period_end(&self) -> Option<NaiveDate> {
        self.period.map(|p| p.period_end)
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.period.map(|p| p.due_date)
    }
}
