//! The read contract the engine consumes.
//!
//! RULE: The engine never talks to storage directly. Everything it
//! knows about controls, KPIs and executions comes through this trait.
//! `store::SqliteStore` is the reference implementation.

use crate::{
    error::EngineResult,
    model::{Control, EntityKind, Execution, Kpi},
    scope::ScopeFilter,
};
use chrono::NaiveDate;

/// Read-only access to the catalog and execution history.
///
/// Implementations must be shareable across the evaluation pool.
pub trait ComplianceSource: Sync {
    /// Active controls visible under `scope`, ordered by id.
    fn list_visible_controls(&self, scope: &dyn ScopeFilter) -> EngineResult<Vec<Control>>;

    /// KPIs owned by one control, ordered by id.
    fn list_kpis_for_control(&self, control_id: &str) -> EngineResult<Vec<Kpi>>;

    /// Executions reported for an entity, optionally only those for
    /// one period end. All matching rows are returned; tie-breaking
    /// between resubmissions is the matcher's job.
    ///
    /// - `EntityKind::Control`: every execution logged against the control,
    ///   its KPIs' rows included.
    /// - `EntityKind::Kpi`:     executions logged against that KPI.
    fn list_executions(
        &self,
        kind:       EntityKind,
        entity_id:  &str,
        period_end: Option<NaiveDate>,
    ) -> EngineResult<Vec<Execution>>;
}
