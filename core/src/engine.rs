//! The status engine — the one entry point the dashboard, the control
//! detail page and the KPI catalog all call.
//!
//! PIPELINE (per entity, fixed order):
//!   1. Period      — resolve the expected period, or take the caller's override
//!   2. Match       — pick the authoritative execution for that period end
//!   3. Classify    — combine period, execution and applicability into a status
//!
//! RULES:
//!   - The as-of date is always passed in. The engine never reads the clock.
//!   - Entities are evaluated independently on a bounded worker pool.
//!     There is no shared mutable state between evaluations.
//!   - Pool results are sorted before they are aggregated or returned.

use crate::{
    aggregator::{self, DashboardSummary, StatusCounts, TrendPoint},
    classifier::{self, ClassifierInput},
    clock::AsOf,
    config::EngineConfig,
    error::{EngineError, EngineResult},
    matcher,
    model::{Control, EntityKind, EntityStatus, Execution, TrackedEntity},
    period::{self, ExpectedPeriod},
    scope::ScopeFilter,
    source::ComplianceSource,
};
use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A control together with the status of each of its KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlDetail {
    pub control:    EntityStatus,
    pub kpis:       Vec<EntityStatus>,
    pub kpi_counts: StatusCounts,
}

pub struct StatusEngine<'s, S: ComplianceSource> {
    source: &'s S,
    config: EngineConfig,
    pool:   rayon::ThreadPool,
}

impl<'s, S: ComplianceSource> StatusEngine<'s, S> {
    pub fn new(source: &'s S, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_concurrency)
            .thread_name(|i| format!("grc-eval-{i}"))
            .build()?;
        Ok(Self { source, config, pool })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Entity set ───────────────────────────────────────────────

    /// Visible controls and their KPIs, frequency resolved once here.
    /// Sorted by kind (controls first), then id.
    pub fn load_entities(&self, scope: &dyn ScopeFilter) -> EngineResult<Vec<TrackedEntity>> {
        let controls = self.source.list_visible_controls(scope)?;

        let groups: Vec<Vec<TrackedEntity>> = self.pool.install(|| {
            controls
                .par_iter()
                .map(|c| {
                    let control = TrackedEntity::from_control(c);
                    let kpis = self.source.list_kpis_for_control(&c.id)?;
                    let mut group = Vec::with_capacity(kpis.len() + 1);
                    group.extend(kpis.iter().map(|k| TrackedEntity::from_kpi(k, &control)));
                    group.push(control);
                    Ok(group)
                })
                .collect::<EngineResult<Vec<_>>>()
        })?;

        let mut entities: Vec<TrackedEntity> = groups.into_iter().flatten().collect();
        entities.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.id.cmp(&b.id)));
        log::debug!("loaded {} visible entities", entities.len());
        Ok(entities)
    }

    /// One visible control or KPI by id. Entities outside `scope`
    /// are reported as absent, exactly like unknown ids.
    pub fn find_entity(
        &self,
        scope:     &dyn ScopeFilter,
        entity_id: &str,
    ) -> EngineResult<Option<TrackedEntity>> {
        Ok(self.load_entities(scope)?.into_iter().find(|e| e.id == entity_id))
    }

    /// One visible control by id, for the control-detail page.
    pub fn find_control(
        &self,
        scope:      &dyn ScopeFilter,
        control_id: &str,
    ) -> EngineResult<Option<Control>> {
        Ok(self
            .source
            .list_visible_controls(scope)?
            .into_iter()
            .find(|c| c.id == control_id))
    }

    // ── Single entity ────────────────────────────────────────────

    /// Status of one entity as of `as_of`.
    ///
    /// `override_period_end` evaluates a specific past period (the last
    /// day of a month) instead of the one the resolver would pick.
    pub fn evaluate_entity(
        &self,
        entity:              &TrackedEntity,
        as_of:               AsOf,
        override_period_end: Option<NaiveDate>,
    ) -> EngineResult<EntityStatus> {
        let period = self.expected_period(entity, as_of, override_period_end)?;
        let evaluated_month = classifier::evaluated_month(as_of, override_period_end);

        // Nothing to fetch for on-demand entities or periods not collected this month.
        let executions = match &period {
            Some(p) if self.config.applicability.applies(p, evaluated_month) => {
                self.source.list_executions(entity.kind, &entity.id, Some(p.period_end))?
            }
            _ => Vec::new(),
        };

        let status = self.classify(entity, as_of, evaluated_month, period, &executions);
        log::debug!(
            "{} {} as of {as_of}: {} (period end {:?})",
            entity.kind, entity.id, status.status, status.period_end()
        );
        Ok(status)
    }

    /// A control and each of its KPIs, for the control-detail page.
    pub fn evaluate_control_detail(
        &self,
        control:             &Control,
        as_of:               AsOf,
        override_period_end: Option<NaiveDate>,
    ) -> EngineResult<ControlDetail> {
        let tracked = TrackedEntity::from_control(control);
        let kpis: Vec<TrackedEntity> = self
            .source
            .list_kpis_for_control(&control.id)?
            .iter()
            .map(|k| TrackedEntity::from_kpi(k, &tracked))
            .collect();

        let control_status = self.evaluate_entity(&tracked, as_of, override_period_end)?;
        let kpi_statuses = self.evaluate_all(&kpis, as_of, override_period_end)?;

        Ok(ControlDetail {
            control:    control_status,
            kpi_counts: StatusCounts::from_statuses(&kpi_statuses),
            kpis:       kpi_statuses,
        })
    }

    /// Evaluate many entities concurrently, sorted by kind then id.
    pub fn evaluate_all(
        &self,
        entities:            &[TrackedEntity],
        as_of:               AsOf,
        override_period_end: Option<NaiveDate>,
    ) -> EngineResult<Vec<EntityStatus>> {
        let mut statuses = self.pool.install(|| {
            entities
                .par_iter()
                .map(|e| self.evaluate_entity(e, as_of, override_period_end))
                .collect::<EngineResult<Vec<_>>>()
        })?;
        sort_statuses(&mut statuses);
        Ok(statuses)
    }

    // ── Portfolio ────────────────────────────────────────────────

    /// Dashboard summary for `entities` as of `as_of`.
    ///
    /// The counts, the critical list and the last trend point all come
    /// from the same evaluation of the as-of month.
    pub fn evaluate_portfolio(
        &self,
        entities: &[TrackedEntity],
        as_of:    AsOf,
    ) -> EngineResult<DashboardSummary> {
        let (trend, current) = self.trend(entities, as_of, self.config.trend_months)?;

        let summary = aggregator::summarize(as_of, entities, &current, trend, &self.config);
        log::info!(
            "portfolio as of {as_of}: {} entities, {:.2}% in target, {} overdue, {} critical",
            summary.total_entities,
            summary.in_target_pct,
            summary.overdue_count,
            summary.critical.len()
        );
        Ok(summary)
    }

    /// One trend point per month for the `months_back` months ending
    /// with the as-of month, oldest first. `months_back` of 0 is empty.
    pub fn evaluate_trend(
        &self,
        entities:    &[TrackedEntity],
        as_of:       AsOf,
        months_back: u32,
    ) -> EngineResult<Vec<TrendPoint>> {
        let (trend, _) = self.trend(entities, as_of, months_back)?;
        Ok(trend)
    }

    /// Resolve the scope, load its entities of `kind` and summarize them.
    pub fn evaluate_dashboard(
        &self,
        scope: &dyn ScopeFilter,
        kind:  EntityKind,
        as_of: AsOf,
    ) -> EngineResult<DashboardSummary> {
        let entities: Vec<TrackedEntity> = self
            .load_entities(scope)?
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect();
        self.evaluate_portfolio(&entities, as_of)
    }

    // ── Internals ────────────────────────────────────────────────

    fn expected_period(
        &self,
        entity:              &TrackedEntity,
        as_of:               AsOf,
        override_period_end: Option<NaiveDate>,
    ) -> EngineResult<Option<ExpectedPeriod>> {
        let Some(end) = override_period_end else {
            return period::resolve(entity.cadence, as_of);
        };
        AsOf::new(end)?;
        let is_month_end = end.succ_opt().is_some_and(|next| next.day() == 1);
        if !is_month_end {
            return Err(EngineError::InvalidOverridePeriod {
                period_end: end,
                cadence:    entity.cadence.to_string(),
            });
        }
        match entity.cadence.class() {
            Some(class) => ExpectedPeriod::for_period_end(class, end).map(Some),
            None        => Ok(None),
        }
    }

    fn classify(
        &self,
        entity:          &TrackedEntity,
        as_of:           AsOf,
        evaluated_month: u32,
        period:          Option<ExpectedPeriod>,
        executions:      &[Execution],
    ) -> EntityStatus {
        let execution = period
            .as_ref()
            .and_then(|p| matcher::select_for(entity.kind, executions, p.period_end));
        classifier::classify(ClassifierInput {
            entity_id: &entity.id,
            kind: entity.kind,
            period,
            execution,
            as_of,
            evaluated_month,
            applicability: self.config.applicability,
        })
    }

    /// Trend points for `count` months ending with `as_of`, oldest first,
    /// plus the statuses behind the last point. Months before the
    /// supported calendar window have no data and read as zero activity.
    fn trend(
        &self,
        entities: &[TrackedEntity],
        as_of:    AsOf,
        count:    u32,
    ) -> EngineResult<(Vec<TrendPoint>, Vec<EntityStatus>)> {
        let mut before_window = Vec::new();
        let mut in_window = Vec::new();
        for k in (0..count).rev() {
            match as_of.months_back(k) {
                Ok(month)                                 => in_window.push(month),
                Err(EngineError::DateOutOfRange { date }) => before_window.push(date),
                Err(e)                                    => return Err(e),
            }
        }

        let mut by_month = self.evaluate_months(entities, &in_window)?;
        let mut points: Vec<TrendPoint> =
            before_window.into_iter().map(TrendPoint::empty).collect();
        points.extend(
            in_window
                .iter()
                .zip(by_month.iter())
                .map(|(m, statuses)| TrendPoint::from_statuses(*m, statuses)),
        );
        let current = by_month.pop().unwrap_or_default();
        Ok((points, current))
    }

    /// Statuses per month (outer, same order as `months`), each sorted.
    ///
    /// Each entity's history is read once and matched against every
    /// month locally, so the store sees one read per entity rather than
    /// one per entity per month.
    fn evaluate_months(
        &self,
        entities: &[TrackedEntity],
        months:   &[AsOf],
    ) -> EngineResult<Vec<Vec<EntityStatus>>> {
        let per_entity: Vec<Vec<EntityStatus>> = self.pool.install(|| {
            entities
                .par_iter()
                .map(|e| self.entity_history(e, months))
                .collect::<EngineResult<Vec<_>>>()
        })?;

        let mut by_month: Vec<Vec<EntityStatus>> =
            months.iter().map(|_| Vec::with_capacity(entities.len())).collect();
        for history in per_entity {
            for (slot, status) in by_month.iter_mut().zip(history) {
                slot.push(status);
            }
        }
        for statuses in &mut by_month {
            sort_statuses(statuses);
        }
        Ok(by_month)
    }

    fn entity_history(
        &self,
        entity: &TrackedEntity,
        months: &[AsOf],
    ) -> EngineResult<Vec<EntityStatus>> {
        let executions = match entity.cadence.class() {
            Some(_) => self.source.list_executions(entity.kind, &entity.id, None)?,
            None    => Vec::new(),
        };
        months
            .iter()
            .map(|m| {
                let period = period::resolve(entity.cadence, *m)?;
                Ok(self.classify(entity, *m, m.month(), period, &executions))
            })
            .collect()
    }
}

fn sort_statuses(statuses: &mut [EntityStatus]) {
    statuses.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.entity_id.cmp(&b.entity_id)));
}
