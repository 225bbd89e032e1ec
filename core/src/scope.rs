//! Visibility scoping — which controls a caller may see.
//!
//! RULE: Scope is resolved once per request, before evaluation, and
//! the pipeline never branches on it. Admin, one-team and many-team
//! callers all go through `ScopeFilter::visible_entity_ids`.
//!
//! KPIs are visible exactly when their control is.

use crate::{error::EngineResult, types::EntityId};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibleSet {
    All,
    Only(BTreeSet<EntityId>),
}

impl VisibleSet {
    pub fn contains(&self, control_id: &str) -> bool {
        match self {
            VisibleSet::All       => true,
            VisibleSet::Only(ids) => ids.contains(control_id),
        }
    }
}

/// Supplies the set of control ids visible to the current caller.
/// Failures abort the whole evaluation request; they are not retried.
pub trait ScopeFilter: Sync {
    fn visible_entity_ids(&self) -> EngineResult<VisibleSet>;
}

/// No restriction (administrators, GRC team).
#[derive(Debug, Clone, Copy, Default)]
pub struct Unscoped;

impl ScopeFilter for Unscoped {
    fn visible_entity_ids(&self) -> EngineResult<VisibleSet> {
        Ok(VisibleSet::All)
    }
}

/// A precomputed id set, e.g. resolved by the caller's own session layer.
#[derive(Debug, Clone, Default)]
pub struct FixedScope {
    ids: BTreeSet<EntityId>,
}

impl FixedScope {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<EntityId>,
    {
        Self { ids: ids.into_iter().map(Into::into).collect() }
    }
}

impl ScopeFilter for FixedScope {
    fn visible_entity_ids(&self) -> EngineResult<VisibleSet> {
        Ok(VisibleSet::Only(self.ids.clone()))
    }
}
