//! Team-based visibility backed by the `control_team` table.

use super::SqliteStore;
use crate::{
    error::{EngineError, EngineResult},
    scope::{ScopeFilter, VisibleSet},
    types::TeamId,
};
use rusqlite::params;
use std::collections::BTreeSet;

/// Controls linked to any of the caller's teams.
/// A caller in no team sees nothing.
pub struct TeamScope<'a> {
    store:    &'a SqliteStore,
    team_ids: Vec<TeamId>,
}

impl<'a> TeamScope<'a> {
    pub fn new(store: &'a SqliteStore, team_ids: Vec<TeamId>) -> Self {
        Self { store, team_ids }
    }
}

impl ScopeFilter for TeamScope<'_> {
    fn visible_entity_ids(&self) -> EngineResult<VisibleSet> {
        let mut ids = BTreeSet::new();
        for team_id in &self.team_ids {
            let linked = self.store.controls_for_team(team_id).map_err(|e| {
                EngineError::ScopeResolution { reason: format!("team {team_id}: {e}") }
            })?;
            ids.extend(linked);
        }
        Ok(VisibleSet::Only(ids))
    }
}

impl SqliteStore {
    pub fn link_control_team(&self, control_id: &str, team_id: &str) -> EngineResult<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO control_team (control_id, team_id) VALUES (?1, ?2)",
            params![control_id, team_id],
        )?;
        Ok(())
    }

    pub fn controls_for_team(&self, team_id: &str) -> EngineResult<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT control_id FROM control_team WHERE team_id = ?1 ORDER BY control_id ASC",
        )?;
        let rows = stmt.query_map(params![team_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
