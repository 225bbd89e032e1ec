//! SQLite persistence layer — reference implementation of the read contract.
//!
//! RULE: Only store/ talks to the database.
//! The engine reads through `ComplianceSource`; it never executes SQL.
//!
//! The connection is held behind a mutex so one store can be shared
//! by every worker in the evaluation pool.

use crate::{
    error::EngineResult,
    model::{Control, EntityKind, Execution, Kpi},
    scope::ScopeFilter,
    source::ComplianceSource,
};
use chrono::NaiveDate;
use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;

mod catalog;
mod execution;
mod team;

pub use team::TeamScope;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn()
            .execute_batch(include_str!("../../../migrations/001_compliance.sql"))?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}

impl ComplianceSource for SqliteStore {
    fn list_visible_controls(&self, scope: &dyn ScopeFilter) -> EngineResult<Vec<Control>> {
        let visible = scope.visible_entity_ids()?;
        let controls = self
            .active_controls()?
            .into_iter()
            .filter(|c| visible.contains(&c.id))
            .collect();
        Ok(controls)
    }

    fn list_kpis_for_control(&self, control_id: &str) -> EngineResult<Vec<Kpi>> {
        self.kpis_for_control(control_id)
    }

    fn list_executions(
        &self,
        kind:       EntityKind,
        entity_id:  &str,
        period_end: Option<NaiveDate>,
    ) -> EngineResult<Vec<Execution>> {
        self.executions_for(kind, entity_id, period_end)
    }
}
