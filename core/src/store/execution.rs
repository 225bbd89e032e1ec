//! Store methods for the execution history.

use super::SqliteStore;
use crate::{
    error::EngineResult,
    model::{AutoStatus, EntityKind, Execution},
};
use chrono::NaiveDate;
use rusqlite::{params, Row};

const EXECUTION_COLUMNS: &str =
    "execution_id, kpi_id, control_id, period_start, period_end,
     result_numeric, auto_status, workflow_status, created_at";

fn execution_from_row(row: &Row<'_>) -> rusqlite::Result<Execution> {
    let auto_status: Option<String> = row.get(6)?;
    let execution_id: String = row.get(0)?;
    let parsed = auto_status.as_deref().and_then(AutoStatus::parse);
    if parsed.is_none() && auto_status.is_some() {
        log::debug!("execution {execution_id}: unrecognized auto_status {auto_status:?}");
    }
    Ok(Execution {
        id:              execution_id,
        kpi_id:          row.get(1)?,
        control_id:      row.get(2)?,
        period_start:    row.get(3)?,
        period_end:      row.get(4)?,
        result_numeric:  row.get(5)?,
        auto_status:     parsed,
        workflow_status: row.get(7)?,
        created_at:      row.get(8)?,
    })
}

impl SqliteStore {
    pub fn insert_execution(&self, execution: &Execution) -> EngineResult<()> {
        self.conn().execute(
            "INSERT INTO execution
             (execution_id, kpi_id, control_id, period_start, period_end,
              result_numeric, auto_status, workflow_status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                execution.id,
                execution.kpi_id,
                execution.control_id,
                execution.period_start,
                execution.period_end,
                execution.result_numeric,
                execution.auto_status.map(AutoStatus::as_str),
                execution.workflow_status,
                execution.created_at,
            ],
        )?;
        Ok(())
    }

    /// Insert an execution whose auto status is stored verbatim, even if
    /// it is not one of the known values. Mirrors rows written by older
    /// submission flows.
    pub fn insert_execution_raw_status(
        &self,
        execution:   &Execution,
        auto_status: Option<&str>,
    ) -> EngineResult<()> {
        self.conn().execute(
            "INSERT INTO execution
             (execution_id, kpi_id, control_id, period_start, period_end,
              result_numeric, auto_status, workflow_status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                execution.id,
                execution.kpi_id,
                execution.control_id,
                execution.period_start,
                execution.period_end,
                execution.result_numeric,
                auto_status,
                execution.workflow_status,
                execution.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn executions_for(
        &self,
        kind:       EntityKind,
        entity_id:  &str,
        period_end: Option<NaiveDate>,
    ) -> EngineResult<Vec<Execution>> {
        let column = match kind {
            EntityKind::Control => "control_id",
            EntityKind::Kpi     => "kpi_id",
        };
        let conn = self.conn();
        let rows = match period_end {
            Some(end) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {EXECUTION_COLUMNS} FROM execution
                     WHERE {column} = ?1 AND period_end = ?2
                     ORDER BY created_at ASC, execution_id ASC"
                ))?;
                let rows = stmt.query_map(params![entity_id, end], execution_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {EXECUTION_COLUMNS} FROM execution
                     WHERE {column} = ?1
                     ORDER BY period_end ASC, created_at ASC, execution_id ASC"
                ))?;
                let rows = stmt.query_map(params![entity_id], execution_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    /// Total executions on record (for tests and the runner summary).
    pub fn execution_count(&self) -> EngineResult<i64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM execution",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
