//! Store methods for the control and KPI catalog.

use super::SqliteStore;
use crate::{
    error::EngineResult,
    model::{Control, Kpi, RiskClassification},
};
use rusqlite::{params, Row};

const CONTROL_COLUMNS: &str =
    "control_id, code, name, frequency, risk_classification, owner_id";

fn control_from_row(row: &Row<'_>) -> rusqlite::Result<Control> {
    let risk: String = row.get(4)?;
    Ok(Control {
        id:                  row.get(0)?,
        code:                row.get(1)?,
        name:                row.get(2)?,
        frequency:           row.get(3)?,
        risk_classification: RiskClassification::parse_lenient(&risk),
        owner_id:            row.get(5)?,
    })
}

impl SqliteStore {
    pub fn insert_control(&self, control: &Control) -> EngineResult<()> {
        self.conn().execute(
            "INSERT INTO control
             (control_id, code, name, frequency, risk_classification, owner_id, archived)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
            params![
                control.id,
                control.code,
                control.name,
                control.frequency,
                control.risk_classification.as_str(),
                control.owner_id,
            ],
        )?;
        Ok(())
    }

    pub fn insert_kpi(&self, kpi: &Kpi) -> EngineResult<()> {
        self.conn().execute(
            "INSERT INTO kpi (kpi_id, control_id, code, name) VALUES (?1, ?2, ?3, ?4)",
            params![kpi.id, kpi.control_id, kpi.code, kpi.name],
        )?;
        Ok(())
    }

    /// Soft-archive a control. Archived controls are never listed.
    pub fn archive_control(&self, control_id: &str) -> EngineResult<()> {
        self.conn().execute(
            "UPDATE control SET archived = 1 WHERE control_id = ?1",
            params![control_id],
        )?;
        Ok(())
    }

    /// All non-archived controls, ordered by id.
    pub fn active_controls(&self) -> EngineResult<Vec<Control>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONTROL_COLUMNS} FROM control WHERE archived = 0 ORDER BY control_id ASC"
        ))?;
        let rows = stmt.query_map([], control_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn kpis_for_control(&self, control_id: &str) -> EngineResult<Vec<Kpi>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT kpi_id, control_id, code, name FROM kpi
             WHERE control_id = ?1
             ORDER BY kpi_id ASC",
        )?;
        let rows = stmt.query_map(params![control_id], |row| {
            Ok(Kpi {
                id:         row.get(0)?,
                control_id: row.get(1)?,
                code:       row.get(2)?,
                name:       row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Number of active controls (for tests and the runner summary).
    pub fn control_count(&self) -> EngineResult<i64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM control WHERE archived = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
