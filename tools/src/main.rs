//! grc-runner: headless runner for the compliance status engine.
//!
//! Usage:
//!   grc-runner --db grc.db --as-of 2024-02-20
//!   grc-runner --db grc.db --team risk --team finance --kind kpi
//!   grc-runner --demo --as-of 2024-02-20 --json
//!   grc-runner --db grc.db --ipc-mode

use anyhow::Result;
use chrono::{NaiveDate, TimeZone, Utc};
use grc_core::{
    aggregator::DashboardSummary,
    command::DashboardQuery,
    model::{AutoStatus, Control, EntityKind, Execution, Kpi, RiskClassification, TrackedEntity},
    scope::{ScopeFilter, Unscoped},
    store::{SqliteStore, TeamScope},
    AsOf, EngineConfig, StatusEngine,
};
use std::env;
use std::io::{self, BufRead, Write};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let demo = args.iter().any(|a| a == "--demo");
    let as_json = args.iter().any(|a| a == "--json");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let teams = flag_values(&args, "--team");
    let kind = match flag_value(&args, "--kind") {
        Some("kpi") => EntityKind::Kpi,
        _           => EntityKind::Control,
    };
    let as_of = match flag_value(&args, "--as-of") {
        Some(s) => AsOf::parse(s)?,
        None    => AsOf::today_utc()?,
    };
    let config = match flag_value(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None       => EngineConfig::default(),
    };

    let store = SqliteStore::open(db)?;
    store.migrate()?;
    if demo {
        load_demo(&store)?;
    }

    let engine = StatusEngine::new(&store, config)?;

    if ipc_mode {
        return run_ipc_loop(&engine, &store, as_of);
    }

    if !as_json {
        println!("grc-runner");
        println!("  db:        {db}");
        println!("  as of:     {as_of}");
        println!("  kind:      {kind}");
        println!("  teams:     {}", if teams.is_empty() { "(all)".to_string() } else { teams.join(", ") });
        println!("  controls:  {}", store.control_count()?);
        println!("  executions: {}", store.execution_count()?);
        println!();
    }

    let summary = if teams.is_empty() {
        engine.evaluate_dashboard(&Unscoped, kind, as_of)?
    } else {
        let scope = TeamScope::new(&store, teams.iter().map(|t| t.to_string()).collect());
        engine.evaluate_dashboard(&scope, kind, as_of)?
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

// ── IPC ──────────────────────────────────────────────────────────────────────

fn run_ipc_loop(
    engine:        &StatusEngine<'_, SqliteStore>,
    store:         &SqliteStore,
    default_as_of: AsOf,
) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let query: DashboardQuery = match serde_json::from_str(&buffer) {
            Ok(q) => q,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        if query == DashboardQuery::Quit {
            break;
        }

        // Evaluation errors go back to the caller; they do not end the session.
        let reply = match answer(engine, store, default_as_of, query) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("query failed: {e:#}");
                serde_json::json!({ "error": e.to_string() })
            }
        };
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn answer(
    engine:        &StatusEngine<'_, SqliteStore>,
    store:         &SqliteStore,
    default_as_of: AsOf,
    query:         DashboardQuery,
) -> Result<serde_json::Value> {
    let value = match query {
        DashboardQuery::Portfolio { as_of, kind, teams } => {
            let as_of = as_of_or(as_of.as_deref(), default_as_of)?;
            let summary = with_scope(store, teams, |scope| {
                Ok(engine.evaluate_dashboard(scope, kind, as_of)?)
            })?;
            serde_json::to_value(summary)?
        }
        DashboardQuery::Trend { as_of, kind, months_back, teams } => {
            let as_of = as_of_or(as_of.as_deref(), default_as_of)?;
            let months_back = months_back.unwrap_or(engine.config().trend_months);
            let trend = with_scope(store, teams, |scope| {
                let entities = of_kind(engine.load_entities(scope)?, kind);
                Ok(engine.evaluate_trend(&entities, as_of, months_back)?)
            })?;
            serde_json::to_value(trend)?
        }
        DashboardQuery::Entity { entity_id, as_of, period_end, teams } => {
            let as_of = as_of_or(as_of.as_deref(), default_as_of)?;
            let period_end = period_end.as_deref().map(parse_date).transpose()?;
            let status = with_scope(store, teams, |scope| {
                let entity = engine
                    .find_entity(scope, &entity_id)?
                    .ok_or_else(|| anyhow::anyhow!("Entity '{entity_id}' not found"))?;
                Ok(engine.evaluate_entity(&entity, as_of, period_end)?)
            })?;
            serde_json::to_value(status)?
        }
        DashboardQuery::ControlDetail { control_id, as_of, period_end, teams } => {
            let as_of = as_of_or(as_of.as_deref(), default_as_of)?;
            let period_end = period_end.as_deref().map(parse_date).transpose()?;
            let detail = with_scope(store, teams, |scope| {
                let control = engine
                    .find_control(scope, &control_id)?
                    .ok_or_else(|| anyhow::anyhow!("Control '{control_id}' not found"))?;
                Ok(engine.evaluate_control_detail(&control, as_of, period_end)?)
            })?;
            serde_json::to_value(detail)?
        }
        DashboardQuery::Quit => serde_json::Value::Null,
    };
    Ok(value)
}

fn with_scope<T>(
    store: &SqliteStore,
    teams: Option<Vec<String>>,
    f:     impl FnOnce(&dyn ScopeFilter) -> Result<T>,
) -> Result<T> {
    match teams {
        Some(team_ids) => f(&TeamScope::new(store, team_ids)),
        None           => f(&Unscoped),
    }
}

fn of_kind(entities: Vec<TrackedEntity>, kind: EntityKind) -> Vec<TrackedEntity> {
    entities.into_iter().filter(|e| e.kind == kind).collect()
}

fn as_of_or(value: Option<&str>, default: AsOf) -> Result<AsOf> {
    Ok(value.map(AsOf::parse).transpose()?.unwrap_or(default))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    Ok(AsOf::parse(value)?.date())
}

// ── Output ───────────────────────────────────────────────────────────────────

fn print_summary(summary: &DashboardSummary) {
    let c = &summary.counts;
    println!("=== STATUS SUMMARY ({}) ===", summary.as_of);
    println!("  entities:        {}", summary.total_entities);
    println!("  effective:       {}", c.effective);
    println!("  warning (gap):   {}", c.warning);
    println!("  out of standard: {}", c.out_of_standard);
    println!("  pending:         {}", c.pending);
    println!("  overdue:         {}", c.overdue);
    println!("  not applicable:  {}", c.not_applicable);
    println!("  awaiting review: {}", summary.awaiting_review);
    println!("  in target:       {:.2}%", summary.in_target_pct);

    println!();
    println!("=== TREND ===");
    for point in &summary.trend {
        println!(
            "  {} | in target {:>6.2}% | overdue {:>3} | out of standard {:>3}",
            point.month, point.in_target_pct, point.counts.overdue, point.counts.out_of_standard
        );
    }

    println!();
    println!("=== CRITICAL ===");
    if summary.critical.is_empty() {
        println!("  (none)");
    }
    for entry in &summary.critical {
        let due = entry.due_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "  {:<10} {:<8} due {} | {}",
            entry.code, entry.risk.as_str(), due, entry.name
        );
    }
}

// ── Demo catalog ─────────────────────────────────────────────────────────────

/// A small catalog covering every cadence and status, for trying the runner.
fn load_demo(store: &SqliteStore) -> Result<()> {
    let controls = [
        ("ctl-ac-01", "AC-01", "Quarterly access review",     "Trimestral",  RiskClassification::High),
        ("ctl-bk-02", "BK-02", "Backup restore test",         "Mensal",      RiskClassification::Critical),
        ("ctl-vn-03", "VN-03", "Vendor due diligence",        "anual",       RiskClassification::Medium),
        ("ctl-ir-04", "IR-04", "Incident response drill",     "semiannual",  RiskClassification::High),
        ("ctl-cm-05", "CM-05", "Change approval sampling",    "monthly",     RiskClassification::Low),
        ("ctl-dl-06", "DL-06", "Data leak investigation",     "on_demand",   RiskClassification::Critical),
    ];
    for (id, code, name, frequency, risk) in controls {
        store.insert_control(&Control {
            id:                  id.into(),
            code:                code.into(),
            name:                name.into(),
            frequency:           frequency.into(),
            risk_classification: risk,
            owner_id:            Some("owner-grc".into()),
        })?;
        store.insert_kpi(&Kpi {
            id:         format!("{id}-kpi"),
            control_id: id.into(),
            code:       format!("{code}.1"),
            name:       format!("{name} coverage"),
        })?;
        store.link_control_team(id, if risk >= RiskClassification::High { "risk" } else { "ops" })?;
    }

    let executions = [
        ("ex-1", "ctl-bk-02", "2024-01-01", "2024-01-31", AutoStatus::OutOfTarget, "submitted"),
        ("ex-2", "ctl-cm-05", "2024-01-01", "2024-01-31", AutoStatus::InTarget,    "approved"),
        ("ex-3", "ctl-ac-01", "2023-10-01", "2023-12-31", AutoStatus::Warning,     "under_review"),
        ("ex-4", "ctl-bk-02", "2023-12-01", "2023-12-31", AutoStatus::InTarget,    "approved"),
    ];
    for (i, (id, control_id, start, end, status, workflow)) in executions.into_iter().enumerate() {
        store.insert_execution(&Execution {
            id:              id.into(),
            kpi_id:          Some(format!("{control_id}-kpi")),
            control_id:      control_id.into(),
            period_start:    parse_date(start)?,
            period_end:      parse_date(end)?,
            result_numeric:  Some(90.0 - 10.0 * i as f64),
            auto_status:     Some(status),
            workflow_status: workflow.into(),
            created_at:      Utc
                .timestamp_opt(1_706_745_600 + i as i64 * 3_600, 0)
                .single()
                .ok_or_else(|| anyhow::anyhow!("bad demo timestamp"))?,
        })?;
    }
    log::info!("demo catalog loaded: {} controls", store.control_count()?);
    Ok(())
}

// ── Args ─────────────────────────────────────────────────────────────────────

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn flag_values<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].as_str())
        .collect()
}
