//! Config loading and runner query parsing.

use grc_core::{
    classifier::Applicability,
    command::DashboardQuery,
    model::{EntityKind, RiskClassification},
    EngineConfig,
};
use std::io::Write;

fn write_config(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn partial_config_takes_defaults() {
    let file = write_config(r#"{ "max_concurrency": 3, "applicability": "always" }"#);

    let config = EngineConfig::load(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.max_concurrency, 3);
    assert_eq!(config.applicability, Applicability::Always);
    assert_eq!(config.trend_months, 6);
    assert_eq!(config.critical_page_size, 10);
    assert_eq!(
        config.critical_risk_levels,
        vec![RiskClassification::High, RiskClassification::Critical]
    );
}

#[test]
fn zero_concurrency_is_rejected() {
    let file = write_config(r#"{ "max_concurrency": 0 }"#);
    assert!(EngineConfig::load(file.path().to_str().unwrap()).is_err());
}

#[test]
fn missing_config_file_is_an_error() {
    assert!(EngineConfig::load("/nonexistent/grc-config.json").is_err());
}

#[test]
fn portfolio_query_defaults() {
    let q: DashboardQuery = serde_json::from_str(r#"{ "type": "portfolio" }"#).unwrap();
    assert_eq!(
        q,
        DashboardQuery::Portfolio { as_of: None, kind: EntityKind::Control, teams: None }
    );
}

#[test]
fn scoped_kpi_trend_query() {
    let q: DashboardQuery = serde_json::from_str(
        r#"{ "type": "trend", "as_of": "2024-02-20", "kind": "kpi",
             "months_back": 3, "teams": ["risk"] }"#,
    )
    .unwrap();
    assert_eq!(
        q,
        DashboardQuery::Trend {
            as_of:       Some("2024-02-20".into()),
            kind:        EntityKind::Kpi,
            months_back: Some(3),
            teams:       Some(vec!["risk".into()]),
        }
    );
}

#[test]
fn control_detail_query_with_override() {
    let q: DashboardQuery = serde_json::from_str(
        r#"{ "type": "control_detail", "control_id": "ctl-1", "period_end": "2023-12-31" }"#,
    )
    .unwrap();
    assert_eq!(
        q,
        DashboardQuery::ControlDetail {
            control_id: "ctl-1".into(),
            as_of:      None,
            period_end: Some("2023-12-31".into()),
            teams:      None,
        }
    );
}

#[test]
fn entity_query_carries_teams() {
    let q: DashboardQuery = serde_json::from_str(
        r#"{ "type": "entity", "entity_id": "k-1", "teams": ["finance"] }"#,
    )
    .unwrap();
    assert_eq!(
        q,
        DashboardQuery::Entity {
            entity_id:  "k-1".into(),
            as_of:      None,
            period_end: None,
            teams:      Some(vec!["finance".into()]),
        }
    );
}

#[test]
fn unknown_query_type_is_rejected() {
    assert!(serde_json::from_str::<DashboardQuery>(r#"{ "type": "reboot" }"#).is_err());
    let quit: DashboardQuery = serde_json::from_str(r#"{ "type": "quit" }"#).unwrap();
    assert_eq!(quit, DashboardQuery::Quit);
}
