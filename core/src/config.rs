use crate::{classifier::Applicability, model::RiskClassification};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker threads in the evaluation pool. Bounds concurrent store reads.
    pub max_concurrency: usize,
    /// Months in the dashboard trend, current month included.
    pub trend_months: u32,
    /// Maximum entries in the critical-controls list.
    pub critical_page_size: usize,
    /// Risk levels that put an out-of-standard entity on the critical list.
    pub critical_risk_levels: Vec<RiskClassification>,
    /// Workflow states that count as awaiting GRC review.
    pub review_queue_states: Vec<String>,
    /// Which months period-based entities are expected to report in.
    pub applicability: Applicability,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency:      8,
            trend_months:         6,
            critical_page_size:   10,
            critical_risk_levels: vec![RiskClassification::High, RiskClassification::Critical],
            review_queue_states:  vec!["submitted".into(), "under_review".into()],
            applicability:        Applicability::AnchorMonths,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. Keys left out take their defaults.
    /// In tests, use EngineConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_concurrency == 0 {
            anyhow::bail!("max_concurrency must be at least 1");
        }
        if self.trend_months == 0 {
            anyhow::bail!("trend_months must be at least 1");
        }
        Ok(())
    }

    /// Config with a small pool and defaults elsewhere, for tests.
    pub fn default_test() -> Self {
        Self {
            max_concurrency: 2,
            ..Self::default()
        }
    }
}
