use crate::{model::EntityKind, types::{EntityId, TeamId}};
use serde::{Deserialize, Serialize};

/// Queries a presentation layer sends to the runner, one JSON object per line.
/// Dates travel as `YYYY-MM-DD` text and are validated by `AsOf::parse`.
/// Variants are only ever added, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardQuery {
    // ── Dashboard ─────────────────────────────────
    Portfolio {
        #[serde(default)]
        as_of: Option<String>,
        #[serde(default = "default_kind")]
        kind:  EntityKind,
        /// Absent means unscoped; present (even empty) means team-scoped.
        #[serde(default)]
        teams: Option<Vec<TeamId>>,
    },
    Trend {
        #[serde(default)]
        as_of:       Option<String>,
        #[serde(default = "default_kind")]
        kind:        EntityKind,
        #[serde(default)]
        months_back: Option<u32>,
        #[serde(default)]
        teams:       Option<Vec<TeamId>>,
    },

    // ── Detail pages ──────────────────────────────
    /// Detail queries honour `teams` the same way: an entity outside
    /// the caller's scope is reported as not found.
    Entity {
        entity_id:  EntityId,
        #[serde(default)]
        as_of:      Option<String>,
        #[serde(default)]
        period_end: Option<String>,
        #[serde(default)]
        teams:      Option<Vec<TeamId>>,
    },
    ControlDetail {
        control_id: EntityId,
        #[serde(default)]
        as_of:      Option<String>,
        #[serde(default)]
        period_end: Option<String>,
        #[serde(default)]
        teams:      Option<Vec<TeamId>>,
    },

    Quit,
}

fn default_kind() -> EntityKind {
    EntityKind::Control
}
