//! Frequency normalization — free-text catalog frequency to cadence.
//!
//! RULE: Frequency text is parsed exactly once, when a control enters
//! the engine (see `TrackedEntity::from_control`). Downstream code only
//! ever sees a `Cadence`.
//!
//! Resolution order:
//!   1. Exact key of the controlled vocabulary (case-insensitive).
//!   2. Substring patterns, on-demand patterns first.
//!   3. Anything else falls back to monthly, with a warning. The fallback
//!      changes due-date math for garbage input, so it is logged.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of reporting cadences the period math understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CadenceClass {
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl CadenceClass {
    pub const ALL: [CadenceClass; 4] = [
        CadenceClass::Monthly,
        CadenceClass::Quarterly,
        CadenceClass::Semiannual,
        CadenceClass::Annual,
    ];

    /// Length of one reporting period, in months.
    pub fn period_months(self) -> u32 {
        match self {
            CadenceClass::Monthly    => 1,
            CadenceClass::Quarterly  => 3,
            CadenceClass::Semiannual => 6,
            CadenceClass::Annual     => 12,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CadenceClass::Monthly    => "monthly",
            CadenceClass::Quarterly  => "quarterly",
            CadenceClass::Semiannual => "semiannual",
            CadenceClass::Annual     => "annual",
        }
    }
}

impl fmt::Display for CadenceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized frequency: either period-based or on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "class", rename_all = "snake_case")]
pub enum Cadence {
    Periodic(CadenceClass),
    OnDemand,
}

impl Cadence {
    pub fn class(self) -> Option<CadenceClass> {
        match self {
            Cadence::Periodic(class) => Some(class),
            Cadence::OnDemand        => None,
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Periodic(class) => class.fmt(f),
            Cadence::OnDemand        => f.write_str("on_demand"),
        }
    }
}

// ── Vocabulary ───────────────────────────────────────────────────────────────

const VOCABULARY: &[(&str, Cadence)] = &[
    ("daily",       Cadence::Periodic(CadenceClass::Monthly)),
    ("diario",      Cadence::Periodic(CadenceClass::Monthly)),
    ("weekly",      Cadence::Periodic(CadenceClass::Monthly)),
    ("semanal",     Cadence::Periodic(CadenceClass::Monthly)),
    ("monthly",     Cadence::Periodic(CadenceClass::Monthly)),
    ("mensal",      Cadence::Periodic(CadenceClass::Monthly)),
    ("quarterly",   Cadence::Periodic(CadenceClass::Quarterly)),
    ("trimestral",  Cadence::Periodic(CadenceClass::Quarterly)),
    ("semiannual",  Cadence::Periodic(CadenceClass::Semiannual)),
    ("semestral",   Cadence::Periodic(CadenceClass::Semiannual)),
    ("annual",      Cadence::Periodic(CadenceClass::Annual)),
    ("anual",       Cadence::Periodic(CadenceClass::Annual)),
    ("yearly",      Cadence::Periodic(CadenceClass::Annual)),
    ("on_demand",   Cadence::OnDemand),
    ("sob_demanda", Cadence::OnDemand),
    ("ad_hoc",      Cadence::OnDemand),
    ("eventual",    Cadence::OnDemand),
];

/// Substring patterns, checked in order after the semiannual check in
/// `parse_strict`. Daily and weekly report monthly.
const PATTERNS: &[(&[&str], Cadence)] = &[
    (&["demand", "demanda", "ad hoc", "eventual"], Cadence::OnDemand),
    (&["tri", "quarter"],                          Cadence::Periodic(CadenceClass::Quarterly)),
    (&["anu", "annual", "year"],                   Cadence::Periodic(CadenceClass::Annual)),
    (&["mens", "month"],                           Cadence::Periodic(CadenceClass::Monthly)),
    (&["seman", "week"],                           Cadence::Periodic(CadenceClass::Monthly)),
    (&["diar", "day", "dail"],                     Cadence::Periodic(CadenceClass::Monthly)),
];

fn fold(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'â' | 'ã' | 'à' => 'a',
            'é' | 'ê'             => 'e',
            'í'                   => 'i',
            'ó' | 'ô' | 'õ'       => 'o',
            'ú'                   => 'u',
            'ç'                   => 'c',
            '-'                   => '_',
            other                 => other,
        })
        .collect()
}

/// Resolve a frequency without the monthly fallback.
pub fn parse_strict(raw: &str) -> EngineResult<Cadence> {
    let key = fold(raw);

    if let Some((_, cadence)) = VOCABULARY.iter().find(|(k, _)| *k == key) {
        return Ok(*cadence);
    }

    // "semiannual" contains "annual" and "semestral" contains "tri".
    if key.contains("semi") || key.contains("seme") || key.contains("half") {
        return Ok(Cadence::Periodic(CadenceClass::Semiannual));
    }

    let spaced = key.replace('_', " ");
    PATTERNS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| spaced.contains(n)))
        .map(|(_, cadence)| *cadence)
        .ok_or_else(|| EngineError::InvalidFrequency { raw: raw.to_string() })
}

/// Resolve a frequency, falling back to monthly for unrecognized text.
pub fn normalize(raw: &str) -> Cadence {
    match parse_strict(raw) {
        Ok(cadence) => cadence,
        Err(e) => {
            log::warn!("{e}; treating as monthly");
            Cadence::Periodic(CadenceClass::Monthly)
        }
    }
}
