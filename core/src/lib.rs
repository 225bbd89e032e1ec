//! Compliance period and status engine.
//!
//! Given a control catalog, an execution history and an explicit as-of
//! date, determines each control's and KPI's expected reporting period,
//! finds the execution that reports on it, classifies the result and
//! folds the statuses into dashboard metrics.
//!
//! Module map (leaf first):
//!   frequency  → cadence normalization
//!   period     → expected period and due date
//!   matcher    → authoritative execution per period
//!   classifier → one status per entity and period
//!   aggregator → counts, trend, critical list
//!   engine     → pool-backed orchestration over a `ComplianceSource`

pub mod aggregator;
pub mod classifier;
pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod frequency;
pub mod matcher;
pub mod model;
pub mod period;
pub mod scope;
pub mod source;
pub mod store;
pub mod types;

pub use clock::AsOf;
pub use config::EngineConfig;
pub use engine::StatusEngine;
pub use error::{EngineError, EngineResult};
