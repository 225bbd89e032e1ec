//! Shared primitive types used across the engine.

/// A stable, unique identifier for a control or KPI.
pub type EntityId = String;

/// Identifier of one execution record.
pub type ExecutionId = String;

/// Identifier of a team, as understood by the scope collaborator.
pub type TeamId = String;
