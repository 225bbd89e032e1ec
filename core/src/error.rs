use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unrecognized frequency '{raw}'")]
    InvalidFrequency { raw: String },

    #[error("Scope resolution failed: {reason}")]
    ScopeResolution { reason: String },

    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("Date {date} is outside the supported calendar window")]
    DateOutOfRange { date: NaiveDate },

    #[error("Date arithmetic overflow from {from} ({op})")]
    DateArithmeticOverflow { from: NaiveDate, op: &'static str },

    #[error("Override period end {period_end} is not a {cadence} period boundary")]
    InvalidOverridePeriod { period_end: NaiveDate, cadence: String },

    #[error("Worker pool could not be built: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
