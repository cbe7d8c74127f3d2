use thiserror::Error;

use crate::types::RemovalReason;

/// Top-level error type for the Paceline runtime.
///
/// Two outcomes deliberately never appear here: a guarded transition that
/// lost its race reports `Ok(false)`, and a candidate whose precondition
/// resolved itself before the tick ran is skipped silently.
#[derive(Debug, Error)]
pub enum PacelineError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("appeal quota exhausted ({used} of {max} used)")]
    AppealQuotaExhausted { used: u32, max: u32 },

    #[error("removal reason {0:?} is not appealable")]
    NotAppealable(RemovalReason),

    #[error("course {0} not found")]
    CourseNotFound(uuid::Uuid),

    #[error("course {0} is not awaiting appeal review")]
    NotUnderAppeal(uuid::Uuid),

    #[error("notification permanently rejected: {0}")]
    PermanentDelivery(String),

    #[error("notification failed after retries: {0}")]
    TransientDelivery(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
