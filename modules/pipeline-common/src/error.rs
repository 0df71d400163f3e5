use thiserror::Error;

/// Closed error taxonomy for the pipeline (see §7). One variant per failure
/// category; everything else is handled inline by its caller (DLQ insert,
/// counter bump) and never reaches this type.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("transient fetch error: {0}")]
    Transient(String),

    #[error("fetch blocked (403/429): {0}")]
    BlockedFetch(String),

    #[error("source drift: zero cards extracted from {bytes} bytes of HTML")]
    SourceDrift { bytes: usize },

    #[error("repair failed: {0}")]
    RepairFailure(String),

    #[error("systemic error: {0}")]
    Systemic(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("scout lock conflict: another coordinator/worker run is in progress")]
    LockConflict,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
