use crate::estimator::EstimationFailure;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkerForgeError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Parsing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),

    #[error("Seed framework could not be estimated: {0}")]
    SeedEstimation(EstimationFailure),

    #[error("Estimation Error: {0}")]
    Estimation(#[from] EstimationFailure),
}

pub type MfResult<T> = Result<T, MarkerForgeError>;
