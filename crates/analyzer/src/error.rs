use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Hard insufficiency: nothing can be computed at all.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Malformed input: the run aborts with no report.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Analysis was cancelled")]
    Cancelled,

    #[error(transparent)]
    Analytics(#[from] analytics::AnalyticsError),

    #[error(transparent)]
    Patterns(#[from] patterns::PatternError),

    #[error(transparent)]
    Leverage(#[from] leverage::LeverageError),

    #[error("Resampling failed: {0}")]
    Resampling(String),
}

impl From<core_types::CoreError> for AnalyzerError {
    fn from(err: core_types::CoreError) -> Self {
        match err {
            core_types::CoreError::InvalidInput(what, why) => {
                AnalyzerError::InvalidInput(format!("{what}: {why}"))
            }
            core_types::CoreError::InsufficientData(what, why) => {
                AnalyzerError::InsufficientData(format!("{what}: {why}"))
            }
        }
    }
}

impl From<resampling::ResamplingError> for AnalyzerError {
    fn from(err: resampling::ResamplingError) -> Self {
        match err {
            resampling::ResamplingError::Cancelled => AnalyzerError::Cancelled,
            other => AnalyzerError::Resampling(other.to_string()),
        }
    }
}
