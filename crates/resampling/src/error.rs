use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResamplingError {
    #[error("Resampling was cancelled before the run set completed")]
    Cancelled,

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error(transparent)]
    Core(#[from] core_types::CoreError),

    #[error(transparent)]
    Analytics(#[from] analytics::AnalyticsError),
}
