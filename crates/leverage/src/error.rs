use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeverageError {
    #[error("Leverageability test needs a trade list")]
    NoTrades,

    #[error("Hour-of-day finding carries no worst hours to exclude")]
    NoWorstHours,

    #[error("Baseline distribution retains no per-run results to replay")]
    NoBaselinePaths,

    #[error(transparent)]
    Core(#[from] core_types::CoreError),

    #[error(transparent)]
    Analytics(#[from] analytics::AnalyticsError),
}
