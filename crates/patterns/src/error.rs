use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Statistical distribution error in {0}: {1}")]
    Distribution(String, String),

    #[error("An unexpected error occurred during pattern discovery: {0}")]
    InternalError(String),
}
