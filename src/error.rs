use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The rendering surface or GPU context could not be created.
    #[error("rendering context unavailable: {0}")]
    ContextUnavailable(String),

    /// An operation was attempted in a lifecycle state that forbids it.
    ///
    /// This is a programming defect, not a recoverable runtime condition.
    #[error("`{operation}` is not allowed in lifecycle state {state}")]
    Lifecycle {
        operation: &'static str,
        state: &'static str,
    },

    #[error("backend error: {0}")]
    Backend(String),
}
