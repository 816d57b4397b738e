use thiserror::Error;

/// Data-availability failures of a skyline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkylineError {
    /// No candidate peak below the elevation outlier limit.
    #[error("no valid candidate peaks (all missing or at least 9000 m)")]
    EmptyCatalog,
    /// The start-point query matched nothing.
    #[error("no start points matched the query")]
    NoStartPoints,
}

impl SkylineError {
    /// Process exit status reported for this failure.
    pub fn exit_code(self) -> u8 {
        match self {
            SkylineError::NoStartPoints => 2,
            SkylineError::EmptyCatalog => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, SkylineError>;
