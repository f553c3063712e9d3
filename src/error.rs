use std::path::PathBuf;

use thiserror::Error;

use crate::core::ErrorKind;

/// Front-end failures. Conversion errors stay inside `ConversionOutcome`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
    #[error("cannot open log file '{}': {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("conversion failed ({reason:?})")]
    ConversionFailed { reason: ErrorKind },
}
