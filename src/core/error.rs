use std::path::PathBuf;

use thiserror::Error;

/// Failure category carried by a failed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    InputNotFound,
    OutputDirUnavailable,
    EngineNotFound,
    EngineNonZeroExit,
    Unexpected,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid request: {message}")]
    InvalidInput { message: String },
    #[error("input file '{}' does not exist", path.display())]
    InputNotFound { path: PathBuf },
    #[error("cannot create output directory '{}': {source}", dir.display())]
    OutputDirUnavailable {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "could not start '{program}': {source}. Check that ffmpeg is present under ffmpeg/bin/ or on the system PATH"
    )]
    EngineNotFound {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("ffmpeg exited with code {}{}", display_code(*code), display_last_error(last_error))]
    EngineNonZeroExit {
        code: Option<i32>,
        last_error: Option<String>,
    },
    #[error("unexpected error: {message}")]
    Unexpected { message: String },
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::InvalidInput { .. } => ErrorKind::InvalidInput,
            ConvertError::InputNotFound { .. } => ErrorKind::InputNotFound,
            ConvertError::OutputDirUnavailable { .. } => ErrorKind::OutputDirUnavailable,
            ConvertError::EngineNotFound { .. } => ErrorKind::EngineNotFound,
            ConvertError::EngineNonZeroExit { .. } => ErrorKind::EngineNonZeroExit,
            ConvertError::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    pub fn unexpected(err: impl std::fmt::Display) -> Self {
        ConvertError::Unexpected {
            message: err.to_string(),
        }
    }
}

fn display_code(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "<none> (terminated by signal)".to_string(),
    }
}

fn display_last_error(last_error: &Option<String>) -> String {
    match last_error {
        Some(line) => format!(": {line}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_zero_exit_detail_mentions_code_and_last_error() {
        let err = ConvertError::EngineNonZeroExit {
            code: Some(1),
            last_error: Some("Invalid data found when processing input".to_string()),
        };
        let detail = err.to_string();
        assert_eq!(err.kind(), ErrorKind::EngineNonZeroExit);
        assert!(detail.contains("code 1"));
        assert!(detail.ends_with("Invalid data found when processing input"));
    }

    #[test]
    fn signal_termination_has_no_code() {
        let err = ConvertError::EngineNonZeroExit {
            code: None,
            last_error: None,
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn engine_not_found_carries_guidance() {
        let err = ConvertError::EngineNotFound {
            program: "/opt/ffmpeg".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let detail = err.to_string();
        assert_eq!(err.kind(), ErrorKind::EngineNotFound);
        assert!(detail.contains("/opt/ffmpeg"));
        assert!(detail.contains("PATH"));
    }
}
