use crate::core::error::{ConvertError, ErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub percent: u8,
    pub message: String,
}

impl ProgressEvent {
    pub fn completed(message: impl Into<String>) -> Self {
        Self {
            percent: 100,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            percent: 0,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Success { output_path: String },
    Failure { reason: ErrorKind, detail: String },
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Success { .. })
    }

    pub fn reason(&self) -> Option<ErrorKind> {
        match self {
            ConversionOutcome::Success { .. } => None,
            ConversionOutcome::Failure { reason, .. } => Some(*reason),
        }
    }

    pub fn percent(&self) -> u8 {
        if self.is_success() {
            100
        } else {
            0
        }
    }
}

impl From<ConvertError> for ConversionOutcome {
    fn from(err: ConvertError) -> Self {
        ConversionOutcome::Failure {
            reason: err.kind(),
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_from_error_keeps_kind_and_detail() {
        let outcome = ConversionOutcome::from(ConvertError::EngineNonZeroExit {
            code: Some(1),
            last_error: None,
        });
        assert_eq!(outcome.reason(), Some(ErrorKind::EngineNonZeroExit));
        assert_eq!(outcome.percent(), 0);
        match outcome {
            ConversionOutcome::Failure { detail, .. } => assert!(detail.contains('1')),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn success_is_complete() {
        let outcome = ConversionOutcome::Success {
            output_path: "out.mp4".to_string(),
        };
        assert!(outcome.is_success());
        assert_eq!(outcome.percent(), 100);
        assert_eq!(outcome.reason(), None);
    }
}
