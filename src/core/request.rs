use std::path::PathBuf;

use crate::core::error::ConvertError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input_path: String,
    pub output_path: String,
}

/// A request whose paths are trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRequest {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ConversionRequest {
    pub fn new(input_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
        }
    }

    pub fn validate(&self) -> Result<ValidRequest, ConvertError> {
        let input = self.input_path.trim();
        let output = self.output_path.trim();

        let message = match (input.is_empty(), output.is_empty()) {
            (true, true) => Some("both the input and output paths are empty"),
            (true, false) => Some("the input path is empty"),
            (false, true) => Some("the output path is empty"),
            (false, false) => None,
        };

        if let Some(message) = message {
            return Err(ConvertError::InvalidInput {
                message: format!("{message}; please fill in both fields"),
            });
        }

        Ok(ValidRequest {
            input: PathBuf::from(input),
            output: PathBuf::from(output),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::error::ErrorKind;

    #[test]
    fn paths_are_trimmed() {
        let request = ConversionRequest::new("  movie.mkv\t", " out.mp4 ");
        let valid = request.validate().unwrap();
        assert_eq!(valid.input, PathBuf::from("movie.mkv"));
        assert_eq!(valid.output, PathBuf::from("out.mp4"));
    }

    #[test]
    fn blank_fields_are_rejected() {
        for (input, output) in [("", "out.mp4"), ("in.mkv", "   "), (" ", "")] {
            let err = ConversionRequest::new(input, output).validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn message_names_the_empty_field() {
        let err = ConversionRequest::new("in.mkv", "").validate().unwrap_err();
        assert!(err.to_string().contains("output path is empty"));
    }
}
