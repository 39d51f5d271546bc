//! Error types for the playground runner

use std::fmt;
use thiserror::Error;

/// Which part of a run a [`Error::Load`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    /// Parsing the assembled test program
    Parse,
    /// Resolving, linking or evaluating the module graph
    Evaluate,
    /// Reading the run aggregate off the module namespace
    Report,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStage::Parse => write!(f, "parse"),
            LoadStage::Evaluate => write!(f, "evaluate"),
            LoadStage::Report => write!(f, "report"),
        }
    }
}

/// Main error type for the playground runner
#[derive(Error, Debug)]
pub enum Error {
    /// The assembled program could not be loaded. The message is the raw
    /// interpreter error (`SyntaxError: ...`, `TypeError: ...`) because it is
    /// shown to the learner as-is.
    #[error("{message}")]
    Load { stage: LoadStage, message: String },

    /// TypeScript source could not be reduced to JavaScript
    #[error("TranspileError: {message} at offset {offset}")]
    Transpile { message: String, offset: usize },

    /// The interpreter context could not be prepared
    #[error("EngineError: {0}")]
    Engine(String),

    /// The harness produced a report the host could not decode
    #[error("ReportError: {source}")]
    Report {
        #[from]
        source: serde_json::Error,
    },

    /// IO error
    #[error("IOError: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Invalid runner configuration
    #[error("ConfigError: {0}")]
    Config(String),

    /// Exercise content could not be found or read
    #[error("ExerciseError: {0}")]
    Exercise(String),
}

impl Error {
    /// Create a load error for the given stage
    pub fn load(stage: LoadStage, message: impl Into<String>) -> Self {
        Error::Load {
            stage,
            message: message.into(),
        }
    }

    /// Create a transpile error at a char offset
    pub fn transpile(message: impl Into<String>, offset: usize) -> Self {
        Error::Transpile {
            message: message.into(),
            offset,
        }
    }

    /// Whether this error comes from learner or exercise source (as opposed
    /// to the host failing)
    pub fn is_source_error(&self) -> bool {
        matches!(self, Error::Load { .. } | Error::Transpile { .. })
    }
}

/// Result type alias for the playground runner
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_displays_raw_message() {
        let err = Error::load(LoadStage::Parse, "SyntaxError: unexpected token '}'");
        assert_eq!(err.to_string(), "SyntaxError: unexpected token '}'");
        assert!(err.is_source_error());
    }

    #[test]
    fn test_transpile_error_display() {
        let err = Error::transpile("unterminated enum body", 12);
        assert_eq!(err.to_string(), "TranspileError: unterminated enum body at offset 12");
    }

    #[test]
    fn test_report_error_from_json() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().starts_with("ReportError:"));
        assert!(!err.is_source_error());
    }
}
