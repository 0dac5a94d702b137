// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite - Error Types

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Every failure the engine can report. Each variant names the input or
/// derived value that caused it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    /// Malformed configuration, detected before any sampling begins.
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: String, reason: String },

    /// Unrecognized distribution family tag.
    #[error("unsupported distribution family `{family}` for `{component}`")]
    UnsupportedDistribution { component: String, family: String },

    /// Aggregation attempted on zero records.
    #[error("cannot summarize an empty set of trial records")]
    EmptyInput,

    /// Comparison baseline is not among the summarized scenarios.
    #[error("baseline scenario `{0}` has no statistics")]
    UnknownBaseline(String),

    /// Engine asked to run a scenario the parameters do not declare.
    #[error("scenario `{0}` is not declared in the parameters")]
    UnknownScenario(String),

    /// A result sink failed to write.
    #[error("result sink failed: {0}")]
    Sink(String),
}

impl SimulationError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for SimulationError {
    fn from(e: std::io::Error) -> Self {
        Self::Sink(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_names_field() {
        let err = SimulationError::invalid("trials", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid parameter `trials`: must be at least 1"
        );
    }

    #[test]
    fn io_error_becomes_sink_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: SimulationError = io.into();
        assert!(matches!(err, SimulationError::Sink(ref m) if m.contains("pipe closed")));
    }
}
