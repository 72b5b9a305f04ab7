//! Observation sequence text format.
//!
//! Sequences are written as comma-separated symbol indices (`0,1,1,0,1`).
//! Whitespace around each symbol is ignored. Range checking against a
//! model's alphabet happens in the estimator, not here.

use thiserror::Error;

/// Errors from parsing an observation sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservationParseError {
    #[error("observation sequence is empty")]
    Empty,

    #[error("missing symbol at position {position}")]
    MissingSymbol { position: usize },

    #[error("'{token}' at position {position} is not a non-negative integer symbol")]
    InvalidToken { position: usize, token: String },
}

impl From<ObservationParseError> for crate::Error {
    fn from(err: ObservationParseError) -> Self {
        crate::Error::InvalidObservation(err.to_string())
    }
}

/// Parse a comma-separated list of symbol indices.
pub fn parse_observations(input: &str) -> Result<Vec<usize>, ObservationParseError> {
    if input.trim().is_empty() {
        return Err(ObservationParseError::Empty);
    }

    input
        .split(',')
        .enumerate()
        .map(|(position, raw)| {
            let token = raw.trim();
            if token.is_empty() {
                return Err(ObservationParseError::MissingSymbol { position });
            }
            token
                .parse::<usize>()
                .map_err(|_| ObservationParseError::InvalidToken {
                    position,
                    token: token.to_string(),
                })
        })
        .collect()
}

/// Render a sequence in the same comma-separated form `parse_observations` reads.
pub fn format_observations(observations: &[usize]) -> String {
    observations
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
