/// Convenience result type used across Rollvar.
pub type RollvarResult<T> = Result<T, RollvarError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// Degenerate geometry (NaN tangents, zero-speed curves, trajectories with
/// fewer than two accepted vertices, solver non-convergence) is recovered
/// locally with a warning and never surfaces here; the variants below all
/// fail the whole request.
#[derive(thiserror::Error, Debug)]
pub enum RollvarError {
    /// Malformed or incomplete request key.
    #[error("request error: {0}")]
    Request(String),

    /// Zero scalar channels available for an otherwise valid ensemble.
    #[error("no scalar channels available in ensemble")]
    EmptyChannelSet,

    /// Invalid ensemble data (stride mismatches, missing buffers).
    #[error("data error: {0}")]
    Data(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RollvarError {
    /// Build a [`RollvarError::Request`] value.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    /// Build a [`RollvarError::Data`] value.
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
