use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the collision engine.
///
/// All failures are local and synchronous: configuration is checked before any
/// state exists, and the stepper checks everything it needs before mutating.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid run configuration (non-positive counts or spacings, non-finite values).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation not allowed in the current sequencer state (e.g. advancing a completed pass).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Invalid argument to a query or diagnostic.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Numerical issue, e.g. a non-finite slice coordinate met during overlap detection.
    #[error("numerical error: {0}")]
    MathError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = Error::InvalidConfig("slice_count must be > 0".to_string());
        let msg = format!("{e}");
        assert!(msg.contains("invalid configuration"));
        assert!(msg.contains("slice_count"));

        let e = Error::InvalidState("pass already complete".to_string());
        assert!(e.to_string().starts_with("invalid state"));
    }

    #[test]
    fn result_type_alias_compiles() -> Result<()> {
        Ok(())
    }
}
