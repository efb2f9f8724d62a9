//! Result type alias for splice operations

use crate::error::SpliceError;

pub type Result<T> = std::result::Result<T, SpliceError>;

/// Splits per-shader failures from fatal ones
pub trait ResultExt<T> {
    /// `Ok(None)` for an error that only sinks the current shader, after
    /// logging it; fatal errors stay `Err`.
    fn recoverable(self) -> Result<Option<T>>;
}

impl<T> ResultExt<T> for Result<T> {
    fn recoverable(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                tracing::error!("{}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_shader_becomes_none() {
        let result: Result<u32> = Err(SpliceError::preprocess_error("ns:a", "bad"));
        assert!(matches!(result.recoverable(), Ok(None)));
    }

    #[test]
    fn fatal_errors_propagate() {
        let result: Result<u32> = Err(SpliceError::config_error("bad"));
        assert!(result.recoverable().is_err());
        assert!(matches!(Ok::<u32, SpliceError>(7).recoverable(), Ok(Some(7))));
    }
}
