//! Crate-level error type.
//!
//! Effects themselves never fail. These errors only cover the edges where the
//! crate touches its environment: spawning onto a runtime and validating config.

/// Errors raised when wiring effects or units into a runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No tokio runtime is active on the calling thread.
    #[error("no tokio runtime available to {action}")]
    NoRuntime {
        /// What the caller was trying to do.
        action: &'static str,
    },
    /// A configuration value is out of range.
    #[error("invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        message: String,
    },
}

/// Result alias for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Grab the current tokio runtime handle or report what needed it.
pub(crate) fn runtime(action: &'static str) -> Result<tokio::runtime::Handle> {
    tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime { action })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_runtime_outside_tokio() {
        let err = runtime("spawn a pump").unwrap_err();
        assert!(matches!(err, Error::NoRuntime { action: "spawn a pump" }));
        assert_eq!(err.to_string(), "no tokio runtime available to spawn a pump");
    }

    #[tokio::test]
    async fn runtime_inside_tokio() {
        assert!(runtime("perform a task").is_ok());
    }

    #[test]
    fn invalid_config_display() {
        let err = Error::InvalidConfig {
            field: "fps",
            message: "must be greater than zero".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration for fps: must be greater than zero"
        );
    }
}
