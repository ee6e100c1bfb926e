//! Error types for the bundle validator.
//!
//! Each variant names the lifecycle concern that failed so that a CI log
//! shows at a glance which stage broke and why. The pipeline runner wraps
//! stage failures in [`ValidationError::Stage`].

use crate::pipeline::Stage;
use thiserror::Error;

/// Errors that can occur while validating a distribution bundle.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The run configuration is incomplete or malformed.
    #[error("invalid configuration: {reason}")]
    Config {
        /// Description of the problem.
        reason: String,
    },

    /// A locally supplied artifact is missing or empty.
    #[error("artifact {path} is unusable: {reason}")]
    Artifact {
        /// The supplied path.
        path: String,
        /// Description of the problem.
        reason: String,
    },

    /// An artifact URL could not be downloaded or is not reachable.
    #[error("Invalid url - {url}: {reason}")]
    Download {
        /// The rejected URL.
        url: String,
        /// Description of the failure.
        reason: String,
    },

    /// Installing a project failed.
    #[error("failed to install {project}: {reason}")]
    Install {
        /// The project being installed.
        project: String,
        /// Description of the failure.
        reason: String,
    },

    /// A service did not come up.
    #[error("failed to start {project}: {reason}")]
    ClusterStart {
        /// The project being started.
        project: String,
        /// Description of the failure.
        reason: String,
    },

    /// One or more API probes failed.
    #[error("Not all tests Pass : {summary}")]
    ValidationFailed {
        /// The aggregate pass/fail summary.
        summary: String,
    },

    /// Stopping or removing a service failed.
    #[error("failed to stop or remove {project}: {reason}")]
    Cleanup {
        /// The project being cleaned up.
        project: String,
        /// The underlying failure message.
        reason: String,
    },

    /// A pipeline stage failed.
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// The stage that failed.
        stage: Stage,
        /// The failure raised by the stage.
        #[source]
        source: Box<ValidationError>,
    },

    /// A stage failed and the cleanup that followed also failed.
    #[error("{primary}; cleanup afterwards also failed: {cleanup}")]
    CleanupAfterFailure {
        /// The original stage failure.
        #[source]
        primary: Box<ValidationError>,
        /// The cleanup failure.
        cleanup: Box<ValidationError>,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl ValidationError {
    /// Wraps `self` with the stage that raised it.
    #[must_use]
    pub fn in_stage(self, stage: Stage) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Returns the stage that failed, if this error came from the runner.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            Self::CleanupAfterFailure { primary, .. } => primary.stage(),
            _ => None,
        }
    }
}

/// Result type alias defaulting to [`ValidationError`].
pub type Result<T, E = ValidationError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_error_names_the_url_and_reason() {
        let err = ValidationError::Download {
            url: "https://example.test/a.tar.gz".to_owned(),
            reason: "404".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid url - https://example.test/a.tar.gz: 404"
        );
    }

    #[test]
    fn validation_failure_carries_the_summary() {
        let err = ValidationError::ValidationFailed {
            summary: "There are 2/3 test cases Pass".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "Not all tests Pass : There are 2/3 test cases Pass"
        );
    }

    #[test]
    fn stage_wrapper_names_stage_and_cause() {
        let err = ValidationError::Install {
            project: "opensearch".to_owned(),
            reason: "dpkg exited with status 1".to_owned(),
        }
        .in_stage(Stage::Install);

        let msg = err.to_string();
        assert!(msg.contains("install"));
        assert!(msg.contains("dpkg exited with status 1"));
        assert_eq!(err.stage(), Some(Stage::Install));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn cleanup_after_failure_reports_both_messages() {
        let primary = ValidationError::ValidationFailed {
            summary: "There are 0/3 test cases Pass".to_owned(),
        }
        .in_stage(Stage::Validate);
        let cleanup = ValidationError::Cleanup {
            project: "opensearch".to_owned(),
            reason: "no such process".to_owned(),
        }
        .in_stage(Stage::Cleanup);

        let err = ValidationError::CleanupAfterFailure {
            primary: Box::new(primary),
            cleanup: Box::new(cleanup),
        };

        let msg = err.to_string();
        assert!(msg.contains("0/3"));
        assert!(msg.contains("no such process"));
        assert_eq!(err.stage(), Some(Stage::Validate));
    }
}
