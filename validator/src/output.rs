//! Output formatting for the validator CLI.
//!
//! Messages meant for the operator go to stderr; the structured log stream
//! is handled by [`crate::logging`].

use crate::artifact::locator::ArtifactLocation;
use crate::distribution::Project;
use crate::run_config::RunConfig;
use std::io::Write;

/// Writes `message` followed by a newline, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Configuration and resolved locations for dry-run output.
///
/// # Example
///
/// ```
/// use bundle_validator::artifact::locator::ArtifactLocation;
/// use bundle_validator::distribution::Project;
/// use bundle_validator::output::DryRunInfo;
/// use bundle_validator::run_config::RunConfig;
///
/// let config = RunConfig::new(vec![Project::OpenSearch]);
/// let locations = vec![(
///     Project::OpenSearch,
///     ArtifactLocation::parse("https://example.test/opensearch-2.3.0-linux-x64.tar.gz"),
/// )];
/// let info = DryRunInfo { config: &config, locations: &locations };
///
/// let output = info.display_text();
/// assert!(output.contains("Dry run"));
/// assert!(output.contains("opensearch-2.3.0-linux-x64.tar.gz"));
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// The run configuration after resolution.
    pub config: &'a RunConfig,
    /// Resolved artifact location per project.
    pub locations: &'a [(Project, ArtifactLocation)],
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let version = self
            .config
            .version
            .map_or_else(|| "unknown".to_owned(), |version| version.to_string());
        let mut lines = vec![
            "Dry run - nothing will be downloaded, installed, or started".to_owned(),
            String::new(),
            format!("Version: {version}"),
            format!("Distribution: {}", self.config.distribution),
            format!("Platform: {}", self.config.platform),
            format!("Architecture: {}", self.config.architecture),
            format!("Artifact source: {}", self.config.artifact_source),
            format!("Force HTTPS check: {}", self.config.force_https_check),
            format!(
                "Allow without security: {}",
                self.config.allow_without_security
            ),
            String::new(),
            "Artifacts:".to_owned(),
        ];
        for (project, location) in self.locations {
            lines.push(format!("  - {project}: {location}"));
        }
        lines.join("\n")
    }
}
