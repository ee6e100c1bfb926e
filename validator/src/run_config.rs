//! The per-invocation run configuration.
//!
//! [`RunConfig`] is built once from the command line and is immutable apart
//! from the version and artifact locations that resolution fills in.

use crate::cli::Cli;
use crate::distribution::{Architecture, ArtifactSource, DistributionFormat, Platform, Project};
use crate::error::{Result, ValidationError};
use bundle_validation_common::version::Version;
use std::collections::BTreeMap;

/// Resolved configuration for one validation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Projects in install/start/cleanup order.
    pub projects: Vec<Project>,
    /// Version under test; back-filled from an artifact URL when unset.
    pub version: Option<Version>,
    /// Target architecture.
    pub architecture: Architecture,
    /// Target platform.
    pub platform: Platform,
    /// Packaging format.
    pub distribution: DistributionFormat,
    /// Where to look for artifacts when no path is supplied.
    pub artifact_source: ArtifactSource,
    /// CI build number per project, required for staging artifacts.
    pub build_numbers: BTreeMap<Project, String>,
    /// Supplied or resolved artifact location per project.
    pub file_paths: BTreeMap<Project, String>,
    /// Probe over HTTPS even when no security plugin marker is found.
    pub force_https_check: bool,
    /// Accept a bundle without the security plugin (Windows zip layout).
    pub allow_without_security: bool,
}

impl RunConfig {
    /// Returns a configuration for `projects` with host defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_validator::distribution::Project;
    /// use bundle_validator::run_config::RunConfig;
    ///
    /// let config = RunConfig::new(vec![Project::OpenSearch]);
    /// assert!(config.version.is_none());
    /// assert!(!config.includes_dashboards());
    /// ```
    #[must_use]
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            projects,
            version: None,
            architecture: Architecture::host(),
            platform: Platform::host(),
            distribution: DistributionFormat::default(),
            artifact_source: ArtifactSource::default(),
            build_numbers: BTreeMap::new(),
            file_paths: BTreeMap::new(),
            force_https_check: false,
            allow_without_security: false,
        }
    }

    /// Builds and validates the configuration from parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Config`] when the version is malformed,
    /// neither a version nor file paths are given, a `--file-path` names an
    /// unrequested project, or a staging run lacks a build number.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut projects = Vec::new();
        for project in &cli.projects {
            if !projects.contains(project) {
                projects.push(*project);
            }
        }

        let version = cli.version.as_deref().map(parse_version).transpose()?;
        let file_paths = parse_file_paths(&cli.file_path, &projects)?;

        let mut build_numbers = BTreeMap::new();
        if let Some(number) = &cli.os_build_number {
            build_numbers.insert(Project::OpenSearch, number.clone());
        }
        if let Some(number) = &cli.osd_build_number {
            build_numbers.insert(Project::Dashboards, number.clone());
        }

        let config = Self {
            projects,
            version,
            architecture: cli.arch.unwrap_or_else(Architecture::host),
            platform: cli.platform.unwrap_or_else(Platform::host),
            distribution: cli.distribution,
            artifact_source: cli.artifact_type,
            build_numbers,
            file_paths,
            force_https_check: cli.force_https_check,
            allow_without_security: cli.allow_without_security,
        };
        config.check()?;
        Ok(config)
    }

    /// Returns `true` when the dashboards companion is part of the run.
    #[must_use]
    pub fn includes_dashboards(&self) -> bool {
        self.projects.iter().any(|project| project.is_dashboards())
    }

    /// Returns the version, which must be known by the time it is consumed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Config`] when the version is still unset.
    pub fn version(&self) -> Result<Version> {
        self.version.ok_or_else(|| ValidationError::Config {
            reason: "version is unknown; pass --version or an artifact path containing one"
                .to_owned(),
        })
    }

    /// Returns the staging build number for `project`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Config`] when no build number was given.
    pub fn build_number(&self, project: Project) -> Result<&str> {
        self.build_numbers
            .get(&project)
            .map(String::as_str)
            .ok_or_else(|| ValidationError::Config {
                reason: format!("staging artifacts for {project} require a build number"),
            })
    }

    fn check(&self) -> Result<()> {
        if self.projects.is_empty() {
            return Err(config_error("at least one project is required"));
        }
        if self.file_paths.is_empty() {
            if self.version.is_none() {
                return Err(config_error(
                    "either --version or --file-path is required",
                ));
            }
            if self.artifact_source == ArtifactSource::Staging {
                for project in &self.projects {
                    self.build_number(*project)?;
                }
            }
        } else if let Some(project) = self
            .projects
            .iter()
            .find(|project| !self.file_paths.contains_key(project))
        {
            return Err(config_error(&format!(
                "--file-path was given for some projects but not for {project}"
            )));
        }
        Ok(())
    }
}

fn parse_version(value: &str) -> Result<Version> {
    value.parse().map_err(|e: bundle_validation_common::version::VersionError| {
        ValidationError::Config {
            reason: e.to_string(),
        }
    })
}

fn parse_file_paths(entries: &[String], projects: &[Project]) -> Result<BTreeMap<Project, String>> {
    let mut paths = BTreeMap::new();
    for entry in entries {
        let (name, path) = entry
            .split_once('=')
            .ok_or_else(|| config_error(&format!("--file-path expects PROJECT=PATH, got {entry}")))?;
        let project = projects
            .iter()
            .copied()
            .find(|project| project.as_str() == name.trim())
            .ok_or_else(|| {
                config_error(&format!("--file-path names {name}, which is not a requested project"))
            })?;
        let path = path.trim();
        if path.is_empty() {
            return Err(config_error(&format!("--file-path for {project} is empty")));
        }
        paths.insert(project, path.to_owned());
    }
    Ok(paths)
}

fn config_error(reason: &str) -> ValidationError {
    ValidationError::Config {
        reason: reason.to_owned(),
    }
}
