//! Resolution of artifact locations.
//!
//! An artifact is either supplied by the caller (a local path or a URL) or
//! synthesised from the version, target triple, packaging format, and
//! artifact source. URL templates are fixed by the release infrastructure;
//! only the base URLs come from [`Settings`].

use crate::artifact::download::file_name;
use crate::distribution::{ArtifactSource, DistributionFormat, Project};
use crate::error::Result;
use crate::run_config::RunConfig;
use bundle_validation_common::settings::Settings;
use bundle_validation_common::version::Version;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Where an artifact lives before it is fetched into the work area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtifactLocation {
    /// A file on the local filesystem.
    Local(Utf8PathBuf),
    /// An HTTP(S) URL.
    Remote(String),
}

impl ArtifactLocation {
    /// Classifies a caller-supplied location.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_validator::artifact::locator::ArtifactLocation;
    ///
    /// assert!(matches!(
    ///     ArtifactLocation::parse("https://example.test/opensearch-2.3.0-linux-x64.tar.gz"),
    ///     ArtifactLocation::Remote(_),
    /// ));
    /// assert!(matches!(
    ///     ArtifactLocation::parse("/tmp/opensearch-2.3.0-linux-x64.tar.gz"),
    ///     ArtifactLocation::Local(_),
    /// ));
    /// ```
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.starts_with("https://") || value.starts_with("http://") {
            Self::Remote(value.to_owned())
        } else {
            Self::Local(Utf8PathBuf::from(value))
        }
    }

    /// Returns the final path segment, e.g. `opensearch-2.3.0-linux-x64.tar.gz`.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::Local(path) => path.file_name(),
            Self::Remote(url) => file_name(url),
        }
    }

    /// Returns `true` for HTTP(S) locations.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{path}"),
            Self::Remote(url) => f.write_str(url),
        }
    }
}

/// Derives artifact locations from a [`RunConfig`].
#[derive(Clone, Debug)]
pub struct ArtifactLocator {
    production_base_url: String,
    staging_base_url: String,
}

impl ArtifactLocator {
    /// Creates a locator over the given base URLs.
    ///
    /// The project name is appended directly to each base.
    #[must_use]
    pub fn new(production_base_url: impl Into<String>, staging_base_url: impl Into<String>) -> Self {
        Self {
            production_base_url: production_base_url.into(),
            staging_base_url: staging_base_url.into(),
        }
    }

    /// Creates a locator over the base URLs in `settings`.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.production_base_url.clone(),
            settings.staging_base_url.clone(),
        )
    }

    /// Resolves the location of `project`'s artifact and records it in
    /// `config.file_paths`.
    ///
    /// A supplied URL overwrites `config.version` with the version embedded
    /// in its file name. A supplied local path leaves a known version alone
    /// and only fills an unset one from the file name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ValidationError::Config`] when a URL must be
    /// synthesised but the version or a staging build number is missing.
    pub fn resolve(&self, project: Project, config: &mut RunConfig) -> Result<ArtifactLocation> {
        let supplied = config
            .file_paths
            .get(&project)
            .map(|value| ArtifactLocation::parse(value));
        if let Some(location) = supplied {
            let derived = location.file_name().and_then(version_from_filename);
            match (&location, derived) {
                (ArtifactLocation::Remote(_), Some(version)) => {
                    info!("using version {version} from {location}");
                    config.version = Some(version);
                }
                (ArtifactLocation::Local(_), Some(version)) if config.version.is_none() => {
                    info!("using version {version} from {location}");
                    config.version = Some(version);
                }
                _ => {}
            }
            debug!("{project} artifact supplied as {location}");
            return Ok(location);
        }

        let url = self.synthesize_url(project, config)?;
        debug!("{project} artifact resolved to {url}");
        config.file_paths.insert(project, url.clone());
        Ok(ArtifactLocation::Remote(url))
    }

    /// Builds the download URL for `project` from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ValidationError::Config`] when the version is
    /// unset or a staging build number is missing.
    pub fn synthesize_url(&self, project: Project, config: &RunConfig) -> Result<String> {
        let version = config.version()?;
        let format = config.distribution;
        let url = match (config.artifact_source, format) {
            (ArtifactSource::Production, DistributionFormat::Yum) => {
                let line = version.release_line();
                format!("{}{project}/{line}/{project}-{line}.repo", self.production_base_url)
            }
            (ArtifactSource::Production, _) => format!(
                "{}{project}/{version}/{}",
                self.production_base_url,
                package_file_name(project, version, config)
            ),
            (ArtifactSource::Staging, DistributionFormat::Yum) => format!(
                "{}{}{project}-{version}.staging.repo",
                self.staging_base_url,
                staging_prefix(project, version, config)?
            ),
            (ArtifactSource::Staging, _) => format!(
                "{}{}{}",
                self.staging_base_url,
                staging_prefix(project, version, config)?,
                package_file_name(project, version, config)
            ),
        };
        Ok(url)
    }
}

/// `<project>/<version>/<build>/<platform>/<arch>/<distribution>/dist/<project>/`
fn staging_prefix(project: Project, version: Version, config: &RunConfig) -> Result<String> {
    let build = config.build_number(project)?;
    Ok(format!(
        "{project}/{version}/{build}/{}/{}/{}/dist/{project}/",
        config.platform,
        config.architecture,
        config.distribution.staging_token()
    ))
}

/// `<project>-<version>-<platform>-<arch>.<ext>`
fn package_file_name(project: Project, version: Version, config: &RunConfig) -> String {
    format!(
        "{project}-{version}-{}-{}.{}",
        config.platform,
        config.architecture,
        config.distribution.extension()
    )
}

/// Extracts the first `MAJOR.MINOR.PATCH` triple from a file name.
///
/// # Examples
///
/// ```
/// use bundle_validation_common::version::Version;
/// use bundle_validator::artifact::locator::version_from_filename;
///
/// assert_eq!(
///     version_from_filename("opensearch-1.3.12.staging.repo"),
///     Some(Version::new(1, 3, 12)),
/// );
/// assert_eq!(version_from_filename("opensearch-latest.tar.gz"), None);
/// ```
#[must_use]
pub fn version_from_filename(name: &str) -> Option<Version> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"\d+\.\d+\.\d+").ok())
        .as_ref()?;
    let base = Utf8Path::new(name).file_name().unwrap_or(name);
    pattern
        .find(base)
        .and_then(|found| found.as_str().parse().ok())
}
