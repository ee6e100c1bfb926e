//! Target selection: projects, packaging formats, platforms, architectures,
//! and artifact sources.
//!
//! Each type renders to the exact token used in artifact URLs and parses
//! from the same token on the command line.

use clap::ValueEnum;
use std::fmt;

/// A project whose bundle is validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum Project {
    /// The search server.
    #[value(name = "opensearch")]
    OpenSearch,
    /// The dashboards companion.
    #[value(name = "opensearch-dashboards")]
    Dashboards,
}

impl Project {
    /// Returns the project name used in URLs, package names, and units.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenSearch => "opensearch",
            Self::Dashboards => "opensearch-dashboards",
        }
    }

    /// Returns `true` for the dashboards companion.
    #[must_use]
    pub const fn is_dashboards(self) -> bool {
        matches!(self, Self::Dashboards)
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The packaging mechanism under test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum DistributionFormat {
    /// Gzip-compressed tarball.
    #[default]
    Tar,
    /// Zip archive.
    Zip,
    /// Debian package.
    Deb,
    /// RPM package.
    Rpm,
    /// Yum repository definition.
    Yum,
}

impl DistributionFormat {
    /// Returns the token used on the command line and in staging URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::Zip => "zip",
            Self::Deb => "deb",
            Self::Rpm => "rpm",
            Self::Yum => "yum",
        }
    }

    /// Returns the file extension of the artifact.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Tar => "tar.gz",
            Self::Zip => "zip",
            Self::Deb => "deb",
            Self::Rpm => "rpm",
            Self::Yum => "repo",
        }
    }

    /// Returns the distribution directory in staging build paths.
    ///
    /// Yum repositories are produced by the rpm build.
    #[must_use]
    pub const fn staging_token(self) -> &'static str {
        match self {
            Self::Yum => "rpm",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for DistributionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system family of the artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum Platform {
    /// Linux.
    Linux,
    /// Windows.
    Windows,
    /// macOS.
    Darwin,
}

impl Platform {
    /// Returns the platform the validator is running on.
    #[must_use]
    pub fn host() -> Self {
        match std::env::consts::OS {
            "windows" => Self::Windows,
            "macos" => Self::Darwin,
            _ => Self::Linux,
        }
    }

    /// Returns the URL token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Darwin => "darwin",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture of the artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum Architecture {
    /// 64-bit x86.
    X64,
    /// 64-bit ARM.
    Arm64,
}

impl Architecture {
    /// Returns the architecture the validator is running on.
    #[must_use]
    pub fn host() -> Self {
        match std::env::consts::ARCH {
            "aarch64" => Self::Arm64,
            _ => Self::X64,
        }
    }

    /// Returns the URL token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where artifacts come from when no explicit path is supplied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum ArtifactSource {
    /// Published release bundles.
    #[default]
    Production,
    /// CI staging builds, addressed by build number.
    Staging,
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => f.write_str("production"),
            Self::Staging => f.write_str("staging"),
        }
    }
}
