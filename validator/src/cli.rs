//! CLI argument definitions for the bundle validator.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::distribution::{Architecture, ArtifactSource, DistributionFormat, Platform, Project};
use camino::Utf8PathBuf;
use clap::Parser;

/// Validate that a distribution bundle installs, starts, and serves its API.
#[derive(Parser, Debug, Clone)]
#[command(name = "bundle-validator")]
#[command(about)]
#[command(long_about = concat!(
    "Validate a freshly built distribution bundle.\n\n",
    "The validator fetches the artifact for each requested project, installs it ",
    "with the tooling of its packaging format, starts the services, probes the ",
    "HTTP API, and finally stops and removes everything it started.\n\n",
    "Artifacts come from the published releases by default. Use ",
    "--artifact-type staging with build numbers to test CI builds, or ",
    "--file-path to test a local file or an explicit URL.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Validate a released tarball:\n",
    "    $ bundle-validator --version 2.3.0 --projects opensearch\n\n",
    "  Validate a staging rpm together with dashboards:\n",
    "    $ bundle-validator --version 2.12.0 --distribution rpm --artifact-type staging \\\n",
    "        --os-build-number 9001 --osd-build-number 7001 \\\n",
    "        --projects opensearch opensearch-dashboards\n\n",
    "  Validate a local artifact:\n",
    "    $ bundle-validator --projects opensearch \\\n",
    "        --file-path opensearch=/tmp/opensearch-2.12.0-linux-x64.tar.gz\n\n",
    "  Show the resolved artifact locations only:\n",
    "    $ bundle-validator --version 2.3.0 --projects opensearch --dry-run",
))]
pub struct Cli {
    /// Product version under test, e.g. 2.12.0.
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// Packaging format of the artifact.
    #[arg(long, value_enum, default_value_t = DistributionFormat::Tar)]
    pub distribution: DistributionFormat,

    /// Artifact platform [default: host platform].
    #[arg(long, value_enum)]
    pub platform: Option<Platform>,

    /// Artifact architecture [default: host architecture].
    #[arg(long, value_enum)]
    pub arch: Option<Architecture>,

    /// Projects to validate, in install order.
    #[arg(long, value_enum, num_args = 1.., required = true)]
    pub projects: Vec<Project>,

    /// Local path or URL of a project's artifact, as PROJECT=PATH (repeatable).
    #[arg(long, value_name = "PROJECT=PATH")]
    pub file_path: Vec<String>,

    /// Published releases or CI staging builds.
    #[arg(long, value_enum, default_value_t = ArtifactSource::Production)]
    pub artifact_type: ArtifactSource,

    /// Staging build number of the server.
    #[arg(long, value_name = "N")]
    pub os_build_number: Option<String>,

    /// Staging build number of the dashboards companion.
    #[arg(long, value_name = "N")]
    pub osd_build_number: Option<String>,

    /// Probe over HTTPS even when no security plugin is detected.
    #[arg(long)]
    pub force_https_check: bool,

    /// Accept bundles that ship without the security plugin.
    #[arg(long)]
    pub allow_without_security: bool,

    /// TOML file overriding endpoints, base URLs, and readiness timing.
    #[arg(long, value_name = "FILE")]
    pub settings: Option<Utf8PathBuf>,

    /// Print resolved artifact locations and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
