//! Tests for validator CLI parsing and default behaviours.

use super::*;
use clap::CommandFactory;
use rstest::rstest;

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn cli_parses_defaults() {
    let cli = Cli::parse_from(["bundle-validator", "--projects", "opensearch"]);
    assert!(cli.version.is_none());
    assert_eq!(cli.distribution, DistributionFormat::Tar);
    assert!(cli.platform.is_none());
    assert!(cli.arch.is_none());
    assert_eq!(cli.projects, vec![Project::OpenSearch]);
    assert!(cli.file_path.is_empty());
    assert_eq!(cli.artifact_type, ArtifactSource::Production);
    assert!(!cli.force_https_check);
    assert!(!cli.allow_without_security);
    assert!(!cli.dry_run);
    assert_eq!(cli.verbosity, 0);
    assert!(!cli.quiet);
}

#[test]
fn cli_parses_product_version() {
    let cli = Cli::parse_from(["bundle-validator", "--version", "2.3.0", "--projects", "opensearch"]);
    assert_eq!(cli.version.as_deref(), Some("2.3.0"));
}

#[rstest]
#[case("tar", DistributionFormat::Tar)]
#[case("zip", DistributionFormat::Zip)]
#[case("deb", DistributionFormat::Deb)]
#[case("rpm", DistributionFormat::Rpm)]
#[case("yum", DistributionFormat::Yum)]
fn cli_parses_distribution(#[case] value: &str, #[case] expected: DistributionFormat) {
    let cli = Cli::parse_from([
        "bundle-validator",
        "--distribution",
        value,
        "--projects",
        "opensearch",
    ]);
    assert_eq!(cli.distribution, expected);
}

#[test]
fn cli_rejects_unknown_distribution() {
    let result = Cli::try_parse_from([
        "bundle-validator",
        "--distribution",
        "docker",
        "--projects",
        "opensearch",
    ]);
    assert!(result.is_err());
}

#[test]
fn cli_requires_projects() {
    let result = Cli::try_parse_from(["bundle-validator", "--version", "2.3.0"]);
    assert!(result.is_err());
}

#[test]
fn cli_parses_repeated_file_paths() {
    let cli = Cli::parse_from([
        "bundle-validator",
        "--file-path",
        "opensearch=/tmp/os.tar.gz",
        "--file-path",
        "opensearch-dashboards=/tmp/osd.tar.gz",
        "--projects",
        "opensearch",
        "opensearch-dashboards",
    ]);
    assert_eq!(cli.file_path.len(), 2);
    assert_eq!(cli.projects.len(), 2);
}

#[test]
fn cli_parses_platform_and_arch() {
    let cli = Cli::parse_from([
        "bundle-validator",
        "--platform",
        "windows",
        "--arch",
        "arm64",
        "--projects",
        "opensearch",
    ]);
    assert_eq!(cli.platform, Some(Platform::Windows));
    assert_eq!(cli.arch, Some(Architecture::Arm64));
}

#[test]
fn cli_counts_verbosity() {
    let cli = Cli::parse_from(["bundle-validator", "-vv", "--projects", "opensearch"]);
    assert_eq!(cli.verbosity, 2);
}

#[test]
fn cli_rejects_quiet_with_verbose() {
    let result = Cli::try_parse_from(["bundle-validator", "-q", "-v", "--projects", "opensearch"]);
    assert!(result.is_err());
}

#[test]
fn cli_parses_settings_path() {
    let cli = Cli::parse_from([
        "bundle-validator",
        "--settings",
        "/etc/validator.toml",
        "--projects",
        "opensearch",
    ]);
    assert_eq!(cli.settings, Some(Utf8PathBuf::from("/etc/validator.toml")));
}
