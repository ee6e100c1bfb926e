//! Bundle validator CLI entrypoint.
//!
//! This binary validates one distribution bundle end to end: fetch, install,
//! start, probe, and clean up. The process exits with status 0 when every
//! stage succeeded and 1 otherwise, printing the error chain to stderr.

use bundle_validation_common::settings::Settings;
use bundle_validator::artifact::download::HttpDownloader;
use bundle_validator::artifact::extraction::SystemArchiveExtractor;
use bundle_validator::cli::Cli;
use bundle_validator::error::{Result, ValidationError};
use bundle_validator::executor::SystemCommandExecutor;
use bundle_validator::logging;
use bundle_validator::output::{DryRunInfo, write_stderr_line};
use bundle_validator::pipeline::{self, Collaborators, PipelineContext, resolve_locations};
use bundle_validator::probe::HttpProbe;
use bundle_validator::process::SystemProcessLauncher;
use bundle_validator::run_config::RunConfig;
use bundle_validator::strategy::Strategy;
use clap::Parser;
use std::error::Error as _;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    if let Err(e) = logging::init(cli.verbosity, cli.quiet) {
        write_stderr_line(&mut stderr, format!("logging disabled: {e}"));
    }
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let settings = load_settings(cli)?;
    let mut config = RunConfig::from_cli(cli)?;

    if cli.dry_run {
        let locations = resolve_locations(&mut config, &settings)?;
        let info = DryRunInfo {
            config: &config,
            locations: &locations,
        };
        write_stderr_line(stderr, info.display_text());
        return Ok(());
    }

    let executor = SystemCommandExecutor;
    let launcher = SystemProcessLauncher;
    let fetcher = HttpDownloader;
    let extractor = SystemArchiveExtractor;
    let probe = HttpProbe;
    let tools = Collaborators {
        executor: &executor,
        launcher: &launcher,
        fetcher: &fetcher,
        extractor: &extractor,
        probe: &probe,
    };

    let mut strategy = Strategy::for_config(&config);
    let mut ctx = PipelineContext::new(config, &settings, tools)?;
    pipeline::run(&mut strategy, &mut ctx)?;

    if !cli.quiet {
        write_stderr_line(stderr, "Validation successful");
    }
    Ok(())
}

/// Loads settings from `--settings`, or the built-in defaults.
fn load_settings(cli: &Cli) -> Result<Settings> {
    Settings::load_or_default(cli.settings.as_deref().map(camino::Utf8Path::as_std_path))
        .map_err(|e| ValidationError::Config {
            reason: e.to_string(),
        })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, &err);
            let mut source = err.source();
            while let Some(cause) = source {
                write_stderr_line(stderr, format!("  caused by: {cause}"));
                source = cause.source();
            }
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_validator::pipeline::Stage;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_chain_and_returns_one() {
        let err = ValidationError::ClusterStart {
            project: "opensearch".to_owned(),
            reason: "not ready".to_owned(),
        }
        .in_stage(Stage::StartCluster);

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.starts_with("start stage failed"));
        assert!(stderr_text.contains("caused by: failed to start opensearch: not ready"));
    }

    #[test]
    fn missing_settings_file_is_a_configuration_error() {
        let cli = Cli::parse_from([
            "bundle-validator",
            "--version",
            "2.3.0",
            "--projects",
            "opensearch",
            "--settings",
            "/nonexistent/validator.toml",
        ]);

        let err = load_settings(&cli).expect_err("expected failure");
        assert!(matches!(err, ValidationError::Config { .. }));
    }
}
