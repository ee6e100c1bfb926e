//! Running OS commands for package-manager and service-manager steps.
//!
//! Commands are described by [`CommandSpec`] and executed through the
//! [`CommandExecutor`] trait so tests can script the expected invocations.
//! Environment values attached to a spec are passed to the child process
//! only; they never appear in the spec's `Display` output and therefore
//! never reach the logs.

use crate::error::{Result, ValidationError};
use camino::Utf8PathBuf;
use log::{debug, warn};
use std::fmt;
use std::process::{Command, Output};

/// A command line plus working directory and extra environment.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    current_dir: Option<Utf8PathBuf>,
    env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Starts a spec for `program`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_validator::executor::CommandSpec;
    ///
    /// let spec = CommandSpec::new("systemctl").args(["start", "opensearch"]);
    /// assert_eq!(spec.to_string(), "systemctl start opensearch");
    /// ```
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env: Vec::new(),
        }
    }

    /// Starts a spec that runs `program` through `sudo`.
    ///
    /// Environment variables set with [`Self::env`] are forwarded with
    /// `--preserve-env` so they stay out of the argument list.
    #[must_use]
    pub fn sudo(program: impl Into<String>) -> Self {
        Self::new("sudo").arg(program)
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Adds an environment variable for the child process.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if self.program == "sudo" {
            self.args.insert(0, format!("--preserve-env={key}"));
        }
        self.env.push((key, value.into()));
        self
    }

    /// Returns the program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the working directory, if set.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Utf8PathBuf> {
        self.current_dir.as_ref()
    }

    /// Returns the names of the extra environment variables.
    pub fn env_keys(&self) -> impl Iterator<Item = &str> {
        self.env.iter().map(|(key, _)| key.as_str())
    }

    /// Builds the corresponding [`std::process::Command`].
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command.envs(self.env.iter().map(|(key, value)| (key, value)));
        command
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("current_dir", &self.current_dir)
            .field("env", &self.env_keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Abstraction for running external commands to completion.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs the command and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    fn run(&self, command: &CommandSpec) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, command: &CommandSpec) -> Result<Output> {
        command.to_command().output().map_err(ValidationError::from)
    }
}

/// Runs `command` and fails unless it exits successfully.
///
/// The error message carries the exit status and trimmed stderr.
///
/// # Errors
///
/// Returns the spawn error, or a message describing the failed exit as a
/// plain string for the caller to wrap into its stage-specific variant.
pub fn run_checked(
    executor: &dyn CommandExecutor,
    command: &CommandSpec,
) -> Result<Output, String> {
    debug!("running {command}");
    let output = executor.run(command).map_err(|e| format!("`{command}`: {e}"))?;
    if output.status.success() {
        return Ok(output);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(format!(
        "`{command}` exited with {}: {}",
        output.status,
        stderr.trim()
    ))
}

/// Runs `command`, logging instead of failing when it does not succeed.
///
/// Used for idempotent preparation steps such as purging a previous install.
pub fn run_lenient(executor: &dyn CommandExecutor, command: &CommandSpec) {
    if let Err(message) = run_checked(executor, command) {
        warn!("ignoring failed preparation step: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{failure_output, success_output};

    #[test]
    fn display_omits_environment_values() {
        let spec = CommandSpec::sudo("rpm")
            .args(["-ivh", "opensearch-2.12.0-linux-x64.rpm"])
            .env("OPENSEARCH_INITIAL_ADMIN_PASSWORD", "hunter2");

        let rendered = spec.to_string();
        assert_eq!(
            rendered,
            "sudo --preserve-env=OPENSEARCH_INITIAL_ADMIN_PASSWORD rpm -ivh opensearch-2.12.0-linux-x64.rpm"
        );
        assert!(!format!("{spec:?}").contains("hunter2"));
    }

    #[test]
    fn env_is_not_preserved_through_sudo_for_plain_commands() {
        let spec = CommandSpec::new("opensearch-tar-install.sh").env("KEY", "value");
        assert_eq!(spec.to_string(), "opensearch-tar-install.sh");
        assert_eq!(spec.env_keys().collect::<Vec<_>>(), vec!["KEY"]);
    }

    #[test]
    fn run_checked_returns_output_on_success() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run()
            .withf(|spec| spec.program() == "systemctl")
            .times(1)
            .returning(|_| Ok(success_output()));

        let result = run_checked(&executor, &CommandSpec::new("systemctl").arg("status"));
        assert!(result.is_ok());
    }

    #[test]
    fn run_checked_reports_stderr_on_failure() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run()
            .times(1)
            .returning(|_| Ok(failure_output("package not found\n")));

        let message = run_checked(&executor, &CommandSpec::new("dpkg").args(["-i", "x.deb"]))
            .expect_err("expected failure");
        assert!(message.contains("dpkg -i x.deb"));
        assert!(message.contains("package not found"));
    }

    #[test]
    fn run_lenient_swallows_failures() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run()
            .times(1)
            .returning(|_| Ok(failure_output("not installed")));

        run_lenient(&executor, &CommandSpec::new("dpkg").args(["--purge", "opensearch"]));
    }
}
