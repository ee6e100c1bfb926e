//! Shared test utilities for the validator crate.

use crate::error::{Result, ValidationError};
use crate::executor::{CommandExecutor, CommandSpec};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The rendered command line, e.g. `sudo systemctl start opensearch`.
    pub command: String,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expects `command` and answers with a successful exit.
    #[must_use]
    pub fn ok(command: &str) -> Self {
        Self {
            command: command.to_owned(),
            result: Ok(success_output()),
        }
    }

    /// Expects `command` and answers with a failed exit carrying `stderr`.
    #[must_use]
    pub fn failing(command: &str, stderr: &str) -> Self {
        Self {
            command: command.to_owned(),
            result: Ok(failure_output(stderr)),
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
/// Unexpected or out-of-order commands yield
/// [`ValidationError::StubMismatch`].
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    seen: RefCell<Vec<String>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            seen: RefCell::new(Vec::new()),
        }
    }

    /// Returns every command line received so far.
    #[must_use]
    pub fn seen(&self) -> Vec<String> {
        self.seen.borrow().clone()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        let remaining: Vec<String> = self
            .expected
            .borrow()
            .iter()
            .map(|call| call.command.clone())
            .collect();
        assert!(
            remaining.is_empty(),
            "expected further command invocations: {remaining:?}"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, command: &CommandSpec) -> Result<Output> {
        let rendered = command.to_string();
        self.seen.borrow_mut().push(rendered.clone());

        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(ValidationError::StubMismatch {
                message: format!("unexpected command `{rendered}`"),
            });
        };
        if call.command != rendered {
            return Err(ValidationError::StubMismatch {
                message: format!("expected `{}`, got `{rendered}`", call.command),
            });
        }
        call.result
    }
}

/// Mock collaborators for exercising strategies and the pipeline in unit tests.
#[cfg(test)]
pub(crate) struct Doubles {
    pub(crate) executor: StubExecutor,
    pub(crate) launcher: crate::process::MockProcessLauncher,
    pub(crate) fetcher: crate::artifact::download::MockArtifactFetcher,
    pub(crate) extractor: crate::artifact::extraction::MockArchiveExtractor,
    pub(crate) probe: crate::probe::MockApiProbe,
}

#[cfg(test)]
impl Doubles {
    /// Doubles with no scripted commands or expectations.
    pub(crate) fn new() -> Self {
        Self::with_commands(Vec::new())
    }

    /// Doubles whose executor expects `commands` in order.
    pub(crate) fn with_commands(commands: Vec<ExpectedCall>) -> Self {
        Self {
            executor: StubExecutor::new(commands),
            launcher: crate::process::MockProcessLauncher::new(),
            fetcher: crate::artifact::download::MockArtifactFetcher::new(),
            extractor: crate::artifact::extraction::MockArchiveExtractor::new(),
            probe: crate::probe::MockApiProbe::new(),
        }
    }

    /// Borrows the doubles as pipeline collaborators.
    pub(crate) fn tools(&self) -> crate::pipeline::Collaborators<'_> {
        crate::pipeline::Collaborators {
            executor: &self.executor,
            launcher: &self.launcher,
            fetcher: &self.fetcher,
            extractor: &self.extractor,
            probe: &self.probe,
        }
    }

    /// Makes every probe answer HTTP 200 with a green health body.
    pub(crate) fn healthy_cluster(mut self) -> Self {
        self.probe
            .expect_get()
            .returning(|_, _| Ok(crate::probe::ProbeResponse::new(200, "green")));
        self
    }
}
