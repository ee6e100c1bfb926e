//! Long-running service processes launched from extracted archives.
//!
//! A [`ProcessHandle`] owns the child it was created for. Termination stops
//! the whole process group on Unix, because the launch scripts fork the
//! server JVM, and escalates to a hard kill when the group ignores the
//! polite request. A handle that is dropped while still running is killed.

use crate::executor::CommandSpec;
use log::{debug, warn};
use std::process::{Child, Stdio};
use std::time::Duration;
use thiserror::Error;
use wait_timeout::ChildExt;

/// Grace period between the polite stop request and the hard kill.
const TERMINATE_GRACE: Duration = Duration::from_secs(30);

/// Errors raised while starting or stopping a service process.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The process could not be spawned.
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        /// The rendered command line.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The process could not be stopped.
    #[error("failed to terminate process {pid}: {reason}")]
    Terminate {
        /// Process identifier.
        pid: u32,
        /// Description of the failure.
        reason: String,
    },
}

/// Lifecycle state of a [`ProcessHandle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    /// The process was started and has not been terminated.
    Started,
    /// The process has been terminated or was never owned.
    Stopped,
}

/// An owned, started service process.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    child: Option<Child>,
    state: ProcessState,
}

impl ProcessHandle {
    /// Wraps a spawned child.
    #[must_use]
    pub fn from_child(child: Child) -> Self {
        Self {
            pid: child.id(),
            child: Some(child),
            state: ProcessState::Started,
        }
    }

    /// Creates a handle that owns no OS process, for launcher doubles.
    #[must_use]
    pub const fn detached(pid: u32) -> Self {
        Self {
            pid,
            child: None,
            state: ProcessState::Started,
        }
    }

    /// Returns the process identifier.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ProcessState {
        self.state
    }

    /// Marks the handle stopped without touching any OS process.
    pub fn mark_stopped(&mut self) {
        self.state = ProcessState::Stopped;
    }

    fn terminate(&mut self, grace: Duration) -> Result<(), ProcessError> {
        let pid = self.pid;
        let Some(child) = self.child.as_mut() else {
            self.state = ProcessState::Stopped;
            return Ok(());
        };
        if matches!(child.try_wait(), Ok(Some(_))) {
            self.state = ProcessState::Stopped;
            return Ok(());
        }

        signal_group(pid, Signal::Terminate);
        let exited = child
            .wait_timeout(grace)
            .map_err(|e| ProcessError::Terminate {
                pid,
                reason: e.to_string(),
            })?;
        if exited.is_none() {
            warn!("process {pid} ignored the stop request; killing it");
            signal_group(pid, Signal::Kill);
            child.kill().or_else(|e| {
                if e.kind() == std::io::ErrorKind::InvalidInput {
                    Ok(())
                } else {
                    Err(ProcessError::Terminate {
                        pid,
                        reason: e.to_string(),
                    })
                }
            })?;
            child.wait().map_err(|e| ProcessError::Terminate {
                pid,
                reason: e.to_string(),
            })?;
        }
        self.state = ProcessState::Stopped;
        Ok(())
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if self.state == ProcessState::Started && self.child.is_some() {
            debug!("stopping process {} on drop", self.pid);
            if let Err(e) = self.terminate(Duration::from_secs(5)) {
                warn!("{e}");
            }
        }
    }
}

/// Starts and stops service processes.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessLauncher {
    /// Starts `command` without waiting for it to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Spawn`] when the process cannot be started.
    fn start(&self, command: &CommandSpec) -> Result<ProcessHandle, ProcessError>;

    /// Stops the process behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Terminate`] when the process cannot be stopped.
    fn terminate(&self, handle: &mut ProcessHandle) -> Result<(), ProcessError>;
}

/// Launches processes on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessLauncher;

impl ProcessLauncher for SystemProcessLauncher {
    fn start(&self, command: &CommandSpec) -> Result<ProcessHandle, ProcessError> {
        let mut process = command.to_command();
        process
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            process.process_group(0);
        }
        let child = process.spawn().map_err(|source| ProcessError::Spawn {
            command: command.to_string(),
            source,
        })?;
        debug!("started `{command}` as process {}", child.id());
        Ok(ProcessHandle::from_child(child))
    }

    fn terminate(&self, handle: &mut ProcessHandle) -> Result<(), ProcessError> {
        handle.terminate(TERMINATE_GRACE)
    }
}

#[derive(Clone, Copy, Debug)]
enum Signal {
    Terminate,
    Kill,
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: Signal) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    let signal = match signal {
        Signal::Terminate => libc::SIGTERM,
        Signal::Kill => libc::SIGKILL,
    };
    // SAFETY: `kill` has no memory-safety preconditions; the group id comes
    // from a child this handle spawned with `process_group(0)`.
    let rc = unsafe { libc::kill(-pgid, signal) };
    if rc != 0 {
        debug!(
            "signalling process group {pgid} failed: {}",
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(windows)]
fn signal_group(pid: u32, signal: Signal) {
    if matches!(signal, Signal::Terminate) {
        return;
    }
    let status = std::process::Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if let Err(e) = status {
        debug!("taskkill for process {pid} failed: {e}");
    }
}
