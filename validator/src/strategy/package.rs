//! Deb, rpm, and yum bundles installed through the OS package manager.
//!
//! Every step is an external command run through the injected
//! [`CommandExecutor`](crate::executor::CommandExecutor). Preparation steps
//! that remove a previous install are lenient; the install, start, and
//! removal steps are strict. Services are managed with `systemctl`.

use crate::distribution::Project;
use crate::error::{Result, ValidationError};
use crate::executor::{CommandSpec, run_checked, run_lenient};
use crate::pipeline::{LifecycleStage, PipelineContext};
use crate::strategy::{has_security_plugin, join_failures};
use bundle_validation_common::password::INITIAL_ADMIN_PASSWORD_ENV;
use camino::Utf8Path;
use log::info;

/// The package manager driving an install.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackageManager {
    /// `dpkg` with a local `.deb`.
    Deb,
    /// `rpm` with a local `.rpm`.
    Rpm,
    /// `yum` with a fetched `.repo` definition.
    Yum,
}

impl PackageManager {
    /// Command that removes `project`, tolerated to fail before install.
    #[must_use]
    pub fn remove_command(self, project: Project) -> CommandSpec {
        match self {
            Self::Deb => CommandSpec::sudo("dpkg").args(["--purge", project.as_str()]),
            Self::Rpm | Self::Yum => {
                CommandSpec::sudo("yum").args(["remove", project.as_str(), "-y"])
            }
        }
    }

    const fn imports_signing_key(self) -> bool {
        matches!(self, Self::Rpm | Self::Yum)
    }

    const fn enables_unit(self) -> bool {
        matches!(self, Self::Deb)
    }
}

/// Lifecycle for package-manager installs.
#[derive(Debug)]
pub struct PackageStrategy {
    manager: PackageManager,
    installed: Vec<Project>,
}

impl PackageStrategy {
    /// Creates a strategy driven by `manager`.
    #[must_use]
    pub const fn new(manager: PackageManager) -> Self {
        Self {
            manager,
            installed: Vec::new(),
        }
    }

    fn install_commands(
        &self,
        ctx: &PipelineContext<'_>,
        project: Project,
        password: &str,
    ) -> Result<Vec<CommandSpec>> {
        let artifact = ctx.artifact(project)?;
        let commands = match self.manager {
            PackageManager::Deb => vec![
                CommandSpec::sudo("dpkg")
                    .args(["-i", artifact.as_str()])
                    .env(INITIAL_ADMIN_PASSWORD_ENV, password),
            ],
            PackageManager::Rpm => vec![
                CommandSpec::sudo("rpm")
                    .args(["-ivh", artifact.as_str()])
                    .env(INITIAL_ADMIN_PASSWORD_ENV, password),
            ],
            PackageManager::Yum => {
                let repo_name = artifact.file_name().ok_or_else(|| ValidationError::Artifact {
                    path: artifact.to_string(),
                    reason: "repository definition has no file name".to_owned(),
                })?;
                let target = Utf8Path::new(&ctx.settings.yum_repo_dir).join(repo_name);
                let package = format!("{project}-{}", ctx.config.version()?);
                vec![
                    CommandSpec::sudo("cp").args([artifact.as_str(), target.as_str()]),
                    CommandSpec::sudo("yum")
                        .args(["install", package.as_str(), "-y"])
                        .env(INITIAL_ADMIN_PASSWORD_ENV, password),
                ]
            }
        };
        Ok(commands)
    }

    fn start_commands(&self, project: Project) -> Vec<CommandSpec> {
        let systemctl = |verb: &str| CommandSpec::sudo("systemctl").args([verb, project.as_str()]);
        let mut commands = Vec::new();
        if self.manager.enables_unit() {
            commands.push(systemctl("enable"));
        }
        commands.push(systemctl("start"));
        commands.push(systemctl("status"));
        commands
    }
}

impl LifecycleStage for PackageStrategy {
    fn install(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()> {
        let credential = ctx.credential()?;
        let executor = ctx.tools.executor;
        if self.manager.imports_signing_key() {
            run_lenient(
                executor,
                &CommandSpec::sudo("rpm").args(["--import", ctx.settings.public_key_url.as_str()]),
            );
        }
        for project in ctx.config.projects.clone() {
            run_lenient(executor, &self.manager.remove_command(project));
            let commands = self.install_commands(ctx, project, credential.expose())?;
            // A partial install still needs removing.
            self.installed.push(project);
            for command in commands {
                run_checked(executor, &command).map_err(|reason| ValidationError::Install {
                    project: project.to_string(),
                    reason,
                })?;
            }
            info!("installed {project} with {:?}", self.manager);
        }
        Ok(())
    }

    fn start_cluster(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()> {
        for project in &ctx.config.projects {
            for command in self.start_commands(*project) {
                let output = run_checked(ctx.tools.executor, &command).map_err(|reason| {
                    ValidationError::ClusterStart {
                        project: project.to_string(),
                        reason,
                    }
                })?;
                let stdout = String::from_utf8_lossy(&output.stdout);
                if !stdout.trim().is_empty() {
                    log::debug!("{command}: {}", stdout.trim());
                }
            }
        }
        let secure = ctx.use_https(self.security_plugin_present(ctx));
        ctx.wait_for_services(secure)
    }

    fn security_plugin_present(&self, ctx: &PipelineContext<'_>) -> bool {
        has_security_plugin(Utf8Path::new(&ctx.settings.package_install_root))
    }

    fn cleanup(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()> {
        let mut failed_projects = Vec::new();
        let mut failures = Vec::new();
        for project in &self.installed {
            let steps = [
                CommandSpec::sudo("systemctl").args(["stop", project.as_str()]),
                self.manager.remove_command(*project),
            ];
            for command in steps {
                if let Err(reason) = run_checked(ctx.tools.executor, &command) {
                    failed_projects.push(project.to_string());
                    failures.push(reason);
                    break;
                }
            }
        }
        self.installed.clear();
        join_failures(failures).map_err(|reason| ValidationError::Cleanup {
            project: failed_projects.join(", "),
            reason,
        })
    }
}
