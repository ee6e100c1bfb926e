//! Tarball and zip bundles: unpack into the work area, launch directly.
//!
//! Each project is extracted into `<work area>/<project>` with the bundle's
//! top-level directory stripped. The server is launched through its install
//! script with the bootstrap password in its environment; the dashboards
//! companion is launched through its binary. Cleanup terminates both.

use crate::distribution::{DistributionFormat, Platform, Project};
use crate::error::{Result, ValidationError};
use crate::executor::CommandSpec;
use crate::pipeline::{LifecycleStage, PipelineContext};
use crate::process::ProcessHandle;
use crate::run_config::RunConfig;
use crate::strategy::{has_security_plugin, join_failures};
use bundle_validation_common::password::{AdminCredential, INITIAL_ADMIN_PASSWORD_ENV};
use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};

/// How an archive bundle is laid out and launched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveLayout {
    /// `.tar.gz` with POSIX launch scripts.
    Tar,
    /// `.zip` with POSIX launch scripts.
    Zip,
    /// `.zip` with Windows batch launchers.
    WindowsZip,
}

impl ArchiveLayout {
    /// Picks the layout for the configured format and platform.
    #[must_use]
    pub fn for_config(config: &RunConfig) -> Self {
        match (config.distribution, config.platform) {
            (DistributionFormat::Zip, Platform::Windows) => Self::WindowsZip,
            (DistributionFormat::Zip, _) => Self::Zip,
            _ => Self::Tar,
        }
    }

    /// Server launcher, relative to the server's install root.
    #[must_use]
    pub const fn server_launcher(self) -> &'static str {
        match self {
            Self::Tar | Self::Zip => "opensearch-tar-install.sh",
            Self::WindowsZip => "opensearch-windows-install.bat",
        }
    }

    /// Dashboards launcher, relative to `<install root>/bin`.
    #[must_use]
    pub const fn dashboards_launcher(self) -> &'static str {
        match self {
            Self::Tar | Self::Zip => "opensearch-dashboards",
            Self::WindowsZip => "opensearch-dashboards.bat",
        }
    }
}

/// Lifecycle for archive bundles.
#[derive(Debug)]
pub struct ArchiveStrategy {
    layout: ArchiveLayout,
    services: Vec<(Project, ProcessHandle)>,
}

impl ArchiveStrategy {
    /// Creates a strategy for `layout`.
    #[must_use]
    pub const fn new(layout: ArchiveLayout) -> Self {
        Self {
            layout,
            services: Vec::new(),
        }
    }

    /// Returns the archive layout.
    #[must_use]
    pub const fn layout(&self) -> ArchiveLayout {
        self.layout
    }

    /// Returns the projects whose services are currently held.
    #[must_use]
    pub fn running(&self) -> Vec<Project> {
        self.services.iter().map(|(project, _)| *project).collect()
    }

    /// Builds the command that starts `project` from `root`.
    #[must_use]
    pub fn launch_command(
        &self,
        project: Project,
        root: &Utf8Path,
        credential: &AdminCredential,
    ) -> CommandSpec {
        if project.is_dashboards() {
            CommandSpec::new(root.join("bin").join(self.layout.dashboards_launcher()).as_str())
                .current_dir(root)
        } else {
            CommandSpec::new(root.join(self.layout.server_launcher()).as_str())
                .current_dir(root)
                .env(INITIAL_ADMIN_PASSWORD_ENV, credential.expose())
        }
    }
}

/// Install root of `project` inside the work area.
#[must_use]
pub fn install_root(work_dir: &Utf8Path, project: Project) -> Utf8PathBuf {
    work_dir.join(project.as_str())
}

impl LifecycleStage for ArchiveStrategy {
    fn install(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()> {
        for project in &ctx.config.projects {
            let archive = ctx.artifact(*project)?;
            let root = install_root(ctx.work_dir(), *project);
            let written = ctx
                .tools
                .extractor
                .extract(archive, &root, 1)
                .map_err(|e| ValidationError::Install {
                    project: project.to_string(),
                    reason: e.to_string(),
                })?;
            info!("extracted {written} file(s) of {project} into {root}");
        }
        Ok(())
    }

    fn start_cluster(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()> {
        let credential = ctx.credential()?;
        for project in &ctx.config.projects {
            let root = install_root(ctx.work_dir(), *project);
            let command = self.launch_command(*project, &root, &credential);
            let handle = ctx
                .tools
                .launcher
                .start(&command)
                .map_err(|e| ValidationError::ClusterStart {
                    project: project.to_string(),
                    reason: e.to_string(),
                })?;
            info!("started {project} as process {}", handle.pid());
            self.services.push((*project, handle));
        }
        let present = self.security_plugin_present(ctx);
        let windows = self.layout == ArchiveLayout::WindowsZip;
        if !present && windows && !ctx.config.allow_without_security {
            warn!("no security plugin in the Windows bundle; checking over http");
        }
        ctx.wait_for_services(ctx.use_https(present))
    }

    fn security_plugin_present(&self, ctx: &PipelineContext<'_>) -> bool {
        has_security_plugin(&install_root(ctx.work_dir(), Project::OpenSearch))
    }

    fn cleanup(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()> {
        let mut failed_projects = Vec::new();
        let mut failures = Vec::new();
        for (project, handle) in &mut self.services {
            match ctx.tools.launcher.terminate(handle) {
                Ok(()) => info!("stopped {project}"),
                Err(e) => {
                    failed_projects.push(project.to_string());
                    failures.push(e.to_string());
                }
            }
        }
        self.services.clear();
        join_failures(failures).map_err(|reason| ValidationError::Cleanup {
            project: failed_projects.join(", "),
            reason,
        })
    }
}
