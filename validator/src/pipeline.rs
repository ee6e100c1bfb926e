//! The validation lifecycle and its runner.
//!
//! A run moves through five stages in a fixed order:
//!
//! ```text
//! DownloadArtifacts -> Install -> StartCluster -> Validate -> Cleanup
//! ```
//!
//! The first failure stops the forward progression. Once the install stage
//! has been entered, cleanup always runs, and a cleanup failure is reported
//! together with the failure that preceded it. Format-specific behaviour
//! lives behind [`LifecycleStage`]; the runner adds uniform logging, timing,
//! and stage-identifying error wrapping.

use crate::artifact::download::{ArtifactFetcher, check_url, copy_artifact};
use crate::artifact::extraction::ArchiveExtractor;
use crate::artifact::locator::{ArtifactLocation, ArtifactLocator};
use crate::distribution::Project;
use crate::error::{Result, ValidationError};
use crate::executor::CommandExecutor;
use crate::probe::ApiProbe;
use crate::process::ProcessLauncher;
use crate::readiness::{ReadinessPolicy, wait_until_ready};
use crate::run_config::RunConfig;
use crate::suite::{ApiVerificationSuite, dashboards_status_url, server_url};
use bundle_validation_common::password::AdminCredential;
use bundle_validation_common::settings::Settings;
use camino::{Utf8Path, Utf8PathBuf};
use log::{error, info};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tempfile::TempDir;

/// Stages of a validation run, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Resolve and fetch every project's artifact into the work area.
    DownloadArtifacts,
    /// Install the fetched artifacts.
    Install,
    /// Start the services and wait until they answer.
    StartCluster,
    /// Run the API verification suite.
    Validate,
    /// Stop and remove everything that was started or installed.
    Cleanup,
}

impl Stage {
    /// Every stage in execution order.
    pub const ALL: [Self; 5] = [
        Self::DownloadArtifacts,
        Self::Install,
        Self::StartCluster,
        Self::Validate,
        Self::Cleanup,
    ];

    /// Returns the stage name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DownloadArtifacts => "download",
            Self::Install => "install",
            Self::StartCluster => "start",
            Self::Validate => "validate",
            Self::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A process-scoped temporary directory owning all fetched and extracted
/// artifacts. The directory is removed when the work area is dropped.
#[derive(Debug)]
pub struct WorkArea {
    _dir: TempDir,
    path: Utf8PathBuf,
}

impl WorkArea {
    /// Creates a fresh work area under the system temporary directory.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Io`] when the directory cannot be created
    /// and [`ValidationError::Config`] when its path is not valid UTF-8.
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("bundle-validation-")
            .tempdir()?;
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).map_err(|path| {
            ValidationError::Config {
                reason: format!("work area {} is not valid UTF-8", path.display()),
            }
        })?;
        Ok(Self { _dir: dir, path })
    }

    /// Returns the work area directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

/// External collaborators a run depends on.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Runs package-manager and service-manager commands.
    pub executor: &'a dyn CommandExecutor,
    /// Starts and stops archive-launched services.
    pub launcher: &'a dyn ProcessLauncher,
    /// Downloads and copies artifacts.
    pub fetcher: &'a dyn ArtifactFetcher,
    /// Unpacks archive bundles.
    pub extractor: &'a dyn ArchiveExtractor,
    /// Issues HTTP probes.
    pub probe: &'a dyn ApiProbe,
}

/// Everything one run reads and mutates, owned for the run's duration.
pub struct PipelineContext<'a> {
    /// The run configuration; version and file paths are filled in during
    /// artifact resolution.
    pub config: RunConfig,
    /// Endpoints, base URLs, and timing.
    pub settings: &'a Settings,
    /// Injected collaborators.
    pub tools: Collaborators<'a>,
    work_area: WorkArea,
    artifacts: BTreeMap<Project, Utf8PathBuf>,
}

impl<'a> PipelineContext<'a> {
    /// Creates a context with its own work area.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`WorkArea::create`].
    pub fn new(config: RunConfig, settings: &'a Settings, tools: Collaborators<'a>) -> Result<Self> {
        Ok(Self {
            config,
            settings,
            tools,
            work_area: WorkArea::create()?,
            artifacts: BTreeMap::new(),
        })
    }

    /// Returns the work area directory.
    #[must_use]
    pub fn work_dir(&self) -> &Utf8Path {
        self.work_area.path()
    }

    /// Returns the fetched artifact for `project`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Artifact`] when the download stage did not
    /// fetch anything for `project`.
    pub fn artifact(&self, project: Project) -> Result<&Utf8Path> {
        self.artifacts
            .get(&project)
            .map(Utf8PathBuf::as_path)
            .ok_or_else(|| ValidationError::Artifact {
                path: project.to_string(),
                reason: "no artifact was fetched for this project".to_owned(),
            })
    }

    /// Records the fetched artifact for `project`.
    pub fn record_artifact(&mut self, project: Project, path: Utf8PathBuf) {
        self.artifacts.insert(project, path);
    }

    /// Returns the administrator credential for the version under test.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Config`] when the version is still unknown.
    pub fn credential(&self) -> Result<AdminCredential> {
        Ok(AdminCredential::for_version(self.config.version()?))
    }

    /// Returns `true` when probes should use HTTPS.
    #[must_use]
    pub const fn use_https(&self, security_plugin_present: bool) -> bool {
        self.config.force_https_check || security_plugin_present
    }

    /// Blocks until every project's endpoint answers or its deadline passes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ClusterStart`] for the first project that
    /// does not become ready.
    pub fn wait_for_services(&self, secure: bool) -> Result<()> {
        let credential = self.credential()?;
        for project in &self.config.projects {
            let url = if project.is_dashboards() {
                dashboards_status_url(self.settings)
            } else {
                format!("{}/", server_url(self.settings, secure))
            };
            let policy = ReadinessPolicy::for_project(*project, &self.settings.readiness);
            wait_until_ready(self.tools.probe, *project, &url, &credential, policy)?;
        }
        Ok(())
    }
}

/// Format-specific implementation of the lifecycle stages.
pub trait LifecycleStage {
    /// Resolves and fetches every project's artifact into the work area.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Config`], [`ValidationError::Artifact`], or
    /// [`ValidationError::Download`] from resolution and retrieval.
    fn download_artifacts(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()> {
        download_artifacts(ctx)
    }

    /// Installs the fetched artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Install`] when installation fails.
    fn install(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()>;

    /// Starts the services and waits until they answer.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ClusterStart`] when a service does not come up.
    fn start_cluster(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()>;

    /// Reports whether the installed server ships the security plugin.
    fn security_plugin_present(&self, ctx: &PipelineContext<'_>) -> bool;

    /// Runs the API verification suite.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ValidationFailed`] when any probe fails.
    fn validate(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()> {
        let secure = ctx.use_https(self.security_plugin_present(ctx));
        let version = ctx.config.version()?;
        let suite = ApiVerificationSuite::new(ctx.tools.probe, ctx.settings);
        suite
            .run(version, ctx.config.includes_dashboards(), secure)
            .into_result()
    }

    /// Stops and removes everything the run started or installed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Cleanup`] when stopping or removal fails.
    fn cleanup(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()>;
}

/// Resolves every project's location and fetches it into the work area.
///
/// Local paths are copied; URLs are downloaded and checked.
///
/// # Errors
///
/// Returns the first resolution or retrieval error.
pub fn download_artifacts(ctx: &mut PipelineContext<'_>) -> Result<()> {
    let locator = ArtifactLocator::from_settings(ctx.settings);
    let projects = ctx.config.projects.clone();
    for project in projects {
        let location = locator.resolve(project, &mut ctx.config)?;
        let fetched = match &location {
            ArtifactLocation::Local(path) => copy_artifact(ctx.tools.fetcher, path, ctx.work_dir())?,
            ArtifactLocation::Remote(url) => check_url(ctx.tools.fetcher, url, ctx.work_dir())?,
        };
        ctx.record_artifact(project, fetched);
    }
    Ok(())
}

/// Resolves every project's location without fetching anything.
///
/// # Errors
///
/// Returns [`ValidationError::Config`] when a location cannot be derived.
pub fn resolve_locations(
    config: &mut RunConfig,
    settings: &Settings,
) -> Result<Vec<(Project, ArtifactLocation)>> {
    let locator = ArtifactLocator::from_settings(settings);
    let projects = config.projects.clone();
    projects
        .into_iter()
        .map(|project| Ok((project, locator.resolve(project, config)?)))
        .collect()
}

/// Runs every stage of `strategy` in order.
///
/// # Errors
///
/// Returns the first stage failure wrapped in [`ValidationError::Stage`],
/// or [`ValidationError::CleanupAfterFailure`] when cleanup also failed.
pub fn run(strategy: &mut dyn LifecycleStage, ctx: &mut PipelineContext<'_>) -> Result<()> {
    let started = Instant::now();
    run_stage(Stage::DownloadArtifacts, || strategy.download_artifacts(ctx))?;

    let mut outcome = run_stage(Stage::Install, || strategy.install(ctx));
    if outcome.is_ok() {
        outcome = run_stage(Stage::StartCluster, || strategy.start_cluster(ctx));
    }
    if outcome.is_ok() {
        outcome = run_stage(Stage::Validate, || strategy.validate(ctx));
    }
    let cleanup = run_stage(Stage::Cleanup, || strategy.cleanup(ctx));

    let result = match (outcome, cleanup) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(primary), Ok(())) => Err(primary),
        (Ok(()), Err(cleanup)) => Err(cleanup),
        (Err(primary), Err(cleanup)) => Err(ValidationError::CleanupAfterFailure {
            primary: Box::new(primary),
            cleanup: Box::new(cleanup),
        }),
    };
    if result.is_ok() {
        info!("validation passed in {:.1?}", started.elapsed());
    }
    result
}

fn run_stage(stage: Stage, body: impl FnOnce() -> Result<()>) -> Result<()> {
    info!("{stage} stage started");
    let started = Instant::now();
    match body() {
        Ok(()) => {
            info!("{stage} stage finished in {:.1?}", started.elapsed());
            Ok(())
        }
        Err(e) => {
            error!("{stage} stage failed after {:.1?}: {e}", started.elapsed());
            Err(e.in_stage(stage))
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
