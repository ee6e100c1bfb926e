//! Format strategies: the per-packaging-format lifecycle implementations.
//!
//! A strategy is selected once per run from the distribution format and
//! platform. Archive formats unpack into the work area and launch services
//! as child processes; package formats go through the OS package manager
//! and systemd.

pub mod archive;
pub mod package;

use crate::distribution::DistributionFormat;
use crate::error::Result;
use crate::pipeline::{LifecycleStage, PipelineContext};
use crate::run_config::RunConfig;
use archive::{ArchiveLayout, ArchiveStrategy};
use package::{PackageManager, PackageStrategy};
use camino::Utf8Path;

/// Marker directory shipped by bundles that include the security plugin.
pub const SECURITY_PLUGIN_MARKER: &str = "plugins/opensearch-security";

/// The strategy chosen for one run.
#[derive(Debug)]
pub enum Strategy {
    /// Tarball or zip bundles.
    Archive(ArchiveStrategy),
    /// Deb, rpm, or yum installs.
    Package(PackageStrategy),
}

impl Strategy {
    /// Selects the strategy for the configured format and platform.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_validator::distribution::{DistributionFormat, Project};
    /// use bundle_validator::run_config::RunConfig;
    /// use bundle_validator::strategy::Strategy;
    ///
    /// let mut config = RunConfig::new(vec![Project::OpenSearch]);
    /// config.distribution = DistributionFormat::Rpm;
    /// assert!(matches!(Strategy::for_config(&config), Strategy::Package(_)));
    /// ```
    #[must_use]
    pub fn for_config(config: &RunConfig) -> Self {
        match config.distribution {
            DistributionFormat::Tar | DistributionFormat::Zip => {
                Self::Archive(ArchiveStrategy::new(ArchiveLayout::for_config(config)))
            }
            DistributionFormat::Deb => Self::Package(PackageStrategy::new(PackageManager::Deb)),
            DistributionFormat::Rpm => Self::Package(PackageStrategy::new(PackageManager::Rpm)),
            DistributionFormat::Yum => Self::Package(PackageStrategy::new(PackageManager::Yum)),
        }
    }

    fn inner(&mut self) -> &mut dyn LifecycleStage {
        match self {
            Self::Archive(strategy) => strategy,
            Self::Package(strategy) => strategy,
        }
    }
}

impl LifecycleStage for Strategy {
    fn download_artifacts(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()> {
        self.inner().download_artifacts(ctx)
    }

    fn install(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()> {
        self.inner().install(ctx)
    }

    fn start_cluster(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()> {
        self.inner().start_cluster(ctx)
    }

    fn security_plugin_present(&self, ctx: &PipelineContext<'_>) -> bool {
        match self {
            Self::Archive(strategy) => strategy.security_plugin_present(ctx),
            Self::Package(strategy) => strategy.security_plugin_present(ctx),
        }
    }

    fn validate(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()> {
        self.inner().validate(ctx)
    }

    fn cleanup(&mut self, ctx: &mut PipelineContext<'_>) -> Result<()> {
        self.inner().cleanup(ctx)
    }
}

/// Returns `true` when `install_root` contains the security plugin.
#[must_use]
pub fn has_security_plugin(install_root: &Utf8Path) -> bool {
    let present = install_root.join(SECURITY_PLUGIN_MARKER).exists();
    log::info!("security plugin present under {install_root}: {present}");
    present
}

/// Collects per-project failures into one cleanup error, keeping order.
fn join_failures(failures: Vec<String>) -> Result<(), String> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures.join("; "))
    }
}
