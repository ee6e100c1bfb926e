//! Fake collaborators shared by the behaviour tests.

use bundle_validation_common::password::AdminCredential;
use bundle_validator::artifact::download::{ArtifactFetcher, DownloadError, file_name};
use bundle_validator::artifact::extraction::{ArchiveExtractor, ExtractionError};
use bundle_validator::executor::CommandSpec;
use bundle_validator::probe::{ApiProbe, ProbeError, ProbeResponse};
use bundle_validator::process::{ProcessError, ProcessHandle, ProcessLauncher};
use camino::{Utf8Path, Utf8PathBuf};

/// Directory fake downloads claim to have written to.
pub const DOWNLOAD_DIR: &str = "/downloads";

/// Fetcher that pretends every URL downloads into [`DOWNLOAD_DIR`] and every
/// local file is used in place.
#[derive(Debug, Default)]
pub struct FakeFetcher;

impl ArtifactFetcher for FakeFetcher {
    fn download(&self, url: &str, _dest_dir: &Utf8Path) -> Result<Utf8PathBuf, DownloadError> {
        let name = file_name(url).ok_or_else(|| DownloadError::NotFound {
            url: url.to_owned(),
        })?;
        Ok(Utf8Path::new(DOWNLOAD_DIR).join(name))
    }

    fn is_url_valid(&self, url: &str) -> bool {
        url.starts_with("https://")
    }

    fn copy_file(&self, src: &Utf8Path, _dest_dir: &Utf8Path) -> Result<Utf8PathBuf, DownloadError> {
        Ok(src.to_owned())
    }
}

/// Extractor that is never expected to run for package formats.
#[derive(Debug, Default)]
pub struct UnusedExtractor;

impl ArchiveExtractor for UnusedExtractor {
    fn extract(
        &self,
        archive: &Utf8Path,
        _dest_dir: &Utf8Path,
        _strip_components: usize,
    ) -> Result<usize, ExtractionError> {
        Err(ExtractionError::UnsupportedFormat {
            path: archive.to_string(),
        })
    }
}

/// Launcher that is never expected to run for package formats.
#[derive(Debug, Default)]
pub struct UnusedLauncher;

impl ProcessLauncher for UnusedLauncher {
    fn start(&self, command: &CommandSpec) -> Result<ProcessHandle, ProcessError> {
        Err(ProcessError::Spawn {
            command: command.to_string(),
            source: std::io::Error::from(std::io::ErrorKind::Unsupported),
        })
    }

    fn terminate(&self, handle: &mut ProcessHandle) -> Result<(), ProcessError> {
        handle.mark_stopped();
        Ok(())
    }
}

/// Probe answering every request with the same status and body.
#[derive(Debug)]
pub struct FixedProbe {
    /// Status code returned for every request.
    pub status: u16,
    /// Body returned for every request.
    pub body: String,
}

impl FixedProbe {
    /// A probe whose cluster reports `health`.
    pub fn with_health(health: &str) -> Self {
        Self {
            status: 200,
            body: format!("epoch status\n1700000000 {health}"),
        }
    }
}

impl ApiProbe for FixedProbe {
    fn get(&self, _url: &str, _credential: &AdminCredential) -> Result<ProbeResponse, ProbeError> {
        Ok(ProbeResponse::new(self.status, self.body.clone()))
    }
}
