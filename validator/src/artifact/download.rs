//! Artifact retrieval: HTTP downloads and local copies into the work area.
//!
//! Provides a trait-based abstraction so tests can script network and
//! filesystem behaviour without touching either.

use crate::error::{Result, ValidationError};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

/// Connection timeout for artifact downloads and reachability checks.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for fetching artifacts into a destination directory.
///
/// # Examples
///
/// ```
/// use bundle_validator::artifact::download::HttpDownloader;
///
/// let downloader = HttpDownloader;
/// // Use downloader.download(url, work_area) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactFetcher {
    /// Downloads `url` into `dest_dir`, returning the written file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the file cannot be written.
    fn download(&self, url: &str, dest_dir: &Utf8Path) -> Result<Utf8PathBuf, DownloadError>;

    /// Returns `true` when `url` is well formed and answers with HTTP 200.
    fn is_url_valid(&self, url: &str) -> bool;

    /// Copies the local file `src` into `dest_dir`, returning the new path.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Missing`] or [`DownloadError::Empty`] for
    /// unusable sources and [`DownloadError::Io`] when copying fails.
    fn copy_file(&self, src: &Utf8Path, dest_dir: &Utf8Path) -> Result<Utf8PathBuf, DownloadError>;
}

/// Errors arising from artifact retrieval.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested artifact was not found (HTTP 404).
    #[error("artifact not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// A local artifact path does not exist.
    #[error("provided path for local artifacts does not exist: {path}")]
    Missing {
        /// The supplied path.
        path: String,
    },

    /// A local artifact path names an empty file.
    #[error("local artifact is empty: {path}")]
    Empty {
        /// The supplied path.
        path: String,
    },

    /// I/O error writing the fetched file.
    #[error("I/O error writing artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP-based fetcher using `ureq` and the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpDownloader;

impl ArtifactFetcher for HttpDownloader {
    fn download(&self, url: &str, dest_dir: &Utf8Path) -> Result<Utf8PathBuf, DownloadError> {
        let name = file_name(url).ok_or_else(|| DownloadError::HttpError {
            url: url.to_owned(),
            reason: "URL has no file name".to_owned(),
        })?;
        let dest = dest_dir.join(name);
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(&dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file)
            .map_err(DownloadError::Io)?;
        Ok(dest)
    }

    fn is_url_valid(&self, url: &str) -> bool {
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return false;
        }
        http_agent()
            .head(url)
            .call()
            .is_ok_and(|response| response.status() == 200)
    }

    fn copy_file(&self, src: &Utf8Path, dest_dir: &Utf8Path) -> Result<Utf8PathBuf, DownloadError> {
        let metadata = std::fs::metadata(src).map_err(|_| DownloadError::Missing {
            path: src.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(DownloadError::Missing {
                path: src.to_string(),
            });
        }
        if metadata.len() == 0 {
            return Err(DownloadError::Empty {
                path: src.to_string(),
            });
        }
        let name = src.file_name().ok_or_else(|| DownloadError::Missing {
            path: src.to_string(),
        })?;
        let dest = dest_dir.join(name);
        std::fs::copy(src, &dest)?;
        Ok(dest)
    }
}

/// Downloads `url` into `dest_dir` and confirms that it is reachable.
///
/// Both the download and the reachability check must succeed.
///
/// # Errors
///
/// Returns [`ValidationError::Download`] (`Invalid url - <url>: <reason>`)
/// when either check fails.
pub fn check_url(fetcher: &dyn ArtifactFetcher, url: &str, dest_dir: &Utf8Path) -> Result<Utf8PathBuf> {
    let downloaded = fetcher.download(url, dest_dir);
    match downloaded {
        Ok(path) if fetcher.is_url_valid(url) => {
            info!("Valid URL - {url} and Download Successful !");
            log_digest(&path);
            Ok(path)
        }
        Ok(_) => Err(ValidationError::Download {
            url: url.to_owned(),
            reason: "URL did not answer with HTTP 200".to_owned(),
        }),
        Err(e) => Err(ValidationError::Download {
            url: url.to_owned(),
            reason: e.to_string(),
        }),
    }
}

/// Copies a local artifact into `dest_dir`.
///
/// # Errors
///
/// Returns [`ValidationError::Artifact`] when the path is missing or empty
/// and [`ValidationError::Io`] when the copy itself fails.
pub fn copy_artifact(fetcher: &dyn ArtifactFetcher, src: &Utf8Path, dest_dir: &Utf8Path) -> Result<Utf8PathBuf> {
    match fetcher.copy_file(src, dest_dir) {
        Ok(path) => {
            info!("copied local artifact {src} into the work area");
            log_digest(&path);
            Ok(path)
        }
        Err(DownloadError::Io(e)) => Err(ValidationError::Io(e)),
        Err(e) => Err(ValidationError::Artifact {
            path: src.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Returns the last path segment of a URL or path, ignoring any query.
///
/// # Examples
///
/// ```
/// use bundle_validator::artifact::download::file_name;
///
/// assert_eq!(
///     file_name("https://example.test/a/opensearch-2.3.0-linux-x64.tar.gz?x=1"),
///     Some("opensearch-2.3.0-linux-x64.tar.gz"),
/// );
/// assert_eq!(file_name("https://example.test/dir/"), None);
/// ```
#[must_use]
pub fn file_name(location: &str) -> Option<&str> {
    let without_query = location.split(['?', '#']).next().unwrap_or(location);
    without_query
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
}

/// Computes the lowercase hex SHA-256 digest of a file.
///
/// # Errors
///
/// Returns any I/O error raised while reading the file.
pub fn compute_sha256(path: &Utf8Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn log_digest(path: &Utf8Path) {
    match compute_sha256(path) {
        Ok(digest) => info!("sha256 {digest}  {path}"),
        Err(e) => debug!("could not hash {path}: {e}"),
    }
}

/// Shared `ureq` agent with connection timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use rstest::rstest;

    const URL: &str = "https://example.test/opensearch/2.3.0/opensearch-2.3.0-linux-x64.tar.gz";

    fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
        (dir, path)
    }

    #[test]
    fn check_url_requires_download_and_reachability() {
        let (_guard, dest) = utf8_tempdir();
        let written = dest.join("opensearch-2.3.0-linux-x64.tar.gz");
        std::fs::write(&written, b"bundle").expect("write artifact");

        let mut fetcher = MockArtifactFetcher::new();
        let returned = written.clone();
        fetcher
            .expect_download()
            .withf(|url, _| url == URL)
            .times(1)
            .returning(move |_, _| Ok(returned.clone()));
        fetcher
            .expect_is_url_valid()
            .with(eq(URL))
            .times(1)
            .return_const(true);

        let path = check_url(&fetcher, URL, &dest).expect("valid url");
        assert_eq!(path, written);
    }

    #[test]
    fn check_url_rejects_unreachable_urls() {
        let (_guard, dest) = utf8_tempdir();
        let mut fetcher = MockArtifactFetcher::new();
        fetcher.expect_download().returning(|url, _| {
            Err(DownloadError::NotFound {
                url: url.to_owned(),
            })
        });
        fetcher.expect_is_url_valid().never();

        let err = check_url(&fetcher, URL, &dest).expect_err("expected failure");
        assert_eq!(
            err.to_string(),
            format!("Invalid url - {URL}: artifact not found: {URL}")
        );
    }

    #[test]
    fn check_url_rejects_downloads_that_fail_validation() {
        let (_guard, dest) = utf8_tempdir();
        let mut fetcher = MockArtifactFetcher::new();
        fetcher
            .expect_download()
            .returning(|_, dest| Ok(dest.join("x.tar.gz")));
        fetcher.expect_is_url_valid().return_const(false);

        let err = check_url(&fetcher, URL, &dest).expect_err("expected failure");
        assert!(matches!(err, ValidationError::Download { .. }));
    }

    #[test]
    fn copy_file_copies_into_destination() {
        let (_src_guard, src_dir) = utf8_tempdir();
        let (_dest_guard, dest_dir) = utf8_tempdir();
        let src = src_dir.join("opensearch-2.12.0-linux-x64.tar.gz");
        std::fs::write(&src, b"bundle").expect("write source");

        let copied = HttpDownloader.copy_file(&src, &dest_dir).expect("copy");

        assert_eq!(copied, dest_dir.join("opensearch-2.12.0-linux-x64.tar.gz"));
        assert_eq!(std::fs::read(&copied).expect("read copy"), b"bundle");
    }

    #[test]
    fn copy_artifact_rejects_missing_paths() {
        let (_guard, dest_dir) = utf8_tempdir();
        let err = copy_artifact(
            &HttpDownloader,
            Utf8Path::new("/nonexistent/opensearch.tar.gz"),
            &dest_dir,
        )
        .expect_err("expected failure");
        assert!(matches!(err, ValidationError::Artifact { .. }), "got {err:?}");
    }

    #[test]
    fn copy_artifact_rejects_empty_files() {
        let (_guard, dir) = utf8_tempdir();
        let src = dir.join("empty.rpm");
        std::fs::write(&src, b"").expect("write source");
        let dest = dir.join("out");
        std::fs::create_dir(&dest).expect("create dest");

        let err = copy_artifact(&HttpDownloader, &src, &dest).expect_err("expected failure");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn is_url_valid_rejects_non_http_locations() {
        assert!(!HttpDownloader.is_url_valid("/tmp/opensearch.tar.gz"));
        assert!(!HttpDownloader.is_url_valid("ftp://example.test/x.tar.gz"));
    }

    #[rstest]
    #[case("https://h/a/b/opensearch-1.3.12-linux-x64.rpm", Some("opensearch-1.3.12-linux-x64.rpm"))]
    #[case("/tmp/opensearch-2.3.0.zip", Some("opensearch-2.3.0.zip"))]
    #[case(r"C:\builds\opensearch-2.3.0-windows-x64.zip", Some("opensearch-2.3.0-windows-x64.zip"))]
    #[case("https://h/a/", None)]
    fn extracts_file_names(#[case] location: &str, #[case] expected: Option<&str>) {
        assert_eq!(file_name(location), expected);
    }

    #[test]
    fn computes_sha256_of_file_contents() {
        let (_guard, dir) = utf8_tempdir();
        let path = dir.join("hello.txt");
        std::fs::write(&path, b"hello world").expect("write");
        assert_eq!(
            compute_sha256(&path).expect("hash"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn map_ureq_error_maps_404_to_not_found() {
        let err = ureq::Error::StatusCode(404);
        let mapped = map_ureq_error(URL, &err);
        assert!(matches!(mapped, DownloadError::NotFound { .. }));
    }

    #[test]
    fn map_ureq_error_maps_other_status_to_http_error() {
        let err = ureq::Error::StatusCode(500);
        let mapped = map_ureq_error(URL, &err);
        assert!(matches!(mapped, DownloadError::HttpError { .. }));
    }
}
