//! Archive extraction for tarball and zip bundles.
//!
//! Bundles wrap their contents in a single top-level directory such as
//! `opensearch-2.12.0/`. Extraction strips leading components so each
//! project lands directly in its install root, and validates every entry
//! path to prevent zip-slip attacks.

use camino::Utf8Path;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Trait for extracting bundle archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use bundle_validator::artifact::extraction::SystemArchiveExtractor;
///
/// let extractor = SystemArchiveExtractor;
/// // Use extractor.extract(archive_path, install_root, 1) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extracts `archive` into `dest_dir`, dropping the first
    /// `strip_components` path components of every entry.
    ///
    /// Returns the number of files written.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
    /// escape the destination directory, [`ExtractionError::EmptyArchive`]
    /// if no files remain after stripping, and
    /// [`ExtractionError::UnsupportedFormat`] for unknown extensions.
    fn extract(
        &self,
        archive: &Utf8Path,
        dest_dir: &Utf8Path,
        strip_components: usize,
    ) -> Result<usize, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip container could not be read.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The file extension is neither `.tar.gz` nor `.zip`.
    #[error("unsupported archive format: {path}")]
    UnsupportedFormat {
        /// The archive path.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,
}

/// Default extractor using the `tar`, `flate2`, and `zip` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemArchiveExtractor;

impl ArchiveExtractor for SystemArchiveExtractor {
    fn extract(
        &self,
        archive: &Utf8Path,
        dest_dir: &Utf8Path,
        strip_components: usize,
    ) -> Result<usize, ExtractionError> {
        fs::create_dir_all(dest_dir)?;
        let name = archive.as_str();
        let written = if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            extract_tar_gz(archive.as_std_path(), dest_dir.as_std_path(), strip_components)?
        } else if name.ends_with(".zip") {
            extract_zip(archive.as_std_path(), dest_dir.as_std_path(), strip_components)?
        } else {
            return Err(ExtractionError::UnsupportedFormat {
                path: archive.to_string(),
            });
        };

        if written == 0 {
            return Err(ExtractionError::EmptyArchive);
        }
        Ok(written)
    }
}

fn extract_tar_gz(
    archive_path: &Path,
    dest_dir: &Path,
    strip_components: usize,
) -> Result<usize, ExtractionError> {
    let file = fs::File::open(archive_path)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    let mut written = 0;

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;
        let Some(relative) = strip_leading(&entry_path, strip_components) else {
            continue;
        };

        let dest_path = dest_dir.join(&relative);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let entry_type = entry.header().entry_type();
        let link_target = entry.link_name()?.map(std::borrow::Cow::into_owned);
        match (entry_type, link_target) {
            (tar::EntryType::Link, Some(target)) => {
                let source = hard_link_source(&entry_path, &target, strip_components)?;
                fs::hard_link(dest_dir.join(source), &dest_path)?;
            }
            (tar::EntryType::Symlink, Some(target)) => {
                validate_symlink_target(&relative, &target)?;
                entry.unpack(&dest_path)?;
            }
            _ => {
                entry.unpack(&dest_path)?;
            }
        }

        if entry_type.is_file() {
            written += 1;
        }
    }
    Ok(written)
}

fn extract_zip(
    archive_path: &Path,
    dest_dir: &Path,
    strip_components: usize,
) -> Result<usize, ExtractionError> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut written = 0;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let entry_path = entry
            .enclosed_name()
            .ok_or_else(|| ExtractionError::PathTraversal {
                path: entry.name().to_owned(),
            })?;
        let Some(relative) = strip_leading(&entry_path, strip_components) else {
            continue;
        };

        let dest_path = dest_dir.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&dest_path)?;
        std::io::copy(&mut entry, &mut out)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode))?;
        }
        written += 1;
    }
    Ok(written)
}

/// Validate that an entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    if path.is_absolute() {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    for component in path.components() {
        if matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        ) {
            return Err(ExtractionError::PathTraversal {
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}

/// Maps a hard link's archive-relative source into the stripped tree.
fn hard_link_source(
    entry: &Path,
    target: &Path,
    strip_components: usize,
) -> Result<PathBuf, ExtractionError> {
    let escapes = || ExtractionError::PathTraversal {
        path: format!("{} -> {}", entry.display(), target.display()),
    };
    validate_entry_path(target).map_err(|_| escapes())?;
    strip_leading(target, strip_components).ok_or_else(escapes)
}

/// Rejects symlink targets that are absolute or climb above the extraction
/// root when resolved from the link's own directory.
fn validate_symlink_target(link: &Path, target: &Path) -> Result<(), ExtractionError> {
    let escapes = || ExtractionError::PathTraversal {
        path: format!("{} -> {}", link.display(), target.display()),
    };
    let mut depth = link.parent().map_or(0, |dir| {
        dir.components()
            .filter(|component| matches!(component, Component::Normal(_)))
            .count()
    });
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => depth = depth.checked_sub(1).ok_or_else(escapes)?,
            Component::RootDir | Component::Prefix(_) => return Err(escapes()),
        }
    }
    Ok(())
}

/// Drops `count` leading normal components; `None` when nothing remains.
fn strip_leading(path: &Path, count: usize) -> Option<PathBuf> {
    let stripped: PathBuf = path
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .skip(count)
        .collect();
    (!stripped.as_os_str().is_empty()).then_some(stripped)
}
