//! Materializes a selected release asset as a runnable binary.
//!
//! ## Bare executables
//!
//! Bytes are staged in a hidden sibling file inside the install directory
//! and renamed over the destination, so an existing binary is replaced in one
//! step and a failed download leaves the old one untouched.
//!
//! ## Archives
//!
//! Bytes are staged in a temporary file carrying the archive suffix, then
//! unpacked into the install directory on the blocking pool. The staging file
//! is removed when it goes out of scope, whether extraction succeeded or not.
//! If the archive does not contain the canonical binary name, the first file
//! called `<stem>-…` is renamed onto it.

use std::path::PathBuf;

use tempfile::TempPath;

use super::archive;
use super::download::download_to;
use super::matcher::{ArchiveFormat, ArtifactKind};
use crate::errors::InstallerError;

/// Where an asset comes from and where its binary must end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    url: String,
    kind: ArtifactKind,
    install_dir: PathBuf,
    binary_stem: String,
    exe_suffix: String,
    /// Where archives are staged before extraction.
    staging_dir: PathBuf,
}

impl InstallTarget {
    /// Creates a target installing `binary_stem` + `exe_suffix` into
    /// `install_dir`.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        kind: ArtifactKind,
        install_dir: impl Into<PathBuf>,
        binary_stem: impl Into<String>,
        exe_suffix: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            kind,
            install_dir: install_dir.into(),
            binary_stem: binary_stem.into(),
            exe_suffix: exe_suffix.into(),
            staging_dir: std::env::temp_dir(),
        }
    }

    /// Returns the canonical on-disk path of the installed binary.
    #[must_use]
    pub fn destination(&self) -> PathBuf {
        self.install_dir
            .join(format!("{}{}", self.binary_stem, self.exe_suffix))
    }

    /// Whether an extracted file name looks like this target's binary.
    ///
    /// On Unix, where executables carry no suffix, names with a `.` after
    /// the stem are treated as non-binaries (docs, checksums, versions).
    fn is_binary_candidate(&self, file_name: &str) -> bool {
        let name = file_name.to_ascii_lowercase();
        let stem = self.binary_stem.to_ascii_lowercase();
        let exe = self.exe_suffix.to_ascii_lowercase();

        let Some(base) = name.strip_suffix(exe.as_str()) else {
            return false;
        };
        if base == stem {
            return true;
        }
        match base.strip_prefix(stem.as_str()).and_then(|r| r.strip_prefix('-')) {
            Some(rest) => !rest.is_empty() && (!exe.is_empty() || !rest.contains('.')),
            None => false,
        }
    }
}

/// Result of a successful artifact installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledArtifact {
    /// Path of the installed binary.
    pub path: PathBuf,
    /// Bytes transferred.
    pub bytes: u64,
    /// Files written by archive extraction, empty for bare executables.
    pub extracted: Vec<PathBuf>,
}

/// Downloads and installs `target`.
///
/// # Errors
///
/// Returns [`InstallerError::Transfer`] when the bytes cannot be retrieved or
/// placed, and [`InstallerError::Extraction`] when an archive cannot be
/// unpacked or does not contain the binary.
pub async fn install_artifact(
    client: &reqwest::Client,
    target: &InstallTarget,
) -> Result<InstalledArtifact, InstallerError> {
    let installed = match target.kind {
        ArtifactKind::Executable => install_executable(client, target).await?,
        ArtifactKind::Archive(format) => install_archive(client, target, format).await?,
    };

    archive::set_executable_permissions(&installed.path).map_err(|e| {
        InstallerError::transfer_with_source(
            format!("cannot mark {} executable", installed.path.display()),
            e,
        )
    })?;

    Ok(installed)
}

async fn install_executable(
    client: &reqwest::Client,
    target: &InstallTarget,
) -> Result<InstalledArtifact, InstallerError> {
    let destination = target.destination();
    let staging = tempfile::Builder::new()
        .prefix(&format!(".{}.", target.binary_stem))
        .suffix(".part")
        .tempfile_in(&target.install_dir)
        .map_err(|e| {
            InstallerError::transfer_with_source(
                format!("cannot stage download in {}", target.install_dir.display()),
                e,
            )
        })?
        .into_temp_path();

    let bytes = download_to(client, &target.url, &staging).await?;

    staging.persist(&destination).map_err(|e| {
        InstallerError::transfer_with_source(
            format!("cannot move binary into {}", destination.display()),
            e.error,
        )
    })?;

    Ok(InstalledArtifact {
        path: destination,
        bytes,
        extracted: Vec::new(),
    })
}

async fn install_archive(
    client: &reqwest::Client,
    target: &InstallTarget,
    format: ArchiveFormat,
) -> Result<InstalledArtifact, InstallerError> {
    let staging = tempfile::Builder::new()
        .prefix("lux-install-")
        .suffix(format.suffix())
        .tempfile_in(&target.staging_dir)
        .map_err(|e| InstallerError::transfer_with_source("cannot create staging file", e))?
        .into_temp_path();

    let bytes = download_to(client, &target.url, &staging).await?;
    let mut extracted = extract_staged(staging, format, target.install_dir.clone()).await?;

    let destination = target.destination();
    if !extracted.contains(&destination) {
        let index = extracted
            .iter()
            .position(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| target.is_binary_candidate(n))
            })
            .ok_or_else(|| {
                InstallerError::extraction(format!(
                    "archive does not contain a {} binary",
                    target.binary_stem
                ))
            })?;
        let candidate = &extracted[index];
        log::info!(
            "renaming {} to {}",
            candidate.display(),
            destination.display()
        );
        std::fs::rename(candidate, &destination).map_err(|e| {
            InstallerError::extraction(format!(
                "cannot move {} to {}: {e}",
                candidate.display(),
                destination.display()
            ))
        })?;
        extracted[index].clone_from(&destination);
    }

    Ok(InstalledArtifact {
        path: destination,
        bytes,
        extracted,
    })
}

/// Unpacks a staged archive off the async runtime. The staging file is
/// dropped, and so deleted, when the blocking task finishes.
async fn extract_staged(
    staging: TempPath,
    format: ArchiveFormat,
    install_dir: PathBuf,
) -> Result<Vec<PathBuf>, InstallerError> {
    tokio::task::spawn_blocking(move || {
        let result = archive::extract(&staging, format, &install_dir);
        drop(staging);
        result
    })
    .await
    .map_err(|e| InstallerError::extraction(format!("extraction task failed: {e}")))?
    .map_err(|e| InstallerError::extraction(format!("{e:#}")))
}
