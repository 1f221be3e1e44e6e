//! Error types for lux-install.
//!
//! `InstallerError` covers every failure the pipeline can report for a single
//! product, plus the two setup failures that concern the whole run. Most of
//! the per-product variants are not fatal: the orchestrator turns them into
//! report entries and moves on to the next product.

use std::path::PathBuf;
use thiserror::Error;

/// Consolidated error type for installation operations.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The repository has no accessible latest release.
    #[error("no published release found for {repository}")]
    ReleaseNotFound {
        /// Repository identifier (`owner/name`).
        repository: String,
    },

    /// A release exists but none of its assets fit this platform.
    #[error("release {tag} of {repository} has no asset for {platform}")]
    NoMatchingAsset {
        /// Repository identifier (`owner/name`).
        repository: String,
        /// Release tag that was inspected.
        tag: String,
        /// Platform identifier the assets were matched against.
        platform: String,
    },

    /// Network or storage error while retrieving artifact bytes.
    #[error("download error: {message}")]
    Transfer {
        /// Description of the transfer failure.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The downloaded archive could not be unpacked.
    #[error("extraction error: {message}")]
    Extraction {
        /// Description of the extraction failure.
        message: String,
    },

    /// The install directory could not be created or resolved.
    #[error("cannot prepare install directory {}", path.display())]
    InstallDir {
        /// The directory that was being created.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The persisted search path could not be read or updated.
    #[error("cannot update search path: {message}")]
    PathRegistration {
        /// Description of the store failure.
        message: String,
    },
}

impl InstallerError {
    /// Creates a new `ReleaseNotFound` error.
    #[must_use]
    pub fn release_not_found(repository: impl Into<String>) -> Self {
        Self::ReleaseNotFound {
            repository: repository.into(),
        }
    }

    /// Creates a new `NoMatchingAsset` error.
    #[must_use]
    pub fn no_matching_asset(
        repository: impl Into<String>,
        tag: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self::NoMatchingAsset {
            repository: repository.into(),
            tag: tag.into(),
            platform: platform.into(),
        }
    }

    /// Creates a new `Transfer` error.
    #[must_use]
    pub fn transfer(message: impl Into<String>) -> Self {
        Self::Transfer {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `Transfer` error with a source error.
    #[must_use]
    pub fn transfer_with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Transfer {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a new `Extraction` error.
    #[must_use]
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Creates a new `InstallDir` error.
    #[must_use]
    pub fn install_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::InstallDir {
            path: path.into(),
            source,
        }
    }

    /// Creates a new `PathRegistration` error.
    #[must_use]
    pub fn path_registration(message: impl Into<String>) -> Self {
        Self::PathRegistration {
            message: message.into(),
        }
    }

    /// Returns whether this error means "nothing to install here" rather than
    /// a broken install. Such products are pointed at a source build.
    #[must_use]
    pub fn suggests_source_build(&self) -> bool {
        matches!(
            self,
            Self::ReleaseNotFound { .. } | Self::NoMatchingAsset { .. }
        )
    }
}
