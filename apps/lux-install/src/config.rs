//! Runtime configuration for lux-install.
//!
//! Settings are resolved once at startup with the following priority:
//!
//! 1. Command-line flags (`--install-dir`, `--api-url`)
//! 2. Environment variables (`LUX_HOME`, `LUX_INSTALL_API_URL`, `GITHUB_TOKEN`)
//! 3. Built-in defaults
//!
//! Empty or whitespace-only environment values are treated as unset.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/.lux/                 # Root directory (or LUX_HOME)
//!   bin/                  # Install directory registered on PATH
//!     lux                 # Runtime
//!     lpm                 # Package manager
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::errors::InstallerError;

/// Environment variable overriding the root directory.
pub const LUX_HOME_ENV: &str = "LUX_HOME";

/// Environment variable overriding the release API base URL.
pub const API_URL_ENV: &str = "LUX_INSTALL_API_URL";

/// Environment variable holding an optional API token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Default release-hosting API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// One installable product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product {
    /// Human-readable product name.
    pub name: &'static str,
    /// Source repository identifier (`owner/name`).
    pub repository: &'static str,
    /// Stem of the executable, both in asset names and on disk.
    pub binary: &'static str,
    /// Stem of the archive asset names.
    pub archive: &'static str,
}

impl Product {
    /// Returns the URL a user can follow to build the product from source.
    #[must_use]
    pub fn source_url(&self) -> String {
        format!("https://github.com/{}", self.repository)
    }
}

/// The Lux runtime.
pub const RUNTIME: Product = Product {
    name: "Lux runtime",
    repository: "lux-runtime/lux",
    binary: "lux",
    archive: "lux",
};

/// The lpm package manager.
pub const PACKAGE_MANAGER: Product = Product {
    name: "lpm package manager",
    repository: "lux-runtime/lpm",
    binary: "lpm",
    archive: "lpm",
};

/// Products installed by every run, in installation order.
pub const PRODUCTS: [Product; 2] = [RUNTIME, PACKAGE_MANAGER];

/// Resolved settings for one installer run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory receiving both binaries.
    pub install_dir: PathBuf,
    /// Release API base URL without trailing slash.
    pub api_url: String,
    /// Optional bearer token for the release API.
    pub token: Option<String>,
    /// Whether the persisted search path may be modified.
    pub modify_path: bool,
    /// Whether installed binaries are invoked for verification.
    pub verify: bool,
}

impl Settings {
    /// Resolves settings from flag values, the environment and defaults.
    ///
    /// `modify_path` and `verify` come from the command line only.
    ///
    /// # Errors
    ///
    /// Returns an error if no install directory was given and the home
    /// directory cannot be determined.
    pub fn resolve(
        install_dir: Option<PathBuf>,
        api_url: Option<String>,
        modify_path: bool,
        verify: bool,
    ) -> Result<Self> {
        let install_dir = match install_dir {
            Some(dir) => dir,
            None => default_root()?.join("bin"),
        };

        let api_url = api_url
            .filter(|s| !s.trim().is_empty())
            .or_else(|| env_value(API_URL_ENV))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            install_dir,
            api_url: normalize_url(&api_url),
            token: env_value(TOKEN_ENV),
            modify_path,
            verify,
        })
    }

    /// Creates the install directory if needed and makes the stored path
    /// absolute.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InstallDir`] if the directory cannot be
    /// created or resolved.
    pub fn ensure_install_dir(&mut self) -> Result<&Path, InstallerError> {
        std::fs::create_dir_all(&self.install_dir)
            .map_err(|e| InstallerError::install_dir(&self.install_dir, e))?;
        let absolute = std::path::absolute(&self.install_dir)
            .map_err(|e| InstallerError::install_dir(&self.install_dir, e))?;
        self.install_dir = absolute;
        Ok(&self.install_dir)
    }
}

/// Returns the root directory: `LUX_HOME`, `%APPDATA%\lux` on Windows, or
/// `~/.lux` elsewhere.
fn default_root() -> Result<PathBuf> {
    if let Some(home) = env_value(LUX_HOME_ENV) {
        return Ok(PathBuf::from(home));
    }

    #[cfg(windows)]
    {
        Ok(dirs::data_dir()
            .context("Cannot determine AppData directory. Set LUX_HOME environment variable.")?
            .join("lux"))
    }
    #[cfg(not(windows))]
    {
        Ok(dirs::home_dir()
            .context("Cannot determine home directory. Set LUX_HOME environment variable.")?
            .join(".lux"))
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Runs `f` with the given environment variables set, restoring them after.
    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let saved: Vec<_> = vars
            .iter()
            .map(|(k, _)| (*k, std::env::var(k).ok()))
            .collect();
        for (k, v) in vars {
            // SAFETY: tests touching the environment are serialized.
            unsafe {
                match v {
                    Some(v) => std::env::set_var(k, v),
                    None => std::env::remove_var(k),
                }
            }
        }
        f();
        for (k, v) in saved {
            // SAFETY: tests touching the environment are serialized.
            unsafe {
                match v {
                    Some(v) => std::env::set_var(k, v),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn products_are_runtime_then_package_manager() {
        assert_eq!(PRODUCTS[0], RUNTIME);
        assert_eq!(PRODUCTS[1], PACKAGE_MANAGER);
        assert_eq!(RUNTIME.source_url(), "https://github.com/lux-runtime/lux");
    }

    #[test]
    #[serial]
    fn flags_take_priority_over_environment() {
        with_env(
            &[
                (LUX_HOME_ENV, Some("/env/home")),
                (API_URL_ENV, Some("https://env.example")),
            ],
            || {
                let settings = Settings::resolve(
                    Some(PathBuf::from("/flag/bin")),
                    Some("https://flag.example/".into()),
                    false,
                    true,
                )
                .unwrap();
                assert_eq!(settings.install_dir, PathBuf::from("/flag/bin"));
                assert_eq!(settings.api_url, "https://flag.example");
                assert!(!settings.modify_path);
                assert!(settings.verify);
            },
        );
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        with_env(
            &[
                (LUX_HOME_ENV, Some("/env/home")),
                (API_URL_ENV, Some("https://mirror.example/api/")),
            ],
            || {
                let settings = Settings::resolve(None, None, true, false).unwrap();
                assert_eq!(settings.install_dir, PathBuf::from("/env/home").join("bin"));
                assert_eq!(settings.api_url, "https://mirror.example/api");
                assert!(settings.modify_path);
                assert!(!settings.verify);
            },
        );
    }

    #[test]
    #[serial]
    fn blank_environment_values_are_ignored() {
        with_env(
            &[(API_URL_ENV, Some("   ")), (TOKEN_ENV, Some(""))],
            || {
                let settings =
                    Settings::resolve(Some(PathBuf::from("/tmp/lux-bin")), None, true, true)
                        .unwrap();
                assert_eq!(settings.api_url, DEFAULT_API_URL);
                assert!(settings.token.is_none());
            },
        );
    }

    #[test]
    fn ensure_install_dir_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let mut settings = Settings {
            install_dir: temp.path().join("lux").join("bin"),
            api_url: DEFAULT_API_URL.into(),
            token: None,
            modify_path: true,
            verify: true,
        };

        let first = settings.ensure_install_dir().unwrap().to_path_buf();
        let second = settings.ensure_install_dir().unwrap().to_path_buf();

        assert!(first.is_dir());
        assert!(first.is_absolute());
        assert_eq!(first, second);
    }

    #[test]
    fn ensure_install_dir_fails_under_a_file() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let mut settings = Settings {
            install_dir: blocker.join("bin"),
            api_url: DEFAULT_API_URL.into(),
            token: None,
            modify_path: true,
            verify: true,
        };

        let err = settings.ensure_install_dir().unwrap_err();

        assert!(matches!(err, InstallerError::InstallDir { .. }));
    }
}
