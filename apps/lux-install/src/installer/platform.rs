//! Platform detection for lux-install.
//!
//! Determines which release assets fit the machine the installer runs on.
//! The naming pieces returned here (OS name, architecture aliases, short
//! aliases) are what the asset matcher combines into candidate file names.
//!
//! ## Supported Platforms
//!
//! - Linux `x86_64` / `aarch64`
//! - macOS `x86_64` / `aarch64`
//! - Windows `x86_64` / `aarch64`

use anyhow::{Result, bail};
use std::fmt;

/// A supported operating system and architecture combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(dead_code)]
pub enum Platform {
    /// Linux on `x86_64`
    LinuxX64,
    /// Linux on ARM64
    LinuxArm64,
    /// macOS on Intel
    MacosX64,
    /// macOS on Apple Silicon
    MacosArm64,
    /// Windows on `x86_64`
    WindowsX64,
    /// Windows on ARM64
    WindowsArm64,
}

impl Platform {
    /// Detects the current platform from compile-time configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the current OS/architecture combination is not supported.
    pub fn detect() -> Result<Self> {
        #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
        {
            return Ok(Self::LinuxX64);
        }

        #[cfg(all(target_os = "linux", target_arch = "aarch64"))]
        {
            return Ok(Self::LinuxArm64);
        }

        #[cfg(all(target_os = "macos", target_arch = "x86_64"))]
        {
            return Ok(Self::MacosX64);
        }

        #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
        {
            return Ok(Self::MacosArm64);
        }

        #[cfg(all(target_os = "windows", target_arch = "x86_64"))]
        {
            return Ok(Self::WindowsX64);
        }

        #[cfg(all(target_os = "windows", target_arch = "aarch64"))]
        {
            return Ok(Self::WindowsArm64);
        }

        #[allow(unreachable_code)]
        {
            bail!(
                "Unsupported platform: {} on {}. \
                 Supported platforms are linux, macos and windows on x86_64 or aarch64",
                std::env::consts::OS,
                std::env::consts::ARCH
            );
        }
    }

    /// Returns the platform identifier, e.g. `linux-x86_64`.
    #[must_use = "returns the platform string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LinuxX64 => "linux-x86_64",
            Self::LinuxArm64 => "linux-aarch64",
            Self::MacosX64 => "macos-x86_64",
            Self::MacosArm64 => "macos-aarch64",
            Self::WindowsX64 => "windows-x86_64",
            Self::WindowsArm64 => "windows-aarch64",
        }
    }

    /// Returns the canonical OS name used in asset names.
    #[must_use = "returns the OS string without side effects"]
    pub fn os(self) -> &'static str {
        match self {
            Self::LinuxX64 | Self::LinuxArm64 => "linux",
            Self::MacosX64 | Self::MacosArm64 => "macos",
            Self::WindowsX64 | Self::WindowsArm64 => "windows",
        }
    }

    /// Returns every spelling of this platform's architecture seen in asset
    /// names, canonical spelling first.
    #[must_use = "returns the aliases without side effects"]
    pub fn arch_aliases(self) -> &'static [&'static str] {
        match self {
            Self::LinuxX64 | Self::MacosX64 | Self::WindowsX64 => &["x86_64", "x64", "amd64"],
            Self::LinuxArm64 | Self::MacosArm64 | Self::WindowsArm64 => &["aarch64", "arm64"],
        }
    }

    /// Returns the shortened platform aliases used by single-token asset
    /// names such as `lux-win64.exe` or `lux-darwin`.
    #[must_use = "returns the aliases without side effects"]
    pub fn short_aliases(self) -> &'static [&'static str] {
        match self {
            Self::LinuxX64 | Self::LinuxArm64 => &["linux"],
            Self::MacosX64 | Self::MacosArm64 => &["macos", "darwin", "osx"],
            Self::WindowsX64 => &["win64", "windows", "win"],
            Self::WindowsArm64 => &["windows", "win"],
        }
    }

    /// Returns the executable file extension for this platform.
    ///
    /// Returns `.exe` on Windows, empty string on Unix platforms.
    #[must_use = "returns the extension string without side effects"]
    pub fn executable_extension(self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }

    /// Returns whether this platform is Windows.
    #[must_use = "returns platform check result without side effects"]
    pub fn is_windows(self) -> bool {
        matches!(self, Self::WindowsX64 | Self::WindowsArm64)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
