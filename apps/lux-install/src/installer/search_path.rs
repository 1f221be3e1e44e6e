//! Persistent executable search path registration.
//!
//! The user's persisted search path is reached through a [`SearchPathStore`]:
//! the registry on Windows, the shell profile elsewhere, an in-memory value in
//! tests. [`register`] reads it, tests membership segment by segment and
//! writes an extended value only when the directory is missing, so running
//! the installer any number of times leaves exactly one entry.

use anyhow::Result;
use std::path::Path;

use crate::errors::InstallerError;

/// A persisted, separator-delimited list of directories.
pub trait SearchPathStore {
    /// Returns the current persisted value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn read(&self) -> Result<String>;

    /// Replaces the persisted value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn write(&mut self, value: &str) -> Result<()>;

    /// Segment separator, `;` on Windows and `:` elsewhere.
    fn separator(&self) -> char;

    /// Whether segments compare case-insensitively.
    fn case_insensitive(&self) -> bool {
        self.separator() == ';'
    }

    /// Human-readable description of where the value lives.
    fn location(&self) -> String;
}

/// Outcome of [`register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The directory was appended; new shells pick it up after a restart.
    Added {
        /// Where the value was written.
        location: String,
    },
    /// The directory was already present; nothing was written.
    AlreadyConfigured {
        /// Where the value lives.
        location: String,
    },
}

impl Registration {
    /// Returns whether the user must restart their shell.
    #[must_use]
    pub fn needs_restart(&self) -> bool {
        matches!(self, Self::Added { .. })
    }
}

/// Ensures `dir` appears exactly once in the store's value.
///
/// # Errors
///
/// Returns [`InstallerError::PathRegistration`] if the store cannot be read
/// or written.
pub fn register(
    store: &mut dyn SearchPathStore,
    dir: &Path,
) -> Result<Registration, InstallerError> {
    let location = store.location();
    let current = store
        .read()
        .map_err(|e| InstallerError::path_registration(format!("{e:#}")))?;
    let dir = dir.to_string_lossy();
    let separator = store.separator();

    if contains_segment(&current, &dir, separator, store.case_insensitive()) {
        log::info!("{dir} already on search path ({location})");
        return Ok(Registration::AlreadyConfigured { location });
    }

    let updated = append_segment(&current, &dir, separator);
    store
        .write(&updated)
        .map_err(|e| InstallerError::path_registration(format!("{e:#}")))?;
    log::info!("added {dir} to search path ({location})");
    Ok(Registration::Added { location })
}

/// Tests whether `dir` is one of the segments of `value`.
#[must_use]
pub fn contains_segment(value: &str, dir: &str, separator: char, case_insensitive: bool) -> bool {
    let wanted = normalize_segment(dir);
    if wanted.is_empty() {
        return false;
    }
    value
        .split(separator)
        .map(normalize_segment)
        .any(|segment| {
            if case_insensitive {
                segment.eq_ignore_ascii_case(wanted)
            } else {
                segment == wanted
            }
        })
}

/// Returns `value` with `dir` appended as a new last segment.
#[must_use]
pub fn append_segment(value: &str, dir: &str, separator: char) -> String {
    let base = value.trim_end_matches(separator);
    if base.trim().is_empty() {
        dir.to_string()
    } else {
        format!("{base}{separator}{dir}")
    }
}

/// Trims whitespace and trailing directory separators, keeping a bare root.
fn normalize_segment(segment: &str) -> &str {
    let segment = segment.trim();
    let trimmed = segment.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() { segment } else { trimmed }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    /// Current value.
    pub value: String,
    /// Segment separator.
    pub separator: char,
    /// Number of writes performed.
    pub writes: usize,
}

#[cfg(test)]
impl MemoryStore {
    /// Creates a store holding `value` with an explicit separator.
    #[must_use]
    pub fn with_separator(value: impl Into<String>, separator: char) -> Self {
        Self {
            value: value.into(),
            separator,
            writes: 0,
        }
    }
}

#[cfg(test)]
impl SearchPathStore for MemoryStore {
    fn read(&self) -> Result<String> {
        Ok(self.value.clone())
    }

    fn write(&mut self, value: &str) -> Result<()> {
        self.value = value.to_string();
        self.writes += 1;
        Ok(())
    }

    fn separator(&self) -> char {
        self.separator
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// The user's `Path` value under `HKEY_CURRENT_USER\Environment`.
#[cfg(windows)]
#[derive(Debug)]
pub struct RegistryStore {
    key: winreg::RegKey,
}

#[cfg(windows)]
impl RegistryStore {
    /// Opens `HKCU\Environment` for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be opened.
    pub fn open() -> Result<Self> {
        use anyhow::Context;
        use winreg::RegKey;
        use winreg::enums::{HKEY_CURRENT_USER, KEY_READ, KEY_WRITE};

        let key = RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey_with_flags("Environment", KEY_READ | KEY_WRITE)
            .context("Failed to open HKCU\\Environment registry key")?;
        Ok(Self { key })
    }
}

#[cfg(windows)]
impl SearchPathStore for RegistryStore {
    fn read(&self) -> Result<String> {
        use anyhow::Context;

        match self.key.get_value::<String, _>("Path") {
            Ok(value) => Ok(value),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).context("Failed to read PATH from registry"),
        }
    }

    fn write(&mut self, value: &str) -> Result<()> {
        use anyhow::Context;
        use winreg::enums::RegType;
        use winreg::types::ToRegValue;

        // Keep %VAR% references in the user PATH expandable.
        let mut raw = value.to_string().to_reg_value();
        raw.vtype = RegType::REG_EXPAND_SZ;
        self.key
            .set_raw_value("Path", &raw)
            .context("Failed to update PATH in registry")
    }

    fn separator(&self) -> char {
        ';'
    }

    fn location(&self) -> String {
        r"HKCU\Environment\Path".to_string()
    }
}

/// Opens the store for the current platform.
///
/// # Errors
///
/// Returns [`InstallerError::PathRegistration`] if the store cannot be
/// opened.
pub fn default_store() -> Result<Box<dyn SearchPathStore>, InstallerError> {
    #[cfg(windows)]
    {
        RegistryStore::open()
            .map(|store| Box::new(store) as Box<dyn SearchPathStore>)
            .map_err(|e| InstallerError::path_registration(format!("{e:#}")))
    }
    #[cfg(not(windows))]
    {
        super::shell::ProfileStore::detect()
            .map(|store| Box::new(store) as Box<dyn SearchPathStore>)
            .map_err(|e| InstallerError::path_registration(format!("{e:#}")))
    }
}
