//! Shell profile backed search path store (Unix).
//!
//! A profile does not hold a PATH value directly, so [`ProfileStore`]
//! presents the directories its PATH assignments and `fish_add_path` lines
//! add, prepended or appended, as one `:`-separated value.
//! Writing appends a marked block for each directory that is new; existing
//! lines are never rewritten.
//!
//! ## Supported Shells
//!
//! - Bash: `~/.bashrc` or `~/.bash_profile`
//! - Zsh: `~/.zshrc`
//! - Fish: `~/.config/fish/config.fish`
//! - Anything else: `~/.profile`
//!
//! ## Configuration Format
//!
//! For POSIX shells:
//! ```bash
//! # Added by lux-install
//! export PATH="/home/user/.lux/bin:$PATH"
//! ```
//!
//! For fish:
//! ```fish
//! # Added by lux-install
//! fish_add_path /home/user/.lux/bin
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::search_path::{SearchPathStore, contains_segment};

/// Marker comment written above each block.
const LUX_MARKER: &str = "# Added by lux-install";

/// Shell families with distinct profile syntax or location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    /// Any other POSIX shell, configured through `~/.profile`.
    Posix,
}

impl Shell {
    /// Detects the user's shell from the `SHELL` environment variable.
    #[must_use]
    pub fn detect() -> Self {
        std::env::var("SHELL")
            .ok()
            .map_or(Self::Posix, |path| Self::from_path(&path))
    }

    /// Parses a shell from a path string (e.g., "/bin/bash").
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        match Path::new(path).file_name().and_then(|n| n.to_str()) {
            Some("bash") => Self::Bash,
            Some("zsh") => Self::Zsh,
            Some("fish") => Self::Fish,
            _ => Self::Posix,
        }
    }

    /// Returns the profile files for this shell, preferred first.
    #[must_use]
    pub fn profile_candidates(self, home_dir: &Path) -> Vec<PathBuf> {
        match self {
            Self::Bash => vec![home_dir.join(".bashrc"), home_dir.join(".bash_profile")],
            Self::Zsh => vec![home_dir.join(".zshrc")],
            Self::Fish => vec![home_dir.join(".config").join("fish").join("config.fish")],
            Self::Posix => vec![home_dir.join(".profile")],
        }
    }

    /// Generates the PATH block for `bin_path`.
    ///
    /// Bash/Zsh paths are escaped for double quotes; fish paths are single
    /// quoted when they contain characters fish would interpret.
    #[must_use]
    pub fn path_config(self, bin_path: &str) -> String {
        match self {
            Self::Bash | Self::Zsh | Self::Posix => {
                let escaped = bin_path
                    .replace('\\', "\\\\")
                    .replace('$', "\\$")
                    .replace('`', "\\`")
                    .replace('"', "\\\"");
                format!("\n{LUX_MARKER}\nexport PATH=\"{escaped}:$PATH\"\n")
            }
            Self::Fish => {
                let needs_quotes = bin_path.contains([
                    ' ', '$', '\\', '\'', '*', '?', '(', ')', '[', ']', '{', '}',
                ]);
                let formatted = if needs_quotes {
                    format!("'{}'", bin_path.replace('\'', "\\'"))
                } else {
                    bin_path.to_string()
                };
                format!("\n{LUX_MARKER}\nfish_add_path {formatted}\n")
            }
        }
    }
}

/// The user's shell profile viewed as a search path store.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    shell: Shell,
    profile: PathBuf,
    home: PathBuf,
}

impl ProfileStore {
    /// Builds a store for the detected shell and home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn detect() -> Result<Self> {
        let home = dirs::home_dir().context("Cannot determine home directory")?;
        Ok(Self::new(Shell::detect(), home))
    }

    /// Builds a store for `shell` under `home`, using the first existing
    /// candidate profile or the preferred one when none exists yet.
    #[must_use]
    pub fn new(shell: Shell, home: PathBuf) -> Self {
        let candidates = shell.profile_candidates(&home);
        let profile = candidates
            .iter()
            .find(|p| p.exists())
            .or_else(|| candidates.first())
            .cloned()
            .unwrap_or_else(|| home.join(".profile"));
        Self {
            shell,
            profile,
            home,
        }
    }

    /// Extracts the directories added by PATH lines in `content`.
    fn parse_directories(&self, content: &str) -> Vec<String> {
        content
            .lines()
            .flat_map(|line| parse_path_line(line.trim()))
            .map(|dir| self.expand_home(&dir))
            .collect()
    }

    fn expand_home(&self, dir: &str) -> String {
        let home = self.home.to_string_lossy();
        for prefix in ["$HOME", "${HOME}", "~"] {
            if let Some(rest) = dir.strip_prefix(prefix)
                && (rest.is_empty() || rest.starts_with('/'))
            {
                return format!("{home}{rest}");
            }
        }
        dir.to_string()
    }
}

impl SearchPathStore for ProfileStore {
    fn read(&self) -> Result<String> {
        if !self.profile.exists() {
            return Ok(String::new());
        }
        let content = std::fs::read_to_string(&self.profile)
            .with_context(|| format!("Failed to read profile: {}", self.profile.display()))?;
        Ok(self.parse_directories(&content).join(":"))
    }

    fn write(&mut self, value: &str) -> Result<()> {
        let current = self.read()?;
        let mut added: Vec<&str> = Vec::new();
        for dir in value.split(':').filter(|s| !s.trim().is_empty()) {
            if !contains_segment(&current, dir, ':', false) && !added.contains(&dir) {
                added.push(dir);
            }
        }
        if added.is_empty() {
            return Ok(());
        }
        let blocks: String = added
            .iter()
            .map(|dir| self.shell.path_config(dir))
            .collect();
        append_to_file(&self.profile, &blocks)
    }

    fn separator(&self) -> char {
        ':'
    }

    fn location(&self) -> String {
        self.profile.display().to_string()
    }
}

/// Returns the directories a PATH line adds; empty for any other line.
///
/// Every segment of a `PATH=` assignment counts except the `$PATH`
/// reference itself, so both `PATH="<dir>:$PATH"` and `PATH="$PATH:<dir>"`
/// are recognised.
fn parse_path_line(line: &str) -> Vec<String> {
    if let Some(rest) = line.strip_prefix("fish_add_path ") {
        let mut arg = rest.trim();
        while arg.starts_with('-') {
            arg = arg.split_once(char::is_whitespace).map_or("", |(_, r)| r.trim_start());
        }
        return if arg.is_empty() {
            Vec::new()
        } else {
            vec![unquote(arg)]
        };
    }

    let rest = line.strip_prefix("export ").unwrap_or(line).trim_start();
    let Some(value) = rest.strip_prefix("PATH=") else {
        return Vec::new();
    };
    unquote(value)
        .split(':')
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && !matches!(*segment, "$PATH" | "${PATH}"))
        .map(str::to_string)
        .collect()
}

/// Removes surrounding quotes and undoes the escapes written by
/// [`Shell::path_config`].
fn unquote(value: &str) -> String {
    if let Some(inner) = value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
        return inner.replace("\\'", "'");
    }
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Appends content to a file, creating it and its parent directory.
fn append_to_file(path: &Path, content: &str) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open profile for writing: {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to profile: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installer::search_path::{Registration, register};

    fn store_in(home: &Path, shell: Shell) -> ProfileStore {
        ProfileStore::new(shell, home.to_path_buf())
    }

    #[test]
    fn shell_from_path() {
        assert_eq!(Shell::from_path("/bin/bash"), Shell::Bash);
        assert_eq!(Shell::from_path("/usr/local/bin/zsh"), Shell::Zsh);
        assert_eq!(Shell::from_path("/usr/bin/fish"), Shell::Fish);
        assert_eq!(Shell::from_path("/bin/dash"), Shell::Posix);
        assert_eq!(Shell::from_path(""), Shell::Posix);
    }

    #[test]
    fn profile_candidates() {
        let home = PathBuf::from("/home/user");
        assert_eq!(
            Shell::Bash.profile_candidates(&home),
            vec![
                PathBuf::from("/home/user/.bashrc"),
                PathBuf::from("/home/user/.bash_profile")
            ]
        );
        assert_eq!(
            Shell::Fish.profile_candidates(&home),
            vec![PathBuf::from("/home/user/.config/fish/config.fish")]
        );
        assert_eq!(
            Shell::Posix.profile_candidates(&home),
            vec![PathBuf::from("/home/user/.profile")]
        );
    }

    #[test]
    fn path_config_bash_escapes_special_chars() {
        let config = Shell::Bash.path_config("/home/user/$X/`t`/\"q\"/bin");
        assert!(config.contains(LUX_MARKER));
        assert!(config.contains(r#"export PATH="/home/user/\$X/\`t\`/\"q\"/bin:$PATH""#));
    }

    #[test]
    fn path_config_fish_quotes_path_with_spaces() {
        let config = Shell::Fish.path_config("/home/user/My Documents/.lux/bin");
        assert!(config.contains("fish_add_path '/home/user/My Documents/.lux/bin'"));
        let plain = Shell::Fish.path_config("/home/user/.lux/bin");
        assert!(plain.contains("fish_add_path /home/user/.lux/bin\n"));
    }

    #[test]
    fn parses_generated_lines_back() {
        for shell in [Shell::Bash, Shell::Fish] {
            let dir = "/home/user/it's $weird/bin";
            let block = shell.path_config(dir);
            let line = block.lines().last().unwrap();
            assert_eq!(parse_path_line(line), vec![dir.to_string()], "{shell:?}");
        }
    }

    #[test]
    fn parses_hand_written_lines() {
        assert_eq!(
            parse_path_line("export PATH=$HOME/.cargo/bin:$PATH"),
            vec!["$HOME/.cargo/bin"]
        );
        assert_eq!(parse_path_line("PATH=\"/opt/bin:${PATH}\""), vec!["/opt/bin"]);
        assert_eq!(
            parse_path_line("fish_add_path -g ~/.local/bin"),
            vec!["~/.local/bin"]
        );
        assert!(parse_path_line("alias ll='ls -l'").is_empty());
        assert!(parse_path_line("export PATH").is_empty());
    }

    #[test]
    fn parses_appending_and_multi_segment_lines() {
        assert_eq!(parse_path_line("export PATH=\"$PATH:/opt/bin\""), vec!["/opt/bin"]);
        assert_eq!(
            parse_path_line("export PATH=\"/a/bin:$PATH:$HOME/.lux/bin\""),
            vec!["/a/bin", "$HOME/.lux/bin"]
        );
        assert_eq!(
            parse_path_line("PATH=${PATH}:~/tools:"),
            vec!["~/tools"]
        );
    }

    #[test]
    fn read_expands_home_references() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(
            home.path().join(".zshrc"),
            "export PATH=\"$HOME/.lux/bin:$PATH\"\nexport PATH=~/bin:$PATH\n",
        )
        .unwrap();
        let store = store_in(home.path(), Shell::Zsh);

        let value = store.read().unwrap();

        let home = home.path().display();
        assert_eq!(value, format!("{home}/.lux/bin:{home}/bin"));
    }

    #[test]
    fn prefers_existing_bash_profile_over_missing_bashrc() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join(".bash_profile"), "").unwrap();
        let store = store_in(home.path(), Shell::Bash);
        assert_eq!(store.profile, home.path().join(".bash_profile"));
    }

    #[test]
    fn register_appends_once_and_preserves_content() {
        let home = tempfile::tempdir().unwrap();
        let profile = home.path().join(".bashrc");
        std::fs::write(&profile, "alias ll='ls -l'\n").unwrap();
        let dir = home.path().join(".lux").join("bin");
        let mut store = store_in(home.path(), Shell::Bash);

        let first = register(&mut store, &dir).unwrap();
        let after_first = std::fs::read_to_string(&profile).unwrap();
        let second = register(&mut store, &dir).unwrap();
        let after_second = std::fs::read_to_string(&profile).unwrap();

        assert!(matches!(first, Registration::Added { .. }));
        assert!(matches!(second, Registration::AlreadyConfigured { .. }));
        assert!(after_first.starts_with("alias ll='ls -l'\n"));
        assert_eq!(after_first.matches(LUX_MARKER).count(), 1);
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn register_recognises_home_relative_entry() {
        let home = tempfile::tempdir().unwrap();
        let profile = home.path().join(".profile");
        std::fs::write(&profile, "export PATH=\"$HOME/.lux/bin:$PATH\"\n").unwrap();
        let mut store = store_in(home.path(), Shell::Posix);

        let result = register(&mut store, &home.path().join(".lux/bin")).unwrap();

        assert!(matches!(result, Registration::AlreadyConfigured { .. }));
        assert!(!std::fs::read_to_string(&profile).unwrap().contains(LUX_MARKER));
    }

    #[test]
    fn register_recognises_appended_entry() {
        let home = tempfile::tempdir().unwrap();
        let profile = home.path().join(".bashrc");
        let original = "export PATH=\"$PATH:$HOME/.lux/bin\"\n";
        std::fs::write(&profile, original).unwrap();
        let mut store = store_in(home.path(), Shell::Bash);

        let result = register(&mut store, &home.path().join(".lux/bin")).unwrap();

        assert!(matches!(result, Registration::AlreadyConfigured { .. }));
        let content = std::fs::read_to_string(&profile).unwrap();
        assert_eq!(content, original);
        assert_eq!(content.matches(".lux/bin").count(), 1);
    }

    #[test]
    fn read_expands_home_in_every_segment() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(
            home.path().join(".profile"),
            "export PATH=\"$HOME/a:$PATH:${HOME}/b:~/c\"\n",
        )
        .unwrap();
        let store = store_in(home.path(), Shell::Posix);

        let value = store.read().unwrap();

        let home = home.path().display();
        assert_eq!(value, format!("{home}/a:{home}/b:{home}/c"));
    }

    #[test]
    fn fish_profile_is_created_with_parent_directory() {
        let home = tempfile::tempdir().unwrap();
        let mut store = store_in(home.path(), Shell::Fish);

        register(&mut store, Path::new("/opt/lux/bin")).unwrap();

        let content = std::fs::read_to_string(
            home.path().join(".config").join("fish").join("config.fish"),
        )
        .unwrap();
        assert!(content.contains("fish_add_path /opt/lux/bin"));
    }
}
