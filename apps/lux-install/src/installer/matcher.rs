//! Asset selection for a product on a platform.
//!
//! A [`SelectionRule`] is an ordered chain of [`AssetPattern`]s, most
//! specific first. Selection scans patterns in priority order and, within a
//! pattern, assets in the order the release lists them; the first hit wins.
//!
//! ## Naming Conventions
//!
//! | Strategy          | Example (`lux`, Windows x64)  |
//! |-------------------|-------------------------------|
//! | `FullPlatformExe` | `lux-windows-x86_64.exe`      |
//! | `ShortAliasExe`   | `lux-win64.exe`               |
//! | `BareNameExe`     | `lux.exe`                     |
//! | `PlatformArchive` | `lux-windows-x64.zip`         |
//!
//! Every executable convention outranks the archive convention. Archives
//! naming this platform's architecture are tried before archives naming only
//! the OS, and an OS-only archive carrying another architecture token is
//! never selected. Names are compared ASCII case-insensitively.

use std::fmt;

use super::platform::Platform;
use super::release::Asset;
use crate::config::Product;

/// Architecture spellings recognised in archive names.
const KNOWN_ARCHES: [&str; 5] = ["x86_64", "x64", "amd64", "aarch64", "arm64"];

/// Archive container recognised from an asset name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// `.zip`
    Zip,
    /// `.tar.gz` or `.tgz`
    TarGz,
}

impl ArchiveFormat {
    /// Classifies an asset name by its extension.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }

    /// Returns the suffix staging files of this format carry.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Zip => ".zip",
            Self::TarGz => ".tar.gz",
        }
    }

    /// Strips a recognised archive extension from a lowercase name.
    fn strip(name: &str) -> Option<&str> {
        name.strip_suffix(".tar.gz")
            .or_else(|| name.strip_suffix(".tgz"))
            .or_else(|| name.strip_suffix(".zip"))
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zip => write!(f, "zip"),
            Self::TarGz => write!(f, "tar.gz"),
        }
    }
}

/// What an asset turns out to be once matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A runnable binary, installed as-is.
    Executable,
    /// An archive to be unpacked into the install directory.
    Archive(ArchiveFormat),
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executable => f.write_str("executable"),
            Self::Archive(format) => write!(f, "{format} archive"),
        }
    }
}

/// Naming convention an asset was matched by, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchStrategy {
    /// `<stem>-<os>-<arch><exe>`
    FullPlatformExe,
    /// `<stem>-<short-alias><exe>`
    ShortAliasExe,
    /// `<stem><exe>`
    BareNameExe,
    /// `<archive-stem>-<os>[-<arch>][-anything].<zip|tar.gz|tgz>`
    PlatformArchive,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FullPlatformExe => "platform executable",
            Self::ShortAliasExe => "short-alias executable",
            Self::BareNameExe => "bare executable",
            Self::PlatformArchive => "platform archive",
        };
        f.write_str(label)
    }
}

/// One candidate asset name shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPattern {
    strategy: MatchStrategy,
    /// Lowercase exact name for executables, lowercase prefix for archives.
    stem: String,
    /// Tokens that disqualify an archive name after the prefix.
    excluded: Vec<&'static str>,
}

impl AssetPattern {
    fn exact(strategy: MatchStrategy, name: String) -> Self {
        Self {
            strategy,
            stem: name.to_ascii_lowercase(),
            excluded: Vec::new(),
        }
    }

    fn archive(prefix: String, excluded: Vec<&'static str>) -> Self {
        Self {
            strategy: MatchStrategy::PlatformArchive,
            stem: prefix.to_ascii_lowercase(),
            excluded,
        }
    }

    /// Tests an asset name against this pattern, classifying it on a hit.
    #[must_use]
    pub fn matches(&self, name: &str) -> Option<ArtifactKind> {
        let name = name.to_ascii_lowercase();
        if self.strategy != MatchStrategy::PlatformArchive {
            return (name == self.stem).then_some(ArtifactKind::Executable);
        }

        let base = ArchiveFormat::strip(&name)?;
        let rest = base.strip_prefix(self.stem.as_str())?;
        if !(rest.is_empty() || rest.starts_with('-') || rest.starts_with('.')) {
            return None;
        }
        if rest
            .split(['-', '.'])
            .any(|token| self.excluded.contains(&token))
        {
            return None;
        }
        ArchiveFormat::from_name(&name).map(ArtifactKind::Archive)
    }
}

/// The asset chosen for a product, with how it was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    /// The winning asset.
    pub asset: &'a Asset,
    /// The convention it matched.
    pub strategy: MatchStrategy,
    /// Executable or archive.
    pub kind: ArtifactKind,
}

/// Ordered pattern chain for one product on one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRule {
    patterns: Vec<AssetPattern>,
}

impl SelectionRule {
    /// Builds the rule for `product` on `platform`.
    #[must_use]
    pub fn for_product(product: &Product, platform: Platform) -> Self {
        Self::for_stems(product.binary, product.archive, platform)
    }

    /// Builds the rule from explicit binary and archive stems.
    #[must_use]
    pub fn for_stems(binary: &str, archive: &str, platform: Platform) -> Self {
        let exe = platform.executable_extension();
        let os_names = os_spellings(platform);
        let mut patterns = Vec::new();

        for os in &os_names {
            for arch in platform.arch_aliases() {
                patterns.push(AssetPattern::exact(
                    MatchStrategy::FullPlatformExe,
                    format!("{binary}-{os}-{arch}{exe}"),
                ));
            }
        }

        for alias in platform.short_aliases() {
            patterns.push(AssetPattern::exact(
                MatchStrategy::ShortAliasExe,
                format!("{binary}-{alias}{exe}"),
            ));
        }

        patterns.push(AssetPattern::exact(
            MatchStrategy::BareNameExe,
            format!("{binary}{exe}"),
        ));

        for os in &os_names {
            for arch in platform.arch_aliases() {
                patterns.push(AssetPattern::archive(
                    format!("{archive}-{os}-{arch}"),
                    Vec::new(),
                ));
            }
        }

        let foreign: Vec<&'static str> = KNOWN_ARCHES
            .into_iter()
            .filter(|arch| !platform.arch_aliases().contains(arch))
            .collect();
        for os in &os_names {
            patterns.push(AssetPattern::archive(
                format!("{archive}-{os}"),
                foreign.clone(),
            ));
        }

        Self { patterns }
    }

    /// Picks the best asset, or `None` when nothing fits.
    #[must_use]
    pub fn select<'a>(&self, assets: &'a [Asset]) -> Option<Selection<'a>> {
        self.patterns.iter().find_map(|pattern| {
            assets.iter().find_map(|asset| {
                pattern.matches(&asset.name).map(|kind| Selection {
                    asset,
                    strategy: pattern.strategy,
                    kind,
                })
            })
        })
    }
}

/// Canonical OS name followed by its distinct short aliases.
fn os_spellings(platform: Platform) -> Vec<&'static str> {
    let mut names = vec![platform.os()];
    for &alias in platform.short_aliases() {
        if !names.contains(&alias) {
            names.push(alias);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets(names: &[&str]) -> Vec<Asset> {
        names
            .iter()
            .map(|name| Asset {
                name: (*name).to_string(),
                url: format!("https://example.invalid/{name}"),
            })
            .collect()
    }

    fn pick(binary: &str, platform: Platform, names: &[&str]) -> Option<(String, MatchStrategy)> {
        let assets = assets(names);
        SelectionRule::for_stems(binary, binary, platform)
            .select(&assets)
            .map(|s| (s.asset.name.clone(), s.strategy))
    }

    #[test]
    fn archive_format_from_extension() {
        assert_eq!(ArchiveFormat::from_name("a.zip"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_name("a.TAR.GZ"), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_name("a.tgz"), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_name("a.exe"), None);
    }

    #[test]
    fn windows_zip_selected_over_foreign_binary() {
        let assets = assets(&["tool-windows.zip", "tool-linux"]);
        let selection = SelectionRule::for_stems("tool", "tool", Platform::WindowsX64)
            .select(&assets)
            .unwrap();
        assert_eq!(selection.asset.name, "tool-windows.zip");
        assert_eq!(selection.strategy, MatchStrategy::PlatformArchive);
        assert_eq!(selection.kind, ArtifactKind::Archive(ArchiveFormat::Zip));
    }

    #[test]
    fn executable_beats_archive_regardless_of_listing_order() {
        let picked = pick(
            "lux",
            Platform::LinuxX64,
            &["lux-linux-x86_64.tar.gz", "lux-linux-x86_64"],
        );
        assert_eq!(
            picked,
            Some(("lux-linux-x86_64".into(), MatchStrategy::FullPlatformExe))
        );
    }

    #[test]
    fn full_platform_name_beats_short_alias() {
        let picked = pick(
            "lux",
            Platform::WindowsX64,
            &["lux-win64.exe", "lux-windows-amd64.exe"],
        );
        assert_eq!(
            picked,
            Some(("lux-windows-amd64.exe".into(), MatchStrategy::FullPlatformExe))
        );
    }

    #[test]
    fn short_alias_and_bare_name() {
        assert_eq!(
            pick("lpm", Platform::MacosArm64, &["lpm", "lpm-darwin"]),
            Some(("lpm-darwin".into(), MatchStrategy::ShortAliasExe))
        );
        assert_eq!(
            pick("lpm", Platform::WindowsArm64, &["lpm", "lpm.exe"]),
            Some(("lpm.exe".into(), MatchStrategy::BareNameExe))
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(
            pick("lux", Platform::MacosX64, &["LUX-MacOS-X86_64"]),
            Some(("LUX-MacOS-X86_64".into(), MatchStrategy::FullPlatformExe))
        );
    }

    #[test]
    fn archive_requires_separator_after_os() {
        assert_eq!(pick("lux", Platform::LinuxX64, &["lux-linuxish.tar.gz"]), None);
        assert_eq!(
            pick("lux", Platform::LinuxX64, &["lux-linux-x64-musl.tgz"]),
            Some(("lux-linux-x64-musl.tgz".into(), MatchStrategy::PlatformArchive))
        );
    }

    #[test]
    fn windows_executables_need_exe_suffix() {
        assert_eq!(pick("lux", Platform::WindowsX64, &["lux-windows-x86_64"]), None);
        assert_eq!(pick("lux", Platform::LinuxX64, &["lux-linux-x86_64.exe"]), None);
    }

    #[test]
    fn no_assets_means_no_match() {
        assert_eq!(pick("lux", Platform::LinuxArm64, &[]), None);
    }

    #[test]
    fn other_architecture_is_ignored() {
        assert_eq!(
            pick("lux", Platform::LinuxArm64, &["lux-linux-x86_64", "lux-linux-arm64"]),
            Some(("lux-linux-arm64".into(), MatchStrategy::FullPlatformExe))
        );
    }

    #[test]
    fn archive_for_own_architecture_wins_over_earlier_listing() {
        assert_eq!(
            pick(
                "lux",
                Platform::LinuxArm64,
                &["lux-linux-x86_64.tar.gz", "lux-linux-aarch64.tar.gz"]
            ),
            Some(("lux-linux-aarch64.tar.gz".into(), MatchStrategy::PlatformArchive))
        );
    }

    #[test]
    fn archive_for_foreign_architecture_is_never_selected() {
        assert_eq!(pick("lux", Platform::WindowsX64, &["lux-windows-arm64.zip"]), None);
        assert_eq!(pick("lux", Platform::WindowsX64, &["lux-win-arm64.zip"]), None);
        assert_eq!(
            pick("lux", Platform::MacosArm64, &["lux-macos-x64-signed.tar.gz"]),
            None
        );
    }

    #[test]
    fn os_only_archive_is_the_fallback() {
        assert_eq!(
            pick(
                "lux",
                Platform::LinuxX64,
                &["lux-linux-musl.tar.gz", "lux-linux-amd64.tar.gz"]
            ),
            Some(("lux-linux-amd64.tar.gz".into(), MatchStrategy::PlatformArchive))
        );
        assert_eq!(
            pick("lux", Platform::LinuxX64, &["lux-linux-musl.tar.gz"]),
            Some(("lux-linux-musl.tar.gz".into(), MatchStrategy::PlatformArchive))
        );
    }

    #[test]
    fn artifact_kind_labels() {
        assert_eq!(ArtifactKind::Executable.to_string(), "executable");
        assert_eq!(
            ArtifactKind::Archive(ArchiveFormat::TarGz).to_string(),
            "tar.gz archive"
        );
    }

    #[test]
    fn patterns_are_in_priority_order() {
        let rule = SelectionRule::for_stems("lux", "lux", Platform::LinuxX64);
        let strategies: Vec<_> = rule.patterns.iter().map(|p| p.strategy).collect();
        let mut sorted = strategies.clone();
        sorted.sort();
        assert_eq!(strategies, sorted);
    }
}
