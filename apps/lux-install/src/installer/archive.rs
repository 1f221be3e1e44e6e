//! Archive extraction for downloaded release artifacts.
//!
//! Both extractors unpack into the install directory, overwriting existing
//! files. If every entry shares one root folder it is stripped
//! (`lux-0.4.1/lux` becomes `lux`). Entries with absolute paths or `..`
//! components abort the extraction.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::path::{Component, Path, PathBuf};
use tar::Archive;

use super::matcher::ArchiveFormat;

/// Extracts `archive_path` into `dest_dir` and returns the files written.
///
/// # Errors
///
/// Returns an error if the archive is unreadable, contains an unsafe path,
/// or a file cannot be written.
pub fn extract(archive_path: &Path, format: ArchiveFormat, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    match format {
        ArchiveFormat::Zip => extract_zip(archive_path, dest_dir),
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir),
    }
}

/// Extracts a ZIP archive into `dest_dir`.
///
/// # Errors
///
/// Returns an error if the archive cannot be read or an entry cannot be
/// written.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;

    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {}", archive_path.display()))?;

    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    let strip_prefix = common_root(
        (0..archive.len())
            .filter_map(|i| archive.by_index(i).ok().and_then(|e| e.enclosed_name())),
    );
    let mut written = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read archive entry {i}"))?;

        let entry_path = entry.enclosed_name().with_context(|| {
            format!("Refusing to extract unsafe path: {}", entry.name())
        })?;
        ensure_relative(&entry_path)?;

        let Some(relative) = strip_root(&entry_path, strip_prefix.as_deref()) else {
            continue;
        };
        let output_path = dest_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!("Failed to create directory: {}", output_path.display())
            })?;
            continue;
        }

        create_parent(&output_path)?;
        let mut outfile = std::fs::File::create(&output_path)
            .with_context(|| format!("Failed to create file: {}", output_path.display()))?;
        std::io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("Failed to extract: {}", output_path.display()))?;
        written.push(output_path);
    }

    Ok(written)
}

/// Extracts a gzip-compressed tarball into `dest_dir`.
///
/// # Errors
///
/// Returns an error if the archive cannot be read or an entry cannot be
/// written.
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    let strip_prefix = common_root(tar_entry_paths(archive_path)?.into_iter());

    let mut archive = open_tar_gz(archive_path)?;
    let mut written = Vec::new();

    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read tar entries: {}", archive_path.display()))?
    {
        let mut entry = entry
            .with_context(|| format!("Failed to read tar entry: {}", archive_path.display()))?;

        let entry_path = entry
            .path()
            .context("Failed to get entry path")?
            .into_owned();
        ensure_relative(&entry_path)?;

        let Some(relative) = strip_root(&entry_path, strip_prefix.as_deref()) else {
            continue;
        };
        let output_path = dest_dir.join(relative);

        let kind = entry.header().entry_type();
        if kind.is_dir() {
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!("Failed to create directory: {}", output_path.display())
            })?;
            continue;
        }
        if !kind.is_file() {
            log::debug!("skipping non-regular tar entry {}", entry_path.display());
            continue;
        }

        create_parent(&output_path)?;
        entry
            .unpack(&output_path)
            .with_context(|| format!("Failed to extract: {}", output_path.display()))?;
        written.push(output_path);
    }

    Ok(written)
}

/// Sets mode `0755` on `path`.
///
/// # Errors
///
/// Returns an error if the permissions cannot be read or written.
#[cfg(unix)]
pub fn set_executable_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .with_context(|| format!("Failed to get metadata: {}", path.display()))?
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)
        .with_context(|| format!("Failed to set permissions: {}", path.display()))
}

/// Sets executable permissions (no-op on Windows).
#[cfg(windows)]
#[allow(clippy::unnecessary_wraps)]
pub fn set_executable_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

fn open_tar_gz(archive_path: &Path) -> Result<Archive<GzDecoder<std::fs::File>>> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    Ok(Archive::new(GzDecoder::new(file)))
}

fn tar_entry_paths(archive_path: &Path) -> Result<Vec<PathBuf>> {
    let mut archive = open_tar_gz(archive_path)?;
    let mut paths = Vec::new();
    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read tar entries: {}", archive_path.display()))?
    {
        let entry = entry
            .with_context(|| format!("Failed to read tar entry: {}", archive_path.display()))?;
        paths.push(entry.path().context("Failed to get entry path")?.into_owned());
    }
    Ok(paths)
}

/// Rejects absolute paths and paths that climb out of the destination.
fn ensure_relative(path: &Path) -> Result<()> {
    if path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
    {
        anyhow::bail!(
            "Refusing to extract path with parent directory or absolute reference: {}",
            path.display()
        );
    }
    Ok(())
}

/// Returns the entry path with `root` removed, or `None` for the root itself.
fn strip_root<'a>(path: &'a Path, root: Option<&Path>) -> Option<&'a Path> {
    match root.map(|root| path.strip_prefix(root)) {
        Some(Ok(rest)) if rest.as_os_str().is_empty() => None,
        Some(Ok(rest)) => Some(rest),
        _ => Some(path),
    }
}

/// Finds a folder shared by every entry.
///
/// Only a real containing folder counts: at least one entry must be nested
/// below it, so a lone flat file is never stripped.
fn common_root(paths: impl Iterator<Item = PathBuf>) -> Option<PathBuf> {
    let mut root: Option<PathBuf> = None;
    let mut nested = false;

    for path in paths {
        let mut components = path.components();
        let first = PathBuf::from(components.next()?.as_os_str());
        if components.next().is_some() {
            nested = true;
        }
        match &root {
            None => root = Some(first),
            Some(existing) if *existing != first => return None,
            Some(_) => {}
        }
    }

    if nested { root } else { None }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}
