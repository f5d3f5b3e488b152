//! Extraction of Go release archives into environment directories.
//!
//! Go publishes `.tar.gz` archives for Unix-like systems and `.zip` archives
//! for Windows. Both wrap the toolchain in a single `go/` folder, which is
//! stripped so that an environment directory holds `bin/`, `src/` and friends
//! directly.

use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::errors::{GomError, Result};

/// Extracts `archive_path` into `dest_dir`, choosing the format by extension.
///
/// `.tar.gz` and `.tgz` are read as gzip-compressed tarballs, anything else as
/// a ZIP archive.
///
/// # Errors
///
/// Returns [`GomError::ArchiveError`] for malformed archives or unsafe entry
/// paths and [`GomError::Io`] when writing the output fails.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let path_str = archive_path.to_string_lossy();
    tracing::debug!(archive = %archive_path.display(), dest = %dest_dir.display(), "extracting");
    if path_str.ends_with(".tar.gz") || path_str.ends_with(".tgz") {
        extract_tar_gz(archive_path, dest_dir)
    } else {
        extract_zip(archive_path, dest_dir)
    }
}

/// Extracts a tar.gz archive, stripping a common root folder if there is one.
///
/// # Errors
///
/// See [`extract_archive`].
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    create_dir(dest_dir)?;

    let strip_prefix = find_common_root_folder_tar(archive_path)?;

    let mut archive = open_tar(archive_path)?;
    let entries = archive
        .entries()
        .map_err(|e| malformed(archive_path, &e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| malformed(archive_path, &e))?;
        let entry_path = entry
            .path()
            .map_err(|e| malformed(archive_path, &e))?
            .into_owned();
        reject_unsafe(&entry_path)?;

        let Some(relative_path) = strip(&entry_path, strip_prefix.as_deref()) else {
            continue;
        };
        let output_path = dest_dir.join(&relative_path);

        if entry.header().entry_type().is_dir() {
            create_dir(&output_path)?;
        } else {
            if let Some(parent) = output_path.parent() {
                create_dir(parent)?;
            }
            entry.unpack(&output_path).map_err(|e| {
                GomError::io_error(format!("failed to extract {}", output_path.display()), e)
            })?;
        }
    }

    Ok(())
}

/// Extracts a ZIP archive, stripping a common root folder if there is one.
///
/// Unix permission bits stored in the archive are restored.
///
/// # Errors
///
/// See [`extract_archive`].
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path).map_err(|e| {
        GomError::io_error(format!("failed to open {}", archive_path.display()), e)
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| malformed(archive_path, &e))?;

    create_dir(dest_dir)?;

    let strip_prefix = find_common_root_folder(&mut archive);

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| malformed(archive_path, &e))?;

        // enclosed_name already refuses `..` and absolute names
        let entry_path = entry.enclosed_name().ok_or_else(|| {
            GomError::archive_error(format!("refusing to extract unsafe path {}", entry.name()))
        })?;
        reject_unsafe(&entry_path)?;

        let Some(relative_path) = strip(&entry_path, strip_prefix.as_deref()) else {
            continue;
        };
        let output_path = dest_dir.join(&relative_path);

        if entry.is_dir() {
            create_dir(&output_path)?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            create_dir(parent)?;
        }
        let mut outfile = std::fs::File::create(&output_path).map_err(|e| {
            GomError::io_error(format!("failed to create {}", output_path.display()), e)
        })?;
        std::io::copy(&mut entry, &mut outfile).map_err(|e| {
            GomError::io_error(format!("failed to extract {}", output_path.display()), e)
        })?;

        restore_mode(&output_path, entry.unix_mode())?;
    }

    Ok(())
}

#[cfg(unix)]
fn restore_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let Some(mode) = mode else {
        return Ok(());
    };
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
        GomError::io_error(format!("failed to set permissions on {}", path.display()), e)
    })
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn restore_mode(_path: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}

fn open_tar(archive_path: &Path) -> Result<Archive<GzDecoder<std::fs::File>>> {
    let file = std::fs::File::open(archive_path).map_err(|e| {
        GomError::io_error(format!("failed to open {}", archive_path.display()), e)
    })?;
    Ok(Archive::new(GzDecoder::new(file)))
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| GomError::io_error(format!("failed to create {}", dir.display()), e))
}

fn malformed(archive_path: &Path, err: &dyn std::fmt::Display) -> GomError {
    GomError::archive_error(format!("{}: {err}", archive_path.display()))
}

/// Rejects entries that would land outside the destination directory.
fn reject_unsafe(entry_path: &Path) -> Result<()> {
    if entry_path.is_absolute()
        || entry_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        return Err(GomError::archive_error(format!(
            "refusing to extract path with parent directory or absolute reference: {}",
            entry_path.display()
        )));
    }
    Ok(())
}

/// Returns the path relative to the stripped root, or `None` for the root
/// folder itself.
fn strip(entry_path: &Path, prefix: Option<&Path>) -> Option<PathBuf> {
    match prefix.map(|prefix| entry_path.strip_prefix(prefix)) {
        Some(Ok(p)) if p.as_os_str().is_empty() => None,
        Some(Ok(p)) => Some(p.to_path_buf()),
        Some(Err(_)) | None => Some(entry_path.to_path_buf()),
    }
}

/// Finds a folder shared by every tarball entry.
///
/// A shared first component only counts as a root folder when some entry is
/// nested below it; a tarball holding a single flat file is left alone.
fn find_common_root_folder_tar(archive_path: &Path) -> Result<Option<PathBuf>> {
    let mut archive = open_tar(archive_path)?;

    let mut common_root: Option<PathBuf> = None;
    let mut has_nested_entries = false;

    for entry in archive
        .entries()
        .map_err(|e| malformed(archive_path, &e))?
    {
        let entry = entry.map_err(|e| malformed(archive_path, &e))?;
        let path = entry.path().map_err(|e| malformed(archive_path, &e))?;

        let mut components = path
            .components()
            .filter(|c| !matches!(c, Component::CurDir));
        let Some(first_component) = components.next() else {
            continue;
        };
        if components.next().is_some() {
            has_nested_entries = true;
        }
        let root = PathBuf::from(first_component.as_os_str());

        match &common_root {
            None => common_root = Some(root),
            Some(existing) if existing != &root => return Ok(None),
            Some(_) => {}
        }
    }

    Ok(common_root.filter(|_| has_nested_entries))
}

fn find_common_root_folder<R: std::io::Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Option<PathBuf> {
    let mut common_root: Option<PathBuf> = None;
    let mut has_nested_entries = false;

    for i in 0..archive.len() {
        let entry = archive.by_index(i).ok()?;
        let path = entry.enclosed_name()?;

        if path.components().count() > 1 {
            has_nested_entries = true;
        }

        let first_component = path.components().next()?;
        let root = PathBuf::from(first_component.as_os_str());

        match &common_root {
            None => common_root = Some(root),
            Some(existing) if existing != &root => return None,
            Some(_) => {}
        }
    }

    common_root.filter(|_| has_nested_entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tar::Builder;

    fn append(builder: &mut Builder<GzEncoder<std::fs::File>>, path: &str, data: &[u8], mode: u32) {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_cksum();
        builder.append_data(&mut header, path, data).unwrap();
    }

    /// A tarball laid out like an official Go release.
    fn go_tarball(path: &Path) {
        let file = std::fs::File::create(path).unwrap();
        let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
        append(&mut builder, "go/VERSION", b"go1.21.3\n", 0o644);
        append(&mut builder, "go/bin/go", b"#!/bin/sh\n", 0o755);
        append(&mut builder, "go/bin/gofmt", b"#!/bin/sh\n", 0o755);
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn go_zip(path: &Path) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
        zip.start_file("go/bin/go.exe", options).unwrap();
        zip.write_all(b"MZ").unwrap();
        zip.start_file("go/VERSION", options).unwrap();
        zip.write_all(b"go1.21.3\n").unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn tarball_root_folder_is_stripped() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("go1.21.3.linux-amd64.tar.gz");
        let dest = temp.path().join("envs").join("1.21.3");
        go_tarball(&archive);

        extract_archive(&archive, &dest).unwrap();

        assert!(dest.join("bin").join("go").is_file());
        assert!(dest.join("bin").join("gofmt").is_file());
        assert_eq!(std::fs::read(dest.join("VERSION")).unwrap(), b"go1.21.3\n");
        assert!(!dest.join("go").exists());
    }

    #[cfg(unix)]
    #[test]
    fn tarball_keeps_executable_bits() {
        use std::os::unix::fs::PermissionsExt;
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("go.tgz");
        let dest = temp.path().join("out");
        go_tarball(&archive);

        extract_archive(&archive, &dest).unwrap();

        let mode = std::fs::metadata(dest.join("bin").join("go"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn zip_root_folder_is_stripped() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("go1.21.3.windows-amd64.zip");
        let dest = temp.path().join("out");
        go_zip(&archive);

        extract_archive(&archive, &dest).unwrap();

        assert!(dest.join("bin").join("go.exe").is_file());
        assert!(dest.join("VERSION").is_file());
    }

    #[test]
    fn flat_tarball_is_not_stripped() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("flat.tar.gz");
        let dest = temp.path().join("out");
        {
            let file = std::fs::File::create(&archive).unwrap();
            let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
            append(&mut builder, "go", b"binary", 0o755);
            builder.into_inner().unwrap().finish().unwrap();
        }

        extract_tar_gz(&archive, &dest).unwrap();

        assert!(dest.join("go").is_file());
    }

    #[test]
    fn mixed_roots_are_kept() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("mixed.tar.gz");
        let dest = temp.path().join("out");
        {
            let file = std::fs::File::create(&archive).unwrap();
            let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
            append(&mut builder, "bin/go", b"binary", 0o755);
            append(&mut builder, "lib/time/zoneinfo.zip", b"zones", 0o644);
            builder.into_inner().unwrap().finish().unwrap();
        }

        extract_tar_gz(&archive, &dest).unwrap();

        assert!(dest.join("bin").join("go").is_file());
        assert!(dest.join("lib").join("time").join("zoneinfo.zip").is_file());
    }

    #[test]
    fn parent_directory_entries_are_refused() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.tar.gz");
        let dest = temp.path().join("out");
        {
            let file = std::fs::File::create(&archive).unwrap();
            let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
            let data = b"owned";
            let mut header = tar::Header::new_old();
            let name = b"../escape.txt";
            header.as_old_mut().name[..name.len()].copy_from_slice(name);
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, data.as_slice()).unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }

        let result = extract_tar_gz(&archive, &dest);

        assert!(matches!(result, Err(GomError::ArchiveError { .. })));
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[test]
    fn corrupt_zip_is_an_archive_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        std::fs::write(&archive, b"definitely not a zip").unwrap();

        let result = extract_archive(&archive, &temp.path().join("out"));

        assert!(matches!(result, Err(GomError::ArchiveError { .. })));
    }

    #[test]
    fn empty_tarball_creates_empty_destination() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("empty.tar.gz");
        let dest = temp.path().join("out");
        {
            let file = std::fs::File::create(&archive).unwrap();
            let builder = Builder::new(GzEncoder::new(file, Compression::default()));
            builder.into_inner().unwrap().finish().unwrap();
        }

        extract_tar_gz(&archive, &dest).unwrap();

        assert!(dest.is_dir());
        assert_eq!(std::fs::read_dir(&dest).unwrap().count(), 0);
    }
}
