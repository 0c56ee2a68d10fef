//! Zip extraction for uploaded gradebooks and the archives nested inside them.

use crate::error::ServiceError;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Upper bound on nested-archive passes; a self-replicating zip stops here.
const MAX_NESTED_ROUNDS: usize = 16;

/// Checks an in-memory upload the same way [`extract_archive`] checks a file,
/// without writing anything. Returns the number of entries.
pub fn check_archive_bytes(bytes: &[u8], max_uncompressed_size: u64) -> Result<usize, ServiceError> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ServiceError::InvalidArchive(e.to_string()))?;
    Ok(checked_entries(&mut zip, max_uncompressed_size)?.len())
}

/// Extracts `archive` into `destination`, returning the number of files written.
///
/// Entries escaping `destination` and archives whose declared uncompressed
/// size exceeds `max_uncompressed_size` are rejected before anything is
/// written.
pub fn extract_archive(
    archive: &Path,
    destination: &Path,
    max_uncompressed_size: u64,
) -> Result<usize, ServiceError> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file)
        .map_err(|e| ServiceError::InvalidArchive(format!("{}: {e}", archive.display())))?;
    let entries = checked_entries(&mut zip, max_uncompressed_size)?;

    fs::create_dir_all(destination)?;
    let mut written = 0;
    for (i, relative, is_dir) in entries {
        let outpath = destination.join(relative);
        if is_dir {
            fs::create_dir_all(&outpath)?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut entry = zip.by_index(i)?;
        let mut outfile = File::create(&outpath)?;
        io::copy(&mut entry, &mut outfile)?;
        written += 1;
    }

    debug!("Extracted {written} files from {}", archive.display());
    Ok(written)
}

/// `(index, relative path, is_dir)` for every entry, or the first reason the
/// archive must not be extracted.
fn checked_entries<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    max_uncompressed_size: u64,
) -> Result<Vec<(usize, PathBuf, bool)>, ServiceError> {
    let mut total: u64 = 0;
    let mut entries = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let entry = zip.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(ServiceError::InvalidArchive(format!(
                "entry '{}' escapes the extraction directory",
                entry.name()
            )));
        };

        total = total.saturating_add(entry.size());
        if total > max_uncompressed_size {
            return Err(ServiceError::InvalidArchive(format!(
                "uncompressed size exceeds {max_uncompressed_size} bytes"
            )));
        }
        entries.push((i, relative, entry.is_dir()));
    }
    Ok(entries)
}

/// Expands every `.zip` below `dir` next to itself and deletes it, repeating
/// until no archives remain. Returns the number of archives expanded.
///
/// Broken nested archives are logged and left in place; they never fail the
/// caller.
pub fn unzip_recursive(dir: &Path, max_uncompressed_size: u64) -> usize {
    let mut expanded = 0;
    let mut broken: HashSet<PathBuf> = HashSet::new();

    for _ in 0..MAX_NESTED_ROUNDS {
        let pending: Vec<PathBuf> = nested_archives(dir)
            .into_iter()
            .filter(|p| !broken.contains(p))
            .collect();
        if pending.is_empty() {
            return expanded;
        }

        for zip_path in pending {
            let Some(parent) = zip_path.parent() else {
                continue;
            };
            match extract_archive(&zip_path, parent, max_uncompressed_size) {
                Ok(_) => {
                    if let Err(err) = fs::remove_file(&zip_path) {
                        warn!("Could not remove {}: {err}", zip_path.display());
                        broken.insert(zip_path);
                    } else {
                        expanded += 1;
                    }
                }
                Err(err) => {
                    warn!("Skipping nested archive {}: {err}", zip_path.display());
                    broken.insert(zip_path);
                }
            }
        }
    }

    warn!(
        "Stopped expanding archives under {} after {MAX_NESTED_ROUNDS} rounds",
        dir.display()
    );
    expanded
}

fn nested_archives(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "zip"))
        .map(|e| e.into_path())
        .collect()
}
