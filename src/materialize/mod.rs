//! Header archive materialization.
//!
//! Compile scopes resolve header packages that may arrive as single-file
//! zip archives. A compiler wants a directory tree, so the resolution
//! engine applies the transform here on demand: an archive is extracted,
//! exactly once per content, into `<output root>/<archive base name>`; an
//! artifact that is already a directory passes through untouched.
//!
//! Extraction is staged in a temporary sibling directory and renamed into
//! place, so a destination directory that exists is always a complete one.
//! A sha256 fingerprint sidecar (`<name>.fingerprint`) decides whether an
//! existing destination can be reused or must be replaced because the
//! archive's bytes changed under the same name.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::util::hash;

/// Error extracting a header archive.
///
/// Always names the archive and, where one was attempted, the destination,
/// so a corrupt or inaccessible dependency artifact can be diagnosed from
/// the message alone. Never retried here; retry is the build executor's
/// call.
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("failed to read archive `{}`", archive.display())]
    ArchiveRead {
        archive: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed archive `{}`", archive.display())]
    MalformedArchive {
        archive: PathBuf,
        #[source]
        source: ZipError,
    },

    #[error("entry `{entry}` in archive `{}` escapes the destination directory", archive.display())]
    EntryEscapes { archive: PathBuf, entry: String },

    #[error("archive `{}` has no base name to derive an output directory from", archive.display())]
    UnnamedArchive { archive: PathBuf },

    #[error("failed to write `{}` while extracting `{}`", dest.display(), archive.display())]
    Write {
        archive: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to stage extraction of `{}` under `{}`", archive.display(), root.display())]
    Staging {
        archive: PathBuf,
        root: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to fingerprint archive `{}`", archive.display())]
    Fingerprint {
        archive: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// A transform from one artifact shape to another, invoked by the
/// resolution engine when an artifact view requests a usage no variant was
/// published under.
///
/// `transform` is synchronous and must be safe to call from multiple
/// threads for different artifacts; calls for the same artifact are
/// serialized by the transform's own cache.
pub trait ArtifactTransform: Send + Sync {
    /// Transform one input artifact into its output files.
    fn transform(&self, artifact: &Path) -> Result<Vec<PathBuf>, MaterializeError>;
}

/// The shared output area extracted archives land in.
///
/// The destination namespace under the root is keyed by archive base name
/// and shared by every binary in the build; the per-name lock table is what
/// keeps two concurrent extractions of the same archive from interleaving.
#[derive(Debug)]
pub struct TransformCache {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TransformCache {
    /// Create a cache writing under the given output root.
    ///
    /// The root is created lazily on first extraction.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        TransformCache {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get the output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the lock serializing work on one destination name.
    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks.entry(name.to_string()).or_default().clone()
    }
}

/// The transform from packaged header archives to extracted directories.
#[derive(Debug, Clone)]
pub struct HeaderArchiveTransform {
    cache: Arc<TransformCache>,
}

impl HeaderArchiveTransform {
    /// Create the transform over a shared output cache.
    pub fn new(cache: Arc<TransformCache>) -> Self {
        HeaderArchiveTransform { cache }
    }

    /// The cache this transform writes into.
    pub fn cache(&self) -> &Arc<TransformCache> {
        &self.cache
    }
}

impl ArtifactTransform for HeaderArchiveTransform {
    fn transform(&self, artifact: &Path) -> Result<Vec<PathBuf>, MaterializeError> {
        // Upstream already publishes exploded headers: identity passthrough.
        if artifact.is_dir() {
            return Ok(vec![artifact.to_path_buf()]);
        }

        let name = archive_stem(artifact)?;
        let root = self.cache.root();
        let dest = root.join(&name);

        // One extraction per destination name at a time.
        let name_lock = self.cache.lock_for(&name);
        let _held = name_lock.lock().unwrap();

        fs::create_dir_all(root).map_err(|source| MaterializeError::Staging {
            archive: artifact.to_path_buf(),
            root: root.to_path_buf(),
            source,
        })?;

        let digest =
            hash::sha256_file(artifact).map_err(|source| MaterializeError::Fingerprint {
                archive: artifact.to_path_buf(),
                source,
            })?;
        let fingerprint_path = root.join(format!("{name}.fingerprint"));

        if dest.is_dir() {
            let recorded = fs::read_to_string(&fingerprint_path).ok();
            if recorded.as_deref() == Some(digest.as_str()) {
                tracing::debug!(
                    "reusing extracted headers for {} at {}",
                    artifact.display(),
                    dest.display()
                );
                return Ok(vec![dest]);
            }
            tracing::debug!(
                "stale extraction for {} at {}, re-extracting",
                artifact.display(),
                dest.display()
            );
        }

        // Extract into a staging sibling, then swap it into place. A
        // destination directory therefore never exists half-written.
        let staging = tempfile::Builder::new()
            .prefix(&format!(".{name}."))
            .tempdir_in(root)
            .map_err(|source| MaterializeError::Staging {
                archive: artifact.to_path_buf(),
                root: root.to_path_buf(),
                source,
            })?;

        unzip_to(artifact, staging.path())?;

        let staged = staging.keep();
        if let Err(source) = fs::remove_dir_all(&dest) {
            if source.kind() != io::ErrorKind::NotFound {
                let _ = fs::remove_dir_all(&staged);
                return Err(MaterializeError::Write {
                    archive: artifact.to_path_buf(),
                    dest,
                    source,
                });
            }
        }

        if let Err(source) = fs::rename(&staged, &dest) {
            // Lost a swap race to another process extracting the same
            // archive; its result is complete, so use it.
            let _ = fs::remove_dir_all(&staged);
            if !dest.is_dir() {
                return Err(MaterializeError::Write {
                    archive: artifact.to_path_buf(),
                    dest,
                    source,
                });
            }
        }

        fs::write(&fingerprint_path, &digest).map_err(|source| MaterializeError::Write {
            archive: artifact.to_path_buf(),
            dest: fingerprint_path.clone(),
            source,
        })?;

        tracing::info!(
            "extracted {} to {}",
            artifact.display(),
            dest.display()
        );
        Ok(vec![dest])
    }
}

/// Derive the destination directory name: archive base name, extension
/// stripped.
fn archive_stem(archive: &Path) -> Result<String, MaterializeError> {
    archive
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| MaterializeError::UnnamedArchive {
            archive: archive.to_path_buf(),
        })
}

/// Stream-extract a zip archive into `dest`.
///
/// Directory entries are skipped; directories come into existence through
/// the parents of file entries. A zero-entry archive is valid and leaves
/// `dest` empty.
fn unzip_to(archive: &Path, dest: &Path) -> Result<(), MaterializeError> {
    let file = File::open(archive).map_err(|source| MaterializeError::ArchiveRead {
        archive: archive.to_path_buf(),
        source,
    })?;

    let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|source| {
        MaterializeError::MalformedArchive {
            archive: archive.to_path_buf(),
            source,
        }
    })?;

    for index in 0..zip.len() {
        let mut entry =
            zip.by_index(index)
                .map_err(|source| MaterializeError::MalformedArchive {
                    archive: archive.to_path_buf(),
                    source,
                })?;

        if entry.is_dir() {
            continue;
        }

        // Zip-slip guard: reject entries that resolve outside dest.
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| MaterializeError::EntryEscapes {
                archive: archive.to_path_buf(),
                entry: entry.name().to_string(),
            })?;
        let out_path = dest.join(relative);

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|source| MaterializeError::Write {
                archive: archive.to_path_buf(),
                dest: parent.to_path_buf(),
                source,
            })?;
        }

        let mut out_file = File::create(&out_path).map_err(|source| MaterializeError::Write {
            archive: archive.to_path_buf(),
            dest: out_path.clone(),
            source,
        })?;
        io::copy(&mut entry, &mut out_file).map_err(|source| MaterializeError::Write {
            archive: archive.to_path_buf(),
            dest: out_path.clone(),
            source,
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])], dirs: &[&str]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        for dir in dirs {
            writer.add_directory(*dir, options).unwrap();
        }
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap();
    }

    fn transform_in(root: &Path) -> HeaderArchiveTransform {
        HeaderArchiveTransform::new(Arc::new(TransformCache::new(root)))
    }

    #[test]
    fn test_directory_passthrough() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("exploded");
        fs::create_dir(&dir).unwrap();

        let transform = transform_in(&tmp.path().join("out"));
        let outputs = transform.transform(&dir).unwrap();

        assert_eq!(outputs, vec![dir]);
        // No output area was created for a passthrough.
        assert!(!tmp.path().join("out").exists());
    }

    #[test]
    fn test_extracts_entries_under_stem() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("headers.zip");
        write_zip(
            &archive,
            &[("a.h", b"alpha".as_slice()), ("sub/b.h", b"beta".as_slice())],
            &["sub/"],
        );

        let out_root = tmp.path().join("out");
        let outputs = transform_in(&out_root).transform(&archive).unwrap();

        assert_eq!(outputs, vec![out_root.join("headers")]);
        assert_eq!(fs::read(out_root.join("headers/a.h")).unwrap(), b"alpha");
        assert_eq!(fs::read(out_root.join("headers/sub/b.h")).unwrap(), b"beta");

        let files = crate::util::fs::collect_files(&outputs[0]).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_empty_archive_yields_empty_directory() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("empty.zip");
        write_zip(&archive, &[], &[]);

        let out_root = tmp.path().join("out");
        let outputs = transform_in(&out_root).transform(&archive).unwrap();

        assert_eq!(outputs, vec![out_root.join("empty")]);
        assert!(crate::util::fs::collect_files(&outputs[0]).unwrap().is_empty());
    }

    #[test]
    fn test_reuse_skips_re_extraction() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("headers.zip");
        write_zip(&archive, &[("a.h", b"alpha".as_slice())], &[]);

        let out_root = tmp.path().join("out");
        let transform = transform_in(&out_root);

        let first = transform.transform(&archive).unwrap();
        let extracted = first[0].join("a.h");
        let first_mtime = fs::metadata(&extracted).unwrap().modified().unwrap();

        let second = transform.transform(&archive).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            fs::metadata(&extracted).unwrap().modified().unwrap(),
            first_mtime
        );
    }

    #[test]
    fn test_changed_bytes_re_extract() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("headers.zip");
        write_zip(&archive, &[("a.h", b"v1".as_slice())], &[]);

        let out_root = tmp.path().join("out");
        let transform = transform_in(&out_root);
        transform.transform(&archive).unwrap();

        // Same name, different contents: the old entry must not survive.
        write_zip(
            &archive,
            &[("renamed.h", b"v2".as_slice())],
            &[],
        );
        let outputs = transform.transform(&archive).unwrap();

        assert!(!outputs[0].join("a.h").exists());
        assert_eq!(fs::read(outputs[0].join("renamed.h")).unwrap(), b"v2");
    }

    #[test]
    fn test_malformed_archive_fails_with_paths() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("broken.zip");
        fs::write(&archive, b"definitely not a zip").unwrap();

        let err = transform_in(&tmp.path().join("out"))
            .transform(&archive)
            .unwrap_err();

        assert!(matches!(err, MaterializeError::MalformedArchive { .. }));
        assert!(err.to_string().contains("broken.zip"));
    }

    #[test]
    fn test_missing_archive_fails() {
        let tmp = TempDir::new().unwrap();
        let result = transform_in(&tmp.path().join("out"))
            .transform(&tmp.path().join("nowhere.zip"));
        assert!(result.is_err());
    }

    #[test]
    fn test_stem_strips_extension_only() {
        assert_eq!(archive_stem(Path::new("/a/headers.zip")).unwrap(), "headers");
        assert_eq!(archive_stem(Path::new("bare")).unwrap(), "bare");
        assert!(archive_stem(Path::new("/")).is_err());
    }
}
