//! JSON documents on the local filesystem.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tally_core::{BlobStore, StoreError};

use crate::DbError;

#[derive(Debug, Clone)]
enum Layout {
    /// `<dir>/<key>.json`
    Directory(PathBuf),
    /// Every key maps to the same file.
    Single(PathBuf),
}

/// Stores each value as a JSON file.
///
/// Writes go to a sibling `.tmp` file which is then renamed over the target,
/// so a crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    layout: Layout,
}

impl JsonFileStore {
    /// One file per key under `dir`. The directory is created if missing.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Result<Self, DbError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| DbError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            layout: Layout::Directory(dir),
        })
    }

    /// Every key reads and writes `path`. The parent directory is created on
    /// first access.
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            layout: Layout::Single(path.into()),
        }
    }

    /// The file backing `key`.
    pub fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        match &self.layout {
            Layout::Single(path) => Ok(path.clone()),
            Layout::Directory(dir) => {
                if key.is_empty() || key.starts_with('.') || key.contains(['/', '\\']) {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("invalid store key {key:?}"),
                    ));
                }
                Ok(dir.join(format!("{key}.json")))
            }
        }
    }

    fn read(path: &Path) -> io::Result<Option<String>> {
        let lock = open_lock(path)?;
        lock.lock_shared()?;
        let result = match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        };
        lock.unlock()?;
        result
    }

    fn write(path: &Path, value: &str) -> io::Result<()> {
        let lock = open_lock(path)?;
        lock.lock_exclusive()?;

        let tmp = sibling(path, ".tmp");
        let result = replace_via(&tmp, path, value);
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }

        lock.unlock()?;
        result
    }
}

impl BlobStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key).map_err(|err| StoreError::read(key, err))?;
        Self::read(&path).map_err(|err| {
            tracing::warn!(path = %path.display(), error = %err, "failed to read store file");
            StoreError::read(key, err)
        })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key).map_err(|err| StoreError::write(key, err))?;
        Self::write(&path, value).map_err(|err| {
            tracing::warn!(path = %path.display(), error = %err, "failed to write store file");
            StoreError::write(key, err)
        })?;
        tracing::trace!(path = %path.display(), bytes = value.len(), "wrote store file");
        Ok(())
    }
}

/// `<path><suffix>`, in the same directory so rename stays atomic.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

fn replace_via(tmp: &Path, path: &Path, value: &str) -> io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()?;
    fs::rename(tmp, path)
}

/// Opens the `.lock` sidecar, creating it and its directory if needed.
fn open_lock(path: &Path) -> io::Result<File> {
    let lock_path = sibling(path, ".lock");
    if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)
}
