//! File-backed store for the question bank and student degrees.
//!
//! Both collections live in their own file, encrypted when the file name ends
//! in `.enc` and plain JSON otherwise. A missing or empty file reads as an
//! empty collection. Every write goes to a temp file in the target's
//! directory that is then renamed over it, so readers never see a partial
//! file. Read-modify-write cycles hold an exclusive advisory lock on a
//! `<file>.lock` sidecar for their whole duration.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::codec::Envelope;
use crate::error::{CodecError, PersistenceError};
use crate::model::{StudentDegree, Test};
use crate::records::{self, RecordFormat};
use crate::traits::DegreeSink;

/// The bank file and the degrees file, opened with one envelope.
#[derive(Debug, Clone)]
pub struct RecordStore {
    bank_path: PathBuf,
    degrees_path: PathBuf,
    envelope: Envelope,
}

impl RecordStore {
    pub fn new(
        bank_path: impl Into<PathBuf>,
        degrees_path: impl Into<PathBuf>,
        envelope: Envelope,
    ) -> Self {
        Self {
            bank_path: bank_path.into(),
            degrees_path: degrees_path.into(),
            envelope,
        }
    }

    pub fn bank_path(&self) -> &Path {
        &self.bank_path
    }

    pub fn degrees_path(&self) -> &Path {
        &self.degrees_path
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Create whichever data files are missing, each holding an empty
    /// collection. Returns the paths that were created.
    pub fn init(&self) -> Result<Vec<PathBuf>, PersistenceError> {
        let mut created = Vec::new();
        for path in [&self.bank_path, &self.degrees_path] {
            if path.exists() {
                tracing::debug!(path = %path.display(), "data file already exists");
                continue;
            }
            write_records::<Test>(path, &self.envelope, &[])?;
            tracing::info!(path = %path.display(), "created empty data file");
            created.push(path.clone());
        }
        Ok(created)
    }

    pub fn load_bank(&self) -> Result<Vec<Test>, PersistenceError> {
        read_records(&self.bank_path, &self.envelope)
    }

    /// Replace the whole bank.
    pub fn save_bank(&self, tests: &[Test]) -> Result<(), PersistenceError> {
        let _lock = lock(&self.bank_path)?;
        write_records(&self.bank_path, &self.envelope, tests)?;
        tracing::info!(
            path = %self.bank_path.display(),
            tests = tests.len(),
            "saved question bank"
        );
        Ok(())
    }

    pub fn load_degrees(&self) -> Result<Vec<StudentDegree>, PersistenceError> {
        read_records(&self.degrees_path, &self.envelope)
    }

    /// Load the bank with each test's results attached. Results for tests
    /// that no longer exist are returned separately.
    pub fn load_bank_with_degrees(
        &self,
    ) -> Result<(Vec<Test>, Vec<StudentDegree>), PersistenceError> {
        let mut tests = self.load_bank()?;
        let degrees = self.load_degrees()?;
        let orphans = records::attach_degrees(&mut tests, degrees);
        Ok((tests, orphans))
    }

    /// Append one result. Returns how many results are stored afterwards.
    pub fn append_degree(&self, degree: &StudentDegree) -> Result<usize, PersistenceError> {
        let _lock = lock(&self.degrees_path)?;
        let mut degrees: Vec<StudentDegree> = read_records(&self.degrees_path, &self.envelope)?;
        degrees.push(degree.clone());
        write_records(&self.degrees_path, &self.envelope, &degrees)?;
        tracing::info!(
            path = %self.degrees_path.display(),
            student = %degree.name,
            test = %degree.test,
            stored = degrees.len(),
            "appended student degree"
        );
        Ok(degrees.len())
    }

    /// Remove the result at `index` in stored order and return it.
    pub fn remove_degree(&self, index: usize) -> Result<StudentDegree, PersistenceError> {
        let _lock = lock(&self.degrees_path)?;
        let mut degrees: Vec<StudentDegree> = read_records(&self.degrees_path, &self.envelope)?;
        if index >= degrees.len() {
            return Err(PersistenceError::NoSuchRecord {
                index,
                len: degrees.len(),
            });
        }
        let removed = degrees.remove(index);
        write_records(&self.degrees_path, &self.envelope, &degrees)?;
        tracing::info!(
            path = %self.degrees_path.display(),
            student = %removed.name,
            test = %removed.test,
            "removed student degree"
        );
        Ok(removed)
    }
}

impl DegreeSink for RecordStore {
    fn append(&self, degree: &StudentDegree) -> Result<(), PersistenceError> {
        self.append_degree(degree).map(|_| ())
    }
}

/// Read a record file of either format. A missing file is empty.
pub fn read_records<T: DeserializeOwned>(
    path: &Path,
    envelope: &Envelope,
) -> Result<Vec<T>, PersistenceError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "record file missing, treating as empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(PersistenceError::io(path, e)),
    };
    records::decode(RecordFormat::from_path(path), envelope, &data).map_err(|source| {
        PersistenceError::Codec {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Write a record file of either format atomically.
pub fn write_records<T: Serialize>(
    path: &Path,
    envelope: &Envelope,
    records: &[T],
) -> Result<(), PersistenceError> {
    let bytes =
        records::encode(RecordFormat::from_path(path), envelope, records).map_err(|e| match e {
            CodecError::Decode(e) => PersistenceError::Encode(e),
            other => PersistenceError::Codec {
                path: path.to_path_buf(),
                source: other,
            },
        })?;
    write_atomic(path, &bytes)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let parent = parent_dir(path);
    fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| PersistenceError::io(parent, e))?;
    temp.write_all(bytes)
        .map_err(|e| PersistenceError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| PersistenceError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| PersistenceError::io(path, e.error))?;
    Ok(())
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Take the exclusive lock guarding `path`. Released when the file drops.
fn lock(path: &Path) -> Result<File, PersistenceError> {
    let lock_path = lock_path(path);
    let parent = parent_dir(&lock_path);
    fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;

    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| PersistenceError::io(&lock_path, e))?;
    file.lock_exclusive()
        .map_err(|source| PersistenceError::Lock {
            path: lock_path.clone(),
            source,
        })?;
    Ok(file)
}
