//! Out-of-line storage for TEXT and VECTOR payloads.
//!
//! A record keeps a 16-byte descriptor (`offset: u64`, `len: u64`, little
//! endian) and the payload bytes live in an append-only side file. Space of
//! overwritten or deleted payloads is not reclaimed.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::value::DESCRIPTOR_SIZE;
use crate::core::DatabaseError;

/// Location of a payload inside a `LobFile`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LobDescriptor {
    pub offset: u64,
    /// Byte length for TEXT, dimension for VECTOR
    pub len: u64,
}

impl LobDescriptor {
    #[must_use]
    pub fn to_bytes(&self) -> [u8; DESCRIPTOR_SIZE] {
        let mut out = [0u8; DESCRIPTOR_SIZE];
        out[..8].copy_from_slice(&self.offset.to_le_bytes());
        out[8..].copy_from_slice(&self.len.to_le_bytes());
        out
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, DatabaseError> {
        let raw: &[u8; DESCRIPTOR_SIZE] = data
            .get(..DESCRIPTOR_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| DatabaseError::InvalidArgument(format!("descriptor needs {DESCRIPTOR_SIZE} bytes")))?;
        let mut offset = [0u8; 8];
        let mut len = [0u8; 8];
        offset.copy_from_slice(&raw[..8]);
        len.copy_from_slice(&raw[8..]);
        Ok(Self {
            offset: u64::from_le_bytes(offset),
            len: u64::from_le_bytes(len),
        })
    }
}

struct LobInner {
    file: File,
    size: u64,
}

/// Append-only payload file
pub struct LobFile {
    path: PathBuf,
    inner: Mutex<LobInner>,
}

impl LobFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            inner: Mutex::new(LobInner { file, size }),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LobInner>, DatabaseError> {
        self.inner.lock().map_err(|_| DatabaseError::LockPoisoned("lob file"))
    }

    /// Appends `data` and returns the offset it was written at
    pub fn append(&self, data: &[u8]) -> Result<u64, DatabaseError> {
        let mut inner = self.lock()?;
        let offset = inner.size;
        inner.file.write_all(data)?;
        inner.size += data.len() as u64;
        Ok(offset)
    }

    pub fn read(&self, offset: u64, len: usize) -> Result<Vec<u8>, DatabaseError> {
        let mut inner = self.lock()?;
        if offset + len as u64 > inner.size {
            return Err(DatabaseError::InvalidArgument(format!(
                "{len} bytes at offset {offset} are past the end of {}",
                self.path.display()
            )));
        }
        let mut buffer = vec![0u8; len];
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    pub fn size(&self) -> Result<u64, DatabaseError> {
        Ok(self.lock()?.size)
    }

    pub fn sync(&self) -> Result<(), DatabaseError> {
        let mut inner = self.lock()?;
        inner.file.flush()?;
        inner.file.sync_all()?;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn destroy(self) -> Result<(), DatabaseError> {
        let path = self.path.clone();
        drop(self);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
