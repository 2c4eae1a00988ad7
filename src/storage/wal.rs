use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::core::{DatabaseError, Rid};

/// Record-level operations replayed by recovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Insert { table_id: i32, rid: Rid, data: Vec<u8> },
    Delete { table_id: i32, rid: Rid },
}

impl Operation {
    #[must_use]
    pub const fn table_id(&self) -> i32 {
        match self {
            Self::Insert { table_id, .. } | Self::Delete { table_id, .. } => *table_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log sequence number
    pub sequence: u64,
    /// Seconds since the epoch when the entry was appended
    pub timestamp: i64,
    pub operation: Operation,
}

impl LogEntry {
    #[must_use]
    pub fn new(sequence: u64, operation: Operation) -> Self {
        Self {
            sequence,
            timestamp: chrono::Utc::now().timestamp(),
            operation,
        }
    }
}

/// Write-ahead log of record operations.
///
/// Entries are length-prefixed `bincode` frames. A file is rotated once it
/// grows past `max_size`; file names carry the first sequence they hold so
/// they sort in log order.
pub struct RecordLog {
    wal_dir: PathBuf,
    current_sequence: u64,
    current_file: Option<File>,
    max_size: u64,
}

impl RecordLog {
    pub fn open<P: AsRef<Path>>(data_dir: P, max_size: u64) -> Result<Self, DatabaseError> {
        let wal_dir = data_dir.as_ref().join("wal");
        fs::create_dir_all(&wal_dir)?;

        let mut log = Self {
            wal_dir,
            current_sequence: 0,
            current_file: None,
            max_size,
        };
        log.recover_sequence()?;
        log.rotate()?;
        Ok(log)
    }

    #[must_use]
    pub const fn current_sequence(&self) -> u64 {
        self.current_sequence
    }

    fn wal_files(&self) -> Result<Vec<PathBuf>, DatabaseError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.wal_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("wal") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn recover_sequence(&mut self) -> Result<(), DatabaseError> {
        let mut max_sequence = 0;
        for path in self.wal_files()? {
            for entry in Self::read_wal_file(&path)? {
                max_sequence = max_sequence.max(entry.sequence);
            }
        }
        self.current_sequence = max_sequence;
        Ok(())
    }

    fn rotate(&mut self) -> Result<(), DatabaseError> {
        if let Some(mut file) = self.current_file.take() {
            file.flush()?;
        }

        let wal_path = self.wal_dir.join(format!("{:016x}.wal", self.current_sequence + 1));
        let file = OpenOptions::new().create(true).append(true).open(&wal_path)?;
        tracing::debug!(path = %wal_path.display(), "opened wal file");
        self.current_file = Some(file);
        Ok(())
    }

    /// Appends an operation and returns its sequence number
    pub fn append(&mut self, operation: Operation) -> Result<u64, DatabaseError> {
        let entry = LogEntry::new(self.current_sequence + 1, operation);
        let encoded = bincode::serialize(&entry).map_err(|e| DatabaseError::BinarySerialization(e.to_string()))?;

        let Some(file) = self.current_file.as_mut() else {
            return Err(DatabaseError::Io(std::io::Error::other("wal file is not open")));
        };
        let len = u32::try_from(encoded.len()).map_err(|_| DatabaseError::RecordTooLarge(encoded.len()))?;
        file.write_all(&len.to_le_bytes())?;
        file.write_all(&encoded)?;
        file.flush()?;
        self.current_sequence = entry.sequence;

        if file.metadata()?.len() >= self.max_size {
            self.rotate()?;
        }
        Ok(self.current_sequence)
    }

    /// Reads one file; a torn frame at the tail ends the file, a frame that
    /// fails to decode is skipped
    fn read_wal_file(path: &Path) -> Result<Vec<LogEntry>, DatabaseError> {
        let mut file = File::open(path)?;
        let mut entries = Vec::new();

        loop {
            let mut len_bytes = [0u8; 4];
            match file.read_exact(&mut len_bytes) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_bytes) as usize;
            let mut data = vec![0u8; len];
            match file.read_exact(&mut data) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    tracing::warn!(path = %path.display(), "truncated wal frame at end of file");
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            match bincode::deserialize::<LogEntry>(&data) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable wal frame"),
            }
        }

        Ok(entries)
    }

    /// Every entry in sequence order
    pub fn read_all(&self) -> Result<Vec<LogEntry>, DatabaseError> {
        let mut entries = Vec::new();
        for path in self.wal_files()? {
            entries.extend(Self::read_wal_file(&path)?);
        }
        entries.sort_by_key(|e| e.sequence);
        Ok(entries)
    }

    /// Removes old files, keeping the newest `keep_count`
    pub fn cleanup_old_logs(&self, keep_count: usize) -> Result<(), DatabaseError> {
        let files = self.wal_files()?;
        if files.len() > keep_count {
            for path in files.iter().take(files.len() - keep_count) {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn insert(rid: Rid) -> Operation {
        Operation::Insert {
            table_id: 1,
            rid,
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_append_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let mut wal = RecordLog::open(temp_dir.path(), 1024 * 1024).unwrap();

        assert_eq!(wal.append(insert(Rid::new(0, 0))).unwrap(), 1);
        assert_eq!(wal.append(Operation::Delete { table_id: 1, rid: Rid::new(0, 0) }).unwrap(), 2);

        let logs = wal.read_all().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].operation, insert(Rid::new(0, 0)));
        assert_eq!(logs[1].operation.table_id(), 1);
    }

    #[test]
    fn test_reopen_continues_sequence() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut wal = RecordLog::open(temp_dir.path(), 1024 * 1024).unwrap();
            wal.append(insert(Rid::new(0, 0))).unwrap();
            wal.append(insert(Rid::new(0, 1))).unwrap();
        }

        let mut wal = RecordLog::open(temp_dir.path(), 1024 * 1024).unwrap();
        assert_eq!(wal.current_sequence(), 2);
        assert_eq!(wal.append(insert(Rid::new(0, 2))).unwrap(), 3);
        let sequences: Vec<_> = wal.read_all().unwrap().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn test_rotation_and_cleanup() {
        let temp_dir = TempDir::new().unwrap();
        let mut wal = RecordLog::open(temp_dir.path(), 32).unwrap();
        for slot in 0..5 {
            wal.append(insert(Rid::new(0, slot))).unwrap();
        }
        assert_eq!(wal.read_all().unwrap().len(), 5);
        assert!(wal.wal_files().unwrap().len() > 2);

        wal.cleanup_old_logs(2).unwrap();
        assert_eq!(wal.wal_files().unwrap().len(), 2);
    }

    #[test]
    fn test_torn_tail_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let mut wal = RecordLog::open(temp_dir.path(), 1024 * 1024).unwrap();
        wal.append(insert(Rid::new(0, 0))).unwrap();

        let path = wal.wal_files().unwrap().remove(0);
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(&100u32.to_le_bytes()).unwrap();
        file.write_all(&[0u8; 10]).unwrap();

        assert_eq!(wal.read_all().unwrap().len(), 1);
    }
}
