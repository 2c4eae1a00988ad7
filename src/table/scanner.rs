//! Read views over a table.
//!
//! Both scanners take a snapshot of the live records when they are created,
//! so index maintenance running afterwards does not change what they return.

use super::codec::RecordCodec;
use crate::core::{DatabaseError, Record, Rid, Value};

/// Row-at-a-time scanner yielding raw records in RID order
#[derive(Debug)]
pub struct RecordScanner {
    records: std::vec::IntoIter<Record>,
}

impl RecordScanner {
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }

    /// Records not yet returned
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl Iterator for RecordScanner {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        self.records.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

/// A batch of decoded rows stored column by column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    pub rids: Vec<Rid>,
    /// One vector per field, in field order
    pub columns: Vec<Vec<Value>>,
}

impl Chunk {
    fn with_columns(field_num: usize, capacity: usize) -> Self {
        Self {
            rids: Vec::with_capacity(capacity),
            columns: (0..field_num).map(|_| Vec::with_capacity(capacity)).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rids.is_empty()
    }

    #[must_use]
    pub fn column(&self, field_index: usize) -> Option<&[Value]> {
        self.columns.get(field_index).map(Vec::as_slice)
    }

    /// Values of one row, cloned out of the columns
    #[must_use]
    pub fn row(&self, row_index: usize) -> Option<Vec<Value>> {
        if row_index >= self.len() {
            return None;
        }
        Some(self.columns.iter().map(|c| c[row_index].clone()).collect())
    }
}

/// Scanner decoding up to `chunk_size` records per step
pub struct ChunkScanner<'a> {
    codec: RecordCodec<'a>,
    field_num: usize,
    records: std::vec::IntoIter<Record>,
    chunk_size: usize,
}

impl<'a> ChunkScanner<'a> {
    pub fn new(
        codec: RecordCodec<'a>,
        field_num: usize,
        records: Vec<Record>,
        chunk_size: usize,
    ) -> Result<Self, DatabaseError> {
        if chunk_size == 0 {
            return Err(DatabaseError::InvalidArgument("chunk size must be positive".to_string()));
        }
        Ok(Self {
            codec,
            field_num,
            records: records.into_iter(),
            chunk_size,
        })
    }

    fn next_chunk(&mut self) -> Result<Option<Chunk>, DatabaseError> {
        let mut chunk = Chunk::with_columns(self.field_num, self.chunk_size.min(self.records.len()));
        for record in self.records.by_ref().take(self.chunk_size) {
            for (column, value) in chunk.columns.iter_mut().zip(self.codec.decode(&record)?) {
                column.push(value);
            }
            chunk.rids.push(record.rid);
        }
        Ok(if chunk.is_empty() { None } else { Some(chunk) })
    }
}

impl Iterator for ChunkScanner<'_> {
    type Item = Result<Chunk, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}
