//! Index structures kept consistent by `Table`
//!
//! Scalar indexes implement `Index` (B-tree over order-preserving keys),
//! vector-similarity indexes implement `VectorIndex` (IVF-flat).

pub mod btree;
pub mod distance;
pub mod ivf;
pub mod key;

pub use btree::BTreeIndex;
pub use distance::DistanceType;
pub use ivf::IvfFlatIndex;

use crate::core::{DatabaseError, Rid, Value};

/// What `delete_entry` does when the entry is not there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnMissing {
    /// Fail with `IndexEntryNotFound`
    Error,
    /// Treat as already deleted
    Ignore,
}

/// Scalar index over one or more fields.
///
/// `key` is the concatenation of the indexed fields' slots exactly as they
/// sit in the record, in index field order.
pub trait Index {
    fn name(&self) -> &str;

    fn field_names(&self) -> &[String];

    fn is_unique(&self) -> bool;

    fn insert_entry(&mut self, key: &[u8], rid: Rid) -> Result<(), DatabaseError>;

    fn delete_entry(&mut self, key: &[u8], rid: Rid, on_missing: OnMissing) -> Result<(), DatabaseError>;

    /// RIDs whose key equals `values` (one value per index field).
    ///
    /// Keys match on their encoded bytes, so FLOAT fields match exactly with
    /// no epsilon window. Use `scan_range` around the value for a tolerant
    /// match.
    fn lookup(&self, values: &[Value]) -> Result<Vec<Rid>, DatabaseError>;

    /// RIDs with `low <= key <= high` in key order; bounds may be key
    /// prefixes and `None` is unbounded
    fn scan_range(&self, low: Option<&[Value]>, high: Option<&[Value]>) -> Result<Vec<Rid>, DatabaseError>;

    fn entry_count(&self) -> usize;
}

/// Approximate nearest-neighbour index over one VECTOR field
pub trait VectorIndex {
    fn name(&self) -> &str;

    fn field_name(&self) -> &str;

    fn dimension(&self) -> usize;

    fn insert(&mut self, vector: &[f32], rid: Rid) -> Result<(), DatabaseError>;

    fn delete(&mut self, vector: &[f32], rid: Rid, on_missing: OnMissing) -> Result<(), DatabaseError>;

    /// Up to `k` closest entries, closest first, with their distances
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(Rid, f32)>, DatabaseError>;

    /// Re-clusters all entries
    fn rebuild(&mut self) -> Result<(), DatabaseError>;

    fn entry_count(&self) -> usize;
}
