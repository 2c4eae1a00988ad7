// relstore - typed values and table record/index maintenance for a relational storage engine

// Clippy configuration - allow non-critical warnings
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::float_cmp)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::type_complexity)]

// Values, types, schema and errors
pub mod core;

// Storage configuration (file, env, defaults)
pub mod config;

// Pages, buffer pool, record files, out-of-line payloads, WAL
pub mod storage;

// Index structures (B-tree, IVF-flat vector index)
pub mod index;

// Tables: record codec, index maintenance, scanners, recovery
pub mod table;

// Re-export commonly used types for convenience
pub use config::StorageConfig;
pub use core::{AttrInfo, AttrType, DatabaseError, Record, Rid, StorageFormat, TableMeta, Value};
pub use index::{DistanceType, Index, OnMissing, VectorIndex};
pub use storage::{LogEntry, Operation, RecordLog};
pub use table::{RecoveryStats, Table, recover_table};
