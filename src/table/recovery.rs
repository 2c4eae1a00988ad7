//! Replays the record log into a table after a crash.
//!
//! Every replayed operation is idempotent, so a log can be replayed over a
//! table that already holds some or all of its effects.

use super::table::Table;
use crate::core::{DatabaseError, Record};
use crate::storage::{LogEntry, Operation};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Inserts written to the record file
    pub inserted: usize,
    /// Inserts and deletes that were already reflected in the table
    pub skipped: usize,
    pub deleted: usize,
}

/// Applies the entries that belong to `table`, in sequence order
pub fn recover_table(table: &mut Table, entries: &[LogEntry]) -> Result<RecoveryStats, DatabaseError> {
    let mut ordered: Vec<&LogEntry> = entries
        .iter()
        .filter(|e| e.operation.table_id() == table.table_id())
        .collect();
    ordered.sort_by_key(|e| e.sequence);

    let mut stats = RecoveryStats::default();
    for entry in ordered {
        match &entry.operation {
            Operation::Insert { rid, data, .. } => {
                let record = Record::new(*rid, data.clone());
                if table.recover_insert_record(&record)? {
                    stats.inserted += 1;
                } else {
                    stats.skipped += 1;
                }
            }
            Operation::Delete { rid, .. } => {
                if table.recover_delete_record(*rid)? {
                    stats.deleted += 1;
                } else {
                    stats.skipped += 1;
                }
            }
        }
    }

    tracing::info!(
        table = table.name(),
        inserted = stats.inserted,
        skipped = stats.skipped,
        deleted = stats.deleted,
        "recovered table"
    );
    Ok(stats)
}
