use std::collections::HashSet;
use std::fs;

use super::codec::{FieldView, RecordCodec};
use super::scanner::{ChunkScanner, RecordScanner};
use crate::config::StorageConfig;
use crate::core::{
    AttrInfo, AttrType, DatabaseError, IndexMeta, Record, Rid, StorageFormat, TableMeta, Value, VectorIndexMeta,
};
use crate::index::{BTreeIndex, DistanceType, Index, IvfFlatIndex, OnMissing, VectorIndex};
use crate::storage::{LobDescriptor, LobFile, RecordFileHandler, RecordStore, RecordVisitor};

/// A table: schema, record file, payload files and every index on it.
///
/// Keeps scalar and vector indexes consistent with the stored records.
/// Mutations are not atomic: a failure part-way through is returned to the
/// caller, who owns compensation.
pub struct Table {
    config: StorageConfig,
    meta: TableMeta,
    store: Box<dyn RecordStore>,
    text_file: LobFile,
    vector_file: LobFile,
    indexes: Vec<Box<dyn Index>>,
    vector_indexes: Vec<Box<dyn VectorIndex>>,
}

impl Table {
    /// Creates the meta file and empty data files of a new table
    pub fn create(
        config: &StorageConfig,
        table_id: i32,
        name: &str,
        attributes: &[AttrInfo],
        storage_format: StorageFormat,
    ) -> Result<Self, DatabaseError> {
        let meta_path = config.meta_path(name);
        if meta_path.exists() {
            return Err(DatabaseError::TableAlreadyExists(name.to_string()));
        }

        let meta = TableMeta::new(table_id, name, attributes, storage_format)?;
        fs::create_dir_all(&config.data_dir)?;
        meta.save(&meta_path)?;

        let table = Self::init(config, meta)?;
        tracing::info!(
            table = name,
            table_id,
            fields = table.meta.field_num(),
            record_size = table.meta.record_size(),
            "created table"
        );
        Ok(table)
    }

    /// Opens an existing table and rebuilds its indexes from the records
    pub fn open(config: &StorageConfig, name: &str) -> Result<Self, DatabaseError> {
        let meta = TableMeta::load(&config.meta_path(name))?;
        let mut table = Self::init(config, meta)?;

        let records = table.store.scan()?;
        for index_meta in table.meta.indexes.clone() {
            let index = table.build_index(&index_meta, &records)?;
            table.indexes.push(index);
        }
        for vector_meta in table.meta.vector_indexes.clone() {
            let index = table.build_vector_index(&vector_meta, &records)?;
            table.vector_indexes.push(index);
        }

        tracing::info!(
            table = name,
            records = records.len(),
            indexes = table.indexes.len(),
            vector_indexes = table.vector_indexes.len(),
            "opened table"
        );
        Ok(table)
    }

    fn init(config: &StorageConfig, meta: TableMeta) -> Result<Self, DatabaseError> {
        let store = RecordFileHandler::open(
            config.data_path(&meta.name),
            meta.table_id as u32,
            config.buffer_pool_pages,
        )?;
        Ok(Self {
            text_file: LobFile::open(config.text_path(&meta.name))?,
            vector_file: LobFile::open(config.vector_path(&meta.name))?,
            config: config.clone(),
            meta,
            store: Box::new(store),
            indexes: Vec::new(),
            vector_indexes: Vec::new(),
        })
    }

    /// Removes the meta file and every data file of the table
    pub fn destroy(self) -> Result<(), DatabaseError> {
        let Self {
            config,
            meta,
            store,
            text_file,
            vector_file,
            ..
        } = self;
        store.destroy()?;

        text_file.destroy()?;
        vector_file.destroy()?;
        let data_path = config.data_path(&meta.name);
        if data_path.exists() {
            fs::remove_dir_all(&data_path)?;
        }
        let meta_path = config.meta_path(&meta.name);
        if meta_path.exists() {
            fs::remove_file(&meta_path)?;
        }
        tracing::info!(table = %meta.name, "dropped table");
        Ok(())
    }

    #[must_use]
    pub const fn table_id(&self) -> i32 {
        self.meta.table_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    #[must_use]
    pub const fn table_meta(&self) -> &TableMeta {
        &self.meta
    }

    fn codec(&self) -> RecordCodec<'_> {
        RecordCodec::new(&self.meta, &self.text_file, &self.vector_file)
    }

    // ----- records -----

    /// Encodes one value per field into a record that is not stored yet
    pub fn make_record(&self, values: &[Value]) -> Result<Record, DatabaseError> {
        Ok(Record::from_data(self.codec().encode(values)?))
    }

    /// Writes the record and adds it to every index; sets `record.rid`
    pub fn insert_record(&mut self, record: &mut Record) -> Result<(), DatabaseError> {
        self.check_record_size(record)?;
        record.rid = self.store.insert_record(&record.data)?;
        tracing::debug!(table = %self.meta.name, rid = %record.rid, "inserted record");
        self.insert_entry_of_indexes(&record.data, record.rid)
    }

    /// Removes the record from every index, then from the record file
    pub fn delete_record(&mut self, record: &Record) -> Result<(), DatabaseError> {
        self.delete_entry_of_indexes(&record.data, record.rid, OnMissing::Error)?;
        self.store.delete_record(record.rid)?;
        tracing::debug!(table = %self.meta.name, rid = %record.rid, "deleted record");
        Ok(())
    }

    pub fn delete_record_by_rid(&mut self, rid: Rid) -> Result<(), DatabaseError> {
        let record = self.store.get_record(rid)?;
        self.delete_record(&record)
    }

    pub fn get_record(&self, rid: Rid) -> Result<Record, DatabaseError> {
        self.store.get_record(rid)
    }

    /// Runs `visitor` on the record while its page is held. The visitor
    /// returns true when it changed the bytes and they must be written back.
    pub fn visit_record(&self, rid: Rid, visitor: &mut RecordVisitor<'_>) -> Result<(), DatabaseError> {
        self.store.visit_record(rid, visitor)
    }

    /// Moves index entries from `old_record` to `new_record` for the indexes
    /// that cover an affected field whose bytes changed
    pub fn update_index(
        &mut self,
        old_record: &Record,
        new_record: &Record,
        affected_fields: &[&str],
    ) -> Result<(), DatabaseError> {
        for name in affected_fields {
            self.meta.require_field(name)?;
        }
        let affected: HashSet<&str> = affected_fields.iter().copied().collect();

        for index in &mut self.indexes {
            let fields = index.field_names();
            if !fields.iter().any(|f| affected.contains(f.as_str())) {
                continue;
            }
            let old_key = index_key(&self.meta, fields, &old_record.data)?;
            let new_key = index_key(&self.meta, fields, &new_record.data)?;
            if old_key == new_key && old_record.rid == new_record.rid {
                continue;
            }
            index.delete_entry(&old_key, old_record.rid, OnMissing::Error)?;
            index.insert_entry(&new_key, new_record.rid)?;
            tracing::debug!(index = index.name(), rid = %new_record.rid, "moved index entry");
        }

        let codec = RecordCodec::new(&self.meta, &self.text_file, &self.vector_file);
        for index in &mut self.vector_indexes {
            if !affected.contains(index.field_name()) {
                continue;
            }
            let field = self.meta.require_field(index.field_name())?;
            let old_slot = FieldView::new(field, &old_record.data)?.slot();
            let new_slot = FieldView::new(field, &new_record.data)?.slot();
            if old_slot == new_slot && old_record.rid == new_record.rid {
                continue;
            }
            if let Some(old) = codec.decode_field(old_record, field)?.vector() {
                index.delete(old, old_record.rid, OnMissing::Error)?;
            }
            if let Some(new) = codec.decode_field(new_record, field)?.vector() {
                index.insert(new, new_record.rid)?;
            }
        }
        Ok(())
    }

    /// Replays a logged insert. A record already at its RID is kept; index
    /// entries are rewritten either way. Returns whether the record file
    /// was written.
    pub fn recover_insert_record(&mut self, record: &Record) -> Result<bool, DatabaseError> {
        self.check_record_size(record)?;
        let written = match self.store.recover_insert_record(record.rid, &record.data) {
            Ok(()) => true,
            Err(DatabaseError::RecordExists(rid)) => {
                tracing::debug!(table = %self.meta.name, %rid, "record already present during recovery");
                false
            }
            Err(e) => return Err(e),
        };

        let stored = self.store.get_record(record.rid)?;
        self.delete_entry_of_indexes(&stored.data, stored.rid, OnMissing::Ignore)?;
        self.insert_entry_of_indexes(&stored.data, stored.rid)?;
        Ok(written)
    }

    /// Replays a logged delete; a missing record or index entry is tolerated.
    /// Returns whether a record was removed.
    pub fn recover_delete_record(&mut self, rid: Rid) -> Result<bool, DatabaseError> {
        let record = match self.store.get_record(rid) {
            Ok(record) => record,
            Err(DatabaseError::RecordNotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        self.delete_entry_of_indexes(&record.data, rid, OnMissing::Ignore)?;
        self.store.delete_record(rid)?;
        Ok(true)
    }

    fn check_record_size(&self, record: &Record) -> Result<(), DatabaseError> {
        if record.len() == self.meta.record_size() {
            Ok(())
        } else {
            Err(DatabaseError::InvalidArgument(format!(
                "record of {} bytes does not match table '{}' ({} bytes)",
                record.len(),
                self.meta.name,
                self.meta.record_size()
            )))
        }
    }

    /// Scalar indexes in declaration order, then vector indexes
    fn insert_entry_of_indexes(&mut self, data: &[u8], rid: Rid) -> Result<(), DatabaseError> {
        for index in &mut self.indexes {
            let key = index_key(&self.meta, index.field_names(), data)?;
            index.insert_entry(&key, rid)?;
        }

        let codec = RecordCodec::new(&self.meta, &self.text_file, &self.vector_file);
        let record = Record::new(rid, data.to_vec());
        for index in &mut self.vector_indexes {
            let field = self.meta.require_field(index.field_name())?;
            if let Some(vector) = codec.decode_field(&record, field)?.vector() {
                index.insert(vector, rid)?;
            }
        }
        Ok(())
    }

    fn delete_entry_of_indexes(&mut self, data: &[u8], rid: Rid, on_missing: OnMissing) -> Result<(), DatabaseError> {
        for index in &mut self.indexes {
            let key = index_key(&self.meta, index.field_names(), data)?;
            index.delete_entry(&key, rid, on_missing)?;
        }

        let codec = RecordCodec::new(&self.meta, &self.text_file, &self.vector_file);
        let record = Record::new(rid, data.to_vec());
        for index in &mut self.vector_indexes {
            let field = self.meta.require_field(index.field_name())?;
            if let Some(vector) = codec.decode_field(&record, field)?.vector() {
                index.delete(vector, rid, on_missing)?;
            }
        }
        Ok(())
    }

    // ----- decoding -----

    /// Decoded values of every field, tagged with the record's RID
    pub fn record_values(&self, record: &Record) -> Result<Vec<Value>, DatabaseError> {
        self.codec().decode(record)
    }

    pub fn field_value(&self, record: &Record, field_name: &str) -> Result<Value, DatabaseError> {
        let field = self.meta.require_field(field_name)?;
        self.codec().decode_field(record, field)
    }

    pub fn load_text(&self, desc: LobDescriptor) -> Result<Vec<u8>, DatabaseError> {
        self.codec().load_text(desc)
    }

    pub fn dump_text(&self, bytes: &[u8]) -> Result<LobDescriptor, DatabaseError> {
        self.codec().dump_text(bytes)
    }

    pub fn load_vector(&self, desc: LobDescriptor) -> Result<Vec<f32>, DatabaseError> {
        self.codec().load_vector(desc)
    }

    pub fn dump_vector(&self, vector: &[f32]) -> Result<LobDescriptor, DatabaseError> {
        self.codec().dump_vector(vector)
    }

    /// Writes a replacement for the vector behind `old`, which must have the
    /// same dimension. The payload file is append-only, so the new
    /// descriptor has to be stored in the record by the caller.
    pub fn update_vector(&self, old: LobDescriptor, vector: &[f32]) -> Result<LobDescriptor, DatabaseError> {
        if old.len != vector.len() as u64 {
            return Err(DatabaseError::VectorDimensionMismatch {
                expected: old.len as usize,
                actual: vector.len(),
            });
        }
        self.dump_vector(vector)
    }

    // ----- indexes -----

    /// Creates a scalar index and fills it from the current records
    pub fn create_index(&mut self, field_names: &[&str], index_name: &str, unique: bool) -> Result<(), DatabaseError> {
        let index_meta = IndexMeta {
            name: index_name.to_string(),
            fields: field_names.iter().map(ToString::to_string).collect(),
            unique,
        };
        let mut meta = self.meta.clone();
        meta.add_index(index_meta.clone())?;

        let records = self.store.scan()?;
        let index = self.build_index(&index_meta, &records)?;

        meta.save(&self.config.meta_path(&meta.name))?;
        self.meta = meta;
        self.indexes.push(index);
        tracing::info!(table = %self.meta.name, index = index_name, fields = ?field_names, unique, "created index");
        Ok(())
    }

    /// Creates a vector index over a VECTOR field; `lists` and `probes`
    /// default to the storage config
    pub fn create_vector_index(
        &mut self,
        field_name: &str,
        index_name: &str,
        distance: DistanceType,
        lists: Option<usize>,
        probes: Option<usize>,
    ) -> Result<(), DatabaseError> {
        let vector_meta = VectorIndexMeta {
            name: index_name.to_string(),
            field: field_name.to_string(),
            distance,
            lists: lists.unwrap_or(self.config.vector_lists),
            probes: probes.unwrap_or(self.config.vector_probes),
        };
        let mut meta = self.meta.clone();
        meta.add_vector_index(vector_meta.clone())?;

        let records = self.store.scan()?;
        let index = self.build_vector_index(&vector_meta, &records)?;

        meta.save(&self.config.meta_path(&meta.name))?;
        self.meta = meta;
        self.vector_indexes.push(index);
        tracing::info!(
            table = %self.meta.name,
            index = index_name,
            field = field_name,
            %distance,
            "created vector index"
        );
        Ok(())
    }

    fn build_index(&self, index_meta: &IndexMeta, records: &[Record]) -> Result<Box<dyn Index>, DatabaseError> {
        let fields = index_meta
            .fields
            .iter()
            .map(|name| self.meta.require_field(name).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        let mut index = BTreeIndex::new(index_meta, fields)?;
        for record in records {
            let key = index_key(&self.meta, index.field_names(), &record.data)?;
            index.insert_entry(&key, record.rid)?;
        }
        Ok(Box::new(index))
    }

    fn build_vector_index(
        &self,
        vector_meta: &VectorIndexMeta,
        records: &[Record],
    ) -> Result<Box<dyn VectorIndex>, DatabaseError> {
        let field = self.meta.require_field(&vector_meta.field)?;
        if field.attr_type != AttrType::Vectors {
            return Err(DatabaseError::SchemaFieldTypeMismatch {
                field: field.name.clone(),
                expected: AttrType::Vectors,
                detail: format!("vector index on {} field", field.attr_type),
            });
        }

        let mut index = IvfFlatIndex::new(vector_meta, field.declared_len)?;
        let codec = self.codec();
        for record in records {
            if let Some(vector) = codec.decode_field(record, field)?.vector() {
                index.insert(vector, record.rid)?;
            }
        }
        index.rebuild()?;
        Ok(Box::new(index))
    }

    #[must_use]
    pub fn find_index(&self, index_name: &str) -> Option<&dyn Index> {
        self.indexes.iter().find(|i| i.name() == index_name).map(AsRef::as_ref)
    }

    /// Index whose field set is exactly `field_names`, in any order
    #[must_use]
    pub fn find_index_by_fields(&self, field_names: &[&str]) -> Option<&dyn Index> {
        let wanted: HashSet<&str> = field_names.iter().copied().collect();
        self.indexes
            .iter()
            .find(|i| {
                let fields = i.field_names();
                fields.len() == field_names.len() && fields.iter().all(|f| wanted.contains(f.as_str()))
            })
            .map(AsRef::as_ref)
    }

    #[must_use]
    pub fn find_vector_index(&self, index_name: &str) -> Option<&dyn VectorIndex> {
        self.vector_indexes
            .iter()
            .find(|i| i.name() == index_name)
            .map(AsRef::as_ref)
    }

    #[must_use]
    pub fn find_vector_index_by_field(&self, field_name: &str) -> Option<&dyn VectorIndex> {
        self.vector_indexes
            .iter()
            .find(|i| i.field_name() == field_name)
            .map(AsRef::as_ref)
    }

    /// Re-clusters every vector index
    pub fn rebuild_vector_indexes(&mut self) -> Result<(), DatabaseError> {
        for index in &mut self.vector_indexes {
            index.rebuild()?;
        }
        Ok(())
    }

    // ----- scans -----

    pub fn get_record_scanner(&self) -> Result<RecordScanner, DatabaseError> {
        Ok(RecordScanner::new(self.store.scan()?))
    }

    pub fn get_chunk_scanner(&self, chunk_size: usize) -> Result<ChunkScanner<'_>, DatabaseError> {
        ChunkScanner::new(self.codec(), self.meta.field_num(), self.store.scan()?, chunk_size)
    }

    /// Flushes dirty pages, payload files and the meta file
    pub fn sync(&mut self) -> Result<(), DatabaseError> {
        self.store.sync()?;
        self.text_file.sync()?;
        self.vector_file.sync()?;
        self.meta.save(&self.config.meta_path(&self.meta.name))?;
        tracing::debug!(table = %self.meta.name, "synced table");
        Ok(())
    }
}

/// Concatenated slots of the indexed fields, in index field order
fn index_key(meta: &TableMeta, field_names: &[String], data: &[u8]) -> Result<Vec<u8>, DatabaseError> {
    let mut key = Vec::new();
    for name in field_names {
        let field = meta.require_field(name)?;
        key.extend_from_slice(FieldView::new(field, data)?.slot());
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::scanner::Chunk;
    use tempfile::TempDir;

    fn table_t(dir: &TempDir) -> (StorageConfig, Table) {
        let config = StorageConfig::with_data_dir(dir.path());
        let table = Table::create(
            &config,
            1,
            "t",
            &[
                AttrInfo::new("a", AttrType::Ints, 0, false),
                AttrInfo::new("b", AttrType::Chars, 4, false),
            ],
            StorageFormat::Row,
        )
        .unwrap();
        (config, table)
    }

    fn insert(table: &mut Table, a: i32, b: &str) -> Record {
        let mut record = table.make_record(&[Value::from(a), Value::from(b)]).unwrap();
        table.insert_record(&mut record).unwrap();
        record
    }

    #[test]
    fn test_insert_and_get() {
        let dir = TempDir::new().unwrap();
        let (_, mut table) = table_t(&dir);

        let record = insert(&mut table, 1, "ab");
        let stored = table.get_record(record.rid).unwrap();
        assert_eq!(table.field_value(&stored, "b").unwrap().get_string(), "ab");
        assert_eq!(table.table_meta().require_field("b").unwrap().data_len(), 5);
    }

    #[test]
    fn test_create_twice() {
        let dir = TempDir::new().unwrap();
        let (config, _table) = table_t(&dir);
        let err = Table::create(
            &config,
            2,
            "t",
            &[AttrInfo::new("x", AttrType::Ints, 0, false)],
            StorageFormat::Row,
        )
        .err()
        .unwrap();
        assert_eq!(err.code(), "SCHEMA_TABLE_EXIST");
    }

    #[test]
    fn test_index_follows_insert_and_delete() {
        let dir = TempDir::new().unwrap();
        let (_, mut table) = table_t(&dir);
        table.create_index(&["a"], "idx_a", false).unwrap();

        let r1 = insert(&mut table, 1, "x");
        let r2 = insert(&mut table, 2, "y");
        let index = table.find_index("idx_a").unwrap();
        assert_eq!(index.lookup(&[Value::from(2)]).unwrap(), vec![r2.rid]);

        table.delete_record_by_rid(r2.rid).unwrap();
        let index = table.find_index("idx_a").unwrap();
        assert!(index.lookup(&[Value::from(2)]).unwrap().is_empty());
        assert_eq!(index.entry_count(), 1);
        assert_eq!(table.get_record(r2.rid).unwrap_err().code(), "RECORD_NOT_EXIST");
        assert!(table.get_record(r1.rid).is_ok());
    }

    #[test]
    fn test_unique_index_reports_after_store_write() {
        let dir = TempDir::new().unwrap();
        let (_, mut table) = table_t(&dir);
        table.create_index(&["a"], "uniq_a", true).unwrap();
        insert(&mut table, 1, "x");

        let mut dup = table.make_record(&[Value::from(1), Value::from("y")]).unwrap();
        let err = table.insert_record(&mut dup).unwrap_err();
        assert_eq!(err.code(), "RECORD_DUPLICATE_KEY");
        // the record write is not rolled back
        assert_eq!(table.get_record_scanner().unwrap().count(), 2);
    }

    #[test]
    fn test_create_index_over_existing_rows() {
        let dir = TempDir::new().unwrap();
        let (_, mut table) = table_t(&dir);
        insert(&mut table, 5, "e");
        insert(&mut table, 5, "f");

        let err = table.create_index(&["a"], "uniq_a", true).unwrap_err();
        assert_eq!(err.code(), "RECORD_DUPLICATE_KEY");
        assert!(table.find_index("uniq_a").is_none());
        assert!(table.table_meta().index("uniq_a").is_none());

        table.create_index(&["b", "a"], "idx_ba", false).unwrap();
        assert!(table.find_index_by_fields(&["a", "b"]).is_some());
        assert!(table.find_index_by_fields(&["a"]).is_none());
        let err = table.create_index(&["a"], "idx_ba", false).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_INDEX_NAME_REPEAT");
        let err = table.create_index(&["zz"], "idx_zz", false).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_FIELD_NOT_EXIST");
    }

    #[test]
    fn test_update_index_only_touches_changed_fields() {
        let dir = TempDir::new().unwrap();
        let (_, mut table) = table_t(&dir);
        table.create_index(&["a"], "idx_a", false).unwrap();
        table.create_index(&["b"], "idx_b", false).unwrap();
        let old = insert(&mut table, 1, "old");

        let mut new = table.make_record(&[Value::from(1), Value::from("new")]).unwrap();
        new.rid = old.rid;
        let bytes = new.data.clone();
        table
            .visit_record(old.rid, &mut |record: &mut Record| -> Result<bool, DatabaseError> {
                record.data.copy_from_slice(&bytes);
                Ok(true)
            })
            .unwrap();
        table.update_index(&old, &new, &["a", "b"]).unwrap();

        let idx_b = table.find_index("idx_b").unwrap();
        assert!(idx_b.lookup(&[Value::from("old")]).unwrap().is_empty());
        assert_eq!(idx_b.lookup(&[Value::from("new")]).unwrap(), vec![old.rid]);
        let idx_a = table.find_index("idx_a").unwrap();
        assert_eq!(idx_a.lookup(&[Value::from(1)]).unwrap(), vec![old.rid]);

        let stored = table.get_record(old.rid).unwrap();
        assert_eq!(table.field_value(&stored, "b").unwrap().get_string(), "new");
        assert!(table.update_index(&old, &new, &["nope"]).is_err());
    }

    #[test]
    fn test_update_index_moves_vector_entries() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig::with_data_dir(dir.path());
        let mut table = Table::create(
            &config,
            2,
            "points",
            &[
                AttrInfo::new("id", AttrType::Ints, 0, false),
                AttrInfo::new("v", AttrType::Vectors, 2, true),
            ],
            StorageFormat::Row,
        )
        .unwrap();
        table
            .create_vector_index("v", "idx_v", DistanceType::L2, Some(1), Some(1))
            .unwrap();

        let mut old = table.make_record(&[Value::from(1), Value::from(vec![1.0f32, 1.0])]).unwrap();
        table.insert_record(&mut old).unwrap();
        let count = |table: &Table| table.find_vector_index("idx_v").unwrap().entry_count();
        assert_eq!(count(&table), 1);

        let mut moved = table.make_record(&[Value::from(1), Value::from(vec![4.0f32, 4.0])]).unwrap();
        moved.rid = old.rid;
        table.update_index(&old, &moved, &["v"]).unwrap();
        assert_eq!(count(&table), 1);
        let nearest = table.find_vector_index("idx_v").unwrap().search(&[4.0, 4.0], 1).unwrap();
        assert_eq!(nearest, vec![(old.rid, 0.0)]);

        let mut cleared = table.make_record(&[Value::from(1), Value::null()]).unwrap();
        cleared.rid = old.rid;
        table.update_index(&moved, &cleared, &["v"]).unwrap();
        assert_eq!(count(&table), 0);
        // the old vector is gone, so moving it again finds nothing to delete
        assert_eq!(
            table.update_index(&moved, &old, &["v"]).unwrap_err().code(),
            "RECORD_NOT_EXIST"
        );

        let bytes = cleared.data.clone();
        table
            .visit_record(old.rid, &mut |record: &mut Record| -> Result<bool, DatabaseError> {
                record.data.copy_from_slice(&bytes);
                Ok(true)
            })
            .unwrap();
        table.delete_record_by_rid(old.rid).unwrap();
        assert_eq!(count(&table), 0);
    }

    #[test]
    fn test_visit_record_error_leaves_record() {
        let dir = TempDir::new().unwrap();
        let (_, mut table) = table_t(&dir);
        let record = insert(&mut table, 9, "z");

        let err = table
            .visit_record(record.rid, &mut |r: &mut Record| -> Result<bool, DatabaseError> {
                r.data[0] = 0xFF;
                Err(DatabaseError::InvalidArgument("stop".to_string()))
            })
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert_eq!(table.get_record(record.rid).unwrap(), record);
        // the page is free again
        table
            .visit_record(record.rid, &mut |_: &mut Record| -> Result<bool, DatabaseError> { Ok(false) })
            .unwrap();
    }

    #[test]
    fn test_visitor_reads_other_pages() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig::with_data_dir(dir.path());
        let mut table = Table::create(
            &config,
            3,
            "wide",
            &[
                AttrInfo::new("id", AttrType::Ints, 0, false),
                AttrInfo::new("pad", AttrType::Chars, 5000, false),
            ],
            StorageFormat::Row,
        )
        .unwrap();
        let mut rows = Vec::new();
        for id in 0..2 {
            let mut record = table.make_record(&[Value::from(id), Value::from("x")]).unwrap();
            table.insert_record(&mut record).unwrap();
            rows.push(record);
        }
        assert_ne!(rows[0].rid.page_num, rows[1].rid.page_num);

        let mut seen = None;
        table
            .visit_record(rows[0].rid, &mut |_: &mut Record| -> Result<bool, DatabaseError> {
                let other = table.get_record(rows[1].rid)?;
                seen = Some(table.field_value(&other, "id")?.get_int());
                table.visit_record(rows[1].rid, &mut |_: &mut Record| -> Result<bool, DatabaseError> {
                    Ok(false)
                })?;
                Ok(false)
            })
            .unwrap();
        assert_eq!(seen, Some(1));

        // re-entering the held page fails instead of blocking
        let err = table
            .visit_record(rows[0].rid, &mut |_: &mut Record| -> Result<bool, DatabaseError> {
                table.visit_record(rows[0].rid, &mut |_: &mut Record| -> Result<bool, DatabaseError> {
                    Ok(false)
                })?;
                Ok(false)
            })
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_recover_insert_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let (_, mut table) = table_t(&dir);
        table.create_index(&["a"], "uniq_a", true).unwrap();

        let mut record = table.make_record(&[Value::from(3), Value::from("c")]).unwrap();
        record.rid = Rid::new(2, 4);
        assert!(table.recover_insert_record(&record).unwrap());
        assert!(!table.recover_insert_record(&record).unwrap());

        let index = table.find_index("uniq_a").unwrap();
        assert_eq!(index.lookup(&[Value::from(3)]).unwrap(), vec![Rid::new(2, 4)]);
        assert_eq!(index.entry_count(), 1);

        assert!(table.recover_delete_record(record.rid).unwrap());
        assert!(!table.recover_delete_record(record.rid).unwrap());
        assert_eq!(table.find_index("uniq_a").unwrap().entry_count(), 0);
    }

    #[test]
    fn test_reopen_rebuilds_indexes() {
        let dir = TempDir::new().unwrap();
        let (config, mut table) = table_t(&dir);
        table.create_index(&["a"], "idx_a", false).unwrap();
        let r = insert(&mut table, 42, "q");
        table.sync().unwrap();
        drop(table);

        let table = Table::open(&config, "t").unwrap();
        assert_eq!(table.table_id(), 1);
        let index = table.find_index("idx_a").unwrap();
        assert_eq!(index.lookup(&[Value::from(42)]).unwrap(), vec![r.rid]);
    }

    #[test]
    fn test_chunk_scanner() {
        let dir = TempDir::new().unwrap();
        let (_, mut table) = table_t(&dir);
        for i in 0..5 {
            insert(&mut table, i, "r");
        }

        let chunks: Vec<_> = table
            .get_chunk_scanner(2)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(chunks.iter().map(Chunk::len).collect::<Vec<_>>(), vec![2, 2, 1]);
        assert_eq!(chunks[1].column(0).unwrap()[0], Value::from(2));
        assert_eq!(chunks[2].row(0).unwrap()[1].get_string(), "r");
        assert!(table.get_chunk_scanner(0).is_err());
    }

    #[test]
    fn test_scanner_is_a_snapshot() {
        let dir = TempDir::new().unwrap();
        let (_, mut table) = table_t(&dir);
        let r = insert(&mut table, 1, "a");
        insert(&mut table, 2, "b");

        let scanner = table.get_record_scanner().unwrap();
        table.delete_record(&r).unwrap();
        assert_eq!(scanner.remaining(), 2);
        assert_eq!(table.get_record_scanner().unwrap().count(), 1);
    }

    #[test]
    fn test_destroy_removes_files() {
        let dir = TempDir::new().unwrap();
        let (config, mut table) = table_t(&dir);
        insert(&mut table, 1, "a");
        table.sync().unwrap();
        table.destroy().unwrap();

        assert!(!config.meta_path("t").exists());
        assert!(!config.data_path("t").exists());
        assert!(!config.text_path("t").exists());
        assert!(Table::open(&config, "t").is_err());
    }
}
