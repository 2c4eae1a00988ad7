//! B-tree index for equality and range lookups
//!
//! In-memory index built on `BTreeMap`, keyed by the order-preserving
//! encoding from `key`. Entries are rebuilt from the record file when a
//! table is opened.

use std::collections::BTreeMap;
use std::ops::Bound;

use super::key::{self, encode_key, is_indexable, prefix_upper_bound};
use super::{Index, OnMissing};
use crate::core::{DatabaseError, FieldMeta, IndexMeta, Rid, Value};

#[derive(Debug, Clone)]
pub struct BTreeIndex {
    pub name: String,
    /// Indexed fields, in key order
    fields: Vec<FieldMeta>,
    field_names: Vec<String>,
    pub is_unique: bool,
    /// Encoded key -> RIDs holding that key
    tree: BTreeMap<Vec<u8>, Vec<Rid>>,
}

impl BTreeIndex {
    pub fn new(meta: &IndexMeta, fields: Vec<FieldMeta>) -> Result<Self, DatabaseError> {
        if let Some(field) = fields.iter().find(|f| !is_indexable(f.attr_type)) {
            return Err(DatabaseError::Unimplemented(format!(
                "index '{}' on {} field '{}'",
                meta.name, field.attr_type, field.name
            )));
        }
        Ok(Self {
            name: meta.name.clone(),
            field_names: fields.iter().map(|f| f.name.clone()).collect(),
            fields,
            is_unique: meta.unique,
            tree: BTreeMap::new(),
        })
    }

    /// Decodes the concatenated field slots into an ordered key
    fn key_from_slots(&self, slots: &[u8]) -> Result<(Vec<u8>, bool), DatabaseError> {
        let expected: usize = self.fields.iter().map(|f| f.len).sum();
        if slots.len() != expected {
            return Err(DatabaseError::InvalidArgument(format!(
                "index '{}' expects {expected} key bytes, got {}",
                self.name,
                slots.len()
            )));
        }

        let mut buf = Vec::with_capacity(expected + self.fields.len());
        let mut has_null = false;
        let mut pos = 0;
        for field in &self.fields {
            let slot = &slots[pos..pos + field.len];
            pos += field.len;
            if field.nullable && slot[0] == 1 {
                has_null = true;
                buf.push(key::type_prefix::NULL);
                continue;
            }
            let data = &slot[field.data_offset() - field.offset..];
            key::encode_value(&mut buf, &Value::from_raw(field.attr_type, data)?)?;
        }
        Ok((buf, has_null))
    }

    /// Casts lookup values to the field types so mixed literals find entries
    fn key_from_values(&self, values: &[Value]) -> Result<Vec<u8>, DatabaseError> {
        if values.len() > self.fields.len() {
            return Err(DatabaseError::FieldCountMismatch {
                expected: self.fields.len(),
                actual: values.len(),
            });
        }
        let cast = values
            .iter()
            .zip(&self.fields)
            .map(|(v, f)| Value::cast_to(v, f.attr_type))
            .collect::<Result<Vec<_>, _>>()?;
        encode_key(&cast)
    }

    #[must_use]
    pub fn contains(&self, rid: Rid) -> bool {
        self.tree.values().any(|rids| rids.contains(&rid))
    }
}

impl Index for BTreeIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn field_names(&self) -> &[String] {
        &self.field_names
    }

    fn is_unique(&self) -> bool {
        self.is_unique
    }

    /// NULL keys never collide on a unique index
    fn insert_entry(&mut self, key: &[u8], rid: Rid) -> Result<(), DatabaseError> {
        let (encoded, has_null) = self.key_from_slots(key)?;
        let rids = self.tree.entry(encoded).or_default();
        if rids.contains(&rid) {
            return Ok(());
        }
        if self.is_unique && !has_null && !rids.is_empty() {
            return Err(DatabaseError::DuplicateKey(self.name.clone()));
        }
        rids.push(rid);
        Ok(())
    }

    fn delete_entry(&mut self, key: &[u8], rid: Rid, on_missing: OnMissing) -> Result<(), DatabaseError> {
        let (encoded, _) = self.key_from_slots(key)?;
        let removed = match self.tree.get_mut(&encoded) {
            Some(rids) => {
                let before = rids.len();
                rids.retain(|r| *r != rid);
                let removed = rids.len() != before;
                if rids.is_empty() {
                    self.tree.remove(&encoded);
                }
                removed
            }
            None => false,
        };

        if !removed && on_missing == OnMissing::Error {
            return Err(DatabaseError::IndexEntryNotFound {
                index: self.name.clone(),
                rid,
            });
        }
        Ok(())
    }

    fn lookup(&self, values: &[Value]) -> Result<Vec<Rid>, DatabaseError> {
        if values.len() != self.fields.len() {
            return Err(DatabaseError::FieldCountMismatch {
                expected: self.fields.len(),
                actual: values.len(),
            });
        }
        let encoded = self.key_from_values(values)?;
        Ok(self.tree.get(&encoded).cloned().unwrap_or_default())
    }

    fn scan_range(&self, low: Option<&[Value]>, high: Option<&[Value]>) -> Result<Vec<Rid>, DatabaseError> {
        let low = match low {
            Some(values) => Bound::Included(self.key_from_values(values)?),
            None => Bound::Unbounded,
        };
        let high = match high {
            Some(values) => Bound::Excluded(prefix_upper_bound(self.key_from_values(values)?)),
            None => Bound::Unbounded,
        };
        if let (Bound::Included(l), Bound::Excluded(h)) = (&low, &high)
            && l >= h
        {
            return Ok(Vec::new());
        }
        Ok(self
            .tree
            .range((low, high))
            .flat_map(|(_, rids)| rids.iter().copied())
            .collect())
    }

    fn entry_count(&self) -> usize {
        self.tree.values().map(Vec::len).sum()
    }
}
