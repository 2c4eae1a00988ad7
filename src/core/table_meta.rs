use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::attr_type::AttrType;
use super::error::DatabaseError;
use super::field_meta::{AttrInfo, FieldMeta};
use crate::index::distance::DistanceType;

/// How records are laid out on pages. Only the marker is persisted;
/// both formats currently use the row layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StorageFormat {
    #[default]
    Row,
    Pax,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub name: String,
    pub fields: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndexMeta {
    pub name: String,
    pub field: String,
    pub distance: DistanceType,
    pub lists: usize,
    pub probes: usize,
}

/// Table schema persisted as `<name>.table`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    pub table_id: i32,
    pub name: String,
    pub fields: Vec<FieldMeta>,
    pub indexes: Vec<IndexMeta>,
    pub vector_indexes: Vec<VectorIndexMeta>,
    pub storage_format: StorageFormat,
    record_size: usize,
}

impl TableMeta {
    /// Lays the fields out back to back in declaration order
    pub fn new(
        table_id: i32,
        name: &str,
        attributes: &[AttrInfo],
        storage_format: StorageFormat,
    ) -> Result<Self, DatabaseError> {
        if name.is_empty() {
            return Err(DatabaseError::InvalidArgument("table name is empty".to_string()));
        }
        if attributes.is_empty() {
            return Err(DatabaseError::InvalidArgument(format!("table '{name}' has no fields")));
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(attributes.len());
        let mut offset = 0;
        for (field_id, info) in attributes.iter().enumerate() {
            if !seen.insert(info.name.as_str()) {
                return Err(DatabaseError::InvalidArgument(format!(
                    "duplicate field '{}' in table '{name}'",
                    info.name
                )));
            }
            let field = FieldMeta::new(info, offset, field_id)?;
            offset += field.len;
            fields.push(field);
        }

        Ok(Self {
            table_id,
            name: name.to_string(),
            fields,
            indexes: Vec::new(),
            vector_indexes: Vec::new(),
            storage_format,
            record_size: offset,
        })
    }

    #[must_use]
    pub const fn record_size(&self) -> usize {
        self.record_size
    }

    #[must_use]
    pub fn field_num(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn require_field(&self, name: &str) -> Result<&FieldMeta, DatabaseError> {
        self.field(name)
            .ok_or_else(|| DatabaseError::SchemaFieldNotFound(name.to_string()))
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<&IndexMeta> {
        self.indexes.iter().find(|i| i.name == name)
    }

    #[must_use]
    pub fn vector_index(&self, name: &str) -> Option<&VectorIndexMeta> {
        self.vector_indexes.iter().find(|i| i.name == name)
    }

    fn name_taken(&self, name: &str) -> bool {
        self.index(name).is_some() || self.vector_index(name).is_some()
    }

    pub fn add_index(&mut self, meta: IndexMeta) -> Result<(), DatabaseError> {
        if self.name_taken(&meta.name) {
            return Err(DatabaseError::IndexAlreadyExists(meta.name));
        }
        if meta.fields.is_empty() {
            return Err(DatabaseError::InvalidArgument(format!("index '{}' has no fields", meta.name)));
        }
        for field in &meta.fields {
            self.require_field(field)?;
        }
        self.indexes.push(meta);
        Ok(())
    }

    pub fn add_vector_index(&mut self, meta: VectorIndexMeta) -> Result<(), DatabaseError> {
        if self.name_taken(&meta.name) {
            return Err(DatabaseError::IndexAlreadyExists(meta.name));
        }
        let field = self.require_field(&meta.field)?;
        if field.attr_type != AttrType::Vectors {
            return Err(DatabaseError::SchemaFieldTypeMismatch {
                field: meta.field.clone(),
                expected: AttrType::Vectors,
                detail: format!("vector index '{}' needs a vector field", meta.name),
            });
        }
        if meta.lists == 0 || meta.probes == 0 {
            return Err(DatabaseError::InvalidArgument(format!(
                "vector index '{}' needs positive lists and probes",
                meta.name
            )));
        }
        self.vector_indexes.push(meta);
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), DatabaseError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, DatabaseError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
