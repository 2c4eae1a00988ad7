use serde::{Deserialize, Serialize};

use super::attr_type::AttrType;
use super::error::DatabaseError;
use super::value::{DESCRIPTOR_SIZE, NULL_SLOT_SIZE};

/// Attribute definition as it comes out of CREATE TABLE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrInfo {
    pub name: String,
    pub attr_type: AttrType,
    /// CHAR length or VECTOR dimension; ignored for other types
    pub length: usize,
    pub nullable: bool,
}

impl AttrInfo {
    #[must_use]
    pub fn new(name: &str, attr_type: AttrType, length: usize, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            attr_type,
            length,
            nullable,
        }
    }

    /// Bytes the value part of the field occupies in a record
    pub fn data_len(&self) -> Result<usize, DatabaseError> {
        let len = match self.attr_type {
            AttrType::Ints | AttrType::Floats | AttrType::Dates => 4,
            AttrType::Booleans => 1,
            AttrType::Chars if self.length > 0 => self.length + 1,
            AttrType::Texts => DESCRIPTOR_SIZE,
            AttrType::Vectors if self.length > 0 => DESCRIPTOR_SIZE,
            AttrType::Chars | AttrType::Vectors => {
                return Err(DatabaseError::InvalidArgument(format!(
                    "field '{}' of type {} needs a positive length",
                    self.name, self.attr_type
                )));
            }
            AttrType::Undefined | AttrType::Nulls => {
                return Err(DatabaseError::InvalidArgument(format!(
                    "field '{}' has no storable type",
                    self.name
                )));
            }
        };
        Ok(len)
    }
}

/// One field of a table: where it sits in the record and what it holds.
///
/// A nullable field starts with a 4-byte NULL slot; `offset`/`len` cover
/// the slot and the value together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    pub attr_type: AttrType,
    pub offset: usize,
    pub len: usize,
    /// Declared CHAR length or VECTOR dimension
    pub declared_len: usize,
    pub nullable: bool,
    pub field_id: usize,
}

impl FieldMeta {
    pub fn new(info: &AttrInfo, offset: usize, field_id: usize) -> Result<Self, DatabaseError> {
        let slot = if info.nullable { NULL_SLOT_SIZE } else { 0 };
        Ok(Self {
            name: info.name.clone(),
            attr_type: info.attr_type,
            offset,
            len: slot + info.data_len()?,
            declared_len: info.length,
            nullable: info.nullable,
            field_id,
        })
    }

    /// Offset of the value bytes, past the NULL slot
    #[must_use]
    pub const fn data_offset(&self) -> usize {
        if self.nullable { self.offset + NULL_SLOT_SIZE } else { self.offset }
    }

    #[must_use]
    pub const fn data_len(&self) -> usize {
        if self.nullable { self.len - NULL_SLOT_SIZE } else { self.len }
    }

    /// Slice of `record` holding this whole field
    #[must_use]
    pub fn slot<'a>(&self, record: &'a [u8]) -> &'a [u8] {
        &record[self.offset..self.offset + self.len]
    }

    #[must_use]
    pub fn is_null_in(&self, record: &[u8]) -> bool {
        self.nullable && record.get(self.offset) == Some(&1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lengths() {
        let f = FieldMeta::new(&AttrInfo::new("a", AttrType::Ints, 0, false), 0, 0).unwrap();
        assert_eq!((f.offset, f.len), (0, 4));
        let f = FieldMeta::new(&AttrInfo::new("b", AttrType::Chars, 4, false), 4, 1).unwrap();
        assert_eq!(f.len, 5);
        let f = FieldMeta::new(&AttrInfo::new("c", AttrType::Vectors, 3, true), 9, 2).unwrap();
        assert_eq!(f.len, NULL_SLOT_SIZE + DESCRIPTOR_SIZE);
        assert_eq!(f.data_offset(), 13);
        assert_eq!(f.data_len(), DESCRIPTOR_SIZE);
    }

    #[test]
    fn test_zero_length_rejected() {
        let err = AttrInfo::new("b", AttrType::Chars, 0, false).data_len().unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert!(AttrInfo::new("v", AttrType::Vectors, 0, false).data_len().is_err());
        assert!(AttrInfo::new("n", AttrType::Nulls, 0, false).data_len().is_err());
    }

    #[test]
    fn test_null_slot() {
        let f = FieldMeta::new(&AttrInfo::new("a", AttrType::Ints, 0, true), 0, 0).unwrap();
        assert!(f.is_null_in(&[1, 0, 0, 0, 0, 0, 0, 0]));
        assert!(!f.is_null_in(&[0, 0, 0, 0, 7, 0, 0, 0]));
    }
}
