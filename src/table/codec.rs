//! Record codec: typed values <-> fixed-layout record bytes.
//!
//! Every field owns the byte range `offset..offset + len` of the record.
//! A nullable field starts with a 4-byte NULL slot (`1` = NULL). TEXT and
//! VECTOR values keep only a `LobDescriptor` inline; the payload goes to the
//! table's `.text` / `.vector` files.

use crate::core::data_type::vector::{floats_from_bytes, floats_to_bytes};
use crate::core::{AttrType, DatabaseError, FieldMeta, Record, TableMeta, Value};
use crate::storage::{LobDescriptor, LobFile};

/// Borrowed view of one field inside a record buffer
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'a> {
    field: &'a FieldMeta,
    data: &'a [u8],
}

impl<'a> FieldView<'a> {
    pub fn new(field: &'a FieldMeta, record: &'a [u8]) -> Result<Self, DatabaseError> {
        if record.len() < field.offset + field.len {
            return Err(DatabaseError::InvalidArgument(format!(
                "record of {} bytes has no room for field '{}'",
                record.len(),
                field.name
            )));
        }
        Ok(Self { field, data: record })
    }

    #[must_use]
    pub const fn field(&self) -> &'a FieldMeta {
        self.field
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.field.is_null_in(self.data)
    }

    /// The whole slot, NULL marker included
    #[must_use]
    pub fn slot(&self) -> &'a [u8] {
        self.field.slot(self.data)
    }

    /// Value bytes past the NULL marker
    #[must_use]
    pub fn raw(&self) -> &'a [u8] {
        let start = self.field.data_offset();
        &self.data[start..start + self.field.data_len()]
    }

    /// CHAR bytes up to the terminator
    #[must_use]
    pub fn chars(&self) -> &'a [u8] {
        let raw = self.raw();
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        &raw[..end]
    }

    /// Inline descriptor of a TEXT or VECTOR field
    pub fn descriptor(&self) -> Result<LobDescriptor, DatabaseError> {
        match self.field.attr_type {
            attr_type if attr_type.is_out_of_line() => LobDescriptor::from_bytes(self.raw()),
            other => Err(DatabaseError::InvalidArgument(format!(
                "field '{}' of type {other} has no descriptor",
                self.field.name
            ))),
        }
    }

    /// Decodes fixed-width types without touching the payload files
    pub fn to_value(&self) -> Result<Value, DatabaseError> {
        if self.is_null() {
            return Ok(Value::null_of(self.field.attr_type));
        }
        let attr_type = self.field.attr_type;
        if attr_type.is_out_of_line() {
            return Err(DatabaseError::InvalidArgument(format!(
                "field '{}' is stored out of line",
                self.field.name
            )));
        }
        Value::from_raw(attr_type, self.raw())
    }
}

/// Encodes and decodes the records of one table
pub struct RecordCodec<'a> {
    meta: &'a TableMeta,
    text_file: &'a LobFile,
    vector_file: &'a LobFile,
}

impl<'a> RecordCodec<'a> {
    #[must_use]
    pub const fn new(meta: &'a TableMeta, text_file: &'a LobFile, vector_file: &'a LobFile) -> Self {
        Self {
            meta,
            text_file,
            vector_file,
        }
    }

    /// Builds record bytes from one value per field, in field order
    pub fn encode(&self, values: &[Value]) -> Result<Vec<u8>, DatabaseError> {
        if values.len() != self.meta.field_num() {
            return Err(DatabaseError::FieldCountMismatch {
                expected: self.meta.field_num(),
                actual: values.len(),
            });
        }

        let mut data = vec![0u8; self.meta.record_size()];
        for (field, value) in self.meta.fields.iter().zip(values) {
            self.set_value_to_record(&mut data, value, field)?;
        }
        Ok(data)
    }

    fn set_value_to_record(&self, data: &mut [u8], value: &Value, field: &FieldMeta) -> Result<(), DatabaseError> {
        if value.is_null() {
            if !field.nullable {
                return Err(DatabaseError::SchemaFieldMissing(field.name.clone()));
            }
            data[field.offset] = 1;
            return Ok(());
        }

        let cast;
        let value = if value.attr_type() == field.attr_type {
            value
        } else {
            cast = Value::cast_to(value, field.attr_type).map_err(|e| e.with_field(&field.name))?;
            tracing::debug!(field = %field.name, from = %value.attr_type(), to = %field.attr_type, "cast value for record");
            &cast
        };

        let target = &mut data[field.data_offset()..field.data_offset() + field.data_len()];
        match field.attr_type {
            AttrType::Ints => target.copy_from_slice(&value.get_int().to_le_bytes()),
            AttrType::Floats => target.copy_from_slice(&value.get_float().to_le_bytes()),
            AttrType::Booleans => target[0] = u8::from(value.get_boolean()),
            AttrType::Dates => {
                if !value.is_date_valid() {
                    return Err(DatabaseError::SchemaFieldTypeMismatch {
                        field: field.name.clone(),
                        expected: AttrType::Dates,
                        detail: format!("invalid date {}", value.get_int()),
                    });
                }
                target.copy_from_slice(&value.get_int().to_le_bytes());
            }
            AttrType::Chars => {
                let bytes = value.bytes().unwrap_or_default();
                let copy_len = bytes.len().min(field.declared_len);
                if copy_len < bytes.len() {
                    tracing::warn!(
                        field = %field.name,
                        length = bytes.len(),
                        max = field.declared_len,
                        "truncating CHAR value"
                    );
                }
                // the last byte of the slot stays zero as the terminator
                target[..copy_len].copy_from_slice(&bytes[..copy_len]);
            }
            AttrType::Texts => {
                let bytes = value.bytes().unwrap_or_default();
                let desc = self.dump_text(bytes)?;
                target.copy_from_slice(&desc.to_bytes());
            }
            AttrType::Vectors => {
                let vector = value.vector().unwrap_or_default();
                if vector.len() != field.declared_len {
                    return Err(DatabaseError::VectorDimensionMismatch {
                        expected: field.declared_len,
                        actual: vector.len(),
                    });
                }
                let desc = self.dump_vector(vector)?;
                target.copy_from_slice(&desc.to_bytes());
            }
            AttrType::Undefined | AttrType::Nulls => {
                return Err(DatabaseError::InvalidArgument(format!(
                    "field '{}' has no storable type",
                    field.name
                )));
            }
        }
        Ok(())
    }

    /// Decodes one field, tagging the value with the record it came from
    pub fn decode_field(&self, record: &Record, field: &FieldMeta) -> Result<Value, DatabaseError> {
        let view = FieldView::new(field, &record.data)?;
        let mut value = match field.attr_type {
            _ if view.is_null() => Value::null_of(field.attr_type),
            AttrType::Texts => Value::text_owned(self.load_text(view.descriptor()?)?),
            AttrType::Vectors => Value::from(self.load_vector(view.descriptor()?)?),
            _ => view.to_value()?,
        };
        value.view_set_info(record.rid, &self.meta.name);
        Ok(value)
    }

    pub fn decode(&self, record: &Record) -> Result<Vec<Value>, DatabaseError> {
        self.meta
            .fields
            .iter()
            .map(|field| self.decode_field(record, field))
            .collect()
    }

    pub fn dump_text(&self, bytes: &[u8]) -> Result<LobDescriptor, DatabaseError> {
        let offset = self.text_file.append(bytes)?;
        Ok(LobDescriptor {
            offset,
            len: bytes.len() as u64,
        })
    }

    pub fn load_text(&self, desc: LobDescriptor) -> Result<Vec<u8>, DatabaseError> {
        self.text_file.read(desc.offset, desc.len as usize)
    }

    pub fn dump_vector(&self, vector: &[f32]) -> Result<LobDescriptor, DatabaseError> {
        let offset = self.vector_file.append(&floats_to_bytes(vector))?;
        Ok(LobDescriptor {
            offset,
            len: vector.len() as u64,
        })
    }

    pub fn load_vector(&self, desc: LobDescriptor) -> Result<Vec<f32>, DatabaseError> {
        let bytes = self.vector_file.read(desc.offset, desc.len as usize * 4)?;
        floats_from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AttrInfo, Rid, StorageFormat};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        meta: TableMeta,
        text: LobFile,
        vector: LobFile,
    }

    fn fixture(attributes: &[AttrInfo]) -> Fixture {
        let dir = TempDir::new().unwrap();
        let text = LobFile::open(dir.path().join("t.text")).unwrap();
        let vector = LobFile::open(dir.path().join("t.vector")).unwrap();
        let meta = TableMeta::new(1, "t", attributes, StorageFormat::Row).unwrap();
        Fixture {
            _dir: dir,
            meta,
            text,
            vector,
        }
    }

    #[test]
    fn test_chars_keeps_terminator() {
        let f = fixture(&[
            AttrInfo::new("a", AttrType::Ints, 0, false),
            AttrInfo::new("b", AttrType::Chars, 4, false),
        ]);
        let codec = RecordCodec::new(&f.meta, &f.text, &f.vector);

        let data = codec.encode(&[Value::from(1), Value::from("abcdef")]).unwrap();
        assert_eq!(data.len(), 9);
        assert_eq!(&data[4..], b"abcd\0");

        let values = codec.decode(&Record::new(Rid::new(0, 3), data)).unwrap();
        assert_eq!(values[1].get_string(), "abcd");
        assert_eq!(values[1].slot_num(), Some(3));
        assert_eq!(values[1].table_name(), Some("t"));
    }

    #[test]
    fn test_casts_to_field_type() {
        let f = fixture(&[
            AttrInfo::new("f", AttrType::Floats, 0, false),
            AttrInfo::new("c", AttrType::Chars, 8, false),
            AttrInfo::new("d", AttrType::Dates, 0, false),
        ]);
        let codec = RecordCodec::new(&f.meta, &f.text, &f.vector);

        let data = codec
            .encode(&[Value::from(3), Value::from(42), Value::from("2024-02-29")])
            .unwrap();
        let values = codec.decode(&Record::from_data(data)).unwrap();
        assert!(values[0].is_float());
        assert_eq!(values[1].get_string(), "42");
        assert_eq!(values[2].to_string(), "2024-02-29");

        let err = codec
            .encode(&[Value::from("x1"), Value::from(1), Value::from("2024-02-29")])
            .unwrap_err();
        assert_eq!(err.code(), "SCHEMA_FIELD_TYPE_MISMATCH");
    }

    #[test]
    fn test_nulls() {
        let f = fixture(&[
            AttrInfo::new("a", AttrType::Ints, 0, false),
            AttrInfo::new("n", AttrType::Ints, 0, true),
        ]);
        let codec = RecordCodec::new(&f.meta, &f.text, &f.vector);

        let data = codec.encode(&[Value::from(1), Value::null()]).unwrap();
        let values = codec.decode(&Record::from_data(data)).unwrap();
        assert!(values[1].is_null());
        assert_eq!(values[1].resolved_type(), AttrType::Ints);

        let err = codec.encode(&[Value::null(), Value::from(1)]).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_FIELD_MISSING");
        let err = codec.encode(&[Value::from(1)]).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_FIELD_MISSING");
    }

    #[test]
    fn test_out_of_line_fields() {
        let f = fixture(&[
            AttrInfo::new("t", AttrType::Texts, 0, false),
            AttrInfo::new("v", AttrType::Vectors, 3, false),
        ]);
        let codec = RecordCodec::new(&f.meta, &f.text, &f.vector);

        let long = "x".repeat(5000);
        let data = codec
            .encode(&[Value::text(&long), Value::from(vec![1.0, 2.0, 3.0])])
            .unwrap();
        assert_eq!(data.len(), 32);

        let record = Record::from_data(data);
        let values = codec.decode(&record).unwrap();
        assert_eq!(values[0].get_string(), long);
        assert_eq!(values[1].get_vector(), vec![1.0, 2.0, 3.0]);

        let view = FieldView::new(&f.meta.fields[1], &record.data).unwrap();
        assert_eq!(view.descriptor().unwrap().len, 3);

        let err = codec
            .encode(&[Value::text("a"), Value::from(vec![1.0])])
            .unwrap_err();
        assert_eq!(err.code(), "VECTOR_DIMENSION_MISMATCH");
    }

    #[test]
    fn test_field_view() {
        let f = fixture(&[
            AttrInfo::new("n", AttrType::Ints, 0, true),
            AttrInfo::new("b", AttrType::Chars, 3, false),
        ]);
        let codec = RecordCodec::new(&f.meta, &f.text, &f.vector);
        let data = codec.encode(&[Value::from(7), Value::from("hi")]).unwrap();

        let n = FieldView::new(&f.meta.fields[0], &data).unwrap();
        assert!(!n.is_null());
        assert_eq!(n.slot().len(), 8);
        assert_eq!(n.to_value().unwrap(), Value::from(7));
        let b = FieldView::new(&f.meta.fields[1], &data).unwrap();
        assert_eq!(b.chars(), b"hi");
        assert!(b.descriptor().is_err());
        assert!(FieldView::new(&f.meta.fields[1], &data[..4]).is_err());
    }
}
