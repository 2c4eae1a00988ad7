use thiserror::Error;

use super::attr_type::AttrType;
use super::record::Rid;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Value type mismatch: {left} vs {right}")]
    ValueTypeMismatch { left: AttrType, right: AttrType },
    #[error("Field '{field}' expects {expected}: {detail}")]
    SchemaFieldTypeMismatch {
        field: String,
        expected: AttrType,
        detail: String,
    },
    #[error("Field '{0}' does not accept NULL")]
    SchemaFieldMissing(String),
    #[error("Field '{0}' not found")]
    SchemaFieldNotFound(String),
    #[error("Field count mismatch: expected {expected}, got {actual}")]
    FieldCountMismatch { expected: usize, actual: usize },
    #[error("Index '{0}' not found")]
    IndexNotFound(String),
    #[error("Index '{0}' already exists")]
    IndexAlreadyExists(String),
    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),
    #[error("Unimplemented: {0}")]
    Unimplemented(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Record {0} not found")]
    RecordNotFound(Rid),
    #[error("Record {0} already exists")]
    RecordExists(Rid),
    #[error("Record of {0} bytes does not fit in a page")]
    RecordTooLarge(usize),
    #[error("Duplicate key value violates unique index '{0}'")]
    DuplicateKey(String),
    #[error("Index '{index}' has no entry for record {rid}")]
    IndexEntryNotFound { index: String, rid: Rid },
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    VectorDimensionMismatch { expected: usize, actual: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Binary Serialization error: {0}")]
    BinarySerialization(String),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl DatabaseError {
    /// Shorthand for a failed text parse of a typed value
    pub fn parse_failure(expected: AttrType, text: &str) -> Self {
        Self::SchemaFieldTypeMismatch {
            field: String::new(),
            expected,
            detail: format!("cannot parse '{text}'"),
        }
    }

    pub fn unimplemented_cast(from: AttrType, to: AttrType) -> Self {
        Self::Unimplemented(format!("cast from {from} to {to}"))
    }

    /// Stable code name reported to the statement layer
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ValueTypeMismatch { .. } => "VALUE_TYPE_MISMATCH",
            Self::SchemaFieldTypeMismatch { .. } => "SCHEMA_FIELD_TYPE_MISMATCH",
            Self::SchemaFieldMissing(_) => "SCHEMA_FIELD_MISSING",
            Self::SchemaFieldNotFound(_) => "SCHEMA_FIELD_NOT_EXIST",
            Self::FieldCountMismatch { .. } => "SCHEMA_FIELD_MISSING",
            Self::IndexNotFound(_) => "SCHEMA_INDEX_NOT_EXIST",
            Self::IndexAlreadyExists(_) => "SCHEMA_INDEX_NAME_REPEAT",
            Self::TableAlreadyExists(_) => "SCHEMA_TABLE_EXIST",
            Self::Unimplemented(_) => "UNIMPLEMENTED",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::RecordNotFound(_) | Self::IndexEntryNotFound { .. } => "RECORD_NOT_EXIST",
            Self::RecordExists(_) => "RECORD_EXIST",
            Self::RecordTooLarge(_) => "RECORD_TOO_LARGE",
            Self::DuplicateKey(_) => "RECORD_DUPLICATE_KEY",
            Self::VectorDimensionMismatch { .. } => "VECTOR_DIMENSION_MISMATCH",
            Self::Io(_) => "IOERR",
            Self::Serialization(_) | Self::BinarySerialization(_) => "SERIALIZATION",
            Self::Config(_) => "CONFIG",
            Self::LockPoisoned(_) => "LOCK_POISONED",
        }
    }

    /// Attach the offending field name to a parse failure
    #[must_use]
    pub fn with_field(self, name: &str) -> Self {
        match self {
            Self::SchemaFieldTypeMismatch { expected, detail, .. } => Self::SchemaFieldTypeMismatch {
                field: name.to_string(),
                expected,
                detail,
            },
            other => other,
        }
    }
}
