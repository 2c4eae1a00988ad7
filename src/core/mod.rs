// Module declarations
pub mod attr_type;
pub mod comparator;
pub mod data_type;
pub mod error;
pub mod field_meta;
pub mod record;
pub mod table_meta;
pub mod value;

// Re-exports for convenience
pub use attr_type::AttrType;
pub use data_type::{DataType, type_instance};
pub use error::DatabaseError;
pub use field_meta::{AttrInfo, FieldMeta};
pub use record::{Record, Rid};
pub use table_meta::{IndexMeta, StorageFormat, TableMeta, VectorIndexMeta};
pub use value::Value;
