//! Per-type behaviors for `Value`
//!
//! Each concrete attribute type has one stateless implementation of
//! `DataType`, looked up with a `match` over the tag.

pub mod boolean;
pub mod chars;
pub mod date;
pub mod float;
pub mod integer;
pub mod text;
pub mod vector;

pub use boolean::BooleanType;
pub use chars::CharType;
pub use date::DateType;
pub use float::FloatType;
pub use integer::IntegerType;
pub use text::TextType;
pub use vector::VectorType;

use std::cmp::Ordering;

use super::attr_type::AttrType;
use super::error::DatabaseError;
use super::value::Value;

/// Arithmetic, comparison, text conversion and casting for one type.
///
/// Arithmetic is invoked on the behavior of the *result* type, after
/// `Value::result_type` resolved it; both operands are non-NULL and
/// compatible with that type.
pub trait DataType: Sync {
    fn attr_type(&self) -> AttrType;

    /// `left` matches this type (or the result type of an operation);
    /// `None` means the pair is incomparable
    fn compare(&self, left: &Value, right: &Value) -> Option<Ordering>;

    fn add(&self, _left: &Value, _right: &Value) -> Result<Value, DatabaseError> {
        Err(self.unsupported("add"))
    }

    fn subtract(&self, _left: &Value, _right: &Value) -> Result<Value, DatabaseError> {
        Err(self.unsupported("subtract"))
    }

    fn multiply(&self, _left: &Value, _right: &Value) -> Result<Value, DatabaseError> {
        Err(self.unsupported("multiply"))
    }

    fn divide(&self, _left: &Value, _right: &Value) -> Result<Value, DatabaseError> {
        Err(self.unsupported("divide"))
    }

    fn negative(&self, _value: &Value) -> Result<Value, DatabaseError> {
        Err(self.unsupported("negative"))
    }

    fn max(&self, left: &Value, right: &Value) -> Result<Value, DatabaseError> {
        match left.compare(right) {
            Some(Ordering::Less) => self.coerce(right),
            Some(_) => self.coerce(left),
            None => Err(DatabaseError::ValueTypeMismatch {
                left: left.attr_type(),
                right: right.attr_type(),
            }),
        }
    }

    fn min(&self, left: &Value, right: &Value) -> Result<Value, DatabaseError> {
        match left.compare(right) {
            Some(Ordering::Greater) => self.coerce(right),
            Some(_) => self.coerce(left),
            None => Err(DatabaseError::ValueTypeMismatch {
                left: left.attr_type(),
                right: right.attr_type(),
            }),
        }
    }

    /// Parses `data`; trailing garbage is a `SchemaFieldTypeMismatch`
    fn set_value_from_str(&self, value: &mut Value, data: &str) -> Result<(), DatabaseError>;

    fn to_string(&self, value: &Value) -> String;

    /// Every type casts to CHAR through its own `to_string`
    fn cast_to(&self, value: &Value, to_type: AttrType) -> Result<Value, DatabaseError> {
        match to_type {
            AttrType::Chars => Ok(Value::from(self.to_string(value))),
            _ => Err(DatabaseError::unimplemented_cast(self.attr_type(), to_type)),
        }
    }

    /// Brings an operand to this type, used by `max`/`min`
    fn coerce(&self, value: &Value) -> Result<Value, DatabaseError> {
        Value::cast_to(value, self.attr_type())
    }

    fn unsupported(&self, op: &str) -> DatabaseError {
        DatabaseError::Unimplemented(format!("{op} on {}", self.attr_type()))
    }
}

static INTEGER: IntegerType = IntegerType;
static FLOAT: FloatType = FloatType;
static BOOLEAN: BooleanType = BooleanType;
static CHAR: CharType = CharType;
static DATE: DateType = DateType;
static VECTOR: VectorType = VectorType;
static TEXT: TextType = TextType;

/// Behavior for a concrete type; UNDEFINED and NULLS have none
pub fn type_instance(attr_type: AttrType) -> Result<&'static dyn DataType, DatabaseError> {
    match attr_type {
        AttrType::Ints => Ok(&INTEGER),
        AttrType::Floats => Ok(&FLOAT),
        AttrType::Booleans => Ok(&BOOLEAN),
        AttrType::Chars => Ok(&CHAR),
        AttrType::Dates => Ok(&DATE),
        AttrType::Vectors => Ok(&VECTOR),
        AttrType::Texts => Ok(&TEXT),
        AttrType::Undefined | AttrType::Nulls => {
            Err(DatabaseError::Unimplemented(format!("no behavior for {attr_type}")))
        }
    }
}
