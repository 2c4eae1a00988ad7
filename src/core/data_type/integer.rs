use std::cmp::Ordering;

use super::DataType;
use crate::core::attr_type::AttrType;
use crate::core::comparator::{compare_float, compare_int, str_to_float};
use crate::core::error::DatabaseError;
use crate::core::value::{Datum, Value};

pub struct IntegerType;

impl DataType for IntegerType {
    fn attr_type(&self) -> AttrType {
        AttrType::Ints
    }

    fn compare(&self, left: &Value, right: &Value) -> Option<Ordering> {
        let Datum::Int(l) = left.datum() else {
            return None;
        };
        match right.datum() {
            Datum::Int(r) => Some(compare_int(*l, *r)),
            Datum::Boolean(r) => Some(compare_int(*l, i32::from(*r))),
            Datum::Float(r) => Some(compare_float(*l as f32, *r)),
            Datum::Chars(r) => Some(compare_float(*l as f32, str_to_float(&String::from_utf8_lossy(r)))),
            _ => None,
        }
    }

    fn add(&self, left: &Value, right: &Value) -> Result<Value, DatabaseError> {
        Ok(Value::from(left.get_int().wrapping_add(right.get_int())))
    }

    fn subtract(&self, left: &Value, right: &Value) -> Result<Value, DatabaseError> {
        Ok(Value::from(left.get_int().wrapping_sub(right.get_int())))
    }

    fn multiply(&self, left: &Value, right: &Value) -> Result<Value, DatabaseError> {
        Ok(Value::from(left.get_int().wrapping_mul(right.get_int())))
    }

    fn negative(&self, value: &Value) -> Result<Value, DatabaseError> {
        Ok(Value::from(value.get_int().wrapping_neg()))
    }

    fn set_value_from_str(&self, value: &mut Value, data: &str) -> Result<(), DatabaseError> {
        let parsed = data
            .trim_start()
            .parse::<i32>()
            .map_err(|_| DatabaseError::parse_failure(AttrType::Ints, data))?;
        value.set_int(parsed);
        Ok(())
    }

    fn to_string(&self, value: &Value) -> String {
        value.get_int().to_string()
    }

    fn cast_to(&self, value: &Value, to_type: AttrType) -> Result<Value, DatabaseError> {
        match to_type {
            AttrType::Floats => Ok(Value::from(value.get_int() as f32)),
            AttrType::Booleans => Ok(Value::from(value.get_int() != 0)),
            AttrType::Chars => Ok(Value::from(self.to_string(value))),
            _ => Err(DatabaseError::unimplemented_cast(AttrType::Ints, to_type)),
        }
    }
}
