use std::cmp::Ordering;

use super::DataType;
use crate::core::attr_type::AttrType;
use crate::core::comparator::{compare_float, compare_int, str_to_float};
use crate::core::error::DatabaseError;
use crate::core::value::{Datum, Value};

pub struct BooleanType;

impl DataType for BooleanType {
    fn attr_type(&self) -> AttrType {
        AttrType::Booleans
    }

    fn compare(&self, left: &Value, right: &Value) -> Option<Ordering> {
        let Datum::Boolean(l) = left.datum() else {
            return None;
        };
        match right.datum() {
            Datum::Boolean(r) => Some(l.cmp(r)),
            Datum::Int(r) => Some(compare_int(i32::from(*l), *r)),
            Datum::Float(r) => Some(compare_float(f32::from(u8::from(*l)), *r)),
            Datum::Chars(r) => Some(compare_float(
                f32::from(u8::from(*l)),
                str_to_float(&String::from_utf8_lossy(r)),
            )),
            _ => None,
        }
    }

    fn set_value_from_str(&self, value: &mut Value, data: &str) -> Result<(), DatabaseError> {
        let parsed = match data.trim() {
            s if s.eq_ignore_ascii_case("true") || s == "1" => true,
            s if s.eq_ignore_ascii_case("false") || s == "0" => false,
            _ => return Err(DatabaseError::parse_failure(AttrType::Booleans, data)),
        };
        value.set_boolean(parsed);
        Ok(())
    }

    fn to_string(&self, value: &Value) -> String {
        value.get_boolean().to_string()
    }

    fn cast_to(&self, value: &Value, to_type: AttrType) -> Result<Value, DatabaseError> {
        match to_type {
            AttrType::Ints => Ok(Value::from(value.get_int())),
            AttrType::Floats => Ok(Value::from(value.get_float())),
            AttrType::Chars => Ok(Value::from(self.to_string(value))),
            _ => Err(DatabaseError::unimplemented_cast(AttrType::Booleans, to_type)),
        }
    }
}
