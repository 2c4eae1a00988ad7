use std::cmp::Ordering;

use super::{DataType, date, type_instance, vector};
use crate::core::attr_type::AttrType;
use crate::core::comparator::{compare_float, compare_int, compare_string, str_to_float};
use crate::core::error::DatabaseError;
use crate::core::value::{Datum, Value};

pub struct CharType;

impl DataType for CharType {
    fn attr_type(&self) -> AttrType {
        AttrType::Chars
    }

    fn compare(&self, left: &Value, right: &Value) -> Option<Ordering> {
        let Datum::Chars(l) = left.datum() else {
            return None;
        };
        match right.datum() {
            Datum::Chars(r) | Datum::Text(r) => Some(compare_string(l, r)),
            Datum::Int(_) | Datum::Float(_) | Datum::Boolean(_) => {
                Some(compare_float(str_to_float(&String::from_utf8_lossy(l)), right.get_float()))
            }
            Datum::Date(r) => {
                let parsed = date::parse_date(&String::from_utf8_lossy(l)).ok()?;
                Some(compare_int(parsed, *r))
            }
            _ => None,
        }
    }

    fn set_value_from_str(&self, value: &mut Value, data: &str) -> Result<(), DatabaseError> {
        value.set_string(data);
        Ok(())
    }

    fn to_string(&self, value: &Value) -> String {
        value
            .bytes()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    fn cast_to(&self, value: &Value, to_type: AttrType) -> Result<Value, DatabaseError> {
        let text = self.to_string(value);
        match to_type {
            AttrType::Ints | AttrType::Floats | AttrType::Booleans => {
                let mut result = Value::null();
                type_instance(to_type)?.set_value_from_str(&mut result, text.trim_end())?;
                Ok(result)
            }
            AttrType::Dates => Value::from_date(&text),
            AttrType::Vectors => Ok(Value::from(vector::parse_vector(&text)?)),
            AttrType::Texts => Ok(Value::text_owned(value.bytes().unwrap_or_default().to_vec())),
            AttrType::Chars => Ok(value.clone()),
            _ => Err(DatabaseError::unimplemented_cast(AttrType::Chars, to_type)),
        }
    }
}
