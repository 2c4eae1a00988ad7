use std::cmp::Ordering;

use super::DataType;
use crate::core::attr_type::AttrType;
use crate::core::comparator::{compare_float, str_to_float};
use crate::core::error::DatabaseError;
use crate::core::value::{Datum, Value};

pub struct FloatType;

impl DataType for FloatType {
    fn attr_type(&self) -> AttrType {
        AttrType::Floats
    }

    fn compare(&self, left: &Value, right: &Value) -> Option<Ordering> {
        let Datum::Float(l) = left.datum() else {
            return None;
        };
        match right.datum() {
            Datum::Int(_) | Datum::Float(_) | Datum::Boolean(_) => Some(compare_float(*l, right.get_float())),
            Datum::Chars(r) => Some(compare_float(*l, str_to_float(&String::from_utf8_lossy(r)))),
            _ => None,
        }
    }

    fn add(&self, left: &Value, right: &Value) -> Result<Value, DatabaseError> {
        Ok(Value::from(left.get_float() + right.get_float()))
    }

    fn subtract(&self, left: &Value, right: &Value) -> Result<Value, DatabaseError> {
        Ok(Value::from(left.get_float() - right.get_float()))
    }

    fn multiply(&self, left: &Value, right: &Value) -> Result<Value, DatabaseError> {
        Ok(Value::from(left.get_float() * right.get_float()))
    }

    /// Division by (almost) zero yields NULL
    fn divide(&self, left: &Value, right: &Value) -> Result<Value, DatabaseError> {
        let divisor = right.get_float();
        if compare_float(divisor, 0.0) == Ordering::Equal {
            return Ok(Value::null_of(AttrType::Floats));
        }
        Ok(Value::from(left.get_float() / divisor))
    }

    fn negative(&self, value: &Value) -> Result<Value, DatabaseError> {
        Ok(Value::from(-value.get_float()))
    }

    fn set_value_from_str(&self, value: &mut Value, data: &str) -> Result<(), DatabaseError> {
        let parsed = data
            .trim_start()
            .parse::<f32>()
            .map_err(|_| DatabaseError::parse_failure(AttrType::Floats, data))?;
        value.set_float(parsed);
        Ok(())
    }

    fn to_string(&self, value: &Value) -> String {
        value.get_float().to_string()
    }

    fn cast_to(&self, value: &Value, to_type: AttrType) -> Result<Value, DatabaseError> {
        match to_type {
            AttrType::Ints => Ok(Value::from(value.get_int())),
            AttrType::Booleans => Ok(Value::from(value.get_boolean())),
            AttrType::Chars => Ok(Value::from(self.to_string(value))),
            _ => Err(DatabaseError::unimplemented_cast(AttrType::Floats, to_type)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_tolerates_rounding() {
        let ord = FloatType.compare(&Value::from(0.1f32 + 0.2), &Value::from(0.3f32));
        assert_eq!(ord, Some(Ordering::Equal));
        let ord = FloatType.compare(&Value::from(2.0f32), &Value::from(3));
        assert_eq!(ord, Some(Ordering::Less));
    }

    #[test]
    fn test_divide_by_zero_is_null() {
        let result = FloatType.divide(&Value::from(1.0f32), &Value::from(0)).unwrap();
        assert!(result.is_null());
    }

    #[test]
    fn test_cast_truncates_toward_zero() {
        assert_eq!(FloatType.cast_to(&Value::from(2.9f32), AttrType::Ints).unwrap().get_int(), 2);
        assert_eq!(FloatType.cast_to(&Value::from(-2.9f32), AttrType::Ints).unwrap().get_int(), -2);
    }

    #[test]
    fn test_to_string_round_trips() {
        for f in [0.1f32, 3.5, -1e-3, 123_456.79] {
            let text = FloatType.to_string(&Value::from(f));
            let mut parsed = Value::null();
            FloatType.set_value_from_str(&mut parsed, &text).unwrap();
            assert_eq!(parsed.get_float(), f);
        }
    }

    #[test]
    fn test_parse_rejects_trailing_garbage() {
        let mut v = Value::null();
        assert!(FloatType.set_value_from_str(&mut v, "1.5x").is_err());
    }
}
