use std::cmp::Ordering;

use super::DataType;
use crate::core::attr_type::AttrType;
use crate::core::comparator::compare_string;
use crate::core::error::DatabaseError;
use crate::core::value::{Datum, Value};

/// Long text; stored out of line, otherwise behaves like CHAR
pub struct TextType;

impl DataType for TextType {
    fn attr_type(&self) -> AttrType {
        AttrType::Texts
    }

    fn compare(&self, left: &Value, right: &Value) -> Option<Ordering> {
        match (left.datum(), right.datum()) {
            (Datum::Text(l), Datum::Text(r) | Datum::Chars(r)) => Some(compare_string(l, r)),
            _ => None,
        }
    }

    fn set_value_from_str(&self, value: &mut Value, data: &str) -> Result<(), DatabaseError> {
        value.set_text(data.as_bytes());
        Ok(())
    }

    fn to_string(&self, value: &Value) -> String {
        value
            .bytes()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_with_chars() {
        let ord = TextType.compare(&Value::text("abc"), &Value::from("abd"));
        assert_eq!(ord, Some(Ordering::Less));
        // symmetric through Value::compare
        assert_eq!(Value::from("abd").compare(&Value::text("abc")), Some(Ordering::Greater));
    }

    #[test]
    fn test_cast_to_chars_only() {
        let v = Value::text("hello");
        assert_eq!(TextType.cast_to(&v, AttrType::Chars).unwrap().get_string(), "hello");
        assert!(TextType.cast_to(&v, AttrType::Ints).is_err());
    }
}
