use std::cmp::Ordering;

use super::DataType;
use crate::core::attr_type::AttrType;
use crate::core::comparator::compare_float;
use crate::core::error::DatabaseError;
use crate::core::value::{Datum, Value};

pub struct VectorType;

/// Parses `[1, 2.5, 3]`; `[]` is the empty vector
pub(crate) fn parse_vector(text: &str) -> Result<Vec<f32>, DatabaseError> {
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| DatabaseError::parse_failure(AttrType::Vectors, text))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|item| {
            item.trim()
                .parse::<f32>()
                .map_err(|_| DatabaseError::parse_failure(AttrType::Vectors, text))
        })
        .collect()
}

/// Little-endian `f32` sequence as stored out of line
pub(crate) fn floats_from_bytes(data: &[u8]) -> Result<Vec<f32>, DatabaseError> {
    if data.len() % 4 != 0 {
        return Err(DatabaseError::InvalidArgument(format!(
            "vector payload of {} bytes is not a multiple of 4",
            data.len()
        )));
    }
    Ok(data
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[must_use]
pub fn floats_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn operands<'a>(left: &'a Value, right: &'a Value) -> Result<(&'a [f32], &'a [f32]), DatabaseError> {
    let mismatch = || DatabaseError::ValueTypeMismatch {
        left: left.attr_type(),
        right: right.attr_type(),
    };
    let l = left.vector().ok_or_else(mismatch)?;
    let r = right.vector().ok_or_else(mismatch)?;
    if l.len() != r.len() {
        return Err(DatabaseError::VectorDimensionMismatch {
            expected: l.len(),
            actual: r.len(),
        });
    }
    Ok((l, r))
}

fn element_wise(left: &Value, right: &Value, op: impl Fn(f32, f32) -> f32) -> Result<Value, DatabaseError> {
    let (l, r) = operands(left, right)?;
    Ok(Value::from(l.iter().zip(r).map(|(a, b)| op(*a, *b)).collect::<Vec<_>>()))
}

impl DataType for VectorType {
    fn attr_type(&self) -> AttrType {
        AttrType::Vectors
    }

    /// Lexicographic over elements, then by dimension
    fn compare(&self, left: &Value, right: &Value) -> Option<Ordering> {
        let (Datum::Vector(l), Datum::Vector(r)) = (left.datum(), right.datum()) else {
            return None;
        };
        for (a, b) in l.iter().zip(r) {
            match compare_float(*a, *b) {
                Ordering::Equal => {}
                other => return Some(other),
            }
        }
        Some(l.len().cmp(&r.len()))
    }

    fn add(&self, left: &Value, right: &Value) -> Result<Value, DatabaseError> {
        element_wise(left, right, |a, b| a + b)
    }

    fn subtract(&self, left: &Value, right: &Value) -> Result<Value, DatabaseError> {
        element_wise(left, right, |a, b| a - b)
    }

    fn multiply(&self, left: &Value, right: &Value) -> Result<Value, DatabaseError> {
        element_wise(left, right, |a, b| a * b)
    }

    fn negative(&self, value: &Value) -> Result<Value, DatabaseError> {
        let v = value.vector().ok_or_else(|| self.unsupported("negative"))?;
        Ok(Value::from(v.iter().map(|f| -f).collect::<Vec<_>>()))
    }

    fn set_value_from_str(&self, value: &mut Value, data: &str) -> Result<(), DatabaseError> {
        value.set_vector_owned(parse_vector(data)?);
        Ok(())
    }

    fn to_string(&self, value: &Value) -> String {
        let items: Vec<String> = value.vector().unwrap_or_default().iter().map(ToString::to_string).collect();
        format!("[{}]", items.join(","))
    }

    fn cast_to(&self, value: &Value, to_type: AttrType) -> Result<Value, DatabaseError> {
        match to_type {
            AttrType::Chars => Ok(Value::from(self.to_string(value))),
            AttrType::Texts => Ok(Value::text(&self.to_string(value))),
            _ => Err(DatabaseError::unimplemented_cast(AttrType::Vectors, to_type)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(parse_vector("[1, 2.5,3]").unwrap(), vec![1.0, 2.5, 3.0]);
        assert_eq!(parse_vector(" [] ").unwrap(), Vec::<f32>::new());
        assert!(parse_vector("1,2").is_err());
        assert!(parse_vector("[1,a]").is_err());
    }

    #[test]
    fn test_element_wise() {
        let a = Value::from(vec![1.0, 2.0]);
        let b = Value::from(vec![0.5, 4.0]);
        assert_eq!(Value::add(&a, &b).unwrap().get_vector(), vec![1.5, 6.0]);
        assert_eq!(Value::subtract(&a, &b).unwrap().get_vector(), vec![0.5, -2.0]);
        assert_eq!(Value::multiply(&a, &b).unwrap().get_vector(), vec![0.5, 8.0]);
        assert_eq!(Value::negative(&a).unwrap().get_vector(), vec![-1.0, -2.0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = Value::add(&Value::from(vec![1.0]), &Value::from(vec![1.0, 2.0])).unwrap_err();
        assert_eq!(err.code(), "VECTOR_DIMENSION_MISMATCH");
    }

    #[test]
    fn test_bytes_round_trip() {
        let v = vec![1.0f32, -2.5, 1e-3];
        assert_eq!(floats_from_bytes(&floats_to_bytes(&v)).unwrap(), v);
        assert!(floats_from_bytes(&[0, 1, 2]).is_err());
    }
}
