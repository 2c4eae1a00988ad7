use chrono::{Datelike, NaiveDate};
use std::cmp::Ordering;

use super::DataType;
use crate::core::attr_type::AttrType;
use crate::core::comparator::compare_int;
use crate::core::error::DatabaseError;
use crate::core::value::{Datum, Value};

/// Dates are held as `YYYYMMDD` integers so they order like integers
pub struct DateType;

/// Years a `YYYYMMDD` integer can carry and print back as `YYYY-MM-DD`
const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

pub(crate) fn is_valid_date(yyyymmdd: i32) -> bool {
    to_naive(yyyymmdd).is_some()
}

fn to_naive(yyyymmdd: i32) -> Option<NaiveDate> {
    if !YEARS.contains(&(yyyymmdd / 10000)) {
        return None;
    }
    let day = u32::try_from(yyyymmdd % 100).ok()?;
    let month = u32::try_from(yyyymmdd / 100 % 100).ok()?;
    NaiveDate::from_ymd_opt(yyyymmdd / 10000, month, day)
}

/// Parses `YYYY-MM-DD` into `YYYYMMDD`, rejecting impossible dates
pub(crate) fn parse_date(text: &str) -> Result<i32, DatabaseError> {
    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| DatabaseError::parse_failure(AttrType::Dates, text))?;
    if !YEARS.contains(&date.year()) {
        return Err(DatabaseError::parse_failure(AttrType::Dates, text));
    }
    let month = i32::try_from(date.month()).map_err(|_| DatabaseError::parse_failure(AttrType::Dates, text))?;
    let day = i32::try_from(date.day()).map_err(|_| DatabaseError::parse_failure(AttrType::Dates, text))?;
    Ok(date.year() * 10000 + month * 100 + day)
}

impl DataType for DateType {
    fn attr_type(&self) -> AttrType {
        AttrType::Dates
    }

    fn compare(&self, left: &Value, right: &Value) -> Option<Ordering> {
        let Datum::Date(l) = left.datum() else {
            return None;
        };
        match right.datum() {
            Datum::Date(r) => Some(compare_int(*l, *r)),
            Datum::Chars(r) => {
                let parsed = parse_date(&String::from_utf8_lossy(r)).ok()?;
                Some(compare_int(*l, parsed))
            }
            _ => None,
        }
    }

    fn set_value_from_str(&self, value: &mut Value, data: &str) -> Result<(), DatabaseError> {
        value.set_date(parse_date(data)?);
        Ok(())
    }

    fn to_string(&self, value: &Value) -> String {
        let v = value.get_int();
        format!("{:04}-{:02}-{:02}", v / 10000, v / 100 % 100, v % 100)
    }
}
