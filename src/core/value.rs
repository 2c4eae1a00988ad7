use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::attr_type::AttrType;
use super::data_type::{date, type_instance, vector};
use super::error::DatabaseError;
use super::record::Rid;

/// Size of the inline descriptor written for TEXT and VECTOR fields
pub const DESCRIPTOR_SIZE: usize = 16;

/// Width of the slot that marks a NULL field
pub const NULL_SLOT_SIZE: usize = 4;

/// Payload of a value. Constructors are the only way to pair a tag with a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum Datum {
    /// NULL, remembering the type it was resolved to (`Undefined` if none)
    Null(AttrType),
    Int(i32),
    Float(f32),
    Boolean(bool),
    Chars(Vec<u8>),
    /// `YYYYMMDD`
    Date(i32),
    Text(Vec<u8>),
    Vector(Vec<f32>),
}

impl Default for Datum {
    fn default() -> Self {
        Self::Null(AttrType::Undefined)
    }
}

/// Where a value was read from, when it is a view onto a stored record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub rid: Rid,
    pub table_name: String,
}

/// Attribute value.
///
/// Works together with `DataType` for arithmetic, comparison and casts.
/// Use the associated functions (`Value::add` and friends) rather than the
/// type behaviors directly: they resolve the result type and absorb NULLs.
/// A NULL does not take part in type checks, whatever type it carries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Value {
    datum: Datum,
    origin: Option<Origin>,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.datum == other.datum
    }
}

impl Value {
    pub(crate) const fn from_datum(datum: Datum) -> Self {
        Self { datum, origin: None }
    }

    pub(crate) const fn datum(&self) -> &Datum {
        &self.datum
    }

    /// NULL with undefined type; the type is resolved by the first cast
    #[must_use]
    pub const fn null() -> Self {
        Self::from_datum(Datum::Null(AttrType::Undefined))
    }

    #[must_use]
    pub const fn null_of(attr_type: AttrType) -> Self {
        Self::from_datum(Datum::Null(attr_type))
    }

    #[must_use]
    pub fn chars(bytes: &[u8]) -> Self {
        Self::from_datum(Datum::Chars(bytes.to_vec()))
    }

    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::from_datum(Datum::Text(text.as_bytes().to_vec()))
    }

    #[must_use]
    pub const fn text_owned(bytes: Vec<u8>) -> Self {
        Self::from_datum(Datum::Text(bytes))
    }

    /// Date from a `YYYYMMDD` integer, not validated
    #[must_use]
    pub const fn date(yyyymmdd: i32) -> Self {
        Self::from_datum(Datum::Date(yyyymmdd))
    }

    /// Date from `YYYY-MM-DD`
    pub fn from_date(text: &str) -> Result<Self, DatabaseError> {
        let mut value = Self::null();
        value.set_date_str(text)?;
        Ok(value)
    }

    /// Vector from `[1, 2.5, 3]`
    pub fn from_vector(text: &str) -> Result<Self, DatabaseError> {
        Ok(Self::from(vector::parse_vector(text)?))
    }

    /// Decodes a fixed-width field payload of a known type.
    /// CHAR payloads stop at the first terminator.
    pub fn from_raw(attr_type: AttrType, data: &[u8]) -> Result<Self, DatabaseError> {
        let too_short = || DatabaseError::InvalidArgument(format!("{} bytes are too short for {attr_type}", data.len()));
        let datum = match attr_type {
            AttrType::Ints | AttrType::Dates | AttrType::Floats => {
                let raw: [u8; 4] = data.get(..4).and_then(|b| b.try_into().ok()).ok_or_else(too_short)?;
                match attr_type {
                    AttrType::Ints => Datum::Int(i32::from_le_bytes(raw)),
                    AttrType::Dates => Datum::Date(i32::from_le_bytes(raw)),
                    _ => Datum::Float(f32::from_le_bytes(raw)),
                }
            }
            AttrType::Booleans => Datum::Boolean(*data.first().ok_or_else(too_short)? != 0),
            AttrType::Chars => {
                let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
                Datum::Chars(data[..end].to_vec())
            }
            AttrType::Texts => Datum::Text(data.to_vec()),
            AttrType::Vectors => Datum::Vector(vector::floats_from_bytes(data)?),
            AttrType::Undefined | AttrType::Nulls => Datum::Null(AttrType::Undefined),
        };
        Ok(Self::from_datum(datum))
    }

    // ----- type predicates -----

    /// Tag of this value; every NULL reports `Nulls`
    #[must_use]
    pub const fn attr_type(&self) -> AttrType {
        match &self.datum {
            Datum::Null(_) => AttrType::Nulls,
            Datum::Int(_) => AttrType::Ints,
            Datum::Float(_) => AttrType::Floats,
            Datum::Boolean(_) => AttrType::Booleans,
            Datum::Chars(_) => AttrType::Chars,
            Datum::Date(_) => AttrType::Dates,
            Datum::Text(_) => AttrType::Texts,
            Datum::Vector(_) => AttrType::Vectors,
        }
    }

    /// The type a NULL was resolved to; the tag itself for other values
    #[must_use]
    pub const fn resolved_type(&self) -> AttrType {
        match &self.datum {
            Datum::Null(t) => *t,
            _ => self.attr_type(),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self.datum, Datum::Null(_))
    }

    #[must_use]
    pub const fn is_int(&self) -> bool {
        matches!(self.datum, Datum::Int(_))
    }

    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self.datum, Datum::Float(_))
    }

    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        matches!(self.datum, Datum::Boolean(_))
    }

    #[must_use]
    pub const fn is_chars(&self) -> bool {
        matches!(self.datum, Datum::Chars(_))
    }

    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self.datum, Datum::Date(_))
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.datum, Datum::Text(_))
    }

    #[must_use]
    pub const fn is_vector(&self) -> bool {
        matches!(self.datum, Datum::Vector(_))
    }

    /// True for the variants that own a heap payload
    #[must_use]
    pub const fn owns_payload(&self) -> bool {
        matches!(self.datum, Datum::Chars(_) | Datum::Text(_) | Datum::Vector(_))
    }

    #[must_use]
    pub fn is_date_valid(&self) -> bool {
        match self.datum {
            Datum::Date(v) => date::is_valid_date(v),
            _ => false,
        }
    }

    /// Payload length: bytes for CHAR/TEXT, dimension x 4 for VECTOR
    #[must_use]
    pub fn length(&self) -> usize {
        match &self.datum {
            Datum::Boolean(_) => 1,
            Datum::Null(_) | Datum::Int(_) | Datum::Float(_) | Datum::Date(_) => 4,
            Datum::Chars(b) | Datum::Text(b) => b.len(),
            Datum::Vector(v) => v.len() * 4,
        }
    }

    /// Bytes this value occupies inside a record: CHAR includes its
    /// terminator, TEXT/VECTOR only their inline descriptor.
    #[must_use]
    pub fn data_length(&self) -> usize {
        match &self.datum {
            Datum::Chars(b) => b.len() + 1,
            Datum::Text(_) | Datum::Vector(_) => DESCRIPTOR_SIZE,
            Datum::Null(_) => NULL_SLOT_SIZE,
            _ => self.length(),
        }
    }

    /// Raw bytes of a CHAR/TEXT payload
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.datum {
            Datum::Chars(b) | Datum::Text(b) => Some(b),
            _ => None,
        }
    }

    // ----- provenance -----

    pub fn view_set_info(&mut self, rid: Rid, table_name: &str) {
        self.origin = Some(Origin {
            rid,
            table_name: table_name.to_string(),
        });
    }

    #[must_use]
    pub const fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    #[must_use]
    pub fn page_num(&self) -> Option<u32> {
        self.origin.as_ref().map(|o| o.rid.page_num)
    }

    #[must_use]
    pub fn slot_num(&self) -> Option<u16> {
        self.origin.as_ref().map(|o| o.rid.slot_num)
    }

    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        self.origin.as_ref().map(|o| o.table_name.as_str())
    }

    // ----- mutation -----

    fn replace(&mut self, datum: Datum) {
        self.datum = datum;
        self.origin = None;
    }

    /// Releases the payload and goes back to an undefined NULL
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Moves the value out, leaving an undefined NULL behind
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub fn set_int(&mut self, val: i32) {
        self.replace(Datum::Int(val));
    }

    pub fn set_float(&mut self, val: f32) {
        self.replace(Datum::Float(val));
    }

    pub fn set_boolean(&mut self, val: bool) {
        self.replace(Datum::Boolean(val));
    }

    /// Copies `s` into an owned CHAR payload
    pub fn set_string(&mut self, s: &str) {
        self.replace(Datum::Chars(s.as_bytes().to_vec()));
    }

    pub fn set_chars(&mut self, bytes: &[u8]) {
        self.replace(Datum::Chars(bytes.to_vec()));
    }

    /// Adopts `bytes` as the CHAR payload without copying
    pub fn set_chars_owned(&mut self, bytes: Vec<u8>) {
        self.replace(Datum::Chars(bytes));
    }

    pub fn set_text(&mut self, bytes: &[u8]) {
        self.replace(Datum::Text(bytes.to_vec()));
    }

    pub fn set_text_owned(&mut self, bytes: Vec<u8>) {
        self.replace(Datum::Text(bytes));
    }

    pub fn set_vector(&mut self, vector: &[f32]) {
        self.replace(Datum::Vector(vector.to_vec()));
    }

    pub fn set_vector_owned(&mut self, vector: Vec<f32>) {
        self.replace(Datum::Vector(vector));
    }

    /// Sets a `YYYYMMDD` date
    pub fn set_date(&mut self, yyyymmdd: i32) {
        self.replace(Datum::Date(yyyymmdd));
    }

    pub fn set_date_str(&mut self, text: &str) -> Result<(), DatabaseError> {
        let parsed = date::parse_date(text)?;
        self.replace(Datum::Date(parsed));
        Ok(())
    }

    /// NULL keeping the type this value was resolved to
    pub fn set_null(&mut self) {
        let resolved = self.resolved_type();
        self.replace(Datum::Null(resolved));
    }

    pub fn set_value(&mut self, other: &Self) {
        self.clone_from(other);
    }

    /// Parses `text` as `attr_type`; the whole text must be consumed
    pub fn set_value_from_str(&mut self, attr_type: AttrType, text: &str) -> Result<(), DatabaseError> {
        type_instance(attr_type)?.set_value_from_str(self, text)
    }

    // ----- coercing getters -----

    #[must_use]
    pub fn get_int(&self) -> i32 {
        match &self.datum {
            Datum::Int(v) | Datum::Date(v) => *v,
            Datum::Float(v) => *v as i32,
            Datum::Boolean(v) => i32::from(*v),
            Datum::Chars(b) | Datum::Text(b) => super::comparator::str_to_int(&String::from_utf8_lossy(b)),
            Datum::Null(_) | Datum::Vector(_) => 0,
        }
    }

    #[must_use]
    pub fn get_float(&self) -> f32 {
        match &self.datum {
            Datum::Int(v) | Datum::Date(v) => *v as f32,
            Datum::Float(v) => *v,
            Datum::Boolean(v) => f32::from(u8::from(*v)),
            Datum::Chars(b) | Datum::Text(b) => super::comparator::str_to_float(&String::from_utf8_lossy(b)),
            Datum::Null(_) | Datum::Vector(_) => 0.0,
        }
    }

    #[must_use]
    pub fn get_boolean(&self) -> bool {
        match &self.datum {
            Datum::Boolean(v) => *v,
            Datum::Int(v) | Datum::Date(v) => *v != 0,
            Datum::Float(v) => super::comparator::compare_float(*v, 0.0) != Ordering::Equal,
            Datum::Chars(b) | Datum::Text(b) => {
                let s = String::from_utf8_lossy(b);
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    true
                } else if s.eq_ignore_ascii_case("false") {
                    false
                } else {
                    super::comparator::compare_float(super::comparator::str_to_float(s), 0.0) != Ordering::Equal
                }
            }
            Datum::Vector(v) => !v.is_empty(),
            Datum::Null(_) => false,
        }
    }

    /// Canonical text form of the value
    #[must_use]
    pub fn get_string(&self) -> String {
        match &self.datum {
            Datum::Null(_) => "NULL".to_string(),
            _ => type_instance(self.attr_type()).map_or_else(|_| String::new(), |t| t.to_string(self)),
        }
    }

    /// Vector payload; CHAR/TEXT are parsed as a vector literal, anything
    /// else (or an unparsable literal) yields an empty vector
    #[must_use]
    pub fn get_vector(&self) -> Vec<f32> {
        match &self.datum {
            Datum::Vector(v) => v.clone(),
            Datum::Chars(b) | Datum::Text(b) => vector::parse_vector(&String::from_utf8_lossy(b)).unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Borrowed vector payload
    #[must_use]
    pub fn vector(&self) -> Option<&[f32]> {
        match &self.datum {
            Datum::Vector(v) => Some(v),
            _ => None,
        }
    }

    // ----- comparison -----

    /// `None` when the two values are incomparable (including any NULL)
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if self.is_null() || other.is_null() {
            return None;
        }
        let forward = type_instance(self.attr_type()).ok()?.compare(self, other);
        if forward.is_some() {
            return forward;
        }
        type_instance(other.attr_type())
            .ok()?
            .compare(other, self)
            .map(Ordering::reverse)
    }

    /// Total order for sorting: NULL first, incomparable values by tag
    #[must_use]
    pub fn compare_for_sort(&self, other: &Self) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self
                .compare(other)
                .unwrap_or_else(|| self.attr_type().cmp(&other.attr_type())),
        }
    }

    // ----- binary operations -----

    /// Result type of a binary arithmetic/min/max operation.
    /// NULL is not handled here; each operation absorbs it first.
    pub fn result_type(left: &Self, right: &Self) -> Result<AttrType, DatabaseError> {
        use AttrType::{Booleans, Chars, Dates, Floats, Ints, Vectors};
        let resolved = match (left.attr_type(), right.attr_type()) {
            (Ints, Ints | Booleans) | (Booleans, Ints) => Ints,
            (Ints | Booleans, Floats) | (Floats, Ints | Booleans | Floats) => Floats,
            (Chars, Chars) => Chars,
            (Dates, Dates) => Dates,
            (Vectors, Vectors) => Vectors,
            (l, r) => return Err(DatabaseError::ValueTypeMismatch { left: l, right: r }),
        };
        Ok(resolved)
    }

    pub fn add(left: &Self, right: &Self) -> Result<Self, DatabaseError> {
        if left.is_null() || right.is_null() {
            return Ok(Self::null());
        }
        let result_type = Self::result_type(left, right)?;
        type_instance(result_type)?.add(left, right)
    }

    pub fn subtract(left: &Self, right: &Self) -> Result<Self, DatabaseError> {
        if left.is_null() || right.is_null() {
            return Ok(Self::null());
        }
        let result_type = Self::result_type(left, right)?;
        type_instance(result_type)?.subtract(left, right)
    }

    pub fn multiply(left: &Self, right: &Self) -> Result<Self, DatabaseError> {
        if left.is_null() || right.is_null() {
            return Ok(Self::null());
        }
        let result_type = Self::result_type(left, right)?;
        type_instance(result_type)?.multiply(left, right)
    }

    /// Integer division is carried out in FLOAT
    pub fn divide(left: &Self, right: &Self) -> Result<Self, DatabaseError> {
        if left.is_null() || right.is_null() {
            return Ok(Self::null());
        }
        let mut result_type = Self::result_type(left, right)?;
        if result_type == AttrType::Ints {
            result_type = AttrType::Floats;
        }
        type_instance(result_type)?.divide(left, right)
    }

    pub fn negative(value: &Self) -> Result<Self, DatabaseError> {
        if value.is_null() {
            return Ok(Self::null());
        }
        type_instance(value.attr_type())?.negative(value)
    }

    /// NULL counts as absent: with one NULL side the other side wins
    pub fn max(left: &Self, right: &Self) -> Result<Self, DatabaseError> {
        if left.is_null() {
            return Ok(right.clone());
        }
        if right.is_null() {
            return Ok(left.clone());
        }
        let result_type = Self::result_type(left, right)?;
        type_instance(result_type)?.max(left, right)
    }

    pub fn min(left: &Self, right: &Self) -> Result<Self, DatabaseError> {
        if left.is_null() {
            return Ok(right.clone());
        }
        if right.is_null() {
            return Ok(left.clone());
        }
        let result_type = Self::result_type(left, right)?;
        type_instance(result_type)?.min(left, right)
    }

    /// A NULL always casts, becoming a NULL of the target type
    pub fn cast_to(value: &Self, to_type: AttrType) -> Result<Self, DatabaseError> {
        if value.is_null() {
            return Ok(Self::null_of(to_type));
        }
        if value.attr_type() == to_type {
            return Ok(value.clone());
        }
        type_instance(value.attr_type())?.cast_to(value, to_type)
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Self::from_datum(Datum::Int(val))
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Self::from_datum(Datum::Float(val))
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Self::from_datum(Datum::Boolean(val))
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Self::from_datum(Datum::Chars(val.as_bytes().to_vec()))
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Self::from_datum(Datum::Chars(val.into_bytes()))
    }
}

impl From<Vec<f32>> for Value {
    fn from(val: Vec<f32>) -> Self {
        Self::from_datum(Datum::Vector(val))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get_string())
    }
}
