use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute type tag carried by every `Value` and `FieldMeta`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum AttrType {
    /// Type not resolved yet (a fresh `Value::null()`)
    #[default]
    Undefined,
    Chars,
    Ints,
    Floats,
    Dates,
    Vectors,
    Texts,
    Booleans,
    Nulls,
}

impl AttrType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Chars => "chars",
            Self::Ints => "ints",
            Self::Floats => "floats",
            Self::Dates => "dates",
            Self::Vectors => "vectors",
            Self::Texts => "texts",
            Self::Booleans => "booleans",
            Self::Nulls => "nulls",
        }
    }

    /// Parses a column type name as written in DDL
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "char" | "chars" => Some(Self::Chars),
            "int" | "ints" | "integer" => Some(Self::Ints),
            "float" | "floats" => Some(Self::Floats),
            "date" | "dates" => Some(Self::Dates),
            "vector" | "vectors" => Some(Self::Vectors),
            "text" | "texts" => Some(Self::Texts),
            "bool" | "boolean" | "booleans" => Some(Self::Booleans),
            _ => None,
        }
    }

    /// Types whose payload lives outside the fixed-size record
    #[must_use]
    pub const fn is_out_of_line(&self) -> bool {
        matches!(self, Self::Texts | Self::Vectors)
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
