use serde::{Deserialize, Serialize};
use std::fmt;

/// Record identifier: page number + slot number within that page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rid {
    pub page_num: u32,
    pub slot_num: u16,
}

impl Rid {
    #[must_use]
    pub const fn new(page_num: u32, slot_num: u16) -> Self {
        Self { page_num, slot_num }
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page_num, self.slot_num)
    }
}

/// One row in its fixed on-disk layout
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub rid: Rid,
    pub data: Vec<u8>,
}

impl Record {
    #[must_use]
    pub const fn new(rid: Rid, data: Vec<u8>) -> Self {
        Self { rid, data }
    }

    /// A record that has not been written to a store yet
    #[must_use]
    pub fn from_data(data: Vec<u8>) -> Self {
        Self {
            rid: Rid::default(),
            data,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
