use serde::{Deserialize, Serialize};

use crate::core::{DatabaseError, Rid};

/// Page size (8 KB)
pub const PAGE_SIZE: usize = 8192;

/// Bytes reserved at the start of a page for the header
pub const PAGE_HEADER_SIZE: usize = 24;

const SLOT_SIZE: usize = std::mem::size_of::<Slot>();

/// Page ID - uniquely identifies a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId {
    pub table_id: u32,
    pub page_number: u32,
}

impl PageId {
    #[must_use]
    pub const fn new(table_id: u32, page_number: u32) -> Self {
        Self { table_id, page_number }
    }
}

/// Slot - points to a record within a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// Offset from start of page data
    pub offset: u16,
    /// Length of the record in bytes
    pub length: u16,
    /// Bytes reserved at `offset`; never shrinks when the slot is reused
    pub capacity: u16,
    /// Is this slot used (false = deleted, space kept for reuse)
    pub is_used: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageHeader {
    pub page_id: PageId,
    /// Number of slots (including deleted)
    pub slot_count: u16,
    /// Lower bound of free space (slot directory grows upward)
    pub lower: u16,
    /// Upper bound of free space (records grow downward)
    pub upper: u16,
}

impl PageHeader {
    #[must_use]
    pub const fn new(page_id: PageId) -> Self {
        Self {
            page_id,
            slot_count: 0,
            lower: PAGE_HEADER_SIZE as u16,
            upper: PAGE_SIZE as u16,
        }
    }
}

/// Page - 8 KB unit of storage holding raw record bytes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub header: PageHeader,
    pub slots: Vec<Slot>,
    pub data: Vec<u8>,
}

impl Page {
    #[must_use]
    pub fn new(page_id: PageId) -> Self {
        Self {
            header: PageHeader::new(page_id),
            slots: Vec::new(),
            data: vec![0u8; PAGE_SIZE],
        }
    }

    /// Largest record a single page can hold
    #[must_use]
    pub const fn max_record_size() -> usize {
        PAGE_SIZE - PAGE_HEADER_SIZE - SLOT_SIZE
    }

    #[must_use]
    pub const fn free_space(&self) -> u16 {
        self.header.upper.saturating_sub(self.header.lower)
    }

    #[must_use]
    pub const fn can_fit(&self, record_size: usize) -> bool {
        self.free_space() as usize >= record_size + SLOT_SIZE
    }

    fn reusable_slot(&self, record_size: usize) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| !s.is_used && s.capacity as usize >= record_size)
    }

    /// True if `insert_record` would succeed for a record of this size
    #[must_use]
    pub fn has_room(&self, record_size: usize) -> bool {
        self.reusable_slot(record_size).is_some() || self.can_fit(record_size)
    }

    fn rid(&self, slot: u16) -> Rid {
        Rid::new(self.header.page_id.page_number, slot)
    }

    /// Carves `size` bytes from the free area and returns their offset
    fn allocate(&mut self, size: usize) -> Result<u16, DatabaseError> {
        if !self.can_fit(size) {
            return Err(DatabaseError::RecordTooLarge(size));
        }
        let offset = self.header.upper - size as u16;
        self.header.upper = offset;
        self.header.lower += SLOT_SIZE as u16;
        Ok(offset)
    }

    fn write(&mut self, slot_index: usize, data: &[u8]) {
        let slot = &mut self.slots[slot_index];
        slot.is_used = true;
        slot.length = data.len() as u16;
        let offset = slot.offset as usize;
        self.data[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Insert a record, reusing a deleted slot when one is large enough
    pub fn insert_record(&mut self, data: &[u8]) -> Result<u16, DatabaseError> {
        let slot_index = match self.reusable_slot(data.len()) {
            Some(index) => index,
            None => {
                let offset = self.allocate(data.len())?;
                self.slots.push(Slot {
                    offset,
                    length: 0,
                    capacity: data.len() as u16,
                    is_used: false,
                });
                self.header.slot_count += 1;
                self.slots.len() - 1
            }
        };
        self.write(slot_index, data);
        Ok(slot_index as u16)
    }

    /// Insert a record at a fixed slot, as recovery does.
    /// Slots below `slot_index` that do not exist yet are created empty.
    pub fn insert_record_at(&mut self, slot_index: u16, data: &[u8]) -> Result<(), DatabaseError> {
        let index = slot_index as usize;
        if let Some(slot) = self.slots.get(index) {
            if slot.is_used {
                return Err(DatabaseError::RecordExists(self.rid(slot_index)));
            }
            if (slot.capacity as usize) < data.len() {
                return Err(DatabaseError::RecordTooLarge(data.len()));
            }
            self.write(index, data);
            return Ok(());
        }

        while self.slots.len() <= index {
            let offset = self.allocate(data.len())?;
            self.slots.push(Slot {
                offset,
                length: 0,
                capacity: data.len() as u16,
                is_used: false,
            });
            self.header.slot_count += 1;
        }
        self.write(index, data);
        Ok(())
    }

    fn used_slot(&self, slot_index: u16) -> Result<&Slot, DatabaseError> {
        self.slots
            .get(slot_index as usize)
            .filter(|s| s.is_used)
            .ok_or_else(|| DatabaseError::RecordNotFound(self.rid(slot_index)))
    }

    pub fn get_record(&self, slot_index: u16) -> Result<&[u8], DatabaseError> {
        let slot = self.used_slot(slot_index)?;
        let offset = slot.offset as usize;
        Ok(&self.data[offset..offset + slot.length as usize])
    }

    pub fn record_mut(&mut self, slot_index: u16) -> Result<&mut [u8], DatabaseError> {
        let slot = self.used_slot(slot_index)?;
        let (offset, length) = (slot.offset as usize, slot.length as usize);
        Ok(&mut self.data[offset..offset + length])
    }

    /// Mark a record as deleted; its space stays with the slot
    pub fn delete_record(&mut self, slot_index: u16) -> Result<(), DatabaseError> {
        self.used_slot(slot_index)?;
        self.slots[slot_index as usize].is_used = false;
        Ok(())
    }

    #[must_use]
    pub fn is_used(&self, slot_index: u16) -> bool {
        self.slots.get(slot_index as usize).is_some_and(|s| s.is_used)
    }

    /// Live records in slot order
    pub fn records(&self) -> impl Iterator<Item = (u16, &[u8])> {
        self.slots.iter().enumerate().filter(|(_, s)| s.is_used).map(|(i, s)| {
            let offset = s.offset as usize;
            (i as u16, &self.data[offset..offset + s.length as usize])
        })
    }

    /// Serialize page to bytes for disk storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, DatabaseError> {
        bincode::serialize(self).map_err(|e| DatabaseError::BinarySerialization(e.to_string()))
    }

    /// Deserialize page from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatabaseError> {
        bincode::deserialize(bytes).map_err(|e| DatabaseError::BinarySerialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_creation() {
        let page_id = PageId::new(1, 0);
        let page = Page::new(page_id);

        assert_eq!(page.header.page_id, page_id);
        assert_eq!(page.header.slot_count, 0);
        assert!(page.free_space() > 8000);
    }

    #[test]
    fn test_insert_and_get() {
        let mut page = Page::new(PageId::new(1, 0));
        let slot = page.insert_record(b"abcd").unwrap();

        assert_eq!(slot, 0);
        assert_eq!(page.get_record(slot).unwrap(), b"abcd");
    }

    #[test]
    fn test_delete_and_reuse() {
        let mut page = Page::new(PageId::new(1, 3));
        let first = page.insert_record(b"1111").unwrap();
        page.insert_record(b"2222").unwrap();

        page.delete_record(first).unwrap();
        let err = page.get_record(first).unwrap_err();
        assert!(matches!(err, DatabaseError::RecordNotFound(rid) if rid == Rid::new(3, 0)));
        assert!(page.delete_record(first).is_err());

        let reused = page.insert_record(b"3333").unwrap();
        assert_eq!(reused, first);
        assert_eq!(page.records().count(), 2);
    }

    #[test]
    fn test_reuse_keeps_capacity() {
        let mut page = Page::new(PageId::new(1, 0));
        let slot = page.insert_record(b"12345678").unwrap();
        page.insert_record(b"tail").unwrap();

        page.delete_record(slot).unwrap();
        assert_eq!(page.insert_record(b"ab").unwrap(), slot);
        assert_eq!(page.get_record(slot).unwrap(), b"ab");

        // the shorter tenant left the full eight bytes with the slot
        page.delete_record(slot).unwrap();
        let upper = page.header.upper;
        assert_eq!(page.insert_record(b"abcdefgh").unwrap(), slot);
        assert_eq!(page.header.upper, upper);
        assert_eq!(page.get_record(slot).unwrap(), b"abcdefgh");

        page.delete_record(slot).unwrap();
        page.insert_record_at(slot, b"1234567").unwrap();
        assert_eq!(page.get_record(slot).unwrap(), b"1234567");
        assert_eq!(page.slots[slot as usize].capacity, 8);
    }

    #[test]
    fn test_insert_at() {
        let mut page = Page::new(PageId::new(1, 0));
        page.insert_record_at(2, b"zz").unwrap();
        assert!(!page.is_used(0));
        assert!(!page.is_used(1));
        assert_eq!(page.get_record(2).unwrap(), b"zz");

        let err = page.insert_record_at(2, b"yy").unwrap_err();
        assert_eq!(err.code(), "RECORD_EXIST");

        page.insert_record_at(0, b"xx").unwrap();
        assert_eq!(page.records().map(|(s, _)| s).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_fill_page() {
        let mut page = Page::new(PageId::new(1, 0));
        let record = [7u8; 100];
        let mut count = 0;
        while page.has_room(record.len()) {
            page.insert_record(&record).unwrap();
            count += 1;
        }
        assert!(count > 70);
        assert_eq!(page.insert_record(&record).unwrap_err().code(), "RECORD_TOO_LARGE");
    }

    #[test]
    fn test_record_mut() {
        let mut page = Page::new(PageId::new(1, 0));
        let slot = page.insert_record(b"abc").unwrap();
        page.record_mut(slot).unwrap()[0] = b'x';
        assert_eq!(page.get_record(slot).unwrap(), b"xbc");
    }

    #[test]
    fn test_serialization() {
        let page_id = PageId::new(1, 0);
        let mut page = Page::new(page_id);
        page.insert_record(&42i32.to_le_bytes()).unwrap();

        let bytes = page.to_bytes().unwrap();
        let deserialized = Page::from_bytes(&bytes).unwrap();

        assert_eq!(deserialized.header.page_id, page_id);
        assert_eq!(deserialized.header.slot_count, 1);
        assert_eq!(deserialized.get_record(0).unwrap(), &42i32.to_le_bytes());
    }
}
