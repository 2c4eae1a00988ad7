use std::collections::BTreeSet;
use std::path::Path;

use super::page::{Page, PageId};
use super::page_manager::PageManager;
use crate::core::{DatabaseError, Record, Rid};

/// Callback run on a record while its page is held; returns true when it
/// modified the record and the change must be written back
pub type RecordVisitor<'a> = dyn FnMut(&mut Record) -> Result<bool, DatabaseError> + 'a;

/// Storage of fixed-size records addressed by RID
pub trait RecordStore {
    fn insert_record(&mut self, data: &[u8]) -> Result<Rid, DatabaseError>;

    /// Places a record at a known RID; `RecordExists` when the slot is taken
    fn recover_insert_record(&mut self, rid: Rid, data: &[u8]) -> Result<(), DatabaseError>;

    fn get_record(&self, rid: Rid) -> Result<Record, DatabaseError>;

    fn delete_record(&mut self, rid: Rid) -> Result<(), DatabaseError>;

    /// Every live record in RID order
    fn scan(&self) -> Result<Vec<Record>, DatabaseError>;

    fn visit_record(&self, rid: Rid, visitor: &mut RecordVisitor<'_>) -> Result<(), DatabaseError>;

    fn sync(&mut self) -> Result<(), DatabaseError>;

    /// Drops cached pages and removes the store's files
    fn destroy(self: Box<Self>) -> Result<(), DatabaseError>;
}

/// Paged record file of one table
pub struct RecordFileHandler {
    table_id: u32,
    page_manager: PageManager,
    page_count: u32,
    /// Pages that may still take a record
    free_pages: BTreeSet<u32>,
}

impl RecordFileHandler {
    /// Opens the table's pages under `dir`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(dir: P, table_id: u32, buffer_pool_pages: usize) -> Result<Self, DatabaseError> {
        let page_manager = PageManager::new(dir, buffer_pool_pages)?;
        let page_count = page_manager.get_page_count(table_id)?;
        let free_pages = (0..page_count).collect();
        tracing::debug!(table_id, page_count, "opened record file");
        Ok(Self {
            table_id,
            page_manager,
            page_count,
            free_pages,
        })
    }

    #[must_use]
    pub const fn page_count(&self) -> u32 {
        self.page_count
    }

    const fn page_id(&self, page_num: u32) -> PageId {
        PageId::new(self.table_id, page_num)
    }

    fn append_page(&mut self) -> Result<u32, DatabaseError> {
        let page_num = self.page_count;
        self.page_manager.create_page(self.table_id, page_num)?;
        self.page_count += 1;
        self.free_pages.insert(page_num);
        Ok(page_num)
    }

    fn check_rid(&self, rid: Rid) -> Result<(), DatabaseError> {
        if rid.page_num < self.page_count {
            Ok(())
        } else {
            Err(DatabaseError::RecordNotFound(rid))
        }
    }
}

impl RecordStore for RecordFileHandler {
    fn insert_record(&mut self, data: &[u8]) -> Result<Rid, DatabaseError> {
        if data.len() > Page::max_record_size() {
            return Err(DatabaseError::RecordTooLarge(data.len()));
        }

        let candidates: Vec<u32> = self.free_pages.iter().copied().collect();
        for page_num in candidates {
            let mut guard = self.page_manager.get_page_mut(self.page_id(page_num))?;
            if guard.page()?.has_room(data.len()) {
                let slot = guard.get_mut(|page| page.insert_record(data))?;
                return Ok(Rid::new(page_num, slot));
            }
            drop(guard);
            self.free_pages.remove(&page_num);
        }

        let page_num = self.append_page()?;
        let slot = self
            .page_manager
            .get_page_mut(self.page_id(page_num))?
            .get_mut(|page| page.insert_record(data))?;
        Ok(Rid::new(page_num, slot))
    }

    fn recover_insert_record(&mut self, rid: Rid, data: &[u8]) -> Result<(), DatabaseError> {
        while self.page_count <= rid.page_num {
            self.append_page()?;
        }
        self.page_manager
            .get_page_mut(self.page_id(rid.page_num))?
            .get_mut(|page| page.insert_record_at(rid.slot_num, data))
    }

    fn get_record(&self, rid: Rid) -> Result<Record, DatabaseError> {
        self.check_rid(rid)?;
        self.page_manager.read_page(self.page_id(rid.page_num), |page| {
            Ok(Record::new(rid, page.get_record(rid.slot_num)?.to_vec()))
        })
    }

    fn delete_record(&mut self, rid: Rid) -> Result<(), DatabaseError> {
        self.check_rid(rid)?;
        self.page_manager
            .get_page_mut(self.page_id(rid.page_num))?
            .get_mut(|page| page.delete_record(rid.slot_num))?;
        self.free_pages.insert(rid.page_num);
        Ok(())
    }

    fn scan(&self) -> Result<Vec<Record>, DatabaseError> {
        let mut records = Vec::new();
        for page_num in 0..self.page_count {
            self.page_manager.read_page(self.page_id(page_num), |page| {
                records.extend(
                    page.records()
                        .map(|(slot, data)| Record::new(Rid::new(page_num, slot), data.to_vec())),
                );
                Ok(())
            })?;
        }
        Ok(records)
    }

    fn visit_record(&self, rid: Rid, visitor: &mut RecordVisitor<'_>) -> Result<(), DatabaseError> {
        self.check_rid(rid)?;
        let page_id = self.page_id(rid.page_num);
        let _latch = self.page_manager.latch_page(page_id)?;
        let mut record = self.get_record(rid)?;
        if visitor(&mut record)? {
            self.page_manager.get_page_mut(page_id)?.get_mut(|page| {
                let target = page.record_mut(rid.slot_num)?;
                if target.len() != record.data.len() {
                    return Err(DatabaseError::InvalidArgument(format!(
                        "visitor resized record {rid} from {} to {} bytes",
                        target.len(),
                        record.data.len()
                    )));
                }
                target.copy_from_slice(&record.data);
                Ok(())
            })?;
        }
        Ok(())
    }

    fn sync(&mut self) -> Result<(), DatabaseError> {
        let flushed = self.page_manager.checkpoint()?;
        let stats = self.page_manager.get_stats()?;
        tracing::debug!(
            table_id = self.table_id,
            flushed,
            cached = stats.size,
            hit_rate = stats.hit_rate(),
            "synced record file"
        );
        Ok(())
    }

    fn destroy(self: Box<Self>) -> Result<(), DatabaseError> {
        self.page_manager.delete_table_pages(self.table_id)?;
        tracing::debug!(table_id = self.table_id, pages = self.page_count, "removed record file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_insert_get_delete() {
        let dir = TempDir::new().unwrap();
        let mut file = RecordFileHandler::open(dir.path(), 1, 16).unwrap();

        let rid = file.insert_record(b"abcd").unwrap();
        assert_eq!(rid, Rid::new(0, 0));
        assert_eq!(file.get_record(rid).unwrap().data, b"abcd");

        file.delete_record(rid).unwrap();
        assert_eq!(file.get_record(rid).unwrap_err().code(), "RECORD_NOT_EXIST");
        assert!(file.delete_record(Rid::new(9, 0)).is_err());
    }

    #[test]
    fn test_spills_to_new_pages() {
        let dir = TempDir::new().unwrap();
        let mut file = RecordFileHandler::open(dir.path(), 1, 4).unwrap();
        let record = [1u8; 1000];
        let rids: Vec<_> = (0..20).map(|_| file.insert_record(&record).unwrap()).collect();

        assert!(file.page_count() > 1);
        assert_eq!(file.scan().unwrap().len(), 20);
        assert!(rids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_too_large() {
        let dir = TempDir::new().unwrap();
        let mut file = RecordFileHandler::open(dir.path(), 1, 4).unwrap();
        let err = file.insert_record(&vec![0u8; 9000]).unwrap_err();
        assert_eq!(err.code(), "RECORD_TOO_LARGE");
    }

    #[test]
    fn test_recover_insert() {
        let dir = TempDir::new().unwrap();
        let mut file = RecordFileHandler::open(dir.path(), 1, 4).unwrap();
        let rid = Rid::new(2, 1);
        file.recover_insert_record(rid, b"late").unwrap();
        assert_eq!(file.page_count(), 3);
        assert_eq!(file.get_record(rid).unwrap().data, b"late");

        let err = file.recover_insert_record(rid, b"late").unwrap_err();
        assert_eq!(err.code(), "RECORD_EXIST");
    }

    #[test]
    fn test_visit_record() {
        let dir = TempDir::new().unwrap();
        let mut file = RecordFileHandler::open(dir.path(), 1, 4).unwrap();
        let rid = file.insert_record(b"aaaa").unwrap();

        file.visit_record(rid, &mut |record| {
            record.data[0] = b'z';
            Ok(true)
        })
        .unwrap();
        assert_eq!(file.get_record(rid).unwrap().data, b"zaaa");

        // an unmodified visit leaves the record alone
        file.visit_record(rid, &mut |record| {
            record.data[1] = b'q';
            Ok(false)
        })
        .unwrap();
        assert_eq!(file.get_record(rid).unwrap().data, b"zaaa");

        let err = file
            .visit_record(rid, &mut |_| Err(DatabaseError::InvalidArgument("stop".into())))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        // the page latch was released on the error path
        assert!(file.insert_record(b"bbbb").is_ok());
        file.visit_record(rid, &mut |_| Ok(false)).unwrap();
    }

    #[test]
    fn test_reopen() {
        let dir = TempDir::new().unwrap();
        let rid = {
            let mut file = RecordFileHandler::open(dir.path(), 3, 4).unwrap();
            let rid = file.insert_record(b"keep").unwrap();
            file.sync().unwrap();
            rid
        };
        let file = RecordFileHandler::open(dir.path(), 3, 4).unwrap();
        assert_eq!(file.get_record(rid).unwrap().data, b"keep");
    }
}
