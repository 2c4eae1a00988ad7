//! In-memory page cache with least-recently-used eviction.
//!
//! Every resident page sits in a frame that remembers whether it was
//! modified and when it was last touched. Eviction picks the frame with the
//! oldest tick; a dirty victim is handed back to the caller for write-back.

use std::collections::HashMap;

use super::page::{Page, PageId};

struct Frame {
    page: Page,
    dirty: bool,
    last_used: u64,
}

/// Buffer pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BufferPoolStats {
    pub size: usize,
    pub dirty_count: usize,
    pub hits: u64,
    pub misses: u64,
}

impl BufferPoolStats {
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 { 0.0 } else { self.hits as f64 / total as f64 }
    }
}

pub struct BufferPool {
    frames: HashMap<PageId, Frame>,
    capacity: usize,
    tick: u64,
    hits: u64,
    misses: u64,
}

impl BufferPool {
    /// Pool holding at most `capacity` pages (at least one)
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: HashMap::with_capacity(capacity),
            capacity: capacity.max(1),
            tick: 0,
            hits: 0,
            misses: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn touch(&mut self, page_id: PageId) -> Option<&mut Frame> {
        let tick = self.next_tick();
        match self.frames.get_mut(&page_id) {
            Some(frame) => {
                self.hits += 1;
                frame.last_used = tick;
                Some(frame)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    #[must_use]
    pub fn contains(&self, page_id: PageId) -> bool {
        self.frames.contains_key(&page_id)
    }

    pub fn get_page(&mut self, page_id: PageId) -> Option<&Page> {
        self.touch(page_id).map(|frame| &frame.page)
    }

    /// Mutable access marks the page dirty
    pub fn get_page_mut(&mut self, page_id: PageId) -> Option<&mut Page> {
        self.touch(page_id).map(|frame| {
            frame.dirty = true;
            &mut frame.page
        })
    }

    /// Caches a clean page. When the pool is full the least recently used
    /// frame is evicted; it is returned only if it still needs writing.
    pub fn insert_page(&mut self, page: Page) -> Option<Page> {
        let page_id = page.header.page_id;
        let evicted = if self.frames.len() >= self.capacity && !self.frames.contains_key(&page_id) {
            self.evict()
        } else {
            None
        };

        let last_used = self.next_tick();
        self.frames.insert(
            page_id,
            Frame {
                page,
                dirty: false,
                last_used,
            },
        );
        evicted
    }

    fn evict(&mut self) -> Option<Page> {
        let victim = self
            .frames
            .iter()
            .min_by_key(|(_, frame)| frame.last_used)
            .map(|(id, _)| *id)?;
        let frame = self.frames.remove(&victim)?;
        frame.dirty.then_some(frame.page)
    }

    /// Copies of every dirty page; all frames are clean afterwards
    pub fn take_dirty(&mut self) -> Vec<Page> {
        self.frames
            .values_mut()
            .filter(|frame| frame.dirty)
            .map(|frame| {
                frame.dirty = false;
                frame.page.clone()
            })
            .collect()
    }

    /// Drops every cached page of a table without writing it
    pub fn remove_table(&mut self, table_id: u32) {
        self.frames.retain(|id, _| id.table_id != table_id);
    }

    #[must_use]
    pub fn stats(&self) -> BufferPoolStats {
        BufferPoolStats {
            size: self.frames.len(),
            dirty_count: self.frames.values().filter(|f| f.dirty).count(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(table_id: u32, page_number: u32) -> Page {
        let mut page = Page::new(PageId::new(table_id, page_number));
        page.insert_record(&page_number.to_le_bytes()).unwrap();
        page
    }

    #[test]
    fn test_get_counts_hits_and_misses() {
        let mut pool = BufferPool::new(4);
        assert!(pool.insert_page(page(1, 0)).is_none());

        assert!(pool.get_page(PageId::new(1, 0)).is_some());
        assert!(pool.get_page(PageId::new(1, 9)).is_none());
        let stats = pool.stats();
        assert_eq!((stats.size, stats.hits, stats.misses), (1, 1, 1));
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mutable_access_marks_dirty() {
        let mut pool = BufferPool::new(4);
        pool.insert_page(page(1, 0));
        pool.get_page_mut(PageId::new(1, 0)).unwrap().insert_record(b"x").unwrap();
        assert_eq!(pool.stats().dirty_count, 1);

        let dirty = pool.take_dirty();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].records().count(), 2);
        assert_eq!(pool.stats().dirty_count, 0);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut pool = BufferPool::new(3);
        for i in 0..3 {
            pool.insert_page(page(1, i));
        }
        pool.get_page(PageId::new(1, 0));

        // page 1 is now the oldest
        assert!(pool.insert_page(page(1, 3)).is_none());
        assert!(pool.contains(PageId::new(1, 0)));
        assert!(!pool.contains(PageId::new(1, 1)));
        assert_eq!(pool.stats().size, 3);
    }

    #[test]
    fn test_dirty_victim_is_returned() {
        let mut pool = BufferPool::new(2);
        pool.insert_page(page(1, 0));
        pool.insert_page(page(1, 1));
        pool.get_page_mut(PageId::new(1, 0));
        pool.get_page(PageId::new(1, 1));

        let evicted = pool.insert_page(page(1, 2)).unwrap();
        assert_eq!(evicted.header.page_id, PageId::new(1, 0));
        assert_eq!(pool.stats().dirty_count, 0);
    }

    #[test]
    fn test_remove_table() {
        let mut pool = BufferPool::new(8);
        for i in 0..3 {
            pool.insert_page(page(1, i));
            pool.get_page_mut(PageId::new(1, i));
        }
        pool.insert_page(page(2, 0));

        pool.remove_table(1);
        assert_eq!(pool.stats().size, 1);
        assert_eq!(pool.stats().dirty_count, 0);
    }
}
