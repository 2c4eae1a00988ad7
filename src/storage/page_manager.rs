use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::buffer_pool::{BufferPool, BufferPoolStats};
use super::page::{Page, PageId};
use crate::core::DatabaseError;

/// PageManager - disk I/O for pages behind a shared buffer pool
pub struct PageManager {
    data_dir: PathBuf,
    buffer_pool: Arc<Mutex<BufferPool>>,
    /// Pages currently held by a `PageLatch`
    latched: Mutex<HashSet<PageId>>,
}

impl PageManager {
    pub fn new<P: AsRef<Path>>(data_dir: P, buffer_pool_size: usize) -> Result<Self, DatabaseError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;

        Ok(Self {
            data_dir,
            buffer_pool: Arc::new(Mutex::new(BufferPool::new(buffer_pool_size))),
            latched: Mutex::new(HashSet::new()),
        })
    }

    fn table_dir(&self, table_id: u32) -> PathBuf {
        self.data_dir.join(format!("table_{table_id}"))
    }

    fn page_path(&self, page_id: PageId) -> PathBuf {
        self.table_dir(page_id.table_id)
            .join(format!("page_{:08}.dat", page_id.page_number))
    }

    /// A page that was never written reads back empty
    fn read_page_from_disk(&self, page_id: PageId) -> Result<Page, DatabaseError> {
        let path = self.page_path(page_id);
        if !path.exists() {
            return Ok(Page::new(page_id));
        }

        let mut file = File::open(&path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Page::from_bytes(&buffer)
    }

    fn write_page_to_disk(&self, page: &Page) -> Result<(), DatabaseError> {
        fs::create_dir_all(self.table_dir(page.header.page_id.table_id))?;
        let path = self.page_path(page.header.page_id);

        let bytes = page.to_bytes()?;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BufferPool>, DatabaseError> {
        self.buffer_pool
            .lock()
            .map_err(|_| DatabaseError::LockPoisoned("buffer pool"))
    }

    /// Brings a page into the pool, writing back whatever dirty page it displaces
    fn load(&self, pool: &mut BufferPool, page_id: PageId) -> Result<(), DatabaseError> {
        if pool.contains(page_id) {
            return Ok(());
        }
        let page = self.read_page_from_disk(page_id)?;
        if let Some(evicted) = pool.insert_page(page) {
            tracing::debug!(page = ?evicted.header.page_id, "writing back evicted page");
            self.write_page_to_disk(&evicted)?;
        }
        Ok(())
    }

    /// Get a copy of a page (from buffer pool or disk)
    pub fn get_page(&self, page_id: PageId) -> Result<Page, DatabaseError> {
        self.read_page(page_id, |page| Ok(page.clone()))
    }

    /// Runs `f` on the cached page without copying it
    pub fn read_page<F, R>(&self, page_id: PageId, f: F) -> Result<R, DatabaseError>
    where
        F: FnOnce(&Page) -> Result<R, DatabaseError>,
    {
        let mut pool = self.lock()?;
        self.load(&mut pool, page_id)?;
        match pool.get_page(page_id) {
            Some(page) => f(page),
            None => Err(missing_page()),
        }
    }

    /// Locks the pool with the page resident. The lock is held until the
    /// guard is dropped.
    pub fn get_page_mut(&self, page_id: PageId) -> Result<PageMutGuard<'_>, DatabaseError> {
        let mut pool = self.lock()?;
        self.load(&mut pool, page_id)?;
        Ok(PageMutGuard { page_id, pool })
    }

    /// Takes the latch of one page without touching the buffer pool lock.
    /// Fails instead of waiting when the page is already latched.
    pub fn latch_page(&self, page_id: PageId) -> Result<PageLatch<'_>, DatabaseError> {
        let mut latched = self
            .latched
            .lock()
            .map_err(|_| DatabaseError::LockPoisoned("page latches"))?;
        if !latched.insert(page_id) {
            return Err(DatabaseError::InvalidArgument(format!(
                "page {} of table {} is already latched",
                page_id.page_number, page_id.table_id
            )));
        }
        Ok(PageLatch { manager: self, page_id })
    }

    /// Flush all dirty pages to disk
    pub fn checkpoint(&self) -> Result<usize, DatabaseError> {
        let dirty_pages = self.lock()?.take_dirty();
        for page in &dirty_pages {
            self.write_page_to_disk(page)?;
        }
        tracing::debug!(pages = dirty_pages.len(), dir = %self.data_dir.display(), "checkpoint");
        Ok(dirty_pages.len())
    }

    /// Create an empty page on disk and cache it
    pub fn create_page(&self, table_id: u32, page_number: u32) -> Result<PageId, DatabaseError> {
        let page_id = PageId::new(table_id, page_number);
        let page = Page::new(page_id);
        self.write_page_to_disk(&page)?;

        let mut pool = self.lock()?;
        if let Some(evicted) = pool.insert_page(page) {
            self.write_page_to_disk(&evicted)?;
        }
        Ok(page_id)
    }

    /// Number of page files a table has on disk
    pub fn get_page_count(&self, table_id: u32) -> Result<u32, DatabaseError> {
        let table_dir = self.table_dir(table_id);
        if !table_dir.exists() {
            return Ok(0);
        }

        let mut count = 0;
        for entry in fs::read_dir(&table_dir)? {
            if entry?.path().extension().and_then(|s| s.to_str()) == Some("dat") {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Delete all pages for a table, cached or on disk
    pub fn delete_table_pages(&self, table_id: u32) -> Result<(), DatabaseError> {
        self.lock()?.remove_table(table_id);

        let table_dir = self.table_dir(table_id);
        if table_dir.exists() {
            fs::remove_dir_all(&table_dir)?;
        }
        Ok(())
    }

    pub fn get_stats(&self) -> Result<BufferPoolStats, DatabaseError> {
        Ok(self.lock()?.stats())
    }
}

fn missing_page() -> DatabaseError {
    DatabaseError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "Page not found in buffer pool",
    ))
}

/// Exclusive hold on one page across calls that lock the buffer pool
/// only briefly; released on drop
pub struct PageLatch<'a> {
    manager: &'a PageManager,
    page_id: PageId,
}

impl std::fmt::Debug for PageLatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageLatch").field("page_id", &self.page_id).finish_non_exhaustive()
    }
}

impl Drop for PageLatch<'_> {
    fn drop(&mut self) {
        if let Ok(mut latched) = self.manager.latched.lock() {
            latched.remove(&self.page_id);
        }
    }
}

/// Exclusive access to one resident page
pub struct PageMutGuard<'a> {
    page_id: PageId,
    pool: MutexGuard<'a, BufferPool>,
}

impl PageMutGuard<'_> {
    /// Mutable access; the page is marked dirty
    pub fn get_mut<F, R>(&mut self, f: F) -> Result<R, DatabaseError>
    where
        F: FnOnce(&mut Page) -> Result<R, DatabaseError>,
    {
        match self.pool.get_page_mut(self.page_id) {
            Some(page) => f(page),
            None => Err(missing_page()),
        }
    }

    pub fn page(&mut self) -> Result<&Page, DatabaseError> {
        self.pool.get_page(self.page_id).ok_or_else(missing_page)
    }
}
