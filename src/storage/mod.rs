// Storage module - pages, buffer pool, record files, out-of-line payloads, WAL

pub mod buffer_pool;
pub mod lob;
pub mod page;
pub mod page_manager;
pub mod record_file;
pub mod wal;

pub use buffer_pool::BufferPoolStats;
pub use lob::{LobDescriptor, LobFile};
pub use page_manager::PageManager;
pub use record_file::{RecordFileHandler, RecordStore, RecordVisitor};
pub use wal::{LogEntry, Operation, RecordLog};
