// Table module - record codec, index maintenance, scanners, recovery replay

pub mod codec;
pub mod recovery;
pub mod scanner;
#[allow(clippy::module_inception)]
pub mod table;

pub use codec::{FieldView, RecordCodec};
pub use recovery::{RecoveryStats, recover_table};
pub use scanner::{Chunk, ChunkScanner, RecordScanner};
pub use table::Table;
