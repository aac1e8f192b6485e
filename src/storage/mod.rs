//! On-disk storage: file handles, binary encoding, the table catalog, and
//! individual table files.

pub mod file;
pub mod index_file;
pub mod serde;
pub mod table_file;

pub use file::FileHandle;
pub use index_file::IndexFile;
pub use table_file::{QueryResult, TableFile};
