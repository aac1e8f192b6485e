//! Structural constants of the on-disk format.
//!
//! These are not soft limits: every offset in `storage` is derived from them,
//! and changing one changes the file layout.

/// Max bytes in a database name.
pub const DATABASE_MAX_NAME_SIZE: usize = 16;
/// Max bytes in a column name.
pub const COLUMN_NAME_MAX_LENGTH: usize = 16;
/// Max bytes in a table name.
pub const TABLE_NAME_MAX_LENGTH: usize = 16;
/// Max columns in a table.
pub const COLUMN_MAX: usize = 16;
/// Bytes reserved on disk for a single value, regardless of declared type size.
pub const MAX_TYPE_SIZE: usize = 64;
