//! The per-database table catalog: `<db>/index.db-index`.

use super::file::FileHandle;
use super::serde::{read_bounded_name, write_bounded_name};
use crate::error::{EngineError, Result};
use crate::limits::{COLUMN_MAX, TABLE_NAME_MAX_LENGTH};

const MAGIC: &[u8; 8] = b"index-db";
const MAGIC_SIZE: usize = 8;
const TABLE_SLOT_SIZE: usize = 1 + TABLE_NAME_MAX_LENGTH;
const TABLE_DATA_OFFSET: usize = MAGIC_SIZE + 1;
/// The index file has a fixed number of table name slots, same as a table's
/// fixed number of column slots.
const MAX_TABLES: usize = COLUMN_MAX;

/// The catalog of table names in a database directory.
pub struct IndexFile {
    file: FileHandle,
    num_tables: u8,
}

impl IndexFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            file: FileHandle::new(name),
            num_tables: 0,
        }
    }

    pub fn open(&mut self, create: bool) -> Result<()> {
        self.file.open(create)?;
        if create {
            self.file.write(MAGIC)?;
            self.file.write(&[0])?;
            self.file
                .write_byte_n(0, MAX_TABLES * TABLE_SLOT_SIZE)?;
            self.num_tables = 0;
        } else {
            let mut magic_buf = [0u8; MAGIC_SIZE];
            self.file.read(&mut magic_buf)?;
            if &magic_buf != MAGIC {
                return Err(EngineError::InvalidFile);
            }
            let mut num_buf = [0u8; 1];
            self.file.read(&mut num_buf)?;
            self.num_tables = num_buf[0];
        }
        Ok(())
    }

    pub fn seek_to_table_name_index(&mut self, index: usize) -> Result<()> {
        let pos = TABLE_DATA_OFFSET + index * TABLE_SLOT_SIZE;
        self.file.seek(pos as u64)
    }

    pub fn get_num_tables(&self) -> u8 {
        self.num_tables
    }

    /// Linear scan for a table name; returns its slot index if present.
    pub fn index_of_table_name(&mut self, table_name: &str) -> Result<Option<usize>> {
        for i in 0..self.num_tables as usize {
            if self.get_table_name(i)? == table_name {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    pub fn get_table_name(&mut self, index: usize) -> Result<String> {
        self.seek_to_table_name_index(index)?;
        read_bounded_name(&mut self.file, TABLE_NAME_MAX_LENGTH)
    }

    pub fn insert_table_name(&mut self, index: usize, table_name: &str) -> Result<()> {
        self.seek_to_table_name_index(index)?;
        write_bounded_name(&mut self.file, table_name, TABLE_NAME_MAX_LENGTH)
    }

    /// Remove the table at `i` by swapping in the last table name, then
    /// shrinking `num_tables`. Slot order is not preserved.
    pub fn remove(&mut self, i: usize) -> Result<()> {
        let num_tables = self.num_tables;
        if num_tables > 0 {
            let last = self.get_table_name((num_tables - 1) as usize)?;
            self.insert_table_name(i, &last)?;
        }
        self.update_num_tables(num_tables - 1)
    }

    pub fn update_num_tables(&mut self, new_num_tables: u8) -> Result<()> {
        self.file.seek(MAGIC_SIZE as u64)?;
        self.file.write(&[new_num_tables])?;
        self.num_tables = new_num_tables;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_closed()
    }

    pub fn close(&mut self) -> Result<()> {
        self.file.close()
    }

    pub fn file_name(&self) -> &str {
        self.file.name()
    }

    pub fn remove_file(&mut self) -> Result<()> {
        self.file.remove_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_then_insert_and_find() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.db-index");
        let mut index = IndexFile::new(path.to_str().unwrap());
        index.open(true).unwrap();

        index.insert_table_name(0, "users").unwrap();
        index.update_num_tables(1).unwrap();

        assert_eq!(index.index_of_table_name("users").unwrap(), Some(0));
        assert_eq!(index.index_of_table_name("missing").unwrap(), None);
    }

    #[test]
    fn remove_swaps_with_last() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.db-index");
        let mut index = IndexFile::new(path.to_str().unwrap());
        index.open(true).unwrap();

        index.insert_table_name(0, "a").unwrap();
        index.insert_table_name(1, "b").unwrap();
        index.insert_table_name(2, "c").unwrap();
        index.update_num_tables(3).unwrap();

        index.remove(0).unwrap();

        assert_eq!(index.get_num_tables(), 2);
        assert_eq!(index.get_table_name(0).unwrap(), "c");
        assert_eq!(index.get_table_name(1).unwrap(), "b");
    }

    #[test]
    fn reopen_reads_back_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.db-index");
        {
            let mut index = IndexFile::new(path.to_str().unwrap());
            index.open(true).unwrap();
            index.insert_table_name(0, "users").unwrap();
            index.update_num_tables(1).unwrap();
        }

        let mut index = IndexFile::new(path.to_str().unwrap());
        index.open(false).unwrap();
        assert_eq!(index.get_num_tables(), 1);
        assert_eq!(index.get_table_name(0).unwrap(), "users");
    }
}
