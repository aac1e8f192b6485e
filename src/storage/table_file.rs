//! A single table's on-disk schema and row data: `<db>/<table>.table`.

use super::file::FileHandle;
use super::serde::{
    read_bounded_name, read_column_type, read_value, write_bounded_name, write_column_type,
    write_value,
};
use crate::error::{EngineError, Result};
use crate::limits::{COLUMN_MAX, COLUMN_NAME_MAX_LENGTH, MAX_TYPE_SIZE};
use crate::parser::WhereClause;
use crate::parser::Projection;
use crate::types::Column;
use crate::value::Value;

const MAGIC: &[u8; 5] = b"table";
const MAGIC_SIZE: usize = 5;
/// 1 name-length byte + name bytes + 1 declared-size byte + 1 discriminant byte.
const COLUMN_DATA_ELEMENT_SIZE: usize = 1 + COLUMN_NAME_MAX_LENGTH + 1 + 1;
const COLUMN_OFFSET: usize = MAGIC_SIZE + 1;
const VALUES_OFFSET: usize = COLUMN_OFFSET + COLUMN_MAX * COLUMN_DATA_ELEMENT_SIZE;
/// Every row slot reserves room for the max column count, regardless of how
/// many columns the table currently declares, so adding a column never
/// requires rewriting existing rows.
const ROW_SIZE: usize = COLUMN_MAX * MAX_TYPE_SIZE;

struct BufferedRow {
    row_index: usize,
    row: Vec<Value>,
}

/// A row set returned from a scan, paired with the schema it was read under.
pub struct QueryResult {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

/// An open table file: schema header plus a flat row array.
pub struct TableFile {
    file: FileHandle,
    num_columns: u8,
    num_rows: u8,
    columns: Vec<Column>,
    buffered_rows: Vec<BufferedRow>,
}

impl TableFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            file: FileHandle::new(name),
            num_columns: 0,
            num_rows: 0,
            columns: Vec::new(),
            buffered_rows: Vec::new(),
        }
    }

    pub fn open(&mut self, create: bool) -> Result<()> {
        self.file.open(create)?;
        if create {
            self.file.write(MAGIC)?;
            self.file.write(&[0])?;
            self.file
                .write_byte_n(0, COLUMN_MAX * COLUMN_DATA_ELEMENT_SIZE)?;
            self.file.write(&[0])?;
            self.num_columns = 0;
            self.num_rows = 0;
            self.columns.clear();
        } else {
            let mut magic_buf = [0u8; MAGIC_SIZE];
            self.file.read(&mut magic_buf)?;
            if &magic_buf != MAGIC {
                return Err(EngineError::InvalidFile);
            }
            let mut num_columns_buf = [0u8; 1];
            self.file.read(&mut num_columns_buf)?;
            self.num_columns = num_columns_buf[0];

            self.columns.clear();
            for _ in 0..self.num_columns {
                let name = read_bounded_name(&mut self.file, COLUMN_NAME_MAX_LENGTH)?;
                let ty = read_column_type(&mut self.file)?;
                self.columns.push(Column::new(name, ty));
            }

            self.file.seek(VALUES_OFFSET as u64)?;
            let mut num_rows_buf = [0u8; 1];
            self.file.read(&mut num_rows_buf)?;
            self.num_rows = num_rows_buf[0];
        }
        Ok(())
    }

    fn seek_to_column_index(&mut self, index: usize) -> Result<()> {
        let pos = COLUMN_OFFSET + index * COLUMN_DATA_ELEMENT_SIZE;
        self.file.seek(pos as u64)
    }

    fn update_num_columns(&mut self, new_num_columns: u8) -> Result<()> {
        self.file.seek(MAGIC_SIZE as u64)?;
        self.file.write(&[new_num_columns])?;
        self.num_columns = new_num_columns;
        Ok(())
    }

    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.num_columns as usize >= COLUMN_MAX {
            return Err(EngineError::LimitReached);
        }
        self.seek_to_column_index(self.num_columns as usize)?;
        write_bounded_name(&mut self.file, &column.name, COLUMN_NAME_MAX_LENGTH)?;
        write_column_type(&mut self.file, column.ty)?;
        self.columns.push(column);
        self.update_num_columns(self.num_columns + 1)
    }

    fn seek_to_value_index(&mut self, index: usize) -> Result<()> {
        let pos = VALUES_OFFSET + 1 + index * ROW_SIZE;
        self.file.seek(pos as u64)
    }

    pub fn update_num_rows(&mut self, new_num_rows: u8) -> Result<()> {
        self.file.seek(VALUES_OFFSET as u64)?;
        self.file.write(&[new_num_rows])?;
        self.num_rows = new_num_rows;
        Ok(())
    }

    pub fn get_num_rows(&self) -> u8 {
        self.num_rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn get_index_of_column_name(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Write `row` at `index`, zero-padding any unused column slots.
    pub fn insert(&mut self, index: usize, row: &[Value]) -> Result<()> {
        self.seek_to_value_index(index)?;
        for value in row {
            write_value(&mut self.file, value)?;
        }
        self.file
            .write_byte_n(0, (COLUMN_MAX - row.len()) * MAX_TYPE_SIZE)
    }

    pub fn get_row(&mut self, index: usize) -> Result<Vec<Value>> {
        self.seek_to_value_index(index)?;
        let mut row = Vec::with_capacity(self.columns.len());
        for column in self.columns.clone() {
            row.push(read_value(&mut self.file, column.ty)?);
        }
        Ok(row)
    }

    /// Remove the row at `index` by swapping in the last row, then
    /// shrinking `num_rows`. Row order is not preserved.
    pub fn remove_row(&mut self, index: usize) -> Result<()> {
        if self.num_rows != 0 {
            let last = self.get_row((self.num_rows - 1) as usize)?;
            self.insert(index, &last)?;
            self.update_num_rows(self.num_rows - 1)?;
        }
        Ok(())
    }

    fn where_column_index(&self, where_clause: Option<&WhereClause>) -> Option<usize> {
        where_clause.and_then(|w| self.get_index_of_column_name(&w.column_name))
    }

    fn row_matches(
        &self,
        row: &[Value],
        where_clause: Option<&WhereClause>,
        where_index: Option<usize>,
    ) -> bool {
        match (where_clause, where_index) {
            (Some(w), Some(idx)) => w.matches(&row[idx]),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    /// Scan the table, applying `where_clause` and the requested projection.
    pub fn query_rows(
        &mut self,
        projection: &Projection,
        where_clause: Option<&WhereClause>,
    ) -> Result<QueryResult> {
        let column_indices: Option<Vec<usize>> = match projection {
            Projection::All => None,
            Projection::Columns(names) => Some(
                names
                    .iter()
                    .map(|n| self.get_index_of_column_name(n).ok_or(EngineError::Missing))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };
        let columns = match &column_indices {
            None => self.columns.clone(),
            Some(indices) => indices.iter().map(|&i| self.columns[i].clone()).collect(),
        };

        let where_index = self.where_column_index(where_clause);
        let mut rows = Vec::new();
        for row_index in 0..self.num_rows as usize {
            let row = self.get_row(row_index)?;
            if self.row_matches(&row, where_clause, where_index) {
                rows.push(match &column_indices {
                    None => row,
                    Some(indices) => indices.iter().map(|&i| row[i].clone()).collect(),
                });
            }
        }
        Ok(QueryResult { columns, rows })
    }

    /// Apply `SET <column> = <value> [WHERE ...]`, buffering writes when
    /// `in_transaction` is set rather than touching the file immediately.
    pub fn update_rows(
        &mut self,
        column_name: &str,
        new_value: &Value,
        where_clause: Option<&WhereClause>,
        in_transaction: bool,
    ) -> Result<usize> {
        let update_index = self.get_index_of_column_name(column_name);
        let where_index = self.where_column_index(where_clause);
        let mut num_modified = 0;
        for row_index in 0..self.num_rows as usize {
            let mut row = self.get_row(row_index)?;
            if self.row_matches(&row, where_clause, where_index) {
                if let Some(idx) = update_index {
                    row[idx] = new_value.clone();
                }
                if in_transaction {
                    self.buffered_rows.push(BufferedRow { row_index, row });
                } else {
                    self.insert(row_index, &row)?;
                }
                num_modified += 1;
            }
        }
        Ok(num_modified)
    }

    pub fn delete_rows(&mut self, where_clause: Option<&WhereClause>) -> Result<usize> {
        let where_index = self.where_column_index(where_clause);
        let mut num_deleted = 0;
        let mut row_index = 0usize;
        while row_index < self.num_rows as usize {
            let row = self.get_row(row_index)?;
            if self.row_matches(&row, where_clause, where_index) {
                self.remove_row(row_index)?;
                num_deleted += 1;
            } else {
                row_index += 1;
            }
        }
        Ok(num_deleted)
    }

    /// Flush buffered updates from a committed transaction to disk.
    pub fn commit(&mut self) -> Result<()> {
        let buffered = std::mem::take(&mut self.buffered_rows);
        for buffered_row in buffered {
            self.insert(buffered_row.row_index, &buffered_row.row)?;
        }
        self.file.flush()
    }

    pub fn clear_buffered_rows(&mut self) {
        self.buffered_rows.clear();
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
