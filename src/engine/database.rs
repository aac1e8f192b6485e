//! A single open database directory: its table catalog plus live table
//! handles, and the single-table transaction machinery.

use crate::error::{EngineError, Result};
use crate::parser::{Join, JoinType, Projection, WhereClause};
use crate::storage::{IndexFile, TableFile};
use crate::types::Column;
use crate::value::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// An open (or not-yet-opened) database directory.
pub struct Database {
    name: String,
    index: IndexFile,
    tables: HashMap<String, TableFile>,
    in_transaction: bool,
    abort_transaction: bool,
    locks: Vec<String>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let index = IndexFile::new(format!("{}/index.db-index", name));
        Self {
            name,
            index,
            tables: HashMap::new(),
            in_transaction: false,
            abort_transaction: false,
            locks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open an existing database, or create a new one (and its directory).
    pub fn open(&mut self, create: bool) -> Result<()> {
        if !self.index.is_closed() {
            return Err(EngineError::FileAlreadyOpened);
        }

        let dir_exists = Path::new(&self.name).exists();
        if !dir_exists {
            if create {
                fs::create_dir(&self.name).map_err(|_| EngineError::BadMkDir)?;
            } else {
                return Err(EngineError::DirStatError);
            }
        }

        let index_exists = Path::new(self.index.file_name()).exists();
        if create && index_exists {
            return Err(EngineError::AlreadyExists);
        }
        if !create && !index_exists {
            return Err(EngineError::Missing);
        }

        self.index.open(create)?;

        let num_tables = self.index.get_num_tables();
        for i in 0..num_tables as usize {
            let table_name = self.index.get_table_name(i)?;
            let path = format!("{}/{}.table", self.name, table_name);
            let mut table = TableFile::new(path);
            table.open(false)?;
            self.tables.insert(table_name, table);
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.index.close()
    }

    /// Close, then delete the index file, every table file, and the
    /// directory itself.
    pub fn remove_database(&mut self) -> Result<()> {
        self.close()?;
        self.index.remove_file()?;
        for (_, mut table) in std::mem::take(&mut self.tables) {
            table.remove_file()?;
        }
        fs::remove_dir(&self.name)?;
        Ok(())
    }

    pub fn create_table(&mut self, table_name: &str, columns: Vec<Column>) -> Result<()> {
        if self.index.index_of_table_name(table_name)?.is_some() {
            return Err(EngineError::AlreadyExists);
        }
        let path = format!("{}/{}.table", self.name, table_name);
        let mut table = TableFile::new(path);
        table.open(true)?;
        for column in columns {
            table.add_column(column)?;
        }
        self.tables.insert(table_name.to_string(), table);

        let num_tables = self.index.get_num_tables();
        self.index.insert_table_name(num_tables as usize, table_name)?;
        self.index.update_num_tables(num_tables + 1)
    }

    pub fn remove_table(&mut self, table_name: &str) -> Result<()> {
        let index = self
            .index
            .index_of_table_name(table_name)?
            .ok_or(EngineError::Missing)?;
        self.index.remove(index)?;
        if let Some(mut table) = self.tables.remove(table_name) {
            table.remove_file()?;
        }
        Ok(())
    }

    pub fn alter(&mut self, table_name: &str, new_column: Column) -> Result<()> {
        self.require_table(table_name)?;
        let table = self
            .tables
            .get_mut(table_name)
            .ok_or(EngineError::Missing)?;
        table.add_column(new_column)
    }

    pub fn insert(&mut self, table_name: &str, values: Vec<Value>) -> Result<()> {
        self.require_table(table_name)?;
        let table = self
            .tables
            .get_mut(table_name)
            .ok_or(EngineError::Missing)?;
        let num_rows = table.get_num_rows();
        table.insert(num_rows as usize, &values)?;
        table.update_num_rows(num_rows + 1)
    }

    pub fn delete(&mut self, table_name: &str, where_clause: Option<&WhereClause>) -> Result<usize> {
        self.require_table(table_name)?;
        let table = self
            .tables
            .get_mut(table_name)
            .ok_or(EngineError::Missing)?;
        table.delete_rows(where_clause)
    }

    pub fn update(
        &mut self,
        table_name: &str,
        column_name: &str,
        value: &Value,
        where_clause: Option<&WhereClause>,
    ) -> Result<usize> {
        self.require_table(table_name)?;

        let buffering = self.in_transaction;
        if buffering && !self.locks.iter().any(|t| t == table_name) {
            let lock_path = format!("{}/{}.lock", self.name, table_name);
            if Path::new(&lock_path).exists() {
                self.abort_transaction = true;
                return Err(EngineError::FileAlreadyOpened);
            }
            fs::File::create(&lock_path)?;
            self.locks.push(table_name.to_string());
        }

        let table = self
            .tables
            .get_mut(table_name)
            .ok_or(EngineError::Missing)?;
        table.update_rows(column_name, value, where_clause, buffering)
    }

    pub fn begin_transaction(&mut self) -> Result<()> {
        self.in_transaction = true;
        self.abort_transaction = false;
        self.locks.clear();
        Ok(())
    }

    /// Flush the buffered updates for every locked table, or discard them if
    /// a concurrent writer's lock file forced an abort.
    pub fn commit_transaction(&mut self) -> Result<()> {
        self.in_transaction = false;
        let outcome = if self.abort_transaction {
            Err(EngineError::FileAlreadyOpened)
        } else {
            Ok(())
        };

        let locks = std::mem::take(&mut self.locks);
        for table_name in locks {
            if let Some(table) = self.tables.get_mut(&table_name) {
                if outcome.is_ok() {
                    table.commit()?;
                } else {
                    table.clear_buffered_rows();
                }
            }
            let lock_path = format!("{}/{}.lock", self.name, table_name);
            let _ = fs::remove_file(lock_path);
        }

        self.abort_transaction = false;
        outcome
    }

    /// Run a `SELECT`, with or without a join.
    ///
    /// A joined select always returns both tables' full column sets: the
    /// projection list only narrows a single-table select.
    pub fn select(
        &mut self,
        table_name: &str,
        projection: &Projection,
        join: Option<&Join>,
        where_clause: Option<&WhereClause>,
    ) -> Result<(Vec<Column>, Vec<Vec<Value>>)> {
        self.require_table(table_name)?;

        match join {
            None => {
                let table = self
                    .tables
                    .get_mut(table_name)
                    .ok_or(EngineError::Missing)?;
                let result = table.query_rows(projection, where_clause)?;
                Ok((result.columns, result.rows))
            }
            Some(join) => self.select_joined(table_name, join),
        }
    }

    fn select_joined(
        &mut self,
        table_name: &str,
        join: &Join,
    ) -> Result<(Vec<Column>, Vec<Vec<Value>>)> {
        self.require_table(&join.joined_table)?;

        let left = self
            .tables
            .get_mut(table_name)
            .ok_or(EngineError::Missing)?;
        let left_rows = left.query_rows(&Projection::All, None)?.rows;
        let left_join_index = left
            .get_index_of_column_name(&join.primary_join_column)
            .ok_or(EngineError::Missing)?;
        let mut columns = left.columns().to_vec();

        let right = self
            .tables
            .get_mut(&join.joined_table)
            .ok_or(EngineError::Missing)?;
        let right_rows = right.query_rows(&Projection::All, None)?.rows;
        let right_join_index = right
            .get_index_of_column_name(&join.secondary_join_column)
            .ok_or(EngineError::Missing)?;
        columns.extend(right.columns().iter().cloned());

        let mut rows = Vec::new();
        for left_row in &left_rows {
            let mut left_matched = false;
            for right_row in &right_rows {
                if left_row[left_join_index].sql_eq(&right_row[right_join_index]) {
                    left_matched = true;
                    let mut row = left_row.clone();
                    row.extend(right_row.iter().cloned());
                    rows.push(row);
                }
            }
            if join.join_type == JoinType::LeftOuter && !left_matched {
                let mut row = left_row.clone();
                while row.len() != columns.len() {
                    row.push(Value::null());
                }
                rows.push(row);
            }
        }
        Ok((columns, rows))
    }

    fn require_table(&mut self, table_name: &str) -> Result<()> {
        self.index
            .index_of_table_name(table_name)?
            .map(|_| ())
            .ok_or(EngineError::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnType;
    use tempfile::tempdir;

    fn open_db(dir: &tempfile::TempDir) -> Database {
        let path = dir.path().join("shop").to_str().unwrap().to_string();
        let mut db = Database::new(path);
        db.open(true).unwrap();
        db
    }

    #[test]
    fn create_table_then_insert_and_select() {
        let dir = tempdir().unwrap();
        let mut db = open_db(&dir);
        db.create_table(
            "users",
            vec![
                Column::new("id", ColumnType::Int),
                Column::new("name", ColumnType::Varchar(20)),
            ],
        )
        .unwrap();
        db.insert(
            "users",
            vec![Value::from_int(1), Value::from_string("alice").unwrap()],
        )
        .unwrap();

        let (columns, rows) = db.select("users", &Projection::All, None, None).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn inner_join_matches_rows() {
        let dir = tempdir().unwrap();
        let mut db = open_db(&dir);
        db.create_table(
            "users",
            vec![Column::new("id", ColumnType::Int)],
        )
        .unwrap();
        db.create_table(
            "orders",
            vec![
                Column::new("id", ColumnType::Int),
                Column::new("user_id", ColumnType::Int),
            ],
        )
        .unwrap();
        db.insert("users", vec![Value::from_int(1)]).unwrap();
        db.insert("orders", vec![Value::from_int(100), Value::from_int(1)])
            .unwrap();

        let join = Join {
            join_type: JoinType::Inner,
            joined_table: "users".to_string(),
            primary_join_column: "user_id".to_string(),
            secondary_join_column: "id".to_string(),
        };
        let (columns, rows) = db
            .select("orders", &Projection::All, Some(&join), None)
            .unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn left_outer_join_pads_unmatched_rows_with_null() {
        let dir = tempdir().unwrap();
        let mut db = open_db(&dir);
        db.create_table("users", vec![Column::new("id", ColumnType::Int)])
            .unwrap();
        db.create_table(
            "orders",
            vec![
                Column::new("id", ColumnType::Int),
                Column::new("user_id", ColumnType::Int),
            ],
        )
        .unwrap();
        db.insert("orders", vec![Value::from_int(100), Value::from_int(99)])
            .unwrap();

        let join = Join {
            join_type: JoinType::LeftOuter,
            joined_table: "users".to_string(),
            primary_join_column: "user_id".to_string(),
            secondary_join_column: "id".to_string(),
        };
        let (columns, rows) = db
            .select("orders", &Projection::All, Some(&join), None)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), columns.len());
        assert!(rows[0].last().unwrap().is_null());
    }

    #[test]
    fn transaction_commits_buffered_update() {
        let dir = tempdir().unwrap();
        let mut db = open_db(&dir);
        db.create_table("users", vec![Column::new("id", ColumnType::Int)])
            .unwrap();
        db.insert("users", vec![Value::from_int(1)]).unwrap();

        db.begin_transaction().unwrap();
        db.update("users", "id", &Value::from_int(2), None).unwrap();
        db.commit_transaction().unwrap();

        let (_, rows) = db.select("users", &Projection::All, None, None).unwrap();
        assert!(matches!(rows[0][0], Value::Integer(2)));
    }

    #[test]
    fn transaction_aborts_when_lock_file_present() {
        let dir = tempdir().unwrap();
        let mut db = open_db(&dir);
        db.create_table("users", vec![Column::new("id", ColumnType::Int)])
            .unwrap();
        db.insert("users", vec![Value::from_int(1)]).unwrap();

        std::fs::write(format!("{}/users.lock", db.name()), b"").unwrap();

        db.begin_transaction().unwrap();
        let update_result = db.update("users", "id", &Value::from_int(2), None);
        assert!(matches!(update_result, Err(EngineError::FileAlreadyOpened)));

        let commit_result = db.commit_transaction();
        assert!(matches!(commit_result, Err(EngineError::FileAlreadyOpened)));

        let (_, rows) = db.select("users", &Projection::All, None, None).unwrap();
        assert!(matches!(rows[0][0], Value::Integer(1)));
    }
}
