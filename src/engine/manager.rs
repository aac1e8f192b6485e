//! The top-level dispatcher: tracks the active database and routes each
//! parsed statement to it.

use super::database::Database;
use crate::error::{EngineError, Result};
use crate::parser::{Statement, StatementKind};
use crate::types::Column;
use crate::value::Value;
use std::path::PathBuf;
use tracing::{debug, info};

/// The outcome of executing one statement, in a form the front end can
/// render without knowing the storage layer.
#[derive(Debug)]
pub enum ExecutionResult {
    DatabaseCreated(String),
    DatabaseDropped(String),
    DatabaseInUse(String),
    TableCreated(String),
    TableDropped(String),
    TableAltered(String),
    Inserted(usize),
    Updated(usize),
    Deleted(usize),
    Selected {
        columns: Vec<Column>,
        rows: Vec<Vec<Value>>,
    },
    TransactionStarted,
    TransactionCommitted,
}

/// Owns the currently active database, if any, and carries out statements
/// against it.
pub struct Manager {
    data_dir: PathBuf,
    current: Option<Database>,
    allow_drop_database: bool,
}

impl Manager {
    pub fn new(data_dir: impl Into<PathBuf>, allow_drop_database: bool) -> Self {
        Self {
            data_dir: data_dir.into(),
            current: None,
            allow_drop_database,
        }
    }

    pub fn current_database_name(&self) -> Option<&str> {
        self.current.as_ref().map(Database::name)
    }

    fn database_path(&self, name: &str) -> String {
        self.data_dir.join(name).to_string_lossy().into_owned()
    }

    fn active(&mut self) -> Result<&mut Database> {
        self.current.as_mut().ok_or(EngineError::NoActiveDatabase)
    }

    pub fn execute(&mut self, statement: &Statement) -> Result<ExecutionResult> {
        debug!(kind = ?statement.kind, "executing statement");
        match &statement.kind {
            StatementKind::CreateDatabase { name } => {
                self.create_database(name)?;
                Ok(ExecutionResult::DatabaseCreated(name.clone()))
            }
            StatementKind::DropDatabase { name } => {
                self.drop_database(name)?;
                Ok(ExecutionResult::DatabaseDropped(name.clone()))
            }
            StatementKind::UseDatabase { name } => {
                self.use_database(name)?;
                Ok(ExecutionResult::DatabaseInUse(name.clone()))
            }
            StatementKind::CreateTable {
                table_name,
                columns,
            } => {
                self.active()?.create_table(table_name, columns.clone())?;
                Ok(ExecutionResult::TableCreated(table_name.clone()))
            }
            StatementKind::DropTable { table_name } => {
                self.active()?.remove_table(table_name)?;
                Ok(ExecutionResult::TableDropped(table_name.clone()))
            }
            StatementKind::Alter {
                table_name,
                new_column,
            } => {
                self.active()?.alter(table_name, new_column.clone())?;
                Ok(ExecutionResult::TableAltered(table_name.clone()))
            }
            StatementKind::Insert { table_name, values } => {
                self.active()?.insert(table_name, values.clone())?;
                Ok(ExecutionResult::Inserted(1))
            }
            StatementKind::Update {
                table_name,
                column_name,
                value,
                where_clause,
            } => {
                let modified =
                    self.active()?
                        .update(table_name, column_name, value, where_clause.as_ref())?;
                Ok(ExecutionResult::Updated(modified))
            }
            StatementKind::Delete {
                table_name,
                where_clause,
            } => {
                let deleted = self.active()?.delete(table_name, where_clause.as_ref())?;
                Ok(ExecutionResult::Deleted(deleted))
            }
            StatementKind::Select {
                table_name,
                projection,
                join,
                where_clause,
            } => {
                let (columns, rows) = self.active()?.select(
                    table_name,
                    projection,
                    join.as_ref(),
                    where_clause.as_ref(),
                )?;
                Ok(ExecutionResult::Selected { columns, rows })
            }
            StatementKind::BeginTransaction => {
                self.active()?.begin_transaction()?;
                Ok(ExecutionResult::TransactionStarted)
            }
            StatementKind::CommitTransaction => {
                self.active()?.commit_transaction()?;
                Ok(ExecutionResult::TransactionCommitted)
            }
        }
    }

    fn create_database(&mut self, name: &str) -> Result<()> {
        let mut db = Database::new(self.database_path(name));
        db.open(true)?;
        db.close()?;
        info!(database = name, "created database");
        Ok(())
    }

    fn drop_database(&mut self, name: &str) -> Result<()> {
        if !self.allow_drop_database {
            return Err(EngineError::DropDatabaseDisabled);
        }

        let path = self.database_path(name);
        let is_current = self.current_database_name() == Some(path.as_str());
        if is_current {
            self.current.take().unwrap().remove_database()?;
        } else {
            let mut db = Database::new(path);
            db.open(false)?;
            db.remove_database()?;
        }
        info!(database = name, "dropped database");
        Ok(())
    }

    fn use_database(&mut self, name: &str) -> Result<()> {
        if let Some(mut current) = self.current.take() {
            current.close()?;
        }
        let mut db = Database::new(self.database_path(name));
        db.open(false)?;
        self.current = Some(db);
        info!(database = name, "switched active database");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use tempfile::tempdir;

    fn exec(manager: &mut Manager, sql: &str) -> Result<ExecutionResult> {
        let statement = Parser::new(sql).parse().expect("parse");
        manager.execute(&statement)
    }

    #[test]
    fn create_use_create_table_insert_select() {
        let dir = tempdir().unwrap();
        let mut manager = Manager::new(dir.path(), true);

        exec(&mut manager, "CREATE DATABASE shop;").unwrap();
        exec(&mut manager, "USE shop;").unwrap();
        exec(&mut manager, "CREATE TABLE users (id INT, name VARCHAR(20));").unwrap();
        exec(&mut manager, "INSERT INTO users VALUES (1, 'alice');").unwrap();

        let result = exec(&mut manager, "SELECT * FROM users;").unwrap();
        match result {
            ExecutionResult::Selected { rows, .. } => assert_eq!(rows.len(), 1),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn statement_without_active_database_errors() {
        let dir = tempdir().unwrap();
        let mut manager = Manager::new(dir.path(), true);
        let result = exec(&mut manager, "CREATE TABLE users (id INT);");
        assert!(matches!(result, Err(EngineError::NoActiveDatabase)));
    }

    #[test]
    fn drop_database_disabled_by_default_flag() {
        let dir = tempdir().unwrap();
        let mut manager = Manager::new(dir.path(), false);
        exec(&mut manager, "CREATE DATABASE shop;").unwrap();
        let result = exec(&mut manager, "DROP DATABASE shop;");
        assert!(matches!(result, Err(EngineError::DropDatabaseDisabled)));
    }

    #[test]
    fn create_database_twice_is_already_exists() {
        let dir = tempdir().unwrap();
        let mut manager = Manager::new(dir.path(), true);
        exec(&mut manager, "CREATE DATABASE shop;").unwrap();
        let result = exec(&mut manager, "CREATE DATABASE shop;");
        assert!(matches!(result, Err(EngineError::AlreadyExists)));
    }
}
