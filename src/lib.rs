//! # rowdb
//!
//! An embedded, file-backed SQL engine for a single process. Each database is
//! a directory holding a fixed-layout index file plus one binary file per
//! table; there is no page cache, no WAL, and no concurrent-writer story
//! beyond the single-table lock-file transaction protocol in [`engine`].
//!
//! ## Layout
//!
//! - [`lexer`] / [`parser`] turn one statement's source text into a
//!   [`parser::Statement`].
//! - [`storage`] is the on-disk format: [`storage::IndexFile`] is a table
//!   catalog, [`storage::TableFile`] is a fixed-slot row array.
//! - [`engine`] ties storage to statements: [`engine::Database`] executes
//!   against one open database, [`engine::Manager`] tracks which database is
//!   active and dispatches parsed statements to it.
//! - [`repl`] is the line-buffered front end that drives a [`engine::Manager`]
//!   from a stream of `;`-terminated statements.
//!
//! ## Dialect
//!
//! Twenty-four keywords cover database/table DDL, INSERT/UPDATE/DELETE,
//! single-predicate SELECT with an optional two-table join, ALTER TABLE ADD
//! COLUMN, and single-table transactions. See [`lexer::Keyword`] for the
//! exact list.

pub mod config;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod limits;
pub mod parser;
pub mod repl;
pub mod storage;
pub mod types;
pub mod value;

pub use config::Config;
pub use engine::{Database, ExecutionResult, Manager};
pub use error::{EngineError, ParseError, Result};
pub use lexer::{Keyword, Lexer, Token, TokenKind};
pub use parser::{Parser, Statement, StatementKind};
pub use types::{Column, ColumnType};
pub use value::Value;
