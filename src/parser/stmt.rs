//! Statement and clause types produced by the parser.

use crate::error::Span;
use crate::lexer::Operator;
use crate::types::Column;
use crate::value::Value;

/// A single parsed statement together with its source span.
#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

impl Statement {
    pub fn new(kind: StatementKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The projection list of a SELECT. `*` is kept distinct from an explicit
/// column list rather than expanded during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    Columns(Vec<String>),
}

/// `INNER JOIN` or `LEFT OUTER JOIN`. There is no `None` variant: the
/// absence of a join is represented by `Select::join` being `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    LeftOuter,
}

/// A two-table join clause: `<join_type> JOIN <table> ON <a>.<col> = <b>.<col>`.
#[derive(Debug, Clone)]
pub struct Join {
    pub join_type: JoinType,
    pub joined_table: String,
    pub primary_join_column: String,
    pub secondary_join_column: String,
}

/// A `WHERE`/`ON` predicate: `<column> <op> <literal>`.
#[derive(Debug, Clone)]
pub struct WhereClause {
    pub column_name: String,
    pub op: Operator,
    pub value: Value,
}

impl WhereClause {
    pub fn matches(&self, actual: &Value) -> bool {
        match self.op {
            Operator::Equals => actual.sql_eq(&self.value),
            Operator::NotEqual => actual.sql_ne(&self.value),
            Operator::GreaterThan => actual.sql_gt(&self.value),
        }
    }
}

/// The twelve statement forms of the dialect.
#[derive(Debug, Clone)]
pub enum StatementKind {
    CreateDatabase {
        name: String,
    },
    DropDatabase {
        name: String,
    },
    UseDatabase {
        name: String,
    },
    CreateTable {
        table_name: String,
        columns: Vec<Column>,
    },
    DropTable {
        table_name: String,
    },
    Alter {
        table_name: String,
        new_column: Column,
    },
    Insert {
        table_name: String,
        values: Vec<Value>,
    },
    Update {
        table_name: String,
        column_name: String,
        value: Value,
        where_clause: Option<WhereClause>,
    },
    Delete {
        table_name: String,
        where_clause: Option<WhereClause>,
    },
    Select {
        table_name: String,
        projection: Projection,
        join: Option<Join>,
        where_clause: Option<WhereClause>,
    },
    BeginTransaction,
    CommitTransaction,
}
