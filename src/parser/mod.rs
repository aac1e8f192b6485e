//! Recursive-descent parser for the restricted SQL dialect.

pub mod stmt;

pub use stmt::{Join, JoinType, Projection, Statement, StatementKind, WhereClause};

use crate::error::{ParseError, ParseResult, Span};
use crate::lexer::{Keyword, Lexer, Operator, Token, TokenKind, TypeKeyword};
use crate::types::{Column, ColumnType};
use crate::value::Value;

/// Parses one statement at a time out of a token stream.
///
/// The REPL feeds this one `;`-terminated buffer per call; `parse` consumes
/// exactly one statement and requires end-of-input immediately after it.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    last_span: Span,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            last_span: Span::new(0, 0),
        }
    }

    pub fn parse(&mut self) -> ParseResult<Statement> {
        let stmt = self.parse_statement()?;
        let trailing = self.lexer.peek()?;
        if !trailing.is_eof() {
            return Err(ParseError::UnexpectedToken {
                found: trailing.kind.to_string(),
                span: trailing.span,
            });
        }
        Ok(stmt)
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        let start = self.lexer.peek()?.span;
        let first = self.lexer.peek()?.clone();
        let kind = match &first.kind {
            TokenKind::Keyword(Keyword::Create) => self.parse_create()?,
            TokenKind::Keyword(Keyword::Drop) => self.parse_drop()?,
            TokenKind::Keyword(Keyword::Use) => self.parse_use()?,
            TokenKind::Keyword(Keyword::Alter) => self.parse_alter()?,
            TokenKind::Keyword(Keyword::Insert) => self.parse_insert()?,
            TokenKind::Keyword(Keyword::Update) => self.parse_update()?,
            TokenKind::Keyword(Keyword::Delete) => self.parse_delete()?,
            TokenKind::Keyword(Keyword::Select) => self.parse_select()?,
            TokenKind::Keyword(Keyword::Begin) => self.parse_begin()?,
            TokenKind::Keyword(Keyword::Commit) => self.parse_commit()?,
            _ => {
                return Err(ParseError::UnexpectedToken {
                    found: first.kind.to_string(),
                    span: first.span,
                })
            }
        };
        self.expect_kind(&TokenKind::Semicolon)?;
        let end = self.last_span;
        Ok(Statement::new(kind, Span::new(start.start, end.end)))
    }

    // ---- small utilities ----------------------------------------------

    fn expect_keyword(&mut self, kw: Keyword) -> ParseResult<Token> {
        let tok = self.lexer.consume()?;
        if tok.is_keyword(kw) {
            self.last_span = tok.span;
            Ok(tok)
        } else {
            Err(ParseError::UnexpectedToken {
                found: tok.kind.to_string(),
                span: tok.span,
            })
        }
    }

    fn consume_keyword(&mut self, kw: Keyword) -> ParseResult<Option<Token>> {
        if self.lexer.peek()?.is_keyword(kw) {
            Ok(Some(self.lexer.consume()?))
        } else {
            Ok(None)
        }
    }

    fn expect_kind(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        let tok = self.lexer.expect(kind)?;
        self.last_span = tok.span;
        Ok(tok)
    }

    fn parse_identifier(&mut self) -> ParseResult<String> {
        let tok = self.lexer.consume()?;
        self.last_span = tok.span;
        match tok.kind {
            TokenKind::Identifier(name) => Ok(name),
            _ => Err(ParseError::UnexpectedToken {
                found: tok.kind.to_string(),
                span: tok.span,
            }),
        }
    }

    /// An identifier bound as a table/column name (or alias standing in for
    /// one), lower-cased at parse time. Database names are exempt and use
    /// [`Parser::parse_identifier`] directly.
    fn parse_lower_identifier(&mut self) -> ParseResult<String> {
        Ok(self.parse_identifier()?.to_ascii_lowercase())
    }

    fn parse_literal(&mut self) -> ParseResult<Value> {
        let tok = self.lexer.consume()?;
        self.last_span = tok.span;
        match tok.kind {
            TokenKind::Integer(n) => Ok(Value::from_int(n)),
            TokenKind::Float(f) => Ok(Value::from_float(f)),
            TokenKind::String(s) => Value::from_string(s).map_err(|_| ParseError::LimitReached {
                what: "string literal length".to_string(),
                span: tok.span,
            }),
            _ => Err(ParseError::UnexpectedToken {
                found: tok.kind.to_string(),
                span: tok.span,
            }),
        }
    }

    fn parse_operator(&mut self) -> ParseResult<Operator> {
        let tok = self.lexer.consume()?;
        self.last_span = tok.span;
        match tok.kind {
            TokenKind::Operator(op) => Ok(op),
            _ => Err(ParseError::UnexpectedToken {
                found: tok.kind.to_string(),
                span: tok.span,
            }),
        }
    }

    /// `WHERE <column> <op> <literal>`.
    fn parse_where(&mut self) -> ParseResult<WhereClause> {
        self.expect_keyword(Keyword::Where)?;
        let column_name = self.parse_lower_identifier()?;
        let op = self.parse_operator()?;
        let value = self.parse_literal()?;
        Ok(WhereClause {
            column_name,
            op,
            value,
        })
    }

    /// `[WHERE <column> <op> <literal>]`, consumed only if `WHERE` is
    /// present. Only `SELECT` brackets its `WHERE`; `UPDATE`/`DELETE`
    /// require one and call [`Parser::parse_where`] directly.
    fn parse_optional_where(&mut self) -> ParseResult<Option<WhereClause>> {
        if self.lexer.peek()?.is_keyword(Keyword::Where) {
            Ok(Some(self.parse_where()?))
        } else {
            Ok(None)
        }
    }

    fn parse_column_type(&mut self) -> ParseResult<ColumnType> {
        let tok = self.lexer.consume()?;
        self.last_span = tok.span;
        let ty_kw = match tok.kind {
            TokenKind::Type(ty) => ty,
            _ => {
                return Err(ParseError::UnexpectedToken {
                    found: tok.kind.to_string(),
                    span: tok.span,
                })
            }
        };
        match ty_kw {
            TypeKeyword::Int => Ok(ColumnType::Int),
            TypeKeyword::Float => Ok(ColumnType::Float),
            TypeKeyword::Varchar | TypeKeyword::Char => {
                self.expect_kind(&TokenKind::LeftParen)?;
                let size_tok = self.lexer.consume()?;
                self.last_span = size_tok.span;
                let size = match size_tok.kind {
                    TokenKind::Integer(n) if n > 0 && n <= u8::MAX as u32 => n as u8,
                    _ => {
                        return Err(ParseError::UnexpectedToken {
                            found: size_tok.kind.to_string(),
                            span: size_tok.span,
                        })
                    }
                };
                self.expect_kind(&TokenKind::RightParen)?;
                Ok(match ty_kw {
                    TypeKeyword::Varchar => ColumnType::Varchar(size),
                    _ => ColumnType::Char(size),
                })
            }
        }
    }

    fn parse_column_def(&mut self) -> ParseResult<Column> {
        let name = self.parse_lower_identifier()?;
        let ty = self.parse_column_type()?;
        Ok(Column::new(name, ty))
    }

    // ---- statement forms ------------------------------------------------

    fn parse_create(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::Create)?;
        if self.consume_keyword(Keyword::Database)?.is_some() {
            let name = self.parse_identifier()?;
            return Ok(StatementKind::CreateDatabase { name });
        }
        self.expect_keyword(Keyword::Table)?;
        let table_name = self.parse_lower_identifier()?;
        self.expect_kind(&TokenKind::LeftParen)?;
        let mut columns = vec![self.parse_column_def()?];
        while self.lexer.peek()?.kind == TokenKind::Comma {
            self.lexer.consume()?;
            columns.push(self.parse_column_def()?);
        }
        self.expect_kind(&TokenKind::RightParen)?;
        Ok(StatementKind::CreateTable {
            table_name,
            columns,
        })
    }

    fn parse_drop(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::Drop)?;
        if self.consume_keyword(Keyword::Database)?.is_some() {
            let name = self.parse_identifier()?;
            return Ok(StatementKind::DropDatabase { name });
        }
        self.expect_keyword(Keyword::Table)?;
        let table_name = self.parse_lower_identifier()?;
        Ok(StatementKind::DropTable { table_name })
    }

    fn parse_use(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::Use)?;
        let name = self.parse_identifier()?;
        Ok(StatementKind::UseDatabase { name })
    }

    fn parse_alter(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::Alter)?;
        self.expect_keyword(Keyword::Table)?;
        let table_name = self.parse_lower_identifier()?;
        self.expect_keyword(Keyword::Add)?;
        let new_column = self.parse_column_def()?;
        Ok(StatementKind::Alter {
            table_name,
            new_column,
        })
    }

    fn parse_insert(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;
        let table_name = self.parse_lower_identifier()?;
        self.expect_keyword(Keyword::Values)?;
        self.expect_kind(&TokenKind::LeftParen)?;
        let mut values = vec![self.parse_literal()?];
        while self.lexer.peek()?.kind == TokenKind::Comma {
            self.lexer.consume()?;
            values.push(self.parse_literal()?);
        }
        self.expect_kind(&TokenKind::RightParen)?;
        Ok(StatementKind::Insert { table_name, values })
    }

    fn parse_update(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::Update)?;
        let table_name = self.parse_lower_identifier()?;
        self.expect_keyword(Keyword::Set)?;
        let column_name = self.parse_lower_identifier()?;
        self.expect_kind(&TokenKind::Operator(Operator::Equals))?;
        let value = self.parse_literal()?;
        let where_clause = self.parse_where()?;
        Ok(StatementKind::Update {
            table_name,
            column_name,
            value,
            where_clause: Some(where_clause),
        })
    }

    fn parse_delete(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let table_name = self.parse_lower_identifier()?;
        let where_clause = self.parse_where()?;
        Ok(StatementKind::Delete {
            table_name,
            where_clause: Some(where_clause),
        })
    }

    fn parse_projection(&mut self) -> ParseResult<Projection> {
        if self.lexer.peek()?.kind == TokenKind::Asterisk {
            self.lexer.consume()?;
            return Ok(Projection::All);
        }
        let mut columns = vec![self.parse_lower_identifier()?];
        while self.lexer.peek()?.kind == TokenKind::Comma {
            self.lexer.consume()?;
            columns.push(self.parse_lower_identifier()?);
        }
        Ok(Projection::Columns(columns))
    }

    /// `<table>.<column>`, checked against the bound table aliases by the caller.
    fn parse_qualified_column(&mut self) -> ParseResult<(String, String)> {
        let table = self.parse_lower_identifier()?;
        self.expect_kind(&TokenKind::Period)?;
        let column = self.parse_lower_identifier()?;
        Ok((table, column))
    }

    /// `<ident> [ <ident-alias> ]`. An alias is any identifier immediately
    /// following the table name; it defaults to the table name itself.
    fn parse_table_ref(&mut self) -> ParseResult<(String, String)> {
        let name = self.parse_lower_identifier()?;
        let alias = if matches!(self.lexer.peek()?.kind, TokenKind::Identifier(_)) {
            self.parse_lower_identifier()?
        } else {
            name.clone()
        };
        Ok((name, alias))
    }

    fn parse_join(&mut self, primary_alias: &str) -> ParseResult<Option<Join>> {
        let join_type = if self.consume_keyword(Keyword::Inner)?.is_some() {
            self.expect_keyword(Keyword::Join)?;
            JoinType::Inner
        } else if self.consume_keyword(Keyword::Left)?.is_some() {
            self.expect_keyword(Keyword::Outer)?;
            self.expect_keyword(Keyword::Join)?;
            JoinType::LeftOuter
        } else {
            return Ok(None);
        };
        let (joined_table, joined_alias) = self.parse_table_ref()?;
        self.expect_keyword(Keyword::On)?;

        let (left_alias, left_column) = self.parse_qualified_column()?;
        self.expect_kind(&TokenKind::Operator(Operator::Equals))?;
        let (right_alias, right_column) = self.parse_qualified_column()?;

        let (primary_join_column, secondary_join_column) = if left_alias == primary_alias
            && right_alias == joined_alias
        {
            (left_column, right_column)
        } else if left_alias == joined_alias && right_alias == primary_alias {
            (right_column, left_column)
        } else {
            return Err(ParseError::UnexpectedToken {
                found: format!("{}.{}", left_alias, left_column),
                span: self.last_span,
            });
        };

        Ok(Some(Join {
            join_type,
            joined_table,
            primary_join_column,
            secondary_join_column,
        }))
    }

    fn parse_select(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::Select)?;
        let projection = self.parse_projection()?;
        self.expect_keyword(Keyword::From)?;
        let (table_name, primary_alias) = self.parse_table_ref()?;
        let join = self.parse_join(&primary_alias)?;
        let where_clause = self.parse_optional_where()?;
        Ok(StatementKind::Select {
            table_name,
            projection,
            join,
            where_clause,
        })
    }

    fn parse_begin(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::Begin)?;
        self.expect_keyword(Keyword::Transaction)?;
        Ok(StatementKind::BeginTransaction)
    }

    fn parse_commit(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::Commit)?;
        Ok(StatementKind::CommitTransaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_table() {
        let stmt = Parser::new("CREATE TABLE users (id INT, name VARCHAR(20));")
            .parse()
            .unwrap();
        match stmt.kind {
            StatementKind::CreateTable {
                table_name,
                columns,
            } => {
                assert_eq!(table_name, "users");
                assert_eq!(columns.len(), 2);
                assert_eq!(columns[1].ty, ColumnType::Varchar(20));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn parses_insert() {
        let stmt = Parser::new("INSERT INTO users VALUES (1, 'bob');")
            .parse()
            .unwrap();
        match stmt.kind {
            StatementKind::Insert { table_name, values } => {
                assert_eq!(table_name, "users");
                assert_eq!(values.len(), 2);
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn parses_select_with_where() {
        let stmt = Parser::new("SELECT * FROM users WHERE id = 1;")
            .parse()
            .unwrap();
        match stmt.kind {
            StatementKind::Select {
                table_name,
                projection,
                join,
                where_clause,
            } => {
                assert_eq!(table_name, "users");
                assert_eq!(projection, Projection::All);
                assert!(join.is_none());
                assert!(where_clause.is_some());
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn parses_inner_join_with_alias_check() {
        let stmt = Parser::new(
            "SELECT * FROM orders INNER JOIN users ON orders.user_id = users.id;",
        )
        .parse()
        .unwrap();
        match stmt.kind {
            StatementKind::Select { join: Some(j), .. } => {
                assert_eq!(j.join_type, JoinType::Inner);
                assert_eq!(j.joined_table, "users");
                assert_eq!(j.primary_join_column, "user_id");
                assert_eq!(j.secondary_join_column, "id");
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn parses_join_using_explicit_table_aliases() {
        let stmt = Parser::new(
            "SELECT * FROM a A LEFT OUTER JOIN b B ON A.id = B.id;",
        )
        .parse()
        .unwrap();
        match stmt.kind {
            StatementKind::Select {
                table_name,
                join: Some(j),
                ..
            } => {
                assert_eq!(table_name, "a");
                assert_eq!(j.joined_table, "b");
                assert_eq!(j.join_type, JoinType::LeftOuter);
                assert_eq!(j.primary_join_column, "id");
                assert_eq!(j.secondary_join_column, "id");
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn join_alias_mismatch_is_fatal() {
        let err = Parser::new(
            "SELECT * FROM orders INNER JOIN users ON accounts.user_id = users.id;",
        )
        .parse();
        assert!(err.is_err());
    }

    #[test]
    fn parses_left_outer_join() {
        let stmt = Parser::new(
            "SELECT * FROM orders LEFT OUTER JOIN users ON orders.user_id = users.id;",
        )
        .parse()
        .unwrap();
        match stmt.kind {
            StatementKind::Select { join: Some(j), .. } => {
                assert_eq!(j.join_type, JoinType::LeftOuter);
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn parses_begin_and_commit_transaction() {
        let begin = Parser::new("BEGIN TRANSACTION;").parse().unwrap();
        assert!(matches!(begin.kind, StatementKind::BeginTransaction));
        let commit = Parser::new("COMMIT;").parse().unwrap();
        assert!(matches!(commit.kind, StatementKind::CommitTransaction));
    }

    #[test]
    fn update_and_delete_require_where() {
        assert!(Parser::new("UPDATE t SET a = 1;").parse().is_err());
        assert!(Parser::new("DELETE FROM t;").parse().is_err());
    }

    #[test]
    fn identifiers_are_lower_cased() {
        let stmt = Parser::new("CREATE TABLE Users (Id INT);").parse().unwrap();
        match stmt.kind {
            StatementKind::CreateTable {
                table_name,
                columns,
            } => {
                assert_eq!(table_name, "users");
                assert_eq!(columns[0].name, "id");
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn trailing_tokens_after_semicolon_rejected() {
        let err = Parser::new("DROP TABLE users; DROP TABLE bob;").parse();
        assert!(err.is_err());
    }

    #[test]
    fn parses_alter_add_column() {
        let stmt = Parser::new("ALTER TABLE users ADD age INT;").parse().unwrap();
        match stmt.kind {
            StatementKind::Alter {
                table_name,
                new_column,
            } => {
                assert_eq!(table_name, "users");
                assert_eq!(new_column.name, "age");
                assert_eq!(new_column.ty, ColumnType::Int);
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }
}
