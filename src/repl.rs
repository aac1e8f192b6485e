//! The line-buffered REPL: reads `;`-terminated statements and prints the
//! same result text for each statement kind regardless of where the input
//! came from (a terminal or a `--file` script).

use crate::engine::{ExecutionResult, Manager};
use crate::error::{EngineError, ParseError, Result as EngineResult};
use crate::parser::{Parser, StatementKind};
use crate::value::Value;
use std::io::{self, BufRead, Write};
use tracing::warn;

/// Drive the REPL loop over `input`, writing results to `output`, until
/// EOF or a `.EXIT` line.
pub fn run<R: BufRead, W: Write>(manager: &mut Manager, mut input: R, mut output: W) -> io::Result<()> {
    let mut buffer = String::new();
    let mut line = String::new();

    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case(".EXIT") {
            writeln!(output, "All done.")?;
            break;
        }
        if trimmed.starts_with("--") {
            continue;
        }

        buffer.push_str(trimmed);
        buffer.push(' ');
        if buffer.contains(';') {
            drain_statements(manager, &mut buffer, &mut output)?;
        }
    }
    Ok(())
}

fn drain_statements<W: Write>(
    manager: &mut Manager,
    buffer: &mut String,
    output: &mut W,
) -> io::Result<()> {
    while let Some(semi) = buffer.find(';') {
        let statement_text = buffer[..=semi].to_string();
        *buffer = buffer[semi + 1..].trim_start().to_string();
        run_statement(manager, &statement_text, output)?;
    }
    Ok(())
}

fn run_statement<W: Write>(manager: &mut Manager, text: &str, output: &mut W) -> io::Result<()> {
    match Parser::new(text).parse() {
        Ok(statement) => {
            let kind = statement.kind.clone();
            let result = manager.execute(&statement);
            render(&kind, result, output)
        }
        Err(err) => {
            warn!(%err, "failed to parse statement");
            match err {
                ParseError::Tokenizer { message, .. } => writeln!(output, "{}", message),
                other => writeln!(output, "!Failed to parse statement. ({})", other.code()),
            }
        }
    }
}

fn render<W: Write>(
    kind: &StatementKind,
    result: EngineResult<ExecutionResult>,
    output: &mut W,
) -> io::Result<()> {
    match kind {
        StatementKind::CreateDatabase { name } => match result {
            Ok(_) => writeln!(output, "Database {} created.", name),
            Err(EngineError::AlreadyExists) => writeln!(
                output,
                "!Failed to create database {} because it already exists.",
                name
            ),
            Err(e) => writeln!(output, "!Failed to create database. ({})", e.code()),
        },
        StatementKind::DropDatabase { name } => match result {
            Ok(_) => writeln!(output, "Database {} deleted.", name),
            Err(EngineError::Missing) => writeln!(
                output,
                "!Failed to delete {} because it does not exist.",
                name
            ),
            Err(e) => writeln!(output, "!Failed to delete database. ({})", e.code()),
        },
        StatementKind::UseDatabase { name } => match result {
            Ok(_) => writeln!(output, "Using database {}.", name),
            Err(EngineError::Missing) | Err(EngineError::DirStatError) => {
                writeln!(output, "!Database does not exist")
            }
            Err(e) => writeln!(output, "!Failed to use database. ({})", e.code()),
        },
        StatementKind::CreateTable { table_name, .. } => match result {
            Ok(_) => writeln!(output, "Table {} created.", table_name),
            Err(EngineError::AlreadyExists) => writeln!(
                output,
                "!Failed to create {} because it already exists.",
                table_name
            ),
            Err(e) => writeln!(output, "!Failed to create table. ({})", e.code()),
        },
        StatementKind::DropTable { table_name } => match result {
            Ok(_) => writeln!(output, "Table {} deleted.", table_name),
            Err(EngineError::Missing) => writeln!(
                output,
                "!Failed to delete {} because it does not exist.",
                table_name
            ),
            Err(e) => writeln!(output, "!Failed to delete table. ({})", e.code()),
        },
        StatementKind::Alter { table_name, .. } => match result {
            Ok(_) => writeln!(output, "Table {} modified.", table_name),
            Err(e) => writeln!(output, "!Failed to alter. ({})", e.code()),
        },
        StatementKind::Insert { .. } => match result {
            Ok(_) => writeln!(output, "1 new record inserted."),
            Err(e) => writeln!(output, "!Failed to insert. ({})", e.code()),
        },
        StatementKind::Update { .. } => match result {
            Ok(ExecutionResult::Updated(n)) => write_count(output, n, "record modified.", "records modified."),
            Err(e) => writeln!(output, "!Failed to update. ({})", e.code()),
            Ok(_) => unreachable!("UPDATE always yields ExecutionResult::Updated"),
        },
        StatementKind::Delete { .. } => match result {
            Ok(ExecutionResult::Deleted(n)) => write_count(output, n, "record deleted.", "records deleted."),
            Err(e) => writeln!(output, "!Failed to delete. ({})", e.code()),
            Ok(_) => unreachable!("DELETE always yields ExecutionResult::Deleted"),
        },
        StatementKind::Select { table_name, .. } => match result {
            Ok(ExecutionResult::Selected { columns, rows }) => {
                let header: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{} {}", c.name, c.ty))
                    .collect();
                writeln!(output, "{}", header.join(" | "))?;
                for row in rows {
                    let cells: Vec<String> = row.iter().map(render_value).collect();
                    writeln!(output, "{}", cells.join(" | "))?;
                }
                Ok(())
            }
            Err(EngineError::Missing) => writeln!(
                output,
                "!Failed to query table {} because it does not exist.",
                table_name
            ),
            Err(e) => writeln!(output, "!Failed to select. ({})", e.code()),
            Ok(_) => unreachable!("SELECT always yields ExecutionResult::Selected"),
        },
        StatementKind::BeginTransaction => {
            let _ = result;
            writeln!(output, "Transaction starts.")
        }
        StatementKind::CommitTransaction => match result {
            Ok(_) => writeln!(output, "Transaction committed."),
            Err(EngineError::FileAlreadyOpened) => writeln!(output, "Transaction abort."),
            Err(e) => writeln!(output, "!Failed to commit transaction. ({})", e.code()),
        },
    }
}

fn write_count<W: Write>(output: &mut W, n: usize, singular: &str, plural: &str) -> io::Result<()> {
    if n == 1 {
        writeln!(output, "1 {}", singular)
    } else {
        writeln!(output, "{} {}", n, plural)
    }
}

fn render_value(value: &Value) -> String {
    value.to_string()
}
