//! Command-line configuration.

use clap::Parser as ClapParser;
use std::path::PathBuf;

/// An embedded, file-backed SQL engine with a restricted dialect.
#[derive(Debug, ClapParser)]
#[command(name = "rowdb", version, about)]
pub struct Config {
    /// Directory databases are created under.
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Open and `USE` this database before reading any statements.
    #[arg(long)]
    pub database: Option<String>,

    /// Read statements from this file instead of standard input.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Disable `DROP DATABASE`, regardless of what the input asks for.
    #[arg(long)]
    pub no_drop_database: bool,
}

impl Config {
    pub fn allow_drop_database(&self) -> bool {
        !self.no_drop_database
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_allow_drop_database() {
        let config = Config::parse_from(["rowdb"]);
        assert!(config.allow_drop_database());
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn no_drop_database_flag_disables_drop() {
        let config = Config::parse_from(["rowdb", "--no-drop-database"]);
        assert!(!config.allow_drop_database());
    }

    #[test]
    fn parses_database_and_file_flags() {
        let config = Config::parse_from([
            "rowdb",
            "--database",
            "shop",
            "--file",
            "script.sql",
        ]);
        assert_eq!(config.database.as_deref(), Some("shop"));
        assert_eq!(config.file, Some(PathBuf::from("script.sql")));
    }
}
