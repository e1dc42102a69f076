//! SQL text builders
//!
//! Every table and column name passes through [`quote_ident`], so names that
//! are not plain identifiers (`test-test`, `order`) work unchanged.

use regex::Regex;
use std::sync::LazyLock;

/// Leading keyword of statements that produce rows
///
/// Skips leading whitespace, comments and opening parentheses.
static READ_STATEMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^(?:\s+|--[^\n]*(?:\n|$)|/\*.*?\*/|\()*(?:SELECT|WITH|VALUES|FROM|TABLE|SHOW|DESCRIBE|DESC|SUMMARIZE|PRAGMA|EXPLAIN|CALL)\b",
    )
    .unwrap()
});

/// Check if a statement returns rows rather than a change count
pub fn is_read_statement(sql: &str) -> bool {
    READ_STATEMENT_REGEX.is_match(sql)
}

/// Quote an identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `CREATE TABLE` statement for `(name, sql type)` column pairs
pub fn create_table<'a>(
    table: &str,
    columns: impl IntoIterator<Item = (&'a str, &'a str)>,
    mode: CreateMode,
) -> String {
    let columns = columns
        .into_iter()
        .map(|(name, sql_type)| format!("{} {sql_type}", quote_ident(name)))
        .collect::<Vec<_>>()
        .join(", ");

    let prefix = match mode {
        CreateMode::IfNotExists => "CREATE TABLE IF NOT EXISTS",
        CreateMode::Replace => "CREATE OR REPLACE TABLE",
    };

    format!("{prefix} {} ({columns})", quote_ident(table))
}

/// How `CREATE TABLE` treats an existing table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    IfNotExists,
    Replace,
}

/// Positional `INSERT` with `width` placeholders
pub fn insert_positional(table: &str, width: usize) -> String {
    format!(
        "INSERT INTO {} VALUES ({})",
        quote_ident(table),
        placeholders(width)
    )
}

/// `INSERT` that targets the named columns
pub fn insert_named<S: AsRef<str>>(table: &str, columns: &[S]) -> String {
    let names = columns
        .iter()
        .map(|c| quote_ident(c.as_ref()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({names}) VALUES ({})",
        quote_ident(table),
        placeholders(columns.len())
    )
}

/// `SELECT *` over a whole table
pub fn select_all(table: &str) -> String {
    format!("SELECT * FROM {}", quote_ident(table))
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
