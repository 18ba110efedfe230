use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::interactions::RawTransactions;

#[derive(Error, Debug)]
pub enum UsersDatError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Empty line at line {line}")]
    EmptyLine { line: usize },
}

/// Parser for CiteULike `users.dat` adjacency lists
///
/// # Expected Format:
/// ```text
/// <user> <item> <item> ...
/// ```
/// One user per line, tokens separated by spaces. Lines are read as a
/// tab-delimited table without quoting, so only the text before the first
/// tab is used.
pub struct UsersDatParser {
    path: PathBuf,
}

impl UsersDatParser {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the raw lines of the file
    pub fn read_lines(&self) -> Result<Vec<String>, UsersDatError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| UsersDatError::Read {
            path: self.path.display().to_string(),
            source,
        })?;

        let lines: Vec<String> = contents
            .lines()
            .map(|line| first_field(line).to_string())
            .collect();
        debug!("Read {} lines from {}", lines.len(), self.path.display());
        Ok(lines)
    }

    /// Read and expand the whole file into (user, item) pairs
    pub fn parse(&self) -> Result<RawTransactions, UsersDatError> {
        info!("Parsing raw file: {}", self.path.display());
        let lines = self.read_lines()?;
        let transactions = expand_lines(&lines)?;
        info!(
            "Expanded {} lines into {} interactions",
            lines.len(),
            transactions.len()
        );
        Ok(transactions)
    }
}

/// Expand every line in order, failing on the first empty one
///
/// Blank lines at the very end of the file are ignored; a blank line
/// anywhere before the last record is still an error.
pub fn expand_lines<S: AsRef<str>>(lines: &[S]) -> Result<RawTransactions, UsersDatError> {
    let records = lines
        .iter()
        .rposition(|line| !line.as_ref().trim().is_empty())
        .map_or(0, |last| last + 1);

    let mut transactions = RawTransactions::new();
    for (idx, line) in lines[..records].iter().enumerate() {
        expand_line(line.as_ref(), idx + 1, &mut transactions)?;
    }
    Ok(transactions)
}

/// Push one (user, item) pair per item token on `line`
///
/// `line_number` is 1-based and only used for error reporting.
pub fn expand_line(
    line: &str,
    line_number: usize,
    out: &mut RawTransactions,
) -> Result<(), UsersDatError> {
    let mut tokens = line.split_whitespace();
    let user = tokens
        .next()
        .ok_or(UsersDatError::EmptyLine { line: line_number })?;

    for item in tokens {
        out.push(user, item);
    }
    Ok(())
}

fn first_field(line: &str) -> &str {
    line.split('\t').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_line_preserves_token_order() {
        let mut out = RawTransactions::new();
        expand_line("7 30 10 20", 1, &mut out).unwrap();
        assert_eq!(out.users, vec!["7", "7", "7"]);
        assert_eq!(out.items, vec!["30", "10", "20"]);
    }

    #[test]
    fn test_expand_line_user_without_items() {
        let mut out = RawTransactions::new();
        expand_line("3", 1, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_expand_lines_reports_empty_line_number() {
        let lines = ["1 10", "   ", "2 20"];
        match expand_lines(&lines).unwrap_err() {
            UsersDatError::EmptyLine { line } => assert_eq!(line, 2),
            _ => panic!("Expected EmptyLine error"),
        }
    }

    #[test]
    fn test_expand_lines_ignores_trailing_blank_lines() {
        let lines = ["1 10", "2 20", "", "  "];
        let out = expand_lines(&lines).unwrap();
        assert_eq!(out.users, vec!["1", "2"]);
        assert_eq!(out.items, vec!["10", "20"]);
    }

    #[test]
    fn test_expand_lines_all_blank_is_empty() {
        let lines = ["", ""];
        assert!(expand_lines(&lines).unwrap().is_empty());
    }

    #[test]
    fn test_first_field_drops_text_after_tab() {
        assert_eq!(first_field("1 10 20\tignored"), "1 10 20");
        assert_eq!(first_field(""), "");
    }
}
