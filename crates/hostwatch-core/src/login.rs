//! Login-table and login-accounting data.
//!
//! Both parsers work on the whitespace-column output of the standard
//! Unix tools (`who` for active sessions, `last` for the accounting log)
//! so the collector can run them without a libutmp binding.

use std::collections::HashSet;

use serde::Serialize;

/// One active login session from the OS login table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedInUser {
    pub name: String,
    pub terminal: String,
}

/// One completed login from the login-accounting log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginEntry {
    pub name: String,
    pub terminal: String,
}

/// Parses `who`-style output: one session per line, name then terminal.
/// Lines with fewer than two columns are skipped. Order is preserved.
pub fn parse_login_table(output: &str) -> Vec<LoggedInUser> {
    output
        .lines()
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            match (columns.next(), columns.next()) {
                (Some(name), Some(terminal)) => Some(LoggedInUser {
                    name: name.to_string(),
                    terminal: terminal.to_string(),
                }),
                _ => None,
            }
        })
        .collect()
}

/// Parses `last`-style login-accounting output.
///
/// Rules, in order:
/// - lines with fewer than two columns are skipped
/// - lines whose final column is `in` or `running` are still-active
///   sessions, not completed logins, and are skipped
/// - entries are de-duplicated by (name, terminal)
/// - the trailing entry is dropped: the accounting log always ends with
///   a synthetic "log begins" record
pub fn parse_login_history(output: &str) -> Vec<LoginEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for line in output.trim().lines() {
        let mut columns = line.split_whitespace();
        let (Some(name), Some(terminal)) = (columns.next(), columns.next()) else {
            continue;
        };

        if matches!(line.split_whitespace().last(), Some("in") | Some("running")) {
            continue;
        }

        if seen.insert((name.to_string(), terminal.to_string())) {
            entries.push(LoginEntry {
                name: name.to_string(),
                terminal: terminal.to_string(),
            });
        }
    }

    entries.pop();
    entries
}
