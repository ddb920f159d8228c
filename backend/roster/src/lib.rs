//! # Roster
//!
//! Operator tooling for the attendance store.
//!
//! ## Roster Files
//!
//! - One roll number per line
//! - Blank lines and lines starting with `#` are skipped
//! - Surrounding whitespace is trimmed
//! - Duplicates are dropped, first occurrence wins
//! - Anything not matching `^[A-Za-z0-9][A-Za-z0-9/_-]*$` is reported and skipped
use std::collections::HashSet;

use regex::Regex;

pub const ROLL_NUMBER_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9/_-]*$";

#[derive(Debug, Default, PartialEq)]
pub struct Roster {
    pub roll_numbers: Vec<String>,
    pub rejected: Vec<(usize, String)>,
    pub duplicates: usize,
}

pub fn parse_roster(text: &str) -> Roster {
    let valid = Regex::new(ROLL_NUMBER_PATTERN).unwrap();

    let mut seen = HashSet::new();
    let mut roster = Roster::default();

    for (index, line) in text.lines().enumerate() {
        let entry = line.trim();

        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }

        if !valid.is_match(entry) {
            roster.rejected.push((index + 1, entry.to_string()));
            continue;
        }

        if seen.insert(entry) {
            roster.roll_numbers.push(entry.to_string());
        } else {
            roster.duplicates += 1;
        }
    }

    roster
}
