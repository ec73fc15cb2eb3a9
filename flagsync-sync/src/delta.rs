//! ID list delta records.
//!
//! Range content is a sequence of newline-terminated records. Each record is
//! a one-character operation followed by the identifier:
//!
//! ```text
//! +user-1
//! +user-2
//! -user-1
//! ```
//!
//! `+` adds, `-` removes, any other leading character is ignored. A range
//! whose first byte is not a sign is treated as corrupt.

use crate::id_list::IdList;

/// A parsed delta record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOp<'a> {
    Add(&'a str),
    Remove(&'a str),
}

/// Returns true if `body` can be applied as a delta.
///
/// The body must be longer than one byte and begin with `+` or `-`.
pub fn is_well_formed(body: &[u8]) -> bool {
    body.len() > 1 && matches!(body[0], b'+' | b'-')
}

/// Parses one record, returning `None` for blank, too-short, or unknown lines.
pub fn parse_line(line: &str) -> Option<DeltaOp<'_>> {
    let line = line.trim();
    if line.len() <= 1 {
        return None;
    }
    let mut chars = line.chars();
    let op = chars.next()?;
    let id = chars.as_str();
    match op {
        '+' => Some(DeltaOp::Add(id)),
        '-' => Some(DeltaOp::Remove(id)),
        _ => None,
    }
}

/// Iterates the records of `content`, accepting both `\n` and `\r\n` endings.
pub fn parse_records(content: &str) -> impl Iterator<Item = DeltaOp<'_>> {
    content.split('\n').filter_map(parse_line)
}

/// Applies every record of `content` to `list` in order.
///
/// Returns the number of records applied. Does not touch `size`.
pub fn apply_records(list: &IdList, content: &str) -> usize {
    let mut applied = 0;
    for op in parse_records(content) {
        match op {
            DeltaOp::Add(id) => list.insert(id),
            DeltaOp::Remove(id) => list.remove(id),
        }
        applied += 1;
    }
    applied
}
