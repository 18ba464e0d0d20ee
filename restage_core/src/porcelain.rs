//! Parsing of `git status --porcelain=v2 -z` output.
//!
//! Records are NUL-terminated. Rename and copy records (`2`) are followed by
//! an extra NUL-terminated field holding the original path. Header lines
//! (`#`) are skipped. A path removed from the index but kept on disk gets
//! both a tracked record and a `?` record; the two are folded into one entry.

use std::collections::HashMap;

use crate::{Error, IndexState, PathStatus, Result, WorktreeState};

/// Parse porcelain v2 output produced with `-z` into status records.
///
/// # Errors
///
/// Returns [`Error::Porcelain`] for unknown record types, truncated records,
/// or unrecognized status codes.
pub fn parse(output: &str) -> Result<Vec<PathStatus>> {
    let mut entries: Vec<PathStatus> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut fields = output.split('\0');

    while let Some(record) = fields.next() {
        if record.is_empty() {
            continue;
        }

        let (kind, rest) = record
            .split_once(' ')
            .ok_or_else(|| malformed(record, "missing record type"))?;

        let entry = match kind {
            "#" => continue,
            "1" => parse_ordinary(record, rest)?,
            "2" => {
                let original = fields
                    .next()
                    .filter(|original| !original.is_empty())
                    .ok_or_else(|| malformed(record, "rename record without original path"))?;
                parse_renamed(record, rest)?.with_original_path(original)
            }
            "u" => parse_unmerged(record, rest)?,
            "?" => PathStatus::untracked(rest),
            "!" => PathStatus::ignored(rest),
            _ => return Err(malformed(record, "unknown record type")),
        };

        match positions.get(&entry.path).copied() {
            Some(at) if is_untracked_only(&entry) => entries[at].untracked = true,
            Some(at) if is_untracked_only(&entries[at]) => {
                entries[at] = PathStatus {
                    untracked: true,
                    ..entry
                };
            }
            _ => {
                positions.insert(entry.path.clone(), entries.len());
                entries.push(entry);
            }
        }
    }

    Ok(entries)
}

fn is_untracked_only(entry: &PathStatus) -> bool {
    entry.untracked && !entry.ignored && !entry.index.is_staged()
}

// 1 <XY> <sub> <mH> <mI> <mW> <hH> <hI> <path>
fn parse_ordinary(record: &str, rest: &str) -> Result<PathStatus> {
    let fields: Vec<&str> = rest.splitn(8, ' ').collect();
    let [xy, _, _, _, _, _, _, path] = fields.as_slice() else {
        return Err(malformed(record, "ordinary record has too few fields"));
    };
    tracked(record, xy, path)
}

// 2 <XY> <sub> <mH> <mI> <mW> <hH> <hI> <X><score> <path>
fn parse_renamed(record: &str, rest: &str) -> Result<PathStatus> {
    let fields: Vec<&str> = rest.splitn(9, ' ').collect();
    let [xy, _, _, _, _, _, _, _, path] = fields.as_slice() else {
        return Err(malformed(record, "rename record has too few fields"));
    };
    tracked(record, xy, path)
}

// u <XY> <sub> <m1> <m2> <m3> <mW> <h1> <h2> <h3> <path>
fn parse_unmerged(record: &str, rest: &str) -> Result<PathStatus> {
    let fields: Vec<&str> = rest.splitn(10, ' ').collect();
    let [_, _, _, _, _, _, _, _, _, path] = fields.as_slice() else {
        return Err(malformed(record, "unmerged record has too few fields"));
    };
    if path.is_empty() {
        return Err(malformed(record, "empty path"));
    }
    Ok(PathStatus::unmerged(*path))
}

fn tracked(record: &str, xy: &str, path: &str) -> Result<PathStatus> {
    if path.is_empty() {
        return Err(malformed(record, "empty path"));
    }

    let mut codes = xy.chars();
    let (Some(x), Some(y), None) = (codes.next(), codes.next(), codes.next()) else {
        return Err(malformed(record, "status code must be two characters"));
    };

    let index = index_state(x).ok_or_else(|| malformed(record, "unknown index status code"))?;
    let worktree =
        worktree_state(y).ok_or_else(|| malformed(record, "unknown worktree status code"))?;

    Ok(PathStatus::tracked(path, index, worktree))
}

const fn index_state(code: char) -> Option<IndexState> {
    Some(match code {
        '.' => IndexState::Unmodified,
        'M' => IndexState::Modified,
        'T' => IndexState::TypeChanged,
        'A' => IndexState::Added,
        'D' => IndexState::Deleted,
        'R' => IndexState::Renamed,
        'C' => IndexState::Copied,
        'U' => IndexState::Unmerged,
        _ => return None,
    })
}

const fn worktree_state(code: char) -> Option<WorktreeState> {
    Some(match code {
        '.' => WorktreeState::Unmodified,
        'M' => WorktreeState::Modified,
        'T' => WorktreeState::TypeChanged,
        'A' => WorktreeState::Added,
        'D' => WorktreeState::Deleted,
        'U' => WorktreeState::Unmerged,
        _ => return None,
    })
}

fn malformed(record: &str, reason: &'static str) -> Error {
    Error::Porcelain {
        record: record.to_owned(),
        reason,
    }
}
