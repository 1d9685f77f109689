// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structural deep-diff over captured values.
//!
//! Produces an ordered list of CREATE / REMOVE / CHANGE records, each with
//! the path from the root to the differing location. No rename or move
//! detection: a value that moved shows up as a REMOVE plus a CREATE.

use crate::value::SnapValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// One step from a container to a member
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

/// What happened at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Create,
    Remove,
    Change,
}

/// A single difference between two values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub path: Vec<PathSegment>,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// New value (CREATE, CHANGE)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<SnapValue>,
    /// Previous value (REMOVE, CHANGE)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<SnapValue>,
}

impl Change {
    fn create(path: &[PathSegment], value: &SnapValue) -> Self {
        Self {
            path: path.to_vec(),
            kind: ChangeKind::Create,
            value: Some(value.clone()),
            old_value: None,
        }
    }

    fn remove(path: &[PathSegment], old: &SnapValue) -> Self {
        Self {
            path: path.to_vec(),
            kind: ChangeKind::Remove,
            value: None,
            old_value: Some(old.clone()),
        }
    }

    fn change(path: &[PathSegment], old: &SnapValue, new: &SnapValue) -> Self {
        Self {
            path: path.to_vec(),
            kind: ChangeKind::Change,
            value: Some(new.clone()),
            old_value: Some(old.clone()),
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Create => write!(f, "CREATE"),
            ChangeKind::Remove => write!(f, "REMOVE"),
            ChangeKind::Change => write!(f, "CHANGE"),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, display_path(&self.path))?;
        match (&self.old_value, &self.value) {
            (Some(old), Some(new)) => write!(f, ": {} -> {}", old, new),
            (None, Some(new)) => write!(f, ": {}", new),
            (Some(old), None) => write!(f, " (was {})", old),
            (None, None) => Ok(()),
        }
    }
}

/// Render a path as `(root)`, `items[2].name`, `["odd key"]`
pub fn display_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return "(root)".to_string();
    }
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Index(i) => out.push_str(&format!("[{}]", i)),
            PathSegment::Key(k) if is_identifier(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
            PathSegment::Key(k) => out.push_str(&format!("[{:?}]", k)),
        }
    }
    out
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Compare two values; empty means structurally equal
pub fn diff(a: &SnapValue, b: &SnapValue) -> Vec<Change> {
    let mut changes = Vec::new();
    let mut path = Vec::new();
    diff_into(a, b, &mut path, &mut changes);
    changes
}

fn diff_into(
    a: &SnapValue,
    b: &SnapValue,
    path: &mut Vec<PathSegment>,
    out: &mut Vec<Change>,
) {
    match (a, b) {
        (SnapValue::Array(x), SnapValue::Array(y)) | (SnapValue::Set(x), SnapValue::Set(y)) => {
            diff_sequence(x, y, path, out)
        }
        (SnapValue::Object(x), SnapValue::Object(y)) => {
            let left = x.iter().map(|(k, v)| (k.clone(), v)).collect();
            let right = y.iter().map(|(k, v)| (k.clone(), v)).collect();
            diff_keyed(left, right, path, out)
        }
        (SnapValue::Map(x), SnapValue::Map(y)) => {
            let left = map_keys(x).into_iter().zip(x.iter().map(|(_, v)| v)).collect();
            let right = map_keys(y).into_iter().zip(y.iter().map(|(_, v)| v)).collect();
            diff_keyed(left, right, path, out)
        }
        _ if same_value(a, b) => {}
        _ => out.push(Change::change(path, a, b)),
    }
}

fn diff_sequence(
    a: &[SnapValue],
    b: &[SnapValue],
    path: &mut Vec<PathSegment>,
    out: &mut Vec<Change>,
) {
    for i in 0..a.len().max(b.len()) {
        path.push(PathSegment::Index(i));
        match (a.get(i), b.get(i)) {
            (Some(x), Some(y)) => diff_into(x, y, path, out),
            (Some(x), None) => out.push(Change::remove(path, x)),
            (None, Some(y)) => out.push(Change::create(path, y)),
            (None, None) => {}
        }
        path.pop();
    }
}

fn diff_keyed(
    a: Vec<(String, &SnapValue)>,
    b: Vec<(String, &SnapValue)>,
    path: &mut Vec<PathSegment>,
    out: &mut Vec<Change>,
) {
    let right: HashMap<&str, &SnapValue> = b.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let left: HashMap<&str, &SnapValue> = a.iter().map(|(k, v)| (k.as_str(), *v)).collect();

    for (key, x) in &a {
        path.push(PathSegment::Key(key.clone()));
        match right.get(key.as_str()) {
            Some(y) => diff_into(x, y, path, out),
            None => out.push(Change::remove(path, x)),
        }
        path.pop();
    }

    for (key, y) in &b {
        if !left.contains_key(key.as_str()) {
            path.push(PathSegment::Key(key.clone()));
            out.push(Change::create(path, y));
            path.pop();
        }
    }
}

/// Path keys for map entries, in entry order.
///
/// A key is its canonical text; the n-th repeat of a structurally equal key
/// gets `#n` appended. Canonical text never ends in `#<digits>`, so labels
/// stay unique.
fn map_keys(entries: &[(SnapValue, SnapValue)]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    entries
        .iter()
        .map(|(k, _)| {
            let key = k.canonical_key();
            let repeat = seen.entry(key.clone()).or_insert(0);
            let label = match *repeat {
                0 => key,
                n => format!("{}#{}", key, n),
            };
            *repeat += 1;
            label
        })
        .collect()
}

/// Canonical key text of a map path key, without any repeat suffix
fn map_key_text(label: &str) -> &str {
    match label.rsplit_once('#') {
        Some((key, n)) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => key,
        _ => label,
    }
}

fn map_position(entries: &[(SnapValue, SnapValue)], key: &str) -> Option<usize> {
    map_keys(entries).iter().position(|label| label == key)
}

fn same_value(a: &SnapValue, b: &SnapValue) -> bool {
    match (a, b) {
        (SnapValue::Number(x), SnapValue::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        _ => a == b,
    }
}

/// Errors applying a change list
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("path {0} does not address a value")]
    InvalidPath(String),
}

/// Apply a change list to a value.
///
/// `patch(a, &diff(a, b))` reproduces `b`. Removals are applied last and
/// deepest-index first so trailing sequence members drop off cleanly.
pub fn patch(base: &SnapValue, changes: &[Change]) -> Result<SnapValue, PatchError> {
    let mut root = base.clone();

    let (mut removals, updates): (Vec<&Change>, Vec<&Change>) = changes
        .iter()
        .partition(|c| c.kind == ChangeKind::Remove);

    for change in updates {
        apply(&mut root, change)?;
    }

    removals.sort_by(|x, y| removal_order(&y.path).cmp(&removal_order(&x.path)));
    for change in removals {
        apply(&mut root, change)?;
    }

    Ok(root)
}

/// Sort key for removals: indices and map repeats compare numerically
fn removal_order(path: &[PathSegment]) -> Vec<(usize, &str, usize)> {
    path.iter()
        .map(|segment| match segment {
            PathSegment::Index(i) => (*i, "", 0),
            PathSegment::Key(k) => {
                let text = map_key_text(k);
                let repeat = k[text.len()..].trim_start_matches('#').parse().unwrap_or(0);
                (0, text, repeat)
            }
        })
        .collect()
}

fn apply(root: &mut SnapValue, change: &Change) -> Result<(), PatchError> {
    let invalid = || PatchError::InvalidPath(display_path(&change.path));

    let Some((last, parents)) = change.path.split_last() else {
        *root = match change.kind {
            ChangeKind::Remove => SnapValue::Undefined,
            ChangeKind::Create | ChangeKind::Change => {
                change.value.clone().ok_or_else(invalid)?
            }
        };
        return Ok(());
    };

    let mut target = root;
    for segment in parents {
        target = member_mut(target, segment).ok_or_else(invalid)?;
    }

    let new_value = || change.value.clone().ok_or_else(invalid);

    match (target, last) {
        (SnapValue::Array(items) | SnapValue::Set(items), PathSegment::Index(i)) => {
            let i = *i;
            match change.kind {
                ChangeKind::Create => {
                    while items.len() < i {
                        items.push(SnapValue::Undefined);
                    }
                    if i < items.len() {
                        items[i] = new_value()?;
                    } else {
                        items.push(new_value()?);
                    }
                }
                ChangeKind::Change => {
                    let slot = items.get_mut(i).ok_or_else(invalid)?;
                    *slot = new_value()?;
                }
                ChangeKind::Remove => {
                    if i >= items.len() {
                        return Err(invalid());
                    }
                    items.remove(i);
                }
            }
        }
        (SnapValue::Object(fields), PathSegment::Key(key)) => match change.kind {
            ChangeKind::Create | ChangeKind::Change => {
                fields.insert(key.clone(), new_value()?);
            }
            ChangeKind::Remove => {
                fields.remove(key).ok_or_else(invalid)?;
            }
        },
        (SnapValue::Map(entries), PathSegment::Key(key)) => {
            let position = map_position(entries, key);
            match (change.kind, position) {
                (ChangeKind::Remove, Some(pos)) => {
                    entries.remove(pos);
                }
                (ChangeKind::Create | ChangeKind::Change, Some(pos)) => {
                    entries[pos].1 = new_value()?;
                }
                (ChangeKind::Create, None) => {
                    let map_key = SnapValue::parse(map_key_text(key)).map_err(|_| invalid())?;
                    entries.push((map_key, new_value()?));
                }
                _ => return Err(invalid()),
            }
        }
        _ => return Err(invalid()),
    }

    Ok(())
}

fn member_mut<'a>(value: &'a mut SnapValue, segment: &PathSegment) -> Option<&'a mut SnapValue> {
    match (value, segment) {
        (SnapValue::Array(items) | SnapValue::Set(items), PathSegment::Index(i)) => {
            items.get_mut(*i)
        }
        (SnapValue::Object(fields), PathSegment::Key(key)) => fields.get_mut(key),
        (SnapValue::Map(entries), PathSegment::Key(key)) => {
            let pos = map_position(entries, key)?;
            entries.get_mut(pos).map(|(_, v)| v)
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
