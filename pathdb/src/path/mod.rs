// Field path engine - parsing, escaping, traversal of nested rows

use crate::error::{PathDbError, Result};
use crate::rows::Row;
use serde_json::Value;
use std::fmt;

/// Splits a field path into segments.
pub const SEPARATOR: char = '/';

/// Makes the following separator (or escape) literal.
pub const ESCAPE: char = '\\';

/// A parsed field path. Keeps the raw text for error messages and the
/// unescaped segments for traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(FieldPath {
            raw: raw.to_string(),
            segments: parse(raw)?,
        })
    }

    /// Build a path from already-unescaped segments.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        FieldPath {
            raw: join(segments),
            segments: segments.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn read<'r>(&self, row: &'r Row) -> Result<&'r Value> {
        read(row, &self.segments)
    }

    pub fn write(&self, row: &mut Row, value: Value) -> Result<()> {
        write(row, &self.segments, value)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse a field path into its segments.
///
/// `\/` produces a literal `/` and `\\` a literal `\`. Any other escaped
/// character is kept as written, backslash included. A backslash at the very
/// end of the path has nothing to escape and is rejected.
pub fn parse(path: &str) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some(next @ (SEPARATOR | ESCAPE)) => current.push(next),
                Some(other) => {
                    current.push(ESCAPE);
                    current.push(other);
                }
                None => {
                    return Err(PathDbError::MalformedPath {
                        path: path.to_string(),
                        reason: "trailing escape character".into(),
                    });
                }
            },
            SEPARATOR => segments.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    segments.push(current);

    Ok(segments)
}

/// Join segments into a field path, escaping separators and escapes so that
/// `parse(&join(s)) == s`.
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        for c in segment.as_ref().chars() {
            if c == SEPARATOR || c == ESCAPE {
                out.push(ESCAPE);
            }
            out.push(c);
        }
    }
    out
}

/// Read the value at `segments` inside `row`.
pub fn read<'r>(row: &'r Row, segments: &[String]) -> Result<&'r Value> {
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| PathDbError::invalid_path("", "path has no segments"))?;

    let mut current = row;
    for segment in parents {
        current = match current.get(segment) {
            Some(Value::Object(map)) => map,
            Some(other) => return Err(not_a_mapping(segments, segment, other)),
            None => return Err(missing(segments, segment)),
        };
    }

    current.get(last).ok_or_else(|| missing(segments, last))
}

/// Write `value` at `segments` inside `row`. Intermediate mappings must
/// already exist; only the final key is created or overwritten. The row is
/// left untouched when this fails.
pub fn write(row: &mut Row, segments: &[String], value: Value) -> Result<()> {
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| PathDbError::invalid_path("", "path has no segments"))?;

    let mut current = row;
    for segment in parents {
        current = match current.get_mut(segment) {
            Some(Value::Object(map)) => map,
            Some(other) => return Err(not_a_mapping(segments, segment, other)),
            None => return Err(missing(segments, segment)),
        };
    }

    current.insert(last.clone(), value);
    Ok(())
}

fn missing(segments: &[String], segment: &str) -> PathDbError {
    PathDbError::invalid_path(&join(segments), format!("segment '{segment}' does not exist"))
}

fn not_a_mapping(segments: &[String], segment: &str, value: &Value) -> PathDbError {
    PathDbError::invalid_path(
        &join(segments),
        format!("segment '{segment}' holds {}, not a mapping", type_name(value)),
    )
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
