// Row storage - ordered rows, column projection, uniqueness checks

use crate::error::{PathDbError, Result};
use crate::path::FieldPath;
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A row is a nested mapping from segment names to values.
pub type Row = serde_json::Map<String, Value>;

/// Ordered rows of a database. Rows only enter through [`RowStore::append`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowStore {
    rows: Vec<Row>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Swap the row at `index` for `row`. Uniqueness is the caller's concern.
    pub(crate) fn replace(&mut self, index: usize, row: Row) -> Option<Row> {
        self.rows
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, row))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Values at `path`, one per row, in row order. Every row must hold the
    /// path. Whether the path is declared is the caller's concern.
    pub fn column(&self, path: &FieldPath) -> Result<Vec<&Value>> {
        self.rows.iter().map(|row| path.read(row)).collect()
    }

    /// Whether any stored row holds `value` at `path`. Rows without the path
    /// never match.
    pub fn contains_value(&self, path: &FieldPath, value: &Value) -> bool {
        self.rows
            .iter()
            .any(|row| matches!(path.read(row), Ok(existing) if existing == value))
    }

    /// Index of the first row holding `value` at `path`.
    pub fn position(&self, path: &FieldPath, value: &Value) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| matches!(path.read(row), Ok(existing) if existing == value))
    }

    /// Rows holding `value` at `path`, with their indices, in row order.
    pub fn matching(&self, path: &FieldPath, value: &Value) -> Vec<(usize, &Row)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| matches!(path.read(row), Ok(existing) if existing == value))
            .collect()
    }

    /// `true` when `row` can be appended without repeating a value of any
    /// unique field. A unique field missing from `row` is not a collision.
    pub fn can_append(&self, schema: &Schema, row: &Row) -> Result<bool> {
        Ok(self.first_collision(schema, row, None)?.is_none())
    }

    /// Append `row` at the end, or fail with `FieldDuplicated` naming the
    /// first colliding unique field. Nothing is stored on failure.
    pub fn append(&mut self, schema: &Schema, row: Row) -> Result<()> {
        if let Some((path, value)) = self.first_collision(schema, &row, None)? {
            return Err(PathDbError::duplicated(&path, &value));
        }
        self.rows.push(row);
        log::debug!("Appended row {}", self.rows.len() - 1);
        Ok(())
    }

    /// The first unique field of `row` whose value already appears in a
    /// stored row, with that value. The row at `skip` is left out of the scan.
    pub(crate) fn first_collision(
        &self,
        schema: &Schema,
        row: &Row,
        skip: Option<usize>,
    ) -> Result<Option<(String, Value)>> {
        for field in schema.unique_fields() {
            let path = FieldPath::parse(field)?;
            let Ok(candidate) = path.read(row) else {
                continue;
            };
            let taken = self.rows.iter().enumerate().any(|(i, stored)| {
                Some(i) != skip && matches!(path.read(stored), Ok(existing) if existing == candidate)
            });
            if taken {
                return Ok(Some((field.clone(), candidate.clone())));
            }
        }
        Ok(None)
    }
}

impl<'a> IntoIterator for &'a RowStore {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
