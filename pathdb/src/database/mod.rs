use crate::error::{PathDbError, Result};
use crate::path::FieldPath;
use crate::rows::{Row, RowStore};
use crate::schema::{FieldKind, Schema};
use serde_json::Value;

/// A named collection of rows with declared unique and non-unique fields.
///
/// All row additions go through [`Database::append_row`], so the values of
/// every unique field stay distinct across the stored rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    name: String,
    schema: Schema,
    rows: RowStore,
}

impl Database {
    /// Create a database, appending `initial_rows` one by one through the
    /// same checks as [`Database::append_row`]. A duplicate among the seed
    /// rows fails the whole construction.
    pub fn create(
        name: impl Into<String>,
        unique_fields: Vec<String>,
        non_unique_fields: Vec<String>,
        initial_rows: Vec<Row>,
    ) -> Result<Self> {
        let schema = Schema::new(unique_fields, non_unique_fields);
        for path in schema.declared_fields() {
            FieldPath::parse(path)?;
        }

        let mut db = Database {
            name: name.into(),
            schema,
            rows: RowStore::new(),
        };
        for row in initial_rows {
            db.append_row(row)?;
        }
        Ok(db)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, new_name: impl Into<String>) {
        self.name = new_name.into();
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of a declared field across all rows, in row order.
    pub fn get_column(&self, path: &str) -> Result<Vec<&Value>> {
        if !self.schema.is_declared(path) {
            return Err(PathDbError::invalid_path(path, "field is not declared"));
        }
        self.rows.column(&FieldPath::parse(path)?)
    }

    /// First row whose unique field `path` equals `value`, if any.
    pub fn get_row_by_unique_field(&self, path: &str, value: &Value) -> Result<Option<&Row>> {
        Ok(self
            .position_by_unique_field(path, value)?
            .and_then(|index| self.rows.get(index)))
    }

    /// Index of the first row whose unique field `path` equals `value`.
    pub fn position_by_unique_field(&self, path: &str, value: &Value) -> Result<Option<usize>> {
        if !self.schema.is_unique(path) {
            return Err(PathDbError::invalid_path(path, "field is not declared unique"));
        }
        let field = FieldPath::parse(path)?;
        Ok(self.rows.position(&field, value))
    }

    /// Every row whose non-unique field `path` equals `value`, in row order.
    pub fn get_rows_by_field(&self, path: &str, value: &Value) -> Result<Vec<&Row>> {
        if !self.schema.is_non_unique(path) {
            return Err(PathDbError::invalid_path(path, "field is not declared non-unique"));
        }
        let field = FieldPath::parse(path)?;
        let rows = self
            .rows
            .matching(&field, value)
            .into_iter()
            .map(|(_, row)| row)
            .collect();
        Ok(rows)
    }

    /// Set `path` on a row that is not (yet) stored in this database.
    ///
    /// For a unique field the value must not appear in any stored row. The
    /// row being written is not excluded from that check.
    pub fn set_field_value(&self, row: &mut Row, path: &str, value: Value) -> Result<()> {
        let field = self.checked_field(path, &value)?;
        field.write(row, value)
    }

    /// Set `path` on the stored row at `index`, with the same rules as
    /// [`Database::set_field_value`]. Writing a unique field's current value
    /// back onto its own row fails with `FieldDuplicated`.
    ///
    /// A write can change unique fields nested under or above `path`, so the
    /// updated row is checked against every other stored row before it
    /// replaces the original.
    pub fn set_row_field(&mut self, index: usize, path: &str, value: Value) -> Result<()> {
        let field = self.checked_field(path, &value)?;
        let mut row = self
            .rows
            .get(index)
            .cloned()
            .ok_or_else(|| PathDbError::invalid_path(path, format!("row {index} does not exist")))?;
        field.write(&mut row, value)?;

        if let Some((unique, taken)) = self.rows.first_collision(&self.schema, &row, Some(index))? {
            return Err(PathDbError::duplicated(&unique, &taken));
        }
        self.rows.replace(index, row);
        Ok(())
    }

    /// Build a new row from `(path, value)` pairs, applied in order. The row
    /// is returned unsaved; pass it to [`Database::append_row`] to store it.
    pub fn create_row(&self, contents: Vec<(String, Value)>) -> Result<Row> {
        let mut row = Row::new();
        for (path, value) in contents {
            self.set_field_value(&mut row, &path, value)?;
        }

        if let Some((path, value)) = self.rows.first_collision(&self.schema, &row, None)? {
            return Err(PathDbError::duplicated(&path, &value));
        }
        Ok(row)
    }

    pub fn append_row(&mut self, row: Row) -> Result<()> {
        self.rows.append(&self.schema, row)
    }

    fn checked_field(&self, path: &str, value: &Value) -> Result<FieldPath> {
        match self.schema.kind(path) {
            Some(FieldKind::Unique) => {
                let field = FieldPath::parse(path)?;
                if self.rows.contains_value(&field, value) {
                    return Err(PathDbError::duplicated(path, value));
                }
                Ok(field)
            }
            Some(FieldKind::NonUnique) => FieldPath::parse(path),
            None => Err(PathDbError::invalid_path(path, "field is not declared")),
        }
    }
}

/// Read the value at field path `path` inside `row`.
pub fn get_field_contents<'r>(row: &'r Row, path: &str) -> Result<&'r Value> {
    FieldPath::parse(path)?.read(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("test row must be an object"),
        }
    }

    fn users() -> Database {
        Database::create("users", vec!["username".into()], vec!["age".into()], vec![]).unwrap()
    }

    fn seeded() -> Database {
        let mut db = users();
        db.append_row(row(json!({ "username": "james", "age": 30 }))).unwrap();
        db.append_row(row(json!({ "username": "mary", "age": 30 }))).unwrap();
        db
    }

    #[test]
    fn test_create_and_query() {
        let mut db = seeded();

        assert_eq!(db.get_column("age").unwrap(), vec![&json!(30), &json!(30)]);

        let james = db
            .get_row_by_unique_field("username", &json!("james"))
            .unwrap()
            .unwrap();
        assert_eq!(james, &row(json!({ "username": "james", "age": 30 })));

        let err = db
            .append_row(row(json!({ "username": "james", "age": 40 })))
            .unwrap_err();
        assert!(matches!(err, PathDbError::FieldDuplicated { .. }));
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn test_create_with_seed_rows() {
        let db = Database::create(
            "users",
            vec!["username".into()],
            vec![],
            vec![row(json!({ "username": "a" })), row(json!({ "username": "b" }))],
        )
        .unwrap();
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn test_create_rejects_duplicate_seed_rows() {
        let err = Database::create(
            "users",
            vec!["username".into()],
            vec![],
            vec![row(json!({ "username": "a" })), row(json!({ "username": "a" }))],
        )
        .unwrap_err();
        assert!(matches!(err, PathDbError::FieldDuplicated { .. }));
    }

    #[test]
    fn test_name() {
        let mut db = users();
        assert_eq!(db.name(), "users");
        db.set_name("accounts");
        assert_eq!(db.name(), "accounts");
    }

    #[test]
    fn test_get_column_undeclared() {
        let err = seeded().get_column("password").unwrap_err();
        assert!(matches!(err, PathDbError::InvalidFieldPath { .. }));
    }

    #[test]
    fn test_unique_lookup_miss_is_none() {
        let db = seeded();
        assert!(db.get_row_by_unique_field("username", &json!("zoe")).unwrap().is_none());
    }

    #[test]
    fn test_unique_lookup_requires_unique_field() {
        let err = seeded().get_row_by_unique_field("age", &json!(30)).unwrap_err();
        assert!(matches!(err, PathDbError::InvalidFieldPath { .. }));
    }

    #[test]
    fn test_rows_by_field() {
        let mut db = seeded();
        db.append_row(row(json!({ "username": "zoe", "age": 25 }))).unwrap();

        let thirty = db.get_rows_by_field("age", &json!(30)).unwrap();
        let names: Vec<&Value> = thirty.iter().map(|r| &r["username"]).collect();
        assert_eq!(names, vec![&json!("james"), &json!("mary")]);
        for r in &thirty {
            assert_eq!(get_field_contents(r, "age").unwrap(), &json!(30));
        }

        assert!(db.get_rows_by_field("age", &json!(99)).unwrap().is_empty());
    }

    #[test]
    fn test_rows_by_field_requires_non_unique_field() {
        let err = seeded().get_rows_by_field("username", &json!("james")).unwrap_err();
        assert!(matches!(err, PathDbError::InvalidFieldPath { .. }));
    }

    #[test]
    fn test_set_field_value_rules() {
        let db = seeded();
        let mut r = Row::new();

        db.set_field_value(&mut r, "age", json!(30)).unwrap();
        db.set_field_value(&mut r, "username", json!("new")).unwrap();

        let err = db.set_field_value(&mut r, "username", json!("mary")).unwrap_err();
        assert!(matches!(err, PathDbError::FieldDuplicated { .. }));
        assert_eq!(r["username"], json!("new"));

        let err = db.set_field_value(&mut r, "password", json!("x")).unwrap_err();
        assert!(matches!(err, PathDbError::InvalidFieldPath { .. }));
    }

    #[test]
    fn test_set_row_field_has_no_self_exclusion() {
        let mut db = seeded();
        let index = db
            .position_by_unique_field("username", &json!("james"))
            .unwrap()
            .unwrap();

        let err = db.set_row_field(index, "username", json!("james")).unwrap_err();
        assert!(matches!(err, PathDbError::FieldDuplicated { .. }));

        db.set_row_field(index, "username", json!("jim")).unwrap();
        db.set_row_field(index, "age", json!(31)).unwrap();
        assert_eq!(
            db.get_row_by_unique_field("username", &json!("jim")).unwrap().unwrap()["age"],
            json!(31)
        );
    }

    #[test]
    fn test_set_row_field_parent_of_unique_field() {
        let mut db = Database::create(
            "people",
            vec!["profile/name".into()],
            vec!["profile".into()],
            vec![
                row(json!({ "profile": { "name": "a" } })),
                row(json!({ "profile": { "name": "b" } })),
            ],
        )
        .unwrap();

        let err = db.set_row_field(1, "profile", json!({ "name": "a" })).unwrap_err();
        assert!(matches!(err, PathDbError::FieldDuplicated { ref path, .. } if path == "profile/name"));
        assert_eq!(db.get_column("profile/name").unwrap(), vec![&json!("a"), &json!("b")]);

        db.set_row_field(1, "profile", json!({ "name": "c" })).unwrap();
        assert_eq!(db.get_column("profile/name").unwrap(), vec![&json!("a"), &json!("c")]);
    }

    #[test]
    fn test_set_row_field_child_of_unique_field() {
        let mut db = Database::create(
            "people",
            vec!["profile".into()],
            vec!["profile/name".into()],
            vec![
                row(json!({ "profile": { "name": "a" } })),
                row(json!({ "profile": { "name": "b" } })),
            ],
        )
        .unwrap();

        let err = db.set_row_field(1, "profile/name", json!("a")).unwrap_err();
        assert!(matches!(err, PathDbError::FieldDuplicated { ref path, .. } if path == "profile"));
        assert_eq!(db.rows().get(1).unwrap()["profile"], json!({ "name": "b" }));

        db.set_row_field(1, "profile/name", json!("c")).unwrap();
        assert_eq!(db.rows().get(1).unwrap()["profile"], json!({ "name": "c" }));
    }

    #[test]
    fn test_create_rejects_malformed_declared_path() {
        let err = Database::create("bad", vec!["a\\".into()], vec![], vec![]).unwrap_err();
        assert!(matches!(err, PathDbError::MalformedPath { .. }));

        let err = Database::create("bad", vec![], vec!["x/y\\".into()], vec![]).unwrap_err();
        assert!(matches!(err, PathDbError::MalformedPath { .. }));
    }

    #[test]
    fn test_set_row_field_out_of_range() {
        let mut db = seeded();
        let err = db.set_row_field(7, "age", json!(1)).unwrap_err();
        assert!(matches!(err, PathDbError::InvalidFieldPath { .. }));
    }

    #[test]
    fn test_uniqueness_invariant_after_updates() {
        let mut db = seeded();
        let _ = db.set_row_field(1, "username", json!("james"));
        let _ = db.append_row(row(json!({ "username": "mary", "age": 1 })));
        db.append_row(row(json!({ "username": "zoe", "age": 1 }))).unwrap();

        let column = db.get_column("username").unwrap();
        for (i, value) in column.iter().enumerate() {
            assert!(!column[i + 1..].contains(value), "duplicate {value}");
        }
    }

    #[test]
    fn test_create_row() {
        let db = seeded();
        let r = db
            .create_row(vec![
                ("username".into(), json!("zoe")),
                ("age".into(), json!(20)),
                ("age".into(), json!(21)),
            ])
            .unwrap();
        assert_eq!(r, row(json!({ "username": "zoe", "age": 21 })));
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn test_create_row_failures() {
        let db = seeded();

        let err = db
            .create_row(vec![("username".into(), json!("james"))])
            .unwrap_err();
        assert!(matches!(err, PathDbError::FieldDuplicated { .. }));

        let err = db
            .create_row(vec![("username".into(), json!("x")), ("nope".into(), json!(1))])
            .unwrap_err();
        assert!(matches!(err, PathDbError::InvalidFieldPath { .. }));
    }

    #[test]
    fn test_nested_path() {
        let mut db = Database::create(
            "people",
            vec!["profile/name".into()],
            vec!["profile".into()],
            vec![],
        )
        .unwrap();

        let r = db
            .create_row(vec![
                ("profile".into(), json!({})),
                ("profile/name".into(), json!("x")),
            ])
            .unwrap();
        assert_eq!(get_field_contents(&r, "profile/name").unwrap(), &json!("x"));

        let err = get_field_contents(&r, "profile/missing").unwrap_err();
        assert!(matches!(err, PathDbError::InvalidFieldPath { .. }));

        db.append_row(r).unwrap();
        assert!(db
            .get_row_by_unique_field("profile/name", &json!("x"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_nested_write_needs_parent() {
        let db = Database::create("people", vec![], vec!["profile/name".into()], vec![]).unwrap();
        let err = db
            .create_row(vec![("profile/name".into(), json!("x"))])
            .unwrap_err();
        assert!(matches!(err, PathDbError::InvalidFieldPath { .. }));
    }

    #[test]
    fn test_escaped_field_name() {
        let mut db = Database::create("files", vec!["a\\/b".into()], vec![], vec![]).unwrap();
        let r = db.create_row(vec![("a\\/b".into(), json!(1))]).unwrap();
        assert_eq!(r, row(json!({ "a/b": 1 })));
        db.append_row(r).unwrap();
        assert_eq!(db.get_column("a\\/b").unwrap(), vec![&json!(1)]);
    }
}
