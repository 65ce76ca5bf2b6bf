use serde::{Deserialize, Serialize};

/// Constraint class of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Unique,
    NonUnique,
}

/// Declared field paths of a database. Fixed once the database is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default)]
    pub(crate) unique_fields: Vec<String>,
    #[serde(default)]
    pub(crate) non_unique_fields: Vec<String>,
}

impl Schema {
    /// The two sets are expected to be disjoint. An overlap is only logged;
    /// such a path is treated as unique.
    pub fn new(unique_fields: Vec<String>, non_unique_fields: Vec<String>) -> Self {
        for path in &unique_fields {
            if non_unique_fields.contains(path) {
                log::warn!("Field '{path}' is declared both unique and non-unique; treating it as unique");
            }
        }
        Schema {
            unique_fields,
            non_unique_fields,
        }
    }

    pub fn unique_fields(&self) -> &[String] {
        &self.unique_fields
    }

    pub fn non_unique_fields(&self) -> &[String] {
        &self.non_unique_fields
    }

    /// All declared paths, unique fields first.
    pub fn declared_fields(&self) -> impl Iterator<Item = &str> {
        self.unique_fields
            .iter()
            .chain(&self.non_unique_fields)
            .map(String::as_str)
    }

    pub fn is_unique(&self, path: &str) -> bool {
        self.unique_fields.iter().any(|f| f == path)
    }

    pub fn is_non_unique(&self, path: &str) -> bool {
        self.non_unique_fields.iter().any(|f| f == path)
    }

    pub fn is_declared(&self, path: &str) -> bool {
        self.is_unique(path) || self.is_non_unique(path)
    }

    pub fn kind(&self, path: &str) -> Option<FieldKind> {
        if self.is_unique(path) {
            Some(FieldKind::Unique)
        } else if self.is_non_unique(path) {
            Some(FieldKind::NonUnique)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(
            vec!["username".into(), "contact/email".into()],
            vec!["age".into()],
        )
    }

    #[test]
    fn test_lookups() {
        let s = schema();
        assert!(s.is_unique("username"));
        assert!(s.is_unique("contact/email"));
        assert!(!s.is_unique("age"));
        assert!(s.is_non_unique("age"));
        assert!(s.is_declared("age"));
        assert!(!s.is_declared("password"));
    }

    #[test]
    fn test_kind() {
        let s = schema();
        assert_eq!(s.kind("username"), Some(FieldKind::Unique));
        assert_eq!(s.kind("age"), Some(FieldKind::NonUnique));
        assert_eq!(s.kind("missing"), None);
    }

    #[test]
    fn test_overlap_resolves_to_unique() {
        let s = Schema::new(vec!["id".into()], vec!["id".into()]);
        assert_eq!(s.kind("id"), Some(FieldKind::Unique));
    }

    #[test]
    fn test_declared_fields_order() {
        let s = schema();
        let fields: Vec<&str> = s.declared_fields().collect();
        assert_eq!(fields, vec!["username", "contact/email", "age"]);
    }
}
