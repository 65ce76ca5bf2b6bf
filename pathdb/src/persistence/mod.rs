// Persistence - serialize a Database to a single JSON document and back

use crate::database::Database;
use crate::error::{PathDbError, Result};
use crate::rows::{Row, RowStore};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extension appended to the database name when no identifier is given.
pub const DEFAULT_EXTENSION: &str = "json";

/// Byte-level read/write of a named resource.
pub trait Storage {
    fn read(&self, identifier: &str) -> std::io::Result<Vec<u8>>;
    fn write(&self, identifier: &str, bytes: &[u8]) -> std::io::Result<()>;
}

/// Storage backed by files in a directory. Writes go to a temporary file
/// next to the target and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStorage { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, identifier: &str) -> PathBuf {
        self.root.join(identifier)
    }
}

impl Storage for FileStorage {
    fn read(&self, identifier: &str) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.path_of(identifier))
    }

    fn write(&self, identifier: &str, bytes: &[u8]) -> std::io::Result<()> {
        let target = self.path_of(identifier);
        let dir = target.parent().unwrap_or(&self.root);
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }
}

/// On-disk shape of a database.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseDocumentRef<'a> {
    name: &'a str,
    unique_fields: &'a [String],
    non_unique_fields: &'a [String],
    rows: &'a RowStore,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseDocument {
    name: String,
    unique_fields: Vec<String>,
    non_unique_fields: Vec<String>,
    rows: Vec<Row>,
}

/// `<name>.json`
pub fn default_identifier(db: &Database) -> String {
    format!("{}.{DEFAULT_EXTENSION}", db.name())
}

/// Serialize a database into its JSON document.
pub fn to_bytes(db: &Database) -> Result<Vec<u8>> {
    let doc = DatabaseDocumentRef {
        name: db.name(),
        unique_fields: db.schema().unique_fields(),
        non_unique_fields: db.schema().non_unique_fields(),
        rows: db.rows(),
    };
    serde_json::to_vec_pretty(&doc).map_err(|e| PathDbError::DatabaseObjectCorrupted(e.to_string()))
}

/// Parse a JSON document into a database. Stored rows are re-appended, so a
/// document that repeats a unique value is rejected as corrupted.
pub fn from_bytes(bytes: &[u8]) -> Result<Database> {
    let doc: DatabaseDocument =
        serde_json::from_slice(bytes).map_err(|e| PathDbError::DatabaseCorrupted(e.to_string()))?;

    Database::create(doc.name, doc.unique_fields, doc.non_unique_fields, doc.rows).map_err(|e| {
        match e {
            PathDbError::FieldDuplicated { .. } | PathDbError::MalformedPath { .. } => {
                PathDbError::DatabaseCorrupted(e.to_string())
            }
            other => other,
        }
    })
}

/// Load the database stored under `identifier`.
pub fn open<S: Storage + ?Sized>(storage: &S, identifier: &str) -> Result<Database> {
    let bytes = storage.read(identifier)?;
    let db = from_bytes(&bytes)?;
    log::debug!("Opened database '{}' from {identifier} ({} rows)", db.name(), db.len());
    Ok(db)
}

/// Store `db` under `identifier`, or under [`default_identifier`] when none
/// is given. Returns the identifier written.
pub fn save<S: Storage + ?Sized>(
    storage: &S,
    db: &Database,
    identifier: Option<&str>,
) -> Result<String> {
    let identifier = identifier
        .map(str::to_string)
        .unwrap_or_else(|| default_identifier(db));
    let bytes = to_bytes(db)?;
    storage.write(&identifier, &bytes)?;
    log::debug!("Saved database '{}' to {identifier} ({} rows)", db.name(), db.len());
    Ok(identifier)
}
