pub mod path;
pub mod schema;
pub mod rows;
pub mod database;
pub mod persistence;
pub mod error;

pub use error::{PathDbError, Result};
pub use path::FieldPath;
pub use schema::{FieldKind, Schema};
pub use rows::{Row, RowStore};
pub use database::{get_field_contents, Database};
pub use persistence::{FileStorage, Storage};
