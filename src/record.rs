//! Tabular record model.
//!
//! A [`Record`] is an ordered mapping from column name to JSON scalar,
//! backed by `serde_json::Map` (with `preserve_order` enabled) so that
//! column order from the source file survives loading, filtering, and
//! emission. Records are treated as immutable once loaded: every pipeline
//! stage that narrows or rewrites a record set produces new records rather
//! than mutating the originals.
//!
//! # Examples
//!
//! ```
//! use rowloom::record::Record;
//! use serde_json::json;
//!
//! let mut record = Record::new();
//! record.insert("PRODUCT_ID", json!("42"));
//! record.insert("PRODUCT_NAME", json!("  Widget  "));
//!
//! assert_eq!(record.id(), Some("42".to_string()));
//! let clean = record.normalized();
//! assert_eq!(clean.get_str("PRODUCT_NAME"), Some("Widget".to_string()));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column that uniquely identifies a record within a file.
pub const ID_COLUMN: &str = "PRODUCT_ID";

/// Columns every input file must carry. Validated by the loader, not by
/// the executor.
pub const REQUIRED_COLUMNS: &[&str] = &["PRODUCT_ID", "PRODUCT_NAME", "PRODUCT_DESCRIPTION"];

/// Ordered field storage shared by records and generation payloads.
pub type FieldMap = Map<String, Value>;

/// A single tabular record: column name → scalar value, in file order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: FieldMap,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing field map.
    #[must_use]
    pub fn from_fields(fields: FieldMap) -> Self {
        Self { fields }
    }

    /// Inserts a field, replacing any previous value for the column.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.fields.insert(column.into(), value);
    }

    /// Returns the raw value stored under `column`.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Returns the value under `column` coerced to its string form, or
    /// `None` if the column is absent.
    #[must_use]
    pub fn get_str(&self, column: &str) -> Option<String> {
        self.fields.get(column).map(coerce_scalar)
    }

    /// The record's identifier ([`ID_COLUMN`]), coerced to a string.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.get_str(ID_COLUMN)
    }

    /// Iterates columns in file order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterates `(column, value)` pairs in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Access the underlying field map.
    #[must_use]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Produces a normalized copy: every missing/null value becomes the
    /// empty string, every other value its trimmed string form. Running
    /// this on an already-normalized record yields an identical record.
    #[must_use]
    pub fn normalized(&self) -> Record {
        let mut fields = FieldMap::new();
        for (column, value) in &self.fields {
            fields.insert(column.clone(), Value::String(coerce_scalar(value)));
        }
        Record { fields }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Coerces a JSON scalar to its canonical string form.
///
/// Null maps to the empty string; strings are trimmed; numbers and booleans
/// use their display form. Nested structures fall back to compact JSON, so
/// nothing is dropped if an upstream source hands us non-scalar cells.
#[must_use]
pub fn coerce_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
