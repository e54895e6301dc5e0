//! Table descriptions and key normalization.
//!
//! Callers describe a table with a [`TableDef`] (or a name plus
//! [`TableOptions`]); [`normalize_table`] resolves the requested key shape
//! into a definitive `(key path, autoincrement)` pair, producing a
//! [`TableSpec`] ready to be queued and later applied to a storage engine.
//!
//! Normalization is a pure function: caller-supplied values are consumed by
//! value and a fresh record is returned, so no caller-visible data is ever
//! mutated in place.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::key::{KeyPart, KeyPath, KeySpec};

/// Errors raised while normalizing a table description.
///
/// Each variant is scoped to a single table; the offending table's name is
/// carried in the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The key shape implies engine-generated keys while the caller
    /// explicitly disabled them.
    #[error("table '{0}': autoincrement is implied by the key but explicitly disabled")]
    AutoincrementContradiction(String),
}

/// Options accepted when creating a table, minus the name.
///
/// Both fields are optional: the default describes a table with no key
/// path and no opinion about autoincrement.
///
/// # Examples
///
/// ```
/// use storeplan_core::{KeySpec, TableOptions};
///
/// let opts = TableOptions::new().with_key(KeySpec::field("id"));
/// assert_eq!(opts.key, KeySpec::field("id"));
/// assert_eq!(opts.autoincrement, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TableOptions {
    /// Requested key shape. `KeySpec::None` when the table has no key path.
    pub key: KeySpec,
    /// Explicit autoincrement request. `None` means the caller never said.
    pub autoincrement: Option<bool>,
}

impl TableOptions {
    /// Creates empty options (no key path, autoincrement unset).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key shape.
    pub fn with_key(mut self, key: KeySpec) -> Self {
        self.key = key;
        self
    }

    /// Sets the autoincrement flag explicitly.
    pub fn with_autoincrement(mut self, autoincrement: bool) -> Self {
        self.autoincrement = Some(autoincrement);
        self
    }
}

impl From<KeySpec> for TableOptions {
    /// Options carrying only a key shape, autoincrement unset.
    fn from(key: KeySpec) -> Self {
        Self {
            key,
            autoincrement: None,
        }
    }
}

/// A complete table description: name plus options in one value.
///
/// This is the merged-object entry point; the name-and-options pair form
/// is provided by recorder methods that build a `TableDef` internally.
///
/// # Examples
///
/// ```
/// use storeplan_core::{KeySpec, TableDef};
///
/// let def = TableDef::new("articles")
///     .with_key(KeySpec::sequence(["year", "issue"]))
///     .with_autoincrement(false);
/// assert_eq!(def.name, "articles");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    /// Table name.
    pub name: String,
    /// Requested key shape.
    pub key: KeySpec,
    /// Explicit autoincrement request, if any.
    pub autoincrement: Option<bool>,
}

impl TableDef {
    /// Creates a definition with only a name (no key path, autoincrement
    /// unset).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: KeySpec::None,
            autoincrement: None,
        }
    }

    /// Sets the key shape.
    pub fn with_key(mut self, key: KeySpec) -> Self {
        self.key = key;
        self
    }

    /// Sets the autoincrement flag explicitly.
    pub fn with_autoincrement(mut self, autoincrement: bool) -> Self {
        self.autoincrement = Some(autoincrement);
        self
    }
}

/// A normalized table description, as carried in the operation log.
///
/// The key, when present, is free of autoincrement markers; whether the
/// engine should generate keys is answered by `autoincrement` alone.
/// `autoincrement = None` records that the caller expressed no preference;
/// replay treats it as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name.
    pub name: String,
    /// Normalized key path, or `None` for out-of-line keys.
    pub key: Option<KeyPath>,
    /// Definitive autoincrement flag. Never ambiguous relative to `key`:
    /// if the requested key shape implied autoincrement this is `Some(true)`.
    pub autoincrement: Option<bool>,
}

/// Normalizes a table description into a [`TableSpec`].
///
/// The requested key shape is resolved as follows:
///
/// - no key or a plain field name: passed through untouched, and the
///   autoincrement flag is whatever the caller said (a string key never
///   implies autoincrement);
/// - the autoincrement marker alone: the key path is removed entirely
///   (engines treat "no key path + autoincrement" as an internally
///   generated numeric key) and autoincrement becomes `true`;
/// - a sequence containing the marker: every occurrence of the marker is
///   filtered out (more than one occurrence is not an error), the
///   remaining field names keep their order, and autoincrement becomes
///   `true`. A sequence without the marker passes through untouched, as
///   does an empty sequence.
///
/// # Errors
///
/// Returns [`NormalizeError::AutoincrementContradiction`] when the key
/// shape implies autoincrement and the caller explicitly passed `false`.
///
/// # Examples
///
/// ```
/// use storeplan_core::{normalize_table, KeyPart, KeyPath, KeySpec, TableDef};
///
/// let def = TableDef::new("logs").with_key(KeySpec::Sequence(vec![
///     "host".into(),
///     KeyPart::Autoincrement,
///     "day".into(),
/// ]));
/// let spec = normalize_table(def).unwrap();
/// assert_eq!(
///     spec.key,
///     Some(KeyPath::Composite(vec!["host".to_string(), "day".to_string()]))
/// );
/// assert_eq!(spec.autoincrement, Some(true));
/// ```
pub fn normalize_table(def: TableDef) -> Result<TableSpec, NormalizeError> {
    let TableDef {
        name,
        key,
        autoincrement,
    } = def;

    let (key, implied) = match key {
        KeySpec::None => (None, false),
        KeySpec::Field(field) => (Some(KeyPath::Field(field)), false),
        KeySpec::Autoincrement => (None, true),
        KeySpec::Sequence(parts) => {
            let implied = parts
                .iter()
                .any(|part| matches!(part, KeyPart::Autoincrement));
            let fields = parts
                .into_iter()
                .filter_map(|part| match part {
                    KeyPart::Field(field) => Some(field),
                    KeyPart::Autoincrement => None,
                })
                .collect();
            (Some(KeyPath::Composite(fields)), implied)
        }
    };

    let autoincrement = if implied {
        if autoincrement == Some(false) {
            return Err(NormalizeError::AutoincrementContradiction(name));
        }
        Some(true)
    } else {
        autoincrement
    };

    Ok(TableSpec {
        name,
        key,
        autoincrement,
    })
}
