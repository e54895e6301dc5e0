//! Primary-key specification types.
//!
//! A table's primary key is described twice in this crate, once in each
//! direction of normalization:
//!
//! - [`KeySpec`] is the caller-facing form. It may contain the
//!   autoincrement marker, either standing alone or mixed into a compound
//!   key sequence.
//! - [`KeyPath`] is the engine-facing form. All markers have been resolved
//!   into a separate autoincrement flag, so a key path only ever names
//!   record fields.
//!
//! The conversion between the two is performed by
//! [`normalize_table`](crate::normalize_table).

use serde::{Deserialize, Serialize};

/// One element of a compound key specification.
///
/// # Examples
///
/// ```
/// use storeplan_core::KeyPart;
///
/// let part: KeyPart = "title".into();
/// assert_eq!(part, KeyPart::Field("title".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyPart {
    /// A record field participating in the key.
    Field(String),
    /// The autoincrement marker. Removed during normalization and turned
    /// into the table's autoincrement flag.
    Autoincrement,
}

impl From<&str> for KeyPart {
    fn from(name: &str) -> Self {
        KeyPart::Field(name.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(name: String) -> Self {
        KeyPart::Field(name)
    }
}

/// A requested primary-key shape, before normalization.
///
/// This is the statically-typed rendering of the usual dynamic notation
/// where a key is "a string, a sentinel, or an array of either": every
/// shape a caller can ask for is one variant of this enum.
///
/// # Examples
///
/// ```
/// use storeplan_core::{KeyPart, KeySpec};
///
/// // No key path at all (out-of-line keys).
/// assert_eq!(KeySpec::default(), KeySpec::None);
///
/// // A single field.
/// let by_id = KeySpec::field("id");
///
/// // A compound key with an embedded autoincrement marker.
/// let with_marker = KeySpec::Sequence(vec!["year".into(), KeyPart::Autoincrement]);
/// # let _ = (by_id, with_marker);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum KeySpec {
    /// No key path. Records are addressed by keys supplied out of line.
    #[default]
    None,
    /// A single field name.
    Field(String),
    /// The autoincrement marker used in place of a key. Normalizes to no
    /// key path plus an engine-generated numeric key.
    Autoincrement,
    /// An ordered compound key. Parts may include the autoincrement
    /// marker, which normalization filters out.
    Sequence(Vec<KeyPart>),
}

impl KeySpec {
    /// Creates a single-field key specification.
    ///
    /// # Examples
    ///
    /// ```
    /// use storeplan_core::KeySpec;
    ///
    /// assert_eq!(KeySpec::field("id"), KeySpec::Field("id".to_string()));
    /// ```
    pub fn field(name: impl Into<String>) -> Self {
        KeySpec::Field(name.into())
    }

    /// Creates a compound key specification from anything convertible to
    /// key parts.
    ///
    /// # Examples
    ///
    /// ```
    /// use storeplan_core::{KeyPart, KeySpec};
    ///
    /// let key = KeySpec::sequence(["year", "issue"]);
    /// assert_eq!(
    ///     key,
    ///     KeySpec::Sequence(vec![KeyPart::from("year"), KeyPart::from("issue")])
    /// );
    /// ```
    pub fn sequence<I, P>(parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPart>,
    {
        KeySpec::Sequence(parts.into_iter().map(Into::into).collect())
    }

    /// Returns `true` when this specification is the absent key.
    pub fn is_none(&self) -> bool {
        matches!(self, KeySpec::None)
    }
}

/// A normalized key path, free of autoincrement markers.
///
/// This is what storage engines consume: either one field name or an
/// ordered list of field names. Whether the engine should generate keys
/// is carried separately, in the table's autoincrement flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyPath {
    /// A single field serves as the key.
    Field(String),
    /// Several fields form the key, in order. May be empty (a zero-field
    /// compound key is accepted and left to the engine's judgement).
    Composite(Vec<String>),
}

impl From<KeyPath> for KeySpec {
    /// Reconstructs the raw specification for an already-normalized key.
    ///
    /// Useful for feeding a normalized table description back through
    /// normalization; since a [`KeyPath`] carries no markers, doing so is
    /// a no-op.
    fn from(path: KeyPath) -> Self {
        match path {
            KeyPath::Field(name) => KeySpec::Field(name),
            KeyPath::Composite(fields) => {
                KeySpec::Sequence(fields.into_iter().map(KeyPart::Field).collect())
            }
        }
    }
}
