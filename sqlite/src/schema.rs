//! SQL generation for table shapes.
//!
//! Every storeplan table maps to one SQLite table holding a `value` BLOB
//! payload column plus whatever key columns the table's key path calls
//! for:
//!
//! - no key path → a `key` column (out-of-line keys), rendered as
//!   `INTEGER PRIMARY KEY AUTOINCREMENT` when the table autoincrements;
//! - a single-field key path → that field as the primary key column;
//! - a composite key path → one column per field and a compound
//!   `PRIMARY KEY`; a zero-field composite degenerates to the out-of-line
//!   layout.
//!
//! All names are interpolated into SQL text, so they are validated as
//! identifiers first.

use storeplan_core::KeyPath;

use crate::error::{Result, SqliteError};

/// Validates a database, table, or field name for direct use in SQL and
/// file names: letters, digits, and underscores only, not starting with a
/// digit.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !valid {
        return Err(SqliteError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Generates the `CREATE TABLE` statement for one table shape.
///
/// # Errors
///
/// [`SqliteError::InvalidName`] when the table or a key field is not a
/// valid identifier; [`SqliteError::AutoincrementCompositeKey`] when
/// `autoincrement` is requested together with a composite key path, which
/// this engine rejects.
pub fn create_table_sql(
    name: &str,
    key_path: Option<&KeyPath>,
    autoincrement: bool,
) -> Result<String> {
    validate_identifier(name)?;

    let sql = match key_path {
        None => {
            if autoincrement {
                format!("CREATE TABLE {name} (key INTEGER PRIMARY KEY AUTOINCREMENT, value BLOB);")
            } else {
                format!("CREATE TABLE {name} (key BLOB PRIMARY KEY, value BLOB);")
            }
        }
        Some(KeyPath::Field(field)) => {
            validate_identifier(field)?;
            if autoincrement {
                format!("CREATE TABLE {name} ({field} INTEGER PRIMARY KEY AUTOINCREMENT, value BLOB);")
            } else {
                format!("CREATE TABLE {name} ({field} BLOB PRIMARY KEY, value BLOB);")
            }
        }
        Some(KeyPath::Composite(fields)) if fields.is_empty() => {
            // A zero-field compound key carries no addressing information;
            // store it like an out-of-line key.
            if autoincrement {
                return Err(SqliteError::AutoincrementCompositeKey(name.to_string()));
            }
            format!("CREATE TABLE {name} (key BLOB PRIMARY KEY, value BLOB);")
        }
        Some(KeyPath::Composite(fields)) => {
            if autoincrement {
                return Err(SqliteError::AutoincrementCompositeKey(name.to_string()));
            }
            for field in fields {
                validate_identifier(field)?;
            }
            let columns = fields
                .iter()
                .map(|field| format!("{field} BLOB NOT NULL"))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "CREATE TABLE {name} ({columns}, value BLOB, PRIMARY KEY ({}));",
                fields.join(", ")
            )
        }
    };
    Ok(sql)
}

/// Generates the `DROP TABLE` statement for one table.
pub fn drop_table_sql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("DROP TABLE {name};"))
}
