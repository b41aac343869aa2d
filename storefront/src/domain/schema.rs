//! Schema naming and provisioning status.

use std::fmt;

/// Schema used when configuration does not name one.
pub const DEFAULT_SCHEMA: &str = "storefront";

const MAX_IDENTIFIER_LEN: usize = 64;

/// Validation errors for schema names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaNameError {
    #[error("schema name must not be empty")]
    Empty,
    #[error("schema name exceeds {MAX_IDENTIFIER_LEN} characters")]
    TooLong,
    #[error("schema name `{0}` may only contain ASCII letters, digits, `_` and `$`")]
    InvalidCharacter(String),
}

/// Name of the MySQL schema holding the storefront tables.
///
/// ## Invariants
/// - 1 to 64 characters drawn from `[A-Za-z0-9_$]`, so it can be rendered
///   between backticks without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaName(String);

impl SchemaName {
    /// Validate a schema name.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::SchemaName;
    ///
    /// let name = SchemaName::new("storefront").expect("valid");
    /// assert_eq!(name.quoted(), "`storefront`");
    /// assert!(SchemaName::new("store; DROP").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, SchemaNameError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(SchemaNameError::Empty);
        }
        if raw.chars().count() > MAX_IDENTIFIER_LEN {
            return Err(SchemaNameError::TooLong);
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        {
            return Err(SchemaNameError::InvalidCharacter(raw));
        }
        Ok(Self(raw))
    }

    /// Raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backtick-quoted identifier.
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }

    /// Backtick-quoted, schema-qualified table name.
    pub fn qualify(&self, table: &str) -> String {
        format!("`{}`.`{table}`", self.0)
    }
}

impl Default for SchemaName {
    fn default() -> Self {
        Self(DEFAULT_SCHEMA.to_owned())
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What `ensure` had to do to make the schema usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    /// The schema was already present; no DDL ran.
    AlreadyPresent,
    /// The schema and both tables were created by this run.
    Provisioned,
}

impl fmt::Display for SchemaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AlreadyPresent => "already_present",
            Self::Provisioned => "provisioned",
        })
    }
}
