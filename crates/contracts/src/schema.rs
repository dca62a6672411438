//! SchemaValidator trait - narrow interface to the schema collaborator

use serde_json::Value;

use crate::CoordError;

/// Payload validation keyed by the identity type.
pub trait SchemaValidator: Send + Sync {
    /// Validate `data` against the schema registered for `schema_type`
    ///
    /// # Errors
    /// `CoordError::Validation` listing one violation per line
    /// (field path, violated rule, expected vs actual)
    fn validate(&self, schema_type: &str, data: &Value) -> Result<(), CoordError>;
}
