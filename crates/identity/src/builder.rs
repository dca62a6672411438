//! Identity / record key construction
//!
//! Precedence per id field: `extra_fields` value → explicit argument →
//! fresh random token. `type` comes from `extra_fields.type` when set,
//! otherwise from the unit type, and is never generated.
//!
//! Reserved fields given as numbers or booleans are used in their string
//! form; `null` and `""` count as absent; objects and arrays are rejected.

use contracts::{
    CoordError, Identity, RecordKey, Token, CORRELATION_ID_KEY, TRACE_ID_KEY, TYPE_KEY,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::token::{random_token, CORRELATION_TOKEN_BYTES, RECORD_TOKEN_BYTES};

/// Builder for [`Identity`]
///
/// # Example
///
/// ```
/// use identity::IdentityBuilder;
///
/// let identity = IdentityBuilder::new("order.created")
///     .correlation_id("req-42")
///     .build()
///     .unwrap();
/// assert_eq!(identity.correlation_id(), "req-42");
/// assert_eq!(identity.trace_id().len(), 32);
/// ```
#[derive(Debug, Clone, Default)]
pub struct IdentityBuilder {
    unit_type: String,
    correlation_id: Option<Token>,
    trace_id: Option<Token>,
    extra_fields: Map<String, Value>,
}

impl IdentityBuilder {
    pub fn new(unit_type: impl Into<String>) -> Self {
        Self {
            unit_type: unit_type.into(),
            ..Self::default()
        }
    }

    pub fn correlation_id(mut self, id: impl Into<Token>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn trace_id(mut self, id: impl Into<Token>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Caller fields merged into the identity; they win over the explicit ids
    pub fn extra_fields(mut self, fields: Map<String, Value>) -> Self {
        self.extra_fields = fields;
        self
    }

    /// Add a single caller field
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_fields.insert(key.into(), value.into());
        self
    }

    /// Resolve every field and build the identity.
    ///
    /// # Errors
    /// - `CoordError::MissingType` when neither the unit type nor
    ///   `extra_fields.type` yields a non-empty type.
    /// - `CoordError::Validation` when a reserved field is an object or array.
    pub fn build(self) -> Result<Identity, CoordError> {
        let correlation_id = resolve_id(
            &self.extra_fields,
            CORRELATION_ID_KEY,
            self.correlation_id,
        )?;
        let trace_id = resolve_id(&self.extra_fields, TRACE_ID_KEY, self.trace_id)?;
        let unit_type = field_str(&self.extra_fields, TYPE_KEY)?.unwrap_or(self.unit_type);

        let identity = Identity::try_new(correlation_id, trace_id, unit_type, self.extra_fields)?;
        debug!(
            correlation_id = %identity.correlation_id(),
            trace_id = %identity.trace_id(),
            unit_type = identity.unit_type(),
            "Identity built"
        );
        Ok(identity)
    }
}

/// Build an identity for one unit of work.
///
/// Empty explicit ids count as absent.
pub fn build_identity(
    unit_type: &str,
    correlation_id: Option<&str>,
    trace_id: Option<&str>,
    extra_fields: Option<Map<String, Value>>,
) -> Result<Identity, CoordError> {
    let mut builder = IdentityBuilder::new(unit_type);
    if let Some(id) = correlation_id {
        builder = builder.correlation_id(id);
    }
    if let Some(id) = trace_id {
        builder = builder.trace_id(id);
    }
    if let Some(fields) = extra_fields {
        builder = builder.extra_fields(fields);
    }
    builder.build()
}

/// Fresh 8-byte record key. Never reused across units of work.
pub fn build_record_key() -> RecordKey {
    RecordKey::new(random_token(RECORD_TOKEN_BYTES))
}

fn resolve_id(
    fields: &Map<String, Value>,
    key: &str,
    explicit: Option<Token>,
) -> Result<Token, CoordError> {
    Ok(field_str(fields, key)?
        .map(Token::from)
        .or_else(|| explicit.filter(|t| !t.is_empty()))
        .unwrap_or_else(|| random_token(CORRELATION_TOKEN_BYTES)))
}

/// String form of a reserved caller field, `None` when absent
fn field_str(fields: &Map<String, Value>, key: &str) -> Result<Option<String>, CoordError> {
    let value = match fields.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => {
            let kind = if other.is_array() { "array" } else { "object" };
            return Err(CoordError::Validation {
                schema_type: "identity".to_string(),
                violations: vec![format!(
                    "{key}: expected a string, number or boolean, got {kind}"
                )],
            });
        }
    };
    Ok(Some(value).filter(|s| !s.is_empty()))
}
