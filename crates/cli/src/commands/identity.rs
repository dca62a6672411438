//! `identity` command implementation.

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};

use crate::cli::IdentityArgs;

/// Execute the `identity` command
pub fn run_identity(args: &IdentityArgs) -> Result<()> {
    let output = identity_document(args)?;
    let json = serde_json::to_string_pretty(&output).context("Failed to serialize identity")?;
    println!("{}", json);
    Ok(())
}

fn identity_document(args: &IdentityArgs) -> Result<Value> {
    let extra_fields = if args.fields.is_empty() {
        None
    } else {
        Some(
            args.fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect::<Map<_, _>>(),
        )
    };

    let identity = identity::build_identity(
        &args.unit_type,
        args.correlation_id.as_deref(),
        args.trace_id.as_deref(),
        extra_fields,
    )
    .context("Failed to build identity")?;
    let record_key = identity::build_record_key();

    Ok(json!({
        "headers": identity.headers(),
        "key": { "recordId": record_key.record_id().as_str() },
    }))
}
