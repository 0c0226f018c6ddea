//! Import helpers for simplifying resource import implementations

use crate::context::Context;
use crate::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use crate::types::{AttributePath, Diagnostic, DynamicValue};

/// Sets the import ID to a specific attribute in state
///
/// Example: ID "p1" -> state.id = "p1"
pub fn import_state_passthrough_id(
    _ctx: &Context,
    attr_path: AttributePath,
    request: &ImportResourceStateRequest,
    response: &mut ImportResourceStateResponse,
) {
    let mut state = DynamicValue::object();

    if let Err(e) = state.set_string(&attr_path, request.id.clone()) {
        response.diagnostics.push(
            Diagnostic::error(
                format!("Failed to set import ID: {}", e),
                format!("Could not set attribute '{}' to value '{}'", attr_path, request.id),
            )
            .with_attribute(attr_path),
        );
        return;
    }

    response.imported_resources.push(ImportedResource {
        type_name: request.type_name.clone(),
        state,
    });
}

/// Splits a composite import ID such as `outbound-profiles/default` on `/`.
/// Any segment count other than `expected` is an error, as is an empty
/// segment.
pub fn split_import_id(id: &str, expected: usize) -> Result<Vec<String>, Diagnostic> {
    let parts: Vec<String> = id.split('/').map(str::to_string).collect();

    if parts.len() != expected || parts.iter().any(String::is_empty) {
        return Err(Diagnostic::error(
            "Unexpected import identifier",
            format!(
                "Expected {} segments separated by '/', got {:?}",
                expected, id
            ),
        ));
    }

    Ok(parts)
}
