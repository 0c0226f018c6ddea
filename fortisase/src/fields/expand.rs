//! Terraform values to wire format

use super::values::is_same_struct;
use super::{Field, FieldKind};
use serde_json::{Map, Number, Value};
use tfplug::Dynamic;

/// Request body for a create: every configurable field that is known and
/// not null
pub fn expand(model: &Dynamic, fields: &[Field]) -> Map<String, Value> {
    let mut body = Map::new();
    for field in fields.iter().filter(|f| f.is_configurable()) {
        if let Some(value) = expand_value(model.attr(field.name), &field.kind) {
            body.insert(field.wire.to_string(), value);
        }
    }
    body
}

/// Request body for an update: only fields that are known, not null and
/// different from the prior state. Scalars and collections follow the
/// same rule; sets are compared without regard to order.
pub fn expand_changes(plan: &Dynamic, prior: &Dynamic, fields: &[Field]) -> Map<String, Value> {
    let mut body = Map::new();
    for field in fields.iter().filter(|f| f.is_configurable()) {
        let new = plan.attr(field.name);
        if !new.is_known() || is_same_struct(&field.kind, new, prior.attr(field.name)) {
            continue;
        }
        if let Some(value) = expand_value(new, &field.kind) {
            body.insert(field.wire.to_string(), value);
        }
    }
    body
}

/// `None` for null and unknown values
pub fn expand_value(value: &Dynamic, kind: &FieldKind) -> Option<Value> {
    if !value.is_known() {
        return None;
    }

    match (kind, value) {
        (FieldKind::String, Dynamic::String(s)) => Some(Value::String(s.clone())),
        (FieldKind::Bool, Dynamic::Bool(b)) => Some(Value::Bool(*b)),
        (FieldKind::Number, Dynamic::Number(n)) => Some(number(*n)),
        (FieldKind::Object(fields), Dynamic::Map(_)) => Some(Value::Object(expand(value, fields))),
        (FieldKind::List(elem) | FieldKind::Set(elem), Dynamic::List(items)) => Some(Value::Array(
            items
                .iter()
                .map(|item| expand_value(item, elem).unwrap_or(Value::Null))
                .collect(),
        )),
        (FieldKind::Map(elem), Dynamic::Map(entries)) => Some(Value::Object(
            entries
                .iter()
                .filter_map(|(k, v)| expand_value(v, elem).map(|v| (k.clone(), v)))
                .collect(),
        )),
        _ => {
            tracing::warn!(
                "dropping {} value that does not match its field kind {:?}",
                value.type_name(),
                kind
            );
            None
        }
    }
}

/// Whole numbers go out as integers; the API rejects `443.0` for ports
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}
