//! Wire format to Terraform state

use super::values::{
    parse_bool_value, parse_float64_value, parse_set_value, parse_string_value, ShapeError,
};
use super::{Field, FieldKind};
use serde_json::Value;
use std::collections::HashMap;
use tfplug::{AttributePath, Diagnostic, Dynamic};

/// Build an object value holding every field of `fields`
///
/// Keys missing from `wire` come out null. A field whose wire value has the
/// wrong shape is reported and left empty; its siblings are unaffected.
/// A `wire` that is neither an object nor null is reported and flattens to
/// null rather than an object.
pub fn flatten(wire: &Value, fields: &[Field]) -> (Dynamic, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    if !matches!(wire, Value::Null | Value::Object(_)) {
        let e = ShapeError::new("object", wire);
        tracing::error!("failed to decode API response: {}", e);
        diagnostics.push(Diagnostic::error(
            "Unexpected value in API response",
            e.to_string(),
        ));
        return (Dynamic::Null, diagnostics);
    }
    let value = flatten_object(wire, fields, &AttributePath::root(), &mut diagnostics);
    (value, diagnostics)
}

fn flatten_object(
    wire: &Value,
    fields: &[Field],
    path: &AttributePath,
    diagnostics: &mut Vec<Diagnostic>,
) -> Dynamic {
    let object = wire.as_object();
    let mut out = HashMap::with_capacity(fields.len());

    for field in fields {
        let field_path = path.clone().attribute(field.name);
        let value = match object.and_then(|o| o.get(field.wire)) {
            None => Dynamic::Null,
            Some(v) => flatten_value(v, &field.kind, &field_path, diagnostics),
        };
        out.insert(field.name.to_string(), value);
    }

    Dynamic::Map(out)
}

fn flatten_value(
    wire: &Value,
    kind: &FieldKind,
    path: &AttributePath,
    diagnostics: &mut Vec<Diagnostic>,
) -> Dynamic {
    let parsed = match kind {
        FieldKind::String => parse_string_value(wire),
        FieldKind::Number => parse_float64_value(wire),
        FieldKind::Bool => parse_bool_value(wire),
        FieldKind::Object(fields) => match wire {
            Value::Null => Ok(Dynamic::Null),
            Value::Object(_) => Ok(flatten_object(wire, fields, path, diagnostics)),
            other => Err(ShapeError::new("object", other)),
        },
        FieldKind::List(elem) => flatten_list(wire, elem, path, diagnostics),
        FieldKind::Set(elem) => match elem {
            FieldKind::String => parse_set_value(wire, parse_string_value),
            FieldKind::Number => parse_set_value(wire, parse_float64_value),
            FieldKind::Bool => parse_set_value(wire, parse_bool_value),
            _ => flatten_list(wire, elem, path, diagnostics),
        },
        FieldKind::Map(elem) => match wire {
            Value::Null => Ok(Dynamic::Null),
            Value::Object(entries) => Ok(Dynamic::Map(
                entries
                    .iter()
                    .map(|(k, v)| {
                        let value = flatten_value(v, elem, &path.clone().key(k), diagnostics);
                        (k.clone(), value)
                    })
                    .collect(),
            )),
            other => Err(ShapeError::new("map", other)),
        },
    };

    match parsed {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("failed to decode {}: {}", path, e);
            diagnostics.push(
                Diagnostic::error(
                    "Unexpected value in API response",
                    format!("{}: {}", path, e),
                )
                .with_attribute(path.clone()),
            );
            empty_of(kind)
        }
    }
}

/// `[]` and `[null, ...]` flatten to an empty list
fn flatten_list(
    wire: &Value,
    elem: &FieldKind,
    path: &AttributePath,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Dynamic, ShapeError> {
    let items = match wire {
        Value::Null => return Ok(Dynamic::Null),
        Value::Array(items) => items,
        other => return Err(ShapeError::new("list", other)),
    };

    if items.first().map_or(true, Value::is_null) {
        return Ok(Dynamic::List(Vec::new()));
    }

    Ok(Dynamic::List(
        items
            .iter()
            .enumerate()
            .map(|(i, item)| flatten_value(item, elem, &path.clone().index(i as i64), diagnostics))
            .collect(),
    ))
}

fn empty_of(kind: &FieldKind) -> Dynamic {
    match kind {
        FieldKind::List(_) | FieldKind::Set(_) => Dynamic::List(Vec::new()),
        FieldKind::Map(_) => Dynamic::Map(HashMap::new()),
        _ => Dynamic::Null,
    }
}
