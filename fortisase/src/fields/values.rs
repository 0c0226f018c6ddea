//! Conversions between wire values and Terraform values

use super::FieldKind;
use serde_json::Value;
use tfplug::Dynamic;

/// A wire value that does not have the shape its field declares
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("expected {expected}, got {actual}")]
pub struct ShapeError {
    pub expected: &'static str,
    pub actual: &'static str,
}

impl ShapeError {
    pub(crate) fn new(expected: &'static str, actual: &Value) -> Self {
        Self {
            expected,
            actual: wire_type_name(actual),
        }
    }
}

pub(crate) fn wire_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Strings pass through; numbers and bools are rendered as text since the
/// API is not consistent about quoting them.
pub fn parse_string_value(value: &Value) -> Result<Dynamic, ShapeError> {
    match value {
        Value::Null => Ok(Dynamic::Null),
        Value::String(s) => Ok(Dynamic::String(s.clone())),
        Value::Number(n) => Ok(Dynamic::String(n.to_string())),
        Value::Bool(b) => Ok(Dynamic::String(b.to_string())),
        other => Err(ShapeError::new("string", other)),
    }
}

/// Accepts numbers and numeric strings
pub fn parse_float64_value(value: &Value) -> Result<Dynamic, ShapeError> {
    match value {
        Value::Null => Ok(Dynamic::Null),
        Value::Number(n) => n
            .as_f64()
            .map(Dynamic::Number)
            .ok_or_else(|| ShapeError::new("number", value)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Dynamic::Number)
            .map_err(|_| ShapeError::new("number", value)),
        other => Err(ShapeError::new("number", other)),
    }
}

pub fn parse_bool_value(value: &Value) -> Result<Dynamic, ShapeError> {
    match value {
        Value::Null => Ok(Dynamic::Null),
        Value::Bool(b) => Ok(Dynamic::Bool(*b)),
        Value::String(s) if s == "true" => Ok(Dynamic::Bool(true)),
        Value::String(s) if s == "false" => Ok(Dynamic::Bool(false)),
        other => Err(ShapeError::new("bool", other)),
    }
}

/// Parse a set of scalars, dropping nulls and duplicates. `[]` and
/// `[null]` both give an empty set.
pub fn parse_set_value(
    value: &Value,
    parse: fn(&Value) -> Result<Dynamic, ShapeError>,
) -> Result<Dynamic, ShapeError> {
    let items = match value {
        Value::Null => return Ok(Dynamic::Null),
        Value::Array(items) => items,
        other => return Err(ShapeError::new("set", other)),
    };

    let mut out: Vec<Dynamic> = Vec::with_capacity(items.len());
    for item in items {
        let parsed = parse(item)?;
        if !parsed.is_null() && !out.contains(&parsed) {
            out.push(parsed);
        }
    }
    Ok(Dynamic::List(out))
}

/// Deep equality of two values of the same field kind. Sets match
/// regardless of order, and a missing object attribute equals null.
pub fn is_same_struct(kind: &FieldKind, a: &Dynamic, b: &Dynamic) -> bool {
    match (kind, a, b) {
        (_, Dynamic::Null, Dynamic::Null) | (_, Dynamic::Unknown, Dynamic::Unknown) => true,
        (FieldKind::Object(fields), Dynamic::Map(_), Dynamic::Map(_)) => fields
            .iter()
            .all(|f| is_same_struct(&f.kind, a.attr(f.name), b.attr(f.name))),
        (FieldKind::List(elem), Dynamic::List(xs), Dynamic::List(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys.iter())
                    .all(|(x, y)| is_same_struct(elem, x, y))
        }
        (FieldKind::Set(elem), Dynamic::List(xs), Dynamic::List(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|x| ys.iter().any(|y| is_same_struct(elem, x, y)))
                && ys
                    .iter()
                    .all(|y| xs.iter().any(|x| is_same_struct(elem, x, y)))
        }
        (FieldKind::Map(elem), Dynamic::Map(xs), Dynamic::Map(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| is_same_struct(elem, x, y)))
        }
        (FieldKind::String | FieldKind::Bool | FieldKind::Number, _, _) => a == b,
        _ => false,
    }
}

/// Known string members of a set, in order
pub fn expand_set_to_string_list(value: &Dynamic) -> Vec<String> {
    value
        .as_list()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{REFERENCE, STRING};
    use serde_json::json;
    use std::collections::HashMap;

    fn reference(pk: &str) -> Dynamic {
        Dynamic::Map(HashMap::from([
            ("primary_key".to_string(), Dynamic::from(pk)),
            ("datasource".to_string(), Dynamic::from("network/hosts")),
        ]))
    }

    #[test]
    fn strings_tolerate_scalar_wire_types() {
        assert_eq!(parse_string_value(&json!("a")), Ok(Dynamic::from("a")));
        assert_eq!(parse_string_value(&json!(443)), Ok(Dynamic::from("443")));
        assert_eq!(parse_string_value(&Value::Null), Ok(Dynamic::Null));
        assert!(parse_string_value(&json!({"a": 1})).is_err());
    }

    #[test]
    fn numbers_accept_numeric_strings() {
        assert_eq!(parse_float64_value(&json!(1.5)), Ok(Dynamic::Number(1.5)));
        assert_eq!(parse_float64_value(&json!("42")), Ok(Dynamic::Number(42.0)));

        let err = parse_float64_value(&json!("forty")).unwrap_err();
        assert_eq!(err.to_string(), "expected number, got string");
    }

    #[test]
    fn bools_accept_literal_strings() {
        assert_eq!(parse_bool_value(&json!(true)), Ok(Dynamic::Bool(true)));
        assert_eq!(parse_bool_value(&json!("false")), Ok(Dynamic::Bool(false)));
        assert!(parse_bool_value(&json!("enable")).is_err());
    }

    #[test]
    fn set_parsing_drops_nulls_and_duplicates() {
        let set = parse_set_value(&json!(["a", null, "b", "a"]), parse_string_value).unwrap();
        assert_eq!(set, Dynamic::from(vec!["a", "b"]));

        let empty = parse_set_value(&json!([null]), parse_string_value).unwrap();
        assert_eq!(empty, Dynamic::List(vec![]));

        assert_eq!(
            parse_set_value(&Value::Null, parse_string_value).unwrap(),
            Dynamic::Null
        );
        assert!(parse_set_value(&json!("a"), parse_string_value).is_err());
    }

    #[test]
    fn sets_compare_without_order() {
        let kind = FieldKind::Set(&STRING);
        let a = Dynamic::from(vec!["x", "y"]);
        let b = Dynamic::from(vec!["y", "x"]);
        assert!(is_same_struct(&kind, &a, &b));

        let lists = FieldKind::List(&STRING);
        assert!(!is_same_struct(&lists, &a, &b));
    }

    #[test]
    fn reference_sets_compare_deeply() {
        let kind = FieldKind::Set(&REFERENCE);
        let a = Dynamic::List(vec![reference("h1"), reference("h2")]);
        let b = Dynamic::List(vec![reference("h2"), reference("h1")]);
        let c = Dynamic::List(vec![reference("h2"), reference("h3")]);

        assert!(is_same_struct(&kind, &a, &b));
        assert!(!is_same_struct(&kind, &a, &c));
    }

    #[test]
    fn missing_attribute_equals_null() {
        let mut partial = HashMap::new();
        partial.insert("primary_key".to_string(), Dynamic::from("h1"));
        let mut explicit = partial.clone();
        explicit.insert("datasource".to_string(), Dynamic::Null);

        assert!(is_same_struct(
            &REFERENCE,
            &Dynamic::Map(partial),
            &Dynamic::Map(explicit)
        ));
    }

    #[test]
    fn null_differs_from_empty() {
        let kind = FieldKind::List(&STRING);
        assert!(!is_same_struct(&kind, &Dynamic::Null, &Dynamic::List(vec![])));
    }

    #[test]
    fn string_list_skips_non_strings() {
        let set = Dynamic::List(vec![Dynamic::from("a"), Dynamic::Unknown, Dynamic::from("b")]);
        assert_eq!(expand_set_to_string_list(&set), vec!["a", "b"]);
        assert!(expand_set_to_string_list(&Dynamic::Null).is_empty());
    }
}
