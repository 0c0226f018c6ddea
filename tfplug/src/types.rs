//! Core value model for tfplug
//!
//! Terraform values are tri-state: a known value, an explicit null, or a value
//! that is not known until apply. `Dynamic` keeps the three apart so that an
//! absent attribute never collapses into a zero value on its way through the
//! provider.

use crate::error::{Result, TfplugError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Placeholder used when an unknown value has to cross an encoding that has
/// no native representation for it.
const UNKNOWN_SENTINEL: &str = "74D93920-ED26-11E3-AC10-0800200C9A66";

/// A Terraform value of any type
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Dynamic {
    #[default]
    Null,
    /// Not known until apply (computed attributes during planning)
    Unknown,
    Bool(bool),
    /// Terraform numbers are carried as f64
    Number(f64),
    String(String),
    /// Lists and sets; objects and maps use `Map`
    List(Vec<Dynamic>),
    Map(HashMap<String, Dynamic>),
}

impl Dynamic {
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Dynamic::Unknown)
    }

    /// Neither null nor unknown
    pub fn is_known(&self) -> bool {
        !self.is_null() && !self.is_unknown()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Dynamic::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Dynamic]> {
        match self {
            Dynamic::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Dynamic>> {
        match self {
            Dynamic::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Attribute lookup on an object value; missing keys read as null
    pub fn attr(&self, name: &str) -> &Dynamic {
        static NULL: Dynamic = Dynamic::Null;
        self.as_map().and_then(|m| m.get(name)).unwrap_or(&NULL)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Unknown => "unknown",
            Dynamic::Bool(_) => "bool",
            Dynamic::Number(_) => "number",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "map",
        }
    }
}

impl From<&str> for Dynamic {
    fn from(s: &str) -> Self {
        Dynamic::String(s.to_string())
    }
}

impl From<String> for Dynamic {
    fn from(s: String) -> Self {
        Dynamic::String(s)
    }
}

impl From<bool> for Dynamic {
    fn from(b: bool) -> Self {
        Dynamic::Bool(b)
    }
}

impl From<f64> for Dynamic {
    fn from(n: f64) -> Self {
        Dynamic::Number(n)
    }
}

impl<T: Into<Dynamic>> From<Vec<T>> for Dynamic {
    fn from(items: Vec<T>) -> Self {
        Dynamic::List(items.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Dynamic {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Dynamic::Null => serializer.serialize_none(),
            Dynamic::Unknown if serializer.is_human_readable() => {
                serializer.serialize_str(UNKNOWN_SENTINEL)
            }
            // msgpack carries unknowns as extension type 0
            Dynamic::Unknown => serializer
                .serialize_newtype_struct(rmp_serde::MSGPACK_EXT_STRUCT_NAME, &(0i8, ExtPayload)),
            Dynamic::Bool(b) => serializer.serialize_bool(*b),
            Dynamic::Number(n) => serializer.serialize_f64(*n),
            Dynamic::String(s) => serializer.serialize_str(s),
            Dynamic::List(items) => items.serialize(serializer),
            Dynamic::Map(m) => m.serialize(serializer),
        }
    }
}

/// Body of the msgpack unknown-value extension
struct ExtPayload;

impl Serialize for ExtPayload {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&[0])
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{Error, MapAccess, SeqAccess, Visitor};

        struct DynamicVisitor;

        impl<'de> Visitor<'de> for DynamicVisitor {
            type Value = Dynamic;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a terraform value")
            }

            fn visit_unit<E: Error>(self) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Null)
            }

            fn visit_none<E: Error>(self) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Null)
            }

            fn visit_some<D2>(self, d: D2) -> std::result::Result<Dynamic, D2::Error>
            where
                D2: serde::Deserializer<'de>,
            {
                Dynamic::deserialize(d)
            }

            fn visit_newtype_struct<D2>(self, d: D2) -> std::result::Result<Dynamic, D2::Error>
            where
                D2: serde::Deserializer<'de>,
            {
                // only msgpack extensions arrive here; Terraform uses them
                // for unknown values alone
                let _ = <(i8, serde::de::IgnoredAny)>::deserialize(d)?;
                Ok(Dynamic::Unknown)
            }

            fn visit_bool<E: Error>(self, v: bool) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Bool(v))
            }

            fn visit_i64<E: Error>(self, v: i64) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Number(v as f64))
            }

            fn visit_u64<E: Error>(self, v: u64) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Number(v as f64))
            }

            fn visit_f64<E: Error>(self, v: f64) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Number(v))
            }

            fn visit_str<E: Error>(self, v: &str) -> std::result::Result<Dynamic, E> {
                Ok(if v == UNKNOWN_SENTINEL {
                    Dynamic::Unknown
                } else {
                    Dynamic::String(v.to_string())
                })
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<Dynamic, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Dynamic::List(items))
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Dynamic, A::Error> {
                let mut map = HashMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<String, Dynamic>()? {
                    map.insert(k, v);
                }
                Ok(Dynamic::Map(map))
            }
        }

        deserializer.deserialize_any(DynamicVisitor)
    }
}

/// An object-shaped value exchanged between Terraform and the provider:
/// configuration, plans and state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynamicValue {
    pub value: Dynamic,
}

impl DynamicValue {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self::default()
    }

    /// An empty object, the usual starting point for building state
    pub fn object() -> Self {
        Self::new(Dynamic::Map(HashMap::new()))
    }

    pub fn unknown() -> Self {
        Self::new(Dynamic::Unknown)
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn encode_msgpack(&self) -> Result<Vec<u8>> {
        if self.value.is_null() {
            return Ok(Vec::new());
        }
        rmp_serde::to_vec(&self.value)
            .map_err(|e| TfplugError::EncodingError(format!("msgpack: {}", e)))
    }

    pub fn decode_msgpack(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::null());
        }
        rmp_serde::from_slice(data)
            .map(Self::new)
            .map_err(|e| TfplugError::DecodingError(format!("msgpack: {}", e)))
    }

    pub fn encode_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.value)
            .map_err(|e| TfplugError::EncodingError(format!("json: {}", e)))
    }

    pub fn decode_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map(Self::new)
            .map_err(|e| TfplugError::DecodingError(format!("json: {}", e)))
    }

    /// Raw lookup. `None` means the path does not exist, which callers
    /// should treat the same as null.
    pub fn get(&self, path: &AttributePath) -> Option<&Dynamic> {
        let mut current = &self.value;
        for step in &path.steps {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => m.get(name)?,
                (Dynamic::List(items), AttributePathStep::ElementKeyInt(idx)) => {
                    items.get(usize::try_from(*idx).ok()?)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    fn get_known(&self, path: &AttributePath, expected: &str) -> Result<&Dynamic> {
        match self.get(path) {
            None => Err(TfplugError::AttributeNotFound(path.to_string())),
            Some(v) if !v.is_known() => Err(TfplugError::TypeMismatch {
                expected: expected.to_string(),
                actual: v.type_name().to_string(),
            }),
            Some(v) => Ok(v),
        }
    }

    fn mismatch(expected: &str, actual: &Dynamic) -> TfplugError {
        TfplugError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
        }
    }

    pub fn get_string(&self, path: &AttributePath) -> Result<String> {
        let v = self.get_known(path, "string")?;
        v.as_str()
            .map(str::to_string)
            .ok_or_else(|| Self::mismatch("string", v))
    }

    pub fn get_number(&self, path: &AttributePath) -> Result<f64> {
        let v = self.get_known(path, "number")?;
        v.as_number().ok_or_else(|| Self::mismatch("number", v))
    }

    pub fn get_bool(&self, path: &AttributePath) -> Result<bool> {
        let v = self.get_known(path, "bool")?;
        v.as_bool().ok_or_else(|| Self::mismatch("bool", v))
    }

    pub fn get_list(&self, path: &AttributePath) -> Result<Vec<Dynamic>> {
        let v = self.get_known(path, "list")?;
        v.as_list()
            .map(<[Dynamic]>::to_vec)
            .ok_or_else(|| Self::mismatch("list", v))
    }

    pub fn get_map(&self, path: &AttributePath) -> Result<HashMap<String, Dynamic>> {
        let v = self.get_known(path, "map")?;
        v.as_map().cloned().ok_or_else(|| Self::mismatch("map", v))
    }

    pub fn set_string(&mut self, path: &AttributePath, value: impl Into<String>) -> Result<()> {
        self.set(path, Dynamic::String(value.into()))
    }

    pub fn set_number(&mut self, path: &AttributePath, value: f64) -> Result<()> {
        self.set(path, Dynamic::Number(value))
    }

    pub fn set_bool(&mut self, path: &AttributePath, value: bool) -> Result<()> {
        self.set(path, Dynamic::Bool(value))
    }

    /// Write a value, creating intermediate objects as needed. List
    /// elements must already exist.
    pub fn set(&mut self, path: &AttributePath, value: Dynamic) -> Result<()> {
        let Some((last, parents)) = path.steps.split_last() else {
            self.value = value;
            return Ok(());
        };

        if !matches!(self.value, Dynamic::Map(_)) {
            self.value = Dynamic::Map(HashMap::new());
        }

        let mut current = &mut self.value;
        for step in parents {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                    let slot = m.entry(name.clone()).or_default();
                    if !matches!(slot, Dynamic::Map(_) | Dynamic::List(_)) {
                        *slot = Dynamic::Map(HashMap::new());
                    }
                    slot
                }
                (Dynamic::List(items), AttributePathStep::ElementKeyInt(idx)) => {
                    let len = items.len();
                    usize::try_from(*idx)
                        .ok()
                        .and_then(|i| items.get_mut(i))
                        .ok_or_else(|| {
                            TfplugError::InvalidPath(format!(
                                "{}: index {} out of bounds (len {})",
                                path, idx, len
                            ))
                        })?
                }
                _ => return Err(TfplugError::InvalidPath(path.to_string())),
            };
        }

        match (current, last) {
            (Dynamic::Map(m), AttributePathStep::AttributeName(name))
            | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                m.insert(name.clone(), value);
                Ok(())
            }
            (Dynamic::List(items), AttributePathStep::ElementKeyInt(idx)) => {
                let slot = usize::try_from(*idx)
                    .ok()
                    .and_then(|i| items.get_mut(i))
                    .ok_or_else(|| TfplugError::InvalidPath(path.to_string()))?;
                *slot = value;
                Ok(())
            }
            _ => Err(TfplugError::InvalidPath(path.to_string())),
        }
    }
}

/// Path to an attribute within a value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributePath {
    pub steps: Vec<AttributePathStep>,
}

impl AttributePath {
    pub fn new(name: &str) -> Self {
        Self::root().attribute(name)
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.steps
            .push(AttributePathStep::AttributeName(name.to_string()));
        self
    }

    pub fn index(mut self, idx: i64) -> Self {
        self.steps.push(AttributePathStep::ElementKeyInt(idx));
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.steps
            .push(AttributePathStep::ElementKeyString(key.to_string()));
        self
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                AttributePathStep::AttributeName(name) if i == 0 => write!(f, "{}", name)?,
                AttributePathStep::AttributeName(name) => write!(f, ".{}", name)?,
                AttributePathStep::ElementKeyString(key) => write!(f, "[{:?}]", key)?,
                AttributePathStep::ElementKeyInt(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributePathStep {
    AttributeName(String),
    /// Map element
    ElementKeyString(String),
    /// List element
    ElementKeyInt(i64),
}

/// A warning or error reported back to Terraform
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Configuration values
pub type Config = DynamicValue;

/// Resource state values
pub type State = DynamicValue;
