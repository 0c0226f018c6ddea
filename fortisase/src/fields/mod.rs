//! Declarative field tables
//!
//! Every resource is described by a table of `Field`s pairing a Terraform
//! attribute name with the camelCase key it has on the wire. One generic
//! engine walks these tables to turn API responses into state (`flatten`),
//! configuration into request bodies (`expand`, `expand_changes`) and to
//! derive the Terraform schema.

mod expand;
mod flatten;
mod schema;
mod values;

pub use expand::{expand, expand_changes, expand_value};
pub use flatten::flatten;
pub use schema::{attribute_type, data_source_schema_for, schema_for};
pub use values::{
    expand_set_to_string_list, is_same_struct, parse_bool_value, parse_float64_value,
    parse_set_value, parse_string_value, ShapeError,
};

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    String,
    Bool,
    Number,
    Object(&'static [Field]),
    List(&'static FieldKind),
    /// Unordered; compared without regard to element order
    Set(&'static FieldKind),
    /// String keys
    Map(&'static FieldKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Required,
    Optional,
    /// Set by the API only
    Computed,
    /// User may set it; the API fills it in otherwise
    OptionalComputed,
}

#[derive(Debug, Clone, Copy)]
pub enum Check {
    /// String length, inclusive
    Length(usize, usize),
    Range(f64, f64),
    OneOf(&'static [&'static str]),
    /// Element count of a list or set
    Size(usize, usize),
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub wire: &'static str,
    pub kind: FieldKind,
    pub mode: Mode,
    pub description: &'static str,
    pub sensitive: bool,
    pub check: Option<Check>,
}

impl Field {
    pub const fn new(name: &'static str, wire: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            wire,
            kind,
            mode: Mode::OptionalComputed,
            description: "",
            sensitive: false,
            check: None,
        }
    }

    pub const fn string(name: &'static str, wire: &'static str) -> Self {
        Self::new(name, wire, FieldKind::String)
    }

    pub const fn bool(name: &'static str, wire: &'static str) -> Self {
        Self::new(name, wire, FieldKind::Bool)
    }

    pub const fn number(name: &'static str, wire: &'static str) -> Self {
        Self::new(name, wire, FieldKind::Number)
    }

    pub const fn object(name: &'static str, wire: &'static str, fields: &'static [Field]) -> Self {
        Self::new(name, wire, FieldKind::Object(fields))
    }

    pub const fn list(name: &'static str, wire: &'static str, elem: &'static FieldKind) -> Self {
        Self::new(name, wire, FieldKind::List(elem))
    }

    pub const fn set(name: &'static str, wire: &'static str, elem: &'static FieldKind) -> Self {
        Self::new(name, wire, FieldKind::Set(elem))
    }

    pub const fn map(name: &'static str, wire: &'static str, elem: &'static FieldKind) -> Self {
        Self::new(name, wire, FieldKind::Map(elem))
    }

    /// A single `{primary_key, datasource}` link to another object
    pub const fn reference(name: &'static str, wire: &'static str) -> Self {
        Self::object(name, wire, REFERENCE_FIELDS)
    }

    /// An unordered set of links to other objects
    pub const fn references(name: &'static str, wire: &'static str) -> Self {
        Self::set(name, wire, &REFERENCE)
    }

    pub const fn required(self) -> Self {
        Self {
            mode: Mode::Required,
            ..self
        }
    }

    pub const fn optional(self) -> Self {
        Self {
            mode: Mode::Optional,
            ..self
        }
    }

    pub const fn computed(self) -> Self {
        Self {
            mode: Mode::Computed,
            ..self
        }
    }

    pub const fn sensitive(self) -> Self {
        Self {
            sensitive: true,
            ..self
        }
    }

    pub const fn describe(self, description: &'static str) -> Self {
        Self {
            description,
            ..self
        }
    }

    pub const fn check(self, check: Check) -> Self {
        Self {
            check: Some(check),
            ..self
        }
    }

    /// Whether the user may write this field
    pub fn is_configurable(&self) -> bool {
        self.mode != Mode::Computed
    }
}

pub const STRING: FieldKind = FieldKind::String;
pub const NUMBER: FieldKind = FieldKind::Number;

pub const REFERENCE_FIELDS: &[Field] = &[
    Field::string("primary_key", "primaryKey")
        .required()
        .describe("Primary key of the referenced object"),
    Field::string("datasource", "datasource")
        .required()
        .describe("API collection the referenced object lives in"),
];

pub const REFERENCE: FieldKind = FieldKind::Object(REFERENCE_FIELDS);

/// Look up a field by its Terraform attribute name
pub fn field<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
    fields.iter().find(|f| f.name == name)
}
