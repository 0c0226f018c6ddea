//! Schema types and builders
//!
//! A schema declares the attributes of a provider, resource or data source:
//! their types, whether they are required, optional or computed, and the
//! validators and plan modifiers attached to them.

use crate::plan_modifier::PlanModifier;
use crate::validator::Validator;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Terraform type of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
    /// Ordered, allows duplicates
    List(Box<AttributeType>),
    /// Unordered, no duplicates
    Set(Box<AttributeType>),
    /// String keys only
    Map(Box<AttributeType>),
    Object(BTreeMap<String, AttributeType>),
}

impl AttributeType {
    pub fn list(elem: AttributeType) -> Self {
        AttributeType::List(Box::new(elem))
    }

    pub fn set(elem: AttributeType) -> Self {
        AttributeType::Set(Box::new(elem))
    }

    pub fn map(elem: AttributeType) -> Self {
        AttributeType::Map(Box::new(elem))
    }

    /// JSON type expression as Terraform encodes it on the wire,
    /// e.g. `["list",["object",{"action":"string"}]]`
    pub fn type_json(&self) -> serde_json::Value {
        match self {
            AttributeType::String => json!("string"),
            AttributeType::Number => json!("number"),
            AttributeType::Bool => json!("bool"),
            AttributeType::List(elem) => json!(["list", elem.type_json()]),
            AttributeType::Set(elem) => json!(["set", elem.type_json()]),
            AttributeType::Map(elem) => json!(["map", elem.type_json()]),
            AttributeType::Object(attrs) => {
                let attrs: serde_json::Map<String, serde_json::Value> = attrs
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.type_json()))
                    .collect();
                json!(["object", attrs])
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    /// Bump when a change requires state migration
    pub version: i64,
    pub block: Block,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub attributes: Vec<Attribute>,
    pub description: String,
    pub deprecated: bool,
}

#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub deprecated: bool,
    pub validators: Vec<Arc<dyn Validator>>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("deprecated", &self.deprecated)
            .field("validators", &self.validators.len())
            .field("plan_modifiers", &self.plan_modifiers.len())
            .finish()
    }
}

/// Fluent construction of attributes
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                deprecated: false,
                validators: Vec::new(),
                plan_modifiers: Vec::new(),
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.attribute.deprecated = true;
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.attribute.validators.push(Arc::new(validator));
        self
    }

    pub fn plan_modifier(mut self, modifier: impl PlanModifier + 'static) -> Self {
        self.attribute.plan_modifiers.push(Arc::new(modifier));
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// Fluent construction of schemas
#[derive(Default)]
pub struct SchemaBuilder {
    version: i64,
    block: Block,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.block.description = desc.to_string();
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.block.deprecated = true;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.block.attributes.push(attr);
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            version: self.version,
            block: self.block,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::StringLengthValidator;

    #[test]
    fn builder_creates_required_string() {
        let attr = AttributeBuilder::new("primary_key", AttributeType::String)
            .description("Profile name")
            .optional()
            .required()
            .validator(StringLengthValidator::between(1, 35))
            .build();

        assert!(attr.required);
        assert!(!attr.optional);
        assert_eq!(attr.validators.len(), 1);
        assert_eq!(attr.description, "Profile name");
    }

    #[test]
    fn schema_lookup_by_name() {
        let schema = SchemaBuilder::new()
            .version(1)
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("comment", AttributeType::String)
                    .optional()
                    .build(),
            )
            .build();

        assert_eq!(schema.version, 1);
        assert!(schema.attribute("id").unwrap().computed);
        assert!(schema.attribute("missing").is_none());
    }

    #[test]
    fn type_json_matches_terraform_encoding() {
        let reference = AttributeType::Object(BTreeMap::from([
            ("datasource".to_string(), AttributeType::String),
            ("primary_key".to_string(), AttributeType::String),
        ]));
        let ty = AttributeType::set(reference);

        assert_eq!(
            ty.type_json(),
            json!(["set", ["object", {"datasource": "string", "primary_key": "string"}]])
        );
        assert_eq!(
            AttributeType::map(AttributeType::Number).type_json(),
            json!(["map", "number"])
        );
    }
}
