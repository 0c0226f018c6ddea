//! Terraform schemas derived from field tables

use super::{Check, FieldKind, Mode};
use crate::resources::{CreateMode, ResourceDefinition, DIRECTIONS};
use std::collections::BTreeMap;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic};
use tfplug::validator::{
    CollectionSizeValidator, NumberRangeValidator, OneOfValidator, StringLengthValidator,
    Validator,
};

pub fn attribute_type(kind: &FieldKind) -> AttributeType {
    match kind {
        FieldKind::String => AttributeType::String,
        FieldKind::Bool => AttributeType::Bool,
        FieldKind::Number => AttributeType::Number,
        FieldKind::Object(fields) => AttributeType::Object(
            fields
                .iter()
                .map(|f| (f.name.to_string(), attribute_type(&f.kind)))
                .collect::<BTreeMap<_, _>>(),
        ),
        FieldKind::List(elem) => AttributeType::list(attribute_type(elem)),
        FieldKind::Set(elem) => AttributeType::set(attribute_type(elem)),
        FieldKind::Map(elem) => AttributeType::map(attribute_type(elem)),
    }
}

pub fn schema_for(definition: &ResourceDefinition) -> Schema {
    let mut builder = SchemaBuilder::new()
        .version(0)
        .description(definition.description)
        .attribute(
            AttributeBuilder::new("id", AttributeType::String)
                .description("Identifier of the object; its primary key")
                .computed()
                .plan_modifier(UseStateForUnknown)
                .build(),
        );

    for field in definition.fields {
        let mut attr = AttributeBuilder::new(field.name, attribute_type(&field.kind))
            .description(field.description);
        attr = match field.mode {
            Mode::Required => attr.required(),
            Mode::Optional => attr.optional(),
            Mode::Computed => attr.computed().plan_modifier(UseStateForUnknown),
            Mode::OptionalComputed => attr.optional().computed(),
        };
        if field.sensitive {
            attr = attr.sensitive();
        }
        if field.name == "primary_key" && definition.create != CreateMode::Singleton {
            attr = attr.plan_modifier(RequiresReplace);
        }
        if let Some(check) = field.check {
            attr = with_check(attr, check);
        }
        if has_nested_checks(&field.kind) {
            attr = attr.validator(NestedChecks { kind: field.kind });
        }
        builder = builder.attribute(attr.build());
    }

    if definition.direction {
        builder = builder.attribute(
            AttributeBuilder::new("direction", AttributeType::String)
                .description("Profile direction, `internal-profiles` or `outbound-profiles`")
                .optional()
                .computed()
                .deprecated()
                .validator(OneOfValidator::new(DIRECTIONS))
                .plan_modifier(UseStateForUnknown)
                .plan_modifier(RequiresReplace)
                .build(),
        );
    }

    builder.build()
}

/// Lookup schema: the key selects the object, everything else is read back
pub fn data_source_schema_for(definition: &ResourceDefinition) -> Schema {
    let mut builder = SchemaBuilder::new()
        .version(0)
        .description(definition.description)
        .attribute(
            AttributeBuilder::new("id", AttributeType::String)
                .computed()
                .build(),
        );

    for field in definition.fields {
        let attr = AttributeBuilder::new(field.name, attribute_type(&field.kind))
            .description(field.description);
        let attr = if field.name == "primary_key" {
            attr.required()
        } else {
            attr.computed()
        };
        let attr = if field.sensitive { attr.sensitive() } else { attr };
        builder = builder.attribute(attr.build());
    }

    if definition.direction {
        builder = builder.attribute(
            AttributeBuilder::new("direction", AttributeType::String)
                .optional()
                .computed()
                .deprecated()
                .validator(OneOfValidator::new(DIRECTIONS))
                .build(),
        );
    }

    builder.build()
}

fn with_check(attr: AttributeBuilder, check: Check) -> AttributeBuilder {
    match check {
        Check::Length(min, max) => attr.validator(StringLengthValidator::between(min, max)),
        Check::Range(min, max) => attr.validator(NumberRangeValidator::between(min, max)),
        Check::OneOf(values) => attr.validator(OneOfValidator::new(values)),
        Check::Size(min, max) => attr.validator(CollectionSizeValidator::between(min, max)),
    }
}

fn run_check(check: Check, value: &Dynamic, path: &AttributePath, diags: &mut Vec<Diagnostic>) {
    match check {
        Check::Length(min, max) => StringLengthValidator::between(min, max).validate(value, path, diags),
        Check::Range(min, max) => NumberRangeValidator::between(min, max).validate(value, path, diags),
        Check::OneOf(values) => OneOfValidator::new(values).validate(value, path, diags),
        Check::Size(min, max) => CollectionSizeValidator::between(min, max).validate(value, path, diags),
    }
}

fn has_nested_checks(kind: &FieldKind) -> bool {
    match kind {
        FieldKind::Object(fields) => fields
            .iter()
            .any(|f| f.check.is_some() || has_nested_checks(&f.kind)),
        FieldKind::List(elem) | FieldKind::Set(elem) | FieldKind::Map(elem) => {
            has_nested_checks(elem)
        }
        _ => false,
    }
}

/// Runs the checks declared on fields inside nested objects, which have no
/// schema attribute of their own to hang a validator on
struct NestedChecks {
    kind: FieldKind,
}

impl NestedChecks {
    fn walk(kind: &FieldKind, value: &Dynamic, path: &AttributePath, diags: &mut Vec<Diagnostic>) {
        match kind {
            FieldKind::Object(fields) => {
                if value.as_map().is_none() {
                    return;
                }
                for field in fields.iter() {
                    let nested = value.attr(field.name);
                    let nested_path = path.clone().attribute(field.name);
                    if let Some(check) = field.check {
                        run_check(check, nested, &nested_path, diags);
                    }
                    Self::walk(&field.kind, nested, &nested_path, diags);
                }
            }
            FieldKind::List(elem) | FieldKind::Set(elem) => {
                for (i, item) in value.as_list().unwrap_or_default().iter().enumerate() {
                    Self::walk(elem, item, &path.clone().index(i as i64), diags);
                }
            }
            FieldKind::Map(elem) => {
                if let Some(entries) = value.as_map() {
                    for (key, item) in entries {
                        Self::walk(elem, item, &path.clone().key(key), diags);
                    }
                }
            }
            _ => {}
        }
    }
}

impl Validator for NestedChecks {
    fn description(&self) -> String {
        "nested attributes must satisfy their constraints".to_string()
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        Self::walk(&self.kind, value, path, diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Field;
    use crate::resources::{DeletePolicy, ResourceDefinition};
    use tfplug::plan::validate_config;
    use tfplug::DynamicValue;

    const RULE: FieldKind = FieldKind::Object(RULE_FIELDS);
    const RULE_FIELDS: &[Field] = &[Field::string("action", "action")
        .check(Check::OneOf(&["allow", "block"]))];
    const FIELDS: &[Field] = &[
        Field::string("primary_key", "primaryKey")
            .required()
            .check(Check::Length(1, 35)),
        Field::list("rules", "rules", &RULE),
        Field::string("secret", "secret").optional().sensitive(),
        Field::string("status", "status").computed(),
    ];

    static DEFINITION: ResourceDefinition = ResourceDefinition {
        type_name: "fortisase_test_object",
        description: "Test object",
        path: "/resource-api/v1/test/{direction}/objects",
        fields: FIELDS,
        create: CreateMode::Upsert,
        delete: DeletePolicy::Forget,
        lock: None,
        direction: true,
    };

    #[test]
    fn resource_schema_has_id_fields_and_direction() {
        let schema = schema_for(&DEFINITION);

        let id = schema.attribute("id").unwrap();
        assert!(id.computed);
        assert_eq!(id.plan_modifiers.len(), 1);

        let pk = schema.attribute("primary_key").unwrap();
        assert!(pk.required);
        assert_eq!(pk.validators.len(), 1);
        assert_eq!(pk.plan_modifiers.len(), 1);

        assert!(schema.attribute("secret").unwrap().sensitive);
        assert!(schema.attribute("status").unwrap().computed);
        assert!(!schema.attribute("status").unwrap().optional);
        assert!(schema.attribute("direction").unwrap().deprecated);
    }

    #[test]
    fn nested_types_mirror_field_tables() {
        let schema = schema_for(&DEFINITION);
        let rules = schema.attribute("rules").unwrap();
        assert_eq!(
            rules.r#type,
            AttributeType::list(AttributeType::Object(BTreeMap::from([(
                "action".to_string(),
                AttributeType::String
            )])))
        );
        assert!(rules.optional && rules.computed);
    }

    #[test]
    fn nested_checks_reach_list_elements() {
        let schema = schema_for(&DEFINITION);
        let config = DynamicValue::decode_json(
            br#"{"primary_key": "p1", "rules": [{"action": "allow"}, {"action": "drop"}]}"#,
        )
        .unwrap();

        let diags = validate_config(&schema, &config);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].attribute.as_ref().unwrap().to_string(),
            "rules[1].action"
        );
    }

    #[test]
    fn invalid_direction_is_rejected() {
        let schema = schema_for(&DEFINITION);
        let config =
            DynamicValue::decode_json(br#"{"primary_key": "p1", "direction": "sideways"}"#)
                .unwrap();
        let diags = validate_config(&schema, &config);
        let errors: Vec<_> = diags.iter().filter(|d| d.is_error()).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].detail.contains("outbound-profiles"));

        // the attribute is deprecated, so setting it also warns
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn data_source_schema_computes_everything_but_the_key() {
        let schema = data_source_schema_for(&DEFINITION);
        assert!(schema.attribute("primary_key").unwrap().required);
        let rules = schema.attribute("rules").unwrap();
        assert!(rules.computed && !rules.optional);
        assert!(rules.validators.is_empty());
        assert!(schema.attribute("secret").unwrap().sensitive);
    }
}
