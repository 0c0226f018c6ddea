//! Schema-driven validation and planning
//!
//! These run the parts of a plan that follow mechanically from the schema:
//! required/computed checks, attribute validators, unknown marking for
//! computed attributes and plan modifiers.

use crate::plan_modifier::PlanModifyRequest;
use crate::schema::{AttributeType, Schema};
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

/// Check a configuration against its schema
pub fn validate_config(schema: &Schema, config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if let Some(values) = config.value.as_map() {
        for name in values.keys() {
            if schema.attribute(name).is_none() {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Unsupported argument: {}", name),
                        format!("An argument named {:?} is not expected here", name),
                    )
                    .with_attribute(AttributePath::new(name)),
                );
            }
        }
    }

    for attr in &schema.block.attributes {
        let path = AttributePath::new(&attr.name);
        let value = config.value.attr(&attr.name);

        if attr.required && value.is_null() {
            diagnostics.push(
                Diagnostic::error(
                    format!("Missing required argument: {}", attr.name),
                    format!("The argument {:?} is required, but no definition was found", attr.name),
                )
                .with_attribute(path),
            );
            continue;
        }

        if attr.computed && !attr.optional && !attr.required && !value.is_null() {
            diagnostics.push(
                Diagnostic::error(
                    format!("Invalid configuration for {}", attr.name),
                    format!("{:?} is computed by the provider and cannot be set", attr.name),
                )
                .with_attribute(path),
            );
            continue;
        }

        if !conforms(value, &attr.r#type) {
            diagnostics.push(
                Diagnostic::error(
                    format!("Incorrect attribute value type for {}", attr.name),
                    format!("expected {}, got {}", attr.r#type.type_json(), value.type_name()),
                )
                .with_attribute(path),
            );
            continue;
        }

        if attr.deprecated && value.is_known() {
            diagnostics.push(
                Diagnostic::warning(
                    format!("Deprecated attribute: {}", attr.name),
                    attr.description.clone(),
                )
                .with_attribute(path.clone()),
            );
        }

        for validator in &attr.validators {
            validator.validate(value, &path, &mut diagnostics);
        }
    }

    diagnostics
}

/// Whether a value fits a type; null and unknown fit anything
fn conforms(value: &Dynamic, ty: &AttributeType) -> bool {
    match (value, ty) {
        (Dynamic::Null | Dynamic::Unknown, _) => true,
        (Dynamic::String(_), AttributeType::String)
        | (Dynamic::Number(_), AttributeType::Number)
        | (Dynamic::Bool(_), AttributeType::Bool) => true,
        (Dynamic::List(items), AttributeType::List(elem) | AttributeType::Set(elem)) => {
            items.iter().all(|item| conforms(item, elem))
        }
        (Dynamic::Map(entries), AttributeType::Map(elem)) => {
            entries.values().all(|v| conforms(v, elem))
        }
        (Dynamic::Map(entries), AttributeType::Object(attrs)) => entries
            .iter()
            .all(|(k, v)| attrs.get(k).is_some_and(|t| conforms(v, t))),
        _ => false,
    }
}

pub struct PlannedChange {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Turn Terraform's proposed new state into the planned state
///
/// Computed attributes the configuration leaves null become unknown when
/// the resource is being created or changed, then every attribute's plan
/// modifiers run in declaration order.
pub fn plan_resource_change(
    schema: &Schema,
    prior_state: &DynamicValue,
    proposed_new_state: &DynamicValue,
    config: &DynamicValue,
) -> PlannedChange {
    let mut planned = PlannedChange {
        planned_state: proposed_new_state.clone(),
        requires_replace: Vec::new(),
        diagnostics: Vec::new(),
    };

    // destroy
    if proposed_new_state.is_null() {
        return planned;
    }

    let creating = prior_state.is_null();
    let changing = creating || configured_values_differ(schema, prior_state, proposed_new_state);

    for attr in &schema.block.attributes {
        let path = AttributePath::new(&attr.name);
        let config_value = config.value.attr(&attr.name).clone();
        let state_value = prior_state.value.attr(&attr.name).clone();
        let proposed_value = planned.planned_state.value.attr(&attr.name).clone();
        let mut plan_value = proposed_value.clone();

        if attr.computed && config_value.is_null() && changing {
            plan_value = Dynamic::Unknown;
        }

        for modifier in &attr.plan_modifiers {
            let response = modifier.modify_plan(PlanModifyRequest {
                state: state_value.clone(),
                plan: plan_value,
                config: config_value.clone(),
                attribute_path: path.clone(),
            });
            plan_value = response.plan_value;
            if response.requires_replace && !creating {
                planned.requires_replace.push(path.clone());
            }
            planned.diagnostics.extend(response.diagnostics);
        }

        if plan_value == proposed_value {
            continue;
        }
        if let Err(e) = planned.planned_state.set(&path, plan_value) {
            planned.diagnostics.push(
                Diagnostic::error("Failed to build planned state", e.to_string())
                    .with_attribute(path),
            );
        }
    }

    planned
}

fn configured_values_differ(schema: &Schema, prior: &DynamicValue, proposed: &DynamicValue) -> bool {
    schema
        .block
        .attributes
        .iter()
        .filter(|attr| attr.required || attr.optional)
        .any(|attr| prior.value.attr(&attr.name) != proposed.value.attr(&attr.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan_modifier::{RequiresReplace, UseStateForUnknown};
    use crate::schema::{AttributeBuilder, SchemaBuilder};
    use crate::validator::OneOfValidator;

    fn schema() -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("primary_key", AttributeType::String)
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("action", AttributeType::String)
                    .optional()
                    .validator(OneOfValidator::new(&["allow", "block"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("status", AttributeType::String)
                    .optional()
                    .computed()
                    .build(),
            )
            .build()
    }

    fn value(pairs: &[(&str, Dynamic)]) -> DynamicValue {
        let mut dv = DynamicValue::object();
        for (name, v) in pairs {
            dv.set(&AttributePath::new(name), v.clone()).unwrap();
        }
        dv
    }

    #[test]
    fn validate_reports_missing_required() {
        let diags = validate_config(&schema(), &value(&[]));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute, Some(AttributePath::new("primary_key")));
    }

    #[test]
    fn validate_rejects_computed_only_and_unknown_attributes() {
        let config = value(&[
            ("primary_key", Dynamic::from("p1")),
            ("id", Dynamic::from("x")),
            ("bogus", Dynamic::from("y")),
        ]);
        let diags = validate_config(&schema(), &config);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn validate_runs_attribute_validators() {
        let config = value(&[
            ("primary_key", Dynamic::from("p1")),
            ("action", Dynamic::from("drop")),
        ]);
        let diags = validate_config(&schema(), &config);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute, Some(AttributePath::new("action")));
    }

    #[test]
    fn validate_checks_types() {
        let config = value(&[("primary_key", Dynamic::Number(1.0))]);
        let diags = validate_config(&schema(), &config);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].summary.contains("type"));
    }

    #[test]
    fn create_marks_computed_attributes_unknown() {
        let config = value(&[("primary_key", Dynamic::from("p1"))]);
        let planned =
            plan_resource_change(&schema(), &DynamicValue::null(), &config.clone(), &config);

        let state = planned.planned_state;
        assert_eq!(state.get(&AttributePath::new("id")), Some(&Dynamic::Unknown));
        assert_eq!(state.get(&AttributePath::new("status")), Some(&Dynamic::Unknown));
        assert!(planned.requires_replace.is_empty());
    }

    #[test]
    fn update_keeps_id_from_state() {
        let prior = value(&[
            ("id", Dynamic::from("p1")),
            ("primary_key", Dynamic::from("p1")),
            ("action", Dynamic::from("allow")),
            ("status", Dynamic::from("enable")),
        ]);
        let config = value(&[
            ("primary_key", Dynamic::from("p1")),
            ("action", Dynamic::from("block")),
        ]);
        let mut proposed = prior.clone();
        proposed
            .set(&AttributePath::new("action"), Dynamic::from("block"))
            .unwrap();

        let planned = plan_resource_change(&schema(), &prior, &proposed, &config);
        let state = planned.planned_state;
        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "p1");
        assert_eq!(state.get(&AttributePath::new("status")), Some(&Dynamic::Unknown));
        assert!(planned.requires_replace.is_empty());
    }

    #[test]
    fn no_change_plan_is_stable() {
        let prior = value(&[
            ("id", Dynamic::from("p1")),
            ("primary_key", Dynamic::from("p1")),
            ("status", Dynamic::from("enable")),
        ]);
        let config = value(&[("primary_key", Dynamic::from("p1"))]);

        let planned = plan_resource_change(&schema(), &prior, &prior.clone(), &config);
        assert_eq!(planned.planned_state, prior);
    }

    #[test]
    fn renaming_primary_key_requires_replace() {
        let prior = value(&[
            ("id", Dynamic::from("p1")),
            ("primary_key", Dynamic::from("p1")),
        ]);
        let config = value(&[("primary_key", Dynamic::from("p2"))]);
        let mut proposed = prior.clone();
        proposed
            .set(&AttributePath::new("primary_key"), Dynamic::from("p2"))
            .unwrap();

        let planned = plan_resource_change(&schema(), &prior, &proposed, &config);
        assert_eq!(planned.requires_replace, vec![AttributePath::new("primary_key")]);
    }

    #[test]
    fn destroy_plans_null() {
        let prior = value(&[("primary_key", Dynamic::from("p1"))]);
        let planned = plan_resource_change(
            &schema(),
            &prior,
            &DynamicValue::null(),
            &DynamicValue::null(),
        );
        assert!(planned.planned_state.is_null());
    }
}
