//! Resource catalog
//!
//! Each FortiSASE object type is a `ResourceDefinition`: where it lives in
//! the API, how it is created and deleted, and its field table. A single
//! generic implementation, `SaseResource`, serves every definition.

pub mod auth;
pub mod generic;
pub mod network;
pub mod security;

pub use generic::SaseResource;

use crate::fields::Field;

pub const DIRECTIONS: &[&str] = &["internal-profiles", "outbound-profiles"];

pub const DEFAULT_DIRECTION: &str = "outbound-profiles";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// POST to the collection; the API may assign the primary key
    Post,
    /// PUT to `<collection>/<primary_key>`; for objects that always exist
    /// under well-known names
    Upsert,
    /// One object per tenant, read and written at the collection path
    Singleton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    Remote,
    /// Drop from state only. Used for objects the provider does not own
    /// exclusively.
    Forget,
}

#[derive(Debug)]
pub struct ResourceDefinition {
    pub type_name: &'static str,
    pub description: &'static str,
    /// Collection path; `{direction}` is replaced for direction-qualified
    /// definitions
    pub path: &'static str,
    pub fields: &'static [Field],
    pub create: CreateMode,
    pub delete: DeletePolicy,
    /// Name of the write lock taken around create and update
    pub lock: Option<&'static str>,
    pub direction: bool,
}

impl ResourceDefinition {
    pub fn collection_path(&self, direction: Option<&str>) -> String {
        if self.direction {
            self.path
                .replace("{direction}", direction.unwrap_or(DEFAULT_DIRECTION))
        } else {
            self.path.to_string()
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.create == CreateMode::Singleton
    }

    /// Identifier recorded for singletons, which have no primary key
    pub fn singleton_id(&self) -> &'static str {
        self.path.rsplit('/').next().unwrap_or(self.path)
    }
}

pub fn catalog() -> &'static [&'static ResourceDefinition] {
    static CATALOG: &[&ResourceDefinition] = &[
        &security::DLP_PROFILE,
        &security::DLP_SENSOR,
        &security::ANTIVIRUS_PROFILE,
        &security::WEB_FILTER_PROFILE,
        &security::DNS_FILTER_PROFILE,
        &security::IPS_PROFILE,
        &security::FILE_FILTER_PROFILE,
        &security::APP_CONTROL_PROFILE,
        &security::SSL_SSH_PROFILE,
        &security::PROFILE_GROUP,
        &security::OUTBOUND_POLICY,
        &security::INTERNAL_POLICY,
        &security::SERVICE,
        &network::HOST,
        &network::HOST_GROUP,
        &network::DNS_RULE,
        &network::PRIVATE_ACCESS_NETWORK_CONFIGURATION,
        &auth::USER_GROUP,
    ];
    CATALOG
}

pub fn find(type_name: &str) -> Option<&'static ResourceDefinition> {
    catalog().iter().copied().find(|d| d.type_name == type_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{expand, expand_changes, field, flatten, FieldKind, Mode};
    use std::collections::{HashMap, HashSet};
    use tfplug::Dynamic;

    #[test]
    fn type_names_are_unique_and_prefixed() {
        let mut seen = HashSet::new();
        for def in catalog() {
            assert!(def.type_name.starts_with("fortisase_"), "{}", def.type_name);
            assert!(seen.insert(def.type_name), "duplicate {}", def.type_name);
        }
    }

    #[test]
    fn keyed_definitions_declare_a_primary_key() {
        for def in catalog().iter().filter(|d| !d.is_singleton()) {
            let pk = field(def.fields, "primary_key")
                .unwrap_or_else(|| panic!("{} has no primary_key", def.type_name));
            assert_eq!(pk.wire, "primaryKey");
            if def.create == CreateMode::Upsert {
                assert_eq!(pk.mode, Mode::Required, "{}", def.type_name);
            }
        }
    }

    #[test]
    fn direction_placeholder_matches_flag() {
        for def in catalog() {
            assert_eq!(def.path.contains("{direction}"), def.direction, "{}", def.type_name);
        }
    }

    #[test]
    fn collection_path_substitutes_direction() {
        let def = &security::ANTIVIRUS_PROFILE;
        assert_eq!(
            def.collection_path(None),
            "/resource-api/v1/security/outbound-profiles/antivirus-profiles"
        );
        assert_eq!(
            def.collection_path(Some("internal-profiles")),
            "/resource-api/v1/security/internal-profiles/antivirus-profiles"
        );
        assert_eq!(
            network::HOST.collection_path(Some("internal-profiles")),
            "/resource-api/v1/network/hosts"
        );
    }

    #[test]
    fn lookup_by_type_name() {
        assert!(find("fortisase_security_dlp_profile").is_some());
        assert!(find("fortisase_nope").is_none());
        assert_eq!(
            network::PRIVATE_ACCESS_NETWORK_CONFIGURATION.singleton_id(),
            "network-configuration"
        );
    }

    /// A value for every configurable field; computed ones stay null
    /// because nothing sends them
    fn populated(fields: &[Field], seed: usize) -> Dynamic {
        Dynamic::Map(
            fields
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let value = if f.is_configurable() {
                        sample(&f.kind, seed + i)
                    } else {
                        Dynamic::Null
                    };
                    (f.name.to_string(), value)
                })
                .collect(),
        )
    }

    fn sample(kind: &FieldKind, seed: usize) -> Dynamic {
        match kind {
            FieldKind::String => Dynamic::from(format!("v{}", seed)),
            FieldKind::Number => Dynamic::Number(seed as f64),
            FieldKind::Bool => Dynamic::Bool(seed % 2 == 0),
            FieldKind::Object(fields) => populated(fields, seed),
            FieldKind::List(elem) | FieldKind::Set(elem) => {
                Dynamic::List(vec![sample(elem, seed), sample(elem, seed + 1)])
            }
            FieldKind::Map(elem) => Dynamic::Map(HashMap::from([(
                format!("k{}", seed),
                sample(elem, seed),
            )])),
        }
    }

    #[test]
    fn every_definition_round_trips_through_the_wire() {
        for def in catalog() {
            let model = populated(def.fields, 1);

            let created = serde_json::Value::Object(expand(&model, def.fields));
            let (state, diags) = flatten(&created, def.fields);
            assert!(diags.is_empty(), "{}: {:?}", def.type_name, diags);
            assert_eq!(state, model, "{} via expand", def.type_name);

            let changed =
                serde_json::Value::Object(expand_changes(&model, &Dynamic::Null, def.fields));
            let (state, diags) = flatten(&changed, def.fields);
            assert!(diags.is_empty(), "{}: {:?}", def.type_name, diags);
            assert_eq!(state, model, "{} via expand_changes", def.type_name);
        }
    }
}
