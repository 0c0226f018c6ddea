use crate::api::ApiQueryParams;
use crate::fields::{data_source_schema_for, flatten};
use crate::provider_data::{not_configured, FortiSaseProviderData};
use crate::resources::{ResourceDefinition, DEFAULT_DIRECTION};
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::*;
use tfplug::plan::validate_config;
use tfplug::schema::Schema;
use tfplug::types::{Diagnostic, Dynamic, DynamicValue};
use tracing::Instrument;

pub struct SaseDataSource {
    definition: &'static ResourceDefinition,
    schema: Schema,
    provider_data: Option<FortiSaseProviderData>,
}

impl SaseDataSource {
    pub fn new(definition: &'static ResourceDefinition) -> Self {
        Self {
            definition,
            schema: data_source_schema_for(definition),
            provider_data: None,
        }
    }

    async fn do_read(&self, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut response = ReadDataSourceResponse {
            state: DynamicValue::null(),
            diagnostics: vec![],
        };
        let Some(data) = self.provider_data.as_ref() else {
            response.diagnostics.push(not_configured());
            return response;
        };

        let def = self.definition;
        let config = &request.config.value;
        let direction = if def.direction {
            Some(config.attr("direction").as_str().unwrap_or(DEFAULT_DIRECTION))
        } else {
            None
        };
        let path = def.collection_path(direction);
        let (mkey, id) = if def.is_singleton() {
            ("", def.singleton_id())
        } else {
            match config.attr("primary_key").as_str() {
                Some(pk) => (pk, pk),
                None => {
                    response.diagnostics.push(Diagnostic::error(
                        format!("Failed to read {}", def.type_name),
                        "primary_key must be set",
                    ));
                    return response;
                }
            }
        };

        tracing::debug!("looking up {} {:?}", def.type_name, mkey);
        let wire = match data.client.read(&path, mkey, &ApiQueryParams::new()).await {
            Ok(wire) => wire,
            Err(e) if e.is_not_found() => {
                response.diagnostics.push(Diagnostic::error(
                    format!("{} not found", def.type_name),
                    format!("No object with primary key {:?} at {}", mkey, path),
                ));
                return response;
            }
            Err(e) => {
                response
                    .diagnostics
                    .push(e.to_diagnostic(format!("Failed to read {} {:?}", def.type_name, mkey)));
                return response;
            }
        };

        let (mut state, diagnostics) = flatten(&wire, def.fields);
        response.diagnostics.extend(diagnostics);
        if let Dynamic::Map(map) = &mut state {
            map.insert("id".to_string(), Dynamic::from(id));
            if let Some(direction) = direction {
                map.insert("direction".to_string(), Dynamic::from(direction));
            }
        }
        response.state = DynamicValue::new(state);
        response
    }
}

#[async_trait]
impl DataSource for SaseDataSource {
    fn type_name(&self) -> &str {
        self.definition.type_name
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.definition.type_name.to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: self.schema.clone(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: validate_config(&self.schema, &request.config),
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let span = ctx.span("read_data_source", self.definition.type_name);
        self.do_read(request).instrument(span).await
    }
}

#[async_trait]
impl DataSourceWithConfigure for SaseDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];
        match FortiSaseProviderData::from_configure(request.provider_data) {
            Ok(Some(data)) => self.provider_data = Some(data),
            Ok(None) => {}
            Err(diag) => diagnostics.push(diag),
        }
        ConfigureDataSourceResponse { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::FakeApi;
    use crate::resources::network::{HOST_GROUP, PRIVATE_ACCESS_NETWORK_CONFIGURATION};
    use crate::resources::security::WEB_FILTER_PROFILE;
    use serde_json::json;
    use std::sync::Arc;

    async fn lookup(
        definition: &'static ResourceDefinition,
        api: FakeApi,
        config: serde_json::Value,
    ) -> ReadDataSourceResponse {
        let mut ds = SaseDataSource::new(definition);
        let configured = ds
            .configure(
                Context::new(),
                ConfigureDataSourceRequest {
                    provider_data: Some(Arc::new(FortiSaseProviderData::new(api))),
                },
            )
            .await;
        assert!(configured.diagnostics.is_empty());

        ds.read(
            Context::new(),
            ReadDataSourceRequest {
                type_name: definition.type_name.to_string(),
                config: DynamicValue::decode_json(config.to_string().as_bytes()).unwrap(),
            },
        )
        .await
    }

    #[tokio::test]
    async fn reads_object_by_primary_key() {
        let api = FakeApi::new();
        api.insert(
            "/resource-api/v1/network/host-groups",
            "web",
            json!({
                "primaryKey": "web",
                "members": [{"primaryKey": "web-01", "datasource": "network/hosts"}]
            }),
        );

        let response = lookup(&HOST_GROUP, api, json!({"primary_key": "web"})).await;

        assert!(response.diagnostics.is_empty());
        let state = &response.state.value;
        assert_eq!(state.attr("id"), &Dynamic::from("web"));
        let members = state.attr("members").as_list().unwrap();
        assert_eq!(members[0].attr("primary_key"), &Dynamic::from("web-01"));
    }

    #[tokio::test]
    async fn direction_defaults_to_outbound() {
        let api = FakeApi::new();
        api.insert(
            "/resource-api/v1/security/outbound-profiles/web-filter-profiles",
            "default",
            json!({"primaryKey": "default", "blockInvalidUrl": "enable"}),
        );

        let response = lookup(&WEB_FILTER_PROFILE, api, json!({"primary_key": "default"})).await;

        let state = &response.state.value;
        assert_eq!(state.attr("direction"), &Dynamic::from("outbound-profiles"));
        assert_eq!(state.attr("block_invalid_url"), &Dynamic::from("enable"));
    }

    #[tokio::test]
    async fn missing_object_is_an_error() {
        let response = lookup(&HOST_GROUP, FakeApi::new(), json!({"primary_key": "nope"})).await;
        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].summary.contains("not found"));
    }

    #[tokio::test]
    async fn singleton_needs_no_key() {
        let api = FakeApi::new();
        api.insert(
            "/resource-api/v1/private-access/network-configuration",
            "",
            json!({"as": 65001, "configState": "success"}),
        );

        let response = lookup(&PRIVATE_ACCESS_NETWORK_CONFIGURATION, api, json!({})).await;

        let state = &response.state.value;
        assert_eq!(state.attr("id"), &Dynamic::from("network-configuration"));
        assert_eq!(state.attr("as_number"), &Dynamic::Number(65001.0));
        assert_eq!(state.attr("config_state"), &Dynamic::from("success"));
    }

    #[tokio::test]
    async fn api_errors_keep_the_http_status() {
        let api = FakeApi::new();
        api.fail_reads(403);

        let response = lookup(&HOST_GROUP, api, json!({"primary_key": "web"})).await;

        assert_eq!(response.diagnostics.len(), 1);
        let diag = &response.diagnostics[0];
        assert!(diag.is_error());
        assert!(diag.detail.contains("HTTP 403"), "{}", diag.detail);
        assert!(response.state.is_null());
    }

    #[tokio::test]
    async fn non_object_response_is_an_error() {
        let api = FakeApi::new();
        api.insert(
            "/resource-api/v1/network/host-groups",
            "web",
            json!("oops"),
        );

        let response = lookup(&HOST_GROUP, api, json!({"primary_key": "web"})).await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].detail,
            "expected object, got string"
        );
        assert!(response.state.is_null());
    }
}
