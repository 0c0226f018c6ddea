//! gRPC service for Terraform Plugin Protocol 6
//!
//! Translates protocol messages to calls on a `Provider`. Resources and
//! data sources are created from the provider's factories for every call
//! and configured with the data returned by the last ConfigureProvider.
//! Every request gets a child of one root context that StopProvider
//! cancels.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceSchemaRequest, DataSourceWithConfigure,
    ReadDataSourceRequest, ValidateDataSourceConfigRequest,
};
use crate::error::TfplugError;
use crate::import::import_state_passthrough_id;
use crate::plan::plan_resource_change;
use crate::proto::{
    self, apply_resource_change, configure_provider, get_metadata, get_provider_schema,
    import_resource_state, plan_resource_change as plan_rpc, read_data_source, read_resource,
    stop_provider, upgrade_resource_state, validate_data_resource_config,
    validate_provider_config, validate_resource_config, ProviderService,
};
use crate::provider::{
    ConfigureProviderRequest, Provider, ProviderSchemaRequest, ValidateProviderConfigRequest,
};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ImportResourceStateResponse, ModifyPlanRequest,
    ReadResourceRequest, ResourceSchemaRequest, ResourceWithConfigure, UpdateResourceRequest,
    ValidateResourceConfigRequest,
};
use crate::schema::{Attribute, Schema};
use crate::types::{
    has_errors, AttributePath, AttributePathStep, Diagnostic, DiagnosticSeverity, Dynamic,
    DynamicValue,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tonic::{Request, Response, Status};
use tracing::debug;

type ProviderData = Option<Arc<dyn Any + Send + Sync>>;

type RpcResult<T> = std::result::Result<Response<T>, Status>;

pub struct GrpcProviderServer<P: Provider> {
    provider: Arc<RwLock<P>>,
    provider_data: Arc<RwLock<ProviderData>>,
    stop: Context,
}

impl<P: Provider + 'static> GrpcProviderServer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(RwLock::new(provider)),
            provider_data: Arc::new(RwLock::new(None)),
            stop: Context::new(),
        }
    }

    async fn new_resource(
        &self,
        type_name: &str,
    ) -> Result<Box<dyn ResourceWithConfigure>, Status> {
        let provider = self.provider.read().await;
        provider
            .resources()
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| {
                Status::not_found(TfplugError::ResourceNotFound(type_name.to_string()).to_string())
            })
    }

    async fn configured_resource(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> Result<(Box<dyn ResourceWithConfigure>, Vec<Diagnostic>), Status> {
        let mut resource = self.new_resource(type_name).await?;
        let provider_data = self.provider_data.read().await.clone();
        let response = resource
            .configure(ctx.clone(), ConfigureResourceRequest { provider_data })
            .await;
        Ok((resource, response.diagnostics))
    }

    async fn new_data_source(
        &self,
        type_name: &str,
    ) -> Result<Box<dyn DataSourceWithConfigure>, Status> {
        let provider = self.provider.read().await;
        provider
            .data_sources()
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| {
                Status::not_found(
                    TfplugError::DataSourceNotFound(type_name.to_string()).to_string(),
                )
            })
    }
}

#[tonic::async_trait]
impl<P: Provider + 'static> ProviderService for GrpcProviderServer<P> {
    async fn get_metadata(
        &self,
        _request: Request<get_metadata::Request>,
    ) -> RpcResult<get_metadata::Response> {
        let provider = self.provider.read().await;

        let mut resources: Vec<String> = provider.resources().into_keys().collect();
        resources.sort();
        let mut data_sources: Vec<String> = provider.data_sources().into_keys().collect();
        data_sources.sort();

        Ok(Response::new(get_metadata::Response {
            server_capabilities: Some(server_capabilities()),
            diagnostics: vec![],
            data_sources: data_sources
                .into_iter()
                .map(|type_name| get_metadata::DataSourceMetadata { type_name })
                .collect(),
            resources: resources
                .into_iter()
                .map(|type_name| get_metadata::ResourceMetadata { type_name })
                .collect(),
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<get_provider_schema::Request>,
    ) -> RpcResult<get_provider_schema::Response> {
        let ctx = self.stop.child();
        let provider = self.provider.read().await;

        let provider_schema = provider.schema(ctx.clone(), ProviderSchemaRequest).await;
        let mut diagnostics = provider_schema.diagnostics;

        let mut resource_schemas = HashMap::new();
        for (type_name, factory) in provider.resources() {
            let response = factory().schema(ctx.clone(), ResourceSchemaRequest).await;
            diagnostics.extend(response.diagnostics);
            resource_schemas.insert(type_name, schema_to_proto(&response.schema));
        }

        let mut data_source_schemas = HashMap::new();
        for (type_name, factory) in provider.data_sources() {
            let response = factory().schema(ctx.clone(), DataSourceSchemaRequest).await;
            diagnostics.extend(response.diagnostics);
            data_source_schemas.insert(type_name, schema_to_proto(&response.schema));
        }

        Ok(Response::new(get_provider_schema::Response {
            provider: Some(schema_to_proto(&provider_schema.schema)),
            resource_schemas,
            data_source_schemas,
            diagnostics: diagnostics_to_proto(diagnostics),
            provider_meta: None,
            server_capabilities: Some(server_capabilities()),
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<validate_provider_config::Request>,
    ) -> RpcResult<validate_provider_config::Response> {
        let config = decode_dynamic_value(request.into_inner().config.as_ref())?;
        let provider = self.provider.read().await;
        let response = provider
            .validate(self.stop.child(), ValidateProviderConfigRequest { config })
            .await;

        Ok(Response::new(validate_provider_config::Response {
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<validate_resource_config::Request>,
    ) -> RpcResult<validate_resource_config::Response> {
        let req = request.into_inner();
        let config = decode_dynamic_value(req.config.as_ref())?;
        let resource = self.new_resource(&req.type_name).await?;
        let response = resource
            .validate(
                self.stop.child(),
                ValidateResourceConfigRequest {
                    type_name: req.type_name,
                    config,
                },
            )
            .await;

        Ok(Response::new(validate_resource_config::Response {
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn validate_data_resource_config(
        &self,
        request: Request<validate_data_resource_config::Request>,
    ) -> RpcResult<validate_data_resource_config::Response> {
        let req = request.into_inner();
        let config = decode_dynamic_value(req.config.as_ref())?;
        let data_source = self.new_data_source(&req.type_name).await?;
        let response = data_source
            .validate(
                self.stop.child(),
                ValidateDataSourceConfigRequest {
                    type_name: req.type_name,
                    config,
                },
            )
            .await;

        Ok(Response::new(validate_data_resource_config::Response {
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<upgrade_resource_state::Request>,
    ) -> RpcResult<upgrade_resource_state::Response> {
        let req = request.into_inner();
        let resource = self.new_resource(&req.type_name).await?;
        let schema = resource
            .schema(self.stop.child(), ResourceSchemaRequest)
            .await
            .schema;

        let raw = req.raw_state.unwrap_or_default();
        let mut diagnostics = vec![];
        let state = if !raw.json.is_empty() {
            DynamicValue::decode_json(&raw.json)
                .map_err(|e| Status::invalid_argument(e.to_string()))?
        } else {
            if !raw.flatmap.is_empty() {
                diagnostics.push(Diagnostic::error(
                    "Unsupported state format",
                    "Flatmap state written by Terraform 0.11 or earlier cannot be upgraded",
                ));
            }
            DynamicValue::null()
        };

        debug!(type_name = %req.type_name, version = req.version, "upgrading resource state");

        Ok(Response::new(upgrade_resource_state::Response {
            upgraded_state: Some(encode_dynamic_value(&retain_schema_attributes(
                &schema, state,
            ))?),
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<configure_provider::Request>,
    ) -> RpcResult<configure_provider::Response> {
        let req = request.into_inner();
        let config = decode_dynamic_value(req.config.as_ref())?;

        let response = {
            let mut provider = self.provider.write().await;
            provider
                .configure(
                    self.stop.child(),
                    ConfigureProviderRequest {
                        terraform_version: req.terraform_version,
                        config,
                    },
                )
                .await
        };
        *self.provider_data.write().await = response.provider_data;

        Ok(Response::new(configure_provider::Response {
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn read_resource(
        &self,
        request: Request<read_resource::Request>,
    ) -> RpcResult<read_resource::Response> {
        let req = request.into_inner();
        let ctx = self.stop.child();
        let current_state = decode_dynamic_value(req.current_state.as_ref())?;
        let (resource, mut diagnostics) = self.configured_resource(&ctx, &req.type_name).await?;

        let new_state = if has_errors(&diagnostics) {
            current_state
        } else {
            let response = resource
                .read(
                    ctx,
                    ReadResourceRequest {
                        type_name: req.type_name,
                        current_state,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
            // null tells Terraform the object is gone
            response.new_state.unwrap_or_else(DynamicValue::null)
        };

        Ok(Response::new(read_resource::Response {
            new_state: Some(encode_dynamic_value(&new_state)?),
            diagnostics: diagnostics_to_proto(diagnostics),
            private: req.private,
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<plan_rpc::Request>,
    ) -> RpcResult<plan_rpc::Response> {
        let req = request.into_inner();
        let ctx = self.stop.child();
        let prior_state = decode_dynamic_value(req.prior_state.as_ref())?;
        let proposed_new_state = decode_dynamic_value(req.proposed_new_state.as_ref())?;
        let config = decode_dynamic_value(req.config.as_ref())?;
        let (resource, mut diagnostics) = self.configured_resource(&ctx, &req.type_name).await?;

        if has_errors(&diagnostics) {
            return Ok(Response::new(plan_rpc::Response {
                planned_state: Some(encode_dynamic_value(&proposed_new_state)?),
                requires_replace: vec![],
                planned_private: req.prior_private,
                diagnostics: diagnostics_to_proto(diagnostics),
                legacy_type_system: false,
            }));
        }

        let (planned_state, requires_replace) = match resource.as_modify_plan() {
            Some(planner) => {
                let response = planner
                    .modify_plan(
                        ctx,
                        ModifyPlanRequest {
                            type_name: req.type_name,
                            config,
                            prior_state,
                            proposed_new_state,
                        },
                    )
                    .await;
                diagnostics.extend(response.diagnostics);
                (response.planned_state, response.requires_replace)
            }
            None => {
                let schema = resource.schema(ctx, ResourceSchemaRequest).await.schema;
                let planned =
                    plan_resource_change(&schema, &prior_state, &proposed_new_state, &config);
                diagnostics.extend(planned.diagnostics);
                (planned.planned_state, planned.requires_replace)
            }
        };

        Ok(Response::new(plan_rpc::Response {
            planned_state: Some(encode_dynamic_value(&planned_state)?),
            requires_replace: requires_replace.iter().map(path_to_proto).collect(),
            planned_private: req.prior_private,
            diagnostics: diagnostics_to_proto(diagnostics),
            legacy_type_system: false,
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<apply_resource_change::Request>,
    ) -> RpcResult<apply_resource_change::Response> {
        let req = request.into_inner();
        let ctx = self.stop.child();
        let prior_state = decode_dynamic_value(req.prior_state.as_ref())?;
        let planned_state = decode_dynamic_value(req.planned_state.as_ref())?;
        let config = decode_dynamic_value(req.config.as_ref())?;
        let (resource, mut diagnostics) = self.configured_resource(&ctx, &req.type_name).await?;

        let new_state = if has_errors(&diagnostics) {
            prior_state
        } else if prior_state.is_null() {
            debug!(type_name = %req.type_name, "apply: create");
            let response = resource
                .create(
                    ctx,
                    CreateResourceRequest {
                        type_name: req.type_name,
                        planned_state,
                        config,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
            response.new_state
        } else if planned_state.is_null() {
            debug!(type_name = %req.type_name, "apply: delete");
            let response = resource
                .delete(
                    ctx,
                    DeleteResourceRequest {
                        type_name: req.type_name,
                        prior_state: prior_state.clone(),
                    },
                )
                .await;
            let failed = has_errors(&response.diagnostics);
            diagnostics.extend(response.diagnostics);
            if failed {
                prior_state
            } else {
                DynamicValue::null()
            }
        } else {
            debug!(type_name = %req.type_name, "apply: update");
            let response = resource
                .update(
                    ctx,
                    UpdateResourceRequest {
                        type_name: req.type_name,
                        prior_state,
                        planned_state,
                        config,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
            response.new_state
        };

        Ok(Response::new(apply_resource_change::Response {
            new_state: Some(encode_dynamic_value(&new_state)?),
            private: req.planned_private,
            diagnostics: diagnostics_to_proto(diagnostics),
            legacy_type_system: false,
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<import_resource_state::Request>,
    ) -> RpcResult<import_resource_state::Response> {
        let req = request.into_inner();
        let ctx = self.stop.child();
        let (resource, diagnostics) = self.configured_resource(&ctx, &req.type_name).await?;

        if has_errors(&diagnostics) {
            return Ok(Response::new(import_resource_state::Response {
                imported_resources: vec![],
                diagnostics: diagnostics_to_proto(diagnostics),
            }));
        }

        let import_request = ImportResourceStateRequest {
            type_name: req.type_name,
            id: req.id,
        };
        let mut response = match resource.as_import_state() {
            Some(importer) => importer.import_state(ctx, import_request).await,
            None => {
                let mut response = ImportResourceStateResponse::default();
                import_state_passthrough_id(
                    &ctx,
                    AttributePath::new("id"),
                    &import_request,
                    &mut response,
                );
                response
            }
        };
        response.diagnostics.extend(diagnostics);

        let imported_resources = response
            .imported_resources
            .iter()
            .map(|imported| {
                Ok(import_resource_state::ImportedResource {
                    type_name: imported.type_name.clone(),
                    state: Some(encode_dynamic_value(&imported.state)?),
                    private: vec![],
                })
            })
            .collect::<Result<Vec<_>, Status>>()?;

        Ok(Response::new(import_resource_state::Response {
            imported_resources,
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn read_data_source(
        &self,
        request: Request<read_data_source::Request>,
    ) -> RpcResult<read_data_source::Response> {
        let req = request.into_inner();
        let ctx = self.stop.child();
        let config = decode_dynamic_value(req.config.as_ref())?;
        let mut data_source = self.new_data_source(&req.type_name).await?;

        let provider_data = self.provider_data.read().await.clone();
        let mut diagnostics = data_source
            .configure(ctx.clone(), ConfigureDataSourceRequest { provider_data })
            .await
            .diagnostics;

        let state = if has_errors(&diagnostics) {
            DynamicValue::null()
        } else {
            let response = data_source
                .read(
                    ctx,
                    ReadDataSourceRequest {
                        type_name: req.type_name,
                        config,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
            response.state
        };

        Ok(Response::new(read_data_source::Response {
            state: Some(encode_dynamic_value(&state)?),
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn stop_provider(
        &self,
        _request: Request<stop_provider::Request>,
    ) -> RpcResult<stop_provider::Response> {
        debug!("stop requested, cancelling in-flight requests");
        self.stop.cancel();
        Ok(Response::new(stop_provider::Response {
            error: String::new(),
        }))
    }
}

fn server_capabilities() -> proto::ServerCapabilities {
    proto::ServerCapabilities {
        plan_destroy: false,
        get_provider_schema_optional: false,
        move_resource_state: false,
    }
}

fn schema_to_proto(schema: &Schema) -> proto::Schema {
    proto::Schema {
        version: schema.version,
        block: Some(proto::schema::Block {
            version: schema.version,
            attributes: schema.block.attributes.iter().map(attribute_to_proto).collect(),
            description: schema.block.description.clone(),
            description_kind: proto::StringKind::Plain as i32,
            deprecated: schema.block.deprecated,
        }),
    }
}

fn attribute_to_proto(attr: &Attribute) -> proto::schema::Attribute {
    proto::schema::Attribute {
        name: attr.name.clone(),
        r#type: attr.r#type.type_json().to_string().into_bytes(),
        description: attr.description.clone(),
        required: attr.required,
        optional: attr.optional,
        computed: attr.computed,
        sensitive: attr.sensitive,
        description_kind: proto::StringKind::Plain as i32,
        deprecated: attr.deprecated,
    }
}

/// Drops attributes the current schema no longer declares; Terraform
/// rejects state carrying them
fn retain_schema_attributes(schema: &Schema, mut state: DynamicValue) -> DynamicValue {
    if let Dynamic::Map(values) = &mut state.value {
        values.retain(|name, _| schema.attribute(name).is_some());
    }
    state
}

#[allow(clippy::result_large_err)]
fn decode_dynamic_value(value: Option<&proto::DynamicValue>) -> Result<DynamicValue, Status> {
    let Some(value) = value else {
        return Ok(DynamicValue::null());
    };

    let decoded = if !value.msgpack.is_empty() {
        DynamicValue::decode_msgpack(&value.msgpack)
    } else if !value.json.is_empty() {
        DynamicValue::decode_json(&value.json)
    } else {
        Ok(DynamicValue::null())
    };
    decoded.map_err(|e| Status::invalid_argument(e.to_string()))
}

#[allow(clippy::result_large_err)]
fn encode_dynamic_value(value: &DynamicValue) -> Result<proto::DynamicValue, Status> {
    let msgpack = value
        .encode_msgpack()
        .map_err(|e| Status::internal(e.to_string()))?;
    Ok(proto::DynamicValue {
        msgpack,
        json: vec![],
    })
}

fn path_to_proto(path: &AttributePath) -> proto::AttributePath {
    use proto::attribute_path::{step::Selector, Step};

    proto::AttributePath {
        steps: path
            .steps
            .iter()
            .map(|step| Step {
                selector: Some(match step {
                    AttributePathStep::AttributeName(name) => Selector::AttributeName(name.clone()),
                    AttributePathStep::ElementKeyString(key) => {
                        Selector::ElementKeyString(key.clone())
                    }
                    AttributePathStep::ElementKeyInt(index) => Selector::ElementKeyInt(*index),
                }),
            })
            .collect(),
    }
}

fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<proto::Diagnostic> {
    diagnostics
        .into_iter()
        .map(|diag| proto::Diagnostic {
            severity: match diag.severity {
                DiagnosticSeverity::Error => proto::diagnostic::Severity::Error,
                DiagnosticSeverity::Warning => proto::diagnostic::Severity::Warning,
            } as i32,
            attribute: diag.attribute.as_ref().map(path_to_proto),
            summary: diag.summary,
            detail: diag.detail,
        })
        .collect()
}
