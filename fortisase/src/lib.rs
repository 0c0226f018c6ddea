//! Terraform provider for FortiSASE
//!
//! Every resource type is a `ResourceDefinition` in the catalog; one generic
//! resource and one generic data source serve them all.

pub mod api;
pub mod data_sources;
pub mod fields;
pub mod lock;
pub mod logging;
pub mod provider_data;
pub mod resources;

use async_trait::async_trait;
use provider_data::FortiSaseProviderData;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::DataSourceWithConfigure;
use tfplug::provider::*;
use tfplug::resource::ResourceWithConfigure;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic};
use tfplug::validator::{NumberRangeValidator, StringLengthValidator};
use tfplug::{plan, TfplugError};

pub const HOSTNAME_ENV: &str = "FORTISASE_HOSTNAME";
pub const ACCESS_TOKEN_ENV: &str = "FORTISASE_ACCESS_TOKEN";
pub const INSECURE_ENV: &str = "FORTISASE_INSECURE";

pub struct FortiSaseProvider {
    provider_data: Option<FortiSaseProviderData>,
}

impl Default for FortiSaseProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FortiSaseProvider {
    pub fn new() -> Self {
        Self {
            provider_data: None,
        }
    }

    pub fn provider_data(&self) -> Option<&FortiSaseProviderData> {
        self.provider_data.as_ref()
    }

    fn provider_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manage FortiSASE security and network configuration")
            .attribute(
                AttributeBuilder::new("hostname", AttributeType::String)
                    .description(
                        "FortiSASE portal hostname. Falls back to FORTISASE_HOSTNAME, then portal.prod.fortisase.com",
                    )
                    .optional()
                    .validator(StringLengthValidator::at_most(253))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("access_token", AttributeType::String)
                    .description("OAuth access token. Falls back to FORTISASE_ACCESS_TOKEN")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("insecure", AttributeType::Bool)
                    .description("Skip TLS certificate verification. Falls back to FORTISASE_INSECURE")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("timeout_seconds", AttributeType::Number)
                    .description("Per-request timeout, 30 seconds by default")
                    .optional()
                    .validator(NumberRangeValidator::between(1.0, 600.0))
                    .build(),
            )
            .build()
    }

    /// Resource for `type_name`, not yet configured
    pub fn resource(&self, type_name: &str) -> tfplug::Result<Box<dyn ResourceWithConfigure>> {
        resources::find(type_name)
            .map(|def| Box::new(resources::SaseResource::new(def)) as Box<dyn ResourceWithConfigure>)
            .ok_or_else(|| TfplugError::ResourceNotFound(type_name.to_string()))
    }

    pub fn data_source(
        &self,
        type_name: &str,
    ) -> tfplug::Result<Box<dyn DataSourceWithConfigure>> {
        resources::find(type_name)
            .map(|def| {
                Box::new(data_sources::SaseDataSource::new(def)) as Box<dyn DataSourceWithConfigure>
            })
            .ok_or_else(|| TfplugError::DataSourceNotFound(type_name.to_string()))
    }
}

/// Configured string, else the environment variable, ignoring empty values
fn string_setting(config: &Dynamic, name: &str, env: &str) -> Option<String> {
    config
        .attr(name)
        .as_str()
        .map(str::to_string)
        .or_else(|| std::env::var(env).ok())
        .filter(|s| !s.trim().is_empty())
}

fn insecure_setting(config: &Dynamic) -> Result<bool, Diagnostic> {
    if let Some(insecure) = config.attr("insecure").as_bool() {
        return Ok(insecure);
    }
    match std::env::var(INSECURE_ENV) {
        Ok(value) => value.trim().parse::<bool>().map_err(|_| {
            Diagnostic::error(
                "Invalid provider configuration",
                format!("{} must be true or false, got {:?}", INSECURE_ENV, value),
            )
        }),
        Err(_) => Ok(false),
    }
}

#[async_trait]
impl Provider for FortiSaseProvider {
    fn type_name(&self) -> &str {
        "fortisase"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: "fortisase".to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: Self::provider_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        ValidateProviderConfigResponse {
            diagnostics: plan::validate_config(&Self::provider_schema(), &request.config),
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        logging::init();
        tracing::info!(
            "configuring FortiSASE provider (terraform {})",
            request.terraform_version
        );

        let mut diagnostics = vec![];
        let config = &request.config.value;

        let hostname = string_setting(config, "hostname", HOSTNAME_ENV)
            .unwrap_or_else(|| api::DEFAULT_HOSTNAME.to_string());
        let insecure = match insecure_setting(config) {
            Ok(insecure) => insecure,
            Err(diag) => {
                diagnostics.push(diag.with_attribute(AttributePath::new("insecure")));
                false
            }
        };
        let Some(access_token) = string_setting(config, "access_token", ACCESS_TOKEN_ENV) else {
            diagnostics.push(
                Diagnostic::error(
                    "Missing access token",
                    format!(
                        "Set access_token in the provider block or the {} environment variable",
                        ACCESS_TOKEN_ENV
                    ),
                )
                .with_attribute(AttributePath::new("access_token")),
            );
            return ConfigureProviderResponse {
                diagnostics,
                provider_data: None,
            };
        };

        let mut client_config = api::ClientConfig {
            hostname,
            access_token,
            insecure,
            ..Default::default()
        };
        if let Some(timeout) = config.attr("timeout_seconds").as_number() {
            client_config.timeout_seconds = timeout.max(1.0) as u64;
        }
        if insecure {
            tracing::warn!("TLS certificate verification is disabled");
        }

        match api::Client::new(client_config) {
            Ok(client) => {
                tracing::info!("FortiSASE API at {}", client.base_url());
                let data = FortiSaseProviderData::new(client);
                self.provider_data = Some(data.clone());
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: Some(Arc::new(data) as Arc<dyn Any + Send + Sync>),
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create API client",
                    e.to_string(),
                ));
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        resources::catalog()
            .iter()
            .map(|&def| {
                let factory: ResourceFactory = Box::new(move || {
                    Box::new(resources::SaseResource::new(def)) as Box<dyn ResourceWithConfigure>
                });
                (def.type_name.to_string(), factory)
            })
            .collect()
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        resources::catalog()
            .iter()
            .map(|&def| {
                let factory: DataSourceFactory = Box::new(move || {
                    Box::new(data_sources::SaseDataSource::new(def))
                        as Box<dyn DataSourceWithConfigure>
                });
                (def.type_name.to_string(), factory)
            })
            .collect()
    }
}
