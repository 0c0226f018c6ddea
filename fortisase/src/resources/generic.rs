//! One resource implementation driven by a `ResourceDefinition`

use super::{CreateMode, DeletePolicy, ResourceDefinition, DIRECTIONS};
use crate::api::{ApiError, ApiQueryParams};
use crate::fields::{expand, expand_changes, flatten, schema_for};
use crate::provider_data::{not_configured, FortiSaseProviderData};
use async_trait::async_trait;
use serde_json::Value;
use tfplug::context::Context;
use tfplug::import::{import_state_passthrough_id, split_import_id};
use tfplug::plan::{plan_resource_change, validate_config};
use tfplug::resource::*;
use tfplug::schema::Schema;
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tracing::Instrument;

pub struct SaseResource {
    definition: &'static ResourceDefinition,
    schema: Schema,
    provider_data: Option<FortiSaseProviderData>,
}

impl SaseResource {
    pub fn new(definition: &'static ResourceDefinition) -> Self {
        Self {
            definition,
            schema: schema_for(definition),
            provider_data: None,
        }
    }

    pub fn definition(&self) -> &'static ResourceDefinition {
        self.definition
    }

    fn data(&self) -> Result<&FortiSaseProviderData, Diagnostic> {
        self.provider_data.as_ref().ok_or_else(not_configured)
    }

    /// Direction recorded in state or configuration, if any
    fn direction_of(&self, value: &Dynamic) -> Option<String> {
        if !self.definition.direction {
            return None;
        }
        value.attr("direction").as_str().map(str::to_string)
    }

    /// The API identifier of an existing object
    fn mkey_of(&self, state: &Dynamic) -> Option<String> {
        if self.definition.is_singleton() {
            return Some(String::new());
        }
        state
            .attr("id")
            .as_str()
            .or_else(|| state.attr("primary_key").as_str())
            .map(str::to_string)
    }

    /// Fetch `mkey` and build the full state for it: every field, `id`, and
    /// `direction` where the definition has one
    async fn read_state(
        &self,
        data: &FortiSaseProviderData,
        path: &str,
        mkey: &str,
        direction: Option<&str>,
        prior: &Dynamic,
    ) -> Result<(Dynamic, Vec<Diagnostic>), ApiError> {
        let wire = data
            .client
            .read(path, mkey, &ApiQueryParams::new())
            .await?;
        let (mut state, diagnostics) = flatten(&wire, self.definition.fields);
        if state.is_null() {
            // not an object, so nothing here can become state
            let detail: Vec<String> = diagnostics.into_iter().map(|d| d.detail).collect();
            return Err(ApiError::ParseError(detail.join("; ")));
        }

        let id = if self.definition.is_singleton() {
            self.definition.singleton_id()
        } else {
            mkey
        };
        set_attr(&mut state, "id", Dynamic::from(id));
        if self.definition.direction {
            let direction = direction.unwrap_or(super::DEFAULT_DIRECTION);
            set_attr(&mut state, "direction", Dynamic::from(direction));
        }

        // the API never echoes secrets back
        for field in self.definition.fields.iter().filter(|f| f.sensitive) {
            let previous = prior.attr(field.name);
            if state.attr(field.name).is_null() && previous.is_known() {
                set_attr(&mut state, field.name, previous.clone());
            }
        }

        Ok((state, diagnostics))
    }

    async fn do_create(&self, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut response = CreateResourceResponse {
            new_state: DynamicValue::null(),
            diagnostics: Vec::new(),
        };
        let data = match self.data() {
            Ok(data) => data,
            Err(diag) => {
                response.diagnostics.push(diag);
                return response;
            }
        };

        let def = self.definition;
        let planned = &request.planned_state.value;
        let direction = self.direction_of(planned);
        let path = def.collection_path(direction.as_deref());
        let body = Value::Object(expand(planned, def.fields));
        let query = ApiQueryParams::new();

        let _guard = match def.lock {
            Some(name) => Some(data.locks.acquire(name).await),
            None => None,
        };

        tracing::info!("creating {} at {}", def.type_name, path);
        let result = match def.create {
            CreateMode::Post => data.client.create(&path, &body, &query).await,
            CreateMode::Upsert => match planned.attr("primary_key").as_str() {
                Some(pk) => data.client.update(&path, pk, &body, &query).await,
                None => {
                    response.diagnostics.push(
                        Diagnostic::error(
                            format!("Failed to create {}", def.type_name),
                            "primary_key must be known before the object can be written",
                        )
                        .with_attribute(AttributePath::new("primary_key")),
                    );
                    return response;
                }
            },
            CreateMode::Singleton => data.client.update(&path, "", &body, &query).await,
        };

        let created = match result {
            Ok(created) => created,
            Err(e) => {
                response
                    .diagnostics
                    .push(e.to_diagnostic(format!("Failed to create {}", def.type_name)));
                return response;
            }
        };

        let mkey = if def.is_singleton() {
            String::new()
        } else {
            let configured = planned.attr("primary_key").as_str().map(str::to_string);
            match primary_key_of(&created).or(configured) {
                Some(mkey) => mkey,
                None => {
                    response.diagnostics.push(Diagnostic::error(
                        format!("Failed to create {}", def.type_name),
                        "The API response did not include a primary key",
                    ));
                    return response;
                }
            }
        };

        match self
            .read_state(data, &path, &mkey, direction.as_deref(), planned)
            .await
        {
            Ok((state, diagnostics)) => {
                tracing::info!(
                    "created {} {}",
                    def.type_name,
                    state.attr("id").as_str().unwrap_or_default()
                );
                response.new_state = DynamicValue::new(state);
                response.diagnostics.extend(diagnostics);
            }
            Err(e) => {
                response.diagnostics.push(e.to_diagnostic(format!(
                    "Created {} {:?} but could not read it back",
                    def.type_name, mkey
                )));
            }
        }

        response
    }

    async fn do_read(&self, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut response = ReadResourceResponse {
            new_state: Some(request.current_state.clone()),
            diagnostics: Vec::new(),
        };
        let data = match self.data() {
            Ok(data) => data,
            Err(diag) => {
                response.diagnostics.push(diag);
                return response;
            }
        };

        let def = self.definition;
        let current = &request.current_state.value;
        let Some(mkey) = self.mkey_of(current) else {
            response.diagnostics.push(Diagnostic::error(
                format!("Failed to read {}", def.type_name),
                "State has no id",
            ));
            return response;
        };
        let direction = self.direction_of(current);
        let path = def.collection_path(direction.as_deref());

        match self
            .read_state(data, &path, &mkey, direction.as_deref(), current)
            .await
        {
            Ok((state, diagnostics)) => {
                response.new_state = Some(DynamicValue::new(state));
                response.diagnostics.extend(diagnostics);
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    "{} {:?} no longer exists, removing it from state",
                    def.type_name,
                    mkey
                );
                response.new_state = None;
            }
            Err(e) => {
                response
                    .diagnostics
                    .push(e.to_diagnostic(format!("Failed to read {} {:?}", def.type_name, mkey)));
            }
        }

        response
    }

    async fn do_update(&self, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut response = UpdateResourceResponse {
            new_state: request.prior_state.clone(),
            diagnostics: Vec::new(),
        };
        let data = match self.data() {
            Ok(data) => data,
            Err(diag) => {
                response.diagnostics.push(diag);
                return response;
            }
        };

        let def = self.definition;
        let prior = &request.prior_state.value;
        let planned = &request.planned_state.value;
        let Some(mkey) = self.mkey_of(prior) else {
            response.diagnostics.push(Diagnostic::error(
                format!("Failed to update {}", def.type_name),
                "Prior state has no id",
            ));
            return response;
        };
        let direction = self.direction_of(prior);
        let path = def.collection_path(direction.as_deref());
        let changes = expand_changes(planned, prior, def.fields);

        let _guard = match def.lock {
            Some(name) => Some(data.locks.acquire(name).await),
            None => None,
        };

        if changes.is_empty() {
            tracing::debug!("{} {:?} has no field changes to send", def.type_name, mkey);
        } else {
            tracing::info!(
                "updating {} {:?}: {:?}",
                def.type_name,
                mkey,
                changes.keys().collect::<Vec<_>>()
            );
            let body = Value::Object(changes);
            if let Err(e) = data
                .client
                .update(&path, &mkey, &body, &ApiQueryParams::new())
                .await
            {
                response
                    .diagnostics
                    .push(e.to_diagnostic(format!("Failed to update {} {:?}", def.type_name, mkey)));
                return response;
            }
        }

        match self
            .read_state(data, &path, &mkey, direction.as_deref(), planned)
            .await
        {
            Ok((state, diagnostics)) => {
                response.new_state = DynamicValue::new(state);
                response.diagnostics.extend(diagnostics);
            }
            Err(e) => {
                response.diagnostics.push(e.to_diagnostic(format!(
                    "Updated {} {:?} but could not read it back",
                    def.type_name, mkey
                )));
            }
        }

        response
    }

    async fn do_delete(&self, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut response = DeleteResourceResponse {
            diagnostics: Vec::new(),
        };
        let def = self.definition;

        if def.delete == DeletePolicy::Forget {
            tracing::info!(
                "{} is not deleted remotely; removing it from state only",
                def.type_name
            );
            return response;
        }

        let data = match self.data() {
            Ok(data) => data,
            Err(diag) => {
                response.diagnostics.push(diag);
                return response;
            }
        };
        let prior = &request.prior_state.value;
        let Some(mkey) = self.mkey_of(prior) else {
            response.diagnostics.push(Diagnostic::error(
                format!("Failed to delete {}", def.type_name),
                "Prior state has no id",
            ));
            return response;
        };
        let path = def.collection_path(self.direction_of(prior).as_deref());

        tracing::info!("deleting {} {:?}", def.type_name, mkey);
        match data
            .client
            .delete(&path, &mkey, &ApiQueryParams::new())
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::warn!("{} {:?} was already deleted", def.type_name, mkey);
            }
            Err(e) => response
                .diagnostics
                .push(e.to_diagnostic(format!("Failed to delete {} {:?}", def.type_name, mkey))),
        }

        response
    }
}

#[async_trait]
impl Resource for SaseResource {
    fn type_name(&self) -> &str {
        self.definition.type_name
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.definition.type_name.to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: self.schema.clone(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: validate_config(&self.schema, &request.config),
        }
    }

    // A stopped provider abandons the call; an unfinished write is
    // reported, not committed to state.

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let span = ctx.span("create", self.definition.type_name);
        tokio::select! {
            biased;
            _ = ctx.cancelled() => CreateResourceResponse {
                new_state: DynamicValue::null(),
                diagnostics: vec![cancelled("create", self.definition.type_name)],
            },
            response = self.do_create(request).instrument(span) => response,
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let span = ctx.span("read", self.definition.type_name);
        let current = request.current_state.clone();
        tokio::select! {
            biased;
            _ = ctx.cancelled() => ReadResourceResponse {
                new_state: Some(current),
                diagnostics: vec![cancelled("read", self.definition.type_name)],
            },
            response = self.do_read(request).instrument(span) => response,
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let span = ctx.span("update", self.definition.type_name);
        let prior = request.prior_state.clone();
        tokio::select! {
            biased;
            _ = ctx.cancelled() => UpdateResourceResponse {
                new_state: prior,
                diagnostics: vec![cancelled("update", self.definition.type_name)],
            },
            response = self.do_update(request).instrument(span) => response,
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let span = ctx.span("delete", self.definition.type_name);
        tokio::select! {
            biased;
            _ = ctx.cancelled() => DeleteResourceResponse {
                diagnostics: vec![cancelled("delete", self.definition.type_name)],
            },
            response = self.do_delete(request).instrument(span) => response,
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for SaseResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];
        match FortiSaseProviderData::from_configure(request.provider_data) {
            Ok(Some(data)) => self.provider_data = Some(data),
            Ok(None) => {}
            Err(diag) => diagnostics.push(diag),
        }
        ConfigureResourceResponse { diagnostics }
    }

    fn as_modify_plan(&self) -> Option<&dyn ResourceWithModifyPlan> {
        Some(self)
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithModifyPlan for SaseResource {
    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        let planned = plan_resource_change(
            &self.schema,
            &request.prior_state,
            &request.proposed_new_state,
            &request.config,
        );
        ModifyPlanResponse {
            planned_state: planned.planned_state,
            requires_replace: planned.requires_replace,
            diagnostics: planned.diagnostics,
        }
    }
}

#[async_trait]
impl ResourceWithImportState for SaseResource {
    /// Accepts `<primary_key>`, or `<direction>/<primary_key>` for
    /// direction-qualified resources. Singletons accept any identifier.
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();
        let def = self.definition;

        if def.is_singleton() {
            let mut state = DynamicValue::object();
            set_attr(&mut state.value, "id", Dynamic::from(def.singleton_id()));
            response.imported_resources.push(ImportedResource {
                type_name: request.type_name,
                state,
            });
            return response;
        }

        if !def.direction {
            import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
            return response;
        }

        let parts = match split_import_id(&request.id, 2) {
            Ok(parts) => parts,
            Err(diag) => {
                response.diagnostics.push(diag);
                return response;
            }
        };
        let (direction, primary_key) = (&parts[0], &parts[1]);
        if !DIRECTIONS.contains(&direction.as_str()) {
            response.diagnostics.push(Diagnostic::error(
                "Unexpected import identifier",
                format!(
                    "Direction must be one of {:?}, got {:?}",
                    DIRECTIONS, direction
                ),
            ));
            return response;
        }

        let mut state = DynamicValue::object();
        set_attr(&mut state.value, "id", Dynamic::from(primary_key.as_str()));
        set_attr(&mut state.value, "primary_key", Dynamic::from(primary_key.as_str()));
        set_attr(&mut state.value, "direction", Dynamic::from(direction.as_str()));
        response.imported_resources.push(ImportedResource {
            type_name: request.type_name,
            state,
        });
        response
    }
}

fn set_attr(value: &mut Dynamic, name: &str, attr: Dynamic) {
    if let Dynamic::Map(map) = value {
        map.insert(name.to_string(), attr);
    }
}

/// `primaryKey` of a create response; some collections number their
/// objects and return it as an integer
fn primary_key_of(created: &Value) -> Option<String> {
    match created.get("primaryKey")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn cancelled(operation: &str, type_name: &str) -> Diagnostic {
    tracing::warn!("{} of {} cancelled", operation, type_name);
    Diagnostic::error(
        "Operation cancelled",
        format!(
            "The provider was stopped before the {} of {} finished",
            operation, type_name
        ),
    )
}
