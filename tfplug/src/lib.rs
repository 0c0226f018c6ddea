//! tfplug - Terraform Plugin Framework for Rust
//!
//! The tri-state value model, schemas, validators, plan modifiers, the
//! provider, resource and data source traits a provider implements, and the
//! Plugin Protocol 6 gRPC server that drives them.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Protocol modules
pub mod grpc;
pub mod proto;
pub mod server;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod import;
pub mod plan;
pub mod plan_modifier;
pub mod validator;

// Re-exports for convenience
pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use import::{import_state_passthrough_id, split_import_id};
pub use plan::{plan_resource_change, validate_config};
pub use provider::{DataSourceFactory, Provider, ResourceFactory};
pub use resource::{
    Resource, ResourceWithConfigure, ResourceWithImportState, ResourceWithModifyPlan,
};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use server::{serve, ServerConfig};
pub use types::{AttributePath, Diagnostic, DiagnosticSeverity, Dynamic, DynamicValue};
