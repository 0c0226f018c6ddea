//! Generated Terraform Plugin Protocol 6 types
//!
//! Built from `proto/tfplugin6.proto` by `tonic-build`. Several messages
//! share a name with framework types (`DynamicValue`, `Diagnostic`,
//! `AttributePath`, `Schema`), so refer to these as `proto::DynamicValue`
//! and so on.
//!
//! RPC request and response messages live in snake_case modules named after
//! the RPC, e.g. `read_resource::Request`.

include!(concat!(env!("OUT_DIR"), "/tfplugin6.rs"));

pub use provider_server::{Provider as ProviderService, ProviderServer};
