//! Provider data structure passed to resources and data sources

use crate::api::SaseApi;
use crate::lock::LockRegistry;
use std::any::Any;
use std::sync::Arc;
use tfplug::Diagnostic;

#[derive(Clone)]
pub struct FortiSaseProviderData {
    pub client: Arc<dyn SaseApi>,
    /// Shared by every resource instance of this provider process
    pub locks: Arc<LockRegistry>,
}

impl FortiSaseProviderData {
    pub fn new(client: impl SaseApi + 'static) -> Self {
        Self {
            client: Arc::new(client),
            locks: Arc::new(LockRegistry::new()),
        }
    }

    /// Recover the provider data handed to `configure`. `None` is fine:
    /// Terraform configures resources before the provider during validation.
    pub fn from_configure(
        provider_data: Option<Arc<dyn Any + Send + Sync>>,
    ) -> Result<Option<Self>, Diagnostic> {
        let Some(data) = provider_data else {
            return Ok(None);
        };
        data.downcast_ref::<FortiSaseProviderData>()
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                Diagnostic::error(
                    "Unexpected provider data",
                    "Expected FortiSaseProviderData; this is a bug in the provider",
                )
            })
    }
}

/// Error for operations attempted before the provider was configured
pub fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "The FortiSASE provider must be configured before resources can be managed",
    )
}
