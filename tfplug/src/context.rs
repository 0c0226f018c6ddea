//! Request-scoped context
//!
//! Every trait method receives a `Context`. It carries an id used to
//! correlate log lines of one Terraform operation and a cancellation signal
//! shared with the context it was derived from, so stopping the provider
//! reaches every request in flight.

use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    request_id: Uuid,
    cancel: Arc<watch::Sender<bool>>,
}

impl Context {
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self::with_cancel(Arc::new(cancel))
    }

    fn with_cancel(cancel: Arc<watch::Sender<bool>>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                request_id: Uuid::new_v4(),
                cancel,
            }),
        }
    }

    /// A context for one request: its own id, cancelled together with `self`
    pub fn child(&self) -> Self {
        Self::with_cancel(self.inner.cancel.clone())
    }

    pub fn request_id(&self) -> Uuid {
        self.inner.request_id
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancel.borrow()
    }

    pub fn cancel(&self) {
        self.inner.cancel.send_replace(true);
    }

    /// Resolves once the context is cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.inner.cancel.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Span tagging log lines with this request's id
    pub fn span(&self, operation: &'static str, type_name: &str) -> tracing::Span {
        tracing::info_span!(
            "tf_request",
            request_id = %self.inner.request_id,
            operation,
            type_name
        )
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
