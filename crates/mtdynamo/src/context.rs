//! Tenant context providers.
//!
//! The facades ask a [`ContextProvider`] for the tenant of every request.
//! [`StaticContext`] pins one tenant (or none); [`TaskLocalContext`] reads the
//! tenant set by [`with_context`] for the current tokio task.

use std::future::Future;

use mtdynamo_core::store::ContextProvider;

tokio::task_local! {
    static TENANT_CONTEXT: String;
}

/// Always reports the same tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticContext {
    context: Option<String>,
}

impl StaticContext {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
        }
    }

    /// No tenant: requests run in cross-tenant mode.
    pub fn none() -> Self {
        Self::default()
    }
}

impl ContextProvider for StaticContext {
    fn context(&self) -> Option<String> {
        self.context.clone()
    }
}

/// Reads the tenant scoped by [`with_context`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskLocalContext;

impl ContextProvider for TaskLocalContext {
    fn context(&self) -> Option<String> {
        TENANT_CONTEXT.try_with(|context| context.clone()).ok()
    }
}

/// Runs `future` with `context` as the current tenant.
pub async fn with_context<F>(context: impl Into<String>, future: F) -> F::Output
where
    F: Future,
{
    TENANT_CONTEXT.scope(context.into(), future).await
}
