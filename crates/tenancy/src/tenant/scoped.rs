//! Scoped execution: run a unit of work with a tenant set.
//!
//! [`ScopedType::with_tenant`] sets the type's dimension, runs the body and
//! resets the context exactly once however the body ends: normal return,
//! early `?` return inside the body, or a panic unwinding through it. The
//! body's result, including any `Err`, is handed back untouched.
//!
//! [`ScopedType::with_tenant_async`] does the same for futures. The tenant is
//! installed in a task-local scope that lives as long as the future, so it is
//! released on completion and on cancellation alike.
//!
//! Both forms keep the body's own context writes inside the block: on exit
//! every dimension is back to what the caller had, except that
//! [`NestedScope::Clear`] also empties this type's dimension.

use std::future::Future;

use super::context::{ContextSnapshot, TenantContext};
use super::id::TenantId;
use super::registry::ScopedType;
use crate::config::NestedScope;

/// Puts a saved context back when dropped.
struct ContextGuard {
    restore: Option<ContextSnapshot>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if let Some(snapshot) = self.restore.take() {
            TenantContext::restore(snapshot);
        }
    }
}

impl ScopedType {
    /// Runs `body` with this type's current tenant set to `tenant`.
    ///
    /// On exit this dimension is restored according to the registry's
    /// [`NestedScope`]: the previous tenant by default, or empty with
    /// [`NestedScope::Clear`]. Tenants the body sets on other dimensions are
    /// discarded, as with [`with_tenant_async`](Self::with_tenant_async).
    ///
    /// The body is synchronous, so the write is undone before control can
    /// return to an async executor; this form may be used from any thread.
    ///
    /// # Examples
    ///
    /// ```
    /// use helios_tenancy::tenant::{DimensionRegistry, ScopedOptions, TenantId};
    ///
    /// let registry = DimensionRegistry::new();
    /// let company = registry.register("Company", &ScopedOptions::new()).unwrap();
    ///
    /// let result: Result<(), &str> = company.with_tenant(TenantId::new(1), || {
    ///     assert_eq!(company.current_tenant(), Some(TenantId::new(1)));
    ///     Err("boom")
    /// });
    ///
    /// assert_eq!(result, Err("boom"));
    /// assert_eq!(company.current_tenant(), None);
    /// ```
    pub fn with_tenant<R>(&self, tenant: impl Into<TenantId>, body: impl FnOnce() -> R) -> R {
        let outer = TenantContext::snapshot();
        let restore = match self.nested_scope() {
            NestedScope::RestorePrevious => outer,
            NestedScope::Clear => outer.with(self.dimension(), None),
        };
        let _guard = ContextGuard {
            restore: Some(restore),
        };

        TenantContext::set_unchecked(self.dimension(), Some(tenant.into()));
        body()
    }

    /// Runs `body` to completion with this type's current tenant set to
    /// `tenant` for the whole life of the future.
    ///
    /// The body sees every other tenant active in the caller at the time of
    /// the first poll. Writes the body makes to the context stay inside it.
    ///
    /// With [`NestedScope::Clear`] the caller's slot for this dimension is
    /// emptied when the body completes. A cancelled call never returns to its
    /// caller and leaves the caller's context as it was. The caller's slot is
    /// not touched either when it is the thread slot of a runtime worker,
    /// which tenants can never be written to.
    pub async fn with_tenant_async<F: Future>(&self, tenant: impl Into<TenantId>, body: F) -> F::Output {
        let snapshot = TenantContext::snapshot().with(self.dimension(), Some(tenant.into()));
        let output = TenantContext::scope(snapshot, body).await;

        // Runs in the caller's context, after the body's scope has ended.
        if self.nested_scope() == NestedScope::Clear && TenantContext::owns_slots() {
            TenantContext::set_unchecked(self.dimension(), None);
        }
        output
    }
}
