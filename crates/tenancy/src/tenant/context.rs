//! Per-execution-context tenant slots.
//!
//! This module defines [`TenantContext`], the store that holds "the current
//! tenant" for each [`Dimension`]. Slots are owned by the execution context
//! that set them and are never visible to any other context:
//!
//! - Plain OS threads use a thread-local map.
//! - Asynchronous work runs inside a tokio task-local scope (see
//!   [`TenantContext::scope`]). The scope travels with the future, so a task
//!   that is rescheduled onto another worker thread keeps its tenants.
//!
//! When a task-local scope is active it takes precedence over the thread slot
//! of whichever worker happens to be polling the task.
//!
//! A runtime worker thread polls many tasks, so its thread slot cannot belong
//! to any one of them. Writes made on a runtime thread outside a task scope
//! are refused with [`ConfigurationError::UnscopedTask`]; run such code under
//! [`TenantContext::scope`], [`TenantContext::spawn`] or `with_tenant_async`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;

use tokio::task::JoinHandle;

use super::dimension::Dimension;
use super::id::TenantId;
use crate::error::{ConfigResult, ConfigurationError};

type SlotMap = HashMap<Dimension, TenantId>;

thread_local! {
    static THREAD_SLOTS: RefCell<SlotMap> = RefCell::new(HashMap::new());
}

tokio::task_local! {
    static TASK_SLOTS: RefCell<SlotMap>;
}

/// Runs `f` against the slot map visible to the caller.
fn with_slots<R>(f: impl FnOnce(&mut SlotMap) -> R) -> R {
    if TASK_SLOTS.try_with(|_| ()).is_ok() {
        TASK_SLOTS.with(|slots| f(&mut slots.borrow_mut()))
    } else {
        THREAD_SLOTS.with(|slots| f(&mut slots.borrow_mut()))
    }
}

/// Fails when the visible slot map is the thread slot of a runtime worker.
fn ensure_owned(dimension: &Dimension) -> ConfigResult<()> {
    if TenantContext::owns_slots() {
        Ok(())
    } else {
        tracing::warn!(dimension = %dimension, "Refused tenant write outside a task scope");
        Err(ConfigurationError::UnscopedTask {
            dimension: dimension.clone(),
        })
    }
}

fn write_slot(slots: &mut SlotMap, dimension: &Dimension, tenant: Option<TenantId>) {
    match tenant {
        Some(id) => {
            tracing::debug!(dimension = %dimension, tenant_id = %id, "Tenant context set");
            slots.insert(dimension.clone(), id);
        }
        None => {
            if slots.remove(dimension).is_some() {
                tracing::debug!(dimension = %dimension, "Tenant context cleared");
            }
        }
    }
}

/// Access to the current execution context's tenant slots.
///
/// All functions act on the calling thread, or on the calling task when it
/// runs inside a [`TenantContext::scope`]. No locking is involved because
/// nothing here is shared.
///
/// # Examples
///
/// ```
/// use helios_tenancy::tenant::{Dimension, TenantContext, TenantId};
///
/// let company = Dimension::new("company");
/// assert_eq!(TenantContext::get(&company), None);
///
/// TenantContext::set(&company, Some(TenantId::new(1))).unwrap();
/// assert_eq!(TenantContext::get(&company), Some(TenantId::new(1)));
///
/// TenantContext::set(&company, None).unwrap();
/// assert_eq!(TenantContext::get(&company), None);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TenantContext;

impl TenantContext {
    /// Returns the tenant currently set for `dimension`, if any.
    pub fn get(dimension: &Dimension) -> Option<TenantId> {
        with_slots(|slots| slots.get(dimension).copied())
    }

    /// Overwrites the tenant for `dimension`. `None` empties the slot.
    ///
    /// Fails with [`ConfigurationError::UnscopedTask`] on a runtime thread
    /// outside a task scope, leaving every slot untouched.
    pub fn set(dimension: &Dimension, tenant: Option<TenantId>) -> ConfigResult<()> {
        ensure_owned(dimension)?;
        Self::set_unchecked(dimension, tenant);
        Ok(())
    }

    /// Writes the slot without the runtime check. Only for writes that are
    /// undone before control can return to the executor.
    pub(crate) fn set_unchecked(dimension: &Dimension, tenant: Option<TenantId>) {
        with_slots(|slots| write_slot(slots, dimension, tenant))
    }

    /// Replaces the visible slot map with `snapshot`.
    pub(crate) fn restore(snapshot: ContextSnapshot) {
        with_slots(|slots| *slots = snapshot.0)
    }

    #[cfg(test)]
    pub(crate) fn clear() {
        with_slots(|slots| slots.clear())
    }

    /// Returns `true` when the caller runs inside a task-local scope.
    pub fn in_task_scope() -> bool {
        TASK_SLOTS.try_with(|_| ()).is_ok()
    }

    /// Returns `true` when the visible slots belong to the caller alone: a
    /// task scope, or a thread that is not driving an async runtime.
    pub fn owns_slots() -> bool {
        Self::in_task_scope() || tokio::runtime::Handle::try_current().is_err()
    }

    /// Captures the slots visible to the caller.
    pub fn snapshot() -> ContextSnapshot {
        ContextSnapshot(with_slots(|slots| slots.clone()))
    }

    /// Runs `future` in a fresh task-local scope seeded from `snapshot`.
    ///
    /// Changes made inside the future stay inside the scope. The scope ends
    /// when the future completes or is dropped, so nothing has to be undone
    /// by hand on cancellation.
    pub fn scope<F: Future>(snapshot: ContextSnapshot, future: F) -> impl Future<Output = F::Output> {
        TASK_SLOTS.scope(RefCell::new(snapshot.0), future)
    }

    /// Runs `future` in a task-local scope seeded with the caller's current
    /// slots. Use this to carry tenants into `tokio::spawn`.
    ///
    /// ```
    /// use helios_tenancy::tenant::{Dimension, TenantContext, TenantId};
    ///
    /// let company = Dimension::new("company");
    /// TenantContext::set(&company, Some(TenantId::new(5))).unwrap();
    ///
    /// let inner = company.clone();
    /// let seen = tokio_test::block_on(TenantContext::scope_current(async move {
    ///     TenantContext::get(&inner)
    /// }));
    /// assert_eq!(seen, Some(TenantId::new(5)));
    /// # TenantContext::set(&company, None).unwrap();
    /// ```
    pub fn scope_current<F: Future>(future: F) -> impl Future<Output = F::Output> {
        Self::scope(Self::snapshot(), future)
    }

    /// Spawns `future` on the current runtime in its own task scope, seeded
    /// with the caller's current slots.
    ///
    /// Writes made by the spawned task stay in that task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, like `tokio::spawn`.
    pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        tokio::spawn(Self::scope_current(future))
    }
}

/// A copy of a context's slots, used to seed a task-local scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextSnapshot(SlotMap);

impl ContextSnapshot {
    /// Creates an empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the snapshot with `dimension` set to `tenant`.
    pub fn with(mut self, dimension: &Dimension, tenant: Option<TenantId>) -> Self {
        match tenant {
            Some(id) => {
                self.0.insert(dimension.clone(), id);
            }
            None => {
                self.0.remove(dimension);
            }
        }
        self
    }

    /// Returns the tenant recorded for `dimension`.
    pub fn get(&self, dimension: &Dimension) -> Option<TenantId> {
        self.0.get(dimension).copied()
    }

    /// Returns `true` if no slot is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
