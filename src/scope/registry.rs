//! Scope registry, execution contexts and the deferred scope commands.
//!
//! The registry is an explicitly constructed object, injected wherever
//! resolution is needed. Thread affinity is expressed through
//! [`ScopeContext`] values handed to each logical thread of control rather
//! than through an ambient thread-local lookup, so the design also works
//! under execution models without stable thread identity.

use super::{Producer, Resolved, Scope, Value};
use crate::command::Command;
use crate::error::ExecError;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Current-scope binding for one logical thread of control.
///
/// Each thread or task creates its own context; rebinding one context is
/// never visible to another. Cloning shares the binding, which is what lets
/// a deferred [`EnterScopeCommand`] rebind the context it was created for.
#[derive(Clone, Default)]
pub struct ScopeContext {
    current: Arc<Mutex<Option<Arc<Scope>>>>,
}

impl ScopeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The scope this context is bound to, if any. Unbound contexts resolve
    /// against the registry's default scope.
    pub fn current(&self) -> Option<Arc<Scope>> {
        self.current.lock().clone()
    }

    pub(crate) fn bind(&self, scope: Arc<Scope>) {
        *self.current.lock() = Some(scope);
    }
}

/// Process state for named scopes: the default scope plus the name -> scope
/// table. Per-table and per-scope locks only; unrelated scopes never contend.
pub struct ScopeRegistry {
    default_scope: Arc<Scope>,
    by_name: RwLock<HashMap<String, Arc<Scope>>>,
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self {
            default_scope: Scope::root(),
            by_name: RwLock::new(HashMap::new()),
        }
    }

    pub fn default_scope(&self) -> Arc<Scope> {
        Arc::clone(&self.default_scope)
    }

    /// The scope `ctx` currently resolves against.
    pub fn current_scope(&self, ctx: &ScopeContext) -> Arc<Scope> {
        ctx.current()
            .unwrap_or_else(|| Arc::clone(&self.default_scope))
    }

    /// Look up a named scope without side effects.
    pub fn named_scope(&self, name: &str) -> Option<Arc<Scope>> {
        self.by_name.read().get(name).cloned()
    }

    /// Deferred registration into the context's current scope. The binding
    /// happens only when the returned command executes, so registration can
    /// be queued, logged or composed like any other operation.
    pub fn register(
        &self,
        ctx: &ScopeContext,
        key: impl Into<String>,
        producer: Producer,
    ) -> RegisterCommand {
        RegisterCommand::new(self.current_scope(ctx), key, producer)
    }

    /// Deferred scope switch for `ctx`.
    ///
    /// On execution: rebind if a scope named `name` exists; otherwise create
    /// it (parent = the context's current scope at that moment) when
    /// `create_if_absent`, or fail with [`ExecError::ScopeNotFound`].
    pub fn enter_scope(
        self: &Arc<Self>,
        ctx: &ScopeContext,
        name: impl Into<String>,
        create_if_absent: bool,
    ) -> EnterScopeCommand {
        EnterScopeCommand {
            registry: Arc::clone(self),
            ctx: ctx.clone(),
            name: name.into(),
            create_if_absent,
        }
    }

    /// Resolve `key` starting from the context's current scope, walking
    /// parent links. Absence yields `None`, never an error; callers assert
    /// the expected shape of a hit themselves.
    pub fn resolve(&self, ctx: &ScopeContext, key: &str, params: &[Value]) -> Option<Resolved> {
        self.current_scope(ctx).resolve(key, params)
    }
}

/// Deferred producer registration. Always succeeds.
pub struct RegisterCommand {
    scope: Arc<Scope>,
    key: String,
    producer: Producer,
}

impl RegisterCommand {
    /// Registration targeting an explicit scope rather than a context's
    /// current one.
    pub fn new(scope: Arc<Scope>, key: impl Into<String>, producer: Producer) -> Self {
        Self {
            scope,
            key: key.into(),
            producer,
        }
    }
}

impl Command for RegisterCommand {
    fn execute(&mut self) -> Result<(), ExecError> {
        self.scope.bind(self.key.clone(), Arc::clone(&self.producer));
        debug!(target: "foreman::scope", key = %self.key, "producer registered");
        Ok(())
    }

    fn label(&self) -> &'static str {
        "register"
    }
}

/// Deferred scope switch, created by [`ScopeRegistry::enter_scope`].
pub struct EnterScopeCommand {
    registry: Arc<ScopeRegistry>,
    ctx: ScopeContext,
    name: String,
    create_if_absent: bool,
}

impl Command for EnterScopeCommand {
    fn execute(&mut self) -> Result<(), ExecError> {
        {
            let scopes = self.registry.by_name.read();
            if let Some(scope) = scopes.get(&self.name) {
                self.ctx.bind(Arc::clone(scope));
                return Ok(());
            }
        }

        if !self.create_if_absent {
            return Err(ExecError::ScopeNotFound(self.name.clone()));
        }

        // First create wins under concurrency; losers of the race observe
        // the winner's scope through the entry and merely rebind.
        let scope = {
            let mut scopes = self.registry.by_name.write();
            Arc::clone(scopes.entry(self.name.clone()).or_insert_with(|| {
                debug!(target: "foreman::scope", name = %self.name, "scope created");
                Scope::child(self.registry.current_scope(&self.ctx))
            }))
        };
        self.ctx.bind(scope);
        Ok(())
    }

    fn label(&self) -> &'static str {
        "enter-scope"
    }
}
