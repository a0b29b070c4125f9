//! Capability registry.
//!
//! Each capability is one logical backend operation exposed through the
//! gateway. The registry is the single table that drives routing, retry
//! budgets, fallback eligibility and failure policy.

mod catalog;
mod fallback;

pub use catalog::default_registry;
pub use fallback::{load_fallback_overrides, FallbackPayload};

use axum::http::Method;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// What a capability does to backend state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Read,
    Mutation,
    /// Fire-and-forget signals (view tracking, search feedback)
    Telemetry,
}

/// How backend failures surface to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Failure is mapped to an error envelope
    #[default]
    HardFail,
    /// Unreachable backend downgrades to the fallback payload
    SoftFallback,
    /// Caller always sees success
    AlwaysSucceed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    #[default]
    Json,
    /// Streamed through with content headers preserved
    Binary,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{method} {path} is already registered")]
    DuplicateRoute { method: Method, path: String },

    #[error("capability name {0} is already registered")]
    DuplicateName(String),

    #[error("{path}: capability paths must start with '/'")]
    InvalidPath { path: String },

    #[error("{0}: soft fallback needs a read capability with a fallback payload")]
    SoftFallbackWithoutPayload(String),

    #[error("{0}: only telemetry capabilities may always succeed")]
    AlwaysSucceedOnNonTelemetry(String),

    #[error("{0}: mutations cannot carry a fallback payload")]
    MutationWithFallback(String),
}

/// One backend operation.
#[derive(Debug, Clone)]
pub struct Capability {
    pub name: String,
    pub method: Method,
    /// Router pattern, e.g. `/api/media/:id/faces`
    pub path: String,
    pub kind: CapabilityKind,
    pub idempotent: bool,
    pub policy: FailurePolicy,
    pub fallback: Option<FallbackPayload>,
    pub response: ResponseKind,
    pub required_fields: Vec<&'static str>,
    pub required_query: Vec<&'static str>,
    /// Overrides the configured per-attempt timeout
    pub timeout: Option<Duration>,
}

impl Capability {
    fn base(name: &str, method: Method, path: &str, kind: CapabilityKind) -> Self {
        let idempotent = method.is_idempotent();
        Self {
            name: name.to_string(),
            method,
            path: path.to_string(),
            kind,
            idempotent,
            policy: FailurePolicy::HardFail,
            fallback: None,
            response: ResponseKind::Json,
            required_fields: Vec::new(),
            required_query: Vec::new(),
            timeout: None,
        }
    }

    /// `GET` read, retried under the configured budget.
    pub fn read(name: &str, path: &str) -> Self {
        Self::base(name, Method::GET, path, CapabilityKind::Read)
    }

    /// State-changing call. Never retried unless the method is idempotent.
    pub fn mutation(name: &str, method: Method, path: &str) -> Self {
        Self::base(name, method, path, CapabilityKind::Mutation)
    }

    /// Telemetry call that reports `success_body` whatever the backend does.
    pub fn telemetry(name: &str, method: Method, path: &str, success_body: serde_json::Value) -> Self {
        let mut cap = Self::base(name, method, path, CapabilityKind::Telemetry);
        cap.policy = FailurePolicy::AlwaysSucceed;
        cap.fallback = Some(FallbackPayload::Static(success_body));
        cap
    }

    /// Payload served in demo mode; does not change the failure policy.
    #[must_use]
    pub fn with_fallback(mut self, payload: FallbackPayload) -> Self {
        self.fallback = Some(payload);
        self
    }

    /// Payload served in demo mode and whenever the backend is unreachable.
    #[must_use]
    pub fn soft_fallback(mut self, payload: FallbackPayload) -> Self {
        self.fallback = Some(payload);
        self.policy = FailurePolicy::SoftFallback;
        self
    }

    #[must_use]
    pub fn binary(mut self) -> Self {
        self.response = ResponseKind::Binary;
        self
    }

    #[must_use]
    pub fn require_fields(mut self, fields: &[&'static str]) -> Self {
        self.required_fields.extend_from_slice(fields);
        self
    }

    #[must_use]
    pub fn require_query(mut self, params: &[&'static str]) -> Self {
        self.required_query.extend_from_slice(params);
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.idempotent = method.is_idempotent();
        self.method = method;
        self
    }

    #[must_use]
    pub fn idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = idempotent;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_mutation(&self) -> bool {
        self.kind == CapabilityKind::Mutation
    }

    fn check(&self) -> Result<(), RegistryError> {
        if !self.path.starts_with('/') {
            return Err(RegistryError::InvalidPath { path: self.path.clone() });
        }
        match self.policy {
            FailurePolicy::SoftFallback
                if self.kind != CapabilityKind::Read || self.fallback.is_none() =>
            {
                Err(RegistryError::SoftFallbackWithoutPayload(self.name.clone()))
            },
            FailurePolicy::AlwaysSucceed if self.kind != CapabilityKind::Telemetry => {
                Err(RegistryError::AlwaysSucceedOnNonTelemetry(self.name.clone()))
            },
            _ if self.kind == CapabilityKind::Mutation && self.fallback.is_some() => {
                Err(RegistryError::MutationWithFallback(self.name.clone()))
            },
            _ => Ok(()),
        }
    }
}

/// Serializable view for the admin listing.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityInfo {
    pub name: String,
    pub method: String,
    pub path: String,
    pub kind: CapabilityKind,
    pub idempotent: bool,
    pub policy: FailurePolicy,
    pub response: ResponseKind,
    pub has_fallback: bool,
}

impl From<&Capability> for CapabilityInfo {
    fn from(cap: &Capability) -> Self {
        Self {
            name: cap.name.clone(),
            method: cap.method.to_string(),
            path: cap.path.clone(),
            kind: cap.kind,
            idempotent: cap.idempotent,
            policy: cap.policy,
            response: cap.response,
            has_fallback: cap.fallback.is_some(),
        }
    }
}

/// Table of capabilities keyed by method + path pattern.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    capabilities: Vec<Arc<Capability>>,
    routes: HashMap<(Method, String), usize>,
    names: HashMap<String, usize>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, capability: Capability) -> Result<(), RegistryError> {
        capability.check()?;

        let key = (capability.method.clone(), capability.path.clone());
        if self.routes.contains_key(&key) {
            return Err(RegistryError::DuplicateRoute { method: key.0, path: key.1 });
        }
        if self.names.contains_key(&capability.name) {
            return Err(RegistryError::DuplicateName(capability.name));
        }

        let index = self.capabilities.len();
        self.routes.insert(key, index);
        self.names.insert(capability.name.clone(), index);
        self.capabilities.push(Arc::new(capability));
        Ok(())
    }

    pub fn get(&self, method: &Method, path: &str) -> Option<&Arc<Capability>> {
        self.routes.get(&(method.clone(), path.to_string())).and_then(|&i| self.capabilities.get(i))
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<Capability>> {
        self.names.get(name).and_then(|&i| self.capabilities.get(i))
    }

    /// Replace (or add) the fallback payload of a read or telemetry capability.
    /// Returns false for unknown names and mutations.
    pub fn set_fallback(&mut self, name: &str, payload: FallbackPayload) -> bool {
        let Some(&index) = self.names.get(name) else {
            return false;
        };
        let Some(slot) = self.capabilities.get_mut(index) else {
            return false;
        };
        if slot.is_mutation() {
            return false;
        }
        Arc::make_mut(slot).fallback = Some(payload);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Capability>> {
        self.capabilities.iter()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    pub fn describe(&self) -> Vec<CapabilityInfo> {
        self.capabilities.iter().map(|c| CapabilityInfo::from(c.as_ref())).collect()
    }
}
