use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ConfigureError;
use crate::params::{FlagConfig, FlagValue};

/// Flag values currently set on an [`Environment`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvFlags {
    values: BTreeMap<String, FlagValue>,
}

impl EnvFlags {
    pub fn get(&self, flag: &str) -> Option<FlagValue> {
        self.values.get(flag).copied()
    }

    pub fn get_bool(&self, flag: &str) -> Option<bool> {
        self.get(flag).and_then(|v| v.as_bool())
    }

    pub fn get_number(&self, flag: &str) -> Option<f64> {
        self.get(flag).and_then(|v| v.as_number())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn extend(&mut self, config: &FlagConfig) {
        self.values
            .extend(config.iter().map(|(k, v)| (k.clone(), *v)));
    }
}

/// An initialised compute backend.
pub trait Backend: Send + Sync {
    fn name(&self) -> &str;

    /// The value `flag` had when this backend was initialised.
    fn flag(&self, flag: &str) -> Option<FlagValue>;
}

/// Creates backends. Initialisation may suspend, so callers await it.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    async fn create(&self, name: &str, flags: &EnvFlags) -> anyhow::Result<Box<dyn Backend>>;
}

/// A backend that only remembers the flags it was created with. It stands in
/// for an external runtime whose numeric kernels live outside this crate.
pub struct SnapshotBackend {
    name: String,
    flags: EnvFlags,
}

impl Backend for SnapshotBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn flag(&self, flag: &str) -> Option<FlagValue> {
        self.flags.get(flag)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotFactory;

#[async_trait]
impl BackendFactory for SnapshotFactory {
    async fn create(&self, name: &str, flags: &EnvFlags) -> anyhow::Result<Box<dyn Backend>> {
        Ok(Box::new(SnapshotBackend {
            name: name.to_owned(),
            flags: flags.clone(),
        }))
    }
}

pub const DEFAULT_BACKENDS: &[&str] = &["webgl", "wasm", "cpu"];

/// Proof that a reset has been started for `backend`. Redeem it with
/// [`Environment::await_reset`] before running inference.
#[must_use]
pub struct ResetToken {
    backend: String,
}

impl ResetToken {
    pub fn backend(&self) -> &str {
        &self.backend
    }
}

/// The compute environment owned by one detection session: flags, registered
/// backend factories, initialised backends and the active one.
#[derive(Default)]
pub struct Environment {
    flags: EnvFlags,
    factories: HashMap<String, Arc<dyn BackendFactory>>,
    registry: HashMap<String, Box<dyn Backend>>,
    active: Option<String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment with [`SnapshotFactory`] registered under every name in
    /// [`DEFAULT_BACKENDS`].
    pub fn with_default_backends() -> Self {
        let mut env = Self::new();
        for name in DEFAULT_BACKENDS {
            env.register_backend(name, Arc::new(SnapshotFactory));
        }
        env
    }

    pub fn flags(&self) -> &EnvFlags {
        &self.flags
    }

    /// Sets every flag in `config`. Callers validate first; this never fails.
    pub fn set_flags(&mut self, config: &FlagConfig) {
        self.flags.extend(config);
    }

    /// Returns false and leaves the registry untouched if `name` is taken.
    pub fn register_backend(&mut self, name: &str, factory: Arc<dyn BackendFactory>) -> bool {
        if self.factories.contains_key(name) {
            warn!("{name} backend was already registered");
            return false;
        }
        self.factories.insert(name.to_owned(), factory);
        true
    }

    pub fn find_backend_factory(&self, name: &str) -> Option<Arc<dyn BackendFactory>> {
        self.factories.get(name).cloned()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn is_initialized(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    /// Disposes the backend instance if any and forgets its factory.
    pub fn remove_backend(&mut self, name: &str) {
        if self.registry.remove(name).is_some() {
            debug!("Disposed {name} backend");
        }
        self.factories.remove(name);
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
    }

    /// Initialises `name` if needed and makes it the active backend.
    pub async fn set_backend(&mut self, name: &str) -> Result<(), ConfigureError> {
        if !self.registry.contains_key(name) {
            let factory = self
                .find_backend_factory(name)
                .ok_or_else(|| ConfigureError::BackendNotRegistered(name.to_owned()))?;
            let backend = factory
                .create(name, &self.flags)
                .await
                .map_err(|source| ConfigureError::BackendInit {
                    backend: name.to_owned(),
                    source,
                })?;
            debug!("Initialized {name} backend");
            self.registry.insert(name.to_owned(), backend);
        }
        self.active = Some(name.to_owned());
        Ok(())
    }

    pub fn backend_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_backend(&self) -> Option<&dyn Backend> {
        let name = self.active.as_deref()?;
        self.registry.get(name).map(|b| b.as_ref())
    }

    /// First half of a backend reset: tears down an initialised instance of
    /// `name` and re-registers its factory so the next activation starts clean.
    pub fn begin_reset(&mut self, name: &str) -> Result<ResetToken, ConfigureError> {
        let factory = self
            .find_backend_factory(name)
            .ok_or_else(|| ConfigureError::BackendNotRegistered(name.to_owned()))?;
        if self.is_initialized(name) {
            self.remove_backend(name);
            self.register_backend(name, factory);
        }
        Ok(ResetToken {
            backend: name.to_owned(),
        })
    }

    /// Second half of a backend reset: initialises and activates the backend.
    pub async fn await_reset(&mut self, token: ResetToken) -> Result<(), ConfigureError> {
        self.set_backend(&token.backend).await
    }
}
