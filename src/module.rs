//! Registration of the facade with a script host.
//!
//! A host keeps a [`ModuleRegistry`] of named [`RootModule`]s. When a virtual
//! user imports a module, the host asks the root module for a fresh
//! [`ModuleInstance`] bound to that VU and hands the instance's [`Exports`]
//! to the script.
//!
//! # Example
//!
//! ```rust,ignore
//! use rstcp::module::{ModuleRegistry, MODULE_NAME};
//! use rstcp::{Tcp, Vu};
//!
//! let registry = ModuleRegistry::with_defaults();
//! let instance = registry.instantiate(MODULE_NAME, &vu)?;
//! let exports = instance.exports();
//! let tcp = exports.default_as::<Tcp>().unwrap();
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::tcp::Tcp;
use crate::vu::Vu;

/// Import path the TCP facade is registered under.
pub const MODULE_NAME: &str = "x/tcp";

/// Values a module instance makes visible to scripts.
#[derive(Clone)]
pub struct Exports {
    /// The module's default export.
    pub default: Arc<dyn Any + Send + Sync>,
}

impl Exports {
    /// Wrap a value as the default export.
    pub fn new<T: Any + Send + Sync>(default: T) -> Self {
        Self {
            default: Arc::new(default),
        }
    }

    /// Borrow the default export as `T`, if that is its type.
    pub fn default_as<T: Any>(&self) -> Option<&T> {
        self.default.downcast_ref::<T>()
    }
}

impl fmt::Debug for Exports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exports").finish_non_exhaustive()
    }
}

/// Per-VU instance of a module.
pub trait ModuleInstance: Send {
    /// Values exposed to the script.
    fn exports(&self) -> Exports;
}

/// Process-wide module, creating one instance per VU.
pub trait RootModule: Send + Sync {
    /// Create the instance for `vu`.
    fn new_instance(&self, vu: &Vu) -> Box<dyn ModuleInstance>;
}

/// Root module of the TCP facade.
#[derive(Debug, Clone, Default)]
pub struct TcpModule {
    config: Config,
}

impl TcpModule {
    /// Create a root module whose instances use `config`.
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl RootModule for TcpModule {
    fn new_instance(&self, vu: &Vu) -> Box<dyn ModuleInstance> {
        Box::new(TcpInstance {
            tcp: Tcp::new(vu, self.config.clone()),
        })
    }
}

/// Instance of [`TcpModule`] for one VU.
#[derive(Debug)]
pub struct TcpInstance {
    tcp: Tcp,
}

impl TcpInstance {
    /// The facade bound to this instance's VU.
    pub fn tcp(&self) -> &Tcp {
        &self.tcp
    }
}

impl ModuleInstance for TcpInstance {
    fn exports(&self) -> Exports {
        Exports::new(self.tcp.clone())
    }
}

/// Named collection of root modules.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Box<dyn RootModule>>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with [`TcpModule`] registered under [`MODULE_NAME`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.modules.insert(
            MODULE_NAME.to_string(),
            Box::new(TcpModule::default()),
        );
        registry
    }

    /// Register a root module under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is empty or already taken.
    pub fn register(&mut self, name: impl Into<String>, module: Box<dyn RootModule>) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidArgument("empty module name".into()));
        }
        if self.modules.contains_key(&name) {
            return Err(Error::InvalidArgument(format!(
                "module '{}' already registered",
                name
            )));
        }

        debug!(module = %name, "registered module");
        self.modules.insert(name, module);
        Ok(())
    }

    /// Look up a root module.
    pub fn get(&self, name: &str) -> Option<&dyn RootModule> {
        self.modules.get(name).map(|m| &**m)
    }

    /// Create `name`'s instance for `vu`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if no module is registered under `name`.
    pub fn instantiate(&self, name: &str, vu: &Vu) -> Result<Box<dyn ModuleInstance>> {
        let module = self
            .get(name)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown module '{}'", name)))?;
        Ok(module.new_instance(vu))
    }

    /// Registered module names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Get the number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}
