//! Process-wide table of loaded back-end modules
//!
//! Back-ends publish their API surface here as named types with named,
//! signature-typed members. The facade never references a back-end statically;
//! it finds types by name and members by `(name, signature)`, the same way a
//! reflective runtime would.

pub mod signatures;

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

pub use signatures::*;

/// One exported member overload
struct Member {
    signature: TypeId,
    signature_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

/// A named type and its members
pub struct TypeExports {
    name: String,
    members: HashMap<String, Vec<Member>>,
}

impl TypeExports {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: HashMap::new(),
        }
    }

    /// Add a member; several values of different signatures may share a name
    pub fn with_member<S>(mut self, name: &str, value: S) -> Self
    where
        S: Any + Send + Sync,
    {
        let overloads = self.members.entry(name.to_string()).or_default();
        overloads.retain(|m| m.signature != TypeId::of::<S>());
        overloads.push(Member {
            signature: TypeId::of::<S>(),
            signature_name: type_name::<S>(),
            value: Box::new(value),
        });
        self
    }

    /// Fully-qualified type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a member by name and signature
    pub fn member<S>(&self, name: &str) -> Option<S>
    where
        S: Any + Clone,
    {
        self.members
            .get(name)?
            .iter()
            .find(|m| m.signature == TypeId::of::<S>())
            .and_then(|m| m.value.downcast_ref::<S>())
            .cloned()
    }

    /// Whether any overload of `name` exists
    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Signatures exported under `name`, for diagnostics
    pub fn signatures_of(&self, name: &str) -> Vec<&'static str> {
        self.members
            .get(name)
            .map(|overloads| overloads.iter().map(|m| m.signature_name).collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for TypeExports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut members: Vec<_> = self.members.keys().collect();
        members.sort();
        f.debug_struct("TypeExports")
            .field("name", &self.name)
            .field("members", &members)
            .finish()
    }
}

/// Everything a back-end module exports
#[derive(Debug)]
pub struct ModuleExports {
    name: String,
    types: Vec<Arc<TypeExports>>,
}

impl ModuleExports {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
        }
    }

    pub fn with_type(mut self, exports: TypeExports) -> Self {
        self.types.retain(|t| t.name != exports.name);
        self.types.push(Arc::new(exports));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find_type(&self, type_name: &str) -> Option<Arc<TypeExports>> {
        self.types.iter().find(|t| t.name == type_name).cloned()
    }

    pub fn type_names(&self) -> Vec<String> {
        self.types.iter().map(|t| t.name.clone()).collect()
    }
}

/// Registry of loaded modules
pub struct ModuleRegistry {
    modules: RwLock<HashMap<String, Arc<ModuleExports>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: RwLock::new(HashMap::new()),
        }
    }

    /// Load (or replace) a module
    pub fn load(&self, module: ModuleExports) {
        let name = module.name.clone();
        self.modules.write().insert(name, Arc::new(module));
    }

    /// Unload a module by name
    pub fn unload(&self, name: &str) -> bool {
        self.modules.write().remove(name).is_some()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.modules.read().contains_key(name)
    }

    /// Find a type by fully-qualified name inside a named module
    pub fn find_type(&self, type_name: &str, module_name: &str) -> Option<Arc<TypeExports>> {
        self.modules.read().get(module_name)?.find_type(type_name)
    }

    /// List all loaded module names
    pub fn list(&self) -> Vec<String> {
        self.modules.read().keys().cloned().collect()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.list())
            .finish()
    }
}

// Global registry instance
static GLOBAL_MODULES: Lazy<Arc<ModuleRegistry>> = Lazy::new(|| Arc::new(ModuleRegistry::new()));

/// The process-wide module table used by the global facade
pub fn global_modules() -> Arc<ModuleRegistry> {
    Arc::clone(&GLOBAL_MODULES)
}

/// Load a module into the process-wide table
pub fn load_module(module: ModuleExports) {
    GLOBAL_MODULES.load(module);
}

/// Unload a module from the process-wide table
pub fn unload_module(name: &str) -> bool {
    GLOBAL_MODULES.unload(name)
}

/// Find a type in the process-wide table
pub fn find_type(type_name: &str, module_name: &str) -> Option<Arc<TypeExports>> {
    GLOBAL_MODULES.find_type(type_name, module_name)
}
