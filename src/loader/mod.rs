//! Loadable resources and module resolution
//!
//! Program bodies become *resources*: one-shot entries in a
//! [`ResourceRegistry`] addressed by an opaque identity such as
//! `blob:playground/5f3a9c1e-3`. Identity is by creation, so two resources made
//! from identical text never share an identity. The interpreter resolves
//! `import` specifiers only against the registry through
//! [`ResourceModuleLoader`]; released or unknown identities fail to load.

use boa_engine::module::{ModuleLoader, Referrer};
use boa_engine::{Context, JsError, JsNativeError, JsResult, JsString, Module, Source};
use rustc_hash::FxHashMap as HashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Scheme prefix of every resource identity.
pub const RESOURCE_SCHEME: &str = "blob:playground/";

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// Handle to a registered program body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    id: String,
}

impl Resource {
    /// The identity import specifiers must use.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

// ---------------------------------------------------------------------------
// ResourceRegistry
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct RegistryInner {
    nonce: u32,
    next: u64,
    live: HashMap<String, Rc<str>>,
}

/// Shared registry of live resources.
///
/// Cloning yields another handle to the same registry. Single-threaded.
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryInner {
                nonce: rand::random::<u32>(),
                next: 0,
                live: HashMap::default(),
            })),
        }
    }

    /// Register `text` under a fresh identity.
    pub fn create(&self, text: impl Into<String>) -> Resource {
        let mut inner = self.inner.borrow_mut();
        inner.next += 1;
        let id = format!("{}{:08x}-{}", RESOURCE_SCHEME, inner.nonce, inner.next);
        let text: String = text.into();
        inner.live.insert(id.clone(), Rc::from(text));
        tracing::trace!(resource = %id, "created resource");
        Resource { id }
    }

    /// Text behind a live identity.
    pub fn resolve(&self, id: &str) -> Option<Rc<str>> {
        self.inner.borrow().live.get(id).cloned()
    }

    pub fn is_live(&self, resource: &Resource) -> bool {
        self.inner.borrow().live.contains_key(resource.id())
    }

    /// Number of live resources.
    pub fn live(&self) -> usize {
        self.inner.borrow().live.len()
    }

    /// Invalidate resources. Already released ones are ignored; never panics.
    pub fn release(&self, resources: &[Resource]) {
        let Ok(mut inner) = self.inner.try_borrow_mut() else {
            tracing::warn!("resource registry busy, release skipped");
            return;
        };
        for resource in resources {
            if inner.live.remove(resource.id()).is_some() {
                tracing::trace!(resource = %resource, "released resource");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ResourceModuleLoader
// ---------------------------------------------------------------------------

/// Module loader installed into each run's interpreter context.
///
/// Parsed modules are cached per identity for the lifetime of the context.
pub struct ResourceModuleLoader {
    registry: ResourceRegistry,
    cache: RefCell<HashMap<String, Module>>,
}

impl ResourceModuleLoader {
    pub fn new(registry: ResourceRegistry) -> Self {
        Self {
            registry,
            cache: RefCell::new(HashMap::default()),
        }
    }

    /// Parse the module behind `id`, or return the cached one.
    pub fn load(&self, id: &str, context: &mut Context) -> JsResult<Module> {
        if let Some(module) = self.cache.borrow().get(id) {
            return Ok(module.clone());
        }

        let text = self.registry.resolve(id).ok_or_else(|| {
            JsNativeError::typ().with_message(format!("could not resolve module '{}'", id))
        })?;

        let module = Module::parse(Source::from_bytes(text.as_bytes()), None, context)?;
        self.cache.borrow_mut().insert(id.to_string(), module.clone());
        tracing::debug!(resource = %id, "parsed module");
        Ok(module)
    }
}

impl ModuleLoader for ResourceModuleLoader {
    fn load_imported_module(
        &self,
        _referrer: Referrer,
        specifier: JsString,
        finish_load: Box<dyn FnOnce(JsResult<Module>, &mut Context)>,
        context: &mut Context,
    ) {
        let id = specifier.to_std_string_escaped();
        let result = self.load(&id, context);
        finish_load(result, context);
    }

    fn register_module(&self, specifier: JsString, module: Module) {
        self.cache
            .borrow_mut()
            .insert(specifier.to_std_string_escaped(), module);
    }

    fn get_module(&self, specifier: JsString) -> Option<Module> {
        self.cache
            .borrow()
            .get(&specifier.to_std_string_escaped())
            .cloned()
    }
}

/// Render an interpreter error the way the learner sees it (`SyntaxError: ...`).
pub fn describe_error(err: JsError, context: &mut Context) -> String {
    match err.try_native(context) {
        Ok(native) => native.to_string(),
        Err(other) => other.to_string(),
    }
}
