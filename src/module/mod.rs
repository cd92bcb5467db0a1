mod dynamic;

pub use dynamic::DynamicModule;

use crate::di::{Container, GlobalScope, Instance, Provider};
use crate::error::Result;
use crate::routing::{AppState, RouteCollection};
use crate::token::Token;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Composition unit: provider descriptors, imported modules, and route
/// collections, backed by exactly one [`Container`].
///
/// A module moves from unregistered through registering to registered;
/// there is no transition back, and re-entering [`Module::register`] on a
/// registered module is undefined behavior.
///
/// # Example
/// ```rust,ignore
/// let mut root = Module::builder()
///     .import(config_module)
///     .import(coin_module)
///     .provider(Provider::class::<AppService>())
///     .route("/", Router::new().route("/health", get(health)))
///     .build();
///
/// let routes = root.register().await?;
/// ```
pub struct Module {
    providers: Vec<Provider>,
    imports: Vec<ModuleImport>,
    routes: Vec<RouteCollection>,
    container: Container,
}

impl Module {
    pub fn builder() -> ModuleBuilder {
        ModuleBuilder::default()
    }

    /// Register the whole import tree rooted at this module.
    ///
    /// Imports are walked depth-first in declared order, strictly before
    /// this module's own providers; every factory is awaited before the walk
    /// continues, so registration order is deterministic and token
    /// collisions resolve first-registered-wins. Returns the accumulated
    /// route collections; the container stays with the module.
    pub async fn register(&mut self) -> Result<Vec<RouteCollection>> {
        let global = self.container.global_scope().clone();
        self.register_with(&global).await
    }

    pub(crate) async fn register_with(
        &mut self,
        global: &GlobalScope,
    ) -> Result<Vec<RouteCollection>> {
        self.container.adopt_global(global.clone());

        let mut routes: Vec<RouteCollection> = self.routes.drain(..).collect();
        for import in &mut self.imports {
            let sub_routes = import.register_with(global).await?;
            routes.extend(sub_routes);
            if let Some(container) = import.container() {
                self.container.merge_from(container);
            }
        }

        for provider in &self.providers {
            self.container.auto_register(provider).await?;
        }

        tracing::debug!(
            providers = self.providers.len(),
            routes = routes.len(),
            "module registered"
        );
        Ok(routes)
    }

    /// Pull a previously registered service out of this module.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.container.resolve()
    }

    /// Pull a string-tokened value out of this module.
    pub fn resolve_named<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        self.container.resolve_named(name)
    }

    pub fn resolve_token(&self, token: &Token) -> Result<Instance> {
        self.container.resolve_token(token)
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Imported submodules, in declared order.
    pub fn imports(&self) -> &[ModuleImport] {
        &self.imports
    }
}

/// Builder for a [`Module`]'s provider, import, and route lists.
#[derive(Default)]
pub struct ModuleBuilder {
    providers: Vec<Provider>,
    imports: Vec<ModuleImport>,
    routes: Vec<RouteCollection>,
}

impl ModuleBuilder {
    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn import(mut self, import: impl Into<ModuleImport>) -> Self {
        self.imports.push(import.into());
        self
    }

    pub fn route(mut self, prefix: impl Into<String>, router: axum::Router<AppState>) -> Self {
        self.routes.push(RouteCollection::new(prefix, router));
        self
    }

    pub fn build(self) -> Module {
        Module {
            providers: self.providers,
            imports: self.imports,
            routes: self.routes,
            container: Container::new(),
        }
    }
}

/// An imported composition unit: a full module or a dynamic module.
pub enum ModuleImport {
    Module(Module),
    Dynamic(DynamicModule),
}

impl ModuleImport {
    // The register_with calls recurse through the module tree; boxing here
    // breaks the async type cycle.
    pub(crate) fn register_with<'a>(
        &'a mut self,
        global: &'a GlobalScope,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RouteCollection>>> + Send + 'a>> {
        match self {
            ModuleImport::Module(module) => Box::pin(module.register_with(global)),
            ModuleImport::Dynamic(dynamic) => Box::pin(dynamic.register_with(global)),
        }
    }

    pub(crate) fn container(&self) -> Option<&Container> {
        match self {
            ModuleImport::Module(module) => Some(module.container()),
            ModuleImport::Dynamic(_) => None,
        }
    }

    /// The imported module, if this import is a full module.
    pub fn as_module(&self) -> Option<&Module> {
        match self {
            ModuleImport::Module(module) => Some(module),
            ModuleImport::Dynamic(_) => None,
        }
    }
}

impl From<Module> for ModuleImport {
    fn from(module: Module) -> Self {
        ModuleImport::Module(module)
    }
}

impl From<DynamicModule> for ModuleImport {
    fn from(dynamic: DynamicModule) -> Self {
        ModuleImport::Dynamic(dynamic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn first_registered_import_wins_token_collisions() {
        let first = Module::builder()
            .provider(Provider::named("SHARED").with_value(String::from("from-m1")))
            .build();
        let second = Module::builder()
            .provider(Provider::named("SHARED").with_value(String::from("from-m2")))
            .build();

        let mut parent = Module::builder().import(first).import(second).build();
        parent.register().await.unwrap();

        assert_eq!(
            *parent.resolve_named::<String>("SHARED").unwrap(),
            "from-m1"
        );
    }

    #[tokio::test]
    async fn imports_register_before_own_providers() {
        // The parent declares the same token as its import; the import
        // registers first and wins.
        let imported = Module::builder()
            .provider(Provider::named("ORDER").with_value(String::from("import")))
            .build();
        let mut parent = Module::builder()
            .import(imported)
            .provider(Provider::named("ORDER").with_value(String::from("parent")))
            .build();
        parent.register().await.unwrap();

        assert_eq!(*parent.resolve_named::<String>("ORDER").unwrap(), "import");
    }

    #[tokio::test]
    async fn global_providers_are_shared_across_sibling_modules() {
        let runs = Arc::new(AtomicUsize::new(0));
        let make_provider = |runs: &Arc<AtomicUsize>| {
            let counter = Arc::clone(runs);
            Provider::named("SESSION")
                .with_factory(move || {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        String::from("session")
                    }
                })
                .global()
        };

        let left = Module::builder().provider(make_provider(&runs)).build();
        let right = Module::builder().provider(make_provider(&runs)).build();
        let mut parent = Module::builder().import(left).import(right).build();
        parent.register().await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        let from_left = parent.imports()[0]
            .as_module()
            .unwrap()
            .resolve_named::<String>("SESSION")
            .unwrap();
        let from_right = parent.imports()[1]
            .as_module()
            .unwrap()
            .resolve_named::<String>("SESSION")
            .unwrap();
        assert!(Arc::ptr_eq(&from_left, &from_right));
    }

    #[tokio::test]
    async fn own_routes_precede_import_routes() {
        let imported = Module::builder()
            .route("/imported", axum::Router::new())
            .build();
        let mut parent = Module::builder()
            .route("/own", axum::Router::new())
            .import(imported)
            .build();

        let routes = parent.register().await.unwrap();
        let prefixes: Vec<&str> = routes.iter().map(|r| r.prefix()).collect();
        assert_eq!(prefixes, ["/own", "/imported"]);
    }

    #[tokio::test]
    async fn dynamic_imports_contribute_no_routes() {
        let dynamic = DynamicModule::new("ENV", || async { String::from("value") });
        let mut parent = Module::builder().import(dynamic).build();

        let routes = parent.register().await.unwrap();
        assert!(routes.is_empty());
        assert_eq!(*parent.resolve_named::<String>("ENV").unwrap(), "value");
    }
}
