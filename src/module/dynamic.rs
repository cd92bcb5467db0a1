use crate::di::{Container, GlobalScope, Provider};
use crate::error::Result;
use crate::module::ModuleImport;
use crate::routing::RouteCollection;
use std::future::Future;

/// Module variant exposing exactly one string-tokened provider.
///
/// The provider is always global: the built value lands in the shared global
/// scope so any module in the tree can resolve the token by name. Dynamic
/// modules never carry routes. Typical use is environment-derived
/// configuration exposed under a stable string token, so ordinary modules
/// can depend on the token instead of a concrete type.
///
/// # Example
/// ```rust,ignore
/// let config = DynamicModule::new("ENV_KEY", || async {
///     std::env::var("COIN_API_KEY").unwrap_or_default()
/// });
/// ```
pub struct DynamicModule {
    provider: Provider,
    imports: Vec<ModuleImport>,
}

impl DynamicModule {
    pub fn new<F, Fut, T>(token: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + Sync + 'static,
    {
        Self {
            provider: Provider::named(token).with_factory(factory).global(),
            imports: Vec::new(),
        }
    }

    /// Add an imported submodule, registered before the provider itself.
    pub fn import(mut self, import: impl Into<ModuleImport>) -> Self {
        self.imports.push(import.into());
        self
    }

    pub(crate) async fn register_with(
        &mut self,
        global: &GlobalScope,
    ) -> Result<Vec<RouteCollection>> {
        for import in &mut self.imports {
            // Sub-containers stay with their modules and routes are dropped;
            // only global providers from this subtree remain visible.
            import.register_with(global).await?;
        }

        let mut scratch = Container::with_global(global.clone());
        scratch.register_provider(&self.provider).await?;
        tracing::debug!(token = %self.provider.token(), "dynamic module registered");
        Ok(Vec::new())
    }
}
