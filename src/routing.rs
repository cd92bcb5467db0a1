use crate::di::{Container, HasContainer};
use axum::Router;

/// An ordered, prefix-tagged collection of handlers.
///
/// Modules declare these at construction time; handlers resolve their
/// services at request time through [`crate::Inject`], so the router can be
/// built before the module tree has registered.
pub struct RouteCollection {
    prefix: String,
    router: Router<AppState>,
}

impl RouteCollection {
    pub fn new(prefix: impl Into<String>, router: Router<AppState>) -> Self {
        Self {
            prefix: prefix.into(),
            router,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Shared request state carrying the registered container.
#[derive(Clone)]
pub struct AppState {
    container: Container,
}

impl AppState {
    pub fn new(container: Container) -> Self {
        Self { container }
    }
}

impl HasContainer for AppState {
    fn container(&self) -> &Container {
        &self.container
    }
}

/// Mount every collection under its prefix, in list order.
///
/// Prefix collisions are axum's concern, not this layer's. A collection
/// mounted at `/` is merged instead of nested.
pub fn mount(routes: Vec<RouteCollection>, container: Container) -> Router {
    let mut app = Router::new();
    for collection in routes {
        tracing::debug!(prefix = %collection.prefix, "mounting routes");
        app = if collection.prefix == "/" {
            app.merge(collection.router)
        } else {
            app.nest(&collection.prefix, collection.router)
        };
    }
    app.with_state(AppState::new(container))
}
