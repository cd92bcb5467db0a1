use crate::di::Container;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode as HttpStatusCode, request::Parts},
};
use std::sync::Arc;

/// Axum extractor for dependency injection.
///
/// Resolves a registered service out of the state's container at request
/// time, so routers can be declared before the module tree has registered.
///
/// # Example
/// ```rust,ignore
/// async fn market(Inject(service): Inject<CoinService>) -> Json<Market> {
///     Json(service.market().await)
/// }
/// ```
pub struct Inject<T>(pub Arc<T>);

/// Trait the router state must implement to provide the DI container.
pub trait HasContainer {
    fn container(&self) -> &Container;
}

impl<S, T> FromRequestParts<S> for Inject<T>
where
    S: Send + Sync + HasContainer,
    T: 'static + Send + Sync,
{
    type Rejection = (HttpStatusCode, String);

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        state.container().resolve::<T>().map(Inject).map_err(|e| {
            (
                HttpStatusCode::INTERNAL_SERVER_ERROR,
                format!("Dependency injection failed: {}", e),
            )
        })
    }
}

impl<T> std::ops::Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> Clone for Inject<T> {
    fn clone(&self) -> Self {
        Inject(Arc::clone(&self.0))
    }
}
