use crate::di::injectable::Injectable;
use crate::error::{NidusError, Result};
use crate::token::Token;
use std::any::{Any, type_name};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Stored value form: every registered instance is a shared `Any`.
///
/// Typed access downcasts back to `Arc<T>`; see [`crate::Container::resolve`].
pub type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) type FactoryFuture = Pin<Box<dyn Future<Output = Instance> + Send>>;
pub(crate) type Factory = Box<dyn Fn() -> FactoryFuture + Send + Sync>;

/// Declarative recipe for producing a token's value.
///
/// Three shapes, mirroring the module provider union:
/// - [`Provider::class`] — auto-build an injectable type from its declared
///   dependency manifest;
/// - [`Provider::named`] completed with [`with_value`](Provider::with_value)
///   or [`with_factory`](Provider::with_factory) — an explicit string-tokened
///   value;
/// - a bare [`Provider::named`] — invalid on purpose; registration fails with
///   [`NidusError::MissingFactory`], since a string token cannot be
///   auto-constructed.
///
/// [`global`](Provider::global) marks the provider's single instance as
/// shared across the whole module tree.
pub struct Provider {
    token: Token,
    source: Option<Source>,
    global: bool,
}

pub(crate) enum Source {
    Value(Instance),
    Factory(Factory),
    Auto(AutoRecipe),
}

/// Type-erased construction recipe for an injectable type.
pub(crate) struct AutoRecipe {
    pub(crate) dependencies: fn() -> Vec<Token>,
    pub(crate) assemble: fn(&mut ResolvedArguments) -> Result<Instance>,
}

impl Provider {
    /// Shorthand: build this injectable type automatically from its declared
    /// dependencies.
    pub fn class<C: Injectable>() -> Self {
        Self {
            token: Token::of::<C>(),
            source: Some(Source::Auto(AutoRecipe {
                dependencies: C::dependencies,
                assemble: |args| Ok(Arc::new(C::assemble(args)?) as Instance),
            })),
            global: false,
        }
    }

    /// Descriptor for a string token. Must be completed with a value or a
    /// factory before registration.
    pub fn named(token: impl Into<String>) -> Self {
        Self {
            token: Token::named(token),
            source: None,
            global: false,
        }
    }

    /// Supply a literal value for the token.
    pub fn with_value<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.source = Some(Source::Value(Arc::new(value)));
        self
    }

    /// Supply an asynchronous factory, awaited at registration time.
    ///
    /// The factory runs at most once per container, and at most once
    /// process-wide for a global provider.
    pub fn with_factory<F, Fut, T>(mut self, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + Sync + 'static,
    {
        self.source = Some(Source::Factory(Box::new(move || {
            let building = factory();
            Box::pin(async move { Arc::new(building.await) as Instance })
        })));
        self
    }

    /// Share this provider's single instance across the whole module tree.
    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub(crate) fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }
}

/// Ordered access to a type's resolved constructor dependencies.
///
/// [`Injectable::assemble`] consumes the arguments in declaration order;
/// each call downcasts the next instance to the requested type.
pub struct ResolvedArguments {
    values: std::vec::IntoIter<Instance>,
}

impl ResolvedArguments {
    pub(crate) fn new(values: Vec<Instance>) -> Self {
        Self {
            values: values.into_iter(),
        }
    }

    pub(crate) fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Take the next argument as `Arc<T>`.
    pub fn take<T: Send + Sync + 'static>(&mut self) -> Result<Arc<T>> {
        let value = self.values.next().ok_or_else(|| {
            NidusError::Internal(format!(
                "ran out of resolved arguments while assembling {}",
                type_name::<T>()
            ))
        })?;
        value.downcast::<T>().map_err(|_| NidusError::DowncastFailed {
            type_name: type_name::<T>().to_string(),
        })
    }
}
