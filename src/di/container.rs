use crate::di::provider::{AutoRecipe, Instance, Provider, ResolvedArguments, Source};
use crate::error::{NidusError, Result};
use crate::metadata;
use crate::token::Token;
use dashmap::DashMap;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared global tier, one per module tree.
///
/// Created by the root container and adopted by every descendant container
/// at registration time. Instances registered through a global-flagged
/// provider land here and are visible to every container holding the handle.
#[derive(Clone, Default)]
pub struct GlobalScope {
    entries: Arc<DashMap<Token, Instance>>,
}

impl GlobalScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.entries.contains_key(token)
    }

    fn get(&self, token: &Token) -> Option<Instance> {
        self.entries.get(token).map(|entry| entry.value().clone())
    }

    fn insert(&self, token: Token, instance: Instance) {
        self.entries.insert(token, instance);
    }
}

/// Per-module token registry with two tiers: a container-local map and the
/// shared [`GlobalScope`].
///
/// Construction happens exclusively through
/// [`Container::register_provider`] and [`Container::auto_register`];
/// resolution only reads.
#[derive(Clone)]
pub struct Container {
    local: HashMap<Token, Instance>,
    global: GlobalScope,
}

impl Container {
    pub fn new() -> Self {
        Self::with_global(GlobalScope::new())
    }

    /// Container sharing an existing global tier.
    pub fn with_global(global: GlobalScope) -> Self {
        Self {
            local: HashMap::new(),
            global,
        }
    }

    pub fn global_scope(&self) -> &GlobalScope {
        &self.global
    }

    /// Swap in an inherited global scope. Module registration does this as
    /// its first step, before anything is registered locally.
    pub(crate) fn adopt_global(&mut self, global: GlobalScope) {
        self.global = global;
    }

    /// Register an explicit provider descriptor.
    ///
    /// At most one factory run per token per container, and at most one
    /// ever, process-wide, for a global token: an existing entry is returned
    /// without re-invoking the factory.
    pub async fn register_provider(&mut self, provider: &Provider) -> Result<Instance> {
        let token = provider.token();
        if provider.is_global() {
            if let Some(existing) = self.global.get(token) {
                return Ok(existing);
            }
        }
        if let Some(existing) = self.local.get(token) {
            return Ok(existing.clone());
        }

        let value = match provider.source() {
            Some(Source::Value(value)) => value.clone(),
            Some(Source::Factory(factory)) => factory().await,
            Some(Source::Auto(_)) => {
                return Err(NidusError::Internal(format!(
                    "class provider [{token}] must be registered through auto_register"
                )));
            }
            None => {
                return Err(NidusError::MissingFactory {
                    token: token.display_name().to_string(),
                });
            }
        };
        tracing::debug!(token = %token, global = provider.is_global(), "registered provider");
        self.store(token.clone(), value, provider.is_global())
    }

    /// Look up a token: global tier first, then the local map.
    ///
    /// Resolution never constructs; a token absent from both tiers is an
    /// [`NidusError::InstanceNotFound`].
    pub fn resolve_token(&self, token: &Token) -> Result<Instance> {
        if let Some(instance) = self.global.get(token) {
            return Ok(instance);
        }
        self.local
            .get(token)
            .cloned()
            .ok_or_else(|| NidusError::InstanceNotFound {
                token: token.display_name().to_string(),
            })
    }

    /// Typed lookup by type token.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        downcast(self.resolve_token(&Token::of::<T>())?)
    }

    /// Typed lookup by string token.
    pub fn resolve_named<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        downcast(self.resolve_token(&Token::named(name))?)
    }

    /// Copy another container's local entries into this one.
    ///
    /// Insert-if-absent: on collision the entry already present wins, which
    /// keeps first-registered-wins semantics across a module tree. The
    /// global tier is shared by handle and needs no merging.
    pub fn merge_from(&mut self, other: &Container) {
        for (token, instance) in &other.local {
            self.local
                .entry(token.clone())
                .or_insert_with(|| instance.clone());
        }
    }

    /// Register a provider of any shape, building injectable classes from
    /// their declared dependencies.
    ///
    /// Dependencies must already be registered: a missing transitive
    /// dependency surfaces as [`NidusError::InstanceNotFound`] naming that
    /// dependency, not the type being built.
    pub async fn auto_register(&mut self, provider: &Provider) -> Result<Instance> {
        let token = provider.token();
        if provider.is_global() {
            if let Some(existing) = self.global.get(token) {
                return Ok(existing);
            }
        }
        if let Some(existing) = self.local.get(token) {
            return Ok(existing.clone());
        }

        match (token, provider.source()) {
            (Token::Named(_), Some(Source::Value(_) | Source::Factory(_))) => {
                self.register_provider(provider).await
            }
            (Token::Named(name), _) => Err(NidusError::MissingFactory {
                token: name.clone(),
            }),
            (Token::Type { id, name }, source) => {
                if !metadata::is_injectable_id(*id) {
                    return Err(NidusError::NotInjectable {
                        type_name: (*name).to_string(),
                    });
                }
                match source {
                    Some(Source::Auto(recipe)) => {
                        let instance = self.build_from_recipe(*id, recipe)?;
                        tracing::debug!(token = %token, "auto-registered class");
                        self.store(token.clone(), instance, provider.is_global())
                    }
                    Some(_) => self.register_provider(provider).await,
                    None => Err(NidusError::MissingFactory {
                        token: (*name).to_string(),
                    }),
                }
            }
        }
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.global.contains(token) || self.local.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }

    /// Probe the manifest, fold the recorded inject overrides onto it, and
    /// assemble from the resolved argument list.
    fn build_from_recipe(&self, id: TypeId, recipe: &AutoRecipe) -> Result<Instance> {
        let mut parameters = (recipe.dependencies)();
        if parameters.is_empty() {
            return (recipe.assemble)(&mut ResolvedArguments::empty());
        }

        // Overrides always beat the declared token at their index; records
        // beyond the declared list are ignored.
        for record in metadata::overrides_for(id) {
            if record.parameter_index < parameters.len() {
                parameters[record.parameter_index] = record.token;
            }
        }

        let mut arguments = Vec::with_capacity(parameters.len());
        for dependency in &parameters {
            arguments.push(self.resolve_token(dependency)?);
        }
        (recipe.assemble)(&mut ResolvedArguments::new(arguments))
    }

    fn store(&mut self, token: Token, instance: Instance, global: bool) -> Result<Instance> {
        if global {
            self.global.insert(token, instance.clone());
        } else {
            self.local.insert(token, instance.clone());
        }
        Ok(instance)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

fn downcast<T: Send + Sync + 'static>(instance: Instance) -> Result<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| NidusError::DowncastFailed {
            type_name: type_name::<T>().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Injectable;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestService {
        value: i32,
    }

    impl Injectable for TestService {
        fn assemble(_args: &mut ResolvedArguments) -> Result<Self> {
            Ok(Self { value: 42 })
        }
    }

    #[tokio::test]
    async fn auto_register_builds_marked_types() {
        metadata::mark_injectable::<TestService>();
        let mut container = Container::new();
        container
            .auto_register(&Provider::class::<TestService>())
            .await
            .unwrap();

        let service = container.resolve::<TestService>().unwrap();
        assert_eq!(service.value, 42);
    }

    struct Unmarked;

    impl Injectable for Unmarked {
        fn assemble(_args: &mut ResolvedArguments) -> Result<Self> {
            Ok(Self)
        }
    }

    #[tokio::test]
    async fn auto_register_rejects_unmarked_types() {
        let mut container = Container::new();
        let err = container
            .auto_register(&Provider::class::<Unmarked>())
            .await
            .unwrap_err();
        assert!(matches!(err, NidusError::NotInjectable { .. }));
    }

    #[tokio::test]
    async fn factories_run_at_most_once_per_container() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let provider = Provider::named("SEQ").with_factory(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                7usize
            }
        });

        let mut container = Container::new();
        let first = container.auto_register(&provider).await.unwrap();
        let second = container.auto_register(&provider).await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn global_factories_run_at_most_once_process_wide() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let provider = Provider::named("SHARED")
            .with_factory(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    String::from("one")
                }
            })
            .global();

        let scope = GlobalScope::new();
        let mut left = Container::with_global(scope.clone());
        let mut right = Container::with_global(scope);
        left.register_provider(&provider).await.unwrap();
        right.register_provider(&provider).await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        let from_left = left.resolve_named::<String>("SHARED").unwrap();
        let from_right = right.resolve_named::<String>("SHARED").unwrap();
        assert!(Arc::ptr_eq(&from_left, &from_right));
    }

    #[tokio::test]
    async fn string_tokens_require_a_source() {
        let mut container = Container::new();
        let err = container
            .auto_register(&Provider::named("CFG"))
            .await
            .unwrap_err();
        assert!(matches!(err, NidusError::MissingFactory { token } if token == "CFG"));
    }

    struct Ledger;

    struct Account {
        #[allow(dead_code)]
        ledger: Arc<Ledger>,
    }

    impl Injectable for Account {
        fn dependencies() -> Vec<Token> {
            vec![Token::of::<Ledger>()]
        }

        fn assemble(args: &mut ResolvedArguments) -> Result<Self> {
            Ok(Self {
                ledger: args.take()?,
            })
        }
    }

    #[tokio::test]
    async fn missing_dependency_names_the_dependency() {
        metadata::mark_injectable::<Account>();
        let mut container = Container::new();
        let err = container
            .auto_register(&Provider::class::<Account>())
            .await
            .unwrap_err();

        match err {
            NidusError::InstanceNotFound { token } => {
                assert!(token.contains("Ledger"));
                assert!(!token.contains("Account"));
            }
            other => panic!("expected InstanceNotFound, got {other}"),
        }
    }

    struct DefaultSink;

    struct Reporter {
        sink: Arc<String>,
    }

    impl Injectable for Reporter {
        fn dependencies() -> Vec<Token> {
            vec![Token::of::<DefaultSink>()]
        }

        fn assemble(args: &mut ResolvedArguments) -> Result<Self> {
            Ok(Self { sink: args.take()? })
        }
    }

    #[tokio::test]
    async fn inject_overrides_beat_the_declared_token() {
        metadata::mark_injectable::<Reporter>();
        metadata::record_inject_override::<Reporter>(0, "SINK");

        // DefaultSink is never registered; resolution succeeding proves the
        // override replaced the declared parameter token.
        let mut container = Container::new();
        container
            .auto_register(&Provider::named("SINK").with_value(String::from("stderr")))
            .await
            .unwrap();
        container
            .auto_register(&Provider::class::<Reporter>())
            .await
            .unwrap();

        let reporter = container.resolve::<Reporter>().unwrap();
        assert_eq!(*reporter.sink, "stderr");
    }

    struct Relay {
        target: Arc<String>,
    }

    impl Injectable for Relay {
        fn dependencies() -> Vec<Token> {
            vec![Token::named("PRIMARY")]
        }

        fn assemble(args: &mut ResolvedArguments) -> Result<Self> {
            Ok(Self {
                target: args.take()?,
            })
        }
    }

    #[tokio::test]
    async fn later_override_for_the_same_index_wins() {
        metadata::mark_injectable::<Relay>();
        metadata::record_inject_override::<Relay>(0, "FALLBACK");
        metadata::record_inject_override::<Relay>(0, "OVERRIDE");

        let mut container = Container::new();
        container
            .auto_register(&Provider::named("FALLBACK").with_value(String::from("fallback")))
            .await
            .unwrap();
        container
            .auto_register(&Provider::named("OVERRIDE").with_value(String::from("override")))
            .await
            .unwrap();
        container
            .auto_register(&Provider::class::<Relay>())
            .await
            .unwrap();

        let relay = container.resolve::<Relay>().unwrap();
        assert_eq!(*relay.target, "override");
    }

    #[tokio::test]
    async fn merge_keeps_the_first_writer() {
        let mut first = Container::new();
        first
            .register_provider(&Provider::named("SHARED").with_value(String::from("first")))
            .await
            .unwrap();

        let mut second = Container::new();
        second
            .register_provider(&Provider::named("SHARED").with_value(String::from("second")))
            .await
            .unwrap();

        first.merge_from(&second);
        assert_eq!(*first.resolve_named::<String>("SHARED").unwrap(), "first");
    }

    #[tokio::test]
    async fn resolve_reads_the_global_tier_first() {
        let scope = GlobalScope::new();
        let mut writer = Container::with_global(scope.clone());
        writer
            .register_provider(
                &Provider::named("KEY")
                    .with_value(String::from("global"))
                    .global(),
            )
            .await
            .unwrap();

        let mut shadowed = Container::with_global(scope);
        shadowed
            .register_provider(&Provider::named("KEY").with_value(String::from("local")))
            .await
            .unwrap();

        assert_eq!(*shadowed.resolve_named::<String>("KEY").unwrap(), "global");
    }

    #[test]
    fn resolution_never_constructs() {
        let container = Container::new();
        let err = container.resolve::<TestService>().unwrap_err();
        assert!(matches!(err, NidusError::InstanceNotFound { .. }));
    }
}
