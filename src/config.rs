use dashmap::DashMap;
use std::env;
use std::sync::Arc;

/// Environment-backed configuration service.
///
/// Loads the process environment at construction; values can be overridden
/// with [`set`](ConfigService::set). Typically exposed to the module tree
/// through a [`crate::DynamicModule`] under a stable string token.
#[derive(Clone, Default)]
pub struct ConfigService {
    values: Arc<DashMap<String, String>>,
}

impl ConfigService {
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|value| value.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}
