use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Global config repository - stores config instances by type
static CONFIG_REPOSITORY: OnceLock<RwLock<ConfigRepository>> = OnceLock::new();

/// Repository for storing typed configuration structs
///
/// Unlike the [`Container`](crate::Container), a later registration replaces
/// the earlier one, so configuration can be reloaded in tests.
#[derive(Default)]
pub struct ConfigRepository {
    configs: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ConfigRepository {
    /// Create a new empty config repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a config struct in the repository
    pub fn register<T: Any + Send + Sync>(&mut self, config: T) {
        self.configs.insert(TypeId::of::<T>(), Box::new(config));
    }

    /// Get a config struct by type
    pub fn get<T: Any + Send + Sync + Clone>(&self) -> Option<T> {
        self.configs
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .cloned()
    }

    /// Check if a config type is registered
    pub fn has<T: Any>(&self) -> bool {
        self.configs.contains_key(&TypeId::of::<T>())
    }
}

fn repository() -> &'static RwLock<ConfigRepository> {
    CONFIG_REPOSITORY.get_or_init(|| RwLock::new(ConfigRepository::new()))
}

/// Register a config in the global repository
pub fn register<T: Any + Send + Sync>(config: T) {
    repository()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(config);
}

/// Get a config from the global repository
pub fn get<T: Any + Send + Sync + Clone>() -> Option<T> {
    repository()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get::<T>()
}

/// Check if a config type is registered in the global repository
pub fn has<T: Any>() -> bool {
    repository()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .has::<T>()
}
