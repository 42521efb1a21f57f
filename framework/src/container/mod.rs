//! Application Container for Dependency Injection
//!
//! This module provides the service container that backs handler injection:
//! - Singletons: one shared instance returned on every resolution
//! - Transients: a factory called on every resolution, producing a fresh instance
//! - Disposables: transients whose instances are cleaned up after use
//! - Invocation: call any function, supplying leading arguments explicitly and
//!   resolving the remaining parameters from the container
//!
//! Singleton and transient registrations share one namespace keyed by
//! [`TypeId`]. A type can only be registered once.
//!
//! # Example
//!
//! ```rust
//! use satchel::Container;
//! use std::sync::Arc;
//!
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! let container = Container::new();
//! container
//!     .add_singleton(Arc::new(Greeter { greeting: "hello".to_string() }))
//!     .unwrap();
//!
//! let greet = |name: &str, greeter: Arc<Greeter>| format!("{} {}", greeter.greeting, name);
//! let message = container.invoke(&greet, ("world",)).unwrap();
//! assert_eq!(message, "hello world");
//! ```

mod function;
mod invoke;
mod release;

pub use function::{value, Function, IntoFunction, Value};
pub use invoke::Invokable;
pub use release::{BoxError, Dispose, Release};

pub(crate) use invoke::Frame;

use crate::error::ContainerError;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Produces a fresh instance together with its release callback
type Producer = Arc<dyn Fn() -> Result<(Value, Release), ContainerError> + Send + Sync>;

/// Binding types: either a singleton instance or a transient factory
#[derive(Clone)]
enum Binding {
    /// Shared singleton instance - same instance returned every time
    Singleton(Value),

    /// Factory closure - creates new instance each time
    Transient(Producer),
}

/// The service container
///
/// Stores type-erased bindings keyed by `TypeId`. Registrations take `&self`
/// so a container shared as `Arc<Container>` can still be extended after the
/// server starts; the registry is guarded by a read-mostly lock.
pub struct Container {
    bindings: RwLock<HashMap<TypeId, (&'static str, Binding)>>,
}

impl Container {
    /// Create a new empty container
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
        }
    }

    /// Register a singleton instance (shared across all resolutions)
    ///
    /// Resolution clones the stored value, so register an `Arc<T>` when every
    /// consumer must observe the very same instance.
    ///
    /// # Example
    /// ```rust
    /// # use satchel::Container;
    /// # use std::sync::Arc;
    /// let container = Container::new();
    /// container.add_singleton(Arc::new(String::from("db://local"))).unwrap();
    /// ```
    pub fn add_singleton<T: Any + Send + Sync>(&self, instance: T) -> Result<(), ContainerError> {
        self.register(
            TypeId::of::<T>(),
            type_name::<T>(),
            Binding::Singleton(Arc::new(instance)),
        )
    }

    /// Register a factory closure (new instance per resolution)
    ///
    /// The produced type is the factory's return type.
    ///
    /// # Example
    /// ```rust
    /// # use satchel::Container;
    /// let container = Container::new();
    /// container.add_transient(|| Vec::<u8>::with_capacity(16)).unwrap();
    /// ```
    pub fn add_transient<T, F>(&self, factory: F) -> Result<(), ContainerError>
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let producer: Producer = Arc::new(move || -> Result<(Value, Release), ContainerError> {
            Ok((Arc::new(factory()) as Value, Release::noop()))
        });
        self.register(TypeId::of::<T>(), type_name::<T>(), Binding::Transient(producer))
    }

    /// Register a factory whose instances are disposed after each use
    ///
    /// The release callback returned alongside every produced instance calls
    /// [`Dispose::dispose`] exactly once. Disposal errors are discarded.
    pub fn add_disposable<T, F>(&self, factory: F) -> Result<(), ContainerError>
    where
        T: Dispose + Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let producer: Producer = Arc::new(move || -> Result<(Value, Release), ContainerError> {
            let value: Value = Arc::new(factory());
            let release = disposing::<T>(value.clone());
            Ok((value, release))
        });
        self.register(TypeId::of::<T>(), type_name::<T>(), Binding::Transient(producer))
    }

    /// Resolve an instance of `T` together with its release callback
    ///
    /// Singletons come back with a no-op release. Transients are produced fresh
    /// on every call; drop or [`release`](Release::release) the callback once the
    /// instance is no longer needed.
    ///
    /// # Example
    /// ```rust
    /// # use satchel::Container;
    /// let container = Container::new();
    /// container.add_singleton(7u16).unwrap();
    ///
    /// let (port, release) = container.get_instance::<u16>().unwrap();
    /// assert_eq!(port, 7);
    /// release.release();
    /// ```
    pub fn get_instance<T: Any + Send + Sync + Clone>(&self) -> Result<(T, Release), ContainerError> {
        let (value, release) = self.resolve(TypeId::of::<T>(), type_name::<T>())?;
        let instance = value
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(ContainerError::not_registered::<T>)?;
        Ok((instance, release))
    }

    /// Call `function`, passing `leading` first and injecting the remaining parameters
    ///
    /// `leading` is a tuple holding the explicitly supplied arguments. Every
    /// parameter after them is resolved from the container in declaration
    /// order. The release callbacks of all resolved instances run after the
    /// function returns. If a parameter cannot be resolved, nothing is called
    /// and the instances resolved so far are released before the error is
    /// returned.
    ///
    /// # Example
    /// ```rust
    /// # use satchel::Container;
    /// let container = Container::new();
    /// let add = |a: i32, b: i32| a + b;
    /// assert_eq!(container.invoke(&add, (1, 2)).unwrap(), 3);
    /// ```
    pub fn invoke<F, L, I>(&self, function: &F, leading: L) -> Result<F::Output, ContainerError>
    where
        F: Invokable<L, I>,
    {
        function.invoke(self, leading)
    }

    /// Check if a type has a provider
    pub fn has<T: Any>(&self) -> bool {
        self.read().contains_key(&TypeId::of::<T>())
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if no provider is registered
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Resolve a type-erased instance by `TypeId`
    pub(crate) fn resolve(
        &self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<(Value, Release), ContainerError> {
        let binding = self.read().get(&type_id).map(|(_, binding)| binding.clone());

        match binding {
            Some(Binding::Singleton(instance)) => Ok((instance, Release::noop())),
            // The lock is already released here, so factories may resolve too.
            Some(Binding::Transient(produce)) => produce(),
            None => {
                tracing::debug!(service = type_name, "resolution of unregistered type");
                Err(ContainerError::TypeNotRegistered { type_name })
            }
        }
    }

    /// Insert a binding unless the type already has one
    fn register(
        &self,
        type_id: TypeId,
        type_name: &'static str,
        binding: Binding,
    ) -> Result<(), ContainerError> {
        let mut bindings = self.bindings.write().unwrap_or_else(PoisonError::into_inner);
        if bindings.contains_key(&type_id) {
            return Err(ContainerError::TypeAlreadyRegistered { type_name });
        }

        let kind = match binding {
            Binding::Singleton(_) => "singleton",
            Binding::Transient(_) => "transient",
        };
        bindings.insert(type_id, (type_name, binding));
        tracing::debug!(service = type_name, kind, "registered provider");
        Ok(())
    }

    fn read(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<TypeId, (&'static str, Binding)>> {
        self.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&'static str> = self.read().values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("Container").field("services", &names).finish()
    }
}

/// A release that disposes `held` as a `T`
///
/// Disposal errors are logged at debug level and dropped.
pub(crate) fn disposing<T: Dispose + Any>(held: Value) -> Release {
    Release::new(move || {
        if let Some(instance) = held.downcast_ref::<T>() {
            if let Err(err) = instance.dispose() {
                tracing::debug!(
                    service = type_name::<T>(),
                    error = %err,
                    "disposal failed"
                );
            }
        }
    })
}
