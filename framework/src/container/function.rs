//! Type-erased callables and values
//!
//! The typed API ([`Container::invoke`]) checks callability at compile time.
//! This module covers the cases where the target is only known at runtime:
//! functions are stored as [`Function`] values inside an opaque [`Value`], and
//! the container checks what it was handed before registering or calling it.
//!
//! # Example
//!
//! ```rust
//! use satchel::{value, Container, Function, Value};
//! use std::sync::Arc;
//!
//! let container = Container::new();
//! container.add_singleton(40i32).unwrap();
//!
//! let target: Value = Arc::new(Function::new(|offset: i32, base: i32| base + offset));
//! let results = container.invoke_value(&target, vec![value(2i32)]).unwrap();
//! assert_eq!(results[0].downcast_ref::<i32>(), Some(&42));
//! ```

use super::{disposing, Container, Dispose, Frame, Release};
use crate::error::ContainerError;
use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

/// An opaque, shareable value of any type
pub type Value = Arc<dyn Any + Send + Sync>;

/// Wrap any value as an opaque [`Value`]
pub fn value<T: Any + Send + Sync>(inner: T) -> Value {
    Arc::new(inner)
}

type Call = Box<dyn Fn(Vec<Value>) -> Result<Vec<Value>, ContainerError> + Send + Sync>;
type DisposeHook = fn(Value) -> Release;

#[derive(Debug, Clone, Copy)]
struct Param {
    type_id: TypeId,
    type_name: &'static str,
}

impl Param {
    fn of<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }
}

/// A type-erased function with a known signature
///
/// Parameters are passed and results returned as [`Value`]s. A function
/// returning `()` yields no results; any other return type yields exactly one
/// (tuples count as one value).
pub struct Function {
    name: &'static str,
    params: Vec<Param>,
    returns: Option<Param>,
    call: Call,
    dispose: Option<DisposeHook>,
}

impl Function {
    /// Erase a function's type
    pub fn new<F, Args>(function: F) -> Self
    where
        F: IntoFunction<Args>,
    {
        function.into_function()
    }

    /// Erase a factory whose product must be disposed after use
    ///
    /// When registered with [`Container::add_transient_value`], every
    /// produced instance is disposed once the invocation that resolved it
    /// finishes, the same as with [`Container::add_disposable`].
    pub fn disposable<F, R>(factory: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Dispose + Any + Send + Sync,
    {
        let mut function = <F as IntoFunction<()>>::into_function(factory);
        function.dispose = Some(disposing::<R>);
        function
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Type name of the erased function
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name of the declared return value, if any
    pub fn return_type(&self) -> Option<&'static str> {
        self.returns.map(|param| param.type_name)
    }

    /// Call the function with exactly one value per parameter
    pub fn call(&self, args: Vec<Value>) -> Result<Vec<Value>, ContainerError> {
        if args.len() > self.params.len() {
            return Err(ContainerError::ArgumentMismatch {
                index: self.params.len(),
                expected: "end of arguments",
            });
        }
        if let Some(missing) = self.params.get(args.len()) {
            return Err(ContainerError::ArgumentMismatch {
                index: args.len(),
                expected: missing.type_name,
            });
        }
        (self.call)(args)
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params.iter().map(|p| p.type_name).collect::<Vec<_>>())
            .field("returns", &self.return_type())
            .finish()
    }
}

/// Conversion of a Rust function into a [`Function`]
///
/// Implemented for `Fn` closures and function items of up to six parameters
/// whose parameter types are `Clone`.
pub trait IntoFunction<Args> {
    /// Erase the function's type
    fn into_function(self) -> Function;
}

fn argument<T: Any + Clone>(args: &[Value], index: usize) -> Result<T, ContainerError> {
    args.get(index)
        .and_then(|arg| arg.downcast_ref::<T>())
        .cloned()
        .ok_or(ContainerError::ArgumentMismatch {
            index,
            expected: type_name::<T>(),
        })
}

fn returns<R: Any>() -> Option<Param> {
    (TypeId::of::<R>() != TypeId::of::<()>()).then(Param::of::<R>)
}

macro_rules! impl_into_function {
    ($($P:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
        impl<Func, Ret, $($P,)*> IntoFunction<($($P,)*)> for Func
        where
            Func: Fn($($P,)*) -> Ret + Send + Sync + 'static,
            Ret: Any + Send + Sync,
            $($P: Any + Send + Sync + Clone,)*
        {
            fn into_function(self) -> Function {
                let returns = returns::<Ret>();
                let call = move |args: Vec<Value>| -> Result<Vec<Value>, ContainerError> {
                    let mut index = 0;
                    $(
                        let $P = argument::<$P>(&args, index)?;
                        index += 1;
                    )*
                    let output = self($($P,)*);
                    Ok(match returns {
                        Some(_) => vec![Arc::new(output) as Value],
                        None => Vec::new(),
                    })
                };

                Function {
                    name: type_name::<Func>(),
                    params: vec![$(Param::of::<$P>(),)*],
                    returns,
                    call: Box::new(call),
                    dispose: None,
                }
            }
        }
    };
}

impl_into_function!();
impl_into_function!(P1);
impl_into_function!(P1, P2);
impl_into_function!(P1, P2, P3);
impl_into_function!(P1, P2, P3, P4);
impl_into_function!(P1, P2, P3, P4, P5);
impl_into_function!(P1, P2, P3, P4, P5, P6);

impl Container {
    /// Register a type-erased transient factory
    ///
    /// The value must hold a [`Function`] that takes no parameters and returns
    /// a value; the return type is the produced type. Anything else fails with
    /// [`ContainerError::InvalidFactory`]. Instances from a
    /// [`Function::disposable`] factory are disposed on release.
    pub fn add_transient_value(&self, factory: Value) -> Result<(), ContainerError> {
        let function = factory
            .downcast::<Function>()
            .map_err(|_| ContainerError::InvalidFactory {
                reason: "value is not callable",
            })?;
        if function.arity() != 0 {
            return Err(ContainerError::InvalidFactory {
                reason: "factory must not take parameters",
            });
        }
        let produced = function.returns.ok_or(ContainerError::InvalidFactory {
            reason: "factory must return a value",
        })?;

        let producer: super::Producer =
            Arc::new(move || -> Result<(Value, Release), ContainerError> {
                let instance = function.call(Vec::new())?.pop().ok_or(
                    ContainerError::InvalidFactory {
                        reason: "factory must return a value",
                    },
                )?;
                let release = match function.dispose {
                    Some(dispose) => dispose(instance.clone()),
                    None => Release::noop(),
                };
                Ok((instance, release))
            });
        self.register(
            produced.type_id,
            produced.type_name,
            super::Binding::Transient(producer),
        )
    }

    /// Call a type-erased function
    ///
    /// Fails with [`ContainerError::NotInvokable`] if `target` does not hold a
    /// [`Function`]. `leading` fills the first parameters in order; every
    /// remaining parameter is resolved from the container.
    pub fn invoke_value(
        &self,
        target: &Value,
        leading: Vec<Value>,
    ) -> Result<Vec<Value>, ContainerError> {
        let function = target
            .downcast_ref::<Function>()
            .ok_or(ContainerError::NotInvokable)?;
        if leading.len() > function.arity() {
            return Err(ContainerError::ArgumentMismatch {
                index: function.arity(),
                expected: "end of arguments",
            });
        }

        let mut frame = Frame::new();
        let mut args = leading;
        for param in &function.params[args.len()..] {
            args.push(frame.resolve_value(self, param.type_id, param.type_name)?);
        }
        let results = function.call(args);
        drop(frame);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::BoxError;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct SimpleObject {
        name: String,
        value: i32,
    }

    fn function<F: IntoFunction<Args>, Args>(f: F) -> Value {
        Arc::new(Function::new(f))
    }

    #[test]
    fn test_function_signature() {
        let f = Function::new(|a: i32, b: String| format!("{}{}", a, b));
        assert_eq!(f.arity(), 2);
        assert_eq!(f.return_type(), Some("alloc::string::String"));

        let unit = Function::new(|| {});
        assert_eq!(unit.arity(), 0);
        assert_eq!(unit.return_type(), None);
    }

    #[test]
    fn test_invoke_value_passes_leading_arguments() {
        let container = Container::new();
        let add = function(|a: i32, b: i32| a + b);
        let results = container
            .invoke_value(&add, vec![value(1i32), value(2i32)])
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].downcast_ref::<i32>(), Some(&3));
    }

    #[test]
    fn test_invoke_value_injects_instances() {
        let container = Container::new();
        container
            .add_singleton(SimpleObject {
                name: "test".to_string(),
                value: 42,
            })
            .unwrap();

        let project = function(|a: i32, o: SimpleObject| a + o.value);
        let results = container.invoke_value(&project, vec![value(1i32)]).unwrap();
        assert_eq!(results[0].downcast_ref::<i32>(), Some(&43));
    }

    #[test]
    fn test_invoke_value_unit_function_has_no_results() {
        let container = Container::new();
        let noop = function(|| {});
        assert!(container.invoke_value(&noop, Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_invoke_value_rejects_non_callable() {
        let container = Container::new();
        let err = container
            .invoke_value(&value("test".to_string()), Vec::new())
            .unwrap_err();
        assert_eq!(err, ContainerError::NotInvokable);
    }

    #[test]
    fn test_invoke_value_rejects_wrong_leading_type() {
        let container = Container::new();
        let add = function(|a: i32, b: i32| a + b);
        let err = container
            .invoke_value(&add, vec![value(1i32), value("two")])
            .unwrap_err();
        assert_eq!(
            err,
            ContainerError::ArgumentMismatch {
                index: 1,
                expected: "i32"
            }
        );
    }

    #[test]
    fn test_invoke_value_rejects_extra_arguments() {
        let container = Container::new();
        let identity = function(|a: i32| a);
        let err = container
            .invoke_value(&identity, vec![value(1i32), value(2i32)])
            .unwrap_err();
        assert!(matches!(err, ContainerError::ArgumentMismatch { index: 1, .. }));
    }

    #[test]
    fn test_invoke_value_unregistered_parameter() {
        let container = Container::new();
        let project = function(|o: SimpleObject| o.value);
        let err = container.invoke_value(&project, Vec::new()).unwrap_err();
        assert_eq!(err, ContainerError::not_registered::<SimpleObject>());
    }

    #[test]
    fn test_add_transient_value() {
        let container = Container::new();
        container
            .add_transient_value(function(|| SimpleObject {
                name: "test".to_string(),
                value: 42,
            }))
            .unwrap();

        let (instance, _) = container.get_instance::<SimpleObject>().unwrap();
        assert_eq!(instance.value, 42);
    }

    #[test]
    fn test_add_transient_value_rejects_non_callable() {
        let container = Container::new();
        let err = container.add_transient_value(value("test")).unwrap_err();
        assert!(matches!(err, ContainerError::InvalidFactory { .. }));
        assert!(container.is_empty());
    }

    #[test]
    fn test_add_transient_value_rejects_parameters_and_unit() {
        let container = Container::new();
        let err = container
            .add_transient_value(function(|a: i32| a))
            .unwrap_err();
        assert!(matches!(err, ContainerError::InvalidFactory { .. }));

        let err = container.add_transient_value(function(|| {})).unwrap_err();
        assert!(matches!(err, ContainerError::InvalidFactory { .. }));
    }

    #[test]
    fn test_add_transient_value_shares_namespace() {
        let container = Container::new();
        container.add_singleton("test".to_string()).unwrap();
        let err = container
            .add_transient_value(function(|| "other".to_string()))
            .unwrap_err();
        assert!(matches!(err, ContainerError::TypeAlreadyRegistered { .. }));
    }

    #[derive(Clone)]
    struct Conn {
        closed: Arc<AtomicUsize>,
    }

    impl Dispose for Conn {
        fn dispose(&self) -> Result<(), BoxError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_disposable_value_released_after_invoke_value() {
        let closed = Arc::new(AtomicUsize::new(0));
        let tracker = closed.clone();
        let container = Container::new();
        container
            .add_transient_value(value(Function::disposable(move || Conn {
                closed: tracker.clone(),
            })))
            .unwrap();

        let observed = function(|conn: Conn| conn.closed.load(Ordering::SeqCst));
        let results = container.invoke_value(&observed, Vec::new()).unwrap();
        assert_eq!(results[0].downcast_ref::<usize>(), Some(&0));
        assert_eq!(closed.load(Ordering::SeqCst), 1);

        container.invoke_value(&observed, Vec::new()).unwrap();
        assert_eq!(closed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_plain_value_factory_is_not_disposed() {
        let closed = Arc::new(AtomicUsize::new(0));
        let tracker = closed.clone();
        let container = Container::new();
        container
            .add_transient_value(function(move || Conn {
                closed: tracker.clone(),
            }))
            .unwrap();

        let (_, release) = container.get_instance::<Conn>().unwrap();
        assert!(release.is_noop());
        release.release();
        assert_eq!(closed.load(Ordering::SeqCst), 0);
    }
}
