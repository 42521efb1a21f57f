//! Function invocation with injected parameters
//!
//! [`Invokable`] is implemented for every `Fn` of up to six parameters, once
//! per split between explicitly supplied (leading) and injected parameters.
//! The split is chosen by the tuple passed as leading arguments:
//!
//! ```rust
//! use satchel::Container;
//!
//! let container = Container::new();
//! container.add_singleton(40i64).unwrap();
//!
//! let answer = |offset: i64, base: i64| base + offset;
//! // `offset` is supplied, `base` is injected
//! assert_eq!(container.invoke(&answer, (2i64,)).unwrap(), 42);
//! ```

use super::{Container, Release, Value};
use crate::error::ContainerError;
use std::any::{Any, TypeId};

/// A function the container can call with injected parameters
///
/// `Leading` is the tuple of explicitly supplied arguments, `Injected` the
/// tuple of parameter types the container resolves. Both are inferred from the
/// function's signature and the leading tuple.
pub trait Invokable<Leading, Injected> {
    /// The function's return value
    type Output;

    /// Assemble the invocation frame and call the function
    fn invoke(&self, container: &Container, leading: Leading) -> Result<Self::Output, ContainerError>;
}

/// Release callbacks collected while building an invocation frame
///
/// Dropping the frame releases every resolved instance in resolution order,
/// whether the call completed, panicked, or never happened because a later
/// parameter failed to resolve.
pub(crate) struct Frame {
    releases: Vec<Release>,
}

impl Frame {
    pub(crate) fn new() -> Self {
        Self {
            releases: Vec::new(),
        }
    }

    pub(crate) fn resolve<T: Any + Send + Sync + Clone>(
        &mut self,
        container: &Container,
    ) -> Result<T, ContainerError> {
        let (instance, release) = container.get_instance::<T>()?;
        self.releases.push(release);
        Ok(instance)
    }

    pub(crate) fn resolve_value(
        &mut self,
        container: &Container,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Value, ContainerError> {
        let (value, release) = container.resolve(type_id, type_name)?;
        self.releases.push(release);
        Ok(value)
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        for release in self.releases.drain(..) {
            release.release();
        }
    }
}

macro_rules! impl_invokable {
    ([$($L:ident),*], [$($I:ident),*]) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<Func, Ret, $($L,)* $($I,)*> Invokable<($($L,)*), ($($I,)*)> for Func
        where
            Func: Fn($($L,)* $($I,)*) -> Ret,
            $($I: Any + Send + Sync + Clone,)*
        {
            type Output = Ret;

            fn invoke(
                &self,
                container: &Container,
                leading: ($($L,)*),
            ) -> Result<Ret, ContainerError> {
                let ($($L,)*) = leading;
                let mut frame = Frame::new();
                $(let $I = frame.resolve::<$I>(container)?;)*
                let output = self($($L,)* $($I,)*);
                drop(frame);
                Ok(output)
            }
        }
    };
}

impl_invokable!([], []);

impl_invokable!([L1], []);
impl_invokable!([], [I1]);

impl_invokable!([L1, L2], []);
impl_invokable!([L1], [I1]);
impl_invokable!([], [I1, I2]);

impl_invokable!([L1, L2, L3], []);
impl_invokable!([L1, L2], [I1]);
impl_invokable!([L1], [I1, I2]);
impl_invokable!([], [I1, I2, I3]);

impl_invokable!([L1, L2, L3, L4], []);
impl_invokable!([L1, L2, L3], [I1]);
impl_invokable!([L1, L2], [I1, I2]);
impl_invokable!([L1], [I1, I2, I3]);
impl_invokable!([], [I1, I2, I3, I4]);

impl_invokable!([L1, L2, L3, L4, L5], []);
impl_invokable!([L1, L2, L3, L4], [I1]);
impl_invokable!([L1, L2, L3], [I1, I2]);
impl_invokable!([L1, L2], [I1, I2, I3]);
impl_invokable!([L1], [I1, I2, I3, I4]);
impl_invokable!([], [I1, I2, I3, I4, I5]);

impl_invokable!([L1, L2, L3, L4, L5, L6], []);
impl_invokable!([L1, L2, L3, L4, L5], [I1]);
impl_invokable!([L1, L2, L3, L4], [I1, I2]);
impl_invokable!([L1, L2, L3], [I1, I2, I3]);
impl_invokable!([L1, L2], [I1, I2, I3, I4]);
impl_invokable!([L1], [I1, I2, I3, I4, I5]);
impl_invokable!([], [I1, I2, I3, I4, I5, I6]);
