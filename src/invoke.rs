use std::any::type_name;
use tracing::{debug, error, info_span};

use crate::{dependency_resolver::DependencyResolver, errors::InvokeErrorKind, Container};

/// Function whose parameters are resolved from the container.
///
/// Implemented for every `FnOnce` of up to 16 parameters, where each parameter type implements
/// [`DependencyResolver`]. Arguments are resolved in declaration order without a scope key.
pub trait Invocable<Args> {
    type Output;

    /// # Errors
    /// Returns [`InvokeErrorKind::Argument`] for the first argument that can't be resolved.
    /// The function isn't called in that case.
    fn invoke(self, container: &Container) -> Result<Self::Output, InvokeErrorKind>;
}

macro_rules! impl_invocable {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
        impl<F, Output, $($ty,)*> Invocable<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Output,
            $( $ty: DependencyResolver, )*
        {
            type Output = Output;

            fn invoke(self, container: &Container) -> Result<Self::Output, InvokeErrorKind> {
                let resolver = container.resolver();
                let mut index = 0;
                $(
                    let $ty = match $ty::resolve(&resolver) {
                        Ok(argument) => argument,
                        Err(source) => {
                            let err = InvokeErrorKind::Argument {
                                index,
                                type_info: $ty::type_info(),
                                source,
                            };
                            error!("{}", err);
                            return Err(err);
                        }
                    };
                    index += 1;
                )*

                debug!("Arguments resolved");
                Ok(self($($ty,)*))
            }
        }
    };
}

all_the_tuples!(impl_invocable);

impl Container {
    /// Resolves the arguments of `function` and calls it.
    ///
    /// # Errors
    /// Returns [`InvokeErrorKind::Argument`] if an argument can't be resolved.
    pub fn invoke<Args, F: Invocable<Args>>(&self, function: F) -> Result<F::Output, InvokeErrorKind> {
        let span = info_span!("invoke", function = type_name::<F>());
        let _guard = span.enter();

        function.invoke(self)
    }

    /// Like [`Self::invoke`] for fallible functions.
    ///
    /// # Errors
    /// Returns [`InvokeErrorKind::Argument`] if an argument can't be resolved
    /// and [`InvokeErrorKind::Returned`] with the function's own error, unchanged.
    pub fn try_invoke<Args, F, T, E>(&self, function: F) -> Result<T, InvokeErrorKind<E>>
    where
        F: Invocable<Args, Output = Result<T, E>>,
    {
        let span = info_span!("try_invoke", function = type_name::<F>());
        let _guard = span.enter();

        match function.invoke(self) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                debug!("Function returned an error");
                Err(InvokeErrorKind::Returned(err))
            }
            Err(err) => Err(err.with_call_error()),
        }
    }
}
