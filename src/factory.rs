use std::sync::Arc;
use tracing::debug;

use crate::any::{erase, Instance};

/// Zero-argument producer of a service value.
///
/// Implemented for every `Fn() -> T` closure that can be shared between threads.
/// Factories never receive their dependencies: they capture what they need or
/// are wired afterwards with [`crate::Autowire`].
pub trait Factory<T>: Send + Sync + 'static {
    fn produce(&self) -> T;
}

impl<F, T> Factory<T> for F
where
    F: Fn() -> T + Send + Sync + 'static,
{
    #[inline]
    fn produce(&self) -> T {
        self()
    }
}

pub(crate) type BoxedFactory = Arc<dyn Fn() -> Instance + Send + Sync>;

#[must_use]
pub(crate) fn boxed_factory<T, F>(factory: F) -> BoxedFactory
where
    T: Send + Sync + 'static,
    F: Factory<T>,
{
    Arc::new(move || {
        let value = factory.produce();
        debug!("Produced");
        erase(Arc::new(value))
    })
}

#[must_use]
pub(crate) fn boxed_arc_factory<T, F>(factory: F) -> BoxedFactory
where
    T: ?Sized + Send + Sync + 'static,
    F: Factory<Arc<T>>,
{
    Arc::new(move || {
        let value = factory.produce();
        debug!("Produced");
        erase(value)
    })
}

/// Factory that allocates a fresh zero value of `T` on each call.
/// Field values of any existing instance are never copied.
#[must_use]
pub(crate) fn prototype_factory<T>() -> BoxedFactory
where
    T: Default + Send + Sync + 'static,
{
    boxed_factory(T::default)
}
