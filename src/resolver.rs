use std::{any::type_name, sync::Arc};
use tracing::{debug, error, info_span};

use crate::{
    any::{downcast, Instance, ServiceKey, TypeInfo},
    errors::ResolveErrorKind,
    registry::{Lifetime, Registration},
    Container,
};

/// Resolution view over a container, optionally bound to a scope key.
///
/// This is what [`crate::Autowire`] implementations and [`crate::DependencyResolver`]s receive.
/// A missing or empty scope key resolves singletons and transients only.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    container: &'a Container,
    scope_key: Option<&'a str>,
}

impl<'a> Resolver<'a> {
    #[inline]
    #[must_use]
    pub(crate) const fn new(container: &'a Container, scope_key: Option<&'a str>) -> Self {
        Self { container, scope_key }
    }

    #[inline]
    #[must_use]
    pub const fn container(&self) -> &'a Container {
        self.container
    }

    #[inline]
    #[must_use]
    pub const fn scope_key(&self) -> Option<&'a str> {
        self.scope_key
    }

    /// Resolves the service registered under the type of `T`, in pointer form.
    ///
    /// # Errors
    /// See [`ResolveErrorKind`].
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        let span = info_span!("resolve", service = type_name::<T>(), scope = self.scope_key);
        let _guard = span.enter();

        self.resolve_key(&ServiceKey::of::<T>())
    }

    /// Resolves the service registered under the type of `T` and returns a copy of its value.
    ///
    /// # Errors
    /// See [`ResolveErrorKind`].
    pub fn resolve_cloned<T: Clone + Send + Sync + 'static>(&self) -> Result<T, ResolveErrorKind> {
        self.resolve::<T>().map(|service| T::clone(&service))
    }

    /// Resolves the service bound to `token`, in pointer form.
    ///
    /// # Errors
    /// See [`ResolveErrorKind`]. A service of another type than `T` yields [`ResolveErrorKind::TypeMismatch`].
    pub fn resolve_by_token<T: ?Sized + Send + Sync + 'static>(&self, token: &str) -> Result<Arc<T>, ResolveErrorKind> {
        let span = info_span!("resolve_by_token", token, service = type_name::<T>(), scope = self.scope_key);
        let _guard = span.enter();

        self.resolve_key(&ServiceKey::token(token))
    }

    /// Resolves the service bound to `token` and returns a copy of its value.
    ///
    /// # Errors
    /// See [`Self::resolve_by_token`].
    pub fn resolve_by_token_cloned<T: Clone + Send + Sync + 'static>(&self, token: &str) -> Result<T, ResolveErrorKind> {
        self.resolve_by_token::<T>(token).map(|service| T::clone(&service))
    }

    fn resolve_key<T: ?Sized + Send + Sync + 'static>(&self, key: &ServiceKey) -> Result<Arc<T>, ResolveErrorKind> {
        let Some(registration) = self.container.registration(key) else {
            let err = ResolveErrorKind::NotRegistered { key: key.clone() };
            error!("{}", err);
            return Err(err);
        };

        let instance = match self.container.get_instance(key, &registration, self.scope_key) {
            Ok(instance) => instance,
            Err(err) => {
                error!("{}", err);
                return Err(err);
            }
        };

        match downcast::<T>(&instance) {
            Some(service) => Ok(service),
            None => {
                let err = ResolveErrorKind::TypeMismatch {
                    key: key.clone(),
                    expected: TypeInfo::of::<T>(),
                    actual: registration.provides,
                };
                error!("{}", err);
                Err(err)
            }
        }
    }
}

impl Container {
    /// Produces an instance for `registration` honoring its lifetime.
    pub(crate) fn get_instance(
        &self,
        key: &ServiceKey,
        registration: &Registration,
        scope_key: Option<&str>,
    ) -> Result<Instance, ResolveErrorKind> {
        match registration.lifetime {
            Lifetime::Singleton => {
                if let Some(instance) = registration.instance.get() {
                    debug!("Found in cache");
                    return Ok(instance.clone());
                }
                let Some(factory) = &registration.factory else {
                    return Err(ResolveErrorKind::NoProducer { key: key.clone() });
                };
                Ok(registration
                    .instance
                    .get_or_init(|| {
                        debug!("Not found in cache");
                        factory()
                    })
                    .clone())
            }
            Lifetime::Transient => match &registration.factory {
                Some(factory) => Ok(factory()),
                None => Err(ResolveErrorKind::NoFactory {
                    key: key.clone(),
                    lifetime: Lifetime::Transient,
                }),
            },
            Lifetime::Scoped => {
                let Some(scope_key) = scope_key.filter(|scope_key| !scope_key.is_empty()) else {
                    return Err(ResolveErrorKind::MissingScopeKey { key: key.clone() });
                };
                let Some(factory) = &registration.factory else {
                    // Without a factory every scope shares the pre-set instance
                    return registration.instance.get().cloned().ok_or_else(|| ResolveErrorKind::NoFactory {
                        key: key.clone(),
                        lifetime: Lifetime::Scoped,
                    });
                };

                let slot = self.scope_slot(scope_key, key);
                if let Some(instance) = slot.get() {
                    debug!("Found in scope cache");
                    return Ok(instance.clone());
                }
                Ok(slot
                    .get_or_init(|| {
                        debug!("Not found in scope cache");
                        factory()
                    })
                    .clone())
            }
        }
    }
}
