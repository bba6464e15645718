use parking_lot::RwLock;
use std::{any::type_name, iter, mem, sync::Arc};
use tracing::{debug, error, info_span};

use crate::{
    any::{ServiceKey, TypeInfo},
    errors::{AutowireAllError, ResolveErrorKind},
    registry::{Lifetime, Registration},
    resolver::Resolver,
    Container,
};

/// Field injection.
///
/// Usually derived with `#[derive(Autowire)]`, which fills every field annotated with
/// `#[inject(type)]` or `#[inject("token")]` and leaves the other fields untouched.
/// Fields are wired in declaration order and the first failure aborts the call,
/// so fields wired before it keep their new values.
pub trait Autowire {
    /// # Errors
    /// Returns the error of the first field that can't be resolved.
    fn autowire(&mut self, resolver: &Resolver<'_>) -> Result<(), ResolveErrorKind>;
}

impl<T: Autowire + ?Sized> Autowire for Box<T> {
    #[inline]
    fn autowire(&mut self, resolver: &Resolver<'_>) -> Result<(), ResolveErrorKind> {
        (**self).autowire(resolver)
    }
}

/// Shared component as it's stored in the container and in the pending list.
///
/// Components are resolved with `container.resolve::<Component<T>>()`.
pub type Component<T> = RwLock<T>;

pub(crate) trait Wire: Send + Sync {
    fn wire(&self, resolver: &Resolver<'_>) -> Result<(), ResolveErrorKind>;
}

impl<T: Autowire + Send + Sync> Wire for RwLock<T> {
    #[inline]
    fn wire(&self, resolver: &Resolver<'_>) -> Result<(), ResolveErrorKind> {
        self.write().autowire(resolver)
    }
}

/// Entry of the pending autowire list.
pub(crate) struct Pending {
    pub(crate) component: TypeInfo,
    target: Arc<dyn Wire>,
}

impl Pending {
    #[inline]
    #[must_use]
    fn new<T: Autowire + Send + Sync + 'static>(component: Arc<Component<T>>) -> Self {
        Self {
            component: TypeInfo::of::<T>(),
            target: component,
        }
    }

    #[inline]
    fn wire(&self, resolver: &Resolver<'_>) -> Result<(), ResolveErrorKind> {
        self.target.wire(resolver)
    }
}

impl Container {
    /// Appends `component` to the pending list without resolving anything.
    pub fn add_for_autowiring<T: Autowire + Send + Sync + 'static>(&self, component: Arc<Component<T>>) {
        let mut state = self.inner.state.write();
        state.pending.push(Pending::new(component));

        debug!(component = type_name::<T>(), pending = state.pending.len(), "Added for autowiring");
    }

    /// Wires every pending component in insertion order.
    ///
    /// # Errors
    /// Stops at the first component that can't be wired. Components wired before it leave
    /// the list, the failing one and everything after it stay pending, so the call can be retried
    /// once the missing services are registered.
    pub fn autowire_all(&self) -> Result<(), AutowireAllError> {
        let span = info_span!("autowire_all");
        let _guard = span.enter();

        let mut entries = mem::take(&mut self.inner.state.write().pending).into_iter();
        let resolver = self.resolver();

        while let Some(entry) = entries.next() {
            if let Err(source) = entry.wire(&resolver) {
                let err = AutowireAllError {
                    component: entry.component,
                    source,
                };
                error!("{}", err);

                let mut state = self.inner.state.write();
                let added_meanwhile = mem::take(&mut state.pending);
                state.pending = iter::once(entry).chain(entries).chain(added_meanwhile).collect();
                return Err(err);
            }
            debug!(component = %entry.component, "Autowired");
        }

        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn pending_autowire_count(&self) -> usize {
        self.inner.state.read().pending.len()
    }

    /// Registers `value` as a singleton [`Component`] and tries to wire it right away.
    /// If wiring fails, the component is deferred to the pending list.
    pub fn register_component<T: Autowire + Send + Sync + 'static>(&self, value: T) -> Arc<Component<T>> {
        let component = Arc::new(RwLock::new(value));
        self.register_arc(component.clone());

        if let Err(err) = component.wire(&self.resolver()) {
            debug!(component = type_name::<T>(), %err, "Deferred");
            self.add_for_autowiring(component.clone());
        }
        component
    }

    /// Starts a batch of components registered together, see [`ModuleComponents`].
    #[inline]
    #[must_use]
    pub fn components(&self) -> ModuleComponents<'_> {
        ModuleComponents {
            container: self,
            components: Vec::new(),
        }
    }
}

/// Batch of components of one module.
///
/// All of them are registered before any is wired, so components can depend on each other
/// regardless of the order they were added in. Components that still can't be wired are left
/// for [`Container::autowire_all`].
pub struct ModuleComponents<'a> {
    container: &'a Container,
    components: Vec<(ServiceKey, Registration, Pending)>,
}

impl ModuleComponents<'_> {
    #[inline]
    #[must_use]
    pub fn add<T: Autowire + Send + Sync + 'static>(mut self, value: T) -> Self {
        let component = Arc::new(RwLock::new(value));
        self.components.push((
            ServiceKey::of::<Component<T>>(),
            Registration::arc_instance(component.clone(), Lifetime::Singleton),
            Pending::new(component),
        ));
        self
    }

    /// Registers and wires the batch. Returns how many components were deferred.
    pub fn register(self) -> usize {
        let span = info_span!("register_module_components", count = self.components.len());
        let _guard = span.enter();

        let mut candidates = Vec::with_capacity(self.components.len());
        for (key, registration, pending) in self.components {
            self.container.insert_registration(key, registration);
            candidates.push(pending);
        }

        let resolver = self.container.resolver();
        let deferred = candidates
            .into_iter()
            .filter(|pending| match pending.wire(&resolver) {
                Ok(()) => false,
                Err(err) => {
                    debug!(component = %pending.component, %err, "Deferred");
                    true
                }
            })
            .collect::<Vec<_>>();

        let count = deferred.len();
        if count > 0 {
            self.container.inner.state.write().pending.extend(deferred);
        }
        count
    }
}
