use parking_lot::RwLock;
use std::{any::type_name, sync::Arc};
use tracing::{debug, info_span};

use crate::{
    any::ServiceKey,
    autowire::{Autowire, Pending},
    errors::ResolveErrorKind,
    factory::Factory,
    registry::{Lifetime, Registration, Registry},
    resolver::Resolver,
    scope::{ScopeStore, Slot},
};

/// Service container.
///
/// Cloning is cheap and every clone shares the same registrations, scopes and pending list.
/// Independent containers are created with [`Container::new`] and never share state.
#[derive(Clone, Default)]
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

#[derive(Default)]
pub(crate) struct ContainerInner {
    pub(crate) state: RwLock<State>,
}

#[derive(Default)]
pub(crate) struct State {
    pub(crate) registry: Registry,
    pub(crate) scopes: ScopeStore,
    pub(crate) pending: Vec<Pending>,
}

impl Container {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `registration` under `key`, replacing any previous registration of the key.
    /// Returns `true` if a registration was replaced.
    pub fn insert_registration(&self, key: ServiceKey, registration: Registration) -> bool {
        let lifetime = registration.lifetime;
        let provides = registration.provides;
        let replaced = self.inner.state.write().registry.insert(key.clone(), registration).is_some();

        debug!(%key, %lifetime, %provides, replaced, "Registered");
        replaced
    }

    /// Registers `value` as a singleton under its type.
    #[inline]
    pub fn register<T: Send + Sync + 'static>(&self, value: T) {
        self.register_with_lifetime(value, Lifetime::Singleton);
    }

    /// Registers `value` under its type with an explicit lifetime.
    ///
    /// # Warning
    /// A transient registration needs a factory, so registering a plain value as transient
    /// makes its resolution fail with [`ResolveErrorKind::NoFactory`].
    #[inline]
    pub fn register_with_lifetime<T: Send + Sync + 'static>(&self, value: T, lifetime: Lifetime) {
        self.insert_registration(ServiceKey::of::<T>(), Registration::instance(value, lifetime));
    }

    /// Registers an already shared value, for example a trait object, as a singleton under the type `T`.
    #[inline]
    pub fn register_arc<T: ?Sized + Send + Sync + 'static>(&self, value: Arc<T>) {
        self.register_arc_with_lifetime(value, Lifetime::Singleton);
    }

    #[inline]
    pub fn register_arc_with_lifetime<T: ?Sized + Send + Sync + 'static>(&self, value: Arc<T>, lifetime: Lifetime) {
        self.insert_registration(ServiceKey::of::<T>(), Registration::arc_instance(value, lifetime));
    }

    #[inline]
    pub fn register_factory<T, F>(&self, factory: F, lifetime: Lifetime)
    where
        T: Send + Sync + 'static,
        F: Factory<T>,
    {
        self.insert_registration(ServiceKey::of::<T>(), Registration::factory(factory, lifetime));
    }

    #[inline]
    pub fn register_arc_factory<T, F>(&self, factory: F, lifetime: Lifetime)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Factory<Arc<T>>,
    {
        self.insert_registration(ServiceKey::of::<T>(), Registration::arc_factory(factory, lifetime));
    }

    #[inline]
    pub fn register_transient_factory<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Factory<T>,
    {
        self.register_factory(factory, Lifetime::Transient);
    }

    #[inline]
    pub fn register_scoped_factory<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Factory<T>,
    {
        self.register_factory(factory, Lifetime::Scoped);
    }

    /// Registers `T` as transient: every resolution gets a fresh `T::default()`.
    #[inline]
    pub fn register_transient<T: Default + Send + Sync + 'static>(&self) {
        self.insert_registration(ServiceKey::of::<T>(), Registration::prototype::<T>());
    }

    /// Binds `value` to `token` as a singleton.
    #[inline]
    pub fn bind<T: Send + Sync + 'static>(&self, token: impl Into<Box<str>>, value: T) {
        self.bind_with_lifetime(token, value, Lifetime::Singleton);
    }

    #[inline]
    pub fn bind_with_lifetime<T: Send + Sync + 'static>(&self, token: impl Into<Box<str>>, value: T, lifetime: Lifetime) {
        self.insert_registration(ServiceKey::token(token), Registration::instance(value, lifetime));
    }

    #[inline]
    pub fn bind_arc<T: ?Sized + Send + Sync + 'static>(&self, token: impl Into<Box<str>>, value: Arc<T>) {
        self.insert_registration(ServiceKey::token(token), Registration::arc_instance(value, Lifetime::Singleton));
    }

    #[inline]
    pub fn bind_factory<T, F>(&self, token: impl Into<Box<str>>, factory: F, lifetime: Lifetime)
    where
        T: Send + Sync + 'static,
        F: Factory<T>,
    {
        self.insert_registration(ServiceKey::token(token), Registration::factory(factory, lifetime));
    }

    #[inline]
    pub fn bind_scoped_factory<T, F>(&self, token: impl Into<Box<str>>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Factory<T>,
    {
        self.bind_factory(token, factory, Lifetime::Scoped);
    }

    /// Binds `token` to a transient producing `T::default()` on each resolution.
    #[inline]
    pub fn bind_transient<T: Default + Send + Sync + 'static>(&self, token: impl Into<Box<str>>) {
        self.insert_registration(ServiceKey::token(token), Registration::prototype::<T>());
    }

    #[inline]
    #[must_use]
    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.inner.state.read().registry.contains(&ServiceKey::of::<T>())
    }

    #[inline]
    #[must_use]
    pub fn is_token_bound(&self, token: &str) -> bool {
        self.inner.state.read().registry.contains(&ServiceKey::token(token))
    }

    #[inline]
    #[must_use]
    pub fn lifetime_of(&self, key: &ServiceKey) -> Option<Lifetime> {
        self.registration(key).map(|registration| registration.lifetime)
    }

    #[inline]
    #[must_use]
    pub fn registrations_count(&self) -> usize {
        self.inner.state.read().registry.len()
    }

    /// Resolution view without a scope key.
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self, None)
    }

    /// Resolution view bound to `scope_key`.
    #[inline]
    #[must_use]
    pub fn resolver_in_scope<'a>(&'a self, scope_key: &'a str) -> Resolver<'a> {
        Resolver::new(self, Some(scope_key))
    }

    /// # Errors
    /// See [`ResolveErrorKind`].
    #[inline]
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolver().resolve()
    }

    /// # Errors
    /// See [`ResolveErrorKind`].
    #[inline]
    pub fn resolve_in_scope<T: ?Sized + Send + Sync + 'static>(&self, scope_key: &str) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolver_in_scope(scope_key).resolve()
    }

    /// # Errors
    /// See [`ResolveErrorKind`].
    #[inline]
    pub fn resolve_cloned<T: Clone + Send + Sync + 'static>(&self) -> Result<T, ResolveErrorKind> {
        self.resolver().resolve_cloned()
    }

    /// # Errors
    /// See [`ResolveErrorKind`].
    #[inline]
    pub fn resolve_cloned_in_scope<T: Clone + Send + Sync + 'static>(&self, scope_key: &str) -> Result<T, ResolveErrorKind> {
        self.resolver_in_scope(scope_key).resolve_cloned()
    }

    /// # Errors
    /// See [`ResolveErrorKind`].
    #[inline]
    pub fn resolve_by_token<T: ?Sized + Send + Sync + 'static>(&self, token: &str) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolver().resolve_by_token(token)
    }

    /// # Errors
    /// See [`ResolveErrorKind`].
    #[inline]
    pub fn resolve_by_token_in_scope<T: ?Sized + Send + Sync + 'static>(
        &self,
        scope_key: &str,
        token: &str,
    ) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolver_in_scope(scope_key).resolve_by_token(token)
    }

    /// # Errors
    /// See [`ResolveErrorKind`].
    #[inline]
    pub fn resolve_by_token_cloned_in_scope<T: Clone + Send + Sync + 'static>(
        &self,
        scope_key: &str,
        token: &str,
    ) -> Result<T, ResolveErrorKind> {
        self.resolver_in_scope(scope_key).resolve_by_token_cloned(token)
    }

    /// # Errors
    /// See [`ResolveErrorKind`].
    #[inline]
    pub fn resolve_by_token_cloned<T: Clone + Send + Sync + 'static>(&self, token: &str) -> Result<T, ResolveErrorKind> {
        self.resolver().resolve_by_token_cloned(token)
    }

    /// # Panics
    /// Panics if the service can't be resolved.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn must_resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        match self.resolve() {
            Ok(service) => service,
            Err(err) => panic!("{err}"),
        }
    }

    /// # Panics
    /// Panics if the service can't be resolved.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn must_resolve_by_token<T: ?Sized + Send + Sync + 'static>(&self, token: &str) -> Arc<T> {
        match self.resolve_by_token(token) {
            Ok(service) => service,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fills the annotated fields of `target`.
    ///
    /// # Errors
    /// Returns the first field error. Fields wired before it keep their new values.
    #[inline]
    pub fn autowire<T: Autowire + ?Sized>(&self, target: &mut T) -> Result<(), ResolveErrorKind> {
        let span = info_span!("autowire", component = type_name::<T>());
        let _guard = span.enter();

        target.autowire(&self.resolver())
    }

    /// # Errors
    /// See [`Self::autowire`].
    #[inline]
    pub fn autowire_in_scope<T: Autowire + ?Sized>(&self, scope_key: &str, target: &mut T) -> Result<(), ResolveErrorKind> {
        let span = info_span!("autowire", component = type_name::<T>(), scope = scope_key);
        let _guard = span.enter();

        target.autowire(&self.resolver_in_scope(scope_key))
    }

    /// # Panics
    /// Panics if any annotated field can't be resolved.
    #[inline]
    #[track_caller]
    pub fn must_autowire<T: Autowire + ?Sized>(&self, target: &mut T) {
        if let Err(err) = self.autowire(target) {
            panic!("{err}");
        }
    }

    /// Creates a view bound to `scope_key`. Nothing is allocated until a scoped service is resolved.
    #[inline]
    #[must_use]
    pub fn create_scope(&self, scope_key: impl Into<Box<str>>) -> ScopedContainer {
        let scope_key = scope_key.into();
        debug!(scope = &*scope_key, "Scope created");

        ScopedContainer {
            container: self.clone(),
            scope_key,
        }
    }

    /// Drops every scoped instance cached for `scope_key`.
    ///
    /// # Warning
    /// Clear a scope only after the work inside it has completed. A resolution still in flight
    /// finishes against the detached cache and never repopulates the cleared scope.
    pub fn clear_scope(&self, scope_key: &str) {
        let dropped = self.inner.state.write().scopes.clear(scope_key);
        debug!(scope = scope_key, dropped, "Scope cleared");
    }

    #[inline]
    #[must_use]
    pub fn has_scope(&self, scope_key: &str) -> bool {
        self.inner.state.read().scopes.contains(scope_key)
    }
}

impl Container {
    #[inline]
    #[must_use]
    pub(crate) fn registration(&self, key: &ServiceKey) -> Option<Arc<Registration>> {
        self.inner.state.read().registry.get(key)
    }

    /// Returns the slot of `key` in `scope_key`, creating it under the write lock if needed.
    pub(crate) fn scope_slot(&self, scope_key: &str, key: &ServiceKey) -> Slot {
        if let Some(slot) = self.inner.state.read().scopes.slot(scope_key, key) {
            return slot;
        }
        self.inner.state.write().scopes.slot_or_insert(scope_key, key)
    }
}

/// Container view bound to one scope key.
#[derive(Clone)]
pub struct ScopedContainer {
    container: Container,
    scope_key: Box<str>,
}

impl ScopedContainer {
    #[inline]
    #[must_use]
    pub fn scope_key(&self) -> &str {
        &self.scope_key
    }

    #[inline]
    #[must_use]
    pub const fn container(&self) -> &Container {
        &self.container
    }

    #[inline]
    #[must_use]
    pub fn resolver(&self) -> Resolver<'_> {
        self.container.resolver_in_scope(&self.scope_key)
    }

    /// # Errors
    /// See [`ResolveErrorKind`].
    #[inline]
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolver().resolve()
    }

    /// # Errors
    /// See [`ResolveErrorKind`].
    #[inline]
    pub fn resolve_cloned<T: Clone + Send + Sync + 'static>(&self) -> Result<T, ResolveErrorKind> {
        self.resolver().resolve_cloned()
    }

    /// # Errors
    /// See [`ResolveErrorKind`].
    #[inline]
    pub fn resolve_by_token<T: ?Sized + Send + Sync + 'static>(&self, token: &str) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolver().resolve_by_token(token)
    }

    /// # Errors
    /// See [`ResolveErrorKind`].
    #[inline]
    pub fn resolve_by_token_cloned<T: Clone + Send + Sync + 'static>(&self, token: &str) -> Result<T, ResolveErrorKind> {
        self.resolver().resolve_by_token_cloned(token)
    }

    /// # Errors
    /// See [`Container::autowire`].
    #[inline]
    pub fn autowire<T: Autowire + ?Sized>(&self, target: &mut T) -> Result<(), ResolveErrorKind> {
        self.container.autowire_in_scope(&self.scope_key, target)
    }

    /// # Panics
    /// Panics if the service can't be resolved.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn must_resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        match self.resolve() {
            Ok(service) => service,
            Err(err) => panic!("{err}"),
        }
    }

    /// # Panics
    /// Panics if the service can't be resolved.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn must_resolve_by_token<T: ?Sized + Send + Sync + 'static>(&self, token: &str) -> Arc<T> {
        match self.resolve_by_token(token) {
            Ok(service) => service,
            Err(err) => panic!("{err}"),
        }
    }

    /// # Panics
    /// Panics if any annotated field can't be resolved.
    #[inline]
    #[track_caller]
    pub fn must_autowire<T: Autowire + ?Sized>(&self, target: &mut T) {
        if let Err(err) = self.autowire(target) {
            panic!("{err}");
        }
    }

    /// Drops the instances cached for this scope and ends the view.
    #[inline]
    pub fn clear_scope(self) {
        self.container.clear_scope(&self.scope_key);
    }
}

#[cfg(test)]
mod tests {
    use super::Container;
    use crate::{any::ServiceKey, Lifetime, ResolveErrorKind};

    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            mpsc, Arc, Barrier,
        },
        thread,
        time::Duration,
    };
    use tracing_test::traced_test;

    #[derive(Debug)]
    struct Database {
        url: &'static str,
    }

    #[derive(Debug, Default)]
    struct RequestContext {
        user: Option<String>,
    }

    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            self.0
        }
    }

    #[test]
    #[traced_test]
    fn test_singleton_identity() {
        let container = Container::new();
        container.register(Database { url: "postgres://" });

        let first = container.resolve::<Database>().unwrap();
        let second = container.clone().resolve::<Database>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.url, "postgres://");
    }

    #[test]
    #[traced_test]
    fn test_concurrent_first_resolution_creates_one_singleton() {
        const THREADS: usize = 8;

        let calls = Arc::new(AtomicUsize::new(0));
        let container = Container::new();
        container.register_factory(
            {
                let calls = calls.clone();
                move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(10));
                    Database { url: "lazy" }
                }
            },
            Lifetime::Singleton,
        );

        let barrier = Arc::new(Barrier::new(THREADS));
        let handles = (0..THREADS)
            .map(|_| {
                let container = container.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    container.resolve::<Database>().unwrap()
                })
            })
            .collect::<Vec<_>>();
        let resolved = handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(resolved.iter().all(|database| Arc::ptr_eq(database, &resolved[0])));
    }

    #[test]
    #[traced_test]
    fn test_transient_freshness() {
        let container = Container::new();
        container.register_transient::<RequestContext>();

        let first = container.resolve::<RequestContext>().unwrap();
        let second = container.resolve::<RequestContext>().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(first.user.is_none());
    }

    #[test]
    #[traced_test]
    fn test_scope_isolation_and_teardown() {
        let container = Container::new();
        container.register_scoped_factory(RequestContext::default);

        let req_1 = container.create_scope("req-1");
        let req_2 = container.create_scope("req-2");

        let first = req_1.resolve::<RequestContext>().unwrap();
        let again = req_1.resolve::<RequestContext>().unwrap();
        let other = req_2.resolve::<RequestContext>().unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert!(container.has_scope("req-1"));

        req_1.clear_scope();
        assert!(!container.has_scope("req-1"));
        assert!(container.has_scope("req-2"));

        let after_clear = container.resolve_in_scope::<RequestContext>("req-1").unwrap();
        assert!(!Arc::ptr_eq(&first, &after_clear));
        assert!(Arc::ptr_eq(&other, &req_2.resolve::<RequestContext>().unwrap()));
    }

    #[test]
    #[traced_test]
    fn test_scoped_tokens_are_cached_per_scope() {
        let container = Container::new();
        container.bind_scoped_factory("ctx", RequestContext::default);
        container.register_scoped_factory(RequestContext::default);

        let scope = container.create_scope("req-1");
        let by_token = scope.resolve_by_token::<RequestContext>("ctx").unwrap();
        let by_type = scope.resolve::<RequestContext>().unwrap();

        assert!(!Arc::ptr_eq(&by_token, &by_type));
        assert!(Arc::ptr_eq(&by_token, &scope.resolve_by_token::<RequestContext>("ctx").unwrap()));
    }

    #[test]
    #[traced_test]
    fn test_concurrent_scopes_create_one_instance_each() {
        const SCOPES: usize = 4;
        const THREADS_PER_SCOPE: usize = 4;

        let calls = Arc::new(AtomicUsize::new(0));
        let container = Container::new();
        container.register_scoped_factory({
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
                RequestContext::default()
            }
        });

        let barrier = Arc::new(Barrier::new(SCOPES * THREADS_PER_SCOPE));
        let handles = (0..SCOPES * THREADS_PER_SCOPE)
            .map(|index| {
                let scope = container.create_scope(format!("req-{}", index % SCOPES));
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    (index % SCOPES, scope.resolve::<RequestContext>().unwrap())
                })
            })
            .collect::<Vec<_>>();
        let resolved = handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>();

        assert_eq!(calls.load(Ordering::SeqCst), SCOPES);
        for (scope, context) in &resolved {
            for (other_scope, other_context) in &resolved {
                assert_eq!(scope == other_scope, Arc::ptr_eq(context, other_context));
            }
        }
    }

    #[test]
    #[traced_test]
    fn test_missing_registration_has_no_side_effects() {
        let container = Container::new();
        container.register(Database { url: "sqlite://" });

        assert!(matches!(
            container.resolve::<RequestContext>(),
            Err(ResolveErrorKind::NotRegistered { key }) if key == ServiceKey::of::<RequestContext>()
        ));
        assert!(matches!(
            container.resolve_by_token::<Database>("db"),
            Err(ResolveErrorKind::NotRegistered { key }) if key == ServiceKey::token("db")
        ));
        assert_eq!(container.registrations_count(), 1);
        assert!(!container.is_registered::<RequestContext>());
        assert!(!container.is_token_bound("db"));
    }

    #[test]
    #[traced_test]
    fn test_type_and_token_namespaces() {
        let container = Container::new();
        container.register(Database { url: "typed" });
        container.bind("database", Database { url: "token" });

        assert_eq!(container.resolve::<Database>().unwrap().url, "typed");
        assert_eq!(container.resolve_by_token::<Database>("database").unwrap().url, "token");
        assert_eq!(container.lifetime_of(&ServiceKey::token("database")), Some(Lifetime::Singleton));
    }

    #[test]
    #[traced_test]
    fn test_reregistration_replaces() {
        let container = Container::new();
        container.register(Database { url: "first" });
        container.register_transient_factory(|| Database { url: "second" });

        assert_eq!(container.lifetime_of(&ServiceKey::of::<Database>()), Some(Lifetime::Transient));
        assert_eq!(container.resolve::<Database>().unwrap().url, "second");
        assert_eq!(container.registrations_count(), 1);
    }

    #[test]
    #[traced_test]
    fn test_trait_objects() {
        let container = Container::new();
        container.register_arc::<dyn Clock>(Arc::new(FixedClock(42)));
        container.bind_arc::<dyn Clock>("frozen", Arc::new(FixedClock(0)));
        container.register_arc_factory(|| Arc::new(FixedClock(7)) as Arc<dyn Clock + Send>, Lifetime::Transient);

        assert_eq!(container.resolve::<dyn Clock>().unwrap().now(), 42);
        assert_eq!(container.resolve_by_token::<dyn Clock>("frozen").unwrap().now(), 0);
        assert!(container.resolve::<dyn Clock + Send>().is_ok());
    }

    #[test]
    #[traced_test]
    fn test_factory_can_resolve_from_same_container() {
        let container = Container::new();
        container.register(Database { url: "dep" });
        container.register_factory(
            {
                let container = container.clone();
                move || RequestContext {
                    user: Some(container.must_resolve::<Database>().url.to_owned()),
                }
            },
            Lifetime::Singleton,
        );

        assert_eq!(container.resolve::<RequestContext>().unwrap().user.as_deref(), Some("dep"));
    }

    #[test]
    #[traced_test]
    fn test_value_form() {
        let container = Container::new();
        container.register(String::from("config"));
        container.bind("name", String::from("wirebox"));

        let mut value = container.resolve_cloned::<String>().unwrap();
        value.push('!');

        assert_eq!(value, "config!");
        assert_eq!(*container.resolve::<String>().unwrap(), "config");
        assert_eq!(container.resolve_by_token_cloned::<String>("name").unwrap(), "wirebox");
    }

    #[test]
    #[should_panic(expected = "No registration found")]
    fn test_must_resolve_panics() {
        let container = Container::new();
        let _ = container.must_resolve::<Database>();
    }

    #[test]
    #[should_panic(expected = "No registration found for token `db`")]
    fn test_must_resolve_by_token_panics() {
        let container = Container::new();
        container.register(Database { url: "typed only" });

        let _ = container.must_resolve_by_token::<Database>("db");
    }

    #[test]
    #[traced_test]
    fn test_bind_transient_yields_fresh_defaults() {
        let container = Container::new();
        container.register(RequestContext {
            user: Some(String::from("admin")),
        });
        container.bind_transient::<RequestContext>("ctx");

        let first = container.resolve_by_token::<RequestContext>("ctx").unwrap();
        let second = container.resolve_by_token::<RequestContext>("ctx").unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(first.user.is_none());
        assert!(second.user.is_none());
        assert_eq!(container.lifetime_of(&ServiceKey::token("ctx")), Some(Lifetime::Transient));
    }

    #[test]
    #[traced_test]
    fn test_scoped_container_level_wrappers() {
        #[derive(Clone, Debug, PartialEq)]
        struct Ticket(usize);

        let issued = Arc::new(AtomicUsize::new(0));
        let container = Container::new();
        container.bind_scoped_factory("ticket", {
            let issued = issued.clone();
            move || Ticket(issued.fetch_add(1, Ordering::SeqCst))
        });
        container.register_scoped_factory({
            let issued = issued.clone();
            move || Ticket(issued.fetch_add(1, Ordering::SeqCst) + 100)
        });

        let by_token = container.resolve_by_token_in_scope::<Ticket>("req-1", "ticket").unwrap();
        assert!(Arc::ptr_eq(
            &by_token,
            &container.resolve_by_token_in_scope::<Ticket>("req-1", "ticket").unwrap()
        ));
        assert_eq!(
            container.resolve_by_token_cloned_in_scope::<Ticket>("req-1", "ticket").unwrap(),
            Ticket(0)
        );
        assert_eq!(
            container.resolve_by_token_cloned_in_scope::<Ticket>("req-2", "ticket").unwrap(),
            Ticket(1)
        );

        assert_eq!(container.resolve_cloned_in_scope::<Ticket>("req-1").unwrap(), Ticket(102));
        assert_eq!(container.resolve_cloned_in_scope::<Ticket>("req-1").unwrap(), Ticket(102));
        assert!(matches!(
            container.resolve_cloned::<Ticket>(),
            Err(ResolveErrorKind::MissingScopeKey { .. })
        ));
    }

    #[test]
    #[traced_test]
    fn test_clear_scope_during_resolution() {
        let (started_tx, started_rx) = mpsc::channel();
        let release = Arc::new(Barrier::new(2));

        let container = Container::new();
        container.register_scoped_factory({
            let started_tx = parking_lot::Mutex::new(started_tx);
            let release = release.clone();
            move || {
                let _ = started_tx.lock().send(());
                release.wait();
                RequestContext::default()
            }
        });

        let handle = thread::spawn({
            let container = container.clone();
            move || container.resolve_in_scope::<RequestContext>("req-1").unwrap()
        });
        started_rx.recv().unwrap();
        container.clear_scope("req-1");
        release.wait();
        let in_flight = handle.join().unwrap();

        // The detached slot never repopulates the cleared scope
        assert!(!container.has_scope("req-1"));

        let release_again = thread::spawn({
            let release = release.clone();
            move || release.wait()
        });
        let fresh = container.resolve_in_scope::<RequestContext>("req-1").unwrap();
        release_again.join().unwrap();
        let _ = started_rx.recv();

        assert!(!Arc::ptr_eq(&in_flight, &fresh));
        assert!(container.has_scope("req-1"));
    }

    #[test]
    fn test_thread_safe() {
        fn impl_bounds<T: Send + Sync + 'static>() {}

        impl_bounds::<(Container, super::ScopedContainer)>();
    }
}
