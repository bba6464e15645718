use std::{
    any::{type_name, Any, TypeId},
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    sync::Arc,
};

/// Explicit type token used as the type-namespace key of the registry.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit_once("::").map_or(self.name, |(_, name)| name)
    }
}

/// Key of a registration. Type keys and token keys live in separate namespaces,
/// so a type and a token never shadow each other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServiceKey {
    Type(TypeInfo),
    Token(Box<str>),
}

impl ServiceKey {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeInfo::of::<T>())
    }

    #[inline]
    #[must_use]
    pub fn token(token: impl Into<Box<str>>) -> Self {
        Self::Token(token.into())
    }
}

impl Display for ServiceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKey::Type(type_info) => write!(f, "type `{type_info}`"),
            ServiceKey::Token(token) => write!(f, "token `{token}`"),
        }
    }
}

/// Erased service instance. The payload is always an `Arc<T>`, which keeps
/// unsized services (`dyn Trait`) resolvable and preserves identity on clone.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

#[inline]
#[must_use]
pub(crate) fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Instance {
    Arc::new(value)
}

#[inline]
#[must_use]
pub(crate) fn downcast<T: ?Sized + Send + Sync + 'static>(instance: &Instance) -> Option<Arc<T>> {
    instance.downcast_ref::<Arc<T>>().cloned()
}

#[cfg(test)]
mod tests {
    use super::{downcast, erase, ServiceKey, TypeInfo};

    use std::sync::Arc;

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    #[test]
    fn test_type_and_token_namespaces_differ() {
        let by_type = ServiceKey::of::<String>();
        let by_token = ServiceKey::token(TypeInfo::of::<String>().name);

        assert_ne!(by_type, by_token);
        assert_eq!(by_type, ServiceKey::Type(TypeInfo::of::<String>()));
        assert_eq!(TypeInfo::of::<String>().short_name(), "String");
    }

    #[test]
    fn test_erased_round_trip_keeps_identity() {
        let value = Arc::new(5u32);
        let instance = erase(value.clone());

        let resolved = downcast::<u32>(&instance).unwrap();
        assert!(Arc::ptr_eq(&value, &resolved));
        assert!(downcast::<u64>(&instance).is_none());
    }

    #[test]
    fn test_erased_trait_object() {
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        let instance = erase(greeter);

        let resolved = downcast::<dyn Greeter>(&instance).unwrap();
        assert_eq!(resolved.greet(), "hello");
    }
}
