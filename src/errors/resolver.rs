use crate::{
    any::{ServiceKey, TypeInfo},
    registry::Lifetime,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveErrorKind {
    #[error("No registration found for {key}")]
    NotRegistered { key: ServiceKey },
    #[error("Registration for {key} has neither an instance nor a factory")]
    NoProducer { key: ServiceKey },
    #[error("Registration for {key} has no factory, which is required by the {lifetime} lifetime")]
    NoFactory { key: ServiceKey, lifetime: Lifetime },
    #[error("Scope key is required to resolve scoped {key}")]
    MissingScopeKey { key: ServiceKey },
    #[error("Type mismatch for {key}. Actual: `{actual}`, expected: `{expected}`")]
    TypeMismatch {
        key: ServiceKey,
        expected: TypeInfo,
        actual: TypeInfo,
    },
}

impl ResolveErrorKind {
    #[inline]
    #[must_use]
    pub fn key(&self) -> &ServiceKey {
        match self {
            Self::NotRegistered { key }
            | Self::NoProducer { key }
            | Self::NoFactory { key, .. }
            | Self::MissingScopeKey { key }
            | Self::TypeMismatch { key, .. } => key,
        }
    }
}
