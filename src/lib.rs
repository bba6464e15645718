#[macro_use]
pub(crate) mod macros;

// Lets code generated by `wirebox-macros` refer to `::wirebox` inside this crate too
extern crate self as wirebox;

pub(crate) mod any;
pub(crate) mod autowire;
pub(crate) mod container;
pub(crate) mod dependency_resolver;
pub(crate) mod errors;
pub(crate) mod factory;
pub(crate) mod inject;
pub(crate) mod invoke;
pub(crate) mod module;
pub(crate) mod registry;
pub(crate) mod resolver;
pub(crate) mod scope;

pub use any::{ServiceKey, TypeInfo};
pub use autowire::{Autowire, Component, ModuleComponents};
pub use container::{Container, ScopedContainer};
pub use dependency_resolver::DependencyResolver;
pub use errors::{AutowireAllError, InvokeErrorKind, ModuleErrorKind, ResolveErrorKind};
pub use factory::Factory;
pub use inject::{Inject, InjectCloned};
pub use invoke::Invocable;
pub use module::Module;
pub use registry::{Lifetime, Registration};
pub use resolver::Resolver;

#[cfg(feature = "macros")]
pub use wirebox_macros::Autowire;
