mod autowire;
mod invoker;
mod module;
mod resolver;

pub use autowire::AutowireAllError;
pub use invoker::InvokeErrorKind;
pub use module::ModuleErrorKind;
pub use resolver::ResolveErrorKind;
