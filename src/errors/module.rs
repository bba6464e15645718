use super::autowire::AutowireAllError;

#[derive(thiserror::Error, Debug)]
pub enum ModuleErrorKind {
    #[error("Failed to initialize {failed} modules")]
    Init { failed: usize },
    #[error(transparent)]
    Autowire(#[from] AutowireAllError),
}
