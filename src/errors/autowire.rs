use super::resolver::ResolveErrorKind;
use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
#[error("Failed to autowire `{component}`: {source}")]
pub struct AutowireAllError {
    pub component: TypeInfo,
    #[source]
    pub source: ResolveErrorKind,
}
