use core::convert::Infallible;

use super::resolver::ResolveErrorKind;
use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum InvokeErrorKind<CallErr = Infallible> {
    #[error("Failed to resolve argument {index} (`{type_info}`): {source}")]
    Argument {
        index: usize,
        type_info: TypeInfo,
        #[source]
        source: ResolveErrorKind,
    },
    #[error("Invoked function returned an error: {0}")]
    Returned(CallErr),
}

impl InvokeErrorKind {
    /// Widens an argument error so it can carry the error type of a fallible function.
    #[must_use]
    pub fn with_call_error<CallErr>(self) -> InvokeErrorKind<CallErr> {
        match self {
            Self::Argument { index, type_info, source } => InvokeErrorKind::Argument { index, type_info, source },
            Self::Returned(infallible) => match infallible {},
        }
    }
}
