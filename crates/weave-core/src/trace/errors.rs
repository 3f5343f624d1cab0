use thiserror::Error;

use crate::evaluator::FnKind;

/// Failure modes of the instrumentation pipeline.
///
/// All of these are caught at the entry-point boundary and downgraded to a
/// direct, uninstrumented call; they never reach user code.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("source unavailable for '{name}'")]
    SourceUnavailable { name: String },

    #[error("no declaration named '{name}' found in extracted source")]
    AmbiguousDefinition { name: String },

    #[error("free variable '{name}' referenced by '{function}' is not visible at link time")]
    ContextResolution { name: String, function: String },

    #[error("cannot rebind '{function}': unsupported receiver for {kind:?} method")]
    UnsupportedReceiverBinding { function: String, kind: FnKind },
}
