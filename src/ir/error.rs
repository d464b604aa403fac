//! The IR generator's error taxonomy.
//!
//! One variant per abstract error kind; every fatal variant carries a
//! [`SourcePosition`] whenever the site of detection has one, mirroring
//! `crate::error::WdlError`'s shape.

use crate::error::SourcePosition;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LowerError {
    #[error("{pos}: undefined symbol '{name}'")]
    UndefinedSymbol { pos: SourcePosition, name: String },

    #[error("{pos}: illegal call name '{name}': {reason}")]
    IllegalCallName {
        pos: SourcePosition,
        name: String,
        reason: String,
    },

    #[error("{pos}: unsupported construct: {message}")]
    UnsupportedConstruct {
        pos: SourcePosition,
        message: String,
    },

    #[error("{pos}: missing required input '{input_name}' on call '{call_name}' in a locked workflow")]
    MissingRequiredCallInput {
        pos: SourcePosition,
        call_name: String,
        input_name: String,
    },

    #[error("{pos}: workflow input '{name}' has a non-constant default")]
    WorkflowInputDefaultNotConstant { pos: SourcePosition, name: String },

    #[error("{pos}: generated fragment for '{applet_name}' failed to re-parse: {parse_error}\n--- fragment ---\n{fragment}")]
    IllegalGeneratedFragment {
        pos: SourcePosition,
        applet_name: String,
        fragment: String,
        parse_error: String,
    },

    #[error("{pos}: unresolved call target '{name}'")]
    UnresolvedCallTarget { pos: SourcePosition, name: String },

    #[error("{pos}: platform URL resolution failed for '{url}': {message}")]
    PlatformResolution {
        pos: SourcePosition,
        url: String,
        message: String,
    },

    #[error(transparent)]
    Front(#[from] crate::error::WdlError),
}

impl LowerError {
    pub fn illegal_call_name(pos: SourcePosition, name: String, reason: String) -> Self {
        LowerError::IllegalCallName { pos, name, reason }
    }

    pub fn undefined_symbol(pos: SourcePosition, name: String) -> Self {
        LowerError::UndefinedSymbol { pos, name }
    }

    pub fn unsupported(pos: SourcePosition, message: String) -> Self {
        LowerError::UnsupportedConstruct { pos, message }
    }
}
