//! `CompileError`, the top-level error every pipeline stage and entry
//! point returns. It wraps the core taxa (`FormatError`/`LogicError`)
//! and folds in the I/O-adjacent failures the core crate deliberately
//! knows nothing about (YAML parsing, HTTP fetch, schema compilation),
//! mirroring the teacher's `LinkMLError` composition pattern.

use dsl_compiler_core::{FormatError, LogicError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Logic(#[from] LogicError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("schema compilation error: {0}")]
    SchemaCompile(String),

    #[error("{0}")]
    Other(String),
}

impl From<dsl_compiler_core::CoreError> for CompileError {
    fn from(e: dsl_compiler_core::CoreError) -> Self {
        match e {
            dsl_compiler_core::CoreError::Format(f) => Self::Format(f),
            dsl_compiler_core::CoreError::Logic(l) => Self::Logic(l),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;
