//! Core types and error taxonomy for the blueprint DSL compiler.
//!
//! This crate has no I/O dependency: it defines the data model (§3 of
//! `SPEC_FULL.md`), the two error taxa (§7), the intrinsic-function
//! value model (§4.12), and a handful of merge helpers pure enough to
//! property-test in isolation. The pipeline stages that use them live
//! in the `dsl-compiler` crate.

pub mod constants;
pub mod error;
pub mod function;
pub mod merge;
pub mod types;

pub use error::{CoreError, FormatError, LogicError, Result};
pub use types::Plan;
