//! Quill
//!
//! The semantic checker of the Quill language: name resolution, untyped
//! constant inference, overload resolution and aggregate layout over an
//! arena-allocated AST.
//!
//! This crate gathers the workspace behind one import:
//!
//! - [`core`]: spans, diagnostics, errors and constant values
//! - [`ast`]: the AST and [`AstBuilder`]
//! - [`registry`]: types, entities, scopes and layout
//! - [`checker`]: the [`Checker`] itself
//!
//! Most programs only need a [`Unit`].

pub mod unit;

pub use quill_ast as ast;
pub use quill_checker as checker;
pub use quill_core as core;
pub use quill_registry as registry;

pub use quill_ast::{AstBuilder, Package, SourceFile};
pub use quill_checker::{
    AddressingMode, CheckOutput, Checker, CheckerConfig, CheckerInfo, Operand, TypeAndValue,
};
pub use quill_core::{CheckError, Diagnostic, Diagnostics, ErrorKind, ExactValue, FileId, Severity, Span};
pub use quill_registry::{EntityId, Registry, ScopeId, TypeId};
pub use unit::{Unit, UnitError};

pub mod prelude {
    pub use crate::unit::{Unit, UnitError};
    pub use quill_ast::{AstBuilder, Expr, Package, SourceFile, Stmt};
    pub use quill_checker::{CheckOutput, Checker, CheckerConfig};
    pub use quill_core::{CheckError, Diagnostics, ErrorKind, ExactValue};
    pub use quill_registry::{Registry, TypeId};
}
