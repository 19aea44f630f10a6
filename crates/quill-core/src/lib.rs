//! Core types shared by every Quill checker crate.
//!
//! - [`span`]: source positions carried by AST nodes and diagnostics
//! - [`ids`]: [`FileId`] and [`NodeId`] handles
//! - [`error`]: the [`CheckError`] taxonomy
//! - [`diagnostics`]: the [`Diagnostics`] sink
//! - [`basic`]: basic type kinds and their flags
//! - [`convention`]: procedure calling conventions
//! - [`exact_value`]: compile-time constant arithmetic

pub mod basic;
pub mod convention;
pub mod diagnostics;
pub mod error;
pub mod exact_value;
pub mod ids;
pub mod span;

pub use basic::{BasicFlags, BasicKind};
pub use convention::CallingConvention;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{CheckError, ErrorKind};
pub use exact_value::{BinaryValueOp, CompareValueOp, ExactValue, UnaryValueOp};
pub use ids::{FileId, NodeId};
pub use span::Span;
