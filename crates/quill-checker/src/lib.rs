//! Quill Checker
//!
//! Semantic analysis for Quill packages: name resolution, type inference
//! over untyped constants, operator and overload resolution, and aggregate
//! layout.
//!
//! ## Architecture
//!
//! - **Collection**: every file scope declares its global names without
//!   looking at initializers
//! - **Declarations**: global entities are checked on demand, in any order,
//!   with cycles reported
//! - **Bodies**: procedure bodies are queued and checked once every
//!   signature is known
//!
//! ## Modules
//!
//! - [`checker`]: the [`Checker`] and its context
//! - [`conversion`]: untyped conversion, assignability, casts and the
//!   distance score used by overload ranking
//! - [`expr`]: expression checking
//! - [`types`]: type expressions, records, enums and procedure signatures
//! - [`decl`]: entity collection and declaration checking
//! - [`stmt`]: statement checking
//! - [`overload`]: candidate ranking for overloaded calls
//! - [`info`]: the side tables checking produces

mod builtins;
pub mod checker;
pub mod config;
pub mod conversion;
pub mod decl;
mod driver;
pub mod expr;
pub mod info;
pub mod operand;
pub mod overload;
pub mod stmt;
mod type_info;
pub mod types;

pub use checker::{CheckOutput, Checker, CheckerContext, DeclState};
pub use config::CheckerConfig;
pub use conversion::distance_score;
pub use expr::CallArgumentError;
pub use info::{CheckerInfo, DeclId, DeclInfo, ExprInfo, ProcBody, TypeAndValue};
pub use operand::{AddressingMode, Operand};
pub use overload::{ValidCandidate, best_candidates};
pub use stmt::StmtFlags;

// Re-export the error type from core for convenience
pub use quill_core::CheckError;

/// Result of a fallible checker operation.
pub type Result<T> = std::result::Result<T, CheckError>;
