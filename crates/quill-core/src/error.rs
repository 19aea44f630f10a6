//! Error taxonomy for semantic checking.
//!
//! Every user-facing problem the checker finds is a [`CheckError`]. Most are
//! local: the offending operand or entity is poisoned, one error is reported,
//! and checking continues. [`CheckError::is_fatal`] marks the kinds that stop
//! the affected declaration outright.
//!
//! ```text
//! CheckError
//! ├── SyntaxShape   - AST contract violations
//! ├── Name          - undeclared / blank / unexported names
//! ├── TypeMismatch  - incompatible operands, failed conversions
//! ├── Constant      - non-constant where required, overflow, division by zero
//! ├── Arity         - argument and value count mismatches
//! ├── Overload      - no matching or ambiguous overloads
//! ├── Redeclaration - duplicate names in a scope or type
//! └── CyclicType    - illegal declaration cycles found while sizing types
//! ```

use std::fmt;

use thiserror::Error;

use crate::Span;

// ============================================================================
// Error Kinds
// ============================================================================

/// Discriminant of a [`CheckError`], useful for filtering diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SyntaxShape,
    Name,
    TypeMismatch,
    Constant,
    Arity,
    Overload,
    Redeclaration,
    CyclicType,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::SyntaxShape => "syntax shape",
            ErrorKind::Name => "name",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::Constant => "constant",
            ErrorKind::Arity => "arity",
            ErrorKind::Overload => "overload",
            ErrorKind::Redeclaration => "redeclaration",
            ErrorKind::CyclicType => "cyclic type",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Check Errors
// ============================================================================

/// An error found while checking a package.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckError {
    /// The AST does not have the shape the checker requires.
    #[error("{message}")]
    SyntaxShape { message: String, span: Span },

    /// A name could not be resolved or was used illegally.
    #[error("{message}")]
    Name { message: String, span: Span },

    /// Operand types are incompatible with the operation.
    #[error("{message}")]
    TypeMismatch { message: String, span: Span },

    /// Constant evaluation failed or a constant was required.
    #[error("{message}")]
    Constant { message: String, span: Span },

    /// Wrong number of values, arguments, or results.
    #[error("{message}")]
    Arity { message: String, span: Span },

    /// Overload selection failed.
    #[error("{message}")]
    Overload { message: String, span: Span },

    /// A name was declared twice.
    #[error("{message}")]
    Redeclaration { message: String, span: Span },

    /// A type refers to itself through its own size.
    #[error("{message}")]
    CyclicType { message: String, span: Span },
}

impl CheckError {
    /// Build an error of the given kind.
    pub fn new(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::SyntaxShape => CheckError::SyntaxShape { message, span },
            ErrorKind::Name => CheckError::Name { message, span },
            ErrorKind::TypeMismatch => CheckError::TypeMismatch { message, span },
            ErrorKind::Constant => CheckError::Constant { message, span },
            ErrorKind::Arity => CheckError::Arity { message, span },
            ErrorKind::Overload => CheckError::Overload { message, span },
            ErrorKind::Redeclaration => CheckError::Redeclaration { message, span },
            ErrorKind::CyclicType => CheckError::CyclicType { message, span },
        }
    }

    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            CheckError::SyntaxShape { span, .. }
            | CheckError::Name { span, .. }
            | CheckError::TypeMismatch { span, .. }
            | CheckError::Constant { span, .. }
            | CheckError::Arity { span, .. }
            | CheckError::Overload { span, .. }
            | CheckError::Redeclaration { span, .. }
            | CheckError::CyclicType { span, .. } => *span,
        }
    }

    /// The rendered message without location.
    pub fn message(&self) -> &str {
        match self {
            CheckError::SyntaxShape { message, .. }
            | CheckError::Name { message, .. }
            | CheckError::TypeMismatch { message, .. }
            | CheckError::Constant { message, .. }
            | CheckError::Arity { message, .. }
            | CheckError::Overload { message, .. }
            | CheckError::Redeclaration { message, .. }
            | CheckError::CyclicType { message, .. } => message,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckError::SyntaxShape { .. } => ErrorKind::SyntaxShape,
            CheckError::Name { .. } => ErrorKind::Name,
            CheckError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            CheckError::Constant { .. } => ErrorKind::Constant,
            CheckError::Arity { .. } => ErrorKind::Arity,
            CheckError::Overload { .. } => ErrorKind::Overload,
            CheckError::Redeclaration { .. } => ErrorKind::Redeclaration,
            CheckError::CyclicType { .. } => ErrorKind::CyclicType,
        }
    }

    /// Whether this error aborts the declaration that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CheckError::CyclicType { .. } | CheckError::SyntaxShape { .. }
        )
    }
}
