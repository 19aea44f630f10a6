//! Checking unit API.
//!
//! A [`Unit`] collects the packages of one program, checks them together
//! and hands back everything the checker produced.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use quill::{AstBuilder, CheckerConfig, Unit};
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let mut unit = Unit::new(&arena, CheckerConfig::default());
//!
//! let file = unit.add_file("main.ql");
//! let decls = [b.var_decl(&["x"], Some(b.ident("int")), &[b.int("5")])];
//! unit.add_package(b.package("main", &[b.source_file(file, "main.ql", &decls)]))
//!     .unwrap();
//!
//! unit.check().unwrap();
//! let output = unit.finish();
//! assert!(!output.diagnostics.has_errors());
//! ```

use bumpalo::Bump;
use log::{debug, info};
use quill_ast::Package;
use quill_checker::{CheckOutput, Checker, CheckerConfig};
use quill_core::{Diagnostics, FileId};
use thiserror::Error;

/// Failure of a [`Unit`] operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("unit has already been checked")]
    AlreadyChecked,

    #[error("unit has no packages to check")]
    NoPackages,

    #[error("checking failed with {errors} error(s)")]
    Failed { errors: usize },
}

/// The packages of one program and the checker they are checked with.
///
/// The first package added is the initial package: it is the one
/// `require_main` looks at.
pub struct Unit<'ast> {
    checker: Checker<'ast>,
    packages: Vec<Package<'ast>>,
    is_checked: bool,
}

impl<'ast> Unit<'ast> {
    /// Create an empty unit whose AST lives in `arena`.
    pub fn new(arena: &'ast Bump, config: CheckerConfig) -> Self {
        Self {
            checker: Checker::new(arena, config),
            packages: Vec::new(),
            is_checked: false,
        }
    }

    /// Register a source file name for diagnostics.
    pub fn add_file(&mut self, name: impl Into<String>) -> FileId {
        self.checker.add_file(name)
    }

    /// Add a package to be checked.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::AlreadyChecked`] once [`Unit::check`] has run.
    pub fn add_package(&mut self, package: Package<'ast>) -> Result<(), UnitError> {
        if self.is_checked {
            return Err(UnitError::AlreadyChecked);
        }
        debug!("added package `{}` ({} file(s))", package.name, package.files.len());
        self.packages.push(package);
        Ok(())
    }

    /// Check every package added so far.
    ///
    /// Diagnostics are available through [`Unit::diagnostics`] whether or not
    /// checking succeeded.
    ///
    /// # Errors
    ///
    /// - [`UnitError::AlreadyChecked`] when called twice
    /// - [`UnitError::NoPackages`] when nothing was added
    /// - [`UnitError::Failed`] when any error was reported
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check(&mut self) -> Result<(), UnitError> {
        if self.is_checked {
            return Err(UnitError::AlreadyChecked);
        }
        if self.packages.is_empty() {
            return Err(UnitError::NoPackages);
        }
        self.is_checked = true;
        self.checker.check_packages(&self.packages);

        let errors = self.checker.diagnostics().error_count();
        info!("unit checked: {} package(s), {errors} error(s)", self.packages.len());
        if errors > 0 {
            return Err(UnitError::Failed { errors });
        }
        Ok(())
    }

    pub fn is_checked(&self) -> bool {
        self.is_checked
    }

    pub fn packages(&self) -> &[Package<'ast>] {
        &self.packages
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.checker.diagnostics()
    }

    /// The underlying checker, for queries between checking and
    /// [`Unit::finish`].
    pub fn checker(&self) -> &Checker<'ast> {
        &self.checker
    }

    pub fn checker_mut(&mut self) -> &mut Checker<'ast> {
        &mut self.checker
    }

    /// Give up the unit and keep what checking produced.
    pub fn finish(self) -> CheckOutput<'ast> {
        self.checker.finish()
    }
}

#[cfg(test)]
mod tests {
    use quill_ast::AstBuilder;

    use super::*;

    #[test]
    fn empty_unit_has_nothing_to_check() {
        let arena = Bump::new();
        let mut unit = Unit::new(&arena, CheckerConfig::default());
        assert_eq!(unit.check(), Err(UnitError::NoPackages));
        assert!(!unit.is_checked());
    }

    #[test]
    fn unit_is_checked_once() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut unit = Unit::new(&arena, CheckerConfig::default());
        let file = unit.add_file("a.ql");
        let pkg = b.package("a", &[b.source_file(file, "a.ql", &[b.const_decl(&["N"], None, &[b.int("1")])])]);
        unit.add_package(pkg).unwrap();
        assert_eq!(unit.check(), Ok(()));
        assert_eq!(unit.check(), Err(UnitError::AlreadyChecked));
        assert_eq!(unit.add_package(pkg), Err(UnitError::AlreadyChecked));
    }

    #[test]
    fn errors_fail_the_unit_but_keep_diagnostics() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut unit = Unit::new(&arena, CheckerConfig::default());
        let file = unit.add_file("bad.ql");
        let decl = b.var_decl(&["x"], Some(b.ident("int")), &[b.str("no")]);
        unit.add_package(b.package("bad", &[b.source_file(file, "bad.ql", &[decl])])).unwrap();
        assert_eq!(unit.check(), Err(UnitError::Failed { errors: 1 }));
        assert!(unit.diagnostics().contains("to `int`"));
        let output = unit.finish();
        assert_eq!(output.diagnostics.error_count(), 1);
    }
}
