//! The [`Checker`]: state shared by every part of semantic analysis.
//!
//! Expression, type, statement and declaration checking are all `impl`
//! blocks on this one struct, spread over the sibling modules. The checker
//! owns the [`Registry`] (types, entities, scopes), the [`Diagnostics`] sink
//! and the [`CheckerInfo`] result tables, and tracks the current
//! [`CheckerContext`] while it walks the tree.

use bumpalo::Bump;
use log::trace;
use quill_ast::{Ident, StmtStateFlags};
use quill_core::{CheckError, Diagnostics, ErrorKind, FileId, NodeId, Span};
use quill_registry::{EntityFlags, EntityId, Registry, ScopeId, TypeId};
use rustc_hash::FxHashMap;

use crate::config::CheckerConfig;
use crate::info::{CheckerInfo, DeclId};

/// Checking state of a global or local declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclState {
    #[default]
    Unchecked,
    InProgress,
    Done,
    Failed,
}

/// Where the checker currently is.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckerContext {
    pub scope: ScopeId,
    /// Declaration being checked, collecting dependencies
    pub decl: Option<DeclId>,
    /// Name of the procedure whose body is being checked
    pub proc_name: Option<String>,
    pub in_defer: bool,
    pub stmt_state: StmtStateFlags,
    pub file: Option<FileId>,
}

impl CheckerContext {
    fn new(scope: ScopeId, bounds_check: bool) -> Self {
        Self {
            scope,
            decl: None,
            proc_name: None,
            in_defer: false,
            stmt_state: if bounds_check {
                StmtStateFlags::BOUNDS_CHECK
            } else {
                StmtStateFlags::NO_BOUNDS_CHECK
            },
            file: None,
        }
    }
}

/// Everything a checking session produces.
#[derive(Debug)]
pub struct CheckOutput<'ast> {
    pub info: CheckerInfo<'ast>,
    pub registry: Registry,
    pub diagnostics: Diagnostics,
}

/// Semantic checker for one set of packages.
///
/// # Example
///
/// ```
/// use bumpalo::Bump;
/// use quill_ast::AstBuilder;
/// use quill_checker::{Checker, CheckerConfig};
///
/// let arena = Bump::new();
/// let b = AstBuilder::new(&arena);
/// let mut checker = Checker::new(&arena, CheckerConfig::default());
/// let file = checker.add_file("main.ql");
/// let decl = b.var_decl(&["x"], Some(b.ident("int")), &[b.int("5")]);
/// let pkg = b.package("main", &[b.source_file(file, "main.ql", &[decl])]);
/// checker.check_packages(&[pkg]);
/// assert!(!checker.diagnostics().has_errors());
/// ```
pub struct Checker<'ast> {
    /// Arena the AST lives in; synthesized nodes are allocated here too
    pub(crate) arena: &'ast Bump,
    pub(crate) config: CheckerConfig,
    pub(crate) registry: Registry,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) info: CheckerInfo<'ast>,
    pub(crate) context: CheckerContext,
    /// Types of the procedures whose bodies are being checked
    pub(crate) proc_stack: Vec<TypeId>,
    pub(crate) decl_states: FxHashMap<EntityId, DeclState>,
    /// Package scopes by package name, for import resolution
    pub(crate) packages: FxHashMap<String, ScopeId>,
    /// Ids for nodes the checker synthesizes, counting down from the top
    next_synthetic_id: u32,
}

impl<'ast> Checker<'ast> {
    /// Create a checker with a fresh universe.
    pub fn new(arena: &'ast Bump, config: CheckerConfig) -> Self {
        let mut registry = Registry::new(config.type_sizes());
        registry.add_global_string_constant("QUILL_OS", &config.target_os);
        registry.add_global_string_constant("QUILL_ARCH", &config.target_arch);
        let context = CheckerContext::new(registry.universal(), config.bounds_check);
        Self {
            arena,
            config,
            registry,
            diagnostics: Diagnostics::new(),
            info: CheckerInfo::new(),
            context,
            proc_stack: Vec::new(),
            decl_states: FxHashMap::default(),
            packages: FxHashMap::default(),
            next_synthetic_id: u32::MAX,
        }
    }

    /// Register a source file name for diagnostics.
    pub fn add_file(&mut self, name: impl Into<String>) -> FileId {
        self.diagnostics.add_file(name)
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn info(&self) -> &CheckerInfo<'ast> {
        &self.info
    }

    pub fn current_scope(&self) -> ScopeId {
        self.context.scope
    }

    /// Make `scope` the scope subsequent checks resolve names in.
    pub fn set_scope(&mut self, scope: ScopeId) {
        self.context.scope = scope;
    }

    /// Scope of a checked package.
    pub fn package_scope(&self, name: &str) -> Option<ScopeId> {
        self.packages.get(name).copied()
    }

    /// Consume the checker and hand back its results.
    pub fn finish(self) -> CheckOutput<'ast> {
        CheckOutput {
            info: self.info,
            registry: self.registry,
            diagnostics: self.diagnostics,
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    pub(crate) fn error(&mut self, kind: ErrorKind, span: Span, message: impl Into<String>) {
        self.diagnostics.report(CheckError::new(kind, span, message));
    }

    pub(crate) fn report(&mut self, error: CheckError) {
        self.diagnostics.report(error);
    }

    pub(crate) fn type_str(&self, ty: TypeId) -> String {
        self.registry.type_to_string(ty)
    }

    /// Size of `ty` in bytes; a layout cycle is reported and sized as zero.
    pub(crate) fn size_of(&mut self, ty: TypeId) -> i64 {
        match self.registry.size_of(ty) {
            Ok(size) => size,
            Err(err) => {
                self.report(err);
                0
            }
        }
    }

    pub(crate) fn align_of(&mut self, ty: TypeId) -> i64 {
        match self.registry.align_of(ty) {
            Ok(align) => align,
            Err(err) => {
                self.report(err);
                0
            }
        }
    }

    /// A fresh id for a node built by the checker itself.
    pub(crate) fn synthetic_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_synthetic_id);
        self.next_synthetic_id -= 1;
        id
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    /// Open a scope nested in the current one and record it for `node`.
    pub(crate) fn open_scope(&mut self, node: NodeId) -> ScopeId {
        let scope = self.registry.new_scope(Some(self.context.scope));
        self.registry.scope_mut(scope).file = self.context.file;
        self.info.scopes.insert(node, scope);
        self.context.scope = scope;
        scope
    }

    pub(crate) fn close_scope(&mut self) {
        if let Some(parent) = self.registry.scope(self.context.scope).parent {
            self.context.scope = parent;
        }
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Declare `entity` in `scope`, reporting a redeclaration on a clash.
    ///
    /// # Returns
    ///
    /// `false` when the name was already taken.
    pub(crate) fn add_entity(&mut self, scope: ScopeId, ident: Option<Ident<'ast>>, entity: EntityId) -> bool {
        if let Err(prev) = self.registry.insert_entity(scope, entity) {
            let e = self.registry.entity(entity);
            let p = self.registry.entity(prev);
            if p.span == e.span {
                return false;
            }
            let name = e.name.clone();
            let span = e.span;
            let message = match p.using_parent {
                Some(parent) => {
                    let at = self.diagnostics.location(self.registry.entity(parent).span);
                    format!("Redeclaration of `{name}` in this scope through `using`\n\tat {at}")
                }
                None => {
                    let at = self.diagnostics.location(p.span);
                    format!("Redeclaration of `{name}` in this scope\n\tat {at}")
                }
            };
            self.error(ErrorKind::Redeclaration, span, message);
            return false;
        }
        if let Some(ident) = ident {
            self.add_entity_definition(ident, Some(entity));
        }
        true
    }

    pub(crate) fn add_entity_definition(&mut self, ident: Ident<'ast>, entity: Option<EntityId>) {
        self.info.definitions.insert(ident.id, entity);
        if let Some(entity) = entity {
            self.registry.entity_mut(entity).identifier = Some(ident.id);
        }
    }

    /// Record that `node` refers to `entity`.
    pub(crate) fn add_entity_use(&mut self, node: Option<NodeId>, entity: EntityId) {
        if let Some(node) = node {
            self.info.uses.insert(node, entity);
        }
        self.registry.entity_mut(entity).flags |= EntityFlags::USED;
        if let Some(decl) = self.context.decl {
            self.info.decl_mut(decl).deps.insert(entity);
        }
        trace!("use of {entity:?}");
    }

    pub(crate) fn decl_state(&self, entity: EntityId) -> DeclState {
        self.decl_states.get(&entity).copied().unwrap_or_default()
    }

    pub(crate) fn set_decl_state(&mut self, entity: EntityId, state: DeclState) {
        self.decl_states.insert(entity, state);
    }

    /// Whether constant index checks apply at the current statement.
    pub(crate) fn bounds_checking(&self) -> bool {
        !self.context.stmt_state.contains(StmtStateFlags::NO_BOUNDS_CHECK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_registry::Entity;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn target_constants_are_predeclared() {
        init_logging();
        let arena = Bump::new();
        let checker = Checker::new(&arena, CheckerConfig::default().with_target("darwin", "arm64"));
        let reg = checker.registry();
        let os = reg.lookup(reg.universal(), "QUILL_OS").unwrap();
        assert_eq!(reg.entity(os).constant_value().and_then(|v| v.as_str()), Some("darwin"));
    }

    #[test]
    fn redeclaration_reports_previous_location() {
        init_logging();
        let arena = Bump::new();
        let mut checker = Checker::new(&arena, CheckerConfig::default());
        let file = checker.add_file("a.ql");
        let scope = checker.registry.new_scope(Some(checker.registry.universal()));
        let first = checker
            .registry
            .add_entity(Entity::variable("x", Span::new(1, 1, 1).in_file(file), Some(TypeId::INT)));
        let second = checker
            .registry
            .add_entity(Entity::variable("x", Span::new(2, 1, 1).in_file(file), Some(TypeId::INT)));
        assert!(checker.add_entity(scope, None, first));
        assert!(!checker.add_entity(scope, None, second));
        assert!(checker.diagnostics().contains("Redeclaration of `x` in this scope\n\tat a.ql(1:1)"));
    }

    #[test]
    fn scopes_nest_and_unwind() {
        let arena = Bump::new();
        let mut checker = Checker::new(&arena, CheckerConfig::default());
        let outer = checker.current_scope();
        let inner = checker.open_scope(NodeId::new(7));
        assert_eq!(checker.info().scope_of(NodeId::new(7)), Some(inner));
        checker.close_scope();
        assert_eq!(checker.current_scope(), outer);
    }
}
