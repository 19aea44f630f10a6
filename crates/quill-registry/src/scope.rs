//! Scopes and name lookup.
//!
//! Scopes form a tree owned top-down: a parent owns its children, and every
//! other edge (`parent`, `shared`, `imported`, an entity's declaring scope) is
//! a non-owning handle.

use log::trace;
use quill_core::FileId;
use rustc_hash::FxHashMap;

use crate::entity::EntityKind;
use crate::ids::{EntityId, ScopeId};
use crate::registry::Registry;

/// A lexical scope.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Name to entities; more than one only for overloaded procedures
    pub elements: FxHashMap<String, Vec<EntityId>>,
    /// Entities in insertion order
    pub order: Vec<EntityId>,
    /// Sibling file scopes of the same package
    pub shared: Vec<ScopeId>,
    /// Package scopes imported by this file
    pub imported: Vec<ScopeId>,
    /// Procedure body scope; lookups leaving it hide local variables
    pub is_proc: bool,
    /// Universe or package level; procedures may not overload here
    pub is_global: bool,
    pub is_file: bool,
    /// File of the initial package
    pub is_init: bool,
    pub file: Option<FileId>,
}

impl Scope {
    /// The first entity declared under `name` directly in this scope.
    pub fn get(&self, name: &str) -> Option<EntityId> {
        self.elements.get(name).and_then(|v| v.first().copied())
    }

    /// Every entity declared under `name` directly in this scope.
    pub fn get_all(&self, name: &str) -> &[EntityId] {
        self.elements.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Registry {
    // ========================================================================
    // Scope construction
    // ========================================================================

    /// Create a scope nested in `parent`.
    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            ..Scope::default()
        });
        if let Some(parent) = parent {
            self.scopes[parent.index()].children.push(id);
        }
        id
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Insert `entity` into `scope`.
    ///
    /// Two procedures of the same name may coexist in a non-global scope and
    /// form an overload set. Any other clash returns the previously declared
    /// entity as the error and leaves the scope unchanged. The blank
    /// identifier is never inserted.
    pub fn insert_entity(&mut self, scope: ScopeId, entity: EntityId) -> Result<(), EntityId> {
        let name = self.entities[entity.index()].name.clone();
        if name == "_" {
            return Ok(());
        }
        let is_proc = self.entities[entity.index()].is_procedure();
        let s = &self.scopes[scope.index()];
        if let Some(&prev) = s.elements.get(&name).and_then(|v| v.first()) {
            let prev_is_proc = self.entities[prev.index()].is_procedure();
            if !prev_is_proc || !is_proc || s.is_global {
                return Err(prev);
            }
        }

        trace!("insert `{name}` into {scope:?}");
        let s = &mut self.scopes[scope.index()];
        s.elements.entry(name).or_default().push(entity);
        s.order.push(entity);
        let e = &mut self.entities[entity.index()];
        if e.scope.is_none() {
            e.scope = Some(scope);
        }
        Ok(())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Look `name` up from `scope` outwards.
    ///
    /// Leaving a procedure scope hides the variables of enclosing procedures.
    /// At every non-procedure scope the `shared` sibling scopes are also
    /// searched, but only for entities declared directly in them, so imports
    /// are never re-exported. Returns the scope the entity was found in.
    pub fn lookup_parent(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, EntityId)> {
        let mut gone_thru_proc = false;
        let mut gone_thru_file = false;
        let mut current = Some(scope);
        while let Some(sid) = current {
            let s = &self.scopes[sid.index()];
            if let Some(found) = s.get(name) {
                let e = &self.entities[found.index()];
                let hidden = gone_thru_proc
                    && match e.kind {
                        EntityKind::Label => true,
                        EntityKind::Variable { .. } => e.scope.is_some_and(|es| {
                            let es = &self.scopes[es.index()];
                            !es.is_file && !es.is_global
                        }),
                        _ => false,
                    };
                if !hidden {
                    return Some((sid, found));
                }
            }

            if s.is_proc {
                gone_thru_proc = true;
            } else {
                for &shared in &s.shared {
                    let Some(found) = self.scopes[shared.index()].get(name) else {
                        continue;
                    };
                    let e = &self.entities[found.index()];
                    if e.scope != Some(shared) {
                        continue;
                    }
                    if let EntityKind::Variable { .. } = e.kind {
                        let es = &self.scopes[shared.index()];
                        if !es.is_file && !es.is_global {
                            continue;
                        }
                    }
                    if gone_thru_file
                        && matches!(e.kind, EntityKind::ImportName { .. } | EntityKind::LibraryName { .. })
                    {
                        continue;
                    }
                    return Some((shared, found));
                }
            }

            if s.is_file {
                gone_thru_file = true;
            }
            current = s.parent;
        }
        None
    }

    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<EntityId> {
        self.lookup_parent(scope, name).map(|(_, e)| e)
    }

    /// Look `name` up in `scope` only, ignoring parents and shared scopes.
    pub fn lookup_current(&self, scope: ScopeId, name: &str) -> Option<EntityId> {
        self.scopes[scope.index()].get(name)
    }

    /// Look `name` up in an imported package: the package scope itself, then
    /// entities declared directly in its file scopes.
    pub fn lookup_in_package(&self, package: ScopeId, name: &str) -> Option<EntityId> {
        let s = &self.scopes[package.index()];
        if let Some(found) = s.get(name) {
            return Some(found);
        }
        s.shared.iter().find_map(|&shared| {
            self.scopes[shared.index()]
                .get(name)
                .filter(|e| self.entities[e.index()].scope == Some(shared))
        })
    }

    /// Nearest enclosing procedure scope, if any.
    pub fn enclosing_proc_scope(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(sid) = current {
            let s = &self.scopes[sid.index()];
            if s.is_proc {
                return Some(sid);
            }
            current = s.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use quill_core::{ExactValue, Span};

    use crate::entity::Entity;
    use crate::ids::TypeId;
    use crate::layout::TypeSizes;
    use crate::registry::Registry;

    fn registry() -> Registry {
        Registry::new(TypeSizes::default())
    }

    #[test]
    fn redeclaration_is_rejected() {
        let mut reg = registry();
        let scope = reg.new_scope(Some(reg.universal()));
        let a = reg.add_entity(Entity::variable("x", Span::new(1, 1, 1), Some(TypeId::INT)));
        let b = reg.add_entity(Entity::variable("x", Span::new(2, 1, 1), Some(TypeId::INT)));
        assert!(reg.insert_entity(scope, a).is_ok());
        assert_eq!(reg.insert_entity(scope, b), Err(a));
        assert_eq!(reg.lookup(scope, "x"), Some(a));
    }

    #[test]
    fn local_procedures_overload_but_global_ones_do_not() {
        let mut reg = registry();
        let local = reg.new_scope(Some(reg.universal()));
        let p1 = reg.add_entity(Entity::procedure("f", Span::default(), None));
        let p2 = reg.add_entity(Entity::procedure("f", Span::default(), None));
        assert!(reg.insert_entity(local, p1).is_ok());
        assert!(reg.insert_entity(local, p2).is_ok());
        assert_eq!(reg.scope(local).get_all("f").len(), 2);

        let global = reg.new_scope(Some(reg.universal()));
        reg.scope_mut(global).is_global = true;
        let p3 = reg.add_entity(Entity::procedure("g", Span::default(), None));
        let p4 = reg.add_entity(Entity::procedure("g", Span::default(), None));
        assert!(reg.insert_entity(global, p3).is_ok());
        assert_eq!(reg.insert_entity(global, p4), Err(p3));
    }

    #[test]
    fn blank_is_never_inserted() {
        let mut reg = registry();
        let scope = reg.new_scope(None);
        let blank = reg.add_entity(Entity::variable("_", Span::default(), None));
        assert!(reg.insert_entity(scope, blank).is_ok());
        assert!(reg.lookup(scope, "_").is_none());
    }

    #[test]
    fn procedure_boundary_hides_outer_locals() {
        let mut reg = registry();
        let file = reg.new_scope(Some(reg.universal()));
        reg.scope_mut(file).is_file = true;
        let outer_proc = reg.new_scope(Some(file));
        reg.scope_mut(outer_proc).is_proc = true;
        let inner_proc = reg.new_scope(Some(outer_proc));
        reg.scope_mut(inner_proc).is_proc = true;

        let local = reg.add_entity(Entity::variable("v", Span::default(), Some(TypeId::INT)));
        reg.insert_entity(outer_proc, local).unwrap();
        let global = reg.add_entity(Entity::variable("g", Span::default(), Some(TypeId::INT)));
        reg.insert_entity(file, global).unwrap();
        let konst = reg.add_entity(Entity::constant("K", Span::default(), Some(TypeId::UNTYPED_INTEGER), ExactValue::Integer(1)));
        reg.insert_entity(outer_proc, konst).unwrap();

        assert_eq!(reg.lookup(outer_proc, "v"), Some(local));
        assert_eq!(reg.lookup(inner_proc, "v"), None);
        assert_eq!(reg.lookup(inner_proc, "g"), Some(global));
        assert_eq!(reg.lookup(inner_proc, "K"), Some(konst));
    }

    #[test]
    fn shared_scopes_expose_only_direct_entities() {
        let mut reg = registry();
        let universal = reg.universal();
        let a = reg.new_scope(Some(universal));
        let b = reg.new_scope(Some(universal));
        reg.scope_mut(a).is_file = true;
        reg.scope_mut(b).is_file = true;
        reg.scope_mut(a).shared.push(b);

        let direct = reg.add_entity(Entity::constant("D", Span::default(), Some(TypeId::INT), ExactValue::Integer(1)));
        reg.insert_entity(b, direct).unwrap();

        let elsewhere = reg.new_scope(None);
        let reexported = reg.add_entity(Entity::constant("R", Span::default(), Some(TypeId::INT), ExactValue::Integer(2)));
        reg.insert_entity(elsewhere, reexported).unwrap();
        reg.insert_entity(b, reexported).unwrap();

        assert_eq!(reg.lookup(a, "D"), Some(direct));
        assert_eq!(reg.lookup(a, "R"), None);
        assert_eq!(reg.lookup(b, "R"), Some(reexported));
    }

    #[test]
    fn universe_is_visible_everywhere() {
        let mut reg = registry();
        let scope = reg.new_scope(Some(reg.universal()));
        assert!(reg.lookup(scope, "int").is_some());
        assert!(reg.lookup(scope, "true").is_some());
        assert!(reg.lookup(scope, "len").is_some());
    }
}
