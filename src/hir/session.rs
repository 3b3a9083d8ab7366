//! The resolve session: class arena, collaborators and configuration.
//!
//! A session owns every registered [`ClassDeclaration`] together with its
//! member cache. Classes name their supertypes; the session's name registry
//! turns those names into [`ClassId`]s at query time, so hierarchies are
//! walked by id and never form ownership cycles.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::base::{Interner, Name};
use super::diagnostics::{Diagnostic, DiagnosticCollector};
use super::error::ResolveError;
use super::ids::ClassId;
use super::input::ClassDeclaration;
use super::member_scope::{MemberCache, MemberScope};
use super::overrides::{StructuralRelations, TypeRelations};
use super::resolver::{DescriptorResolver, SyntaxDescriptorResolver};

/// Knobs for member resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Report inherited members that clash with a declared member without
    /// being overridden by it.
    pub report_supertype_conflicts: bool,
    /// Bind pending visibilities of declared members before handing them out.
    pub resolve_visibility: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            report_supertype_conflicts: true,
            resolve_visibility: true,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_supertype_conflicts(mut self, report: bool) -> Self {
        self.report_supertype_conflicts = report;
        self
    }

    pub fn with_visibility_resolution(mut self, resolve: bool) -> Self {
        self.resolve_visibility = resolve;
        self
    }
}

pub(crate) struct ClassEntry {
    pub(crate) declaration: ClassDeclaration,
    pub(crate) cache: MemberCache,
}

/// Owns classes, their caches, and the collaborators resolution calls into.
///
/// Use a session from one thread at a time. A query that finds a slot
/// another thread is still resolving treats it as re-entry and poisons the
/// class.
pub struct ResolveSession {
    names: Interner,
    classes: Vec<ClassEntry>,
    by_name: FxHashMap<Name, ClassId>,
    resolver: Box<dyn DescriptorResolver>,
    relations: Box<dyn TypeRelations>,
    diagnostics: Mutex<DiagnosticCollector>,
    config: SessionConfig,
}

impl Default for ResolveSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolveSession {
    /// A session using [`SyntaxDescriptorResolver`] and [`StructuralRelations`].
    pub fn new() -> Self {
        Self {
            names: Interner::new(),
            classes: Vec::new(),
            by_name: FxHashMap::default(),
            resolver: Box::new(SyntaxDescriptorResolver),
            relations: Box::new(StructuralRelations),
            diagnostics: Mutex::new(DiagnosticCollector::new()),
            config: SessionConfig::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: impl DescriptorResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_relations(mut self, relations: impl TypeRelations + 'static) -> Self {
        self.relations = Box::new(relations);
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn intern(&self, text: &str) -> Name {
        self.names.intern(text)
    }

    pub fn names(&self) -> &Interner {
        &self.names
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn resolver(&self) -> &dyn DescriptorResolver {
        &*self.resolver
    }

    pub fn relations(&self) -> &dyn TypeRelations {
        &*self.relations
    }

    /// Register a class. The first class registered under a name is the one
    /// supertype lookups find.
    pub fn add_class(&mut self, declaration: ClassDeclaration) -> ClassId {
        let id = ClassId::new(self.classes.len() as u32);
        let name = declaration.name();
        if self.by_name.contains_key(&name) {
            tracing::debug!(
                class = %self.names.display(name),
                ?id,
                "class name already registered; supertype lookups keep the first"
            );
        } else {
            self.by_name.insert(name, id);
        }
        self.classes.push(ClassEntry {
            declaration,
            cache: MemberCache::new(),
        });
        id
    }

    pub fn class_by_name(&self, name: Name) -> Option<ClassId> {
        self.by_name.get(&name).copied()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn declaration(&self, class: ClassId) -> Result<&ClassDeclaration, ResolveError> {
        self.entry(class).map(|entry| &entry.declaration)
    }

    /// The lazy member scope of `class`.
    pub fn scope(&self, class: ClassId) -> Result<MemberScope<'_>, ResolveError> {
        let entry = self.entry(class)?;
        Ok(MemberScope::new(self, class, entry))
    }

    /// Diagnostics reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().diagnostics().to_vec()
    }

    /// Take all diagnostics reported so far.
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().take()
    }

    pub(crate) fn record_diagnostics(&self, mut reported: DiagnosticCollector) {
        if reported.is_empty() {
            return;
        }
        let mut diagnostics = self.diagnostics.lock();
        for diagnostic in reported.take() {
            diagnostics.add(diagnostic);
        }
    }

    fn entry(&self, class: ClassId) -> Result<&ClassEntry, ResolveError> {
        self.classes
            .get(class.index() as usize)
            .ok_or(ResolveError::UnknownClass(class))
    }
}
