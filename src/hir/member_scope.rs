//! The lazy member scope of one class.
//!
//! Nothing is resolved up front. Each `(kind, name)` pair gets a slot that
//! moves `Unresolved -> InProgress -> Resolved` exactly once; the primary
//! constructor and the all-members listing get one slot each.
//!
//! Locks guard slot transitions only. They are released before calling out
//! to resolvers, relations or other scopes, so a query that loops back to a
//! slot still in progress sees `InProgress` and fails with
//! [`ResolveError::ReentrantQuery`] instead of deadlocking. Any fault poisons
//! the class: later queries return [`ResolveError::Poisoned`].

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use indexmap::IndexSet;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::Name;
use super::constructor;
use super::descriptors::{CallableKind, ConstructorDescriptor, MemberDescriptor, Members};
use super::diagnostics::DiagnosticCollector;
use super::error::{Query, ResolveError};
use super::ids::{ClassId, LocalMemberId, MemberId, NamespaceId};
use super::input::{ClassDeclaration, ClassKind, MemberDeclaration, NestedDeclaration};
use super::overrides::OverrideSynthesizer;
use super::resolver::{ResolutionScope, ScopeKind};
use super::session::{ClassEntry, ResolveSession};

// ============================================================================
// CACHE
// ============================================================================

enum Slot<T> {
    Unresolved,
    InProgress,
    Resolved(T),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Unresolved
    }
}

enum Claim<T> {
    Cached(T),
    Claimed,
    Busy,
}

impl<T: Clone> Slot<T> {
    fn claim(&mut self) -> Claim<T> {
        match self {
            Slot::Resolved(value) => Claim::Cached(value.clone()),
            Slot::InProgress => Claim::Busy,
            Slot::Unresolved => {
                *self = Slot::InProgress;
                Claim::Claimed
            }
        }
    }
}

#[derive(Default)]
struct NameBucket {
    functions: Slot<Members>,
    properties: Slot<Members>,
}

impl NameBucket {
    fn slot(&self, kind: CallableKind) -> &Slot<Members> {
        match kind {
            CallableKind::Function => &self.functions,
            CallableKind::Property => &self.properties,
        }
    }

    fn slot_mut(&mut self, kind: CallableKind) -> &mut Slot<Members> {
        match kind {
            CallableKind::Function => &mut self.functions,
            CallableKind::Property => &mut self.properties,
        }
    }
}

/// Per-class memo tables.
pub(crate) struct MemberCache {
    buckets: RwLock<FxHashMap<Name, NameBucket>>,
    primary_constructor: Mutex<Slot<Option<Arc<ConstructorDescriptor>>>>,
    all_members: Mutex<Slot<Members>>,
    fault: OnceLock<ResolveError>,
    next_member: AtomicU32,
}

impl MemberCache {
    pub(crate) fn new() -> Self {
        Self {
            buckets: RwLock::new(FxHashMap::default()),
            primary_constructor: Mutex::new(Slot::Unresolved),
            all_members: Mutex::new(Slot::Unresolved),
            fault: OnceLock::new(),
            next_member: AtomicU32::new(0),
        }
    }

    fn claim_members(&self, kind: CallableKind, name: Name) -> Claim<Members> {
        // Fast path: read lock
        if let Some(Slot::Resolved(members)) = self.buckets.read().get(&name).map(|b| b.slot(kind)) {
            return Claim::Cached(members.clone());
        }

        // Slow path: write lock, re-check inside `claim`
        let mut buckets = self.buckets.write();
        buckets.entry(name).or_default().slot_mut(kind).claim()
    }

    fn store_members(&self, kind: CallableKind, name: Name, members: Members) {
        *self.buckets.write().entry(name).or_default().slot_mut(kind) = Slot::Resolved(members);
    }

    fn claim_constructor(&self) -> Claim<Option<Arc<ConstructorDescriptor>>> {
        self.primary_constructor.lock().claim()
    }

    fn store_constructor(&self, constructor: Option<Arc<ConstructorDescriptor>>) {
        *self.primary_constructor.lock() = Slot::Resolved(constructor);
    }

    fn claim_all_members(&self) -> Claim<Members> {
        self.all_members.lock().claim()
    }

    fn store_all_members(&self, members: Members) {
        *self.all_members.lock() = Slot::Resolved(members);
    }
}

// ============================================================================
// SCOPE HANDLE
// ============================================================================

/// Borrowed handle on a class's lazily resolved members.
///
/// Obtained from [`ResolveSession::scope`]. Cheap to copy; all state lives
/// in the session.
#[derive(Clone, Copy)]
pub struct MemberScope<'s> {
    session: &'s ResolveSession,
    class: ClassId,
    entry: &'s ClassEntry,
}

impl<'s> MemberScope<'s> {
    pub(crate) fn new(session: &'s ResolveSession, class: ClassId, entry: &'s ClassEntry) -> Self {
        Self {
            session,
            class,
            entry,
        }
    }

    pub fn session(&self) -> &'s ResolveSession {
        self.session
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn declaration(&self) -> &'s ClassDeclaration {
        &self.entry.declaration
    }

    pub fn kind(&self) -> ClassKind {
        self.entry.declaration.kind()
    }

    pub fn class_name(&self) -> SmolStr {
        self.session.names().display(self.entry.declaration.name())
    }

    /// Functions named `name`: declared ones plus fake overrides.
    pub fn functions(&self, name: Name) -> Result<Members, ResolveError> {
        self.members(CallableKind::Function, name)
    }

    /// Properties named `name`: declared ones, those implied by constructor
    /// parameters and enum entries, plus fake overrides.
    pub fn properties(&self, name: Name) -> Result<Members, ResolveError> {
        self.members(CallableKind::Property, name)
    }

    pub fn members(&self, kind: CallableKind, name: Name) -> Result<Members, ResolveError> {
        let _span = tracing::debug_span!(
            "query",
            kind = kind.display(),
            class = %self.class_name(),
            name = %self.session.names().display(name)
        )
        .entered();
        self.check_poisoned()?;

        let members = match self.cache().claim_members(kind, name) {
            Claim::Cached(members) => {
                tracing::trace!(count = members.len(), "cache hit");
                members
            }
            Claim::Busy => {
                let query = match kind {
                    CallableKind::Function => Query::Functions(self.session.names().display(name)),
                    CallableKind::Property => Query::Properties(self.session.names().display(name)),
                };
                return Err(self.poison(ResolveError::ReentrantQuery {
                    class: self.class,
                    query,
                }));
            }
            Claim::Claimed => match self.compute_members(kind, name) {
                Ok(members) => {
                    self.cache().store_members(kind, name, members.clone());
                    members
                }
                Err(err) => return Err(self.poison(err)),
            },
        };

        self.bind_pending_visibility(&members);
        Ok(members)
    }

    /// Every function and property visible in the class.
    pub fn all_members(&self) -> Result<Members, ResolveError> {
        let _span = tracing::debug_span!("query", kind = "all", class = %self.class_name()).entered();
        self.check_poisoned()?;

        match self.cache().claim_all_members() {
            Claim::Cached(members) => {
                tracing::trace!(count = members.len(), "cache hit");
                Ok(members)
            }
            Claim::Busy => Err(self.poison(ResolveError::ReentrantQuery {
                class: self.class,
                query: Query::AllMembers,
            })),
            Claim::Claimed => match self.compute_all_members() {
                Ok(members) => {
                    self.cache().store_all_members(members.clone());
                    Ok(members)
                }
                Err(err) => Err(self.poison(err)),
            },
        }
    }

    /// The primary constructor as a zero- or one-element list.
    pub fn constructors(&self) -> Result<Vec<Arc<ConstructorDescriptor>>, ResolveError> {
        Ok(self.primary_constructor()?.into_iter().collect())
    }

    pub fn primary_constructor(&self) -> Result<Option<Arc<ConstructorDescriptor>>, ResolveError> {
        let _span =
            tracing::debug_span!("query", kind = "constructor", class = %self.class_name()).entered();
        self.check_poisoned()?;

        match self.cache().claim_constructor() {
            Claim::Cached(constructor) => Ok(constructor),
            Claim::Busy => Err(self.poison(ResolveError::ReentrantQuery {
                class: self.class,
                query: Query::PrimaryConstructor,
            })),
            Claim::Claimed => match constructor::resolve_primary_constructor(*self) {
                Ok(constructor) => {
                    self.cache().store_constructor(constructor.clone());
                    Ok(constructor)
                }
                Err(err) => Err(self.poison(err)),
            },
        }
    }

    /// Classes never contain namespaces.
    pub fn namespace(&self, _name: Name) -> Option<NamespaceId> {
        None
    }

    /// The receiver members of this scope are looked up on.
    pub fn implicit_receiver(&self) -> ClassId {
        self.class
    }

    pub fn is_poisoned(&self) -> bool {
        self.cache().fault.get().is_some()
    }

    pub(crate) fn resolution_scope(&self, kind: ScopeKind) -> ResolutionScope<'s> {
        ResolutionScope::new(kind, *self)
    }

    pub(crate) fn allocate_member_id(&self) -> MemberId {
        let local = self.cache().next_member.fetch_add(1, Ordering::Relaxed);
        MemberId::new(self.class, LocalMemberId::new(local))
    }

    fn cache(&self) -> &'s MemberCache {
        &self.entry.cache
    }

    fn check_poisoned(&self) -> Result<(), ResolveError> {
        match self.cache().fault.get() {
            Some(cause) => Err(ResolveError::Poisoned {
                class: self.class,
                cause: Box::new(cause.clone()),
            }),
            None => Ok(()),
        }
    }

    /// Record `err` as this class's fault (the first one wins) and hand it
    /// back to the caller.
    pub(crate) fn poison(&self, err: ResolveError) -> ResolveError {
        if self.cache().fault.set(err.clone()).is_ok() {
            tracing::debug!(class = %self.class_name(), error = %err, "member scope poisoned");
        }
        err
    }

    fn compute_members(&self, kind: CallableKind, name: Name) -> Result<Members, ResolveError> {
        let declaration = self.declaration();
        let resolver = self.session.resolver();
        let mut declared = Vec::new();

        match kind {
            CallableKind::Function => {
                let scope = self.resolution_scope(ScopeKind::MemberDeclaration);
                for decl in declaration.functions_named(name) {
                    let resolved = resolver.resolve_function(scope, decl)?;
                    declared.push(Arc::new(MemberDescriptor::declared(
                        self.allocate_member_id(),
                        name,
                        kind,
                        resolved,
                        decl.source,
                    )));
                }
            }
            CallableKind::Property => {
                let scope = self.resolution_scope(ScopeKind::PropertyInitializer);
                for decl in declaration.properties_named(name) {
                    let resolved = resolver.resolve_property(scope, decl)?;
                    declared.push(Arc::new(MemberDescriptor::declared(
                        self.allocate_member_id(),
                        name,
                        kind,
                        resolved,
                        decl.source,
                    )));
                }
                declared.extend(constructor::derived_properties(*self, name)?);
            }
        }

        let inherited = self.inherited(kind, name)?;

        let class_name = self.class_name();
        let mut reported = DiagnosticCollector::new();
        let merged = OverrideSynthesizer::new(self.class, &class_name, name, kind, self.session.relations())
            .with_supertype_conflicts(self.session.config().report_supertype_conflicts)
            .merge(declared, inherited, &mut reported, || self.allocate_member_id())?;
        self.session.record_diagnostics(reported);

        tracing::trace!(count = merged.len(), "resolved members");
        Ok(merged.into())
    }

    /// Members of `kind` named `name` from every resolvable direct supertype.
    fn inherited(&self, kind: CallableKind, name: Name) -> Result<Vec<Arc<MemberDescriptor>>, ResolveError> {
        let mut inherited = Vec::new();
        for supertype in self.supertype_scopes()? {
            inherited.extend(supertype.members(kind, name)?.iter().cloned());
        }
        Ok(inherited)
    }

    fn supertype_scopes(&self) -> Result<Vec<MemberScope<'s>>, ResolveError> {
        let mut scopes = Vec::new();
        for &supertype in self.declaration().supertypes() {
            match self.session.class_by_name(supertype) {
                Some(id) => scopes.push(self.session.scope(id)?),
                None => tracing::debug!(
                    class = %self.class_name(),
                    supertype = %self.session.names().display(supertype),
                    "unresolved supertype skipped"
                ),
            }
        }
        Ok(scopes)
    }

    fn compute_all_members(&self) -> Result<Members, ResolveError> {
        let declaration = self.declaration();
        let mut wanted: IndexSet<(CallableKind, Name)> = IndexSet::new();

        for member in declaration.member_declarations() {
            let kind = match member {
                MemberDeclaration::Function(_) => CallableKind::Function,
                MemberDeclaration::Property(_) => CallableKind::Property,
            };
            wanted.insert((kind, member.name()));
        }
        if declaration.kind().has_primary_constructor() {
            for parameter in declaration.primary_constructor_parameters() {
                if parameter.introduces_property() {
                    wanted.insert((CallableKind::Property, parameter.name));
                }
            }
        }
        for nested in declaration.nested_declarations() {
            if let NestedDeclaration::EnumEntry(entry) = nested {
                if !entry.has_primary_constructor {
                    wanted.insert((CallableKind::Property, entry.name));
                }
            }
        }
        for supertype in self.supertype_scopes()? {
            for member in supertype.all_members()?.iter() {
                wanted.insert((member.kind(), member.name()));
            }
        }

        let mut all = Vec::new();
        for (kind, name) in wanted {
            all.extend(self.members(kind, name)?.iter().cloned());
        }
        Ok(all.into())
    }

    fn bind_pending_visibility(&self, members: &[Arc<MemberDescriptor>]) {
        if !self.session.config().resolve_visibility {
            return;
        }
        let resolver = self.session.resolver();
        for member in members {
            if !member.is_declared() || member.visibility().is_some() {
                continue;
            }
            let visibility = resolver.resolve_unknown_visibility(member);
            if member.bind_visibility(visibility) {
                tracing::trace!(member = ?member.id(), ?visibility, "bound visibility");
            }
        }
    }
}

impl fmt::Display for MemberScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lazy scope for class {}", self.class_name())
    }
}

impl fmt::Debug for MemberScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberScope").field("class", &self.class).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{FileId, SourceRef, TextRange, TextSize};
    use crate::hir::descriptors::{Signature, Visibility};
    use crate::hir::input::FunctionDeclaration;

    fn src(at: u32) -> SourceRef {
        SourceRef::new(FileId::new(0), TextRange::empty(TextSize::from(at)))
    }

    #[test]
    fn test_display_does_not_resolve() {
        let mut session = ResolveSession::new();
        let name = session.intern("Shape");
        let area = session.intern("area");
        let class = session.add_class(
            ClassDeclaration::new(name, ClassKind::Class, src(0))
                .with_function(FunctionDeclaration::new(area, Signature::of(&[], "Double"), src(10))),
        );
        let scope = session.scope(class).unwrap();

        assert_eq!(scope.to_string(), "lazy scope for class Shape");
        assert!(scope.cache().buckets.read().is_empty());
        assert_eq!(scope.implicit_receiver(), class);
    }

    #[test]
    fn test_ids_are_class_local() {
        let mut session = ResolveSession::new();
        let name = session.intern("Shape");
        let class = session.add_class(ClassDeclaration::new(name, ClassKind::Class, src(0)));
        let scope = session.scope(class).unwrap();

        let first = scope.allocate_member_id();
        let second = scope.allocate_member_id();
        assert_eq!(first.owner, class);
        assert_ne!(first, second);
    }

    #[test]
    fn test_pending_visibility_bound_on_return() {
        let mut session = ResolveSession::new();
        let name = session.intern("Shape");
        let area = session.intern("area");
        let hidden = session.intern("hidden");
        let class = session.add_class(
            ClassDeclaration::new(name, ClassKind::Class, src(0))
                .with_function(FunctionDeclaration::new(area, Signature::of(&[], "Double"), src(10)))
                .with_function(
                    FunctionDeclaration::new(hidden, Signature::of(&[], "Unit"), src(20))
                        .with_visibility(Visibility::Private),
                ),
        );
        let scope = session.scope(class).unwrap();

        assert_eq!(scope.functions(area).unwrap()[0].visibility(), Some(Visibility::Public));
        assert_eq!(scope.functions(hidden).unwrap()[0].visibility(), Some(Visibility::Private));
    }
}
