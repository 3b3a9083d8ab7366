//! Override synthesis: merging declared and inherited members of one name.
//!
//! For a single `(kind, name)` pair the synthesizer partitions the members
//! pulled from supertypes into:
//!
//! 1. **overridden** - some declared member overrides it; it is dropped and
//!    bound into that member's `overridden` list
//! 2. **clashing** - a declared member has the same signature but does not
//!    override it; it is dropped (and optionally reported)
//! 3. **inherited** - grouped by compatible signature, one fake override per
//!    group
//!
//! Declared members of the current class that clash with each other are
//! reported through the [`ConflictSink`] and all kept.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::base::Name;
use super::descriptors::{CallableKind, MemberDescriptor, Origin, Type};
use super::diagnostics::ConflictSink;
use super::error::ResolveError;
use super::ids::{ClassId, MemberId};
use super::member_scope::MemberScope;

/// Relations between members and types, owned by the type system.
pub trait TypeRelations: Send + Sync {
    /// Whether `overriding` overrides `overridden`.
    fn overrides(&self, overriding: &MemberDescriptor, overridden: &MemberDescriptor) -> bool;

    /// Whether `a` and `b` occupy the same overload slot.
    fn same_signature(&self, a: &MemberDescriptor, b: &MemberDescriptor) -> bool;

    /// The class's own default type. Only ever read through a deferred
    /// value, after the class's constructor exists.
    fn self_type(&self, scope: MemberScope<'_>) -> Result<Type, ResolveError> {
        Ok(Type::named(&scope.class_name()))
    }
}

/// Structural relations on [`Signature`](super::Signature)s.
///
/// Same parameter list means same signature; a member overrides another
/// member of a *different* class with the same signature and return type.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralRelations;

impl TypeRelations for StructuralRelations {
    fn overrides(&self, overriding: &MemberDescriptor, overridden: &MemberDescriptor) -> bool {
        overriding.owner() != overridden.owner()
            && self.same_signature(overriding, overridden)
            && overriding.signature().return_type == overridden.signature().return_type
    }

    fn same_signature(&self, a: &MemberDescriptor, b: &MemberDescriptor) -> bool {
        a.kind() == b.kind()
            && a.name() == b.name()
            && a.signature().parameters == b.signature().parameters
    }
}

/// Merges the members of one name and kind for one class.
pub struct OverrideSynthesizer<'a> {
    owner: ClassId,
    owner_name: &'a str,
    name: Name,
    kind: CallableKind,
    relations: &'a dyn TypeRelations,
    report_supertype_conflicts: bool,
}

impl<'a> OverrideSynthesizer<'a> {
    pub fn new(
        owner: ClassId,
        owner_name: &'a str,
        name: Name,
        kind: CallableKind,
        relations: &'a dyn TypeRelations,
    ) -> Self {
        Self {
            owner,
            owner_name,
            name,
            kind,
            relations,
            report_supertype_conflicts: true,
        }
    }

    /// Report inherited members that clash with a declared member without
    /// being overridden by it. They are dropped either way.
    pub fn with_supertype_conflicts(mut self, report: bool) -> Self {
        self.report_supertype_conflicts = report;
        self
    }

    /// Merge `declared` with `inherited`.
    ///
    /// Returns the declared members followed by the synthesized fake
    /// overrides; `alloc` hands out ids for the latter. Declared members
    /// and allocated ids must belong to the owning class.
    pub fn merge(
        &self,
        declared: Vec<Arc<MemberDescriptor>>,
        inherited: Vec<Arc<MemberDescriptor>>,
        sink: &mut dyn ConflictSink,
        mut alloc: impl FnMut() -> MemberId,
    ) -> Result<Vec<Arc<MemberDescriptor>>, ResolveError> {
        for member in &declared {
            self.check_kind(member)?;
            self.check_owned(member.id())?;
            if member.is_fake_override() {
                return Err(ResolveError::MissingSource { member: member.id() });
            }
        }
        let inherited = self.checked_inherited(inherited)?;

        self.report_declared_conflicts(&declared, sink);

        let mut overridden_by: Vec<Vec<Arc<MemberDescriptor>>> = vec![Vec::new(); declared.len()];
        let mut not_overridden = Vec::new();

        for from_super in inherited {
            let mut bound = false;
            for (slot, member) in overridden_by.iter_mut().zip(&declared) {
                if self.relations.overrides(member, &from_super) {
                    slot.push(from_super.clone());
                    bound = true;
                }
            }
            if bound {
                continue;
            }

            let clash = declared
                .iter()
                .find(|member| self.relations.same_signature(member, &from_super));
            if let Some(member) = clash {
                tracing::debug!(
                    owner = self.owner_name,
                    inherited = ?from_super.id(),
                    declared = ?member.id(),
                    "inherited member clashes with a declared member"
                );
                if self.report_supertype_conflicts {
                    sink.report_conflict(&from_super, member, self.owner_name);
                }
                continue;
            }

            not_overridden.push(from_super);
        }

        for (member, overridden) in declared.iter().zip(overridden_by) {
            member.bind_overridden(overridden);
        }

        let mut result = declared;
        for group in self.group_compatible(not_overridden) {
            let id = alloc();
            self.check_owned(id)?;
            let representative = self.most_specific(&group);
            let fake = MemberDescriptor::fake_override(id, self.name, self.kind, &representative, group);
            tracing::trace!(
                owner = self.owner_name,
                member = ?fake.id(),
                overridden = fake.overridden().len(),
                "synthesized fake override"
            );
            result.push(Arc::new(fake));
        }
        Ok(result)
    }

    fn check_kind(&self, member: &MemberDescriptor) -> Result<(), ResolveError> {
        if member.kind() != self.kind {
            return Err(ResolveError::WrongDescriptorKind {
                member: member.id(),
                expected: self.kind,
            });
        }
        Ok(())
    }

    fn check_owned(&self, member: MemberId) -> Result<(), ResolveError> {
        if member.owner != self.owner {
            return Err(ResolveError::ForeignMember {
                member,
                class: self.owner,
            });
        }
        Ok(())
    }

    /// Validate inherited members and drop duplicates reached through more
    /// than one supertype.
    fn checked_inherited(
        &self,
        inherited: Vec<Arc<MemberDescriptor>>,
    ) -> Result<Vec<Arc<MemberDescriptor>>, ResolveError> {
        let mut seen = FxHashSet::default();
        let mut unique = Vec::with_capacity(inherited.len());
        for member in inherited {
            self.check_kind(&member)?;
            if member.origin() != Origin::FakeOverride && member.source().is_none() {
                return Err(ResolveError::MissingSource { member: member.id() });
            }
            if seen.insert(member.id()) {
                unique.push(member);
            }
        }
        Ok(unique)
    }

    /// One report per declared member that clashes with an earlier one.
    fn report_declared_conflicts(&self, declared: &[Arc<MemberDescriptor>], sink: &mut dyn ConflictSink) {
        for (index, later) in declared.iter().enumerate() {
            let earlier = declared[..index].iter().find(|earlier| {
                self.relations.same_signature(earlier, later)
                    && !self.relations.overrides(earlier, later)
                    && !self.relations.overrides(later, earlier)
            });
            if let Some(earlier) = earlier {
                tracing::debug!(
                    owner = self.owner_name,
                    existing = ?earlier.id(),
                    new = ?later.id(),
                    "conflicting overloads"
                );
                sink.report_conflict(earlier, later, self.owner_name);
            }
        }
    }

    /// Maximal groups of mutually compatible members, in first-seen order.
    fn group_compatible(&self, members: Vec<Arc<MemberDescriptor>>) -> Vec<Vec<Arc<MemberDescriptor>>> {
        let mut groups: Vec<Vec<Arc<MemberDescriptor>>> = Vec::new();
        for member in members {
            let home = groups.iter_mut().find(|group| {
                group
                    .iter()
                    .all(|other| self.relations.same_signature(other, &member))
            });
            match home {
                Some(group) => group.push(member),
                None => groups.push(vec![member]),
            }
        }
        groups
    }

    /// A member overriding every other member of the group, else the first.
    fn most_specific(&self, group: &[Arc<MemberDescriptor>]) -> Arc<MemberDescriptor> {
        group
            .iter()
            .find(|candidate| {
                group
                    .iter()
                    .all(|other| Arc::ptr_eq(candidate, other) || self.relations.overrides(candidate, other))
            })
            .unwrap_or(&group[0])
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{FileId, Interner, SourceRef, TextRange, TextSize};
    use crate::hir::descriptors::{ResolvedMember, Signature, Visibility};
    use crate::hir::diagnostics::DiagnosticCollector;
    use crate::hir::ids::LocalMemberId;

    struct Fixture {
        names: Interner,
        next: u32,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                names: Interner::new(),
                next: 0,
            }
        }

        fn id(&mut self, owner: u32) -> MemberId {
            self.next += 1;
            MemberId::new(ClassId::new(owner), LocalMemberId::new(self.next))
        }

        fn function(&mut self, owner: u32, name: &str, params: &[&str], ret: &str) -> Arc<MemberDescriptor> {
            let id = self.id(owner);
            let member = MemberDescriptor::declared(
                id,
                self.names.intern(name),
                CallableKind::Function,
                ResolvedMember {
                    signature: Signature::of(params, ret),
                    visibility: None,
                    mutable: false,
                },
                SourceRef::new(FileId::new(owner), TextRange::empty(TextSize::from(self.next))),
            );
            member.bind_visibility(Visibility::Public);
            Arc::new(member)
        }
    }

    fn synthesizer<'a>(names: &Interner, relations: &'a StructuralRelations) -> OverrideSynthesizer<'a> {
        OverrideSynthesizer::new(ClassId::new(0), "C", names.intern("m"), CallableKind::Function, relations)
    }

    #[test]
    fn test_declared_overrides_inherited() {
        let mut fx = Fixture::new();
        let relations = StructuralRelations;
        let declared = fx.function(0, "m", &["Int"], "Unit");
        let inherited = fx.function(1, "m", &["Int"], "Unit");
        let mut sink = DiagnosticCollector::new();
        let mut local = 100;

        let merged = synthesizer(&fx.names, &relations)
            .merge(vec![declared.clone()], vec![inherited.clone()], &mut sink, || {
                local += 1;
                MemberId::new(ClassId::new(0), LocalMemberId::new(local))
            })
            .unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id(), declared.id());
        assert_eq!(declared.overridden()[0].id(), inherited.id());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_one_fake_override_per_compatible_group() {
        let mut fx = Fixture::new();
        let relations = StructuralRelations;
        let from_a = fx.function(1, "m", &["Int"], "Unit");
        let from_b = fx.function(2, "m", &["Int"], "Unit");
        let other = fx.function(2, "m", &["String"], "Unit");
        let mut sink = DiagnosticCollector::new();
        let mut local = 100;

        let merged = synthesizer(&fx.names, &relations)
            .merge(
                Vec::new(),
                vec![from_a.clone(), from_b.clone(), other.clone(), from_a.clone()],
                &mut sink,
                || {
                    local += 1;
                    MemberId::new(ClassId::new(0), LocalMemberId::new(local))
                },
            )
            .unwrap();

        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|m| m.is_fake_override() && m.owner() == ClassId::new(0)));
        let ids: Vec<_> = merged[0].overridden().iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec![from_a.id(), from_b.id()]);
        assert_eq!(merged[1].overridden()[0].id(), other.id());
    }

    #[test]
    fn test_declared_conflict_reported_once() {
        let mut fx = Fixture::new();
        let relations = StructuralRelations;
        let first = fx.function(0, "m", &["Int"], "Int");
        let second = fx.function(0, "m", &["Int"], "String");
        let unrelated = fx.function(0, "m", &["Long"], "Int");
        let mut sink = DiagnosticCollector::new();

        let merged = synthesizer(&fx.names, &relations)
            .merge(
                vec![first.clone(), second.clone(), unrelated],
                Vec::new(),
                &mut sink,
                || unreachable!("no fake overrides expected"),
            )
            .unwrap();

        assert_eq!(merged.len(), 3);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.diagnostics()[0].members, vec![second.id(), first.id()]);
    }

    #[test]
    fn test_supertype_clash_is_dropped() {
        let mut fx = Fixture::new();
        let relations = StructuralRelations;
        let declared = fx.function(0, "m", &["Int"], "Int");
        let inherited = fx.function(1, "m", &["Int"], "String");

        let mut reported = DiagnosticCollector::new();
        let merged = synthesizer(&fx.names, &relations)
            .merge(vec![declared.clone()], vec![inherited.clone()], &mut reported, || {
                unreachable!("clashing members are not fake-overridden")
            })
            .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(reported.len(), 1);

        let mut silent = DiagnosticCollector::new();
        let merged = synthesizer(&fx.names, &relations)
            .with_supertype_conflicts(false)
            .merge(vec![declared], vec![inherited], &mut silent, || {
                unreachable!("clashing members are not fake-overridden")
            })
            .unwrap();
        assert_eq!(merged.len(), 1);
        assert!(silent.is_empty());
    }

    #[test]
    fn test_sourceless_inherited_member_is_a_fault() {
        let mut fx = Fixture::new();
        let relations = StructuralRelations;
        let id = fx.id(1);
        let orphan = Arc::new(MemberDescriptor::synthesized(
            id,
            fx.names.intern("m"),
            CallableKind::Function,
            ResolvedMember {
                signature: Signature::of(&[], "Unit"),
                visibility: None,
                mutable: false,
            },
            None,
        ));
        let mut sink = DiagnosticCollector::new();

        let err = synthesizer(&fx.names, &relations)
            .merge(Vec::new(), vec![orphan], &mut sink, || unreachable!())
            .unwrap_err();

        assert_eq!(err, ResolveError::MissingSource { member: id });
    }

    #[test]
    fn test_wrong_kind_is_a_fault() {
        let mut fx = Fixture::new();
        let relations = StructuralRelations;
        let function = fx.function(1, "m", &[], "Unit");
        let mut sink = DiagnosticCollector::new();

        let err = OverrideSynthesizer::new(
            ClassId::new(0),
            "C",
            fx.names.intern("m"),
            CallableKind::Property,
            &relations,
        )
        .merge(Vec::new(), vec![function.clone()], &mut sink, || unreachable!())
        .unwrap_err();

        assert_eq!(
            err,
            ResolveError::WrongDescriptorKind {
                member: function.id(),
                expected: CallableKind::Property,
            }
        );
    }

    #[test]
    fn test_fake_override_ids_stay_with_owner() {
        let mut fx = Fixture::new();
        let relations = StructuralRelations;
        let inherited = fx.function(1, "m", &[], "Unit");
        let stray = MemberId::new(ClassId::new(5), LocalMemberId::new(0));
        let mut sink = DiagnosticCollector::new();

        let err = synthesizer(&fx.names, &relations)
            .merge(Vec::new(), vec![inherited], &mut sink, || stray)
            .unwrap_err();

        assert_eq!(
            err,
            ResolveError::ForeignMember {
                member: stray,
                class: ClassId::new(0),
            }
        );
    }

    #[test]
    fn test_declared_member_of_other_class_is_a_fault() {
        let mut fx = Fixture::new();
        let relations = StructuralRelations;
        let borrowed = fx.function(3, "m", &[], "Unit");
        let mut sink = DiagnosticCollector::new();

        let err = synthesizer(&fx.names, &relations)
            .merge(vec![borrowed.clone()], Vec::new(), &mut sink, || unreachable!())
            .unwrap_err();

        assert_eq!(
            err,
            ResolveError::ForeignMember {
                member: borrowed.id(),
                class: ClassId::new(0),
            }
        );
    }
}
