//! The descriptor-resolver boundary: syntax in, descriptor payloads out.
//!
//! The member cache decides *when* something is resolved and gives the
//! result an identity; a [`DescriptorResolver`] decides *what* a declaration
//! resolves to. [`SyntaxDescriptorResolver`] reads everything straight off
//! the syntax and is what a session uses unless given another resolver.

use crate::base::Name;
use super::descriptors::{
    MemberDescriptor, ResolvedMember, Signature, Type, ValueParameterDescriptor, Visibility,
};
use super::error::ResolveError;
use super::ids::ClassId;
use super::input::{
    ClassDeclaration, EnumEntryDeclaration, FunctionDeclaration, ParameterDeclaration,
    PropertyDeclaration, ValOrVar,
};
use super::member_scope::MemberScope;

/// Which lexical scope a declaration is resolved against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Type parameters and constructor parameters; no members yet.
    ClassHeader,
    /// Function signatures and bodies.
    MemberDeclaration,
    /// Property types and initializers, which also see constructor
    /// parameters.
    PropertyInitializer,
}

/// A resolution scope anchored at a class.
#[derive(Clone, Copy, Debug)]
pub struct ResolutionScope<'s> {
    kind: ScopeKind,
    members: MemberScope<'s>,
}

impl<'s> ResolutionScope<'s> {
    pub(crate) fn new(kind: ScopeKind, members: MemberScope<'s>) -> Self {
        Self { kind, members }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn owner(&self) -> ClassId {
        self.members.class()
    }

    /// The owning class's member scope, for lookups a resolver needs.
    pub fn members(&self) -> MemberScope<'s> {
        self.members
    }
}

/// Turns syntactic declarations into descriptor payloads.
///
/// Every method may call back into the session through the scope it is
/// given; a call that re-enters a resolution in progress fails with
/// [`ResolveError::ReentrantQuery`] instead of recursing.
pub trait DescriptorResolver: Send + Sync {
    fn resolve_function(
        &self,
        scope: ResolutionScope<'_>,
        decl: &FunctionDeclaration,
    ) -> Result<ResolvedMember, ResolveError>;

    fn resolve_property(
        &self,
        scope: ResolutionScope<'_>,
        decl: &PropertyDeclaration,
    ) -> Result<ResolvedMember, ResolveError>;

    /// Value parameters of the primary constructor, one per syntactic
    /// parameter.
    fn resolve_primary_constructor(
        &self,
        header: ResolutionScope<'_>,
        class: &ClassDeclaration,
    ) -> Result<Vec<ValueParameterDescriptor>, ResolveError>;

    fn resolve_constructor_parameter_as_property(
        &self,
        header: ResolutionScope<'_>,
        parameter: &ValueParameterDescriptor,
        syntax: &ParameterDeclaration,
    ) -> Result<ResolvedMember, ResolveError>;

    fn resolve_enum_entry_as_property(
        &self,
        owner: MemberScope<'_>,
        entry: &EnumEntryDeclaration,
        entry_class: Option<ClassId>,
    ) -> Result<ResolvedMember, ResolveError>;

    /// Visibility for a declared member whose visibility is still pending.
    ///
    /// An explicit modifier wins; otherwise an overriding member inherits
    /// the widest visibility among what it overrides; otherwise `Public`.
    fn resolve_unknown_visibility(&self, member: &MemberDescriptor) -> Visibility {
        member
            .declared_visibility()
            .or_else(|| {
                Visibility::most_permissive(
                    member.overridden().iter().filter_map(|m| m.visibility()),
                )
            })
            .unwrap_or(Visibility::Public)
    }
}

/// Resolves descriptors directly from the syntax they were declared with.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyntaxDescriptorResolver;

impl DescriptorResolver for SyntaxDescriptorResolver {
    fn resolve_function(
        &self,
        _scope: ResolutionScope<'_>,
        decl: &FunctionDeclaration,
    ) -> Result<ResolvedMember, ResolveError> {
        Ok(ResolvedMember {
            signature: decl.signature.clone(),
            visibility: decl.visibility,
            mutable: false,
        })
    }

    fn resolve_property(
        &self,
        _scope: ResolutionScope<'_>,
        decl: &PropertyDeclaration,
    ) -> Result<ResolvedMember, ResolveError> {
        Ok(ResolvedMember {
            signature: Signature::property(decl.ty.clone()),
            visibility: decl.visibility,
            mutable: decl.mutable,
        })
    }

    fn resolve_primary_constructor(
        &self,
        _header: ResolutionScope<'_>,
        class: &ClassDeclaration,
    ) -> Result<Vec<ValueParameterDescriptor>, ResolveError> {
        Ok(class
            .primary_constructor_parameters()
            .iter()
            .enumerate()
            .map(|(index, parameter)| ValueParameterDescriptor {
                index,
                name: parameter.name,
                ty: parameter.ty.clone(),
                introduces_property: parameter.introduces_property(),
            })
            .collect())
    }

    fn resolve_constructor_parameter_as_property(
        &self,
        _header: ResolutionScope<'_>,
        parameter: &ValueParameterDescriptor,
        syntax: &ParameterDeclaration,
    ) -> Result<ResolvedMember, ResolveError> {
        Ok(ResolvedMember {
            signature: Signature::property(parameter.ty.clone()),
            visibility: syntax.visibility,
            mutable: syntax.val_or_var == Some(ValOrVar::Var),
        })
    }

    fn resolve_enum_entry_as_property(
        &self,
        owner: MemberScope<'_>,
        _entry: &EnumEntryDeclaration,
        entry_class: Option<ClassId>,
    ) -> Result<ResolvedMember, ResolveError> {
        let type_name: Name = match entry_class {
            Some(class) => owner.session().declaration(class)?.name(),
            None => owner.declaration().name(),
        };
        Ok(ResolvedMember {
            signature: Signature::property(Type::named(&owner.session().names().display(type_name))),
            visibility: Some(Visibility::Public),
            mutable: false,
        })
    }
}
