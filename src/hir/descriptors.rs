//! Semantic descriptors produced by member resolution.
//!
//! The descriptor variants form a closed set, so they are plain enums
//! ([`CallableKind`], [`Origin`]) rather than a trait hierarchy: the override
//! synthesizer branches on them explicitly.

use std::fmt;
use std::sync::{Arc, OnceLock};

use smol_str::SmolStr;

use crate::base::{Name, SourceRef};
use super::deferred::DeferredValue;
use super::error::ResolveError;
use super::ids::{ClassId, MemberId};
use super::session::ResolveSession;

// ============================================================================
// TYPES & SIGNATURES
// ============================================================================

/// An opaque type reference owned by the type system.
///
/// Member resolution never inspects it beyond equality; comparisons that
/// matter go through [`TypeRelations`](super::TypeRelations).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Type(SmolStr);

impl Type {
    pub fn named(text: &str) -> Self {
        Self(SmolStr::new(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.0)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The part of a callable that overload and override checks look at.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    pub parameters: Vec<Type>,
    pub return_type: Type,
}

impl Signature {
    pub fn new(parameters: Vec<Type>, return_type: Type) -> Self {
        Self {
            parameters,
            return_type,
        }
    }

    /// Shorthand from type names.
    pub fn of(parameters: &[&str], return_type: &str) -> Self {
        Self::new(
            parameters.iter().map(|p| Type::named(p)).collect(),
            Type::named(return_type),
        )
    }

    /// A property's signature: no parameters, its type as the result.
    pub fn property(ty: Type) -> Self {
        Self::new(Vec::new(), ty)
    }
}

/// Declared or derived visibility of a member.
///
/// Ordered from least to most permissive. `Protected` and `Internal` are
/// not strictly comparable; `Internal` is treated as wider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Visibility {
    Private,
    Protected,
    Internal,
    Public,
}

impl Visibility {
    /// Widest visibility among `visibilities`, `None` for an empty input.
    pub fn most_permissive(visibilities: impl IntoIterator<Item = Visibility>) -> Option<Visibility> {
        visibilities.into_iter().max()
    }
}

// ============================================================================
// MEMBER DESCRIPTORS
// ============================================================================

/// Function or property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallableKind {
    Function,
    Property,
}

impl CallableKind {
    pub fn display(self) -> &'static str {
        match self {
            CallableKind::Function => "function",
            CallableKind::Property => "property",
        }
    }
}

/// How a descriptor came to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Written in the owning class body.
    Declared(SourceRef),
    /// Implied by other syntax: a `val`/`var` constructor parameter or an
    /// enum entry.
    Synthesized(Option<SourceRef>),
    /// Stands for one or more inherited members the class does not override.
    FakeOverride,
}

impl Origin {
    pub fn source(&self) -> Option<SourceRef> {
        match *self {
            Origin::Declared(source) => Some(source),
            Origin::Synthesized(source) => source,
            Origin::FakeOverride => None,
        }
    }
}

/// What a [`DescriptorResolver`](super::DescriptorResolver) knows about a
/// member before the owning cache gives it an identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedMember {
    pub signature: Signature,
    /// `None` leaves visibility pending until the member is handed out.
    pub visibility: Option<Visibility>,
    pub mutable: bool,
}

/// A resolved function or property.
pub struct MemberDescriptor {
    id: MemberId,
    name: Name,
    kind: CallableKind,
    origin: Origin,
    signature: Signature,
    mutable: bool,
    declared_visibility: Option<Visibility>,
    visibility: OnceLock<Visibility>,
    overridden: OnceLock<Box<[Arc<MemberDescriptor>]>>,
}

/// Result of a member query. Callers must not rely on element order.
pub type Members = Arc<[Arc<MemberDescriptor>]>;

impl MemberDescriptor {
    pub(crate) fn declared(
        id: MemberId,
        name: Name,
        kind: CallableKind,
        resolved: ResolvedMember,
        source: SourceRef,
    ) -> Self {
        // Declared visibility stays pending until the scope hands it out.
        Self::build(id, name, kind, Origin::Declared(source), resolved, None)
    }

    pub(crate) fn synthesized(
        id: MemberId,
        name: Name,
        kind: CallableKind,
        resolved: ResolvedMember,
        source: Option<SourceRef>,
    ) -> Self {
        let visibility = Some(resolved.visibility.unwrap_or(Visibility::Public));
        Self::build(id, name, kind, Origin::Synthesized(source), resolved, visibility)
    }

    pub(crate) fn fake_override(
        id: MemberId,
        name: Name,
        kind: CallableKind,
        representative: &MemberDescriptor,
        overridden: Vec<Arc<MemberDescriptor>>,
    ) -> Self {
        let visibility = Visibility::most_permissive(
            overridden.iter().filter_map(|member| member.visibility()),
        )
        .unwrap_or(Visibility::Public);
        let mutable = overridden.iter().any(|member| member.mutable);

        let descriptor = Self {
            id,
            name,
            kind,
            origin: Origin::FakeOverride,
            signature: representative.signature.clone(),
            mutable,
            declared_visibility: None,
            visibility: OnceLock::from(visibility),
            overridden: OnceLock::new(),
        };
        descriptor.bind_overridden(overridden);
        descriptor
    }

    fn build(
        id: MemberId,
        name: Name,
        kind: CallableKind,
        origin: Origin,
        resolved: ResolvedMember,
        visibility: Option<Visibility>,
    ) -> Self {
        let bound = OnceLock::new();
        if let Some(visibility) = visibility {
            let _ = bound.set(visibility);
        }
        Self {
            id,
            name,
            kind,
            origin,
            signature: resolved.signature,
            mutable: resolved.mutable,
            declared_visibility: resolved.visibility,
            visibility: bound,
            overridden: OnceLock::new(),
        }
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn name(&self) -> Name {
        self.name
    }

    pub fn owner(&self) -> ClassId {
        self.id.owner
    }

    pub fn kind(&self) -> CallableKind {
        self.kind
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    pub fn is_fake_override(&self) -> bool {
        self.origin == Origin::FakeOverride
    }

    pub fn is_declared(&self) -> bool {
        matches!(self.origin, Origin::Declared(_))
    }

    pub fn source(&self) -> Option<SourceRef> {
        self.origin.source()
    }

    /// Visibility written in syntax, if any.
    pub fn declared_visibility(&self) -> Option<Visibility> {
        self.declared_visibility
    }

    /// Bound visibility; `None` while still pending.
    pub fn visibility(&self) -> Option<Visibility> {
        self.visibility.get().copied()
    }

    /// Supertype members this descriptor overrides (or, for a fake override,
    /// stands for).
    pub fn overridden(&self) -> &[Arc<MemberDescriptor>] {
        self.overridden.get().map(|members| &members[..]).unwrap_or_default()
    }

    /// Returns `false` if a visibility was already bound.
    pub(crate) fn bind_visibility(&self, visibility: Visibility) -> bool {
        self.visibility.set(visibility).is_ok()
    }

    pub(crate) fn bind_overridden(&self, overridden: Vec<Arc<MemberDescriptor>>) {
        if overridden.is_empty() {
            return;
        }
        if self.overridden.set(overridden.into_boxed_slice()).is_err() {
            tracing::trace!(member = ?self.id, "overridden members already bound");
        }
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let overridden: Vec<MemberId> = self.overridden().iter().map(|m| m.id).collect();
        f.debug_struct("MemberDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("origin", &self.origin)
            .field("signature", &self.signature)
            .field("visibility", &self.visibility())
            .field("overridden", &overridden)
            .finish()
    }
}

// ============================================================================
// CONSTRUCTORS
// ============================================================================

/// One value parameter of a primary constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueParameterDescriptor {
    /// Position in the syntactic parameter list.
    pub index: usize,
    pub name: Name,
    pub ty: Type,
    pub introduces_property: bool,
}

/// A class's primary constructor.
pub struct ConstructorDescriptor {
    owner: ClassId,
    value_parameters: Vec<ValueParameterDescriptor>,
    source: Option<SourceRef>,
    synthesized: bool,
    return_type: DeferredValue<Type, ResolveSession>,
}

impl ConstructorDescriptor {
    pub(crate) fn new(
        owner: ClassId,
        value_parameters: Vec<ValueParameterDescriptor>,
        source: Option<SourceRef>,
        return_type: DeferredValue<Type, ResolveSession>,
    ) -> Self {
        Self {
            owner,
            value_parameters,
            source,
            synthesized: false,
            return_type,
        }
    }

    /// The parameterless constructor every object gets.
    pub(crate) fn for_object(
        owner: ClassId,
        source: SourceRef,
        return_type: DeferredValue<Type, ResolveSession>,
    ) -> Self {
        Self {
            synthesized: true,
            ..Self::new(owner, Vec::new(), Some(source), return_type)
        }
    }

    pub fn owner(&self) -> ClassId {
        self.owner
    }

    pub fn name(&self) -> Name {
        Name::INIT
    }

    pub fn value_parameters(&self) -> &[ValueParameterDescriptor] {
        &self.value_parameters
    }

    pub fn source(&self) -> Option<SourceRef> {
        self.source
    }

    /// `true` for object constructors, which have no syntax of their own.
    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    /// The constructed type, forcing the deferred self-type read.
    pub fn return_type(&self, session: &ResolveSession) -> Result<Type, ResolveError> {
        self.return_type.get(session)
    }

    /// The return type if it has already been computed. Never forces.
    pub fn peek_return_type(&self) -> Option<Type> {
        self.return_type.peek()
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Printing must not force the deferred return type.
        f.debug_struct("ConstructorDescriptor")
            .field("owner", &self.owner)
            .field("value_parameters", &self.value_parameters)
            .field("synthesized", &self.synthesized)
            .field("return_type", &self.peek_return_type())
            .finish()
    }
}
