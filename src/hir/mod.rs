//! High-level IR: lazily resolved members of class-like declarations.
//!
//! ## Layering
//!
//! ```text
//! session       → class arena, collaborators, config
//!   ↓
//! member_scope  → per-class memo tables, query entry points
//!   ↓
//! overrides     → declared/inherited merge, fake overrides, conflicts
//! constructor   → primary constructors, derived properties
//!   ↓
//! descriptors   → resolved members and constructors
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use classlike::hir::{ClassDeclaration, ClassKind, ResolveSession};
//!
//! let mut session = ResolveSession::new();
//! let shape = session.intern("Shape");
//! let class = session.add_class(ClassDeclaration::new(shape, ClassKind::Class, source));
//!
//! let scope = session.scope(class)?;
//! let area = scope.functions(session.intern("area"))?;
//! ```

mod constructor;
mod deferred;
mod descriptors;
mod diagnostics;
mod error;
mod ids;
mod input;
mod member_scope;
mod overrides;
mod resolver;
mod session;

pub use deferred::DeferredValue;
pub use descriptors::{
    CallableKind, ConstructorDescriptor, MemberDescriptor, Members, Origin, ResolvedMember,
    Signature, Type, ValueParameterDescriptor, Visibility,
};
pub use diagnostics::{codes, ConflictSink, Diagnostic, DiagnosticCollector, RelatedInfo, Severity};
pub use error::{Query, ResolveError};
pub use ids::{ClassId, LocalMemberId, MemberId, NamespaceId};
pub use input::{
    ClassDeclaration, ClassKind, ClassLikeInfo, EnumEntryDeclaration, FunctionDeclaration,
    MemberDeclaration, NestedDeclaration, ParameterDeclaration, PropertyDeclaration, ValOrVar,
};
pub use member_scope::MemberScope;
pub use overrides::{OverrideSynthesizer, StructuralRelations, TypeRelations};
pub use resolver::{DescriptorResolver, ResolutionScope, ScopeKind, SyntaxDescriptorResolver};
pub use session::{ResolveSession, SessionConfig};
