//! Primary constructors and the properties they (and enum entries) imply.

use std::sync::Arc;

use crate::base::Name;
use super::deferred::DeferredValue;
use super::descriptors::{CallableKind, ConstructorDescriptor, MemberDescriptor, Type};
use super::error::ResolveError;
use super::ids::ClassId;
use super::input::{ClassKind, NestedDeclaration};
use super::member_scope::MemberScope;
use super::resolver::ScopeKind;
use super::session::ResolveSession;

/// Build the primary constructor of `scope`'s class, if its kind has one.
///
/// The constructor's return type is a deferred self-type read and is not
/// forced here.
pub(crate) fn resolve_primary_constructor(
    scope: MemberScope<'_>,
) -> Result<Option<Arc<ConstructorDescriptor>>, ResolveError> {
    let class = scope.declaration();
    let info = class.owner_info();
    if !info.kind.has_primary_constructor() {
        return Ok(None);
    }

    let return_type = deferred_self_type(scope.class(), &scope.class_name());
    let constructor = if info.kind == ClassKind::Object {
        ConstructorDescriptor::for_object(scope.class(), info.source, return_type)
    } else {
        let header = scope.resolution_scope(ScopeKind::ClassHeader);
        let parameters = scope
            .session()
            .resolver()
            .resolve_primary_constructor(header, class)?;
        let syntax = class.primary_constructor_parameters().len();
        if parameters.len() != syntax {
            return Err(ResolveError::ParameterCountMismatch {
                class: scope.class(),
                descriptors: parameters.len(),
                syntax,
            });
        }
        ConstructorDescriptor::new(scope.class(), parameters, Some(info.source), return_type)
    };

    tracing::trace!(
        class = ?scope.class(),
        parameters = constructor.value_parameters().len(),
        synthesized = constructor.is_synthesized(),
        "resolved primary constructor"
    );
    Ok(Some(Arc::new(constructor)))
}

/// The class's self type, read on first use. Any failure, including a
/// self-type computation that reads this value again, poisons the class.
fn deferred_self_type(class: ClassId, class_name: &str) -> DeferredValue<Type, ResolveSession> {
    DeferredValue::new(
        format!("self type of {class_name}"),
        move |session: &ResolveSession| {
            let scope = session.scope(class)?;
            session
                .relations()
                .self_type(scope)
                .map_err(|err| scope.poison(err))
        },
    )
}

/// Properties named `name` implied by syntax other than property
/// declarations: `val`/`var` constructor parameters and enum entries.
pub(crate) fn derived_properties(
    scope: MemberScope<'_>,
    name: Name,
) -> Result<Vec<Arc<MemberDescriptor>>, ResolveError> {
    let class = scope.declaration();
    let resolver = scope.session().resolver();
    let mut derived = Vec::new();

    let wants_parameter = class
        .primary_constructor_parameters()
        .iter()
        .any(|p| p.name == name && p.introduces_property());
    let constructor = if wants_parameter { scope.primary_constructor()? } else { None };
    if let Some(constructor) = constructor {
        let syntax = class.primary_constructor_parameters();
        for parameter in constructor.value_parameters() {
            let Some(parameter_syntax) = syntax.get(parameter.index) else {
                return Err(ResolveError::ParameterCountMismatch {
                    class: scope.class(),
                    descriptors: constructor.value_parameters().len(),
                    syntax: syntax.len(),
                });
            };
            if parameter_syntax.name != name || !parameter_syntax.introduces_property() {
                continue;
            }
            let header = scope.resolution_scope(ScopeKind::ClassHeader);
            let resolved =
                resolver.resolve_constructor_parameter_as_property(header, parameter, parameter_syntax)?;
            derived.push(Arc::new(MemberDescriptor::synthesized(
                scope.allocate_member_id(),
                name,
                CallableKind::Property,
                resolved,
                Some(parameter_syntax.source),
            )));
        }
    }

    // Entries with their own primary constructor contribute no property.
    let entry = match class.class_or_object_declaration(name) {
        Some(NestedDeclaration::EnumEntry(entry)) if !entry.has_primary_constructor => Some(entry),
        _ => None,
    };
    if let Some(entry) = entry {
        let resolved = resolver.resolve_enum_entry_as_property(scope, entry, entry.class)?;
        derived.push(Arc::new(MemberDescriptor::synthesized(
            scope.allocate_member_id(),
            name,
            CallableKind::Property,
            resolved,
            Some(entry.source),
        )));
    }

    Ok(derived)
}
