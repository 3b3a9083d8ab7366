//! Internal-consistency faults raised during member resolution.
//!
//! User mistakes (overload conflicts) never show up here; they go to the
//! conflict sink and resolution carries on. Everything in [`ResolveError`]
//! means an upstream collaborator or the hierarchy itself is broken, and the
//! affected class's cache is poisoned.

use std::fmt;

use smol_str::SmolStr;
use thiserror::Error;

use super::descriptors::CallableKind;
use super::ids::{ClassId, MemberId};

/// Which cache entry a re-entrant access hit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    Functions(SmolStr),
    Properties(SmolStr),
    PrimaryConstructor,
    AllMembers,
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Functions(name) => write!(f, "functions `{name}`"),
            Query::Properties(name) => write!(f, "properties `{name}`"),
            Query::PrimaryConstructor => f.write_str("primary constructor"),
            Query::AllMembers => f.write_str("all members"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{query} of {class:?} requested again while it was being resolved")]
    ReentrantQuery { class: ClassId, query: Query },
    #[error("deferred value `{0}` read while it was being computed")]
    DeferredCycle(SmolStr),
    #[error(
        "primary constructor of {class:?} resolved to {descriptors} value parameter(s) but {syntax} were declared"
    )]
    ParameterCountMismatch {
        class: ClassId,
        descriptors: usize,
        syntax: usize,
    },
    #[error("{member:?} reached override resolution without a source declaration")]
    MissingSource { member: MemberId },
    #[error("{member:?} is not a {} descriptor", .expected.display())]
    WrongDescriptorKind {
        member: MemberId,
        expected: CallableKind,
    },
    #[error("{member:?} does not belong to {class:?}")]
    ForeignMember { member: MemberId, class: ClassId },
    #[error("{0:?} is not registered in this session")]
    UnknownClass(ClassId),
    #[error("scope of {class:?} is unusable after an earlier fault: {cause}")]
    Poisoned {
        class: ClassId,
        cause: Box<ResolveError>,
    },
}

impl ResolveError {
    /// The fault at the bottom of a chain of poisoned scopes.
    pub fn root_cause(&self) -> &ResolveError {
        match self {
            ResolveError::Poisoned { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// `true` when the fault signals a dependency cycle rather than a
    /// collaborator disagreeing with syntax.
    pub fn is_cycle(&self) -> bool {
        matches!(
            self.root_cause(),
            ResolveError::ReentrantQuery { .. } | ResolveError::DeferredCycle(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_poison() {
        let cause = ResolveError::ReentrantQuery {
            class: ClassId::new(1),
            query: Query::PrimaryConstructor,
        };
        let outer = ResolveError::Poisoned {
            class: ClassId::new(2),
            cause: Box::new(ResolveError::Poisoned {
                class: ClassId::new(1),
                cause: Box::new(cause.clone()),
            }),
        };

        assert_eq!(outer.root_cause(), &cause);
        assert!(outer.is_cycle());
    }

    #[test]
    fn test_messages() {
        let err = ResolveError::ParameterCountMismatch {
            class: ClassId::new(0),
            descriptors: 1,
            syntax: 2,
        };
        assert_eq!(
            err.to_string(),
            "primary constructor of ClassId(0) resolved to 1 value parameter(s) but 2 were declared"
        );

        let err = ResolveError::ReentrantQuery {
            class: ClassId::new(3),
            query: Query::Functions(SmolStr::new("foo")),
        };
        assert_eq!(
            err.to_string(),
            "functions `foo` of ClassId(3) requested again while it was being resolved"
        );
        assert!(!ResolveError::UnknownClass(ClassId::new(0)).is_cycle());
    }
}
