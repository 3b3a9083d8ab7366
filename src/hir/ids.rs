//! Arena identifiers for classes and their members.

use std::fmt;

/// Identifier of a class-like declaration registered in a
/// [`ResolveSession`](super::ResolveSession).
///
/// Classes refer to each other through these ids and the session arena,
/// never through owning pointers, so mutually-referencing hierarchies do not
/// form ownership cycles.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ClassId(pub u32);

impl ClassId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

/// A globally unique identifier for a member descriptor.
///
/// Combines the class that declared or synthesized the member with an id
/// local to that class's cache. Two descriptors are "the same member" iff
/// their ids are equal.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct MemberId {
    /// The class owning this descriptor
    pub owner: ClassId,
    /// Allocation order within the owner's cache
    pub local: LocalMemberId,
}

impl MemberId {
    #[inline]
    pub const fn new(owner: ClassId, local: LocalMemberId) -> Self {
        Self { owner, local }
    }
}

impl fmt::Debug for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberId({}:{})", self.owner.0, self.local.0)
    }
}

/// A class-local member identifier.
///
/// Assigned in resolution order, so the same id may denote different members
/// across sessions that query names in a different order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct LocalMemberId(pub u32);

impl LocalMemberId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for LocalMemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalMemberId({})", self.0)
    }
}

/// Namespace handle. A class member scope never yields one.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NamespaceId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_id_equality() {
        let a = MemberId::new(ClassId::new(1), LocalMemberId::new(0));
        let b = MemberId::new(ClassId::new(1), LocalMemberId::new(0));
        let c = MemberId::new(ClassId::new(1), LocalMemberId::new(1));
        let d = MemberId::new(ClassId::new(2), LocalMemberId::new(0));

        assert_eq!(a, b);
        assert_ne!(a, c); // different local
        assert_ne!(a, d); // different owner
    }

    #[test]
    fn test_member_id_size() {
        assert_eq!(std::mem::size_of::<MemberId>(), 8);
    }
}
