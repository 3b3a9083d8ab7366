//! Identifier interning for member and class names.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::fmt;

/// An interned identifier.
///
/// Member buckets are keyed by `Name`, so equality and hashing must stay
/// O(1). The text lives in the [`Interner`] that produced the handle.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Name(u32);

impl Name {
    /// Name under which constructors are reported.
    ///
    /// Every [`Interner`] reserves index 0 for it.
    pub const INIT: Name = Name(0);

    #[inline]
    const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// `true` for the reserved constructor name.
    #[inline]
    pub const fn is_special(self) -> bool {
        self.0 == Self::INIT.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

/// Deduplicating store for identifier text.
///
/// Reads take a shared lock; only the first sighting of a string takes the
/// write lock.
pub struct Interner {
    inner: RwLock<Table>,
}

#[derive(Default)]
struct Table {
    by_text: FxHashMap<SmolStr, Name>,
    texts: Vec<SmolStr>,
}

impl Table {
    fn insert(&mut self, text: SmolStr) -> Name {
        let name = Name::from_raw(self.texts.len() as u32);
        self.texts.push(text.clone());
        self.by_text.insert(text, name);
        name
    }
}

impl Interner {
    const INIT_TEXT: &'static str = "<init>";

    /// Create an interner holding only the reserved constructor name.
    pub fn new() -> Self {
        let mut table = Table::default();
        table.insert(SmolStr::new_static(Self::INIT_TEXT));
        Self {
            inner: RwLock::new(table),
        }
    }

    /// Intern `text`, returning the existing handle if it was seen before.
    pub fn intern(&self, text: &str) -> Name {
        if let Some(&name) = self.inner.read().by_text.get(text) {
            return name;
        }

        let mut table = self.inner.write();
        // Another caller may have won the race between the two locks.
        if let Some(&name) = table.by_text.get(text) {
            return name;
        }
        table.insert(SmolStr::new(text))
    }

    /// Text for `name`, or `None` if it came from a different interner.
    pub fn lookup(&self, name: Name) -> Option<SmolStr> {
        self.inner.read().texts.get(name.0 as usize).cloned()
    }

    /// Text for `name`, falling back to its debug form for foreign handles.
    ///
    /// Used when rendering diagnostics and log fields, where a foreign
    /// handle must not abort resolution.
    pub fn display(&self, name: Name) -> SmolStr {
        self.lookup(name)
            .unwrap_or_else(|| SmolStr::new(format!("{name:?}")))
    }

    /// Number of interned strings, including the reserved one.
    pub fn len(&self) -> usize {
        self.inner.read().texts.len()
    }

    /// Always `false`: the reserved constructor name is present from the start.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable() {
        let interner = Interner::new();

        let a = interner.intern("foo");
        let b = interner.intern("foo");
        let c = interner.intern("bar");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.len(), 3);
    }

    #[test]
    fn test_init_is_reserved() {
        let interner = Interner::new();

        assert_eq!(interner.intern("<init>"), Name::INIT);
        assert!(Name::INIT.is_special());
        assert!(!interner.intern("init").is_special());
        assert!(!interner.is_empty());
    }

    #[test]
    fn test_display_foreign_name() {
        let small = Interner::new();
        let big = Interner::new();
        let foreign = big.intern("onlyHere");

        assert_eq!(big.display(foreign).as_str(), "onlyHere");
        assert!(small.lookup(foreign).is_none());
        assert_eq!(small.display(foreign).as_str(), "Name(1)");
    }

    #[test]
    fn test_name_size() {
        assert_eq!(std::mem::size_of::<Name>(), 4);
    }
}
