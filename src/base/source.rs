//! Source locations of declarations.

use std::fmt;

use text_size::TextRange;

/// Identifier of a source file known to the session.
///
/// The path itself is owned by whoever parsed the file; resolution only
/// needs a cheap handle to tag declarations and diagnostics with.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FileId(pub u32);

impl FileId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// A traceable pointer back to the syntax a descriptor was resolved from.
///
/// Declared members always carry one. Fake overrides never do.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct SourceRef {
    pub file: FileId,
    pub range: TextRange,
}

impl SourceRef {
    #[inline]
    pub const fn new(file: FileId, range: TextRange) -> Self {
        Self { file, range }
    }
}

impl fmt::Debug for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}..{}",
            self.file,
            u32::from(self.range.start()),
            u32::from(self.range.end())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_size::TextSize;

    #[test]
    fn test_source_ref_debug() {
        let range = TextRange::new(TextSize::from(4), TextSize::from(9));
        let source = SourceRef::new(FileId::new(2), range);

        assert_eq!(format!("{source:?}"), "file#2@4..9");
    }

    #[test]
    fn test_file_id_size() {
        assert_eq!(std::mem::size_of::<FileId>(), 4);
    }
}
