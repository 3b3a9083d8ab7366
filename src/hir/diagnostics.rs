//! Diagnostics: user-facing problems found while resolving members.
//!
//! Only overload conflicts originate here today. They are reported through
//! the [`ConflictSink`] boundary, and [`DiagnosticCollector`] is the sink a
//! [`ResolveSession`](super::ResolveSession) uses unless told otherwise.

use std::sync::Arc;

use crate::base::{FileId, SourceRef};
use super::descriptors::MemberDescriptor;
use super::ids::MemberId;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
}

/// A diagnostic message with location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Where the offending declaration lives, when it has syntax.
    pub source: Option<SourceRef>,
    pub severity: Severity,
    /// Diagnostic code (e.g., "E0101").
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
    /// Members the diagnostic is about, offending one first.
    pub members: Vec<MemberId>,
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug)]
pub struct RelatedInfo {
    pub source: SourceRef,
    pub message: Arc<str>,
}

impl Diagnostic {
    pub fn error(source: Option<SourceRef>, message: impl Into<Arc<str>>) -> Self {
        Self {
            source,
            severity: Severity::Error,
            code: None,
            message: message.into(),
            members: Vec::new(),
            related: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_member(mut self, member: MemberId) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

pub mod codes {
    /// Two members of one class cannot coexist as overloads.
    pub const CONFLICTING_OVERLOADS: &str = "E0101";
}

// ============================================================================
// CONFLICT SINK
// ============================================================================

/// Receives overload conflicts found while merging a class's members.
///
/// Reporting never aborts resolution: both members stay in the result.
pub trait ConflictSink {
    /// `existing` clashes with `new` inside the class displayed as `owner`.
    /// `new` is always a member of that class; `existing` is either an
    /// earlier member of the same class or an inherited one.
    fn report_conflict(&mut self, existing: &MemberDescriptor, new: &MemberDescriptor, owner: &str);
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during member resolution.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn diagnostics_for_file(&self, file: FileId) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.source.is_some_and(|source| source.file == file))
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

impl ConflictSink for DiagnosticCollector {
    fn report_conflict(&mut self, existing: &MemberDescriptor, new: &MemberDescriptor, owner: &str) {
        let mut diag = Diagnostic::error(
            new.source(),
            format!("conflicting overloads: {} in '{}'", new.kind().display(), owner),
        )
        .with_code(codes::CONFLICTING_OVERLOADS)
        .with_member(new.id())
        .with_member(existing.id());

        if let Some(source) = existing.source() {
            diag = diag.with_related(RelatedInfo {
                source,
                message: Arc::from("conflicting declaration"),
            });
        }

        self.add(diag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{Name, TextRange, TextSize};
    use crate::hir::descriptors::{CallableKind, ResolvedMember, Signature};
    use crate::hir::ids::{ClassId, LocalMemberId};

    fn src(file: u32, at: u32) -> SourceRef {
        SourceRef::new(FileId::new(file), TextRange::empty(TextSize::from(at)))
    }

    fn member(local: u32, source: SourceRef) -> MemberDescriptor {
        MemberDescriptor::declared(
            MemberId::new(ClassId::new(0), LocalMemberId::new(local)),
            Name::INIT,
            CallableKind::Function,
            ResolvedMember {
                signature: Signature::of(&[], "Unit"),
                visibility: None,
                mutable: false,
            },
            source,
        )
    }

    #[test]
    fn test_conflict_diagnostic() {
        let mut collector = DiagnosticCollector::new();
        let first = member(0, src(0, 10));
        let second = member(1, src(0, 40));

        collector.report_conflict(&first, &second, "Shape");

        assert_eq!(collector.len(), 1);
        let diag = &collector.diagnostics()[0];
        assert_eq!(diag.code.as_deref(), Some(codes::CONFLICTING_OVERLOADS));
        assert_eq!(diag.source, Some(src(0, 40)));
        assert_eq!(diag.members, vec![second.id(), first.id()]);
        assert_eq!(diag.related[0].source, src(0, 10));
        assert_eq!(&*diag.message, "conflicting overloads: function in 'Shape'");
    }

    #[test]
    fn test_collector_by_file() {
        let mut collector = DiagnosticCollector::new();
        collector.add(Diagnostic::error(Some(src(0, 0)), "file 0"));
        collector.add(Diagnostic::error(Some(src(1, 0)), "file 1"));
        collector.add(Diagnostic::error(None, "nowhere"));

        assert_eq!(collector.diagnostics_for_file(FileId::new(0)).len(), 1);
        assert_eq!(collector.error_count(), 3);
        assert!(collector.has_errors());

        let taken = collector.take();
        assert_eq!(taken.len(), 3);
        assert!(collector.is_empty());
    }
}
