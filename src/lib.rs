//! # classlike-scope
//!
//! Lazy member resolution for class-like declarations (classes, interfaces,
//! objects, enums, annotations).
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! hir   → Member scopes, override synthesis, constructors
//!   ↓
//! base  → Primitives (FileId, SourceRef, Name interning)
//! ```
//!
//! Members are resolved per name on first request and memoized per class.
//! Inherited members the class does not override are represented by fake
//! overrides; clashing declarations are reported as diagnostics.

/// Foundation types: FileId, SourceRef, Name interning
pub mod base;

/// Member resolution: sessions, scopes, descriptors
pub mod hir;

// Re-export foundation types
pub use base::{FileId, Interner, Name, SourceRef, TextRange, TextSize};

// Re-export the query surface
pub use hir::{ClassId, MemberScope, Members, ResolveError, ResolveSession, SessionConfig};
