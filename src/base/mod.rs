//! Foundation types shared by the member resolution layer.
//!
//! - [`FileId`], [`SourceRef`] - Where a declaration lives
//! - [`TextRange`], [`TextSize`] - Source positions
//! - [`Name`], [`Interner`] - Identifier interning
//!
//! This module has NO dependencies on `hir`.

mod intern;
mod source;

pub use intern::{Interner, Name};
pub use source::{FileId, SourceRef};

pub use text_size::{TextRange, TextSize};
