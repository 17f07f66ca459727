//! Core infrastructure for sharpdom.
//!
//! This crate holds the language-agnostic pieces shared by the syntax layer
//! and the model layer:
//!
//! - [`error`]: the `DomError` taxonomy, `ResolveError` and CLI exit codes
//! - [`types`]: spans, access modifiers and resolved symbols
//! - [`annotation`]: public annotations carried in `//[[ ... ]]` comments
//! - [`text`]: byte offset and line:column conversions

pub mod annotation;
pub mod error;
pub mod text;
pub mod types;

pub use annotation::{AnnotationList, AnnotationValue, PublicAnnotation};
pub use error::{DomError, OutputErrorCode, ResolveError};
pub use types::{AccessModifier, Span, Symbol, SymbolKind};
