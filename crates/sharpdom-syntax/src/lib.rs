// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A C# subset parser and Concrete Syntax Tree (CST) library.
//!
//! This crate is the syntax layer under the sharpdom model. It provides:
//!
//! - **Parsing**: [`parse_compilation_unit`] for whole files, plus
//!   [`parse_member`], [`parse_statement`] and [`parse_expression`] for
//!   fragments. Parsing never fails; malformed input produces `Error` nodes
//!   and diagnostics.
//! - **Code Generation**: the [`Codegen`] trait turns a tree back into text.
//!   Parsed trees reproduce their input exactly.
//! - **Construction**: the [`builder`] module makes fresh nodes and tokens
//!   for trees that did not come from source.
//! - **Formatting**: [`Formatter`] lays out generated trees.
//! - **Semantics**: [`SymbolResolver`] and its default implementation
//!   [`SemanticModel`] answer declared-symbol and static-type queries.
//!
//! # Quick Start
//!
//! ```
//! use sharpdom_syntax::{parse_compilation_unit, Codegen, CodegenState};
//!
//! let source = "class C { int x = 1; }";
//! let tree = parse_compilation_unit(source);
//!
//! let mut state = CodegenState::default();
//! tree.root().codegen(&mut state);
//! assert_eq!(state.to_string(), source);
//! ```

// ============================================================================
// Public modules and re-exports
// ============================================================================

pub mod builder;
pub mod codegen;
pub mod format;
pub mod kind;
pub mod semantic;
pub mod tokenizer;
pub mod tree;

mod parser;

pub use codegen::{Codegen, CodegenState};
pub use format::{normalized_text, FormatOptions, Formatter};
pub use kind::{SyntaxKind, TokenKind};
pub use parser::{parse_compilation_unit, parse_expression, parse_member, parse_statement};
pub use semantic::{SemanticModel, SymbolResolver};
pub use tree::{Diagnostic, SyntaxElement, SyntaxId, SyntaxNode, SyntaxToken, SyntaxTree, Trivia};

use sharpdom_core::text::{line_start_offset, offset_to_position};

// ============================================================================
// Diagnostics rendering
// ============================================================================

/// Renders every diagnostic of `tree` as an annotated source excerpt.
///
/// Returns an empty string for a tree without diagnostics.
///
/// # Example
///
/// ```
/// use sharpdom_syntax::{parse_compilation_unit, render_diagnostics};
///
/// let tree = parse_compilation_unit("class C { int x = ; }");
/// let report = render_diagnostics(&tree, "example.cs");
/// assert!(report.contains("example.cs"));
/// ```
pub fn render_diagnostics(tree: &SyntaxTree, label: &str) -> String {
    use annotate_snippets::{Level, Renderer, Snippet};

    let source: &str = tree.source();
    let renderer = Renderer::plain();
    let mut out = Vec::new();
    for diagnostic in tree.diagnostics() {
        let (line, _) = offset_to_position(source, diagnostic.span.start);
        let start_offset = line_start_offset(source, line).unwrap_or(0);
        let end_offset = source[start_offset..]
            .find('\n')
            .map(|i| start_offset + i)
            .unwrap_or(source.len());
        let excerpt = &source[start_offset..end_offset];
        let start = diagnostic.span.start.saturating_sub(start_offset).min(excerpt.len());
        let end = diagnostic
            .span
            .end
            .saturating_sub(start_offset)
            .clamp(start, excerpt.len());
        let end = if start == end && end < excerpt.len() {
            end + 1
        } else {
            end
        };
        let message = format!("{} ({})", diagnostic.message, label);
        let rendered = renderer
            .render(
                Level::Error.title(&message).snippet(
                    Snippet::source(excerpt)
                        .line_start(line as usize)
                        .origin(label)
                        .fold(false)
                        .annotations(vec![Level::Error.span(start..end).label(&diagnostic.message)]),
                ),
            )
            .to_string();
        out.push(rendered);
    }
    out.join("\n")
}
