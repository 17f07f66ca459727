// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Layout of generated trees.
//!
//! ## Design
//!
//! Formatting replaces the trivia of every token and keeps everything else.
//! It runs in two passes:
//!
//! 1. A structural walk decides, for each token, whether it starts a line
//!    (declarations, statements and Allman-style braces do), how deep it is
//!    indented, and otherwise whether a space separates it from the previous
//!    token.
//! 2. The tree is rebuilt with the new tokens in the same positions.
//!
//! Whitespace and newlines of the input are discarded. Comments are kept and
//! placed on their own lines ahead of the token they led.

use std::sync::Arc;

use crate::kind::{is_predefined_type, SyntaxKind, TokenKind};
use crate::tree::{SyntaxElement, SyntaxNode, SyntaxToken, Trivia};

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Spaces per indentation level when `use_tabs` is off.
    pub indent_width: usize,
    pub use_tabs: bool,
    /// Line terminator, `"\n"` or `"\r\n"`.
    pub newline: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            indent_width: 4,
            use_tabs: false,
            newline: "\n".to_string(),
        }
    }
}

impl FormatOptions {
    fn indent(&self, depth: usize) -> Option<Trivia> {
        if depth == 0 {
            return None;
        }
        let text = if self.use_tabs {
            "\t".repeat(depth)
        } else {
            " ".repeat(self.indent_width * depth)
        };
        Some(Trivia::Whitespace(text))
    }

    fn newline(&self) -> Trivia {
        Trivia::Newline(self.newline.clone())
    }
}

// ============================================================================
// Formatter
// ============================================================================

/// Lays out a syntax tree.
///
/// # Example
///
/// ```
/// use sharpdom_syntax::{parse_compilation_unit, Formatter};
///
/// let tree = parse_compilation_unit("class C{int x=1;}");
/// let formatted = Formatter::default().format(tree.root());
/// assert_eq!(formatted.text(), "class C\n{\n    int x = 1;\n}\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    options: FormatOptions,
}

impl Formatter {
    pub fn new(options: FormatOptions) -> Self {
        Formatter { options }
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    pub fn format(&self, node: &Arc<SyntaxNode>) -> Arc<SyntaxNode> {
        let mut layout = Layout::new(&self.options);
        layout.walk(node, None);
        let mut tokens = layout.tokens.into_iter();
        rebuild(node, &mut tokens)
    }
}

fn rebuild(node: &SyntaxNode, tokens: &mut impl Iterator<Item = SyntaxToken>) -> Arc<SyntaxNode> {
    let children = node
        .children()
        .iter()
        .map(|child| match child {
            SyntaxElement::Token(_) => tokens.next().map(SyntaxElement::from).unwrap_or_else(|| child.clone()),
            SyntaxElement::Node(inner) => rebuild(inner, tokens).into(),
        })
        .collect();
    SyntaxNode::new(node.kind(), children)
}

/// Single-line text of `node` with canonical spacing and no comments.
///
/// Two fragments that differ only in whitespace or comments have the same
/// normalized text.
///
/// ```
/// use sharpdom_syntax::{normalized_text, parse_expression};
///
/// let tree = parse_expression("Foo (a,b) +\n  1");
/// assert_eq!(normalized_text(tree.root()), "Foo(a, b) + 1");
/// ```
pub fn normalized_text(node: &SyntaxNode) -> String {
    let mut placed = Vec::new();
    collect_placed(node, &mut placed);
    let mut out = String::new();
    let mut prev: Option<Placed<'_>> = None;
    for token in placed {
        if let Some(prev) = &prev {
            if needs_space(prev, &token) {
                out.push(' ');
            }
        }
        out.push_str(token.text);
        prev = Some(token);
    }
    out
}

fn collect_placed<'t>(node: &'t SyntaxNode, out: &mut Vec<Placed<'t>>) {
    for (index, child) in node.children().iter().enumerate() {
        match child {
            SyntaxElement::Token(token) if !token.is_missing() && token.kind() != TokenKind::EndOfFile => {
                out.push(Placed::new(token, node.kind(), index));
            }
            SyntaxElement::Token(_) => {}
            SyntaxElement::Node(inner) => collect_placed(inner, out),
        }
    }
}

// ============================================================================
// Spacing
// ============================================================================

/// A token together with the kind of node that owns it.
#[derive(Debug, Clone, Copy)]
struct Placed<'t> {
    text: &'t str,
    kind: TokenKind,
    parent: SyntaxKind,
    prefix_operator: bool,
}

impl<'t> Placed<'t> {
    fn new(token: &'t SyntaxToken, parent: SyntaxKind, index: usize) -> Self {
        Placed {
            text: token.text(),
            kind: token.kind(),
            parent,
            prefix_operator: parent == SyntaxKind::PrefixUnaryExpression && index == 0,
        }
    }

    fn in_type(&self) -> bool {
        matches!(self.parent, SyntaxKind::Type | SyntaxKind::TypeParameterList)
    }
}

fn needs_space(prev: &Placed<'_>, next: &Placed<'_>) -> bool {
    if prev.prefix_operator || matches!(prev.text, "(" | "[" | ".") {
        return false;
    }
    if matches!(next.text, ")" | "]" | "." | "," | ";") {
        return false;
    }
    if next.parent == SyntaxKind::PostfixUnaryExpression {
        return false;
    }
    match next.text {
        "(" => match prev.kind {
            TokenKind::Identifier => false,
            TokenKind::Keyword => !matches!(prev.text, "this" | "base") && !is_predefined_type(prev.text),
            TokenKind::Punctuation => match prev.text {
                ")" | "]" => false,
                ">" => !prev.in_type(),
                _ => true,
            },
            _ => true,
        },
        "[" => !matches!(next.parent, SyntaxKind::BracketedArgumentList | SyntaxKind::Type),
        "<" | ">" if next.in_type() => false,
        "?" if next.parent == SyntaxKind::Type => false,
        ":" if matches!(next.parent, SyntaxKind::Argument | SyntaxKind::AttributeArgument) => false,
        _ => !(prev.text == "<" && prev.in_type()),
    }
}

// ============================================================================
// Layout
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Break {
    Line,
    Blank,
}

struct Layout<'o, 't> {
    options: &'o FormatOptions,
    depth: usize,
    pending: Option<Break>,
    /// The last token opened a body; the next declaration needs no blank line.
    body_start: bool,
    prev: Option<Placed<'t>>,
    tokens: Vec<SyntaxToken>,
}

impl<'o, 't> Layout<'o, 't> {
    fn new(options: &'o FormatOptions) -> Self {
        Layout {
            options,
            depth: 0,
            pending: None,
            body_start: false,
            prev: None,
            tokens: Vec::new(),
        }
    }

    fn request(&mut self, brk: Break) {
        if self.prev.is_none() {
            return;
        }
        let brk = if brk == Break::Blank && self.body_start {
            Break::Line
        } else {
            brk
        };
        self.pending = self.pending.max(Some(brk));
    }

    fn walk(&mut self, node: &'t SyntaxNode, parent: Option<SyntaxKind>) {
        let kind = node.kind();
        if let Some(brk) = parent.and_then(|parent| break_before(kind, parent)) {
            self.request(brk);
        }
        let braces = has_block_braces(node);
        for (index, child) in node.children().iter().enumerate() {
            match child {
                SyntaxElement::Token(token) => {
                    let placed = Placed::new(token, kind, index);
                    if braces && token.is("{") {
                        self.request(Break::Line);
                        self.emit(token, placed);
                        self.depth += 1;
                        self.body_start = true;
                    } else if braces && token.is("}") {
                        self.depth = self.depth.saturating_sub(1);
                        self.request(Break::Line);
                        self.emit(token, placed);
                    } else {
                        self.emit(token, placed);
                    }
                }
                SyntaxElement::Node(inner) => {
                    if kind == SyntaxKind::AccessorList && braces {
                        self.request(Break::Line);
                    }
                    let embedded = is_embedded_statement(kind, inner.kind());
                    if embedded {
                        self.depth += 1;
                    }
                    self.walk(inner, Some(kind));
                    if embedded {
                        self.depth -= 1;
                    }
                    if inner.kind() == SyntaxKind::AttributeList && is_declaration(kind) {
                        self.request(Break::Line);
                    }
                }
            }
        }
    }

    fn emit(&mut self, token: &'t SyntaxToken, placed: Placed<'t>) {
        if token.is_missing() {
            self.tokens.push(token.clone().with_leading(Vec::new()));
            return;
        }
        let comments: Vec<&Trivia> = token.leading_trivia().iter().filter(|t| t.is_comment()).collect();
        let eof = token.kind() == TokenKind::EndOfFile;
        let brk = self.pending.take().or(if eof { Some(Break::Line) } else { None });
        let mut leading = Vec::new();

        match (&self.prev, brk) {
            (None, _) => {
                for comment in comments {
                    leading.push(comment.clone());
                    leading.push(self.options.newline());
                }
            }
            (Some(_), Some(brk)) => {
                leading.push(self.options.newline());
                if brk == Break::Blank {
                    leading.push(self.options.newline());
                }
                for comment in comments {
                    leading.extend(self.options.indent(self.depth));
                    leading.push(comment.clone());
                    leading.push(self.options.newline());
                }
                leading.extend(self.options.indent(self.depth));
            }
            (Some(prev), None) => {
                if needs_space(prev, &placed) || !comments.is_empty() {
                    leading.push(Trivia::Whitespace(" ".to_string()));
                }
                for comment in comments {
                    leading.push(comment.clone());
                    if matches!(comment, Trivia::LineComment(_)) {
                        leading.push(self.options.newline());
                        leading.extend(self.options.indent(self.depth + 1));
                    } else {
                        leading.push(Trivia::Whitespace(" ".to_string()));
                    }
                }
            }
        }

        // nothing to separate from in an empty file
        if eof && self.prev.is_none() {
            leading.clear();
        }
        self.tokens.push(token.clone().with_leading(leading));
        self.prev = Some(placed);
        self.body_start = false;
    }
}

fn break_before(kind: SyntaxKind, parent: SyntaxKind) -> Option<Break> {
    match kind {
        SyntaxKind::UsingDirective
        | SyntaxKind::FieldDeclaration
        | SyntaxKind::EnumMemberDeclaration
        | SyntaxKind::ElseClause => Some(Break::Line),
        SyntaxKind::NamespaceDeclaration
        | SyntaxKind::MethodDeclaration
        | SyntaxKind::ConstructorDeclaration
        | SyntaxKind::PropertyDeclaration => Some(Break::Blank),
        k if k.is_type_declaration() => Some(Break::Blank),
        SyntaxKind::IfStatement if parent == SyntaxKind::ElseClause => None,
        k if k.is_statement() => match parent {
            SyntaxKind::Block
            | SyntaxKind::IfStatement
            | SyntaxKind::ElseClause
            | SyntaxKind::WhileStatement
            | SyntaxKind::ForStatement => Some(Break::Line),
            _ => None,
        },
        _ => None,
    }
}

/// Nodes whose braces sit on their own lines around an indented body.
fn has_block_braces(node: &SyntaxNode) -> bool {
    match node.kind() {
        SyntaxKind::NamespaceDeclaration | SyntaxKind::Block => true,
        SyntaxKind::AccessorList => node
            .children_of_kind(SyntaxKind::AccessorDeclaration)
            .any(|accessor| accessor.child_of_kind(SyntaxKind::Block).is_some()),
        k => k.is_type_declaration(),
    }
}

/// A non-block statement nested directly in a control statement.
fn is_embedded_statement(parent: SyntaxKind, child: SyntaxKind) -> bool {
    let control = matches!(
        parent,
        SyntaxKind::IfStatement
            | SyntaxKind::ElseClause
            | SyntaxKind::WhileStatement
            | SyntaxKind::ForStatement
    );
    control
        && child.is_statement()
        && child != SyntaxKind::Block
        && !(parent == SyntaxKind::ElseClause && child == SyntaxKind::IfStatement)
}

fn is_declaration(kind: SyntaxKind) -> bool {
    kind.is_member_declaration() || kind == SyntaxKind::AccessorDeclaration
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_compilation_unit, parse_expression, parse_statement};

    fn format(source: &str) -> String {
        let tree = parse_compilation_unit(source);
        Formatter::default().format(tree.root()).text()
    }

    mod layout {
        use super::*;

        #[test]
        fn nested_declarations() {
            let source = "namespace N{public class C{int x=1;public void M(int a){if(a>0){x=a;}else x=0;}}}";
            let expected = "\
namespace N
{
    public class C
    {
        int x = 1;

        public void M(int a)
        {
            if (a > 0)
            {
                x = a;
            }
            else
                x = 0;
        }
    }
}
";
            assert_eq!(format(source), expected);
        }

        #[test]
        fn usings_then_blank_line() {
            let source = "using System;using System.Text;class A{}";
            assert_eq!(
                format(source),
                "using System;\nusing System.Text;\n\nclass A\n{\n}\n"
            );
        }

        #[test]
        fn auto_property_stays_on_one_line() {
            let source = "class A{public int X{get;set;}}";
            assert_eq!(
                format(source),
                "class A\n{\n    public int X { get; set; }\n}\n"
            );
        }

        #[test]
        fn attributes_on_their_own_line() {
            let source = "[Serializable] [Obsolete(\"x\", Error = true)] public class A{}";
            assert_eq!(
                format(source),
                "[Serializable]\n[Obsolete(\"x\", Error = true)]\npublic class A\n{\n}\n"
            );
        }

        #[test]
        fn comments_are_kept() {
            let source = "class A{\n// note\nint x;}";
            assert_eq!(format(source), "class A\n{\n    // note\n    int x;\n}\n");
        }

        #[test]
        fn tabs_and_crlf() {
            let options = FormatOptions {
                indent_width: 4,
                use_tabs: true,
                newline: "\r\n".to_string(),
            };
            let tree = parse_compilation_unit("class A{int x;}");
            let text = Formatter::new(options).format(tree.root()).text();
            assert_eq!(text, "class A\r\n{\r\n\tint x;\r\n}\r\n");
        }

        #[test]
        fn formatting_is_idempotent() {
            let once = format("class A{void M(){for(int i=0;i<3;i++){Run(i);}}}");
            assert_eq!(format(&once), once);
        }
    }

    mod spacing {
        use super::*;

        fn normalized(source: &str) -> String {
            normalized_text(parse_expression(source).root())
        }

        #[test]
        fn expressions() {
            assert_eq!(normalized("a+b*c"), "a + b * c");
            assert_eq!(normalized("new List<int>( )"), "new List<int>()");
            assert_eq!(normalized("items [ 0 ] . Name"), "items[0].Name");
            assert_eq!(normalized("- x"), "-x");
            assert_eq!(normalized("i ++"), "i++");
            assert_eq!(normalized("f ? a : b"), "f ? a : b");
            assert_eq!(normalized("Call(name : 1)"), "Call(name: 1)");
            assert_eq!(normalized("a > (b)"), "a > (b)");
        }

        #[test]
        fn statements() {
            let tree = parse_statement("for(;;)  return ;");
            assert_eq!(normalized_text(tree.root()), "for (;;) return;");
        }

        #[test]
        fn comments_do_not_matter() {
            let plain = parse_expression("a + b");
            let commented = parse_expression("a /* why */ + b");
            assert_eq!(normalized_text(plain.root()), normalized_text(commented.root()));
        }
    }
}
