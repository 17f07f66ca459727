//! Entry points: source text to model, model to source text.
//!
//! ## Design
//!
//! - **Parse once**: the file is parsed, handed to the resolver, and built
//!   with one registry pass. Symbols are attached afterwards by
//!   [`Dom::resolve`].
//! - **Syntax errors do not fail a build**: error-recovery fragments are
//!   skipped and the model reports [`Dom::has_syntax_errors`].
//! - **Format on the way out**: factories produce bare syntax; the text is
//!   laid out once by the formatter with the caller's [`FormatOptions`].

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use sharpdom_core::error::DomError;
use sharpdom_syntax::{
    parse_compilation_unit, parse_expression, parse_member, parse_statement, FormatOptions,
    Formatter, SemanticModel, SymbolResolver, SyntaxTree,
};

use crate::dom::Dom;
use crate::factory::{BuildContext, FactoryRegistry, RebuildContext};
use crate::node::NodeId;

// ============================================================================
// Building
// ============================================================================

/// Build a model of `source` with the default factories.
///
/// ```
/// let dom = sharpdom::build("namespace N { class C { int x; } }").unwrap();
/// assert_eq!(dom.root().root_classes()[0].qualified_name(), "N.C");
/// ```
pub fn build(source: &str) -> Result<Dom, DomError> {
    build_with(source, &FactoryRegistry::with_defaults())
}

/// Build with a custom registry.
pub fn build_with(source: &str, registry: &FactoryRegistry) -> Result<Dom, DomError> {
    build_with_resolver(source, registry, Box::new(SemanticModel::new()))
}

/// Build with a custom registry and semantic service.
pub fn build_with_resolver(
    source: &str,
    registry: &FactoryRegistry,
    mut resolver: Box<dyn SymbolResolver>,
) -> Result<Dom, DomError> {
    let tree = parse_compilation_unit(source);
    if tree.has_errors() {
        warn!(
            diagnostics = tree.diagnostics().len(),
            "source has syntax errors"
        );
    }
    resolver.add_tree(tree.root());

    let mut dom = Dom::new(resolver);
    dom.set_has_syntax_errors(tree.has_errors());
    let built = {
        let mut cx = BuildContext::new(&mut dom, registry, Arc::from(source));
        cx.build(tree.root())?
    };
    if built != [dom.root_id()] {
        return Err(DomError::malformed(
            "root",
            format!("file built as {} nodes instead of one root", built.len()),
        ));
    }
    dom.resolve();
    debug!(nodes = dom.len(), "built model");
    Ok(dom)
}

// ============================================================================
// Fragments
// ============================================================================

/// What kind of text [`Dom::build_fragment`] expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// A type member or nested type declaration.
    Member,
    Statement,
    Expression,
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FragmentKind::Member => "member",
            FragmentKind::Statement => "statement",
            FragmentKind::Expression => "expression",
        };
        f.write_str(name)
    }
}

impl FragmentKind {
    fn parse(self, text: &str) -> SyntaxTree {
        match self {
            FragmentKind::Member => parse_member(text),
            FragmentKind::Statement => parse_statement(text),
            FragmentKind::Expression => parse_expression(text),
        }
    }
}

impl Dom {
    /// Build detached nodes from a fragment of source, ready to be placed
    /// with [`Dom::add_or_move`].
    ///
    /// ```
    /// use sharpdom::{build, FragmentKind, Slot};
    ///
    /// let mut dom = build("class C { }").unwrap();
    /// let class = dom.root().classes()[0].id();
    /// let built = dom.build_fragment("public int Count;", FragmentKind::Member).unwrap();
    /// dom.add_or_move(class, Slot::Members, built[0]).unwrap();
    /// assert_eq!(dom.root().classes()[0].fields()[0].name(), "Count");
    /// ```
    pub fn build_fragment(&mut self, text: &str, kind: FragmentKind) -> Result<Vec<NodeId>, DomError> {
        self.build_fragment_with(text, kind, &FactoryRegistry::with_defaults())
    }

    pub fn build_fragment_with(
        &mut self,
        text: &str,
        kind: FragmentKind,
        registry: &FactoryRegistry,
    ) -> Result<Vec<NodeId>, DomError> {
        let tree = kind.parse(text);
        if let Some(diagnostic) = tree.diagnostics().first() {
            return Err(DomError::InvalidFragment {
                expected: kind.to_string(),
                message: diagnostic.message.clone(),
            });
        }
        self.resolver_mut().add_tree(tree.root());
        let built = {
            let mut cx = BuildContext::new(self, registry, Arc::from(text));
            cx.build(tree.root())?
        };
        for id in &built {
            self.resolve_subtree(*id);
        }
        debug!(%kind, nodes = built.len(), "built fragment");
        Ok(built)
    }
}

// ============================================================================
// Rebuilding
// ============================================================================

/// Regenerate formatted source for node `id` and its subtree.
///
/// A node that rebuilds as several fragments (one per declarator, say)
/// yields them on consecutive lines.
pub fn rebuild(dom: &Dom, id: NodeId) -> Result<String, DomError> {
    rebuild_with(dom, id, &FactoryRegistry::with_defaults(), &FormatOptions::default())
}

pub fn rebuild_with(
    dom: &Dom,
    id: NodeId,
    registry: &FactoryRegistry,
    options: &FormatOptions,
) -> Result<String, DomError> {
    dom.check_id(id)?;
    let cx = RebuildContext::new(dom, registry);
    let fragments = cx.rebuild(id)?;
    let formatter = Formatter::new(options.clone());
    let texts: Vec<String> = fragments
        .iter()
        .map(|fragment| formatter.format(fragment).text())
        .collect();
    Ok(texts.join(&options.newline))
}
