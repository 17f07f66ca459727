//! The resolve pass.
//!
//! Building a model only reads syntax. Symbols and expression types are
//! attached afterwards, node by node, by asking the model's
//! [`SymbolResolver`](sharpdom_syntax::SymbolResolver). Each node is asked at
//! most once: its [`Resolution`] moves out of `Pending` and stays put.
//!
//! A declaration whose symbol cannot be found is not an error. The node is
//! marked degraded, a warning is logged, and names and placement fall back
//! to what the factory read from syntax.

use tracing::{debug, trace, warn};

use sharpdom_core::error::DomError;
use sharpdom_syntax::{normalized_text, parse_expression};

use crate::dom::Dom;
use crate::node::{NodeId, NodeKind, Resolution};

impl Dom {
    /// Resolve every node still pending, returning how many were resolved.
    pub fn resolve(&mut self) -> usize {
        let pending: Vec<NodeId> = (0..self.len() as u32)
            .map(NodeId)
            .filter(|id| self.node_ref(*id).resolution.is_pending())
            .collect();
        for id in &pending {
            self.resolve_node(*id);
        }
        debug!(resolved = pending.len(), "resolve pass");
        pending.len()
    }

    /// Resolve the pending nodes of the subtree rooted at `id`.
    pub(crate) fn resolve_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.node_ref(current).resolution.is_pending() {
                self.resolve_node(current);
            }
            for container in &self.node_ref(current).containers {
                stack.extend(container.members().iter().copied());
            }
        }
    }

    fn resolve_node(&mut self, id: NodeId) {
        let node = self.node_ref(id);
        let tag = node.kind.tag();
        let resolution = if tag.is_declaration() {
            match self.resolver().resolve_declared(&node.syntax) {
                Ok(symbol) => Resolution::Declared(symbol),
                Err(err) => {
                    warn!(
                        node = %id,
                        kind = %tag,
                        name = %node.declared_name,
                        error = %err,
                        "unresolved symbol, node is degraded"
                    );
                    Resolution::Failed(err)
                }
            }
        } else if matches!(node.kind, NodeKind::Expression { .. }) {
            match self.resolver().resolve_type(&node.syntax) {
                Ok(ty) => Resolution::Typed(ty),
                Err(err) => {
                    trace!(node = %id, error = %err, "no static type");
                    Resolution::NotApplicable
                }
            }
        } else {
            Resolution::NotApplicable
        };
        trace!(node = %id, kind = %tag, "resolved");
        self.node_mut(id).resolution = resolution;
    }

    /// Replace the text of an expression node.
    ///
    /// The new text is parsed on its own. The node keeps its original
    /// fragment, takes the new one as its current syntax, and is resolved
    /// again.
    pub fn set_expression_text(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        self.check_id(id)?;
        if !matches!(self.node_ref(id).kind, NodeKind::Expression { .. }) {
            return Err(DomError::invalid_args(format!(
                "{} is a {}, not an expression",
                id,
                self.node_ref(id).kind.kind_name()
            )));
        }
        let tree = parse_expression(text);
        if let Some(diagnostic) = tree.diagnostics().first() {
            return Err(DomError::InvalidFragment {
                expected: "expression".to_string(),
                message: diagnostic.message.clone(),
            });
        }
        let syntax = tree.root().clone();
        self.resolver_mut().add_tree(&syntax);
        let node = self.node_mut(id);
        node.kind = NodeKind::Expression {
            syntax_kind: syntax.kind(),
            text: normalized_text(&syntax),
        };
        node.syntax = syntax;
        node.resolution = Resolution::Pending;
        self.resolve_node(id);
        Ok(())
    }
}
