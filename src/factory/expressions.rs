//! Expressions are opaque: one node holding the fragment as written.

use std::sync::Arc;

use sharpdom_core::error::DomError;
use sharpdom_syntax::builder::without_leading_trivia;
use sharpdom_syntax::{normalized_text, SyntaxNode};

use super::{BuildContext, Factory, FactoryRegistry, RebuildContext};
use crate::node::{Node, NodeId, NodeKind, NodeKindTag};
use crate::view::NodeRef;

pub(crate) fn register(registry: &mut FactoryRegistry) {
    registry.register(Box::new(ExpressionFactory));
}

/// Every expression fragment. Registered last so that anything more
/// specific gets a chance first.
pub struct ExpressionFactory;

impl Factory for ExpressionFactory {
    fn name(&self) -> &str {
        "expression"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind().is_expression()
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let kind = NodeKind::Expression {
            syntax_kind: syntax.kind(),
            text: normalized_text(syntax),
        };
        Ok(vec![cx.alloc(Node::new(kind, syntax))])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Expression
    }

    fn rebuild(&self, node: NodeRef<'_>, _cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        Ok(vec![without_leading_trivia(node.syntax())])
    }
}

#[cfg(test)]
mod tests {
    use crate::build::{build, rebuild};
    use crate::facet::Slot;
    use crate::node::Value;

    #[test]
    fn text_is_normalized() {
        let dom = build("class C { int x = a+b  *2; }").unwrap();
        let value = dom.root().classes()[0].fields()[0].child(Slot::Initializer).unwrap();
        assert_eq!(value.request_value("text"), Some(Value::from("a + b * 2")));
        assert_eq!(value.request_value("syntax_kind"), Some(Value::from("BinaryExpression")));
        assert_eq!(value.name(), "");
    }

    #[test]
    fn rebuild_drops_leading_comments() {
        let dom = build("class C { int x = /* one */ 1; }").unwrap();
        let value = dom.root().classes()[0].fields()[0].child(Slot::Initializer).unwrap();
        assert_eq!(rebuild(&dom, value.id()).unwrap(), "1");
    }

    #[test]
    fn edited_text_is_rebuilt() {
        let mut dom = build("class C { int x = 1; }").unwrap();
        let value = dom.root().classes()[0].fields()[0].child(Slot::Initializer).unwrap().id();
        dom.set_expression_text(value, "Compute(2)").unwrap();
        let field = dom.root().classes()[0].fields()[0].id();
        assert_eq!(rebuild(&dom, field).unwrap(), "int x = Compute(2);");
    }
}
