//! Statements inside method and accessor bodies.
//!
//! Control statements keep their bodies as statement lists. Whether a body
//! was written with braces is recorded on the node so it can be written the
//! same way again; it plays no part in equivalence.

use std::sync::Arc;

use sharpdom_core::annotation::AnnotationList;
use sharpdom_core::error::DomError;
use sharpdom_syntax::builder::{punct, word};
use sharpdom_syntax::{normalized_text, SyntaxElement, SyntaxKind, SyntaxNode};

use super::members::{rebuild_block_of, rebuild_variable};
use super::{
    annotated, build_initializer, modifiers_of, node_element, node_of, BuildContext, Factory,
    FactoryRegistry, RebuildContext,
};
use crate::facet::Slot;
use crate::node::{Modifiers, Node, NodeId, NodeKind, NodeKindTag};
use crate::view::NodeRef;

pub(crate) fn register(registry: &mut FactoryRegistry) {
    registry.register(Box::new(BlockFactory));
    registry.register(Box::new(IfFactory));
    registry.register(Box::new(LocalDeclarationFactory));
    registry.register(Box::new(AssignmentFactory));
    registry.register(Box::new(InvocationFactory));
    registry.register(Box::new(ReturnFactory));
    registry.register(Box::new(ForFactory));
    registry.register(Box::new(WhileFactory));
}

/// The embedded statement of a control statement.
fn body_of(syntax: &SyntaxNode) -> Option<&Arc<SyntaxNode>> {
    syntax
        .child_nodes()
        .find(|n| n.kind().is_statement() || n.kind() == SyntaxKind::Error)
}

/// Build a control statement body into `slot`. A block contributes its
/// statements; anything else is the single statement. Returns whether the
/// body was a block.
fn build_statement_body(
    cx: &mut BuildContext<'_>,
    owner: NodeId,
    slot: Slot,
    body: Option<&Arc<SyntaxNode>>,
) -> Result<bool, DomError> {
    match body {
        Some(block) if block.kind() == SyntaxKind::Block => {
            for statement in block.child_nodes() {
                cx.build_into(owner, slot, statement)?;
            }
            Ok(true)
        }
        Some(statement) => {
            cx.build_into(owner, slot, statement)?;
            Ok(false)
        }
        None => Ok(false),
    }
}

/// A single statement stays bare unless it was braced; anything else needs
/// a block.
fn rebuild_statement_body(
    node: NodeRef<'_>,
    slot: Slot,
    braced: bool,
    cx: &RebuildContext<'_>,
) -> Result<SyntaxElement, DomError> {
    let statements = node.children(slot);
    if !braced && statements.len() == 1 {
        return Ok(cx.rebuild_one(statements[0].id())?.into());
    }
    rebuild_block_of(node, slot, cx)
}

fn build_condition(cx: &mut BuildContext<'_>, owner: NodeId, syntax: &SyntaxNode) -> Result<(), DomError> {
    if let Some(condition) = syntax.child_expression() {
        cx.build_into(owner, Slot::Condition, condition)?;
    }
    Ok(())
}

/// `keyword ( condition ) body`
fn control_header(
    keyword: &str,
    node: NodeRef<'_>,
    factory: &str,
    cx: &RebuildContext<'_>,
) -> Result<Vec<SyntaxElement>, DomError> {
    Ok(vec![
        word(keyword),
        punct("("),
        cx.require_child(node, Slot::Condition, factory)?.into(),
        punct(")"),
    ])
}

/// One `LocalDeclaration` node per declarator of a `VariableDeclaration`.
fn build_locals(
    cx: &mut BuildContext<'_>,
    declaration: &SyntaxNode,
    modifiers: &Modifiers,
    annotations: &AnnotationList,
) -> Result<Vec<NodeId>, DomError> {
    let mut out = Vec::new();
    for declarator in declaration.children_of_kind(SyntaxKind::VariableDeclarator) {
        let node = Node::new(NodeKind::LocalDeclaration, declarator)
            .with_name(declarator.identifier_text().unwrap_or_default())
            .with_modifiers(modifiers.clone())
            .with_annotations(annotations.clone());
        let id = cx.alloc(node);
        if let Some(ty) = declaration.child_of_kind(SyntaxKind::Type) {
            cx.build_into(id, Slot::Type, ty)?;
        }
        build_initializer(cx, id, Slot::Initializer, declarator)?;
        out.push(id);
    }
    Ok(out)
}

// ============================================================================
// Blocks
// ============================================================================

/// A nested `{ ... }` inside a body.
pub struct BlockFactory;

impl Factory for BlockFactory {
    fn name(&self) -> &str {
        "block"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::Block
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let node = Node::new(NodeKind::Block, syntax).with_annotations(cx.annotations(syntax));
        let id = cx.alloc(node);
        build_statement_body(cx, id, Slot::Statements, Some(syntax))?;
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Block
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let mut children = vec![punct("{")];
        children.extend(cx.rebuild_slot(node, Slot::Statements)?.into_iter().map(SyntaxElement::from));
        children.push(punct("}"));
        Ok(vec![annotated(node, node_of(SyntaxKind::Block, children))])
    }
}

// ============================================================================
// If
// ============================================================================

/// `if` with its `else if` chain flattened into `ElseIfs` and the final
/// `else` body in `ElseStatements`.
pub struct IfFactory;

impl IfFactory {
    fn if_statement(
        node: NodeRef<'_>,
        braced: bool,
        tail: Option<SyntaxElement>,
        cx: &RebuildContext<'_>,
    ) -> Result<Arc<SyntaxNode>, DomError> {
        let mut children = control_header("if", node, "if", cx)?;
        children.push(rebuild_statement_body(node, Slot::Statements, braced, cx)?);
        children.extend(tail);
        Ok(node_of(SyntaxKind::IfStatement, children))
    }

    fn else_clause(body: SyntaxElement) -> SyntaxElement {
        node_element(SyntaxKind::ElseClause, vec![word("else"), body])
    }
}

impl Factory for IfFactory {
    fn name(&self) -> &str {
        "if"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::IfStatement
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let kind = NodeKind::If {
            braced: false,
            else_braced: None,
        };
        let id = cx.alloc(Node::new(kind, syntax).with_annotations(cx.annotations(syntax)));
        build_condition(cx, id, syntax)?;
        let braced = build_statement_body(cx, id, Slot::Statements, body_of(syntax))?;

        let mut else_braced = None;
        let mut clause = syntax.child_of_kind(SyntaxKind::ElseClause);
        while let Some(current) = clause {
            let Some(body) = body_of(current) else {
                break;
            };
            if body.kind() == SyntaxKind::IfStatement {
                let else_if = cx.alloc(Node::new(NodeKind::ElseIf { braced: false }, body));
                build_condition(cx, else_if, body)?;
                let braced = build_statement_body(cx, else_if, Slot::Statements, body_of(body))?;
                cx.dom_mut().node_mut(else_if).kind = NodeKind::ElseIf { braced };
                cx.attach(id, Slot::ElseIfs, else_if)?;
                clause = body.child_of_kind(SyntaxKind::ElseClause);
            } else {
                else_braced = Some(build_statement_body(cx, id, Slot::ElseStatements, Some(body))?);
                clause = None;
            }
        }
        cx.dom_mut().node_mut(id).kind = NodeKind::If { braced, else_braced };
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        matches!(node.tag(), NodeKindTag::If | NodeKindTag::ElseIf)
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let (braced, else_braced) = match node.kind() {
            NodeKind::If { braced, else_braced } => (*braced, *else_braced),
            NodeKind::ElseIf { braced } => return Ok(vec![Self::if_statement(node, *braced, None, cx)?]),
            _ => return Err(DomError::malformed(self.name(), "not an if statement")),
        };

        // build the chain from the innermost else outwards
        let mut tail = match else_braced {
            Some(braced) => Some(Self::else_clause(rebuild_statement_body(
                node,
                Slot::ElseStatements,
                braced,
                cx,
            )?)),
            None => None,
        };
        for else_if in node.children(Slot::ElseIfs).into_iter().rev() {
            let braced = matches!(else_if.kind(), NodeKind::ElseIf { braced: true });
            let nested = Self::if_statement(else_if, braced, tail.take(), cx)?;
            tail = Some(Self::else_clause(nested.into()));
        }
        let statement = Self::if_statement(node, braced, tail, cx)?;
        Ok(vec![annotated(node, statement)])
    }
}

// ============================================================================
// Declarations and expression statements
// ============================================================================

/// `int a = 1, b;` builds two locals, each rebuilt as its own statement.
pub struct LocalDeclarationFactory;

impl Factory for LocalDeclarationFactory {
    fn name(&self) -> &str {
        "local_declaration"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::LocalDeclarationStatement
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let declaration = syntax
            .child_of_kind(SyntaxKind::VariableDeclaration)
            .ok_or_else(|| DomError::malformed(self.name(), "declaration without variables"))?;
        let annotations = cx.annotations(syntax);
        build_locals(cx, declaration, &modifiers_of(syntax), &annotations)
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::LocalDeclaration
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let mut children = Vec::new();
        if !node.modifiers().other.is_empty() {
            let words = node.modifiers().other.iter().map(|w| word(w)).collect();
            children.push(node_element(SyntaxKind::ModifierList, words));
        }
        children.push(rebuild_variable(node, self.name(), cx)?.into());
        children.push(punct(";"));
        Ok(vec![annotated(node, node_of(SyntaxKind::LocalDeclarationStatement, children))])
    }
}

/// The expression of an expression statement, if it has kind `kind`.
fn statement_expression(syntax: &SyntaxNode, kind: SyntaxKind) -> Option<&Arc<SyntaxNode>> {
    if syntax.kind() != SyntaxKind::ExpressionStatement {
        return None;
    }
    syntax.child_expression().filter(|e| e.kind() == kind)
}

/// `target op value;` for every assignment operator.
pub struct AssignmentFactory;

impl Factory for AssignmentFactory {
    fn name(&self) -> &str {
        "assignment"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        statement_expression(syntax, SyntaxKind::AssignmentExpression).is_some()
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let assignment = statement_expression(syntax, SyntaxKind::AssignmentExpression)
            .ok_or_else(|| DomError::malformed(self.name(), "not an assignment"))?;
        let mut operands = assignment.child_nodes();
        let (Some(target), Some(value)) = (operands.next(), operands.next()) else {
            return Err(DomError::malformed(self.name(), "assignment needs two operands"));
        };
        let operator = assignment
            .child_tokens()
            .next()
            .map(|t| t.text().to_string())
            .ok_or_else(|| DomError::malformed(self.name(), "assignment without an operator"))?;
        let node = Node::new(NodeKind::Assignment { operator }, syntax)
            .with_name(normalized_text(target))
            .with_annotations(cx.annotations(syntax));
        let id = cx.alloc(node);
        cx.build_into(id, Slot::Variable, target)?;
        cx.build_into(id, Slot::Value, value)?;
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Assignment
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let NodeKind::Assignment { operator } = node.kind() else {
            return Err(DomError::malformed(self.name(), "not an assignment"));
        };
        let expression = node_element(
            SyntaxKind::AssignmentExpression,
            vec![
                cx.require_child(node, Slot::Variable, self.name())?.into(),
                punct(operator),
                cx.require_child(node, Slot::Value, self.name())?.into(),
            ],
        );
        let statement = node_of(SyntaxKind::ExpressionStatement, vec![expression, punct(";")]);
        Ok(vec![annotated(node, statement)])
    }
}

/// A call used as a statement. The name is the callee as written.
pub struct InvocationFactory;

impl Factory for InvocationFactory {
    fn name(&self) -> &str {
        "invocation"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        statement_expression(syntax, SyntaxKind::InvocationExpression).is_some()
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let invocation = statement_expression(syntax, SyntaxKind::InvocationExpression)
            .ok_or_else(|| DomError::malformed(self.name(), "not an invocation"))?;
        let callee = invocation
            .child_nodes()
            .next()
            .map(|c| normalized_text(c))
            .unwrap_or_default();
        let node = Node::new(NodeKind::Invocation, syntax)
            .with_name(callee)
            .with_annotations(cx.annotations(syntax));
        let id = cx.alloc(node);
        cx.build_into(id, Slot::Value, invocation)?;
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Invocation
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let value = cx.require_child(node, Slot::Value, self.name())?;
        let statement = node_of(SyntaxKind::ExpressionStatement, vec![value.into(), punct(";")]);
        Ok(vec![annotated(node, statement)])
    }
}

pub struct ReturnFactory;

impl Factory for ReturnFactory {
    fn name(&self) -> &str {
        "return"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::ReturnStatement
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let id = cx.alloc(Node::new(NodeKind::Return, syntax).with_annotations(cx.annotations(syntax)));
        if let Some(value) = syntax.child_expression() {
            cx.build_into(id, Slot::Value, value)?;
        }
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Return
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let mut children = vec![word("return")];
        children.extend(cx.rebuild_child(node, Slot::Value)?.map(SyntaxElement::from));
        children.push(punct(";"));
        Ok(vec![annotated(node, node_of(SyntaxKind::ReturnStatement, children))])
    }
}

// ============================================================================
// Loops
// ============================================================================

/// `for (Type name = init; condition; incrementor) body`, with at most one
/// declared variable and one incrementor. Other loop headers are left to a
/// custom factory and otherwise surface as unsupported.
pub struct ForFactory;

/// The parts of a `for` header, in source order.
struct ForSections<'s> {
    initializers: Vec<&'s Arc<SyntaxNode>>,
    condition: Option<&'s Arc<SyntaxNode>>,
    incrementors: Vec<&'s Arc<SyntaxNode>>,
    body: Option<&'s Arc<SyntaxNode>>,
}

impl<'s> ForSections<'s> {
    fn of(syntax: &'s SyntaxNode) -> Self {
        let mut sections = ForSections {
            initializers: Vec::new(),
            condition: None,
            incrementors: Vec::new(),
            body: None,
        };
        // 0 initializer, 1 condition, 2 incrementors, 3 body
        let mut section = 0;
        for child in syntax.children() {
            match child {
                SyntaxElement::Token(token) if token.is(";") => section += 1,
                SyntaxElement::Token(token) if token.is(")") => section = 3,
                SyntaxElement::Token(_) => {}
                SyntaxElement::Node(node) => match section {
                    0 => sections.initializers.push(node),
                    1 => sections.condition = Some(node),
                    2 => sections.incrementors.push(node),
                    _ => sections.body = Some(node),
                },
            }
        }
        sections
    }

    /// At most one declared variable and at most one incrementor.
    fn is_modelled(&self) -> bool {
        let initializer_ok = match self.initializers.as_slice() {
            [] => true,
            [declaration] => {
                declaration.kind() == SyntaxKind::VariableDeclaration
                    && declaration
                        .children_of_kind(SyntaxKind::VariableDeclarator)
                        .count()
                        == 1
            }
            _ => false,
        };
        initializer_ok && self.incrementors.len() <= 1
    }
}

impl Factory for ForFactory {
    fn name(&self) -> &str {
        "for"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::ForStatement && ForSections::of(syntax).is_modelled()
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let sections = ForSections::of(syntax);
        if !sections.is_modelled() {
            return Err(DomError::malformed(self.name(), "loop header is not modelled"));
        }

        let id = cx.alloc(Node::new(NodeKind::For { braced: false }, syntax).with_annotations(cx.annotations(syntax)));
        if let Some(declaration) = sections.initializers.first().copied() {
            let locals = build_locals(cx, declaration, &Modifiers::default(), &AnnotationList::new())?;
            for local in locals {
                cx.attach(id, Slot::Variable, local)?;
            }
        }
        if let Some(condition) = sections.condition {
            cx.build_into(id, Slot::Condition, condition)?;
        }
        if let Some(incrementor) = sections.incrementors.first().copied() {
            cx.build_into(id, Slot::Incrementor, incrementor)?;
        }
        let braced = build_statement_body(cx, id, Slot::Statements, sections.body)?;
        cx.dom_mut().node_mut(id).kind = NodeKind::For { braced };
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::For
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let braced = matches!(node.kind(), NodeKind::For { braced: true });
        let mut children = vec![word("for"), punct("(")];
        if let Some(variable) = node.child(Slot::Variable) {
            children.push(rebuild_variable(variable, self.name(), cx)?.into());
        }
        children.push(punct(";"));
        children.extend(cx.rebuild_child(node, Slot::Condition)?.map(SyntaxElement::from));
        children.push(punct(";"));
        children.extend(cx.rebuild_child(node, Slot::Incrementor)?.map(SyntaxElement::from));
        children.push(punct(")"));
        children.push(rebuild_statement_body(node, Slot::Statements, braced, cx)?);
        Ok(vec![annotated(node, node_of(SyntaxKind::ForStatement, children))])
    }
}

pub struct WhileFactory;

impl Factory for WhileFactory {
    fn name(&self) -> &str {
        "while"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::WhileStatement
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let id = cx.alloc(Node::new(NodeKind::While { braced: false }, syntax).with_annotations(cx.annotations(syntax)));
        build_condition(cx, id, syntax)?;
        let braced = build_statement_body(cx, id, Slot::Statements, body_of(syntax))?;
        cx.dom_mut().node_mut(id).kind = NodeKind::While { braced };
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::While
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let braced = matches!(node.kind(), NodeKind::While { braced: true });
        let mut children = control_header("while", node, self.name(), cx)?;
        children.push(rebuild_statement_body(node, Slot::Statements, braced, cx)?);
        Ok(vec![annotated(node, node_of(SyntaxKind::WhileStatement, children))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{build, rebuild};

    fn method_source(body: &str) -> String {
        format!("class C {{ void M(int a) {{ {} }} }}", body)
    }

    mod conditionals {
        use super::*;

        #[test]
        fn else_if_chain_is_flattened() {
            let dom = build(&method_source(
                "if (a > 0) { Run(a); } else if (a < 0) Stop(); else if (a == 0) { } else { Idle(); }",
            ))
            .unwrap();
            let method = dom.root().classes()[0].methods()[0];
            let statement = method.statements()[0];
            assert!(matches!(
                statement.kind(),
                NodeKind::If {
                    braced: true,
                    else_braced: Some(true)
                }
            ));
            let else_ifs = statement.children(Slot::ElseIfs);
            assert_eq!(else_ifs.len(), 2);
            assert_eq!(
                else_ifs[0].child(Slot::Condition).and_then(|c| c.request_value("text")),
                Some(crate::node::Value::from("a < 0"))
            );
            assert_eq!(statement.children(Slot::ElseStatements)[0].name(), "Idle");
        }

        #[test]
        fn chain_rebuilds_in_order() {
            let dom = build(
                "class C{void M(int a){if(a>0){Run(a);}else if(a<0)Stop();else{Idle();}}}",
            )
            .unwrap();
            let method = dom.root().classes()[0].methods()[0].id();
            let expected = "\
void M(int a)
{
    if (a > 0)
    {
        Run(a);
    }
    else if (a < 0)
        Stop();
    else
    {
        Idle();
    }
}";
            assert_eq!(rebuild(&dom, method).unwrap(), expected);
        }
    }

    mod loops {
        use super::*;

        #[test]
        fn for_sections() {
            let dom = build(&method_source("for (int i = 0; i < a; i++) { Run(i); }")).unwrap();
            let method = dom.root().classes()[0].methods()[0];
            let for_loop = method.statements()[0];
            let variable = for_loop.child(Slot::Variable).unwrap();
            assert_eq!(variable.kind_name(), "LocalDeclaration");
            assert_eq!(variable.name(), "i");
            assert_eq!(
                for_loop.child(Slot::Incrementor).and_then(|e| e.request_value("text")),
                Some(crate::node::Value::from("i++"))
            );
            assert_eq!(for_loop.statements().len(), 1);
        }

        #[test]
        fn for_rebuild() {
            let dom = build("class C{void M(){for(int i=0;i<3;i++){Run(i);}}}").unwrap();
            let for_loop = dom.root().classes()[0].methods()[0].statements()[0].id();
            assert_eq!(
                rebuild(&dom, for_loop).unwrap(),
                "for (int i = 0; i < 3; i++)\n{\n    Run(i);\n}"
            );
        }

        #[test]
        fn unusual_for_loops_are_unsupported() {
            for body in [
                "for (int i = 0, j = 1; i < j; i++) { }",
                "for (int i = 0; i < a; i++, a--) { }",
                "for (a = 0; a < 3; a++) { }",
                "for (int i = 0, j = 1; i < j; i++, j--) x = 1;",
            ] {
                let err = build(&method_source(body)).unwrap_err();
                assert!(
                    matches!(err, DomError::UnsupportedConstruct { ref kind, .. } if kind == "ForStatement"),
                    "{}: {:?}",
                    body,
                    err
                );
            }
        }

        #[test]
        fn bare_for_header_is_supported() {
            let dom = build(&method_source("for (;;) { Run(); }")).unwrap();
            let for_loop = dom.root().classes()[0].methods()[0].statements()[0];
            assert!(for_loop.child(Slot::Variable).is_none());
            assert!(for_loop.child(Slot::Incrementor).is_none());
            assert_eq!(for_loop.statements().len(), 1);
        }

        #[test]
        fn while_body_without_braces() {
            let dom = build(&method_source("while (a > 0) a -= 1;")).unwrap();
            let statement = dom.root().classes()[0].methods()[0].statements()[0];
            assert!(matches!(statement.kind(), NodeKind::While { braced: false }));
            let body = statement.statements();
            assert!(matches!(body[0].kind(), NodeKind::Assignment { operator } if operator == "-="));
            assert_eq!(
                rebuild(&dom, statement.id()).unwrap(),
                "while (a > 0)\n    a -= 1;"
            );
        }
    }

    mod simple {
        use super::*;

        #[test]
        fn locals_split_and_keep_const() {
            let dom = build(&method_source("const int k = 4; int x = 1, y;")).unwrap();
            let method = dom.root().classes()[0].methods()[0];
            let locals = method.statements();
            let names: Vec<String> = locals.iter().map(|l| l.name()).collect();
            assert_eq!(names, vec!["k", "x", "y"]);
            assert_eq!(rebuild(&dom, locals[0].id()).unwrap(), "const int k = 4;");
            assert_eq!(rebuild(&dom, locals[2].id()).unwrap(), "int y;");
            assert_eq!(locals[1].return_type().map(|t| t.name()), Some("int".to_string()));
        }

        #[test]
        fn assignment_and_invocation_names() {
            let dom = build(&method_source("this.total += a; Console.WriteLine(a);")).unwrap();
            let statements = dom.root().classes()[0].methods()[0].statements();
            assert_eq!(statements[0].name(), "this.total");
            assert_eq!(statements[1].name(), "Console.WriteLine");
            assert_eq!(rebuild(&dom, statements[0].id()).unwrap(), "this.total += a;");
        }

        #[test]
        fn return_with_and_without_value() {
            let dom = build("class C { int M() { return 1; } void N() { return; } }").unwrap();
            let methods = dom.root().classes()[0].methods();
            assert!(methods[0].statements()[0].child(Slot::Value).is_some());
            assert!(methods[1].statements()[0].child(Slot::Value).is_none());
            assert_eq!(rebuild(&dom, methods[1].statements()[0].id()).unwrap(), "return;");
        }

        #[test]
        fn conditional_over_a_type_test_round_trips() {
            let source = "class C { int M() { return a is B ? 1 : 2; } }";
            let dom = build(source).unwrap();
            let statement = dom.root().classes()[0].methods()[0].statements()[0];
            let value = statement.child(Slot::Value).unwrap();
            assert!(matches!(
                value.kind(),
                NodeKind::Expression { syntax_kind, .. } if *syntax_kind == SyntaxKind::ConditionalExpression
            ));
            assert_eq!(rebuild(&dom, statement.id()).unwrap(), "return a is B ? 1 : 2;");
            let rebuilt = build(&rebuild(&dom, dom.root_id()).unwrap()).unwrap();
            assert!(dom.same_intent(&rebuilt, false));
        }

        #[test]
        fn statement_annotations_survive_rebuild() {
            let dom = build(&method_source("//[[ Hot ]]\nRun(a);")).unwrap();
            let statement = dom.root().classes()[0].methods()[0].statements()[0];
            assert!(statement.annotations().get("Hot").is_some());
            assert_eq!(rebuild(&dom, statement.id()).unwrap(), "//[[ Hot ]]\nRun(a);");
        }

        #[test]
        fn nested_blocks() {
            let dom = build(&method_source("{ Run(a); }")).unwrap();
            let block = dom.root().classes()[0].methods()[0].statements()[0];
            assert_eq!(block.kind_name(), "Block");
            assert_eq!(block.statements().len(), 1);
        }
    }
}
