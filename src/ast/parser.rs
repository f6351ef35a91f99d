//! The statement-to-node builder.

use crate::error::{BuildError, BuildResult};
use crate::statement::split_statements;

use super::{AstNode, ForEach, ForLoop, IfStatement, PrintNode, TextNode, VarDecl, WhileLoop};

/// Split a body and build its nodes; used for every compound statement's
/// recursive descent.
pub fn parse_body(body: &str) -> BuildResult<Vec<AstNode>> {
    parse_statements(&split_statements(body))
}

/// Build nodes from top-level statements, dispatching on the leading
/// keyword. `@if`/`@else if` arms accumulate into one chain; the chain is
/// finalized by its `@else`, by the next unrelated statement, or by the end
/// of the statement list.
pub fn parse_statements(statements: &[String]) -> BuildResult<Vec<AstNode>> {
    let mut nodes = vec![];
    let mut pending_if: Option<IfStatement> = None;

    for statement in statements {
        let line = statement.trim();

        if line.starts_with("@else if") {
            let Some(chain) = pending_if.as_mut() else {
                return Err(
                    BuildError::parse("@else if without matching @if").with_snippet(line)
                );
            };
            chain.add_branch(line)?;
            continue;
        }

        if line.starts_with("@else") {
            let Some(mut chain) = pending_if.take() else {
                return Err(BuildError::parse("@else without matching @if").with_snippet(line));
            };
            chain.add_else(line)?;
            nodes.push(AstNode::If(chain));
            continue;
        }

        // Any other statement ends an open @if chain.
        if let Some(chain) = pending_if.take() {
            nodes.push(AstNode::If(chain));
        }

        if line.starts_with("@var") {
            nodes.push(AstNode::VarDecl(VarDecl::parse(line)?));
        } else if line.starts_with("@print") {
            nodes.push(AstNode::Print(PrintNode::parse(line)));
        } else if line.starts_with("@if") {
            pending_if = Some(IfStatement::open(line)?);
        } else if line.starts_with("@while") {
            nodes.push(AstNode::While(WhileLoop::parse(line)?));
        } else if line.starts_with("@foreach") {
            nodes.push(AstNode::ForEach(ForEach::parse(line)?));
        } else if line.starts_with("@for") {
            nodes.push(AstNode::For(ForLoop::parse(line)?));
        } else if line.starts_with("@break") {
            nodes.push(AstNode::Break);
        } else if line.starts_with("@continue") {
            nodes.push(AstNode::Continue);
        } else {
            nodes.push(AstNode::Text(TextNode::parse(line)));
        }
    }

    if let Some(chain) = pending_if.take() {
        nodes.push(AstNode::If(chain));
    }

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_simple_statements() {
        let nodes = parse_body("@var a = 1; @print(a); @break; @continue;").unwrap();
        assert!(matches!(nodes[0], AstNode::VarDecl(_)));
        assert!(matches!(nodes[1], AstNode::Print(_)));
        assert!(matches!(nodes[2], AstNode::Break));
        assert!(matches!(nodes[3], AstNode::Continue));
    }

    #[test]
    fn test_if_else_chain_is_one_node() {
        let nodes = parse_body(
            "@if (a == 1) { @print(1); } @else if (a == 2) { @print(2); } @else { @print(0); }",
        )
        .unwrap();
        assert_eq!(nodes.len(), 1);
        let AstNode::If(chain) = &nodes[0] else {
            panic!("expected an if chain");
        };
        assert_eq!(chain.branches.len(), 2);
        assert!(chain.else_children.is_some());
    }

    #[test]
    fn test_unrelated_statement_finalizes_open_chain() {
        let nodes = parse_body("@if (a == 1) { @print(1); } @print(\"after\");").unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(matches!(&nodes[0], AstNode::If(chain) if chain.else_children.is_none()));
        assert!(matches!(nodes[1], AstNode::Print(_)));
    }

    #[test]
    fn test_chain_open_at_end_is_finalized() {
        let nodes = parse_body("@if (a == 1) { @print(1); }").unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(matches!(nodes[0], AstNode::If(_)));
    }

    #[test]
    fn test_else_without_if_is_an_error() {
        let err = parse_body("@else { @print(0); }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        let err = parse_body("@else if (a == 1) { }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn test_nested_bodies_parse_recursively() {
        let nodes =
            parse_body("@while (i < 3) { @if (i == 1) { @break; } @print(i); }").unwrap();
        let AstNode::While(while_loop) = &nodes[0] else {
            panic!("expected a while loop");
        };
        assert_eq!(while_loop.children.len(), 2);
        assert!(matches!(while_loop.children[0], AstNode::If(_)));
    }

    #[test]
    fn test_bare_statement_becomes_text() {
        let nodes = parse_body("\"hello\";").unwrap();
        assert!(matches!(&nodes[0], AstNode::Text(text) if text.expr == "\"hello\""));
    }

    #[test]
    fn test_foreach_dispatches_before_for() {
        let nodes = parse_body("@foreach (x in [1]) { @print(x); }").unwrap();
        assert!(matches!(nodes[0], AstNode::ForEach(_)));
    }
}
