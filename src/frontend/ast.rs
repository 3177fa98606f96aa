//! Abstract Syntax Tree definitions for Rovar
//!
//! The tree is built from one tagged node shape with at most two owned
//! children. List-like constructs (program bodies, block bodies) are
//! right-threaded: a `Statement` node holds its content in `left` and the
//! next statement of the list in `right`.

use std::fmt::Write as _;

/// Node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of a multi-statement program; `left` is the first statement
    Program,
    /// One entry in a statement list; content in `left`, next in `right`
    Statement,
    /// Parenthesized grouping around the expression in `left`
    Expression,
    /// Integer literal, digits in `text`
    Number,
    /// String literal, value in `text`
    Str,
    /// Name reference, name in `text`
    Identifier,
    /// Binary operation, operator symbol in `text`, operands in children
    BinaryOp,
    /// Variable declaration, name in `text`, optional initializer in `left`
    VarDecl,
    /// Braced statement list; introduces a scope, first statement in `left`
    Block,
    /// Placeholder for constructs no rule classifies
    Unknown,
}

/// A node in the syntax tree.
///
/// Each non-root node has exactly one owner, its parent; the whole tree is
/// released when the root goes out of scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub text: Option<String>,
    pub left: Option<Box<Node>>,
    pub right: Option<Box<Node>>,
}

impl Node {
    pub fn new(
        kind: NodeKind,
        text: Option<String>,
        left: Option<Box<Node>>,
        right: Option<Box<Node>>,
    ) -> Self {
        Self {
            kind,
            text,
            left,
            right,
        }
    }

    /// Childless node carrying only a text payload.
    pub fn leaf(kind: NodeKind, text: impl Into<String>) -> Self {
        Self::new(kind, Some(text.into()), None, None)
    }

    /// Binary operation node.
    pub fn binary(op: impl Into<String>, left: Node, right: Node) -> Self {
        Self::new(
            NodeKind::BinaryOp,
            Some(op.into()),
            Some(Box::new(left)),
            Some(Box::new(right)),
        )
    }

    /// Fold statement nodes into a right-threaded chain, first statement
    /// outermost.
    pub fn chain(nodes: Vec<Node>) -> Option<Box<Node>> {
        let mut head = None;
        for mut node in nodes.into_iter().rev() {
            node.right = head.take();
            head = Some(Box::new(node));
        }
        head
    }

    /// Render the tree as an indented listing, one node per line, children
    /// below their parent in left-to-right order.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let indent = "  ".repeat(depth);
            let _ = match &node.text {
                Some(text) => writeln!(out, "{indent}{:?} '{text}'", node.kind),
                None => writeln!(out, "{indent}{:?}", node.kind),
            };
            if let Some(right) = node.right.as_deref() {
                stack.push((right, depth + 1));
            }
            if let Some(left) = node.left.as_deref() {
                stack.push((left, depth + 1));
            }
        }
        out
    }
}

// Right-threaded statement chains can be as long as the program, so the
// release walk must not recurse once per node.
impl Drop for Node {
    fn drop(&mut self) {
        let mut stack: Vec<Box<Node>> = Vec::new();
        stack.extend(self.left.take());
        stack.extend(self.right.take());
        while let Some(mut node) = stack.pop() {
            stack.extend(node.left.take());
            stack.extend(node.right.take());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn chain_preserves_statement_order() {
        let stmts = vec![
            Node::new(
                NodeKind::Statement,
                None,
                Some(Box::new(Node::leaf(NodeKind::Identifier, "a"))),
                None,
            ),
            Node::new(
                NodeKind::Statement,
                None,
                Some(Box::new(Node::leaf(NodeKind::Identifier, "b"))),
                None,
            ),
        ];

        let head = Node::chain(stmts).expect("chain");
        assert_eq!(head.left.as_ref().unwrap().text.as_deref(), Some("a"));
        let next = head.right.as_ref().expect("second statement");
        assert_eq!(next.left.as_ref().unwrap().text.as_deref(), Some("b"));
        assert!(next.right.is_none());
    }

    #[test]
    fn chain_of_nothing_is_empty() {
        assert!(Node::chain(Vec::new()).is_none());
    }

    #[test]
    fn dump_indents_children() {
        let tree = Node::binary(
            "+",
            Node::leaf(NodeKind::Number, "1"),
            Node::leaf(NodeKind::Number, "2"),
        );
        assert_eq!(tree.dump(), "BinaryOp '+'\n  Number '1'\n  Number '2'\n");
    }

    #[test]
    fn deep_chain_drops_without_overflow() {
        // A chain as deep as a long program; released iteratively.
        let mut head = Node::leaf(NodeKind::Number, "0");
        for i in 1..10_000 {
            let mut node = Node::leaf(NodeKind::Number, i.to_string());
            node.right = Some(Box::new(head));
            head = node;
        }
        drop(head);
    }

    #[test]
    fn many_trees_build_and_release() {
        for i in 0..10_000 {
            let tree = Node::binary(
                "*",
                Node::leaf(NodeKind::Number, i.to_string()),
                Node::binary(
                    "+",
                    Node::leaf(NodeKind::Identifier, "x"),
                    Node::leaf(NodeKind::Number, "1"),
                ),
            );
            assert_eq!(tree.kind, NodeKind::BinaryOp);
        }
    }
}
