//! Tree rewriting with path copying.

use super::tree::{SyntaxElement, SyntaxNode, SyntaxToken};
use std::sync::Arc;

/// Callbacks for [`rewrite`].
///
/// `offset` is always the byte offset of the node's first trivia byte in the
/// tree being rewritten, so diagnostics can point into the input text even
/// after earlier siblings were replaced.
pub trait Rewriter {
    /// Replace `node` before its children are visited.
    ///
    /// Returning `Some` skips the subtree.
    fn enter(&mut self, _node: &Arc<SyntaxNode>, _offset: usize) -> Option<Arc<SyntaxNode>> {
        None
    }

    /// Replace `node` after its children were rewritten.
    ///
    /// `original` is the node as it appears in the input tree (bindings are
    /// keyed by it); `rebuilt` has the rewritten children and the same child
    /// layout. Returning `None` keeps `rebuilt`.
    fn leave(
        &mut self,
        _original: &Arc<SyntaxNode>,
        _rebuilt: &Arc<SyntaxNode>,
        _offset: usize,
    ) -> Option<Arc<SyntaxNode>> {
        None
    }
}

/// Rewrite `root`, sharing every subtree the rewriter leaves alone.
///
/// Returns the same `Arc` when nothing changed.
pub fn rewrite<R: Rewriter + ?Sized>(root: &Arc<SyntaxNode>, rewriter: &mut R) -> Arc<SyntaxNode> {
    rewrite_at(root, 0, rewriter)
}

fn rewrite_at<R: Rewriter + ?Sized>(
    node: &Arc<SyntaxNode>,
    offset: usize,
    rewriter: &mut R,
) -> Arc<SyntaxNode> {
    if let Some(replacement) = rewriter.enter(node, offset) {
        return replacement;
    }

    let mut changed = None;
    let mut child_offset = offset;
    for (i, child) in node.children().iter().enumerate() {
        if let SyntaxElement::Node(inner) = &child.element {
            let new = rewrite_at(inner, child_offset, rewriter);
            if !Arc::ptr_eq(&new, inner) {
                let children = changed.get_or_insert_with(|| node.children().to_vec());
                children[i].element = SyntaxElement::Node(new);
            }
        }
        child_offset += child.element.full_len();
    }

    let rebuilt = match changed {
        Some(children) => node.with_children(children),
        None => Arc::clone(node),
    };
    rewriter.leave(node, &rebuilt, offset).unwrap_or(rebuilt)
}

/// Rebuild every token of `node` through `f`, in source order.
pub fn map_tokens(
    node: &Arc<SyntaxNode>,
    f: &mut dyn FnMut(&SyntaxToken) -> SyntaxToken,
) -> Arc<SyntaxNode> {
    let children = node
        .children()
        .iter()
        .map(|child| {
            let mut child = child.clone();
            child.element = match &child.element {
                SyntaxElement::Node(inner) => SyntaxElement::Node(map_tokens(inner, f)),
                SyntaxElement::Token(token) => f(token).into_element(),
            };
            child
        })
        .collect();
    node.with_children(children)
}
