//! Rewrite passes.
//!
//! A pass is a pure function from a document to a new document plus
//! diagnostics. Each pass binds the input tree once, rewrites it with a
//! [`Rewriter`](crate::syntax::Rewriter), and returns the input document
//! itself when nothing matched.

pub mod assertions;
pub mod attributes;
pub mod expected_exception;
pub mod rename;
pub mod usings;

pub use assertions::AssertionPass;
pub use attributes::AttributePass;
pub use expected_exception::ExpectedExceptionPass;
pub use rename::RenamePass;
pub use usings::UsingPass;

use crate::document::Document;
use crate::rules::AssertTarget;
use crate::syntax::{ast, build, SyntaxNode, SyntaxTree};
use crate::{Diagnostic, PassId};
use std::sync::Arc;

/// A single tree-rewrite pass
pub trait Pass: Send + Sync {
    fn id(&self) -> PassId;

    /// Rewrite `document`. Never fails; problems become diagnostics.
    fn apply(&self, document: &Document) -> PassResult;
}

/// Output of one pass
#[derive(Debug, Clone)]
pub struct PassResult {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the tree changed
    pub changed: bool,
}

impl PassResult {
    /// Wrap a rewritten root, reusing `input` when the root is unchanged.
    pub(crate) fn from_root(
        input: &Document,
        root: Arc<SyntaxNode>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let changed = !Arc::ptr_eq(&root, input.tree().root());
        let document = if changed {
            input.with_tree(SyntaxTree::new(root))
        } else {
            input.clone()
        };
        Self {
            document,
            diagnostics,
            changed,
        }
    }
}

/// Apply one pass to one document.
pub fn apply(pass: &dyn Pass, document: &Document) -> PassResult {
    let result = pass.apply(document);
    tracing::debug!(
        path = %document.path().display(),
        pass = %pass.id(),
        changed = result.changed,
        diagnostics = result.diagnostics.len(),
        "applied pass"
    );
    result
}

/// Point a member access at the target assertion type, keeping the old
/// receiver's trivia.
///
/// A bare receiver stays bare; the import normalizer covers it. Qualified and
/// aliased receivers get the namespace-qualified target.
pub(crate) fn with_receiver(access: &Arc<SyntaxNode>, target: &AssertTarget) -> Option<Arc<SyntaxNode>> {
    let current = access.child_by_field("expression")?;
    if current.kind() == "identifier" && current.token_text() == target.name {
        return Some(Arc::clone(access));
    }
    let replacement = build::qualified_name(&target.qualified)
        .with_leading(current.leading().to_vec())
        .with_trailing(current.trailing().to_vec());
    ast::replace_field(access, "expression", replacement)
}
