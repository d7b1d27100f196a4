//! Lossless syntax trees for C# sources.
//!
//! The tree is lowered from tree-sitter once per document and never mutated
//! afterwards; passes build new trees that share untouched subtrees with the
//! old one.

pub mod ast;
pub mod build;
mod lower;
pub mod rewrite;
pub mod tree;
pub mod trivia;

pub use lower::lower;
pub use rewrite::{rewrite, Rewriter};
pub use tree::{Child, Kind, SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTree, END_OF_FILE};
pub use trivia::{Trivia, TriviaKind};
