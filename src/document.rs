//! Documents: a file's text, its tree and the resolver that binds it.

use crate::resolve::{Bindings, SymbolResolver};
use crate::syntax::SyntaxTree;
use crate::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An immutable source file.
///
/// Passes never modify a document; they return a new one built with
/// [`Document::with_tree`]. The path is the document's identity.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    text: Arc<str>,
    tree: SyntaxTree,
    resolver: Arc<dyn SymbolResolver>,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, tree: SyntaxTree, resolver: Arc<dyn SymbolResolver>) -> Self {
        let text = tree.text().into();
        Self {
            path: path.into(),
            text,
            tree,
            resolver,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn resolver(&self) -> &Arc<dyn SymbolResolver> {
        &self.resolver
    }

    /// Bind the current tree. Called once per pass.
    pub fn bindings(&self) -> Arc<dyn Bindings> {
        self.resolver.bind(&self.tree)
    }

    /// Same path and resolver, new tree.
    pub fn with_tree(&self, tree: SyntaxTree) -> Self {
        Self::new(self.path.clone(), tree, Arc::clone(&self.resolver))
    }

    /// 1-indexed line and character column of a byte offset.
    pub fn location_at(&self, offset: usize) -> Location {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &self.text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        Location::new(line, column)
    }

    /// Location of the byte range `start..end`.
    pub fn span_location(&self, start: usize, end: usize) -> Location {
        let end = self.location_at(end);
        self.location_at(start).with_end(end.line, end.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;
    use crate::workspace::Workspace;

    fn open(source: &str) -> Document {
        let rules = RuleSet::mstest_to_xunit();
        let mut workspace = Workspace::new(&rules).unwrap();
        workspace.open("T.cs", source).unwrap()
    }

    #[test]
    fn text_matches_source() {
        let document = open("class A\n{\n}\n");
        assert_eq!(document.text(), "class A\n{\n}\n");
        assert_eq!(document.path(), Path::new("T.cs"));
    }

    #[test]
    fn locations_are_one_indexed_characters() {
        let document = open("// é\nclass A { }\n");
        assert_eq!(document.location_at(0), Location::new(1, 1));
        assert_eq!(document.location_at(6), Location::new(2, 1));
        assert_eq!(document.location_at(12), Location::new(2, 7));
        assert_eq!(document.location_at(5), Location::new(1, 5));
    }

    #[test]
    fn span_locations_carry_the_end() {
        let document = open("class A\n{\n}\n");
        assert_eq!(document.span_location(0, 11), Location::new(1, 1).with_end(3, 2));
    }

    #[test]
    fn with_tree_keeps_identity() {
        let document = open("class A { }");
        let other = open("class B { }");
        let replaced = document.with_tree(other.tree().clone());
        assert_eq!(replaced.path(), document.path());
        assert_eq!(replaced.text(), "class B { }");
    }
}
