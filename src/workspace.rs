//! Opens documents: parse, lower, attach a resolver.

use crate::document::Document;
use crate::error::ConvertError;
use crate::parser::CSharpParser;
use crate::resolve::{ImportScopeResolver, SymbolResolver};
use crate::rules::RuleSet;
use crate::syntax;
use std::path::Path;
use std::sync::Arc;

/// Supplies documents with trees and bindings
#[derive(Debug)]
pub struct Workspace {
    parser: CSharpParser,
    resolver: Arc<dyn SymbolResolver>,
}

impl Workspace {
    /// Workspace resolving names against the rule set's type catalog.
    pub fn new(rules: &RuleSet) -> Result<Self, ConvertError> {
        let resolver = Arc::new(ImportScopeResolver::new(Arc::clone(&rules.catalog)));
        Self::with_resolver(resolver)
    }

    pub fn with_resolver(resolver: Arc<dyn SymbolResolver>) -> Result<Self, ConvertError> {
        let parser = CSharpParser::new().map_err(ConvertError::Grammar)?;
        Ok(Self { parser, resolver })
    }

    /// Parse `source` into a document identified by `path`.
    pub fn open(&mut self, path: impl AsRef<Path>, source: &str) -> Result<Document, ConvertError> {
        let path = path.as_ref();
        let tree = self
            .parser
            .parse(source)
            .map_err(|source| ConvertError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let tree = syntax::lower(&tree, source);
        tracing::trace!(path = %path.display(), bytes = source.len(), "opened document");
        Ok(Document::new(path, tree, Arc::clone(&self.resolver)))
    }
}
