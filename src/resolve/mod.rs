//! Name resolution: binding call sites to canonical identities.
//!
//! Resolution and rule matching are kept apart. A [`SymbolResolver`] binds a
//! whole tree once and answers "what does this invocation or attribute refer
//! to"; a [`Matcher`] only looks the answer up in a rule table, so passes can
//! be tested against hand-written [`Bindings`].

mod scope;

pub use scope::{ImportScopeResolver, TypeCatalog};

use crate::rules::RuleTable;
use crate::syntax::{SyntaxNode, SyntaxTree};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::sync::Arc;

/// Fully-qualified dotted name of a resolved type or member,
/// e.g. `Microsoft.VisualStudio.TestTools.UnitTesting.Assert.AreEqual`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalName(String);

impl CanonicalName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Type.Member`
    pub fn member(&self, member: &str) -> Self {
        Self(format!("{}.{}", self.0, member))
    }
}

impl std::fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CanonicalName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CanonicalName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Produces the bindings of a tree.
///
/// Binding is the only point where a pass waits on name analysis; it is called
/// once per pass, before any rewriting starts.
pub trait SymbolResolver: Send + Sync + std::fmt::Debug {
    fn bind(&self, tree: &SyntaxTree) -> Arc<dyn Bindings>;
}

/// Resolved names of one tree.
pub trait Bindings: Send + Sync {
    /// Canonical identity of an `invocation_expression` (the invoked member)
    /// or an `attribute` (the attribute type). Nodes must come from the bound
    /// tree. `None` when the target cannot be determined unambiguously.
    fn resolve(&self, node: &SyntaxNode) -> Option<CanonicalName>;
}

/// Resolves call-like nodes against a rule table.
pub struct Matcher<'a, R> {
    bindings: &'a dyn Bindings,
    table: &'a RuleTable<R>,
}

impl<'a, R> Matcher<'a, R> {
    pub fn new(bindings: &'a dyn Bindings, table: &'a RuleTable<R>) -> Self {
        Self { bindings, table }
    }

    /// Canonical identity and rule for `node`, if it resolves into the table.
    pub fn find(&self, node: &SyntaxNode) -> Option<(CanonicalName, &'a R)> {
        let name = self.bindings.resolve(node)?;
        let rule = self.table.lookup(name.as_str())?;
        Some((name, rule))
    }

    pub fn resolve(&self, node: &SyntaxNode) -> Option<CanonicalName> {
        self.bindings.resolve(node)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::TextBindings;
    use super::*;
    use crate::syntax::build;

    fn call(function: &str) -> Arc<SyntaxNode> {
        build::invocation(build::qualified_name(function), build::argument_list(Vec::new()))
    }

    #[test]
    fn matcher_looks_up_resolved_identity() {
        let bindings = TextBindings(
            [("Assert.IsTrue".to_string(), CanonicalName::from("Fw.Assert.IsTrue"))]
                .into_iter()
                .collect(),
        );
        let table = RuleTable::new([("Fw.Assert.IsTrue", 1usize)]);
        let matcher = Matcher::new(&bindings, &table);

        let (name, arity) = matcher.find(&call("Assert.IsTrue")).unwrap();
        assert_eq!(name.as_str(), "Fw.Assert.IsTrue");
        assert_eq!(*arity, 1);
        assert!(matcher.find(&call("Other.IsTrue")).is_none());
    }

    #[test]
    fn resolved_but_absent_from_table_is_no_match() {
        let bindings = TextBindings(
            [("Assert.Fail".to_string(), CanonicalName::from("Fw.Assert.Fail"))]
                .into_iter()
                .collect(),
        );
        let table: RuleTable<usize> = RuleTable::new([("Fw.Assert.IsTrue", 1)]);
        let matcher = Matcher::new(&bindings, &table);
        assert!(matcher.resolve(&call("Assert.Fail")).is_some());
        assert!(matcher.find(&call("Assert.Fail")).is_none());
    }

    #[test]
    fn canonical_names_compose_members() {
        let assert = CanonicalName::from("Xunit.Assert");
        assert_eq!(assert.member("Equal").to_string(), "Xunit.Assert.Equal");
    }
}
