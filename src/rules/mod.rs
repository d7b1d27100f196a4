//! Rule tables: immutable mappings from canonical identity to rewrite data.
//!
//! Tables are built once (see [`RuleSet::mstest_to_xunit`]) and shared between
//! passes and threads through `Arc`; nothing mutates them afterwards.

mod mstest;

pub use mstest::{MSTEST_NAMESPACE, SKIP_REASON, XUNIT_NAMESPACE};

use crate::resolve::TypeCatalog;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only lookup table keyed by canonical identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable<R> {
    entries: HashMap<String, R>,
}

impl<R> RuleTable<R> {
    pub fn new<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, R)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, r)| (k.into(), r)).collect(),
        }
    }

    pub fn lookup(&self, identity: &str) -> Option<&R> {
        self.entries.get(identity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How a call's arguments are reshaped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentTransform {
    /// Move the `typeof(T)` argument at `index` into the member's type
    /// argument list
    TypeArgument { index: usize },
    /// Exchange the first two arguments
    Swap,
}

/// Rewrite data for one assertion member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    /// Positional argument count of the matched overload, message excluded
    pub arity: usize,
    pub rename: Option<String>,
    pub transform: Option<ArgumentTransform>,
}

impl RuleEntry {
    pub fn arity(arity: usize) -> Self {
        Self {
            arity,
            rename: None,
            transform: None,
        }
    }

    pub fn renamed(mut self, name: &str) -> Self {
        self.rename = Some(name.to_string());
        self
    }

    pub fn with_transform(mut self, transform: ArgumentTransform) -> Self {
        self.transform = Some(transform);
        self
    }
}

/// Semantic role of a marker attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeRole {
    TestClass,
    TestMethod,
    Skip,
    ExpectedException,
}

/// Attribute roles plus what they turn into
#[derive(Debug, Clone)]
pub struct AttributeRules {
    pub roles: RuleTable<AttributeRole>,
    /// Canonical identity of the target test marker (`Xunit.FactAttribute`)
    pub target_marker: String,
    /// Name written for the target test marker
    pub marker_name: String,
    /// Named argument carrying the skip reason
    pub skip_argument: String,
    pub skip_reason: String,
}

impl AttributeRules {
    /// True for a source or target test-method marker.
    pub fn is_test_marker(&self, identity: &str) -> bool {
        identity == self.target_marker
            || self.roles.lookup(identity) == Some(&AttributeRole::TestMethod)
    }
}

/// Names used to build throws-assertions
#[derive(Debug, Clone)]
pub struct ExceptionRules {
    pub assert_type: String,
    pub throws: String,
    pub throws_any: String,
    pub throws_async: String,
    pub throws_any_async: String,
    /// Named expectation argument that accepts derived exception types
    pub allow_derived: String,
}

impl ExceptionRules {
    pub fn method(&self, allow_derived: bool, is_async: bool) -> &str {
        match (allow_derived, is_async) {
            (false, false) => &self.throws,
            (true, false) => &self.throws_any,
            (false, true) => &self.throws_async,
            (true, true) => &self.throws_any_async,
        }
    }
}

/// Type that rewritten assertions are called on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertTarget {
    /// Written in place of a bare receiver
    pub name: String,
    /// Written in place of a qualified or aliased receiver, which the
    /// target import does not cover
    pub qualified: String,
}

/// Framework namespaces for the import normalizer
#[derive(Debug, Clone)]
pub struct ImportRules {
    /// Namespaces that are replaced by the target
    pub sources: Vec<String>,
    /// Framework namespaces that only appear in conditional branches
    pub alternates: Vec<String>,
    pub target: String,
}

impl ImportRules {
    pub fn is_source(&self, namespace: &str) -> bool {
        self.sources.iter().any(|s| s == namespace)
    }

    /// Source, alternate or target framework namespace.
    pub fn is_framework(&self, namespace: &str) -> bool {
        self.is_source(namespace)
            || namespace == self.target
            || self.alternates.iter().any(|s| s == namespace)
    }
}

/// Every table the passes need, shared through `Arc`
#[derive(Debug, Clone)]
pub struct RuleSet {
    /// Message demotion and type-check reshaping
    pub assertions: Arc<RuleTable<RuleEntry>>,
    /// Assertion renames
    pub renames: Arc<RuleTable<RuleEntry>>,
    pub assert_target: Arc<AssertTarget>,
    pub attributes: Arc<AttributeRules>,
    pub exceptions: Arc<ExceptionRules>,
    pub imports: Arc<ImportRules>,
    /// Types the resolver binds to
    pub catalog: Arc<TypeCatalog>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_exact() {
        let table = RuleTable::new([("A.B.C", RuleEntry::arity(1))]);
        assert!(table.lookup("A.B.C").is_some());
        assert!(table.lookup("a.b.c").is_none());
        assert!(table.lookup("B.C").is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn exception_method_selection() {
        let rules = RuleSet::mstest_to_xunit();
        assert_eq!(rules.exceptions.method(false, false), "Throws");
        assert_eq!(rules.exceptions.method(true, false), "ThrowsAny");
        assert_eq!(rules.exceptions.method(false, true), "ThrowsAsync");
        assert_eq!(rules.exceptions.method(true, true), "ThrowsAnyAsync");
    }

    #[test]
    fn both_frameworks_markers_are_test_markers() {
        let rules = RuleSet::mstest_to_xunit();
        let attributes = &rules.attributes;
        assert!(attributes.is_test_marker("Xunit.FactAttribute"));
        assert!(attributes.is_test_marker(&format!("{MSTEST_NAMESPACE}.TestMethodAttribute")));
        assert!(!attributes.is_test_marker(&format!("{MSTEST_NAMESPACE}.IgnoreAttribute")));
    }
}
