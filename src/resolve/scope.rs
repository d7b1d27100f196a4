//! Import-scope resolution.
//!
//! A lightweight stand-in for full semantic binding: names are resolved the way
//! the C# compiler looks up type names (aliases, enclosing namespaces, fully
//! qualified names, then `using` imports) but only against a fixed catalog of
//! known types. Anything the catalog cannot decide unambiguously is left
//! unresolved.

use super::{Bindings, CanonicalName, SymbolResolver};
use crate::syntax::ast::{self, DottedName, UsingKind};
use crate::syntax::{SyntaxNode, SyntaxTree};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Fully-qualified names of the types resolution may bind to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCatalog {
    types: HashSet<String>,
}

impl TypeCatalog {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.types.insert(name.into());
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Resolver binding names through `using` directives and namespaces.
#[derive(Debug, Clone)]
pub struct ImportScopeResolver {
    catalog: Arc<TypeCatalog>,
}

impl ImportScopeResolver {
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self { catalog }
    }
}

impl SymbolResolver for ImportScopeResolver {
    fn bind(&self, tree: &SyntaxTree) -> Arc<dyn Bindings> {
        let mut binder = Binder {
            catalog: &self.catalog,
            declared: Declared::collect(tree.root()),
            names: HashMap::new(),
        };
        binder.visit(tree.root(), &Scope::default());
        tracing::trace!(bound = binder.names.len(), "bound names");
        Arc::new(ScopeBindings {
            _root: Arc::clone(tree.root()),
            names: binder.names,
        })
    }
}

/// Bindings keyed by node address.
struct ScopeBindings {
    /// Keeps the bound nodes alive so their addresses stay unique.
    _root: Arc<SyntaxNode>,
    names: HashMap<usize, CanonicalName>,
}

impl Bindings for ScopeBindings {
    fn resolve(&self, node: &SyntaxNode) -> Option<CanonicalName> {
        self.names.get(&node_key(node)).cloned()
    }
}

fn node_key(node: &SyntaxNode) -> usize {
    node as *const SyntaxNode as usize
}

/// Names declared in the file itself. They hide imported names.
#[derive(Debug, Default)]
struct Declared {
    types: HashSet<String>,
    methods: HashSet<String>,
}

impl Declared {
    fn collect(root: &Arc<SyntaxNode>) -> Self {
        let mut declared = Self::default();
        declared.visit(root);
        declared
    }

    fn visit(&mut self, node: &Arc<SyntaxNode>) {
        let name = || node.child_by_field("name").map(|n| n.token_text());
        match node.kind() {
            "class_declaration" | "struct_declaration" | "record_declaration"
            | "interface_declaration" | "enum_declaration" | "delegate_declaration" => {
                self.types.extend(name());
            }
            "method_declaration" | "local_function_statement" => {
                self.methods.extend(name());
            }
            _ => {}
        }
        for child in node.child_nodes() {
            self.visit(child);
        }
    }
}

/// Imports visible at a point in the file
#[derive(Debug, Clone, Default)]
struct Scope {
    namespace: Vec<String>,
    usings: Vec<String>,
    aliases: HashMap<String, String>,
    statics: Vec<String>,
}

impl Scope {
    /// Add the `using` directives that are direct children of `container`,
    /// including those inside conditional-compilation branches.
    fn import(&mut self, container: &SyntaxNode) {
        for child in container.child_nodes() {
            if let Some(using) = ast::using_directive(child) {
                let target = using.name.joined();
                match using.kind {
                    UsingKind::Namespace => self.usings.push(target),
                    UsingKind::Static => self.statics.push(target),
                    UsingKind::Alias(alias) => {
                        self.aliases.insert(alias, target);
                    }
                }
            } else if child.kind().starts_with("preproc_") {
                self.import(child);
            }
        }
    }
}

struct Binder<'a> {
    catalog: &'a TypeCatalog,
    declared: Declared,
    names: HashMap<usize, CanonicalName>,
}

impl Binder<'_> {
    fn visit(&mut self, node: &Arc<SyntaxNode>, scope: &Scope) {
        match node.kind() {
            "compilation_unit" => {
                let mut scope = scope.clone();
                scope.import(node);
                for child in node.child_nodes() {
                    if child.kind() == "file_scoped_namespace_declaration" {
                        if let Some(name) = child.child_by_field("name").and_then(ast::dotted_name) {
                            scope.namespace.extend(name.parts);
                        }
                    }
                    self.visit(child, &scope);
                }
                return;
            }
            "namespace_declaration" => {
                let mut inner = scope.clone();
                if let Some(name) = node.child_by_field("name").and_then(ast::dotted_name) {
                    inner.namespace.extend(name.parts);
                }
                if let Some(body) = node.node_by_field("body") {
                    inner.import(body);
                    for child in body.child_nodes() {
                        self.visit(child, &inner);
                    }
                }
                return;
            }
            "invocation_expression" => {
                if let Some(name) = self.resolve_invocation(node, scope) {
                    self.names.insert(node_key(node), name);
                }
            }
            "attribute" => {
                if let Some(name) = self.resolve_attribute(node, scope) {
                    self.names.insert(node_key(node), name);
                }
            }
            _ => {}
        }
        for child in node.child_nodes() {
            self.visit(child, scope);
        }
    }

    fn resolve_invocation(&self, node: &SyntaxNode, scope: &Scope) -> Option<CanonicalName> {
        let function = node.child_by_field("function")?;
        match function.kind() {
            "member_access_expression" => {
                let access = function.as_node()?;
                if !access.has_token(".") {
                    return None;
                }
                let receiver = ast::dotted_name(access.child_by_field("expression")?)?;
                let member = ast::simple_name(access.child_by_field("name")?)?;
                let owner = self.resolve_type(&receiver, scope)?;
                Some(owner.member(&member))
            }
            "identifier" | "generic_name" => {
                let member = ast::simple_name(function)?;
                if self.declared.methods.contains(&member) {
                    return None;
                }
                let owners: BTreeSet<&String> = scope
                    .statics
                    .iter()
                    .filter(|t| self.catalog.contains(t))
                    .collect();
                match owners.into_iter().collect::<Vec<_>>().as_slice() {
                    [owner] => Some(CanonicalName::new(owner.as_str()).member(&member)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// `[Name]` binds to `NameAttribute` or `Name`; both existing is ambiguous.
    fn resolve_attribute(&self, node: &SyntaxNode, scope: &Scope) -> Option<CanonicalName> {
        let name = ast::dotted_name(node.child_by_field("name")?)?;
        let mut suffixed = name.clone();
        if let Some(last) = suffixed.parts.last_mut() {
            last.push_str("Attribute");
        }
        match (
            self.resolve_type(&suffixed, scope),
            self.resolve_type(&name, scope),
        ) {
            (Some(a), Some(b)) if a != b => None,
            (Some(a), _) => Some(a),
            (None, b) => b,
        }
    }

    fn resolve_type(&self, name: &DottedName, scope: &Scope) -> Option<CanonicalName> {
        let first = name.parts.first()?;
        let joined = name.joined();
        let known = |candidate: String| {
            self.catalog
                .contains(&candidate)
                .then(|| CanonicalName::new(candidate))
        };

        if name.global {
            return known(joined);
        }
        if self.declared.types.contains(first) {
            return None;
        }
        if let Some(target) = scope.aliases.get(first) {
            let rest = &name.parts[1..];
            let expanded = std::iter::once(target.as_str())
                .chain(rest.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(".");
            return known(expanded);
        }
        for depth in (1..=scope.namespace.len()).rev() {
            let candidate = format!("{}.{}", scope.namespace[..depth].join("."), joined);
            if let Some(found) = known(candidate) {
                return Some(found);
            }
        }
        if let Some(found) = known(joined.clone()) {
            return Some(found);
        }
        if name.parts.len() > 1 {
            return None;
        }
        let imported: BTreeSet<String> = scope
            .usings
            .iter()
            .map(|ns| format!("{ns}.{joined}"))
            .filter(|candidate| self.catalog.contains(candidate))
            .collect();
        match imported.len() {
            1 => imported.into_iter().next().map(CanonicalName::new),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CSharpParser;
    use crate::syntax::lower;

    const MSTEST: &str = "Microsoft.VisualStudio.TestTools.UnitTesting";

    fn catalog() -> Arc<TypeCatalog> {
        Arc::new(TypeCatalog::new([
            format!("{MSTEST}.Assert"),
            format!("{MSTEST}.TestMethodAttribute"),
            format!("{MSTEST}.IgnoreAttribute"),
            "Xunit.Assert".to_string(),
            "Xunit.FactAttribute".to_string(),
        ]))
    }

    fn parse(source: &str) -> SyntaxTree {
        let mut parser = CSharpParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        lower(&tree, source)
    }

    fn collect<'a>(node: &'a Arc<SyntaxNode>, kind: &str, out: &mut Vec<&'a Arc<SyntaxNode>>) {
        if node.kind() == kind {
            out.push(node);
        }
        for child in node.child_nodes() {
            collect(child, kind, out);
        }
    }

    /// Resolved names of every node of `kind`, in source order.
    fn resolve_all(source: &str, kind: &str) -> Vec<Option<String>> {
        let tree = parse(source);
        let bindings = ImportScopeResolver::new(catalog()).bind(&tree);
        let mut nodes = Vec::new();
        collect(tree.root(), kind, &mut nodes);
        nodes
            .into_iter()
            .map(|n| bindings.resolve(n).map(|c| c.to_string()))
            .collect()
    }

    #[test]
    fn resolves_through_namespace_import() {
        let names = resolve_all(
            "using Microsoft.VisualStudio.TestTools.UnitTesting;\nclass T { void M() { Assert.IsTrue(true); Other.IsTrue(true); } }",
            "invocation_expression",
        );
        assert_eq!(
            names,
            vec![Some(format!("{MSTEST}.Assert.IsTrue")), None]
        );
    }

    #[test]
    fn unimported_name_is_unresolved() {
        let names = resolve_all("class T { void M() { Assert.IsTrue(true); } }", "invocation_expression");
        assert_eq!(names, vec![None]);
    }

    #[test]
    fn fully_qualified_and_aliased_names_resolve() {
        let names = resolve_all(
            "using UT = Microsoft.VisualStudio.TestTools.UnitTesting;\nclass T { void M() { UT.Assert.IsTrue(a); global::Microsoft.VisualStudio.TestTools.UnitTesting.Assert.IsFalse(b); } }",
            "invocation_expression",
        );
        assert_eq!(
            names,
            vec![
                Some(format!("{MSTEST}.Assert.IsTrue")),
                Some(format!("{MSTEST}.Assert.IsFalse"))
            ]
        );
    }

    #[test]
    fn ambiguous_imports_are_unresolved() {
        let names = resolve_all(
            "using Microsoft.VisualStudio.TestTools.UnitTesting;\nusing Xunit;\nclass T { void M() { Assert.IsTrue(true); } }",
            "invocation_expression",
        );
        assert_eq!(names, vec![None]);
    }

    #[test]
    fn declared_types_hide_imports() {
        let names = resolve_all(
            "using Microsoft.VisualStudio.TestTools.UnitTesting;\nclass Assert { }\nclass T { void M() { Assert.IsTrue(true); } }",
            "invocation_expression",
        );
        assert_eq!(names, vec![None]);
    }

    #[test]
    fn attributes_resolve_with_and_without_suffix() {
        let names = resolve_all(
            "using Microsoft.VisualStudio.TestTools.UnitTesting;\nclass T { [TestMethod, IgnoreAttribute] [Fact] void M() { } }",
            "attribute",
        );
        assert_eq!(
            names,
            vec![
                Some(format!("{MSTEST}.TestMethodAttribute")),
                Some(format!("{MSTEST}.IgnoreAttribute")),
                None
            ]
        );
    }

    #[test]
    fn usings_inside_namespaces_and_conditional_blocks_count() {
        let names = resolve_all(
            "namespace Tests\n{\n#if NETFX_CORE\n    using Microsoft.VisualStudio.TestPlatform.UnitTestFramework;\n#else\n    using Microsoft.VisualStudio.TestTools.UnitTesting;\n#endif\n    class T { [TestMethod] void M() { } }\n}\n",
            "attribute",
        );
        assert_eq!(names, vec![Some(format!("{MSTEST}.TestMethodAttribute"))]);
    }

    #[test]
    fn static_imports_resolve_bare_calls() {
        let names = resolve_all(
            "using static Microsoft.VisualStudio.TestTools.UnitTesting.Assert;\nclass T { void M() { IsTrue(true); } void Local() { } void N() { Local(); } }",
            "invocation_expression",
        );
        assert_eq!(
            names,
            vec![Some(format!("{MSTEST}.Assert.IsTrue")), None]
        );
    }
}
