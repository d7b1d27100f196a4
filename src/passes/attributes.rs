//! Test attribute remapping.
//!
//! Type declarations lose `[TestClass]`; test methods get `[Fact]` instead of
//! `[TestMethod]`, and an `[Ignore]` next to it becomes the marker's `Skip`
//! argument.

use super::{Pass, PassResult};
use crate::document::Document;
use crate::resolve::Bindings;
use crate::rules::{AttributeRole, AttributeRules};
use crate::syntax::{ast, build, rewrite, Child, Rewriter, SyntaxNode};
use crate::PassId;
use std::sync::Arc;

pub struct AttributePass {
    rules: Arc<AttributeRules>,
}

impl AttributePass {
    pub fn new(rules: Arc<AttributeRules>) -> Self {
        Self { rules }
    }
}

impl Pass for AttributePass {
    fn id(&self) -> PassId {
        PassId::TestAttributes
    }

    fn apply(&self, document: &Document) -> PassResult {
        let bindings = document.bindings();
        let mut rewriter = AttributeRewriter {
            rules: &self.rules,
            bindings: bindings.as_ref(),
        };
        let root = rewrite(document.tree().root(), &mut rewriter);
        PassResult::from_root(document, root, Vec::new())
    }
}

/// An attribute with a known role, by child indices
#[derive(Debug, Clone, Copy)]
struct Found {
    list: usize,
    attribute: usize,
    has_arguments: bool,
}

struct AttributeRewriter<'a> {
    rules: &'a AttributeRules,
    bindings: &'a dyn Bindings,
}

impl Rewriter for AttributeRewriter<'_> {
    fn leave(
        &mut self,
        original: &Arc<SyntaxNode>,
        rebuilt: &Arc<SyntaxNode>,
        _offset: usize,
    ) -> Option<Arc<SyntaxNode>> {
        let kind = original.kind();
        if ast::TYPE_DECLARATIONS.contains(&kind) {
            let found = self.find(original, AttributeRole::TestClass);
            if found.is_empty() || found.iter().any(|f| f.has_arguments) {
                return None;
            }
            let declaration = remove_all(rebuilt, &found)?;
            tracing::trace!(name = %declared_name(original), "removed test class marker");
            Some(declaration)
        } else if kind == "method_declaration" {
            let declaration = self.remap_method(original, rebuilt)?;
            tracing::trace!(name = %declared_name(original), "remapped test method marker");
            Some(declaration)
        } else {
            None
        }
    }
}

impl AttributeRewriter<'_> {
    /// Attributes of `declaration` whose resolved role is `role`.
    fn find(&self, declaration: &SyntaxNode, role: AttributeRole) -> Vec<Found> {
        let mut found = Vec::new();
        for list in ast::attribute_lists(declaration) {
            let Some(list_node) = declaration.children()[list].element.as_node() else {
                continue;
            };
            for attribute in ast::attributes(list_node) {
                let Some(node) = list_node.children()[attribute].element.as_node() else {
                    continue;
                };
                let matches = self
                    .bindings
                    .resolve(node)
                    .and_then(|name| self.rules.roles.lookup(name.as_str()).copied())
                    == Some(role);
                if matches {
                    found.push(Found {
                        list,
                        attribute,
                        has_arguments: has_arguments(node),
                    });
                }
            }
        }
        found
    }

    fn remap_method(&self, original: &SyntaxNode, rebuilt: &Arc<SyntaxNode>) -> Option<Arc<SyntaxNode>> {
        let marker = match self.find(original, AttributeRole::TestMethod)[..] {
            [one] if !one.has_arguments => one,
            _ => return None,
        };
        let skip = match self.find(original, AttributeRole::Skip)[..] {
            [] => None,
            [one] if !one.has_arguments => Some(one),
            _ => return None,
        };

        let list = rebuilt.children()[marker.list].element.as_node()?;
        let attribute = list.children()[marker.attribute].element.as_node()?;
        let attribute = self.remapped_marker(attribute, skip.is_some())?;
        let list = list.replace_child(marker.attribute, attribute.into());
        let declaration = rebuilt.replace_child(marker.list, list.into());
        match skip {
            Some(skip) => remove_all(&declaration, &[skip]),
            None => Some(declaration),
        }
    }

    /// `[TestMethod]` as `[Fact]`, or `[Fact(Skip = "...")]`.
    fn remapped_marker(&self, attribute: &SyntaxNode, skipped: bool) -> Option<Arc<SyntaxNode>> {
        let name = attribute.child_by_field("name")?;
        let mut renamed = build::identifier(&self.rules.marker_name).with_leading(name.leading().to_vec());
        if !skipped {
            renamed = renamed.with_trailing(name.trailing().to_vec());
        }
        let attribute = ast::replace_field(attribute, "name", renamed.into_element())?;
        if !skipped {
            return Some(attribute);
        }

        let arguments = build::named_attribute_arguments(&self.rules.skip_argument, &self.rules.skip_reason)
            .with_trailing(name.trailing().to_vec());
        let mut children: Vec<Child> = attribute
            .children()
            .iter()
            .filter(|c| c.element.kind() != "attribute_argument_list")
            .cloned()
            .collect();
        children.push(Child::new(arguments));
        Some(attribute.with_children(children))
    }
}

/// Present and non-empty argument list.
fn has_arguments(attribute: &SyntaxNode) -> bool {
    ast::attribute_arguments(attribute)
        .is_some_and(|list| !ast::list_items(list, "attribute_argument").is_empty())
}

/// Delete the given attributes, dropping attribute lists that become empty.
///
/// `None` if a comment would be lost.
fn remove_all(declaration: &Arc<SyntaxNode>, found: &[Found]) -> Option<Arc<SyntaxNode>> {
    let mut order: Vec<&Found> = found.iter().collect();
    order.sort_by_key(|f| std::cmp::Reverse((f.list, f.attribute)));

    let mut declaration = Arc::clone(declaration);
    for f in order {
        let list = declaration.children()[f.list].element.as_node()?;
        declaration = if ast::attributes(list).len() == 1 {
            ast::remove_child_merging_trivia(&declaration, f.list)?
        } else {
            let list = ast::remove_list_item(list, f.attribute)?;
            declaration.replace_child(f.list, list.into())
        };
    }
    Some(declaration)
}

fn declared_name(declaration: &SyntaxNode) -> String {
    declaration
        .child_by_field("name")
        .map(|n| n.token_text())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::{run, run_idempotent, MSTEST_USING};
    use crate::rules::RuleSet;
    use pretty_assertions::assert_eq;

    fn pass() -> AttributePass {
        AttributePass::new(RuleSet::mstest_to_xunit().attributes)
    }

    fn with_using(code: &str) -> String {
        format!("{MSTEST_USING}\n{code}")
    }

    #[test]
    fn removes_test_class_keeping_doc_comment() {
        let output = run_idempotent(
            &pass(),
            &with_using("/// <summary>Tests</summary>\n[TestClass]\npublic class Tests\n{\n}\n"),
        );
        assert_eq!(
            output,
            with_using("/// <summary>Tests</summary>\npublic class Tests\n{\n}\n")
        );
    }

    #[test]
    fn keeps_other_attributes_in_order() {
        let output = run(
            &pass(),
            &with_using("[Serializable, TestClass, Obsolete]\n[Category(\"x\")]\npublic class Tests\n{\n}\n"),
        );
        assert_eq!(
            output,
            with_using("[Serializable, Obsolete]\n[Category(\"x\")]\npublic class Tests\n{\n}\n")
        );
    }

    #[test]
    fn renames_test_method() {
        let output = run_idempotent(
            &pass(),
            &with_using(
                "public class Tests\n{\n    // first\n    [TestMethod]\n    public void A() { }\n\n    [Microsoft.VisualStudio.TestTools.UnitTesting.TestMethod]\n    public void B() { }\n}\n",
            ),
        );
        assert_eq!(
            output,
            with_using(
                "public class Tests\n{\n    // first\n    [Fact]\n    public void A() { }\n\n    [Fact]\n    public void B() { }\n}\n",
            )
        );
    }

    #[test]
    fn folds_ignore_in_any_position() {
        let expected = with_using(
            "public class Tests\n{\n    [Fact(Skip = \"Ignored in MSTest\")]\n    public void A() { }\n}\n",
        );
        for attributes in [
            "    [TestMethod]\n    [Ignore]\n",
            "    [Ignore]\n    [TestMethod]\n",
            "    [TestMethod, Ignore]\n",
            "    [Ignore, TestMethod]\n",
        ] {
            let source = with_using(&format!(
                "public class Tests\n{{\n{attributes}    public void A() {{ }}\n}}\n"
            ));
            assert_eq!(run_idempotent(&pass(), &source), expected, "input: {attributes}");
        }
    }

    #[test]
    fn custom_skip_reason() {
        let rules = RuleSet::mstest_with("Flaky", "Xunit", &[]);
        let output = run(
            &AttributePass::new(rules.attributes),
            &with_using("class T\n{\n    [TestMethod][Ignore]\n    void A() { }\n}\n"),
        );
        assert_eq!(
            output,
            with_using("class T\n{\n    [Fact(Skip = \"Flaky\")]\n    void A() { }\n}\n")
        );
    }

    #[test]
    fn shape_mismatches_are_untouched() {
        for attributes in [
            "[TestMethod(\"display\")]",
            "[TestMethod, Ignore(\"why\")]",
            "[TestMethod, TestMethod]",
            "[TestMethod][Ignore][Ignore]",
        ] {
            let source = with_using(&format!("class T\n{{\n    {attributes}\n    void A() {{ }}\n}}\n"));
            assert_eq!(run(&pass(), &source), source, "changed: {attributes}");
        }
    }

    #[test]
    fn unresolved_attributes_are_untouched() {
        let source = "[TestClass]\nclass T\n{\n    [TestMethod]\n    void A() { }\n}\n";
        assert_eq!(run(&pass(), source), source);
    }
}
