//! Assertion renaming: `Assert.AreEqual(a, b)` to `Assert.Equal(a, b)`.

use super::{Pass, PassResult};
use crate::document::Document;
use crate::resolve::Matcher;
use crate::rules::{ArgumentTransform, AssertTarget, RuleEntry, RuleTable};
use crate::syntax::{ast, build, rewrite, Rewriter, SyntaxElement, SyntaxNode};
use crate::PassId;
use std::sync::Arc;

pub struct RenamePass {
    table: Arc<RuleTable<RuleEntry>>,
    target: Arc<AssertTarget>,
}

impl RenamePass {
    pub fn new(table: Arc<RuleTable<RuleEntry>>, target: Arc<AssertTarget>) -> Self {
        Self { table, target }
    }
}

impl Pass for RenamePass {
    fn id(&self) -> PassId {
        PassId::AssertRename
    }

    fn apply(&self, document: &Document) -> PassResult {
        let bindings = document.bindings();
        let mut rewriter = RenameRewriter {
            matcher: Matcher::new(bindings.as_ref(), &self.table),
            target: &self.target,
        };
        let root = rewrite(document.tree().root(), &mut rewriter);
        PassResult::from_root(document, root, Vec::new())
    }
}

struct RenameRewriter<'a> {
    matcher: Matcher<'a, RuleEntry>,
    target: &'a AssertTarget,
}

impl Rewriter for RenameRewriter<'_> {
    fn leave(
        &mut self,
        original: &Arc<SyntaxNode>,
        rebuilt: &Arc<SyntaxNode>,
        _offset: usize,
    ) -> Option<Arc<SyntaxNode>> {
        if original.kind() != "invocation_expression" {
            return None;
        }
        let (name, entry) = self.matcher.find(original)?;
        let call = rename_call(rebuilt, entry, self.target)?;
        tracing::trace!(%name, "renamed assertion");
        Some(call)
    }
}

fn rename_call(call: &Arc<SyntaxNode>, entry: &RuleEntry, target: &AssertTarget) -> Option<Arc<SyntaxNode>> {
    let rename = entry.rename.as_deref()?;
    let list = call.node_by_field("arguments")?;
    if list.has_error() || ast::positional_arguments(list)?.len() != entry.arity {
        return None;
    }
    let access = call.node_by_field("function")?;
    if access.kind() != "member_access_expression" || !access.has_token(".") {
        return None;
    }

    let name = access.child_by_field("name")?;
    let renamed = renamed_member(name, rename)?;
    let access = ast::replace_field(access, "name", renamed)?;
    let access = super::with_receiver(&access, target)?;

    let list = match entry.transform {
        None => Arc::clone(list),
        Some(ArgumentTransform::Swap) => match ast::list_items(list, "argument")[..] {
            [first, second, ..] => ast::swap_list_items(list, first, second),
            _ => return None,
        },
        // Type-argument reshaping belongs to the demoter.
        Some(ArgumentTransform::TypeArgument { .. }) => return None,
    };

    let call = ast::replace_field(call, "function", access.into())?;
    ast::replace_field(&call, "arguments", list.into())
}

/// The member name with a new identifier; type arguments and trivia stay.
fn renamed_member(name: &SyntaxElement, rename: &str) -> Option<SyntaxElement> {
    let with_trivia = |old: &SyntaxElement| {
        build::identifier(rename)
            .with_leading(old.leading().to_vec())
            .with_trailing(old.trailing().to_vec())
            .into_element()
    };
    match name.kind() {
        "identifier" => Some(with_trivia(name)),
        "generic_name" => {
            let node = name.as_node()?;
            let identifier = &node.children().first()?.element;
            if identifier.kind() != "identifier" {
                return None;
            }
            Some(node.replace_child(0, with_trivia(identifier)).into())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::{run, run_idempotent, MSTEST_USING};
    use crate::rules::RuleSet;
    use pretty_assertions::assert_eq;

    fn pass() -> RenamePass {
        let rules = RuleSet::mstest_to_xunit();
        RenamePass::new(rules.renames, rules.assert_target)
    }

    fn body(statements: &str) -> String {
        format!("{MSTEST_USING}class T\n{{\n    void M()\n    {{\n{statements}    }}\n}}\n")
    }

    #[test]
    fn renames_table_entries() {
        let output = run_idempotent(
            &pass(),
            &body(
                "        Assert.AreEqual(1, x);\n        Assert.IsTrue(ok);\n        Assert.IsNotNull(y);\n        Assert.AreNotSame(a, b);\n",
            ),
        );
        assert_eq!(
            output,
            body(
                "        Assert.Equal(1, x);\n        Assert.True(ok);\n        Assert.NotNull(y);\n        Assert.NotSame(a, b);\n",
            )
        );
    }

    #[test]
    fn swaps_instance_of_type_arguments() {
        let output = run_idempotent(&pass(), &body("        Assert.IsInstanceOfType(value, expected);\n"));
        assert_eq!(output, body("        Assert.IsAssignableFrom(expected, value);\n"));
    }

    #[test]
    fn keeps_type_arguments_and_layout() {
        let output = run(
            &pass(),
            &body("        Assert.AreEqual<int>(\n            1,\n            x);\n"),
        );
        assert_eq!(output, body("        Assert.Equal<int>(\n            1,\n            x);\n"));
    }

    #[test]
    fn renames_nested_calls() {
        let output = run(&pass(), &body("        Assert.IsTrue(Check(() => Assert.IsFalse(bad)));\n"));
        assert_eq!(output, body("        Assert.True(Check(() => Assert.False(bad)));\n"));
    }

    #[test]
    fn arity_mismatch_is_untouched() {
        for statement in [
            "        Assert.AreEqual(1, x, \"message\");\n",
            "        Assert.AreEqual(1.0, x, 0.1);\n",
            "        Assert.IsTrue(condition: ok);\n",
        ] {
            let source = body(statement);
            assert_eq!(run(&pass(), &source), source, "changed: {statement}");
        }
    }

    #[test]
    fn qualified_and_aliased_receivers_get_qualified_target() {
        let output = run_idempotent(
            &pass(),
            "using UT = Microsoft.VisualStudio.TestTools.UnitTesting;
class T
{
    void M()
    {
        UT.Assert.AreEqual(1, x);
        global::Microsoft.VisualStudio.TestTools.UnitTesting.Assert.IsTrue(ok);
    }
}
",
        );
        assert_eq!(
            output,
            "using UT = Microsoft.VisualStudio.TestTools.UnitTesting;
class T
{
    void M()
    {
        Xunit.Assert.Equal(1, x);
        Xunit.Assert.True(ok);
    }
}
"
        );
    }

    #[test]
    fn other_receivers_are_untouched() {
        let source = "using Xunit;\nclass T\n{\n    void M()\n    {\n        Assert.AreEqual(1, x);\n    }\n}\n";
        assert_eq!(run(&pass(), source), source);
    }
}
