//! Import normalization.
//!
//! `using Microsoft.VisualStudio.TestTools.UnitTesting;` becomes
//! `using Xunit;`, and an `#if` block that only picks between framework
//! namespaces collapses to the same single import.

use super::{Pass, PassResult};
use crate::document::Document;
use crate::rules::ImportRules;
use crate::syntax::ast::{self, UsingKind};
use crate::syntax::trivia::{self, Trivia};
use crate::syntax::{build, rewrite, Rewriter, SyntaxNode};
use crate::PassId;
use std::sync::Arc;

/// Nodes whose direct children can be `using` directives
const CONTAINERS: &[&str] = &[
    "compilation_unit",
    "declaration_list",
    "preproc_if",
    "preproc_elif",
    "preproc_else",
];

pub struct UsingPass {
    rules: Arc<ImportRules>,
}

impl UsingPass {
    pub fn new(rules: Arc<ImportRules>) -> Self {
        Self { rules }
    }
}

impl Pass for UsingPass {
    fn id(&self) -> PassId {
        PassId::Usings
    }

    fn apply(&self, document: &Document) -> PassResult {
        let mut rewriter = UsingRewriter { rules: &self.rules };
        let root = rewrite(document.tree().root(), &mut rewriter);
        PassResult::from_root(document, root, Vec::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Point a source import at the target namespace
    Replace,
    /// Replace a conditional block with one target import
    Collapse,
    /// Drop an import made redundant by another target import
    Remove,
}

struct UsingRewriter<'a> {
    rules: &'a ImportRules,
}

impl Rewriter for UsingRewriter<'_> {
    fn leave(
        &mut self,
        original: &Arc<SyntaxNode>,
        rebuilt: &Arc<SyntaxNode>,
        _offset: usize,
    ) -> Option<Arc<SyntaxNode>> {
        if !CONTAINERS.contains(&original.kind()) {
            return None;
        }
        let plan = self.plan(original);
        if plan.is_empty() {
            return None;
        }

        let mut container = Arc::clone(rebuilt);
        for &(index, action) in plan.iter().rev() {
            container = self.apply_action(&container, index, action)?;
            tracing::trace!(?action, "normalized import");
        }
        Some(container)
    }
}

impl UsingRewriter<'_> {
    /// What to do with each direct child of a container, in child order.
    ///
    /// Only the first import that ends up naming the target is kept.
    fn plan(&self, container: &SyntaxNode) -> Vec<(usize, Action)> {
        let mut target_seen = container.child_nodes().any(|child| {
            namespace_import(child).is_some_and(|name| name == self.rules.target)
        });
        let mut plan = Vec::new();
        for (index, child) in container.children().iter().enumerate() {
            let Some(node) = child.element.as_node() else {
                continue;
            };
            let action = if namespace_import(node).is_some_and(|name| self.rules.is_source(&name)) {
                Action::Replace
            } else if node.kind() == "preproc_if" && self.is_collapsible(node) {
                Action::Collapse
            } else {
                continue;
            };
            plan.push((index, if target_seen { Action::Remove } else { action }));
            target_seen = true;
        }
        plan
    }

    /// Two or more branches, each importing only framework namespaces, and
    /// at least one source namespace somewhere.
    fn is_collapsible(&self, preproc: &SyntaxNode) -> bool {
        let mut branches = 0;
        let mut has_source = false;
        let mut branch = Some(preproc);
        while let Some(node) = branch {
            let mut imports = 0;
            for child in node.children().iter().filter(|c| c.field.is_none()) {
                let Some(content) = child.element.as_node() else {
                    continue;
                };
                match namespace_import(content) {
                    Some(name) if self.rules.is_framework(&name) => {
                        has_source |= self.rules.is_source(&name);
                        imports += 1;
                    }
                    _ => return false,
                }
            }
            if imports == 0 {
                return false;
            }
            branches += 1;
            branch = node.node_by_field("alternative").map(|n| n.as_ref());
        }
        branches >= 2 && has_source
    }

    fn apply_action(&self, container: &Arc<SyntaxNode>, index: usize, action: Action) -> Option<Arc<SyntaxNode>> {
        let child = &container.children()[index].element;
        match action {
            Action::Replace => {
                let using = child.as_node()?;
                let name_index = using
                    .children()
                    .iter()
                    .rposition(|c| c.field.is_none() && is_name(c.element.kind()))?;
                let old = &using.children()[name_index].element;
                let name = build::qualified_name(&self.rules.target)
                    .with_leading(old.leading().to_vec())
                    .with_trailing(old.trailing().to_vec());
                Some(container.replace_child(index, using.replace_child(name_index, name).into()))
            }
            Action::Collapse => {
                let last = child.last_token()?;
                let mut trailing = Vec::new();
                if last.text().ends_with('\n') {
                    trailing.push(Trivia::end_of_line(trivia::line_break(child.leading()).unwrap_or("\n")));
                }
                trailing.extend_from_slice(last.trailing());
                // Blank lines and comments before `#endif` follow the import.
                let closing = trivia::strip_final_indentation(last.leading());
                if trivia::ends_line(&trailing) && closing.last().is_some_and(Trivia::ends_line) {
                    trailing.extend_from_slice(closing);
                }
                let using = build::using_directive(&self.rules.target)
                    .with_leading(child.leading().to_vec())
                    .with_trailing(trailing);
                Some(container.replace_child(index, using.into()))
            }
            Action::Remove => match ast::remove_child_merging_trivia(container, index) {
                Some(container) => Some(container),
                // Nothing follows to take over the trivia.
                None if child.kind() == "using_directive" => {
                    self.apply_action(container, index, Action::Replace)
                }
                None => Some(Arc::clone(container)),
            },
        }
    }
}

fn is_name(kind: &str) -> bool {
    matches!(
        kind,
        "identifier" | "qualified_name" | "alias_qualified_name"
    )
}

/// Namespace of a plain `using N;` (or `global using N;`).
fn namespace_import(node: &SyntaxNode) -> Option<String> {
    let using = ast::using_directive(node)?;
    (using.kind == UsingKind::Namespace).then(|| using.name.joined())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::{run, run_idempotent};
    use crate::rules::RuleSet;
    use pretty_assertions::assert_eq;

    fn pass() -> UsingPass {
        UsingPass::new(RuleSet::mstest_to_xunit().imports)
    }

    #[test]
    fn replaces_source_import() {
        let output = run_idempotent(
            &pass(),
            "using System;\nusing Microsoft.VisualStudio.TestTools.UnitTesting; // tests\n\nnamespace N\n{\n}\n",
        );
        assert_eq!(output, "using System;\nusing Xunit; // tests\n\nnamespace N\n{\n}\n");
    }

    #[test]
    fn keeps_global_modifier() {
        let output = run(&pass(), "global using Microsoft.VisualStudio.TestTools.UnitTesting;\n");
        assert_eq!(output, "global using Xunit;\n");
    }

    #[test]
    fn removes_source_import_when_target_present() {
        let output = run_idempotent(
            &pass(),
            "using Xunit;\n// framework\nusing Microsoft.VisualStudio.TestTools.UnitTesting;\nusing System;\n",
        );
        assert_eq!(output, "using Xunit;\n// framework\nusing System;\n");
    }

    #[test]
    fn imports_inside_namespaces() {
        let output = run(
            &pass(),
            "namespace N\n{\n    using Microsoft.VisualStudio.TestTools.UnitTesting;\n\n    class T { }\n}\n",
        );
        assert_eq!(output, "namespace N\n{\n    using Xunit;\n\n    class T { }\n}\n");
    }

    #[test]
    fn collapses_conditional_framework_imports() {
        let output = run_idempotent(
            &pass(),
            "using System;
#if NETFX_CORE
using Microsoft.VisualStudio.TestPlatform.UnitTestFramework;
#elif PORTABLE_TESTS
using Microsoft.Bcl.Testing;
#else
using Microsoft.VisualStudio.TestTools.UnitTesting;
#endif
namespace N
{
}
",
        );
        assert_eq!(output, "using System;\nusing Xunit;\nnamespace N\n{\n}\n");
    }

    #[test]
    fn collapse_keeps_blank_line_before_endif() {
        let output = run_idempotent(
            &pass(),
            "using System;
#if NETFX_CORE
using Microsoft.VisualStudio.TestPlatform.UnitTestFramework;
#elif PORTABLE_TESTS
using Microsoft.Bcl.Testing;
#else
using Microsoft.VisualStudio.TestTools.UnitTesting;

#endif
namespace System.Composition.UnitTests
{
}
",
        );
        assert_eq!(
            output,
            "using System;\nusing Xunit;\n\nnamespace System.Composition.UnitTests\n{\n}\n"
        );
    }

    #[test]
    fn conditional_blocks_with_other_content_stay() {
        // Only the plain import inside the branch is touched.
        let output = run(
            &pass(),
            "#if DEBUG\nusing Microsoft.VisualStudio.TestTools.UnitTesting;\nusing System.Diagnostics;\n#else\nusing Microsoft.VisualStudio.TestTools.UnitTesting;\n#endif\n",
        );
        assert_eq!(
            output,
            "#if DEBUG\nusing Xunit;\nusing System.Diagnostics;\n#else\nusing Xunit;\n#endif\n"
        );
    }

    #[test]
    fn static_alias_and_other_imports_are_untouched() {
        let source = "using static Microsoft.VisualStudio.TestTools.UnitTesting.Assert;\nusing UT = Microsoft.VisualStudio.TestTools.UnitTesting;\nusing System.Linq;\n";
        assert_eq!(run(&pass(), source), source);
    }

    #[test]
    fn single_branch_blocks_do_not_collapse() {
        let output = run(
            &pass(),
            "#if MSTEST\nusing Microsoft.VisualStudio.TestTools.UnitTesting;\n#endif\n",
        );
        assert_eq!(output, "#if MSTEST\nusing Xunit;\n#endif\n");
    }
}
